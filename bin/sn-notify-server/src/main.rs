//! Service Notify Server
//!
//! Watches the notifications collection and pushes every new service-request
//! notification to all registered admin devices through FCM. Also serves an
//! on-demand endpoint that prunes admin tokens FCM no longer accepts.
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `SN_MONGO_URL` | - | MongoDB connection URL (required) |
//! | `SN_MONGO_DB` | `service_notify` | MongoDB database name |
//! | `SN_EVENTS_COLLECTION` | `notifications` | Notification documents |
//! | `SN_ADMINS_COLLECTION` | `admins` | Admin documents holding push tokens |
//! | `SN_CHECKPOINT_COLLECTION` | `stream_checkpoints` | Change stream resume tokens |
//! | `SN_FCM_PROJECT_ID` | - | Firebase project (required) |
//! | `SN_FCM_ACCESS_TOKEN` | - | OAuth2 bearer token for FCM (required) |
//! | `SN_FCM_BASE_URL` | `https://fcm.googleapis.com` | FCM API base |
//! | `SN_FCM_CONCURRENCY` | `16` | Max in-flight FCM calls per batch or per admin cleanup |
//! | `SN_HTTP_PORT` | `8080` | Cleanup and health port |
//! | `SN_LOG_FORMAT` | `text` | `text` or `json` |
//! | `RUST_LOG` | `info` | Log level |

mod config;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use sn_dispatch::fcm::FcmClient;
use sn_dispatch::mongo::{MongoAdminRepository, MongoEventRepository};
use sn_dispatch::{NotificationDispatcher, TokenSanitizer};
use sn_stream::{MongoCheckpointStore, MongoStreamWatcher, StreamWatcher};

use config::{LogFormat, ServerConfig};

fn init_logging(format: LogFormat) {
    let filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    match format {
        LogFormat::Json => tracing_subscriber::fmt().json().with_env_filter(filter).init(),
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging(LogFormat::from_env());

    info!("Starting Service Notify Server");

    let config = ServerConfig::from_env()?;

    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    let client = mongodb::Client::with_uri_str(&config.mongo_url).await?;
    let db = client.database(&config.mongo_db);
    let admins = Arc::new(MongoAdminRepository::new(&db, &config.admins_collection));
    let events = Arc::new(MongoEventRepository::new(&db, &config.events_collection));
    info!(
        "MongoDB repositories initialized: {}/{}, {}/{}",
        config.mongo_db, config.events_collection, config.mongo_db, config.admins_collection
    );

    let provider = Arc::new(FcmClient::new(config.fcm())?);
    info!("FCM client initialized for project {}", config.fcm_project_id);

    let dispatcher = Arc::new(NotificationDispatcher::new(
        admins.clone(),
        events,
        provider.clone(),
    ));
    let sanitizer =
        Arc::new(TokenSanitizer::new(admins, provider).with_concurrency(config.fcm_concurrency));

    // Change stream trigger
    let stream_config = config.stream();
    let checkpoint_store = Arc::new(MongoCheckpointStore::new(
        client.clone(),
        &stream_config.source_database,
        &stream_config.checkpoint_collection,
    ));
    let watcher = MongoStreamWatcher::new(client, stream_config, checkpoint_store, dispatcher);

    let watcher_handle = {
        let mut shutdown_rx = shutdown_tx.subscribe();
        tokio::spawn(async move {
            tokio::select! {
                result = watcher.watch() => {
                    if let Err(e) = result {
                        error!("Change stream watcher stopped: {:#}", e);
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("Change stream watcher shutting down");
                }
            }
        })
    };

    // HTTP server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    let app = sn_api::create_router(sanitizer);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("HTTP server listening on http://{}", addr);

    let http_handle = {
        let mut shutdown_rx = shutdown_tx.subscribe();
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.recv().await;
                })
                .await
                .ok();
        })
    };

    info!("Service Notify Server started");

    shutdown_signal().await;
    info!("Shutdown signal received...");

    let _ = shutdown_tx.send(());

    let _ = tokio::time::timeout(Duration::from_secs(30), async {
        let _ = watcher_handle.await;
        let _ = http_handle.await;
    })
    .await;

    info!("Service Notify Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
