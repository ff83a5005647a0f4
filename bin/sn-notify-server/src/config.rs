use anyhow::Result;
use sn_dispatch::fcm::FcmConfig;
use sn_stream::StreamConfig;

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_or_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_required(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| anyhow::anyhow!("{} environment variable is required", key))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    pub fn from_env() -> Self {
        match env_or("SN_LOG_FORMAT", "text").to_lowercase().as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Text,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub mongo_url: String,
    pub mongo_db: String,
    pub events_collection: String,
    pub admins_collection: String,
    pub checkpoint_collection: String,
    pub fcm_project_id: String,
    pub fcm_access_token: String,
    pub fcm_base_url: String,
    pub fcm_concurrency: usize,
    pub http_port: u16,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            mongo_url: env_required("SN_MONGO_URL")?,
            mongo_db: env_or("SN_MONGO_DB", "service_notify"),
            events_collection: env_or("SN_EVENTS_COLLECTION", "notifications"),
            admins_collection: env_or("SN_ADMINS_COLLECTION", "admins"),
            checkpoint_collection: env_or("SN_CHECKPOINT_COLLECTION", "stream_checkpoints"),
            fcm_project_id: env_required("SN_FCM_PROJECT_ID")?,
            fcm_access_token: env_required("SN_FCM_ACCESS_TOKEN")?,
            fcm_base_url: env_or("SN_FCM_BASE_URL", "https://fcm.googleapis.com"),
            fcm_concurrency: env_or_parse("SN_FCM_CONCURRENCY", 16usize).max(1),
            http_port: env_or_parse("SN_HTTP_PORT", 8080),
        })
    }

    pub fn fcm(&self) -> FcmConfig {
        FcmConfig {
            base_url: self.fcm_base_url.trim_end_matches('/').to_string(),
            project_id: self.fcm_project_id.clone(),
            access_token: self.fcm_access_token.clone(),
            max_concurrency: self.fcm_concurrency,
            ..Default::default()
        }
    }

    pub fn stream(&self) -> StreamConfig {
        StreamConfig {
            source_database: self.mongo_db.clone(),
            source_collection: self.events_collection.clone(),
            checkpoint_collection: self.checkpoint_collection.clone(),
            ..Default::default()
        }
    }
}
