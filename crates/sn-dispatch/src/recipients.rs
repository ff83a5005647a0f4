//! Recipient Resolver

use anyhow::Result;
use tracing::debug;

use crate::repository::AdminRepository;

/// Collect every admin push token, in admin order then registration order.
///
/// Duplicates are kept. An empty result is not an error.
pub async fn resolve_recipients(admins: &dyn AdminRepository) -> Result<Vec<String>> {
    let records = admins.find_all().await?;

    let tokens: Vec<String> = records
        .iter()
        .flat_map(|admin| admin.delivery_tokens())
        .map(str::to_string)
        .collect();

    debug!("Resolved {} tokens from {} admins", tokens.len(), records.len());
    Ok(tokens)
}
