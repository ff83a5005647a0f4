use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    pub name: String,
    pub source_database: String,
    pub source_collection: String,
    pub checkpoint_collection: String,
    pub watch_operations: Vec<String>,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            name: "notifications".to_string(),
            source_database: "service_notify".to_string(),
            source_collection: "notifications".to_string(),
            checkpoint_collection: "stream_checkpoints".to_string(),
            watch_operations: vec!["insert".to_string()],
        }
    }
}

impl StreamConfig {
    pub fn checkpoint_key(&self) -> String {
        format!("checkpoint:{}", self.name)
    }
}
