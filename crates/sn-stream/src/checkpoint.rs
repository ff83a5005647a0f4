use anyhow::Result;
use async_trait::async_trait;
use mongodb::bson::{doc, DateTime, Document};
use mongodb::{Client, Collection};

#[async_trait]
pub trait CheckpointStore: Send + Sync {
    async fn get_checkpoint(&self, key: &str) -> Result<Option<Document>>;
    async fn save_checkpoint(&self, key: &str, token: Document) -> Result<()>;
    async fn clear_checkpoint(&self, key: &str) -> Result<()>;
}

pub struct MongoCheckpointStore {
    collection: Collection<Document>,
}

impl MongoCheckpointStore {
    pub fn new(client: Client, db_name: &str, collection_name: &str) -> Self {
        let db = client.database(db_name);
        Self {
            collection: db.collection(collection_name),
        }
    }
}

#[async_trait]
impl CheckpointStore for MongoCheckpointStore {
    async fn get_checkpoint(&self, key: &str) -> Result<Option<Document>> {
        let doc = self.collection.find_one(doc! { "_id": key }).await?;
        Ok(doc.and_then(|d| d.get_document("token").ok().cloned()))
    }

    async fn save_checkpoint(&self, key: &str, token: Document) -> Result<()> {
        let update = doc! {
            "$set": { "token": token, "updated_at": DateTime::now() }
        };

        self.collection
            .update_one(doc! { "_id": key }, update)
            .upsert(true)
            .await?;
        Ok(())
    }

    async fn clear_checkpoint(&self, key: &str) -> Result<()> {
        self.collection.delete_one(doc! { "_id": key }).await?;
        Ok(())
    }
}
