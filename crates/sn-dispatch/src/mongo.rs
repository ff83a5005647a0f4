//! MongoDB repositories
//!
//! Server-side timestamps use `$currentDate`, so the stored times come from the
//! database clock rather than this process.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, Bson, Document};
use mongodb::{Collection, Database};
use sn_common::AdminRecord;
use tracing::{debug, warn};

use crate::repository::{AdminRepository, EventRepository};

/// String form of a document's `_id` (hex for ObjectIds).
///
/// Only ObjectId, string and integer ids are supported, since those are the
/// forms [`id_filter`] can match again.
pub fn document_id(document: &Document) -> Option<String> {
    match document.get("_id")? {
        Bson::ObjectId(oid) => Some(oid.to_hex()),
        Bson::String(s) => Some(s.clone()),
        Bson::Int32(n) => Some(n.to_string()),
        Bson::Int64(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Filter on `_id` matching every stored form the string could have come from.
pub fn id_filter(id: &str) -> Document {
    let mut candidates = vec![Bson::String(id.to_string())];
    if let Ok(oid) = ObjectId::parse_str(id) {
        candidates.push(Bson::ObjectId(oid));
    }
    if let Ok(n) = id.parse::<i64>() {
        candidates.push(Bson::Int64(n));
    }
    doc! { "_id": { "$in": candidates } }
}

fn token_cleanup_update(tokens: &[String]) -> Document {
    doc! {
        "$set": { "fcmTokens": tokens.to_vec() },
        "$currentDate": { "lastTokenCleanup": true },
    }
}

fn push_sent_filter(event_id: &str) -> Document {
    let mut filter = id_filter(event_id);
    filter.insert(
        "$or",
        vec![
            doc! { "data.pushNotificationSent": true },
            doc! { "pushNotificationSent": true },
        ],
    );
    filter
}

fn mark_sent_filter(event_id: &str) -> Document {
    let mut filter = id_filter(event_id);
    filter.insert("data.pushNotificationSent", doc! { "$ne": true });
    filter
}

fn mark_sent_update() -> Document {
    doc! {
        "$set": { "data.pushNotificationSent": true },
        "$currentDate": { "data.pushNotificationSentAt": true },
    }
}

pub fn to_json(document: Document) -> serde_json::Value {
    Bson::Document(document).into_relaxed_extjson()
}

pub struct MongoAdminRepository {
    collection: Collection<Document>,
}

impl MongoAdminRepository {
    pub fn new(db: &Database, collection_name: &str) -> Self {
        Self {
            collection: db.collection(collection_name),
        }
    }
}

#[async_trait]
impl AdminRepository for MongoAdminRepository {
    async fn find_all(&self) -> Result<Vec<AdminRecord>> {
        let mut cursor = self.collection.find(doc! {}).await?;
        let mut admins = Vec::new();

        while let Some(document) = cursor.try_next().await? {
            let Some(id) = document_id(&document) else {
                warn!("Skipping admin with unsupported _id: {:?}", document.get("_id"));
                continue;
            };
            admins.push(AdminRecord::from_document(id, &to_json(document))?);
        }

        Ok(admins)
    }

    async fn replace_tokens(&self, admin_id: &str, tokens: &[String]) -> Result<()> {
        let result = self
            .collection
            .update_one(id_filter(admin_id), token_cleanup_update(tokens))
            .await?;
        if result.matched_count == 0 {
            return Err(anyhow!("Admin not found: {}", admin_id));
        }
        Ok(())
    }
}

pub struct MongoEventRepository {
    collection: Collection<Document>,
}

impl MongoEventRepository {
    pub fn new(db: &Database, collection_name: &str) -> Self {
        Self {
            collection: db.collection(collection_name),
        }
    }
}

#[async_trait]
impl EventRepository for MongoEventRepository {
    async fn is_push_sent(&self, event_id: &str) -> Result<bool> {
        let found = self.collection.find_one(push_sent_filter(event_id)).await?;
        Ok(found.is_some())
    }

    async fn mark_push_sent(&self, event_id: &str) -> Result<()> {
        let result = self
            .collection
            .update_one(mark_sent_filter(event_id), mark_sent_update())
            .await?;
        if result.modified_count == 0 {
            debug!("[{}] Notification already marked as sent", event_id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn in_candidates(filter: &Document) -> Vec<Bson> {
        filter
            .get_document("_id")
            .unwrap()
            .get_array("$in")
            .unwrap()
            .clone()
    }

    #[test]
    fn test_document_id_forms() {
        let oid = ObjectId::parse_str("65a1f0c2e4b0a1b2c3d4e5f6").unwrap();
        assert_eq!(
            document_id(&doc! { "_id": oid }).as_deref(),
            Some("65a1f0c2e4b0a1b2c3d4e5f6")
        );
        assert_eq!(document_id(&doc! { "_id": "admin-1" }).as_deref(), Some("admin-1"));
        assert_eq!(document_id(&doc! { "_id": 42_i32 }).as_deref(), Some("42"));
        assert_eq!(document_id(&doc! { "_id": 7_i64 }).as_deref(), Some("7"));
        assert_eq!(document_id(&doc! { "_id": { "org": 1 } }), None);
        assert_eq!(document_id(&doc! { "name": "x" }), None);
    }

    #[test]
    fn test_id_filter_matches_every_stored_form() {
        let hex = "65a1f0c2e4b0a1b2c3d4e5f6";
        let candidates = in_candidates(&id_filter(hex));
        assert!(candidates.contains(&Bson::String(hex.to_string())));
        assert!(candidates.contains(&Bson::ObjectId(ObjectId::parse_str(hex).unwrap())));

        let candidates = in_candidates(&id_filter("42"));
        assert_eq!(candidates, vec![Bson::String("42".to_string()), Bson::Int64(42)]);

        let candidates = in_candidates(&id_filter("admin-1"));
        assert_eq!(candidates, vec![Bson::String("admin-1".to_string())]);
    }

    #[test]
    fn test_numeric_admin_id_round_trips() {
        let id = document_id(&doc! { "_id": 42_i32 }).unwrap();
        assert!(in_candidates(&id_filter(&id)).contains(&Bson::Int64(42)));
    }

    #[test]
    fn test_token_cleanup_update_stamps_server_time() {
        let update = token_cleanup_update(&["a".to_string(), "c".to_string()]);

        assert_eq!(
            update.get_document("$set").unwrap(),
            &doc! { "fcmTokens": ["a", "c"] }
        );
        assert_eq!(
            update.get_document("$currentDate").unwrap(),
            &doc! { "lastTokenCleanup": true }
        );
    }

    #[test]
    fn test_mark_sent_documents() {
        let filter = mark_sent_filter("n1");
        assert_eq!(
            filter.get_document("data.pushNotificationSent").unwrap(),
            &doc! { "$ne": true }
        );

        let update = mark_sent_update();
        assert_eq!(
            update.get_document("$set").unwrap(),
            &doc! { "data.pushNotificationSent": true }
        );
        assert_eq!(
            update.get_document("$currentDate").unwrap(),
            &doc! { "data.pushNotificationSentAt": true }
        );
    }

    #[test]
    fn test_push_sent_filter_checks_both_shapes() {
        let filter = push_sent_filter("n1");
        let branches = filter.get_array("$or").unwrap();
        assert!(branches.contains(&Bson::Document(doc! { "data.pushNotificationSent": true })));
        assert!(branches.contains(&Bson::Document(doc! { "pushNotificationSent": true })));
    }

    #[test]
    fn test_admin_document_maps_to_record() {
        let document = doc! { "_id": "admin-1", "fcmTokens": ["t1", "t2"], "name": "Ops" };
        let record = AdminRecord::from_document("admin-1", &to_json(document)).unwrap();
        assert_eq!(record.delivery_tokens(), vec!["t1", "t2"]);
    }

    #[test]
    fn test_nested_event_document_to_json() {
        let document = doc! {
            "data": { "type": "service_accepted", "srId": "SR1", "count": 3_i32 }
        };
        assert_eq!(
            to_json(document),
            json!({ "data": { "type": "service_accepted", "srId": "SR1", "count": 3 } })
        );
    }
}
