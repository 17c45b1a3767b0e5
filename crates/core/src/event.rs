use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::record::ObjectRef;

/// Emitted when an object upload completes.
pub const OBJECT_FINALIZED: &str = "google.cloud.storage.object.v1.finalized";
/// Emitted when a message is published to a topic.
pub const MESSAGE_PUBLISHED: &str = "google.cloud.pubsub.topic.v1.messagePublished";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Expected {expected} but received {received}")]
pub struct EventTypeMismatch {
    pub expected: String,
    pub received: String,
}

/// CloudEvents envelope carrying a typed payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloudEvent<T> {
    pub id: String,
    pub source: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub time: DateTime<Utc>,
    pub data: T,
}

impl<T> CloudEvent<T> {
    pub fn new(event_type: &str, source: impl Into<String>, data: T) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            source: source.into(),
            event_type: event_type.to_string(),
            time: Utc::now(),
            data,
        }
    }

    pub fn expect_type(&self, expected: &str) -> Result<(), EventTypeMismatch> {
        if self.event_type == expected {
            Ok(())
        } else {
            Err(EventTypeMismatch {
                expected: expected.to_string(),
                received: self.event_type.clone(),
            })
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageObjectData {
    pub bucket: String,
    pub name: String,
}

impl StorageObjectData {
    pub fn object(&self) -> ObjectRef {
        ObjectRef::new(&self.bucket, &self.name)
    }
}

impl CloudEvent<StorageObjectData> {
    pub fn object_finalized(object: &ObjectRef) -> Self {
        Self::new(
            OBJECT_FINALIZED,
            format!("//storage/buckets/{}", object.bucket),
            StorageObjectData { bucket: object.bucket.clone(), name: object.name.clone() },
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PubsubMessage {
    /// Base64-encoded payload.
    pub data: String,
    pub message_id: String,
    pub publish_time: DateTime<Utc>,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessagePublishedData {
    pub message: PubsubMessage,
    #[serde(default)]
    pub subscription: Option<String>,
}

impl CloudEvent<MessagePublishedData> {
    pub fn message_published(topic: &str, message: PubsubMessage) -> Self {
        Self::new(
            MESSAGE_PUBLISHED,
            format!("//pubsub/{topic}"),
            MessagePublishedData { message, subscription: None },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expect_type_accepts_match() {
        let ev = CloudEvent::object_finalized(&ObjectRef::new("intake", "a.png"));
        assert!(ev.expect_type(OBJECT_FINALIZED).is_ok());
        assert_eq!(ev.data.object(), ObjectRef::new("intake", "a.png"));
    }

    #[test]
    fn expect_type_reports_both_types() {
        let ev = CloudEvent::object_finalized(&ObjectRef::new("intake", "a.png"));
        let err = ev.expect_type(MESSAGE_PUBLISHED).unwrap_err();
        assert_eq!(
            err.to_string(),
            format!("Expected {MESSAGE_PUBLISHED} but received {OBJECT_FINALIZED}")
        );
    }

    #[test]
    fn envelope_uses_type_key() {
        let ev = CloudEvent::object_finalized(&ObjectRef::new("intake", "a.png"));
        let value = serde_json::to_value(&ev).unwrap();
        assert_eq!(value["type"], OBJECT_FINALIZED);
        assert_eq!(value["data"]["bucket"], "intake");
    }

    #[test]
    fn pubsub_message_is_camel_case() {
        let raw = r#"{
            "message": {"data": "e30=", "messageId": "1", "publishTime": "2024-05-01T12:00:00Z"},
            "subscription": "projects/p/subscriptions/s"
        }"#;
        let data: MessagePublishedData = serde_json::from_str(raw).unwrap();
        assert_eq!(data.message.data, "e30=");
        assert_eq!(data.message.message_id, "1");
        assert!(data.message.attributes.is_empty());
    }
}
