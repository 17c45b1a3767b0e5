use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::Utc;
use placard_core::{CloudEvent, MessagePublishedData, PubsubMessage};
use std::collections::BTreeMap;
use tokio::sync::mpsc;

use crate::hash;
use crate::publisher::{PublishError, Publisher};

/// A single in-process topic backed by a bounded channel.
///
/// A publish is acknowledged once the message is queued; when the queue is
/// full the publisher waits for the subscriber to catch up.
#[derive(Clone)]
pub struct ChannelTopic {
    path: String,
    tx: mpsc::Sender<PubsubMessage>,
}

/// Receiving end of a [`ChannelTopic`].
pub struct Subscription {
    topic: String,
    rx: mpsc::Receiver<PubsubMessage>,
}

impl ChannelTopic {
    pub fn new(path: impl Into<String>, capacity: usize) -> (Self, Subscription) {
        let path = path.into();
        let (tx, rx) = mpsc::channel(capacity);
        (
            Self { path: path.clone(), tx },
            Subscription { topic: path, rx },
        )
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

#[async_trait]
impl Publisher for ChannelTopic {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<String, PublishError> {
        if topic != self.path {
            return Err(PublishError::UnknownTopic(topic.to_string()));
        }
        let message_id = hash::message_id(&payload);
        let message = PubsubMessage {
            data: BASE64.encode(&payload),
            message_id: message_id.clone(),
            publish_time: Utc::now(),
            attributes: BTreeMap::new(),
        };
        self.tx
            .send(message)
            .await
            .map_err(|_| PublishError::Closed(self.path.clone()))?;
        tracing::debug!("Published {} bytes to {} as {}", payload.len(), topic, message_id);
        Ok(message_id)
    }
}

impl Subscription {
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Wait for the next message, wrapped as a "message published" event.
    /// Returns `None` once every publisher has been dropped.
    pub async fn next_event(&mut self) -> Option<CloudEvent<MessagePublishedData>> {
        let message = self.rx.recv().await?;
        Some(self.wrap(message))
    }

    /// Non-blocking variant of [`next_event`](Self::next_event).
    pub fn try_next_event(&mut self) -> Option<CloudEvent<MessagePublishedData>> {
        let message = self.rx.try_recv().ok()?;
        Some(self.wrap(message))
    }

    fn wrap(&self, message: PubsubMessage) -> CloudEvent<MessagePublishedData> {
        CloudEvent::message_published(&self.topic, message)
    }
}
