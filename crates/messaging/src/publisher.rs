use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Unknown topic '{0}'")]
    UnknownTopic(String),
    #[error("Topic '{0}' has no live subscription")]
    Closed(String),
}

/// Abstraction over a message transport.
/// `publish` returns only once the transport has acknowledged the message.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Publish `payload` to `topic` and return the transport's message id.
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<String, PublishError>;
}

#[async_trait]
impl<T: Publisher + ?Sized> Publisher for Arc<T> {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<String, PublishError> {
        (**self).publish(topic, payload).await
    }
}
