pub mod channel;
pub mod hash;
pub mod publisher;

pub use channel::{ChannelTopic, Subscription};
pub use hash::message_id;
pub use publisher::{PublishError, Publisher};
