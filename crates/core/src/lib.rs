pub mod config;
pub mod event;
pub mod layout;
pub mod record;

pub use config::{ConfigError, PipelineConfig};
pub use event::{
    CloudEvent, EventTypeMismatch, MessagePublishedData, PubsubMessage, StorageObjectData,
    MESSAGE_PUBLISHED, OBJECT_FINALIZED,
};
pub use layout::{Dimensions, FieldRule, FormLayout, LayoutError, RegionSpec};
pub use record::{ExtractionResult, ObjectRef, UtilityMap, ORIGINAL_TRANSLATION};
