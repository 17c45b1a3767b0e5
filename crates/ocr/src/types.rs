use placard_core::ExtractionResult;
use std::fmt;

/// Progress of a stage-one (extract) invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractStage {
    Validating,
    Resizing,
    Cropping,
    Extracting,
    Published,
}

impl fmt::Display for ExtractStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractStage::Validating => write!(f, "validating"),
            ExtractStage::Resizing => write!(f, "resizing"),
            ExtractStage::Cropping => write!(f, "cropping"),
            ExtractStage::Extracting => write!(f, "extracting"),
            ExtractStage::Published => write!(f, "published"),
        }
    }
}

/// Progress of a stage-two (persist) invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveStage {
    Received,
    Decoding,
    Persisted,
}

impl fmt::Display for SaveStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaveStage::Received => write!(f, "received"),
            SaveStage::Decoding => write!(f, "decoding"),
            SaveStage::Persisted => write!(f, "persisted"),
        }
    }
}

/// Outcome of a successful stage-one run.
#[derive(Debug, Clone)]
pub struct Published {
    /// Id the transport acknowledged the message under.
    pub message_id: String,
    pub result: ExtractionResult,
}
