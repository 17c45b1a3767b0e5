use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;

use crate::layout::{FormLayout, LayoutError};

pub const PROCESSED_BUCKET: &str = "PROCESSED_BUCKET";
pub const RESULT_BUCKET: &str = "RESULT_BUCKET";
pub const RESULT_NAME: &str = "RESULT_NAME";
pub const GCP_PROJECT: &str = "GCP_PROJECT";
pub const PLACARD_LAYOUT: &str = "PLACARD_LAYOUT";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable {0}")]
    MissingVar(&'static str),
    #[error("Invalid form layout: {0}")]
    Layout(#[from] LayoutError),
}

/// Deployment settings consumed by both pipeline stages.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Bucket receiving the cropped regions.
    pub processed_bucket: String,
    /// Bucket receiving persisted results.
    pub result_bucket: String,
    /// Topic that carries extraction results between stages.
    pub result_topic: String,
    pub project_id: String,
    pub layout: FormLayout,
}

impl PipelineConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&std::env::vars().collect())
    }

    /// Build from an explicit variable map (useful for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let get = |key: &'static str| {
            vars.get(key)
                .filter(|v| !v.is_empty())
                .cloned()
                .ok_or(ConfigError::MissingVar(key))
        };

        let layout = match vars.get(PLACARD_LAYOUT).filter(|v| !v.is_empty()) {
            Some(path) => FormLayout::from_file(&PathBuf::from(path))?,
            None => FormLayout::placard(),
        };

        Ok(Self {
            processed_bucket: get(PROCESSED_BUCKET)?,
            result_bucket: get(RESULT_BUCKET)?,
            result_topic: get(RESULT_NAME)?,
            project_id: get(GCP_PROJECT)?,
            layout,
        })
    }

    /// Fully qualified topic path, `projects/{project}/topics/{topic}`.
    pub fn topic_path(&self) -> String {
        format!("projects/{}/topics/{}", self.project_id, self.result_topic)
    }
}
