use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use image::ImageFormat;
use placard_core::{
    CloudEvent, EventTypeMismatch, ExtractionResult, MessagePublishedData, ObjectRef,
    PipelineConfig, StorageObjectData, MESSAGE_PUBLISHED, OBJECT_FINALIZED,
};
use placard_messaging::{PublishError, Publisher};
use placard_storage::{ObjectStore, StoreError};
use thiserror::Error;

use crate::crop::{self, CropError, StagedRegions};
use crate::extract::Extractor;
use crate::preprocess::{self, CanonicalImage, GeometryError, PreprocessError};
use crate::recognizer::{OcrError, TextDetector};
use crate::types::{ExtractStage, Published, SaveStage};

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    ContractViolation(#[from] EventTypeMismatch),
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    #[error("Missing or malformed message {payload}: {source}.")]
    PayloadCorruption {
        payload: String,
        #[source]
        source: PayloadError,
    },
    #[error("Image processing failed: {0}")]
    Image(PreprocessError),
    #[error("Region crop failed: {0}")]
    Crop(#[from] CropError),
    #[error("Object storage failed: {0}")]
    Store(#[from] StoreError),
    #[error("OCR recognition failed: {0}")]
    Ocr(#[from] OcrError),
    #[error("Publishing extraction result failed: {0}")]
    Publish(#[from] PublishError),
    #[error("Failed to serialize extraction result: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl From<PreprocessError> for PipelineError {
    fn from(e: PreprocessError) -> Self {
        match e {
            PreprocessError::Geometry(g) => PipelineError::Geometry(g),
            other => PipelineError::Image(other),
        }
    }
}

impl PipelineError {
    /// Whether the input itself was rejected (wrong event, wrong geometry,
    /// corrupt payload) rather than a collaborator failing.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            PipelineError::ContractViolation(_)
                | PipelineError::Geometry(_)
                | PipelineError::PayloadCorruption { .. }
        )
    }
}

/// Decode a stage-two payload: base64 text wrapping a JSON [`ExtractionResult`].
pub fn decode_message(data: &str) -> Result<ExtractionResult, PipelineError> {
    let decode = || -> Result<ExtractionResult, PayloadError> {
        let bytes = BASE64.decode(data)?;
        Ok(serde_json::from_slice(&bytes)?)
    };
    decode().map_err(|source| PipelineError::PayloadCorruption {
        payload: data.to_string(),
        source,
    })
}

/// Orchestrates both stages:
/// stage one: validate → resize → crop → OCR → publish;
/// stage two: validate → decode → persist.
pub struct FormPipeline<S, D, P> {
    store: S,
    detector: D,
    publisher: P,
    config: PipelineConfig,
}

impl<S, D, P> FormPipeline<S, D, P>
where
    S: ObjectStore,
    D: TextDetector,
    P: Publisher,
{
    pub fn new(store: S, detector: D, publisher: P, config: PipelineConfig) -> Self {
        Self { store, detector, publisher, config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Stage one, triggered by an "object finalized" event.
    ///
    /// Returns once the transport has acknowledged the extraction result.
    pub async fn process_image(
        &self,
        event: &CloudEvent<StorageObjectData>,
    ) -> Result<Published, PipelineError> {
        tracing::debug!(stage = %ExtractStage::Validating, event = %event.id);
        event.expect_type(OBJECT_FINALIZED)?;

        let source = event.data.object();
        tracing::info!("Processing image {}", source);

        let result = self.extract(&source).await?;
        let payload = serde_json::to_vec(&result)?;
        let message_id = self.publisher.publish(&self.config.topic_path(), payload).await?;

        tracing::debug!(stage = %ExtractStage::Published, message = %message_id);
        tracing::info!("File {} processed.", source);
        Ok(Published { message_id, result })
    }

    /// Normalize, crop and OCR one stored image.
    pub async fn extract(&self, source: &ObjectRef) -> Result<ExtractionResult, PipelineError> {
        let canonical = self.normalize(source).await?;
        let staged = self.stage_regions(&canonical, &source.name).await?;

        tracing::debug!(stage = %ExtractStage::Extracting, regions = staged.names.len());
        let utility_map = Extractor::extract(&self.detector, &self.config.layout, &staged).await?;

        Ok(ExtractionResult { utility_map, filename: source.name.clone() })
    }

    /// Bring the stored image to canonical geometry and write it back in place.
    /// Nothing is written when validation fails.
    pub async fn normalize(&self, source: &ObjectRef) -> Result<CanonicalImage, PipelineError> {
        tracing::debug!(stage = %ExtractStage::Resizing, object = %source);
        let original = self.store.read(source).await?;
        let canonical = preprocess::normalize_geometry(&original, &self.config.layout)?;

        let stored = if canonical.was_resized() {
            canonical.encode()?
        } else {
            original
        };
        self.store.write(source, stored).await?;
        Ok(canonical)
    }

    /// Cut every layout region and upload it to the processed bucket.
    pub async fn stage_regions(
        &self,
        canonical: &CanonicalImage,
        filename: &str,
    ) -> Result<StagedRegions, PipelineError> {
        tracing::debug!(stage = %ExtractStage::Cropping, file = filename);
        let bucket = &self.config.processed_bucket;
        let crops = crop::crop_regions(&canonical.image, &self.config.layout.regions)?;

        let mut names = Vec::with_capacity(crops.len());
        for region in crops {
            let staged_name = crop::staged_name(&region.name, filename);
            let format = ImageFormat::from_path(&staged_name).unwrap_or(canonical.format);
            let bytes = preprocess::encode_image(&region.image, format)?;
            self.store.write(&ObjectRef::new(bucket, &staged_name), bytes).await?;
            tracing::debug!("File {} saved to {} bucket", region.name, bucket);
            names.push(region.name);
        }

        Ok(StagedRegions {
            bucket: bucket.clone(),
            names,
            filename: filename.to_string(),
        })
    }

    /// Stage two, triggered by a "message published" event.
    ///
    /// Returns the location of the persisted document.
    pub async fn save_result(
        &self,
        event: &CloudEvent<MessagePublishedData>,
    ) -> Result<ObjectRef, PipelineError> {
        tracing::debug!(stage = %SaveStage::Received, event = %event.id);
        event.expect_type(MESSAGE_PUBLISHED)?;

        tracing::debug!(stage = %SaveStage::Decoding, message = %event.data.message.message_id);
        let result = decode_message(&event.data.message.data)?;
        tracing::info!("Received request to save file {}.", result.filename);

        let record = result.render_record()?;
        let target = ObjectRef::new(&self.config.result_bucket, result.result_name());
        tracing::info!("Saving result to {}.", target);
        self.store.write(&target, record).await?;

        tracing::debug!(stage = %SaveStage::Persisted, object = %target);
        Ok(target)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
