use async_trait::async_trait;
use placard_core::ObjectRef;
use placard_storage::StoreError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("Image decode error: {0}")]
    ImageDecode(String),
    #[error("OCR engine error: {0}")]
    Engine(String),
    #[error("Could not fetch image for OCR: {0}")]
    Source(#[from] StoreError),
}

/// One block of text found in an image. The first annotation of a response
/// holds the full text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextAnnotation {
    pub description: String,
}

impl TextAnnotation {
    pub fn new(description: impl Into<String>) -> Self {
        Self { description: description.into() }
    }
}

/// Abstraction over a text-detection service.
/// Implementations receive a reference to a stored image, not its bytes.
#[async_trait]
pub trait TextDetector: Send + Sync {
    async fn detect_text(&self, image: &ObjectRef) -> Result<Vec<TextAnnotation>, OcrError>;
}

#[async_trait]
impl<T: TextDetector + ?Sized> TextDetector for Arc<T> {
    async fn detect_text(&self, image: &ObjectRef) -> Result<Vec<TextAnnotation>, OcrError> {
        (**self).detect_text(image).await
    }
}

// ── Mock backend (always available, used for tests) ───────────────────────────

/// Returns canned annotations keyed by object name. Unknown objects yield no
/// annotations.
#[derive(Default)]
pub struct MockDetector {
    responses: HashMap<String, Vec<TextAnnotation>>,
    calls: AtomicUsize,
}

impl MockDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `object_name` with a single full-text annotation.
    pub fn with_text(mut self, object_name: &str, text: &str) -> Self {
        self.responses
            .insert(object_name.to_string(), vec![TextAnnotation::new(text)]);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextDetector for MockDetector {
    async fn detect_text(&self, image: &ObjectRef) -> Result<Vec<TextAnnotation>, OcrError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.responses.get(&image.name).cloned().unwrap_or_default())
    }
}

// ── Tesseract backend (optional, gated behind `tesseract` feature) ─────────────

#[cfg(feature = "tesseract")]
pub mod tesseract_backend {
    use super::{OcrError, TextAnnotation, TextDetector};
    use async_trait::async_trait;
    use leptess::LepTess;
    use placard_core::ObjectRef;
    use placard_storage::ObjectStore;

    /// Runs Tesseract locally over images fetched from an object store.
    pub struct TesseractDetector<S: ObjectStore> {
        store: S,
        data_path: Option<String>,
        lang: String,
    }

    impl<S: ObjectStore> TesseractDetector<S> {
        pub fn new(store: S, data_path: Option<String>, lang: &str) -> Self {
            Self { store, data_path, lang: lang.to_string() }
        }
    }

    #[async_trait]
    impl<S: ObjectStore> TextDetector for TesseractDetector<S> {
        async fn detect_text(&self, image: &ObjectRef) -> Result<Vec<TextAnnotation>, OcrError> {
            let bytes = self.store.read(image).await?;
            let data_path = self.data_path.clone();
            let lang = self.lang.clone();

            let text = tokio::task::spawn_blocking(move || {
                let mut lt = LepTess::new(data_path.as_deref(), &lang)
                    .map_err(|e| OcrError::Engine(e.to_string()))?;
                lt.set_image_from_mem(&bytes)
                    .map_err(|e| OcrError::ImageDecode(e.to_string()))?;
                lt.get_utf8_text().map_err(|e| OcrError::Engine(e.to_string()))
            })
            .await
            .map_err(|e| OcrError::Engine(e.to_string()))??;

            if text.trim().is_empty() {
                Ok(vec![])
            } else {
                Ok(vec![TextAnnotation::new(text)])
            }
        }
    }
}
