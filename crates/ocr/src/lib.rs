pub mod crop;
pub mod extract;
pub mod pipeline;
pub mod preprocess;
pub mod recognizer;
pub mod types;

pub use crop::{crop_region, crop_regions, staged_name, CropError, CroppedRegion, StagedRegions};
pub use extract::Extractor;
pub use pipeline::{decode_message, FormPipeline, PayloadError, PipelineError};
pub use preprocess::{normalize_geometry, CanonicalImage, GeometryError, PreprocessError, ResizePlan};
pub use recognizer::{MockDetector, OcrError, TextAnnotation, TextDetector};
pub use types::{ExtractStage, Published, SaveStage};
