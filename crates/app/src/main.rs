use anyhow::Context;
use placard_core::PipelineConfig;
use placard_messaging::ChannelTopic;
use placard_ocr::{FormPipeline, TextDetector};
use placard_storage::LocalObjectStore;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

mod intake;

/// Root directory of the local object store; each bucket is a subdirectory.
const PLACARD_ROOT: &str = "PLACARD_ROOT";
/// Bucket watched for new form photographs.
const PLACARD_INTAKE_BUCKET: &str = "PLACARD_INTAKE_BUCKET";

fn store_root() -> anyhow::Result<PathBuf> {
    if let Some(root) = std::env::var_os(PLACARD_ROOT).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(root));
    }
    let project_dirs = directories::ProjectDirs::from("com", "placard", "Placard")
        .context("Failed to get app directory")?;
    Ok(project_dirs.data_dir().join("buckets"))
}

#[cfg(feature = "tesseract")]
fn build_detector(store: &Arc<LocalObjectStore>) -> Arc<dyn TextDetector> {
    use placard_ocr::recognizer::tesseract_backend::TesseractDetector;
    Arc::new(TesseractDetector::new(store.clone(), None, "eng"))
}

#[cfg(not(feature = "tesseract"))]
fn build_detector(_store: &Arc<LocalObjectStore>) -> Arc<dyn TextDetector> {
    tracing::warn!("Built without the `tesseract` feature; OCR finds no text and every field will be empty");
    Arc::new(placard_ocr::MockDetector::new())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = PipelineConfig::from_env().context("Failed to load pipeline configuration")?;
    let root = store_root()?;
    let intake_bucket = std::env::var(PLACARD_INTAKE_BUCKET)
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "intake".to_string());

    let store = Arc::new(LocalObjectStore::new(root));
    let intake_dir = store.bucket_dir(&intake_bucket);
    std::fs::create_dir_all(&intake_dir).context("Failed to create intake directory")?;

    // ── Stage handoff ─────────────────────────────────────────────────────────
    // The topic is the only link between the extract and persist stages.
    let (topic, mut subscription) = ChannelTopic::new(config.topic_path(), 64);
    let detector = build_detector(&store);
    let pipeline = Arc::new(FormPipeline::new(store.clone(), detector, topic, config));

    let saver = pipeline.clone();
    let stage_two = tokio::spawn(async move {
        while let Some(event) = subscription.next_event().await {
            match saver.save_result(&event).await {
                Ok(target) => tracing::info!("Result stored: {}", target),
                Err(e) => tracing::warn!("Save pipeline error: {e}"),
            }
        }
    });

    // ── Watch folder ──────────────────────────────────────────────────────────
    // The watcher must be kept alive for the duration of the process.
    let (event_tx, mut event_rx) = mpsc::channel(64);
    let _watcher = intake::spawn_intake_watcher(store.clone(), &intake_bucket, event_tx)
        .context("Failed to start intake folder watcher")?;
    tracing::info!("Watching intake folder: {}", intake_dir.display());

    loop {
        tokio::select! {
            Some(event) = event_rx.recv() => {
                if let Err(e) = pipeline.process_image(&event).await {
                    if e.is_validation() {
                        tracing::warn!("Rejected {}: {e}", event.data.name);
                    } else {
                        tracing::warn!("Extract pipeline error for {}: {e}", event.data.name);
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutting down");
                break;
            }
        }
    }

    stage_two.abort();
    Ok(())
}
