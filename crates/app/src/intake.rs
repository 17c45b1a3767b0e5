use notify::event::{AccessKind, AccessMode};
use notify::{EventKind, RecursiveMode, Watcher};
use placard_core::{CloudEvent, StorageObjectData};
use placard_storage::LocalObjectStore;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Map a filesystem event inside the store root to "object finalized" events.
///
/// An object is finalized when a writer closes it, not when it is created.
/// The store's own writes are renamed into place from a staging file, so the
/// pipeline overwriting a source image does not trigger another run.
pub fn finalized_events(
    store: &LocalObjectStore,
    event: &notify::Event,
) -> Vec<CloudEvent<StorageObjectData>> {
    if event.kind != EventKind::Access(AccessKind::Close(AccessMode::Write)) {
        return vec![];
    }
    event
        .paths
        .iter()
        .filter(|p| !p.is_dir())
        .filter_map(|p| store.object_for_path(p))
        .map(|object| CloudEvent::object_finalized(&object))
        .collect()
}

/// Spawn a notify watcher on the intake bucket directory that sends an event
/// to `tx` for every new object.
/// Returns the watcher; it must be kept alive for watching to continue.
pub fn spawn_intake_watcher(
    store: Arc<LocalObjectStore>,
    bucket: &str,
    tx: mpsc::Sender<CloudEvent<StorageObjectData>>,
) -> notify::Result<impl Watcher> {
    let dir = store.bucket_dir(bucket);

    let mut watcher = notify::recommended_watcher(move |event: notify::Result<notify::Event>| {
        match event {
            Ok(ev) => {
                for finalized in finalized_events(&store, &ev) {
                    if tx.try_send(finalized).is_err() {
                        tracing::warn!("Intake queue full or closed; dropped event for {:?}", ev.paths);
                    }
                }
            }
            Err(e) => tracing::warn!("Intake watcher error: {e}"),
        }
    })?;

    watcher.watch(&dir, RecursiveMode::NonRecursive)?;
    Ok(watcher)
}
