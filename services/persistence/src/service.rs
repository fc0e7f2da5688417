//! Background snapshot service
//!
//! A dedicated thread captures and writes a snapshot every interval and
//! once more on shutdown, so the loss window is bounded by the interval.
//! Capture is the source's concern; it should hold each symbol's lock only
//! long enough to clone that symbol's state.

use std::path::PathBuf;
use std::sync::mpsc::{channel, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::snapshot::{SnapshotDocument, SnapshotWriter};

// ── Source ──────────────────────────────────────────────────────────

/// Supplier of snapshot documents; implemented by the matching engine.
pub trait SnapshotSource: Send + Sync + 'static {
    /// Capture a consistent view of the current state.
    fn capture(&self) -> SnapshotDocument;
}

// ── Service ─────────────────────────────────────────────────────────

/// Periodic snapshot writer running on its own thread.
pub struct SnapshotService {
    shutdown: Sender<()>,
    handle: Option<JoinHandle<()>>,
}

impl SnapshotService {
    /// Start snapshotting `source` to `path` every `interval`.
    pub fn start(
        source: Arc<dyn SnapshotSource>,
        path: impl Into<PathBuf>,
        interval: Duration,
    ) -> Self {
        let path = path.into();
        let (shutdown, shutdown_rx) = channel::<()>();
        let handle = std::thread::spawn(move || {
            let writer = SnapshotWriter::new(&path);
            info!(path = %path.display(), interval_ms = interval.as_millis() as u64, "snapshot service started");
            loop {
                match shutdown_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {
                        persist(&writer, source.as_ref(), &path);
                    }
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                        // Final write so graceful shutdown loses nothing
                        persist(&writer, source.as_ref(), &path);
                        info!(path = %path.display(), "snapshot service stopped");
                        break;
                    }
                }
            }
        });
        Self {
            shutdown,
            handle: Some(handle),
        }
    }

    /// Stop the service after one final snapshot write.
    pub fn stop(mut self) {
        let _ = self.shutdown.send(());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for SnapshotService {
    fn drop(&mut self) {
        let _ = self.shutdown.send(());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn persist(writer: &SnapshotWriter, source: &dyn SnapshotSource, path: &std::path::Path) {
    let document = source.capture();
    match writer.write(&document) {
        Ok(()) => debug!(path = %path.display(), symbols = document.symbols.len(), "snapshot written"),
        Err(e) => warn!(path = %path.display(), error = %e, "snapshot write failed"),
    }
}

// ── Tests ───────────────────────────────────────────────────────────
