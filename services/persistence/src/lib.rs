//! Persistence service
//!
//! Snapshot-based persistence for the matching engine: a single JSON
//! document holding every symbol's resting orders, pending triggers, last
//! trade price and retained trades, written atomically on a timer and on
//! shutdown. Recovery is a deterministic replay of the document.

pub mod service;
pub mod snapshot;

pub use service::{SnapshotService, SnapshotSource};
pub use snapshot::{
    load_or_empty, SnapshotDocument, SnapshotError, SnapshotLoader, SnapshotWriter,
    SymbolSnapshot, SNAPSHOT_VERSION,
};
