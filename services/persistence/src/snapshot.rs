//! Snapshot document and atomic file I/O
//!
//! The entire engine state persists as a single JSON document: per symbol,
//! the resting limit orders (FIFO order preserved), the pending trigger
//! orders, the last trade price, and the retained trade window. Writes go
//! to `<path>.tmp`, are fsynced, and land with an atomic rename, so the
//! file on disk is always a complete snapshot.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{error, info};
use types::numeric::Price;
use types::order::Order;
use types::trade::Trade;

// ── Errors ──────────────────────────────────────────────────────────

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("unsupported snapshot version: {0}")]
    UnsupportedVersion(u32),
}

// ── Document ────────────────────────────────────────────────────────

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Persisted state of one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolSnapshot {
    /// Resting limit orders, best price first, FIFO within a level.
    /// Replaying them in this order reconstructs time priority exactly.
    pub open_orders: Vec<Order>,
    /// Pending trigger orders in their firing (insertion) order.
    pub triggers: Vec<Order>,
    pub last_trade_price: Option<Price>,
    /// Retained trade window, oldest first.
    pub recent_trades: Vec<Trade>,
}

/// A complete snapshot of the engine state.
///
/// Symbols are keyed in a `BTreeMap`, so serialization order is
/// deterministic and a capture → restore → capture round trip is
/// byte-identical.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotDocument {
    pub version: u32,
    pub symbols: BTreeMap<String, SymbolSnapshot>,
}

impl SnapshotDocument {
    pub fn empty() -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            symbols: BTreeMap::new(),
        }
    }
}

impl Default for SnapshotDocument {
    fn default() -> Self {
        Self::empty()
    }
}

// ── Writer ──────────────────────────────────────────────────────────

/// Writes snapshot documents atomically to a fixed path.
pub struct SnapshotWriter {
    path: PathBuf,
}

impl SnapshotWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Serialize and write: tmp file, fsync, rename.
    pub fn write(&self, document: &SnapshotDocument) -> Result<(), SnapshotError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let data = serde_json::to_vec(document)?;
        let tmp_path = self.path.with_extension("json.tmp");
        {
            let mut file = File::create(&tmp_path)?;
            file.write_all(&data)?;
            file.sync_all()?;
        }
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

// ── Loader ──────────────────────────────────────────────────────────

/// Loads snapshot documents, verifying the format version.
pub struct SnapshotLoader {
    path: PathBuf,
}

impl SnapshotLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn load(&self) -> Result<SnapshotDocument, SnapshotError> {
        let data = fs::read(&self.path)?;
        let document: SnapshotDocument = serde_json::from_slice(&data)?;
        if document.version > SNAPSHOT_VERSION {
            return Err(SnapshotError::UnsupportedVersion(document.version));
        }
        Ok(document)
    }
}

/// Load a snapshot for startup, degrading to an empty document.
///
/// A missing file is a normal cold start; anything else (unreadable file,
/// parse failure, bad version) is logged and the engine starts empty
/// rather than halting.
pub fn load_or_empty(path: &Path) -> SnapshotDocument {
    match SnapshotLoader::new(path).load() {
        Ok(document) => {
            info!(path = %path.display(), symbols = document.symbols.len(), "snapshot loaded");
            document
        }
        Err(SnapshotError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            info!(path = %path.display(), "no snapshot found, starting empty");
            SnapshotDocument::empty()
        }
        Err(e) => {
            error!(path = %path.display(), error = %e, "snapshot unusable, starting empty");
            SnapshotDocument::empty()
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use tempfile::TempDir;
    use types::ids::{IdGenerator, OrderId, Symbol, TradeId};
    use types::order::{OrderType, Side};

    fn sample_document() -> SnapshotDocument {
        let ids = IdGenerator::new();
        let mut order = Order::new(
            ids.next_order_id(),
            Symbol::new("BTC-USD"),
            Side::Sell,
            OrderType::Limit,
            "1".parse().unwrap(),
            Some("30000".parse().unwrap()),
            None,
            None,
            Some("client-1".to_string()),
        );
        order.fill("0.3".parse().unwrap());

        let trade = Trade::new(
            TradeId::from_string("trd-2"),
            Symbol::new("BTC-USD"),
            "30000".parse().unwrap(),
            "0.3".parse().unwrap(),
            Side::Buy,
            order.order_id.clone(),
            OrderId::from_string("ord-9"),
            "2024-02-17T00:04:16.789000Z".to_string(),
            Decimal::new(-9, 1),
            Decimal::new(225, 2),
        );

        let mut document = SnapshotDocument::empty();
        document.symbols.insert(
            "BTC-USD".to_string(),
            SymbolSnapshot {
                open_orders: vec![order],
                triggers: Vec::new(),
                last_trade_price: Some("30000".parse().unwrap()),
                recent_trades: vec![trade],
            },
        );
        document
    }

    #[test]
    fn test_write_and_load_round_trip() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("state.json");
        let document = sample_document();

        SnapshotWriter::new(&path).write(&document).unwrap();
        let loaded = SnapshotLoader::new(&path).load().unwrap();

        assert_eq!(loaded, document);
    }

    #[test]
    fn test_write_is_byte_stable() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("state.json");
        let document = sample_document();

        SnapshotWriter::new(&path).write(&document).unwrap();
        let first = fs::read(&path).unwrap();

        let loaded = SnapshotLoader::new(&path).load().unwrap();
        SnapshotWriter::new(&path).write(&loaded).unwrap();
        let second = fs::read(&path).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_no_tmp_file_left_behind() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("state.json");
        SnapshotWriter::new(&path).write(&sample_document()).unwrap();

        assert!(path.exists());
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_creates_parent_directories() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested/state/state.json");
        SnapshotWriter::new(&path).write(&sample_document()).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_load_or_empty_missing_file() {
        let tmp = TempDir::new().unwrap();
        let document = load_or_empty(&tmp.path().join("absent.json"));
        assert_eq!(document, SnapshotDocument::empty());
    }

    #[test]
    fn test_load_or_empty_corrupt_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("state.json");
        fs::write(&path, b"{ not json").unwrap();

        let document = load_or_empty(&path);
        assert_eq!(document, SnapshotDocument::empty());
    }

    #[test]
    fn test_unsupported_version_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("state.json");
        fs::write(&path, br#"{"version": 99, "symbols": {}}"#).unwrap();

        assert!(matches!(
            SnapshotLoader::new(&path).load(),
            Err(SnapshotError::UnsupportedVersion(99))
        ));
        assert_eq!(load_or_empty(&path), SnapshotDocument::empty());
    }
}
