//! Persistence of the contribution list.
//!
//! The persisted form is an ordered JSON array of numbers with no
//! versioning. Loading never fails: missing or corrupt data yields an empty
//! list and entries that are not numbers are dropped.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, warn};

use super::database::Database;
use crate::error::StorageError;

/// Key used when none is configured.
pub const DEFAULT_STORAGE_KEY: &str = "gclass:contribs";

pub trait ContributionStore {
    /// Persisted amounts in insertion order. Empty when nothing usable is stored.
    fn load(&self) -> Vec<f64>;

    /// Replace the persisted amounts.
    fn save(&mut self, amounts: &[f64]) -> Result<(), StorageError>;
}

/// Decode a persisted blob.
///
/// Numbers and numeric strings are kept; null, booleans, objects, nested
/// arrays, non-finite and negative values are dropped. Anything that is not
/// a JSON array is `CorruptPersistedState`.
pub fn decode_contributions(raw: &str) -> Result<Vec<f64>, StorageError> {
    let value: serde_json::Value = serde_json::from_str(raw)
        .map_err(|e| StorageError::CorruptPersistedState(e.to_string()))?;
    let items = value.as_array().ok_or_else(|| {
        StorageError::CorruptPersistedState("expected a JSON array of numbers".into())
    })?;

    let amounts: Vec<f64> = items
        .iter()
        .filter_map(|item| match item {
            serde_json::Value::Number(n) => n.as_f64(),
            serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        })
        .filter(|a| a.is_finite() && *a >= 0.0)
        .collect();

    if amounts.len() != items.len() {
        debug!(
            dropped = items.len() - amounts.len(),
            "discarded non-numeric persisted entries"
        );
    }
    Ok(amounts)
}

/// Contributions stored as one JSON blob in the SQLite kv table.
pub struct KvContributionStore {
    db: Database,
    key: String,
}

impl KvContributionStore {
    pub fn new(db: Database, key: impl Into<String>) -> Self {
        Self {
            db,
            key: key.into(),
        }
    }

    /// Raw stored blob, if any.
    pub fn raw(&self) -> Result<Option<String>, StorageError> {
        Ok(self.db.kv_get(&self.key)?)
    }
}

impl ContributionStore for KvContributionStore {
    fn load(&self) -> Vec<f64> {
        let raw = match self.raw() {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(key = %self.key, error = %e, "failed to read contributions, starting empty");
                return Vec::new();
            }
        };
        match decode_contributions(&raw) {
            Ok(amounts) => amounts,
            Err(e) => {
                warn!(key = %self.key, error = %e, "persisted contributions unreadable, starting empty");
                Vec::new()
            }
        }
    }

    fn save(&mut self, amounts: &[f64]) -> Result<(), StorageError> {
        let json = serde_json::to_string(amounts)?;
        self.db.kv_set(&self.key, &json)?;
        Ok(())
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    amounts: Vec<f64>,
    writes: usize,
    fail_writes: bool,
}

/// In-process store. Clones share the same contents, so a test can keep a
/// handle after moving the store into a session.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Rc<RefCell<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_amounts(amounts: Vec<f64>) -> Self {
        let store = Self::default();
        store.state.borrow_mut().amounts = amounts;
        store
    }

    pub fn amounts(&self) -> Vec<f64> {
        self.state.borrow().amounts.clone()
    }

    /// Number of successful saves.
    pub fn writes(&self) -> usize {
        self.state.borrow().writes
    }

    /// Make every subsequent save fail, simulating unavailable storage.
    pub fn fail_writes(&self, fail: bool) {
        self.state.borrow_mut().fail_writes = fail;
    }
}

impl ContributionStore for MemoryStore {
    fn load(&self) -> Vec<f64> {
        self.amounts()
    }

    fn save(&mut self, amounts: &[f64]) -> Result<(), StorageError> {
        let mut state = self.state.borrow_mut();
        if state.fail_writes {
            return Err(StorageError::DataDir(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "storage unavailable",
            )));
        }
        state.amounts = amounts.to_vec();
        state.writes += 1;
        Ok(())
    }
}
