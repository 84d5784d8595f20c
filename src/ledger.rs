//! Durable ledger of leads that were already contacted.
//!
//! The ledger is the authority for "already sent". It lives on local disk as
//! a JSON array of lead ids and is rewritten wholesale on every save:
//!
//! ```json
//! ["A-17", "B-02", 14]
//! ```
//!
//! Loading fails open. A missing or corrupt file yields an empty ledger, so a
//! damaged file never blocks a run (at the cost of possibly re-contacting
//! leads recorded in it).

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, warn};

use crate::error::LedgerError;
use crate::leads::LeadId;

/// In-memory set of contacted lead ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    ids: HashSet<LeadId>,
}

impl Ledger {
    pub fn contains(&self, id: &LeadId) -> bool {
        self.ids.contains(id)
    }

    /// Record a contacted lead. Returns `false` if it was already present.
    pub fn insert(&mut self, id: LeadId) -> bool {
        self.ids.insert(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Ids in stable order, used for serialization.
    pub fn sorted_ids(&self) -> Vec<&LeadId> {
        let mut ids: Vec<&LeadId> = self.ids.iter().collect();
        ids.sort();
        ids
    }
}

impl FromIterator<LeadId> for Ledger {
    fn from_iter<T: IntoIterator<Item = LeadId>>(iter: T) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}

/// Storage backend for the ledger.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Load the ledger. Never fails: errors yield an empty ledger.
    async fn load(&self) -> Ledger;

    /// Replace the stored ledger with `ledger`.
    async fn save(&self, ledger: &Ledger) -> Result<(), LedgerError>;
}

/// JSON-file ledger with write-to-temp-then-rename saves.
#[derive(Debug, Clone)]
pub struct FileLedgerStore {
    path: PathBuf,
}

impl FileLedgerStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> LedgerError {
        LedgerError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }
}

#[async_trait]
impl LedgerStore for FileLedgerStore {
    async fn load(&self) -> Ledger {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No ledger file yet, starting empty");
                return Ledger::default();
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Ledger unreadable, starting empty");
                return Ledger::default();
            }
        };

        match serde_json::from_str::<Vec<LeadId>>(&raw) {
            Ok(ids) => {
                let ledger: Ledger = ids.into_iter().collect();
                debug!(path = %self.path.display(), count = ledger.len(), "Loaded ledger");
                ledger
            }
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Ledger corrupt, starting empty; previously contacted leads may be re-contacted"
                );
                Ledger::default()
            }
        }
    }

    async fn save(&self, ledger: &Ledger) -> Result<(), LedgerError> {
        let json = serde_json::to_string_pretty(&ledger.sorted_ids())?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_error(e))?;
        }

        let mut tmp = self.path.clone();
        tmp.set_extension("tmp");
        fs::write(&tmp, json).await.map_err(|e| self.io_error(e))?;
        fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| self.io_error(e))?;

        debug!(path = %self.path.display(), count = ledger.len(), "Saved ledger");
        Ok(())
    }
}
