//! JSON-backed watchlist persistence.
//!
//! The store is a flat JSON array on disk. Saves go through a temp file
//! and rename so a crash mid-write never leaves a truncated list behind.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use valuation_core::ValuationError;

/// One saved ticker with the valuation snapshot from the last analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchlistEntry {
    pub ticker: String,
    pub name: String,
    pub current_price: Option<f64>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    /// Discount rate as a percentage, e.g. 8.5
    pub wacc: Option<f64>,
    pub dcf_value: Option<f64>,
    pub peg_ratio: Option<f64>,
    pub lynch_value: Option<f64>,
    pub mean_reversion_value: Option<f64>,
    pub ev_ebitda: Option<f64>,
    pub momentum_6m: Option<f64>,
    pub added_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

pub struct WatchlistStore {
    path: PathBuf,
}

impl WatchlistStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All entries in insertion order. A missing or unreadable file is an
    /// empty watchlist, not an error.
    pub fn entries(&self) -> Vec<WatchlistEntry> {
        let Ok(raw) = fs::read_to_string(&self.path) else {
            return Vec::new();
        };
        match serde_json::from_str(&raw) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(
                    "Could not parse watchlist at {}: {}, starting empty",
                    self.path.display(),
                    e
                );
                Vec::new()
            }
        }
    }

    fn save(&self, entries: &[WatchlistEntry]) -> Result<(), ValuationError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .map_err(|e| ValuationError::StoreError(e.to_string()))?;
            }
        }

        let json = serde_json::to_string_pretty(entries)
            .map_err(|e| ValuationError::StoreError(e.to_string()))?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| ValuationError::StoreError(e.to_string()))?;
        fs::rename(&tmp, &self.path).map_err(|e| ValuationError::StoreError(e.to_string()))?;
        Ok(())
    }

    /// Insert or refresh an entry. Returns `true` when the ticker was new,
    /// `false` when an existing entry was updated in place. Updates keep
    /// the original `added_at`.
    pub fn upsert(&self, mut entry: WatchlistEntry) -> Result<bool, ValuationError> {
        let mut entries = self.entries();
        entry.last_updated = Utc::now();

        if let Some(existing) = entries.iter_mut().find(|e| e.ticker == entry.ticker) {
            entry.added_at = existing.added_at;
            *existing = entry;
            self.save(&entries)?;
            return Ok(false);
        }

        entry.added_at = entry.last_updated;
        entries.push(entry);
        self.save(&entries)?;
        Ok(true)
    }

    /// Remove a ticker. Returns `true` when something was removed.
    pub fn remove(&self, ticker: &str) -> Result<bool, ValuationError> {
        let mut entries = self.entries();
        let before = entries.len();
        entries.retain(|e| e.ticker != ticker);
        if entries.len() == before {
            return Ok(false);
        }
        self.save(&entries)?;
        Ok(true)
    }

    pub fn contains(&self, ticker: &str) -> bool {
        self.entries().iter().any(|e| e.ticker == ticker)
    }
}
