//! In-memory resolution cache.
//!
//! Keyed strictly on the cleaned 8-digit CEP. Stores the whole outcome, so
//! a `NotFound` is remembered for the same TTL as a hit. Default TTL: 1 hour.

use super::types::{CepError, LocationRecord};
use std::collections::HashMap;
use std::time::Duration;

pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

#[derive(Debug, Clone)]
struct CacheEntry {
    outcome: Result<LocationRecord, CepError>,
    timestamp: i64,
}

/// The resolution cache.
#[derive(Debug)]
pub struct ResultCache {
    ttl_ms: i64,
    entries: HashMap<String, CacheEntry>,
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl ResultCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl_ms: i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX),
            entries: HashMap::new(),
        }
    }

    fn is_live(&self, entry: &CacheEntry, now: i64) -> bool {
        now.saturating_sub(entry.timestamp) < self.ttl_ms
    }

    /// Look up a CEP. Returns None if missing or expired.
    pub fn get(&self, cep: &str) -> Option<Result<LocationRecord, CepError>> {
        let entry = self.entries.get(cep)?;
        let now = chrono::Utc::now().timestamp_millis();
        if !self.is_live(entry, now) {
            return None;
        }
        Some(entry.outcome.clone())
    }

    /// Store an outcome and drop anything that has expired.
    pub fn put(&mut self, cep: &str, outcome: Result<LocationRecord, CepError>) {
        let now = chrono::Utc::now().timestamp_millis();
        let ttl_ms = self.ttl_ms;
        self.entries
            .retain(|_, e| now.saturating_sub(e.timestamp) < ttl_ms);
        self.entries.insert(
            cep.to_string(),
            CacheEntry {
                outcome,
                timestamp: now,
            },
        );
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of entries, expired ones included until the next `put`.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
