//! First-visit flag store
//!
//! One persisted JSON record under a fixed key decides whether the one-time
//! intro sequence runs. Storage is never trusted: a failed read, malformed
//! record, or expired timestamp all degrade to "first visit", and a failed
//! write is ignored.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use passage_platform::KeyValueStore;

/// Storage key for the visit record
pub const FIRST_VISIT_KEY: &str = "passage_first_visit";

/// How long a recorded visit stays valid (one week)
pub const RETENTION_WINDOW_MS: u64 = 7 * 24 * 60 * 60 * 1000;

#[derive(Serialize, Deserialize)]
struct VisitRecord {
    timestamp: u64,
}

/// Reads and writes the persisted first-visit marker
#[derive(Clone)]
pub struct VisitStore {
    store: Arc<dyn KeyValueStore>,
    key: &'static str,
    window_ms: u64,
}

impl VisitStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            key: FIRST_VISIT_KEY,
            window_ms: RETENTION_WINDOW_MS,
        }
    }

    /// Override the retention window (tests, shorter campaigns)
    pub fn with_window(mut self, window_ms: u64) -> Self {
        self.window_ms = window_ms;
        self
    }

    /// Whether this load counts as a first visit
    ///
    /// True if no record exists, the record is malformed, or it is older
    /// than the retention window. Expired and malformed records are removed
    /// as a side effect.
    pub fn is_first_visit(&self) -> bool {
        self.is_first_visit_at(now_millis())
    }

    /// Deterministic variant taking the current time explicitly
    pub fn is_first_visit_at(&self, now_ms: u64) -> bool {
        let raw = match self.store.get(self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return true,
            Err(err) => {
                tracing::debug!(error = %err, "visit record unreadable; treating as first visit");
                return true;
            }
        };

        match serde_json::from_str::<VisitRecord>(&raw) {
            Ok(record) => {
                if now_ms.saturating_sub(record.timestamp) > self.window_ms {
                    // Expired; clean up so the next read is cheap
                    let _ = self.store.remove(self.key);
                    true
                } else {
                    false
                }
            }
            Err(err) => {
                tracing::debug!(error = %err, "visit record malformed; treating as first visit");
                let _ = self.store.remove(self.key);
                true
            }
        }
    }

    /// Overwrite the record with the current timestamp
    pub fn mark_visit_complete(&self) {
        self.mark_visit_complete_at(now_millis());
    }

    /// Deterministic variant taking the timestamp explicitly
    pub fn mark_visit_complete_at(&self, now_ms: u64) {
        let record = VisitRecord { timestamp: now_ms };
        // Serializing a two-field struct cannot fail; a storage write can,
        // and is deliberately ignored.
        if let Ok(raw) = serde_json::to_string(&record) {
            if let Err(err) = self.store.set(self.key, &raw) {
                tracing::debug!(error = %err, "visit record write failed; ignoring");
            }
        }
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
