//! Per-gesture refractory filter.
//!
//! The sensor pipeline re-delivers a held or re-detected pose in quick
//! bursts. The filter admits an event only when enough time has passed since
//! the last admitted event of the same kind. Rejections are expected noise,
//! not failures, and are logged at trace level only.

use crate::driver::types::GestureKind;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use tracing::trace;

/// Default refractory window. Exceeds typical duplicate-delivery jitter while
/// staying well under human reaction time for distinct repeated gestures.
pub const DEFAULT_REFRACTORY_MS: u64 = 200;

/// Suppresses re-delivery of the same gesture kind within a short window.
#[derive(Debug)]
pub struct DebounceFilter {
    refractory: Duration,
    last_admitted: HashMap<GestureKind, DateTime<Utc>>,
}

impl DebounceFilter {
    pub fn new(refractory_ms: u64) -> Self {
        Self {
            refractory: Duration::milliseconds(refractory_ms as i64),
            last_admitted: HashMap::new(),
        }
    }

    /// Admit `kind` at `timestamp` iff the previous admitted event of the
    /// same kind is older than the refractory window.
    pub fn admit(&mut self, kind: GestureKind, timestamp: DateTime<Utc>) -> bool {
        match self.last_admitted.get(&kind) {
            Some(last) if timestamp - *last <= self.refractory => {
                trace!(%kind, "debounced duplicate gesture");
                false
            }
            _ => {
                self.last_admitted.insert(kind, timestamp);
                true
            }
        }
    }

    /// Forget all admission history (session restart).
    pub fn reset(&mut self) {
        self.last_admitted.clear();
    }
}

impl Default for DebounceFilter {
    fn default() -> Self {
        Self::new(DEFAULT_REFRACTORY_MS)
    }
}
