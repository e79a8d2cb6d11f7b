//! Fixed-capacity rolling window per metric, used to smooth noisy readings.
//!
//! The buffer keeps the newest `capacity` values for each [`MetricKind`];
//! pushing into a full window evicts the oldest value, so insertion order is
//! time order. Averaging never fails: an empty window averages to `0.0`, and
//! a window shorter than the requested size averages what is there.

use std::collections::HashMap;

use crate::metrics::MetricKind;

/// Number of values retained per metric.
///
/// The filler policy only needs the last two samples; a little headroom keeps
/// the buffer useful for status displays without growing unbounded.
pub const HISTORY_CAPACITY: usize = 8;

// ---------------------------------------------------------------------------
// HistoryBuffer
// ---------------------------------------------------------------------------

/// Per-metric rolling value window.
#[derive(Debug, Default)]
pub struct HistoryBuffer {
    values: HashMap<MetricKind, Vec<f64>>,
}

impl HistoryBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `value` for `kind`, evicting the oldest value when the window
    /// is at capacity.
    pub fn push(&mut self, kind: MetricKind, value: f64) {
        let window = self.values.entry(kind).or_default();
        if window.len() == HISTORY_CAPACITY {
            window.remove(0);
        }
        window.push(value);
    }

    /// Mean of the newest `window` values for `kind`.
    ///
    /// Returns `0.0` when no values have been recorded, and the mean of the
    /// available values when fewer than `window` exist.
    pub fn average(&self, kind: MetricKind, window: usize) -> f64 {
        let Some(values) = self.values.get(&kind) else {
            return 0.0;
        };
        if values.is_empty() || window == 0 {
            return 0.0;
        }
        let take = window.min(values.len());
        let tail = &values[values.len() - take..];
        tail.iter().sum::<f64>() / take as f64
    }

    /// Newest recorded value for `kind`, if any.
    pub fn latest(&self, kind: MetricKind) -> Option<f64> {
        self.values.get(&kind).and_then(|v| v.last().copied())
    }

    /// Number of values currently stored for `kind`.
    pub fn len(&self, kind: MetricKind) -> usize {
        self.values.get(&kind).map_or(0, Vec::len)
    }

    /// Discard all stored values for all metrics.
    pub fn clear(&mut self) {
        self.values.clear();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
