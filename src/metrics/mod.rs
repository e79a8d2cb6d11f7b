//! Metric primitives shared by the whole feedback engine.
//!
//! * [`MetricKind`] — the three coached metrics (speed, volume, filler).
//! * [`MetricSample`] — one cycle's worth of readings from the analysis
//!   service. Immutable; consumed by the evaluator and then discarded (only
//!   aggregates survive in the [`HistoryBuffer`]).
//! * [`HistoryBuffer`] — small per-metric rolling window used to smooth noisy
//!   single-sample readings.

pub mod history;

pub use history::HistoryBuffer;

use std::time::Instant;

// ---------------------------------------------------------------------------
// MetricKind
// ---------------------------------------------------------------------------

/// The three speech metrics the engine coaches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    /// Speaking rate in words per minute.
    Speed,
    /// Loudness in decibels, relative to the calibrated zero point.
    Volume,
    /// Count of filler words ("um", "uh", …) in the analysed segment.
    Filler,
}

impl MetricKind {
    /// All metric kinds, in evaluation order.
    pub const ALL: [MetricKind; 3] = [MetricKind::Speed, MetricKind::Volume, MetricKind::Filler];

    /// Short lowercase name used in log lines and status displays.
    pub fn name(&self) -> &'static str {
        match self {
            MetricKind::Speed => "speed",
            MetricKind::Volume => "volume",
            MetricKind::Filler => "filler",
        }
    }
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// MetricSample
// ---------------------------------------------------------------------------

/// One analysis cycle's readings.
///
/// Produced by a [`MetricAnalyzer`](crate::analyze::MetricAnalyzer) from a
/// short audio segment. A failed analysis produces *no* sample — absence of a
/// sample must never be substituted with zeros.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSample {
    /// Speaking rate in words per minute (≥ 0).
    pub speed_wpm: f64,
    /// Raw volume in decibels, typically negative. The evaluator subtracts
    /// the calibrated zero point before comparing against thresholds.
    pub volume_db: f64,
    /// Filler words detected in the segment.
    pub filler_count: u32,
    /// When the segment finished analysis.
    pub captured_at: Instant,
}

impl MetricSample {
    /// Value of a single metric as an `f64`, for uniform history handling.
    pub fn value(&self, kind: MetricKind) -> f64 {
        match kind {
            MetricKind::Speed => self.speed_wpm,
            MetricKind::Volume => self.volume_db,
            MetricKind::Filler => f64::from(self.filler_count),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
