//! Real-time coaching feedback: threshold evaluation, violation tracking,
//! and the alert lifecycle.
//!
//! [`FeedbackEngine`] is the session loop's single entry point. Each
//! analysis cycle feeds one [`MetricSample`](crate::metrics::MetricSample)
//! through [`FeedbackEngine::process`], which expires any finished display,
//! evaluates every enabled metric, and fires at most one new alert.

mod alert;
mod evaluator;
mod notify;
mod tracker;

pub use alert::{AlertCoordinator, AlertState, ALERT_DISPLAY};
pub use evaluator::{grace_period, AlertRequest, ThresholdEvaluator, FILLER_SMOOTHING_WINDOW};
pub use notify::{AlertNotice, LogNotifier, NotificationSink, HAPTIC_PATTERN_MS};
pub use tracker::{MetricState, ViolationTracker};

#[cfg(test)]
pub use notify::RecordingSink;

use std::sync::Arc;
use std::time::Instant;

use crate::config::ThresholdConfig;
use crate::metrics::MetricSample;

// ---------------------------------------------------------------------------
// FeedbackEngine
// ---------------------------------------------------------------------------

/// Ties the evaluator and the alert coordinator together for the session
/// loop.
pub struct FeedbackEngine {
    evaluator: ThresholdEvaluator,
    coordinator: AlertCoordinator,
}

impl FeedbackEngine {
    pub fn new(config: &ThresholdConfig, sink: Arc<dyn NotificationSink>) -> Self {
        Self {
            evaluator: ThresholdEvaluator::new(config),
            coordinator: AlertCoordinator::new(sink),
        }
    }

    /// True when at least one metric survived config parsing and is coached.
    pub fn any_metric_active(&self) -> bool {
        self.evaluator.any_active()
    }

    /// Raw dB reading minus the calibrated zero point, for status display.
    pub fn adjusted_volume(&self, raw_db: f64) -> f64 {
        self.evaluator.adjusted_volume(raw_db)
    }

    /// The alert currently on display, if any.
    pub fn active_alert(&self) -> Option<&AlertState> {
        self.coordinator.active()
    }

    /// Expire a finished alert display without feeding a sample.
    ///
    /// Called between analysis cycles so a display clears on time even when
    /// capture or analysis is slow.
    pub fn tick(&mut self, now: Instant) {
        self.coordinator.tick(now);
    }

    /// Run one analysis cycle's worth of feedback.
    ///
    /// Returns the alert fired this cycle, if any. Multiple metrics crossing
    /// their triggers in the same cycle produce one alert; the losers restart
    /// their violation timers.
    pub fn process(&mut self, sample: &MetricSample, now: Instant) -> Option<AlertState> {
        self.coordinator.tick(now);

        let mut fired = None;
        for request in self.evaluator.evaluate(sample, now) {
            if self.coordinator.fire(request.metric, request.message, now) {
                self.evaluator.confirm_fire(request.metric, now);
                fired = self.coordinator.active().cloned();
            } else {
                self.evaluator.decline_fire(request.metric, now);
            }
        }
        fired
    }

    /// Drop any active alert immediately. Used on session stop.
    pub fn reset_display(&mut self) {
        self.coordinator.clear();
    }

    #[cfg(test)]
    pub fn metric_state(&self, kind: crate::metrics::MetricKind) -> MetricState {
        self.evaluator.state(kind)
    }
}

// ---------------------------------------------------------------------------
// Tests — full-engine scenarios
// ---------------------------------------------------------------------------
