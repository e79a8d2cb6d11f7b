//! Alert lifecycle: at most one active alert, fixed display duration, one
//! sink call per fire.
//!
//! [`AlertCoordinator`] owns the active [`AlertState`]. `fire` while an
//! alert is already showing is a no-op — a second metric's simultaneous
//! violation is dropped, never queued. The display auto-clears after
//! [`ALERT_DISPLAY`]; clearing is driven by `tick(now)` so wall-clock drift
//! in the capture loop cannot stretch an alert.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::metrics::MetricKind;

use super::notify::{AlertNotice, NotificationSink, HAPTIC_PATTERN_MS};

/// How long a fired alert stays on screen.
pub const ALERT_DISPLAY: Duration = Duration::from_secs(3);

// ---------------------------------------------------------------------------
// AlertState
// ---------------------------------------------------------------------------

/// The one currently-displayed alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertState {
    pub metric: MetricKind,
    pub message: &'static str,
    pub started_at: Instant,
}

// ---------------------------------------------------------------------------
// AlertCoordinator
// ---------------------------------------------------------------------------

/// Enforces the at-most-one-active-alert invariant and drives the display
/// window.
pub struct AlertCoordinator {
    sink: Arc<dyn NotificationSink>,
    active: Option<AlertState>,
}

impl AlertCoordinator {
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self { sink, active: None }
    }

    /// The alert currently on display, if any.
    pub fn active(&self) -> Option<&AlertState> {
        self.active.as_ref()
    }

    /// Clear the display once its window has elapsed.
    ///
    /// Returns the alert that just cleared, so the caller can start the
    /// originating metric's grace window.
    pub fn tick(&mut self, now: Instant) -> Option<AlertState> {
        let expired = self
            .active
            .as_ref()
            .is_some_and(|a| now.duration_since(a.started_at) >= ALERT_DISPLAY);
        if expired {
            let cleared = self.active.take();
            if let Some(a) = &cleared {
                log::debug!("alert cleared: [{}] {}", a.metric, a.message);
            }
            return cleared;
        }
        None
    }

    /// Activate an alert for `metric` unless one is already showing.
    ///
    /// On success the notification sink is called exactly once and `true`
    /// is returned. When an alert is already active the request is dropped
    /// and `false` is returned.
    pub fn fire(&mut self, metric: MetricKind, message: &'static str, now: Instant) -> bool {
        if self.active.is_some() {
            log::debug!("alert for [{metric}] dropped — another alert is active");
            return false;
        }

        self.active = Some(AlertState {
            metric,
            message,
            started_at: now,
        });

        self.sink.notify(&AlertNotice {
            metric,
            message,
            haptic_pattern_ms: HAPTIC_PATTERN_MS,
        });
        log::info!("alert fired: [{metric}] {message}");
        true
    }

    /// Drop any active alert without waiting out the display window.
    ///
    /// Used on session stop so a stale overlay cannot outlive the session.
    pub fn clear(&mut self) {
        self.active = None;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feedback::notify::RecordingSink;

    fn at(base: Instant, secs: f64) -> Instant {
        base + Duration::from_secs_f64(secs)
    }

    fn make() -> (AlertCoordinator, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::new());
        (AlertCoordinator::new(Arc::clone(&sink) as _), sink)
    }

    #[test]
    fn fire_activates_and_notifies_once() {
        let base = Instant::now();
        let (mut coord, sink) = make();

        assert!(coord.fire(MetricKind::Speed, "Talk slower", base));
        assert_eq!(sink.count(), 1);
        assert_eq!(coord.active().unwrap().message, "Talk slower");
    }

    #[test]
    fn second_fire_while_active_is_dropped() {
        let base = Instant::now();
        let (mut coord, sink) = make();

        assert!(coord.fire(MetricKind::Speed, "Talk slower", base));
        assert!(!coord.fire(MetricKind::Volume, "Speak louder", at(base, 1.0)));

        // Sink was not called for the dropped alert; the original stays up.
        assert_eq!(sink.count(), 1);
        assert_eq!(coord.active().unwrap().metric, MetricKind::Speed);
    }

    #[test]
    fn display_auto_clears_after_three_seconds() {
        let base = Instant::now();
        let (mut coord, _sink) = make();
        coord.fire(MetricKind::Filler, "Reduce filler words", base);

        assert!(coord.tick(at(base, 2.9)).is_none());
        let cleared = coord.tick(at(base, 3.0)).expect("alert should clear");
        assert_eq!(cleared.metric, MetricKind::Filler);
        assert!(coord.active().is_none());
    }

    #[test]
    fn fire_allowed_again_after_clear() {
        let base = Instant::now();
        let (mut coord, sink) = make();
        coord.fire(MetricKind::Speed, "Talk slower", base);
        coord.tick(at(base, 3.0));

        assert!(coord.fire(MetricKind::Volume, "Speak louder", at(base, 4.0)));
        assert_eq!(sink.count(), 2);
    }

    #[test]
    fn clear_removes_active_alert_immediately() {
        let base = Instant::now();
        let (mut coord, _sink) = make();
        coord.fire(MetricKind::Speed, "Talk slower", base);
        coord.clear();
        assert!(coord.active().is_none());
    }

    #[test]
    fn tick_without_active_alert_is_a_no_op() {
        let (mut coord, _sink) = make();
        assert!(coord.tick(Instant::now()).is_none());
    }
}
