//! Notification sink seam.
//!
//! The coordinator fires alerts into a [`NotificationSink`] — haptic pulse
//! plus a full-screen message — without knowing anything about rendering.
//! Production wires in whatever the host UI provides; [`LogNotifier`] is the
//! headless default and tests use [`RecordingSink`] to assert on calls.

use crate::metrics::MetricKind;

/// Vibration pattern forwarded with every alert: delay 0 ms, pulse 1000 ms.
pub const HAPTIC_PATTERN_MS: &[u64] = &[0, 1_000];

// ---------------------------------------------------------------------------
// AlertNotice
// ---------------------------------------------------------------------------

/// What the sink receives on every fire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertNotice {
    pub metric: MetricKind,
    /// One of the fixed coaching messages, e.g. "Talk slower".
    pub message: &'static str,
    /// Vibration pattern in milliseconds (delay/pulse pairs).
    pub haptic_pattern_ms: &'static [u64],
}

// ---------------------------------------------------------------------------
// NotificationSink trait
// ---------------------------------------------------------------------------

/// Receives exactly one call per fired alert.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notice: &AlertNotice);
}

// ---------------------------------------------------------------------------
// LogNotifier
// ---------------------------------------------------------------------------

/// Headless sink: logs the alert instead of flashing a screen.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl NotificationSink for LogNotifier {
    fn notify(&self, notice: &AlertNotice) {
        log::info!(
            "ALERT [{}] {} (haptic {:?})",
            notice.metric,
            notice.message,
            notice.haptic_pattern_ms
        );
    }
}

// ---------------------------------------------------------------------------
// RecordingSink (test-only)
// ---------------------------------------------------------------------------

/// Test double that records every notice it receives.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingSink {
    notices: std::sync::Mutex<Vec<AlertNotice>>,
}

#[cfg(test)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<AlertNotice> {
        self.notices.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.notices.lock().unwrap().len()
    }
}

#[cfg(test)]
impl NotificationSink for RecordingSink {
    fn notify(&self, notice: &AlertNotice) {
        self.notices.lock().unwrap().push(notice.clone());
    }
}
