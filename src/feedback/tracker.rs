//! Per-metric violation tracking.
//!
//! Each coached metric owns one [`ViolationTracker`] driving the state
//! machine:
//!
//! ```text
//! InRange ──sample out of range──▶ Violating(since = now)
//! Violating ──sample back in range──▶ InRange          (timer discarded)
//! Violating ──sustained ≥ trigger──▶ wants to fire
//!    ├─ alert fired    ──▶ CoolingDown(until = now + display + grace)
//!    └─ alert dropped  ──▶ Violating(since = now)      (timer restarts)
//! CoolingDown ──now ≥ until──▶ InRange   (regardless of current value)
//! ```
//!
//! Recovery resets the timer: out-of-range time never accumulates across
//! in-range gaps. All timing is driven by the `now` each call receives, so
//! tests inject time instead of sleeping.

use std::time::{Duration, Instant};

// ---------------------------------------------------------------------------
// MetricState
// ---------------------------------------------------------------------------

/// Where a metric currently sits in the violation state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricState {
    /// The metric is within its acceptable range.
    InRange,
    /// Continuously out of range since `since`; no alert yet.
    Violating { since: Instant },
    /// An alert fired; violations are suppressed until `until`.
    CoolingDown { until: Instant },
}

// ---------------------------------------------------------------------------
// ViolationTracker
// ---------------------------------------------------------------------------

/// Tracks one metric's sustained-violation timer and cool-down window.
#[derive(Debug, Clone, Copy)]
pub struct ViolationTracker {
    state: MetricState,
    last_fired_at: Option<Instant>,
}

impl ViolationTracker {
    pub fn new() -> Self {
        Self {
            state: MetricState::InRange,
            last_fired_at: None,
        }
    }

    pub fn state(&self) -> MetricState {
        self.state
    }

    /// When this metric last fired an alert, if ever.
    pub fn last_fired_at(&self) -> Option<Instant> {
        self.last_fired_at
    }

    /// Feed one observation. Returns `true` when the sustained violation has
    /// crossed `trigger` and an alert should be requested.
    ///
    /// The caller must follow up a `true` with either [`confirm_fire`] or
    /// [`decline_fire`]; until then the tracker stays in `Violating`.
    ///
    /// [`confirm_fire`]: Self::confirm_fire
    /// [`decline_fire`]: Self::decline_fire
    pub fn observe(&mut self, out_of_range: bool, now: Instant, trigger: Duration) -> bool {
        // Expired cool-downs lapse before the sample is considered, so a
        // still-out-of-range metric restarts its timer from this cycle.
        if let MetricState::CoolingDown { until } = self.state {
            if now >= until {
                self.state = MetricState::InRange;
            } else {
                return false;
            }
        }

        if !out_of_range {
            self.state = MetricState::InRange;
            return false;
        }

        match self.state {
            MetricState::InRange => {
                self.state = MetricState::Violating { since: now };
                now.duration_since(now) >= trigger // only fires for trigger == 0
            }
            MetricState::Violating { since } => now.duration_since(since) >= trigger,
            MetricState::CoolingDown { .. } => unreachable!("handled above"),
        }
    }

    /// The requested alert actually fired: suppress this metric until the
    /// display window plus the grace period has passed.
    pub fn confirm_fire(&mut self, now: Instant, suppress_for: Duration) {
        self.last_fired_at = Some(now);
        self.state = MetricState::CoolingDown {
            until: now + suppress_for,
        };
    }

    /// The requested alert was dropped (another alert was active): restart
    /// the violation timer so the metric must re-earn a full trigger window.
    pub fn decline_fire(&mut self, now: Instant) {
        self.state = MetricState::Violating { since: now };
    }
}

impl Default for ViolationTracker {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
