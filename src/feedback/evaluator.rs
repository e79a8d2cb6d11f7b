//! Threshold evaluation — the core decision logic.
//!
//! [`ThresholdEvaluator`] compares each enabled metric against its
//! configured range/cap, tracks how long the metric has been continuously
//! out of range, and requests an alert once the sustained violation crosses
//! the trigger duration. Each metric has independent state; all three may be
//! enabled concurrently even though the simplified UI only toggles one.
//!
//! # Per-metric policies
//!
//! * **Volume** — the calibrated zero point is subtracted from the raw dB
//!   reading; violation when the adjusted value leaves the signed range.
//!   Too loud ⇒ "Lower your voice", too quiet ⇒ "Speak louder".
//! * **Speed** — raw latest WPM against the configured range, evaluated as a
//!   hard ceiling or a two-sided range per [`SpeedEval`]. Too fast ⇒
//!   "Talk slower"; below a two-sided range ⇒ "Talk faster".
//! * **Filler** — the mean of the last [`FILLER_SMOOTHING_WINDOW`] counts
//!   against the cap. Over ⇒ "Reduce filler words".
//!
//! Malformed configuration never crashes the loop: that metric is skipped
//! (treated as disabled) and a diagnostic is logged at construction.

use std::time::{Duration, Instant};

use crate::config::{SignedRange, SpeedEval, ThresholdConfig};
use crate::metrics::{HistoryBuffer, MetricKind, MetricSample};

use super::alert::ALERT_DISPLAY;
use super::tracker::{MetricState, ViolationTracker};

/// Samples averaged when smoothing filler counts.
pub const FILLER_SMOOTHING_WINDOW: usize = 2;

/// Grace period after an alert clears, per metric.
pub fn grace_period(kind: MetricKind) -> Duration {
    match kind {
        MetricKind::Volume => Duration::from_secs(5),
        MetricKind::Speed | MetricKind::Filler => Duration::from_secs(3),
    }
}

// ---------------------------------------------------------------------------
// AlertRequest
// ---------------------------------------------------------------------------

/// A metric whose sustained violation has crossed its trigger duration.
///
/// The caller routes this through the
/// [`AlertCoordinator`](super::alert::AlertCoordinator) and reports the
/// outcome back via [`ThresholdEvaluator::confirm_fire`] /
/// [`ThresholdEvaluator::decline_fire`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertRequest {
    pub metric: MetricKind,
    pub message: &'static str,
}

// ---------------------------------------------------------------------------
// Parsed per-metric policies
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
struct RangePolicy {
    range: SignedRange,
    trigger: Duration,
}

#[derive(Debug, Clone, Copy)]
struct FillerPolicy {
    max_count: u32,
    trigger: Duration,
}

fn trigger_duration(secs: u32) -> Duration {
    // Trigger durations are documented as ≥ 1 s; clamp zero so a corrupt
    // document cannot make every sample fire instantly.
    Duration::from_secs(u64::from(secs.max(1)))
}

fn parse_range_policy(
    kind: MetricKind,
    enabled: bool,
    value: &str,
    trigger_secs: u32,
) -> Option<RangePolicy> {
    if !enabled {
        return None;
    }
    match SignedRange::parse(value) {
        Ok(range) => Some(RangePolicy {
            range,
            trigger: trigger_duration(trigger_secs),
        }),
        Err(e) => {
            log::warn!("{kind} config unusable, metric disabled: {e}");
            None
        }
    }
}

// ---------------------------------------------------------------------------
// ThresholdEvaluator
// ---------------------------------------------------------------------------

/// Evaluates fresh samples against the configured thresholds and drives one
/// [`ViolationTracker`] per metric.
pub struct ThresholdEvaluator {
    speed: Option<RangePolicy>,
    speed_eval: SpeedEval,
    volume: Option<RangePolicy>,
    zero_point_db: f64,
    filler: Option<FillerPolicy>,

    history: HistoryBuffer,
    speed_tracker: ViolationTracker,
    volume_tracker: ViolationTracker,
    filler_tracker: ViolationTracker,
}

impl ThresholdEvaluator {
    /// Build an evaluator from a threshold document.
    ///
    /// Disabled metrics get no policy; enabled metrics with malformed range
    /// strings are downgraded to disabled with a warning.
    pub fn new(config: &ThresholdConfig) -> Self {
        let speed = parse_range_policy(
            MetricKind::Speed,
            config.speed.enabled,
            &config.speed.value,
            config.speed.trigger_secs,
        );
        let volume = parse_range_policy(
            MetricKind::Volume,
            config.volume.enabled,
            &config.volume.value,
            config.volume.trigger_secs,
        );
        let filler = config.filler.enabled.then(|| FillerPolicy {
            max_count: config.filler.max_count,
            trigger: trigger_duration(config.filler.trigger_secs),
        });

        Self {
            speed,
            speed_eval: config.speed_eval,
            volume,
            zero_point_db: config.zero_point_db(),
            filler,
            history: HistoryBuffer::new(),
            speed_tracker: ViolationTracker::new(),
            volume_tracker: ViolationTracker::new(),
            filler_tracker: ViolationTracker::new(),
        }
    }

    /// True when at least one metric survived policy parsing.
    pub fn any_active(&self) -> bool {
        self.speed.is_some() || self.volume.is_some() || self.filler.is_some()
    }

    /// Raw reading minus the calibrated zero point.
    pub fn adjusted_volume(&self, raw_db: f64) -> f64 {
        raw_db - self.zero_point_db
    }

    /// Current state of a metric's tracker.
    pub fn state(&self, kind: MetricKind) -> MetricState {
        self.tracker(kind).state()
    }

    /// Evaluate one sample. Returns the alert requests from metrics whose
    /// sustained violations crossed their trigger this cycle.
    pub fn evaluate(&mut self, sample: &MetricSample, now: Instant) -> Vec<AlertRequest> {
        // History feeds both smoothing and the live status display.
        for kind in MetricKind::ALL {
            self.history.push(kind, sample.value(kind));
        }

        let mut requests = Vec::new();

        if let Some(policy) = self.speed {
            let wpm = sample.speed_wpm;
            let (out, message) = match self.speed_eval {
                SpeedEval::Ceiling => (wpm > policy.range.max, "Talk slower"),
                SpeedEval::Range => {
                    if wpm > policy.range.max {
                        (true, "Talk slower")
                    } else {
                        (wpm < policy.range.min, "Talk faster")
                    }
                }
            };
            if self.speed_tracker.observe(out, now, policy.trigger) {
                requests.push(AlertRequest {
                    metric: MetricKind::Speed,
                    message,
                });
            }
        }

        if let Some(policy) = self.volume {
            let adjusted = self.adjusted_volume(sample.volume_db);
            let too_loud = adjusted > policy.range.max;
            let too_quiet = adjusted < policy.range.min;
            let message = if too_loud { "Lower your voice" } else { "Speak louder" };
            if self
                .volume_tracker
                .observe(too_loud || too_quiet, now, policy.trigger)
            {
                requests.push(AlertRequest {
                    metric: MetricKind::Volume,
                    message,
                });
            }
        }

        if let Some(policy) = self.filler {
            let smoothed = self
                .history
                .average(MetricKind::Filler, FILLER_SMOOTHING_WINDOW);
            let out = smoothed > f64::from(policy.max_count);
            if self.filler_tracker.observe(out, now, policy.trigger) {
                requests.push(AlertRequest {
                    metric: MetricKind::Filler,
                    message: "Reduce filler words",
                });
            }
        }

        requests
    }

    /// An alert for `kind` actually fired: suppress the metric for the
    /// display window plus its grace period.
    pub fn confirm_fire(&mut self, kind: MetricKind, now: Instant) {
        let suppress = ALERT_DISPLAY + grace_period(kind);
        self.tracker_mut(kind).confirm_fire(now, suppress);
    }

    /// The alert was dropped (another was active): restart the metric's
    /// violation timer.
    pub fn decline_fire(&mut self, kind: MetricKind, now: Instant) {
        self.tracker_mut(kind).decline_fire(now);
    }

    fn tracker(&self, kind: MetricKind) -> &ViolationTracker {
        match kind {
            MetricKind::Speed => &self.speed_tracker,
            MetricKind::Volume => &self.volume_tracker,
            MetricKind::Filler => &self.filler_tracker,
        }
    }

    fn tracker_mut(&mut self, kind: MetricKind) -> &mut ViolationTracker {
        match kind {
            MetricKind::Speed => &mut self.speed_tracker,
            MetricKind::Volume => &mut self.volume_tracker,
            MetricKind::Filler => &mut self.filler_tracker,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FillerMode, FillerToggle, MetricToggle};

    fn at(base: Instant, secs: f64) -> Instant {
        base + Duration::from_secs_f64(secs)
    }

    fn sample(speed: f64, volume: f64, filler: u32) -> MetricSample {
        MetricSample {
            speed_wpm: speed,
            volume_db: volume,
            filler_count: filler,
            captured_at: Instant::now(),
        }
    }

    fn speed_config(value: &str, trigger_secs: u32) -> ThresholdConfig {
        ThresholdConfig {
            speed: MetricToggle {
                enabled: true,
                value: value.into(),
                trigger_secs,
            },
            ..Default::default()
        }
    }

    fn volume_config(value: &str, trigger_secs: u32, zero_point: Option<f64>) -> ThresholdConfig {
        ThresholdConfig {
            volume: MetricToggle {
                enabled: true,
                value: value.into(),
                trigger_secs,
            },
            volume_zero_point: zero_point,
            ..Default::default()
        }
    }

    fn filler_config(max_count: u32, trigger_secs: u32) -> ThresholdConfig {
        ThresholdConfig {
            filler: FillerToggle {
                enabled: true,
                max_count,
                trigger_secs,
                mode: FillerMode::Default,
                custom_words: Vec::new(),
            },
            ..Default::default()
        }
    }

    // ---- Config parsing ----------------------------------------------------

    #[test]
    fn disabled_metrics_have_no_policy() {
        let eval = ThresholdEvaluator::new(&ThresholdConfig::default());
        assert!(!eval.any_active());
    }

    #[test]
    fn malformed_range_disables_that_metric_only() {
        let mut config = speed_config("fast", 1);
        config.volume.enabled = true; // valid default "0-20"
        let eval = ThresholdEvaluator::new(&config);

        assert!(eval.any_active());
        // The malformed speed config never produces a violation.
        let mut eval = eval;
        let base = Instant::now();
        let reqs = eval.evaluate(&sample(999.0, 10.0, 0), base);
        assert!(reqs.is_empty());
        assert_eq!(eval.state(MetricKind::Speed), MetricState::InRange);
    }

    #[test]
    fn zero_trigger_is_clamped_to_one_second() {
        let mut eval = ThresholdEvaluator::new(&speed_config("50-60", 0));
        let base = Instant::now();
        // First out-of-range sample must not fire immediately.
        assert!(eval.evaluate(&sample(100.0, 0.0, 0), base).is_empty());
        assert!(!eval.evaluate(&sample(100.0, 0.0, 0), at(base, 1.0)).is_empty());
    }

    // ---- Speed policy ------------------------------------------------------

    #[test]
    fn speed_fires_after_sustained_violation() {
        // Threshold 120 WPM ceiling, trigger 3 s, samples 1 s apart at 130.
        let mut eval = ThresholdEvaluator::new(&speed_config("100-120", 3));
        let base = Instant::now();

        for t in 0..3 {
            let reqs = eval.evaluate(&sample(130.0, 0.0, 0), at(base, t as f64));
            assert!(reqs.is_empty(), "must not fire at t={t}");
        }
        let reqs = eval.evaluate(&sample(130.0, 0.0, 0), at(base, 3.0));
        assert_eq!(
            reqs,
            vec![AlertRequest {
                metric: MetricKind::Speed,
                message: "Talk slower",
            }]
        );
    }

    #[test]
    fn speed_ceiling_ignores_the_lower_bound() {
        let mut eval = ThresholdEvaluator::new(&speed_config("100-120", 1));
        let base = Instant::now();
        // 50 WPM is below the range but Ceiling mode does not care.
        eval.evaluate(&sample(50.0, 0.0, 0), base);
        assert_eq!(eval.state(MetricKind::Speed), MetricState::InRange);
    }

    #[test]
    fn speed_range_mode_flags_both_directions() {
        let mut config = speed_config("100-120", 1);
        config.speed_eval = SpeedEval::Range;
        let mut eval = ThresholdEvaluator::new(&config);
        let base = Instant::now();

        eval.evaluate(&sample(50.0, 0.0, 0), base);
        let reqs = eval.evaluate(&sample(50.0, 0.0, 0), at(base, 1.0));
        assert_eq!(reqs[0].message, "Talk faster");
    }

    // ---- Volume policy -----------------------------------------------------

    #[test]
    fn volume_is_adjusted_by_zero_point() {
        let eval = ThresholdEvaluator::new(&volume_config("0-20", 1, Some(-60.0)));
        assert_eq!(eval.adjusted_volume(-50.0), 10.0);
        assert_eq!(eval.adjusted_volume(-5.0), 55.0);
    }

    #[test]
    fn volume_too_loud_requests_lower_your_voice() {
        // Range (-70, -50), zero point -60, raw -5 → adjusted 55 > -50.
        let mut eval = ThresholdEvaluator::new(&volume_config("-70--50", 5, Some(-60.0)));
        let base = Instant::now();

        for t in 0..5 {
            assert!(eval.evaluate(&sample(0.0, -5.0, 0), at(base, t as f64)).is_empty());
        }
        let reqs = eval.evaluate(&sample(0.0, -5.0, 0), at(base, 5.0));
        assert_eq!(reqs[0].message, "Lower your voice");
        assert_eq!(reqs[0].metric, MetricKind::Volume);
    }

    #[test]
    fn volume_too_quiet_requests_speak_louder() {
        // Range (-70, -50), no zero point, raw -90 < -70.
        let mut eval = ThresholdEvaluator::new(&volume_config("-70--50", 1, None));
        let base = Instant::now();

        eval.evaluate(&sample(0.0, -90.0, 0), base);
        let reqs = eval.evaluate(&sample(0.0, -90.0, 0), at(base, 1.0));
        assert_eq!(reqs[0].message, "Speak louder");
    }

    #[test]
    fn volume_in_range_never_violates() {
        let mut eval = ThresholdEvaluator::new(&volume_config("-70--50", 1, None));
        let base = Instant::now();
        for t in 0..10 {
            assert!(eval.evaluate(&sample(0.0, -60.0, 0), at(base, t as f64)).is_empty());
        }
        assert_eq!(eval.state(MetricKind::Volume), MetricState::InRange);
    }

    // ---- Filler policy -----------------------------------------------------

    #[test]
    fn filler_uses_smoothed_average_not_raw_spike() {
        // Cap 3: a single sample of 5 averaged with a previous 0 gives 2.5,
        // which is under the cap — no violation starts.
        let mut eval = ThresholdEvaluator::new(&filler_config(3, 1));
        let base = Instant::now();

        eval.evaluate(&sample(0.0, 0.0, 0), base);
        eval.evaluate(&sample(0.0, 0.0, 5), at(base, 1.0));
        assert_eq!(eval.state(MetricKind::Filler), MetricState::InRange);

        // Two consecutive 5s average to 5.0 > 3 — the timer starts.
        eval.evaluate(&sample(0.0, 0.0, 5), at(base, 2.0));
        assert!(matches!(
            eval.state(MetricKind::Filler),
            MetricState::Violating { .. }
        ));
    }

    #[test]
    fn filler_fires_with_its_message() {
        let mut eval = ThresholdEvaluator::new(&filler_config(1, 1));
        let base = Instant::now();

        eval.evaluate(&sample(0.0, 0.0, 4), base);
        eval.evaluate(&sample(0.0, 0.0, 4), at(base, 1.0));
        let reqs = eval.evaluate(&sample(0.0, 0.0, 4), at(base, 2.0));
        assert_eq!(reqs[0].message, "Reduce filler words");
    }

    // ---- Recovery / timer reset -------------------------------------------

    #[test]
    fn recovery_resets_the_violation_timer() {
        let mut eval = ThresholdEvaluator::new(&speed_config("100-120", 3));
        let base = Instant::now();

        // Violating for 2 s, back in range for one sample, violating again:
        // the second run must wait the full 3 s, not resume from 2 s.
        eval.evaluate(&sample(130.0, 0.0, 0), base);
        eval.evaluate(&sample(130.0, 0.0, 0), at(base, 2.0));
        eval.evaluate(&sample(110.0, 0.0, 0), at(base, 3.0));
        eval.evaluate(&sample(130.0, 0.0, 0), at(base, 4.0));

        assert!(eval.evaluate(&sample(130.0, 0.0, 0), at(base, 6.9)).is_empty());
        assert!(!eval.evaluate(&sample(130.0, 0.0, 0), at(base, 7.0)).is_empty());
    }

    // ---- Cool-down ---------------------------------------------------------

    #[test]
    fn confirmed_fire_suppresses_for_display_plus_grace() {
        let mut eval = ThresholdEvaluator::new(&speed_config("100-120", 3));
        let base = Instant::now();

        eval.evaluate(&sample(130.0, 0.0, 0), base);
        let reqs = eval.evaluate(&sample(130.0, 0.0, 0), at(base, 3.0));
        assert_eq!(reqs.len(), 1);
        eval.confirm_fire(MetricKind::Speed, at(base, 3.0));

        // Display 3 s + speed grace 3 s → suppressed until t=9 even though
        // still out of range the whole time.
        for t in [4.0, 6.0, 8.9] {
            assert!(eval.evaluate(&sample(130.0, 0.0, 0), at(base, t)).is_empty());
        }
        // At t=9 the cool-down lapses; a fresh timer starts and needs 3 s.
        assert!(eval.evaluate(&sample(130.0, 0.0, 0), at(base, 9.0)).is_empty());
        assert!(!eval.evaluate(&sample(130.0, 0.0, 0), at(base, 12.0)).is_empty());
    }

    #[test]
    fn volume_grace_is_longer_than_speed_grace() {
        assert_eq!(grace_period(MetricKind::Volume), Duration::from_secs(5));
        assert_eq!(grace_period(MetricKind::Speed), Duration::from_secs(3));
        assert_eq!(grace_period(MetricKind::Filler), Duration::from_secs(3));
    }

    // ---- Concurrent metrics ------------------------------------------------

    #[test]
    fn metrics_track_independently_when_all_enabled() {
        let mut config = speed_config("100-120", 2);
        config.volume = MetricToggle {
            enabled: true,
            value: "0-20".into(),
            trigger_secs: 4,
        };
        config.filler = FillerToggle {
            enabled: true,
            max_count: 1,
            trigger_secs: 2,
            mode: FillerMode::Default,
            custom_words: Vec::new(),
        };
        let mut eval = ThresholdEvaluator::new(&config);
        let base = Instant::now();

        // Speed and volume both out of range; filler fine.
        eval.evaluate(&sample(130.0, 40.0, 0), base);
        assert!(matches!(eval.state(MetricKind::Speed), MetricState::Violating { .. }));
        assert!(matches!(eval.state(MetricKind::Volume), MetricState::Violating { .. }));
        assert_eq!(eval.state(MetricKind::Filler), MetricState::InRange);

        // Speed trigger (2 s) crosses first; volume (4 s) stays pending.
        let reqs = eval.evaluate(&sample(130.0, 40.0, 0), at(base, 2.0));
        assert_eq!(reqs.len(), 1);
        assert_eq!(reqs[0].metric, MetricKind::Speed);

        // Volume follows at its own pace.
        eval.confirm_fire(MetricKind::Speed, at(base, 2.0));
        let reqs = eval.evaluate(&sample(110.0, 40.0, 0), at(base, 4.0));
        assert_eq!(reqs.len(), 1);
        assert_eq!(reqs[0].metric, MetricKind::Volume);
    }
}
