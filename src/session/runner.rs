//! Recording loop — drives the capture → analyze → evaluate cycle.
//!
//! [`SessionRunner`] owns one live session. Cycles are strictly sequential:
//! record a segment, send it for analysis, feed the result to the
//! [`FeedbackEngine`], repeat. There is never more than one in-flight
//! analysis.
//!
//! # Loop flow
//!
//! ```text
//! start ──▶ load thresholds ──▶ acquire device (try_lock)
//!   └─▶ loop:
//!         record(window)          [Capturing]
//!         analyze(segment)        [Analyzing]
//!           ├─ Ok(sample)  → engine.process → status update
//!           ├─ Err(analysis) → warn, skip evaluation this cycle
//!           └─ Err(capture)  → warn, retry; 5 in a row ends the session
//! ```
//!
//! A [`SessionCommand::Stop`] (or a dropped command channel) cancels the
//! in-flight cycle via `tokio::select!` — a late analysis result from a
//! stopped session never mutates anything.

use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::sync::mpsc;

use crate::analyze::{AnalysisError, MetricAnalyzer};
use crate::capture::{CaptureDevice, CaptureError, SharedDevice};
use crate::config::{SettingsStore, StoreError};
use crate::feedback::{FeedbackEngine, NotificationSink};
use crate::metrics::MetricSample;

use super::state::{LiveMetrics, SessionPhase, SharedStatus};

/// Consecutive capture failures that end the session.
pub const MAX_CAPTURE_FAILURES: u32 = 5;

// ---------------------------------------------------------------------------
// SessionCommand
// ---------------------------------------------------------------------------

/// Control messages for a running session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    /// End the session; the in-flight cycle is discarded.
    Stop,
}

// ---------------------------------------------------------------------------
// SessionError
// ---------------------------------------------------------------------------

/// Ways a session can refuse to start or end abnormally.
#[derive(Debug, Error)]
pub enum SessionError {
    /// No metric in the user's threshold document is enabled (or every
    /// enabled one had an unusable range).
    #[error("no metric is enabled — enable at least one threshold before starting")]
    NoMetricEnabled,

    /// Another session or a calibration currently holds the device.
    #[error("capture device is busy")]
    DeviceBusy,

    /// The microphone failed too many times in a row.
    #[error("capture failed {failures} times in a row, ending session: {last}")]
    CaptureLost {
        failures: u32,
        #[source]
        last: CaptureError,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

// ---------------------------------------------------------------------------
// SessionRunner
// ---------------------------------------------------------------------------

/// Runs one session to completion.
///
/// Create with [`SessionRunner::new`], then call [`run`](Self::run) inside a
/// tokio task; send [`SessionCommand::Stop`] (or drop the sender) to end it.
pub struct SessionRunner {
    device: SharedDevice,
    analyzer: Arc<dyn MetricAnalyzer>,
    store: Arc<dyn SettingsStore>,
    sink: Arc<dyn NotificationSink>,
    status: SharedStatus,
    user_id: String,
    window: Duration,
}

impl SessionRunner {
    pub fn new(
        device: SharedDevice,
        analyzer: Arc<dyn MetricAnalyzer>,
        store: Arc<dyn SettingsStore>,
        sink: Arc<dyn NotificationSink>,
        status: SharedStatus,
        user_id: impl Into<String>,
        window: Duration,
    ) -> Self {
        Self {
            device,
            analyzer,
            store,
            sink,
            status,
            user_id: user_id.into(),
            window,
        }
    }

    /// Run the session until stopped or failed.
    ///
    /// Preconditions are checked before the device is touched: a session
    /// with nothing to coach refuses to start rather than recording for
    /// nothing.
    pub async fn run(
        self,
        mut commands: mpsc::Receiver<SessionCommand>,
    ) -> Result<(), SessionError> {
        let thresholds = self.store.load(&self.user_id)?;
        let mut engine = FeedbackEngine::new(&thresholds, Arc::clone(&self.sink));
        if !engine.any_metric_active() {
            return Err(SessionError::NoMetricEnabled);
        }

        let device = self
            .device
            .try_lock()
            .map_err(|_| SessionError::DeviceBusy)?;
        log::info!(
            "session started for {} ({:.1}s window)",
            self.user_id,
            self.window.as_secs_f64()
        );

        let mut capture_failures: u32 = 0;
        let result = loop {
            tokio::select! {
                biased;

                cmd = commands.recv() => match cmd {
                    // A closed channel means the controller is gone — treat
                    // it as a stop rather than running unsupervised.
                    Some(SessionCommand::Stop) | None => break Ok(()),
                },

                outcome = run_cycle(&**device, self.analyzer.as_ref(), &self.status, self.window) => {
                    let now = Instant::now();
                    engine.tick(now);

                    match outcome {
                        Ok(sample) => {
                            capture_failures = 0;
                            engine.process(&sample, now);

                            let mut st = self.status.lock().unwrap();
                            st.latest = Some(LiveMetrics {
                                speed_wpm: sample.speed_wpm,
                                raw_volume_db: sample.volume_db,
                                adjusted_volume_db: engine.adjusted_volume(sample.volume_db),
                                filler_count: sample.filler_count,
                            });
                            st.active_alert = engine.active_alert().map(|a| a.message);
                            st.error_message = None;
                            st.cycles_completed += 1;
                        }
                        Err(CycleError::Analysis(e)) => {
                            // No sample, no evaluation — never feed zeros in.
                            log::warn!("analysis failed, skipping this cycle: {e}");
                            let mut st = self.status.lock().unwrap();
                            st.active_alert = engine.active_alert().map(|a| a.message);
                            st.error_message = Some(e.to_string());
                        }
                        Err(CycleError::Capture(e)) => {
                            capture_failures += 1;
                            log::warn!(
                                "capture failed ({capture_failures}/{MAX_CAPTURE_FAILURES}): {e}"
                            );
                            self.status.lock().unwrap().error_message = Some(e.to_string());
                            if capture_failures >= MAX_CAPTURE_FAILURES {
                                break Err(SessionError::CaptureLost {
                                    failures: capture_failures,
                                    last: e,
                                });
                            }
                        }
                    }
                }
            }
        };

        engine.reset_display();
        {
            let mut st = self.status.lock().unwrap();
            st.phase = SessionPhase::Idle;
            st.active_alert = None;
        }
        match &result {
            Ok(()) => log::info!("session ended for {}", self.user_id),
            Err(e) => log::error!("session for {} ended abnormally: {e}", self.user_id),
        }
        result
    }
}

// ---------------------------------------------------------------------------
// Cycle
// ---------------------------------------------------------------------------

enum CycleError {
    Capture(CaptureError),
    Analysis(AnalysisError),
}

/// One capture + analysis cycle.
///
/// Cancellation-safe by construction: dropping this future mid-record
/// abandons the segment, and a dropped analysis result is never observed.
async fn run_cycle(
    device: &dyn CaptureDevice,
    analyzer: &dyn MetricAnalyzer,
    status: &SharedStatus,
    window: Duration,
) -> Result<MetricSample, CycleError> {
    status.lock().unwrap().phase = SessionPhase::Capturing;
    let segment = device.record(window).await.map_err(CycleError::Capture)?;

    status.lock().unwrap().phase = SessionPhase::Analyzing;
    analyzer.analyze(&segment).await.map_err(CycleError::Analysis)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
