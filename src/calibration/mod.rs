//! Ambient-volume calibration.
//!
//! Speaking volume only means something relative to the room: the same voice
//! reads 15 dB louder next to an air conditioner. Calibration records a few
//! seconds of the user staying silent, takes the analysis service's mean dB
//! for that segment as the **zero point**, and persists it into the user's
//! threshold document. Live sessions then evaluate
//! `raw dB − zero point` against the volume range.
//!
//! Calibration never runs concurrently with a live session — it `try_lock`s
//! the shared device and returns [`CalibrationError::DeviceBusy`] instead of
//! waiting.

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use thiserror::Error;

use crate::analyze::{AnalysisError, MetricAnalyzer};
use crate::capture::{CaptureError, SharedDevice};
use crate::config::{SettingsStore, StoreError, ThresholdPatch};

// ---------------------------------------------------------------------------
// CalibrationOutcome
// ---------------------------------------------------------------------------

/// Result of a completed calibration run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationOutcome {
    /// Ambient mean dB measured during the silence capture.
    pub zero_point_db: f64,
    pub calibrated_at: SystemTime,
}

// ---------------------------------------------------------------------------
// CalibrationError
// ---------------------------------------------------------------------------

/// Errors from a calibration attempt.
///
/// Every variant leaves the stored threshold document untouched — a failed
/// calibration never clobbers a previous zero point.
#[derive(Debug, Error)]
pub enum CalibrationError {
    /// A live session currently holds the capture device.
    #[error("capture device is busy — stop the session before calibrating")]
    DeviceBusy,

    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

// ---------------------------------------------------------------------------
// CalibrationManager
// ---------------------------------------------------------------------------

/// Records a silence segment, measures its mean dB, and persists it as the
/// user's volume zero point.
pub struct CalibrationManager {
    device: SharedDevice,
    analyzer: Arc<dyn MetricAnalyzer>,
    store: Arc<dyn SettingsStore>,
}

impl CalibrationManager {
    pub fn new(
        device: SharedDevice,
        analyzer: Arc<dyn MetricAnalyzer>,
        store: Arc<dyn SettingsStore>,
    ) -> Self {
        Self {
            device,
            analyzer,
            store,
        }
    }

    /// Run one calibration for `user_id`, recording `window` of silence.
    ///
    /// The zero point is persisted via a partial update, so the rest of the
    /// user's threshold document survives unchanged.
    pub async fn calibrate(
        &self,
        user_id: &str,
        window: Duration,
    ) -> Result<CalibrationOutcome, CalibrationError> {
        let segment = {
            let device = self
                .device
                .try_lock()
                .map_err(|_| CalibrationError::DeviceBusy)?;
            log::info!(
                "calibration: recording {:.1}s of ambient audio for {user_id}",
                window.as_secs_f64()
            );
            device.record(window).await?
            // device released here; analysis and persistence run unlocked
        };

        let sample = self.analyzer.analyze(&segment).await?;
        let zero_point_db = sample.volume_db;
        log::info!("calibration: measured zero point {zero_point_db:.1} dB for {user_id}");

        self.store.update(
            user_id,
            ThresholdPatch {
                volume_zero_point: Some(zero_point_db),
                ..Default::default()
            },
        )?;

        Ok(CalibrationOutcome {
            zero_point_db,
            calibrated_at: SystemTime::now(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
