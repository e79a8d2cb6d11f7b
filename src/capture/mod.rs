//! Audio capture seam.
//!
//! The feedback engine never decodes audio itself — it records short rolling
//! segments and hands them to the analysis service. [`CaptureDevice`] is the
//! acquire/record/release seam over whatever supplies those segments:
//! [`MicCapture`] (cpal) in production, [`ScriptedCapture`] in tests.
//!
//! Exclusivity between the live session and calibration is enforced one
//! level up: both hold the device behind `Arc<tokio::sync::Mutex<…>>` and
//! calibration uses `try_lock`, so starting a calibration while a session is
//! recording fails fast instead of fighting over the hardware.

pub mod mic;

pub use mic::MicCapture;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

// ---------------------------------------------------------------------------
// AudioSegment
// ---------------------------------------------------------------------------

/// One recorded segment: mono `f32` PCM plus its sample rate.
///
/// Owned by the cycle that recorded it; consumed by the analyzer and then
/// dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioSegment {
    /// PCM samples in `[-1.0, 1.0]`.
    pub samples: Vec<f32>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
}

impl AudioSegment {
    /// Segment length in seconds.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / f64::from(self.sample_rate)
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

// ---------------------------------------------------------------------------
// CaptureError
// ---------------------------------------------------------------------------

/// Errors while acquiring or running the capture device.
///
/// Fatal to the current cycle only — the recording loop logs and retries.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("no input device found on the default audio host")]
    NoDevice,

    #[error("microphone permission denied")]
    PermissionDenied,

    #[error("audio stream failed: {0}")]
    Stream(String),

    /// The blocking capture task panicked or was aborted.
    #[error("capture task failed: {0}")]
    TaskFailed(String),
}

// ---------------------------------------------------------------------------
// CaptureDevice trait
// ---------------------------------------------------------------------------

/// Records one fixed-length segment per call.
///
/// `record` acquires the device, records for `window`, releases the device,
/// and returns the segment — scoped acquisition, so a failed or cancelled
/// cycle can never leak a live capture handle. Dropping the returned future
/// abandons the segment ("cancel without retrieval").
#[async_trait]
pub trait CaptureDevice: Send + Sync {
    async fn record(&self, window: Duration) -> Result<AudioSegment, CaptureError>;
}

/// Device handle shared between the session runner and calibration.
///
/// The session holds the lock for the whole session; calibration uses
/// `try_lock` and fails fast when the session is recording.
pub type SharedDevice = std::sync::Arc<tokio::sync::Mutex<std::sync::Arc<dyn CaptureDevice>>>;

/// Wrap a device for shared session/calibration access.
pub fn shared_device(device: std::sync::Arc<dyn CaptureDevice>) -> SharedDevice {
    std::sync::Arc::new(tokio::sync::Mutex::new(device))
}

// ---------------------------------------------------------------------------
// ScriptedCapture (test-only)
// ---------------------------------------------------------------------------

/// Test double that plays back a queue of pre-scripted outcomes.
///
/// Each `record` call pops the next outcome; once the script is exhausted it
/// keeps returning a short burst of silence so loop tests can run for as
/// many cycles as they need.
#[cfg(test)]
pub struct ScriptedCapture {
    script: std::sync::Mutex<std::collections::VecDeque<Result<AudioSegment, CaptureError>>>,
    calls: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl ScriptedCapture {
    pub fn new(script: Vec<Result<AudioSegment, CaptureError>>) -> Self {
        Self {
            script: std::sync::Mutex::new(script.into()),
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    /// A capture that always succeeds with `secs` seconds of silence.
    pub fn silence() -> Self {
        Self::new(Vec::new())
    }

    /// Number of times `record` has been called.
    pub fn call_count(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }

    fn silent_segment() -> AudioSegment {
        AudioSegment {
            samples: vec![0.0; 1_600],
            sample_rate: 16_000,
        }
    }
}

#[cfg(test)]
#[async_trait]
impl CaptureDevice for ScriptedCapture {
    async fn record(&self, _window: Duration) -> Result<AudioSegment, CaptureError> {
        // Yield so loop tests that drive this double can still receive
        // commands; without an await point the session loop never yields.
        tokio::task::yield_now().await;
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Self::silent_segment()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
