//! Metric analysis seam.
//!
//! [`MetricAnalyzer`] wraps the external service that turns a short audio
//! segment into numbers: words per minute, mean dB, filler count. The engine
//! consumes those numbers; it never does speech recognition or decoding
//! itself.
//!
//! A failed analysis produces **no** sample. Callers must treat an error as
//! "no evaluation this cycle" — never substitute zeros for real data.

pub mod http;

pub use http::HttpAnalyzer;

use async_trait::async_trait;
use thiserror::Error;

use crate::capture::AudioSegment;
use crate::metrics::MetricSample;

/// Shortest segment the analysis backend accepts, in seconds.
///
/// Below this there is not enough audio for a single pitch/amplitude window
/// and the server rejects the request, so implementations refuse it locally.
pub const MIN_SEGMENT_SECS: f64 = 0.1;

// ---------------------------------------------------------------------------
// AnalysisError
// ---------------------------------------------------------------------------

/// Errors from the metric analysis call.
///
/// No retries happen at this level — retry policy belongs to the recording
/// loop.
#[derive(Debug, Clone, Error)]
pub enum AnalysisError {
    /// HTTP transport or connection error.
    #[error("analysis request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("analysis request timed out")]
    Timeout,

    /// The response could not be parsed as the expected schema.
    #[error("failed to parse analysis response: {0}")]
    Parse(String),

    /// The server reported an analysis failure.
    #[error("analysis service error: {0}")]
    Server(String),

    /// The segment is shorter than [`MIN_SEGMENT_SECS`] (or empty).
    #[error("audio segment too short to analyze (minimum {MIN_SEGMENT_SECS} s)")]
    TooShort,
}

impl From<reqwest::Error> for AnalysisError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            AnalysisError::Timeout
        } else {
            AnalysisError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// MetricAnalyzer trait
// ---------------------------------------------------------------------------

/// Async, object-safe interface to the analysis service.
///
/// Implementors must be `Send + Sync` so the analyzer can be shared behind
/// an `Arc<dyn MetricAnalyzer>` between the session runner and the
/// calibration manager.
///
/// # Contract
///
/// - `segment` must be at least [`MIN_SEGMENT_SECS`] long; shorter segments
///   return `Err(AnalysisError::TooShort)` without any network call.
/// - Exactly zero or one [`MetricSample`] per call; no silent zero-value
///   fallbacks.
#[async_trait]
pub trait MetricAnalyzer: Send + Sync {
    async fn analyze(&self, segment: &AudioSegment) -> Result<MetricSample, AnalysisError>;
}

// ---------------------------------------------------------------------------
// MockAnalyzer (test-only)
// ---------------------------------------------------------------------------

/// Test double that plays back a queue of pre-scripted results.
///
/// Once the script is exhausted the last configured outcome repeats, so loop
/// tests can run an arbitrary number of cycles.
#[cfg(test)]
pub struct MockAnalyzer {
    script: std::sync::Mutex<std::collections::VecDeque<Result<MetricSample, AnalysisError>>>,
    last: std::sync::Mutex<Option<Result<MetricSample, AnalysisError>>>,
    calls: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl MockAnalyzer {
    pub fn new(script: Vec<Result<MetricSample, AnalysisError>>) -> Self {
        Self {
            script: std::sync::Mutex::new(script.into()),
            last: std::sync::Mutex::new(None),
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    /// An analyzer that always returns clones of `sample`.
    pub fn always(sample: MetricSample) -> Self {
        Self::new(vec![Ok(sample)])
    }

    /// An analyzer that always fails with `error`.
    pub fn failing(error: AnalysisError) -> Self {
        Self::new(vec![Err(error)])
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
#[async_trait]
impl MetricAnalyzer for MockAnalyzer {
    async fn analyze(&self, segment: &AudioSegment) -> Result<MetricSample, AnalysisError> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);

        // Enforce the minimum-duration contract even in the mock so callers
        // are tested against it.
        if segment.duration_secs() < MIN_SEGMENT_SECS {
            return Err(AnalysisError::TooShort);
        }

        let mut last = self.last.lock().unwrap();
        if let Some(next) = self.script.lock().unwrap().pop_front() {
            *last = Some(next.clone());
        }
        last.clone().unwrap_or(Err(AnalysisError::TooShort))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
