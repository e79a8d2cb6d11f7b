//! HTTP implementation of [`MetricAnalyzer`].
//!
//! Posts the raw segment to the backend's `/analyze_live` endpoint as
//! multipart form data and parses the JSON metric response. All connection
//! details come from [`ServiceConfig`]; nothing is hardcoded.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Instant;

use crate::capture::AudioSegment;
use crate::config::ServiceConfig;
use crate::metrics::MetricSample;

use super::{AnalysisError, MetricAnalyzer, MIN_SEGMENT_SECS};

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

/// JSON body returned by `/analyze_live`.
///
/// Older backend revisions named the rate field `wpm` and the filler field
/// `filler_count`; aliases accept both spellings.
#[derive(Debug, Deserialize)]
struct AnalyzeResponse {
    #[serde(alias = "wpm")]
    speed: Option<f64>,
    volume: Option<f64>,
    #[serde(rename = "fillerCount", alias = "filler_count")]
    filler_count: Option<u32>,
    error: Option<String>,
}

// ---------------------------------------------------------------------------
// HttpAnalyzer
// ---------------------------------------------------------------------------

/// Calls the remote analysis service over HTTP.
pub struct HttpAnalyzer {
    client: reqwest::Client,
    config: ServiceConfig,
}

impl HttpAnalyzer {
    /// Build an analyzer from service config.
    ///
    /// The HTTP client is pre-configured with the per-request timeout from
    /// `config.timeout_secs`. A default (no-timeout) client is used as a
    /// last-resort fallback if the builder fails (should never happen in
    /// practice).
    pub fn from_config(config: &ServiceConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            config: config.clone(),
        }
    }

    /// Serialise samples as little-endian `f32` PCM for upload.
    fn pcm_bytes(segment: &AudioSegment) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(segment.samples.len() * 4);
        for s in &segment.samples {
            bytes.extend_from_slice(&s.to_le_bytes());
        }
        bytes
    }
}

#[async_trait]
impl MetricAnalyzer for HttpAnalyzer {
    async fn analyze(&self, segment: &AudioSegment) -> Result<MetricSample, AnalysisError> {
        if segment.duration_secs() < MIN_SEGMENT_SECS {
            return Err(AnalysisError::TooShort);
        }

        let url = format!("{}/analyze_live", self.config.base_url);

        let form = reqwest::multipart::Form::new()
            .part(
                "audio",
                reqwest::multipart::Part::bytes(Self::pcm_bytes(segment))
                    .file_name("clip.pcm")
                    .mime_str("application/octet-stream")
                    .map_err(|e| AnalysisError::Request(e.to_string()))?,
            )
            .text("sample_rate", segment.sample_rate.to_string());

        let response = self.client.post(&url).multipart(form).send().await?;

        let status = response.status();
        let body: AnalyzeResponse = response
            .json()
            .await
            .map_err(|e| AnalysisError::Parse(e.to_string()))?;

        // Server-reported errors take precedence; the backend returns them
        // with a non-2xx status and an `error` field.
        if let Some(message) = body.error {
            if message.to_lowercase().contains("too short") {
                return Err(AnalysisError::TooShort);
            }
            return Err(AnalysisError::Server(message));
        }
        if !status.is_success() {
            return Err(AnalysisError::Server(format!("HTTP {status}")));
        }

        let (Some(speed), Some(volume), Some(filler_count)) =
            (body.speed, body.volume, body.filler_count)
        else {
            return Err(AnalysisError::Parse(
                "response missing speed/volume/fillerCount".into(),
            ));
        };

        if speed < 0.0 {
            return Err(AnalysisError::Parse(format!(
                "negative speaking rate: {speed}"
            )));
        }

        Ok(MetricSample {
            speed_wpm: speed,
            volume_db: volume,
            filler_count,
            captured_at: Instant::now(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
