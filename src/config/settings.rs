//! Per-user threshold configuration and signed-range parsing.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML documents and shared across
//! threads. The document shape mirrors what the settings service stores per
//! user: one toggle block per metric plus the calibrated volume zero point.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// A stored threshold value could not be interpreted.
///
/// The evaluator treats a metric with malformed config as disabled rather
/// than failing the session; the error is surfaced as a diagnostic only.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    /// A range string could not be parsed as two signed bounds.
    #[error("malformed range {0:?} — expected MIN-MAX with signed decimal bounds")]
    MalformedRange(String),

    /// Parsed bounds are inverted (min > max).
    #[error("inverted range {0:?} — min must not exceed max")]
    InvertedRange(String),
}

// ---------------------------------------------------------------------------
// SignedRange
// ---------------------------------------------------------------------------

/// An inclusive numeric range whose bounds may be negative.
///
/// # Encoding
///
/// The canonical textual form is `MIN-MAX` where each bound is a signed
/// decimal and the separator is the first `-` that *follows a digit* of the
/// first bound. This single rule accepts every shape the settings documents
/// have used:
///
/// | input        | min    | max   |
/// |--------------|--------|-------|
/// | `"0-20"`     | 0.0    | 20.0  |
/// | `"50-60"`    | 50.0   | 60.0  |
/// | `"-70--50"`  | -70.0  | -50.0 |
/// | `"-100--80"` | -100.0 | -80.0 |
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignedRange {
    pub min: f64,
    pub max: f64,
}

impl SignedRange {
    /// Parse the canonical `MIN-MAX` encoding described above.
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        let s = s.trim();
        let malformed = || ConfigError::MalformedRange(s.to_string());

        // The separator is the first '-' preceded by a digit or '.'.
        let sep = s
            .char_indices()
            .skip(1)
            .find(|&(i, c)| {
                c == '-'
                    && s[..i]
                        .chars()
                        .next_back()
                        .is_some_and(|p| p.is_ascii_digit() || p == '.')
            })
            .map(|(i, _)| i)
            .ok_or_else(malformed)?;

        let min: f64 = s[..sep].trim().parse().map_err(|_| malformed())?;
        let max: f64 = s[sep + 1..].trim().parse().map_err(|_| malformed())?;

        if min > max {
            return Err(ConfigError::InvertedRange(s.to_string()));
        }
        Ok(Self { min, max })
    }

    /// True when `value` lies inside the inclusive range.
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

impl std::fmt::Display for SignedRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.min, self.max)
    }
}

// ---------------------------------------------------------------------------
// SpeedEval
// ---------------------------------------------------------------------------

/// How the speed threshold is interpreted.
///
/// Both interpretations exist in deployed settings documents, so the choice
/// is configurable rather than fixed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeedEval {
    /// Only the upper bound of the configured range matters: violation when
    /// the current WPM exceeds it.
    Ceiling,
    /// Both bounds matter: violation when the current WPM falls outside the
    /// range in either direction.
    Range,
}

impl Default for SpeedEval {
    fn default() -> Self {
        Self::Ceiling
    }
}

// ---------------------------------------------------------------------------
// FillerMode
// ---------------------------------------------------------------------------

/// Which word list the analysis service counts fillers against.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillerMode {
    /// The built-in list ([`DEFAULT_FILLER_WORDS`]).
    Default,
    /// The user-supplied `custom_words` list.
    Custom,
}

impl Default for FillerMode {
    fn default() -> Self {
        Self::Default
    }
}

/// Built-in filler-word list used by [`FillerMode::Default`].
pub const DEFAULT_FILLER_WORDS: &[&str] = &[
    "um", "uh", "like", "you know", "so", "actually", "basically", "right", "i mean", "okay",
];

// ---------------------------------------------------------------------------
// Per-metric toggles
// ---------------------------------------------------------------------------

/// Range-based metric settings (speed, volume).
///
/// `value` keeps the stored string form — parsing happens when an evaluator
/// is built, so a malformed document disables the metric instead of failing
/// the load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricToggle {
    pub enabled: bool,
    /// Acceptable range in the [`SignedRange`] encoding, e.g. `"0-20"`.
    pub value: String,
    /// Seconds the metric must stay continuously out of range before an
    /// alert fires (≥ 1).
    pub trigger_secs: u32,
}

/// Filler-count settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillerToggle {
    pub enabled: bool,
    /// Smoothed filler counts above this cap are a violation.
    pub max_count: u32,
    pub trigger_secs: u32,
    pub mode: FillerMode,
    /// Words counted when `mode == Custom`.
    #[serde(default)]
    pub custom_words: Vec<String>,
}

// ---------------------------------------------------------------------------
// ThresholdConfig
// ---------------------------------------------------------------------------

/// One user's complete threshold document.
///
/// Loaded at session start; mutated only by explicit user action and written
/// back through [`SettingsStore`](crate::config::SettingsStore) on every
/// change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    pub speed: MetricToggle,
    pub volume: MetricToggle,
    pub filler: FillerToggle,
    /// How the speed range is evaluated.
    #[serde(default)]
    pub speed_eval: SpeedEval,
    /// Ambient-noise baseline in dB, set by calibration. Absent until the
    /// first calibration; treated as `0.0` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_zero_point: Option<f64>,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            speed: MetricToggle {
                enabled: false,
                value: "50-60".into(),
                trigger_secs: 1,
            },
            volume: MetricToggle {
                enabled: false,
                value: "0-20".into(),
                trigger_secs: 1,
            },
            filler: FillerToggle {
                enabled: false,
                max_count: 1,
                trigger_secs: 1,
                mode: FillerMode::Default,
                custom_words: Vec::new(),
            },
            speed_eval: SpeedEval::default(),
            volume_zero_point: None,
        }
    }
}

impl ThresholdConfig {
    /// True when at least one metric is toggled on — the precondition for
    /// starting a live session.
    pub fn any_enabled(&self) -> bool {
        self.speed.enabled || self.volume.enabled || self.filler.enabled
    }

    /// The calibrated zero point, or `0.0` before first calibration.
    pub fn zero_point_db(&self) -> f64 {
        self.volume_zero_point.unwrap_or(0.0)
    }

    /// The filler word list in effect for this configuration.
    pub fn filler_words(&self) -> Vec<String> {
        match self.filler.mode {
            FillerMode::Default => DEFAULT_FILLER_WORDS.iter().map(|w| w.to_string()).collect(),
            FillerMode::Custom => self.filler.custom_words.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// ThresholdPatch (partial update)
// ---------------------------------------------------------------------------

/// Field-wise partial update for [`ThresholdConfig`].
///
/// `SettingsStore::update` merges a patch into the stored document so that a
/// caller changing one field never clobbers the rest (read-modify-write, not
/// replace).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThresholdPatch {
    pub speed: Option<MetricToggle>,
    pub volume: Option<MetricToggle>,
    pub filler: Option<FillerToggle>,
    pub speed_eval: Option<SpeedEval>,
    pub volume_zero_point: Option<f64>,
}

impl ThresholdPatch {
    /// Apply every present field onto `config`.
    pub fn apply(self, config: &mut ThresholdConfig) {
        if let Some(speed) = self.speed {
            config.speed = speed;
        }
        if let Some(volume) = self.volume {
            config.volume = volume;
        }
        if let Some(filler) = self.filler {
            config.filler = filler;
        }
        if let Some(speed_eval) = self.speed_eval {
            config.speed_eval = speed_eval;
        }
        if let Some(zero) = self.volume_zero_point {
            config.volume_zero_point = Some(zero);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
