//! App-level configuration: analysis service endpoint, capture window, and
//! the active user. Persisted as `settings.toml` in the app config dir.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;

// ---------------------------------------------------------------------------
// ServiceConfig
// ---------------------------------------------------------------------------

/// Connection settings for the remote metric analysis service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Base URL of the analysis backend, e.g. `http://192.168.4.118:5000`.
    pub base_url: String,
    /// Maximum seconds to wait for an analysis response before timing out.
    pub timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".into(),
            timeout_secs: 10,
        }
    }
}

// ---------------------------------------------------------------------------
// CaptureConfig
// ---------------------------------------------------------------------------

/// Settings for the rolling capture window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Length of each recorded segment in seconds.
    pub window_secs: f64,
    /// Duration of the silence capture used for calibration, in seconds.
    pub calibration_secs: f64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            window_secs: 5.0,
            calibration_secs: 5.0,
        }
    }
}

impl CaptureConfig {
    /// Replace unusable durations with the defaults.
    ///
    /// Both values become `Duration`s, which panic on negative or non-finite
    /// input — a hand-edited `settings.toml` must degrade with a warning
    /// instead.
    fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if !(self.window_secs.is_finite() && self.window_secs > 0.0) {
            log::warn!(
                "invalid capture.window_secs {}; using {}",
                self.window_secs,
                defaults.window_secs
            );
            self.window_secs = defaults.window_secs;
        }
        if !(self.calibration_secs.is_finite() && self.calibration_secs > 0.0) {
            log::warn!(
                "invalid capture.calibration_secs {}; using {}",
                self.calibration_secs,
                defaults.calibration_secs
            );
            self.calibration_secs = defaults.calibration_secs;
        }
        self
    }
}

// ---------------------------------------------------------------------------
// AppConfig (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// The user whose threshold document the session loads.
    pub user_id: String,
    pub service: ServiceConfig,
    pub capture: CaptureConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            user_id: "default".into(),
            service: ServiceConfig::default(),
            capture: CaptureConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet
    /// (first-run scenario) so callers never need to special-case a missing
    /// file.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;
        config.capture = config.capture.sanitized();
        Ok(config)
    }

    /// Save configuration, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn load_missing_returns_default() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("nonexistent.toml");

        let config = AppConfig::load_from(&path).expect("should not error");
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn round_trip_modified_values() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("settings.toml");

        let mut config = AppConfig::default();
        config.user_id = "alice".into();
        config.service.base_url = "http://10.0.0.2:5000".into();
        config.service.timeout_secs = 30;
        config.capture.window_secs = 4.0;

        config.save_to(&path).expect("save");
        let loaded = AppConfig::load_from(&path).expect("load");
        assert_eq!(loaded, config);
    }

    #[test]
    fn unusable_capture_durations_fall_back_to_defaults() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("settings.toml");
        std::fs::write(
            &path,
            r#"
                user_id = "alice"

                [service]
                base_url = "http://localhost:5000"
                timeout_secs = 10

                [capture]
                window_secs = -3.0
                calibration_secs = nan
            "#,
        )
        .expect("write");

        let config = AppConfig::load_from(&path).expect("load");
        assert_eq!(config.capture.window_secs, 5.0);
        assert_eq!(config.capture.calibration_secs, 5.0);
        // The rest of the document is preserved.
        assert_eq!(config.user_id, "alice");
    }

    #[test]
    fn valid_capture_durations_survive_sanitisation() {
        let config = CaptureConfig {
            window_secs: 2.5,
            calibration_secs: 10.0,
        }
        .sanitized();
        assert_eq!(config.window_secs, 2.5);
        assert_eq!(config.calibration_secs, 10.0);
    }

    #[test]
    fn default_values() {
        let config = AppConfig::default();
        assert_eq!(config.user_id, "default");
        assert_eq!(config.service.timeout_secs, 10);
        assert_eq!(config.capture.window_secs, 5.0);
        assert_eq!(config.capture.calibration_secs, 5.0);
    }
}
