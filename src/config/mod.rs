//! Configuration module for the speech coach.
//!
//! Provides the per-user [`ThresholdConfig`] document with its
//! [`SettingsStore`] persistence seam, app-level [`AppConfig`], [`AppPaths`]
//! for cross-platform directories, and [`SignedRange`] parsing for the
//! stored range encoding.

pub mod app;
pub mod paths;
pub mod settings;
pub mod store;

pub use app::{AppConfig, CaptureConfig, ServiceConfig};
pub use paths::AppPaths;
pub use settings::{
    ConfigError, FillerMode, FillerToggle, MetricToggle, SignedRange, SpeedEval, ThresholdConfig,
    ThresholdPatch, DEFAULT_FILLER_WORDS,
};
pub use store::{SettingsStore, StoreError, TomlSettingsStore};

#[cfg(test)]
pub use store::MemorySettingsStore;
