//! Settings persistence keyed by user identifier.
//!
//! [`SettingsStore`] is the seam to the external settings service. The
//! contract matters more than the backing medium:
//!
//! * `load` never fails the caller for "not found" — a missing document
//!   yields the documented defaults.
//! * `update` merges a [`ThresholdPatch`] into the stored document
//!   (read-modify-write), so updating one field never clobbers the rest.
//!
//! [`TomlSettingsStore`] keeps one `<user_id>.toml` per user under the app
//! config directory. [`MemorySettingsStore`] (test-only) backs the same
//! contract with a `HashMap` for unit tests.

use std::path::PathBuf;

use thiserror::Error;

use crate::config::settings::{ThresholdConfig, ThresholdPatch};

// ---------------------------------------------------------------------------
// StoreError
// ---------------------------------------------------------------------------

/// Errors from the settings persistence layer.
///
/// "Document not found" is deliberately absent — `load` resolves that case
/// to defaults instead of erroring.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem read/write failed.
    #[error("settings I/O failed for user {user_id:?}: {source}")]
    Io {
        user_id: String,
        #[source]
        source: std::io::Error,
    },

    /// A stored document exists but is not valid TOML for the expected shape.
    #[error("settings document for user {user_id:?} is corrupt: {detail}")]
    Corrupt { user_id: String, detail: String },

    /// Serialising the document for writing failed.
    #[error("failed to encode settings for user {user_id:?}: {detail}")]
    Encode { user_id: String, detail: String },
}

// ---------------------------------------------------------------------------
// SettingsStore trait
// ---------------------------------------------------------------------------

/// Per-user threshold persistence.
///
/// Implementations must be `Send + Sync` so the store can be shared between
/// the session runner and the calibration manager behind an `Arc`.
pub trait SettingsStore: Send + Sync {
    /// Load the user's threshold document, or [`ThresholdConfig::default`]
    /// when none has been saved yet.
    fn load(&self, user_id: &str) -> Result<ThresholdConfig, StoreError>;

    /// Replace the user's document wholesale.
    fn save(&self, user_id: &str, config: &ThresholdConfig) -> Result<(), StoreError>;

    /// Merge `patch` into the stored document and persist the result.
    ///
    /// The default implementation is a read-modify-write over `load`/`save`;
    /// backends with native partial updates may override it.
    fn update(&self, user_id: &str, patch: ThresholdPatch) -> Result<ThresholdConfig, StoreError> {
        let mut config = self.load(user_id)?;
        patch.apply(&mut config);
        self.save(user_id, &config)?;
        Ok(config)
    }
}

// ---------------------------------------------------------------------------
// TomlSettingsStore
// ---------------------------------------------------------------------------

/// File-backed store: one `<user_id>.toml` per user.
#[derive(Debug, Clone)]
pub struct TomlSettingsStore {
    dir: PathBuf,
}

impl TomlSettingsStore {
    /// Store documents under `dir`, creating it lazily on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, user_id: &str) -> PathBuf {
        // User ids come from the auth layer and are opaque here; sanitise
        // path separators so an id can never escape the store directory.
        let safe: String = user_id
            .chars()
            .map(|c| if c == '/' || c == '\\' || c == '.' { '_' } else { c })
            .collect();
        self.dir.join(format!("{safe}.toml"))
    }
}

impl SettingsStore for TomlSettingsStore {
    fn load(&self, user_id: &str) -> Result<ThresholdConfig, StoreError> {
        let path = self.path_for(user_id);
        if !path.exists() {
            log::debug!("settings: no document for {user_id}, using defaults");
            return Ok(ThresholdConfig::default());
        }

        let content = std::fs::read_to_string(&path).map_err(|source| StoreError::Io {
            user_id: user_id.to_string(),
            source,
        })?;

        toml::from_str(&content).map_err(|e| StoreError::Corrupt {
            user_id: user_id.to_string(),
            detail: e.to_string(),
        })
    }

    fn save(&self, user_id: &str, config: &ThresholdConfig) -> Result<(), StoreError> {
        let path = self.path_for(user_id);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                user_id: user_id.to_string(),
                source,
            })?;
        }

        let content = toml::to_string_pretty(config).map_err(|e| StoreError::Encode {
            user_id: user_id.to_string(),
            detail: e.to_string(),
        })?;

        std::fs::write(&path, content).map_err(|source| StoreError::Io {
            user_id: user_id.to_string(),
            source,
        })
    }
}

// ---------------------------------------------------------------------------
// MemorySettingsStore (test-only)
// ---------------------------------------------------------------------------

/// In-memory store backing the same contract, for unit tests.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    docs: std::sync::Mutex<std::collections::HashMap<String, ThresholdConfig>>,
}

#[cfg(test)]
impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seed a document, bypassing `save`.
    pub fn seed(&self, user_id: &str, config: ThresholdConfig) {
        self.docs
            .lock()
            .unwrap()
            .insert(user_id.to_string(), config);
    }
}

#[cfg(test)]
impl SettingsStore for MemorySettingsStore {
    fn load(&self, user_id: &str) -> Result<ThresholdConfig, StoreError> {
        Ok(self
            .docs
            .lock()
            .unwrap()
            .get(user_id)
            .cloned()
            .unwrap_or_default())
    }

    fn save(&self, user_id: &str, config: &ThresholdConfig) -> Result<(), StoreError> {
        self.docs
            .lock()
            .unwrap()
            .insert(user_id.to_string(), config.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::settings::MetricToggle;
    use tempfile::tempdir;

    #[test]
    fn load_missing_returns_defaults_not_error() {
        let dir = tempdir().expect("temp dir");
        let store = TomlSettingsStore::new(dir.path());

        let config = store.load("nobody").expect("load must not fail");
        assert_eq!(config, ThresholdConfig::default());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempdir().expect("temp dir");
        let store = TomlSettingsStore::new(dir.path());

        let mut config = ThresholdConfig::default();
        config.volume.enabled = true;
        config.volume.value = "-70--50".into();
        config.volume_zero_point = Some(-60.0);

        store.save("alice", &config).expect("save");
        let loaded = store.load("alice").expect("load");
        assert_eq!(loaded, config);
    }

    #[test]
    fn update_merges_into_existing_document() {
        let dir = tempdir().expect("temp dir");
        let store = TomlSettingsStore::new(dir.path());

        let mut config = ThresholdConfig::default();
        config.speed = MetricToggle {
            enabled: true,
            value: "100-120".into(),
            trigger_secs: 3,
        };
        store.save("alice", &config).expect("save");

        // Patch only the zero point; the speed toggle must survive.
        let patch = ThresholdPatch {
            volume_zero_point: Some(-58.0),
            ..Default::default()
        };
        let merged = store.update("alice", patch).expect("update");

        assert_eq!(merged.volume_zero_point, Some(-58.0));
        assert!(merged.speed.enabled);
        assert_eq!(merged.speed.value, "100-120");

        // And the merge was persisted, not just returned.
        let reloaded = store.load("alice").expect("reload");
        assert_eq!(reloaded, merged);
    }

    #[test]
    fn update_on_missing_document_starts_from_defaults() {
        let dir = tempdir().expect("temp dir");
        let store = TomlSettingsStore::new(dir.path());

        let patch = ThresholdPatch {
            volume_zero_point: Some(-61.5),
            ..Default::default()
        };
        let merged = store.update("fresh", patch).expect("update");

        assert_eq!(merged.volume_zero_point, Some(-61.5));
        assert_eq!(merged.speed.value, "50-60");
    }

    #[test]
    fn corrupt_document_is_reported() {
        let dir = tempdir().expect("temp dir");
        let store = TomlSettingsStore::new(dir.path());
        std::fs::write(dir.path().join("bad.toml"), "not = [valid").expect("write");

        let err = store.load("bad").unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
    }

    #[test]
    fn user_ids_cannot_escape_the_store_directory() {
        let dir = tempdir().expect("temp dir");
        let store = TomlSettingsStore::new(dir.path());

        store
            .save("../evil", &ThresholdConfig::default())
            .expect("save");

        // The sanitised file lands inside the store directory.
        let entries: Vec<_> = std::fs::read_dir(dir.path())
            .expect("read_dir")
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0], "___evil.toml");
    }

    #[test]
    fn memory_store_honours_the_same_contract() {
        let store = MemorySettingsStore::new();
        assert_eq!(store.load("x").unwrap(), ThresholdConfig::default());

        let patch = ThresholdPatch {
            volume_zero_point: Some(-40.0),
            ..Default::default()
        };
        let merged = store.update("x", patch).expect("update");
        assert_eq!(merged.volume_zero_point, Some(-40.0));
        assert_eq!(store.load("x").unwrap().volume_zero_point, Some(-40.0));
    }
}
