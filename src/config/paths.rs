//! Cross-platform application paths using the `dirs` crate.
//!
//! Layout:
//!
//! Config dir (app settings + per-user threshold documents):
//!   Windows: %APPDATA%\speech-coach\
//!   macOS:   ~/Library/Application Support/speech-coach/
//!   Linux:   ~/.config/speech-coach/

use std::path::PathBuf;

/// Holds all resolved application directory/file paths.
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Directory for `settings.toml` and the `users/` store.
    pub config_dir: PathBuf,
    /// Full path to the app-level `settings.toml` (service URL, capture
    /// window, active user).
    pub settings_file: PathBuf,
    /// Directory holding one `<user_id>.toml` threshold document per user.
    pub users_dir: PathBuf,
}

impl AppPaths {
    const APP_NAME: &'static str = "speech-coach";

    /// Resolves all paths using the `dirs` crate.
    ///
    /// Falls back to the current directory if the platform cannot provide a
    /// standard path (should be extremely rare in practice).
    pub fn new() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        let settings_file = config_dir.join("settings.toml");
        let users_dir = config_dir.join("users");

        Self {
            config_dir,
            settings_file,
            users_dir,
        }
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_are_non_empty() {
        let paths = AppPaths::new();
        assert!(paths.config_dir.to_str().is_some_and(|s| !s.is_empty()));
        assert!(paths
            .settings_file
            .file_name()
            .is_some_and(|n| n == "settings.toml"));
        assert!(paths.users_dir.file_name().is_some_and(|n| n == "users"));
    }
}
