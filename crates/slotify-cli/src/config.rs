//! Configuration loading and management.

use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

use slotify_core::request::{DEFAULT_BUFFER_MINUTES, DEFAULT_DURATION_MINUTES};
use slotify_core::{DisplayWindow, WindowError};

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the slotify server.
    pub server_url: String,
    /// First hour shown on the timeline.
    pub start_hour: u32,
    /// Hour the timeline ends at.
    pub end_hour: u32,
    /// Meeting length used when `find` is not given one.
    pub duration_minutes: u32,
    /// Buffer used when `find` is not given one.
    pub buffer_minutes: u32,
    /// Timeout for state and slot-search requests. Uploads are not bounded.
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:8080".to_string(),
            start_hour: 7,
            end_hour: 19,
            duration_minutes: DEFAULT_DURATION_MINUTES,
            buffer_minutes: DEFAULT_BUFFER_MINUTES,
            request_timeout_secs: 30,
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // SLOTIFY_SERVER_URL, SLOTIFY_START_HOUR, ...
        figment = figment.merge(Env::prefixed("SLOTIFY_"));

        figment.extract()
    }

    pub const fn display_window(&self) -> Result<DisplayWindow, WindowError> {
        DisplayWindow::new(self.start_hour, self.end_hour)
    }

    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Returns the platform-specific config directory for slotify.
///
/// On Linux: `~/.config/slotify`
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("slotify"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dirs_config_path_ends_with_slotify() {
        let path = dirs_config_path().unwrap();
        assert_eq!(path.file_name().unwrap(), "slotify");
    }

    #[test]
    fn test_default_window_is_seven_to_nineteen() {
        let window = Config::default().display_window().unwrap();
        assert_eq!((window.start_hour(), window.end_hour()), (7, 19));
    }

    #[test]
    fn test_config_file_overrides_defaults() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("slotify.toml");
        std::fs::write(
            &path,
            "server_url = \"http://planner.internal:9000\"\nstart_hour = 8\nduration_minutes = 45\n",
        )
        .unwrap();

        let config = Config::load_from(Some(&path)).unwrap();
        assert_eq!(config.server_url, "http://planner.internal:9000");
        assert_eq!(config.start_hour, 8);
        assert_eq!(config.duration_minutes, 45);
        assert_eq!(config.buffer_minutes, DEFAULT_BUFFER_MINUTES);
    }

    #[test]
    fn test_inverted_window_is_rejected() {
        let config = Config {
            start_hour: 19,
            end_hour: 7,
            ..Config::default()
        };
        assert!(matches!(
            config.display_window(),
            Err(WindowError::Empty { .. })
        ));
    }

    #[test]
    fn test_malformed_value_fails_to_load() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("slotify.toml");
        std::fs::write(&path, "start_hour = \"seven\"\n").unwrap();

        assert!(Config::load_from(Some(&path)).is_err());
    }
}
