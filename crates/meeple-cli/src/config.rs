//! Configuration loading and management.

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use meeple_core::VenueConfig;
use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the database file.
    pub database_path: PathBuf,

    /// Minimum gap needed to clear and reset a table, in minutes.
    pub buffer_minutes: i64,

    /// Assumed length of a session when projecting its end, in minutes.
    pub default_session_duration_minutes: i64,

    /// How far ahead an upcoming booking is worth flagging, in minutes.
    pub risk_lookahead_minutes: i64,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        let tuning = VenueConfig::default();
        Self {
            database_path: data_dir.join("meeple.db"),
            buffer_minutes: tuning.buffer_minutes,
            default_session_duration_minutes: tuning.default_session_duration_minutes,
            risk_lookahead_minutes: tuning.risk_lookahead_minutes,
        }
    }
}

impl Config {
    /// Loads configuration from default locations.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load() -> Result<Self, figment::Error> {
        Self::load_from(None)
    }

    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (MEEPLE_*)
        figment = figment.merge(Env::prefixed("MEEPLE_"));

        figment.extract()
    }

    /// The engine tuning knobs carried by this configuration.
    #[must_use]
    pub fn venue_config(&self) -> VenueConfig {
        VenueConfig {
            buffer_minutes: self.buffer_minutes,
            default_session_duration_minutes: self.default_session_duration_minutes,
            risk_lookahead_minutes: self.risk_lookahead_minutes,
        }
    }
}

/// Returns the platform-specific config directory for meeple.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("meeple"))
}

/// Returns the platform-specific data directory for meeple.
///
/// On Linux: `~/.local/share/meeple`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("meeple"))
}
