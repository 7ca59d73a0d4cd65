//! src/config.rs
//! ============================================================================
//! # Config: Application Configuration Loader and Saver
//!
//! Loads and saves reader settings as TOML from the platform config path
//! using the [`directories`](https://docs.rs/directories) crate. Reading
//! preferences (direction, double page) live in their own store; see
//! [`crate::model::preferences`].
//!
//! ## Example
//! ```rust,ignore
//! let config = Config::load().await?;
//! config.save().await?;
//! ```

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use tokio::fs as TokioFs;

use crate::{
    controller::navigation::TapZones,
    error::{ReaderError, ReaderResult},
    model::render_window::DEFAULT_WINDOW_RADIUS,
};

/// Navigation and rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// Spreads kept mounted on each side of the current one
    pub window_radius: usize,

    /// Taps left of this fraction of the width hit the left zone
    pub left_zone: f32,

    /// Taps right of this fraction of the width hit the right zone
    pub right_zone: f32,
}

impl ReaderConfig {
    #[must_use]
    pub const fn tap_zones(&self) -> TapZones {
        TapZones::new(self.left_zone, self.right_zone)
    }
}

impl Default for ReaderConfig {
    fn default() -> Self {
        let zones: TapZones = TapZones::default();

        Self {
            window_radius: DEFAULT_WINDOW_RADIUS,
            left_zone: zones.left,
            right_zone: zones.right,
        }
    }
}

/// Page prefetch settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PrefetchConfig {
    /// Upper bound on simultaneous page downloads
    pub max_concurrent_fetches: usize,

    /// Number of page images kept in memory
    pub cache_capacity: u64,

    /// Give up on a single page after this long
    #[serde(with = "humantime_serde")]
    pub fetch_timeout: Duration,
}

impl Default for PrefetchConfig {
    fn default() -> Self {
        Self {
            max_concurrent_fetches: 4,
            cache_capacity: 64,
            fetch_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub log_dir: PathBuf,

    /// Default filter directive; `RUST_LOG` takes precedence
    pub level: String,

    /// Mirror logs to stderr (off while the terminal UI owns the screen)
    pub stderr: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from("./logs"),
            level: "info".to_string(),
            stderr: false,
        }
    }
}

/// Main configuration struct for the application.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the esfwee server
    #[serde(default)]
    pub esfwee_url: Option<String>,

    #[serde(default)]
    pub reader: ReaderConfig,

    #[serde(default)]
    pub prefetch: PrefetchConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Loads config from TOML file at the XDG-compliant app config dir, or returns defaults.
    ///
    /// The config is expected at `$XDG_CONFIG_HOME/esfwee/config.toml`
    /// (Linux), or equivalent on Windows/macOS.
    pub async fn load() -> ReaderResult<Self> {
        let path: PathBuf = Self::config_path()?;
        if path.exists() {
            info!("Loading config from {}", path.display());
            let text: String = TokioFs::read_to_string(&path)
                .await
                .map_err(|source| ReaderError::ConfigIo {
                    path: path.clone(),
                    source,
                })?;
            let cfg: Self = Self::from_toml(&text)?;

            Ok(cfg)
        } else {
            info!(
                "No config file found at {}, using default configuration. Creating it now.",
                path.display()
            );

            let default_config = Self::default();
            default_config.save().await?;

            Ok(default_config)
        }
    }

    /// Parse and validate.
    pub fn from_toml(text: &str) -> ReaderResult<Self> {
        let cfg: Self = toml::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> ReaderResult<()> {
        let ReaderConfig {
            left_zone,
            right_zone,
            ..
        } = self.reader;

        if !(0.0..=1.0).contains(&left_zone) || !(0.0..=1.0).contains(&right_zone) {
            return Err(ReaderError::invalid_config(
                "reader.left_zone/right_zone",
                "tap zones must lie within [0, 1]",
            ));
        }

        if left_zone >= right_zone {
            return Err(ReaderError::invalid_config(
                "reader.left_zone",
                format!("left zone {left_zone} must be below right zone {right_zone}"),
            ));
        }

        if self.prefetch.max_concurrent_fetches == 0 {
            return Err(ReaderError::invalid_config(
                "prefetch.max_concurrent_fetches",
                "at least one fetch must be allowed",
            ));
        }

        Ok(())
    }

    /// Saves config to TOML file at the XDG-compliant app config dir.
    pub async fn save(&self) -> ReaderResult<()> {
        let path: PathBuf = Self::config_path()?;

        info!("Saving config to {}", path.display());

        if let Some(parent) = path.parent() {
            TokioFs::create_dir_all(parent).await?;
        }

        let toml_str: String = toml::to_string_pretty(self)
            .map_err(|e| ReaderError::invalid_config("config", e.to_string()))?;
        TokioFs::write(&path, toml_str).await?;

        Ok(())
    }

    /// Returns the canonical config file path using `directories::ProjectDirs`.
    pub fn config_path() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Returns the config directory (without filename).
    pub fn config_dir() -> anyhow::Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("org", "esfwee", "esfwee")
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory."))?;
        Ok(proj_dirs.config_dir().to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let cfg = Config::from_toml("").unwrap();
        assert_eq!(cfg.reader.window_radius, 1);
        assert_eq!(cfg.prefetch.max_concurrent_fetches, 4);
        assert_eq!(cfg.prefetch.fetch_timeout, Duration::from_secs(30));
        assert!(cfg.esfwee_url.is_none());
    }

    #[test]
    fn partial_sections_fill_in_defaults() {
        let cfg = Config::from_toml(
            r#"
            esfwee_url = "http://nas.local:3000"

            [reader]
            window_radius = 2

            [prefetch]
            fetch_timeout = "5s"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.esfwee_url.as_deref(), Some("http://nas.local:3000"));
        assert_eq!(cfg.reader.window_radius, 2);
        assert_eq!(cfg.reader.tap_zones(), TapZones::default());
        assert_eq!(cfg.prefetch.fetch_timeout, Duration::from_secs(5));
        assert_eq!(cfg.prefetch.cache_capacity, 64);
    }

    #[test]
    fn overlapping_tap_zones_are_rejected() {
        let err = Config::from_toml(
            r#"
            [reader]
            left_zone = 0.8
            right_zone = 0.2
            "#,
        )
        .unwrap_err();

        assert!(matches!(err, ReaderError::InvalidConfig { .. }));
    }

    #[test]
    fn defaults_survive_serialization() {
        let text = toml::to_string_pretty(&Config::default()).unwrap();
        let cfg = Config::from_toml(&text).unwrap();
        assert_eq!(cfg.logging.level, "info");
        assert_eq!(cfg.reader.left_zone, 0.3);
    }
}
