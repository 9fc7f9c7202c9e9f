//! Runtime settings that are not part of the dashboard document.
//!
//! Sources, later ones overriding earlier ones:
//!
//! 1. built-in defaults
//! 2. an optional settings file (`--settings saido.toml`, any format the
//!    `config` crate recognises by extension)
//! 3. `SAIDO_*` environment variables (`SAIDO_PAGE_SIZE=8`)

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Settings {
    /// Hosts per dashboard page.
    pub page_size: usize,
    /// Deadline for a single sampling command.
    pub sample_timeout_secs: u64,
    /// How long shutdown waits for polling tasks before aborting them.
    pub shutdown_grace_ms: u64,
    /// Default log filter when `RUST_LOG` is not set.
    pub log_level: String,
    /// Log destination; defaults to `saido.log` in the temp directory.
    pub log_file: Option<PathBuf>,
}

impl Settings {
    /// Build settings from defaults, `file` (if given) and the environment.
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("page_size", 5)?
            .set_default("sample_timeout_secs", 10)?
            .set_default("shutdown_grace_ms", 2000)?
            .set_default("log_level", "info")?;

        if let Some(path) = file {
            builder = builder.add_source(File::from(path));
        }

        let settings: Settings = builder
            .add_source(Environment::with_prefix("SAIDO").try_parsing(true))
            .build()?
            .try_deserialize()?;

        if settings.page_size == 0 {
            return Err(ConfigError::Message("page_size must be at least 1".to_string()));
        }
        Ok(settings)
    }

    pub fn sample_timeout(&self) -> Duration {
        Duration::from_secs(self.sample_timeout_secs)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }

    pub fn log_path(&self) -> PathBuf {
        self.log_file
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("saido.log"))
    }
}
