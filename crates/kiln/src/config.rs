//! # Simulation Configuration
//!
//! Loaded once at startup. Every field has a default, so an empty file is a
//! valid configuration.
//!
//! ```toml
//! pool_size = 4096
//! batch_capacity = 1024
//! frames = 600
//! target_fps = 60
//! timing_logs = true
//! upload_usage = "stream"
//! log_level = "kiln=debug"
//! ```

use std::path::Path;

use kiln_rendering::UsageHint;
use serde::Deserialize;

use crate::error::{ConfigError, ConfigResult};

/// Settings for a headless simulation run.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Entities pre-allocated in the pool.
    pub pool_size: usize,
    /// Members the batch heap is sized for.
    pub batch_capacity: usize,
    /// Frames to simulate.
    pub frames: u64,
    /// Fixed tick rate; the frame delta is its inverse.
    pub target_fps: u32,
    /// Log frames that run over budget.
    pub timing_logs: bool,
    /// Usage hint passed with each batch upload.
    pub upload_usage: UsageHint,
    /// Default log filter. `RUST_LOG` takes precedence.
    pub log_level: String,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            pool_size: 1024,
            batch_capacity: 256,
            frames: 300,
            target_fps: 60,
            timing_logs: false,
            upload_usage: UsageHint::Dynamic,
            log_level: "info".to_string(),
        }
    }
}

impl SimulationConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Parse`] for malformed TOML and
    /// [`ConfigError::Invalid`] for values that fail validation.
    pub fn from_toml_str(source: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Io`] if the file cannot be read, otherwise as
    /// [`SimulationConfig::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&source)?;
        tracing::debug!(path = %path.display(), ?config, "config loaded");
        Ok(config)
    }

    /// Checks the fields the simulation cannot run without.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.pool_size == 0 {
            return Err(ConfigError::Invalid {
                field: "pool_size",
                reason: "must be at least 1",
            });
        }
        if u32::try_from(self.pool_size).is_err() {
            return Err(ConfigError::Invalid {
                field: "pool_size",
                reason: "does not fit an entity index",
            });
        }
        if self.batch_capacity == 0 {
            return Err(ConfigError::Invalid {
                field: "batch_capacity",
                reason: "must be at least 1",
            });
        }
        if self.target_fps == 0 {
            return Err(ConfigError::Invalid {
                field: "target_fps",
                reason: "must be at least 1",
            });
        }
        Ok(())
    }

    /// Fixed frame delta in seconds.
    #[inline]
    #[must_use]
    pub fn frame_delta(&self) -> f32 {
        1.0 / self.target_fps.max(1) as f32
    }
}
