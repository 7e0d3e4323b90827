//! Toolkit configuration.
//!
//! Configuration is a plain serde struct read from TOML. Every field has a
//! default, so an empty file is a valid configuration:
//!
//! ```
//! use trellis::ToolkitConfig;
//!
//! let config = ToolkitConfig::from_toml_str("toplevel_grows = false").unwrap();
//! assert!(!config.toplevel_grows);
//! assert_eq!(config.max_deferred_rounds, 32);
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use trellis_core::logging::targets;

use crate::error::ConfigError;

/// Fixed text metrics used by the headless backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeadlessMetrics {
    /// Advance width of every character, in pixels.
    pub char_width: i32,
    /// Height of one text line, in pixels.
    pub line_height: i32,
}

impl Default for HeadlessMetrics {
    fn default() -> Self {
        Self {
            char_width: 7,
            line_height: 13,
        }
    }
}

/// Settings that tune the widget tree's policies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolkitConfig {
    /// Grow a top-level's allocation when its requisition outgrows it during
    /// a scoped re-layout.
    pub toplevel_grows: bool,

    /// Log a warning when a widget kind cannot answer a hit test.
    pub report_unsupported_hit_test: bool,

    /// Maximum rounds of deferred resize/destroy processing before the queue
    /// is abandoned as a feedback loop.
    pub max_deferred_rounds: usize,

    /// Metrics for [`HeadlessBackend`](crate::platform::HeadlessBackend).
    pub headless: HeadlessMetrics,
}

impl Default for ToolkitConfig {
    fn default() -> Self {
        Self {
            toplevel_grows: true,
            report_unsupported_hit_test: true,
            max_deferred_rounds: 32,
            headless: HeadlessMetrics::default(),
        }
    }
}

impl ToolkitConfig {
    /// Parse and validate a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(target: targets::CONFIG, path = %path.display(), "loaded toolkit config");
        Ok(config)
    }

    /// Render the configuration as TOML.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Reject values the tree cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_deferred_rounds == 0 {
            return Err(ConfigError::Invalid {
                field: "max_deferred_rounds",
                reason: "must be at least 1".into(),
            });
        }
        if self.headless.char_width <= 0 || self.headless.line_height <= 0 {
            return Err(ConfigError::Invalid {
                field: "headless",
                reason: format!(
                    "metrics must be positive, got {}x{}",
                    self.headless.char_width, self.headless.line_height
                ),
            });
        }
        Ok(())
    }
}
