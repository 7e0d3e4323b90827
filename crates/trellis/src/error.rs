//! Error types for the recoverable parts of the toolkit.
//!
//! Contract violations (re-parenting an attached widget, attaching outside a
//! table's grid, reading an adjustment out of bounds) panic where they are
//! detected. Only the advisory hit-test path and configuration loading
//! report errors as values.

use std::path::PathBuf;

use thiserror::Error;

/// A widget kind could not answer a hit test.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HitTestError {
    /// The kind has no locate implementation.
    #[error("hit testing is not implemented for {kind}")]
    Unsupported { kind: &'static str },
}

/// Errors raised while loading or saving a [`ToolkitConfig`](crate::ToolkitConfig).
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read or written.
    #[error("failed to access config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML text did not parse into a configuration.
    #[error("invalid config syntax: {0}")]
    Parse(#[from] toml::de::Error),

    /// The configuration could not be serialized.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A value parsed but is out of range.
    #[error("invalid config value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Umbrella error for toolkit operations.
#[derive(Error, Debug)]
pub enum TrellisError {
    #[error(transparent)]
    HitTest(#[from] HitTestError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result type for toolkit operations.
pub type Result<T> = std::result::Result<T, TrellisError>;
