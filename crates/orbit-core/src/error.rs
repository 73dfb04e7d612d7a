//! Core error types for orbit-core.
//!
//! The simulation itself never fails: non-finite input is sanitized and
//! invalid drag transitions are ignored. Errors only arise at the edges,
//! when configuration, parameter tables, or scenario files are loaded.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for orbit-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Scenario file errors
    #[error("Scenario error: {0}")]
    Scenario(#[from] ScenarioError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Could not determine or create the data directory
    #[error("Failed to resolve data directory: {0}")]
    DataDir(String),

    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("unknown config key: {0}")]
    UnknownKey(String),
}

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// A value must be strictly inside an open interval
    #[error("'{field}' must be in ({min}, {max}), got {value}")]
    OutOfRange {
        field: String,
        min: f64,
        max: f64,
        value: f64,
    },

    /// A value must be finite and non-negative
    #[error("'{field}' must be finite and non-negative, got {value}")]
    Negative { field: String, value: f64 },

    /// A value exceeds its upper bound
    #[error("'{field}' must be at most {max}, got {value}")]
    TooLarge { field: String, max: f64, value: f64 },

    /// Viewport cannot hold anything inside its margins
    #[error("viewport {width}x{height} is too small for margin {margin}")]
    ViewportTooSmall { width: f64, height: f64, margin: f64 },
}

/// Scenario file errors.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// Failed to read the scenario file
    #[error("Failed to read scenario {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write the scenario file
    #[error("Failed to write scenario {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Scenario could not be serialized
    #[error("Failed to serialize scenario for {path}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Scenario file is not valid JSON for the expected shape
    #[error("Failed to parse scenario {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Project id not present in the scenario
    #[error("Unknown project: {0}")]
    UnknownProject(String),
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
