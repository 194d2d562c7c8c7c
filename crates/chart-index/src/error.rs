//! Error types for chart-index

use std::path::PathBuf;

/// Result type for chart-index operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or filtering a chart index
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A chart manifest could not be read or parsed. Aborts index generation.
    #[error("failed to load chart manifest at {path}: {source}")]
    ManifestLoad {
        path: PathBuf,
        #[source]
        source: Box<Error>,
    },

    #[error("invalid chart manifest: {0}")]
    ManifestParse(#[from] serde_yaml::Error),

    /// The subscription does not name the package it subscribes to.
    #[error("subscription.spec.package is missing for subscription: {subscription}")]
    MissingPackageName { subscription: String },

    #[error("invalid version range '{range}': {reason}")]
    InvalidRange { range: String, reason: String },

    #[error("invalid version '{version}': {source}")]
    InvalidVersion {
        version: String,
        source: semver::Error,
    },

    #[error("Failed to parse {format} subscription at {path}: {message}")]
    ConfigParse {
        path: PathBuf,
        format: String,
        message: String,
    },

    #[error("Unsupported subscription format: {extension}")]
    UnsupportedFormat { extension: String },

    #[error("failed to serialize index: {0}")]
    Serialize(String),
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn manifest_load(path: impl Into<PathBuf>, source: Error) -> Self {
        Self::ManifestLoad {
            path: path.into(),
            source: Box::new(source),
        }
    }
}
