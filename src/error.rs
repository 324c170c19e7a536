//! Crate-level error taxonomy.
//!
//! Handlers return [`ArchivalError`]; its [`ErrorKind`] tells configuration,
//! validation and downstream failures apart so the failure reported to the
//! delivery substrate names what went wrong.

use std::fmt;

use thiserror::Error;

use crate::change_event::ValidationError;
use crate::config::ConfigError;
use crate::keyed_store::KeyedStoreError;
use crate::object_store::ObjectStoreError;

/// Coarse classification of an [`ArchivalError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Validation,
    Downstream,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration => f.write_str("ConfigurationError"),
            Self::Validation => f.write_str("ValidationError"),
            Self::Downstream => f.write_str("DownstreamError"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ArchivalError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid record at index {index}: {source}")]
    InvalidRecord {
        index: usize,
        #[source]
        source: ValidationError,
    },

    #[error("{failed} of {total} archive writes failed; first failure: {source}")]
    WritesFailed {
        failed: usize,
        total: usize,
        #[source]
        source: ObjectStoreError,
    },

    #[error("Failed to write seed item: {0}")]
    KeyedStore(#[from] KeyedStoreError),
}

impl ArchivalError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) => ErrorKind::Configuration,
            Self::InvalidRecord { .. } => ErrorKind::Validation,
            Self::WritesFailed { .. } | Self::KeyedStore(_) => ErrorKind::Downstream,
        }
    }
}

/// Result type for handler operations.
pub type Result<T> = std::result::Result<T, ArchivalError>;
