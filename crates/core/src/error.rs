//! Error types for Voyager
//!
//! ## Table of Contents
//! - **VoyagerError**: Main error enum covering all failure modes
//! - **Result**: Type alias for `Result<T, VoyagerError>`

use crate::derivative::{Quality, Usage};
use crate::loader::LoadError;
use thiserror::Error;

/// Result type alias for Voyager operations
pub type Result<T> = std::result::Result<T, VoyagerError>;

/// Main error type for Voyager operations
#[derive(Error, Debug)]
pub enum VoyagerError {
    /// Malformed or schema-invalid document content
    #[error("validation error: {0}")]
    Validation(String),

    /// A node record lacks the index field a component needs
    #[error("node is missing required index field '{field}'")]
    MissingIndex {
        /// Name of the absent field (`camera`, `model`, ...)
        field: &'static str,
    },

    /// A cross reference points past the end of its target array
    #[error("{array}[{index}] is out of range (length {len})")]
    IndexOutOfRange {
        /// Target array name
        array: &'static str,
        /// Offending index
        index: usize,
        /// Array length at resolution time
        len: usize,
    },

    /// Derivatives were already populated on this model
    #[error("model already has derivatives, refusing to populate again")]
    AlreadyPopulated,

    /// A derivative with the same usage and quality is already registered
    #[error("derivative {usage}/{quality} already exists")]
    DuplicateDerivative {
        /// Usage bin
        usage: Usage,
        /// Quality tier
        quality: Quality,
    },

    /// Load requested for a derivative the list does not contain
    #[error("no derivative {usage}/{quality} in list")]
    UnknownDerivative {
        /// Usage bin
        usage: Usage,
        /// Quality tier
        quality: Quality,
    },

    /// Document version is not supported by this reader
    #[error("version mismatch: expected {expected}, found {found}")]
    VersionMismatch {
        /// Supported version
        expected: String,
        /// Version found in the document
        found: String,
    },

    /// Asset loader failure
    #[error("load error: {0}")]
    Load(#[from] LoadError),

    /// JSON (de)serialization failure
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

impl VoyagerError {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an out-of-range error for `array[index]`
    pub fn out_of_range(array: &'static str, index: usize, len: usize) -> Self {
        Self::IndexOutOfRange { array, index, len }
    }
}

impl From<toml::de::Error> for VoyagerError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for VoyagerError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Config(err.to_string())
    }
}
