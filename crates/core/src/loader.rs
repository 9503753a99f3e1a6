//! # Loader Services
//!
//! The core never touches the network or the filesystem itself. Hosts hand
//! it an [`AssetLoader`] for fetching and a [`Validator`] for schema checks.
//!
//! ## Table of Contents
//! - **LoadError**: Failure reported by a loader
//! - **AssetLoader**: Async fetch/import service
//! - **Validator**: Document schema validation service
//! - **StructuralValidator**: Shape-only validator for hosts without a schema engine
//! - **AssetPaths**: Resolves relative asset URIs against a base path

use crate::object::{GeometryData, SceneObject, TextureHandle};
use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Errors that can occur while fetching or importing an asset
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LoadError {
    #[error("asset not found: {0}")]
    NotFound(String),

    #[error("io error: {0}")]
    Io(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("unsupported asset: {0}")]
    Unsupported(String),
}

impl From<std::io::Error> for LoadError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(err.to_string()),
            _ => Self::Io(err.to_string()),
        }
    }
}

/// Fetches and imports assets. URLs passed in are already resolved.
#[async_trait]
pub trait AssetLoader: Send + Sync {
    /// Import a full scene file (glTF/GLB) as one runtime object
    async fn load_model(&self, url: &str) -> Result<Box<dyn SceneObject>, LoadError>;

    /// Import a bare mesh (OBJ, PLY, STL, ...)
    async fn load_geometry(&self, url: &str) -> Result<GeometryData, LoadError>;

    /// Import a texture image
    async fn load_texture(&self, url: &str) -> Result<TextureHandle, LoadError>;

    /// Fetch and parse a JSON file
    async fn load_json(&self, url: &str) -> Result<Value, LoadError>;
}

// ============================================================================
// Validation
// ============================================================================

/// Schema validation for the three document kinds
pub trait Validator: Send + Sync {
    fn validate_document(&self, json: &Value) -> bool;
    fn validate_presentation(&self, json: &Value) -> bool;
    fn validate_item(&self, json: &Value) -> bool;
}

/// Checks top-level shape only: an object with an `asset.version` string,
/// array-typed collections and non-negative integer indices.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuralValidator;

const DOCUMENT_ARRAYS: &[&str] = &[
    "scenes", "nodes", "models", "items", "cameras", "lights", "infos", "references",
];

impl StructuralValidator {
    fn has_asset_block(json: &Value) -> bool {
        json.get("asset")
            .and_then(|a| a.get("version"))
            .map(Value::is_string)
            .unwrap_or(false)
    }

    fn is_index(value: &Value) -> bool {
        value.as_u64().is_some()
    }

    fn check_graph(json: &Value) -> bool {
        if !json.is_object() || !Self::has_asset_block(json) {
            return false;
        }

        for key in DOCUMENT_ARRAYS {
            if let Some(value) = json.get(*key) {
                if !value.is_array() {
                    return false;
                }
            }
        }

        if let Some(scene) = json.get("scene") {
            if !Self::is_index(scene) {
                return false;
            }
        }

        let nodes = json.get("nodes").and_then(Value::as_array);
        for node in nodes.into_iter().flatten() {
            if !node.is_object() {
                return false;
            }
            if let Some(children) = node.get("children") {
                match children.as_array() {
                    Some(list) if list.iter().all(Self::is_index) => {}
                    _ => return false,
                }
            }
            for field in ["scene", "info", "model", "camera", "light", "reference"] {
                if let Some(index) = node.get(field) {
                    if !Self::is_index(index) {
                        return false;
                    }
                }
            }
        }

        true
    }
}

impl Validator for StructuralValidator {
    fn validate_document(&self, json: &Value) -> bool {
        Self::check_graph(json)
    }

    fn validate_presentation(&self, json: &Value) -> bool {
        Self::check_graph(json)
    }

    fn validate_item(&self, json: &Value) -> bool {
        json.is_object()
            && Self::has_asset_block(json)
            && json.get("model").map(Value::is_object).unwrap_or(false)
    }
}

// ============================================================================
// Paths
// ============================================================================

/// Resolves asset URIs against an optional base path or URL
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetPaths {
    base: Option<String>,
}

impl AssetPaths {
    pub fn new(base: Option<String>) -> Self {
        Self {
            base: base.filter(|b| !b.is_empty()),
        }
    }

    pub fn base(&self) -> Option<&str> {
        self.base.as_deref()
    }

    /// True for URIs that must not be prefixed
    pub fn is_absolute(uri: &str) -> bool {
        uri.contains("://") || uri.starts_with('/') || uri.starts_with("data:")
    }

    /// Join `uri` onto the base unless it is already absolute
    pub fn resolve(&self, uri: &str) -> String {
        match &self.base {
            Some(base) if !Self::is_absolute(uri) => {
                format!("{}/{}", base.trim_end_matches('/'), uri.trim_start_matches("./"))
            }
            _ => uri.to_string(),
        }
    }

    /// Directory part of a URL, used as base for documents it references
    pub fn parent_of(url: &str) -> Option<String> {
        url.rfind('/').map(|i| url[..i].to_string())
    }
}
