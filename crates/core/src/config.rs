//! # Viewer Configuration
//!
//! TOML-based configuration for derivative selection and document loading.

use crate::derivative::{Quality, Usage};
use crate::error::Result;
use crate::units::UnitType;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Viewer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewerConfig {
    /// Load derivatives as soon as a model is activated
    #[serde(default = "default_true")]
    pub auto_load: bool,

    /// Target quality for auto-load
    #[serde(default = "default_quality")]
    pub quality: Quality,

    /// Usage bin to select derivatives from
    #[serde(default)]
    pub usage: Usage,

    /// Units the scene is displayed in
    #[serde(default)]
    pub global_units: UnitType,

    /// Run the validator on every fetched document
    #[serde(default = "default_true")]
    pub validate_documents: bool,

    /// Base path or URL prepended to relative asset URIs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_base: Option<String>,
}

fn default_true() -> bool { true }
fn default_quality() -> Quality { Quality::High }

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            auto_load: true,
            quality: default_quality(),
            usage: Usage::Web,
            global_units: UnitType::Meters,
            validate_documents: true,
            asset_base: None,
        }
    }
}

impl ViewerConfig {
    /// Load from TOML file or return default
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            match std::fs::read_to_string(path) {
                Ok(content) => match toml::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse viewer config: {}", e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read viewer config: {}", e);
                }
            }
        }
        Self::default()
    }

    /// Load from TOML file, failing on read or parse errors
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Save to TOML file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Development preset: quick low-quality previews, no validation
    pub fn development() -> Self {
        Self {
            auto_load: true,
            quality: Quality::Low,
            usage: Usage::Web,
            global_units: UnitType::Meters,
            validate_documents: false,
            asset_base: None,
        }
    }

    pub fn with_asset_base(mut self, base: impl Into<String>) -> Self {
        self.asset_base = Some(base.into());
        self
    }
}

/// Example TOML configuration file
pub const EXAMPLE_CONFIG: &str = r#"
# Voyager viewer configuration

# Load derivatives when a model is activated
auto_load = true

# Target quality: Thumb, Low, Medium, High, Highest
quality = "High"

# Usage bin: Web, Print, Editorial
usage = "Web"

# Display units: mm, cm, m, in, ft, yd
global_units = "m"

# Validate documents before inflating them
validate_documents = true

# Prefix for relative asset URIs
# asset_base = "https://cdn.example.org/objects"
"#;
