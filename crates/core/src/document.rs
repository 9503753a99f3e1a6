//! # Document Records
//!
//! Serialized form of a document graph. Nodes and their attachments live in
//! flat arrays and refer to each other by index, glTF style.
//!
//! ## Table of Contents
//! - **DocumentKind**: document / presentation / item, from the asset mime type
//! - **AssetInfo**: `asset` header block
//! - **Document**: Top-level record with all arrays
//! - **NodeRecord / SceneRecord / ModelRecord / ...**: Array entries
//! - **ItemDocument**: Single-model legacy document

use crate::bounds::BoundingBox;
use crate::derivative::DerivativeRecord;
use crate::error::{Result, VoyagerError};
use crate::units::UnitType;
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Major version this reader understands
pub const DOCUMENT_VERSION: &str = "1.0";

pub const DOCUMENT_MIME: &str = "application/si-dpo-3d.document+json";
pub const PRESENTATION_MIME: &str = "application/si-dpo-3d.presentation+json";
pub const ITEM_MIME: &str = "application/si-dpo-3d.item+json";

/// Kind of JSON document, selects the validator entry point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Document,
    Presentation,
    Item,
}

impl DocumentKind {
    pub fn mime_type(self) -> &'static str {
        match self {
            DocumentKind::Document => DOCUMENT_MIME,
            DocumentKind::Presentation => PRESENTATION_MIME,
            DocumentKind::Item => ITEM_MIME,
        }
    }

    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime {
            DOCUMENT_MIME => Some(DocumentKind::Document),
            PRESENTATION_MIME => Some(DocumentKind::Presentation),
            ITEM_MIME => Some(DocumentKind::Item),
            _ => None,
        }
    }

    /// Kind declared by `asset.type`. Documents without one are sniffed:
    /// a top-level `model` object means an item, `items` a presentation.
    pub fn detect(json: &Value) -> Self {
        let declared = json
            .get("asset")
            .and_then(|a| a.get("type"))
            .and_then(Value::as_str)
            .and_then(Self::from_mime);

        declared.unwrap_or_else(|| {
            if json.get("model").map(Value::is_object).unwrap_or(false) {
                DocumentKind::Item
            } else if json.get("items").is_some() {
                DocumentKind::Presentation
            } else {
                DocumentKind::Document
            }
        })
    }
}

/// `asset` header block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetInfo {
    #[serde(rename = "type", default = "default_mime")]
    pub mime_type: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub copyright: Option<String>,
}

fn default_mime() -> String {
    DOCUMENT_MIME.to_string()
}

impl Default for AssetInfo {
    fn default() -> Self {
        Self {
            mime_type: DOCUMENT_MIME.to_string(),
            version: DOCUMENT_VERSION.to_string(),
            generator: Some(format!("voyager-core {}", env!("CARGO_PKG_VERSION"))),
            copyright: None,
        }
    }
}

impl AssetInfo {
    /// Fails unless the major version matches [`DOCUMENT_VERSION`]
    pub fn check_version(&self) -> Result<()> {
        let major = |v: &str| v.split('.').next().unwrap_or_default().trim().to_string();
        if major(&self.version) != major(DOCUMENT_VERSION) {
            return Err(VoyagerError::VersionMismatch {
                expected: DOCUMENT_VERSION.to_string(),
                found: self.version.clone(),
            });
        }
        Ok(())
    }
}

/// Full document record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub asset: AssetInfo,

    /// Index of the root scene
    #[serde(default)]
    pub scene: usize,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scenes: Vec<SceneRecord>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nodes: Vec<NodeRecord>,

    #[serde(default, alias = "items", skip_serializing_if = "Vec::is_empty")]
    pub models: Vec<ModelRecord>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cameras: Vec<CameraRecord>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lights: Vec<LightRecord>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub infos: Vec<InfoRecord>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<ReferenceRecord>,
}

impl Document {
    pub fn from_json(json: Value) -> Result<Self> {
        let document: Document = serde_json::from_value(json)?;
        document.asset.check_version()?;
        Ok(document)
    }

    pub fn to_json(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Root scene record, if the document has scenes at all
    pub fn root_scene(&self) -> Result<Option<&SceneRecord>> {
        if self.scenes.is_empty() {
            return Ok(None);
        }
        self.scenes
            .get(self.scene)
            .map(Some)
            .ok_or_else(|| VoyagerError::out_of_range("scenes", self.scene, self.scenes.len()))
    }

    pub fn node(&self, index: usize) -> Result<&NodeRecord> {
        self.nodes
            .get(index)
            .ok_or_else(|| VoyagerError::out_of_range("nodes", index, self.nodes.len()))
    }
}

/// Fetch `array[index]` or report it out of range
pub fn resolve<'a, T>(array: &'a [T], name: &'static str, index: usize) -> Result<&'a T> {
    array
        .get(index)
        .ok_or_else(|| VoyagerError::out_of_range(name, index, array.len()))
}

/// Node entry. Component fields are indices into the matching arrays.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation: Option<Vec3>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<Quat>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<Vec3>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scene: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub light: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<usize>,
}

/// Scene entry, attached to the graph root
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub units: UnitType,
    #[serde(default)]
    pub nodes: Vec<usize>,
}

/// Model entry, `items` in legacy presentations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelRecord {
    #[serde(default)]
    pub units: UnitType,
    #[serde(default)]
    pub derivatives: Vec<DerivativeRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounding_box: Option<BoundingBox>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation: Option<Vec3>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<Quat>,
}

/// glTF camera entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraRecord {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub perspective: Option<PerspectiveRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orthographic: Option<OrthographicRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerspectiveRecord {
    /// Vertical field of view in radians
    pub yfov: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<f32>,
    pub znear: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zfar: Option<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrthographicRecord {
    pub xmag: f32,
    pub ymag: f32,
    pub znear: f32,
    pub zfar: f32,
}

/// Light entry. `type` selects the light kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LightRecord {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<[f32; 3]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intensity: Option<f32>,
    /// Point and spot lights
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decay: Option<f32>,
    /// Spot lights
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub angle: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub penumbra: Option<f32>,
    /// Hemisphere lights
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ground_color: Option<[f32; 3]>,
}

/// Descriptive metadata entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InfoRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Anything else is carried through unchanged
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// External document reference entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceRecord {
    pub uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

/// Legacy single-model document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemDocument {
    pub asset: AssetInfo,
    pub model: ModelRecord,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<InfoRecord>,
}

impl ItemDocument {
    pub fn from_json(json: Value) -> Result<Self> {
        let item: ItemDocument = serde_json::from_value(json)?;
        item.asset.check_version()?;
        Ok(item)
    }
}
