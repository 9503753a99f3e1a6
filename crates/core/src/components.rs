//! # Node Components
//!
//! Typed components a node can carry. Each one reads itself from the record
//! array its node points at and appends itself back on save.
//!
//! ## Table of Contents
//! - **DocumentComponent**: Read/write protocol against a [`Document`]
//! - **SceneComponent**: Scene name and display units (graph root only)
//! - **InfoComponent**: Descriptive metadata
//! - **CameraComponent**: Perspective or orthographic camera
//! - **LightComponent**: Directional, point, spot, ambient, hemisphere lights
//! - **ReferenceComponent**: Link to an external document

use crate::document::{
    resolve, CameraRecord, Document, InfoRecord, LightRecord, NodeRecord, OrthographicRecord,
    PerspectiveRecord, ReferenceRecord, SceneRecord,
};
use crate::error::{Result, VoyagerError};
use crate::loader::AssetPaths;
use crate::model::ModelComponent;
use crate::units::UnitType;

/// A component that round-trips through the flat document arrays
pub trait DocumentComponent {
    /// Read state from the record the node's index field points at
    fn from_document(&mut self, document: &Document, node: &NodeRecord) -> Result<()>;

    /// Append state to the matching array and return its index
    fn to_document(&self, document: &mut Document) -> usize;
}

fn required(index: Option<usize>, field: &'static str) -> Result<usize> {
    index.ok_or(VoyagerError::MissingIndex { field })
}

// ============================================================================
// Scene
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneComponent {
    pub name: Option<String>,
    pub units: UnitType,
}

impl SceneComponent {
    pub fn from_record(record: &SceneRecord) -> Self {
        Self {
            name: record.name.clone(),
            units: record.units,
        }
    }
}

impl DocumentComponent for SceneComponent {
    fn from_document(&mut self, document: &Document, node: &NodeRecord) -> Result<()> {
        let index = required(node.scene, "scene")?;
        *self = Self::from_record(resolve(&document.scenes, "scenes", index)?);
        Ok(())
    }

    fn to_document(&self, document: &mut Document) -> usize {
        document.scenes.push(SceneRecord {
            name: self.name.clone(),
            units: self.units,
            nodes: Vec::new(),
        });
        document.scenes.len() - 1
    }
}

// ============================================================================
// Info
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InfoComponent {
    pub record: InfoRecord,
}

impl InfoComponent {
    pub fn name(&self) -> Option<&str> {
        self.record.name.as_deref()
    }
}

impl DocumentComponent for InfoComponent {
    fn from_document(&mut self, document: &Document, node: &NodeRecord) -> Result<()> {
        let index = required(node.info, "info")?;
        self.record = resolve(&document.infos, "infos", index)?.clone();
        Ok(())
    }

    fn to_document(&self, document: &mut Document) -> usize {
        document.infos.push(self.record.clone());
        document.infos.len() - 1
    }
}

// ============================================================================
// Model
// ============================================================================

impl DocumentComponent for ModelComponent {
    fn from_document(&mut self, document: &Document, node: &NodeRecord) -> Result<()> {
        let index = required(node.model, "model")?;
        self.from_data(resolve(&document.models, "models", index)?)
    }

    fn to_document(&self, document: &mut Document) -> usize {
        document.models.push(self.to_data());
        document.models.len() - 1
    }
}

// ============================================================================
// Camera
// ============================================================================

/// Camera projection
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CameraProjection {
    Perspective {
        yfov: f32,
        aspect_ratio: Option<f32>,
        znear: f32,
        zfar: Option<f32>,
    },
    Orthographic {
        xmag: f32,
        ymag: f32,
        znear: f32,
        zfar: f32,
    },
}

impl Default for CameraProjection {
    fn default() -> Self {
        CameraProjection::Perspective {
            yfov: 52f32.to_radians(),
            aspect_ratio: None,
            znear: 0.01,
            zfar: Some(10_000.0),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CameraComponent {
    pub projection: CameraProjection,
}

impl CameraComponent {
    pub fn from_record(record: &CameraRecord) -> Result<Self> {
        let projection = match (record.kind.as_str(), record.perspective, record.orthographic) {
            ("perspective", Some(p), _) => CameraProjection::Perspective {
                yfov: p.yfov,
                aspect_ratio: p.aspect_ratio,
                znear: p.znear,
                zfar: p.zfar,
            },
            ("orthographic", _, Some(o)) => CameraProjection::Orthographic {
                xmag: o.xmag,
                ymag: o.ymag,
                znear: o.znear,
                zfar: o.zfar,
            },
            (kind, _, _) => {
                return Err(VoyagerError::validation(format!(
                    "camera of type '{}' lacks matching projection block",
                    kind
                )))
            }
        };
        Ok(Self { projection })
    }

    pub fn to_record(&self) -> CameraRecord {
        match self.projection {
            CameraProjection::Perspective { yfov, aspect_ratio, znear, zfar } => CameraRecord {
                kind: "perspective".into(),
                perspective: Some(PerspectiveRecord { yfov, aspect_ratio, znear, zfar }),
                orthographic: None,
            },
            CameraProjection::Orthographic { xmag, ymag, znear, zfar } => CameraRecord {
                kind: "orthographic".into(),
                perspective: None,
                orthographic: Some(OrthographicRecord { xmag, ymag, znear, zfar }),
            },
        }
    }
}

impl DocumentComponent for CameraComponent {
    fn from_document(&mut self, document: &Document, node: &NodeRecord) -> Result<()> {
        let index = required(node.camera, "camera")?;
        *self = Self::from_record(resolve(&document.cameras, "cameras", index)?)?;
        Ok(())
    }

    fn to_document(&self, document: &mut Document) -> usize {
        document.cameras.push(self.to_record());
        document.cameras.len() - 1
    }
}

// ============================================================================
// Light
// ============================================================================

/// Concrete light type with its kind-specific parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightKind {
    Directional,
    Point {
        distance: Option<f32>,
        decay: Option<f32>,
    },
    Spot {
        distance: Option<f32>,
        decay: Option<f32>,
        angle: Option<f32>,
        penumbra: Option<f32>,
    },
    Ambient,
    Hemisphere {
        ground_color: Option<[f32; 3]>,
    },
}

impl LightKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            LightKind::Directional => "directional",
            LightKind::Point { .. } => "point",
            LightKind::Spot { .. } => "spot",
            LightKind::Ambient => "ambient",
            LightKind::Hemisphere { .. } => "hemisphere",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LightComponent {
    pub kind: LightKind,
    pub color: [f32; 3],
    pub intensity: f32,
}

impl Default for LightComponent {
    fn default() -> Self {
        Self {
            kind: LightKind::Directional,
            color: [1.0, 1.0, 1.0],
            intensity: 1.0,
        }
    }
}

impl LightComponent {
    pub fn from_record(record: &LightRecord) -> Result<Self> {
        let kind = match record.kind.as_str() {
            "directional" => LightKind::Directional,
            "point" => LightKind::Point {
                distance: record.distance,
                decay: record.decay,
            },
            "spot" => LightKind::Spot {
                distance: record.distance,
                decay: record.decay,
                angle: record.angle,
                penumbra: record.penumbra,
            },
            "ambient" => LightKind::Ambient,
            "hemisphere" => LightKind::Hemisphere {
                ground_color: record.ground_color,
            },
            other => {
                return Err(VoyagerError::validation(format!("unknown light type '{}'", other)))
            }
        };

        Ok(Self {
            kind,
            color: record.color.unwrap_or([1.0, 1.0, 1.0]),
            intensity: record.intensity.unwrap_or(1.0),
        })
    }

    pub fn to_record(&self) -> LightRecord {
        let mut record = LightRecord {
            kind: self.kind.type_name().to_string(),
            color: Some(self.color),
            intensity: Some(self.intensity),
            distance: None,
            decay: None,
            angle: None,
            penumbra: None,
            ground_color: None,
        };
        match self.kind {
            LightKind::Point { distance, decay } => {
                record.distance = distance;
                record.decay = decay;
            }
            LightKind::Spot { distance, decay, angle, penumbra } => {
                record.distance = distance;
                record.decay = decay;
                record.angle = angle;
                record.penumbra = penumbra;
            }
            LightKind::Hemisphere { ground_color } => record.ground_color = ground_color,
            LightKind::Directional | LightKind::Ambient => {}
        }
        record
    }
}

impl DocumentComponent for LightComponent {
    fn from_document(&mut self, document: &Document, node: &NodeRecord) -> Result<()> {
        let index = required(node.light, "light")?;
        *self = Self::from_record(resolve(&document.lights, "lights", index)?)?;
        Ok(())
    }

    fn to_document(&self, document: &mut Document) -> usize {
        document.lights.push(self.to_record());
        document.lights.len() - 1
    }
}

// ============================================================================
// Reference
// ============================================================================

/// Link to an external document, inflated beneath the node once resolved
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceComponent {
    pub uri: String,
    pub mime_type: Option<String>,
    /// Directory of the document this reference was read from
    pub base: Option<String>,
    pub resolved: bool,
}

impl ReferenceComponent {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            ..Default::default()
        }
    }

    /// Location to fetch from, `fallback_base` applies when no base was recorded
    pub fn url(&self, fallback_base: Option<&str>) -> String {
        let base = self.base.as_deref().or(fallback_base).map(str::to_string);
        AssetPaths::new(base).resolve(&self.uri)
    }
}

impl DocumentComponent for ReferenceComponent {
    fn from_document(&mut self, document: &Document, node: &NodeRecord) -> Result<()> {
        let index = required(node.reference, "reference")?;
        let record = resolve(&document.references, "references", index)?;
        self.uri = record.uri.clone();
        self.mime_type = record.mime_type.clone();
        self.base = None;
        self.resolved = false;
        Ok(())
    }

    fn to_document(&self, document: &mut Document) -> usize {
        document.references.push(ReferenceRecord {
            uri: self.uri.clone(),
            mime_type: self.mime_type.clone(),
        });
        document.references.len() - 1
    }
}
