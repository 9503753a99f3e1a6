//! # Runtime Objects
//!
//! Handles for loaded content owned by a derivative. The render layer lives
//! outside the core; all the core needs from an object is its bounds and a
//! way to attach and dispose it.
//!
//! ## Table of Contents
//! - **SceneObject**: Trait implemented by every displayable object
//! - **GeometryData**: Imported mesh payload
//! - **TextureHandle**: Imported texture payload
//! - **GeneratedMaterial**: Material assembled from texture maps
//! - **MeshObject**: Geometry + generated material

use crate::asset::MapType;
use crate::bounds::BoundingBox;
use glam::Vec4;
use std::fmt;

/// A loaded runtime object that can be shown in a scene
pub trait SceneObject: Send + Sync + fmt::Debug {
    /// Local-space bounds, `None` for objects without geometry
    fn bounding_box(&self) -> Option<BoundingBox>;

    /// Called once when the object becomes the displayed one
    fn attach(&mut self);

    /// Release resources. Must be idempotent.
    fn dispose(&mut self);

    fn is_disposed(&self) -> bool;
}

/// Mesh data returned by a geometry import
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeometryData {
    /// Source URL
    pub source: String,
    pub num_vertices: u64,
    pub num_faces: u64,
    /// Bounds of all vertex positions, if any
    pub bounds: Option<BoundingBox>,
}

/// Texture returned by a texture import
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextureHandle {
    /// Source URL
    pub source: String,
    pub width: u32,
    pub height: u32,
}

/// Material for geometry derivatives, one slot per supported map
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedMaterial {
    /// Base color factor (RGBA)
    pub base_color: Vec4,
    pub color_map: Option<TextureHandle>,
    pub normal_map: Option<TextureHandle>,
    pub occlusion_map: Option<TextureHandle>,
    pub emissive_map: Option<TextureHandle>,
    pub metallic_roughness_map: Option<TextureHandle>,
}

impl Default for GeneratedMaterial {
    fn default() -> Self {
        Self {
            base_color: Vec4::ONE,
            color_map: None,
            normal_map: None,
            occlusion_map: None,
            emissive_map: None,
            metallic_roughness_map: None,
        }
    }
}

impl GeneratedMaterial {
    /// Put `texture` into the slot for `map_type`. Returns false for map
    /// types the material has no slot for (zone maps).
    pub fn assign(&mut self, map_type: MapType, texture: TextureHandle) -> bool {
        let slot = match map_type {
            MapType::Color => &mut self.color_map,
            MapType::Normal => &mut self.normal_map,
            MapType::Occlusion => &mut self.occlusion_map,
            MapType::Emissive => &mut self.emissive_map,
            MapType::MetallicRoughness => &mut self.metallic_roughness_map,
            MapType::Zone => return false,
        };
        *slot = Some(texture);
        true
    }

    /// Number of filled map slots
    pub fn map_count(&self) -> usize {
        [
            &self.color_map,
            &self.normal_map,
            &self.occlusion_map,
            &self.emissive_map,
            &self.metallic_roughness_map,
        ]
        .iter()
        .filter(|m| m.is_some())
        .count()
    }
}

/// Object built from a geometry derivative
#[derive(Debug, Clone)]
pub struct MeshObject {
    pub geometry: GeometryData,
    pub material: GeneratedMaterial,
    attached: bool,
    disposed: bool,
}

impl MeshObject {
    pub fn new(geometry: GeometryData, material: GeneratedMaterial) -> Self {
        Self {
            geometry,
            material,
            attached: false,
            disposed: false,
        }
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }
}

impl SceneObject for MeshObject {
    fn bounding_box(&self) -> Option<BoundingBox> {
        self.geometry.bounds
    }

    fn attach(&mut self) {
        self.attached = true;
    }

    fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.attached = false;
        self.disposed = true;
    }

    fn is_disposed(&self) -> bool {
        self.disposed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tex(name: &str) -> TextureHandle {
        TextureHandle {
            source: name.to_string(),
            width: 4,
            height: 4,
        }
    }

    #[test]
    fn test_material_slots() {
        let mut material = GeneratedMaterial::default();
        assert!(material.assign(MapType::Color, tex("diffuse.jpg")));
        assert!(material.assign(MapType::Normal, tex("normal.jpg")));
        assert!(!material.assign(MapType::Zone, tex("zone.png")));
        assert_eq!(material.map_count(), 2);
        assert_eq!(material.color_map.as_ref().map(|t| t.source.as_str()), Some("diffuse.jpg"));
    }

    #[test]
    fn test_mesh_object_dispose_idempotent() {
        let mut mesh = MeshObject::new(GeometryData::default(), GeneratedMaterial::default());
        mesh.attach();
        assert!(mesh.is_attached());
        mesh.dispose();
        mesh.dispose();
        assert!(mesh.is_disposed());
        assert!(!mesh.is_attached());
    }
}
