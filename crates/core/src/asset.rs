//! # Asset
//!
//! One loadable file belonging to a derivative: a glTF scene, a bare mesh,
//! a texture map, an image.
//!
//! ## Table of Contents
//! - **AssetType**: What kind of content the file holds
//! - **MapType**: Which material slot a texture feeds
//! - **Asset**: File description with size/complexity hints

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::warn;

/// Content category of an asset file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetType {
    /// Full scene file (glTF/GLB), imported as one object
    Model,
    /// Bare mesh (OBJ, PLY, STL), combined with texture maps
    Geometry,
    /// Standalone image
    Image,
    /// Texture map for a geometry derivative
    Texture,
    /// Point cloud
    Points,
    /// Volume data
    Volume,
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Material slot a texture asset maps to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MapType {
    Color,
    Emissive,
    Occlusion,
    Normal,
    MetallicRoughness,
    Zone,
}

impl MapType {
    /// Maps applied to generated materials, in load order
    pub const MATERIAL_MAPS: [MapType; 5] = [
        MapType::Color,
        MapType::Normal,
        MapType::Occlusion,
        MapType::Emissive,
        MapType::MetallicRoughness,
    ];
}

fn is_zero(v: &u64) -> bool {
    *v == 0
}

/// Description of one asset file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    /// Location, relative to the document or absolute
    pub uri: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub asset_type: Option<AssetType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map_type: Option<MapType>,

    /// File size in bytes
    #[serde(default, skip_serializing_if = "is_zero")]
    pub byte_size: u64,

    #[serde(default, skip_serializing_if = "is_zero")]
    pub num_faces: u64,

    #[serde(default, skip_serializing_if = "is_zero")]
    pub num_vertices: u64,

    /// Edge length in pixels for square images
    #[serde(default, skip_serializing_if = "is_zero")]
    pub image_size: u64,
}

impl Asset {
    /// Create an asset with a known type
    pub fn new(uri: impl Into<String>, asset_type: AssetType) -> Self {
        Self {
            asset_type: Some(asset_type),
            ..Self::from_uri(uri)
        }
    }

    /// Create an untyped asset; call [`Asset::infer_type`] to fill the type in
    pub fn from_uri(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            mime_type: None,
            asset_type: None,
            map_type: None,
            byte_size: 0,
            num_faces: 0,
            num_vertices: 0,
            image_size: 0,
        }
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    pub fn with_map_type(mut self, map_type: MapType) -> Self {
        self.map_type = Some(map_type);
        self
    }

    pub fn with_byte_size(mut self, byte_size: u64) -> Self {
        self.byte_size = byte_size;
        self
    }

    pub fn with_complexity(mut self, num_faces: u64, num_vertices: u64) -> Self {
        self.num_faces = num_faces;
        self.num_vertices = num_vertices;
        self
    }

    pub fn with_image_size(mut self, image_size: u64) -> Self {
        self.image_size = image_size;
        self
    }

    /// A valid asset has a uri and a known type
    pub fn is_valid(&self) -> bool {
        !self.uri.is_empty() && self.asset_type.is_some()
    }

    /// Lowercased file extension of the uri, ignoring query and fragment
    pub fn extension(&self) -> Option<String> {
        let path = self.uri.split(['?', '#']).next().unwrap_or_default();
        Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
    }

    /// Fill in missing mime type and asset type. An asset whose type cannot
    /// be determined stays untyped and a warning is logged.
    pub fn infer_type(&mut self) {
        if self.mime_type.is_none() {
            self.mime_type = mime_guess::from_path(&self.uri)
                .first()
                .map(|m| m.essence_str().to_string());
        }

        if self.asset_type.is_some() {
            return;
        }

        let from_mime = self.mime_type.as_deref().and_then(|m| self.type_from_mime(m));
        self.asset_type = from_mime.or_else(|| self.type_from_extension());

        if self.asset_type.is_none() {
            warn!(uri = %self.uri, "failed to determine asset type from mime type or extension");
        }
    }

    fn image_kind(&self) -> AssetType {
        if self.map_type.is_some() {
            AssetType::Texture
        } else {
            AssetType::Image
        }
    }

    fn type_from_mime(&self, mime: &str) -> Option<AssetType> {
        match mime {
            "model/gltf+json" | "model/gltf-binary" => Some(AssetType::Model),
            "model/obj" | "model/stl" | "model/ply" | "application/sla" => {
                Some(AssetType::Geometry)
            }
            m if m.starts_with("image/") => Some(self.image_kind()),
            _ => None,
        }
    }

    fn type_from_extension(&self) -> Option<AssetType> {
        match self.extension()?.as_str() {
            "gltf" | "glb" => Some(AssetType::Model),
            "obj" | "ply" | "stl" => Some(AssetType::Geometry),
            "jpg" | "jpeg" | "png" | "webp" | "tif" | "tiff" => Some(self.image_kind()),
            "pts" | "xyz" | "e57" | "las" | "laz" => Some(AssetType::Points),
            "vol" | "nrrd" => Some(AssetType::Volume),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validity() {
        assert!(Asset::new("a.glb", AssetType::Model).is_valid());
        assert!(!Asset::new("", AssetType::Model).is_valid());
        assert!(!Asset::from_uri("a.glb").is_valid());
    }

    #[test]
    fn test_infer_from_extension() {
        let mut model = Asset::from_uri("objects/chair-high.glb");
        model.infer_type();
        assert_eq!(model.asset_type, Some(AssetType::Model));

        let mut mesh = Asset::from_uri("chair.OBJ?v=2");
        mesh.infer_type();
        assert_eq!(mesh.asset_type, Some(AssetType::Geometry));

        let mut color = Asset::from_uri("chair-diffuse.jpg").with_map_type(MapType::Color);
        color.infer_type();
        assert_eq!(color.asset_type, Some(AssetType::Texture));
        assert_eq!(color.mime_type.as_deref(), Some("image/jpeg"));

        let mut image = Asset::from_uri("thumb.png");
        image.infer_type();
        assert_eq!(image.asset_type, Some(AssetType::Image));
    }

    #[test]
    fn test_infer_prefers_mime() {
        let mut asset = Asset::from_uri("blob").with_mime_type("model/gltf-binary");
        asset.infer_type();
        assert_eq!(asset.asset_type, Some(AssetType::Model));
    }

    #[test]
    fn test_infer_failure_leaves_untyped() {
        let mut asset = Asset::from_uri("mystery.bin9");
        asset.infer_type();
        assert_eq!(asset.asset_type, None);
        assert!(!asset.is_valid());
    }

    #[test]
    fn test_serde_field_names() {
        let asset = Asset::new("a.jpg", AssetType::Texture)
            .with_map_type(MapType::MetallicRoughness)
            .with_byte_size(1024)
            .with_image_size(512);
        let json = serde_json::to_value(&asset).unwrap();
        assert_eq!(json["type"], "Texture");
        assert_eq!(json["mapType"], "MetallicRoughness");
        assert_eq!(json["byteSize"], 1024);
        assert_eq!(json["imageSize"], 512);
        assert!(json.get("numFaces").is_none());

        let back: Asset = serde_json::from_value(json).unwrap();
        assert_eq!(back, asset);
    }
}
