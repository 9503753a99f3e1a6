//! # Derivatives
//!
//! A derivative is one renderable version of an object at a given usage and
//! quality tier, e.g. the web thumbnail or the high quality print mesh. It
//! bundles the asset files needed to build it and owns the runtime object
//! once loaded.
//!
//! ## Table of Contents
//! - **Usage / Quality**: Tier keys
//! - **DerivativeKey**: (usage, quality) pair
//! - **Derivative**: Asset bundle + owned runtime object
//! - **DerivativeRecord**: Serialized form
//! - **fetch_object**: Build a runtime object from an asset snapshot

use crate::asset::{Asset, AssetType, MapType};
use crate::error::{Result, VoyagerError};
use crate::loader::{AssetLoader, AssetPaths};
use crate::object::{GeneratedMaterial, MeshObject, SceneObject};
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

// ============================================================================
// Tier keys
// ============================================================================

/// Purpose channel of a derivative
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum Usage {
    #[default]
    Web,
    Print,
    Editorial,
}

impl Usage {
    pub const ALL: [Usage; 3] = [Usage::Web, Usage::Print, Usage::Editorial];
}

/// Fidelity tier, ordered from lowest to highest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum Quality {
    Thumb,
    Low,
    Medium,
    #[default]
    High,
    Highest,
    #[serde(rename = "LOD")]
    Lod,
    Stream,
}

impl Quality {
    /// Tiers that take part in fallback selection
    pub const LADDER: [Quality; 5] = [
        Quality::Thumb,
        Quality::Low,
        Quality::Medium,
        Quality::High,
        Quality::Highest,
    ];

    /// Position on the selection ladder, `None` for LOD and Stream
    pub fn ladder_index(self) -> Option<usize> {
        Self::LADDER.iter().position(|q| *q == self)
    }
}

impl fmt::Display for Usage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Quality::Lod => f.write_str("LOD"),
            other => fmt::Debug::fmt(other, f),
        }
    }
}

impl FromStr for Usage {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Usage::ALL
            .into_iter()
            .find(|u| u.to_string().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown usage '{}'", s))
    }
}

impl FromStr for Quality {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Quality::LADDER
            .into_iter()
            .chain([Quality::Lod, Quality::Stream])
            .find(|q| q.to_string().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown quality '{}'", s))
    }
}

/// Identifies a derivative within a list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DerivativeKey {
    pub usage: Usage,
    pub quality: Quality,
}

impl DerivativeKey {
    pub fn new(usage: Usage, quality: Quality) -> Self {
        Self { usage, quality }
    }
}

impl fmt::Display for DerivativeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.usage, self.quality)
    }
}

/// How a derivative is turned into a runtime object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DerivativeType {
    /// One full scene asset
    Model,
    /// Mesh asset plus texture maps
    Geometry,
}

// ============================================================================
// Derivative
// ============================================================================

/// One (usage, quality) version of a model
#[derive(Debug)]
pub struct Derivative {
    usage: Usage,
    quality: Quality,
    assets: Vec<Asset>,
    object: Option<Box<dyn SceneObject>>,
}

/// Serialized derivative inside a model record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivativeRecord {
    pub usage: Usage,
    pub quality: Quality,
    #[serde(default)]
    pub assets: Vec<Asset>,
}

impl Derivative {
    pub fn new(usage: Usage, quality: Quality) -> Self {
        Self {
            usage,
            quality,
            assets: Vec::new(),
            object: None,
        }
    }

    /// Build from a record; untyped assets get their type inferred
    pub fn from_record(record: DerivativeRecord) -> Self {
        let mut derivative = Self::new(record.usage, record.quality);
        for asset in record.assets {
            derivative.add_asset(asset);
        }
        derivative
    }

    pub fn to_record(&self) -> DerivativeRecord {
        DerivativeRecord {
            usage: self.usage,
            quality: self.quality,
            assets: self.assets.clone(),
        }
    }

    pub fn usage(&self) -> Usage {
        self.usage
    }

    pub fn quality(&self) -> Quality {
        self.quality
    }

    pub fn key(&self) -> DerivativeKey {
        DerivativeKey::new(self.usage, self.quality)
    }

    pub fn assets(&self) -> &[Asset] {
        &self.assets
    }

    /// Append an asset, inferring its type when absent
    pub fn add_asset(&mut self, mut asset: Asset) -> &mut Asset {
        asset.infer_type();
        self.assets.push(asset);
        let last = self.assets.len() - 1;
        &mut self.assets[last]
    }

    pub fn create_model_asset(&mut self, uri: impl Into<String>) -> &mut Asset {
        self.add_asset(Asset::new(uri, AssetType::Model))
    }

    pub fn create_mesh_asset(&mut self, uri: impl Into<String>) -> &mut Asset {
        self.add_asset(Asset::new(uri, AssetType::Geometry))
    }

    pub fn create_texture_asset(&mut self, uri: impl Into<String>, map_type: MapType) -> &mut Asset {
        self.add_asset(Asset::new(uri, AssetType::Texture).with_map_type(map_type))
    }

    /// First asset of the given type
    pub fn asset(&self, asset_type: AssetType) -> Option<&Asset> {
        self.assets.iter().find(|a| a.asset_type == Some(asset_type))
    }

    /// First texture asset feeding the given material slot
    pub fn find_asset_by_map(&self, map_type: MapType) -> Option<&Asset> {
        self.assets
            .iter()
            .find(|a| a.asset_type == Some(AssetType::Texture) && a.map_type == Some(map_type))
    }

    pub fn derivative_type(&self) -> Option<DerivativeType> {
        derivative_type_of(&self.assets)
    }

    pub fn object(&self) -> Option<&dyn SceneObject> {
        self.object.as_deref()
    }

    pub fn object_mut(&mut self) -> Option<&mut (dyn SceneObject + 'static)> {
        self.object.as_deref_mut()
    }

    pub fn has_object(&self) -> bool {
        self.object.is_some()
    }

    /// Install a loaded object, disposing any previous one first
    pub fn set_object(&mut self, object: Box<dyn SceneObject>) {
        self.dispose();
        self.object = Some(object);
    }

    /// Dispose and drop the runtime object. Safe to call repeatedly.
    pub fn dispose(&mut self) {
        if let Some(mut object) = self.object.take() {
            object.dispose();
        }
    }

    /// Load this derivative's object in place
    pub async fn load(&mut self, loader: &dyn AssetLoader, paths: &AssetPaths) -> Result<()> {
        let object = fetch_object(loader, paths, &self.assets).await?;
        self.set_object(object);
        Ok(())
    }
}

impl Drop for Derivative {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn derivative_type_of(assets: &[Asset]) -> Option<DerivativeType> {
    let has = |t| assets.iter().any(|a: &Asset| a.asset_type == Some(t));
    if has(AssetType::Model) {
        Some(DerivativeType::Model)
    } else if has(AssetType::Geometry) {
        Some(DerivativeType::Geometry)
    } else {
        None
    }
}

// ============================================================================
// Fetch
// ============================================================================

/// Build the runtime object for an asset bundle.
///
/// Model derivatives import their scene asset. Geometry derivatives import
/// the mesh and every material texture concurrently and assemble them into
/// a [`MeshObject`]. Touches no model state, so the caller decides whether
/// the result is still wanted.
pub async fn fetch_object(
    loader: &dyn AssetLoader,
    paths: &AssetPaths,
    assets: &[Asset],
) -> Result<Box<dyn SceneObject>> {
    let find = |t| assets.iter().find(|a: &&Asset| a.asset_type == Some(t));

    match derivative_type_of(assets) {
        Some(DerivativeType::Model) => {
            let asset = find(AssetType::Model)
                .ok_or_else(|| VoyagerError::validation("model asset missing"))?;
            let url = paths.resolve(&asset.uri);
            debug!(url = %url, "loading model asset");
            Ok(loader.load_model(&url).await?)
        }
        Some(DerivativeType::Geometry) => {
            let mesh = find(AssetType::Geometry)
                .ok_or_else(|| VoyagerError::validation("geometry asset missing"))?;
            let mesh_url = paths.resolve(&mesh.uri);

            let maps: Vec<(MapType, String)> = MapType::MATERIAL_MAPS
                .iter()
                .filter_map(|map| {
                    assets
                        .iter()
                        .find(|a| a.asset_type == Some(AssetType::Texture) && a.map_type == Some(*map))
                        .map(|a| (*map, paths.resolve(&a.uri)))
                })
                .collect();

            debug!(url = %mesh_url, textures = maps.len(), "loading geometry asset");

            let textures = try_join_all(maps.iter().map(|(map, url)| async move {
                loader.load_texture(url).await.map(|tex| (*map, tex))
            }));
            let (geometry, textures) =
                futures::try_join!(loader.load_geometry(&mesh_url), textures)?;

            let mut material = GeneratedMaterial::default();
            for (map, texture) in textures {
                material.assign(map, texture);
            }
            Ok(Box::new(MeshObject::new(geometry, material)))
        }
        None => Err(VoyagerError::validation(
            "derivative has no model or geometry asset",
        )),
    }
}
