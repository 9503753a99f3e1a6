//! # Voyager Core
//!
//! Derivative selection, progressive loading and document graph
//! serialization for the Voyager 3D object viewer.
//!
//! ## Table of Contents
//! - **asset / derivative / derivative_list**: Tiered asset bundles and selection
//! - **model**: Model component with auto-load and quality switching
//! - **units / bounds**: Unit conversion and bounding boxes
//! - **object / loader**: Runtime object handles and the loader services
//! - **document / components / graph / composer**: Document records, typed
//!   components, live node tree, inflate/deflate
//! - **document_loader**: Fetch, validate, inflate, resolve references
//! - **config / events / error**: Configuration, scene events, error types

pub mod asset;
pub mod bounds;
pub mod components;
pub mod composer;
pub mod config;
pub mod derivative;
pub mod derivative_list;
pub mod document;
pub mod document_loader;
pub mod error;
pub mod events;
pub mod graph;
pub mod loader;
pub mod model;
pub mod object;
pub mod units;

#[cfg(test)]
pub(crate) mod testing;

pub use asset::{Asset, AssetType, MapType};
pub use bounds::BoundingBox;
pub use config::ViewerConfig;
pub use derivative::{Derivative, DerivativeKey, Quality, Usage};
pub use derivative_list::DerivativeList;
pub use document::{Document, DocumentKind};
pub use document_loader::DocumentLoader;
pub use error::{Result, VoyagerError};
pub use events::SceneEvent;
pub use graph::{Graph, NodeId};
pub use loader::{AssetLoader, LoadError, StructuralValidator, Validator};
pub use model::{ModelComponent, ModelState};
pub use object::{GeometryData, MeshObject, SceneObject, TextureHandle};
pub use units::{unit_scale, UnitType};
