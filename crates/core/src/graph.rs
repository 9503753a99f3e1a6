//! # Document Graph
//!
//! Live node tree of one open document. Nodes are stored in an arena and
//! addressed by [`NodeId`]; each node carries a closed set of typed
//! component slots.
//!
//! ## Table of Contents
//! - **NodeId**: Arena handle
//! - **NodeComponents / ComponentRef**: Component slots and their sum type
//! - **Node**: Name, local transform, hierarchy links, components
//! - **Graph**: Arena, root node, model factory, scene-wide operations

use crate::bounds::BoundingBox;
use crate::components::{
    CameraComponent, InfoComponent, LightComponent, ReferenceComponent, SceneComponent,
};
use crate::config::ViewerConfig;
use crate::derivative::Quality;
use crate::error::{Result, VoyagerError};
use crate::events::EventSender;
use crate::loader::AssetLoader;
use crate::model::ModelComponent;
use crate::units::UnitType;
use glam::{Mat4, Quat, Vec3};
use std::fmt;

/// Handle to a node in a [`Graph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// Component slots of a node. Info and model may coexist.
#[derive(Debug, Default)]
pub struct NodeComponents {
    pub scene: Option<SceneComponent>,
    pub info: Option<InfoComponent>,
    pub model: Option<ModelComponent>,
    pub camera: Option<CameraComponent>,
    pub light: Option<LightComponent>,
    pub reference: Option<ReferenceComponent>,
}

/// Borrowed view of one attached component
#[derive(Debug, Clone, Copy)]
pub enum ComponentRef<'a> {
    Scene(&'a SceneComponent),
    Info(&'a InfoComponent),
    Model(&'a ModelComponent),
    Camera(&'a CameraComponent),
    Light(&'a LightComponent),
    Reference(&'a ReferenceComponent),
}

impl ComponentRef<'_> {
    pub fn type_name(&self) -> &'static str {
        match self {
            ComponentRef::Scene(_) => "Scene",
            ComponentRef::Info(_) => "Info",
            ComponentRef::Model(_) => "Model",
            ComponentRef::Camera(_) => "Camera",
            ComponentRef::Light(_) => "Light",
            ComponentRef::Reference(_) => "Reference",
        }
    }
}

impl NodeComponents {
    /// Attached components in serialization order
    pub fn iter(&self) -> impl Iterator<Item = ComponentRef<'_>> {
        [
            self.scene.as_ref().map(ComponentRef::Scene),
            self.info.as_ref().map(ComponentRef::Info),
            self.model.as_ref().map(ComponentRef::Model),
            self.camera.as_ref().map(ComponentRef::Camera),
            self.light.as_ref().map(ComponentRef::Light),
            self.reference.as_ref().map(ComponentRef::Reference),
        ]
        .into_iter()
        .flatten()
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }
}

/// Scene graph node
#[derive(Debug)]
pub struct Node {
    pub name: Option<String>,
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
    pub components: NodeComponents,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    fn new(parent: Option<NodeId>) -> Self {
        Self {
            name: None,
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            components: NodeComponents::default(),
            parent,
            children: Vec::new(),
        }
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Local transform: translate * rotate * scale
    pub fn local_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

/// Node tree of one document
#[derive(Debug)]
pub struct Graph {
    nodes: Vec<Option<Node>>,
    root: NodeId,
    config: ViewerConfig,
    events: Option<EventSender>,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new(ViewerConfig::default(), None)
    }
}

impl Graph {
    /// Create a graph holding only its root node
    pub fn new(config: ViewerConfig, events: Option<EventSender>) -> Self {
        Self {
            nodes: vec![Some(Node::new(None))],
            root: NodeId(0),
            config,
            events,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)?.as_ref()
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)?.as_mut()
    }

    fn require(&self, id: NodeId) -> Result<&Node> {
        self.node(id)
            .ok_or_else(|| VoyagerError::validation(format!("{} does not exist", id)))
    }

    fn require_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.node_mut(id)
            .ok_or_else(|| VoyagerError::validation(format!("{} does not exist", id)))
    }

    /// Number of live nodes, root included
    pub fn len(&self) -> usize {
        self.nodes.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(Node::children).unwrap_or_default()
    }

    /// Append a new empty node under `parent`
    pub fn add_node(&mut self, parent: NodeId) -> Result<NodeId> {
        self.require(parent)?;
        let id = NodeId(self.nodes.len());
        self.nodes.push(Some(Node::new(Some(parent))));
        self.require_mut(parent)?.children.push(id);
        Ok(id)
    }

    /// Remove a node and its subtree, disposing their models.
    /// The root itself cannot be removed, only emptied.
    pub fn remove_node(&mut self, id: NodeId) -> Result<()> {
        let parent = self.require(id)?.parent;

        for descendant in self.descendants(id).into_iter().rev() {
            if descendant == self.root {
                continue;
            }
            if let Some(mut node) = self.nodes[descendant.0].take() {
                if let Some(model) = node.components.model.as_mut() {
                    model.dispose();
                }
            }
        }

        match parent {
            Some(parent) => {
                if let Some(parent) = self.node_mut(parent) {
                    parent.children.retain(|c| *c != id);
                }
            }
            None => {
                if let Some(root) = self.node_mut(id) {
                    root.children.clear();
                }
            }
        }
        Ok(())
    }

    /// `id` followed by its descendants, depth first, in child order
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if let Some(node) = self.node(next) {
                out.push(next);
                stack.extend(node.children.iter().rev());
            }
        }
        out
    }

    /// Accumulated transform from the root down to `id`
    pub fn world_matrix(&self, id: NodeId) -> Mat4 {
        let mut matrix = Mat4::IDENTITY;
        let mut current = self.node(id);
        while let Some(node) = current {
            matrix = node.local_matrix() * matrix;
            current = node.parent.and_then(|p| self.node(p));
        }
        matrix
    }

    // ========================================================================
    // Models
    // ========================================================================

    /// New model component wired to this graph's config, events and units
    pub fn create_model(&self) -> ModelComponent {
        let mut model = ModelComponent::new().with_config(&self.config);
        model.set_global_units(self.scene_units());
        match &self.events {
            Some(events) => model.with_events(events.clone()),
            None => model,
        }
    }

    /// Nodes carrying a model component, depth first
    pub fn model_nodes(&self) -> Vec<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .filter(|id| self.node(*id).map(|n| n.components.model.is_some()).unwrap_or(false))
            .collect()
    }

    pub fn model(&self, id: NodeId) -> Option<&ModelComponent> {
        self.node(id)?.components.model.as_ref()
    }

    pub fn model_mut(&mut self, id: NodeId) -> Option<&mut ModelComponent> {
        self.node_mut(id)?.components.model.as_mut()
    }

    /// Activate every model in depth-first order, one at a time
    pub async fn activate_models(&mut self, loader: &dyn AssetLoader) {
        for id in self.model_nodes() {
            if let Some(model) = self.model_mut(id) {
                model.activate(loader).await;
            }
        }
    }

    /// Change the target quality of every model
    pub async fn set_quality(&mut self, loader: &dyn AssetLoader, quality: Quality) {
        for id in self.model_nodes() {
            if let Some(model) = self.model_mut(id) {
                model.set_quality(loader, quality).await;
            }
        }
    }

    /// Display units of the scene, the configured units when the root has no scene
    pub fn scene_units(&self) -> UnitType {
        self.node(self.root)
            .and_then(|root| root.components.scene.as_ref())
            .map(|scene| scene.units)
            .unwrap_or(self.config.global_units)
    }

    /// Set the scene's units and propagate them to every model
    pub fn set_scene_units(&mut self, units: UnitType) {
        let root = self.root;
        if let Some(node) = self.node_mut(root) {
            node.components.scene.get_or_insert_with(SceneComponent::default).units = units;
        }
        for node in self.nodes.iter_mut().flatten() {
            if let Some(model) = node.components.model.as_mut() {
                model.set_global_units(units);
            }
        }
    }

    /// Union of every model's bounds in scene space
    pub fn scene_bounds(&self) -> Option<BoundingBox> {
        self.model_nodes()
            .into_iter()
            .filter_map(|id| {
                let bounds = self.model(id)?.world_bounding_box()?;
                Some(bounds.transformed(&self.world_matrix(id)))
            })
            .reduce(BoundingBox::union)
    }

    /// Dispose every model and drop all nodes but the root
    pub fn clear(&mut self) {
        let root = self.root;
        for node in self.nodes.iter_mut().flatten() {
            if let Some(model) = node.components.model.as_mut() {
                model.dispose();
            }
        }
        self.nodes.truncate(1);
        self.nodes[0] = Some(Node::new(None));
        self.root = root;
    }
}
