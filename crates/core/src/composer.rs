//! # Composer
//!
//! Converts between a live [`Graph`] and its flat [`Document`] form.
//!
//! Inflating walks the document from the root scene's node list, creating
//! one node per record and attaching the components its index fields name.
//! Deflating walks the live tree depth first and hands out fresh, compact
//! indices, so a deflated document never contains holes.

use crate::components::{
    CameraComponent, DocumentComponent, InfoComponent, LightComponent, ReferenceComponent,
    SceneComponent,
};
use crate::document::{AssetInfo, Document, ItemDocument, NodeRecord};
use crate::error::{Result, VoyagerError};
use crate::graph::{ComponentRef, Graph, NodeId};
use glam::{Quat, Vec3};
use tracing::debug;

// ============================================================================
// Inflate
// ============================================================================

/// Inflate a whole document into the graph root. The root scene's units
/// become the graph's display units.
pub fn inflate(graph: &mut Graph, document: &Document) -> Result<Vec<NodeId>> {
    let scene = document.root_scene()?;
    let root = graph.root();
    let created = inflate_into(graph, root, document)?;

    if let Some(scene) = scene {
        graph.set_scene_units(scene.units);
        if let Some(node) = graph.node_mut(root) {
            node.components.scene = Some(SceneComponent::from_record(scene));
        }
    }
    Ok(created)
}

/// Inflate a document's top-level nodes beneath `parent`.
///
/// Top-level nodes are the root scene's `nodes`, or every node no other
/// node lists as a child when the document has no scenes. On error the
/// partially built subtrees are removed again.
pub fn inflate_into(graph: &mut Graph, parent: NodeId, document: &Document) -> Result<Vec<NodeId>> {
    let top_level = top_level_nodes(document)?;
    let mut visited = vec![false; document.nodes.len()];
    let mut created = Vec::with_capacity(top_level.len());

    for index in top_level {
        match inflate_node(graph, parent, index, document, &mut visited) {
            Ok(id) => created.push(id),
            Err(e) => {
                for id in created {
                    graph.remove_node(id)?;
                }
                return Err(e);
            }
        }
    }

    // Without scenes every node of a forest is reachable from a top-level node
    if document.scenes.is_empty() {
        if let Some(index) = visited.iter().position(|v| !v) {
            for id in created {
                graph.remove_node(id)?;
            }
            return Err(VoyagerError::validation(format!(
                "node {} is part of a cycle, document graph must be a tree",
                index
            )));
        }
    }

    debug!(nodes = document.nodes.len(), top_level = created.len(), "inflated document");
    Ok(created)
}

fn top_level_nodes(document: &Document) -> Result<Vec<usize>> {
    if let Some(scene) = document.root_scene()? {
        return Ok(scene.nodes.clone());
    }
    let mut is_child = vec![false; document.nodes.len()];
    for node in &document.nodes {
        for &child in &node.children {
            if let Some(flag) = is_child.get_mut(child) {
                *flag = true;
            }
        }
    }
    Ok((0..document.nodes.len()).filter(|i| !is_child[*i]).collect())
}

/// Create the node for `document.nodes[index]` under `parent`, attach its
/// components and recurse into its children in declared order.
///
/// `visited` marks every node inflated so far; reaching one again means the
/// document is not a tree.
pub fn inflate_node(
    graph: &mut Graph,
    parent: NodeId,
    index: usize,
    document: &Document,
    visited: &mut [bool],
) -> Result<NodeId> {
    let record = document.node(index)?;
    if visited[index] {
        return Err(VoyagerError::validation(format!(
            "node {} is referenced more than once, document graph must be a tree",
            index
        )));
    }
    visited[index] = true;

    let id = graph.add_node(parent)?;
    let result = attach_components(graph, id, record, document).and_then(|_| {
        for &child in &record.children {
            inflate_node(graph, id, child, document, visited)?;
        }
        Ok(())
    });

    if let Err(e) = result {
        graph.remove_node(id)?;
        return Err(e);
    }
    Ok(id)
}

fn attach_components(
    graph: &mut Graph,
    id: NodeId,
    record: &NodeRecord,
    document: &Document,
) -> Result<()> {
    let model = match record.model {
        Some(_) => {
            let mut model = graph.create_model();
            model.from_document(document, record)?;
            Some(model)
        }
        None => None,
    };

    let scene = record
        .scene
        .map(|_| read::<SceneComponent>(document, record))
        .transpose()?;
    let info = record
        .info
        .map(|_| read::<InfoComponent>(document, record))
        .transpose()?;
    let camera = record
        .camera
        .map(|_| read::<CameraComponent>(document, record))
        .transpose()?;
    let light = record
        .light
        .map(|_| read::<LightComponent>(document, record))
        .transpose()?;
    let reference = record
        .reference
        .map(|_| read::<ReferenceComponent>(document, record))
        .transpose()?;

    let node = graph
        .node_mut(id)
        .ok_or_else(|| VoyagerError::validation(format!("{} vanished during inflate", id)))?;

    node.name = record.name.clone();
    node.translation = record.translation.unwrap_or(Vec3::ZERO);
    node.rotation = record.rotation.unwrap_or(Quat::IDENTITY);
    node.scale = record.scale.unwrap_or(Vec3::ONE);

    let components = &mut node.components;
    components.scene = scene;
    components.info = info;
    components.model = model;
    components.camera = camera;
    components.light = light;
    components.reference = reference;
    Ok(())
}

fn read<C: DocumentComponent + Default>(document: &Document, record: &NodeRecord) -> Result<C> {
    let mut component = C::default();
    component.from_document(document, record)?;
    Ok(component)
}

/// Import a legacy item document as one model node under `parent`
pub fn import_item(graph: &mut Graph, parent: NodeId, item: &ItemDocument) -> Result<NodeId> {
    let mut model = graph.create_model();
    model.from_data(&item.model)?;

    let id = graph.add_node(parent)?;
    if let Some(node) = graph.node_mut(id) {
        node.name = item.info.as_ref().and_then(|i| i.name.clone());
        node.components.info = item.info.clone().map(|record| InfoComponent { record });
        node.components.model = Some(model);
    }
    Ok(id)
}

// ============================================================================
// Deflate
// ============================================================================

/// Serialize the whole graph. The root carries the scene; its children
/// become the scene's node list.
pub fn deflate(graph: &Graph) -> Document {
    let mut document = Document {
        asset: AssetInfo::default(),
        ..Default::default()
    };

    let root = graph.root();
    let scene = graph
        .node(root)
        .and_then(|n| n.components.scene.clone())
        .unwrap_or_else(|| SceneComponent {
            name: None,
            units: graph.scene_units(),
        });
    document.scene = scene.to_document(&mut document);

    for &child in graph.children(root) {
        let index = deflate_node(graph, child, &mut document);
        document.scenes[document.scene].nodes.push(index);
    }
    document
}

/// Append `id` and its subtree to the document and return its node index.
///
/// Reference nodes are written as the reference alone; the content they
/// pulled in is fetched again on the next load.
pub fn deflate_node(graph: &Graph, id: NodeId, document: &mut Document) -> usize {
    let index = document.nodes.len();
    document.nodes.push(NodeRecord::default());

    let Some(node) = graph.node(id) else {
        return index;
    };

    let mut record = NodeRecord {
        name: node.name.clone(),
        translation: (node.translation != Vec3::ZERO).then_some(node.translation),
        rotation: (node.rotation != Quat::IDENTITY).then_some(node.rotation),
        scale: (node.scale != Vec3::ONE).then_some(node.scale),
        ..Default::default()
    };

    for component in node.components.iter() {
        match component {
            ComponentRef::Scene(scene) => record.scene = Some(scene.to_document(document)),
            ComponentRef::Info(info) => record.info = Some(info.to_document(document)),
            ComponentRef::Model(model) => record.model = Some(model.to_document(document)),
            ComponentRef::Camera(camera) => record.camera = Some(camera.to_document(document)),
            ComponentRef::Light(light) => record.light = Some(light.to_document(document)),
            ComponentRef::Reference(reference) => {
                record.reference = Some(reference.to_document(document))
            }
        }
    }

    if node.components.reference.is_none() {
        for &child in node.children() {
            let child_index = deflate_node(graph, child, document);
            record.children.push(child_index);
        }
    }

    document.nodes[index] = record;
    index
}
