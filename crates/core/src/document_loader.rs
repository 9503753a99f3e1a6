//! # Document Loader
//!
//! Fetches JSON documents through the [`AssetLoader`], validates them with
//! the [`Validator`] matching their kind and inflates them into a [`Graph`].
//! External references are resolved in a second pass.
//!
//! ## Table of Contents
//! - **DocumentLoader**: Fetch, validate, inflate, resolve references
//! - **ResolvedDocument**: Callback type for documents the host already has

use crate::composer;
use crate::config::ViewerConfig;
use crate::document::{Document, DocumentKind, ItemDocument};
use crate::error::{Result, VoyagerError};
use crate::events::EventSender;
use crate::graph::{Graph, NodeId};
use crate::loader::{AssetLoader, AssetPaths, Validator};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Host callback returning an already-available document for a reference URI
pub type ResolvedDocument<'a> = &'a (dyn Fn(&str) -> Option<Value> + Sync);

/// Loads documents into graphs
pub struct DocumentLoader {
    validator: Arc<dyn Validator>,
    config: ViewerConfig,
    events: Option<EventSender>,
}

impl DocumentLoader {
    pub fn new(validator: Arc<dyn Validator>, config: ViewerConfig) -> Self {
        Self {
            validator,
            config,
            events: None,
        }
    }

    pub fn with_events(mut self, events: EventSender) -> Self {
        self.events = Some(events);
        self
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    /// Empty graph wired to this loader's config and event channel
    pub fn new_graph(&self) -> Graph {
        Graph::new(self.config.clone(), self.events.clone())
    }

    /// Run the validator entry point for `kind`. Skipped when validation is
    /// disabled in the config.
    pub fn validate(&self, kind: DocumentKind, json: &Value) -> Result<()> {
        if !self.config.validate_documents {
            return Ok(());
        }
        let valid = match kind {
            DocumentKind::Document => self.validator.validate_document(json),
            DocumentKind::Presentation => self.validator.validate_presentation(json),
            DocumentKind::Item => self.validator.validate_item(json),
        };
        if valid {
            Ok(())
        } else {
            Err(VoyagerError::validation(format!("{:?} failed schema validation", kind)))
        }
    }

    /// Fetch and validate a document, returning its kind and raw JSON
    pub async fn fetch(&self, loader: &dyn AssetLoader, url: &str) -> Result<(DocumentKind, Value)> {
        debug!(url = %url, "fetching document");
        let json = loader.load_json(url).await?;
        let kind = DocumentKind::detect(&json);
        self.validate(kind, &json)?;
        Ok((kind, json))
    }

    /// Inflate validated JSON beneath `parent`. At the graph root a document's
    /// scene becomes the graph's scene.
    pub fn inflate(
        &self,
        graph: &mut Graph,
        parent: NodeId,
        kind: DocumentKind,
        json: Value,
    ) -> Result<Vec<NodeId>> {
        match kind {
            DocumentKind::Document | DocumentKind::Presentation => {
                let document = Document::from_json(json)?;
                if parent == graph.root() {
                    composer::inflate(graph, &document)
                } else {
                    composer::inflate_into(graph, parent, &document)
                }
            }
            DocumentKind::Item => {
                let item = ItemDocument::from_json(json)?;
                Ok(vec![composer::import_item(graph, parent, &item)?])
            }
        }
    }

    /// Build a graph from JSON the host already holds
    pub fn open(&self, json: Value) -> Result<Graph> {
        let kind = DocumentKind::detect(&json);
        self.validate(kind, &json)?;
        let mut graph = self.new_graph();
        let root = graph.root();
        self.inflate(&mut graph, root, kind, json)?;
        Ok(graph)
    }

    /// Fetch a document and build its graph, references included. Relative
    /// asset URIs resolve against the configured base, or the document's
    /// own directory.
    pub async fn load(&self, loader: &dyn AssetLoader, url: &str) -> Result<Graph> {
        let (kind, json) = self.fetch(loader, url).await?;
        let mut graph = self.new_graph();
        let root = graph.root();
        let created = self.inflate(&mut graph, root, kind, json)?;

        if self.config.asset_base.is_none() {
            set_asset_base(&mut graph, &created, AssetPaths::parent_of(url));
        }

        info!(url = %url, kind = ?kind, nodes = graph.len(), "document loaded");

        self.resolve_references(loader, &mut graph, None).await;
        Ok(graph)
    }

    /// Resolve every unresolved reference node, including references found
    /// inside referenced documents. For each one `resolved` is asked first;
    /// otherwise the document is fetched and validated. Failures are logged
    /// and leave the reference unresolved. Returns the number resolved.
    pub async fn resolve_references(
        &self,
        loader: &dyn AssetLoader,
        graph: &mut Graph,
        resolved: Option<ResolvedDocument<'_>>,
    ) -> usize {
        let mut attempted: HashSet<NodeId> = HashSet::new();
        let mut count = 0;

        loop {
            let pending: Vec<NodeId> = graph
                .descendants(graph.root())
                .into_iter()
                .filter(|id| !attempted.contains(id))
                .filter(|id| {
                    graph
                        .node(*id)
                        .and_then(|n| n.components.reference.as_ref())
                        .map(|r| !r.resolved)
                        .unwrap_or(false)
                })
                .collect();

            if pending.is_empty() {
                break;
            }

            for id in pending {
                attempted.insert(id);
                match self.resolve_reference(loader, graph, id, resolved).await {
                    Ok(()) => count += 1,
                    Err(e) => warn!(node = %id, error = %e, "failed to resolve reference"),
                }
            }
        }

        count
    }

    async fn resolve_reference(
        &self,
        loader: &dyn AssetLoader,
        graph: &mut Graph,
        id: NodeId,
        resolved: Option<ResolvedDocument<'_>>,
    ) -> Result<()> {
        let fallback = self.config.asset_base.as_deref();
        let reference = graph
            .node(id)
            .and_then(|n| n.components.reference.clone())
            .ok_or_else(|| VoyagerError::validation(format!("{} has no reference", id)))?;
        let url = reference.url(fallback);

        // A reference pointing at a document it is already nested in never ends
        let mut ancestor = graph.node(id).and_then(|n| n.parent());
        while let Some(parent) = ancestor {
            let node = graph.node(parent);
            if let Some(outer) = node.and_then(|n| n.components.reference.as_ref()) {
                if outer.url(fallback) == url {
                    return Err(VoyagerError::validation(format!(
                        "reference cycle through '{}'",
                        url
                    )));
                }
            }
            ancestor = node.and_then(|n| n.parent());
        }

        let (kind, json) = match resolved.and_then(|f| f(&reference.uri)) {
            Some(json) => {
                let kind = DocumentKind::detect(&json);
                self.validate(kind, &json)?;
                (kind, json)
            }
            None => self.fetch(loader, &url).await?,
        };

        let created = self.inflate(graph, id, kind, json)?;
        if self.config.asset_base.is_none() {
            set_asset_base(graph, &created, AssetPaths::parent_of(&url));
        }

        if let Some(reference) = graph.node_mut(id).and_then(|n| n.components.reference.as_mut()) {
            reference.resolved = true;
        }
        debug!(node = %id, url = %url, nodes = created.len(), "reference resolved");
        Ok(())
    }
}

/// Point models and references in the new subtrees at the directory of the
/// document they came from
fn set_asset_base(graph: &mut Graph, created: &[NodeId], base: Option<String>) {
    for top in created {
        for id in graph.descendants(*top) {
            let Some(node) = graph.node_mut(id) else {
                continue;
            };
            if let Some(model) = node.components.model.as_mut() {
                model.set_asset_base(base.clone());
            }
            if let Some(reference) = node.components.reference.as_mut() {
                reference.base = base.clone();
            }
        }
    }
}

/// Save a graph as document JSON
pub fn save(graph: &Graph) -> Result<Value> {
    composer::deflate(graph).to_json()
}
