//! Recording test doubles for the loader and runtime objects

use crate::bounds::BoundingBox;
use crate::loader::{AssetLoader, LoadError};
use crate::object::{GeometryData, SceneObject, TextureHandle};
use async_trait::async_trait;
use glam::Vec3;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Shared, ordered log of loader and object activity
pub type Journal = Arc<Mutex<Vec<String>>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoaderCall {
    Model(String),
    Geometry(String),
    Texture(String),
    Json(String),
}

/// Object that logs `attach <name>` and `dispose <name>` to a journal
#[derive(Debug)]
pub struct MockObject {
    name: String,
    bounds: Option<BoundingBox>,
    journal: Journal,
    disposed: bool,
}

impl MockObject {
    pub fn journal() -> Journal {
        Arc::new(Mutex::new(Vec::new()))
    }

    pub fn new(name: &str, journal: Journal) -> Self {
        Self {
            name: name.to_string(),
            bounds: Some(BoundingBox::new(Vec3::ZERO, Vec3::ONE)),
            journal,
            disposed: false,
        }
    }

    pub fn with_bounds(mut self, bounds: Option<BoundingBox>) -> Self {
        self.bounds = bounds;
        self
    }
}

impl SceneObject for MockObject {
    fn bounding_box(&self) -> Option<BoundingBox> {
        self.bounds
    }

    fn attach(&mut self) {
        self.journal.lock().push(format!("attach {}", self.name));
    }

    fn dispose(&mut self) {
        if !self.disposed {
            self.disposed = true;
            self.journal.lock().push(format!("dispose {}", self.name));
        }
    }

    fn is_disposed(&self) -> bool {
        self.disposed
    }
}

/// Loader that records every call and yields once per request, so that
/// overlapping requests would show up interleaved in the journal
#[derive(Debug, Default)]
pub struct MockLoader {
    journal: Journal,
    calls: Arc<Mutex<Vec<LoaderCall>>>,
    failures: HashSet<String>,
    json: HashMap<String, Value>,
    bounds: HashMap<String, BoundingBox>,
}

impl MockLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every request for `url` fail with `NotFound`
    pub fn with_failure(mut self, url: &str) -> Self {
        self.failures.insert(url.to_string());
        self
    }

    pub fn with_json(mut self, url: &str, json: Value) -> Self {
        self.json.insert(url.to_string(), json);
        self
    }

    pub fn with_bounds(mut self, url: &str, bounds: BoundingBox) -> Self {
        self.bounds.insert(url.to_string(), bounds);
        self
    }

    pub fn calls(&self) -> Vec<LoaderCall> {
        self.calls.lock().clone()
    }

    pub fn entries(&self) -> Vec<String> {
        self.journal.lock().clone()
    }

    async fn request(&self, kind: &str, url: &str, call: LoaderCall) -> Result<(), LoadError> {
        self.calls.lock().push(call);
        self.journal.lock().push(format!("begin {} {}", kind, url));
        tokio::task::yield_now().await;

        if self.failures.contains(url) {
            self.journal.lock().push(format!("fail {} {}", kind, url));
            return Err(LoadError::NotFound(url.to_string()));
        }
        self.journal.lock().push(format!("end {} {}", kind, url));
        Ok(())
    }

    fn bounds_for(&self, url: &str) -> BoundingBox {
        self.bounds
            .get(url)
            .copied()
            .unwrap_or_else(|| BoundingBox::new(Vec3::ZERO, Vec3::ONE))
    }
}

#[async_trait]
impl AssetLoader for MockLoader {
    async fn load_model(&self, url: &str) -> Result<Box<dyn SceneObject>, LoadError> {
        self.request("model", url, LoaderCall::Model(url.to_string())).await?;
        let object = MockObject::new(url, self.journal.clone()).with_bounds(Some(self.bounds_for(url)));
        Ok(Box::new(object))
    }

    async fn load_geometry(&self, url: &str) -> Result<GeometryData, LoadError> {
        self.request("geometry", url, LoaderCall::Geometry(url.to_string())).await?;
        Ok(GeometryData {
            source: url.to_string(),
            num_vertices: 8,
            num_faces: 12,
            bounds: Some(self.bounds_for(url)),
        })
    }

    async fn load_texture(&self, url: &str) -> Result<TextureHandle, LoadError> {
        self.request("texture", url, LoaderCall::Texture(url.to_string())).await?;
        Ok(TextureHandle {
            source: url.to_string(),
            width: 256,
            height: 256,
        })
    }

    async fn load_json(&self, url: &str) -> Result<Value, LoadError> {
        self.calls.lock().push(LoaderCall::Json(url.to_string()));
        self.json
            .get(url)
            .cloned()
            .ok_or_else(|| LoadError::NotFound(url.to_string()))
    }
}
