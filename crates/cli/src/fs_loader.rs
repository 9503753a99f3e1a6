//! # Filesystem Asset Loader
//!
//! [`AssetLoader`] over local paths.
//!
//! ## Supported Formats
//!
//! | Format | Extension | Loaded as |
//! |--------|-----------|-----------|
//! | glTF   | .gltf/.glb | scene object, bounds from node-transformed primitives |
//! | OBJ    | .obj       | geometry |
//! | STL    | .stl       | geometry (ASCII and binary) |
//! | Images | .png/.jpg  | texture dimensions |
//! | JSON   | .json      | documents |

use async_trait::async_trait;
use glam::{Mat4, Vec3};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::debug;
use voyager_core::bounds::BoundingBox;
use voyager_core::loader::{AssetLoader, LoadError};
use voyager_core::object::{GeometryData, SceneObject, TextureHandle};

/// Loads assets from the local filesystem
#[derive(Debug, Default)]
pub struct FsAssetLoader {
    root: Option<PathBuf>,
    json_cache: RwLock<HashMap<PathBuf, Value>>,
}

impl FsAssetLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative paths against `root` instead of the working directory
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
            json_cache: RwLock::default(),
        }
    }

    fn path(&self, url: &str) -> Result<PathBuf, LoadError> {
        let url = url.strip_prefix("file://").unwrap_or(url);
        if url.contains("://") {
            return Err(LoadError::Network(format!("remote url not supported: {}", url)));
        }
        let path = Path::new(url);
        Ok(match &self.root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        })
    }

    async fn read(&self, url: &str) -> Result<(PathBuf, Vec<u8>), LoadError> {
        let path = self.path(url)?;
        debug!(path = %path.display(), "reading asset");
        let bytes = tokio::fs::read(&path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => LoadError::NotFound(path.display().to_string()),
            _ => LoadError::Io(format!("{}: {}", path.display(), e)),
        })?;
        Ok((path, bytes))
    }
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default()
}

#[async_trait]
impl AssetLoader for FsAssetLoader {
    async fn load_model(&self, url: &str) -> Result<Box<dyn SceneObject>, LoadError> {
        let (path, bytes) = self.read(url).await?;
        match extension(&path).as_str() {
            "gltf" | "glb" => Ok(Box::new(import_gltf(url, &bytes)?)),
            other => Err(LoadError::Unsupported(format!("model format '{}'", other))),
        }
    }

    async fn load_geometry(&self, url: &str) -> Result<GeometryData, LoadError> {
        let (path, bytes) = self.read(url).await?;
        let mesh = match extension(&path).as_str() {
            "obj" => import_obj(&bytes)?,
            "stl" => import_stl(&bytes)?,
            other => return Err(LoadError::Unsupported(format!("geometry format '{}'", other))),
        };
        Ok(GeometryData {
            source: url.to_string(),
            num_vertices: mesh.vertices.len() as u64,
            num_faces: mesh.faces,
            bounds: BoundingBox::from_points(mesh.vertices),
        })
    }

    async fn load_texture(&self, url: &str) -> Result<TextureHandle, LoadError> {
        let (_, bytes) = self.read(url).await?;
        let (width, height) = image::ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| LoadError::Io(e.to_string()))?
            .into_dimensions()
            .map_err(|e| LoadError::Parse(format!("{}: {}", url, e)))?;
        Ok(TextureHandle {
            source: url.to_string(),
            width,
            height,
        })
    }

    async fn load_json(&self, url: &str) -> Result<Value, LoadError> {
        let path = self.path(url)?;
        if let Some(cached) = self.json_cache.read().get(&path) {
            return Ok(cached.clone());
        }
        let (path, bytes) = self.read(url).await?;
        let json: Value = serde_json::from_slice(&bytes)
            .map_err(|e| LoadError::Parse(format!("{}: {}", path.display(), e)))?;
        self.json_cache.write().insert(path, json.clone());
        Ok(json)
    }
}

// ============================================================================
// glTF
// ============================================================================

/// Scene object imported from a glTF file
#[derive(Debug)]
pub struct GltfObject {
    pub source: String,
    pub bounds: Option<BoundingBox>,
    pub num_meshes: usize,
    pub num_vertices: u64,
    pub num_faces: u64,
    attached: bool,
    disposed: bool,
}

impl GltfObject {
    pub fn is_attached(&self) -> bool {
        self.attached
    }
}

impl SceneObject for GltfObject {
    fn bounding_box(&self) -> Option<BoundingBox> {
        self.bounds
    }

    fn attach(&mut self) {
        self.attached = true;
    }

    fn dispose(&mut self) {
        self.attached = false;
        self.disposed = true;
    }

    fn is_disposed(&self) -> bool {
        self.disposed
    }
}

/// Read scene structure and accessor bounds; buffers are not loaded
fn import_gltf(url: &str, bytes: &[u8]) -> Result<GltfObject, LoadError> {
    let gltf = gltf::Gltf::from_slice(bytes)
        .map_err(|e| LoadError::Parse(format!("Failed to open glTF {}: {}", url, e)))?;

    let mut object = GltfObject {
        source: url.to_string(),
        bounds: None,
        num_meshes: 0,
        num_vertices: 0,
        num_faces: 0,
        attached: false,
        disposed: false,
    };

    let scene = gltf.default_scene().or_else(|| gltf.scenes().next());
    match scene {
        Some(scene) => {
            for node in scene.nodes() {
                visit_node(&node, Mat4::IDENTITY, &mut object);
            }
        }
        None => {
            for mesh in gltf.meshes() {
                add_mesh(&mesh, Mat4::IDENTITY, &mut object);
            }
        }
    }
    Ok(object)
}

fn visit_node(node: &gltf::Node<'_>, parent: Mat4, object: &mut GltfObject) {
    let world = parent * Mat4::from_cols_array_2d(&node.transform().matrix());
    if let Some(mesh) = node.mesh() {
        add_mesh(&mesh, world, object);
    }
    for child in node.children() {
        visit_node(&child, world, object);
    }
}

fn add_mesh(mesh: &gltf::Mesh<'_>, world: Mat4, object: &mut GltfObject) {
    object.num_meshes += 1;
    for primitive in mesh.primitives() {
        let Some(positions) = primitive.get(&gltf::Semantic::Positions) else {
            continue;
        };
        // POSITION accessors must declare min/max
        if positions.min().is_some() && positions.max().is_some() {
            let bb = primitive.bounding_box();
            let local = BoundingBox::new(Vec3::from_array(bb.min), Vec3::from_array(bb.max));
            let bounds = local.transformed(&world);
            object.bounds = Some(match object.bounds {
                Some(b) => b.union(bounds),
                None => bounds,
            });
        }

        let vertices = positions.count() as u64;
        let indices = primitive.indices().map(|a| a.count() as u64).unwrap_or(vertices);
        object.num_vertices += vertices;
        object.num_faces += indices / 3;
    }
}

// ============================================================================
// OBJ / STL
// ============================================================================

struct ParsedMesh {
    vertices: Vec<Vec3>,
    faces: u64,
}

fn parse_vec3(parts: &[&str]) -> Vec3 {
    let x: f32 = parts.first().and_then(|s| s.parse().ok()).unwrap_or(0.0);
    let y: f32 = parts.get(1).and_then(|s| s.parse().ok()).unwrap_or(0.0);
    let z: f32 = parts.get(2).and_then(|s| s.parse().ok()).unwrap_or(0.0);
    Vec3::new(x, y, z)
}

/// Wavefront OBJ; polygons count as fan-triangulated faces
fn import_obj(bytes: &[u8]) -> Result<ParsedMesh, LoadError> {
    let text = std::str::from_utf8(bytes).map_err(|e| LoadError::Parse(e.to_string()))?;
    let mut vertices = Vec::new();
    let mut faces = 0u64;

    for line in text.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        match parts.first() {
            Some(&"v") if parts.len() >= 4 => vertices.push(parse_vec3(&parts[1..])),
            Some(&"f") if parts.len() >= 4 => faces += (parts.len() - 3) as u64,
            _ => {}
        }
    }

    Ok(ParsedMesh { vertices, faces })
}

fn import_stl(bytes: &[u8]) -> Result<ParsedMesh, LoadError> {
    // Binary files may also start with "solid"; trust the size field when it matches
    if bytes.len() >= 84 {
        let count = u32::from_le_bytes([bytes[80], bytes[81], bytes[82], bytes[83]]) as usize;
        if bytes.len() == 84 + count * 50 {
            return import_stl_binary(bytes, count);
        }
    }
    if bytes.starts_with(b"solid") {
        import_stl_ascii(bytes)
    } else {
        Err(LoadError::Parse("truncated binary STL".to_string()))
    }
}

fn import_stl_ascii(bytes: &[u8]) -> Result<ParsedMesh, LoadError> {
    let text = std::str::from_utf8(bytes).map_err(|e| LoadError::Parse(e.to_string()))?;
    let mut vertices = Vec::new();
    let mut faces = 0u64;

    for line in text.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        match parts.first() {
            Some(&"facet") => faces += 1,
            Some(&"vertex") if parts.len() >= 4 => vertices.push(parse_vec3(&parts[1..])),
            _ => {}
        }
    }

    Ok(ParsedMesh { vertices, faces })
}

fn import_stl_binary(bytes: &[u8], count: usize) -> Result<ParsedMesh, LoadError> {
    let read_vec3 = |at: usize| {
        let f = |o: usize| f32::from_le_bytes([bytes[o], bytes[o + 1], bytes[o + 2], bytes[o + 3]]);
        Vec3::new(f(at), f(at + 4), f(at + 8))
    };

    let mut vertices = Vec::with_capacity(count * 3);
    for triangle in 0..count {
        // 12 byte normal, 3 x 12 byte vertices, 2 byte attribute count
        let base = 84 + triangle * 50 + 12;
        for corner in 0..3 {
            vertices.push(read_vec3(base + corner * 12));
        }
    }

    Ok(ParsedMesh {
        vertices,
        faces: count as u64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use voyager_core::{DocumentLoader, ModelState, StructuralValidator, ViewerConfig};

    const TRIANGLE_GLTF: &str = r#"{
        "asset": { "version": "2.0" },
        "scene": 0,
        "scenes": [{ "nodes": [0] }],
        "nodes": [{ "mesh": 0, "translation": [10.0, 0.0, 0.0] }],
        "meshes": [{ "primitives": [{ "attributes": { "POSITION": 0 } }] }],
        "accessors": [{
            "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
            "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0]
        }],
        "bufferViews": [{ "buffer": 0, "byteLength": 36 }],
        "buffers": [{ "byteLength": 36, "uri": "triangle.bin" }]
    }"#;

    fn write(dir: &Path, name: &str, bytes: &[u8]) -> String {
        let path = dir.join(name);
        std::fs::write(&path, bytes).unwrap();
        path.display().to_string()
    }

    #[tokio::test]
    async fn test_gltf_bounds_follow_node_transform() {
        let dir = tempfile::tempdir().unwrap();
        let url = write(dir.path(), "triangle.gltf", TRIANGLE_GLTF.as_bytes());

        let object = FsAssetLoader::new().load_model(&url).await.unwrap();
        let bounds = object.bounding_box().unwrap();
        assert_eq!(bounds.min, Vec3::new(10.0, 0.0, 0.0));
        assert_eq!(bounds.max, Vec3::new(11.0, 1.0, 0.0));
    }

    #[tokio::test]
    async fn test_obj_geometry() {
        let dir = tempfile::tempdir().unwrap();
        let obj = "# quad\nv 0 0 0\nv 2 0 0\nv 2 3 0\nv 0 3 1\nvt 0 0\nf 1 2 3 4\n";
        let url = write(dir.path(), "quad.obj", obj.as_bytes());

        let geometry = FsAssetLoader::new().load_geometry(&url).await.unwrap();
        assert_eq!(geometry.num_vertices, 4);
        assert_eq!(geometry.num_faces, 2);
        assert_eq!(geometry.bounds.unwrap().max, Vec3::new(2.0, 3.0, 1.0));
    }

    #[tokio::test]
    async fn test_stl_ascii_and_binary() {
        let dir = tempfile::tempdir().unwrap();
        let ascii = "solid t\nfacet normal 0 0 1\nouter loop\nvertex 0 0 0\nvertex 1 0 0\nvertex 0 2 0\nendloop\nendfacet\nendsolid t\n";
        let ascii_url = write(dir.path(), "ascii.stl", ascii.as_bytes());

        let mut binary = vec![0u8; 80];
        binary.extend_from_slice(&1u32.to_le_bytes());
        for value in [0.0f32, 0.0, 1.0, 0.0, 0.0, 0.0, 4.0, 0.0, 0.0, 0.0, 0.0, 5.0] {
            binary.extend_from_slice(&value.to_le_bytes());
        }
        binary.extend_from_slice(&[0, 0]);
        let binary_url = write(dir.path(), "binary.stl", &binary);

        let loader = FsAssetLoader::new();
        let ascii = loader.load_geometry(&ascii_url).await.unwrap();
        assert_eq!(ascii.num_faces, 1);
        assert_eq!(ascii.bounds.unwrap().max, Vec3::new(1.0, 2.0, 0.0));

        let binary = loader.load_geometry(&binary_url).await.unwrap();
        assert_eq!(binary.num_faces, 1);
        assert_eq!(binary.bounds.unwrap().max, Vec3::new(4.0, 0.0, 5.0));
    }

    #[tokio::test]
    async fn test_texture_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("diffuse.png");
        image::RgbImage::new(8, 4).save(&path).unwrap();

        let texture = FsAssetLoader::new()
            .load_texture(&path.display().to_string())
            .await
            .unwrap();
        assert_eq!((texture.width, texture.height), (8, 4));
    }

    #[tokio::test]
    async fn test_errors() {
        let loader = FsAssetLoader::new();
        assert!(matches!(
            loader.load_json("/definitely/missing.json").await,
            Err(LoadError::NotFound(_))
        ));
        assert!(matches!(
            loader.load_json("https://example.org/doc.json").await,
            Err(LoadError::Network(_))
        ));

        let dir = tempfile::tempdir().unwrap();
        let url = write(dir.path(), "mesh.ply", b"ply\n");
        assert!(matches!(loader.load_geometry(&url).await, Err(LoadError::Unsupported(_))));
    }

    #[tokio::test]
    async fn test_document_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "triangle.gltf", TRIANGLE_GLTF.as_bytes());
        write(
            dir.path(),
            "quad.obj",
            b"v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3 4\n",
        );
        let document = serde_json::json!({
            "asset": { "type": "application/si-dpo-3d.document+json", "version": "1.0" },
            "scene": 0,
            "scenes": [{ "units": "m", "nodes": [0, 1] }],
            "nodes": [{ "name": "tri", "model": 0 }, { "name": "quad", "model": 1 }],
            "models": [
                { "units": "m", "derivatives": [
                    { "usage": "Web", "quality": "High", "assets": [{ "uri": "triangle.gltf" }] }
                ] },
                { "units": "cm", "derivatives": [
                    { "usage": "Web", "quality": "Low", "assets": [{ "uri": "quad.obj" }] }
                ] }
            ]
        });
        let url = write(dir.path(), "scene.json", document.to_string().as_bytes());

        let loader = FsAssetLoader::new();
        let docs = DocumentLoader::new(Arc::new(StructuralValidator), ViewerConfig::default());
        let mut graph = docs.load(&loader, &url).await.unwrap();
        graph.activate_models(&loader).await;

        for id in graph.model_nodes() {
            assert_eq!(graph.model(id).unwrap().state(), ModelState::Displayed);
        }
        let bounds = graph.scene_bounds().unwrap();
        assert_eq!(bounds.max, Vec3::new(11.0, 1.0, 0.0));
    }
}
