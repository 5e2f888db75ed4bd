//! # Assets — Mesh Data and Fallbacks
//!
//! Mesh files are turned into [`MeshData`] by a [`MeshImporter`] chosen by
//! file extension. [`Assets`] caches the results by filename so every mesh
//! component referencing the same file shares one `Arc<MeshData>`.
//!
//! ```text
//! MeshComponent::create
//!   └─► Assets::load_mesh("enemy.gltf")
//!         ├── cached?            → clone the Arc
//!         ├── built-in name?     → procedural cube / plane
//!         ├── importer for ext?  → import(asset_root/enemy.gltf)
//!         └── any failure        → default mesh + warning + notification
//! ```
//!
//! ## Graceful Degradation
//!
//! A missing or broken asset never stops a level from loading. The default
//! mesh (a cube unless configured otherwise) or default texture is
//! substituted, a warning is logged, and a message is queued for the editor's
//! notification list. The request is cached under its own name, so the warning
//! fires once per file rather than once per component.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytemuck::{Pod, Zeroable};

use crate::animation::Skeleton;
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::math::{BoundingBox, Vec3};
use crate::reflect::{MeshRef, TextureRef};

/// One skinned vertex.
///
/// `joints` index into the mesh's skeleton, `weights` sum to 1 for skinned
/// meshes and are all zero for static ones.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
    pub joints: [u32; 4],
    pub weights: [f32; 4],
}

/// Everything an importer extracts from a mesh file.
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub bounds: BoundingBox,
    /// Empty for static meshes.
    pub skeleton: Skeleton,
}

impl MeshData {
    /// Build from geometry, computing the bounds from the vertex positions.
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        let bounds = BoundingBox::from_points(vertices.iter().map(|v| Vec3::from(v.position)));
        Self {
            vertices,
            indices,
            bounds,
            skeleton: Skeleton::new(),
        }
    }

    pub fn is_skinned(&self) -> bool {
        self.skeleton.joint_count() > 0
    }

    /// Raw vertex bytes for upload.
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}

/// Turns a mesh file into [`MeshData`].
pub trait MeshImporter {
    /// Lower-case file extensions this importer handles, without the dot.
    fn extensions(&self) -> &[&str];

    fn import(&self, path: &Path) -> Result<MeshData>;
}

/// Mesh cache, importer registry and asset fallbacks.
pub struct Assets {
    root: PathBuf,
    default_mesh: String,
    default_texture: String,
    importers: Vec<Box<dyn MeshImporter>>,
    meshes: HashMap<String, Arc<MeshData>>,
    notifications: Vec<String>,
}

impl Assets {
    /// Create with the configured root and fallbacks. Registers the glTF
    /// importer when the `gltf` feature is enabled.
    pub fn new(config: &EngineConfig) -> Self {
        #[allow(unused_mut)]
        let mut assets = Self {
            root: config.asset_root.clone(),
            default_mesh: config.default_mesh.clone(),
            default_texture: config.default_texture.clone(),
            importers: Vec::new(),
            meshes: HashMap::new(),
            notifications: Vec::new(),
        };
        #[cfg(feature = "gltf")]
        assets.add_importer(crate::gltf_import::GltfImporter);
        assets
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn add_importer(&mut self, importer: impl MeshImporter + 'static) {
        self.importers.push(Box::new(importer));
    }

    /// Load (or fetch from cache) the mesh for `mesh`, falling back to the
    /// default mesh on any failure.
    pub fn load_mesh(&mut self, mesh: &MeshRef) -> Arc<MeshData> {
        let name = if mesh.is_empty() {
            self.default_mesh.clone()
        } else {
            mesh.filename().to_owned()
        };
        if let Some(data) = self.meshes.get(&name) {
            return Arc::clone(data);
        }

        let data = match self.import(&name) {
            Ok(data) => Arc::new(data),
            Err(e) => {
                self.warn(format!("Mesh \"{name}\" failed to load ({e}), using default"));
                self.default_mesh_data()
            }
        };
        self.meshes.insert(name, Arc::clone(&data));
        data
    }

    /// Import without touching the cache or the fallback path.
    pub fn import(&self, name: &str) -> Result<MeshData> {
        if let Some(builtin) = builtin_mesh(name) {
            return Ok(builtin);
        }
        let path = self.root.join(name);
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        let importer = self
            .importers
            .iter()
            .find(|i| i.extensions().contains(&ext.as_str()))
            .ok_or_else(|| EngineError::Import(format!("no importer for \".{ext}\" files")))?;
        importer.import(&path)
    }

    fn default_mesh_data(&mut self) -> Arc<MeshData> {
        if let Some(data) = self.meshes.get(&self.default_mesh) {
            return Arc::clone(data);
        }
        let data = match self.import(&self.default_mesh) {
            Ok(data) => data,
            Err(e) => {
                log::error!(
                    "Default mesh \"{}\" failed to load ({e}), using built-in cube",
                    self.default_mesh
                );
                cube()
            }
        };
        let data = Arc::new(data);
        self.meshes.insert(self.default_mesh.clone(), Arc::clone(&data));
        data
    }

    /// Check a texture reference against the asset root, substituting the
    /// default texture when the file does not exist.
    pub fn resolve_texture(&mut self, texture: &TextureRef) -> TextureRef {
        if texture.is_empty() {
            return TextureRef::new(self.default_texture.clone());
        }
        if self.root.join(texture.filename()).is_file() {
            return texture.clone();
        }
        self.warn(format!(
            "Texture \"{}\" not found, using default",
            texture.filename()
        ));
        TextureRef::new(self.default_texture.clone())
    }

    /// Drop every cached mesh, e.g. when a level is unloaded.
    pub fn clear_cache(&mut self) {
        self.meshes.clear();
    }

    pub fn cached_mesh_count(&self) -> usize {
        self.meshes.len()
    }

    /// Messages queued for the editor since the last call.
    pub fn take_notifications(&mut self) -> Vec<String> {
        std::mem::take(&mut self.notifications)
    }

    fn warn(&mut self, message: String) {
        log::warn!("{message}");
        self.notifications.push(message);
    }
}

fn builtin_mesh(name: &str) -> Option<MeshData> {
    match name {
        "cube" => Some(cube()),
        "plane" => Some(plane()),
        _ => None,
    }
}

/// A unit cube centred at the origin, 4 vertices per face so each face keeps
/// its own normal.
pub fn cube() -> MeshData {
    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);

    // (normal, u axis, v axis) per face
    let faces: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
        ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
        ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
        ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
        ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
        ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
    ];
    // (corner in face axes, uv)
    let corners = [
        ([-1.0, -1.0], [0.0, 1.0]),
        ([1.0, -1.0], [1.0, 1.0]),
        ([1.0, 1.0], [1.0, 0.0]),
        ([-1.0, 1.0], [0.0, 0.0]),
    ];

    for (normal, u, v) in faces {
        let base = vertices.len() as u32;
        let (normal, u, v) = (Vec3::from(normal), Vec3::from(u), Vec3::from(v));
        for ([cu, cv], uv) in corners {
            let position = (normal + u * cu + v * cv) * 0.5;
            vertices.push(Vertex {
                position: position.to_array(),
                normal: normal.to_array(),
                uv,
                ..Vertex::default()
            });
        }
        // Two counter-clockwise triangles per face.
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    MeshData::new(vertices, indices)
}

/// A unit plane on XZ facing +Y.
pub fn plane() -> MeshData {
    let h = 0.5;
    let vertex = |x: f32, z: f32, uv: [f32; 2]| Vertex {
        position: [x, 0.0, z],
        normal: [0.0, 1.0, 0.0],
        uv,
        ..Vertex::default()
    };
    let vertices = vec![
        vertex(-h, h, [0.0, 0.0]),
        vertex(h, h, [1.0, 0.0]),
        vertex(h, -h, [1.0, 1.0]),
        vertex(-h, -h, [0.0, 1.0]),
    ];
    MeshData::new(vertices, vec![0, 1, 2, 0, 2, 3])
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CountingImporter;

    impl MeshImporter for CountingImporter {
        fn extensions(&self) -> &[&str] {
            &["tri"]
        }

        fn import(&self, path: &Path) -> Result<MeshData> {
            if !path.ends_with("good.tri") {
                return Err(EngineError::Import(format!("{} unreadable", path.display())));
            }
            let v = |x: f32| Vertex {
                position: [x, 0.0, 0.0],
                ..Vertex::default()
            };
            Ok(MeshData::new(vec![v(0.0), v(1.0), v(2.0)], vec![0, 1, 2]))
        }
    }

    fn assets() -> Assets {
        let mut assets = Assets::new(&EngineConfig::default());
        assets.add_importer(CountingImporter);
        assets
    }

    #[test]
    fn cube_has_24_vertices_and_unit_bounds() {
        let cube = cube();
        assert_eq!(cube.vertices.len(), 24);
        assert_eq!(cube.indices.len(), 36);
        assert!((cube.bounds.extents - Vec3::splat(0.5)).length() < 1e-6);
        assert_eq!(cube.vertex_bytes().len(), 24 * std::mem::size_of::<Vertex>());
    }

    #[test]
    fn importer_is_chosen_by_extension() {
        let mut assets = assets();
        let mesh = assets.load_mesh(&MeshRef::new("good.tri"));
        assert_eq!(mesh.vertices.len(), 3);
        assert!(assets.take_notifications().is_empty());
    }

    #[test]
    fn meshes_are_cached() {
        let mut assets = assets();
        let a = assets.load_mesh(&MeshRef::new("good.tri"));
        let b = assets.load_mesh(&MeshRef::new("good.tri"));
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(assets.cached_mesh_count(), 1);
    }

    #[test]
    fn missing_mesh_falls_back_once() {
        let mut assets = assets();
        let mesh = assets.load_mesh(&MeshRef::new("bad.tri"));
        assert_eq!(mesh.vertices.len(), 24);
        assert_eq!(assets.take_notifications().len(), 1);

        assets.load_mesh(&MeshRef::new("bad.tri"));
        assert!(assets.take_notifications().is_empty());
    }

    #[test]
    fn unknown_extension_falls_back() {
        let mut assets = assets();
        let mesh = assets.load_mesh(&MeshRef::new("model.fbx"));
        assert_eq!(mesh.indices.len(), 36);
        let notes = assets.take_notifications();
        assert!(notes[0].contains("no importer"));
    }

    #[test]
    fn missing_texture_uses_default() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("brick.png"), b"png").unwrap();
        let config = EngineConfig {
            asset_root: dir.path().to_path_buf(),
            ..EngineConfig::default()
        };
        let mut assets = Assets::new(&config);

        let found = assets.resolve_texture(&TextureRef::new("brick.png"));
        assert_eq!(found.filename(), "brick.png");

        let missing = assets.resolve_texture(&TextureRef::new("moss.png"));
        assert_eq!(missing.filename(), "test.png");
        assert_eq!(assets.take_notifications().len(), 1);
    }
}
