//! Asset caching
//!
//! The physics builder and the renderer both need the meshes a model
//! references. [`AssetCache`] loads each file once, hands out shared `Arc`
//! data, and remembers paths that failed so a missing mesh is reported once
//! rather than on every lookup.
//!
//! # Example
//!
//! ```ignore
//! let mut cache = AssetCache::new();
//! let handle = cache.load::<MeshAsset>("meshes/link1.STL")?;
//! let mesh: Arc<MeshAsset> = cache.get::<MeshAsset>(&handle).unwrap();
//! ```

use std::any::Any;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::asset_error::AssetError;
use crate::mesh::{MeshAsset, MeshResolver};
use crate::model::RobotModel;

/// Unique identifier for an asset in the cache.
///
/// IDs are assigned sequentially starting from 1.
pub type AssetId = u64;

/// A lightweight handle to a cached asset.
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct AssetHandle {
    id: AssetId,
    path: PathBuf,
}

impl AssetHandle {
    /// Get the asset ID
    pub fn id(&self) -> AssetId {
        self.id
    }

    /// Get the file path this asset was loaded from
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Trait for types that can be loaded from files and cached.
pub trait Asset: Sized + Send + Sync + 'static {
    /// Load this asset from the given file path.
    fn load_from_file(path: &Path) -> Result<Self, AssetError>;
}

/// Why a path failed to load
#[derive(Clone, Debug)]
enum Failure {
    NotFound,
    Other(String),
}

/// A type-erased asset cache keyed by file path
pub struct AssetCache {
    assets: HashMap<AssetId, Arc<dyn Any + Send + Sync>>,
    path_index: HashMap<PathBuf, AssetId>,
    /// Paths that failed to load
    failed: HashMap<PathBuf, Failure>,
    next_id: u64,
}

impl Default for AssetCache {
    fn default() -> Self {
        Self::new()
    }
}

impl AssetCache {
    /// Create a new empty asset cache.
    pub fn new() -> Self {
        Self {
            assets: HashMap::new(),
            path_index: HashMap::new(),
            failed: HashMap::new(),
            next_id: 1,
        }
    }

    /// Load an asset, or return the cached handle if already loaded.
    ///
    /// A path that failed before fails again without touching the disk.
    pub fn load<T: Asset>(&mut self, path: impl AsRef<Path>) -> Result<AssetHandle, AssetError> {
        let path = path.as_ref().to_path_buf();

        if let Some(&id) = self.path_index.get(&path) {
            return Ok(AssetHandle { id, path });
        }
        match self.failed.get(&path) {
            Some(Failure::NotFound) => {
                return Err(AssetError::NotFound(path.display().to_string()))
            }
            Some(Failure::Other(msg)) => return Err(AssetError::Parse(msg.clone())),
            None => {}
        }

        let data = match T::load_from_file(&path) {
            Ok(data) => data,
            Err(err) => {
                log::warn!("Failed to load asset {}: {}", path.display(), err);
                let failure = match &err {
                    AssetError::NotFound(_) => Failure::NotFound,
                    other => Failure::Other(other.to_string()),
                };
                self.failed.insert(path, failure);
                return Err(err);
            }
        };

        let id = self.next_id;
        self.next_id += 1;
        self.assets.insert(id, Arc::new(data));
        self.path_index.insert(path.clone(), id);

        Ok(AssetHandle { id, path })
    }

    /// Retrieve a cached asset, downcasting to the requested type.
    ///
    /// Returns `None` if the handle is stale or the type does not match.
    pub fn get<T: Asset>(&self, handle: &AssetHandle) -> Option<Arc<T>> {
        self.assets.get(&handle.id)?.clone().downcast::<T>().ok()
    }

    /// Resolve a URDF mesh filename and load it
    ///
    /// Returns `None` (after logging once) if the mesh is unavailable.
    pub fn mesh(&mut self, resolver: &MeshResolver, filename: &str) -> Option<Arc<MeshAsset>> {
        let path = resolver.resolve(filename);
        let handle = self.load::<MeshAsset>(&path).ok()?;
        self.get::<MeshAsset>(&handle)
    }

    /// Number of successfully loaded assets
    pub fn asset_count(&self) -> usize {
        self.assets.len()
    }

    /// Number of paths that failed to load
    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }

    /// Check if an asset with the given handle is still in the cache.
    pub fn contains(&self, handle: &AssetHandle) -> bool {
        self.assets.contains_key(&handle.id)
    }

    /// Drop all cached data and failure records
    pub fn clear(&mut self) {
        self.assets.clear();
        self.path_index.clear();
        self.failed.clear();
    }
}

/// Mesh lookup shared by the physics builder and the renderer
///
/// Pairs a [`MeshResolver`] with an [`AssetCache`] so each mesh file is read
/// at most once per run.
#[derive(Default)]
pub struct MeshSource {
    resolver: MeshResolver,
    cache: AssetCache,
}

impl MeshSource {
    /// Create a mesh source over the given resolver
    pub fn new(resolver: MeshResolver) -> Self {
        Self {
            resolver,
            cache: AssetCache::new(),
        }
    }

    /// Mesh source for a model, optionally overriding its compiler meshdir
    pub fn for_model(model: &RobotModel, meshdir: Option<PathBuf>) -> Self {
        let meshdir = meshdir.or_else(|| model.compiler.meshdir.clone());
        Self::new(MeshResolver::new(meshdir))
    }

    /// Look up a mesh by URDF filename
    pub fn get(&mut self, filename: &str) -> Option<Arc<MeshAsset>> {
        self.cache.mesh(&self.resolver, filename)
    }

    /// The resolver in use
    pub fn resolver(&self) -> &MeshResolver {
        &self.resolver
    }

    /// The underlying cache
    pub fn cache(&self) -> &AssetCache {
        &self.cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Write;

    /// A simple test asset: just holds a string loaded from a file.
    #[derive(Debug, Clone, PartialEq)]
    struct TextAsset {
        content: String,
    }

    impl Asset for TextAsset {
        fn load_from_file(path: &Path) -> Result<Self, AssetError> {
            let content = fs::read_to_string(path)?;
            Ok(TextAsset { content })
        }
    }

    #[derive(Debug)]
    struct OtherAsset;

    impl Asset for OtherAsset {
        fn load_from_file(_path: &Path) -> Result<Self, AssetError> {
            Ok(OtherAsset)
        }
    }

    fn create_file(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_new_cache_is_empty() {
        let cache = AssetCache::new();
        assert_eq!(cache.asset_count(), 0);
        assert_eq!(cache.failed_count(), 0);
    }

    #[test]
    fn test_load_and_get() {
        let dir = tempfile::tempdir().unwrap();
        let path = create_file(dir.path(), "a.txt", "hello");
        let mut cache = AssetCache::new();
        let handle = cache.load::<TextAsset>(&path).unwrap();
        assert_eq!(handle.id(), 1);
        assert_eq!(handle.path(), path.as_path());
        let data = cache.get::<TextAsset>(&handle).unwrap();
        assert_eq!(data.content, "hello");
    }

    #[test]
    fn test_deduplication_by_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = create_file(dir.path(), "a.txt", "x");
        let mut cache = AssetCache::new();
        let h1 = cache.load::<TextAsset>(&path).unwrap();
        let h2 = cache.load::<TextAsset>(&path).unwrap();
        assert_eq!(h1, h2);
        assert_eq!(cache.asset_count(), 1);
        let a = cache.get::<TextAsset>(&h1).unwrap();
        let b = cache.get::<TextAsset>(&h2).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_type_mismatch_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = create_file(dir.path(), "a.txt", "x");
        let mut cache = AssetCache::new();
        let handle = cache.load::<TextAsset>(&path).unwrap();
        assert!(cache.get::<OtherAsset>(&handle).is_none());
    }

    #[test]
    fn test_failure_is_remembered() {
        let mut cache = AssetCache::new();
        let missing = Path::new("/nonexistent/missing.txt");
        // TextAsset surfaces the raw IO error, so the repeat is reported as a parse failure
        let first = cache.load::<TextAsset>(missing).unwrap_err();
        assert!(matches!(first, AssetError::Io(_)));
        assert_eq!(cache.failed_count(), 1);
        let second = cache.load::<TextAsset>(missing).unwrap_err();
        assert!(matches!(second, AssetError::Parse(_)));
        assert_eq!(cache.failed_count(), 1);
    }

    #[test]
    fn test_mesh_lookup_through_resolver() {
        let dir = tempfile::tempdir().unwrap();
        create_file(
            dir.path(),
            "tri.STL",
            "solid t\nfacet normal 0 0 1\nouter loop\nvertex 0 0 0\nvertex 1 0 0\nvertex 0 1 0\nendloop\nendfacet\nendsolid t\n",
        );
        let resolver = MeshResolver::new(Some(dir.path().to_path_buf()));
        let mut cache = AssetCache::new();
        let mesh = cache.mesh(&resolver, "package://robot/meshes/tri.STL").unwrap();
        assert_eq!(mesh.triangle_count(), 1);
        assert!(cache.mesh(&resolver, "package://robot/meshes/none.STL").is_none());
        assert_eq!(cache.asset_count(), 1);
        assert_eq!(cache.failed_count(), 1);
    }

    #[test]
    fn test_mesh_source_meshdir_override() {
        let model = crate::builtin::dofbot().unwrap();
        let source = MeshSource::for_model(&model, None);
        assert_eq!(source.resolver().meshdir(), model.compiler.meshdir.as_deref());

        let dir = tempfile::tempdir().unwrap();
        create_file(
            dir.path(),
            "link1.STL",
            "solid t\nfacet normal 0 0 1\nouter loop\nvertex 0 0 0\nvertex 1 0 0\nvertex 0 1 0\nendloop\nendfacet\nendsolid t\n",
        );
        let mut source = MeshSource::for_model(&model, Some(dir.path().to_path_buf()));
        assert!(source.get("package://dofbot_moveit/meshes/link1.STL").is_some());
        assert!(source.get("package://dofbot_moveit/meshes/link2.STL").is_none());
        assert_eq!(source.cache().asset_count(), 1);
    }

    #[test]
    fn test_clear() {
        let dir = tempfile::tempdir().unwrap();
        let path = create_file(dir.path(), "a.txt", "x");
        let mut cache = AssetCache::new();
        let handle = cache.load::<TextAsset>(&path).unwrap();
        cache.clear();
        assert!(!cache.contains(&handle));
        assert_eq!(cache.asset_count(), 0);
    }
}
