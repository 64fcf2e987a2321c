//! Asset loading for full-fidelity reconstruction
//!
//! The preview path never reaches this module.

#[cfg(feature = "gltf-loader")]
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use atelier_geometry::BufferGeometry;
use thiserror::Error;
use tokio::sync::Notify;

use crate::color::Color;

/// Asset loading errors
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Model not found: {0}")]
    NotFound(String),

    #[error("Failed to parse model {path}: {message}")]
    Parse { path: String, message: String },

    #[error("Model {0} contains no triangle geometry")]
    NoGeometry(String),

    #[error("Load task failed: {0}")]
    Task(String),

    #[error("Load cancelled")]
    Cancelled,
}

/// Shared cancellation flag for a batch of loads.
///
/// Clones observe the same flag. Once cancelled a token stays cancelled.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    inner: Arc<CancelInner>,
}

#[derive(Debug, Default)]
struct CancelInner {
    cancelled: AtomicBool,
    notify: Notify,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Resolves once [`CancelToken::cancel`] has been called
    pub async fn cancelled(&self) {
        loop {
            // Register before checking so a concurrent cancel is not missed
            let notified = self.inner.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

/// Per-load options
#[derive(Clone, Debug)]
pub struct LoadOptions {
    /// Uniform scale applied to the loaded vertices
    pub scale: f32,
    pub cancel: CancelToken,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            scale: 1.0,
            cancel: CancelToken::new(),
        }
    }
}

/// A loaded, drawable model
#[derive(Clone, Debug, PartialEq)]
pub struct LoadedModel {
    pub geometry: BufferGeometry,
    /// Base colour of the first material, if the file has one
    pub color: Option<Color>,
    pub name: Option<String>,
}

/// Loads external models by path
#[async_trait]
pub trait ModelLoader: Send + Sync {
    async fn load_model(&self, path: &str, options: &LoadOptions) -> Result<LoadedModel, LoadError>;
}

/// Race a load against its cancellation token
pub async fn load_cancellable(
    loader: &dyn ModelLoader,
    path: &str,
    options: &LoadOptions,
) -> Result<LoadedModel, LoadError> {
    if options.cancel.is_cancelled() {
        return Err(LoadError::Cancelled);
    }
    tokio::select! {
        biased;
        _ = options.cancel.cancelled() => Err(LoadError::Cancelled),
        result = loader.load_model(path, options) => result,
    }
}

/// Loads `.gltf` / `.glb` files from a root directory.
///
/// All triangle primitives of all meshes are merged into one geometry in
/// mesh space; node transforms are not applied.
#[cfg(feature = "gltf-loader")]
#[derive(Clone, Debug)]
pub struct GltfModelLoader {
    root: PathBuf,
}

#[cfg(feature = "gltf-loader")]
impl GltfModelLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve a stored model path against the root. Stored paths are
    /// usually absolute URL paths like `/models/chair.glb`.
    ///
    /// Returns `None` for paths that would leave the root (`..`, drive
    /// prefixes, a second root).
    pub fn resolve(&self, path: &str) -> Option<PathBuf> {
        let relative = Path::new(path.trim_start_matches('/'));
        let contained = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if !contained {
            return None;
        }
        Some(self.root.join(relative))
    }
}

#[cfg(feature = "gltf-loader")]
#[async_trait]
impl ModelLoader for GltfModelLoader {
    async fn load_model(&self, path: &str, options: &LoadOptions) -> Result<LoadedModel, LoadError> {
        let full_path = match self.resolve(path) {
            Some(full_path) if full_path.exists() => full_path,
            Some(_) => return Err(LoadError::NotFound(path.to_string())),
            None => {
                log::warn!("Refusing model path outside the asset root: {}", path);
                return Err(LoadError::NotFound(path.to_string()));
            }
        };

        log::debug!("Loading model {}", full_path.display());
        let task = tokio::task::spawn_blocking(move || read_gltf(&full_path));
        let mut model = tokio::select! {
            _ = options.cancel.cancelled() => return Err(LoadError::Cancelled),
            joined = task => joined.map_err(|e| LoadError::Task(e.to_string()))??,
        };

        if options.scale != 1.0 {
            model.geometry.scale(options.scale);
        }
        Ok(model)
    }
}

#[cfg(feature = "gltf-loader")]
fn read_gltf(path: &Path) -> Result<LoadedModel, LoadError> {
    let display = path.display().to_string();
    let (document, buffers, _images) = gltf::import(path).map_err(|e| LoadError::Parse {
        path: display.clone(),
        message: e.to_string(),
    })?;

    let mut geometry = BufferGeometry::new();
    let mut color = None;
    let mut name = None;

    for mesh in document.meshes() {
        if name.is_none() {
            name = mesh.name().map(str::to_string);
        }
        for primitive in mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                continue;
            }

            let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| data.0.as_slice()));
            let positions: Vec<f32> = match reader.read_positions() {
                Some(iter) => iter.flatten().collect(),
                None => continue,
            };
            let vertex_count = positions.len() / 3;

            let normals: Option<Vec<f32>> = reader
                .read_normals()
                .map(|iter| iter.flatten().collect())
                .filter(|n: &Vec<f32>| n.len() == vertex_count * 3);
            let uvs: Option<Vec<f32>> = reader
                .read_tex_coords(0)
                .map(|tc| tc.into_f32().flatten().collect())
                .filter(|uv: &Vec<f32>| uv.len() == vertex_count * 2);
            let index = reader.read_indices().map(|i| i.into_u32().collect());

            geometry.append(&BufferGeometry {
                position: Some(positions),
                normal: normals,
                uv: uvs,
                index,
            });

            if color.is_none() {
                let [r, g, b, _] = primitive.material().pbr_metallic_roughness().base_color_factor();
                color = Some(Color::from_rgb_f32([r, g, b]));
            }
        }
    }

    if geometry.vertex_count() == 0 {
        return Err(LoadError::NoGeometry(display));
    }
    if !geometry.has_normals() {
        geometry.compute_vertex_normals();
    }

    Ok(LoadedModel { geometry, color, name })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    struct SlowLoader;

    #[async_trait]
    impl ModelLoader for SlowLoader {
        async fn load_model(&self, _path: &str, _options: &LoadOptions) -> Result<LoadedModel, LoadError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Err(LoadError::NotFound("never".into()))
        }
    }

    #[tokio::test]
    async fn test_cancel_interrupts_pending_load() {
        let options = LoadOptions::default();
        let cancel = options.cancel.clone();

        let handle = tokio::spawn(async move { load_cancellable(&SlowLoader, "/slow.glb", &options).await });
        tokio::time::sleep(Duration::from_millis(20)).await;
        cancel.cancel();

        let result = tokio::time::timeout(Duration::from_secs(5), handle).await.unwrap().unwrap();
        assert!(matches!(result, Err(LoadError::Cancelled)));
    }

    #[tokio::test]
    async fn test_no_load_after_cancel() {
        let options = LoadOptions::default();
        options.cancel.cancel();
        let result = load_cancellable(&SlowLoader, "/slow.glb", &options).await;
        assert!(matches!(result, Err(LoadError::Cancelled)));
    }

    #[tokio::test]
    async fn test_cancelled_resolves_for_clones() {
        let token = CancelToken::new();
        let clone = token.clone();
        token.cancel();
        clone.cancelled().await;
        assert!(clone.is_cancelled());
    }

    #[cfg(feature = "gltf-loader")]
    #[tokio::test]
    async fn test_gltf_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let loader = GltfModelLoader::new(dir.path());
        let result = loader.load_model("/models/none.glb", &LoadOptions::default()).await;
        assert!(matches!(result, Err(LoadError::NotFound(_))));
    }

    #[cfg(feature = "gltf-loader")]
    #[test]
    fn test_resolve_stays_under_root() {
        let loader = GltfModelLoader::new("/srv/assets");
        assert_eq!(
            loader.resolve("/models/chair.glb"),
            Some(PathBuf::from("/srv/assets/models/chair.glb"))
        );
        assert_eq!(
            loader.resolve("./chair.glb"),
            Some(PathBuf::from("/srv/assets/chair.glb"))
        );
        assert_eq!(loader.resolve("/../../etc/passwd"), None);
        assert_eq!(loader.resolve("models/../../secret.glb"), None);
    }

    #[cfg(feature = "gltf-loader")]
    #[tokio::test]
    async fn test_gltf_refuses_escaping_path() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("assets");
        std::fs::create_dir(&root).unwrap();
        std::fs::write(dir.path().join("outside.glb"), b"not a model").unwrap();

        let loader = GltfModelLoader::new(&root);
        let result = loader.load_model("/../outside.glb", &LoadOptions::default()).await;
        assert!(matches!(result, Err(LoadError::NotFound(_))));
    }

    #[cfg(feature = "gltf-loader")]
    #[tokio::test]
    async fn test_gltf_garbage_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.glb"), b"not a model").unwrap();
        let loader = GltfModelLoader::new(dir.path());
        let result = loader.load_model("broken.glb", &LoadOptions::default()).await;
        assert!(matches!(result, Err(LoadError::Parse { .. })));
    }
}
