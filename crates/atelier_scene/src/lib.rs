//! # atelier_scene - Scene Serialization and Reconstruction
//!
//! Turns a live, heterogeneous scene graph into a portable document and
//! rebuilds renderable scenes from it at two fidelities:
//!
//! - **Preview**: bounded cost, no asset I/O, pure and deterministic. Used
//!   for list and card thumbnails.
//! - **Full**: exact parameters, raw vertex payloads and asset loading,
//!   concurrent and cancellable. Used when the editor opens a project.
//!
//! ## Example
//!
//! ```ignore
//! use atelier_scene::prelude::*;
//!
//! let scene = LiveScene::new();
//! scene.add_object(SceneObject::primitive("Crate", Primitive::default()));
//!
//! let document = scene.snapshot(LightFieldSet::Extended);
//! match PreviewReconstructor::default().reconstruct(&document) {
//!     PreviewState::Ready(graph) => println!("{} nodes", graph.nodes.len()),
//!     PreviewState::Empty => println!("empty scene"),
//!     PreviewState::Loading => unreachable!(),
//! }
//! ```

pub mod color;
pub mod config;
pub mod descriptor;
pub mod document;
pub mod error;
pub mod full;
pub mod light;
pub mod live;
pub mod loader;
pub mod object;
pub mod preview;
pub mod project;
pub mod raw;
pub mod record;
pub mod store;

mod lenient;

pub use color::Color;
pub use config::{AtelierConfig, ConfigError, PreviewConfig, ReconstructConfig, SaveConfig};
pub use descriptor::{Fidelity, ShapeConstructor};
pub use document::{CameraSettings, DocumentIssue, SceneDocument, SceneSettings};
pub use error::{DocumentError, ReconstructError};
pub use full::{FailurePolicy, FullReconstruction, FullReconstructor, ObjectFailure};
pub use light::LightFieldSet;
pub use live::{
    Group, ImportProvenance, Light, LightKind, LiveScene, Material, MeshBody, NodeId, ObjectBody, SceneGraph,
    SceneObject, ShapeSource, Transform, WireframeOverlay,
};
#[cfg(feature = "gltf-loader")]
pub use loader::GltfModelLoader;
pub use loader::{CancelToken, LoadError, LoadOptions, LoadedModel, ModelLoader};
pub use preview::{PreviewGraph, PreviewNode, PreviewReconstructor, PreviewShape, PreviewState};
pub use project::{ProjectError, ProjectMeta, ProjectRecord, ProjectSaver, ProjectSummary};
pub use record::{
    CustomDescriptor, GeometryDescriptor, GroupRecord, ImportedDescriptor, LightRecord, NodeKind, RawGeometryData,
    SceneObjectRecord, WireframeStyle,
};
pub use store::{DocumentStore, MemoryStore, QueryFilter, StoreError, StoredDocument, Subscription};

/// Prelude - commonly used types
pub mod prelude {
    pub use crate::color::Color;
    pub use crate::document::SceneDocument;
    pub use crate::full::{FailurePolicy, FullReconstructor};
    pub use crate::light::LightFieldSet;
    pub use crate::live::{Group, Light, LiveScene, SceneObject, Transform};
    pub use crate::loader::{CancelToken, ModelLoader};
    pub use crate::preview::{PreviewReconstructor, PreviewState};
    pub use crate::record::{GeometryDescriptor, SceneObjectRecord};
    pub use atelier_geometry::prelude::*;
}
