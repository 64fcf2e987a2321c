//! Full Reconstructor - editor-side, full-fidelity document load
//!
//! Asset loads for all objects run concurrently. A failed object never
//! aborts the document; it is reported and either dropped or replaced by a
//! flagged placeholder, as the configured [`FailurePolicy`] says.

use std::collections::HashSet;
use std::sync::Arc;

use futures_util::future::join_all;
use serde::{Deserialize, Serialize};

use crate::config::ReconstructConfig;
use crate::document::{SceneDocument, SceneSettings};
use crate::error::ReconstructError;
use crate::light;
use crate::live::{Group, Light, LiveScene, NodeId, SceneGraph, SceneObject};
use crate::loader::{CancelToken, ModelLoader};
use crate::object;

/// What replaces an object that failed to reconstruct
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Keep a flagged, non-drawable stand-in with the record's metadata
    #[default]
    Placeholder,
    /// Leave the object out
    Omit,
}

/// One object that could not be reconstructed
#[derive(Debug)]
pub struct ObjectFailure {
    pub record_id: NodeId,
    pub name: String,
    pub error: ReconstructError,
}

/// Result of a full reconstruction
#[derive(Debug)]
pub struct FullReconstruction {
    pub objects: Vec<SceneObject>,
    pub lights: Vec<Light>,
    pub groups: Vec<Group>,
    pub settings: SceneSettings,
    pub slides: Option<serde_json::Value>,
    pub presentation_settings: Option<serde_json::Value>,
    pub failures: Vec<ObjectFailure>,
}

impl FullReconstruction {
    /// Whether every object reconstructed
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Split into a scene graph and the failures
    pub fn into_graph(self) -> (SceneGraph, Vec<ObjectFailure>) {
        let graph = SceneGraph {
            objects: self.objects,
            lights: self.lights,
            groups: self.groups,
            settings: self.settings,
            slides: self.slides,
            presentation_settings: self.presentation_settings,
        };
        (graph, self.failures)
    }

    /// Replace the host scene's contents, returning the failures
    pub fn apply_to(self, scene: &LiveScene) -> Vec<ObjectFailure> {
        let (graph, failures) = self.into_graph();
        log::info!(
            "Loaded {} objects into scene ({} failed)",
            graph.objects.len(),
            failures.len()
        );
        scene.replace(graph);
        failures
    }
}

/// Reconstructs documents at full fidelity through a model loader
#[derive(Clone)]
pub struct FullReconstructor {
    loader: Arc<dyn ModelLoader>,
    config: ReconstructConfig,
}

impl FullReconstructor {
    pub fn new(loader: Arc<dyn ModelLoader>) -> Self {
        Self::from_config(loader, &ReconstructConfig::default())
    }

    /// Reconstructor using the `[reconstruct]` configuration section
    pub fn from_config(loader: Arc<dyn ModelLoader>, config: &ReconstructConfig) -> Self {
        Self {
            loader,
            config: config.clone(),
        }
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.config.on_failure = policy;
        self
    }

    pub fn policy(&self) -> FailurePolicy {
        self.config.on_failure
    }

    pub fn config(&self) -> &ReconstructConfig {
        &self.config
    }

    /// Reconstruct a document.
    ///
    /// Cancelling `cancel` stops pending loads; the affected objects are
    /// reported as cancelled failures and everything already built is kept.
    pub async fn reconstruct(&self, document: &SceneDocument, cancel: &CancelToken) -> FullReconstruction {
        let loader = self.loader.as_ref();
        let results = join_all(
            document
                .objects
                .iter()
                .map(|record| object::decode_full(record, loader, cancel, &self.config)),
        )
        .await;

        let groups: Vec<Group> = document.groups.iter().map(light::decode_group).collect();
        let group_ids: HashSet<&NodeId> = groups.iter().map(|g| &g.id).collect();

        let mut objects = Vec::with_capacity(results.len());
        let mut failures = Vec::new();
        let mut omitted = HashSet::new();

        for (record, result) in document.objects.iter().zip(results) {
            let mut object = match result {
                Ok(object) => object,
                Err(error) => {
                    log::warn!("Object {} ({}) failed to load: {}", record.id, record.name, error);
                    let stand_in = match self.config.on_failure {
                        FailurePolicy::Placeholder => Some(object::unresolved(record, &error)),
                        FailurePolicy::Omit => None,
                    };
                    failures.push(ObjectFailure {
                        record_id: record.id.clone(),
                        name: record.name.clone(),
                        error,
                    });
                    match stand_in {
                        Some(stand_in) => stand_in,
                        None => {
                            omitted.insert(record.id.clone());
                            continue;
                        }
                    }
                }
            };

            if let Some(group) = &object.group_id {
                if !group_ids.contains(group) {
                    log::warn!("Object {} references missing group {}; ungrouping", object.id, group);
                    object.group_id = None;
                }
            }
            objects.push(object);
        }

        let groups = groups
            .into_iter()
            .map(|mut g| {
                g.object_ids.retain(|id| !omitted.contains(id));
                g
            })
            .collect();

        FullReconstruction {
            objects,
            lights: document.lights.iter().map(light::decode_light).collect(),
            groups,
            settings: document.settings.clone(),
            slides: document.slides.clone(),
            presentation_settings: document.presentation_settings.clone(),
            failures,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::live::{ImportProvenance, ObjectBody};
    use crate::loader::{LoadError, LoadOptions, LoadedModel};
    use crate::light::LightFieldSet;
    use async_trait::async_trait;
    use atelier_geometry::{tessellate, BufferGeometry, Primitive};

    struct BoxLoader;

    #[async_trait]
    impl ModelLoader for BoxLoader {
        async fn load_model(&self, path: &str, _options: &LoadOptions) -> Result<LoadedModel, LoadError> {
            if path.ends_with("broken.glb") {
                return Err(LoadError::NoGeometry(path.to_string()));
            }
            Ok(LoadedModel {
                geometry: tessellate(&Primitive::default()),
                color: None,
                name: None,
            })
        }
    }

    fn scene_document() -> SceneDocument {
        let scene = LiveScene::new();
        let group = scene.add_group(Group::new("Props"));
        scene.add_object(SceneObject::primitive("Crate", Primitive::default()).in_group(&group));
        scene.add_object(
            SceneObject::imported(
                "Broken",
                ImportProvenance::new("/models/broken.glb", "broken.glb"),
                BufferGeometry::new(),
            )
            .in_group(&group),
        );
        scene.add_object(SceneObject::imported(
            "Chair",
            ImportProvenance::new("/models/chair.glb", "chair.glb"),
            BufferGeometry::new(),
        ));
        scene.add_light(Light::point("Bulb"));
        scene.snapshot(LightFieldSet::Extended)
    }

    #[tokio::test]
    async fn test_placeholder_policy_keeps_failed_object() {
        let doc = scene_document();
        let result = FullReconstructor::new(Arc::new(BoxLoader))
            .reconstruct(&doc, &CancelToken::new())
            .await;

        assert_eq!(result.objects.len(), 3);
        assert_eq!(result.failures.len(), 1);
        assert_eq!(result.failures[0].name, "Broken");
        assert!(matches!(result.failures[0].error, ReconstructError::AssetLoad { .. }));
        assert!(matches!(result.objects[1].body, ObjectBody::Unresolved(_)));
        assert_eq!(result.lights.len(), 1);
    }

    #[tokio::test]
    async fn test_omit_policy_drops_failed_object() {
        let doc = scene_document();
        let result = FullReconstructor::new(Arc::new(BoxLoader))
            .with_policy(FailurePolicy::Omit)
            .reconstruct(&doc, &CancelToken::new())
            .await;

        assert_eq!(result.objects.len(), 2);
        assert_eq!(result.groups[0].object_ids.len(), 1);
        assert!(!result.is_complete());
    }

    #[tokio::test]
    async fn test_dangling_group_is_ungrouped() {
        let mut doc = scene_document();
        doc.groups.clear();
        let result = FullReconstructor::new(Arc::new(BoxLoader))
            .reconstruct(&doc, &CancelToken::new())
            .await;
        assert!(result.objects.iter().all(|o| o.group_id.is_none()));
    }

    #[tokio::test]
    async fn test_apply_to_replaces_scene() {
        let doc = scene_document();
        let scene = LiveScene::new();
        scene.add_object(SceneObject::primitive("Old", Primitive::default()));

        let failures = FullReconstructor::new(Arc::new(BoxLoader))
            .reconstruct(&doc, &CancelToken::new())
            .await
            .apply_to(&scene);

        assert_eq!(failures.len(), 1);
        assert_eq!(scene.object_count(), 3);

        let saved = scene.snapshot(LightFieldSet::Extended);
        let descriptors = |d: &SceneDocument| -> Vec<_> {
            d.objects
                .iter()
                .map(|o| (o.id.clone(), o.geometry_descriptor.clone()))
                .collect()
        };
        assert_eq!(descriptors(&saved), descriptors(&doc));
        assert_eq!(saved.groups, doc.groups);
        assert_eq!(saved.lights, doc.lights);
        // The unresolved object is written back exactly as it was loaded
        assert_eq!(saved.objects[1], doc.objects[1]);
    }

    #[tokio::test]
    async fn test_non_mesh_nodes_survive_reload() {
        let scene = LiveScene::new();
        scene.add_object(SceneObject::primitive("Crate", Primitive::default()));
        scene.add_object(SceneObject::new("Pivot", ObjectBody::Group));
        scene.add_object(SceneObject::new("Marker", ObjectBody::Placeholder));
        let doc = scene.snapshot(LightFieldSet::Extended);

        let result = FullReconstructor::new(Arc::new(BoxLoader))
            .with_policy(FailurePolicy::Omit)
            .reconstruct(&doc, &CancelToken::new())
            .await;

        assert!(result.is_complete());
        assert_eq!(result.objects.len(), 3);
        assert_eq!(result.objects[1].body, ObjectBody::Group);
        assert_eq!(result.objects[2].body, ObjectBody::Placeholder);

        let reloaded = LiveScene::new();
        result.apply_to(&reloaded);
        assert_eq!(reloaded.snapshot(LightFieldSet::Extended), doc);
    }

    #[tokio::test]
    async fn test_from_config() {
        let config = ReconstructConfig {
            on_failure: FailurePolicy::Omit,
            max_vertices: 10,
        };
        let reconstructor = FullReconstructor::from_config(Arc::new(BoxLoader), &config);
        assert_eq!(reconstructor.policy(), FailurePolicy::Omit);

        // Box tessellation needs 24 vertices
        let scene = LiveScene::new();
        scene.add_object(SceneObject::primitive("Crate", Primitive::default()));
        let mut doc = scene.snapshot(LightFieldSet::Extended);
        doc.objects[0].raw_geometry_data = None;

        let result = reconstructor.reconstruct(&doc, &CancelToken::new()).await;
        assert!(result.objects.is_empty());
        assert!(matches!(result.failures[0].error, ReconstructError::TooComplex(_)));
    }
}
