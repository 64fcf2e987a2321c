//! Project save flow
//!
//! The scene snapshot is taken synchronously under the live scene's lock;
//! only the store call is awaited. Store failures are logged and handed back
//! to the caller without retrying.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

use crate::config::SaveConfig;
use crate::document::SceneDocument;
use crate::light::LightFieldSet;
use crate::live::LiveScene;
use crate::store::{DocumentStore, QueryFilter, StoreError, StoredDocument, Subscription, SubscriptionCallback};

/// Project save errors
#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("Store operation failed: {0}")]
    Store(#[from] StoreError),

    #[error("Failed to serialize project: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type ProjectResult<T> = Result<T, ProjectError>;

/// A persisted project document
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRecord {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub owner_id: String,
    #[serde(default)]
    pub scene: SceneDocument,
    /// Milliseconds since the Unix epoch
    #[serde(default)]
    pub created_at: u64,
    #[serde(default)]
    pub updated_at: u64,
}

/// Project metadata supplied at creation
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProjectMeta {
    pub name: String,
    pub description: String,
    pub owner_id: String,
}

/// A project as shown in a project list
#[derive(Clone, Debug, PartialEq)]
pub struct ProjectSummary {
    pub id: String,
    pub name: String,
    pub description: String,
    pub owner_id: String,
    pub updated_at: u64,
    pub object_count: usize,
    /// The stored scene, for list previews
    pub scene: SceneDocument,
}

impl ProjectSummary {
    fn from_stored(doc: StoredDocument) -> Result<Self, serde_json::Error> {
        let record: ProjectRecord = serde_json::from_value(doc.data)?;
        Ok(Self {
            id: doc.id,
            name: record.name,
            description: record.description,
            owner_id: record.owner_id,
            updated_at: record.updated_at,
            object_count: record.scene.objects.len(),
            scene: record.scene,
        })
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Creates, saves and deletes projects in a document store
#[derive(Clone)]
pub struct ProjectSaver {
    store: Arc<dyn DocumentStore>,
    collection: String,
    light_fields: LightFieldSet,
}

impl ProjectSaver {
    pub fn new(store: Arc<dyn DocumentStore>, config: &SaveConfig) -> Self {
        Self {
            store,
            collection: config.collection.clone(),
            light_fields: config.light_fields,
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Create a new project from the current scene, returning its id
    pub async fn create_project(&self, meta: ProjectMeta, scene: &LiveScene) -> ProjectResult<String> {
        let now = now_millis();
        let record = ProjectRecord {
            name: meta.name,
            description: meta.description,
            owner_id: meta.owner_id,
            scene: scene.snapshot(self.light_fields),
            created_at: now,
            updated_at: now,
        };
        let doc = serde_json::to_value(&record)?;

        let id = self.store.create(&self.collection, doc).await.map_err(|e| {
            log::error!("Failed to create project '{}': {}", record.name, e);
            e
        })?;
        log::info!("Created project {} ({} objects)", id, record.scene.objects.len());
        Ok(id)
    }

    /// Save the current scene over an existing project
    pub async fn save_project(&self, id: &str, scene: &LiveScene) -> ProjectResult<()> {
        let document = scene.snapshot(self.light_fields);
        let object_count = document.objects.len();
        let patch = json!({
            "scene": serde_json::to_value(&document)?,
            "updatedAt": now_millis(),
        });

        self.store.update(&self.collection, id, patch).await.map_err(|e| {
            log::error!("Failed to save project {}: {}", id, e);
            e
        })?;
        log::info!("Saved project {} ({} objects)", id, object_count);
        Ok(())
    }

    pub async fn delete_project(&self, id: &str) -> ProjectResult<()> {
        self.store.delete(&self.collection, id).await.map_err(|e| {
            log::error!("Failed to delete project {}: {}", id, e);
            e
        })?;
        log::info!("Deleted project {}", id);
        Ok(())
    }
}

/// Watch a project list.
///
/// The store's error channel delivers an empty list; documents that do not
/// decode as projects are skipped.
pub fn watch_projects(
    store: &dyn DocumentStore,
    filter: QueryFilter,
    callback: impl Fn(Vec<ProjectSummary>) + Send + Sync + 'static,
) -> Subscription {
    let on_change: SubscriptionCallback = Arc::new(move |result: Result<Vec<StoredDocument>, StoreError>| {
        let docs = match result {
            Ok(docs) => docs,
            Err(e) => {
                log::warn!("Project subscription error: {}", e);
                Vec::new()
            }
        };
        let summaries = docs
            .into_iter()
            .filter_map(|doc| {
                let id = doc.id.clone();
                match ProjectSummary::from_stored(doc) {
                    Ok(summary) => Some(summary),
                    Err(e) => {
                        log::warn!("Skipping unreadable project {}: {}", id, e);
                        None
                    }
                }
            })
            .collect();
        callback(summaries);
    });
    store.subscribe(filter, on_change)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::live::SceneObject;
    use crate::store::MemoryStore;
    use atelier_geometry::Primitive;
    use parking_lot::Mutex;

    fn saver(store: &MemoryStore) -> ProjectSaver {
        ProjectSaver::new(Arc::new(store.clone()), &SaveConfig::default())
    }

    fn meta(name: &str) -> ProjectMeta {
        ProjectMeta {
            name: name.to_string(),
            owner_id: "u1".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_then_save() {
        let store = MemoryStore::new();
        let saver = saver(&store);
        let scene = LiveScene::new();

        let id = saver.create_project(meta("Room"), &scene).await.unwrap();
        let created: ProjectRecord = serde_json::from_value(store.get("projects", &id).unwrap()).unwrap();
        assert!(created.scene.is_empty());
        assert_eq!(created.created_at, created.updated_at);

        scene.add_object(SceneObject::primitive("Crate", Primitive::default()));
        saver.save_project(&id, &scene).await.unwrap();

        let saved: ProjectRecord = serde_json::from_value(store.get("projects", &id).unwrap()).unwrap();
        assert_eq!(saved.name, "Room");
        assert_eq!(saved.scene.objects.len(), 1);
        assert!(saved.updated_at >= created.updated_at);
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let store = MemoryStore::new();
        let saver = saver(&store);
        store.set_failure(Some("offline"));

        let err = saver.create_project(meta("Room"), &LiveScene::new()).await.unwrap_err();
        assert!(matches!(err, ProjectError::Store(StoreError::Unavailable(_))));

        store.set_failure(None);
        let err = saver.save_project("missing", &LiveScene::new()).await.unwrap_err();
        assert!(matches!(err, ProjectError::Store(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_watch_projects() {
        let store = MemoryStore::new();
        let saver = saver(&store);
        let seen: Arc<Mutex<Vec<Vec<ProjectSummary>>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();

        let _sub = watch_projects(&store, QueryFilter::collection("projects"), move |list| {
            sink.lock().push(list)
        });

        let id = saver.create_project(meta("Room"), &LiveScene::new()).await.unwrap();
        // Not a project: no name
        store
            .create("projects", serde_json::json!({"description": "stray"}))
            .await
            .unwrap();
        store.fail_subscribers("projects", "denied");
        saver.delete_project(&id).await.unwrap();

        let seen = seen.lock();
        assert_eq!(seen.len(), 5);
        assert!(seen[0].is_empty());
        assert_eq!(seen[1].len(), 1);
        assert_eq!(seen[1][0].name, "Room");
        assert_eq!(seen[2].len(), 1);
        assert!(seen[3].is_empty());
        assert!(seen[4].is_empty());
    }
}
