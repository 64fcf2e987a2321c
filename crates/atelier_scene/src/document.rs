//! SceneDocument assembler and file I/O

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::color::Color;
use crate::error::{DocumentError, DocumentResult};
use crate::lenient;
use crate::light::{self, LightFieldSet};
use crate::live::{NodeId, SceneGraph};
use crate::object;
use crate::record::{GroupRecord, LightRecord, SceneObjectRecord};

/// Current document format version
pub const DOCUMENT_VERSION: u32 = 1;

/// One project's complete persisted scene
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneDocument {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default, deserialize_with = "lenient::records")]
    pub objects: Vec<SceneObjectRecord>,
    #[serde(default, deserialize_with = "lenient::records")]
    pub lights: Vec<LightRecord>,
    #[serde(default, deserialize_with = "lenient::records")]
    pub groups: Vec<GroupRecord>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub settings: SceneSettings,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slides: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presentation_settings: Option<Value>,
}

fn default_version() -> u32 {
    DOCUMENT_VERSION
}

impl Default for SceneDocument {
    fn default() -> Self {
        Self {
            version: DOCUMENT_VERSION,
            objects: Vec::new(),
            lights: Vec::new(),
            groups: Vec::new(),
            settings: SceneSettings::default(),
            slides: None,
            presentation_settings: None,
        }
    }
}

/// Global scene settings.
///
/// Keys this build does not know are kept in `extra` and written back.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SceneSettings {
    pub background_color: Color,
    pub show_grid: bool,
    pub grid_size: f32,
    #[serde(deserialize_with = "lenient::optional", skip_serializing_if = "Option::is_none")]
    pub camera: Option<CameraSettings>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for SceneSettings {
    fn default() -> Self {
        Self {
            background_color: Color(0x1e1e2e),
            show_grid: true,
            grid_size: 10.0,
            camera: None,
            extra: Map::new(),
        }
    }
}

/// Saved editor camera
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    pub position: [f32; 3],
    pub target: [f32; 3],
    /// Vertical field of view in degrees
    pub fov: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            position: [5.0, 5.0, 5.0],
            target: [0.0, 0.0, 0.0],
            fov: 75.0,
        }
    }
}

/// Non-fatal inconsistency found by [`SceneDocument::validate`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DocumentIssue {
    /// Two object records share an id
    DuplicateObjectId(NodeId),
    /// An object names a group that is not in the document
    DanglingGroup { object: NodeId, group: NodeId },
}

impl fmt::Display for DocumentIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentIssue::DuplicateObjectId(id) => write!(f, "duplicate object id {}", id),
            DocumentIssue::DanglingGroup { object, group } => {
                write!(f, "object {} references missing group {}", object, group)
            }
        }
    }
}

impl SceneDocument {
    /// Snapshot a scene graph into a document
    pub fn assemble(graph: &SceneGraph, fields: LightFieldSet) -> Self {
        Self::from_parts(
            graph.objects.iter().map(object::encode).collect(),
            graph.lights.iter().map(|l| light::encode_light(l, fields)).collect(),
            graph.groups.iter().map(light::encode_group).collect(),
            graph.settings.clone(),
        )
        .with_presentation(graph.slides.clone(), graph.presentation_settings.clone())
    }

    /// Aggregate already encoded records
    pub fn from_parts(
        objects: Vec<SceneObjectRecord>,
        lights: Vec<LightRecord>,
        groups: Vec<GroupRecord>,
        settings: SceneSettings,
    ) -> Self {
        Self {
            version: DOCUMENT_VERSION,
            objects,
            lights,
            groups,
            settings,
            slides: None,
            presentation_settings: None,
        }
    }

    pub fn with_presentation(mut self, slides: Option<Value>, presentation_settings: Option<Value>) -> Self {
        self.slides = slides;
        self.presentation_settings = presentation_settings;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn to_json_pretty(&self) -> DocumentResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn to_value(&self) -> DocumentResult<Value> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn from_json(json: &str) -> DocumentResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_value(value: Value) -> DocumentResult<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// Save to a JSON file
    pub fn save(&self, path: impl AsRef<Path>) -> DocumentResult<()> {
        let path = path.as_ref();
        let json = self.to_json_pretty()?;
        std::fs::write(path, json).map_err(|source| DocumentError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Saved scene document to {} ({} objects)", path.display(), self.objects.len());
        Ok(())
    }

    /// Load from a JSON file
    pub fn load(path: impl AsRef<Path>) -> DocumentResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| DocumentError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let document = Self::from_json(&json)?;
        log::info!("Loaded scene document from {} ({} objects)", path.display(), document.objects.len());
        Ok(document)
    }

    /// Report duplicate object ids and dangling group references
    pub fn validate(&self) -> Vec<DocumentIssue> {
        let mut issues = Vec::new();
        let mut seen = HashSet::new();
        for record in &self.objects {
            if !seen.insert(&record.id) {
                issues.push(DocumentIssue::DuplicateObjectId(record.id.clone()));
            }
        }

        let groups: HashSet<&NodeId> = self.groups.iter().map(|g| &g.id).collect();
        for record in &self.objects {
            if let Some(group) = &record.group_id {
                if !groups.contains(group) {
                    issues.push(DocumentIssue::DanglingGroup {
                        object: record.id.clone(),
                        group: group.clone(),
                    });
                }
            }
        }
        issues
    }
}
