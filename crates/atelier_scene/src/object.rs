//! SceneObjectRecord assembler

use atelier_geometry::try_tessellate;

use crate::color::Color;
use crate::config::{PreviewConfig, ReconstructConfig};
use crate::descriptor::{self, Fidelity, ShapeConstructor};
use crate::error::ReconstructError;
use crate::live::{
    ImportProvenance, Material, MeshBody, ObjectBody, SceneObject, ShapeSource, Transform, UnresolvedBody,
    WireframeOverlay,
};
use crate::loader::{self, CancelToken, LoadOptions, ModelLoader};
use crate::raw;
use crate::record::{NodeKind, SceneObjectRecord, WireframeStyle};

/// Snapshot one live object into a record
pub fn encode(object: &SceneObject) -> SceneObjectRecord {
    SceneObjectRecord {
        id: object.id.clone(),
        name: object.name.clone(),
        visible: object.visible,
        locked: object.locked,
        group_id: object.group_id.clone(),
        position: object.transform.position,
        rotation: object.transform.rotation,
        scale: object.transform.scale,
        color: display_color(&object.body),
        wireframe: object.wireframe.map(|w| WireframeStyle {
            visible: w.visible,
            color: w.color,
            opacity: w.opacity,
            linewidth: w.linewidth,
        }),
        geometry_descriptor: descriptor::encode(&object.body),
        raw_geometry_data: raw::capture_body(&object.body),
    }
}

/// Base colour of standard-shaded meshes, the default colour otherwise
fn display_color(body: &ObjectBody) -> Color {
    match body {
        ObjectBody::Mesh(MeshBody {
            material: Material::Standard { color },
            ..
        }) => *color,
        ObjectBody::Unresolved(unresolved) => unresolved.color,
        _ => Color::DEFAULT_OBJECT,
    }
}

/// Build a live object from a record's metadata around an already decoded body
pub fn with_metadata(record: &SceneObjectRecord, body: ObjectBody) -> SceneObject {
    SceneObject {
        id: record.id.clone(),
        name: record.name.clone(),
        transform: Transform {
            position: record.position,
            rotation: record.rotation,
            scale: record.scale,
        },
        visible: record.visible,
        locked: record.locked,
        group_id: record.group_id.clone(),
        body,
        wireframe: record.wireframe.map(|w| WireframeOverlay {
            visible: w.visible,
            color: w.color,
            opacity: w.opacity,
            linewidth: w.linewidth,
        }),
    }
}

/// Check the parts of a record the preview depends on and return the shape
/// to draw.
///
/// The raw payload is not rendered in preview, but a corrupt one marks the
/// whole record as corrupt.
pub fn decode_preview(record: &SceneObjectRecord, config: &PreviewConfig) -> Result<ShapeConstructor, ReconstructError> {
    if let Some(payload) = &record.raw_geometry_data {
        raw::validate(payload)?;
    }
    descriptor::decode(&record.geometry_descriptor, Fidelity::Preview, config)
}

fn empty_body(kind: NodeKind) -> ObjectBody {
    match kind {
        NodeKind::Group => ObjectBody::Group,
        NodeKind::Placeholder => ObjectBody::Placeholder,
    }
}

/// Reconstruct one record at full fidelity.
///
/// Primitives prefer a valid raw payload (vertex edits) over their
/// parameters, which are tessellated only up to `config.max_vertices`.
/// Custom geometry requires a valid payload. Imported models are loaded,
/// then replaced by a valid payload if one was stored. Group and placeholder
/// nodes come back as themselves.
pub async fn decode_full(
    record: &SceneObjectRecord,
    loader: &dyn ModelLoader,
    cancel: &CancelToken,
    config: &ReconstructConfig,
) -> Result<SceneObject, ReconstructError> {
    let material = Material::Standard { color: record.color };
    let constructor = descriptor::decode(&record.geometry_descriptor, Fidelity::Full, &PreviewConfig::default())?;

    let body = match constructor {
        ShapeConstructor::Empty(kind) => return Ok(with_metadata(record, empty_body(kind))),
        ShapeConstructor::Parametric(primitive) => {
            let geometry = match record.raw_geometry_data.as_ref().and_then(raw::apply) {
                Some(edited) => edited,
                None => try_tessellate(&primitive, config.max_vertices).map_err(ReconstructError::TooComplex)?,
            };
            MeshBody {
                geometry,
                source: ShapeSource::Primitive(primitive),
                material,
            }
        }
        ShapeConstructor::Raw(custom) => {
            let payload = match &record.raw_geometry_data {
                Some(payload) => payload,
                // Unmarked non-mesh node from an older document
                None if custom.vertex_count == 0 => return Ok(with_metadata(record, ObjectBody::Placeholder)),
                None => return Err(ReconstructError::MissingRawGeometry),
            };
            MeshBody {
                geometry: raw::try_apply(payload)?,
                source: ShapeSource::Custom,
                material,
            }
        }
        ShapeConstructor::Asset(imported) => {
            if cancel.is_cancelled() {
                return Err(ReconstructError::Cancelled);
            }
            let options = LoadOptions {
                scale: imported.scale,
                cancel: cancel.clone(),
            };
            let loaded = loader::load_cancellable(loader, &imported.model_path, &options)
                .await
                .map_err(|source| match source {
                    loader::LoadError::Cancelled => ReconstructError::Cancelled,
                    source => ReconstructError::AssetLoad {
                        path: imported.model_path.clone(),
                        source,
                    },
                })?;

            let geometry = match record.raw_geometry_data.as_ref().and_then(raw::apply) {
                Some(edited) => edited,
                None => loaded.geometry,
            };
            MeshBody {
                geometry,
                source: ShapeSource::Imported(ImportProvenance {
                    model_path: imported.model_path,
                    original_name: imported.original_name,
                    scale: imported.scale,
                    bounding_box: imported.bounding_box,
                }),
                material,
            }
        }
        // Preview-only
        ShapeConstructor::Placeholder { .. } => return Err(ReconstructError::UnknownDescriptor),
    };

    log::debug!("Reconstructed object {} ({})", record.id, record.geometry_descriptor.type_name());
    Ok(with_metadata(record, ObjectBody::Mesh(body)))
}

/// A flagged stand-in for a record that failed to reconstruct.
///
/// Keeps the record's transform and metadata, and its stored geometry so
/// that a later save writes it back unchanged.
pub fn unresolved(record: &SceneObjectRecord, error: &ReconstructError) -> SceneObject {
    let body = ObjectBody::Unresolved(UnresolvedBody {
        descriptor: record.geometry_descriptor.clone(),
        raw: record.raw_geometry_data.clone(),
        color: record.color,
        reason: error.to_string(),
    });
    with_metadata(record, body)
}
