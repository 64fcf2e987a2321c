//! GeometryDescriptor codec
//!
//! Maps a live shape to its storable summary and back to a shape
//! constructor at a chosen fidelity.

use atelier_geometry::{tessellate, Aabb, BoxParams, BufferGeometry, Primitive};

use crate::color::Color;
use crate::config::PreviewConfig;
use crate::error::ReconstructError;
use crate::live::{Material, ObjectBody, ShapeSource};
use crate::record::{CustomDescriptor, GeometryDescriptor, ImportedDescriptor, NodeKind};

/// Reconstruction quality tier
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Fidelity {
    /// Bounded cost, never touches assets
    Preview,
    /// Exact, may load assets
    Full,
}

/// What to build for a decoded descriptor
#[derive(Clone, Debug, PartialEq)]
pub enum ShapeConstructor {
    /// Tessellate these parameters
    Parametric(Primitive),
    /// Unit cube with a translucent wireframe, standing in for geometry the
    /// preview does not reproduce
    Placeholder { material: Material },
    /// Rebuild from the record's raw vertex payload
    Raw(CustomDescriptor),
    /// Load through the asset loader
    Asset(ImportedDescriptor),
    /// Nothing to draw: a group or placeholder node
    Empty(NodeKind),
}

impl ShapeConstructor {
    /// The fixed placeholder shape
    pub const PLACEHOLDER: Primitive = Primitive::Box(BoxParams {
        width: 1.0,
        height: 1.0,
        depth: 1.0,
    });

    /// The primitive to tessellate, when the shape can be built without a
    /// payload or asset
    pub fn primitive(&self) -> Option<Primitive> {
        match self {
            ShapeConstructor::Parametric(p) => Some(*p),
            ShapeConstructor::Placeholder { .. } => Some(Self::PLACEHOLDER),
            ShapeConstructor::Raw(_) | ShapeConstructor::Asset(_) | ShapeConstructor::Empty(_) => None,
        }
    }

    pub fn build(&self) -> Option<BufferGeometry> {
        self.primitive().map(|p| tessellate(&p))
    }
}

/// Summarize a live object body.
///
/// Import provenance wins regardless of the current vertices. Never fails:
/// bodies without geometry summarize as zero-vertex custom geometry.
pub fn encode(body: &ObjectBody) -> GeometryDescriptor {
    match body {
        ObjectBody::Mesh(mesh) => match &mesh.source {
            ShapeSource::Imported(provenance) => GeometryDescriptor::Imported(ImportedDescriptor {
                model_path: provenance.model_path.clone(),
                original_name: provenance.original_name.clone(),
                scale: provenance.scale,
                bounding_box: provenance.bounding_box,
            }),
            ShapeSource::Primitive(primitive) => primitive.resolved().into(),
            ShapeSource::Custom => GeometryDescriptor::Custom(summarize(&mesh.geometry)),
        },
        ObjectBody::Unresolved(unresolved) => unresolved.descriptor.clone(),
        ObjectBody::Group => empty_node(NodeKind::Group),
        ObjectBody::Placeholder => empty_node(NodeKind::Placeholder),
    }
}

fn empty_node(kind: NodeKind) -> GeometryDescriptor {
    GeometryDescriptor::Custom(CustomDescriptor {
        node: Some(kind),
        ..Default::default()
    })
}

/// Custom summary of arbitrary geometry
pub fn summarize(geometry: &BufferGeometry) -> CustomDescriptor {
    CustomDescriptor {
        vertex_count: geometry.vertex_count(),
        bounding_box: Aabb::from_positions(geometry.positions()),
        has_normals: geometry.has_normals(),
        has_uvs: geometry.has_uvs(),
        node: None,
    }
}

/// Turn a descriptor into a shape constructor.
///
/// Preview clamps segment counts to the configured ceilings and swaps
/// imported and custom geometry for tinted placeholders. Full honours the
/// stored parameters verbatim. Marked non-mesh nodes decode to
/// [`ShapeConstructor::Empty`] at both fidelities.
pub fn decode(
    descriptor: &GeometryDescriptor,
    fidelity: Fidelity,
    preview: &PreviewConfig,
) -> Result<ShapeConstructor, ReconstructError> {
    if let Some(primitive) = descriptor.primitive() {
        return Ok(match fidelity {
            Fidelity::Preview => ShapeConstructor::Parametric(primitive.with_segment_limits(&preview.limits())),
            Fidelity::Full => ShapeConstructor::Parametric(primitive),
        });
    }

    if let GeometryDescriptor::Custom(CustomDescriptor { node: Some(kind), .. }) = descriptor {
        return Ok(ShapeConstructor::Empty(*kind));
    }

    match (descriptor, fidelity) {
        (GeometryDescriptor::Imported(_), Fidelity::Preview) => Ok(placeholder(preview.imported_tint, preview)),
        (GeometryDescriptor::Custom(_), Fidelity::Preview) => Ok(placeholder(preview.custom_tint, preview)),
        (GeometryDescriptor::Imported(imported), Fidelity::Full) => Ok(ShapeConstructor::Asset(imported.clone())),
        (GeometryDescriptor::Custom(custom), Fidelity::Full) => Ok(ShapeConstructor::Raw(custom.clone())),
        _ => Err(ReconstructError::UnknownDescriptor),
    }
}

fn placeholder(tint: Color, preview: &PreviewConfig) -> ShapeConstructor {
    ShapeConstructor::Placeholder {
        material: Material::Wireframe {
            color: tint,
            opacity: preview.placeholder_opacity,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::live::{ImportProvenance, SceneObject};
    use atelier_geometry::{ConeParams, CylinderParams, SphereParams, TorusParams};

    fn all_primitives() -> Vec<Primitive> {
        vec![
            Primitive::Box(BoxParams {
                width: 2.0,
                height: 3.0,
                depth: 4.0,
            }),
            Primitive::Sphere(SphereParams {
                radius: 0.5,
                width_segments: 12,
                height_segments: 6,
            }),
            Primitive::Cylinder(CylinderParams {
                radius_top: 0.25,
                radius_bottom: 0.75,
                height: 2.0,
                radial_segments: 20,
                height_segments: 3,
                open_ended: true,
                theta_start: 0.5,
                theta_length: 3.0,
            }),
            Primitive::Cone(ConeParams {
                radius: 1.5,
                height: 3.0,
                radial_segments: 10,
                ..Default::default()
            }),
            Primitive::Torus(TorusParams {
                radius: 2.0,
                tube: 0.5,
                radial_segments: 10,
                tubular_segments: 64,
                arc: 4.0,
            }),
        ]
    }

    #[test]
    fn test_parametric_roundtrip_full() {
        for primitive in all_primitives() {
            let object = SceneObject::primitive("p", primitive);
            let descriptor = encode(&object.body);
            let decoded = decode(&descriptor, Fidelity::Full, &PreviewConfig::default()).unwrap();
            assert_eq!(decoded, ShapeConstructor::Parametric(primitive));
        }
    }

    #[test]
    fn test_box_wire_form() {
        let object = SceneObject::primitive(
            "b",
            Primitive::Box(BoxParams {
                width: 2.0,
                height: 3.0,
                depth: 4.0,
            }),
        );
        let json = serde_json::to_value(encode(&object.body)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "box", "width": 2.0, "height": 3.0, "depth": 4.0})
        );
    }

    #[test]
    fn test_preview_clamps_segments() {
        let descriptor = GeometryDescriptor::Sphere(SphereParams {
            radius: 1.0,
            width_segments: 128,
            height_segments: 64,
        });
        let decoded = decode(&descriptor, Fidelity::Preview, &PreviewConfig::default()).unwrap();
        match decoded {
            ShapeConstructor::Parametric(Primitive::Sphere(p)) => {
                assert!(p.width_segments <= 16);
                assert!(p.height_segments <= 8);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_preview_placeholders_are_tinted() {
        let config = PreviewConfig::default();
        let imported = GeometryDescriptor::Imported(ImportedDescriptor {
            model_path: "/models/chair.glb".into(),
            original_name: "chair.glb".into(),
            scale: 1.0,
            bounding_box: None,
        });
        let custom = GeometryDescriptor::Custom(CustomDescriptor::default());

        let a = decode(&imported, Fidelity::Preview, &config).unwrap();
        let b = decode(&custom, Fidelity::Preview, &config).unwrap();
        assert_eq!(
            a,
            ShapeConstructor::Placeholder {
                material: Material::Wireframe {
                    color: Color(0x4a90d9),
                    opacity: 0.5
                }
            }
        );
        assert_ne!(a, b);
        assert_eq!(a.primitive(), Some(ShapeConstructor::PLACEHOLDER));
        assert_eq!(b.primitive(), Some(ShapeConstructor::PLACEHOLDER));
    }

    #[test]
    fn test_full_defers_custom_and_imported() {
        let config = PreviewConfig::default();
        let custom = GeometryDescriptor::Custom(CustomDescriptor::default());
        assert!(matches!(
            decode(&custom, Fidelity::Full, &config).unwrap(),
            ShapeConstructor::Raw(_)
        ));
        assert!(decode(&custom, Fidelity::Full, &config).unwrap().build().is_none());
    }

    #[test]
    fn test_unknown_descriptor_fails() {
        for fidelity in [Fidelity::Preview, Fidelity::Full] {
            assert!(matches!(
                decode(&GeometryDescriptor::Unknown, fidelity, &PreviewConfig::default()),
                Err(ReconstructError::UnknownDescriptor)
            ));
        }
    }

    #[test]
    fn test_imported_wins_over_vertices() {
        let mut geometry = tessellate(&Primitive::default());
        geometry.scale(3.0);
        let object = SceneObject::imported("Chair", ImportProvenance::new("/m/chair.glb", "chair.glb"), geometry);
        assert_eq!(encode(&object.body).type_name(), "imported");
    }

    #[test]
    fn test_group_body_is_marked_empty_custom() {
        match encode(&ObjectBody::Group) {
            GeometryDescriptor::Custom(c) => {
                assert_eq!(c.vertex_count, 0);
                assert_eq!(c.bounding_box, Aabb::ZERO);
                assert_eq!(c.node, Some(NodeKind::Group));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_non_mesh_nodes_decode_empty() {
        let config = PreviewConfig::default();
        for (body, kind) in [
            (ObjectBody::Group, NodeKind::Group),
            (ObjectBody::Placeholder, NodeKind::Placeholder),
        ] {
            let descriptor = encode(&body);
            for fidelity in [Fidelity::Preview, Fidelity::Full] {
                let decoded = decode(&descriptor, fidelity, &config).unwrap();
                assert_eq!(decoded, ShapeConstructor::Empty(kind));
                assert!(decoded.build().is_none());
            }
        }
    }
}
