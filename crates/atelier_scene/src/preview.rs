//! Preview Reconstructor
//!
//! Builds a cheap, throwaway render graph for list and card thumbnails from
//! a document alone. No asset I/O, no shared state: the same document always
//! produces an equal graph, and every call returns a fresh one.

use atelier_geometry::{Aabb, Primitive};

use crate::config::PreviewConfig;
use crate::descriptor::ShapeConstructor;
use crate::document::SceneDocument;
use crate::error::ReconstructError;
use crate::live::{Material, NodeId, Transform};
use crate::object;
use crate::record::SceneObjectRecord;

/// Shape drawn for one preview node
#[derive(Clone, Debug, PartialEq)]
pub enum PreviewShape {
    /// Real parametric geometry, segment counts clamped
    Primitive(Primitive),
    /// Unit cube standing in for imported or custom geometry
    Placeholder,
}

impl PreviewShape {
    /// The primitive the renderer tessellates for this node
    pub fn primitive(&self) -> Primitive {
        match self {
            PreviewShape::Primitive(p) => *p,
            PreviewShape::Placeholder => ShapeConstructor::PLACEHOLDER,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, PreviewShape::Placeholder)
    }
}

/// One drawable in the preview graph
#[derive(Clone, Debug, PartialEq)]
pub struct PreviewNode {
    pub record_id: NodeId,
    pub name: String,
    pub shape: PreviewShape,
    pub material: Material,
    pub transform: Transform,
    pub visible: bool,
}

/// Preview render graph
#[derive(Clone, Debug, PartialEq)]
pub struct PreviewGraph {
    pub nodes: Vec<PreviewNode>,
    /// Encloses every node, for fitting the camera
    pub framing: Aabb,
    /// Turntable speed in radians per second
    pub auto_rotate_speed: f32,
}

/// What a preview card shows
#[derive(Clone, Debug, PartialEq)]
pub enum PreviewState {
    /// The document has not arrived yet
    Loading,
    /// The document has no drawable objects; show a placeholder visual
    Empty,
    Ready(PreviewGraph),
}

impl PreviewState {
    /// Preview state for a document that may still be loading
    pub fn of(document: Option<&SceneDocument>, reconstructor: &PreviewReconstructor) -> Self {
        match document {
            Some(document) => reconstructor.reconstruct(document),
            None => PreviewState::Loading,
        }
    }

    pub fn graph(&self) -> Option<&PreviewGraph> {
        match self {
            PreviewState::Ready(graph) => Some(graph),
            _ => None,
        }
    }
}

/// Builds preview graphs with a fixed configuration
#[derive(Clone, Debug, Default)]
pub struct PreviewReconstructor {
    config: PreviewConfig,
}

impl PreviewReconstructor {
    pub fn new(config: PreviewConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PreviewConfig {
        &self.config
    }

    /// Reconstruct every object record that decodes; skip the rest.
    ///
    /// Returns [`PreviewState::Empty`] when nothing could be drawn.
    pub fn reconstruct(&self, document: &SceneDocument) -> PreviewState {
        let nodes: Vec<PreviewNode> = document
            .objects
            .iter()
            .filter_map(|record| match self.node(record) {
                Ok(node) => node,
                Err(e) => {
                    log::warn!("Skipping object {} in preview: {}", record.id, e);
                    None
                }
            })
            .collect();

        if nodes.is_empty() {
            log::debug!("Preview has no drawable objects");
            return PreviewState::Empty;
        }

        let framing = nodes
            .iter()
            .map(|n| transformed_bounds(&n.shape.primitive().local_bounds(), &n.transform))
            .fold(Aabb::EMPTY, |acc, b| acc.union(&b));

        PreviewState::Ready(PreviewGraph {
            nodes,
            framing,
            auto_rotate_speed: self.config.auto_rotate_speed,
        })
    }

    /// `None` for records with nothing to draw (groups and placeholders)
    fn node(&self, record: &SceneObjectRecord) -> Result<Option<PreviewNode>, ReconstructError> {
        let (shape, material) = match object::decode_preview(record, &self.config)? {
            ShapeConstructor::Parametric(primitive) => (
                PreviewShape::Primitive(primitive),
                Material::Standard { color: record.color },
            ),
            ShapeConstructor::Placeholder { material } => (PreviewShape::Placeholder, material),
            ShapeConstructor::Empty(_) => return Ok(None),
            // Preview decoding never defers to payloads or assets
            ShapeConstructor::Raw(_) | ShapeConstructor::Asset(_) => {
                return Err(ReconstructError::UnknownDescriptor)
            }
        };

        Ok(Some(PreviewNode {
            record_id: record.id.clone(),
            name: record.name.clone(),
            shape,
            material,
            transform: Transform {
                position: record.position,
                rotation: record.rotation,
                scale: record.scale,
            },
            visible: record.visible,
        }))
    }
}

/// World-space bounds of a local box under scale, XYZ Euler rotation and
/// translation
fn transformed_bounds(local: &Aabb, transform: &Transform) -> Aabb {
    let [rx, ry, rz] = transform.rotation;
    let (sx, cx) = rx.sin_cos();
    let (sy, cy) = ry.sin_cos();
    let (sz, cz) = rz.sin_cos();

    // Rotation matrix for intrinsic XYZ order, row-major
    let m = [
        [cy * cz, -cy * sz, sy],
        [cx * sz + sx * sy * cz, cx * cz - sx * sy * sz, -sx * cy],
        [sx * sz - cx * sy * cz, sx * cz + cx * sy * sz, cx * cy],
    ];

    let mut out = Aabb::EMPTY;
    for i in 0..8 {
        let corner = [
            (if i & 1 == 0 { local.min[0] } else { local.max[0] }) * transform.scale[0],
            (if i & 2 == 0 { local.min[1] } else { local.max[1] }) * transform.scale[1],
            (if i & 4 == 0 { local.min[2] } else { local.max[2] }) * transform.scale[2],
        ];
        let mut world = [0.0f32; 3];
        for (row, w) in m.iter().zip(world.iter_mut()) {
            *w = row[0] * corner[0] + row[1] * corner[1] + row[2] * corner[2];
        }
        out = out.expand_to_include([
            world[0] + transform.position[0],
            world[1] + transform.position[1],
            world[2] + transform.position[2],
        ]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use approx::assert_relative_eq;

    fn doc(json: &str) -> SceneDocument {
        SceneDocument::from_json(json).unwrap()
    }

    #[test]
    fn test_loading_vs_empty() {
        let reconstructor = PreviewReconstructor::default();
        assert_eq!(PreviewState::of(None, &reconstructor), PreviewState::Loading);
        assert_eq!(
            PreviewState::of(Some(&SceneDocument::default()), &reconstructor),
            PreviewState::Empty
        );
    }

    #[test]
    fn test_all_failed_is_empty() {
        let state = PreviewReconstructor::default().reconstruct(&doc(
            r#"{"objects": [{"id": "a", "geometryDescriptor": {"type": "lathe"}}]}"#,
        ));
        assert_eq!(state, PreviewState::Empty);
    }

    #[test]
    fn test_node_takes_record_transform_and_color() {
        let state = PreviewReconstructor::default().reconstruct(&doc(
            r##"{"objects": [{
                "id": "a", "name": "Crate", "color": "#ff0000",
                "position": [1, 2, 3], "scale": [2, 2, 2],
                "geometryDescriptor": {"type": "box"}
            }]}"##,
        ));
        let graph = state.graph().unwrap();
        let node = &graph.nodes[0];
        assert_eq!(node.name, "Crate");
        assert_eq!(node.material, Material::Standard { color: Color(0xff0000) });
        assert_eq!(node.transform.position, [1.0, 2.0, 3.0]);

        // Unit box scaled by 2 around (1, 2, 3)
        assert_eq!(graph.framing.min, [0.0, 1.0, 2.0]);
        assert_eq!(graph.framing.max, [2.0, 3.0, 4.0]);
        assert_relative_eq!(graph.auto_rotate_speed, 0.5);
    }

    #[test]
    fn test_rotated_framing() {
        let local = Aabb::new([-1.0, -0.5, -0.5], [1.0, 0.5, 0.5]);
        let quarter = Transform::new().with_rotation([0.0, 0.0, std::f32::consts::FRAC_PI_2]);
        let world = transformed_bounds(&local, &quarter);
        assert_relative_eq!(world.max[0], 0.5, epsilon = 1e-5);
        assert_relative_eq!(world.max[1], 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_placeholder_material() {
        let state = PreviewReconstructor::default().reconstruct(&doc(
            r#"{"objects": [{"id": "m", "geometryDescriptor": {"type": "imported", "modelPath": "/m.glb"}}]}"#,
        ));
        let node = &state.graph().unwrap().nodes[0];
        assert!(node.shape.is_placeholder());
        assert_eq!(
            node.material,
            Material::Wireframe {
                color: Color(0x4a90d9),
                opacity: 0.5
            }
        );
    }

    #[test]
    fn test_group_nodes_are_not_drawn() {
        let state = PreviewReconstructor::default().reconstruct(&doc(
            r#"{"objects": [
                {"id": "pivot", "geometryDescriptor": {"type": "custom", "node": "group"}},
                {"id": "a", "geometryDescriptor": {"type": "box"}}
            ]}"#,
        ));
        let graph = state.graph().unwrap();
        assert_eq!(graph.nodes.len(), 1);
        assert_eq!(graph.nodes[0].record_id.as_str(), "a");

        let only_group = PreviewReconstructor::default().reconstruct(&doc(
            r#"{"objects": [{"id": "pivot", "geometryDescriptor": {"type": "custom", "node": "group"}}]}"#,
        ));
        assert_eq!(only_group, PreviewState::Empty);
    }
}
