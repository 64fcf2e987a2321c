//! Persisted record types - the document wire format.
//!
//! Every field added after the first document version is optional and
//! defaults on absence, so documents written by older builds still load.

use serde::{Deserialize, Serialize};

use atelier_geometry::{Aabb, BoxParams, ConeParams, CylinderParams, Primitive, SphereParams, TorusParams};

use crate::color::Color;
use crate::lenient;
use crate::live::{LightKind, NodeId};

/// Typed, storable summary of how a shape was constructed
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum GeometryDescriptor {
    Box(BoxParams),
    Sphere(SphereParams),
    Cylinder(CylinderParams),
    Cone(ConeParams),
    Torus(TorusParams),
    /// Loaded from an external model; wins over any geometric inference
    Imported(ImportedDescriptor),
    /// Geometry that matches no constructor or provenance marker
    Custom(CustomDescriptor),
    /// Unrecognised `type` tag, kept so the record still parses
    #[serde(other)]
    Unknown,
}

impl Default for GeometryDescriptor {
    fn default() -> Self {
        GeometryDescriptor::Unknown
    }
}

impl GeometryDescriptor {
    /// The wire tag of this descriptor
    pub fn type_name(&self) -> &'static str {
        match self {
            GeometryDescriptor::Box(_) => "box",
            GeometryDescriptor::Sphere(_) => "sphere",
            GeometryDescriptor::Cylinder(_) => "cylinder",
            GeometryDescriptor::Cone(_) => "cone",
            GeometryDescriptor::Torus(_) => "torus",
            GeometryDescriptor::Imported(_) => "imported",
            GeometryDescriptor::Custom(_) => "custom",
            GeometryDescriptor::Unknown => "unknown",
        }
    }

    /// The parametric primitive this descriptor names, if any
    pub fn primitive(&self) -> Option<Primitive> {
        match *self {
            GeometryDescriptor::Box(p) => Some(Primitive::Box(p)),
            GeometryDescriptor::Sphere(p) => Some(Primitive::Sphere(p)),
            GeometryDescriptor::Cylinder(p) => Some(Primitive::Cylinder(p)),
            GeometryDescriptor::Cone(p) => Some(Primitive::Cone(p)),
            GeometryDescriptor::Torus(p) => Some(Primitive::Torus(p)),
            _ => None,
        }
    }
}

impl From<Primitive> for GeometryDescriptor {
    fn from(primitive: Primitive) -> Self {
        match primitive {
            Primitive::Box(p) => GeometryDescriptor::Box(p),
            Primitive::Sphere(p) => GeometryDescriptor::Sphere(p),
            Primitive::Cylinder(p) => GeometryDescriptor::Cylinder(p),
            Primitive::Cone(p) => GeometryDescriptor::Cone(p),
            Primitive::Torus(p) => GeometryDescriptor::Torus(p),
        }
    }
}

/// Provenance of an imported model
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportedDescriptor {
    pub model_path: String,
    #[serde(default)]
    pub original_name: String,
    #[serde(default = "default_scale_factor")]
    pub scale: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounding_box: Option<Aabb>,
}

fn default_scale_factor() -> f32 {
    1.0
}

/// Live nodes that carry no geometry of their own
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Group,
    Placeholder,
}

/// Summary of free-form geometry
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CustomDescriptor {
    pub vertex_count: usize,
    pub bounding_box: Aabb,
    pub has_normals: bool,
    #[serde(rename = "hasUVs")]
    pub has_uvs: bool,
    /// Set for non-mesh nodes, which are stored without a vertex payload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node: Option<NodeKind>,
}

/// Flat vertex payload, the source of truth for vertex-level edits
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RawGeometryData {
    #[serde(default)]
    pub position: Vec<f32>,
    #[serde(default)]
    pub index: Option<Vec<u32>>,
}

/// Wireframe overlay appearance
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WireframeStyle {
    pub visible: bool,
    pub color: Color,
    pub opacity: f32,
    pub linewidth: f32,
}

impl Default for WireframeStyle {
    fn default() -> Self {
        Self {
            visible: true,
            color: Color::WHITE,
            opacity: 1.0,
            linewidth: 1.0,
        }
    }
}

/// One persisted scene object
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneObjectRecord {
    pub id: NodeId,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub group_id: Option<NodeId>,
    #[serde(default)]
    pub position: [f32; 3],
    #[serde(default)]
    pub rotation: [f32; 3],
    #[serde(default = "default_scale")]
    pub scale: [f32; 3],
    #[serde(default)]
    pub color: Color,
    #[serde(
        default,
        deserialize_with = "lenient::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub wireframe: Option<WireframeStyle>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub geometry_descriptor: GeometryDescriptor,
    #[serde(
        default,
        deserialize_with = "lenient::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub raw_geometry_data: Option<RawGeometryData>,
}

/// One persisted light.
///
/// The shadow and falloff fields are optional: minimal saves omit them and
/// decoding falls back to the light's constructor defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LightRecord {
    pub id: NodeId,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub kind: LightKind,
    #[serde(default = "default_light_position")]
    pub position: [f32; 3],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<[f32; 3]>,
    #[serde(default = "default_intensity")]
    pub intensity: f32,
    #[serde(default = "default_light_color")]
    pub color: Color,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cast_shadow: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decay: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub angle: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub penumbra: Option<f32>,
}

/// One persisted outliner group
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupRecord {
    pub id: NodeId,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_true")]
    pub expanded: bool,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub object_ids: Vec<NodeId>,
}

fn default_true() -> bool {
    true
}

fn default_scale() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}

fn default_light_position() -> [f32; 3] {
    [0.0, 1.0, 0.0]
}

fn default_intensity() -> f32 {
    1.0
}

fn default_light_color() -> Color {
    Color::WHITE
}
