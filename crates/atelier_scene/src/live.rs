//! Host scene graph - the live, mutable scene the editor works on.
//!
//! Provenance and appearance are typed at creation time: a mesh knows
//! whether it came from a primitive constructor, an imported asset or
//! free-form editing, and a wireframe overlay is either fully present or
//! absent. Serialization never has to probe for optional side-channel
//! fields.

use std::fmt;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use atelier_geometry::{tessellate, Aabb, BufferGeometry, Primitive};

use crate::color::Color;
use crate::document::{SceneDocument, SceneSettings};
use crate::light::LightFieldSet;
use crate::record::{GeometryDescriptor, RawGeometryData};

/// Identifier shared by live nodes and their persisted records
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Generate a fresh random identifier
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Position, Euler rotation (radians) and scale
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub position: [f32; 3],
    pub rotation: [f32; 3],
    pub scale: [f32; 3],
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}

impl Transform {
    pub fn new() -> Self {
        Self {
            position: [0.0, 0.0, 0.0],
            rotation: [0.0, 0.0, 0.0],
            scale: [1.0, 1.0, 1.0],
        }
    }

    pub fn with_position(mut self, pos: [f32; 3]) -> Self {
        self.position = pos;
        self
    }

    pub fn with_rotation(mut self, rot: [f32; 3]) -> Self {
        self.rotation = rot;
        self
    }

    pub fn with_scale(mut self, scale: [f32; 3]) -> Self {
        self.scale = scale;
        self
    }
}

/// Where an imported mesh came from, recorded when it was loaded
#[derive(Clone, Debug, PartialEq)]
pub struct ImportProvenance {
    pub model_path: String,
    pub original_name: String,
    pub scale: f32,
    pub bounding_box: Option<Aabb>,
}

impl ImportProvenance {
    pub fn new(model_path: impl Into<String>, original_name: impl Into<String>) -> Self {
        Self {
            model_path: model_path.into(),
            original_name: original_name.into(),
            scale: 1.0,
            bounding_box: None,
        }
    }
}

/// How a mesh's geometry came to be
#[derive(Clone, Debug, PartialEq)]
pub enum ShapeSource {
    /// Built by a parametric constructor; vertices may since have been edited
    Primitive(Primitive),
    /// Loaded from an external model file
    Imported(ImportProvenance),
    /// Anything else (procedural, merged, hand-built)
    Custom,
}

/// Surface material of a mesh
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Material {
    /// Lit, standard-shaded surface
    Standard { color: Color },
    /// Unlit flat color
    Basic { color: Color },
    /// Line rendering
    Wireframe { color: Color, opacity: f32 },
}

impl Default for Material {
    fn default() -> Self {
        Material::Standard {
            color: Color::DEFAULT_OBJECT,
        }
    }
}

/// Wireframe overlay drawn on top of an object
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WireframeOverlay {
    pub visible: bool,
    pub color: Color,
    pub opacity: f32,
    pub linewidth: f32,
}

impl Default for WireframeOverlay {
    fn default() -> Self {
        Self {
            visible: true,
            color: Color::WHITE,
            opacity: 1.0,
            linewidth: 1.0,
        }
    }
}

/// Drawable mesh: geometry plus the provenance and material it was built with
#[derive(Clone, Debug, PartialEq)]
pub struct MeshBody {
    pub geometry: BufferGeometry,
    pub source: ShapeSource,
    pub material: Material,
}

/// An object whose stored geometry could not be reconstructed.
///
/// The stored descriptor and payload are kept so a later save writes them
/// back unchanged instead of replacing them with an empty shape.
#[derive(Clone, Debug, PartialEq)]
pub struct UnresolvedBody {
    pub descriptor: GeometryDescriptor,
    pub raw: Option<RawGeometryData>,
    pub color: Color,
    pub reason: String,
}

/// What a scene object is
#[derive(Clone, Debug, PartialEq)]
pub enum ObjectBody {
    Mesh(MeshBody),
    /// Pure transform node
    Group,
    /// Non-drawable stand-in
    Placeholder,
    /// Flagged placeholder for a failed reconstruction
    Unresolved(UnresolvedBody),
}

impl ObjectBody {
    pub fn as_mesh(&self) -> Option<&MeshBody> {
        match self {
            ObjectBody::Mesh(mesh) => Some(mesh),
            _ => None,
        }
    }

    pub fn as_mesh_mut(&mut self) -> Option<&mut MeshBody> {
        match self {
            ObjectBody::Mesh(mesh) => Some(mesh),
            _ => None,
        }
    }
}

/// A scene object with all its properties.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneObject {
    /// Unique identifier
    pub id: NodeId,
    /// Display name
    pub name: String,
    /// Local transform
    pub transform: Transform,
    /// Whether object is visible
    pub visible: bool,
    /// Whether object is locked (cannot be selected/edited)
    pub locked: bool,
    /// Owning group, if any
    pub group_id: Option<NodeId>,
    pub body: ObjectBody,
    pub wireframe: Option<WireframeOverlay>,
}

impl SceneObject {
    pub fn new(name: impl Into<String>, body: ObjectBody) -> Self {
        Self {
            id: NodeId::new(),
            name: name.into(),
            transform: Transform::new(),
            visible: true,
            locked: false,
            group_id: None,
            body,
            wireframe: None,
        }
    }

    /// Mesh built by a parametric constructor
    pub fn primitive(name: impl Into<String>, primitive: Primitive) -> Self {
        let primitive = primitive.resolved();
        Self::new(
            name,
            ObjectBody::Mesh(MeshBody {
                geometry: tessellate(&primitive),
                source: ShapeSource::Primitive(primitive),
                material: Material::default(),
            }),
        )
    }

    /// Mesh loaded from an external model
    pub fn imported(name: impl Into<String>, provenance: ImportProvenance, geometry: BufferGeometry) -> Self {
        Self::new(
            name,
            ObjectBody::Mesh(MeshBody {
                geometry,
                source: ShapeSource::Imported(provenance),
                material: Material::default(),
            }),
        )
    }

    /// Mesh with free-form geometry
    pub fn custom(name: impl Into<String>, geometry: BufferGeometry) -> Self {
        Self::new(
            name,
            ObjectBody::Mesh(MeshBody {
                geometry,
                source: ShapeSource::Custom,
                material: Material::default(),
            }),
        )
    }

    pub fn with_id(mut self, id: impl Into<NodeId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_material(mut self, material: Material) -> Self {
        if let ObjectBody::Mesh(mesh) = &mut self.body {
            mesh.material = material;
        }
        self
    }

    pub fn with_color(self, color: Color) -> Self {
        self.with_material(Material::Standard { color })
    }

    pub fn with_wireframe(mut self, overlay: WireframeOverlay) -> Self {
        self.wireframe = Some(overlay);
        self
    }

    pub fn in_group(mut self, group: &NodeId) -> Self {
        self.group_id = Some(group.clone());
        self
    }

    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    pub fn with_locked(mut self, locked: bool) -> Self {
        self.locked = locked;
        self
    }

    pub fn is_unresolved(&self) -> bool {
        matches!(self.body, ObjectBody::Unresolved(_))
    }
}

/// Light family
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LightKind {
    Directional,
    Point,
    Spot,
}

impl LightKind {
    /// Whether the light aims at a target point
    pub fn is_targeted(&self) -> bool {
        matches!(self, LightKind::Directional | LightKind::Spot)
    }

    /// Whether the light attenuates with distance
    pub fn has_falloff(&self) -> bool {
        matches!(self, LightKind::Point | LightKind::Spot)
    }
}

/// A light source, with renderer constructor defaults
#[derive(Clone, Debug, PartialEq)]
pub struct Light {
    pub id: NodeId,
    pub name: String,
    pub kind: LightKind,
    pub position: [f32; 3],
    pub target: [f32; 3],
    pub intensity: f32,
    pub color: Color,
    pub visible: bool,
    pub cast_shadow: bool,
    pub distance: f32,
    pub decay: f32,
    pub angle: f32,
    pub penumbra: f32,
}

impl Light {
    pub fn new(kind: LightKind) -> Self {
        Self {
            id: NodeId::new(),
            name: String::new(),
            kind,
            position: [0.0, 1.0, 0.0],
            target: [0.0, 0.0, 0.0],
            intensity: 1.0,
            color: Color::WHITE,
            visible: true,
            cast_shadow: false,
            distance: 0.0,
            decay: 2.0,
            angle: std::f32::consts::FRAC_PI_3,
            penumbra: 0.0,
        }
    }

    pub fn directional(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::new(LightKind::Directional)
        }
    }

    pub fn point(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::new(LightKind::Point)
        }
    }

    pub fn spot(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::new(LightKind::Spot)
        }
    }
}

/// Named collection of objects in the outliner
#[derive(Clone, Debug, PartialEq)]
pub struct Group {
    pub id: NodeId,
    pub name: String,
    pub expanded: bool,
    pub visible: bool,
    pub locked: bool,
    pub object_ids: Vec<NodeId>,
}

impl Group {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: NodeId::new(),
            name: name.into(),
            expanded: true,
            visible: true,
            locked: false,
            object_ids: Vec::new(),
        }
    }
}

/// Everything the live scene holds
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SceneGraph {
    pub objects: Vec<SceneObject>,
    pub lights: Vec<Light>,
    pub groups: Vec<Group>,
    pub settings: SceneSettings,
    pub slides: Option<serde_json::Value>,
    pub presentation_settings: Option<serde_json::Value>,
}

impl SceneGraph {
    pub fn object(&self, id: &NodeId) -> Option<&SceneObject> {
        self.objects.iter().find(|o| &o.id == id)
    }

    pub fn group(&self, id: &NodeId) -> Option<&Group> {
        self.groups.iter().find(|g| &g.id == id)
    }
}

/// Shared, lockable host scene.
///
/// Mutations take the write lock; [`LiveScene::snapshot`] holds the read lock
/// for the whole record-building pass, so a snapshot never observes a
/// half-applied edit even when editors run on other threads.
#[derive(Debug, Default)]
pub struct LiveScene {
    graph: RwLock<SceneGraph>,
}

impl LiveScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_graph(graph: SceneGraph) -> Self {
        Self {
            graph: RwLock::new(graph),
        }
    }

    /// Add an object, keeping its group's membership list in sync
    /// Add an object, returning its id.
    ///
    /// An object whose id is already taken is given a fresh one.
    pub fn add_object(&self, mut object: SceneObject) -> NodeId {
        let mut graph = self.graph.write();
        if graph.object(&object.id).is_some() {
            let fresh = NodeId::new();
            log::warn!("Object id {} already in scene; using {}", object.id, fresh);
            object.id = fresh;
        }
        let id = object.id.clone();
        if let Some(group_id) = &object.group_id {
            if let Some(group) = graph.groups.iter_mut().find(|g| &g.id == group_id) {
                if !group.object_ids.contains(&id) {
                    group.object_ids.push(id.clone());
                }
            }
        }
        graph.objects.push(object);
        id
    }

    pub fn add_light(&self, light: Light) -> NodeId {
        let id = light.id.clone();
        self.graph.write().lights.push(light);
        id
    }

    pub fn add_group(&self, group: Group) -> NodeId {
        let id = group.id.clone();
        self.graph.write().groups.push(group);
        id
    }

    /// Remove an object and its group membership
    pub fn remove_object(&self, id: &NodeId) -> Option<SceneObject> {
        let mut graph = self.graph.write();
        let idx = graph.objects.iter().position(|o| &o.id == id)?;
        for group in graph.groups.iter_mut() {
            group.object_ids.retain(|member| member != id);
        }
        Some(graph.objects.remove(idx))
    }

    /// Edit one object in place. Returns `None` if it does not exist.
    pub fn update_object<R>(&self, id: &NodeId, f: impl FnOnce(&mut SceneObject) -> R) -> Option<R> {
        let mut graph = self.graph.write();
        graph.objects.iter_mut().find(|o| &o.id == id).map(f)
    }

    pub fn object(&self, id: &NodeId) -> Option<SceneObject> {
        self.graph.read().object(id).cloned()
    }

    pub fn object_count(&self) -> usize {
        self.graph.read().objects.len()
    }

    /// Run a closure against the graph under the read lock
    pub fn read<R>(&self, f: impl FnOnce(&SceneGraph) -> R) -> R {
        f(&self.graph.read())
    }

    /// Run a closure against the graph under the write lock
    pub fn write<R>(&self, f: impl FnOnce(&mut SceneGraph) -> R) -> R {
        f(&mut self.graph.write())
    }

    /// Replace the whole graph, returning the previous one
    pub fn replace(&self, graph: SceneGraph) -> SceneGraph {
        std::mem::replace(&mut *self.graph.write(), graph)
    }

    /// Atomic snapshot of the current state as a persistable document
    pub fn snapshot(&self, fields: LightFieldSet) -> SceneDocument {
        let graph = self.graph.read();
        SceneDocument::assemble(&graph, fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atelier_geometry::{BoxParams, SphereParams};

    #[test]
    fn test_primitive_object_resolves_parameters() {
        let object = SceneObject::primitive(
            "Ball",
            Primitive::Sphere(SphereParams {
                radius: f32::INFINITY,
                width_segments: 8,
                height_segments: 0,
            }),
        );
        let mesh = object.body.as_mesh().unwrap();
        assert_eq!(
            mesh.source,
            ShapeSource::Primitive(Primitive::Sphere(SphereParams {
                radius: 1.0,
                width_segments: 8,
                height_segments: 16,
            }))
        );
        assert!(mesh.geometry.vertex_count() > 0);
    }

    #[test]
    fn test_group_membership_tracks_objects() {
        let scene = LiveScene::new();
        let group_id = scene.add_group(Group::new("Props"));
        let id = scene.add_object(
            SceneObject::primitive("Crate", Primitive::Box(BoxParams::default())).in_group(&group_id),
        );

        scene.read(|g| assert_eq!(g.group(&group_id).unwrap().object_ids, vec![id.clone()]));

        scene.remove_object(&id).unwrap();
        scene.read(|g| assert!(g.group(&group_id).unwrap().object_ids.is_empty()));
        assert_eq!(scene.object_count(), 0);
    }

    #[test]
    fn test_duplicate_object_id_gets_fresh_id() {
        let scene = LiveScene::new();
        let first = scene.add_object(SceneObject::primitive("A", Primitive::default()).with_id("x"));
        let second = scene.add_object(SceneObject::primitive("B", Primitive::default()).with_id("x"));

        assert_eq!(first, NodeId::from("x"));
        assert_ne!(second, first);
        assert_eq!(scene.object(&second).unwrap().name, "B");

        let doc = scene.snapshot(LightFieldSet::Extended);
        assert_eq!(doc.objects.len(), 2);
        assert!(doc.validate().is_empty());
    }

    #[test]
    fn test_update_object() {
        let scene = LiveScene::new();
        let id = scene.add_object(SceneObject::primitive("Crate", Primitive::default()));
        let moved = scene.update_object(&id, |o| {
            o.transform.position = [1.0, 2.0, 3.0];
        });
        assert!(moved.is_some());
        assert_eq!(scene.object(&id).unwrap().transform.position, [1.0, 2.0, 3.0]);
        assert!(scene.update_object(&NodeId::from("missing"), |_| ()).is_none());
    }

    #[test]
    fn test_light_defaults() {
        let spot = Light::spot("Key");
        assert_eq!(spot.intensity, 1.0);
        assert_eq!(spot.decay, 2.0);
        assert_eq!(spot.color, Color::WHITE);
        assert!(!spot.cast_shadow);
        assert!(spot.kind.is_targeted() && spot.kind.has_falloff());
        assert!(!LightKind::Point.is_targeted());
    }
}
