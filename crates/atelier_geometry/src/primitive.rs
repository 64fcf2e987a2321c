//! Parametric primitive shapes.
//!
//! Each parameter struct doubles as the persisted parameter summary, so the
//! field names follow the document wire format (camelCase). Every struct is
//! `#[serde(default)]`: a parameter missing from a stored summary takes the
//! constructor default, exactly like a live constructor called without it.

use serde::{Deserialize, Serialize};

use crate::bounds::Aabb;
use crate::TAU;

/// Box (cuboid) construction parameters
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BoxParams {
    pub width: f32,
    pub height: f32,
    pub depth: f32,
}

impl Default for BoxParams {
    fn default() -> Self {
        Self {
            width: 1.0,
            height: 1.0,
            depth: 1.0,
        }
    }
}

/// UV sphere construction parameters
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SphereParams {
    pub radius: f32,
    pub width_segments: u32,
    pub height_segments: u32,
}

impl Default for SphereParams {
    fn default() -> Self {
        Self {
            radius: 1.0,
            width_segments: 32,
            height_segments: 16,
        }
    }
}

/// Cylinder (possibly tapered) construction parameters
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CylinderParams {
    pub radius_top: f32,
    pub radius_bottom: f32,
    pub height: f32,
    pub radial_segments: u32,
    pub height_segments: u32,
    pub open_ended: bool,
    pub theta_start: f32,
    pub theta_length: f32,
}

impl Default for CylinderParams {
    fn default() -> Self {
        Self {
            radius_top: 1.0,
            radius_bottom: 1.0,
            height: 1.0,
            radial_segments: 32,
            height_segments: 1,
            open_ended: false,
            theta_start: 0.0,
            theta_length: TAU,
        }
    }
}

/// Cone construction parameters (a cylinder with a zero top radius)
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConeParams {
    pub radius: f32,
    pub height: f32,
    pub radial_segments: u32,
    pub height_segments: u32,
    pub open_ended: bool,
    pub theta_start: f32,
    pub theta_length: f32,
}

impl Default for ConeParams {
    fn default() -> Self {
        Self {
            radius: 1.0,
            height: 1.0,
            radial_segments: 32,
            height_segments: 1,
            open_ended: false,
            theta_start: 0.0,
            theta_length: TAU,
        }
    }
}

impl ConeParams {
    /// The equivalent cylinder, used for tessellation
    pub fn as_cylinder(&self) -> CylinderParams {
        CylinderParams {
            radius_top: 0.0,
            radius_bottom: self.radius,
            height: self.height,
            radial_segments: self.radial_segments,
            height_segments: self.height_segments,
            open_ended: self.open_ended,
            theta_start: self.theta_start,
            theta_length: self.theta_length,
        }
    }
}

/// Torus construction parameters
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TorusParams {
    pub radius: f32,
    pub tube: f32,
    pub radial_segments: u32,
    pub tubular_segments: u32,
    pub arc: f32,
}

impl Default for TorusParams {
    fn default() -> Self {
        Self {
            radius: 1.0,
            tube: 0.4,
            radial_segments: 12,
            tubular_segments: 48,
            arc: TAU,
        }
    }
}

/// Primitive family, without parameters
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Box,
    Sphere,
    Cylinder,
    Cone,
    Torus,
}

impl PrimitiveKind {
    pub fn name(&self) -> &'static str {
        match self {
            PrimitiveKind::Box => "box",
            PrimitiveKind::Sphere => "sphere",
            PrimitiveKind::Cylinder => "cylinder",
            PrimitiveKind::Cone => "cone",
            PrimitiveKind::Torus => "torus",
        }
    }

    pub fn all() -> &'static [PrimitiveKind] {
        &[
            PrimitiveKind::Box,
            PrimitiveKind::Sphere,
            PrimitiveKind::Cylinder,
            PrimitiveKind::Cone,
            PrimitiveKind::Torus,
        ]
    }
}

impl std::fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Ceilings on tessellation-control parameters.
///
/// Applying limits never raises a segment count, it only lowers counts above
/// the ceiling.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SegmentLimits {
    pub max_width_segments: u32,
    pub max_height_segments: u32,
    pub max_radial_segments: u32,
    pub max_tubular_segments: u32,
}

impl Default for SegmentLimits {
    fn default() -> Self {
        Self {
            max_width_segments: 16,
            max_height_segments: 8,
            max_radial_segments: 8,
            max_tubular_segments: 32,
        }
    }
}

/// A parametric shape as created by one of the five constructors
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Primitive {
    Box(BoxParams),
    Sphere(SphereParams),
    Cylinder(CylinderParams),
    Cone(ConeParams),
    Torus(TorusParams),
}

impl Default for Primitive {
    fn default() -> Self {
        Primitive::Box(BoxParams::default())
    }
}

impl Primitive {
    /// Default-parameter primitive of the given family
    pub fn with_defaults(kind: PrimitiveKind) -> Self {
        match kind {
            PrimitiveKind::Box => Primitive::Box(BoxParams::default()),
            PrimitiveKind::Sphere => Primitive::Sphere(SphereParams::default()),
            PrimitiveKind::Cylinder => Primitive::Cylinder(CylinderParams::default()),
            PrimitiveKind::Cone => Primitive::Cone(ConeParams::default()),
            PrimitiveKind::Torus => Primitive::Torus(TorusParams::default()),
        }
    }

    pub fn kind(&self) -> PrimitiveKind {
        match self {
            Primitive::Box(_) => PrimitiveKind::Box,
            Primitive::Sphere(_) => PrimitiveKind::Sphere,
            Primitive::Cylinder(_) => PrimitiveKind::Cylinder,
            Primitive::Cone(_) => PrimitiveKind::Cone,
            Primitive::Torus(_) => PrimitiveKind::Torus,
        }
    }

    /// Replace every unset parameter with its constructor default.
    ///
    /// A float parameter is unset when it is not finite; a segment count is
    /// unset when it is zero.
    pub fn resolved(&self) -> Self {
        match *self {
            Primitive::Box(p) => {
                let d = BoxParams::default();
                Primitive::Box(BoxParams {
                    width: or_default(p.width, d.width),
                    height: or_default(p.height, d.height),
                    depth: or_default(p.depth, d.depth),
                })
            }
            Primitive::Sphere(p) => {
                let d = SphereParams::default();
                Primitive::Sphere(SphereParams {
                    radius: or_default(p.radius, d.radius),
                    width_segments: count_or_default(p.width_segments, d.width_segments),
                    height_segments: count_or_default(p.height_segments, d.height_segments),
                })
            }
            Primitive::Cylinder(p) => {
                let d = CylinderParams::default();
                Primitive::Cylinder(CylinderParams {
                    radius_top: or_default(p.radius_top, d.radius_top),
                    radius_bottom: or_default(p.radius_bottom, d.radius_bottom),
                    height: or_default(p.height, d.height),
                    radial_segments: count_or_default(p.radial_segments, d.radial_segments),
                    height_segments: count_or_default(p.height_segments, d.height_segments),
                    open_ended: p.open_ended,
                    theta_start: or_default(p.theta_start, d.theta_start),
                    theta_length: or_default(p.theta_length, d.theta_length),
                })
            }
            Primitive::Cone(p) => {
                let d = ConeParams::default();
                Primitive::Cone(ConeParams {
                    radius: or_default(p.radius, d.radius),
                    height: or_default(p.height, d.height),
                    radial_segments: count_or_default(p.radial_segments, d.radial_segments),
                    height_segments: count_or_default(p.height_segments, d.height_segments),
                    open_ended: p.open_ended,
                    theta_start: or_default(p.theta_start, d.theta_start),
                    theta_length: or_default(p.theta_length, d.theta_length),
                })
            }
            Primitive::Torus(p) => {
                let d = TorusParams::default();
                Primitive::Torus(TorusParams {
                    radius: or_default(p.radius, d.radius),
                    tube: or_default(p.tube, d.tube),
                    radial_segments: count_or_default(p.radial_segments, d.radial_segments),
                    tubular_segments: count_or_default(p.tubular_segments, d.tubular_segments),
                    arc: or_default(p.arc, d.arc),
                })
            }
        }
    }

    /// Clamp tessellation-control parameters to the given ceilings.
    pub fn with_segment_limits(&self, limits: &SegmentLimits) -> Self {
        match *self {
            Primitive::Box(p) => Primitive::Box(p),
            Primitive::Sphere(p) => Primitive::Sphere(SphereParams {
                width_segments: p.width_segments.min(limits.max_width_segments),
                height_segments: p.height_segments.min(limits.max_height_segments),
                ..p
            }),
            Primitive::Cylinder(p) => Primitive::Cylinder(CylinderParams {
                radial_segments: p.radial_segments.min(limits.max_radial_segments),
                height_segments: p.height_segments.min(limits.max_height_segments),
                ..p
            }),
            Primitive::Cone(p) => Primitive::Cone(ConeParams {
                radial_segments: p.radial_segments.min(limits.max_radial_segments),
                height_segments: p.height_segments.min(limits.max_height_segments),
                ..p
            }),
            Primitive::Torus(p) => Primitive::Torus(TorusParams {
                radial_segments: p.radial_segments.min(limits.max_radial_segments),
                tubular_segments: p.tubular_segments.min(limits.max_tubular_segments),
                ..p
            }),
        }
    }

    /// Analytic local-space bounds, without tessellating.
    ///
    /// Partial sweeps (`thetaLength`, `arc`) still report the full extent.
    pub fn local_bounds(&self) -> Aabb {
        match self.resolved() {
            Primitive::Box(p) => Aabb::from_center_half_extents(
                [0.0; 3],
                [p.width.abs() * 0.5, p.height.abs() * 0.5, p.depth.abs() * 0.5],
            ),
            Primitive::Sphere(p) => {
                let r = p.radius.abs();
                Aabb::from_center_half_extents([0.0; 3], [r, r, r])
            }
            Primitive::Cylinder(p) => {
                let r = p.radius_top.abs().max(p.radius_bottom.abs());
                Aabb::from_center_half_extents([0.0; 3], [r, p.height.abs() * 0.5, r])
            }
            Primitive::Cone(p) => {
                let r = p.radius.abs();
                Aabb::from_center_half_extents([0.0; 3], [r, p.height.abs() * 0.5, r])
            }
            // Torus lies in the XY plane
            Primitive::Torus(p) => {
                let outer = (p.radius + p.tube).abs();
                Aabb::from_center_half_extents([0.0; 3], [outer, outer, p.tube.abs()])
            }
        }
    }

    /// Number of vertices [`crate::tessellate`] emits for this primitive,
    /// saturating at `u64::MAX`.
    pub fn vertex_count(&self) -> u64 {
        let grid = |a: usize, b: usize| (a as u64 + 1).saturating_mul(b as u64 + 1);
        match self.resolved() {
            Primitive::Box(_) => 24,
            Primitive::Sphere(p) => {
                let (w, h) = crate::tessellate::sphere_segments(&p);
                grid(w, h)
            }
            Primitive::Cylinder(p) => cylinder_vertices(&p, grid),
            Primitive::Cone(p) => cylinder_vertices(&p.as_cylinder(), grid),
            Primitive::Torus(p) => {
                let (radial, tubular) = crate::tessellate::torus_segments(&p);
                grid(radial, tubular)
            }
        }
    }

    /// Number of triangles [`crate::tessellate`] emits for this primitive.
    pub fn triangle_count(&self) -> usize {
        match self.resolved() {
            Primitive::Box(_) => 12,
            Primitive::Sphere(p) => {
                let (w, h) = crate::tessellate::sphere_segments(&p);
                w * (2 * h - 2)
            }
            Primitive::Cylinder(p) => cylinder_triangles(&p),
            Primitive::Cone(p) => cylinder_triangles(&p.as_cylinder()),
            Primitive::Torus(p) => {
                let (radial, tubular) = crate::tessellate::torus_segments(&p);
                2 * radial * tubular
            }
        }
    }
}

fn cylinder_vertices(p: &CylinderParams, grid: impl Fn(usize, usize) -> u64) -> u64 {
    let (radial, height) = crate::tessellate::cylinder_segments(p);
    let mut count = grid(radial, height);
    if !p.open_ended {
        // Per-wedge centers plus the rim
        let cap = (radial as u64).saturating_mul(2).saturating_add(1);
        if p.radius_top > 0.0 {
            count = count.saturating_add(cap);
        }
        if p.radius_bottom > 0.0 {
            count = count.saturating_add(cap);
        }
    }
    count
}

fn cylinder_triangles(p: &CylinderParams) -> usize {
    let (radial, height) = crate::tessellate::cylinder_segments(p);
    let mut count = 2 * radial * height;
    if !p.open_ended {
        if p.radius_top > 0.0 {
            count += radial;
        }
        if p.radius_bottom > 0.0 {
            count += radial;
        }
    }
    count
}

fn or_default(value: f32, default: f32) -> f32 {
    if value.is_finite() {
        value
    } else {
        default
    }
}

fn count_or_default(value: u32, default: u32) -> u32 {
    if value == 0 {
        default
    } else {
        value
    }
}
