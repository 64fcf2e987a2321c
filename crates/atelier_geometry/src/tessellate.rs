//! Primitive tessellation.
//!
//! Every generator emits an indexed triangle list with per-vertex normals and
//! UVs. Vertex layouts follow the usual web-renderer conventions (Y up, seams
//! duplicated so UVs stay continuous) so that a tessellated primitive and a
//! hand-edited copy of it share vertex numbering.

use std::f32::consts::PI;

use crate::buffer::BufferGeometry;
use crate::error::{GeometryError, Result};
use crate::primitive::{BoxParams, CylinderParams, Primitive, SphereParams, TorusParams};

/// Tessellate a primitive into buffer geometry.
///
/// Unset parameters are resolved to constructor defaults first.
pub fn tessellate(primitive: &Primitive) -> BufferGeometry {
    let geometry = match primitive.resolved() {
        Primitive::Box(p) => generate_box(&p),
        Primitive::Sphere(p) => generate_sphere(&p),
        Primitive::Cylinder(p) => generate_cylinder(&p),
        Primitive::Cone(p) => generate_cylinder(&p.as_cylinder()),
        Primitive::Torus(p) => generate_torus(&p),
    };
    log::trace!(
        "Tessellated {} into {} triangles",
        primitive.kind(),
        geometry.triangle_count()
    );
    geometry
}

/// Tessellate a primitive whose parameters come from an untrusted source.
///
/// Refuses primitives that would emit more than `max_vertices` vertices.
/// The ceiling never exceeds what a `u32` index buffer can address.
pub fn try_tessellate(primitive: &Primitive, max_vertices: u64) -> Result<BufferGeometry> {
    let max = max_vertices.min(u32::MAX as u64);
    let count = primitive.vertex_count();
    if count > max {
        return Err(GeometryError::TooManyVertices { count, max });
    }
    Ok(tessellate(primitive))
}

/// Effective (width, height) segment counts after lower bounds
pub(crate) fn sphere_segments(p: &SphereParams) -> (usize, usize) {
    (p.width_segments.max(3) as usize, p.height_segments.max(2) as usize)
}

/// Effective (radial, height) segment counts after lower bounds
pub(crate) fn cylinder_segments(p: &CylinderParams) -> (usize, usize) {
    (p.radial_segments.max(3) as usize, p.height_segments.max(1) as usize)
}

/// Effective (radial, tubular) segment counts after lower bounds
pub(crate) fn torus_segments(p: &TorusParams) -> (usize, usize) {
    (p.radial_segments.max(2) as usize, p.tubular_segments.max(3) as usize)
}

#[derive(Default)]
struct Builder {
    positions: Vec<f32>,
    normals: Vec<f32>,
    uvs: Vec<f32>,
    indices: Vec<u32>,
}

impl Builder {
    fn vertex(&mut self, p: [f32; 3], n: [f32; 3], uv: [f32; 2]) -> u32 {
        let idx = (self.positions.len() / 3) as u32;
        self.positions.extend_from_slice(&p);
        self.normals.extend_from_slice(&n);
        self.uvs.extend_from_slice(&uv);
        idx
    }

    fn triangle(&mut self, a: u32, b: u32, c: u32) {
        self.indices.extend_from_slice(&[a, b, c]);
    }

    fn finish(self) -> BufferGeometry {
        BufferGeometry {
            position: Some(self.positions),
            normal: Some(self.normals),
            uv: Some(self.uvs),
            index: Some(self.indices),
        }
    }
}

/// Generate box geometry, one quad per face so each face has its own normals
fn generate_box(p: &BoxParams) -> BufferGeometry {
    let (hx, hy, hz) = (p.width * 0.5, p.height * 0.5, p.depth * 0.5);
    let mut b = Builder::default();

    // (normal, four corners counter-clockwise seen from outside)
    let faces: [([f32; 3], [[f32; 3]; 4]); 6] = [
        ([1.0, 0.0, 0.0], [[hx, -hy, hz], [hx, -hy, -hz], [hx, hy, -hz], [hx, hy, hz]]),
        ([-1.0, 0.0, 0.0], [[-hx, -hy, -hz], [-hx, -hy, hz], [-hx, hy, hz], [-hx, hy, -hz]]),
        ([0.0, 1.0, 0.0], [[-hx, hy, hz], [hx, hy, hz], [hx, hy, -hz], [-hx, hy, -hz]]),
        ([0.0, -1.0, 0.0], [[-hx, -hy, -hz], [hx, -hy, -hz], [hx, -hy, hz], [-hx, -hy, hz]]),
        ([0.0, 0.0, 1.0], [[-hx, -hy, hz], [hx, -hy, hz], [hx, hy, hz], [-hx, hy, hz]]),
        ([0.0, 0.0, -1.0], [[hx, -hy, -hz], [-hx, -hy, -hz], [-hx, hy, -hz], [hx, hy, -hz]]),
    ];
    let uvs = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];

    for (normal, corners) in faces.iter() {
        let first = b.vertex(corners[0], *normal, uvs[0]);
        for k in 1..4 {
            b.vertex(corners[k], *normal, uvs[k]);
        }
        b.triangle(first, first + 1, first + 2);
        b.triangle(first, first + 2, first + 3);
    }

    b.finish()
}

/// Generate a UV sphere. Pole rows emit a single triangle per segment.
fn generate_sphere(p: &SphereParams) -> BufferGeometry {
    let (w, h) = sphere_segments(p);
    let mut b = Builder::default();

    for iy in 0..=h {
        let v = iy as f32 / h as f32;
        for ix in 0..=w {
            let u = ix as f32 / w as f32;
            let (sin_phi, cos_phi) = (v * PI).sin_cos();
            let (sin_theta, cos_theta) = (u * 2.0 * PI).sin_cos();

            let n = [-cos_theta * sin_phi, cos_phi, sin_theta * sin_phi];
            b.vertex(
                [n[0] * p.radius, n[1] * p.radius, n[2] * p.radius],
                n,
                [u, 1.0 - v],
            );
        }
    }

    let row = (w + 1) as u32;
    for iy in 0..h as u32 {
        for ix in 0..w as u32 {
            let a = iy * row + ix + 1;
            let bb = iy * row + ix;
            let c = (iy + 1) * row + ix;
            let d = (iy + 1) * row + ix + 1;

            if iy != 0 {
                b.triangle(a, bb, d);
            }
            if iy as usize != h - 1 {
                b.triangle(bb, c, d);
            }
        }
    }

    b.finish()
}

/// Generate a (possibly tapered, possibly partial) cylinder
fn generate_cylinder(p: &CylinderParams) -> BufferGeometry {
    let (radial, height_segs) = cylinder_segments(p);
    let half = p.height * 0.5;
    let slope = if p.height.abs() > f32::EPSILON {
        (p.radius_bottom - p.radius_top) / p.height
    } else {
        0.0
    };
    let mut b = Builder::default();

    // Torso
    let row = (radial + 1) as u32;
    for y in 0..=height_segs {
        let v = y as f32 / height_segs as f32;
        let radius = v * (p.radius_bottom - p.radius_top) + p.radius_top;
        for x in 0..=radial {
            let u = x as f32 / radial as f32;
            let theta = u * p.theta_length + p.theta_start;
            let (sin_t, cos_t) = theta.sin_cos();

            let n = normalize([sin_t, slope, cos_t]);
            b.vertex(
                [radius * sin_t, -v * p.height + half, radius * cos_t],
                n,
                [u, 1.0 - v],
            );
        }
    }
    for x in 0..radial as u32 {
        for y in 0..height_segs as u32 {
            let a = y * row + x;
            let bb = (y + 1) * row + x;
            let c = (y + 1) * row + x + 1;
            let d = y * row + x + 1;
            b.triangle(a, bb, d);
            b.triangle(bb, c, d);
        }
    }

    if !p.open_ended {
        if p.radius_top > 0.0 {
            generate_cap(&mut b, p, radial, true);
        }
        if p.radius_bottom > 0.0 {
            generate_cap(&mut b, p, radial, false);
        }
    }

    b.finish()
}

fn generate_cap(b: &mut Builder, p: &CylinderParams, radial: usize, top: bool) {
    let (radius, sign) = if top {
        (p.radius_top, 1.0)
    } else {
        (p.radius_bottom, -1.0)
    };
    let y = p.height * 0.5 * sign;
    let normal = [0.0, sign, 0.0];

    // One center vertex per segment keeps UVs independent per wedge
    let center_start = (b.positions.len() / 3) as u32;
    for x in 1..=radial {
        let u = x as f32 / radial as f32;
        b.vertex([0.0, y, 0.0], normal, [u, if top { 1.0 } else { 0.0 }]);
    }

    let ring_start = (b.positions.len() / 3) as u32;
    for x in 0..=radial {
        let u = x as f32 / radial as f32;
        let theta = u * p.theta_length + p.theta_start;
        let (sin_t, cos_t) = theta.sin_cos();
        b.vertex(
            [radius * sin_t, y, radius * cos_t],
            normal,
            [cos_t * 0.5 + 0.5, sin_t * 0.5 * sign + 0.5],
        );
    }

    for x in 0..radial as u32 {
        let c = center_start + x;
        let i = ring_start + x;
        if top {
            b.triangle(i, i + 1, c);
        } else {
            b.triangle(i + 1, i, c);
        }
    }
}

/// Generate a torus lying in the XY plane
fn generate_torus(p: &TorusParams) -> BufferGeometry {
    let (radial, tubular) = torus_segments(p);
    let mut b = Builder::default();

    for j in 0..=radial {
        for i in 0..=tubular {
            let u = i as f32 / tubular as f32 * p.arc;
            let v = j as f32 / radial as f32 * 2.0 * PI;
            let (sin_u, cos_u) = u.sin_cos();
            let (sin_v, cos_v) = v.sin_cos();

            let pos = [
                (p.radius + p.tube * cos_v) * cos_u,
                (p.radius + p.tube * cos_v) * sin_u,
                p.tube * sin_v,
            ];
            let center = [p.radius * cos_u, p.radius * sin_u, 0.0];
            let n = normalize([pos[0] - center[0], pos[1] - center[1], pos[2] - center[2]]);

            b.vertex(pos, n, [i as f32 / tubular as f32, j as f32 / radial as f32]);
        }
    }

    let row = (tubular + 1) as u32;
    for j in 1..=radial as u32 {
        for i in 1..=tubular as u32 {
            let a = row * j + i - 1;
            let bb = row * (j - 1) + i - 1;
            let c = row * (j - 1) + i;
            let d = row * j + i;
            b.triangle(a, bb, d);
            b.triangle(bb, c, d);
        }
    }

    b.finish()
}

fn normalize(v: [f32; 3]) -> [f32; 3] {
    let len = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    if len > 1e-12 {
        [v[0] / len, v[1] / len, v[2] / len]
    } else {
        v
    }
}
