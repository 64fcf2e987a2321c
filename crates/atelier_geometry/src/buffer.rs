//! Flat vertex/index buffer geometry.
//!
//! Attributes are stored flattened (`[x, y, z, x, y, z, ...]`), the same
//! layout the raw geometry payload uses on the wire.

use crate::bounds::Aabb;
use crate::error::{GeometryError, Result};

/// Buffer geometry with optional attributes
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BufferGeometry {
    /// Flat positions, `None` when the geometry has no position attribute
    pub position: Option<Vec<f32>>,
    /// Flat normals (3 per vertex)
    pub normal: Option<Vec<f32>>,
    /// Flat texture coordinates (2 per vertex)
    pub uv: Option<Vec<f32>>,
    /// Triangle list indices
    pub index: Option<Vec<u32>>,
}

impl BufferGeometry {
    /// Geometry with no attributes at all
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild geometry from a raw position buffer and optional index buffer.
    ///
    /// The position buffer must be non-empty, a multiple of three long and
    /// finite; every index must reference an existing vertex. Normals are
    /// recomputed from the triangles.
    pub fn from_raw(position: Vec<f32>, index: Option<Vec<u32>>) -> Result<Self> {
        Self::validate_raw(&position, index.as_deref())?;

        let mut geometry = Self {
            position: Some(position),
            normal: None,
            uv: None,
            index,
        };
        geometry.compute_vertex_normals();
        Ok(geometry)
    }

    /// Check a raw position/index pair without building anything.
    pub fn validate_raw(position: &[f32], index: Option<&[u32]>) -> Result<()> {
        if position.is_empty() {
            return Err(GeometryError::EmptyPositions);
        }
        if position.len() % 3 != 0 {
            return Err(GeometryError::InvalidStride(position.len()));
        }
        if let Some(bad) = position.iter().position(|v| !v.is_finite()) {
            return Err(GeometryError::NonFinitePosition(bad));
        }

        let vertex_count = position.len() / 3;
        if let Some(&bad) = index.unwrap_or(&[]).iter().find(|&&i| i as usize >= vertex_count) {
            return Err(GeometryError::IndexOutOfRange {
                index: bad,
                vertex_count,
            });
        }
        Ok(())
    }

    /// Position buffer, empty when absent
    pub fn positions(&self) -> &[f32] {
        self.position.as_deref().unwrap_or(&[])
    }

    pub fn has_positions(&self) -> bool {
        self.position.is_some()
    }

    pub fn has_normals(&self) -> bool {
        self.normal.is_some()
    }

    pub fn has_uvs(&self) -> bool {
        self.uv.is_some()
    }

    pub fn vertex_count(&self) -> usize {
        self.positions().len() / 3
    }

    pub fn triangle_count(&self) -> usize {
        match &self.index {
            Some(indices) => indices.len() / 3,
            None => self.vertex_count() / 3,
        }
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::from_positions(self.positions())
    }

    /// Uniformly scale positions in place
    pub fn scale(&mut self, factor: f32) {
        if let Some(positions) = &mut self.position {
            for v in positions.iter_mut() {
                *v *= factor;
            }
        }
    }

    /// Recompute smooth, area-weighted vertex normals from the triangles.
    pub fn compute_vertex_normals(&mut self) {
        let positions = match &self.position {
            Some(p) => p,
            None => return,
        };
        let vertex_count = positions.len() / 3;
        let mut normals = vec![0.0f32; vertex_count * 3];

        let vertex = |i: usize| -> [f32; 3] {
            [positions[i * 3], positions[i * 3 + 1], positions[i * 3 + 2]]
        };

        let mut accumulate = |a: usize, b: usize, c: usize| {
            if a >= vertex_count || b >= vertex_count || c >= vertex_count {
                return;
            }
            // Unnormalized cross product is proportional to triangle area
            let n = cross(sub(vertex(c), vertex(b)), sub(vertex(a), vertex(b)));
            for &i in &[a, b, c] {
                normals[i * 3] += n[0];
                normals[i * 3 + 1] += n[1];
                normals[i * 3 + 2] += n[2];
            }
        };

        match &self.index {
            Some(indices) => {
                for tri in indices.chunks_exact(3) {
                    accumulate(tri[0] as usize, tri[1] as usize, tri[2] as usize);
                }
            }
            None => {
                for first in (0..vertex_count.saturating_sub(2)).step_by(3) {
                    accumulate(first, first + 1, first + 2);
                }
            }
        }

        for n in normals.chunks_exact_mut(3) {
            let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
            if len > 1e-12 {
                n[0] /= len;
                n[1] /= len;
                n[2] /= len;
            }
        }

        self.normal = Some(normals);
    }

    /// Append another geometry, offsetting its indices.
    ///
    /// The result is always indexed. Attributes present on only one side are
    /// dropped, since they could not cover every vertex.
    pub fn append(&mut self, other: &BufferGeometry) {
        let base = self.vertex_count() as u32;

        let mut indices = self.index.take().unwrap_or_else(|| (0..base).collect());
        match &other.index {
            Some(other_indices) => indices.extend(other_indices.iter().map(|i| i + base)),
            None => indices.extend((0..other.vertex_count() as u32).map(|i| i + base)),
        }

        let was_empty = base == 0 && self.normal.is_none() && self.uv.is_none();
        self.normal = merge_attribute(self.normal.take(), other.normal.as_ref(), was_empty);
        self.uv = merge_attribute(self.uv.take(), other.uv.as_ref(), was_empty);

        let mut positions = self.position.take().unwrap_or_default();
        positions.extend_from_slice(other.positions());
        self.position = Some(positions);
        self.index = Some(indices);
    }
}

fn merge_attribute(mine: Option<Vec<f32>>, theirs: Option<&Vec<f32>>, was_empty: bool) -> Option<Vec<f32>> {
    match (mine, theirs) {
        (Some(mut a), Some(b)) => {
            a.extend_from_slice(b);
            Some(a)
        }
        (None, Some(b)) if was_empty => Some(b.clone()),
        _ => None,
    }
}

fn sub(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn cross(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}
