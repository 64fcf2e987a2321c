//! Axis-aligned bounds over flat position buffers

use serde::{Deserialize, Serialize};

/// Axis-Aligned Bounding Box
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: [f32; 3],
    pub max: [f32; 3],
}

impl Default for Aabb {
    fn default() -> Self {
        Self::ZERO
    }
}

impl Aabb {
    /// Zero-extent box at the origin
    pub const ZERO: Self = Self {
        min: [0.0, 0.0, 0.0],
        max: [0.0, 0.0, 0.0],
    };

    /// Create an empty (inverted) AABB, used as the seed for accumulation
    pub const EMPTY: Self = Self {
        min: [f32::MAX, f32::MAX, f32::MAX],
        max: [f32::MIN, f32::MIN, f32::MIN],
    };

    /// Create from min and max points
    #[inline]
    pub const fn new(min: [f32; 3], max: [f32; 3]) -> Self {
        Self { min, max }
    }

    /// Create from center and half-extents
    pub fn from_center_half_extents(center: [f32; 3], half: [f32; 3]) -> Self {
        Self {
            min: [center[0] - half[0], center[1] - half[1], center[2] - half[2]],
            max: [center[0] + half[0], center[1] + half[1], center[2] + half[2]],
        }
    }

    /// Compute bounds from a flat `[x, y, z, x, y, z, ...]` buffer.
    ///
    /// A trailing partial vertex is ignored. An empty buffer yields
    /// [`Aabb::ZERO`] rather than an inverted box.
    pub fn from_positions(positions: &[f32]) -> Self {
        let mut aabb = Self::EMPTY;
        let mut any = false;

        for p in positions.chunks_exact(3) {
            aabb = aabb.expand_to_include([p[0], p[1], p[2]]);
            any = true;
        }

        if any {
            aabb
        } else {
            Self::ZERO
        }
    }

    /// Expand to include a point
    pub fn expand_to_include(self, point: [f32; 3]) -> Self {
        Self {
            min: [
                self.min[0].min(point[0]),
                self.min[1].min(point[1]),
                self.min[2].min(point[2]),
            ],
            max: [
                self.max[0].max(point[0]),
                self.max[1].max(point[1]),
                self.max[2].max(point[2]),
            ],
        }
    }

    /// Union of two AABBs
    pub fn union(&self, other: &Aabb) -> Self {
        self.expand_to_include(other.min).expand_to_include(other.max)
    }

    /// Get the center point
    pub fn center(&self) -> [f32; 3] {
        [
            (self.min[0] + self.max[0]) * 0.5,
            (self.min[1] + self.max[1]) * 0.5,
            (self.min[2] + self.max[2]) * 0.5,
        ]
    }

    /// Get the size (full extents)
    pub fn size(&self) -> [f32; 3] {
        [
            self.max[0] - self.min[0],
            self.max[1] - self.min[1],
            self.max[2] - self.min[2],
        ]
    }

    /// Check if the AABB is valid (min <= max)
    pub fn is_valid(&self) -> bool {
        self.min[0] <= self.max[0] && self.min[1] <= self.max[1] && self.min[2] <= self.max[2]
    }
}
