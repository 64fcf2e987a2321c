//! # atelier_geometry - Live Geometry Kernel
//!
//! The geometry side of an atelier scene:
//! - Parametric primitive parameters with their constructor defaults
//! - Flat buffer geometry (position / normal / uv / index)
//! - Tessellation of every primitive family into buffer geometry
//! - Axis-aligned bounds over flat position buffers
//!
//! ## Example
//!
//! ```ignore
//! use atelier_geometry::prelude::*;
//!
//! let sphere = Primitive::Sphere(SphereParams { radius: 2.0, ..Default::default() });
//! let geometry = tessellate(&sphere);
//! assert_eq!(geometry.vertex_count(), 33 * 17);
//! ```

pub mod bounds;
pub mod buffer;
pub mod error;
pub mod primitive;
pub mod tessellate;

pub use bounds::Aabb;
pub use buffer::BufferGeometry;
pub use error::{GeometryError, Result};
pub use primitive::{
    BoxParams, ConeParams, CylinderParams, Primitive, PrimitiveKind, SegmentLimits, SphereParams,
    TorusParams,
};
pub use tessellate::{tessellate, try_tessellate};

/// Prelude - commonly used types
pub mod prelude {
    pub use crate::bounds::Aabb;
    pub use crate::buffer::BufferGeometry;
    pub use crate::primitive::{
        BoxParams, ConeParams, CylinderParams, Primitive, PrimitiveKind, SphereParams, TorusParams,
    };
    pub use crate::tessellate::{tessellate, try_tessellate};
}

/// Full turn in radians, the default sweep of every revolved primitive.
pub const TAU: f32 = std::f32::consts::TAU;
