//! Raw vertex payload capture and apply

use atelier_geometry::{BufferGeometry, GeometryError};

use crate::live::ObjectBody;
use crate::record::RawGeometryData;

/// Capture a geometry's position and index buffers.
///
/// Returns `None` when the geometry has no position attribute.
pub fn capture(geometry: &BufferGeometry) -> Option<RawGeometryData> {
    let position = geometry.position.as_ref()?;
    Some(RawGeometryData {
        position: position.clone(),
        index: geometry.index.clone(),
    })
}

/// Capture the payload of an object body, if it has one.
///
/// Unresolved bodies hand back the payload they were loaded with.
pub fn capture_body(body: &ObjectBody) -> Option<RawGeometryData> {
    match body {
        ObjectBody::Mesh(mesh) => capture(&mesh.geometry),
        ObjectBody::Unresolved(unresolved) => unresolved.raw.clone(),
        ObjectBody::Group | ObjectBody::Placeholder => None,
    }
}

/// Check a payload without rebuilding it
pub fn validate(raw: &RawGeometryData) -> Result<(), GeometryError> {
    BufferGeometry::validate_raw(&raw.position, raw.index.as_deref())
}

/// Rebuild geometry from a payload, recomputing normals
pub fn try_apply(raw: &RawGeometryData) -> Result<BufferGeometry, GeometryError> {
    BufferGeometry::from_raw(raw.position.clone(), raw.index.clone())
}

/// Rebuild geometry from a payload.
///
/// A malformed payload is logged and yields `None`; the caller falls back to
/// the descriptor.
pub fn apply(raw: &RawGeometryData) -> Option<BufferGeometry> {
    match try_apply(raw) {
        Ok(geometry) => Some(geometry),
        Err(e) => {
            log::warn!("Ignoring raw geometry payload: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atelier_geometry::{tessellate, Primitive};

    #[test]
    fn test_capture_and_apply() {
        let geometry = tessellate(&Primitive::default());
        let raw = capture(&geometry).unwrap();
        assert_eq!(raw.position.len(), 24 * 3);
        assert_eq!(raw.index.as_ref().map(Vec::len), Some(36));

        let rebuilt = apply(&raw).unwrap();
        assert_eq!(rebuilt.positions(), geometry.positions());
        assert_eq!(rebuilt.index, geometry.index);
        assert!(rebuilt.has_normals());
    }

    #[test]
    fn test_capture_without_positions() {
        assert!(capture(&BufferGeometry::new()).is_none());
        assert!(capture_body(&ObjectBody::Group).is_none());
    }

    #[test]
    fn test_apply_bad_stride_is_none() {
        let raw = RawGeometryData {
            position: vec![0.0; 7],
            index: None,
        };
        assert!(apply(&raw).is_none());
        assert_eq!(validate(&raw), Err(GeometryError::InvalidStride(7)));
    }

    #[test]
    fn test_apply_missing_positions_is_none() {
        assert!(apply(&RawGeometryData::default()).is_none());
    }
}
