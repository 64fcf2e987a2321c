//! Light and group record encoders

use serde::{Deserialize, Serialize};

use crate::live::{Group, Light, LightKind};
use crate::record::{GroupRecord, LightRecord};

/// Which light fields a save writes
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LightFieldSet {
    /// Identity, placement, intensity and colour only
    Minimal,
    /// Also shadow and falloff fields
    #[default]
    Extended,
}

/// Encode a live light.
///
/// Falloff fields are only written for lights that use them: distance and
/// decay for point and spot lights, angle and penumbra for spot lights.
pub fn encode_light(light: &Light, fields: LightFieldSet) -> LightRecord {
    let extended = fields == LightFieldSet::Extended;
    let kind = light.kind;

    LightRecord {
        id: light.id.clone(),
        name: light.name.clone(),
        kind,
        position: light.position,
        target: kind.is_targeted().then_some(light.target),
        intensity: light.intensity,
        color: light.color,
        visible: light.visible,
        cast_shadow: extended.then_some(light.cast_shadow),
        distance: (extended && kind.has_falloff()).then_some(light.distance),
        decay: (extended && kind.has_falloff()).then_some(light.decay),
        angle: (extended && kind == LightKind::Spot).then_some(light.angle),
        penumbra: (extended && kind == LightKind::Spot).then_some(light.penumbra),
    }
}

/// Decode a light record, taking constructor defaults for absent fields
pub fn decode_light(record: &LightRecord) -> Light {
    let defaults = Light::new(record.kind);
    Light {
        id: record.id.clone(),
        name: record.name.clone(),
        kind: record.kind,
        position: record.position,
        target: record.target.unwrap_or(defaults.target),
        intensity: record.intensity,
        color: record.color,
        visible: record.visible,
        cast_shadow: record.cast_shadow.unwrap_or(defaults.cast_shadow),
        distance: record.distance.unwrap_or(defaults.distance),
        decay: record.decay.unwrap_or(defaults.decay),
        angle: record.angle.unwrap_or(defaults.angle),
        penumbra: record.penumbra.unwrap_or(defaults.penumbra),
    }
}

pub fn encode_group(group: &Group) -> GroupRecord {
    GroupRecord {
        id: group.id.clone(),
        name: group.name.clone(),
        expanded: group.expanded,
        visible: group.visible,
        locked: group.locked,
        object_ids: group.object_ids.clone(),
    }
}

pub fn decode_group(record: &GroupRecord) -> Group {
    Group {
        id: record.id.clone(),
        name: record.name.clone(),
        expanded: record.expanded,
        visible: record.visible,
        locked: record.locked,
        object_ids: record.object_ids.clone(),
    }
}
