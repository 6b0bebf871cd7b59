//! Circle collision between units and against immovable bodies
//!
//! Every unit is a circle. Overlapping circles are pushed apart along the
//! line between centers; intact gates are circles with no move speed.

use crate::battle::battle_map::BattleMap;
use crate::battle::units::BattleUnit;
use crate::core::types::Vec2;

/// Penetration depth of two circles, 0 when apart
pub fn overlap(a: Vec2, a_radius: f32, b: Vec2, b_radius: f32) -> f32 {
    (a_radius + b_radius - a.distance(&b)).max(0.0)
}

/// Unit vector from `a` to `b`; coincident centers separate along +x
fn separation_axis(a: Vec2, b: Vec2) -> Vec2 {
    let delta = b - a;
    if delta.length() > 1e-4 {
        delta.normalize()
    } else {
        Vec2::new(1.0, 0.0)
    }
}

/// Push two overlapping units apart. Returns true if they were colliding.
pub fn resolve_pair(a: &mut BattleUnit, b: &mut BattleUnit) -> bool {
    let depth = overlap(a.position, a.collision_radius, b.position, b.collision_radius);
    if depth <= 0.0 {
        return false;
    }

    let axis = separation_axis(a.position, b.position);
    let half = depth / 2.0;
    match (a.move_speed > 0.0, b.move_speed > 0.0) {
        (true, true) => {
            a.position = a.position - axis * half;
            b.position = b.position + axis * half;
        }
        // The mobile side takes both halves
        (true, false) => a.position = a.position - axis * (half * 2.0),
        (false, true) => b.position = b.position + axis * (half * 2.0),
        (false, false) => {}
    }
    true
}

/// Push a unit out of an immovable circle. Returns true if it was inside.
pub fn resolve_against_static(unit: &mut BattleUnit, center: Vec2, radius: f32) -> bool {
    if unit.move_speed <= 0.0 {
        return false;
    }
    let depth = overlap(unit.position, unit.collision_radius, center, radius);
    if depth <= 0.0 {
        return false;
    }
    let axis = separation_axis(center, unit.position);
    unit.position = unit.position + axis * depth;
    true
}

/// Resolve every pairwise collision among living units, then against intact
/// gates. Returns the number of contacts resolved.
pub fn resolve_collisions(
    attackers: &mut [BattleUnit],
    defenders: &mut [BattleUnit],
    map: &BattleMap,
) -> usize {
    let mut living: Vec<&mut BattleUnit> = attackers
        .iter_mut()
        .chain(defenders.iter_mut())
        .filter(|u| u.is_alive())
        .collect();

    let mut contacts = 0;
    for j in 1..living.len() {
        let (left, right) = living.split_at_mut(j);
        let b = &mut *right[0];
        for a in left.iter_mut() {
            if resolve_pair(a, b) {
                contacts += 1;
            }
        }
    }

    if let Some(fort) = &map.fortification {
        for (index, gate) in fort.gates.iter().enumerate() {
            if gate.is_destroyed() {
                continue;
            }
            let Some(center) = fort.gate_position(index) else {
                continue;
            };
            for unit in living.iter_mut() {
                if resolve_against_static(unit, center, gate.collision_radius()) {
                    contacts += 1;
                }
            }
        }
    }

    for unit in living.iter_mut() {
        unit.position = map.clamp(unit.position);
    }
    contacts
}
