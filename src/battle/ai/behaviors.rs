//! Per-category tactical behaviours

use crate::battle::ai::targeting::{
    cavalry_target, cavalry_threat, enemy_in_reach, in_reach, nearest_enemy,
};
use crate::battle::ai::{AiAction, Decision};
use crate::battle::battle_map::BattleMap;
use crate::battle::constants::{
    CHARGE_DISENGAGE_DISTANCE, CHARGE_ENGAGE_DISTANCE, KITE_FLEE_DISTANCE, RANGED_HOLD_FRACTION,
};
use crate::battle::units::{AttackTarget, BattleUnit, Side};
use crate::core::types::Vec2;

/// Close with the nearest enemy, or strike it if already in reach
pub fn melee(unit: &BattleUnit, enemies: &[BattleUnit]) -> Decision {
    match nearest_enemy(unit, enemies) {
        Some(target) => engage(unit, target),
        None => Decision::hold(),
    }
}

/// Attack `target`, moving only if it is out of reach
fn engage(unit: &BattleUnit, target: &BattleUnit) -> Decision {
    if in_reach(unit, target) {
        Decision::attack(AttackTarget::Unit(target.id), None)
    } else {
        Decision::attack(AttackTarget::Unit(target.id), Some(target.position))
    }
}

/// Hunt soft targets, charging from long range
pub fn cavalry(unit: &BattleUnit, enemies: &[BattleUnit]) -> Decision {
    let Some(target) = cavalry_target(unit, enemies) else {
        return Decision::hold().with_charge(false);
    };
    let distance = unit.position.distance(&target.position);
    let decision = Decision::attack(AttackTarget::Unit(target.id), Some(target.position));

    if distance > CHARGE_ENGAGE_DISTANCE {
        decision.with_charge(true)
    } else if distance <= CHARGE_DISENGAGE_DISTANCE {
        decision.with_charge(false)
    } else {
        decision
    }
}

/// Point `distance` away from `from`, directly opposite `threat`
fn away_from(from: Vec2, threat: Vec2, distance: f32, map: &BattleMap) -> Vec2 {
    let mut direction = (from - threat).normalize();
    if direction == Vec2::ZERO {
        direction = Vec2::new(1.0, 0.0);
    }
    map.clamp(from + direction * distance)
}

/// Stand-off point at a fraction of max range from `target`
fn standoff_point(unit: &BattleUnit, target: &BattleUnit, map: &BattleMap) -> Vec2 {
    let hold = unit.effective_attack_range() * RANGED_HOLD_FRACTION;
    let mut direction = (unit.position - target.position).normalize();
    if direction == Vec2::ZERO {
        direction = Vec2::new(1.0, 0.0);
    }
    map.clamp(target.position + direction * hold)
}

/// Kite away from cavalry, otherwise fire from a stand-off distance
pub fn ranged(unit: &BattleUnit, enemies: &[BattleUnit], map: &BattleMap) -> Decision {
    if let Some(threat) = cavalry_threat(unit, enemies) {
        let flee_to = away_from(unit.position, threat.position, KITE_FLEE_DISTANCE, map);
        return Decision::move_to(flee_to);
    }

    let Some(target) = nearest_enemy(unit, enemies) else {
        return Decision::hold();
    };
    if in_reach(unit, target) {
        Decision::attack(AttackTarget::Unit(target.id), None)
    } else {
        Decision::attack(
            AttackTarget::Unit(target.id),
            Some(standoff_point(unit, target, map)),
        )
    }
}

/// Go for the designated fortification first, then behave as ranged
pub fn siege(unit: &BattleUnit, enemies: &[BattleUnit], map: &BattleMap) -> Decision {
    let objective = map
        .fortification
        .as_ref()
        .filter(|fort| fort.is_objective && unit.side == Side::Attacker);

    if let Some(fort) = objective {
        if let Some(index) = fort.nearest_intact_gate(unit.position) {
            if let (Some(gate_pos), Some(gate)) = (fort.gate_position(index), fort.gates.get(index))
            {
                let reach = unit.effective_attack_range() + gate.collision_radius();
                if unit.position.distance(&gate_pos) <= reach {
                    return Decision::attack(AttackTarget::Gate(index), None);
                }
                let hold = unit.effective_attack_range() * RANGED_HOLD_FRACTION;
                let approach = map.clamp(gate_pos + (unit.position - gate_pos).normalize() * hold);
                return Decision::attack(AttackTarget::Gate(index), Some(approach));
            }
        }
    }
    ranged(unit, enemies, map)
}

/// Fall back to the home deployment zone
pub fn retreat(unit: &BattleUnit, map: &BattleMap) -> Decision {
    Decision {
        action: AiAction::Retreat,
        target_position: Some(map.deployment_zone(unit.side).center()),
        target: None,
        charge_intent: Some(false),
    }
}

/// Never move; fire at whatever is in reach
pub fn hold_position(unit: &BattleUnit, enemies: &[BattleUnit]) -> Decision {
    match enemy_in_reach(unit, enemies) {
        Some(target) => Decision::attack(AttackTarget::Unit(target.id), None),
        None => Decision::hold(),
    }
}
