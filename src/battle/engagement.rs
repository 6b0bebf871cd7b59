//! Attack range, field of view and attack execution

use crate::battle::battle_map::Fortification;
use crate::battle::formation::{compute_attack_direction, AttackDirection};
use crate::battle::resolution::{
    calculate_damage, calculate_structure_damage, damage_to_troops, StrikeContext,
};
use crate::battle::unit_traits::check_charge_reflect;
use crate::battle::units::BattleUnit;
use crate::core::types::{normalize_angle, SimMillis, Vec2};

/// Why an attack did not happen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttackRejection {
    AttackerDown,
    TargetDown,
    Cooldown,
    OutOfRange,
}

/// What a landed attack did
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttackOutcome {
    pub direction: AttackDirection,
    pub damage: f32,
    /// Troops actually removed from the target
    pub troops_lost: u32,
    /// Troops the attacker lost to a reflected charge
    pub reflected: u32,
    pub volley_used: bool,
    pub charge_landed: bool,
    pub target_destroyed: bool,
}

/// Result of striking a gate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GateStrike {
    pub damage: f32,
    pub gate_destroyed: bool,
}

/// Is `point` inside the attacker's forward arc? Unrestricted categories
/// always pass.
pub fn within_field_of_view(attacker: &BattleUnit, point: Vec2, fov_degrees: f32) -> bool {
    if !attacker.category.has_restricted_fov() {
        return true;
    }
    if attacker.position.distance(&point) < 1e-4 {
        return true;
    }
    let bearing = attacker.position.bearing_to(&point);
    let diff = normalize_angle(bearing - attacker.facing);
    let diff = diff.min(std::f32::consts::TAU - diff);
    diff <= (fov_degrees / 2.0).to_radians()
}

/// Reach check against a circle of `radius` at `point`
pub fn can_reach(attacker: &BattleUnit, point: Vec2, radius: f32, fov_degrees: f32) -> bool {
    attacker.position.distance(&point) <= attacker.effective_attack_range() + radius
        && within_field_of_view(attacker, point, fov_degrees)
}

/// Range plus field of view against another unit
pub fn is_in_attack_range(attacker: &BattleUnit, target: &BattleUnit, fov_degrees: f32) -> bool {
    can_reach(attacker, target.position, target.collision_radius, fov_degrees)
}

/// Execute one attack if cooldown and range allow it
pub fn process_attack(
    attacker: &mut BattleUnit,
    defender: &mut BattleUnit,
    now: SimMillis,
    fov_degrees: f32,
) -> Result<AttackOutcome, AttackRejection> {
    if !attacker.is_alive() {
        return Err(AttackRejection::AttackerDown);
    }
    if !defender.is_alive() {
        return Err(AttackRejection::TargetDown);
    }
    if !attacker.cooldown_ready(now) {
        return Err(AttackRejection::Cooldown);
    }
    if !is_in_attack_range(attacker, defender, fov_degrees) {
        return Err(AttackRejection::OutOfRange);
    }

    let direction = compute_attack_direction(attacker.position, defender.position, defender.facing);
    let ctx = StrikeContext {
        direction,
        volley: attacker.volley_ready && attacker.category.can_volley(),
        charging: attacker.is_charging,
    };

    let damage = calculate_damage(attacker, defender, &ctx);
    let troops_lost = defender.apply_casualties(damage_to_troops(damage));

    attacker.last_attack_at = Some(now);
    attacker.engaged_this_tick = true;
    defender.engaged_this_tick = true;
    if ctx.volley {
        attacker.volley_ready = false;
    }

    let mut reflected = 0;
    if ctx.charging {
        let fraction = check_charge_reflect(
            &defender.traits,
            attacker.category,
            direction == AttackDirection::Front,
        );
        if fraction > 0.0 {
            reflected = attacker.apply_casualties((troops_lost as f32 * fraction).round() as u32);
        }
        attacker.is_charging = false;
    }

    Ok(AttackOutcome {
        direction,
        damage,
        troops_lost,
        reflected,
        volley_used: ctx.volley,
        charge_landed: ctx.charging,
        target_destroyed: !defender.is_alive(),
    })
}

/// Strike an intact gate
pub fn process_gate_attack(
    attacker: &mut BattleUnit,
    fortification: &mut Fortification,
    gate_index: usize,
    now: SimMillis,
    fov_degrees: f32,
) -> Result<GateStrike, AttackRejection> {
    if !attacker.is_alive() {
        return Err(AttackRejection::AttackerDown);
    }
    let Some(center) = fortification.gate_position(gate_index) else {
        return Err(AttackRejection::TargetDown);
    };
    let Some(gate) = fortification.gates.get_mut(gate_index) else {
        return Err(AttackRejection::TargetDown);
    };
    if gate.is_destroyed() {
        return Err(AttackRejection::TargetDown);
    }
    if !attacker.cooldown_ready(now) {
        return Err(AttackRejection::Cooldown);
    }
    if !can_reach(attacker, center, gate.collision_radius(), fov_degrees) {
        return Err(AttackRejection::OutOfRange);
    }

    let damage = gate.apply_damage(calculate_structure_damage(attacker));
    attacker.last_attack_at = Some(now);
    attacker.engaged_this_tick = true;

    Ok(GateStrike {
        damage,
        gate_destroyed: gate.is_destroyed(),
    })
}
