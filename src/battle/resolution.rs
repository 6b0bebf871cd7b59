//! Damage calculation
//!
//! One strike goes through a fixed chain of multipliers: attacker strength,
//! matchup, attacker condition, bonuses, facing, then the defender's
//! mitigation. The result is troops killed and never drops below one.

use crate::battle::constants::{
    BASE_DAMAGE_DIVISOR, CHARGE_BONUS, MIN_DAMAGE, NON_SIEGE_STRUCTURE_FACTOR,
    SIEGE_STRUCTURE_FACTOR, TRAINING_MITIGATION_DIVISOR, VOLLEY_BONUS,
    VULNERABLE_DAMAGE_MULTIPLIER,
};
use crate::battle::formation::AttackDirection;
use crate::battle::unit_traits::{
    armor_bonus, attack_multiplier, charge_bonus_scale, defense_multiplier, has_charge_defense,
    siege_multiplier,
};
use crate::battle::unit_type::{category_advantage, UnitCategory};
use crate::battle::units::BattleUnit;

/// Circumstances of one strike
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrikeContext {
    /// Side of the defender the blow lands on
    pub direction: AttackDirection,
    /// Volley is ready and will be spent on this strike
    pub volley: bool,
    /// Attacker is charging
    pub charging: bool,
}

impl StrikeContext {
    pub fn new(direction: AttackDirection) -> Self {
        Self {
            direction,
            volley: false,
            charging: false,
        }
    }
}

/// Charge multiplier; a frontal charge into charge-defense troops gains nothing
pub fn charge_multiplier(attacker: &BattleUnit, defender: &BattleUnit, ctx: &StrikeContext) -> f32 {
    if !ctx.charging {
        return 1.0;
    }
    if ctx.direction == AttackDirection::Front && has_charge_defense(&defender.traits) {
        return 1.0;
    }
    CHARGE_BONUS * charge_bonus_scale(&attacker.traits)
}

/// Full damage pipeline for `attacker` striking `defender`
pub fn calculate_damage(attacker: &BattleUnit, defender: &BattleUnit, ctx: &StrikeContext) -> f32 {
    let base =
        attacker.troops as f32 * attacker.stats.weighted_average() / BASE_DAMAGE_DIVISOR;

    let mut damage = base * category_advantage(attacker.category, defender.category);

    // Attacker condition
    damage *= attacker.effective_morale() / 100.0;
    damage *= attacker.training / 100.0;
    damage *= attacker.fatigue_level.effects().attack;
    damage *= attack_multiplier(&attacker.traits, attacker.category, attacker.troop_ratio());

    // One-shot bonuses
    if ctx.volley && attacker.category.can_volley() {
        damage *= VOLLEY_BONUS;
    }
    damage *= charge_multiplier(attacker, defender, ctx);

    // Facing
    damage *= attacker.formation.attack_modifier(ctx.direction);
    damage *= defender.formation.defense_modifier(ctx.direction);
    if defender.is_vulnerable {
        damage *= VULNERABLE_DAMAGE_MULTIPLIER;
    }

    // Defender mitigation
    damage /= defender.fatigue_level.effects().defense;
    damage /= defense_multiplier(&defender.traits, attacker.category);
    damage /= 1.0 + armor_bonus(&defender.traits);
    if attacker.category.is_ranged() {
        damage /= defender.formation.stats().avoidance;
    }
    damage *= 1.0 - defender.training / TRAINING_MITIGATION_DIVISOR;

    if damage.is_finite() {
        damage.max(MIN_DAMAGE)
    } else {
        MIN_DAMAGE
    }
}

/// Damage `attacker` deals to a gate
pub fn calculate_structure_damage(attacker: &BattleUnit) -> f32 {
    let base =
        attacker.troops as f32 * attacker.stats.weighted_average() / BASE_DAMAGE_DIVISOR;
    let factor = if attacker.category == UnitCategory::Siege {
        SIEGE_STRUCTURE_FACTOR
    } else {
        NON_SIEGE_STRUCTURE_FACTOR
    };

    let damage = base
        * factor
        * siege_multiplier(&attacker.traits)
        * attacker.formation.stats().attack
        * (attacker.effective_morale() / 100.0)
        * (attacker.training / 100.0)
        * attacker.fatigue_level.effects().attack;

    if damage.is_finite() {
        damage.max(MIN_DAMAGE)
    } else {
        MIN_DAMAGE
    }
}

/// Damage converted to whole troops killed
pub fn damage_to_troops(damage: f32) -> u32 {
    damage.max(MIN_DAMAGE).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::fatigue::FatigueLevel;
    use crate::battle::formation::FormationType;
    use crate::battle::unit_traits::UnitTrait;
    use crate::battle::units::{Side, UnitStats};
    use crate::core::types::Vec2;

    fn unit(side: Side, category: UnitCategory) -> BattleUnit {
        let mut u = BattleUnit::new(side, category, 100, Vec2::new(100.0, 100.0));
        u.traits.clear();
        u.training = 0.0;
        u.stats = UnitStats::new(50.0, 50.0, 50.0);
        u
    }

    fn plain_ctx() -> StrikeContext {
        StrikeContext::new(AttackDirection::Front)
    }

    #[test]
    fn test_reference_strike() {
        let mut attacker = unit(Side::Attacker, UnitCategory::Footman);
        attacker.training = 100.0;
        let defender = unit(Side::Defender, UnitCategory::Footman);
        // 100 * 50 / 10 = 500, everything else neutral
        let damage = calculate_damage(&attacker, &defender, &plain_ctx());
        assert!((damage - 500.0).abs() < 1e-2);
    }

    #[test]
    fn test_minimum_damage() {
        let mut attacker = unit(Side::Attacker, UnitCategory::Footman);
        attacker.troops = 1;
        attacker.stats = UnitStats::new(0.0, 0.0, 0.0);
        let defender = unit(Side::Defender, UnitCategory::Footman);
        assert_eq!(calculate_damage(&attacker, &defender, &plain_ctx()), 1.0);
    }

    #[test]
    fn test_matchup_applied() {
        let mut spear = unit(Side::Attacker, UnitCategory::Spearman);
        spear.training = 100.0;
        let cav = unit(Side::Defender, UnitCategory::Cavalry);
        let foot = unit(Side::Defender, UnitCategory::Footman);
        let vs_cav = calculate_damage(&spear, &cav, &plain_ctx());
        let vs_foot = calculate_damage(&spear, &foot, &plain_ctx());
        assert!((vs_cav / vs_foot - 2.5 / 0.9).abs() < 1e-3);
    }

    #[test]
    fn test_volley_only_for_ranged() {
        let mut archer = unit(Side::Attacker, UnitCategory::Archer);
        archer.training = 100.0;
        let target = unit(Side::Defender, UnitCategory::Footman);
        let mut ctx = plain_ctx();
        let plain = calculate_damage(&archer, &target, &ctx);
        ctx.volley = true;
        let volley = calculate_damage(&archer, &target, &ctx);
        assert!((volley / plain - VOLLEY_BONUS).abs() < 1e-4);

        let mut footman = unit(Side::Attacker, UnitCategory::Footman);
        footman.training = 100.0;
        assert_eq!(
            calculate_damage(&footman, &target, &ctx),
            calculate_damage(&footman, &target, &plain_ctx())
        );
    }

    #[test]
    fn test_frontal_charge_into_spears_gets_no_bonus() {
        let mut cav = unit(Side::Attacker, UnitCategory::Cavalry);
        cav.training = 100.0;
        let mut spears = unit(Side::Defender, UnitCategory::Spearman);
        spears.traits = vec![UnitTrait::ChargeDefense];

        let mut ctx = plain_ctx();
        ctx.charging = true;
        assert_eq!(charge_multiplier(&cav, &spears, &ctx), 1.0);

        ctx.direction = AttackDirection::Rear;
        assert!((charge_multiplier(&cav, &spears, &ctx) - CHARGE_BONUS).abs() < 1e-6);
    }

    #[test]
    fn test_charge_bonus_scaled_by_trait() {
        let mut cav = unit(Side::Attacker, UnitCategory::Cavalry);
        cav.traits = vec![UnitTrait::ChargeBonus(0.2)];
        let foot = unit(Side::Defender, UnitCategory::Footman);
        let mut ctx = plain_ctx();
        ctx.charging = true;
        assert!((charge_multiplier(&cav, &foot, &ctx) - 1.8).abs() < 1e-5);
    }

    #[test]
    fn test_rear_attack_on_shield_wall_hurts() {
        let mut attacker = unit(Side::Attacker, UnitCategory::Footman);
        attacker.training = 100.0;
        let mut defender = unit(Side::Defender, UnitCategory::Footman);
        defender.formation = FormationType::ShieldWall;

        let front = calculate_damage(&attacker, &defender, &plain_ctx());
        let rear = calculate_damage(
            &attacker,
            &defender,
            &StrikeContext::new(AttackDirection::Rear),
        );
        assert!((front - 250.0).abs() < 1e-2);
        assert!((rear - 750.0).abs() < 1e-2);
    }

    #[test]
    fn test_vulnerable_and_tired_defender_takes_more() {
        let mut attacker = unit(Side::Attacker, UnitCategory::Footman);
        attacker.training = 100.0;
        let mut defender = unit(Side::Defender, UnitCategory::Footman);
        let fresh = calculate_damage(&attacker, &defender, &plain_ctx());

        defender.is_vulnerable = true;
        defender.fatigue_level = FatigueLevel::Exhausted;
        let exposed = calculate_damage(&attacker, &defender, &plain_ctx());
        assert!((exposed / fresh - 1.3 / 0.7).abs() < 1e-3);
    }

    #[test]
    fn test_armor_and_training_mitigate() {
        let mut attacker = unit(Side::Attacker, UnitCategory::Footman);
        attacker.training = 100.0;
        let mut defender = unit(Side::Defender, UnitCategory::Footman);
        defender.traits = vec![UnitTrait::ArmorBonus(0.25)];
        defender.training = 75.0;
        let damage = calculate_damage(&attacker, &defender, &plain_ctx());
        // 500 / 1.25 * 0.5
        assert!((damage - 200.0).abs() < 1e-2);
    }

    #[test]
    fn test_avoidance_only_against_ranged() {
        let mut archer = unit(Side::Attacker, UnitCategory::Archer);
        archer.training = 100.0;
        let mut footman = unit(Side::Attacker, UnitCategory::Footman);
        footman.training = 100.0;
        let mut turtle = unit(Side::Defender, UnitCategory::Footman);
        turtle.formation = FormationType::Turtle;

        let line = unit(Side::Defender, UnitCategory::Footman);
        let ranged_ratio = calculate_damage(&archer, &turtle, &plain_ctx())
            / calculate_damage(&archer, &line, &plain_ctx());
        let melee_ratio = calculate_damage(&footman, &turtle, &plain_ctx())
            / calculate_damage(&footman, &line, &plain_ctx());
        assert!((ranged_ratio - melee_ratio / 1.5).abs() < 1e-3);
    }

    #[test]
    fn test_siege_breaks_gates_faster() {
        let mut siege = unit(Side::Attacker, UnitCategory::Siege);
        siege.traits = vec![UnitTrait::SiegeBonus(1.0)];
        siege.training = 100.0;
        let mut footman = unit(Side::Attacker, UnitCategory::Footman);
        footman.training = 100.0;
        let ratio = calculate_structure_damage(&siege) / calculate_structure_damage(&footman);
        assert!((ratio - 12.0).abs() < 1e-3);
    }

    #[test]
    fn test_damage_to_troops_rounds() {
        assert_eq!(damage_to_troops(0.2), 1);
        assert_eq!(damage_to_troops(2.6), 3);
    }
}
