//! Unit trait catalog
//!
//! Traits are a closed set of named modifiers. Each query below folds a
//! unit's trait list into one multiplier, so callers never branch on
//! individual traits.

use serde::{Deserialize, Serialize};

use crate::battle::unit_type::UnitCategory;

/// Named modifier carried by a unit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum UnitTrait {
    /// Frontal cavalry charges are fully reflected back at the attacker
    ChargeReflect,
    /// Frontal charges lose their bonus; half is reflected
    ChargeDefense,
    /// Fractional damage reduction (0.1 = incoming damage / 1.1)
    ArmorBonus(f32),
    /// Fractional bonus to the charge multiplier
    ChargeBonus(f32),
    /// Fractional bonus to attack range
    SniperRange(f32),
    /// Fractional ranged attack bonus
    SniperAccuracy(f32),
    /// Fractional bonus against fortifications
    SiegeBonus(f32),
    /// Raises morale of allies within `radius`
    MoraleAura { radius: f32, bonus: f32 },
    /// Halves damage from casters
    FireImmunity,
    /// Halves fatigue change
    FatigueResistant,
    /// Fatigue never changes
    FatigueImmune,
    /// Fatigue changes 50% faster
    QuickFatigue,
    /// Attacks hit harder while below half strength
    Berserker,
    /// Restores troops over time, up to max
    Regeneration { troops_per_second: f32 },
}

const FIRE_IMMUNITY_DEFENSE: f32 = 2.0;
const BERSERKER_ATTACK: f32 = 1.3;
const BERSERKER_THRESHOLD: f32 = 0.5;
const CHARGE_REFLECT_FULL: f32 = 1.0;
const CHARGE_REFLECT_PARTIAL: f32 = 0.5;

/// Product of offensive trait multipliers for one strike
pub fn attack_multiplier(
    traits: &[UnitTrait],
    attacker_category: UnitCategory,
    troop_ratio: f32,
) -> f32 {
    traits
        .iter()
        .map(|t| match t {
            UnitTrait::SniperAccuracy(bonus) if attacker_category.is_ranged() => 1.0 + bonus,
            UnitTrait::Berserker if troop_ratio < BERSERKER_THRESHOLD => BERSERKER_ATTACK,
            _ => 1.0,
        })
        .product()
}

/// Product of defensive trait divisors against a given attacker category
pub fn defense_multiplier(traits: &[UnitTrait], attacker_category: UnitCategory) -> f32 {
    traits
        .iter()
        .map(|t| match t {
            UnitTrait::FireImmunity if attacker_category == UnitCategory::Caster => {
                FIRE_IMMUNITY_DEFENSE
            }
            _ => 1.0,
        })
        .product()
}

/// Summed armor bonus
pub fn armor_bonus(traits: &[UnitTrait]) -> f32 {
    traits
        .iter()
        .filter_map(|t| match t {
            UnitTrait::ArmorBonus(bonus) => Some(*bonus),
            _ => None,
        })
        .sum()
}

/// Scale applied to the base charge bonus
pub fn charge_bonus_scale(traits: &[UnitTrait]) -> f32 {
    1.0 + traits
        .iter()
        .filter_map(|t| match t {
            UnitTrait::ChargeBonus(bonus) => Some(*bonus),
            _ => None,
        })
        .sum::<f32>()
}

/// Does this unit blunt frontal charges?
pub fn has_charge_defense(traits: &[UnitTrait]) -> bool {
    traits
        .iter()
        .any(|t| matches!(t, UnitTrait::ChargeDefense | UnitTrait::ChargeReflect))
}

/// Fraction of a charge's damage dealt back to the charging attacker.
///
/// Returns 0.0, 0.5 or 1.0. Only frontal cavalry charges are reflected.
pub fn check_charge_reflect(
    defender_traits: &[UnitTrait],
    attacker_category: UnitCategory,
    is_frontal: bool,
) -> f32 {
    if !is_frontal || !attacker_category.is_cavalry() {
        return 0.0;
    }

    if defender_traits.contains(&UnitTrait::ChargeReflect) {
        CHARGE_REFLECT_FULL
    } else if defender_traits.contains(&UnitTrait::ChargeDefense) {
        CHARGE_REFLECT_PARTIAL
    } else {
        0.0
    }
}

/// Multiplier on base attack range
pub fn range_multiplier(traits: &[UnitTrait]) -> f32 {
    1.0 + traits
        .iter()
        .filter_map(|t| match t {
            UnitTrait::SniperRange(bonus) => Some(*bonus),
            _ => None,
        })
        .sum::<f32>()
}

/// Multiplier on damage against fortifications
pub fn siege_multiplier(traits: &[UnitTrait]) -> f32 {
    1.0 + traits
        .iter()
        .filter_map(|t| match t {
            UnitTrait::SiegeBonus(bonus) => Some(*bonus),
            _ => None,
        })
        .sum::<f32>()
}

/// Multiplier on every fatigue change (gain and recovery)
pub fn fatigue_rate_multiplier(traits: &[UnitTrait]) -> f32 {
    traits
        .iter()
        .map(|t| match t {
            UnitTrait::FatigueImmune => 0.0,
            UnitTrait::FatigueResistant => 0.5,
            UnitTrait::QuickFatigue => 1.5,
            _ => 1.0,
        })
        .product()
}

/// Strongest morale aura carried, as (radius, bonus)
pub fn morale_aura(traits: &[UnitTrait]) -> Option<(f32, f32)> {
    traits
        .iter()
        .filter_map(|t| match t {
            UnitTrait::MoraleAura { radius, bonus } => Some((*radius, *bonus)),
            _ => None,
        })
        .max_by(|a, b| a.1.total_cmp(&b.1))
}

/// Troops restored per second
pub fn regeneration_rate(traits: &[UnitTrait]) -> f32 {
    traits
        .iter()
        .filter_map(|t| match t {
            UnitTrait::Regeneration { troops_per_second } => Some(*troops_per_second),
            _ => None,
        })
        .sum()
}
