//! Target selection queries shared by the behaviours

use crate::battle::constants::KITE_SAFETY_DISTANCE;
use crate::battle::unit_type::UnitCategory;
use crate::battle::units::BattleUnit;

/// Nearest living unit matching `filter`
pub fn nearest_matching<'a>(
    unit: &BattleUnit,
    candidates: &'a [BattleUnit],
    filter: impl Fn(&BattleUnit) -> bool,
) -> Option<&'a BattleUnit> {
    candidates
        .iter()
        .filter(|c| c.is_alive() && filter(c))
        .min_by(|a, b| {
            unit.position
                .distance(&a.position)
                .total_cmp(&unit.position.distance(&b.position))
        })
}

pub fn nearest_enemy<'a>(unit: &BattleUnit, enemies: &'a [BattleUnit]) -> Option<&'a BattleUnit> {
    nearest_matching(unit, enemies, |_| true)
}

/// Cavalry hunts archers and casters first
pub fn cavalry_target<'a>(unit: &BattleUnit, enemies: &'a [BattleUnit]) -> Option<&'a BattleUnit> {
    nearest_matching(unit, enemies, |e| {
        matches!(e.category, UnitCategory::Archer | UnitCategory::Caster)
    })
    .or_else(|| nearest_enemy(unit, enemies))
}

/// Closest enemy cavalry inside the kiting safety distance
pub fn cavalry_threat<'a>(unit: &BattleUnit, enemies: &'a [BattleUnit]) -> Option<&'a BattleUnit> {
    nearest_matching(unit, enemies, |e| {
        e.category.is_cavalry() && unit.position.distance(&e.position) < KITE_SAFETY_DISTANCE
    })
}

/// Can `unit` hit `target` from where it stands (range only)
pub fn in_reach(unit: &BattleUnit, target: &BattleUnit) -> bool {
    unit.position.distance(&target.position)
        <= unit.effective_attack_range() + target.collision_radius
}

/// Nearest enemy already in reach
pub fn enemy_in_reach<'a>(unit: &BattleUnit, enemies: &'a [BattleUnit]) -> Option<&'a BattleUnit> {
    nearest_matching(unit, enemies, |e| in_reach(unit, e))
}
