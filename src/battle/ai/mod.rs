//! Per-unit tactical AI
//!
//! Architecture: Trait + Data hybrid
//! - `TacticalAi` trait defines the interface for swappable implementations
//! - `RuleBasedAi` is the default: a pure function of the unit, its allies,
//!   its enemies and the map
//! - Units with `ai_controlled` cleared never reach this layer

pub mod behaviors;
pub mod targeting;

use serde::{Deserialize, Serialize};

use crate::battle::battle_map::BattleMap;
use crate::battle::constants::{DEFENSIVE_ENGAGE_FACTOR, RETREAT_MORALE_THRESHOLD};
use crate::battle::unit_type::UnitCategory;
use crate::battle::units::{AttackTarget, BattleUnit, UnitStance};
use crate::core::types::Vec2;

/// What a unit decided to do this tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AiAction {
    Move,
    Attack,
    Hold,
    Retreat,
}

/// A decision with its optional targets
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub action: AiAction,
    pub target_position: Option<Vec2>,
    pub target: Option<AttackTarget>,
    /// Some(_) overrides the unit's charge intent
    pub charge_intent: Option<bool>,
}

impl Decision {
    pub fn hold() -> Self {
        Self {
            action: AiAction::Hold,
            target_position: None,
            target: None,
            charge_intent: None,
        }
    }

    pub fn move_to(position: Vec2) -> Self {
        Self {
            action: AiAction::Move,
            target_position: Some(position),
            target: None,
            charge_intent: None,
        }
    }

    pub fn attack(target: AttackTarget, approach: Option<Vec2>) -> Self {
        Self {
            action: AiAction::Attack,
            target_position: approach,
            target: Some(target),
            charge_intent: None,
        }
    }

    pub fn with_charge(mut self, charge: bool) -> Self {
        self.charge_intent = Some(charge);
        self
    }
}

/// Trait for tactical AI implementations
pub trait TacticalAi {
    fn decide(
        &self,
        unit: &BattleUnit,
        allies: &[BattleUnit],
        enemies: &[BattleUnit],
        map: &BattleMap,
    ) -> Decision;
}

/// Default rule set
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBasedAi;

impl TacticalAi for RuleBasedAi {
    fn decide(
        &self,
        unit: &BattleUnit,
        allies: &[BattleUnit],
        enemies: &[BattleUnit],
        map: &BattleMap,
    ) -> Decision {
        decide(unit, allies, enemies, map)
    }
}

/// Is `enemy` close enough for a defensive unit to react: near itself, or
/// already inside an ally's reach
fn threatens(unit: &BattleUnit, allies: &[BattleUnit], enemy: &BattleUnit) -> bool {
    let own_radius = unit.effective_attack_range() * DEFENSIVE_ENGAGE_FACTOR + enemy.collision_radius;
    if unit.position.distance(&enemy.position) <= own_radius {
        return true;
    }
    allies
        .iter()
        .filter(|a| a.is_alive() && a.id != unit.id)
        .any(|a| targeting::in_reach(enemy, a))
}

/// Category behaviour against the given enemies
fn by_category(unit: &BattleUnit, enemies: &[BattleUnit], map: &BattleMap) -> Decision {
    match unit.category {
        UnitCategory::Footman | UnitCategory::Spearman | UnitCategory::Halberd => {
            behaviors::melee(unit, enemies)
        }
        UnitCategory::Cavalry => behaviors::cavalry(unit, enemies),
        UnitCategory::Archer | UnitCategory::Caster => behaviors::ranged(unit, enemies, map),
        UnitCategory::Siege => behaviors::siege(unit, enemies, map),
    }
}

/// Decide what `unit` does this tick
pub fn decide(
    unit: &BattleUnit,
    allies: &[BattleUnit],
    enemies: &[BattleUnit],
    map: &BattleMap,
) -> Decision {
    if !unit.is_alive() {
        return Decision::hold();
    }
    if unit.stance == UnitStance::Retreat || unit.morale < RETREAT_MORALE_THRESHOLD {
        return behaviors::retreat(unit, map);
    }

    match unit.stance {
        UnitStance::Hold => behaviors::hold_position(unit, enemies),
        UnitStance::Defensive => {
            let nearby: Vec<BattleUnit> = enemies
                .iter()
                .filter(|e| e.is_alive() && threatens(unit, allies, e))
                .cloned()
                .collect();
            if nearby.is_empty() {
                Decision::hold().with_charge(false)
            } else {
                by_category(unit, &nearby, map)
            }
        }
        UnitStance::Aggressive | UnitStance::Retreat => by_category(unit, enemies, map),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::units::Side;

    fn at(side: Side, category: UnitCategory, x: f32) -> BattleUnit {
        BattleUnit::new(side, category, 100, Vec2::new(x, 300.0))
    }

    #[test]
    fn test_dead_unit_holds() {
        let mut me = at(Side::Attacker, UnitCategory::Footman, 100.0);
        me.troops = 0;
        let enemies = vec![at(Side::Defender, UnitCategory::Footman, 200.0)];
        let map = BattleMap::new(1000.0, 600.0);
        assert_eq!(decide(&me, &[], &enemies, &map).action, AiAction::Hold);
    }

    #[test]
    fn test_low_morale_retreats() {
        let mut me = at(Side::Attacker, UnitCategory::Footman, 400.0);
        me.morale = 10.0;
        let enemies = vec![at(Side::Defender, UnitCategory::Footman, 450.0)];
        let map = BattleMap::new(1000.0, 600.0);
        assert_eq!(decide(&me, &[], &enemies, &map).action, AiAction::Retreat);
    }

    #[test]
    fn test_hold_stance_never_moves() {
        let mut me = at(Side::Attacker, UnitCategory::Footman, 100.0);
        me.stance = UnitStance::Hold;
        let map = BattleMap::new(1000.0, 600.0);

        let far = vec![at(Side::Defender, UnitCategory::Footman, 600.0)];
        let decision = decide(&me, &[], &far, &map);
        assert_eq!(decision.action, AiAction::Hold);
        assert!(decision.target_position.is_none());

        let near = vec![at(Side::Defender, UnitCategory::Footman, 130.0)];
        let decision = decide(&me, &[], &near, &map);
        assert_eq!(decision.action, AiAction::Attack);
        assert!(decision.target_position.is_none());
    }

    #[test]
    fn test_defensive_ignores_distant_enemies() {
        let mut me = at(Side::Defender, UnitCategory::Footman, 800.0);
        me.stance = UnitStance::Defensive;
        let map = BattleMap::new(1000.0, 600.0);

        let far = vec![at(Side::Attacker, UnitCategory::Footman, 100.0)];
        assert_eq!(decide(&me, &[], &far, &map).action, AiAction::Hold);

        let close = vec![at(Side::Attacker, UnitCategory::Footman, 760.0)];
        assert_eq!(decide(&me, &[], &close, &map).action, AiAction::Attack);
    }

    #[test]
    fn test_defensive_covers_allies() {
        let mut me = at(Side::Defender, UnitCategory::Footman, 800.0);
        me.stance = UnitStance::Defensive;
        let ally = at(Side::Defender, UnitCategory::Archer, 500.0);
        let raider = at(Side::Attacker, UnitCategory::Footman, 470.0);
        let map = BattleMap::new(1000.0, 600.0);

        let decision = decide(&me, &[ally], std::slice::from_ref(&raider), &map);
        assert_eq!(decision.target, Some(AttackTarget::Unit(raider.id)));
    }

    #[test]
    fn test_trait_object_dispatch() {
        let ai: Box<dyn TacticalAi> = Box::new(RuleBasedAi);
        let me = at(Side::Attacker, UnitCategory::Footman, 100.0);
        let enemies = vec![at(Side::Defender, UnitCategory::Footman, 500.0)];
        let map = BattleMap::new(1000.0, 600.0);
        assert_eq!(ai.decide(&me, &[], &enemies, &map), decide(&me, &[], &enemies, &map));
    }
}
