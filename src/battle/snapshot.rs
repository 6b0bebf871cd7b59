//! Per-tick observer snapshots
//!
//! A snapshot is a flat, serialisable view of the living units plus a map
//! summary. It is what observers receive; the full state stays with the
//! scheduler.

use serde::{Deserialize, Serialize};

use crate::battle::execution::{BattlePhase, BattleState, Winner};
use crate::battle::formation::FormationType;
use crate::battle::unit_type::UnitCategory;
use crate::battle::units::{AttackTarget, BattleUnit, Side, UnitId};
use crate::core::error::Result;
use crate::core::types::{BattleId, Tick, Vec2};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitSnapshot {
    pub id: UnitId,
    pub side: Side,
    pub category: UnitCategory,
    pub position: Vec2,
    pub velocity: Vec2,
    pub facing: f32,
    pub troops: u32,
    pub morale: f32,
    pub target_position: Option<Vec2>,
    pub attack_target: Option<AttackTarget>,
    pub formation: FormationType,
    pub is_charging: bool,
}

impl From<&BattleUnit> for UnitSnapshot {
    fn from(unit: &BattleUnit) -> Self {
        Self {
            id: unit.id,
            side: unit.side,
            category: unit.category,
            position: unit.position,
            velocity: unit.velocity,
            facing: unit.facing,
            troops: unit.troops,
            morale: unit.morale,
            target_position: unit.target_position,
            attack_target: unit.attack_target,
            formation: unit.formation,
            is_charging: unit.is_charging,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateSummary {
    pub index: usize,
    pub position: Vec2,
    pub hp: f32,
    pub max_hp: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapSummary {
    pub width: f32,
    pub height: f32,
    pub gates: Vec<GateSummary>,
    pub objective_destroyed: bool,
}

/// What observers receive each tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleSnapshot {
    pub battle_id: BattleId,
    pub tick: Tick,
    pub phase: BattlePhase,
    pub winner: Option<Winner>,
    pub units: Vec<UnitSnapshot>,
    pub map: MapSummary,
}

impl BattleSnapshot {
    pub fn capture(state: &BattleState) -> Self {
        let units = state
            .attackers
            .iter()
            .chain(state.defenders.iter())
            .filter(|u| u.is_alive())
            .map(UnitSnapshot::from)
            .collect();

        let gates: Vec<GateSummary> = state
            .map
            .fortification
            .as_ref()
            .map(|fort| {
                fort.gates
                    .iter()
                    .enumerate()
                    .filter_map(|(index, gate)| {
                        fort.gate_position(index).map(|position| GateSummary {
                            index,
                            position,
                            hp: gate.hp,
                            max_hp: gate.max_hp,
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            battle_id: state.id,
            tick: state.tick,
            phase: state.phase,
            winner: state.winner,
            units,
            map: MapSummary {
                width: state.map.width,
                height: state.map.height,
                gates,
                objective_destroyed: state.map.objective_destroyed(),
            },
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn living_count(&self, side: Side) -> usize {
        self.units.iter().filter(|u| u.side == side).count()
    }
}
