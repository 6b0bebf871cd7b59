//! Battle system - real-time tactical combat on a continuous map
//!
//! Two rosters fight tick by tick until one side is gone, the objective
//! falls, or time runs out.
//!
//! Layers, leaves first:
//! - Tables: formations, traits, categories, fatigue levels
//! - Spatial: map, terrain, grid pathfinding
//! - Physics: movement, collision, range/FOV, damage
//! - Tactical AI: one decision per unit per tick
//! - Execution: the fixed-order tick over a whole battle

pub mod ai;
pub mod battle_map;
pub mod collision;
pub mod constants;
pub mod engagement;
pub mod execution;
pub mod fatigue;
pub mod formation;
pub mod movement;
pub mod pathfinding;
pub mod resolution;
pub mod roster;
pub mod snapshot;
pub mod terrain;
pub mod unit_traits;
pub mod unit_type;
pub mod units;

// Re-exports for convenient access
pub use ai::{decide, AiAction, Decision, RuleBasedAi, TacticalAi};
pub use battle_map::{BattleMap, DeploymentZone, Fortification, Gate};
pub use collision::{resolve_collisions, resolve_pair};
pub use constants::*;
pub use engagement::{
    is_in_attack_range, process_attack, process_gate_attack, AttackOutcome, AttackRejection,
};
pub use execution::{
    BattleEvent, BattleEventLog, BattleEventType, BattlePhase, BattleResult, BattleState,
    BattleStats, SideStats, VictoryReason, Winner,
};
pub use fatigue::{update_fatigue, FatigueLevel};
pub use formation::{compute_attack_direction, AttackDirection, FormationType};
pub use movement::{effective_speed, update_movement, MovementResult};
pub use pathfinding::{find_path, NavGrid};
pub use resolution::{calculate_damage, StrikeContext};
pub use roster::{generate_skirmish, RosterUnit, Skirmish};
pub use snapshot::{BattleSnapshot, MapSummary, UnitSnapshot};
pub use terrain::{TerrainKind, TerrainPatch};
pub use unit_traits::{check_charge_reflect, UnitTrait};
pub use unit_type::{category_advantage, UnitCategory};
pub use units::{AttackTarget, BattleUnit, Side, UnitId, UnitStance, UnitStats};
