//! Battle execution loop
//!
//! Each tick: decisions -> movement -> collision -> combat -> attrition ->
//! victory check. Everything runs in a fixed order over the two rosters, so
//! a battle replays identically from the same starting state.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::battle::ai::{Decision, RuleBasedAi, TacticalAi};
use crate::battle::battle_map::{BattleMap, Fortification};
use crate::battle::collision::resolve_collisions;
use crate::battle::engagement::{process_attack, process_gate_attack, AttackOutcome};
use crate::battle::fatigue::update_fatigue;
use crate::battle::formation::FormationType;
use crate::battle::movement::update_movement;
use crate::battle::pathfinding::NavGrid;
use crate::battle::roster::RosterUnit;
use crate::battle::unit_traits::{morale_aura, regeneration_rate};
use crate::battle::units::{AttackTarget, BattleUnit, Side, UnitId};
use crate::core::config::EngineConfig;
use crate::core::error::{ArcError, Result};
use crate::core::types::{BattleId, SimMillis, Tick, Vec2};

/// Battle phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BattlePhase {
    #[default]
    Planning, // Rosters being assembled
    Deployment, // Units placed, ready to fight
    Active,     // Battle in progress
    Finished,   // Battle over
}

/// Who won
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Winner {
    Attacker,
    Defender,
    Draw,
}

/// Why the battle ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VictoryReason {
    /// One or both sides fully reduced
    Annihilation,
    /// The designated fortification fell
    ObjectiveDestroyed,
    /// Max ticks reached; decided on remaining troops
    TimeLimit,
}

/// Per-side combat counters, in troops
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SideStats {
    pub troops_inflicted: u64,
    pub troops_lost: u64,
    pub troops_regenerated: u64,
    pub attacks: u64,
    pub charges_landed: u64,
    pub gate_damage: f32,
    pub units_lost: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BattleStats {
    pub attackers: SideStats,
    pub defenders: SideStats,
}

impl BattleStats {
    pub fn side(&self, side: Side) -> &SideStats {
        match side {
            Side::Attacker => &self.attackers,
            Side::Defender => &self.defenders,
        }
    }
}

/// Terminal record written back to the store and the replay sink
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleResult {
    pub battle_id: BattleId,
    pub winner: Winner,
    pub reason: VictoryReason,
    pub ticks: Tick,
    pub attacker_troops: u64,
    pub defender_troops: u64,
    pub stats: BattleStats,
}

/// Log entry for battle events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleEvent {
    pub tick: Tick,
    pub event_type: BattleEventType,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BattleEventType {
    BattleStarted,
    UnitDestroyed { unit_id: UnitId },
    ChargeLanded { unit_id: UnitId, target_id: UnitId },
    ChargeReflected { unit_id: UnitId, troops: u32 },
    GateBreached { gate: usize },
    FormationChanged { unit_id: UnitId, formation: FormationType },
    CommandIssued { unit_id: UnitId },
    BattleEnded { winner: Winner },
}

/// Log of events from a single tick
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BattleEventLog {
    pub events: Vec<BattleEvent>,
}

impl BattleEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event_type: BattleEventType, description: String, tick: Tick) {
        self.events.push(BattleEvent {
            tick,
            event_type,
            description,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Complete battle state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BattleState {
    pub id: BattleId,
    pub map: BattleMap,
    pub attackers: Vec<BattleUnit>,
    pub defenders: Vec<BattleUnit>,

    // Time
    pub tick: Tick,
    pub phase: BattlePhase,
    pub winner: Option<Winner>,
    pub result: Option<BattleResult>,

    pub config: EngineConfig,
    pub stats: BattleStats,

    // Log
    pub battle_log: Vec<BattleEvent>,

    /// Built lazily from the map; never persisted
    #[serde(skip)]
    nav_grid: Option<NavGrid>,
}

/// Shared arguments for one side's combat pass
struct CombatPass {
    tick: Tick,
    now: SimMillis,
    fov_degrees: f32,
}

impl BattleState {
    pub fn new(
        map: BattleMap,
        attackers: Vec<BattleUnit>,
        defenders: Vec<BattleUnit>,
        config: EngineConfig,
    ) -> Self {
        Self {
            id: BattleId::new(),
            map,
            attackers,
            defenders,
            tick: 0,
            phase: BattlePhase::Planning,
            winner: None,
            result: None,
            config,
            stats: BattleStats::default(),
            battle_log: Vec::new(),
            nav_grid: None,
        }
    }

    /// Build a battle from roster snapshots, filling unit defaults
    pub fn from_rosters(
        map: BattleMap,
        attackers: &[RosterUnit],
        defenders: &[RosterUnit],
        config: EngineConfig,
    ) -> Self {
        let attackers = attackers
            .iter()
            .map(|r| BattleUnit::from_roster(Side::Attacker, r, &map))
            .collect();
        let defenders = defenders
            .iter()
            .map(|r| BattleUnit::from_roster(Side::Defender, r, &map))
            .collect();
        Self::new(map, attackers, defenders, config)
    }

    /// Is the battle finished?
    pub fn is_finished(&self) -> bool {
        matches!(self.phase, BattlePhase::Finished)
    }

    /// Simulated time at the current tick
    pub fn now_ms(&self) -> SimMillis {
        self.tick * self.config.tick_ms
    }

    /// Planning -> Deployment
    pub fn deploy(&mut self) {
        if self.phase == BattlePhase::Planning {
            self.phase = BattlePhase::Deployment;
        }
    }

    /// Deployment -> Active
    pub fn begin(&mut self) {
        if self.phase == BattlePhase::Active || self.is_finished() {
            return;
        }
        self.phase = BattlePhase::Active;
        info!(
            battle = %self.id,
            attackers = self.attackers.len(),
            defenders = self.defenders.len(),
            "Battle started"
        );
        self.log_event(BattleEventType::BattleStarted, "Battle has begun!".into());
    }

    /// Log a battle event
    pub fn log_event(&mut self, event_type: BattleEventType, description: String) {
        self.battle_log.push(BattleEvent {
            tick: self.tick,
            event_type,
            description,
        });
    }

    /// Get a unit from either roster
    pub fn get_unit(&self, unit_id: UnitId) -> Option<&BattleUnit> {
        self.attackers
            .iter()
            .chain(self.defenders.iter())
            .find(|u| u.id == unit_id)
    }

    /// Get a mutable unit from either roster
    pub fn get_unit_mut(&mut self, unit_id: UnitId) -> Option<&mut BattleUnit> {
        self.attackers
            .iter_mut()
            .chain(self.defenders.iter_mut())
            .find(|u| u.id == unit_id)
    }

    pub fn units(&self, side: Side) -> &[BattleUnit] {
        match side {
            Side::Attacker => &self.attackers,
            Side::Defender => &self.defenders,
        }
    }

    /// Remaining troops on one side
    pub fn living_troops(&self, side: Side) -> u64 {
        self.units(side).iter().map(|u| u64::from(u.troops)).sum()
    }

    pub fn side_alive(&self, side: Side) -> bool {
        self.units(side).iter().any(|u| u.is_alive())
    }

    /// Explicit move order. The unit leaves AI control.
    pub fn command_move(&mut self, unit_id: UnitId, target: Option<Vec2>) -> Result<()> {
        let unit = self
            .get_unit_mut(unit_id)
            .ok_or(ArcError::UnitNotFound(unit_id))?;
        unit.ai_controlled = false;
        unit.set_move_target(target);
        let name = unit.name.clone();
        self.log_event(
            BattleEventType::CommandIssued { unit_id },
            format!("{} ordered to {:?}", name, target),
        );
        Ok(())
    }

    /// Hand a unit back to the tactical AI
    pub fn release_to_ai(&mut self, unit_id: UnitId) -> Result<()> {
        let unit = self
            .get_unit_mut(unit_id)
            .ok_or(ArcError::UnitNotFound(unit_id))?;
        unit.ai_controlled = true;
        Ok(())
    }

    /// Start a formation change
    pub fn order_formation(&mut self, unit_id: UnitId, formation: FormationType) -> Result<()> {
        let now = self.now_ms();
        let unit = self
            .get_unit_mut(unit_id)
            .ok_or(ArcError::UnitNotFound(unit_id))?;
        unit.set_formation(formation, now);
        let name = unit.name.clone();
        self.log_event(
            BattleEventType::FormationChanged { unit_id, formation },
            format!("{} forms {:?}", name, formation),
        );
        Ok(())
    }

    /// Run a complete battle tick
    pub fn run_tick(&mut self) -> BattleEventLog {
        let mut events = BattleEventLog::new();

        if self.is_finished() {
            return events;
        }
        if self.phase != BattlePhase::Active {
            self.begin();
        }

        let now = self.now_ms();
        let grid = match self.nav_grid.take() {
            Some(grid) => grid,
            None => NavGrid::build(&self.map, self.config.grid_cell_size),
        };

        for unit in self.attackers.iter_mut().chain(self.defenders.iter_mut()) {
            unit.engaged_this_tick = false;
        }

        // ===== PHASE 1: DECISIONS =====
        self.phase_decisions(&RuleBasedAi);

        // ===== PHASE 2: MOVEMENT =====
        for unit in self.attackers.iter_mut().chain(self.defenders.iter_mut()) {
            update_movement(unit, &self.map, &grid, now, &self.config);
        }

        // ===== PHASE 3: COLLISION =====
        resolve_collisions(&mut self.attackers, &mut self.defenders, &self.map);

        // ===== PHASE 4: COMBAT =====
        let pass = CombatPass {
            tick: self.tick,
            now,
            fov_degrees: self.config.default_fov_degrees,
        };
        resolve_side_attacks(
            &mut self.attackers,
            &mut self.defenders,
            self.map.fortification.as_mut(),
            &mut self.stats.attackers,
            &mut self.stats.defenders,
            &pass,
            &mut events,
        );
        resolve_side_attacks(
            &mut self.defenders,
            &mut self.attackers,
            None,
            &mut self.stats.defenders,
            &mut self.stats.attackers,
            &pass,
            &mut events,
        );

        // ===== PHASE 5: ATTRITION =====
        self.phase_attrition(now);

        self.nav_grid = Some(grid);
        self.tick += 1;

        // ===== PHASE 6: VICTORY =====
        if let Some((winner, reason)) = self.evaluate_victory() {
            self.finish(winner, reason, &mut events);
        }

        self.battle_log.extend(events.events.iter().cloned());
        events
    }

    /// Run until a victory condition holds
    pub fn run_to_completion(&mut self) -> BattleResult {
        while !self.is_finished() {
            self.run_tick();
        }
        match &self.result {
            Some(result) => result.clone(),
            None => self.build_result(
                self.winner.unwrap_or(Winner::Draw),
                VictoryReason::TimeLimit,
            ),
        }
    }

    /// Ask the tactical layer for every AI-controlled unit, then apply
    pub fn phase_decisions(&mut self, ai: &dyn TacticalAi) {
        let retarget_distance = self.config.grid_cell_size;
        for side in [Side::Attacker, Side::Defender] {
            let decisions: Vec<(usize, Decision)> = {
                let (allies, enemies) = match side {
                    Side::Attacker => (&self.attackers, &self.defenders),
                    Side::Defender => (&self.defenders, &self.attackers),
                };
                allies
                    .iter()
                    .enumerate()
                    .filter(|(_, u)| u.is_alive() && u.ai_controlled)
                    .map(|(i, u)| (i, ai.decide(u, allies, enemies, &self.map)))
                    .collect()
            };

            let (units, enemies) = match side {
                Side::Attacker => (&mut self.attackers, &self.defenders),
                Side::Defender => (&mut self.defenders, &self.attackers),
            };
            for (index, decision) in decisions {
                let Some(unit) = units.get_mut(index) else {
                    continue;
                };
                apply_decision(unit, &decision, enemies, &self.map, retarget_distance);
            }
        }
    }

    fn phase_attrition(&mut self, now: SimMillis) {
        let dt = self.config.tick_seconds();
        for side in [Side::Attacker, Side::Defender] {
            let auras: Vec<(UnitId, Vec2, f32, f32)> = self
                .units(side)
                .iter()
                .filter(|u| u.is_alive())
                .filter_map(|u| morale_aura(&u.traits).map(|(r, b)| (u.id, u.position, r, b)))
                .collect();

            let (units, stats) = match side {
                Side::Attacker => (&mut self.attackers, &mut self.stats.attackers),
                Side::Defender => (&mut self.defenders, &mut self.stats.defenders),
            };

            for unit in units.iter_mut().filter(|u| u.is_alive()) {
                unit.morale_bonus = auras
                    .iter()
                    .filter(|(id, pos, radius, _)| {
                        *id != unit.id && pos.distance(&unit.position) <= *radius
                    })
                    .map(|(_, _, _, bonus)| *bonus)
                    .fold(0.0, f32::max);

                update_fatigue(unit, dt);

                let rate = regeneration_rate(&unit.traits);
                if rate > 0.0 && unit.troops < unit.max_troops {
                    unit.regen_carry += rate * dt;
                    let whole = unit.regen_carry.floor();
                    unit.regen_carry -= whole;
                    let restored = (whole as u32).min(unit.max_troops - unit.troops);
                    unit.troops += restored;
                    stats.troops_regenerated += restored as u64;
                }

                unit.rearm_volley(now);
            }
        }
    }

    /// Victory predicate, evaluated after the tick counter advances
    pub fn evaluate_victory(&self) -> Option<(Winner, VictoryReason)> {
        let attackers_alive = self.side_alive(Side::Attacker);
        let defenders_alive = self.side_alive(Side::Defender);

        match (attackers_alive, defenders_alive) {
            (false, false) => return Some((Winner::Draw, VictoryReason::Annihilation)),
            (true, false) => return Some((Winner::Attacker, VictoryReason::Annihilation)),
            (false, true) => return Some((Winner::Defender, VictoryReason::Annihilation)),
            (true, true) => {}
        }

        if self.map.objective_destroyed() {
            return Some((Winner::Attacker, VictoryReason::ObjectiveDestroyed));
        }

        if self.tick >= self.config.max_ticks {
            let attacker_troops = self.living_troops(Side::Attacker);
            let defender_troops = self.living_troops(Side::Defender);
            let winner = match attacker_troops.cmp(&defender_troops) {
                std::cmp::Ordering::Greater => Winner::Attacker,
                std::cmp::Ordering::Less => Winner::Defender,
                std::cmp::Ordering::Equal => Winner::Draw,
            };
            return Some((winner, VictoryReason::TimeLimit));
        }

        None
    }

    fn build_result(&self, winner: Winner, reason: VictoryReason) -> BattleResult {
        BattleResult {
            battle_id: self.id,
            winner,
            reason,
            ticks: self.tick,
            attacker_troops: self.living_troops(Side::Attacker),
            defender_troops: self.living_troops(Side::Defender),
            stats: self.stats.clone(),
        }
    }

    /// End the battle with a winner
    fn finish(&mut self, winner: Winner, reason: VictoryReason, events: &mut BattleEventLog) {
        self.phase = BattlePhase::Finished;
        self.winner = Some(winner);
        let result = self.build_result(winner, reason);
        info!(
            battle = %self.id,
            ?winner,
            ?reason,
            ticks = self.tick,
            attacker_troops = result.attacker_troops,
            defender_troops = result.defender_troops,
            "Battle ended"
        );
        events.push(
            BattleEventType::BattleEnded { winner },
            format!("Battle ended: {:?} ({:?})", winner, reason),
            self.tick,
        );
        self.result = Some(result);
    }
}

/// Turn a decision into movement and attack targets
fn apply_decision(
    unit: &mut BattleUnit,
    decision: &Decision,
    enemies: &[BattleUnit],
    map: &BattleMap,
    retarget_distance: f32,
) {
    unit.attack_target = decision.target;

    if let Some(charge) = decision.charge_intent {
        unit.charge_intent = charge;
        if !charge {
            unit.is_charging = false;
        }
    }

    match decision.target_position {
        Some(position) => {
            let stale = unit
                .target_position
                .map_or(true, |current| current.distance(&position) > retarget_distance);
            if stale {
                unit.set_move_target(Some(position));
            }
        }
        None => {
            unit.set_move_target(None);
            // Standing units turn to face what they are shooting at
            let aim = match decision.target {
                Some(AttackTarget::Unit(id)) => enemies
                    .iter()
                    .find(|e| e.id == id)
                    .map(|e| e.position),
                Some(AttackTarget::Gate(index)) => map
                    .fortification
                    .as_ref()
                    .and_then(|fort| fort.gate_position(index)),
                None => None,
            };
            if let Some(aim) = aim {
                if aim.distance(&unit.position) > 1e-3 {
                    unit.facing = unit.position.bearing_to(&aim);
                }
            }
        }
    }
}

/// Book one landed strike
fn record_strike(
    striker: &BattleUnit,
    target: &BattleUnit,
    outcome: &AttackOutcome,
    striker_stats: &mut SideStats,
    target_stats: &mut SideStats,
    tick: Tick,
    events: &mut BattleEventLog,
) {
    striker_stats.attacks += 1;
    striker_stats.troops_inflicted += outcome.troops_lost as u64;
    target_stats.troops_lost += outcome.troops_lost as u64;

    if outcome.charge_landed {
        striker_stats.charges_landed += 1;
        events.push(
            BattleEventType::ChargeLanded {
                unit_id: striker.id,
                target_id: target.id,
            },
            format!("{} charges into {}", striker.name, target.name),
            tick,
        );
    }

    if outcome.reflected > 0 {
        target_stats.troops_inflicted += outcome.reflected as u64;
        striker_stats.troops_lost += outcome.reflected as u64;
        events.push(
            BattleEventType::ChargeReflected {
                unit_id: striker.id,
                troops: outcome.reflected,
            },
            format!("{} loses {} on the spears", striker.name, outcome.reflected),
            tick,
        );
    }

    if outcome.target_destroyed {
        target_stats.units_lost += 1;
        debug!(unit = %target.name, by = %striker.name, tick, "Unit destroyed");
        events.push(
            BattleEventType::UnitDestroyed { unit_id: target.id },
            format!("{} destroyed by {}", target.name, striker.name),
            tick,
        );
    }

    if !striker.is_alive() {
        striker_stats.units_lost += 1;
        debug!(unit = %striker.name, tick, "Unit destroyed by reflected charge");
        events.push(
            BattleEventType::UnitDestroyed {
                unit_id: striker.id,
            },
            format!("{} destroyed charging {}", striker.name, target.name),
            tick,
        );
    }
}

/// Try a gate; true if the strike landed
fn strike_gate(
    striker: &mut BattleUnit,
    fort: &mut Fortification,
    gate: usize,
    striker_stats: &mut SideStats,
    pass: &CombatPass,
    events: &mut BattleEventLog,
) -> bool {
    match process_gate_attack(striker, fort, gate, pass.now, pass.fov_degrees) {
        Ok(strike) => {
            striker_stats.attacks += 1;
            striker_stats.gate_damage += strike.damage;
            if strike.gate_destroyed {
                info!(gate, by = %striker.name, tick = pass.tick, "Gate breached");
                events.push(
                    BattleEventType::GateBreached { gate },
                    format!("Gate {} breached by {}", gate, striker.name),
                    pass.tick,
                );
            }
            true
        }
        Err(_) => false,
    }
}

/// Every living striker tries its chosen target first, then every opposing
/// unit in roster order, then (attacking side only) any gate in reach
fn resolve_side_attacks(
    strikers: &mut [BattleUnit],
    targets: &mut [BattleUnit],
    mut fortification: Option<&mut Fortification>,
    striker_stats: &mut SideStats,
    target_stats: &mut SideStats,
    pass: &CombatPass,
    events: &mut BattleEventLog,
) {
    for striker in strikers.iter_mut() {
        if !striker.is_alive() || !striker.cooldown_ready(pass.now) {
            continue;
        }

        if let (Some(AttackTarget::Gate(gate)), Some(fort)) =
            (striker.attack_target, fortification.as_deref_mut())
        {
            if strike_gate(striker, fort, gate, striker_stats, pass, events) {
                continue;
            }
        }

        let preferred = match striker.attack_target {
            Some(AttackTarget::Unit(id)) => targets.iter().position(|t| t.id == id),
            _ => None,
        };
        let order: Vec<usize> = preferred
            .into_iter()
            .chain((0..targets.len()).filter(|j| Some(*j) != preferred))
            .collect();

        let mut landed = false;
        for j in order {
            let target = &mut targets[j];
            if let Ok(outcome) = process_attack(striker, target, pass.now, pass.fov_degrees) {
                record_strike(
                    striker,
                    target,
                    &outcome,
                    striker_stats,
                    target_stats,
                    pass.tick,
                    events,
                );
                landed = true;
                break;
            }
            if !striker.is_alive() {
                break;
            }
        }
        if landed {
            continue;
        }

        if let Some(fort) = fortification.as_deref_mut() {
            for gate in 0..fort.gates.len() {
                if strike_gate(striker, fort, gate, striker_stats, pass, events) {
                    break;
                }
            }
        }
    }
}
