//! The battle unit record
//!
//! One explicit record per unit holds everything the engine mutates each
//! tick, including per-unit scheduling state (cached path, formation
//! transition). Units never point back at their battle; algorithms receive
//! slices of units instead.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::battle::constants::{
    CASUALTY_MORALE_LOSS, DEFAULT_MORALE, DEFAULT_TRAINING, LEADERSHIP_WEIGHT,
    INTELLIGENCE_WEIGHT, MAX_EFFECTIVE_MORALE, STRENGTH_WEIGHT, VOLLEY_REARM_MS,
};
use crate::battle::fatigue::FatigueLevel;
use crate::battle::formation::{FormationTransition, FormationType};
use crate::battle::unit_traits::{range_multiplier, UnitTrait};
use crate::battle::unit_type::UnitCategory;
use crate::core::types::{SimMillis, Vec2};

/// Unique identifier for units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitId(pub Uuid);

impl UnitId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for UnitId {
    fn default() -> Self {
        Self::new()
    }
}

/// Which roster a unit belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Attacker,
    Defender,
}

impl Side {
    pub fn opposite(&self) -> Self {
        match self {
            Side::Attacker => Side::Defender,
            Side::Defender => Side::Attacker,
        }
    }
}

/// Standing orders for a unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum UnitStance {
    #[default]
    Aggressive, // Seek and engage
    Defensive, // Engage only what comes close
    Hold,      // Never move, fire at what is in range
    Retreat,   // Fall back to the deployment zone
}

/// Leadership / strength / intelligence triple
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnitStats {
    pub leadership: f32,
    pub strength: f32,
    pub intelligence: f32,
}

impl UnitStats {
    pub fn new(leadership: f32, strength: f32, intelligence: f32) -> Self {
        Self {
            leadership,
            strength,
            intelligence,
        }
    }

    /// Weighted stat average used by base damage
    pub fn weighted_average(&self) -> f32 {
        self.strength * STRENGTH_WEIGHT
            + self.leadership * LEADERSHIP_WEIGHT
            + self.intelligence * INTELLIGENCE_WEIGHT
    }
}

impl Default for UnitStats {
    fn default() -> Self {
        Self::new(50.0, 50.0, 50.0)
    }
}

/// What a unit is trying to hit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttackTarget {
    Unit(UnitId),
    /// Gate index on the map's fortification
    Gate(usize),
}

/// A unit on the battlefield
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleUnit {
    pub id: UnitId,
    pub name: String,
    pub side: Side,

    // Strength
    pub troops: u32,
    pub max_troops: u32,
    pub stats: UnitStats,
    pub category: UnitCategory,
    pub morale: f32,
    pub training: f32,
    pub tech_level: u32,

    // Kinematics
    pub position: Vec2,
    pub velocity: Vec2,
    pub facing: f32,
    pub target_position: Option<Vec2>,
    pub path: Vec<Vec2>,
    pub path_target: Option<Vec2>,
    pub collision_radius: f32,
    pub move_speed: f32,

    // Attack
    pub attack_target: Option<AttackTarget>,
    pub attack_range: f32,
    pub attack_cooldown_ms: u64,
    pub last_attack_at: Option<SimMillis>,

    // Formation
    pub formation: FormationType,
    pub transition: Option<FormationTransition>,
    pub is_vulnerable: bool,

    // Behaviour
    pub stance: UnitStance,
    pub is_charging: bool,
    /// Set by the tactical layer; movement only enters a charge while this holds
    pub charge_intent: bool,
    pub volley_ready: bool,
    pub fatigue: f32,
    pub fatigue_level: FatigueLevel,
    pub traits: Vec<UnitTrait>,
    pub ai_controlled: bool,

    // Per-tick scratch, recomputed every tick
    #[serde(default)]
    pub morale_bonus: f32,
    #[serde(default)]
    pub engaged_this_tick: bool,
    #[serde(default)]
    pub regen_carry: f32,
}

impl BattleUnit {
    /// Create a unit with category defaults filled in
    pub fn new(side: Side, category: UnitCategory, troops: u32, position: Vec2) -> Self {
        let props = category.default_properties();
        Self {
            id: UnitId::new(),
            name: String::new(),
            side,
            troops,
            max_troops: troops,
            stats: UnitStats::default(),
            category,
            morale: DEFAULT_MORALE,
            training: DEFAULT_TRAINING,
            tech_level: 1,
            position,
            velocity: Vec2::ZERO,
            facing: match side {
                Side::Attacker => 0.0,
                Side::Defender => std::f32::consts::PI,
            },
            target_position: None,
            path: Vec::new(),
            path_target: None,
            collision_radius: props.collision_radius,
            move_speed: props.move_speed,
            attack_target: None,
            attack_range: props.attack_range,
            attack_cooldown_ms: props.attack_cooldown_ms,
            last_attack_at: None,
            formation: FormationType::Line,
            transition: None,
            is_vulnerable: false,
            stance: UnitStance::Aggressive,
            is_charging: false,
            charge_intent: false,
            volley_ready: category.can_volley(),
            fatigue: 0.0,
            fatigue_level: FatigueLevel::Fresh,
            traits: category.default_traits(),
            ai_controlled: true,
            morale_bonus: 0.0,
            engaged_this_tick: false,
            regen_carry: 0.0,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.troops > 0
    }

    /// Current troops as a fraction of max
    pub fn troop_ratio(&self) -> f32 {
        if self.max_troops == 0 {
            return 0.0;
        }
        self.troops as f32 / self.max_troops as f32
    }

    /// Attack range including trait bonuses
    pub fn effective_attack_range(&self) -> f32 {
        self.attack_range * range_multiplier(&self.traits)
    }

    /// Morale as used by damage: aura bonus in, fatigue penalty out
    pub fn effective_morale(&self) -> f32 {
        let penalty = self.fatigue_level.effects().morale_penalty;
        (self.morale + self.morale_bonus - penalty).clamp(0.0, MAX_EFFECTIVE_MORALE)
    }

    pub fn cooldown_ready(&self, now: SimMillis) -> bool {
        match self.last_attack_at {
            None => true,
            Some(last) => now >= last + self.attack_cooldown_ms,
        }
    }

    /// Point the unit somewhere new; the cached path is dropped lazily by
    /// movement when the target differs from the path target
    pub fn set_move_target(&mut self, target: Option<Vec2>) {
        self.target_position = target;
        if target.is_none() {
            self.path.clear();
            self.path_target = None;
            self.velocity = Vec2::ZERO;
        }
    }

    /// Begin switching formation
    pub fn set_formation(&mut self, formation: FormationType, now: SimMillis) {
        let pending = self.transition.map(|t| t.target);
        if pending == Some(formation) || (pending.is_none() && self.formation == formation) {
            return;
        }
        self.formation = formation;
        self.transition = Some(FormationTransition::begin(formation, now));
        self.is_vulnerable = false;
    }

    /// Refresh the transition timer and vulnerable flag
    pub fn update_transition(&mut self, now: SimMillis) {
        match self.transition {
            Some(t) if t.is_complete(now) => {
                self.transition = None;
                self.is_vulnerable = false;
            }
            Some(t) => self.is_vulnerable = t.is_vulnerable(now),
            None => self.is_vulnerable = false,
        }
    }

    pub fn is_transitioning(&self) -> bool {
        self.transition.is_some()
    }

    /// Remove troops, returning how many were actually lost
    pub fn apply_casualties(&mut self, damage: u32) -> u32 {
        let lost = damage.min(self.troops);
        self.troops -= lost;
        if lost > 0 && self.max_troops > 0 {
            let loss = CASUALTY_MORALE_LOSS * lost as f32 / self.max_troops as f32;
            self.morale = (self.morale - loss).max(0.0);
        }
        if self.troops == 0 {
            self.velocity = Vec2::ZERO;
            self.target_position = None;
            self.path.clear();
            self.is_charging = false;
        }
        lost
    }

    /// Re-arm the volley after a quiet spell
    pub fn rearm_volley(&mut self, now: SimMillis) {
        if self.volley_ready || !self.category.can_volley() {
            return;
        }
        let quiet = self
            .last_attack_at
            .map_or(true, |last| now >= last + VOLLEY_REARM_MS);
        if quiet {
            self.volley_ready = true;
        }
    }
}
