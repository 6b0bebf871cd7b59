//! Roster snapshot input and skirmish generation
//!
//! Provisioning happens outside the engine. What arrives is a roster of
//! `RosterUnit`s with optional fields; defaults are filled exactly once when
//! they become `BattleUnit`s.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::battle::battle_map::{BattleMap, DeploymentZone};
use crate::battle::constants::{DEFAULT_MORALE, DEFAULT_TRAINING};
use crate::battle::fatigue::FatigueLevel;
use crate::battle::formation::FormationType;
use crate::battle::unit_traits::UnitTrait;
use crate::battle::unit_type::UnitCategory;
use crate::battle::units::{BattleUnit, Side, UnitId, UnitStance, UnitStats};
use crate::core::types::Vec2;

fn default_morale() -> f32 {
    DEFAULT_MORALE
}

fn default_training() -> f32 {
    DEFAULT_TRAINING
}

fn default_tech_level() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

/// One unit as delivered by the provisioning layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterUnit {
    #[serde(default)]
    pub id: Option<UnitId>,
    #[serde(default)]
    pub name: String,
    pub troops: u32,
    #[serde(default)]
    pub max_troops: Option<u32>,
    #[serde(default)]
    pub stats: UnitStats,
    pub category: UnitCategory,
    #[serde(default = "default_morale")]
    pub morale: f32,
    #[serde(default = "default_training")]
    pub training: f32,
    #[serde(default = "default_tech_level")]
    pub tech_level: u32,
    pub position: Vec2,
    #[serde(default)]
    pub facing: Option<f32>,
    #[serde(default)]
    pub formation: Option<FormationType>,
    #[serde(default)]
    pub stance: Option<UnitStance>,
    #[serde(default)]
    pub fatigue: Option<f32>,
    #[serde(default)]
    pub traits: Option<Vec<UnitTrait>>,
    #[serde(default = "default_true")]
    pub ai_controlled: bool,
}

impl RosterUnit {
    pub fn new(category: UnitCategory, troops: u32, position: Vec2) -> Self {
        Self {
            id: None,
            name: String::new(),
            troops,
            max_troops: None,
            stats: UnitStats::default(),
            category,
            morale: DEFAULT_MORALE,
            training: DEFAULT_TRAINING,
            tech_level: 1,
            position,
            facing: None,
            formation: None,
            stance: None,
            fatigue: None,
            traits: None,
            ai_controlled: true,
        }
    }
}

impl BattleUnit {
    /// Build a battle unit from a roster entry, filling every missing field
    pub fn from_roster(side: Side, roster: &RosterUnit, map: &BattleMap) -> Self {
        let mut unit = BattleUnit::new(side, roster.category, roster.troops, map.clamp(roster.position));
        if let Some(id) = roster.id {
            unit.id = id;
        }
        unit.name = if roster.name.is_empty() {
            format!("{:?} {:?}", side, roster.category)
        } else {
            roster.name.clone()
        };
        unit.max_troops = roster.max_troops.unwrap_or(roster.troops).max(roster.troops);
        unit.stats = roster.stats;
        unit.morale = roster.morale;
        unit.training = roster.training;
        unit.tech_level = roster.tech_level;
        if let Some(facing) = roster.facing {
            unit.facing = facing;
        }
        unit.formation = roster.formation.unwrap_or_default();
        unit.stance = roster.stance.unwrap_or_default();
        unit.fatigue = roster.fatigue.unwrap_or(0.0).clamp(0.0, 100.0);
        unit.fatigue_level = FatigueLevel::from_value(unit.fatigue);
        match &roster.traits {
            Some(traits) if !traits.is_empty() => unit.traits = traits.clone(),
            _ => {}
        }
        unit.ai_controlled = roster.ai_controlled;
        unit
    }
}

/// Two rosters ready to be placed on a map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skirmish {
    pub attackers: Vec<RosterUnit>,
    pub defenders: Vec<RosterUnit>,
}

const SKIRMISH_MIX: [UnitCategory; 7] = [
    UnitCategory::Footman,
    UnitCategory::Footman,
    UnitCategory::Spearman,
    UnitCategory::Halberd,
    UnitCategory::Cavalry,
    UnitCategory::Archer,
    UnitCategory::Caster,
];

fn random_roster(rng: &mut ChaCha8Rng, count: usize, zone: &DeploymentZone) -> Vec<RosterUnit> {
    (0..count)
        .map(|i| {
            let category = SKIRMISH_MIX[rng.gen_range(0..SKIRMISH_MIX.len())];
            let troops = rng.gen_range(60..=140);
            let position = Vec2::new(
                rng.gen_range(zone.min.x..=zone.max.x),
                rng.gen_range(zone.min.y..=zone.max.y),
            );
            let mut unit = RosterUnit::new(category, troops, position);
            unit.name = format!("{:?} {}", category, i + 1);
            unit.stats = UnitStats::new(
                rng.gen_range(30.0..70.0),
                rng.gen_range(30.0..70.0),
                rng.gen_range(30.0..70.0),
            );
            unit.training = rng.gen_range(30.0..70.0);
            unit
        })
        .collect()
}

/// Generate two mixed rosters inside the map's deployment zones.
///
/// The same seed always yields the same rosters.
pub fn generate_skirmish(seed: u64, units_per_side: usize, map: &BattleMap) -> Skirmish {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let attackers = random_roster(&mut rng, units_per_side, &map.attacker_deployment);
    let defenders = random_roster(&mut rng, units_per_side, &map.defender_deployment);
    Skirmish {
        attackers,
        defenders,
    }
}
