//! Fatigue accumulation and fatigue levels
//!
//! Running tires a unit fastest, fighting tires it more slowly, walking and
//! standing still let it recover. The raw 0-100 value buckets into six levels
//! that carry fixed multipliers.

use serde::{Deserialize, Serialize};

use crate::battle::constants::{
    FATIGUE_MAX, FATIGUE_RATE_FIGHTING, FATIGUE_RATE_RUNNING, FATIGUE_RECOVERY_IDLE,
    FATIGUE_RECOVERY_WALKING, RUNNING_SPEED_FRACTION,
};
use crate::battle::unit_traits::fatigue_rate_multiplier;
use crate::battle::units::BattleUnit;

/// Bucketed fatigue
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum FatigueLevel {
    #[default]
    Fresh,
    Warmed,
    Tired,
    Weary,
    Fatigued,
    Exhausted,
}

/// Fixed effects of a fatigue level
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FatigueEffects {
    pub speed: f32,
    pub attack: f32,
    /// Divides incoming damage; below 1.0 means the unit takes more
    pub defense: f32,
    pub morale_penalty: f32,
}

impl FatigueLevel {
    pub fn from_value(fatigue: f32) -> Self {
        match fatigue {
            f if f < 20.0 => FatigueLevel::Fresh,
            f if f < 40.0 => FatigueLevel::Warmed,
            f if f < 60.0 => FatigueLevel::Tired,
            f if f < 75.0 => FatigueLevel::Weary,
            f if f < 90.0 => FatigueLevel::Fatigued,
            _ => FatigueLevel::Exhausted,
        }
    }

    pub fn effects(&self) -> FatigueEffects {
        let (speed, attack, defense, morale_penalty) = match self {
            FatigueLevel::Fresh => (1.0, 1.0, 1.0, 0.0),
            FatigueLevel::Warmed => (1.0, 1.05, 1.0, 0.0),
            FatigueLevel::Tired => (0.9, 0.95, 0.95, 5.0),
            FatigueLevel::Weary => (0.8, 0.85, 0.9, 10.0),
            FatigueLevel::Fatigued => (0.7, 0.75, 0.8, 20.0),
            FatigueLevel::Exhausted => (0.5, 0.6, 0.7, 35.0),
        };
        FatigueEffects {
            speed,
            attack,
            defense,
            morale_penalty,
        }
    }
}

/// What a unit spent the tick doing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activity {
    Running,
    Fighting,
    Walking,
    Idle,
}

/// Classify a unit's activity for this tick. Running outranks fighting.
pub fn classify_activity(unit: &BattleUnit) -> Activity {
    let speed = unit.velocity.length();
    if speed > 0.0 && speed >= unit.move_speed * RUNNING_SPEED_FRACTION {
        Activity::Running
    } else if unit.engaged_this_tick {
        Activity::Fighting
    } else if speed > 0.0 {
        Activity::Walking
    } else {
        Activity::Idle
    }
}

/// Base fatigue change per second for an activity
pub fn activity_rate(activity: Activity) -> f32 {
    match activity {
        Activity::Running => FATIGUE_RATE_RUNNING,
        Activity::Fighting => FATIGUE_RATE_FIGHTING,
        Activity::Walking => -FATIGUE_RECOVERY_WALKING,
        Activity::Idle => -FATIGUE_RECOVERY_IDLE,
    }
}

/// Advance a unit's fatigue by `dt_seconds`
pub fn update_fatigue(unit: &mut BattleUnit, dt_seconds: f32) {
    let rate = activity_rate(classify_activity(unit)) * fatigue_rate_multiplier(&unit.traits);
    if rate == 0.0 {
        return;
    }
    unit.fatigue = (unit.fatigue + rate * dt_seconds).clamp(0.0, FATIGUE_MAX);
    unit.fatigue_level = FatigueLevel::from_value(unit.fatigue);
}
