//! Battle system constants - all tunable values in one place
//!
//! Distances are world units, durations are simulated milliseconds,
//! rates are per simulated second.

// Damage pipeline
pub const STRENGTH_WEIGHT: f32 = 0.4;
pub const LEADERSHIP_WEIGHT: f32 = 0.3;
pub const INTELLIGENCE_WEIGHT: f32 = 0.3;
pub const BASE_DAMAGE_DIVISOR: f32 = 10.0;
pub const VOLLEY_BONUS: f32 = 1.3;
pub const CHARGE_BONUS: f32 = 1.5;
pub const VULNERABLE_DAMAGE_MULTIPLIER: f32 = 1.3;
pub const TRAINING_MITIGATION_DIVISOR: f32 = 150.0;
pub const MIN_DAMAGE: f32 = 1.0;
pub const MAX_EFFECTIVE_MORALE: f32 = 150.0;

// Structure damage
pub const SIEGE_STRUCTURE_FACTOR: f32 = 3.0;
pub const NON_SIEGE_STRUCTURE_FACTOR: f32 = 0.5;

// Volley re-arm after this long without attacking
pub const VOLLEY_REARM_MS: u64 = 5000;

// Charging (fractions of base move speed)
pub const CHARGE_ENTER_SPEED_FRACTION: f32 = 0.8;
pub const CHARGE_EXIT_SPEED_FRACTION: f32 = 0.3;

// Formation transitions
pub const FORMATION_TRANSITION_MS: u64 = 3000;
/// Final portion of the transition window in which the unit is vulnerable
pub const FORMATION_VULNERABLE_MS: u64 = 1000;
pub const TRANSITION_SPEED_FACTOR: f32 = 0.5;

// Direction buckets (degrees, bearing relative to defender facing)
pub const FRONT_ARC_HALF_DEGREES: f32 = 45.0;
pub const REAR_ARC_START_DEGREES: f32 = 135.0;
pub const REAR_ARC_END_DEGREES: f32 = 225.0;

// Fatigue (points per second, before trait scaling)
pub const FATIGUE_MAX: f32 = 100.0;
pub const FATIGUE_RATE_RUNNING: f32 = 4.0;
pub const FATIGUE_RATE_FIGHTING: f32 = 2.0;
pub const FATIGUE_RECOVERY_WALKING: f32 = 1.0;
pub const FATIGUE_RECOVERY_IDLE: f32 = 3.0;
/// Moving at or above this fraction of base speed counts as running
pub const RUNNING_SPEED_FRACTION: f32 = 0.6;

// Morale
pub const CASUALTY_MORALE_LOSS: f32 = 50.0;
pub const RETREAT_MORALE_THRESHOLD: f32 = 20.0;
pub const DEFAULT_MORALE: f32 = 100.0;
pub const DEFAULT_TRAINING: f32 = 50.0;

// Tactical AI
pub const CHARGE_ENGAGE_DISTANCE: f32 = 100.0;
pub const CHARGE_DISENGAGE_DISTANCE: f32 = 50.0;
pub const KITE_SAFETY_DISTANCE: f32 = 100.0;
pub const KITE_FLEE_DISTANCE: f32 = 120.0;
pub const RANGED_HOLD_FRACTION: f32 = 0.8;
pub const DEFENSIVE_ENGAGE_FACTOR: f32 = 1.5;
