//! Formation tables and attack direction
//!
//! Each formation has a base profile and a four-direction table of
//! modifiers. Direction is always measured on the defender: where the blow
//! lands relative to the way the defender is facing.

use serde::{Deserialize, Serialize};

use crate::battle::constants::{
    FORMATION_TRANSITION_MS, FORMATION_VULNERABLE_MS, FRONT_ARC_HALF_DEGREES,
    REAR_ARC_END_DEGREES, REAR_ARC_START_DEGREES, TRANSITION_SPEED_FACTOR,
};
use crate::core::types::{normalize_angle, SimMillis, Vec2};

/// Named formation tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FormationType {
    ShieldWall,
    SpearWall,
    Turtle,
    Circle,
    Wedge,
    Loose,
    #[default]
    Line,
    Column,
    Square,
    CraneWing,
    Arrow,
    Snake,
}

/// Side of the defender a blow lands on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttackDirection {
    Front,
    Left,
    Right,
    Rear,
}

/// Base multipliers of a formation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FormationStats {
    pub defense: f32,
    pub attack: f32,
    pub speed: f32,
    /// Divides incoming ranged damage
    pub avoidance: f32,
}

/// Per-direction multipliers
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionModifier {
    /// Multiplies damage received from this direction
    pub defense: f32,
    /// Multiplies damage dealt when striking a target on this side
    pub attack: f32,
}

const fn dm(defense: f32, attack: f32) -> DirectionModifier {
    DirectionModifier { defense, attack }
}

const fn stats(defense: f32, attack: f32, speed: f32, avoidance: f32) -> FormationStats {
    FormationStats {
        defense,
        attack,
        speed,
        avoidance,
    }
}

impl FormationType {
    pub const ALL: [FormationType; 12] = [
        FormationType::ShieldWall,
        FormationType::SpearWall,
        FormationType::Turtle,
        FormationType::Circle,
        FormationType::Wedge,
        FormationType::Loose,
        FormationType::Line,
        FormationType::Column,
        FormationType::Square,
        FormationType::CraneWing,
        FormationType::Arrow,
        FormationType::Snake,
    ];

    pub fn stats(&self) -> FormationStats {
        match self {
            FormationType::ShieldWall => stats(1.5, 0.7, 0.6, 1.0),
            FormationType::SpearWall => stats(1.3, 0.9, 0.6, 1.0),
            FormationType::Turtle => stats(1.8, 0.5, 0.4, 1.5),
            FormationType::Circle => stats(1.2, 0.9, 0.5, 1.0),
            FormationType::Wedge => stats(0.9, 1.3, 1.1, 0.9),
            FormationType::Loose => stats(0.8, 0.9, 1.2, 1.4),
            FormationType::Line => stats(1.0, 1.0, 1.0, 1.0),
            FormationType::Column => stats(0.8, 0.8, 1.3, 0.8),
            FormationType::Square => stats(1.3, 0.9, 0.5, 1.0),
            FormationType::CraneWing => stats(1.0, 1.2, 0.9, 1.0),
            FormationType::Arrow => stats(0.9, 1.25, 1.15, 0.9),
            FormationType::Snake => stats(1.0, 1.0, 1.1, 1.1),
        }
    }

    /// Direction table as [front, left, right, rear]
    fn direction_table(&self) -> [DirectionModifier; 4] {
        match self {
            FormationType::ShieldWall => [dm(0.5, 1.0), dm(1.0, 0.9), dm(1.0, 0.9), dm(1.5, 0.8)],
            FormationType::SpearWall => [dm(0.6, 1.2), dm(1.1, 0.8), dm(1.1, 0.8), dm(1.6, 0.7)],
            FormationType::Turtle => [dm(0.6, 1.0), dm(0.6, 1.0), dm(0.6, 1.0), dm(0.8, 1.0)],
            FormationType::Circle => [dm(0.9, 1.0); 4],
            FormationType::Wedge => [dm(0.9, 1.3), dm(1.2, 1.0), dm(1.2, 1.0), dm(1.5, 0.9)],
            FormationType::Loose => [dm(1.0, 1.0), dm(1.0, 1.0), dm(1.0, 1.0), dm(1.1, 1.0)],
            FormationType::Line => [dm(1.0, 1.0), dm(1.2, 1.0), dm(1.2, 1.0), dm(1.5, 1.0)],
            FormationType::Column => [dm(1.1, 0.9), dm(1.4, 0.8), dm(1.4, 0.8), dm(1.3, 0.8)],
            FormationType::Square => [dm(0.85, 1.0); 4],
            FormationType::CraneWing => [dm(1.0, 1.2), dm(0.9, 1.3), dm(0.9, 1.3), dm(1.4, 1.0)],
            FormationType::Arrow => [dm(0.9, 1.25), dm(1.2, 1.0), dm(1.2, 1.0), dm(1.5, 0.9)],
            FormationType::Snake => [dm(1.0, 1.0), dm(1.0, 1.1), dm(1.0, 1.1), dm(1.1, 1.0)],
        }
    }

    pub fn direction_modifier(&self, direction: AttackDirection) -> DirectionModifier {
        let table = self.direction_table();
        match direction {
            AttackDirection::Front => table[0],
            AttackDirection::Left => table[1],
            AttackDirection::Right => table[2],
            AttackDirection::Rear => table[3],
        }
    }

    /// Outgoing damage multiplier for a formation striking from `direction`
    pub fn attack_modifier(&self, direction: AttackDirection) -> f32 {
        self.direction_modifier(direction).attack
    }

    /// Incoming damage multiplier for a formation struck from `direction`
    pub fn defense_modifier(&self, direction: AttackDirection) -> f32 {
        self.direction_modifier(direction).defense
    }
}

/// Bucket the bearing from defender to attacker, relative to defender facing.
///
/// Front is ±45°, rear is 135°-225°, left is the counter-clockwise flank.
pub fn compute_attack_direction(
    attacker_pos: Vec2,
    defender_pos: Vec2,
    defender_facing: f32,
) -> AttackDirection {
    let bearing = defender_pos.bearing_to(&attacker_pos);
    let relative = normalize_angle(bearing - defender_facing).to_degrees();

    if relative <= FRONT_ARC_HALF_DEGREES || relative >= 360.0 - FRONT_ARC_HALF_DEGREES {
        AttackDirection::Front
    } else if (REAR_ARC_START_DEGREES..=REAR_ARC_END_DEGREES).contains(&relative) {
        AttackDirection::Rear
    } else if relative < REAR_ARC_START_DEGREES {
        AttackDirection::Left
    } else {
        AttackDirection::Right
    }
}

/// Pending switch into a new formation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FormationTransition {
    pub target: FormationType,
    pub started_at: SimMillis,
    pub ends_at: SimMillis,
}

impl FormationTransition {
    pub fn begin(target: FormationType, now: SimMillis) -> Self {
        Self {
            target,
            started_at: now,
            ends_at: now + FORMATION_TRANSITION_MS,
        }
    }

    pub fn is_complete(&self, now: SimMillis) -> bool {
        now >= self.ends_at
    }

    /// In the final portion of the window the unit is exposed
    pub fn is_vulnerable(&self, now: SimMillis) -> bool {
        !self.is_complete(now) && now + FORMATION_VULNERABLE_MS >= self.ends_at
    }

    /// Speed multiplier while the transition runs
    pub fn speed_multiplier(&self) -> f32 {
        self.target.stats().speed * TRANSITION_SPEED_FACTOR
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, PI};

    #[test]
    fn test_direction_front() {
        // Defender faces +x, attacker in front
        let dir = compute_attack_direction(Vec2::new(10.0, 0.0), Vec2::ZERO, 0.0);
        assert_eq!(dir, AttackDirection::Front);
    }

    #[test]
    fn test_direction_rear() {
        let dir = compute_attack_direction(Vec2::new(-10.0, 0.0), Vec2::ZERO, 0.0);
        assert_eq!(dir, AttackDirection::Rear);
    }

    #[test]
    fn test_direction_flanks() {
        let left = compute_attack_direction(Vec2::new(0.0, 10.0), Vec2::ZERO, 0.0);
        let right = compute_attack_direction(Vec2::new(0.0, -10.0), Vec2::ZERO, 0.0);
        assert_eq!(left, AttackDirection::Left);
        assert_eq!(right, AttackDirection::Right);
    }

    #[test]
    fn test_direction_follows_facing() {
        // Defender faces +y; an attacker at +x is now on the right flank
        let dir = compute_attack_direction(Vec2::new(10.0, 0.0), Vec2::ZERO, FRAC_PI_2);
        assert_eq!(dir, AttackDirection::Right);

        // Defender faces -x; an attacker at +x is behind
        let dir = compute_attack_direction(Vec2::new(10.0, 0.0), Vec2::ZERO, PI);
        assert_eq!(dir, AttackDirection::Rear);
    }

    #[test]
    fn test_shield_wall_front_strong_rear_weak() {
        let wall = FormationType::ShieldWall;
        assert!(wall.defense_modifier(AttackDirection::Front) < 1.0);
        assert!(wall.defense_modifier(AttackDirection::Rear) > 1.0);
    }

    #[test]
    fn test_line_is_default_and_neutral() {
        assert_eq!(FormationType::default(), FormationType::Line);
        let stats = FormationType::Line.stats();
        assert_eq!(stats.speed, 1.0);
        assert_eq!(FormationType::Line.defense_modifier(AttackDirection::Front), 1.0);
    }

    #[test]
    fn test_transition_vulnerable_window() {
        let t = FormationTransition::begin(FormationType::ShieldWall, 1000);
        assert!(!t.is_vulnerable(1000));
        assert!(!t.is_vulnerable(2900));
        assert!(t.is_vulnerable(3000));
        assert!(t.is_vulnerable(3999));
        assert!(t.is_complete(4000));
        assert!(!t.is_vulnerable(4000));
    }

    #[test]
    fn test_transition_halves_target_speed() {
        let t = FormationTransition::begin(FormationType::Column, 0);
        assert!((t.speed_multiplier() - 0.65).abs() < 1e-6);
    }
}
