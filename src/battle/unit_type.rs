//! Unit categories and their default properties
//!
//! Category decides speed, reach, cooldown, field-of-view restriction and the
//! default trait set. The category-advantage table is the single canonical
//! matchup table used by damage resolution.

use serde::{Deserialize, Serialize};

use crate::battle::unit_traits::UnitTrait;

/// Tactical class of a unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitCategory {
    Footman,
    Spearman,
    Halberd,
    Cavalry,
    Archer,
    Caster,
    Siege,
}

impl UnitCategory {
    pub const ALL: [UnitCategory; 7] = [
        UnitCategory::Footman,
        UnitCategory::Spearman,
        UnitCategory::Halberd,
        UnitCategory::Cavalry,
        UnitCategory::Archer,
        UnitCategory::Caster,
        UnitCategory::Siege,
    ];

    fn index(self) -> usize {
        match self {
            UnitCategory::Footman => 0,
            UnitCategory::Spearman => 1,
            UnitCategory::Halberd => 2,
            UnitCategory::Cavalry => 3,
            UnitCategory::Archer => 4,
            UnitCategory::Caster => 5,
            UnitCategory::Siege => 6,
        }
    }

    /// Get default properties for this category
    pub fn default_properties(&self) -> CategoryProperties {
        match self {
            UnitCategory::Footman => CategoryProperties {
                move_speed: 60.0,
                collision_radius: 15.0,
                attack_range: 20.0,
                attack_cooldown_ms: 1000,
            },
            UnitCategory::Spearman => CategoryProperties {
                move_speed: 55.0,
                collision_radius: 15.0,
                attack_range: 30.0,
                attack_cooldown_ms: 1100,
            },
            UnitCategory::Halberd => CategoryProperties {
                move_speed: 50.0,
                collision_radius: 15.0,
                attack_range: 30.0,
                attack_cooldown_ms: 1200,
            },
            UnitCategory::Cavalry => CategoryProperties {
                move_speed: 120.0,
                collision_radius: 18.0,
                attack_range: 40.0, // Lance reach; lands before the charge disengages
                attack_cooldown_ms: 1500,
            },
            UnitCategory::Archer => CategoryProperties {
                move_speed: 55.0,
                collision_radius: 12.0,
                attack_range: 250.0,
                attack_cooldown_ms: 2000,
            },
            UnitCategory::Caster => CategoryProperties {
                move_speed: 50.0,
                collision_radius: 12.0,
                attack_range: 200.0,
                attack_cooldown_ms: 2500,
            },
            UnitCategory::Siege => CategoryProperties {
                move_speed: 25.0,
                collision_radius: 25.0,
                attack_range: 350.0,
                attack_cooldown_ms: 4000,
            },
        }
    }

    /// Traits assigned once at initialization when a unit carries none
    pub fn default_traits(&self) -> Vec<UnitTrait> {
        match self {
            UnitCategory::Footman => vec![UnitTrait::ArmorBonus(0.1)],
            UnitCategory::Spearman => vec![UnitTrait::ChargeDefense],
            UnitCategory::Halberd => vec![UnitTrait::ChargeReflect, UnitTrait::ArmorBonus(0.1)],
            UnitCategory::Cavalry => vec![UnitTrait::ChargeBonus(0.2)],
            UnitCategory::Archer => vec![UnitTrait::SniperAccuracy(0.1)],
            UnitCategory::Caster => vec![
                UnitTrait::FireImmunity,
                UnitTrait::MoraleAura {
                    radius: 150.0,
                    bonus: 10.0,
                },
            ],
            UnitCategory::Siege => vec![UnitTrait::SiegeBonus(1.0), UnitTrait::FatigueResistant],
        }
    }

    /// Is this a ranged unit (archer, caster, siege)?
    pub fn is_ranged(&self) -> bool {
        matches!(
            self,
            UnitCategory::Archer | UnitCategory::Caster | UnitCategory::Siege
        )
    }

    /// Only ranged categories are constrained by a forward field of view
    pub fn has_restricted_fov(&self) -> bool {
        self.is_ranged()
    }

    /// Does this category earn a volley bonus?
    pub fn can_volley(&self) -> bool {
        self.is_ranged()
    }

    pub fn is_melee(&self) -> bool {
        matches!(
            self,
            UnitCategory::Footman | UnitCategory::Spearman | UnitCategory::Halberd
        )
    }

    pub fn is_cavalry(&self) -> bool {
        matches!(self, UnitCategory::Cavalry)
    }
}

/// Default properties for a unit category
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CategoryProperties {
    /// Base move speed (world units per second)
    pub move_speed: f32,
    pub collision_radius: f32,
    pub attack_range: f32,
    pub attack_cooldown_ms: u64,
}

/// Attacker (row) vs defender (column) damage multipliers.
///
/// Column order follows `UnitCategory::ALL`.
const CATEGORY_ADVANTAGE: [[f32; 7]; 7] = [
    //  Foot  Spear  Halb   Cav   Arch   Cast   Siege
    [1.0, 1.2, 0.8, 0.8, 1.3, 1.3, 1.5], // Footman
    [0.9, 1.0, 0.9, 2.5, 1.1, 1.1, 1.3], // Spearman
    [1.3, 1.2, 1.0, 1.8, 1.1, 1.1, 1.4], // Halberd
    [1.2, 0.4, 0.5, 1.0, 1.8, 1.8, 1.6], // Cavalry
    [1.1, 1.2, 1.0, 0.8, 1.0, 1.2, 0.8], // Archer
    [1.2, 1.2, 1.2, 1.0, 1.1, 1.0, 1.0], // Caster
    [0.8, 0.8, 0.8, 0.5, 0.8, 0.8, 1.2], // Siege
];

/// Damage multiplier for `attacker` striking `defender`
pub fn category_advantage(attacker: UnitCategory, defender: UnitCategory) -> f32 {
    CATEGORY_ADVANTAGE[attacker.index()][defender.index()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spearman_counters_cavalry() {
        assert_eq!(
            category_advantage(UnitCategory::Spearman, UnitCategory::Cavalry),
            2.5
        );
        assert_eq!(
            category_advantage(UnitCategory::Cavalry, UnitCategory::Spearman),
            0.4
        );
    }

    #[test]
    fn test_mirror_matchups_are_neutral() {
        for category in UnitCategory::ALL {
            assert_eq!(category_advantage(category, category), 1.0);
        }
    }

    #[test]
    fn test_table_is_asymmetric() {
        let asymmetric_pairs = UnitCategory::ALL
            .iter()
            .flat_map(|a| UnitCategory::ALL.iter().map(move |d| (*a, *d)))
            .filter(|(a, d)| category_advantage(*a, *d) != category_advantage(*d, *a))
            .count();
        assert!(asymmetric_pairs > 0);
    }

    #[test]
    fn test_cavalry_fastest() {
        let cavalry = UnitCategory::Cavalry.default_properties().move_speed;
        for category in UnitCategory::ALL {
            assert!(category.default_properties().move_speed <= cavalry);
        }
    }

    #[test]
    fn test_only_ranged_restrict_fov() {
        assert!(UnitCategory::Archer.has_restricted_fov());
        assert!(UnitCategory::Caster.has_restricted_fov());
        assert!(UnitCategory::Siege.has_restricted_fov());
        assert!(!UnitCategory::Footman.has_restricted_fov());
        assert!(!UnitCategory::Cavalry.has_restricted_fov());
    }

    #[test]
    fn test_every_category_has_default_traits() {
        for category in UnitCategory::ALL {
            assert!(!category.default_traits().is_empty());
        }
    }
}
