//! Unit movement along cached paths
//!
//! Movement is continuous: a unit walks its waypoint list at its effective
//! speed, then stops. Paths are only recomputed when the target changes.

use crate::battle::battle_map::BattleMap;
use crate::battle::constants::{CHARGE_ENTER_SPEED_FRACTION, CHARGE_EXIT_SPEED_FRACTION};
use crate::battle::pathfinding::{find_path, NavGrid};
use crate::battle::units::BattleUnit;
use crate::core::config::EngineConfig;
use crate::core::types::{SimMillis, Vec2};

/// Result of advancing one unit for one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MovementResult {
    /// No target, or unable to move
    Stationary,
    /// Still en route
    Moving,
    /// Reached the end of its path this tick
    Arrived,
    /// Target was unreachable and has been dropped
    Unreachable,
}

/// Speed in world units per second after formation, fatigue, transition and
/// terrain
pub fn effective_speed(unit: &BattleUnit, map: &BattleMap) -> f32 {
    let formation_speed = match unit.transition {
        Some(transition) => transition.speed_multiplier(),
        None => unit.formation.stats().speed,
    };
    let speed = unit.move_speed * formation_speed * unit.fatigue_level.effects().speed;
    let terrain_cost = map
        .terrain_at(unit.position)
        .map_or(1.0, |kind| kind.movement_cost());
    speed / terrain_cost
}

/// Plan (or reuse) the path to the unit's current target
fn ensure_path(unit: &mut BattleUnit, map: &BattleMap, grid: &NavGrid, target: Vec2) -> bool {
    if unit.path_target == Some(target) && !unit.path.is_empty() {
        return true;
    }
    let path = match find_path(grid, unit.position, target) {
        Some(path) => path,
        // Straight line when the search fails but nothing solid is in the way
        None if !map.is_wall(target) && !map.segment_crosses_wall(unit.position, target) => {
            vec![target]
        }
        None => return false,
    };
    unit.path = path;
    unit.path_target = Some(target);
    true
}

/// Cavalry enters a charge at speed while ordered to, and drops it when slow
fn update_charge_state(unit: &mut BattleUnit) {
    if !unit.category.is_cavalry() || !unit.charge_intent {
        unit.is_charging = false;
        return;
    }
    let speed = unit.velocity.length();
    if speed >= unit.move_speed * CHARGE_ENTER_SPEED_FRACTION {
        unit.is_charging = true;
    } else if speed < unit.move_speed * CHARGE_EXIT_SPEED_FRACTION {
        unit.is_charging = false;
    }
}

/// Advance one unit for one tick
pub fn update_movement(
    unit: &mut BattleUnit,
    map: &BattleMap,
    grid: &NavGrid,
    now: SimMillis,
    config: &EngineConfig,
) -> MovementResult {
    unit.update_transition(now);

    if !unit.is_alive() || unit.move_speed <= 0.0 {
        unit.velocity = Vec2::ZERO;
        update_charge_state(unit);
        return MovementResult::Stationary;
    }

    let Some(target) = unit.target_position else {
        unit.velocity = Vec2::ZERO;
        update_charge_state(unit);
        return MovementResult::Stationary;
    };

    if !ensure_path(unit, map, grid, target) {
        unit.set_move_target(None);
        update_charge_state(unit);
        return MovementResult::Unreachable;
    }

    let dt = config.tick_seconds();
    let start = unit.position;
    let mut budget = effective_speed(unit, map) * dt;
    let mut heading = None;

    while let Some(&waypoint) = unit.path.first() {
        let to_waypoint = waypoint - unit.position;
        let distance = to_waypoint.length();
        if distance <= config.waypoint_epsilon {
            unit.path.remove(0);
            continue;
        }
        if budget <= 0.0 {
            break;
        }
        let direction = to_waypoint.normalize();
        let step = budget.min(distance);
        unit.position = unit.position + direction * step;
        budget -= step;
        heading = Some(direction);
    }

    unit.position = map.clamp(unit.position);
    if let Some(direction) = heading {
        unit.facing = direction.angle();
    }

    let result = if unit.path.is_empty() {
        unit.target_position = None;
        unit.path_target = None;
        unit.velocity = Vec2::ZERO;
        MovementResult::Arrived
    } else {
        unit.velocity = if dt > 0.0 {
            (unit.position - start) * (1.0 / dt)
        } else {
            Vec2::ZERO
        };
        MovementResult::Moving
    };

    update_charge_state(unit);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::fatigue::FatigueLevel;
    use crate::battle::formation::FormationType;
    use crate::battle::terrain::{TerrainKind, TerrainPatch};
    use crate::battle::unit_type::UnitCategory;
    use crate::battle::units::Side;

    fn setup() -> (BattleMap, NavGrid, EngineConfig) {
        let map = BattleMap::new(1000.0, 1000.0);
        let config = EngineConfig::default();
        let grid = NavGrid::build(&map, config.grid_cell_size);
        (map, grid, config)
    }

    #[test]
    fn test_no_target_is_noop() {
        let (map, grid, config) = setup();
        let mut unit = BattleUnit::new(Side::Attacker, UnitCategory::Footman, 100, Vec2::new(50.0, 50.0));
        let result = update_movement(&mut unit, &map, &grid, 0, &config);
        assert_eq!(result, MovementResult::Stationary);
        assert_eq!(unit.position, Vec2::new(50.0, 50.0));
    }

    #[test]
    fn test_moves_at_effective_speed() {
        let (map, grid, config) = setup();
        let mut unit = BattleUnit::new(Side::Attacker, UnitCategory::Footman, 100, Vec2::new(10.0, 10.0));
        unit.set_move_target(Some(Vec2::new(10.0, 510.0)));
        update_movement(&mut unit, &map, &grid, 0, &config);

        // 60 units/s for 50 ms
        let moved = unit.position.distance(&Vec2::new(10.0, 10.0));
        assert!((moved - 3.0).abs() < 1e-3);
        assert!((unit.velocity.length() - 60.0).abs() < 0.1);
    }

    #[test]
    fn test_path_cached_until_target_changes() {
        let (map, grid, config) = setup();
        let mut unit = BattleUnit::new(Side::Attacker, UnitCategory::Footman, 100, Vec2::new(10.0, 10.0));
        unit.set_move_target(Some(Vec2::new(500.0, 10.0)));
        update_movement(&mut unit, &map, &grid, 0, &config);
        let first_target = unit.path_target;
        let len = unit.path.len();

        update_movement(&mut unit, &map, &grid, 50, &config);
        assert_eq!(unit.path_target, first_target);
        assert!(unit.path.len() <= len);

        unit.set_move_target(Some(Vec2::new(10.0, 500.0)));
        update_movement(&mut unit, &map, &grid, 100, &config);
        assert_eq!(unit.path_target, Some(Vec2::new(10.0, 500.0)));
    }

    #[test]
    fn test_arrival_clears_target() {
        let (map, grid, config) = setup();
        let mut unit = BattleUnit::new(Side::Attacker, UnitCategory::Footman, 100, Vec2::new(10.0, 10.0));
        unit.set_move_target(Some(Vec2::new(12.0, 10.0)));
        let result = update_movement(&mut unit, &map, &grid, 0, &config);
        assert_eq!(result, MovementResult::Arrived);
        assert!(unit.target_position.is_none());
        assert_eq!(unit.velocity, Vec2::ZERO);
    }

    #[test]
    fn test_zero_speed_never_moves() {
        let (map, grid, config) = setup();
        let mut unit = BattleUnit::new(Side::Defender, UnitCategory::Siege, 10, Vec2::new(300.0, 300.0));
        unit.move_speed = 0.0;
        unit.set_move_target(Some(Vec2::new(900.0, 900.0)));
        for tick in 0..100 {
            update_movement(&mut unit, &map, &grid, tick * 50, &config);
        }
        assert_eq!(unit.position, Vec2::new(300.0, 300.0));
    }

    #[test]
    fn test_position_clamped_to_bounds() {
        let (map, grid, config) = setup();
        let mut unit = BattleUnit::new(Side::Attacker, UnitCategory::Cavalry, 100, Vec2::new(999.0, 999.0));
        unit.set_move_target(Some(Vec2::new(1200.0, 1200.0)));
        for tick in 0..20 {
            update_movement(&mut unit, &map, &grid, tick * 50, &config);
            assert!(map.in_bounds(unit.position));
        }
    }

    #[test]
    fn test_facing_follows_heading() {
        let (map, grid, config) = setup();
        let mut unit = BattleUnit::new(Side::Defender, UnitCategory::Footman, 100, Vec2::new(510.0, 510.0));
        unit.set_move_target(Some(Vec2::new(510.0, 900.0)));
        update_movement(&mut unit, &map, &grid, 0, &config);
        assert!((unit.facing - std::f32::consts::FRAC_PI_2).abs() < 1e-3);
    }

    #[test]
    fn test_transition_halves_speed() {
        let (map, _, _) = setup();
        let mut unit = BattleUnit::new(Side::Attacker, UnitCategory::Footman, 100, Vec2::new(50.0, 50.0));
        unit.set_formation(FormationType::Column, 0);
        let during = effective_speed(&unit, &map);
        unit.update_transition(5000);
        let after = effective_speed(&unit, &map);
        assert!((during - after * 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_fatigue_and_terrain_slow_movement() {
        let (mut map, _, _) = setup();
        let mut unit = BattleUnit::new(Side::Attacker, UnitCategory::Footman, 100, Vec2::new(50.0, 50.0));
        let open = effective_speed(&unit, &map);

        unit.fatigue_level = FatigueLevel::Exhausted;
        assert!((effective_speed(&unit, &map) - open * 0.5).abs() < 1e-4);

        unit.fatigue_level = FatigueLevel::Fresh;
        map.add_terrain(TerrainPatch::rect(
            TerrainKind::Forest,
            Vec2::ZERO,
            Vec2::new(100.0, 100.0),
        ));
        assert!((effective_speed(&unit, &map) - open / 2.0).abs() < 1e-4);
    }

    #[test]
    fn test_cavalry_charge_needs_intent_and_speed() {
        let (map, grid, config) = setup();
        let mut cav = BattleUnit::new(Side::Attacker, UnitCategory::Cavalry, 100, Vec2::new(10.0, 500.0));
        cav.set_move_target(Some(Vec2::new(900.0, 500.0)));

        update_movement(&mut cav, &map, &grid, 0, &config);
        assert!(!cav.is_charging);

        cav.charge_intent = true;
        update_movement(&mut cav, &map, &grid, 50, &config);
        assert!(cav.is_charging);

        cav.set_move_target(None);
        update_movement(&mut cav, &map, &grid, 100, &config);
        assert!(!cav.is_charging);
    }

    #[test]
    fn test_unreachable_target_dropped() {
        use crate::battle::battle_map::Fortification;
        let fort = Fortification::new(Vec2::new(500.0, 500.0), 120.0, 20.0);
        let map = BattleMap::new(1000.0, 1000.0).with_fortification(fort);
        let config = EngineConfig::default();
        let grid = NavGrid::build(&map, config.grid_cell_size);

        let mut unit = BattleUnit::new(Side::Attacker, UnitCategory::Footman, 100, Vec2::new(50.0, 50.0));
        // On the wall itself
        unit.set_move_target(Some(Vec2::new(620.0, 500.0)));
        let result = update_movement(&mut unit, &map, &grid, 0, &config);
        assert_eq!(result, MovementResult::Unreachable);
        assert!(unit.target_position.is_none());
        assert_eq!(unit.position, Vec2::new(50.0, 50.0));
    }

    #[test]
    fn test_sealed_courtyard_unreachable() {
        use crate::battle::battle_map::Fortification;
        let fort = Fortification::new(Vec2::new(500.0, 500.0), 120.0, 20.0);
        let map = BattleMap::new(1000.0, 1000.0).with_fortification(fort);
        let config = EngineConfig::default();
        let grid = NavGrid::build(&map, config.grid_cell_size);

        let start = Vec2::new(200.0, 500.0);
        let mut unit = BattleUnit::new(Side::Attacker, UnitCategory::Footman, 100, start);
        unit.set_move_target(Some(Vec2::new(500.0, 500.0)));

        for tick in 0..400 {
            let result = update_movement(&mut unit, &map, &grid, tick * config.tick_ms, &config);
            if tick == 0 {
                assert_eq!(result, MovementResult::Unreachable);
            }
            assert!(!map.is_wall(unit.position));
        }
        assert_eq!(unit.position, start);
        assert!(unit.target_position.is_none());
    }
}
