//! Battle map: bounds, terrain patches, fortification and deployment zones
//!
//! The map is continuous. Grid discretisation only happens inside the
//! pathfinder.

use serde::{Deserialize, Serialize};

use crate::battle::terrain::{TerrainKind, TerrainPatch};
use crate::battle::units::Side;
use crate::core::types::{normalize_angle, Vec2};

/// A gate aperture in a fortification wall
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gate {
    /// Angle of the aperture around the fortification center (radians)
    pub angle: f32,
    /// Aperture width (world units)
    pub width: f32,
    pub hp: f32,
    pub max_hp: f32,
}

impl Gate {
    pub fn new(angle: f32, width: f32, max_hp: f32) -> Self {
        Self {
            angle,
            width,
            hp: max_hp,
            max_hp,
        }
    }

    pub fn is_destroyed(&self) -> bool {
        self.hp <= 0.0
    }

    /// Gates block as a circle spanning the aperture
    pub fn collision_radius(&self) -> f32 {
        self.width / 2.0
    }

    /// Apply structure damage, returning the hp actually removed
    pub fn apply_damage(&mut self, damage: f32) -> f32 {
        let applied = damage.min(self.hp).max(0.0);
        self.hp -= applied;
        applied
    }
}

/// Circular walled fortification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fortification {
    pub center: Vec2,
    pub radius: f32,
    pub wall_thickness: f32,
    pub gates: Vec<Gate>,
    /// Destroying this fortification wins the battle for the attacker
    pub is_objective: bool,
}

impl Fortification {
    pub fn new(center: Vec2, radius: f32, wall_thickness: f32) -> Self {
        Self {
            center,
            radius,
            wall_thickness,
            gates: Vec::new(),
            is_objective: true,
        }
    }

    pub fn with_gate(mut self, gate: Gate) -> Self {
        self.gates.push(gate);
        self
    }

    /// World position of a gate (on the wall's center line)
    pub fn gate_position(&self, index: usize) -> Option<Vec2> {
        self.gates
            .get(index)
            .map(|gate| self.center + Vec2::from_angle(gate.angle) * self.radius)
    }

    /// Is this point inside any gate aperture's angular span?
    fn in_aperture(&self, point: Vec2) -> bool {
        let bearing = self.center.bearing_to(&point);
        self.gates.iter().any(|gate| {
            let half_span = (gate.width / 2.0) / self.radius.max(1.0);
            let diff = normalize_angle(bearing - gate.angle);
            let diff = diff.min(std::f32::consts::TAU - diff);
            diff <= half_span
        })
    }

    /// Is this point on solid wall (gate apertures excluded)?
    pub fn is_wall(&self, point: Vec2) -> bool {
        let from_center = self.center.distance(&point);
        (from_center - self.radius).abs() <= self.wall_thickness / 2.0 && !self.in_aperture(point)
    }

    /// Every gate is down
    pub fn is_destroyed(&self) -> bool {
        !self.gates.is_empty() && self.gates.iter().all(|g| g.is_destroyed())
    }

    /// Index of the closest intact gate
    pub fn nearest_intact_gate(&self, from: Vec2) -> Option<usize> {
        self.gates
            .iter()
            .enumerate()
            .filter(|(_, gate)| !gate.is_destroyed())
            .filter_map(|(i, _)| self.gate_position(i).map(|p| (i, p.distance(&from))))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i)
    }
}

/// Axis-aligned deployment rectangle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeploymentZone {
    pub min: Vec2,
    pub max: Vec2,
}

impl DeploymentZone {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new((self.min.x + self.max.x) / 2.0, (self.min.y + self.max.y) / 2.0)
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min.x && point.x <= self.max.x && point.y >= self.min.y && point.y <= self.max.y
    }
}

/// The full battle map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleMap {
    pub width: f32,
    pub height: f32,
    pub fortification: Option<Fortification>,
    pub terrain: Vec<TerrainPatch>,
    pub attacker_deployment: DeploymentZone,
    pub defender_deployment: DeploymentZone,
}

impl BattleMap {
    /// Open map with attackers deployed on the west edge, defenders on the east
    pub fn new(width: f32, height: f32) -> Self {
        let band = width * 0.15;
        Self {
            width,
            height,
            fortification: None,
            terrain: Vec::new(),
            attacker_deployment: DeploymentZone::new(Vec2::ZERO, Vec2::new(band, height)),
            defender_deployment: DeploymentZone::new(
                Vec2::new(width - band, 0.0),
                Vec2::new(width, height),
            ),
        }
    }

    pub fn with_fortification(mut self, fortification: Fortification) -> Self {
        self.fortification = Some(fortification);
        self
    }

    pub fn add_terrain(&mut self, patch: TerrainPatch) {
        self.terrain.push(patch);
    }

    pub fn in_bounds(&self, point: Vec2) -> bool {
        point.x >= 0.0 && point.y >= 0.0 && point.x <= self.width && point.y <= self.height
    }

    /// Clamp a point into map bounds
    pub fn clamp(&self, point: Vec2) -> Vec2 {
        Vec2::new(point.x.clamp(0.0, self.width), point.y.clamp(0.0, self.height))
    }

    /// Costliest terrain covering the point
    pub fn terrain_at(&self, point: Vec2) -> Option<TerrainKind> {
        self.terrain
            .iter()
            .filter(|patch| patch.contains(point))
            .map(|patch| patch.kind)
            .max_by(|a, b| a.movement_cost().total_cmp(&b.movement_cost()))
    }

    /// Is this point solid fortification wall?
    pub fn is_wall(&self, point: Vec2) -> bool {
        self.fortification
            .as_ref()
            .is_some_and(|fort| fort.is_wall(point))
    }

    /// Does the straight segment from `from` to `to` touch solid wall?
    ///
    /// Sampled at half the wall thickness, so a ring cannot be stepped over.
    pub fn segment_crosses_wall(&self, from: Vec2, to: Vec2) -> bool {
        let Some(fort) = &self.fortification else {
            return false;
        };
        let spacing = (fort.wall_thickness / 2.0).max(0.5);
        let steps = (from.distance(&to) / spacing).ceil() as u32;
        (1..=steps).any(|i| {
            let t = i as f32 / steps as f32;
            fort.is_wall(from + (to - from) * t)
        })
    }

    pub fn deployment_zone(&self, side: Side) -> &DeploymentZone {
        match side {
            Side::Attacker => &self.attacker_deployment,
            Side::Defender => &self.defender_deployment,
        }
    }

    /// Designated fortification has fallen
    pub fn objective_destroyed(&self) -> bool {
        self.fortification
            .as_ref()
            .is_some_and(|fort| fort.is_objective && fort.is_destroyed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::terrain::TerrainPatch;

    fn keep() -> Fortification {
        Fortification::new(Vec2::new(500.0, 500.0), 100.0, 20.0).with_gate(Gate::new(
            std::f32::consts::PI,
            40.0,
            1000.0,
        ))
    }

    #[test]
    fn test_clamp_keeps_points_inside() {
        let map = BattleMap::new(100.0, 50.0);
        let clamped = map.clamp(Vec2::new(-5.0, 80.0));
        assert_eq!(clamped, Vec2::new(0.0, 50.0));
        assert!(map.in_bounds(clamped));
    }

    #[test]
    fn test_wall_ring_with_gate_aperture() {
        let fort = keep();
        // East side of the ring is wall
        assert!(fort.is_wall(Vec2::new(600.0, 500.0)));
        // West side is the gate aperture
        assert!(!fort.is_wall(Vec2::new(400.0, 500.0)));
        // Courtyard and open field are not wall
        assert!(!fort.is_wall(Vec2::new(500.0, 500.0)));
        assert!(!fort.is_wall(Vec2::new(700.0, 500.0)));
    }

    #[test]
    fn test_segment_crosses_wall_ring() {
        let map = BattleMap::new(1000.0, 1000.0).with_fortification(keep());
        let inside = Vec2::new(500.0, 500.0);
        // Through the wall on the east side
        assert!(map.segment_crosses_wall(Vec2::new(900.0, 500.0), inside));
        // Straight through the gate aperture on the west side
        assert!(!map.segment_crosses_wall(Vec2::new(50.0, 500.0), inside));
        // Outside the ring entirely
        assert!(!map.segment_crosses_wall(Vec2::new(50.0, 50.0), Vec2::new(950.0, 50.0)));
        assert!(!BattleMap::new(100.0, 100.0).segment_crosses_wall(Vec2::ZERO, Vec2::new(90.0, 90.0)));
    }

    #[test]
    fn test_gate_position_on_ring() {
        let fort = keep();
        let pos = fort.gate_position(0).unwrap();
        assert!((pos.x - 400.0).abs() < 1e-3);
        assert!((pos.y - 500.0).abs() < 1e-3);
    }

    #[test]
    fn test_fortification_destroyed_when_all_gates_down() {
        let mut fort = keep();
        assert!(!fort.is_destroyed());
        let applied = fort.gates[0].apply_damage(5000.0);
        assert_eq!(applied, 1000.0);
        assert!(fort.is_destroyed());
        assert_eq!(fort.nearest_intact_gate(Vec2::ZERO), None);
    }

    #[test]
    fn test_terrain_at_picks_costliest() {
        let mut map = BattleMap::new(200.0, 200.0);
        map.add_terrain(TerrainPatch::rect(
            TerrainKind::Hill,
            Vec2::ZERO,
            Vec2::new(100.0, 100.0),
        ));
        map.add_terrain(TerrainPatch::rect(
            TerrainKind::Forest,
            Vec2::new(50.0, 50.0),
            Vec2::new(100.0, 100.0),
        ));
        assert_eq!(map.terrain_at(Vec2::new(25.0, 25.0)), Some(TerrainKind::Hill));
        assert_eq!(map.terrain_at(Vec2::new(75.0, 75.0)), Some(TerrainKind::Forest));
        assert_eq!(map.terrain_at(Vec2::new(150.0, 150.0)), None);
    }

    #[test]
    fn test_default_deployment_zones_opposite() {
        let map = BattleMap::new(1000.0, 600.0);
        assert!(map.attacker_deployment.center().x < map.defender_deployment.center().x);
        assert!(map.deployment_zone(Side::Attacker).contains(Vec2::new(50.0, 300.0)));
    }
}
