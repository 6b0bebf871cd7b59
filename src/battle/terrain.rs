//! Battle terrain patches and their effects
//!
//! Terrain is laid over the continuous map as patches: either an area
//! (polygon) or a band around a path (river, road).

use geo::{Contains, EuclideanDistance, LineString, Point, Polygon};
use serde::{Deserialize, Serialize};

use crate::core::types::Vec2;

/// Kind of terrain covered by a patch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TerrainKind {
    Forest, // Dense, slow going
    Hill,   // Climb
    River,  // Fordable but slow
    Road,   // Faster than open ground
}

impl TerrainKind {
    /// Movement cost multiplier (1.0 = open ground)
    pub fn movement_cost(&self) -> f32 {
        match self {
            TerrainKind::Forest => 2.0,
            TerrainKind::Hill => 1.5,
            TerrainKind::River => 3.0,
            TerrainKind::Road => 0.8,
        }
    }

    /// Traversal cost used by the pathfinder, never below open ground so the
    /// octile heuristic stays admissible
    pub fn path_cost(&self) -> f32 {
        self.movement_cost().max(1.0)
    }
}

/// Geometry of a terrain patch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PatchShape {
    Area { polygon: Vec<Vec2> },
    Path { points: Vec<Vec2>, width: f32 },
}

/// A single terrain patch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerrainPatch {
    pub kind: TerrainKind,
    pub shape: PatchShape,
}

impl TerrainPatch {
    pub fn area(kind: TerrainKind, polygon: Vec<Vec2>) -> Self {
        Self {
            kind,
            shape: PatchShape::Area { polygon },
        }
    }

    pub fn path(kind: TerrainKind, points: Vec<Vec2>, width: f32) -> Self {
        Self {
            kind,
            shape: PatchShape::Path { points, width },
        }
    }

    /// Axis-aligned rectangle patch
    pub fn rect(kind: TerrainKind, min: Vec2, max: Vec2) -> Self {
        Self::area(
            kind,
            vec![
                Vec2::new(min.x, min.y),
                Vec2::new(max.x, min.y),
                Vec2::new(max.x, max.y),
                Vec2::new(min.x, max.y),
            ],
        )
    }

    /// Does this patch cover the point?
    pub fn contains(&self, point: Vec2) -> bool {
        let p = Point::new(point.x, point.y);
        match &self.shape {
            PatchShape::Area { polygon } => {
                if polygon.len() < 3 {
                    return false;
                }
                let ring: Vec<(f32, f32)> = polygon.iter().map(|v| (v.x, v.y)).collect();
                Polygon::new(LineString::from(ring), vec![]).contains(&p)
            }
            PatchShape::Path { points, width } => match points.as_slice() {
                [] => false,
                [only] => only.distance(&point) <= width / 2.0,
                _ => {
                    let line: Vec<(f32, f32)> = points.iter().map(|v| (v.x, v.y)).collect();
                    p.euclidean_distance(&LineString::from(line)) <= width / 2.0
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_contains() {
        let forest = TerrainPatch::rect(
            TerrainKind::Forest,
            Vec2::new(10.0, 10.0),
            Vec2::new(50.0, 50.0),
        );
        assert!(forest.contains(Vec2::new(30.0, 30.0)));
        assert!(!forest.contains(Vec2::new(60.0, 30.0)));
    }

    #[test]
    fn test_river_band() {
        let river = TerrainPatch::path(
            TerrainKind::River,
            vec![Vec2::new(0.0, 100.0), Vec2::new(200.0, 100.0)],
            20.0,
        );
        assert!(river.contains(Vec2::new(50.0, 105.0)));
        assert!(!river.contains(Vec2::new(50.0, 125.0)));
    }

    #[test]
    fn test_degenerate_polygon_contains_nothing() {
        let patch = TerrainPatch::area(TerrainKind::Hill, vec![Vec2::ZERO, Vec2::new(1.0, 1.0)]);
        assert!(!patch.contains(Vec2::new(0.5, 0.5)));
    }

    #[test]
    fn test_road_cost_clamped_for_search() {
        assert!(TerrainKind::Road.movement_cost() < 1.0);
        assert_eq!(TerrainKind::Road.path_cost(), 1.0);
        assert_eq!(TerrainKind::River.path_cost(), 3.0);
    }
}
