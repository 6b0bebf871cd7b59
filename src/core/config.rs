//! Engine configuration with documented constants
//!
//! Runtime knobs for the scheduler and the spatial layer. Balance data
//! (category table, formations, fatigue buckets) is fixed and lives in
//! `battle::constants` and the table modules.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::{ArcError, Result};

/// Configuration for the battle engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Fixed timestep in milliseconds
    ///
    /// 50 ms = 20 Hz. Every duration in the engine (cooldowns, formation
    /// transitions, fatigue rates) is expressed against simulated time, so
    /// changing this only changes resolution, not pacing.
    pub tick_ms: u64,

    /// Hard stop for a battle, in ticks
    ///
    /// At 20 Hz the default of 6000 is five simulated minutes. When reached
    /// the winner is decided on remaining troops.
    pub max_ticks: u64,

    /// Side length of a pathfinding cell (world units)
    ///
    /// Smaller cells give tighter paths around walls at quadratic cost.
    pub grid_cell_size: f32,

    /// Distance at which a waypoint counts as reached (world units)
    pub waypoint_epsilon: f32,

    /// Forward field of view for ranged, caster and siege units (degrees)
    pub default_fov_degrees: f32,

    /// Buffered snapshots per observer before the slowest one lags
    pub snapshot_channel_capacity: usize,

    /// Consecutive persistence failures before an operational alert is raised
    pub persistence_alert_threshold: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_ms: 50,
            max_ticks: 6000,
            grid_cell_size: 20.0,
            waypoint_epsilon: 2.0,
            default_fov_degrees: 120.0,
            snapshot_channel_capacity: 64,
            persistence_alert_threshold: 3,
        }
    }
}

impl EngineConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Tick duration in seconds
    pub fn tick_seconds(&self) -> f32 {
        self.tick_ms as f32 / 1000.0
    }

    /// Parse a config from TOML; missing keys keep their defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(content)?;
        config.validate().map_err(ArcError::Config)?;
        Ok(config)
    }

    /// Load a config from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.tick_ms == 0 {
            return Err("tick_ms must be positive".into());
        }

        if self.max_ticks == 0 {
            return Err("max_ticks must be positive".into());
        }

        if self.grid_cell_size <= 0.0 {
            return Err(format!(
                "grid_cell_size ({}) must be positive",
                self.grid_cell_size
            ));
        }

        // A waypoint epsilon wider than a cell would skip whole cells
        if self.waypoint_epsilon <= 0.0 || self.waypoint_epsilon >= self.grid_cell_size {
            return Err(format!(
                "waypoint_epsilon ({}) should be in (0, grid_cell_size = {})",
                self.waypoint_epsilon, self.grid_cell_size
            ));
        }

        if !(0.0..=360.0).contains(&self.default_fov_degrees) {
            return Err(format!(
                "default_fov_degrees ({}) must be within [0, 360]",
                self.default_fov_degrees
            ));
        }

        if self.snapshot_channel_capacity == 0 {
            return Err("snapshot_channel_capacity must be positive".into());
        }

        Ok(())
    }
}
