pub mod config;
pub mod error;
pub mod types;

pub use config::EngineConfig;
pub use error::{ArcError, Result};
pub use types::{BattleId, SimMillis, Tick, Vec2};
