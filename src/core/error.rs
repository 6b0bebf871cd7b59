use thiserror::Error;

use crate::battle::execution::BattlePhase;
use crate::battle::units::UnitId;
use crate::core::types::{BattleId, Tick};

#[derive(Error, Debug)]
pub enum ArcError {
    #[error("Battle not found: {0}")]
    BattleNotFound(BattleId),

    #[error("Battle {battle_id} cannot start from phase {phase:?}")]
    InvalidStatus { battle_id: BattleId, phase: BattlePhase },

    #[error("Unit not found: {0:?}")]
    UnitNotFound(UnitId),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Battle {battle_id} panicked at tick {tick}: {message}")]
    TickPanicked {
        battle_id: BattleId,
        tick: Tick,
        message: String,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, ArcError>;
