//! Replay sink for finished battles

use std::sync::Mutex;

use crate::battle::execution::BattleResult;
use crate::core::error::{ArcError, Result};

/// Receives one result per finished battle
pub trait ReplaySink: Send + Sync {
    fn record(&self, result: &BattleResult) -> Result<()>;
}

#[derive(Debug, Default)]
pub struct InMemoryReplaySink {
    results: Mutex<Vec<BattleResult>>,
}

impl InMemoryReplaySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn results(&self) -> Vec<BattleResult> {
        self.results.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

impl ReplaySink for InMemoryReplaySink {
    fn record(&self, result: &BattleResult) -> Result<()> {
        self.results
            .lock()
            .map_err(|e| ArcError::Store(e.to_string()))?
            .push(result.clone());
        Ok(())
    }
}
