//! Persistence seam for battle aggregates
//!
//! The scheduler loads a battle once at start, then writes the state back at
//! the end of every tick and the result once at the end.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::battle::execution::{BattleResult, BattleState};
use crate::core::error::{ArcError, Result};
use crate::core::types::BattleId;

/// Where battle aggregates live between ticks
pub trait BattleStore: Send + Sync {
    fn load(&self, battle_id: BattleId) -> Result<Option<BattleState>>;
    fn save(&self, state: &BattleState) -> Result<()>;
    fn save_result(&self, result: &BattleResult) -> Result<()>;
}

/// Process-local store, used by the demo binary and tests
#[derive(Debug, Default)]
pub struct InMemoryBattleStore {
    battles: Mutex<HashMap<BattleId, BattleState>>,
    results: Mutex<HashMap<BattleId, BattleResult>>,
    failing: AtomicBool,
    saves: AtomicUsize,
}

impl InMemoryBattleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provisioned battle
    pub fn insert(&self, state: BattleState) -> Result<()> {
        let mut battles = self.battles.lock().map_err(|e| ArcError::Store(e.to_string()))?;
        battles.insert(state.id, state);
        Ok(())
    }

    /// Make every subsequent `save`/`save_result` fail until cleared
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Successful state writes so far
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn result(&self, battle_id: BattleId) -> Option<BattleResult> {
        self.results
            .lock()
            .ok()
            .and_then(|results| results.get(&battle_id).cloned())
    }

    fn check_failing(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ArcError::Store("store unavailable".into()));
        }
        Ok(())
    }
}

impl BattleStore for InMemoryBattleStore {
    fn load(&self, battle_id: BattleId) -> Result<Option<BattleState>> {
        let battles = self.battles.lock().map_err(|e| ArcError::Store(e.to_string()))?;
        Ok(battles.get(&battle_id).cloned())
    }

    fn save(&self, state: &BattleState) -> Result<()> {
        self.check_failing()?;
        let mut battles = self.battles.lock().map_err(|e| ArcError::Store(e.to_string()))?;
        battles.insert(state.id, state.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn save_result(&self, result: &BattleResult) -> Result<()> {
        self.check_failing()?;
        let mut results = self.results.lock().map_err(|e| ArcError::Store(e.to_string()))?;
        results.insert(result.battle_id, result.clone());
        Ok(())
    }
}
