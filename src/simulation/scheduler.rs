//! Fixed-timestep scheduler: one timer per active battle
//!
//! Each battle runs on its own tokio task. A tick is a synchronous call into
//! `BattleState::run_tick`, so aborting the task between interval ticks never
//! leaves a tick half applied. After the tick the state is persisted and a
//! snapshot is broadcast.

use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::battle::execution::{BattlePhase, BattleState};
use crate::battle::snapshot::BattleSnapshot;
use crate::core::config::EngineConfig;
use crate::core::error::{ArcError, Result};
use crate::core::types::BattleId;
use crate::simulation::sinks::ReplaySink;
use crate::simulation::store::BattleStore;

type Registry = Arc<Mutex<HashMap<BattleId, JoinHandle<()>>>>;

/// Everything a battle task needs, cloned per spawn
#[derive(Clone)]
struct LoopContext {
    store: Arc<dyn BattleStore>,
    replay: Arc<dyn ReplaySink>,
    snapshots: broadcast::Sender<BattleSnapshot>,
    running: Registry,
    alert_threshold: u32,
    alerts: Arc<AtomicU64>,
}

pub struct BattleScheduler {
    ctx: LoopContext,
    config: EngineConfig,
}

fn lock(registry: &Registry) -> MutexGuard<'_, HashMap<BattleId, JoinHandle<()>>> {
    // A poisoned registry still holds valid handles
    registry.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl BattleScheduler {
    pub fn new(
        store: Arc<dyn BattleStore>,
        replay: Arc<dyn ReplaySink>,
        config: EngineConfig,
    ) -> Self {
        let (snapshots, _) = broadcast::channel(config.snapshot_channel_capacity.max(1));
        Self {
            ctx: LoopContext {
                store,
                replay,
                snapshots,
                running: Arc::new(Mutex::new(HashMap::new())),
                alert_threshold: config.persistence_alert_threshold,
                alerts: Arc::new(AtomicU64::new(0)),
            },
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Start the timer for a provisioned battle
    ///
    /// Must be called from within a tokio runtime. Starting a battle that is
    /// already running is a no-op.
    pub fn start(&self, battle_id: BattleId) -> Result<()> {
        let mut running = lock(&self.ctx.running);
        if running.contains_key(&battle_id) {
            debug!(battle = %battle_id, "Start ignored, already running");
            return Ok(());
        }

        let state = self
            .ctx
            .store
            .load(battle_id)?
            .ok_or(ArcError::BattleNotFound(battle_id))?;

        if !matches!(state.phase, BattlePhase::Deployment | BattlePhase::Active) {
            return Err(ArcError::InvalidStatus {
                battle_id,
                phase: state.phase,
            });
        }

        info!(battle = %battle_id, tick = state.tick, "Simulation starting");
        let handle = tokio::spawn(run_battle(state, self.ctx.clone()));
        running.insert(battle_id, handle);
        Ok(())
    }

    /// Stop a battle's timer. Returns whether it was running.
    pub fn stop(&self, battle_id: BattleId) -> bool {
        match lock(&self.ctx.running).remove(&battle_id) {
            Some(handle) => {
                handle.abort();
                info!(battle = %battle_id, "Simulation stopped");
                true
            }
            None => false,
        }
    }

    pub fn is_running(&self, battle_id: BattleId) -> bool {
        lock(&self.ctx.running).contains_key(&battle_id)
    }

    pub fn running_count(&self) -> usize {
        lock(&self.ctx.running).len()
    }

    /// Receive a snapshot after every tick of every battle
    pub fn subscribe(&self) -> broadcast::Receiver<BattleSnapshot> {
        self.ctx.snapshots.subscribe()
    }

    /// Operational alerts raised for repeated persistence failures
    pub fn alerts_raised(&self) -> u64 {
        self.ctx.alerts.load(Ordering::SeqCst)
    }
}

impl Drop for BattleScheduler {
    fn drop(&mut self) {
        for (_, handle) in lock(&self.ctx.running).drain() {
            handle.abort();
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Persist after a tick; failures never re-run the tick
fn persist(state: &BattleState, ctx: &LoopContext, failures: &mut u32) {
    match ctx.store.save(state) {
        Ok(()) => *failures = 0,
        Err(e) => {
            *failures += 1;
            warn!(battle = %state.id, tick = state.tick, failures = *failures, "Persist failed: {}", e);
            if *failures == ctx.alert_threshold {
                ctx.alerts.fetch_add(1, Ordering::SeqCst);
                error!(
                    battle = %state.id,
                    failures = *failures,
                    "ALERT: battle state persistence failing repeatedly"
                );
            }
        }
    }
}

/// Write the result out and say goodbye
fn finalize(state: &BattleState, ctx: &LoopContext) {
    let Some(result) = &state.result else {
        return;
    };
    if let Err(e) = ctx.store.save_result(result) {
        error!(battle = %state.id, "Failed to store result: {}", e);
    }
    if let Err(e) = ctx.replay.record(result) {
        error!(battle = %state.id, "Failed to record replay: {}", e);
    }
    info!(
        battle = %state.id,
        winner = ?result.winner,
        ticks = result.ticks,
        "Simulation complete"
    );
}

async fn run_battle(mut state: BattleState, ctx: LoopContext) {
    let battle_id = state.id;
    let mut interval = time::interval(Duration::from_millis(state.config.tick_ms.max(1)));
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut failures = 0u32;

    loop {
        interval.tick().await;

        let tick = state.tick;
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| state.run_tick()));
        let events = match outcome {
            Ok(events) => events,
            Err(payload) => {
                let err = ArcError::TickPanicked {
                    battle_id,
                    tick,
                    message: panic_message(payload.as_ref()),
                };
                error!("{}", err);
                break;
            }
        };
        if !events.is_empty() {
            debug!(battle = %battle_id, tick, events = events.events.len(), "Tick events");
        }

        persist(&state, &ctx, &mut failures);
        // No subscribers is fine
        let _ = ctx.snapshots.send(BattleSnapshot::capture(&state));

        if state.is_finished() {
            finalize(&state, &ctx);
            break;
        }
    }

    lock(&ctx.running).remove(&battle_id);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_message_variants() {
        let boxed: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(boxed.as_ref()), "boom");
        let boxed: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(boxed.as_ref()), "bang");
        let boxed: Box<dyn Any + Send> = Box::new(42u8);
        assert_eq!(panic_message(boxed.as_ref()), "unknown panic");
    }
}
