//! Scheduler integration tests
//!
//! Time is paused, so interval ticks fire as soon as the runtime is idle.

use std::sync::Arc;
use std::time::Duration;

use arc_tactics::battle::{BattleMap, BattlePhase, BattleState, BattleUnit, Side, UnitCategory, Winner};
use arc_tactics::core::config::EngineConfig;
use arc_tactics::core::error::ArcError;
use arc_tactics::core::types::{BattleId, Vec2};
use arc_tactics::simulation::{
    BattleScheduler, BattleStore, InMemoryBattleStore, InMemoryReplaySink,
};

struct Harness {
    store: Arc<InMemoryBattleStore>,
    replay: Arc<InMemoryReplaySink>,
    scheduler: BattleScheduler,
}

fn harness(config: EngineConfig) -> Harness {
    let store = Arc::new(InMemoryBattleStore::new());
    let replay = Arc::new(InMemoryReplaySink::new());
    let scheduler = BattleScheduler::new(store.clone(), replay.clone(), config);
    Harness {
        store,
        replay,
        scheduler,
    }
}

/// Two footmen in contact: decided on the first tick
fn duel(config: EngineConfig) -> BattleState {
    let a = BattleUnit::new(Side::Attacker, UnitCategory::Footman, 100, Vec2::new(300.0, 300.0));
    let d = BattleUnit::new(Side::Defender, UnitCategory::Footman, 100, Vec2::new(330.0, 300.0));
    BattleState::new(BattleMap::new(1000.0, 600.0), vec![a], vec![d], config)
}

/// Two footmen that never meet before `max_ticks`
fn standoff(config: EngineConfig) -> BattleState {
    let a = BattleUnit::new(Side::Attacker, UnitCategory::Footman, 100, Vec2::new(50.0, 300.0));
    let d = BattleUnit::new(Side::Defender, UnitCategory::Footman, 100, Vec2::new(950.0, 300.0));
    BattleState::new(BattleMap::new(1000.0, 600.0), vec![a], vec![d], config)
}

async fn wait_until_stopped(scheduler: &BattleScheduler, battle_id: BattleId) {
    for _ in 0..10_000 {
        if !scheduler.is_running(battle_id) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("battle {} never stopped", battle_id);
}

#[tokio::test(start_paused = true)]
async fn test_start_missing_battle_is_not_found() {
    let h = harness(EngineConfig::default());
    let result = h.scheduler.start(BattleId::new());
    assert!(matches!(result, Err(ArcError::BattleNotFound(_))));
    assert_eq!(h.scheduler.running_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_start_rejects_planning_without_mutation() {
    let h = harness(EngineConfig::default());
    let state = duel(EngineConfig::default());
    let id = state.id;
    h.store.insert(state).unwrap();

    let result = h.scheduler.start(id);
    assert!(matches!(
        result,
        Err(ArcError::InvalidStatus {
            phase: BattlePhase::Planning,
            ..
        })
    ));
    assert!(!h.scheduler.is_running(id));

    tokio::time::sleep(Duration::from_millis(500)).await;
    let stored = h.store.load(id).unwrap().unwrap();
    assert_eq!(stored.phase, BattlePhase::Planning);
    assert_eq!(stored.tick, 0);
    assert_eq!(h.store.save_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_battle_runs_to_result() {
    let h = harness(EngineConfig::default());
    let mut state = duel(EngineConfig::default());
    state.deploy();
    let id = state.id;
    h.store.insert(state).unwrap();

    let mut rx = h.scheduler.subscribe();
    h.scheduler.start(id).unwrap();
    assert!(h.scheduler.is_running(id));

    let last = loop {
        let snapshot = rx.recv().await.unwrap();
        assert_eq!(snapshot.battle_id, id);
        if snapshot.winner.is_some() {
            break snapshot;
        }
    };
    assert_eq!(last.phase, BattlePhase::Finished);

    wait_until_stopped(&h.scheduler, id).await;

    let result = h.store.result(id).expect("result stored");
    assert_eq!(Some(result.winner), last.winner);
    let replays = h.replay.results();
    assert_eq!(replays.len(), 1);
    assert_eq!(replays[0].battle_id, id);

    let stored = h.store.load(id).unwrap().unwrap();
    assert!(stored.is_finished());
}

#[tokio::test(start_paused = true)]
async fn test_start_twice_is_noop_and_stop_is_idempotent() {
    let h = harness(EngineConfig::default());
    let mut state = standoff(EngineConfig::default());
    state.deploy();
    let id = state.id;
    h.store.insert(state).unwrap();

    h.scheduler.start(id).unwrap();
    h.scheduler.start(id).unwrap();
    assert_eq!(h.scheduler.running_count(), 1);

    tokio::time::sleep(Duration::from_millis(500)).await;

    assert!(h.scheduler.stop(id));
    assert!(!h.scheduler.stop(id));
    assert!(!h.scheduler.is_running(id));

    let saved_at_stop = h.store.save_count();
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(h.store.save_count(), saved_at_stop);
}

#[tokio::test(start_paused = true)]
async fn test_persistence_failures_do_not_halt_or_repeat_ticks() {
    let config = EngineConfig {
        max_ticks: 10,
        persistence_alert_threshold: 3,
        ..EngineConfig::default()
    };
    let h = harness(config.clone());
    let mut state = standoff(config);
    state.deploy();
    let id = state.id;
    h.store.insert(state).unwrap();
    h.store.set_failing(true);

    let mut rx = h.scheduler.subscribe();
    h.scheduler.start(id).unwrap();

    let mut ticks = Vec::new();
    loop {
        let snapshot = rx.recv().await.unwrap();
        ticks.push(snapshot.tick);
        if snapshot.winner.is_some() {
            assert_eq!(snapshot.winner, Some(Winner::Draw));
            break;
        }
    }
    assert_eq!(ticks, (1..=10).collect::<Vec<u64>>());

    wait_until_stopped(&h.scheduler, id).await;
    assert_eq!(h.scheduler.alerts_raised(), 1);
    assert_eq!(h.store.save_count(), 0);
    // The replay sink is independent of the failing store
    assert_eq!(h.replay.results().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_resume_active_battle_continues_from_stored_tick() {
    let h = harness(EngineConfig::default());
    let mut state = standoff(EngineConfig::default());
    state.deploy();
    state.run_tick();
    state.run_tick();
    assert_eq!(state.phase, BattlePhase::Active);
    let id = state.id;
    h.store.insert(state).unwrap();

    let mut rx = h.scheduler.subscribe();
    h.scheduler.start(id).unwrap();
    let first = rx.recv().await.unwrap();
    assert_eq!(first.tick, 3);
    h.scheduler.stop(id);
}

#[tokio::test(start_paused = true)]
async fn test_tick_panic_stops_battle_without_persisting() {
    let h = harness(EngineConfig::default());
    // Negative width makes map clamping panic while the first tick builds its grid
    let a = BattleUnit::new(Side::Attacker, UnitCategory::Footman, 100, Vec2::new(5.0, 50.0));
    let d = BattleUnit::new(Side::Defender, UnitCategory::Footman, 100, Vec2::new(5.0, 90.0));
    let mut state = BattleState::new(
        BattleMap::new(-10.0, 100.0),
        vec![a],
        vec![d],
        EngineConfig::default(),
    );
    state.deploy();
    let id = state.id;
    h.store.insert(state).unwrap();

    h.scheduler.start(id).unwrap();
    wait_until_stopped(&h.scheduler, id).await;
    assert_eq!(h.scheduler.running_count(), 0);

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(h.store.save_count(), 0);
    assert!(h.store.result(id).is_none());
    assert!(h.replay.results().is_empty());
    let stored = h.store.load(id).unwrap().unwrap();
    assert_eq!(stored.tick, 0);
    assert_eq!(stored.phase, BattlePhase::Deployment);
}

#[tokio::test(start_paused = true)]
async fn test_finished_battle_cannot_start() {
    let h = harness(EngineConfig::default());
    let mut state = duel(EngineConfig::default());
    state.deploy();
    state.run_to_completion();
    let id = state.id;
    h.store.insert(state).unwrap();

    assert!(matches!(
        h.scheduler.start(id),
        Err(ArcError::InvalidStatus {
            phase: BattlePhase::Finished,
            ..
        })
    ));
}

#[tokio::test(start_paused = true)]
async fn test_independent_battles_run_concurrently() {
    let h = harness(EngineConfig::default());
    let mut ids = Vec::new();
    for _ in 0..3 {
        let mut state = standoff(EngineConfig::default());
        state.deploy();
        ids.push(state.id);
        h.store.insert(state).unwrap();
    }
    for id in &ids {
        h.scheduler.start(*id).unwrap();
    }
    assert_eq!(h.scheduler.running_count(), 3);

    tokio::time::sleep(Duration::from_millis(1000)).await;
    for id in &ids {
        let stored = h.store.load(*id).unwrap().unwrap();
        assert!(stored.tick > 0);
    }

    h.scheduler.stop(ids[0]);
    assert_eq!(h.scheduler.running_count(), 2);
}
