//! Arc Tactics - Entry Point
//!
//! Live demo: provisions a seeded skirmish into the in-memory store, starts
//! the scheduler and logs snapshots until the battle is decided.

use std::sync::Arc;

use arc_tactics::battle::{generate_skirmish, BattleMap, BattleSnapshot, BattleState, Side};
use arc_tactics::core::config::EngineConfig;
use arc_tactics::core::error::Result;
use arc_tactics::simulation::{BattleScheduler, InMemoryBattleStore, InMemoryReplaySink};
use tokio::sync::broadcast::error::RecvError;

/// Log every Nth snapshot
const LOG_EVERY: u64 = 20;

fn log_snapshot(snapshot: &BattleSnapshot) {
    let troops = |side: Side| -> u64 {
        snapshot
            .units
            .iter()
            .filter(|u| u.side == side)
            .map(|u| u64::from(u.troops))
            .sum()
    };
    tracing::info!(
        tick = snapshot.tick,
        attackers = snapshot.living_count(Side::Attacker),
        attacker_troops = troops(Side::Attacker),
        defenders = snapshot.living_count(Side::Defender),
        defender_troops = troops(Side::Defender),
        "Snapshot"
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "arc_tactics=info".into()),
        )
        .init();

    tracing::info!("Arc Tactics starting...");

    let config = match std::env::args().nth(1) {
        Some(path) => EngineConfig::load(std::path::Path::new(&path))?,
        None => EngineConfig::default(),
    };

    let map = BattleMap::new(1000.0, 600.0);
    let skirmish = generate_skirmish(rand::random(), 5, &map);
    let mut state =
        BattleState::from_rosters(map, &skirmish.attackers, &skirmish.defenders, config.clone());
    state.deploy();
    let battle_id = state.id;

    let store = Arc::new(InMemoryBattleStore::new());
    store.insert(state)?;
    let replay = Arc::new(InMemoryReplaySink::new());
    let scheduler = BattleScheduler::new(store.clone(), replay.clone(), config);

    let mut snapshots = scheduler.subscribe();
    scheduler.start(battle_id)?;

    loop {
        match snapshots.recv().await {
            Ok(snapshot) => {
                if snapshot.tick % LOG_EVERY == 0 || snapshot.winner.is_some() {
                    log_snapshot(&snapshot);
                }
                if snapshot.winner.is_some() {
                    break;
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Observer lagging behind");
            }
            Err(RecvError::Closed) => break,
        }
    }

    // The result is written right after the final snapshot
    while scheduler.is_running(battle_id) {
        tokio::task::yield_now().await;
    }

    match store.result(battle_id) {
        Some(result) => println!("{}", serde_json::to_string_pretty(&result)?),
        None => tracing::warn!("Battle ended without a stored result"),
    }
    tracing::info!(replays = replay.results().len(), "Done");

    Ok(())
}
