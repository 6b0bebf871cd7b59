//! Headless Battle Runner
//!
//! Runs seeded AI vs AI skirmishes without a timer and prints the results.

use std::path::PathBuf;

use arc_tactics::battle::{generate_skirmish, BattleMap, BattleResult, BattleState};
use arc_tactics::core::config::EngineConfig;
use arc_tactics::core::error::Result;
use clap::Parser;
use rayon::prelude::*;
use serde::Serialize;

/// Headless Battle Runner - seeded skirmishes to completion
#[derive(Parser, Debug)]
#[command(name = "battle_runner")]
#[command(about = "Run seeded AI vs AI skirmishes and print their results")]
struct Args {
    /// Base seed; run N uses seed + N
    #[arg(long)]
    seed: Option<u64>,

    /// Number of battles to run (in parallel)
    #[arg(long, default_value_t = 1)]
    runs: u64,

    /// Units generated per side
    #[arg(long, default_value_t = 6)]
    units_per_side: usize,

    /// Map width in world units
    #[arg(long, default_value_t = 1000.0)]
    map_width: f32,

    /// Map height in world units
    #[arg(long, default_value_t = 600.0)]
    map_height: f32,

    /// Maximum ticks before the battle is decided on troops
    #[arg(long)]
    max_ticks: Option<u64>,

    /// Engine config TOML; flags override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output format: json or text
    #[arg(long, default_value = "json")]
    format: String,
}

/// One line of runner output
#[derive(Serialize)]
struct RunSummary {
    seed: u64,
    attacker_units: usize,
    defender_units: usize,
    result: BattleResult,
}

fn run_one(seed: u64, args: &Args, config: &EngineConfig) -> RunSummary {
    let map = BattleMap::new(args.map_width, args.map_height);
    let skirmish = generate_skirmish(seed, args.units_per_side, &map);
    let mut state =
        BattleState::from_rosters(map, &skirmish.attackers, &skirmish.defenders, config.clone());
    state.deploy();
    let result = state.run_to_completion();

    RunSummary {
        seed,
        attacker_units: skirmish.attackers.len(),
        defender_units: skirmish.defenders.len(),
        result,
    }
}

fn print_text(summary: &RunSummary) {
    let r = &summary.result;
    println!("Battle Result (seed {})", summary.seed);
    println!("=============");
    println!("Winner: {:?} ({:?})", r.winner, r.reason);
    println!("Ticks: {}", r.ticks);
    println!(
        "Attackers: {} units, {} troops left, {} lost",
        summary.attacker_units, r.attacker_troops, r.stats.attackers.troops_lost
    );
    println!(
        "Defenders: {} units, {} troops left, {} lost",
        summary.defender_units, r.defender_troops, r.stats.defenders.troops_lost
    );
    println!(
        "Charges landed: {} / {}",
        r.stats.attackers.charges_landed, r.stats.defenders.charges_landed
    );
    println!();
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "arc_tactics=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    if let Some(max_ticks) = args.max_ticks {
        config.max_ticks = max_ticks;
    }
    config.validate().map_err(arc_tactics::core::error::ArcError::Config)?;

    let base_seed = args.seed.unwrap_or_else(rand::random);

    let summaries: Vec<RunSummary> = (0..args.runs)
        .into_par_iter()
        .map(|i| run_one(base_seed.wrapping_add(i), &args, &config))
        .collect();

    match args.format.as_str() {
        "text" => summaries.iter().for_each(print_text),
        "json" => println!("{}", serde_json::to_string_pretty(&summaries)?),
        other => {
            eprintln!("Unknown format '{}', defaulting to json", other);
            println!("{}", serde_json::to_string_pretty(&summaries)?);
        }
    }

    Ok(())
}
