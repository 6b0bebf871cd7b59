//! Arc Tactics - real-time tactical battle simulation engine

pub mod battle;
pub mod core;
pub mod simulation;
