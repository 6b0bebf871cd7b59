//! Live simulation: per-battle timers plus the persistence and replay seams

pub mod scheduler;
pub mod sinks;
pub mod store;

pub use scheduler::BattleScheduler;
pub use sinks::{InMemoryReplaySink, ReplaySink};
pub use store::{BattleStore, InMemoryBattleStore};
