//! Engine opponent
//!
//! The engine runs as a separate UCI process so a long think never blocks
//! the session. Requests and answers are correlated by the bridge; answers
//! for positions that are gone are dropped, never applied.
//!
//! # Architecture
//!
//! - `strength` - [`Difficulty`] and its UCI skill level and think time
//! - `uci` - the UCI commands sent and the `bestmove` line parsed back
//! - `worker` - process launch and line I/O behind [`WorkerLauncher`]
//! - `bridge` - [`EngineBridge`], request bookkeeping and staleness checks

pub mod bridge;
pub mod strength;
pub mod uci;
pub mod worker;

// Re-export for convenience
pub use bridge::{BridgeState, EngineBridge, EngineOutcome, PendingEngineRequest};
pub use strength::Difficulty;
pub use uci::{classify, EngineLine, UciCommand};
pub use worker::{EngineWorker, UciProcessLauncher, WorkerLauncher};
