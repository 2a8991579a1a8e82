//! Command handlers for the ragbot CLI.
//!
//! `serve` runs the HTTP API; the other commands run a single service
//! operation against the configured collection and exit.

pub mod ask;
pub mod clear;
pub mod index;
pub mod serve;
pub mod stats;

pub use ask::AskCommand;
pub use clear::ClearCommand;
pub use index::IndexCommand;
pub use serve::ServeCommand;
pub use stats::StatsCommand;
