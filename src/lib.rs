//! Rollout statistics for vectorized reinforcement-learning environments.
//!
//! Tracks one in-flight episode per environment slot, finalizes episodes when
//! their slot reports done, aggregates windows of finished episodes into
//! mean/std statistics and ranks them by the risk-adjusted score
//! `mean - std` for checkpoint selection.

pub mod config;
pub mod env;
pub mod error;
pub mod rollout;
pub mod stats;

pub use error::StatsError;
