//! Vectorized environment sources.
//!
//! Building real simulation backends is the host trainer's job; this module
//! only defines the [`VecEnv`] seam the rollout driver consumes plus a seeded
//! [`MockVecEnv`] for demos and tests.

pub mod mock;
pub mod traits;

pub use mock::MockVecEnv;
pub use traits::{StepBatch, VecEnv};
