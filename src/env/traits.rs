//! Vectorized environment seam.
//!
//! The accumulator never constructs environments itself; anything that can
//! produce one reward and one done flag per slot per timestep implements
//! [`VecEnv`].

use serde::{Deserialize, Serialize};

/// Output of one lockstep timestep across all slots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepBatch {
    pub reward: Vec<f64>,
    pub done: Vec<bool>,
}

/// N environment instances advancing in lockstep.
///
/// A slot that reports done is expected to have been reset by the time the
/// next batch is produced.
pub trait VecEnv {
    fn num_envs(&self) -> usize;

    /// Advance every slot by one timestep.
    fn step(&mut self) -> anyhow::Result<StepBatch>;
}
