//! Seeded synthetic vectorized environment.
//!
//! Each slot draws an episode horizon uniformly from
//! `[min_episode_len, max_episode_len]` and emits rewards uniformly from
//! `reward_mean ± reward_spread`. When the horizon is reached the slot reports
//! done and immediately starts a new episode. The same seed always yields the
//! same batches.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::traits::{StepBatch, VecEnv};
use crate::config::MockEnvConfig;
use crate::error::StatsError;

pub struct MockVecEnv {
    config: MockEnvConfig,
    rng: StdRng,
    /// Steps left in each slot's current episode.
    remaining: Vec<u64>,
}

impl MockVecEnv {
    pub fn new(num_envs: usize, config: MockEnvConfig) -> Result<Self, StatsError> {
        if num_envs == 0 {
            return Err(StatsError::NoEnvironments);
        }
        config.validate()?;

        let mut env = Self {
            rng: StdRng::seed_from_u64(config.seed),
            config,
            remaining: Vec::with_capacity(num_envs),
        };
        for _ in 0..num_envs {
            let horizon = env.horizon();
            env.remaining.push(horizon);
        }
        Ok(env)
    }

    fn horizon(&mut self) -> u64 {
        self.rng
            .gen_range(self.config.min_episode_len..=self.config.max_episode_len)
    }

    fn reward(&mut self) -> f64 {
        let spread = self.config.reward_spread;
        self.config.reward_mean + self.rng.gen_range(-spread..=spread)
    }
}

impl VecEnv for MockVecEnv {
    fn num_envs(&self) -> usize {
        self.remaining.len()
    }

    fn step(&mut self) -> anyhow::Result<StepBatch> {
        let n = self.remaining.len();
        let mut reward = Vec::with_capacity(n);
        let mut done = Vec::with_capacity(n);

        for idx in 0..n {
            reward.push(self.reward());
            self.remaining[idx] -= 1;
            let finished = self.remaining[idx] == 0;
            if finished {
                self.remaining[idx] = self.horizon();
            }
            done.push(finished);
        }

        Ok(StepBatch { reward, done })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(min: u64, max: u64) -> MockEnvConfig {
        MockEnvConfig {
            seed: 7,
            min_episode_len: min,
            max_episode_len: max,
            reward_mean: 1.0,
            reward_spread: 0.25,
        }
    }

    #[test]
    fn rejects_empty_or_invalid_setup() {
        assert!(MockVecEnv::new(0, config(1, 2)).is_err());
        assert!(MockVecEnv::new(2, config(5, 1)).is_err());

        let mut wide = config(1, 2);
        wide.reward_spread = 1e308;
        assert!(MockVecEnv::new(1, wide).is_err());
    }

    #[test]
    fn fixed_horizon_finishes_every_slot_together() {
        let mut env = MockVecEnv::new(3, config(4, 4)).unwrap();
        for t in 1..=12 {
            let batch = env.step().unwrap();
            assert_eq!(batch.reward.len(), 3);
            let expected = t % 4 == 0;
            assert!(batch.done.iter().all(|&d| d == expected), "t={t}");
        }
    }

    #[test]
    fn rewards_stay_within_spread() {
        let mut env = MockVecEnv::new(4, config(2, 9)).unwrap();
        for _ in 0..50 {
            let batch = env.step().unwrap();
            assert!(batch.reward.iter().all(|r| (0.75..=1.25).contains(r)));
        }
    }

    #[test]
    fn same_seed_same_batches() {
        let mut a = MockVecEnv::new(2, config(1, 6)).unwrap();
        let mut b = MockVecEnv::new(2, config(1, 6)).unwrap();
        for _ in 0..20 {
            assert_eq!(a.step().unwrap(), b.step().unwrap());
        }
    }
}
