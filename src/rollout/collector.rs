//! Drives a vectorized environment into an accumulator.

use anyhow::{Context, Result};
use tracing::{debug, info};

use super::accumulator::{EpisodeAccumulator, EpisodeListener};
use crate::env::VecEnv;

/// Pull `num_steps` batches from `env` and feed each one to `acc`.
///
/// Returns the number of episodes finalized during the run.
pub fn collect_steps<E, L>(
    env: &mut E,
    acc: &mut EpisodeAccumulator<L>,
    num_steps: u64,
) -> Result<usize>
where
    E: VecEnv + ?Sized,
    L: EpisodeListener,
{
    anyhow::ensure!(
        env.num_envs() == acc.num_envs(),
        "environment has {} slots but the accumulator tracks {}",
        env.num_envs(),
        acc.num_envs()
    );

    let mut finished = 0;
    for t in 0..num_steps {
        let batch = env
            .step()
            .with_context(|| format!("environment step {t} failed"))?;
        let n = acc
            .step(&batch.reward, &batch.done)
            .with_context(|| format!("bad batch at step {t}"))?;
        if n > 0 {
            debug!(step = t, finished = n, "slots finished");
        }
        finished += n;
    }

    info!(
        steps = num_steps,
        envs = acc.num_envs(),
        finished,
        total_finalized = acc.len(),
        "collection done"
    );
    Ok(finished)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MockEnvConfig;
    use crate::env::{MockVecEnv, StepBatch};

    struct Scripted {
        batches: Vec<StepBatch>,
    }

    impl VecEnv for Scripted {
        fn num_envs(&self) -> usize {
            2
        }

        fn step(&mut self) -> Result<StepBatch> {
            if self.batches.is_empty() {
                anyhow::bail!("script exhausted");
            }
            Ok(self.batches.remove(0))
        }
    }

    #[test]
    fn feeds_every_batch() {
        let mut env = Scripted {
            batches: vec![
                StepBatch {
                    reward: vec![1.0, 2.0],
                    done: vec![false, false],
                },
                StepBatch {
                    reward: vec![3.0, 4.0],
                    done: vec![true, false],
                },
            ],
        };
        let mut acc = EpisodeAccumulator::new(2).unwrap();
        assert_eq!(collect_steps(&mut env, &mut acc, 2).unwrap(), 1);
        assert_eq!(acc.history().last().unwrap().score, 4.0);

        let err = collect_steps(&mut env, &mut acc, 1).unwrap_err();
        assert!(format!("{err:#}").contains("script exhausted"));
    }

    #[test]
    fn rejects_slot_count_mismatch() {
        let mut env = MockVecEnv::new(3, MockEnvConfig::default()).unwrap();
        let mut acc = EpisodeAccumulator::new(2).unwrap();
        assert!(collect_steps(&mut env, &mut acc, 1).is_err());
    }

    #[test]
    fn wrong_batch_width_is_reported() {
        let mut env = Scripted {
            batches: vec![StepBatch {
                reward: vec![1.0],
                done: vec![true, true],
            }],
        };
        let mut acc = EpisodeAccumulator::new(2).unwrap();
        let err = collect_steps(&mut env, &mut acc, 1).unwrap_err();
        assert!(format!("{err:#}").contains("bad batch at step 0"));
        assert!(acc.is_empty());
    }

    #[test]
    fn mock_env_run_balances_step_accounting() {
        let config = MockEnvConfig {
            seed: 3,
            min_episode_len: 2,
            max_episode_len: 9,
            ..MockEnvConfig::default()
        };
        let mut env = MockVecEnv::new(4, config).unwrap();
        let mut acc = EpisodeAccumulator::new(4).unwrap();
        collect_steps(&mut env, &mut acc, 100).unwrap();

        assert!(!acc.is_empty());
        assert_eq!(acc.history().total_steps() + acc.in_flight_steps(), 400);
    }
}
