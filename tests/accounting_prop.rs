//! Property tests for episode accounting and windowed reporting.
//!
//! Invariants covered:
//! - Every (slot, timestep) pair lands in exactly one episode: finalized
//!   lengths plus in-flight lengths equal `num_envs * steps`.
//! - Replaying the same reward/done script yields the same finalized list.
//! - With window `w`, reports happen exactly at finalized counts `w, 2w, ...`,
//!   each over the latest `w` episodes and keyed by the cumulative length.
use proptest::prelude::*;
use rollout_stats::rollout::{
    EpisodeAccumulator, MemoryConsole, MemoryMetrics, RolloutStats, TRAIN_TAG,
};
use rollout_stats::stats::{Episode, EpisodesStats};

/// `(num_envs, steps)` where each step is a `(reward, done)` vector pair.
fn script() -> impl Strategy<Value = (usize, Vec<(Vec<f64>, Vec<bool>)>)> {
    (1usize..6).prop_flat_map(|n| {
        let step = (
            prop::collection::vec(-10.0f64..10.0, n),
            prop::collection::vec(prop::bool::weighted(0.3), n),
        );
        (Just(n), prop::collection::vec(step, 0..60))
    })
}

/// Finalized episodes computed independently of the accumulator.
fn expected_finalized(n: usize, steps: &[(Vec<f64>, Vec<bool>)]) -> Vec<Episode> {
    let mut live = vec![Episode::default(); n];
    let mut out = Vec::new();
    for (reward, done) in steps {
        for i in 0..n {
            live[i].score += reward[i];
            live[i].length += 1;
            if done[i] {
                out.push(live[i]);
                live[i] = Episode::default();
            }
        }
    }
    out
}

proptest! {
    #[test]
    fn every_env_step_is_accounted_for((n, steps) in script()) {
        let mut acc = EpisodeAccumulator::new(n).unwrap();
        for (reward, done) in &steps {
            acc.step(reward, done).unwrap();
        }
        let finalized: u64 = acc.history().retained().map(|e| e.length).sum();
        prop_assert_eq!(finalized, acc.history().total_steps());
        prop_assert_eq!(
            finalized + acc.in_flight_steps(),
            (n * steps.len()) as u64
        );
        prop_assert_eq!(acc.current_episodes().len(), n);
    }

    #[test]
    fn finalized_order_is_deterministic((n, steps) in script()) {
        let mut a = EpisodeAccumulator::new(n).unwrap();
        let mut b = EpisodeAccumulator::new(n).unwrap();
        for (reward, done) in &steps {
            a.step(reward, done).unwrap();
            b.step(reward, done).unwrap();
        }
        let a_eps: Vec<Episode> = a.history().retained().copied().collect();
        let b_eps: Vec<Episode> = b.history().retained().copied().collect();
        prop_assert_eq!(&a_eps, &b_eps);
        prop_assert_eq!(a_eps, expected_finalized(n, &steps));
    }

    #[test]
    fn windows_report_at_multiples((n, steps) in script(), window in 1usize..5) {
        let mut stats: RolloutStats<MemoryMetrics, MemoryConsole> = RolloutStats::windowed(
            n,
            window as i64,
            MemoryMetrics::default(),
            MemoryConsole::default(),
        )
        .unwrap();
        for (reward, done) in &steps {
            stats.step(reward, done).unwrap();
        }

        let all = expected_finalized(n, &steps);
        let records = stats.listener().metrics().records();
        prop_assert_eq!(records.len(), all.len() / window);
        prop_assert_eq!(stats.epochs().len(), records.len());
        prop_assert_eq!(stats.listener().console().lines().len(), records.len());

        for (k, (record, epoch)) in records.iter().zip(stats.epochs()).enumerate() {
            let end = (k + 1) * window;
            let expected_window = &all[end - window..end];
            let expected_step: u64 = all[..end].iter().map(|e| e.length).sum();

            prop_assert_eq!(record.tag.as_str(), TRAIN_TAG);
            prop_assert_eq!(record.step, expected_step);
            prop_assert_eq!(epoch.episodes(), expected_window);

            let direct = EpisodesStats::from_slice(expected_window, false).unwrap();
            prop_assert_eq!(record.values["mean"], direct.score().mean());
            prop_assert_eq!(record.values["result"], direct.risk_adjusted());
        }
    }

    #[test]
    fn mismatched_vectors_never_mutate((n, steps) in script()) {
        let mut acc = EpisodeAccumulator::new(n).unwrap();
        for (reward, done) in &steps {
            acc.step(reward, done).unwrap();
        }
        let before: Vec<Episode> = acc.current_episodes().to_vec();
        let finalized = acc.len();

        let long_reward = vec![1.0; n + 1];
        let all_done = vec![true; n];
        prop_assert!(acc.step(&long_reward, &all_done).is_err());
        prop_assert_eq!(acc.current_episodes(), before.as_slice());
        prop_assert_eq!(acc.len(), finalized);
    }
}
