//! Per-slot episode bookkeeping for N environments stepping in lockstep.
//!
//! [`EpisodeAccumulator`] owns exactly one in-flight [`Episode`] per
//! environment slot. Every [`step`](EpisodeAccumulator::step) extends all of
//! them, moves the finished ones into an append-only [`EpisodeHistory`] and
//! hands each finished episode to an [`EpisodeListener`] chosen at
//! construction time.

use std::collections::VecDeque;

use tracing::debug;

use crate::error::StatsError;
use crate::stats::{Episode, EpisodesStats};

// ---------------------------------------------------------------------------
// Listener
// ---------------------------------------------------------------------------

/// Reacts to finalized episodes.
///
/// `history` already contains `episode` as its most recent entry when
/// `on_done` runs.
pub trait EpisodeListener {
    fn on_done(&mut self, env_index: usize, episode: &Episode, history: &EpisodeHistory);

    /// Number of most recent episodes the listener needs to stay retained.
    fn min_history(&self) -> usize {
        0
    }
}

/// Listener that ignores every episode.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopListener;

impl EpisodeListener for NoopListener {
    fn on_done(&mut self, _env_index: usize, _episode: &Episode, _history: &EpisodeHistory) {}
}

impl<F> EpisodeListener for F
where
    F: FnMut(usize, &Episode, &EpisodeHistory),
{
    fn on_done(&mut self, env_index: usize, episode: &Episode, history: &EpisodeHistory) {
        self(env_index, episode, history)
    }
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

/// Finalized episodes in completion order.
///
/// Without a retention limit every episode is kept. With a limit only the most
/// recent ones are; the finalized count and the summed length keep covering
/// every episode ever finalized.
#[derive(Debug, Clone, Default)]
pub struct EpisodeHistory {
    retained: VecDeque<Episode>,
    finalized: usize,
    total_steps: u64,
    limit: Option<usize>,
}

impl EpisodeHistory {
    fn push(&mut self, episode: Episode) {
        self.retained.push_back(episode);
        self.finalized += 1;
        self.total_steps += episode.length;
    }

    fn trim(&mut self, floor: usize) {
        let Some(limit) = self.limit else { return };
        let keep = limit.max(floor);
        while self.retained.len() > keep {
            self.retained.pop_front();
        }
    }

    /// Total number of episodes finalized so far.
    pub fn len(&self) -> usize {
        self.finalized
    }

    pub fn is_empty(&self) -> bool {
        self.finalized == 0
    }

    /// Sum of lengths over every finalized episode.
    pub fn total_steps(&self) -> u64 {
        self.total_steps
    }

    pub fn retention_limit(&self) -> Option<usize> {
        self.limit
    }

    pub fn retained_len(&self) -> usize {
        self.retained.len()
    }

    pub fn retained(&self) -> impl Iterator<Item = &Episode> + '_ {
        self.retained.iter()
    }

    /// The `n` most recently finalized episodes still retained, oldest first.
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &Episode> + '_ {
        let start = self.retained.len().saturating_sub(n);
        self.retained.range(start..)
    }

    pub fn last(&self) -> Option<&Episode> {
        self.retained.back()
    }
}

// ---------------------------------------------------------------------------
// Accumulator
// ---------------------------------------------------------------------------

/// Running episodes for `N` environment slots plus the finalized history.
#[derive(Debug, Clone)]
pub struct EpisodeAccumulator<L = NoopListener> {
    current: Vec<Episode>,
    history: EpisodeHistory,
    listener: L,
}

impl EpisodeAccumulator<NoopListener> {
    /// Plain accumulator with no reaction to finished episodes.
    pub fn new(num_envs: usize) -> Result<Self, StatsError> {
        Self::with_listener(num_envs, NoopListener)
    }
}

impl<L: EpisodeListener> EpisodeAccumulator<L> {
    pub fn with_listener(num_envs: usize, listener: L) -> Result<Self, StatsError> {
        if num_envs == 0 {
            return Err(StatsError::NoEnvironments);
        }
        Ok(Self {
            current: vec![Episode::default(); num_envs],
            history: EpisodeHistory::default(),
            listener,
        })
    }

    /// Keep at most `limit` finalized episodes in memory (never fewer than
    /// the listener asks for).
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history.limit = Some(limit);
        self.history.trim(self.listener.min_history());
        self
    }

    /// Advance every slot by one timestep.
    ///
    /// `reward[i]` is added to slot `i`; when `done[i]` is set the slot's
    /// episode is finalized (in ascending slot order) and replaced with an
    /// empty one. Returns the number of episodes finalized by this call.
    ///
    /// Both slices must have exactly `num_envs` entries; otherwise nothing is
    /// updated.
    pub fn step(&mut self, reward: &[f64], done: &[bool]) -> Result<usize, StatsError> {
        let expected = self.current.len();
        if reward.len() != expected || done.len() != expected {
            return Err(StatsError::LengthMismatch {
                expected,
                reward: reward.len(),
                done: done.len(),
            });
        }

        let mut finished = 0;
        for (idx, (&r, &d)) in reward.iter().zip(done).enumerate() {
            let slot = &mut self.current[idx];
            slot.record_step(r);
            if !d {
                continue;
            }

            let episode = std::mem::take(slot);
            self.history.push(episode);
            self.listener.on_done(idx, &episode, &self.history);
            self.history.trim(self.listener.min_history());
            finished += 1;

            debug!(
                env = idx,
                score = episode.score,
                length = episode.length,
                finalized = self.history.len(),
                "episode finished"
            );
        }
        Ok(finished)
    }

    pub fn num_envs(&self) -> usize {
        self.current.len()
    }

    /// Total number of finalized episodes.
    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// In-flight episodes, indexed by slot.
    pub fn current_episodes(&self) -> &[Episode] {
        &self.current
    }

    /// Steps taken by the in-flight episodes.
    pub fn in_flight_steps(&self) -> u64 {
        self.current.iter().map(|e| e.length).sum()
    }

    pub fn history(&self) -> &EpisodeHistory {
        &self.history
    }

    /// Stats over every retained finalized episode.
    pub fn stats(&self) -> Result<EpisodesStats, StatsError> {
        EpisodesStats::new(self.history.retained().copied().collect(), false)
    }

    pub fn listener(&self) -> &L {
        &self.listener
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
