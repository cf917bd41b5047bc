//! Completed episodes and the aggregate statistics built over them.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::statistic::{fmt_rounded, Statistic, StatisticSummary, DEFAULT_PRECISION};
use crate::error::StatsError;
use crate::rollout::sink::MetricsSink;

// ---------------------------------------------------------------------------
// Episode
// ---------------------------------------------------------------------------

/// Outcome of one trajectory: cumulative reward and number of steps.
///
/// An episode starts empty at reset and grows by one step per
/// [`record_step`](Episode::record_step) until its environment reports done.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    pub score: f64,
    pub length: u64,
}

impl Episode {
    pub fn new(score: f64, length: u64) -> Self {
        Self { score, length }
    }

    pub fn record_step(&mut self, reward: f64) {
        self.score += reward;
        self.length += 1;
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }
}

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

/// Structured export of an [`EpisodesStats`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodesSummary {
    pub n_episodes: usize,
    pub score: StatisticSummary,
    pub length: StatisticSummary,
}

// ---------------------------------------------------------------------------
// EpisodesStats
// ---------------------------------------------------------------------------

/// Score and length statistics over an ordered, non-empty set of episodes.
///
/// Comparison delegates to the score statistic's risk-adjusted rule. When
/// `simple` is set only the mean score is written to a metrics sink.
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodesStats {
    episodes: Vec<Episode>,
    simple: bool,
    score: Statistic,
    length: Statistic,
}

impl EpisodesStats {
    pub fn new(episodes: Vec<Episode>, simple: bool) -> Result<Self, StatsError> {
        let score = Statistic::with_precision(
            episodes.iter().map(|e| e.score).collect(),
            DEFAULT_PRECISION,
        )?;
        let length = Statistic::with_precision(
            episodes.iter().map(|e| e.length as f64).collect(),
            0,
        )?;
        Ok(Self {
            episodes,
            simple,
            score,
            length,
        })
    }

    /// Build from a borrowed slice (copies the episodes).
    pub fn from_slice(episodes: &[Episode], simple: bool) -> Result<Self, StatsError> {
        Self::new(episodes.to_vec(), simple)
    }

    pub fn episodes(&self) -> &[Episode] {
        &self.episodes
    }

    pub fn n_episodes(&self) -> usize {
        self.episodes.len()
    }

    pub fn is_simple(&self) -> bool {
        self.simple
    }

    pub fn score(&self) -> &Statistic {
        &self.score
    }

    pub fn length(&self) -> &Statistic {
        &self.length
    }

    /// Score `mean - std`: the training-progress signal used for selection.
    pub fn risk_adjusted(&self) -> f64 {
        self.score.risk_adjusted()
    }

    pub fn is_better_than(&self, other: &Self) -> bool {
        self.score.is_better_than(&other.score)
    }

    pub fn is_at_least(&self, other: &Self) -> bool {
        self.score.is_at_least(&other.score)
    }

    pub fn compare(&self, other: &Self) -> Ordering {
        self.score.compare(&other.score)
    }

    /// The candidate ranked highest by [`compare`](Self::compare). The
    /// earliest one wins a tie, and a NaN score only wins when every
    /// candidate is NaN.
    pub fn best<'a, I>(candidates: I) -> Option<&'a EpisodesStats>
    where
        I: IntoIterator<Item = &'a EpisodesStats>,
    {
        candidates.into_iter().fold(None, |best, candidate| match best {
            Some(current) if candidate.compare(current) != Ordering::Greater => Some(current),
            _ => Some(candidate),
        })
    }

    pub fn summary(&self) -> EpisodesSummary {
        EpisodesSummary {
            n_episodes: self.episodes.len(),
            score: self.score.summary(),
            length: self.length.summary(),
        }
    }

    /// Scalars forwarded to a metrics sink.
    ///
    /// `mean` is always present; `min`, `max` and `result` (`mean - std`) are
    /// added unless the stats are simple.
    pub fn scalars(&self) -> BTreeMap<String, f64> {
        let mut scalars = BTreeMap::new();
        scalars.insert("mean".to_string(), self.score.mean());
        if !self.simple {
            scalars.insert("min".to_string(), self.score.min());
            scalars.insert("max".to_string(), self.score.max());
            scalars.insert("result".to_string(), self.score.risk_adjusted());
        }
        scalars
    }

    /// Forward [`scalars`](Self::scalars) to `sink` under `tag` at `step`.
    ///
    /// Sink failures are logged and swallowed: reporting must never interrupt
    /// a rollout.
    pub fn write_to<M: MetricsSink + ?Sized>(&self, sink: &mut M, tag: &str, step: u64) {
        if let Err(e) = sink.add_scalars(tag, &self.scalars(), step) {
            warn!(error = %e, tag, step, "failed to record episode stats");
        }
    }
}

impl fmt::Display for EpisodesStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Score: {} ({}) | Length: {}",
            self.score,
            fmt_rounded(self.risk_adjusted(), DEFAULT_PRECISION),
            self.length,
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
