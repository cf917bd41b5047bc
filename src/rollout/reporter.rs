//! Windowed reporting of finalized episodes.
//!
//! [`WindowReporter`] is the [`EpisodeListener`] that turns a plain
//! [`EpisodeAccumulator`] into [`RolloutStats`]: every time the finalized
//! episode count reaches a multiple of the window size it builds an
//! [`EpisodesStats`] over the most recent window, prints it and forwards it to
//! the metrics sink keyed by the total number of environment steps.

use std::num::NonZeroUsize;

use tracing::{info, warn};

use super::accumulator::{EpisodeAccumulator, EpisodeHistory, EpisodeListener};
use super::sink::{ConsoleSink, MetricsSink};
use crate::config::RolloutConfig;
use crate::error::StatsError;
use crate::stats::{Episode, EpisodesStats};

/// Tag every window is recorded under.
pub const TRAIN_TAG: &str = "train";

/// An accumulator that reports a window of episodes at a fixed cadence.
pub type RolloutStats<M, C> = EpisodeAccumulator<WindowReporter<M, C>>;

// ---------------------------------------------------------------------------
// WindowReporter
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct WindowReporter<M, C> {
    window: Option<NonZeroUsize>,
    simple: bool,
    epochs: Vec<EpisodesStats>,
    metrics: M,
    console: C,
}

impl<M: MetricsSink, C: ConsoleSink> WindowReporter<M, C> {
    /// `window_size` > 0 reports every that many episodes, a negative size
    /// disables reporting and zero is rejected.
    pub fn new(window_size: i64, metrics: M, console: C) -> Result<Self, StatsError> {
        let window = match window_size {
            0 => return Err(StatsError::ZeroWindow),
            w if w < 0 => None,
            w => Some(
                usize::try_from(w)
                    .ok()
                    .and_then(NonZeroUsize::new)
                    .ok_or_else(|| StatsError::InvalidConfig {
                        field: "window_size".into(),
                        message: format!("{w} does not fit in usize"),
                    })?,
            ),
        };
        Ok(Self {
            window,
            simple: false,
            epochs: Vec::new(),
            metrics,
            console,
        })
    }

    /// Only record the mean score for each window.
    pub fn simple(mut self, simple: bool) -> Self {
        self.simple = simple;
        self
    }

    /// `None` when reporting is disabled.
    pub fn window_size(&self) -> Option<usize> {
        self.window.map(NonZeroUsize::get)
    }

    /// Every window reported so far, oldest first.
    pub fn epochs(&self) -> &[EpisodesStats] {
        &self.epochs
    }

    /// The reported window with the best risk-adjusted score.
    pub fn best_epoch(&self) -> Option<&EpisodesStats> {
        EpisodesStats::best(&self.epochs)
    }

    pub fn metrics(&self) -> &M {
        &self.metrics
    }

    pub fn console(&self) -> &C {
        &self.console
    }

    fn report(&mut self, window: usize, history: &EpisodeHistory) {
        let count = history.len();
        let sample: Vec<Episode> = history.recent(window).copied().collect();
        let epoch = match EpisodesStats::new(sample, self.simple) {
            Ok(epoch) => epoch,
            Err(e) => {
                warn!(error = %e, episodes = count, "skipping report window");
                return;
            }
        };

        let total_steps = history.total_steps();
        self.console.line(&format!(
            "Episode: {count} | {epoch} | Total Steps: {total_steps}"
        ));
        epoch.write_to(&mut self.metrics, TRAIN_TAG, total_steps);

        info!(
            episodes = count,
            mean = epoch.score().mean(),
            result = epoch.risk_adjusted(),
            total_steps,
            "rollout window"
        );
        self.epochs.push(epoch);
    }
}

impl<M: MetricsSink, C: ConsoleSink> EpisodeListener for WindowReporter<M, C> {
    fn on_done(&mut self, _env_index: usize, _episode: &Episode, history: &EpisodeHistory) {
        let Some(window) = self.window_size() else {
            return;
        };
        if history.len() % window == 0 {
            self.report(window, history);
        }
    }

    fn min_history(&self) -> usize {
        self.window_size().unwrap_or(0)
    }
}

// ---------------------------------------------------------------------------
// RolloutStats constructors
// ---------------------------------------------------------------------------

impl<M: MetricsSink, C: ConsoleSink> EpisodeAccumulator<WindowReporter<M, C>> {
    /// Accumulator over `num_envs` slots reporting every `window_size`
    /// finalized episodes.
    pub fn windowed(
        num_envs: usize,
        window_size: i64,
        metrics: M,
        console: C,
    ) -> Result<Self, StatsError> {
        Self::with_listener(num_envs, WindowReporter::new(window_size, metrics, console)?)
    }

    pub fn from_config(config: &RolloutConfig, metrics: M, console: C) -> Result<Self, StatsError> {
        config.validate()?;
        let reporter = WindowReporter::new(config.window_size, metrics, console)?
            .simple(config.simple);
        let acc = Self::with_listener(config.num_envs, reporter)?;
        Ok(match config.history_limit {
            Some(limit) => acc.with_history_limit(limit),
            None => acc,
        })
    }

    pub fn epochs(&self) -> &[EpisodesStats] {
        self.listener().epochs()
    }

    pub fn best_epoch(&self) -> Option<&EpisodesStats> {
        self.listener().best_epoch()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
