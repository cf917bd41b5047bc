//! Episode accounting and periodic reporting for vectorized rollouts.
//!
//! This module provides:
//! - [`accumulator::EpisodeAccumulator`] -- one in-flight episode per
//!   environment slot, finalized into an append-only history on done.
//! - [`reporter::WindowReporter`] / [`reporter::RolloutStats`] -- reports the
//!   most recent window of episodes to a console and a metrics sink.
//! - [`sink`] -- the console and metrics seams and their implementations.
//! - [`collector`] -- drives a [`crate::env::VecEnv`] into an accumulator.

pub mod accumulator;
pub mod collector;
pub mod reporter;
pub mod sink;

pub use accumulator::{EpisodeAccumulator, EpisodeHistory, EpisodeListener, NoopListener};
pub use collector::collect_steps;
pub use reporter::{RolloutStats, WindowReporter, TRAIN_TAG};
pub use sink::{
    ConsoleSink, JsonlMetricsWriter, MemoryConsole, MemoryMetrics, MetricsRecord, MetricsSink,
    NoopMetrics, ScalarRecord, StdoutConsole, TracingConsole,
};
