//! Descriptive statistics over completed episodes.
//!
//! - [`Statistic`] -- immutable mean/std/min/max over a non-empty sample, ranked
//!   by the risk-adjusted value `mean - std`.
//! - [`Episode`] and [`EpisodesStats`] -- finished episodes and the score and
//!   length statistics built over them.

pub mod episodes;
pub mod statistic;

pub use episodes::{Episode, EpisodesStats, EpisodesSummary};
pub use statistic::{Statistic, StatisticSummary, DEFAULT_PRECISION};
