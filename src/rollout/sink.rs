//! Output collaborators for rollout reporting.
//!
//! Two seams are defined here:
//! - [`MetricsSink`] -- receives named scalar groups keyed by a step number
//!   (TensorBoard-style `add_scalars`).
//! - [`ConsoleSink`] -- receives plain text lines.
//!
//! The crate ships small implementations of both: in-memory recorders used by
//! tests, a JSON-lines file writer, and console sinks backed by stdout or
//! `tracing`.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Records named scalars under a tag at a given step.
pub trait MetricsSink {
    fn add_scalars(&mut self, tag: &str, values: &BTreeMap<String, f64>, step: u64) -> Result<()>;
}

/// Accepts one human-readable line at a time.
pub trait ConsoleSink {
    fn line(&mut self, line: &str);
}

// ---------------------------------------------------------------------------
// Metrics sinks
// ---------------------------------------------------------------------------

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMetrics;

impl MetricsSink for NoopMetrics {
    fn add_scalars(&mut self, _tag: &str, _values: &BTreeMap<String, f64>, _step: u64) -> Result<()> {
        Ok(())
    }
}

/// One `add_scalars` call as seen by [`MemoryMetrics`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalarRecord {
    pub tag: String,
    pub values: BTreeMap<String, f64>,
    pub step: u64,
}

/// Keeps every recorded scalar group in call order.
#[derive(Debug, Clone, Default)]
pub struct MemoryMetrics {
    records: Vec<ScalarRecord>,
}

impl MemoryMetrics {
    pub fn records(&self) -> &[ScalarRecord] {
        &self.records
    }
}

impl MetricsSink for MemoryMetrics {
    fn add_scalars(&mut self, tag: &str, values: &BTreeMap<String, f64>, step: u64) -> Result<()> {
        self.records.push(ScalarRecord {
            tag: tag.to_string(),
            values: values.clone(),
            step,
        });
        Ok(())
    }
}

/// A line of a JSON-lines metrics file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsRecord {
    /// Identifies the writer that produced the line.
    pub run_id: String,
    pub tag: String,
    pub step: u64,
    pub wall_time: DateTime<Utc>,
    pub values: BTreeMap<String, f64>,
}

/// Appends one JSON object per `add_scalars` call to a file.
///
/// Each line is flushed immediately so a crashed run still leaves a readable
/// prefix behind. JSON has no NaN or infinity, so non-finite scalars are
/// dropped from the line with a warning.
pub struct JsonlMetricsWriter {
    path: PathBuf,
    run_id: String,
    writer: BufWriter<File>,
}

impl JsonlMetricsWriter {
    /// Create (or truncate) `path`, creating parent directories as needed.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create metrics directory {}", parent.display())
                })?;
            }
        }
        let file = File::create(&path)
            .with_context(|| format!("Failed to create metrics file {}", path.display()))?;
        Ok(Self {
            path,
            run_id: Uuid::new_v4().to_string(),
            writer: BufWriter::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }
}

impl MetricsSink for JsonlMetricsWriter {
    fn add_scalars(&mut self, tag: &str, values: &BTreeMap<String, f64>, step: u64) -> Result<()> {
        let record = MetricsRecord {
            run_id: self.run_id.clone(),
            tag: tag.to_string(),
            step,
            wall_time: Utc::now(),
            values: finite_values(values, tag, step),
        };
        serde_json::to_writer(&mut self.writer, &record)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}

fn finite_values(values: &BTreeMap<String, f64>, tag: &str, step: u64) -> BTreeMap<String, f64> {
    values
        .iter()
        .filter(|(name, value)| {
            let keep = value.is_finite();
            if !keep {
                warn!(tag, step, scalar = %name, value = %value, "dropping non-finite scalar");
            }
            keep
        })
        .map(|(name, value)| (name.clone(), *value))
        .collect()
}

/// Read back every record of a file written by [`JsonlMetricsWriter`].
///
/// Blank lines are skipped.
pub fn read_jsonl_records(path: impl AsRef<Path>) -> Result<Vec<MetricsRecord>> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open metrics file {}", path.display()))?;

    let mut records = Vec::new();
    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str(&line).with_context(|| {
            format!("Failed to parse line {} of {}", idx + 1, path.display())
        })?;
        records.push(record);
    }
    Ok(records)
}

// ---------------------------------------------------------------------------
// Console sinks
// ---------------------------------------------------------------------------

/// Prints lines to stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutConsole;

impl ConsoleSink for StdoutConsole {
    fn line(&mut self, line: &str) {
        println!("{line}");
    }
}

/// Emits lines as `info`-level tracing events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingConsole;

impl ConsoleSink for TracingConsole {
    fn line(&mut self, line: &str) {
        info!(target: "rollout_stats::report", "{line}");
    }
}

/// Collects lines in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryConsole {
    lines: Vec<String>,
}

impl MemoryConsole {
    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

impl ConsoleSink for MemoryConsole {
    fn line(&mut self, line: &str) {
        self.lines.push(line.to_string());
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
