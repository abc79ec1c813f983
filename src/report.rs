//! Run-level counters for observability.

use anyhow::Result;
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

/// Counters for one harvest run, emitted once the run completes.
#[derive(Debug, Default, Serialize)]
pub struct RunReport {
    pub mode: String,
    pub days: usize,
    pub devices: usize,
    /// Device/day pairs whose payload survived normalization.
    pub accepted: usize,
    /// Device/day pairs dropped for shape or size.
    pub rejected: usize,
    /// Device/day pairs whose fetch failed outright.
    pub fetch_failures: usize,
    pub artifacts: Vec<PathBuf>,
}

impl RunReport {
    pub fn new(mode: impl Into<String>) -> Self {
        Self {
            mode: mode.into(),
            ..Default::default()
        }
    }

    /// Logs the report as pretty-printed JSON.
    pub fn log(&self) -> Result<()> {
        info!("{}", serde_json::to_string_pretty(self)?);
        Ok(())
    }
}
