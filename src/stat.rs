//! Run counters (§4.4, §6): node-expansion counts and timing, gathered
//! during a solve and optionally appended to a CSV log by the CLI.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::error;

/// Counters accumulated over one [`crate::Cbs::solve`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub high_level_expanded_nodes: u64,
    pub low_level_expanded_nodes: u64,
    pub time_micros: u64,
    pub cost: usize,
}

impl Stats {
    /// Appends one CSV row to `path`, creating the file if it does not
    /// exist yet. `label` is typically the problem file name, so multiple
    /// runs logged to the same file stay attributable.
    pub fn append_csv(&self, path: impl AsRef<Path>, label: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(path.as_ref())?;
        let row = format!(
            "{},{},{},{},{}\n",
            label, self.cost, self.time_micros, self.high_level_expanded_nodes, self.low_level_expanded_nodes
        );
        if let Err(err) = file.write_all(row.as_bytes()) {
            error!(path = %path.as_ref().display(), %err, "failed to append stats row");
            return Err(err);
        }
        Ok(())
    }
}
