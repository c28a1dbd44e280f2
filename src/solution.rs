//! The result of a successful solve (§4.4, §6): one path per agent plus
//! the sum-of-costs objective value.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::path::{position_at, Path};

/// A conflict-free joint plan: every agent's path, indexed by name, and
/// the sum of their individual costs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Solution {
    pub paths: HashMap<String, Path>,
    pub cost: usize,
}

impl Solution {
    pub(crate) fn new(paths: HashMap<String, Path>, cost: usize) -> Self {
        Solution { paths, cost }
    }

    /// The time step at which the last agent reaches its goal, 0 if the
    /// solution has no agents or every agent starts at its goal.
    pub fn makespan(&self) -> usize {
        self.paths.values().map(|p| p.len().saturating_sub(1)).max().unwrap_or(0)
    }

    /// Every agent's position at `time`, padded past its own path length
    /// by holding at its goal (the same rule [`crate::path::position_at`]
    /// applies during conflict detection).
    pub fn positions_at(&self, time: usize) -> HashMap<&str, (usize, usize)> {
        self.paths
            .iter()
            .map(|(name, path)| (name.as_str(), position_at(path, time)))
            .collect()
    }

    /// A pure-data projection suitable for external serialization (§6):
    /// agent name to its path as a list of `[x, y]` pairs, mirroring the
    /// Python original's `Solution.as_dict`.
    pub fn as_projection(&self) -> HashMap<String, Vec<[usize; 2]>> {
        self.paths
            .iter()
            .map(|(name, path)| (name.clone(), path.iter().map(|&(x, y)| [x, y]).collect()))
            .collect()
    }
}
