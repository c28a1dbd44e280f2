//! The constraint-tree node the high-level search expands (§3 `CBSNode`).
//!
//! Kept crate-private: callers only ever see [`crate::Solution`] and the
//! [`crate::PolicyHook`] trait that is handed read-only views of nodes.

use std::cmp::Ordering;
use std::collections::HashMap;

use tracing::debug;

use crate::agent::{Agent, ProblemInstance};
use crate::conflict::detect_conflicts;
use crate::constraint::{Conflict, Constraint};
use crate::error::MapfError;
use crate::grid::Grid;
use crate::lowlevel;
use crate::path::{path_cost, Path};
use crate::stat::Stats;

/// One node of the constraint tree: an accumulated constraint set, the
/// per-agent paths that satisfy it, and the conflicts those paths still
/// contain.
#[derive(Debug, Clone)]
pub(crate) struct HighLevelNode {
    pub(crate) id: u64,
    pub(crate) constraints: Vec<Constraint>,
    pub(crate) paths: HashMap<String, Path>,
    pub(crate) conflicts: Vec<Conflict>,
    pub(crate) cost: usize,
}

impl HighLevelNode {
    /// Builds the root node: every agent planned independently under an
    /// empty constraint set (§4.4).
    pub(crate) fn root(
        grid: &Grid,
        problem: &ProblemInstance,
        id: u64,
        stats: &mut Stats,
    ) -> Result<Self, MapfError> {
        let mut paths = HashMap::with_capacity(problem.len());
        for agent in problem.agents() {
            let path = lowlevel::plan(grid, agent, &[], stats)?;
            paths.insert(agent.name.clone(), path);
        }
        Ok(Self::from_paths(id, Vec::new(), paths))
    }

    /// Builds a child node: the parent's constraints plus one new one,
    /// with `agent`'s path replanned against the enlarged constraint set.
    /// Returns `None` (to be discarded by the caller) if that plan is
    /// infeasible (§4.4 step 5).
    pub(crate) fn child(
        &self,
        grid: &Grid,
        agent: &Agent,
        new_constraint: Constraint,
        id: u64,
        stats: &mut Stats,
    ) -> Result<Self, MapfError> {
        let mut constraints = self.constraints.clone();
        constraints.push(new_constraint);

        let agent_constraints: Vec<Constraint> = constraints
            .iter()
            .filter(|c| c.agent == agent.name)
            .cloned()
            .collect();
        let new_path = lowlevel::plan(grid, agent, &agent_constraints, stats)?;

        let mut paths = self.paths.clone();
        paths.insert(agent.name.clone(), new_path);

        Ok(Self::from_paths(id, constraints, paths))
    }

    fn from_paths(id: u64, constraints: Vec<Constraint>, paths: HashMap<String, Path>) -> Self {
        let cost = paths.values().map(path_cost).sum();
        let conflicts = detect_conflicts(&paths);
        debug!(node = id, cost, conflicts = conflicts.len(), "built high-level node");
        HighLevelNode {
            id,
            constraints,
            paths,
            conflicts,
            cost,
        }
    }

    pub(crate) fn priority(&self) -> (usize, usize) {
        (self.cost, self.conflicts.len())
    }
}

impl PartialEq for HighLevelNode {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for HighLevelNode {}

impl Ord for HighLevelNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Smaller cost first, then fewer conflicts, then lower id —
        // matching §4.4's "ordered arbitrarily but deterministically".
        self.priority()
            .cmp(&other.priority())
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl PartialOrd for HighLevelNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
