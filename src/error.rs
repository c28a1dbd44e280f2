//! Typed error hierarchy for the solver core.
//!
//! Everything that can go wrong inside a `solve` call is one of the
//! kinds below; nothing else crosses the core boundary.

use thiserror::Error;

/// Why the high-level search failed to produce a conflict-free node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsolvableReason {
    /// Some agent had no feasible path even with an empty constraint set.
    InfeasibleRoot,
    /// The open queue emptied before a conflict-free node was found.
    OpenListExhausted,
    /// `max_iterations` was reached before a conflict-free node was found.
    IterationLimitReached,
}

impl std::fmt::Display for UnsolvableReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let msg = match self {
            UnsolvableReason::InfeasibleRoot => {
                "no agent's root plan is feasible under an empty constraint set"
            }
            UnsolvableReason::OpenListExhausted => {
                "the open list emptied without reaching a conflict-free node"
            }
            UnsolvableReason::IterationLimitReached => {
                "the iteration limit was reached before a conflict-free node was found"
            }
        };
        f.write_str(msg)
    }
}

/// Errors surfaced by the low- and high-level search.
#[derive(Debug, Error)]
pub enum MapfError {
    /// A single-agent plan is infeasible under its active constraint set.
    #[error("no feasible path for agent {agent:?} under the active constraint set")]
    NoPath { agent: String },

    /// The high-level search did not reach a conflict-free node.
    #[error("search did not converge: {reason}")]
    Unsolvable { reason: UnsolvableReason },

    /// Lookup of an agent name that does not exist in the problem instance.
    #[error("unknown agent {0:?}")]
    KeyNotFound(String),
}
