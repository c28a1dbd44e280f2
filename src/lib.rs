//! Conflict-Based Search (CBS) for multi-agent path finding on a 2D,
//! 4-connected grid.
//!
//! The crate is split the way the algorithm is split: a static [`grid`],
//! a constrained single-agent planner in [`lowlevel`], a [`conflict`]
//! engine that turns a set of paths into branching constraints, and the
//! [`cbs`] high-level search that ties them together. [`policy`] is the
//! optional hook for overriding node/conflict selection.

pub mod agent;
pub mod cbs;
pub mod conflict;
pub mod constraint;
pub mod error;
pub mod grid;
mod highlevel;
pub mod lowlevel;
pub mod path;
pub mod policy;
pub mod solution;
pub mod stat;

pub use agent::{Agent, ProblemInstance};
pub use cbs::Cbs;
pub use constraint::{Conflict, ConflictKind, Constraint};
pub use error::{MapfError, UnsolvableReason};
pub use grid::Grid;
pub use path::Path;
pub use policy::{NodeView, NoOpPolicy, PolicyHook};
pub use solution::Solution;
