//! The optional policy hook (§4.5, §9): a capability abstraction over
//! node and conflict selection, reached through a trait object so the
//! high-level search can be parameterized without an inheritance
//! hierarchy.

use crate::constraint::Conflict;

/// A read-only view of one open-list node, handed to [`PolicyHook::select_node`]
/// instead of the crate-private `HighLevelNode` itself: enough for a hook to
/// make a selection decision without being able to touch a node's paths or
/// constraints (§4.5, §5 "the hook must not mutate the queue").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeView {
    pub id: u64,
    pub cost: usize,
    pub conflict_count: usize,
}

/// Overrides for the two choices the high-level search makes each
/// iteration. Both methods default to `None`, meaning "use the built-in
/// policy" (§4.5).
pub trait PolicyHook {
    /// Picks which open node to expand next, identified by its id. `open`
    /// lists every node currently in the queue. Returning `None` falls
    /// back to the default min-heap pop. A returned id that is not
    /// actually present in `open` is treated the same as `None` — a
    /// misbehaving hook must not be able to crash the solver.
    fn select_node(&self, open: &[NodeView]) -> Option<u64> {
        let _ = open;
        None
    }

    /// Picks which conflict to branch on next. Returning `None` falls
    /// back to the default: smallest time, vertex before edge, then
    /// emission order.
    fn select_conflict(&self, conflicts: &[Conflict]) -> Option<Conflict> {
        let _ = conflicts;
        None
    }
}

/// The default, no-op policy: every choice defers to the built-in
/// best-first / earliest-conflict rules.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpPolicy;

impl PolicyHook for NoOpPolicy {}
