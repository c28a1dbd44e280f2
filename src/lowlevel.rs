//! Constrained, time-expanded A* (§4.2): the single-agent planner CBS
//! calls at the root and at every branch.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

use tracing::{debug, instrument, trace};

use crate::agent::Agent;
use crate::constraint::Constraint;
use crate::error::MapfError;
use crate::grid::Grid;
use crate::path::{Path, Position};
use crate::stat::Stats;

/// Extra ticks of slack past `T* + heuristic(start, goal)` before the
/// search gives up and reports [`MapfError::NoPath`] (§4.2).
const SAFETY_MARGIN: usize = 16;

/// The four constraint tables the low-level planner partitions its
/// input into, keyed by time step.
struct ConstraintTables {
    negative_vertex: HashMap<usize, HashSet<Position>>,
    negative_edge: HashMap<usize, HashSet<(Position, Position)>>,
    positive_vertex: HashMap<usize, HashSet<Position>>,
    positive_edge: HashMap<usize, HashSet<(Position, Position)>>,
    /// `T*`: the maximum time appearing in any table, 0 if all empty.
    limit_time: usize,
}

impl ConstraintTables {
    fn build(agent: &str, constraints: &[Constraint]) -> Self {
        let mut negative_vertex: HashMap<usize, HashSet<Position>> = HashMap::new();
        let mut negative_edge: HashMap<usize, HashSet<(Position, Position)>> = HashMap::new();
        let mut positive_vertex: HashMap<usize, HashSet<Position>> = HashMap::new();
        let mut positive_edge: HashMap<usize, HashSet<(Position, Position)>> = HashMap::new();
        let mut limit_time = 0;

        for c in constraints.iter().filter(|c| c.agent == agent) {
            limit_time = limit_time.max(c.time);
            match (c.is_positive, c.next_position) {
                (false, None) => {
                    negative_vertex.entry(c.time).or_default().insert(c.position);
                }
                (false, Some(next)) => {
                    negative_edge
                        .entry(c.time)
                        .or_default()
                        .insert((c.position, next));
                }
                (true, None) => {
                    positive_vertex.entry(c.time).or_default().insert(c.position);
                }
                (true, Some(next)) => {
                    positive_edge
                        .entry(c.time)
                        .or_default()
                        .insert((c.position, next));
                }
            }
        }

        ConstraintTables {
            negative_vertex,
            negative_edge,
            positive_vertex,
            positive_edge,
            limit_time,
        }
    }

    fn rejects_move(&self, from: Position, to: Position, arrival_time: usize) -> bool {
        if let Some(required) = self.positive_vertex.get(&arrival_time) {
            if !required.contains(&to) {
                return true;
            }
        }
        if let Some(required) = self.positive_edge.get(&arrival_time) {
            if !required.contains(&(from, to)) {
                return true;
            }
        }
        if self
            .negative_vertex
            .get(&arrival_time)
            .is_some_and(|blocked| blocked.contains(&to))
        {
            return true;
        }
        if self
            .negative_edge
            .get(&arrival_time)
            .is_some_and(|blocked| blocked.contains(&(from, to)))
        {
            return true;
        }
        false
    }

    fn satisfies_positive_vertex_at_goal(&self, time: usize, goal: Position) -> bool {
        self.positive_vertex
            .get(&time)
            .is_none_or(|required| required.contains(&goal))
    }
}

/// One state on the low-level open list: a (position, time) pair plus
/// its path cost so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OpenState {
    position: Position,
    time: usize,
    g_cost: usize,
    f_cost: usize,
}

impl Ord for OpenState {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; invert every field so the smallest
        // f (then largest time, then smallest position) pops first.
        // Preferring larger time on an f tie favors the state that has
        // survived further into the constraint horizon.
        other
            .f_cost
            .cmp(&self.f_cost)
            .then_with(|| self.time.cmp(&other.time))
            .then_with(|| other.position.cmp(&self.position))
    }
}

impl PartialOrd for OpenState {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Plans a minimum-length path for `agent` respecting `constraints`, or
/// fails with [`MapfError::NoPath`] if none exists within the search
/// horizon (§4.2).
#[instrument(
    skip(grid, constraints, stats),
    fields(agent = %agent.name, start = format!("{:?}", agent.start), goal = format!("{:?}", agent.goal)),
    level = "debug"
)]
pub fn plan(
    grid: &Grid,
    agent: &Agent,
    constraints: &[Constraint],
    stats: &mut Stats,
) -> Result<Path, MapfError> {
    let tables = ConstraintTables::build(&agent.name, constraints);
    let upper_bound = tables.limit_time + grid.heuristic(agent.start, agent.goal) + SAFETY_MARGIN;

    let mut open = BinaryHeap::new();
    let mut best_g: HashMap<(Position, usize), usize> = HashMap::new();
    let mut came_from: HashMap<(Position, usize), (Position, usize)> = HashMap::new();
    let mut closed: HashSet<(Position, usize)> = HashSet::new();

    let start_state = OpenState {
        position: agent.start,
        time: 0,
        g_cost: 0,
        f_cost: grid.heuristic(agent.start, agent.goal),
    };
    best_g.insert((agent.start, 0), 0);
    open.push(start_state);

    while let Some(current) = open.pop() {
        if !closed.insert((current.position, current.time)) {
            continue; // stale duplicate entry, already expanded with this or a better g.
        }

        stats.low_level_expanded_nodes += 1;
        trace!(?current, "expand low-level node");

        if current.position == agent.goal
            && current.time >= tables.limit_time
            && tables.satisfies_positive_vertex_at_goal(current.time, agent.goal)
        {
            return Ok(reconstruct(&came_from, (current.position, current.time)));
        }

        if current.time > upper_bound {
            continue;
        }

        let next_time = current.time + 1;
        let mut moves = grid.neighbors(current.position);
        moves.push(current.position); // the wait action

        for next_position in moves {
            if tables.rejects_move(current.position, next_position, next_time) {
                continue;
            }

            let tentative_g = current.g_cost + 1;
            let key = (next_position, next_time);
            let improves = best_g.get(&key).is_none_or(|&g| tentative_g < g);
            if !improves {
                continue;
            }

            best_g.insert(key, tentative_g);
            came_from.insert(key, (current.position, current.time));
            open.push(OpenState {
                position: next_position,
                time: next_time,
                g_cost: tentative_g,
                f_cost: tentative_g + grid.heuristic(next_position, agent.goal),
            });
        }
    }

    debug!(agent = %agent.name, "low-level search exhausted without a path");
    Err(MapfError::NoPath {
        agent: agent.name.clone(),
    })
}

fn reconstruct(
    came_from: &HashMap<(Position, usize), (Position, usize)>,
    goal_key: (Position, usize),
) -> Path {
    let mut path = vec![goal_key.0];
    let mut current = goal_key;
    while let Some(&prev) = came_from.get(&current) {
        path.push(prev.0);
        current = prev;
    }
    path.reverse();
    path
}
