//! Problem loaders for the example binary only (§6): a compact JSON
//! problem file, and the MovingAI `.map`/`.scen` benchmark pair this
//! codebase's `map.rs`/`scenario.rs` already knew how to read, re-targeted
//! to build a `cbs_mapf::Grid`/`ProblemInstance` instead of their own
//! ad hoc structures.

use std::collections::HashSet;
use std::fs;
use std::io::{BufRead, BufReader};

use anyhow::{anyhow, Context, Result};
use rand::prelude::*;
use rand::rngs::StdRng;
use serde::Deserialize;

use cbs_mapf::{Agent, Grid, ProblemInstance};

/// `{grid: {width, height, obstacles}, agents: [{name, start, goal}]}`.
#[derive(Debug, Deserialize)]
struct ProblemFile {
    grid: GridSection,
    agents: Vec<AgentSection>,
}

#[derive(Debug, Deserialize)]
struct GridSection {
    width: usize,
    height: usize,
    obstacles: Vec<[usize; 2]>,
}

#[derive(Debug, Deserialize)]
struct AgentSection {
    name: String,
    start: [usize; 2],
    goal: [usize; 2],
}

pub fn load_problem_json(path: &str) -> Result<(Grid, ProblemInstance)> {
    let text = fs::read_to_string(path).with_context(|| format!("reading problem file {path}"))?;
    let parsed: ProblemFile =
        serde_json::from_str(&text).with_context(|| format!("parsing problem file {path}"))?;
    let obstacles = parsed.grid.obstacles.into_iter().map(|[x, y]| (x, y)).collect();
    let grid = Grid::new(parsed.grid.width, parsed.grid.height, obstacles);
    let agents = parsed
        .agents
        .into_iter()
        .map(|a| Agent::new(a.name, (a.start[0], a.start[1]), (a.goal[0], a.goal[1])))
        .collect();
    Ok((grid, ProblemInstance::new(agents)))
}

/// Parses a MovingAI `.map` file: an `octile` header followed by `height`
/// rows of `width` characters, `.` passable and anything else an obstacle.
pub fn load_map(path: &str) -> Result<Grid> {
    let file = fs::File::open(path).with_context(|| format!("opening map file {path}"))?;
    let mut lines = BufReader::new(file).lines();

    let _kind = lines.next().ok_or_else(|| anyhow!("{path}: empty map file"))??;
    let height = parse_dimension(&mut lines, path, "height")?;
    let width = parse_dimension(&mut lines, path, "width")?;
    let _map_marker = lines.next().ok_or_else(|| anyhow!("{path}: missing `map` line"))??;

    let mut obstacles = HashSet::new();
    for (y, line) in lines.take(height).enumerate() {
        let line = line?;
        for (x, ch) in line.chars().take(width).enumerate() {
            if ch != '.' {
                obstacles.insert((x, y));
            }
        }
    }
    Ok(Grid::new(width, height, obstacles))
}

fn parse_dimension(
    lines: &mut std::io::Lines<BufReader<fs::File>>,
    path: &str,
    label: &str,
) -> Result<usize> {
    let line = lines
        .next()
        .ok_or_else(|| anyhow!("{path}: missing {label} line"))??;
    line.split_whitespace()
        .last()
        .ok_or_else(|| anyhow!("{path}: malformed {label} line {line:?}"))?
        .parse()
        .with_context(|| format!("{path}: {label} is not a number"))
}

/// One start/goal pair from a `.scen` line. Column layout follows this
/// codebase's existing scenario reader: bucket, map, width, height,
/// start_y, start_x, goal_y, goal_x, optimal length.
struct Route {
    start: (usize, usize),
    goal: (usize, usize),
}

fn load_scen_routes(path: &str) -> Result<Vec<Route>> {
    let file = fs::File::open(path).with_context(|| format!("opening scen file {path}"))?;
    let mut lines = BufReader::new(file).lines();
    lines.next().ok_or_else(|| anyhow!("{path}: empty scen file"))??; // version line

    let mut routes = Vec::new();
    for line in lines {
        let line = line?;
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 8 {
            continue;
        }
        let start_y: usize = parts[4].parse()?;
        let start_x: usize = parts[5].parse()?;
        let goal_y: usize = parts[6].parse()?;
        let goal_x: usize = parts[7].parse()?;
        routes.push(Route {
            start: (start_x, start_y),
            goal: (goal_x, goal_y),
        });
    }
    Ok(routes)
}

/// Builds a problem from a `.map`/`.scen` pair: the first `num_agents`
/// routes in file order.
pub fn load_map_and_scen(map_path: &str, scen_path: &str, num_agents: usize) -> Result<(Grid, ProblemInstance)> {
    let grid = load_map(map_path)?;
    let routes = load_scen_routes(scen_path)?;
    if routes.len() < num_agents {
        return Err(anyhow!(
            "{scen_path}: only {} routes available, {num_agents} requested",
            routes.len()
        ));
    }
    let agents = routes
        .into_iter()
        .take(num_agents)
        .enumerate()
        .map(|(i, route)| Agent::new(format!("agent-{i}"), route.start, route.goal))
        .collect();
    Ok((grid, ProblemInstance::new(agents)))
}

/// Generates `num_agents` agents with distinct, passable, in-bounds
/// start/goal cells, deterministic given `seed` (§6 demo convenience).
pub fn generate_random_agents(grid: &Grid, num_agents: usize, seed: u64) -> Result<ProblemInstance> {
    let mut rng = StdRng::seed_from_u64(seed);
    let passable_cells: Vec<(usize, usize)> = (0..grid.width())
        .flat_map(|x| (0..grid.height()).map(move |y| (x, y)))
        .filter(|&p| grid.passable(p))
        .collect();

    if passable_cells.len() < num_agents * 2 {
        return Err(anyhow!(
            "grid has only {} passable cells, need {} for {num_agents} agents' start+goal pairs",
            passable_cells.len(),
            num_agents * 2
        ));
    }

    let mut shuffled = passable_cells;
    shuffled.shuffle(&mut rng);
    let agents = (0..num_agents)
        .map(|i| Agent::new(format!("agent-{i}"), shuffled[2 * i], shuffled[2 * i + 1]))
        .collect();
    Ok(ProblemInstance::new(agents))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn load_map_parses_octile_header_and_obstacles() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "type octile").unwrap();
        writeln!(file, "height 2").unwrap();
        writeln!(file, "width 3").unwrap();
        writeln!(file, "map").unwrap();
        writeln!(file, "..@").unwrap();
        writeln!(file, "...").unwrap();
        let grid = load_map(file.path().to_str().unwrap()).unwrap();
        assert_eq!((grid.width(), grid.height()), (3, 2));
        assert!(!grid.passable((2, 0)));
        assert!(grid.passable((0, 0)));
    }

    #[test]
    fn load_problem_json_round_trips_grid_and_agents() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{"grid": {{"width": 2, "height": 2, "obstacles": []}}, "agents": [{{"name": "a1", "start": [0,0], "goal": [1,1]}}]}}"#
        )
        .unwrap();
        let (grid, problem) = load_problem_json(file.path().to_str().unwrap()).unwrap();
        assert_eq!((grid.width(), grid.height()), (2, 2));
        assert_eq!(problem.agent_by_name("a1").unwrap().goal, (1, 1));
    }

    #[test]
    fn generate_random_agents_is_deterministic_for_a_fixed_seed() {
        let grid = Grid::new(10, 10, HashSet::new());
        let a = generate_random_agents(&grid, 4, 7).unwrap();
        let b = generate_random_agents(&grid, 4, 7).unwrap();
        assert_eq!(a.agents(), b.agents());
    }

    #[test]
    fn generate_random_agents_rejects_an_undersized_grid() {
        let grid = Grid::new(1, 1, HashSet::new());
        assert!(generate_random_agents(&grid, 2, 0).is_err());
    }
}
