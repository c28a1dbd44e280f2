mod config;
mod movingai;

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cbs_mapf::{Cbs, ProblemInstance};
use config::{Cli, Config};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = Config::new(&cli);
    config.validate()?;

    let (grid, problem) = load_problem(&config)?;
    info!(agents = problem.len(), width = grid.width(), height = grid.height(), "loaded problem");

    let max_iterations = config.max_iterations;
    let solve_result = tokio::task::spawn_blocking(move || {
        let mut solver = Cbs::new(&grid);
        let solution = solver.solve(&problem, max_iterations);
        (solution, *solver.stats())
    });

    let timeout = Duration::from_secs(config.timeout_secs);
    let (solution, stats) = match tokio::time::timeout(timeout, solve_result).await {
        Ok(joined) => joined.context("solver task panicked")?,
        Err(_) => anyhow::bail!("solve did not finish within {}s", config.timeout_secs),
    };
    let solution = solution?;

    if let Some(stats_path) = &config.stats_path {
        let label = config
            .problem_path
            .as_deref()
            .or(config.map_path.as_deref())
            .unwrap_or("<unnamed>");
        stats.append_csv(stats_path, label)?;
    }

    let json = serde_json::to_string_pretty(&solution)?;
    match &config.output_path {
        Some(path) => std::fs::write(path, json)?,
        None => println!("{json}"),
    }

    info!(cost = solution.cost, makespan = solution.makespan(), "done");
    Ok(())
}

fn load_problem(config: &Config) -> Result<(cbs_mapf::Grid, ProblemInstance)> {
    if let Some(problem_path) = &config.problem_path {
        return movingai::load_problem_json(problem_path);
    }

    let map_path = config.map_path.as_deref().expect("validated: map_path is set");
    match &config.scen_path {
        Some(scen_path) => movingai::load_map_and_scen(map_path, scen_path, config.num_agents),
        None => {
            let grid = movingai::load_map(map_path)?;
            let problem = movingai::generate_random_agents(&grid, config.num_agents, config.seed)?;
            Ok((grid, problem))
        }
    }
}
