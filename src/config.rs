use anyhow::{anyhow, Result};
use clap::Parser;

/// Command-line surface for the example solver binary (§6).
#[derive(Parser, Debug)]
#[command(
    name = "cbs-mapf",
    about = "Conflict-Based Search solver for multi-agent pathfinding on a 2D grid.",
    version
)]
pub struct Cli {
    /// Path to a compact JSON problem file ({grid: {...}, agents: [...]}).
    /// Mutually exclusive with `--map-path`.
    #[arg(long)]
    pub problem_path: Option<String>,

    /// Path to a MovingAI `.map` file. Requires `--scen-path`.
    #[arg(long)]
    pub map_path: Option<String>,

    /// Path to a MovingAI `.scen` file.
    #[arg(long)]
    pub scen_path: Option<String>,

    /// Number of agents to draw from the scenario file, or to generate
    /// randomly when no `.scen` is supplied.
    #[arg(long, default_value_t = 10)]
    pub num_agents: usize,

    /// Seed for random agent generation (used only without `--scen-path`).
    #[arg(long, default_value_t = 0)]
    pub seed: u64,

    /// Cooperative bound on high-level iterations (§5).
    #[arg(long, default_value_t = 50_000)]
    pub max_iterations: u64,

    /// Wall-clock budget, after which the CLI reports a timeout without
    /// being able to interrupt an in-flight `solve` call (§5).
    #[arg(long, default_value_t = 60)]
    pub timeout_secs: u64,

    /// Where to write the resulting Solution as JSON. Prints to stdout
    /// when omitted.
    #[arg(long)]
    pub output_path: Option<String>,

    /// Where to append a CSV stats row. No row is written when omitted.
    #[arg(long)]
    pub stats_path: Option<String>,
}

/// Validated configuration derived from [`Cli`].
#[derive(Debug, Clone)]
pub struct Config {
    pub problem_path: Option<String>,
    pub map_path: Option<String>,
    pub scen_path: Option<String>,
    pub num_agents: usize,
    pub seed: u64,
    pub max_iterations: u64,
    pub timeout_secs: u64,
    pub output_path: Option<String>,
    pub stats_path: Option<String>,
}

impl Config {
    pub fn new(cli: &Cli) -> Self {
        Config {
            problem_path: cli.problem_path.clone(),
            map_path: cli.map_path.clone(),
            scen_path: cli.scen_path.clone(),
            num_agents: cli.num_agents,
            seed: cli.seed,
            max_iterations: cli.max_iterations,
            timeout_secs: cli.timeout_secs,
            output_path: cli.output_path.clone(),
            stats_path: cli.stats_path.clone(),
        }
    }

    /// Checks the source selection is unambiguous and the bounds are
    /// usable before any I/O happens.
    pub fn validate(&self) -> Result<()> {
        let has_problem = self.problem_path.is_some();
        let has_map = self.map_path.is_some() || self.scen_path.is_some();

        if has_problem && has_map {
            return Err(anyhow!(
                "--problem-path is mutually exclusive with --map-path/--scen-path"
            ));
        }
        if !has_problem && !has_map {
            return Err(anyhow!(
                "one of --problem-path or --map-path must be supplied"
            ));
        }
        if self.scen_path.is_some() && self.map_path.is_none() {
            return Err(anyhow!("--scen-path requires --map-path"));
        }
        if self.max_iterations == 0 {
            return Err(anyhow!("--max-iterations must be greater than 0"));
        }
        if self.timeout_secs == 0 {
            return Err(anyhow!("--timeout-secs must be greater than 0"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Config {
        Config {
            problem_path: None,
            map_path: None,
            scen_path: None,
            num_agents: 1,
            seed: 0,
            max_iterations: 100,
            timeout_secs: 1,
            output_path: None,
            stats_path: None,
        }
    }

    #[test]
    fn rejects_no_source() {
        assert!(base().validate().is_err());
    }

    #[test]
    fn rejects_both_sources() {
        let mut cfg = base();
        cfg.problem_path = Some("p.json".into());
        cfg.map_path = Some("m.map".into());
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_scen_without_map() {
        let mut cfg = base();
        cfg.scen_path = Some("s.scen".into());
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn accepts_map_without_scen() {
        let mut cfg = base();
        cfg.map_path = Some("m.map".into());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn accepts_problem_path_alone() {
        let mut cfg = base();
        cfg.problem_path = Some("p.json".into());
        assert!(cfg.validate().is_ok());
    }
}
