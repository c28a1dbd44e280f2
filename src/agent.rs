//! Agents and the problem instance that bundles them together.

use serde::{Deserialize, Serialize};

use crate::error::MapfError;
use crate::path::Position;

/// A single agent: an immutable start/goal pair, identified by name.
/// Names are unique within a [`ProblemInstance`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    pub name: String,
    pub start: Position,
    pub goal: Position,
}

impl Agent {
    pub fn new(name: impl Into<String>, start: Position, goal: Position) -> Self {
        Agent {
            name: name.into(),
            start,
            goal,
        }
    }
}

/// A set of agents to plan for jointly.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProblemInstance {
    agents: Vec<Agent>,
}

impl ProblemInstance {
    /// Builds a problem instance, rejecting duplicate agent names up
    /// front: a silent name collision would otherwise surface much later
    /// as a confusing path mix-up inside the solver.
    pub fn new(agents: Vec<Agent>) -> Self {
        let mut seen = std::collections::HashSet::with_capacity(agents.len());
        for agent in &agents {
            assert!(
                seen.insert(agent.name.as_str()),
                "duplicate agent name {:?}",
                agent.name
            );
        }
        ProblemInstance { agents }
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Looks up an agent by name.
    pub fn agent_by_name(&self, name: &str) -> Result<&Agent, MapfError> {
        self.agents
            .iter()
            .find(|agent| agent.name == name)
            .ok_or_else(|| MapfError::KeyNotFound(name.to_string()))
    }

    /// Iterates agent names in problem order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.agents.iter().map(|agent| agent.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agent_by_name_finds_existing_agent() {
        let problem = ProblemInstance::new(vec![
            Agent::new("a1", (0, 0), (1, 1)),
            Agent::new("a2", (2, 2), (3, 3)),
        ]);
        assert_eq!(problem.agent_by_name("a2").unwrap().goal, (3, 3));
    }

    #[test]
    fn agent_by_name_reports_key_not_found() {
        let problem = ProblemInstance::new(vec![Agent::new("a1", (0, 0), (1, 1))]);
        let err = problem.agent_by_name("ghost").unwrap_err();
        assert!(matches!(err, MapfError::KeyNotFound(name) if name == "ghost"));
    }

    #[test]
    #[should_panic(expected = "duplicate agent name")]
    fn duplicate_names_are_rejected() {
        ProblemInstance::new(vec![
            Agent::new("a1", (0, 0), (1, 1)),
            Agent::new("a1", (2, 2), (3, 3)),
        ]);
    }

    #[test]
    fn empty_problem_instance_is_empty() {
        let problem = ProblemInstance::new(vec![]);
        assert!(problem.is_empty());
        assert_eq!(problem.len(), 0);
    }
}
