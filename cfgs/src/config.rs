// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! The property being checked and the parameters of the search.

use crate::model::Cfgs;
use serde::Serialize;
use std::{fmt, str::FromStr};
use thiserror::Error;

#[allow(missing_docs)]
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("the list of processes under test is empty")]
    EmptyProcessList,
    #[error("process {0} does not exist (the model has {1} processes)")]
    UnknownProcess(usize, usize),
    #[error("could not parse process list `{0}`")]
    BadProcessList(String),
    #[error("unknown combinator `{0}` (expected & or |)")]
    BadCombinator(String),
}

/// What kind of property is being checked.
#[derive(PartialEq, Eq, Clone, Copy, Debug, Serialize)]
pub enum PropertyKind {
    /// Can the target location be reached?
    Reachability,
    /// Is there a lasso that never makes progress at the target location?
    Liveness,
}

/// How the target-location conditions of several processes are combined.
#[derive(PartialEq, Eq, Clone, Copy, Debug, Default, Serialize)]
pub enum Combinator {
    /// Every process under test is at the target (`&`)
    #[default]
    All,
    /// Some process under test is at the target (`|`)
    Any,
}

impl Combinator {
    /// The operator symbol of this combinator.
    pub fn symbol(&self) -> &'static str {
        match self {
            Combinator::All => "&",
            Combinator::Any => "|",
        }
    }
}

impl fmt::Display for Combinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

impl FromStr for Combinator {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "&" | "and" | "all" => Ok(Combinator::All),
            "|" | "or" | "any" => Ok(Combinator::Any),
            _ => Err(ConfigError::BadCombinator(s.to_string())),
        }
    }
}

/// The processes a property talks about, as written on the command line:
/// `a` or `all`, or a comma-separated list of ids that may be wrapped in
/// parentheses, e.g. `(0, 2)`.
#[derive(PartialEq, Eq, Clone, Debug)]
pub enum ProcessSelection {
    /// Every process of the model
    All,
    /// Exactly these processes
    Listed(Vec<usize>),
}

impl FromStr for ProcessSelection {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed == "a" || trimmed == "all" {
            return Ok(ProcessSelection::All);
        }
        let inner = trimmed
            .strip_prefix('(')
            .and_then(|t| t.strip_suffix(')'))
            .unwrap_or(trimmed);
        let ids = inner
            .split(',')
            .map(|id| id.trim().parse::<usize>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| ConfigError::BadProcessList(s.to_string()))?;
        Ok(ProcessSelection::Listed(ids))
    }
}

impl ProcessSelection {
    /// The process ids selected in the given model.
    pub fn resolve(&self, cfgs: &Cfgs) -> Vec<usize> {
        match self {
            ProcessSelection::All => (0..cfgs.processes.len()).collect(),
            ProcessSelection::Listed(ids) => ids.clone(),
        }
    }
}

/// A fully resolved checking task.
#[derive(PartialEq, Eq, Clone, Debug, Serialize)]
pub struct Configuration {
    /// Reachability or liveness
    pub property: PropertyKind,
    /// The location of interest
    pub location: usize,
    /// The processes under test
    pub processes: Vec<usize>,
    /// How the processes' location conditions are combined
    pub combinator: Combinator,
    /// The largest timestep to search
    pub bound: usize,
    /// Whether liveness lassos must be fair to every process
    pub fairness: bool,
    /// Whether an abstract model is refined against a concrete one
    pub multi_model: bool,
}

impl Configuration {
    /// A configuration with the `&` combinator and fairness and multi-model
    /// checking turned off.
    pub fn new(
        property: PropertyKind,
        location: usize,
        processes: Vec<usize>,
        bound: usize,
    ) -> Self {
        Configuration {
            property,
            location,
            processes,
            combinator: Combinator::All,
            bound,
            fairness: false,
            multi_model: false,
        }
    }

    /// Is this a liveness task?
    pub fn is_liveness(&self) -> bool {
        self.property == PropertyKind::Liveness
    }

    /// Check that this configuration makes sense for the given model.
    pub fn validate(&self, cfgs: &Cfgs) -> Result<(), ConfigError> {
        if self.processes.is_empty() {
            return Err(ConfigError::EmptyProcessList);
        }
        if let Some(&p) = self.processes.iter().find(|&&p| p >= cfgs.processes.len()) {
            return Err(ConfigError::UnknownProcess(p, cfgs.processes.len()));
        }
        for &p in &self.processes {
            let n = cfgs.processes[p].number_of_locations();
            if self.location >= n {
                log::warn!(
                    "process {p} has {n} locations, so location {} is never reached",
                    self.location
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Process;

    fn model(processes: usize) -> Cfgs {
        Cfgs {
            processes: (0..processes)
                .map(|id| Process {
                    id,
                    transitions: vec![],
                })
                .collect(),
            ..Cfgs::default()
        }
    }

    #[test]
    fn test_process_selection() {
        assert_eq!("a".parse(), Ok(ProcessSelection::All));
        assert_eq!("all".parse(), Ok(ProcessSelection::All));
        assert_eq!("(0, 2)".parse(), Ok(ProcessSelection::Listed(vec![0, 2])));
        assert_eq!("0,1".parse(), Ok(ProcessSelection::Listed(vec![0, 1])));
        assert_eq!("3".parse(), Ok(ProcessSelection::Listed(vec![3])));
        assert!("(0, x)".parse::<ProcessSelection>().is_err());
        assert!("".parse::<ProcessSelection>().is_err());

        assert_eq!(ProcessSelection::All.resolve(&model(3)), vec![0, 1, 2]);
    }

    #[test]
    fn test_combinator() {
        assert_eq!("&".parse(), Ok(Combinator::All));
        assert_eq!("any".parse(), Ok(Combinator::Any));
        assert_eq!(Combinator::Any.to_string(), "|");
        assert!("^".parse::<Combinator>().is_err());
    }

    #[test]
    fn test_validate() {
        let config = Configuration::new(PropertyKind::Reachability, 0, vec![0, 1], 5);
        assert_eq!(config.validate(&model(2)), Ok(()));
        assert_eq!(
            config.validate(&model(1)),
            Err(ConfigError::UnknownProcess(1, 1))
        );
        let empty = Configuration::new(PropertyKind::Liveness, 0, vec![], 5);
        assert!(empty.is_liveness());
        assert_eq!(
            empty.validate(&model(1)),
            Err(ConfigError::EmptyProcessList)
        );
    }
}
