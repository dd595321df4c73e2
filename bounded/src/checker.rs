// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! The answers and errors shared by the evaluator and the runner.

use crate::witness::WitnessStep;
use cfgs::config::ConfigError;
use serde::Serialize;
use thiserror::Error;

/// How a property violation was classified.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Verdict {
    /// A violation exists however the unknown predicates are resolved
    Definite,
    /// A violation exists only under some resolution of unknown predicates
    Possible,
    /// No violation exists up to the bound
    NoneFound,
}

/// The result of a successful evaluation.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Feedback {
    /// The classification of the result
    pub verdict: Verdict,
    /// The timestep of the violation, or the bound when none was found
    pub k: usize,
    /// The path to the violation, one entry per timestep `0..=k`; empty when
    /// none was found
    pub witness: Vec<WitnessStep>,
}

impl Feedback {
    /// No violation up to `bound`.
    pub fn none_found(bound: usize) -> Self {
        Feedback {
            verdict: Verdict::NoneFound,
            k: bound,
            witness: vec![],
        }
    }
}

/// The result of an unsuccessful attempt to evaluate a property.
#[derive(Debug, PartialEq, Eq, Error)]
pub enum CheckerError {
    /// The SAT solver failed
    #[error("solver failed, likely a timeout")]
    SolverFailed,
    /// The concrete model of a refinement still depends on unknown predicates
    #[error(
        "the concrete model has unknown predicates at timestep {0}; it must define every predicate"
    )]
    UncertainConcreteModel(usize),
    /// The configuration does not fit one of the models
    #[error(transparent)]
    Config(#[from] ConfigError),
}
