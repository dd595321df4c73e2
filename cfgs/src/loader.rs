// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! Loading CFGS models from JSON.
//!
//! A model file has the shape
//!
//! ```json
//! {
//!   "predicates": { "(a = -1)": 0, "ready": 1 },
//!   "init": { "ready": false },
//!   "processes": [
//!     { "states": [ { "transitions": [
//!       { "source": 0, "destination": 1, "guard": "not ready",
//!         "assignments": [ { "predicate": 1, "RHS": "choice(true, false)" } ] }
//!     ] } ] }
//!   ]
//! }
//! ```
//!
//! where each process may also be given as `{ "transitions": [...] }` or as a
//! bare list of transitions. `init` and `guard` are optional; a missing guard
//! always holds and a predicate missing from `init` starts out true.

use crate::{model::*, parser::parse_expression, syntax::*};
use peg::{error::ParseError, str::LineCol};
use serde::Deserialize;
use std::{
    collections::{BTreeMap, BTreeSet},
    path::Path,
};
use thiserror::Error;

#[derive(Deserialize, Debug)]
struct RawModel {
    predicates: BTreeMap<String, PredicateId>,
    #[serde(default)]
    init: BTreeMap<String, bool>,
    processes: Vec<RawProcess>,
}

#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum RawProcess {
    States { states: Vec<RawState> },
    Flat { transitions: Vec<RawTransition> },
    List(Vec<RawTransition>),
}

impl RawProcess {
    fn into_transitions(self) -> Vec<RawTransition> {
        match self {
            RawProcess::States { states } => {
                states.into_iter().flat_map(|s| s.transitions).collect()
            }
            RawProcess::Flat { transitions } | RawProcess::List(transitions) => transitions,
        }
    }
}

#[derive(Deserialize, Debug)]
struct RawState {
    #[serde(default)]
    transitions: Vec<RawTransition>,
}

#[derive(Deserialize, Debug)]
struct RawTransition {
    source: usize,
    destination: usize,
    #[serde(default)]
    guard: Option<String>,
    #[serde(default)]
    assignments: Vec<RawAssignment>,
}

#[derive(Deserialize, Debug)]
struct RawAssignment {
    predicate: PredicateId,
    #[serde(rename = "RHS", alias = "rhs")]
    rhs: String,
}

#[allow(missing_docs)]
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("could not read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("malformed model file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("process {process}: could not parse `{text}`: {error}")]
    Expression {
        process: usize,
        text: String,
        error: ParseError<LineCol>,
    },
    #[error("predicate id {0} is used by more than one predicate")]
    DuplicatePredicateId(PredicateId),
    #[error("process {process} refers to unknown predicate id {predicate}")]
    UnknownPredicate {
        process: usize,
        predicate: PredicateId,
    },
    #[error("initial value given for unknown predicate {0}")]
    UnknownInitPredicate(String),
}

/// Read and parse a model file.
pub fn load(path: impl AsRef<Path>) -> Result<Cfgs, LoadError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let cfgs = parse_model(&text)?;
    log::info!(
        "loaded {}: {} predicates, {} processes",
        path.display(),
        cfgs.predicates.len(),
        cfgs.processes.len()
    );
    Ok(cfgs)
}

/// Parse the JSON text of a model.
pub fn parse_model(text: &str) -> Result<Cfgs, LoadError> {
    let raw: RawModel = serde_json::from_str(text)?;

    let mut ids = BTreeSet::new();
    for id in raw.predicates.values() {
        if !ids.insert(*id) {
            return Err(LoadError::DuplicatePredicateId(*id));
        }
    }
    if let Some(name) = raw.init.keys().find(|n| !raw.predicates.contains_key(*n)) {
        return Err(LoadError::UnknownInitPredicate(name.clone()));
    }

    let processes = raw
        .processes
        .into_iter()
        .enumerate()
        .map(|(id, process)| {
            let transitions = process
                .into_transitions()
                .into_iter()
                .map(|tr| convert_transition(id, tr, &raw.predicates, &ids))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Process { id, transitions })
        })
        .collect::<Result<Vec<_>, LoadError>>()?;

    Ok(Cfgs {
        predicates: raw.predicates,
        init: raw.init,
        processes,
    })
}

fn convert_transition(
    process: usize,
    tr: RawTransition,
    predicates: &PredicateMap,
    ids: &BTreeSet<PredicateId>,
) -> Result<Transition, LoadError> {
    let expression = |text: &str| -> Result<Expression, LoadError> {
        let e = parse_expression(text, predicates).map_err(|error| LoadError::Expression {
            process,
            text: text.to_string(),
            error,
        })?;
        if let Some(predicate) = e.predicates().into_iter().find(|p| !ids.contains(p)) {
            return Err(LoadError::UnknownPredicate { process, predicate });
        }
        Ok(e)
    };

    let guard = match &tr.guard {
        None => Expression::always(),
        Some(text) => expression(text)?,
    };
    let assignments = tr
        .assignments
        .iter()
        .map(|a| {
            if !ids.contains(&a.predicate) {
                return Err(LoadError::UnknownPredicate {
                    process,
                    predicate: a.predicate,
                });
            }
            Ok(Assignment {
                predicate: a.predicate,
                rhs: expression(&a.rhs)?,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Transition {
        source: tr.source,
        destination: tr.destination,
        guard,
        assignments,
    })
}
