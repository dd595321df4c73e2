// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! Paths to property violations, read back from satisfying assignments.

use crate::{encode::*, formula::*};
use cfgs::{config::Configuration, model::Cfgs, syntax::Status};
use itertools::Itertools;
use serde::Serialize;
use std::{collections::BTreeMap, fmt};

/// The state of the system at one timestep of a witness.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct WitnessStep {
    /// The timestep
    pub step: usize,
    /// The location of each process, indexed by process id
    pub locations: Vec<usize>,
    /// The status of each predicate, by name
    pub predicates: BTreeMap<String, Status>,
    /// Whether each process has moved since the recording; absent when
    /// fairness is off
    pub fairness: Option<Vec<bool>>,
    /// `re`: the state at this step is being recorded
    pub record: bool,
    /// `rd`: a state has been recorded before this step
    pub recorded: bool,
}

/// Read the path for steps `0..=k` out of a satisfying assignment.
pub fn decode(
    cfgs: &Cfgs,
    config: &Configuration,
    valuation: &Valuation,
    k: usize,
) -> Vec<WitnessStep> {
    (0..=k)
        .map(|step| WitnessStep {
            step,
            locations: (0..cfgs.processes.len())
                .map(|p| decode_location(cfgs, valuation, p, step))
                .collect(),
            predicates: cfgs
                .predicates
                .iter()
                .map(|(name, id)| (name.clone(), decode_status(valuation, *id, step)))
                .collect(),
            fairness: config.fairness.then(|| {
                (0..cfgs.processes.len())
                    .map(|process| valuation.get(&Var::Fair { process, step }))
                    .collect()
            }),
            record: valuation.get(&Var::Record { step }),
            recorded: valuation.get(&Var::Recorded { step }),
        })
        .collect()
}

/// A formula pinning a model (possibly a different one from the model that
/// produced the witness) to the witness's path: every process's location at
/// every step, and every predicate the witness knows to be true or false
/// that also exists in `cfgs`.
pub fn witness_as_formula(cfgs: &Cfgs, witness: &[WitnessStep]) -> Formula {
    Formula::and(witness.iter().flat_map(|s| {
        let locations = s
            .locations
            .iter()
            .enumerate()
            .filter(|(p, _)| *p < cfgs.processes.len())
            .map(move |(p, l)| enc_location(cfgs, p, *l, s.step));
        let predicates = s
            .predicates
            .iter()
            .filter(|(_, status)| **status != Status::Unknown)
            .filter_map(move |(name, status)| {
                cfgs.predicate_id(name)
                    .map(|id| enc_status(id, *status, s.step, false))
            });
        locations.chain(predicates)
    }))
}

impl fmt::Display for WitnessStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- timestep {} ---", self.step)?;
        writeln!(
            f,
            "  locations:  {}",
            self.locations
                .iter()
                .enumerate()
                .map(|(p, l)| format!("P{p} = {l}"))
                .join(", ")
        )?;
        writeln!(
            f,
            "  predicates: {}",
            self.predicates
                .iter()
                .map(|(name, status)| format!("{name} = {status}"))
                .join(", ")
        )?;
        let fairness = match &self.fairness {
            None => "n.a.".to_string(),
            Some(fair) => fair
                .iter()
                .enumerate()
                .map(|(p, fair)| format!("P{p} = {}", if *fair { "fair" } else { "unfair" }))
                .join(", "),
        };
        writeln!(f, "  fairness:   {fairness}")?;
        write!(f, "  re = {}, rd = {}", self.record, self.recorded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cfgs::{config::PropertyKind, loader::parse_model};

    fn model() -> Cfgs {
        parse_model(
            r#"{ "predicates": { "x": 0, "y": 1 },
                 "processes": [ [ { "source": 0, "destination": 2 } ], [] ] }"#,
        )
        .expect("model should load")
    }

    #[test]
    fn test_decode() {
        let cfgs = model();
        let mut config = Configuration::new(PropertyKind::Liveness, 2, vec![0], 1);
        config.fairness = true;
        let valuation: Valuation = [
            Var::Location {
                process: 0,
                bit: 0,
                step: 1,
                shadow: false,
            },
            Var::Predicate {
                predicate: 0,
                bit: PredicateBit::Truth,
                step: 0,
                shadow: false,
            },
            Var::Predicate {
                predicate: 1,
                bit: PredicateBit::Unknown,
                step: 1,
                shadow: false,
            },
            Var::Record { step: 0 },
            Var::Recorded { step: 1 },
            Var::Fair {
                process: 0,
                step: 1,
            },
        ]
        .into_iter()
        .collect();
        let witness = decode(&cfgs, &config, &valuation, 1);
        assert_eq!(witness.len(), 2);
        assert_eq!(witness[1].locations, vec![2, 0]);
        assert_eq!(witness[0].predicates["x"], Status::True);
        assert_eq!(witness[1].predicates["x"], Status::False);
        assert_eq!(witness[1].predicates["y"], Status::Unknown);
        insta::assert_display_snapshot!(witness[1], @r###"
        --- timestep 1 ---
          locations:  P0 = 2, P1 = 0
          predicates: x = false, y = unknown
          fairness:   P0 = fair, P1 = unfair
          re = false, rd = true
        "###);

        config.fairness = false;
        let witness = decode(&cfgs, &config, &valuation, 0);
        assert_eq!(witness[0].fairness, None);
        assert!(witness[0].to_string().contains("fairness:   n.a."));
    }

    #[test]
    fn test_witness_as_formula() {
        let cfgs = model();
        let step = WitnessStep {
            step: 3,
            locations: vec![1, 0, 7],
            predicates: BTreeMap::from([
                ("x".to_string(), Status::False),
                ("y".to_string(), Status::Unknown),
                ("z".to_string(), Status::True),
            ]),
            fairness: None,
            record: false,
            recorded: false,
        };
        // process 2 and predicate z don't exist here, y is unknown
        insta::assert_display_snapshot!(
            witness_as_formula(&cfgs, &[step]),
            @"~n_3_0_0 & n_3_0_1 & ~n_3_1_0 & ~0_3_u & ~0_3_t"
        );
    }
}
