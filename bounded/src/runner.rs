// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! Checking a model directly, or refining an abstract model against a
//! concrete one.
//!
//! With two models the abstract one is searched first. A definite violation
//! or the absence of one is final. A possible violation is replayed in the
//! concrete model at the same depth; if the concrete model confirms it, it is
//! final, and otherwise the abstract path is excluded and the abstract search
//! resumes where it stopped.

use crate::{checker::*, evaluator::Evaluator, formula::Formula, sat::SatSolver};
use crate::{sat::CadicalSolver, witness::witness_as_formula};
use serde::Serialize;

/// One spurious-or-confirmed abstract witness.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Refinement {
    /// The depth of the abstract witness
    pub k: usize,
    /// What the concrete model said about it
    pub concrete: Verdict,
}

/// The outcome of a run.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Report {
    /// The final answer
    pub feedback: Feedback,
    /// The abstract witnesses that were replayed, in order
    pub refinements: Vec<Refinement>,
}

/// Drives one or two evaluators to a final answer.
pub struct Runner<'a, S: SatSolver = CadicalSolver> {
    concrete: Evaluator<'a, S>,
    abstraction: Option<Evaluator<'a, S>>,
}

impl<'a, S: SatSolver> Runner<'a, S> {
    /// Check a single model.
    pub fn uni(concrete: Evaluator<'a, S>) -> Self {
        Runner {
            concrete,
            abstraction: None,
        }
    }

    /// Check `abstraction`, confirming its possible violations in `concrete`.
    pub fn multi(abstraction: Evaluator<'a, S>, concrete: Evaluator<'a, S>) -> Self {
        Runner {
            concrete,
            abstraction: Some(abstraction),
        }
    }

    /// Run to a final answer. The configuration must already fit the
    /// concrete model; it is checked against the abstract one here.
    pub fn run(&mut self) -> Result<Report, CheckerError> {
        let Some(abstraction) = &mut self.abstraction else {
            let feedback = self.concrete.evaluate(0, Formula::true_())?;
            return Ok(Report {
                feedback,
                refinements: vec![],
            });
        };

        abstraction.config().validate(abstraction.cfgs())?;

        let mut refinements = vec![];
        let mut start_from = 0;
        let mut path_condition = Formula::true_();
        loop {
            let feedback = abstraction.evaluate(start_from, path_condition)?;
            if feedback.verdict != Verdict::Possible {
                return Ok(Report {
                    feedback,
                    refinements,
                });
            }

            let k = feedback.k;
            let pinned = witness_as_formula(self.concrete.cfgs(), &feedback.witness);
            let concrete = self
                .concrete
                .evaluate_constrained(&[pinned], k, start_from)?;
            log::info!(
                "abstract witness at timestep {k} is {:?} in the concrete model",
                concrete.verdict
            );
            refinements.push(Refinement {
                k,
                concrete: concrete.verdict,
            });
            if concrete.verdict == Verdict::Definite {
                return Ok(Report {
                    feedback: concrete,
                    refinements,
                });
            }

            start_from = k;
            path_condition = Formula::not(witness_as_formula(
                abstraction.cfgs(),
                &feedback.witness,
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cfgs::{
        config::{ConfigError, Configuration, PropertyKind},
        loader::parse_model,
        model::Cfgs,
    };

    // In the abstract model the guards of 0 -> 1 and 2 -> 1 are unknown.
    // Concretely 0 -> 1 is never enabled and 2 -> 1 always is.
    fn two_level() -> (Cfgs, Cfgs) {
        let abstraction = parse_model(
            r#"{ "predicates": {},
                 "processes": [ [
                    { "source": 0, "destination": 1, "guard": "choice(false, false)" },
                    { "source": 0, "destination": 2 },
                    { "source": 2, "destination": 1, "guard": "choice(false, false)" }
                 ] ] }"#,
        )
        .expect("abstract model should load");
        let concrete = parse_model(
            r#"{ "predicates": { "x": 0 }, "init": { "x": false },
                 "processes": [ [
                    { "source": 0, "destination": 1, "guard": "x" },
                    { "source": 0, "destination": 2 },
                    { "source": 2, "destination": 1, "guard": "~x" }
                 ] ] }"#,
        )
        .expect("concrete model should load");
        (abstraction, concrete)
    }

    #[test]
    fn test_uni_model() -> Result<(), CheckerError> {
        let (_, concrete) = two_level();
        let config = Configuration::new(PropertyKind::Reachability, 1, vec![0], 5);
        let report = Runner::uni(Evaluator::new(&concrete, &config)).run()?;
        assert_eq!(report.feedback.verdict, Verdict::Definite);
        assert_eq!(report.feedback.k, 2);
        assert!(report.refinements.is_empty());
        Ok(())
    }

    #[test]
    fn test_spurious_witness_is_refined() -> Result<(), CheckerError> {
        let (abstraction, concrete) = two_level();
        let config = Configuration::new(PropertyKind::Reachability, 1, vec![0], 5);
        let mut runner = Runner::multi(
            Evaluator::new(&abstraction, &config),
            Evaluator::new(&concrete, &config),
        );
        let report = runner.run()?;
        assert_eq!(
            report.refinements,
            vec![
                Refinement {
                    k: 1,
                    concrete: Verdict::NoneFound
                },
                Refinement {
                    k: 2,
                    concrete: Verdict::Definite
                },
            ]
        );
        assert_eq!(report.feedback.verdict, Verdict::Definite);
        assert_eq!(report.feedback.k, 2);
        let path: Vec<_> = report
            .feedback
            .witness
            .iter()
            .map(|s| s.locations[0])
            .collect();
        assert_eq!(path, vec![0, 2, 1]);
        Ok(())
    }

    #[test]
    fn test_abstract_answer_is_final() -> Result<(), CheckerError> {
        let (abstraction, concrete) = two_level();
        // location 2 is reached definitely in the abstract model
        let config = Configuration::new(PropertyKind::Reachability, 2, vec![0], 5);
        let report = Runner::multi(
            Evaluator::new(&abstraction, &config),
            Evaluator::new(&concrete, &config),
        )
        .run()?;
        assert_eq!(report.feedback.verdict, Verdict::Definite);
        assert_eq!(report.feedback.k, 1);
        assert!(report.refinements.is_empty());

        let config = Configuration::new(PropertyKind::Reachability, 3, vec![0], 3);
        let report = Runner::multi(
            Evaluator::new(&abstraction, &config),
            Evaluator::new(&concrete, &config),
        )
        .run()?;
        assert_eq!(report.feedback, Feedback::none_found(3));
        Ok(())
    }

    #[test]
    fn test_abstract_model_missing_a_process() {
        let (abstraction, _) = two_level();
        let concrete = parse_model(
            r#"{ "predicates": {},
                 "processes": [ [ { "source": 0, "destination": 1 } ],
                                [ { "source": 0, "destination": 1 } ] ] }"#,
        )
        .expect("concrete model should load");
        let config = Configuration::new(PropertyKind::Reachability, 1, vec![0, 1], 3);
        assert_eq!(config.validate(&concrete), Ok(()));
        let result = Runner::multi(
            Evaluator::new(&abstraction, &config),
            Evaluator::new(&concrete, &config),
        )
        .run();
        assert_eq!(
            result,
            Err(CheckerError::Config(ConfigError::UnknownProcess(1, 1)))
        );
    }
}
