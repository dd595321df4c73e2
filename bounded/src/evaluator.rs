// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! Incremental bounded search for property violations.
//!
//! At every timestep the evaluator first asks whether the property can be
//! violated when unknown predicates may take either value (the optimistic
//! query). Only if it can does it ask whether the violation survives with
//! unknown predicates taking neither value (the definite query).

use crate::{
    checker::*,
    formula::*,
    sat::{CadicalSolver, SatSolver},
    task::TaskBuilder,
    timing::{self, Phase},
    witness::decode,
};
use cfgs::{config::Configuration, model::Cfgs};
use std::time::Instant;

/// A bounded search over one model, owning its solver.
pub struct Evaluator<'a, S: SatSolver = CadicalSolver> {
    cfgs: &'a Cfgs,
    config: &'a Configuration,
    task: TaskBuilder<'a>,
    solver: S,
    run: Vec<Formula>,
    step: usize,
}

impl<'a> Evaluator<'a, CadicalSolver> {
    /// An evaluator using CaDiCaL.
    pub fn new(cfgs: &'a Cfgs, config: &'a Configuration) -> Self {
        Self::with_solver(cfgs, config, CadicalSolver::default())
    }
}

impl<'a, S: SatSolver> Evaluator<'a, S> {
    /// An evaluator using the given solver.
    pub fn with_solver(cfgs: &'a Cfgs, config: &'a Configuration, solver: S) -> Self {
        Evaluator {
            cfgs,
            config,
            task: TaskBuilder::new(cfgs, config),
            solver,
            run: vec![],
            step: 0,
        }
    }

    /// The number of transition steps added to the run so far.
    pub fn step(&self) -> usize {
        self.step
    }

    /// The model being searched.
    pub fn cfgs(&self) -> &'a Cfgs {
        self.cfgs
    }

    /// The task being checked.
    pub fn config(&self) -> &'a Configuration {
        self.config
    }

    fn check_start(&self, start_from: usize) {
        assert_eq!(
            start_from, self.step,
            "cannot start from a timestep the run has not reached"
        );
    }

    fn extend_to(&mut self, t: usize) {
        while self.step < t {
            self.run.push(self.task.cfg_as_formula(self.step));
            self.step += 1;
        }
    }

    /// Search for a violation at steps `start_from..=bound`, conjoining
    /// `path_condition` to the run. `start_from` must be the step the last
    /// search stopped at.
    pub fn evaluate(
        &mut self,
        start_from: usize,
        path_condition: Formula,
    ) -> Result<Feedback, CheckerError> {
        self.check_start(start_from);
        self.run.push(path_condition);
        if start_from == 0 {
            self.run.push(self.task.init());
        }
        for t in start_from..=self.config.bound {
            let property = self.task.property_formula(t);
            if let Some(feedback) = self.classify(&property, t)? {
                return Ok(feedback);
            }
            self.extend_to(t + 1);
        }
        log::info!("no violation up to bound {}", self.config.bound);
        Ok(Feedback::none_found(self.config.bound))
    }

    /// Search for a violation at exactly step `k` that also satisfies every
    /// formula in `constraints`. The model must define every predicate, so
    /// a violation found here is always definite.
    pub fn evaluate_constrained(
        &mut self,
        constraints: &[Formula],
        k: usize,
        start_from: usize,
    ) -> Result<Feedback, CheckerError> {
        self.check_start(start_from);
        assert!(k >= start_from, "cannot shrink the run");
        if start_from == 0 {
            self.run.push(self.task.init());
        }
        self.extend_to(k);
        let property = Formula::and(
            constraints
                .iter()
                .cloned()
                .chain([self.task.property_formula(k)]),
        );
        match self.classify(&property, k)? {
            Some(feedback) if feedback.verdict == Verdict::Possible => {
                Err(CheckerError::UncertainConcreteModel(k))
            }
            Some(feedback) => Ok(feedback),
            None => Ok(Feedback {
                verdict: Verdict::NoneFound,
                k,
                witness: vec![],
            }),
        }
    }

    /// Run the optimistic and, if needed, the definite query for `property`
    /// at step `t`. `None` means there is no violation at `t`.
    fn classify(&mut self, property: &Formula, t: usize) -> Result<Option<Feedback>, CheckerError> {
        let wildcard = Formula::var(Var::Wildcard);
        let Some(valuation) = self.query(property, wildcard.clone(), t, Phase::Optimistic)? else {
            return Ok(None);
        };
        let witness = decode(self.cfgs, self.config, &valuation, t);
        let verdict = match self.query(property, Formula::not(wildcard), t, Phase::Definite)? {
            Some(_) => Verdict::Definite,
            None => Verdict::Possible,
        };
        log::info!("{verdict:?} violation at timestep {t}");
        Ok(Some(Feedback {
            verdict,
            k: t,
            witness,
        }))
    }

    fn query(
        &mut self,
        property: &Formula,
        wildcard: Formula,
        t: usize,
        phase: Phase,
    ) -> Result<Option<Valuation>, CheckerError> {
        let start = Instant::now();
        self.solver.reset();
        for f in &self.run {
            self.solver.add(f);
        }
        self.solver.add(property);
        self.solver.add(&wildcard);
        let sat = self.solver.solve()?;
        log::debug!(
            "k={t} {phase}: {} ({}ms)",
            if sat { "sat" } else { "unsat" },
            start.elapsed().as_millis()
        );
        let valuation = sat.then(|| self.solver.model());
        timing::record(phase, sat, start);
        Ok(valuation)
    }
}
