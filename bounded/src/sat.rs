// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! Satisfiability of [`Formula`]s using the [CaDiCaL][cadical] SAT solver.
//!
//! [cadical]: https://fmv.jku.at/cadical/

use crate::{checker::CheckerError, formula::*};
use cadical::Solver;
use std::collections::HashMap;

/// A propositional solver holding a conjunction of formulas.
pub trait SatSolver {
    /// Forget every formula added so far.
    fn reset(&mut self);

    /// Conjoin `formula` to the formulas added so far.
    fn add(&mut self, formula: &Formula);

    /// Decide whether the conjunction of the added formulas is satisfiable.
    fn solve(&mut self) -> Result<bool, CheckerError>;

    /// The satisfying assignment found by the last successful [`solve`].
    ///
    /// [`solve`]: SatSolver::solve
    fn model(&self) -> Valuation;
}

/// Holds the numbering of atoms and of the variables introduced by the
/// Tseitin transformation
#[derive(Debug, Default)]
struct Context {
    indices: HashMap<Var, usize>,
    vars: usize,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Variable(usize);

impl Context {
    fn get_var(&mut self, var: &Var) -> Variable {
        if let Some(i) = self.indices.get(var) {
            return Variable(*i);
        }
        let Variable(i) = self.new_var();
        self.indices.insert(*var, i);
        Variable(i)
    }

    fn new_var(&mut self) -> Variable {
        self.vars += 1;
        Variable(self.vars - 1)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Literal {
    var: usize,
    pos: bool,
}
type Clause = Vec<Literal>;
type Cnf = Vec<Clause>;

impl Literal {
    fn t(Variable(var): Variable) -> Literal {
        Literal { var, pos: true }
    }

    fn negate(self) -> Literal {
        Literal {
            var: self.var,
            pos: !self.pos,
        }
    }

    fn dimacs(&self) -> i32 {
        (self.var as i32 + 1) * if self.pos { 1 } else { -1 }
    }
}

fn tseytin(formula: &Formula, context: &mut Context) -> Cnf {
    fn inner(formula: &Formula, context: &mut Context, out: &mut Cnf) -> Literal {
        let mut go = |formula| inner(formula, context, out);
        match formula {
            Formula::Var(v) => Literal::t(context.get_var(v)),
            Formula::Not(formula) => go(formula).negate(),
            Formula::And(vec) => {
                let olds: Vec<_> = vec.iter().map(go).collect();
                let new = Literal::t(context.new_var());
                for old in &olds {
                    out.push(vec![*old, new.negate()]);
                }
                let mut clause: Vec<_> = olds.into_iter().map(Literal::negate).collect();
                clause.push(new);
                out.push(clause);
                new
            }
            Formula::Or(vec) => {
                let olds: Vec<_> = vec.iter().map(go).collect();
                let new = Literal::t(context.new_var());
                for old in &olds {
                    out.push(vec![old.negate(), new]);
                }
                let mut clause: Vec<_> = olds;
                clause.push(new.negate());
                out.push(clause);
                new
            }
        }
    }

    let mut out = vec![];
    let literal = inner(formula, context, &mut out);
    out.push(vec![literal]);
    out
}

/// A [`SatSolver`] backed by CaDiCaL. Every [`reset`](SatSolver::reset)
/// starts a fresh engine with a fresh variable numbering.
#[derive(Default)]
pub struct CadicalSolver {
    solver: Solver,
    context: Context,
}

impl SatSolver for CadicalSolver {
    fn reset(&mut self) {
        self.solver = Default::default();
        self.context = Context::default();
    }

    fn add(&mut self, formula: &Formula) {
        for clause in tseytin(formula, &mut self.context) {
            self.solver.add_clause(clause.iter().map(Literal::dimacs));
        }
    }

    fn solve(&mut self) -> Result<bool, CheckerError> {
        self.solver.solve().ok_or(CheckerError::SolverFailed)
    }

    fn model(&self) -> Valuation {
        self.context
            .indices
            .iter()
            .filter(|(_, i)| self.solver.value(**i as i32 + 1).unwrap_or(false))
            .map(|(v, _)| *v)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use itertools::Itertools;

    fn dimacs(cnf: &Cnf, context: &Context) -> String {
        let mut out = format!("p cnf {} {}\n", context.vars, cnf.len());
        out.push_str(
            &cnf.iter()
                .map(|clause| {
                    clause
                        .iter()
                        .map(|literal| literal.dimacs().to_string())
                        .chain(["0".to_string()])
                        .join(" ")
                })
                .join("\n"),
        );
        out
    }

    fn record(step: usize) -> Formula {
        Formula::var(Var::Record { step })
    }

    #[test]
    fn test_tseytin_clauses() {
        let mut context = Context::default();
        let f = Formula::and([record(0), Formula::not(record(1))]);
        let cnf = tseytin(&f, &mut context);
        assert_eq!(context.vars, 3);
        insta::assert_snapshot!(dimacs(&cnf, &context), @r###"
        p cnf 3 4
        1 -3 0
        -2 -3 0
        -1 2 3 0
        3 0
        "###);
    }

    #[test]
    fn test_solver_basic() -> Result<(), CheckerError> {
        let mut solver = CadicalSolver::default();
        solver.add(&Formula::iff(record(0), Formula::not(record(1))));
        solver.add(&record(1));
        assert!(solver.solve()?);
        let model = solver.model();
        assert!(!model.get(&Var::Record { step: 0 }));
        assert!(model.get(&Var::Record { step: 1 }));

        solver.add(&record(0));
        assert!(!solver.solve()?);

        // nothing survives a reset
        solver.reset();
        solver.add(&record(0));
        assert!(solver.solve()?);
        Ok(())
    }

    #[test]
    fn test_constants() -> Result<(), CheckerError> {
        let mut solver = CadicalSolver::default();
        solver.add(&Formula::true_());
        assert!(solver.solve()?);
        solver.add(&Formula::false_());
        assert!(!solver.solve()?);
        Ok(())
    }
}
