// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! Encoding of CFGS locations, predicates, guards and assignments as
//! propositional formulas under three-valued semantics.
//!
//! A predicate `p` at step `t` is encoded by two atoms, `p_t_u` and `p_t_t`:
//! it is unknown when `p_t_u` holds, and otherwise has the value of `p_t_t`.
//! The global atom `unknown` decides whether an unknown predicate may be
//! read as either value (optimistic search) or as neither.
//!
//! Transitions are encoded once as templates between the symbolic steps
//! [`CURRENT`] and [`NEXT`] and then shifted to concrete timesteps.

use crate::formula::*;
use cfgs::{model::*, syntax::*};
use std::collections::BTreeSet;

/// The step a template transition leaves from.
pub const CURRENT: usize = 0;
/// The step a template transition enters.
pub const NEXT: usize = 1;

fn location_var(process: usize, bit: usize, step: usize, shadow: bool) -> Var {
    Var::Location {
        process,
        bit,
        step,
        shadow,
    }
}

fn predicate_var(predicate: PredicateId, bit: PredicateBit, step: usize, shadow: bool) -> Var {
    Var::Predicate {
        predicate,
        bit,
        step,
        shadow,
    }
}

fn location_bits(
    cfgs: &Cfgs,
    process: usize,
    location: usize,
    step: usize,
    shadow: bool,
) -> Formula {
    let digits = cfgs.digits(process);
    if location >> digits != 0 {
        return Formula::false_();
    }
    Formula::and((0..digits).map(|d| {
        let atom = Formula::var(location_var(process, d, step, shadow));
        if (location >> (digits - 1 - d)) & 1 == 1 {
            atom
        } else {
            Formula::not(atom)
        }
    }))
}

/// `process` is at `location` at `step`. Bit 0 is the most significant.
pub fn enc_location(cfgs: &Cfgs, process: usize, location: usize, step: usize) -> Formula {
    location_bits(cfgs, process, location, step, false)
}

/// The recorded copy of `process`'s location is `location` at `step`.
pub fn enc_location_copy(cfgs: &Cfgs, process: usize, location: usize, step: usize) -> Formula {
    location_bits(cfgs, process, location, step, true)
}

/// `predicate` has status `status` at `step`.
pub fn enc_status(predicate: PredicateId, status: Status, step: usize, shadow: bool) -> Formula {
    let u = Formula::var(predicate_var(predicate, PredicateBit::Unknown, step, shadow));
    let t = Formula::var(predicate_var(predicate, PredicateBit::Truth, step, shadow));
    match status {
        Status::True => Formula::and([Formula::not(u), t]),
        Status::False => Formula::and([Formula::not(u), Formula::not(t)]),
        Status::Unknown => u,
    }
}

/// `predicate` is definitely true at `step`.
pub fn enc_is_true(predicate: PredicateId, step: usize) -> Formula {
    enc_status(predicate, Status::True, step, false)
}

/// `predicate` is definitely false at `step`.
pub fn enc_is_false(predicate: PredicateId, step: usize) -> Formula {
    enc_status(predicate, Status::False, step, false)
}

/// `predicate` is unknown at `step`.
pub fn enc_is_unknown(predicate: PredicateId, step: usize) -> Formula {
    enc_status(predicate, Status::Unknown, step, false)
}

/// An occurrence of `predicate` at `step`: a known predicate contributes its
/// value (negated for a negative occurrence), an unknown one contributes
/// `unknown`.
pub fn enc_predicate(predicate: PredicateId, positive: bool, step: usize) -> Formula {
    let u = Formula::var(predicate_var(predicate, PredicateBit::Unknown, step, false));
    let t = Formula::var(predicate_var(predicate, PredicateBit::Truth, step, false));
    let t = if positive { t } else { Formula::not(t) };
    Formula::or([
        Formula::and([u.clone(), Formula::var(Var::Wildcard)]),
        Formula::and([Formula::not(u), t]),
    ])
}

fn enc_nnf(e: &Expr, step: usize) -> Formula {
    match e {
        Expr::Literal(b) => Formula::constant(*b),
        Expr::Predicate(p) => enc_predicate(*p, true, step),
        Expr::Not(inner) => match inner.as_ref() {
            Expr::Predicate(p) => enc_predicate(*p, false, step),
            inner => enc_nnf(&inner.negate(), step),
        },
        Expr::And(es) => Formula::and(es.iter().map(|e| enc_nnf(e, step))),
        Expr::Or(es) => Formula::or(es.iter().map(|e| enc_nnf(e, step))),
    }
}

/// Encode `expr` (or its negation) at `step`: the expression is brought into
/// negation normal form and each predicate occurrence is encoded with
/// [`enc_predicate`].
pub fn enc_exp(expr: &Expr, step: usize, negate: bool) -> Formula {
    let e = if negate { expr.negate() } else { expr.nnf() };
    enc_nnf(&e, step)
}

/// Like [`enc_exp`], but with `unknown` fixed to true: holds whenever the
/// expression could hold for some reading of the unknown predicates.
pub fn enc_exp_definite_wildcard(expr: &Expr, step: usize, negate: bool) -> Formula {
    enc_exp(expr, step, negate).substitute(&Var::Wildcard, true)
}

/// Encode a guard at `step`.
pub fn enc_guard(guard: &Expression, step: usize) -> Formula {
    match guard {
        Expression::Deterministic(e) => enc_exp(e, step, false),
        Expression::Choice(l, _) if l.is_literal(true) => Formula::true_(),
        Expression::Choice(_, r) if r.is_literal(true) => Formula::false_(),
        Expression::Choice(l, r) if l.is_literal(false) && r.is_literal(false) => {
            Formula::var(Var::Wildcard)
        }
        Expression::Choice(l, r) => Formula::and([
            Formula::or([enc_exp(l, step, false), enc_exp(r, step, true)]),
            Formula::or([
                enc_exp(l, step, false),
                enc_exp(r, step, false),
                Formula::var(Var::Wildcard),
            ]),
        ]),
    }
}

/// Encode the assignment `predicate := choice(left, right)` from [`CURRENT`]
/// to [`NEXT`]: the predicate becomes true if `left` holds, false if `right`
/// holds, and unknown if neither can be ruled out.
pub fn enc_assignment_choice(left: &Expr, right: &Expr, predicate: PredicateId) -> Formula {
    if left.is_literal(true) {
        return enc_is_true(predicate, NEXT);
    }
    if left.is_literal(false) && right.is_literal(true) {
        return enc_is_false(predicate, NEXT);
    }
    if left.is_literal(false) && right.is_literal(false) {
        return enc_is_unknown(predicate, NEXT);
    }
    let neither = Expr::or([left.clone(), right.clone()]);
    Formula::or([
        Formula::and([enc_exp(left, CURRENT, false), enc_is_true(predicate, NEXT)]),
        Formula::and([enc_exp(right, CURRENT, false), enc_is_false(predicate, NEXT)]),
        Formula::and([
            enc_exp_definite_wildcard(&neither, CURRENT, true),
            enc_is_unknown(predicate, NEXT),
        ]),
    ])
}

/// Encode an assignment; a deterministic right-hand side `x` is read as
/// `choice(x, ~x)`.
pub fn enc_assignment(assignment: &Assignment) -> Formula {
    let (left, right) = assignment.rhs.as_choice();
    enc_assignment_choice(&left, &right, assignment.predicate)
}

/// Every predicate outside `modified` keeps its status from [`CURRENT`] to
/// [`NEXT`].
pub fn enc_unchanging_predicate_values(cfgs: &Cfgs, modified: &BTreeSet<PredicateId>) -> Formula {
    Formula::and(
        cfgs.predicate_ids()
            .into_iter()
            .filter(|p| !modified.contains(p))
            .map(|p| {
                Formula::or([Status::True, Status::False, Status::Unknown].map(|s| {
                    Formula::and([
                        enc_status(p, s, CURRENT, false),
                        enc_status(p, s, NEXT, false),
                    ])
                }))
            }),
    )
}

/// Every process other than `active` stays at its location from [`CURRENT`]
/// to [`NEXT`].
pub fn enc_idle_all_processes_except(cfgs: &Cfgs, active: usize) -> Formula {
    Formula::and(
        cfgs.processes
            .iter()
            .filter(|q| q.id != active)
            .flat_map(|q| {
                (0..q.digits()).map(move |d| {
                    Formula::iff(
                        Formula::var(location_var(q.id, d, CURRENT, false)),
                        Formula::var(location_var(q.id, d, NEXT, false)),
                    )
                })
            }),
    )
}

/// The guard, the assignments and the frame condition of a transition.
pub fn enc_operation(cfgs: &Cfgs, transition: &Transition) -> Formula {
    let modified: BTreeSet<_> = transition
        .assignments
        .iter()
        .map(|a| a.predicate)
        .collect();
    Formula::and(
        [enc_guard(&transition.guard, CURRENT)]
            .into_iter()
            .chain(transition.assignments.iter().map(enc_assignment))
            .chain([enc_unchanging_predicate_values(cfgs, &modified)]),
    )
}

/// One transition of one process, encoded from [`CURRENT`] to [`NEXT`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TemplateTransition {
    /// The process taking the transition
    pub parent: usize,
    /// The source location, at [`CURRENT`]
    pub old_location: Formula,
    /// Guard, assignments and frame condition
    pub operation: Formula,
    /// The destination location, at [`NEXT`]
    pub new_location: Formula,
    /// Every other process keeps its location
    pub idle: Formula,
}

impl TemplateTransition {
    /// The whole template as one formula.
    pub fn as_formula(&self) -> Formula {
        Formula::and([
            self.old_location.clone(),
            self.operation.clone(),
            self.new_location.clone(),
            self.idle.clone(),
        ])
    }

    /// The transition taken from step `t` to step `t + 1`.
    pub fn instantiate(&self, t: usize) -> Formula {
        self.as_formula().shift(t - CURRENT)
    }
}

/// Encode a transition of process `process`.
pub fn enc_transition(cfgs: &Cfgs, process: usize, transition: &Transition) -> TemplateTransition {
    TemplateTransition {
        parent: process,
        old_location: enc_location(cfgs, process, transition.source, CURRENT),
        operation: enc_operation(cfgs, transition),
        new_location: enc_location(cfgs, process, transition.destination, NEXT),
        idle: enc_idle_all_processes_except(cfgs, process),
    }
}

/// Encode every transition of every process.
pub fn encode_template_transitions(cfgs: &Cfgs) -> Vec<TemplateTransition> {
    let templates: Vec<_> = cfgs
        .processes
        .iter()
        .flat_map(|p| {
            p.transitions
                .iter()
                .map(move |tr| enc_transition(cfgs, p.id, tr))
        })
        .collect();
    log::debug!("encoded {} template transitions", templates.len());
    templates
}

/// The atoms that make up a state at [`CURRENT`]: both bits of every
/// predicate and every location bit of every process.
pub fn tracked_atoms(cfgs: &Cfgs) -> Vec<Var> {
    let predicates = cfgs.predicate_ids().into_iter().flat_map(|p| {
        [PredicateBit::Unknown, PredicateBit::Truth]
            .map(|bit| predicate_var(p, bit, CURRENT, false))
    });
    let locations = cfgs
        .processes
        .iter()
        .flat_map(|p| (0..p.digits()).map(move |d| location_var(p.id, d, CURRENT, false)));
    predicates.chain(locations).collect()
}

/// The location of `process` at `step` under `valuation`.
pub fn decode_location(cfgs: &Cfgs, valuation: &Valuation, process: usize, step: usize) -> usize {
    (0..cfgs.digits(process)).fold(0, |acc, d| {
        (acc << 1) | valuation.get(&location_var(process, d, step, false)) as usize
    })
}

/// The status of `predicate` at `step` under `valuation`.
pub fn decode_status(valuation: &Valuation, predicate: PredicateId, step: usize) -> Status {
    if valuation.get(&predicate_var(predicate, PredicateBit::Unknown, step, false)) {
        Status::Unknown
    } else if valuation.get(&predicate_var(predicate, PredicateBit::Truth, step, false)) {
        Status::True
    } else {
        Status::False
    }
}
