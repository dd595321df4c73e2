// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! Human-readable rendering of models, with predicates shown by name.

use crate::{model::*, syntax::*};
use itertools::Itertools;

fn is_plain_ident(name: &str) -> bool {
    let mut chars = name.chars();
    let starts_well = chars
        .next()
        .map_or(false, |c| c.is_ascii_alphabetic() || c == '_');
    starts_well
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !["and", "or", "not", "true", "false", "choice"].contains(&name)
}

/// How a predicate is referred to in printed expressions. Names that would
/// not parse back as a predicate reference fall back to the id.
pub fn predicate(cfgs: &Cfgs, id: PredicateId) -> String {
    match cfgs.predicate_name(id) {
        Some(name) if is_plain_ident(name) => name.to_string(),
        Some(name) if name.starts_with('(') && name.ends_with(')') => name.to_string(),
        _ => id.to_string(),
    }
}

/// Render an expression of the model.
pub fn expr(cfgs: &Cfgs, e: &Expr) -> String {
    render_with(e, &|id| predicate(cfgs, id))
}

/// Render a guard or right-hand side of the model.
pub fn expression(cfgs: &Cfgs, e: &Expression) -> String {
    match e {
        Expression::Deterministic(e) => expr(cfgs, e),
        Expression::Choice(l, r) => format!("choice({}, {})", expr(cfgs, l), expr(cfgs, r)),
    }
}

fn transition(cfgs: &Cfgs, tr: &Transition) -> String {
    let mut s = format!("{} -> {}", tr.source, tr.destination);
    if tr.guard != Expression::always() {
        s.push_str(&format!(" when {}", expression(cfgs, &tr.guard)));
    }
    if !tr.assignments.is_empty() {
        let assignments = tr
            .assignments
            .iter()
            .map(|a| format!("{} := {}", predicate(cfgs, a.predicate), expression(cfgs, &a.rhs)))
            .join(", ");
        s.push_str(&format!(" do {assignments}"));
    }
    s
}

/// Render a whole model.
pub fn fmt(cfgs: &Cfgs) -> String {
    let mut lines = vec!["predicates:".to_string()];
    for (id, name) in cfgs.predicates_by_id() {
        lines.push(format!(
            "  {id}: {name} (initially {})",
            cfgs.initial_value(name)
        ));
    }
    for process in &cfgs.processes {
        lines.push(format!(
            "process {} ({} locations, {} bits):",
            process.id,
            process.number_of_locations(),
            process.digits()
        ));
        for tr in &process.transitions {
            lines.push(format!("  {}", transition(cfgs, tr)));
        }
    }
    lines.join("\n")
}
