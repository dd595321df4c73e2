// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! Guard and assignment expressions over three-valued predicates.

use itertools::Itertools;
use serde::Serialize;
use std::{collections::BTreeSet, fmt};

/// Identifier of a predicate, as assigned by the model file.
pub type PredicateId = usize;

/// The value of a three-valued predicate.
#[derive(PartialEq, Eq, Clone, Copy, Debug, Hash, Serialize, PartialOrd, Ord)]
pub enum Status {
    /// The abstracted condition definitely holds
    True,
    /// The abstracted condition definitely does not hold
    False,
    /// The abstraction does not know whether the condition holds
    Unknown,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Status::True => "true",
            Status::False => "false",
            Status::Unknown => "unknown",
        };
        write!(f, "{s}")
    }
}

/// A deterministic propositional expression over predicate ids.
#[derive(PartialEq, Eq, Clone, Debug, Hash, Serialize)]
pub enum Expr {
    /// `$true` or `$false`
    Literal(bool),
    /// A predicate occurrence
    Predicate(PredicateId),
    /// Negation
    Not(Box<Expr>),
    /// Conjunction (the empty conjunction is true)
    And(Vec<Expr>),
    /// Disjunction (the empty disjunction is false)
    Or(Vec<Expr>),
}

impl Expr {
    /// The constant `$true`
    pub fn true_() -> Self {
        Self::Literal(true)
    }

    /// The constant `$false`
    pub fn false_() -> Self {
        Self::Literal(false)
    }

    /// A positive occurrence of a predicate
    pub fn predicate(id: PredicateId) -> Self {
        Self::Predicate(id)
    }

    /// Smart constructor for negation, folding constants and double negations.
    #[allow(clippy::should_implement_trait)]
    pub fn not(e: Expr) -> Self {
        match e {
            Expr::Literal(b) => Expr::Literal(!b),
            Expr::Not(e) => *e,
            e => Expr::Not(Box::new(e)),
        }
    }

    /// Smart constructor for conjunction. Nested conjunctions are flattened
    /// and constants folded.
    pub fn and<I: IntoIterator<Item = Expr>>(es: I) -> Self {
        let mut flat = vec![];
        for e in es {
            match e {
                Expr::Literal(true) => (),
                Expr::Literal(false) => return Expr::false_(),
                Expr::And(inner) => flat.extend(inner),
                e => flat.push(e),
            }
        }
        match flat.len() {
            0 => Expr::true_(),
            1 => flat.remove(0),
            _ => Expr::And(flat),
        }
    }

    /// Smart constructor for disjunction. Nested disjunctions are flattened
    /// and constants folded.
    pub fn or<I: IntoIterator<Item = Expr>>(es: I) -> Self {
        let mut flat = vec![];
        for e in es {
            match e {
                Expr::Literal(false) => (),
                Expr::Literal(true) => return Expr::true_(),
                Expr::Or(inner) => flat.extend(inner),
                e => flat.push(e),
            }
        }
        match flat.len() {
            0 => Expr::false_(),
            1 => flat.remove(0),
            _ => Expr::Or(flat),
        }
    }

    /// The logical negation of this expression, in negation normal form.
    pub fn negate(&self) -> Expr {
        self.polarised(true)
    }

    /// This expression in negation normal form: negations only occur
    /// directly above predicates.
    pub fn nnf(&self) -> Expr {
        self.polarised(false)
    }

    fn polarised(&self, negated: bool) -> Expr {
        match self {
            Expr::Literal(b) => Expr::Literal(*b != negated),
            Expr::Predicate(p) if negated => Expr::Not(Box::new(Expr::Predicate(*p))),
            Expr::Predicate(p) => Expr::Predicate(*p),
            Expr::Not(e) => e.polarised(!negated),
            Expr::And(es) if negated => Expr::or(es.iter().map(|e| e.polarised(true))),
            Expr::And(es) => Expr::and(es.iter().map(|e| e.polarised(false))),
            Expr::Or(es) if negated => Expr::and(es.iter().map(|e| e.polarised(true))),
            Expr::Or(es) => Expr::or(es.iter().map(|e| e.polarised(false))),
        }
    }

    /// Whether this expression is the given constant.
    pub fn is_literal(&self, value: bool) -> bool {
        matches!(self, Expr::Literal(b) if *b == value)
    }

    /// Every predicate mentioned in this expression.
    pub fn predicates(&self) -> BTreeSet<PredicateId> {
        let mut out = BTreeSet::new();
        self.collect_predicates(&mut out);
        out
    }

    fn collect_predicates(&self, out: &mut BTreeSet<PredicateId>) {
        match self {
            Expr::Literal(_) => (),
            Expr::Predicate(p) => {
                out.insert(*p);
            }
            Expr::Not(e) => e.collect_predicates(out),
            Expr::And(es) | Expr::Or(es) => es.iter().for_each(|e| e.collect_predicates(out)),
        }
    }

    /// Two-valued evaluation under an assignment of the predicates.
    #[cfg(test)]
    fn eval(&self, value: &impl Fn(PredicateId) -> bool) -> bool {
        match self {
            Expr::Literal(b) => *b,
            Expr::Predicate(p) => value(*p),
            Expr::Not(e) => !e.eval(value),
            Expr::And(es) => es.iter().all(|e| e.eval(value)),
            Expr::Or(es) => es.iter().any(|e| e.eval(value)),
        }
    }
}

fn precedence(e: &Expr) -> usize {
    match e {
        Expr::Or(_) => 10,
        Expr::And(_) => 20,
        Expr::Not(_) => 30,
        Expr::Literal(_) | Expr::Predicate(_) => 1000,
    }
}

/// Render an expression, naming predicates with `name`.
pub fn render_with(e: &Expr, name: &impl Fn(PredicateId) -> String) -> String {
    let operand = |arg: &Expr| {
        let s = render_with(arg, name);
        if precedence(arg) <= precedence(e) {
            format!("({s})")
        } else {
            s
        }
    };
    match e {
        Expr::Literal(true) => "$true".to_string(),
        Expr::Literal(false) => "$false".to_string(),
        Expr::Predicate(p) => name(*p),
        Expr::Not(arg) => format!("~{}", operand(arg)),
        Expr::And(es) if es.is_empty() => "$true".to_string(),
        Expr::Or(es) if es.is_empty() => "$false".to_string(),
        Expr::And(es) => es.iter().map(operand).join(" & "),
        Expr::Or(es) => es.iter().map(operand).join(" | "),
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", render_with(self, &|p| p.to_string()))
    }
}

/// A guard or the right-hand side of an assignment.
#[derive(PartialEq, Eq, Clone, Debug, Hash, Serialize)]
pub enum Expression {
    /// An ordinary propositional expression
    Deterministic(Expr),
    /// `choice(left, right)`: an abstracted branch where either
    /// concretization may hold
    Choice(Expr, Expr),
}

impl Expression {
    /// The guard that always holds.
    pub fn always() -> Self {
        Expression::Deterministic(Expr::true_())
    }

    /// The expression as a choice; a deterministic `x` becomes
    /// `choice(x, ~x)`.
    pub fn as_choice(&self) -> (Expr, Expr) {
        match self {
            Expression::Deterministic(e) => (e.clone(), e.negate()),
            Expression::Choice(left, right) => (left.clone(), right.clone()),
        }
    }

    /// Every predicate mentioned in this expression.
    pub fn predicates(&self) -> BTreeSet<PredicateId> {
        match self {
            Expression::Deterministic(e) => e.predicates(),
            Expression::Choice(left, right) => {
                let mut ps = left.predicates();
                ps.extend(right.predicates());
                ps
            }
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Deterministic(e) => write!(f, "{e}"),
            Expression::Choice(left, right) => write!(f, "choice({left}, {right})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(id: PredicateId) -> Expr {
        Expr::predicate(id)
    }

    #[test]
    fn test_smart_constructors() {
        assert_eq!(Expr::not(Expr::true_()), Expr::false_());
        assert_eq!(Expr::not(Expr::not(p(0))), p(0));
        assert_eq!(Expr::and([p(0), Expr::true_()]), p(0));
        assert_eq!(Expr::and([p(0), Expr::false_()]), Expr::false_());
        assert_eq!(Expr::or([p(0), Expr::true_()]), Expr::true_());
        assert_eq!(
            Expr::and([Expr::and([p(0), p(1)]), p(2)]),
            Expr::And(vec![p(0), p(1), p(2)])
        );
        assert_eq!(Expr::or(vec![]), Expr::false_());
    }

    #[test]
    fn test_negate_is_nnf() {
        let e = Expr::and([p(0), Expr::not(Expr::or([p(1), Expr::not(p(2))]))]);
        insta::assert_snapshot!(e.to_string(), @"0 & ~(1 | ~2)");
        insta::assert_snapshot!(e.nnf().to_string(), @"0 & ~1 & 2");
        insta::assert_snapshot!(e.negate().to_string(), @"~0 | 1 | ~2");
    }

    #[test]
    fn test_negate_agrees_with_eval() {
        let e = Expr::or([
            Expr::and([p(0), Expr::not(p(1))]),
            Expr::not(Expr::and([p(2), p(0)])),
        ]);
        for bits in 0..8usize {
            let value = |id: PredicateId| bits & (1 << id) != 0;
            assert_eq!(e.negate().eval(&value), !e.eval(&value));
            assert_eq!(e.nnf().eval(&value), e.eval(&value));
        }
    }

    #[test]
    fn test_choice_normalisation() {
        let rhs = Expression::Deterministic(p(3));
        assert_eq!(rhs.as_choice(), (p(3), Expr::not(p(3))));
        let always = Expression::always();
        assert_eq!(always.as_choice(), (Expr::true_(), Expr::false_()));
        insta::assert_snapshot!(
            Expression::Choice(p(0), Expr::not(p(0))).to_string(),
            @"choice(0, ~0)"
        );
    }

    #[test]
    fn test_status_display() {
        assert_eq!(Status::Unknown.to_string(), "unknown");
        assert_eq!(Status::True.to_string(), "true");
    }
}
