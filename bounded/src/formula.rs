// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! Propositional formulas over timestamped state atoms.

use cfgs::syntax::PredicateId;
use itertools::Itertools;
use serde::Serialize;
use std::{collections::BTreeSet, collections::HashSet, fmt};

/// Which of the two bits encoding a three-valued predicate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum PredicateBit {
    /// Set when the predicate's value is unknown
    Unknown,
    /// The predicate's value when it is known
    Truth,
}

/// A propositional atom.
///
/// Every atom except [`Var::Wildcard`] belongs to a timestep. `shadow`
/// atoms hold the copy of the state recorded by liveness checking.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[allow(missing_docs)]
pub enum Var {
    /// Bit `bit` (0 is the most significant) of the location of `process`
    Location {
        process: usize,
        bit: usize,
        step: usize,
        shadow: bool,
    },
    /// One bit of a predicate's three-valued status
    Predicate {
        predicate: PredicateId,
        bit: PredicateBit,
        step: usize,
        shadow: bool,
    },
    /// The state at this step is recorded (`re`)
    Record { step: usize },
    /// A state has been recorded at an earlier step (`rd`)
    Recorded { step: usize },
    /// Progress was made since the recording (`lv`)
    Progress { step: usize },
    /// `process` has moved since the recording (`fr`)
    Fair { process: usize, step: usize },
    /// Whether unknown predicates may be read as either value (`unknown`)
    Wildcard,
}

impl Var {
    /// The timestep of this atom, if it has one.
    pub fn step(&self) -> Option<usize> {
        match self {
            Var::Location { step, .. }
            | Var::Predicate { step, .. }
            | Var::Record { step }
            | Var::Recorded { step }
            | Var::Progress { step }
            | Var::Fair { step, .. } => Some(*step),
            Var::Wildcard => None,
        }
    }

    /// This atom moved `by` timesteps into the future.
    pub fn shift(self, by: usize) -> Var {
        match self {
            Var::Location {
                process,
                bit,
                step,
                shadow,
            } => Var::Location {
                process,
                bit,
                step: step + by,
                shadow,
            },
            Var::Predicate {
                predicate,
                bit,
                step,
                shadow,
            } => Var::Predicate {
                predicate,
                bit,
                step: step + by,
                shadow,
            },
            Var::Record { step } => Var::Record { step: step + by },
            Var::Recorded { step } => Var::Recorded { step: step + by },
            Var::Progress { step } => Var::Progress { step: step + by },
            Var::Fair { process, step } => Var::Fair {
                process,
                step: step + by,
            },
            Var::Wildcard => Var::Wildcard,
        }
    }

    /// The shadow copy of a location or predicate atom; other atoms have no
    /// copy and are returned unchanged.
    pub fn shadowed(self) -> Var {
        match self {
            Var::Location {
                process, bit, step, ..
            } => Var::Location {
                process,
                bit,
                step,
                shadow: true,
            },
            Var::Predicate {
                predicate,
                bit,
                step,
                ..
            } => Var::Predicate {
                predicate,
                bit,
                step,
                shadow: true,
            },
            v => v,
        }
    }
}

impl fmt::Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let copy = |shadow: &bool| if *shadow { "_c" } else { "" };
        match self {
            Var::Location {
                process,
                bit,
                step,
                shadow,
            } => write!(f, "n_{step}_{process}_{bit}{}", copy(shadow)),
            Var::Predicate {
                predicate,
                bit,
                step,
                shadow,
            } => {
                let b = match bit {
                    PredicateBit::Unknown => "u",
                    PredicateBit::Truth => "t",
                };
                write!(f, "{predicate}_{step}_{b}{}", copy(shadow))
            }
            Var::Record { step } => write!(f, "re_{step}"),
            Var::Recorded { step } => write!(f, "rd_{step}"),
            Var::Progress { step } => write!(f, "lv_{step}"),
            Var::Fair { process, step } => write!(f, "fr_{step}_{process}"),
            Var::Wildcard => write!(f, "unknown"),
        }
    }
}

/// A propositional formula. True is the empty `And`; false is the empty `Or`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum Formula {
    Var(Var),
    Not(Box<Formula>),
    And(Vec<Formula>),
    Or(Vec<Formula>),
}

impl Formula {
    /// A positive occurrence of an atom
    pub fn var(v: Var) -> Formula {
        Formula::Var(v)
    }

    /// The constant true
    pub fn true_() -> Formula {
        Formula::And(vec![])
    }

    /// The constant false
    pub fn false_() -> Formula {
        Formula::Or(vec![])
    }

    /// The constant `b`
    pub fn constant(b: bool) -> Formula {
        if b {
            Formula::true_()
        } else {
            Formula::false_()
        }
    }

    /// Negation, folding constants and double negations.
    #[allow(clippy::should_implement_trait)]
    pub fn not(f: Formula) -> Formula {
        match f {
            Formula::Not(f) => *f,
            Formula::And(vec) if vec.is_empty() => Formula::false_(),
            Formula::Or(vec) if vec.is_empty() => Formula::true_(),
            f => Formula::Not(Box::new(f)),
        }
    }

    /// Conjunction, flattening nested conjunctions and folding constants.
    pub fn and<I: IntoIterator<Item = Formula>>(fs: I) -> Formula {
        let mut flat = vec![];
        for f in fs {
            match f {
                Formula::And(inner) => flat.extend(inner),
                Formula::Or(inner) if inner.is_empty() => return Formula::false_(),
                f => flat.push(f),
            }
        }
        if flat.len() == 1 {
            flat.remove(0)
        } else {
            Formula::And(flat)
        }
    }

    /// Disjunction, flattening nested disjunctions and folding constants.
    pub fn or<I: IntoIterator<Item = Formula>>(fs: I) -> Formula {
        let mut flat = vec![];
        for f in fs {
            match f {
                Formula::Or(inner) => flat.extend(inner),
                Formula::And(inner) if inner.is_empty() => return Formula::true_(),
                f => flat.push(f),
            }
        }
        if flat.len() == 1 {
            flat.remove(0)
        } else {
            Formula::Or(flat)
        }
    }

    /// `x <=> y`
    pub fn iff(x: Formula, y: Formula) -> Formula {
        Formula::or([
            Formula::and([x.clone(), y.clone()]),
            Formula::and([Formula::not(x), Formula::not(y)]),
        ])
    }

    /// `x => y`
    pub fn implies(x: Formula, y: Formula) -> Formula {
        Formula::or([Formula::not(x), y])
    }

    /// The value of this formula if it doesn't depend on any atom.
    pub fn truth(&self) -> Option<bool> {
        match self {
            Formula::Var(_) => None,
            Formula::And(vec) => vec
                .iter()
                .try_fold(true, |acc, f| match (acc, f.truth()) {
                    (false, _) | (_, Some(false)) => Some(false),
                    (true, x) => x,
                }),
            Formula::Or(vec) => vec
                .iter()
                .try_fold(false, |acc, f| match (acc, f.truth()) {
                    (true, _) | (_, Some(true)) => Some(true),
                    (false, x) => x,
                }),
            Formula::Not(f) => f.truth().map(|b| !b),
        }
    }

    /// Move every timestamped atom `by` steps into the future.
    pub fn shift(&self, by: usize) -> Formula {
        match self {
            Formula::Var(v) => Formula::Var(v.shift(by)),
            Formula::Not(f) => Formula::Not(Box::new(f.shift(by))),
            Formula::And(vec) => Formula::And(vec.iter().map(|f| f.shift(by)).collect()),
            Formula::Or(vec) => Formula::Or(vec.iter().map(|f| f.shift(by)).collect()),
        }
    }

    /// Replace `var` by a constant and simplify.
    pub fn substitute(&self, var: &Var, value: bool) -> Formula {
        match self {
            Formula::Var(v) if v == var => Formula::constant(value),
            Formula::Var(v) => Formula::Var(*v),
            Formula::Not(f) => Formula::not(f.substitute(var, value)),
            Formula::And(vec) => Formula::and(vec.iter().map(|f| f.substitute(var, value))),
            Formula::Or(vec) => Formula::or(vec.iter().map(|f| f.substitute(var, value))),
        }
    }

    /// Evaluate under a full assignment of the atoms.
    #[cfg(test)]
    pub(crate) fn eval(&self, valuation: &Valuation) -> bool {
        match self {
            Formula::Var(v) => valuation.get(v),
            Formula::Not(f) => !f.eval(valuation),
            Formula::And(vec) => vec.iter().all(|f| f.eval(valuation)),
            Formula::Or(vec) => vec.iter().any(|f| f.eval(valuation)),
        }
    }

    /// Every atom mentioned by this formula.
    pub fn vars(&self) -> BTreeSet<Var> {
        fn go(f: &Formula, out: &mut BTreeSet<Var>) {
            match f {
                Formula::Var(v) => {
                    out.insert(*v);
                }
                Formula::Not(f) => go(f, out),
                Formula::And(vec) | Formula::Or(vec) => vec.iter().for_each(|f| go(f, out)),
            }
        }
        let mut out = BTreeSet::new();
        go(self, &mut out);
        out
    }
}

fn precedence(f: &Formula) -> usize {
    match f {
        Formula::Or(vec) | Formula::And(vec) if vec.is_empty() => 1000,
        Formula::Or(_) => 10,
        Formula::And(_) => 20,
        Formula::Not(_) => 30,
        Formula::Var(_) => 1000,
    }
}

fn render(f: &Formula) -> String {
    let operand = |arg: &Formula| {
        let s = render(arg);
        if precedence(arg) <= precedence(f) {
            format!("({s})")
        } else {
            s
        }
    };
    match f {
        Formula::Var(v) => v.to_string(),
        Formula::And(vec) if vec.is_empty() => "$true".to_string(),
        Formula::Or(vec) if vec.is_empty() => "$false".to_string(),
        Formula::Not(arg) => format!("~{}", operand(arg)),
        Formula::And(vec) => vec.iter().map(operand).join(" & "),
        Formula::Or(vec) => vec.iter().map(operand).join(" | "),
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", render(self))
    }
}

/// A satisfying assignment: the set of atoms that are true.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Valuation(HashSet<Var>);

impl Valuation {
    /// Is `v` true?
    pub fn get(&self, v: &Var) -> bool {
        self.0.contains(v)
    }

    /// Make `v` true.
    pub fn insert(&mut self, v: Var) {
        self.0.insert(v);
    }
}

impl FromIterator<Var> for Valuation {
    fn from_iter<T: IntoIterator<Item = Var>>(iter: T) -> Self {
        Valuation(iter.into_iter().collect())
    }
}
