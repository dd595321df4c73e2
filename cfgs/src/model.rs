// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! The CFGS data model.

use crate::syntax::*;
use serde::Serialize;
use std::collections::BTreeMap;

/// Map from predicate names to their ids.
pub type PredicateMap = BTreeMap<String, PredicateId>;

/// The number of bits needed to name `locations` locations in binary. At
/// least one bit is always used, even for a single location.
pub fn digit_required(locations: usize) -> usize {
    if locations <= 1 {
        return 1;
    }
    (usize::BITS - (locations - 1).leading_zeros()) as usize
}

/// An assignment of an expression to a predicate.
#[derive(PartialEq, Eq, Clone, Debug, Serialize)]
pub struct Assignment {
    /// The predicate being assigned
    pub predicate: PredicateId,
    /// The value assigned to it
    pub rhs: Expression,
}

/// An edge of a process's control-flow graph.
#[derive(PartialEq, Eq, Clone, Debug, Serialize)]
pub struct Transition {
    /// Location the edge leaves
    pub source: usize,
    /// Location the edge enters
    pub destination: usize,
    /// Condition under which the edge may be taken
    pub guard: Expression,
    /// Predicate updates performed by the edge
    pub assignments: Vec<Assignment>,
}

/// A single process: a finite-location automaton.
#[derive(PartialEq, Eq, Clone, Debug, Serialize)]
pub struct Process {
    /// Index of this process in the [`Cfgs`]
    pub id: usize,
    /// The edges of the process's control-flow graph
    pub transitions: Vec<Transition>,
}

impl Process {
    /// The number of locations of this process, inferred from its transitions.
    pub fn number_of_locations(&self) -> usize {
        self.transitions
            .iter()
            .map(|tr| tr.source.max(tr.destination))
            .max()
            .map_or(1, |max| max + 1)
    }

    /// The number of bits used to encode this process's locations.
    pub fn digits(&self) -> usize {
        digit_required(self.number_of_locations())
    }
}

/// A control-flow-graph system.
#[derive(PartialEq, Eq, Clone, Debug, Default, Serialize)]
pub struct Cfgs {
    /// Predicate names and their ids
    pub predicates: PredicateMap,
    /// Initial values of predicates by name; absent predicates start true
    pub init: BTreeMap<String, bool>,
    /// The processes of the system
    pub processes: Vec<Process>,
}

impl Cfgs {
    /// All predicates as `(id, name)`, ordered by id.
    pub fn predicates_by_id(&self) -> Vec<(PredicateId, &str)> {
        let mut ps: Vec<_> = self
            .predicates
            .iter()
            .map(|(name, id)| (*id, name.as_str()))
            .collect();
        ps.sort();
        ps
    }

    /// All predicate ids, in increasing order.
    pub fn predicate_ids(&self) -> Vec<PredicateId> {
        self.predicates_by_id().into_iter().map(|(id, _)| id).collect()
    }

    /// The id of the predicate with the given name.
    pub fn predicate_id(&self, name: &str) -> Option<PredicateId> {
        self.predicates.get(name).copied()
    }

    /// The name of the predicate with the given id.
    pub fn predicate_name(&self, id: PredicateId) -> Option<&str> {
        self.predicates
            .iter()
            .find(|(_, i)| **i == id)
            .map(|(name, _)| name.as_str())
    }

    /// The initial value of a predicate (true unless configured otherwise).
    pub fn initial_value(&self, name: &str) -> bool {
        self.init.get(name).copied().unwrap_or(true)
    }

    /// The number of bits used to encode the locations of process `process`.
    pub fn digits(&self, process: usize) -> usize {
        self.processes[process].digits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(source: usize, destination: usize) -> Transition {
        Transition {
            source,
            destination,
            guard: Expression::always(),
            assignments: vec![],
        }
    }

    #[test]
    fn test_digit_required() {
        assert_eq!(digit_required(0), 1);
        assert_eq!(digit_required(1), 1);
        for k in 1..12 {
            assert_eq!(digit_required(1 << k), k);
        }
        assert_eq!(digit_required(3), 2);
        assert_eq!(digit_required(5), 3);
        assert_eq!(digit_required(9), 4);
        for n in 1..300 {
            assert!(digit_required(n) <= digit_required(n + 1));
            assert!(n <= 1 << digit_required(n), "{n} locations don't fit");
        }
    }

    #[test]
    fn test_number_of_locations() {
        let p = Process {
            id: 0,
            transitions: vec![],
        };
        assert_eq!(p.number_of_locations(), 1);

        // the largest location may appear only as a destination
        let p = Process {
            id: 0,
            transitions: vec![edge(0, 1), edge(1, 4), edge(2, 0)],
        };
        assert_eq!(p.number_of_locations(), 5);
        assert_eq!(p.digits(), 3);
    }

    #[test]
    fn test_predicate_lookup() {
        let cfgs = Cfgs {
            predicates: PredicateMap::from([("b".to_string(), 1), ("a".to_string(), 0)]),
            init: BTreeMap::from([("b".to_string(), false)]),
            processes: vec![],
        };
        assert_eq!(cfgs.predicates_by_id(), vec![(0, "a"), (1, "b")]);
        assert_eq!(cfgs.predicate_name(1), Some("b"));
        assert_eq!(cfgs.predicate_id("a"), Some(0));
        assert!(cfgs.initial_value("a"));
        assert!(!cfgs.initial_value("b"));
    }
}
