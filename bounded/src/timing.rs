// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! Process-wide timing of the evaluator's SAT queries.

use std::{
    fmt,
    sync::Mutex,
    time::{Duration, Instant},
};

use itertools::Itertools;
use lazy_static::lazy_static;

/// Which of the two per-timestep queries was run.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Phase {
    /// Unknown predicates may resolve either way
    Optimistic,
    /// Unknown predicates resolve to neither value
    Definite,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Optimistic => write!(f, "optimistic"),
            Phase::Definite => write!(f, "definite"),
        }
    }
}

#[derive(Copy, Clone, Debug)]
struct Query {
    phase: Phase,
    sat: bool,
    dur: Duration,
}

/// The queries answered so far, and when the clock started.
pub struct Timings {
    start: Instant,
    queries: Mutex<Vec<Query>>,
}

impl Timings {
    #[allow(clippy::new_without_default)]
    /// An empty record, starting the total clock now.
    pub fn new() -> Self {
        Timings {
            start: Instant::now(),
            queries: Mutex::new(vec![]),
        }
    }

    /// Record a query that began at `start`.
    pub fn record(&self, phase: Phase, sat: bool, start: Instant) {
        let dur = start.elapsed();
        let mut queries = self.queries.lock().unwrap_or_else(|e| e.into_inner());
        queries.push(Query { phase, sat, dur });
    }

    /// Render the report: total time, time inside and outside the solver,
    /// and one line per phase and answer.
    pub fn report(&self) -> String {
        let total = self.start.elapsed().as_secs_f64();
        let queries = self
            .queries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        let in_solver = queries
            .iter()
            .map(|q| q.dur)
            .sum::<Duration>()
            .as_secs_f64();

        let mut lines = vec![
            format!("{:<24}: {total:.3}s", "total"),
            format!(
                "  {:<22}: {in_solver:.3}s {:>5} queries",
                "solver total",
                queries.len()
            ),
        ];
        let by_kind = queries
            .iter()
            .into_grouping_map_by(|q| (q.phase, !q.sat))
            .fold((Duration::ZERO, 0), |(dur, n), _, q| (dur + q.dur, n + 1));
        for ((phase, unsat), (dur, n)) in by_kind.into_iter().sorted() {
            let answer = if unsat { "unsat" } else { "sat" };
            lines.push(format!(
                "    {:<20}: {:.3}s {n:>5} queries",
                format!("{phase} {answer}"),
                dur.as_secs_f64()
            ));
        }
        lines.push(format!(
            "  {:<22}: {:.3}s",
            "outside solver",
            total - in_solver
        ));
        lines.join("\n")
    }
}

lazy_static! {
    /// The timings of this process.
    pub static ref TIMES: Timings = Timings::new();
}

/// Start the total clock.
pub fn init() {
    lazy_static::initialize(&TIMES);
}

/// Record a query of this process that began at `start`.
pub fn record(phase: Phase, sat: bool, start: Instant) {
    TIMES.record(phase, sat, start)
}

/// The timing report of this process.
pub fn report() -> String {
    TIMES.report()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_groups_by_phase_and_answer() {
        let timings = Timings::new();
        let start = Instant::now();
        timings.record(Phase::Optimistic, false, start);
        timings.record(Phase::Optimistic, false, start);
        timings.record(Phase::Optimistic, true, start);
        timings.record(Phase::Definite, true, start);

        let report = timings.report();
        let lines: Vec<_> = report.lines().map(str::trim_start).collect();
        assert_eq!(lines.len(), 6);
        assert!(lines[1].starts_with("solver total"));
        assert!(lines[1].ends_with("4 queries"));
        assert!(lines[2].starts_with("optimistic sat"));
        assert!(lines[2].ends_with("1 queries"));
        assert!(lines[3].starts_with("optimistic unsat"));
        assert!(lines[3].ends_with("2 queries"));
        assert!(lines[4].starts_with("definite sat"));
        assert!(lines[5].starts_with("outside solver"));
        assert!(!report.contains("definite unsat"));
    }
}
