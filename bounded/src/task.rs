// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! Assembly of the per-timestep formulas of a checking task: the initial
//! state, the transition relation and the property.
//!
//! Liveness is checked by searching for a lasso. At some step the state is
//! recorded (`re`) into shadow copies of the tracked atoms; the property
//! holds at step `t` when a recording was made (`rd`), the state at `t`
//! equals the recorded one, and no progress (`lv`) was made in between.
//! With fairness every process must also have moved (`fr`) inside the loop.

use crate::{encode::*, formula::*};
use cfgs::{
    config::{Combinator, Configuration, PropertyKind},
    model::Cfgs,
    syntax::Status,
};

/// Builds the formulas for one model and one configuration.
pub struct TaskBuilder<'a> {
    cfgs: &'a Cfgs,
    config: &'a Configuration,
    templates: Vec<TemplateTransition>,
    tracked: Vec<Var>,
}

fn var(v: Var) -> Formula {
    Formula::var(v)
}

impl<'a> TaskBuilder<'a> {
    /// Encode the model's transitions once.
    pub fn new(cfgs: &'a Cfgs, config: &'a Configuration) -> Self {
        TaskBuilder {
            cfgs,
            config,
            templates: encode_template_transitions(cfgs),
            tracked: tracked_atoms(cfgs),
        }
    }

    /// The initial state at step 0: every process at location 0 and every
    /// predicate at its initial value.
    pub fn init(&self) -> Formula {
        let liveness = self.config.is_liveness();
        let mut over = vec![];
        for p in &self.cfgs.processes {
            over.push(enc_location(self.cfgs, p.id, 0, 0));
            if liveness {
                over.push(enc_location_copy(self.cfgs, p.id, 0, 0));
                if self.config.fairness {
                    over.push(Formula::not(var(Var::Fair {
                        process: p.id,
                        step: 0,
                    })));
                }
            }
        }
        for (id, name) in self.cfgs.predicates_by_id() {
            let status = if self.cfgs.initial_value(name) {
                Status::True
            } else {
                Status::False
            };
            over.push(enc_status(id, status, 0, false));
            if liveness {
                over.push(enc_status(id, status, 0, true));
            }
        }
        if liveness {
            over.push(Formula::not(var(Var::Recorded { step: 0 })));
            over.push(Formula::not(var(Var::Progress { step: 0 })));
        }
        Formula::and(over)
    }

    /// The location condition of the processes under test at step `t`.
    pub fn progress(&self, t: usize) -> Formula {
        let at_target = self
            .config
            .processes
            .iter()
            .map(|p| enc_location(self.cfgs, *p, self.config.location, t));
        match self.config.combinator {
            Combinator::All => Formula::and(at_target),
            Combinator::Any => Formula::or(at_target),
        }
    }

    /// Bookkeeping of the liveness loop from step `t` to `t + 1`.
    pub fn enc_state_recording(&self, t: usize) -> Formula {
        let re = var(Var::Record { step: t });
        let rd = var(Var::Recorded { step: t });
        let recording_now = Formula::and([re.clone(), Formula::not(rd.clone())]);
        let recording = Formula::or([re, rd]);

        let mut over = vec![Formula::iff(
            var(Var::Recorded { step: t + 1 }),
            recording.clone(),
        )];
        for atom in &self.tracked {
            let now = atom.shift(t);
            over.push(Formula::iff(
                var(now.shadowed().shift(1)),
                Formula::and([
                    Formula::implies(recording_now.clone(), var(now)),
                    Formula::implies(Formula::not(recording_now.clone()), var(now.shadowed())),
                ]),
            ));
        }
        over.push(Formula::iff(
            var(Var::Progress { step: t + 1 }),
            Formula::or([
                var(Var::Progress { step: t }),
                Formula::and([recording, self.progress(t)]),
            ]),
        ));
        Formula::and(over)
    }

    fn fairness_constraint(&self, parent: usize, t: usize) -> Formula {
        Formula::and(self.cfgs.processes.iter().map(|q| {
            let next = var(Var::Fair {
                process: q.id,
                step: t + 1,
            });
            if q.id == parent {
                Formula::iff(
                    next,
                    Formula::or([var(Var::Record { step: t }), var(Var::Recorded { step: t })]),
                )
            } else {
                Formula::iff(
                    next,
                    var(Var::Fair {
                        process: q.id,
                        step: t,
                    }),
                )
            }
        }))
    }

    /// Every transition the system can take from step `t` to `t + 1`.
    pub fn cfg_as_formula(&self, t: usize) -> Formula {
        let fair = self.config.is_liveness() && self.config.fairness;
        let transitions = Formula::or(self.templates.iter().map(|tr| {
            if fair {
                Formula::and([tr.instantiate(t), self.fairness_constraint(tr.parent, t)])
            } else {
                tr.instantiate(t)
            }
        }));
        if self.config.is_liveness() {
            Formula::and([transitions, self.enc_state_recording(t)])
        } else {
            transitions
        }
    }

    /// The property violation at step `t`.
    pub fn property_formula(&self, t: usize) -> Formula {
        match self.config.property {
            PropertyKind::Reachability => self.progress(t),
            PropertyKind::Liveness => {
                let mut over = vec![var(Var::Recorded { step: t })];
                for atom in &self.tracked {
                    let now = atom.shift(t);
                    over.push(Formula::iff(var(now), var(now.shadowed())));
                }
                over.push(Formula::not(var(Var::Progress { step: t })));
                if self.config.fairness {
                    over.extend(self.cfgs.processes.iter().map(|p| {
                        var(Var::Fair {
                            process: p.id,
                            step: t,
                        })
                    }));
                }
                Formula::and(over)
            }
        }
    }
}
