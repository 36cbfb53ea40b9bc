/*!
Orchestrates the full pipeline: validate configuration, ground, optionally simplify with unit
propagation, sample marginals with MC-SAT, and emit per-atom results alongside the counters
enumerated in §6.

Everything this module does is a straight sequence of phases (§5): grounding, then unit
propagation, then sampling, each running to completion (or to a [`Deadline`]) before the next
begins. Output formatting, file I/O, and CLI wiring are explicitly out of scope (§1) — callers
get back typed [`AtomMarginal`] values and format them however their surface needs.
*/

use std::collections::HashMap;
use std::time::Instant;

use crate::config::Config;
use crate::error::ErrorKind;
use crate::ground_store::{ClauseTemplate, GroundStore};
use crate::grounder::Grounder;
use crate::metrics::Metrics;
use crate::mrf::Mrf;
use crate::sampler::mcsat;
use crate::structures::atom::{AtomId, ConstantId};
use crate::structures::predicate::{Predicate, PredicateId};
use crate::timer::Deadline;
use crate::unit_propagator;
use crate::unit_solver::UnitSolver;

/// A single ground atom's inferred marginal probability, labeled by the predicate and
/// constants it was grounded from (not by any atom-print-form string — that formatting is a
/// caller concern).
#[derive(Clone, Debug, PartialEq)]
pub struct AtomMarginal {
    pub atom: AtomId,
    pub predicate: PredicateId,
    pub terms: Vec<ConstantId>,
    /// `n_true / N` for a query atom; `1.0` or `0.0` for an atom fixed by evidence or pinned
    /// by unit propagation.
    pub probability: f64,
}

/// Everything a driver run produces: every atom's marginal plus the summary counters of §6.
#[derive(Clone, Debug)]
pub struct InferenceOutcome {
    pub marginals: Vec<AtomMarginal>,
    pub metrics: Metrics,
}

/// Orchestrates grounding → (optional) unit propagation → MC-SAT sampling → marginals.
pub struct InferenceDriver {
    config: Config,
}

impl InferenceDriver {
    pub fn new(config: Config) -> Self {
        InferenceDriver { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Runs the full pipeline against `store`, using `unit_solver` for iterative unit
    /// propagation during grounding (§4.2) if configured. `seed` is split deterministically
    /// (see [`crate::rng`]) into every phase's independent RNG stream.
    pub fn run<S: GroundStore, U: UnitSolver>(
        &self,
        predicates: Vec<Predicate>,
        templates: Vec<ClauseTemplate>,
        store: &mut S,
        unit_solver: &U,
        seed: u64,
        deadline: Deadline,
    ) -> Result<InferenceOutcome, ErrorKind> {
        self.config.validate()?;

        let mut metrics = Metrics::new();

        let grounding_started = Instant::now();
        let grounder = Grounder::new(predicates, templates, &self.config);
        let grounding = match grounder.ground(store, unit_solver) {
            Ok(g) => g,
            Err(e) => {
                log::error!(target: crate::log_targets::DRIVER, "grounding failed: {e:?}");
                return Err(e);
            }
        };
        metrics.grounding_time_ms = grounding_started.elapsed().as_millis() as u64;
        metrics.number_ground_atoms = grounding.atoms.len();
        metrics.number_ground_clauses = grounding.clauses.len();
        metrics.number_units = grounding.number_units;
        metrics.unit_solver_time_ms = grounding.unit_solver_time_ms;

        // Atoms removed by unit propagation below still need their predicate/terms for the
        // final output, so snapshot that metadata before the `Mrf` that owns it is consumed.
        let atom_meta: HashMap<AtomId, (PredicateId, Vec<ConstantId>)> = grounding
            .atoms
            .iter()
            .map(|a| (a.id, (a.predicate, a.terms.clone())))
            .collect();

        let mrf = Mrf::new(grounding.atoms, grounding.clauses);

        let (mut mrf, pinned) = if self.config.unit_propagate {
            match unit_propagator::propagate(mrf, self.config.hard_weight.value) {
                Ok(outcome) => {
                    metrics.number_units += outcome.pinned.len();
                    (outcome.mrf, outcome.pinned)
                }
                Err(e) => {
                    log::error!(
                        target: crate::log_targets::DRIVER,
                        "unit propagation found a hard contradiction at atom {}: {e:?}",
                        e_atom(&e)
                    );
                    return Err(e.into());
                }
            }
        } else {
            (mrf, HashMap::new())
        };

        let mcsat_outcome = mcsat::run(&mut mrf, &self.config, seed, &deadline, &mut metrics);
        metrics.number_samples_at_timeout =
            self.config.mcsat_samples.value.saturating_sub(mcsat_outcome.samples_drawn);
        if mcsat_outcome.timed_out {
            metrics.number_clauses_at_timeout = mrf.num_clauses();
        }

        let mut marginals = Vec::with_capacity(mrf.num_atoms() + pinned.len());

        for (&atom, &value) in &pinned {
            let (predicate, terms) = atom_meta
                .get(&atom)
                .cloned()
                .unwrap_or((0, Vec::new()));
            marginals.push(AtomMarginal {
                atom,
                predicate,
                terms,
                probability: if value { 1.0 } else { 0.0 },
            });
        }

        let samples = mcsat_outcome.samples_drawn.max(1) as f64;
        for (idx, ground_atom) in mrf.atoms().iter().enumerate() {
            let probability = if ground_atom.is_immutable_club() {
                if ground_atom.truth { 1.0 } else { 0.0 }
            } else if mcsat_outcome.samples_drawn == 0 {
                if ground_atom.truth { 1.0 } else { 0.0 }
            } else {
                mcsat_outcome.n_true[idx] as f64 / samples
            };

            marginals.push(AtomMarginal {
                atom: ground_atom.id,
                predicate: ground_atom.predicate,
                terms: ground_atom.terms.clone(),
                probability,
            });
        }

        Ok(InferenceOutcome { marginals, metrics })
    }
}

fn e_atom(e: &ErrorKind) -> AtomId {
    match e {
        ErrorKind::Propagation(crate::error::PropagationError::Unsat { atom, .. }) => *atom,
        _ => 0,
    }
}
