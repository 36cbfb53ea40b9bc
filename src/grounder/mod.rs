/*!
Drives the closure of active atoms and ground clauses.

A [`Grounder`] repeatedly asks a [`GroundStore`] to join clause templates against its
evidence, decides which resulting atoms are worth tracking (those whose truth isn't already
fixed by evidence), and — for hard templates, when configured — consults a [`UnitSolver`]
between templates so later joins see whatever it just forced. Once every template has been
ground, key-constraint and soft-evidence clauses are appended and the whole batch is
consolidated into the final [`GClause`] list a [`Mrf`](crate::mrf::Mrf) is built from.

Unlike the join itself, which a production `GroundStore` would scope to avoid enumerating an
unbounded Herbrand base, this crate's [`InMemoryGroundStore`](crate::ground_store::InMemoryGroundStore)
only ever joins over its own registered (and therefore already finite) universe. Because of
that, a single ordered pass over every template — rather than the iterate-until-no-predicate-
changed loop a truly unbounded join would require — already produces the same active sets and
the same final clause set: activation depends only on whether an atom's truth happens to be
fixed yet, never on another atom having just been activated.
*/

use std::collections::HashMap;
use std::time::Instant;

use crate::config::Config;
use crate::error::{ErrorKind, GroundingError};
use crate::ground_store::{ClauseTemplate, GroundStore, Sense};
use crate::structures::atom::{AtomId, Club, GroundAtom, Literal};
use crate::structures::clause::{BuildOutcome, GClause};
use crate::structures::predicate::{Predicate, PredicateId};
use crate::unit_solver::{Cnf, UnitSolver};

/// Everything a [`Mrf`](crate::mrf::Mrf) needs, plus the counters a driver reports alongside
/// it.
pub struct GroundingOutcome {
    pub atoms: Vec<GroundAtom>,
    pub clauses: Vec<GClause>,
    /// Units derived via iterative unit propagation during grounding.
    pub number_units: usize,
    /// Total wall-clock time spent inside [`UnitSolver::units`](crate::unit_solver::UnitSolver::units)
    /// calls during IUP, in milliseconds.
    pub unit_solver_time_ms: u64,
}

/// Grounds a fixed set of clause templates against a [`GroundStore`], producing the atom and
/// clause arenas a [`Mrf`](crate::mrf::Mrf) is built from.
pub struct Grounder {
    predicates: Vec<Predicate>,
    templates: Vec<ClauseTemplate>,
    hard_weight: f64,
    iterative_unit_propagate: bool,
    mark_all_atoms_active: bool,
    soft_evidence_activation_threshold: f64,
    key_constraint_allows_null_label: bool,
    clause_count_ceiling: usize,
}

impl Grounder {
    pub fn new(predicates: Vec<Predicate>, templates: Vec<ClauseTemplate>, config: &Config) -> Self {
        Grounder {
            predicates,
            templates,
            hard_weight: config.hard_weight.value,
            iterative_unit_propagate: config.iterative_unit_propagate,
            mark_all_atoms_active: config.mark_all_atoms_active,
            soft_evidence_activation_threshold: config.soft_evidence_activation_threshold.value,
            key_constraint_allows_null_label: config.key_constraint_allows_null_label,
            clause_count_ceiling: config.clause_count_ceiling.value,
        }
    }

    /// Grounds every template, derives key-constraint and soft-evidence clauses, consolidates
    /// duplicates, and returns the resulting atom and clause arenas.
    pub fn ground<S: GroundStore, U: UnitSolver>(
        &self,
        store: &mut S,
        unit_solver: &U,
    ) -> Result<GroundingOutcome, ErrorKind> {
        self.seed_active_atoms(store);

        let mut ordered: Vec<&ClauseTemplate> = self.templates.iter().collect();
        ordered.sort_by_key(|t| !t.is_hard(self.hard_weight));

        let mut raw_clauses: Vec<GClause> = Vec::new();
        let mut number_units = 0usize;
        let mut unit_solver_time_ms = 0u64;

        for template in ordered {
            self.ground_template(template, store, &mut raw_clauses)?;

            if template.is_hard(self.hard_weight) && self.iterative_unit_propagate {
                let started = Instant::now();
                let derived = self.propagate_hard_units(&raw_clauses, store, unit_solver)?;
                unit_solver_time_ms += started.elapsed().as_millis() as u64;
                number_units += derived;
            }
        }

        self.emit_key_constraints(store, &mut raw_clauses)?;
        self.emit_soft_evidence(store, &mut raw_clauses)?;

        let clauses = consolidate(raw_clauses);
        let (atoms, remap) = self.materialize_atoms(store, &clauses);
        let clauses = remap_clauses(clauses, &remap);

        Ok(GroundingOutcome { atoms, clauses, number_units, unit_solver_time_ms })
    }

    fn seed_active_atoms<S: GroundStore>(&self, store: &mut S) {
        for predicate in &self.predicates {
            let mut to_activate = Vec::new();
            for atom in store.atoms_of(predicate.id) {
                if store.truth_of(atom).is_some() {
                    continue;
                }
                let seed_by_prior = predicate.has_soft_evidence
                    && store.prior_of(atom).is_some_and(|p| p > self.soft_evidence_activation_threshold);
                if self.mark_all_atoms_active || seed_by_prior {
                    to_activate.push(atom);
                }
            }
            if !to_activate.is_empty() {
                store.activate_atoms(predicate.id, &to_activate);
            }
        }
    }

    fn ground_template<S: GroundStore>(
        &self,
        template: &ClauseTemplate,
        store: &mut S,
        raw_clauses: &mut Vec<GClause>,
    ) -> Result<(), ErrorKind> {
        let groundings = store.ground_clause(template, Sense::Positive);

        for tuple in groundings {
            if tuple.iter().any(|raw| Literal::from_raw(*raw).is_sentinel()) {
                continue;
            }

            let mut to_activate: HashMap<PredicateId, Vec<AtomId>> = HashMap::new();
            let lits: Vec<Literal> = tuple.iter().map(|raw| Literal::from_raw(*raw)).collect();

            for lit in &lits {
                let atom = lit.atom();
                if store.truth_of(atom).is_none() {
                    to_activate.entry(store.predicate_of(atom)).or_default().push(atom);
                }
            }
            for (predicate, atoms) in to_activate {
                store.activate_atoms(predicate, &atoms);
            }

            match GClause::build(lits, template.weight) {
                BuildOutcome::Clause(clause) => {
                    raw_clauses.push(clause);
                    if raw_clauses.len() > self.clause_count_ceiling {
                        return Err(GroundingError::Oversize {
                            clauses_at_abort: raw_clauses.len(),
                            ceiling: self.clause_count_ceiling,
                        }
                        .into());
                    }
                }
                BuildOutcome::Tautology => {}
                BuildOutcome::Empty if template.is_hard(self.hard_weight) => {
                    return Err(GroundingError::Unsat.into());
                }
                BuildOutcome::Empty => {}
            }
        }

        Ok(())
    }

    /// Hands every hard clause ground so far to `unit_solver`, and folds every newly derived
    /// literal back into the store as evidence. Returns the number of atoms newly pinned.
    fn propagate_hard_units<S: GroundStore, U: UnitSolver>(
        &self,
        raw_clauses: &[GClause],
        store: &mut S,
        unit_solver: &U,
    ) -> Result<usize, ErrorKind> {
        let hard: Vec<&GClause> = raw_clauses.iter().filter(|c| c.is_hard(self.hard_weight)).collect();
        let max_atom = hard.iter().flat_map(|c| c.lits().iter().map(|l| l.atom())).max().unwrap_or(0);

        let mut cnf = Cnf::new(max_atom as usize);
        for clause in &hard {
            cnf.push_clause(clause.lits().to_vec());
        }

        let units = match unit_solver.units(&cnf) {
            Ok(units) => units,
            Err(e) => {
                log::warn!(target: crate::log_targets::GROUNDING, "unit solver step skipped: {e:?}");
                return Ok(0);
            }
        };

        let mut newly_derived = 0;
        for lit in units {
            let atom = lit.atom();
            if store.truth_of(atom).is_none() {
                store.set_truth(atom, lit.polarity());
                newly_derived += 1;
            }
        }
        Ok(newly_derived)
    }

    fn emit_key_constraints<S: GroundStore>(
        &self,
        store: &S,
        raw_clauses: &mut Vec<GClause>,
    ) -> Result<(), ErrorKind> {
        for predicate in &self.predicates {
            if !predicate.has_key_constraint() {
                continue;
            }

            let mut groups: HashMap<Vec<u32>, Vec<AtomId>> = HashMap::new();
            for atom in store.atoms_of(predicate.id) {
                let terms = store.terms_of(atom);
                let key: Vec<u32> = predicate.key_attrs.iter().map(|&pos| terms[pos]).collect();
                groups.entry(key).or_default().push(atom);
            }

            for members in groups.values() {
                for i in 0..members.len() {
                    for j in (i + 1)..members.len() {
                        let (a, b) = (members[i], members[j]);
                        let terms_a = store.terms_of(a);
                        let terms_b = store.terms_of(b);
                        let disagree = predicate
                            .dependent_attrs
                            .iter()
                            .any(|&pos| terms_a[pos] != terms_b[pos]);
                        if !disagree {
                            continue;
                        }
                        let lits = vec![Literal::new(a, false), Literal::new(b, false)];
                        if let BuildOutcome::Clause(c) = GClause::build(lits, self.hard_weight) {
                            raw_clauses.push(c);
                        }
                    }
                }

                if !self.key_constraint_allows_null_label && members.len() > 1 {
                    let lits: Vec<Literal> =
                        members.iter().map(|&a| Literal::new(a, true)).collect();
                    if let BuildOutcome::Clause(c) = GClause::build(lits, self.hard_weight) {
                        raw_clauses.push(c);
                    }
                }
            }
        }
        Ok(())
    }

    fn emit_soft_evidence<S: GroundStore>(
        &self,
        store: &S,
        raw_clauses: &mut Vec<GClause>,
    ) -> Result<(), ErrorKind> {
        for predicate in &self.predicates {
            if !predicate.has_soft_evidence {
                continue;
            }
            for atom in store.atoms_of(predicate.id) {
                let Some(prior) = store.prior_of(atom) else { continue };
                let weight = if prior >= 1.0 {
                    self.hard_weight
                } else if prior <= 0.0 {
                    -self.hard_weight
                } else {
                    (prior / (1.0 - prior)).ln()
                };
                if let BuildOutcome::Clause(c) = GClause::build(vec![Literal::new(atom, true)], weight) {
                    raw_clauses.push(c);
                }
            }
        }
        Ok(())
    }

    /// Builds the dense, 1-based atom arena a [`Mrf`](crate::mrf::Mrf) indexes by, and the
    /// old-id-to-new-id map [`remap_clauses`] needs to rewrite clause literals accordingly.
    fn materialize_atoms<S: GroundStore>(
        &self,
        store: &S,
        clauses: &[GClause],
    ) -> (Vec<GroundAtom>, HashMap<AtomId, AtomId>) {
        let mut referenced: Vec<AtomId> =
            clauses.iter().flat_map(|c| c.lits().iter().map(|l| l.atom())).collect();
        referenced.sort_unstable();
        referenced.dedup();

        let remap: HashMap<AtomId, AtomId> = referenced
            .iter()
            .enumerate()
            .map(|(i, &old_id)| (old_id, (i + 1) as AtomId))
            .collect();

        let atoms = referenced
            .into_iter()
            .map(|old_id| {
                let new_id = remap[&old_id];
                let predicate = store.predicate_of(old_id);
                let terms = store.terms_of(old_id);
                let truth = store.truth_of(old_id);
                let club = if truth.is_some() { Club::EvidFixed } else { Club::Query };

                let mut atom = GroundAtom::new(new_id, predicate, terms, club);
                atom.truth = truth.unwrap_or(false);
                atom.prior = store.prior_of(old_id);
                atom.is_active = true;
                atom
            })
            .collect();

        (atoms, remap)
    }
}

/// Groups clauses by their exact literal set, summing weights and dropping any group that
/// cancels to zero.
fn consolidate(raw_clauses: Vec<GClause>) -> Vec<GClause> {
    let mut groups: HashMap<Vec<Literal>, f64> = HashMap::new();
    let mut order: Vec<Vec<Literal>> = Vec::new();

    for clause in raw_clauses {
        let key = clause.grouping_key();
        if !groups.contains_key(&key) {
            order.push(key.clone());
        }
        *groups.entry(key).or_insert(0.0) += clause.weight;
    }

    order
        .into_iter()
        .filter_map(|lits| {
            let weight = groups[&lits];
            GClause::with_consolidated_weight(lits, weight)
        })
        .collect()
}

/// Rewrites every clause's literals through the old-id-to-new-id map
/// [`Grounder::materialize_atoms`] produced. Preserves literal order: the map is monotonic in
/// the original atom id, and clause literals were already sorted by it.
fn remap_clauses(clauses: Vec<GClause>, remap: &HashMap<AtomId, AtomId>) -> Vec<GClause> {
    clauses
        .into_iter()
        .map(|clause| {
            let new_lits: Vec<Literal> = clause
                .lits()
                .iter()
                .map(|l| Literal::new(remap[&l.atom()], l.polarity()))
                .collect();
            GClause::with_consolidated_weight(new_lits, clause.weight)
                .expect("weight preserved from an already-nonzero clause")
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ground_store::{InMemoryGroundStore, TemplateLiteral};
    use crate::unit_solver::PlainUnitPropagationSolver;

    #[test]
    fn closure_is_minimal_over_a_simple_implication() {
        let mut store = InMemoryGroundStore::new();
        let p = Predicate::new(0, "P", 1);
        let q = Predicate::new(1, "Q", 1);
        store.register_predicate(p.clone());
        store.register_predicate(q.clone());

        for x in 1..=1000u32 {
            let p_atom = store.register_atom(0, vec![x]);
            store.set_evidence(p_atom, true);
            store.register_atom(1, vec![x]);
        }

        let template = ClauseTemplate::new(
            0,
            vec![
                TemplateLiteral::new(0, vec![10], false),
                TemplateLiteral::new(1, vec![10], true),
            ],
            1.0,
        );

        let grounder = Grounder::new(vec![p, q], vec![template], &Config::default());
        let outcome = grounder.ground(&mut store, &PlainUnitPropagationSolver).unwrap();

        assert_eq!(outcome.clauses.len(), 1000);
        assert_eq!(store.active_atoms_of(0).len(), 0);
        assert_eq!(store.active_atoms_of(1).len(), 1000);
    }

    #[test]
    fn key_constraint_forbids_two_true_dependents_for_one_key() {
        let mut store = InMemoryGroundStore::new();
        let mut age = Predicate::new(0, "Age", 2).with_key(vec![0], vec![1]);
        age.has_soft_evidence = false;
        store.register_predicate(age.clone());

        let a1 = store.register_atom(0, vec![1, 30]);
        let a2 = store.register_atom(0, vec![1, 40]);
        store.set_evidence(a1, true);
        store.set_evidence(a2, true);

        let grounder = Grounder::new(vec![age], vec![], &Config::default());
        let outcome = grounder.ground(&mut store, &PlainUnitPropagationSolver).unwrap();

        assert!(outcome.clauses.iter().any(|c| c.is_hard(1e7) && c.lits().len() == 2));
    }

    #[test]
    fn soft_evidence_prior_becomes_a_weighted_unit_clause() {
        let mut store = InMemoryGroundStore::new();
        let smokes = Predicate::new(0, "Smokes", 1).with_soft_evidence();
        store.register_predicate(smokes.clone());
        let atom = store.register_atom(0, vec![1]);
        store.set_prior(atom, 0.75);

        let grounder = Grounder::new(vec![smokes], vec![], &Config::default());
        let outcome = grounder.ground(&mut store, &PlainUnitPropagationSolver).unwrap();

        assert_eq!(outcome.clauses.len(), 1);
        let clause = &outcome.clauses[0];
        assert!(clause.is_unit());
        assert!((clause.weight - (0.75_f64 / 0.25).ln()).abs() < 1e-9);
    }

    #[test]
    fn oversize_grounding_is_rejected() {
        let mut store = InMemoryGroundStore::new();
        let p = Predicate::new(0, "P", 1);
        store.register_predicate(p.clone());
        for x in 1..=5u32 {
            let atom = store.register_atom(0, vec![x]);
            store.set_evidence(atom, true);
        }
        let template =
            ClauseTemplate::new(0, vec![TemplateLiteral::new(0, vec![10], true)], 1e8);

        let mut config = Config::default();
        config.clause_count_ceiling.value = 2;
        let grounder = Grounder::new(vec![p], vec![template], &config);

        let result = grounder.ground(&mut store, &PlainUnitPropagationSolver);
        assert!(matches!(
            result,
            Err(ErrorKind::Grounding(GroundingError::Oversize { .. }))
        ));
    }
}
