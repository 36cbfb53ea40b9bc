/*!
The in-memory Markov Random Field a [`Grounder`](crate::grounder::Grounder) populates and a
[`Sampler`](crate::sampler) searches.

# Ownership

An [`Mrf`] exclusively owns its atom and clause arenas. Incidence is a non-owning
[CSR](https://en.wikipedia.org/wiki/Sparse_matrix#Compressed_sparse_row_(CSR)) index into the
clause arena, built once by [`Mrf::new`] and never restructured in place — clauses a phase
wants to discard are left in their slot as `None` rather than removed, so every atom's
incidence list stays valid without a rebuild.

# Cost model

`cost(σ) = Σ_{c unsatisfied} |c.weight|` is maintained incrementally: each [`Mrf::flip`]
updates the per-clause satisfied-literal counters (`nSat`) for exactly the clauses in the
flipped atom's incidence list, and folds the resulting change into the running [`Mrf::cost`].
[`Mrf::recompute_cost`] recomputes from scratch and exists so tests can check the two agree.
*/

use std::collections::HashMap;

use crate::structures::atom::{AtomId, GroundAtom, Literal};
use crate::structures::clause::{ClauseId, GClause};

/// Compressed sparse row index: for atom `a` (0-based), its incident clause ids are
/// `flat[offsets[a]..offsets[a + 1]]`.
#[derive(Clone, Debug, Default)]
struct CsrIncidence {
    offsets: Vec<usize>,
    flat: Vec<ClauseId>,
}

impl CsrIncidence {
    fn build(num_atoms: usize, clauses: &[Option<GClause>]) -> Self {
        let mut counts = vec![0usize; num_atoms];
        for slot in clauses.iter().flatten() {
            for lit in slot.lits() {
                counts[atom_index(lit.atom())] += 1;
            }
        }

        let mut offsets = Vec::with_capacity(num_atoms + 1);
        offsets.push(0);
        for c in &counts {
            offsets.push(offsets.last().unwrap() + c);
        }

        let mut cursor = offsets.clone();
        let mut flat = vec![ClauseId(0); *offsets.last().unwrap()];
        for (idx, slot) in clauses.iter().enumerate() {
            let Some(clause) = slot else { continue };
            for lit in clause.lits() {
                let a = atom_index(lit.atom());
                flat[cursor[a]] = ClauseId(idx);
                cursor[a] += 1;
            }
        }

        CsrIncidence { offsets, flat }
    }

    fn of(&self, atom: AtomId) -> &[ClauseId] {
        let a = atom_index(atom);
        &self.flat[self.offsets[a]..self.offsets[a + 1]]
    }
}

fn atom_index(id: AtomId) -> usize {
    debug_assert!(id > 0, "atom ids are 1-based");
    (id - 1) as usize
}

/// The in-memory Markov Random Field.
pub struct Mrf {
    atoms: Vec<GroundAtom>,
    /// `None` marks a clause retired (dropped as satisfied, or consumed by consolidation).
    clauses: Vec<Option<GClause>>,
    incidence: CsrIncidence,
    /// Per-clause-slot count of currently-satisfied literals. Meaningless for `None` slots.
    sat_count: Vec<u32>,

    /// Incrementally maintained total cost.
    cost: f64,

    /// Lowest cost observed so far by a sampler using this MRF.
    pub low_cost: f64,
    /// Highest cost observed so far by a sampler using this MRF.
    pub high_cost: f64,
}

impl Mrf {
    /// Builds an MRF from a dense atom arena (1-based ids, contiguous) and a clause list,
    /// deriving incidence and the initial satisfied-literal counters from the atoms' current
    /// truth values.
    pub fn new(atoms: Vec<GroundAtom>, clauses: Vec<GClause>) -> Self {
        let clauses: Vec<Option<GClause>> = clauses.into_iter().map(Some).collect();
        let incidence = CsrIncidence::build(atoms.len(), &clauses);

        let mut mrf = Mrf {
            atoms,
            clauses,
            incidence,
            sat_count: Vec::new(),
            cost: 0.0,
            low_cost: f64::INFINITY,
            high_cost: f64::NEG_INFINITY,
        };
        mrf.recompute_sat_counts();
        mrf
    }

    pub fn num_atoms(&self) -> usize {
        self.atoms.len()
    }

    /// Number of clause slots still occupied (retired clauses do not count).
    pub fn num_clauses(&self) -> usize {
        self.clauses.iter().filter(|c| c.is_some()).count()
    }

    pub fn atom(&self, id: AtomId) -> &GroundAtom {
        &self.atoms[atom_index(id)]
    }

    pub fn atom_mut(&mut self, id: AtomId) -> &mut GroundAtom {
        &mut self.atoms[atom_index(id)]
    }

    pub fn atoms(&self) -> &[GroundAtom] {
        &self.atoms
    }

    pub fn atom_ids(&self) -> impl Iterator<Item = AtomId> + '_ {
        (1..=self.atoms.len() as AtomId).filter(move |id| self.atom(*id).pinned.is_none())
    }

    pub fn clause(&self, id: ClauseId) -> Option<&GClause> {
        self.clauses.get(id.0).and_then(|c| c.as_ref())
    }

    /// Iterates every surviving clause, paired with its id.
    pub fn clauses(&self) -> impl Iterator<Item = (ClauseId, &GClause)> {
        self.clauses
            .iter()
            .enumerate()
            .filter_map(|(i, c)| c.as_ref().map(|c| (ClauseId(i), c)))
    }

    /// Drops a clause (marks its slot retired). Used when a clause is found satisfied by a
    /// forced unit, or subsumed during consolidation.
    pub fn retire_clause(&mut self, id: ClauseId) {
        self.clauses[id.0] = None;
    }

    /// Replaces a clause's literal set in place (used when [`UnitPropagator`
    /// ](crate::unit_propagator) strikes a falsified literal). Does not touch incidence — the
    /// CSR topology is built from the *original* clause set and remains a superset-correct
    /// index as clauses only shrink or retire, never grow.
    pub fn shorten_clause(&mut self, id: ClauseId, new_lits_clause: GClause) {
        self.clauses[id.0] = Some(new_lits_clause);
    }

    pub fn incidence(&self, atom: AtomId) -> impl Iterator<Item = ClauseId> + '_ {
        self.incidence.of(atom).iter().copied()
    }

    pub fn sat_count(&self, id: ClauseId) -> u32 {
        self.sat_count[id.0]
    }

    pub fn is_satisfied(&self, id: ClauseId) -> bool {
        self.clause(id).is_some() && self.sat_count(id) > 0
    }

    fn literal_satisfied(&self, lit: Literal) -> bool {
        self.atom(lit.atom()).truth == lit.polarity()
    }

    /// Recomputes every clause's satisfied-literal counter from the current valuation, and
    /// the total cost alongside it. Used at construction and by [`Mrf::recompute_cost`]'s
    /// verification path.
    pub fn recompute_sat_counts(&mut self) {
        self.sat_count = vec![0; self.clauses.len()];
        for (idx, slot) in self.clauses.iter().enumerate() {
            let Some(clause) = slot else { continue };
            let count = clause.lits().iter().filter(|l| self.literal_satisfied(**l)).count();
            self.sat_count[idx] = count as u32;
        }
        self.cost = self.recompute_cost();
    }

    /// The incrementally maintained running cost.
    pub fn cost(&self) -> f64 {
        self.cost
    }

    /// Recomputes `cost(σ)` from scratch, for comparison against the incrementally maintained
    /// value.
    pub fn recompute_cost(&self) -> f64 {
        self.clauses
            .iter()
            .zip(self.sat_count.iter())
            .filter_map(|(slot, sat)| slot.as_ref().map(|c| (c, *sat)))
            .filter(|(_, sat)| *sat == 0)
            .map(|(c, _)| c.weight.abs())
            .sum()
    }

    /// The change in `cost(σ)` that flipping `atom` would cause, without mutating any state.
    pub fn delta_cost(&self, atom: AtomId) -> f64 {
        let current_truth = self.atom(atom).truth;
        let mut delta = 0.0;
        for cid in self.incidence(atom) {
            let Some(clause) = self.clause(cid) else { continue };
            let lit = clause.lits().iter().find(|l| l.atom() == atom).expect(
                "incidence only references clauses that mention this atom",
            );
            let was_satisfier = lit.polarity() == current_truth;
            let will_satisfy = lit.polarity() == !current_truth;
            let sat_before = self.sat_count(cid);
            let sat_after = sat_before as i64 - was_satisfier as i64 + will_satisfy as i64;

            let was_unsat = sat_before == 0;
            let becomes_unsat = sat_after == 0;
            if was_unsat && !becomes_unsat {
                delta -= clause.weight.abs();
            } else if !was_unsat && becomes_unsat {
                delta += clause.weight.abs();
            }
        }
        delta
    }

    /// Flips `atom`'s truth value, updating every incident clause's satisfied-literal counter
    /// and the running cost. Returns the resulting change in cost (matches
    /// [`Mrf::delta_cost`] called just before the flip).
    pub fn flip(&mut self, atom: AtomId) -> f64 {
        let delta = self.delta_cost(atom);

        let current_truth = self.atom(atom).truth;
        let new_truth = !current_truth;

        for cid in self.incidence(atom).collect::<Vec<_>>() {
            let Some(clause) = self.clause(cid) else { continue };
            let lit = clause.lits().iter().find(|l| l.atom() == atom).copied();
            let Some(lit) = lit else { continue };
            let was_satisfier = lit.polarity() == current_truth;
            let will_satisfy = lit.polarity() == new_truth;
            if was_satisfier != will_satisfy {
                let delta_count: i64 = will_satisfy as i64 - was_satisfier as i64;
                self.sat_count[cid.0] = (self.sat_count[cid.0] as i64 + delta_count) as u32;
            }
        }

        self.atom_mut(atom).truth = new_truth;
        self.cost += delta;
        delta
    }

    /// Records an observed cost against the running low/high bounds, tracking the best
    /// assignment a sampler has seen without needing to keep the assignment itself around.
    pub fn note_cost(&mut self, cost: f64) {
        self.low_cost = self.low_cost.min(cost);
        self.high_cost = self.high_cost.max(cost);
    }

    /// Whether every hard clause is currently satisfied.
    pub fn all_hard_satisfied(&self, hard_weight: f64) -> bool {
        self.clauses().filter(|(_, c)| c.is_hard(hard_weight)).all(|(id, _)| self.is_satisfied(id))
    }

    /// Builds a fresh, re-indexed MRF containing only the atoms not in `pinned` and the
    /// clauses not fully satisfied by the pinning.
    ///
    /// Clauses satisfied by a pinned literal are dropped; clauses with a pinned literal
    /// falsified have that literal struck. Returns `None` if striking ever empties a hard
    /// clause (a contradiction [`UnitPropagator`](crate::unit_propagator) should have already
    /// caught — this is a defensive re-check).
    pub fn compact(&self, pinned: &HashMap<AtomId, bool>, hard_weight: f64) -> Option<Mrf> {
        let mut remap: HashMap<AtomId, AtomId> = HashMap::new();
        let mut new_atoms = Vec::new();
        for atom in &self.atoms {
            if pinned.contains_key(&atom.id) {
                continue;
            }
            let new_id = (new_atoms.len() + 1) as AtomId;
            remap.insert(atom.id, new_id);
            let mut copy = atom.clone();
            copy.id = new_id;
            new_atoms.push(copy);
        }

        let mut new_clauses = Vec::new();
        for (_, clause) in self.clauses() {
            let mut satisfied = false;
            let mut kept_lits = Vec::new();
            for lit in clause.lits() {
                if let Some(&pinned_value) = pinned.get(&lit.atom()) {
                    if pinned_value == lit.polarity() {
                        satisfied = true;
                        break;
                    }
                    // falsified literal: struck, not carried forward
                } else {
                    let new_id = remap[&lit.atom()];
                    kept_lits.push(Literal::new(new_id, lit.polarity()));
                }
            }
            if satisfied {
                continue;
            }
            if kept_lits.is_empty() && clause.is_hard(hard_weight) {
                return None;
            }
            if kept_lits.is_empty() {
                continue;
            }
            new_clauses.push(GClause::with_consolidated_weight(kept_lits, clause.weight)?);
        }

        Some(Mrf::new(new_atoms, new_clauses))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structures::atom::Club;

    fn atom(id: AtomId, truth: bool) -> GroundAtom {
        let mut a = GroundAtom::new(id, 0, vec![], Club::Query);
        a.truth = truth;
        a.is_active = true;
        a
    }

    fn unit(a: i32) -> GClause {
        let lit = if a > 0 { Literal::new(a, true) } else { Literal::new(-a, false) };
        match GClause::build(vec![lit], 1.0) {
            crate::structures::clause::BuildOutcome::Clause(c) => c,
            _ => unreachable!(),
        }
    }

    fn binary(a: i32, b: i32, weight: f64) -> GClause {
        let la = if a > 0 { Literal::new(a, true) } else { Literal::new(-a, false) };
        let lb = if b > 0 { Literal::new(b, true) } else { Literal::new(-b, false) };
        match GClause::build(vec![la, lb], weight) {
            crate::structures::clause::BuildOutcome::Clause(c) => c,
            _ => unreachable!(),
        }
    }

    #[test]
    fn cost_matches_recompute_after_flips() {
        let atoms = vec![atom(1, false), atom(2, false)];
        let clauses = vec![binary(1, 2, 5.0)];
        let mut mrf = Mrf::new(atoms, clauses);
        assert_eq!(mrf.cost(), 5.0);
        assert_eq!(mrf.cost(), mrf.recompute_cost());

        mrf.flip(1);
        assert_eq!(mrf.cost(), 0.0);
        assert_eq!(mrf.cost(), mrf.recompute_cost());

        mrf.flip(1);
        assert_eq!(mrf.cost(), 5.0);
        assert_eq!(mrf.cost(), mrf.recompute_cost());
    }

    #[test]
    fn flip_round_trip_restores_cost() {
        let atoms = vec![atom(1, false), atom(2, true)];
        let clauses = vec![binary(1, -2, 3.0), binary(-1, 2, 4.0)];
        let mut mrf = Mrf::new(atoms, clauses);
        let original = mrf.cost();
        mrf.flip(2);
        mrf.flip(2);
        assert_eq!(mrf.cost(), original);
        assert_eq!(mrf.recompute_cost(), original);
    }

    #[test]
    fn delta_cost_predicts_flip_result() {
        let atoms = vec![atom(1, false), atom(2, false)];
        let clauses = vec![binary(1, 2, 5.0)];
        let mut mrf = Mrf::new(atoms, clauses);
        let predicted = mrf.delta_cost(1);
        let before = mrf.cost();
        let actual = mrf.flip(1);
        assert_eq!(predicted, actual);
        assert_eq!(before + actual, mrf.cost());
    }

    #[test]
    fn compact_pins_and_drops_satisfied_clauses() {
        let atoms = vec![atom(1, true), atom(2, false)];
        let clauses = vec![binary(1, 2, 5.0), unit(2)];
        let mrf = Mrf::new(atoms, clauses);

        let mut pinned = HashMap::new();
        pinned.insert(1, true);
        let compacted = mrf.compact(&pinned, 1e7).unwrap();

        // Atom 1 is gone; the first clause is satisfied by it and dropped; atom 2 survives
        // re-indexed to id 1, with its own unit clause remaining.
        assert_eq!(compacted.num_atoms(), 1);
        assert_eq!(compacted.num_clauses(), 1);
    }

    #[test]
    fn compact_detects_hard_contradiction() {
        let atoms = vec![atom(1, true)];
        // A hard clause requiring atom 1 false (negative weight keeps the literal negative
        // rather than triggering unit canonicalisation), while it is pinned true.
        let clause = match GClause::build(vec![Literal::new(1, false)], -1e8) {
            crate::structures::clause::BuildOutcome::Clause(c) => c,
            _ => unreachable!(),
        };
        let mrf = Mrf::new(atoms, vec![clause]);
        let mut pinned = HashMap::new();
        pinned.insert(1, true);
        assert!(mrf.compact(&pinned, 1e7).is_none());
    }
}
