/*!
The join engine adapter a [`Grounder`](crate::grounder::Grounder) grounds clause templates
against.

A real deployment's evidence usually lives in whatever typed store the surrounding system
already has — a relational database, an embedded engine, a columnar cache — and grounding a
clause template is, at bottom, a join over that store keyed by the template's shared
variables. None of that is this crate's concern: [`GroundStore`] fixes the four operations a
`Grounder` actually needs, and [`InMemoryGroundStore`] is a small hash-join reference
implementation used by this crate's own tests and by the runnable demos.
*/

use std::collections::{HashMap, HashSet};

use crate::structures::atom::{AtomId, ConstantId, RawLiteral};
use crate::structures::predicate::{Predicate, PredicateId};

/// A variable position within a [`ClauseTemplate`](crate::grounder::ClauseTemplate)'s literals,
/// shared by any two literals whose argument refers to the same first-order variable.
pub type VarId = u32;

/// A single literal within a clause template, prior to grounding: a predicate applied to
/// variables (by position), with a polarity.
#[derive(Clone, Debug)]
pub struct TemplateLiteral {
    pub predicate: PredicateId,
    pub vars: Vec<VarId>,
    pub polarity: bool,
}

impl TemplateLiteral {
    pub fn new(predicate: PredicateId, vars: Vec<VarId>, polarity: bool) -> Self {
        TemplateLiteral { predicate, vars, polarity }
    }
}

/// Identifies a clause template within a [`Grounder`](crate::grounder::Grounder)'s universe.
pub type TemplateId = u32;

/// A first-order clause template: a disjunction of [`TemplateLiteral`]s sharing variables
/// across positions, with a weight. Grounding instantiates every variable with a constant,
/// yielding one ground clause per consistent binding.
#[derive(Clone, Debug)]
pub struct ClauseTemplate {
    pub id: TemplateId,
    pub lits: Vec<TemplateLiteral>,
    pub weight: f64,
}

impl ClauseTemplate {
    pub fn new(id: TemplateId, lits: Vec<TemplateLiteral>, weight: f64) -> Self {
        ClauseTemplate { id, lits, weight }
    }

    pub fn is_hard(&self, hard_weight: f64) -> bool {
        self.weight.abs() >= hard_weight
    }
}

/// Which formula-level direction a grounding pass is looking for violations in. A clause
/// template's weight sign fixes which of its two readings (the clause as written, or its
/// negation) is the one whose violation costs something; `Sense` names which reading a
/// particular `ground_clause` call is enumerating.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sense {
    Positive,
    Negative,
}

/// The join engine a [`Grounder`](crate::grounder::Grounder) consumes.
///
/// Implementations own the evidence and the typed domains clause templates range over;
/// `Grounder` only ever asks for active-set membership, for activation, for groundings of a
/// template, and to record truth values derived during iterative unit propagation.
pub trait GroundStore {
    /// The atoms of `predicate` currently in the closure.
    fn active_atoms_of(&self, predicate: PredicateId) -> HashSet<AtomId>;

    /// Unions `ids` into `predicate`'s active set. Idempotent.
    fn activate_atoms(&mut self, predicate: PredicateId, ids: &[AtomId]);

    /// Every grounding of `template` consistent with the store's evidence, read in `sense`.
    /// Each grounding is a tuple of signed atom ids, one per literal of the template, in
    /// literal order. A literal whose underlying atom is already known to satisfy it is
    /// replaced by [`Literal::sentinel`](crate::structures::atom::Literal::sentinel)'s raw
    /// form, marking the whole grounding as already true.
    fn ground_clause(&self, template: &ClauseTemplate, sense: Sense) -> Vec<Vec<RawLiteral>>;

    /// Records a derived truth value for `atom`, used during iterative unit propagation so
    /// later grounding steps see it as evidence.
    fn set_truth(&mut self, atom: AtomId, truth: bool);

    /// Every atom registered against `predicate`, active or not. Used to enumerate
    /// key-constraint candidates and soft-evidence unit clauses, which range over the whole
    /// predicate rather than just its active slice.
    fn atoms_of(&self, predicate: PredicateId) -> Vec<AtomId>;

    /// The predicate `atom` was minted against. Only valid for an atom this store has
    /// produced, via [`GroundStore::ground_clause`] or an implementation-specific
    /// registration method.
    fn predicate_of(&self, atom: AtomId) -> PredicateId;

    /// The constant tuple `atom` was minted from.
    fn terms_of(&self, atom: AtomId) -> Vec<ConstantId>;

    /// `atom`'s fixed truth value, if evidence has settled it one way or the other.
    fn truth_of(&self, atom: AtomId) -> Option<bool>;

    /// `atom`'s soft-evidence prior, if it has one rather than a fixed truth value.
    fn prior_of(&self, atom: AtomId) -> Option<f64>;
}

/// A hash-join reference [`GroundStore`], keeping every predicate's registered tuples
/// in memory.
///
/// Unlike a production join engine, this store only ever grounds over a *registered*
/// universe of constants per predicate: callers add every tuple (evidence or query) they
/// want groundable via [`InMemoryGroundStore::register_atom`] before grounding. That is a
/// deliberate simplification for a test double, not a faithful model of how a real
/// database-backed store would enumerate an open domain.
#[derive(Default)]
pub struct InMemoryGroundStore {
    predicates: HashMap<PredicateId, Predicate>,
    tuples_of_predicate: HashMap<PredicateId, Vec<(Vec<ConstantId>, AtomId)>>,
    atom_of_tuple: HashMap<(PredicateId, Vec<ConstantId>), AtomId>,
    predicate_of_atom: HashMap<AtomId, PredicateId>,
    terms_of_atom: HashMap<AtomId, Vec<ConstantId>>,
    truth: HashMap<AtomId, bool>,
    priors: HashMap<AtomId, f64>,
    active: HashMap<PredicateId, HashSet<AtomId>>,
    next_atom: AtomId,
}

impl InMemoryGroundStore {
    pub fn new() -> Self {
        InMemoryGroundStore { next_atom: 1, ..Default::default() }
    }

    pub fn register_predicate(&mut self, predicate: Predicate) {
        self.predicates.entry(predicate.id).or_insert(predicate);
    }

    /// Registers (or looks up) the ground atom for `predicate(terms)`, minting a fresh
    /// [`AtomId`] the first time this tuple is seen.
    pub fn register_atom(&mut self, predicate: PredicateId, terms: Vec<ConstantId>) -> AtomId {
        let key = (predicate, terms.clone());
        if let Some(id) = self.atom_of_tuple.get(&key) {
            return *id;
        }
        let id = self.next_atom;
        self.next_atom += 1;
        self.atom_of_tuple.insert(key, id);
        self.predicate_of_atom.insert(id, predicate);
        self.terms_of_atom.insert(id, terms.clone());
        self.tuples_of_predicate.entry(predicate).or_default().push((terms, id));
        id
    }

    /// Records evidence: `atom`'s truth value is fixed and known to every grounding pass.
    pub fn set_evidence(&mut self, atom: AtomId, truth: bool) {
        self.truth.insert(atom, truth);
    }

    /// Records a soft-evidence prior for `atom`, leaving its truth unknown.
    pub fn set_prior(&mut self, atom: AtomId, prior: f64) {
        self.priors.insert(atom, prior);
    }

    /// Joins `lits[from..]` against the registered universe, extending `binding` for each
    /// consistent assignment and recursing. Calls `emit` with a completed binding once every
    /// literal has a consistent tuple.
    fn join(
        &self,
        lits: &[TemplateLiteral],
        from: usize,
        binding: &mut HashMap<VarId, ConstantId>,
        emit: &mut dyn FnMut(&HashMap<VarId, ConstantId>),
    ) {
        let Some(lit) = lits.get(from) else {
            emit(binding);
            return;
        };

        let Some(candidates) = self.tuples_of_predicate.get(&lit.predicate) else { return };

        for (terms, _atom) in candidates {
            if terms.len() != lit.vars.len() {
                continue;
            }

            let mut newly_bound = Vec::new();
            let mut consistent = true;
            for (var, constant) in lit.vars.iter().zip(terms) {
                match binding.get(var) {
                    Some(existing) if existing != constant => {
                        consistent = false;
                        break;
                    }
                    Some(_) => {}
                    None => {
                        binding.insert(*var, *constant);
                        newly_bound.push(*var);
                    }
                }
            }

            if consistent {
                self.join(lits, from + 1, binding, emit);
            }

            for var in newly_bound {
                binding.remove(&var);
            }
        }
    }
}

impl GroundStore for InMemoryGroundStore {
    fn active_atoms_of(&self, predicate: PredicateId) -> HashSet<AtomId> {
        self.active.get(&predicate).cloned().unwrap_or_default()
    }

    fn activate_atoms(&mut self, predicate: PredicateId, ids: &[AtomId]) {
        self.active.entry(predicate).or_default().extend(ids.iter().copied());
    }

    fn ground_clause(&self, template: &ClauseTemplate, _sense: Sense) -> Vec<Vec<RawLiteral>> {
        let mut groundings = Vec::new();
        let mut binding = HashMap::new();

        self.join(&template.lits, 0, &mut binding, &mut |binding| {
            let mut tuple = Vec::with_capacity(template.lits.len());
            let mut already_satisfied = false;

            for lit in &template.lits {
                let terms: Vec<ConstantId> =
                    lit.vars.iter().map(|v| binding[v]).collect();
                let atom = self.atom_of_tuple[&(lit.predicate, terms)];

                if self.truth.get(&atom) == Some(&lit.polarity) {
                    already_satisfied = true;
                }
                tuple.push(if lit.polarity { atom } else { -atom });
            }

            if already_satisfied {
                tuple = vec![crate::structures::atom::SAT_SENTINEL];
            }
            groundings.push(tuple);
        });

        groundings
    }

    fn set_truth(&mut self, atom: AtomId, truth: bool) {
        self.truth.insert(atom, truth);
    }

    fn atoms_of(&self, predicate: PredicateId) -> Vec<AtomId> {
        self.tuples_of_predicate
            .get(&predicate)
            .into_iter()
            .flatten()
            .map(|(_, id)| *id)
            .collect()
    }

    fn predicate_of(&self, atom: AtomId) -> PredicateId {
        self.predicate_of_atom[&atom]
    }

    fn terms_of(&self, atom: AtomId) -> Vec<ConstantId> {
        self.terms_of_atom[&atom].clone()
    }

    fn truth_of(&self, atom: AtomId) -> Option<bool> {
        self.truth.get(&atom).copied()
    }

    fn prior_of(&self, atom: AtomId) -> Option<f64> {
        self.priors.get(&atom).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structures::predicate::Predicate;

    #[test]
    fn joins_two_literals_on_a_shared_variable() {
        let mut store = InMemoryGroundStore::new();
        store.register_predicate(Predicate::new(0, "Smokes", 1));
        store.register_predicate(Predicate::new(1, "Cancer", 1));

        let alice = store.register_atom(0, vec![1]);
        let _bob_smokes = store.register_atom(0, vec![2]);
        let alice_cancer = store.register_atom(1, vec![1]);

        let template = ClauseTemplate::new(
            0,
            vec![
                TemplateLiteral::new(0, vec![10], false),
                TemplateLiteral::new(1, vec![10], true),
            ],
            1.0,
        );

        let groundings = store.ground_clause(&template, Sense::Positive);
        assert_eq!(groundings.len(), 2);
        assert!(groundings.contains(&vec![-alice, alice_cancer]));
    }

    #[test]
    fn known_true_literal_yields_sentinel() {
        let mut store = InMemoryGroundStore::new();
        store.register_predicate(Predicate::new(0, "P", 1));
        let a = store.register_atom(0, vec![1]);
        store.set_evidence(a, true);

        let template =
            ClauseTemplate::new(0, vec![TemplateLiteral::new(0, vec![10], true)], 1.0);
        let groundings = store.ground_clause(&template, Sense::Positive);
        assert_eq!(groundings, vec![vec![crate::structures::atom::SAT_SENTINEL]]);
    }

    #[test]
    fn activation_is_idempotent() {
        let mut store = InMemoryGroundStore::new();
        store.activate_atoms(0, &[1, 2]);
        store.activate_atoms(0, &[2, 3]);
        let active = store.active_atoms_of(0);
        assert_eq!(active.len(), 3);
    }
}
