//! Helpers shared by [`walksat`](super::walksat), [`samplesat`](super::samplesat), and
//! [`mcsat`](super::mcsat): atom flippability, random restarts, and unsatisfied-clause/atom
//! selection.

use rand::Rng;
use rand_core::RngCore;

use crate::mrf::Mrf;
use crate::structures::atom::AtomId;
use crate::structures::clause::ClauseId;

/// Whether a sampler may flip `atom`: not fixed evidence, and not retired by
/// [`UnitPropagator`](crate::unit_propagator) (in practice the latter never holds once an
/// atom is present in a post-propagation `Mrf` at all, since [`Mrf::compact`] drops pinned
/// atoms outright — the check stays defensive for sub-MRFs built directly from an atom list).
pub(crate) fn is_flippable(mrf: &Mrf, atom: AtomId) -> bool {
    let a = mrf.atom(atom);
    !a.is_immutable_club() && a.pinned.is_none()
}

pub(crate) fn flippable_atoms(mrf: &Mrf) -> Vec<AtomId> {
    (1..=mrf.num_atoms() as AtomId).filter(|&a| is_flippable(mrf, a)).collect()
}

/// Assigns every flippable atom a fresh uniform-random truth value, leaving fixed-evidence
/// atoms at whatever truth value they already carry.
pub(crate) fn randomize(mrf: &mut Mrf, rng: &mut impl RngCore) {
    for atom in flippable_atoms(mrf) {
        let truth: bool = rng.gen();
        if mrf.atom(atom).truth != truth {
            mrf.flip(atom);
        }
    }
}

/// A full snapshot of every atom's current truth value, indexed by zero-based atom position.
/// Cheap enough to take on every new-best observation — this crate's demos and tests stay
/// well within the sizes where that matters.
pub(crate) fn snapshot(mrf: &Mrf) -> Vec<bool> {
    mrf.atoms().iter().map(|a| a.truth).collect()
}

pub(crate) fn restore(mrf: &mut Mrf, snapshot: &[bool]) {
    for (idx, &truth) in snapshot.iter().enumerate() {
        let atom = (idx + 1) as AtomId;
        if mrf.atom(atom).truth != truth {
            mrf.flip(atom);
        }
    }
}

/// Picks an unsatisfied clause matching `filter` uniformly at random, preferring clauses with
/// at least one flippable atom (a clause with none can never be fixed by this sampler and is
/// skipped so the caller doesn't spin on it).
pub(crate) fn pick_unsatisfied_clause(
    mrf: &Mrf,
    rng: &mut impl RngCore,
    filter: impl Fn(&crate::structures::clause::GClause) -> bool,
) -> Option<ClauseId> {
    let candidates: Vec<ClauseId> = mrf
        .clauses()
        .filter(|(id, c)| filter(c) && !mrf.is_satisfied(*id) && c.lits().iter().any(|l| is_flippable(mrf, l.atom())))
        .map(|(id, _)| id)
        .collect();

    if candidates.is_empty() {
        return None;
    }
    Some(candidates[rng.gen_range(0..candidates.len())])
}

/// Chooses which atom of `clause` to flip: with probability `random_prob` uniformly among the
/// clause's flippable atoms, otherwise the flippable atom minimising `delta_cost` (ties broken
/// uniformly at random).
pub(crate) fn pick_flip_atom(
    mrf: &Mrf,
    clause: ClauseId,
    random_prob: f64,
    rng: &mut impl RngCore,
) -> AtomId {
    let atoms: Vec<AtomId> = mrf
        .clause(clause)
        .expect("caller only passes clauses still present in the mrf")
        .lits()
        .iter()
        .map(|l| l.atom())
        .filter(|&a| is_flippable(mrf, a))
        .collect();
    debug_assert!(!atoms.is_empty(), "pick_unsatisfied_clause only returns clauses with a flippable atom");

    if rng.gen_bool(random_prob) {
        return atoms[rng.gen_range(0..atoms.len())];
    }

    let mut best: Vec<AtomId> = Vec::new();
    let mut best_delta = f64::INFINITY;
    for &atom in &atoms {
        let delta = mrf.delta_cost(atom);
        if delta < best_delta {
            best_delta = delta;
            best.clear();
            best.push(atom);
        } else if delta == best_delta {
            best.push(atom);
        }
    }
    best[rng.gen_range(0..best.len())]
}
