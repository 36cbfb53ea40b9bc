//! Ground clauses.

use crate::structures::atom::Literal;

/// Indexes a clause within an [`Mrf`](crate::mrf::Mrf)'s clause arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClauseId(pub usize);

impl std::fmt::Display for ClauseId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "c{}", self.0)
    }
}

/// A ground clause: a disjunction of literals over distinct atoms, with a real weight.
///
/// Invariants enforced by [`GClause::build`] and preserved by every mutator in this module:
/// - `lits` is non-empty, strictly sorted, and contains no duplicate atom.
/// - No atom appears as both a positive and a negative literal (a tautology) — such clauses
///   are always satisfied and are dropped rather than represented.
/// - A unit clause is always stored in the canonical form `{x}` with a non-positive weight
///   rewritten to `{-x}` with the weight negated ("normalised form").
#[derive(Clone, Debug, PartialEq)]
pub struct GClause {
    lits: Vec<Literal>,
    pub weight: f64,
}

/// The outcome of folding a single grounding into a [`GClause`].
#[derive(Debug, PartialEq)]
pub enum BuildOutcome {
    /// The clause was built successfully.
    Clause(GClause),
    /// The grounding was already satisfied (it contained the sentinel, or a tautology), and so
    /// contributes nothing.
    Tautology,
    /// The grounding had no literals at all — an empty clause, which is a hard contradiction
    /// by itself.
    Empty,
}

impl GClause {
    /// Builds a clause from an unsorted, possibly-redundant literal list and a weight,
    /// enforcing every invariant above. Literals equal to the [`SAT_SENTINEL`
    /// ](crate::structures::atom::SAT_SENTINEL) mark the grounding as already satisfied.
    pub fn build(mut lits: Vec<Literal>, weight: f64) -> BuildOutcome {
        if lits.iter().any(Literal::is_sentinel) {
            return BuildOutcome::Tautology;
        }

        lits.sort();
        lits.dedup();

        // Tautology check: after sorting by (atom, polarity), `x` and `-x` for the same atom
        // are adjacent with `x` (false) preceding `-x` (true).
        let mut i = 0;
        while i + 1 < lits.len() {
            if lits[i].atom() == lits[i + 1].atom() {
                return BuildOutcome::Tautology;
            }
            i += 1;
        }

        if lits.is_empty() {
            return BuildOutcome::Empty;
        }

        let (lits, weight) = Self::canonicalize_unit(lits, weight);
        BuildOutcome::Clause(GClause { lits, weight })
    }

    /// Rewrites a negative-polarity unit `{-x}` with `w > 0` to `{x}` with `-w`. Non-unit
    /// clauses pass through unchanged.
    fn canonicalize_unit(lits: Vec<Literal>, weight: f64) -> (Vec<Literal>, f64) {
        if lits.len() == 1 && !lits[0].polarity() && weight > 0.0 {
            (vec![lits[0].negate()], -weight)
        } else {
            (lits, weight)
        }
    }

    /// A clause is hard when its weight magnitude is at or above `hard_weight`.
    pub fn is_hard(&self, hard_weight: f64) -> bool {
        self.weight.abs() >= hard_weight
    }

    pub fn lits(&self) -> &[Literal] {
        &self.lits
    }

    pub fn is_unit(&self) -> bool {
        self.lits.len() == 1
    }

    pub fn unit_literal(&self) -> Option<Literal> {
        (self.lits.len() == 1).then(|| self.lits[0])
    }

    /// Removes `lit`'s negation from this clause, if present. Used by
    /// [`UnitPropagator`](crate::unit_propagator) to shorten a clause once a unit has forced
    /// `lit`. Returns `true` if a literal was removed.
    pub fn strike(&mut self, forced: Literal) -> bool {
        let before = self.lits.len();
        self.lits.retain(|l| *l != forced.negate());
        self.lits.len() != before
    }

    pub fn contains(&self, lit: Literal) -> bool {
        self.lits.binary_search(&lit).is_ok()
    }

    /// A grouping key used by consolidation: two groundings merge if they share the exact
    /// same (sorted, deduplicated) set of literals.
    pub fn grouping_key(&self) -> Vec<Literal> {
        self.lits.clone()
    }

    /// Rebuilds a clause's weight and canonical unit form after consolidation has summed
    /// weights across a group of identical groundings.
    pub fn with_consolidated_weight(lits: Vec<Literal>, summed_weight: f64) -> Option<GClause> {
        if summed_weight == 0.0 {
            return None;
        }
        let (lits, weight) = Self::canonicalize_unit(lits, summed_weight);
        Some(GClause { lits, weight })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(a: i32) -> Literal {
        if a > 0 {
            Literal::new(a, true)
        } else {
            Literal::new(-a, false)
        }
    }

    #[test]
    fn sorts_and_dedups() {
        let out = GClause::build(vec![lit(3), lit(1), lit(3)], 5.0);
        match out {
            BuildOutcome::Clause(c) => {
                assert_eq!(c.lits(), &[lit(1), lit(3)]);
            }
            other => panic!("expected a clause, got {other:?}"),
        }
    }

    #[test]
    fn tautology_is_dropped() {
        let out = GClause::build(vec![lit(1), lit(-1)], 5.0);
        assert_eq!(out, BuildOutcome::Tautology);
    }

    #[test]
    fn sentinel_marks_tautology() {
        let out = GClause::build(vec![lit(1), Literal::sentinel()], 5.0);
        assert_eq!(out, BuildOutcome::Tautology);
    }

    #[test]
    fn empty_clause_is_reported() {
        let out = GClause::build(vec![], 5.0);
        assert_eq!(out, BuildOutcome::Empty);
    }

    #[test]
    fn negative_unit_with_positive_weight_is_canonicalised() {
        let out = GClause::build(vec![lit(-5)], 3.0);
        match out {
            BuildOutcome::Clause(c) => {
                assert_eq!(c.lits(), &[lit(5)]);
                assert_eq!(c.weight, -3.0);
            }
            other => panic!("expected a clause, got {other:?}"),
        }
    }

    #[test]
    fn hard_threshold_is_by_magnitude() {
        let out = GClause::build(vec![lit(1), lit(2)], -1e8);
        match out {
            BuildOutcome::Clause(c) => assert!(c.is_hard(1e7)),
            other => panic!("expected a clause, got {other:?}"),
        }
    }

    #[test]
    fn strike_removes_negated_literal() {
        let out = GClause::build(vec![lit(1), lit(2), lit(-3)], 1.0);
        let mut c = match out {
            BuildOutcome::Clause(c) => c,
            other => panic!("expected a clause, got {other:?}"),
        };
        assert!(c.strike(lit(3)));
        assert_eq!(c.lits(), &[lit(1), lit(2)]);
    }
}
