//! Ground atoms and literals.

use crate::structures::predicate::PredicateId;

/// A stable, non-zero identifier for a ground atom. 1-based, as `0` doubles as "no literal" in
/// [`Literal`]'s encoding.
///
/// `i32`-backed: sufficient up to ~2·10⁹ atoms. A deployment expecting to exceed that bound
/// would widen this to `i64`; nothing else in the crate assumes the width.
pub type AtomId = i32;

/// A typed constant, as assigned by whatever owns the domain (out of scope for this crate —
/// see [`GroundStore`](crate::ground_store::GroundStore)).
pub type ConstantId = u32;

/// The role a ground atom plays in the input.
///
/// Determines how the atom participates in closure: evidence atoms seed activation through
/// the predicates they touch, query atoms are always members of the closure candidate set,
/// and `EVID_QUERY_EVID_TRUE` is reserved for query atoms whose
/// training-time truth value happens to be known (used when learning, out of scope here, but
/// carried so a future learner can distinguish it without a data model change).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Club {
    /// A fixed evidence atom — known true or false, never queried.
    EvidFixed,
    /// A query atom that also has a known (training) truth value.
    EvidQueryEvid,
    /// A query atom: truth unknown, to be inferred.
    Query,
    /// A query atom with known truth value `true` (the distinguished case of
    /// `EvidQueryEvid` the reference system tracks separately).
    QueryEvidTrue,
}

impl Club {
    /// Evidence clubs never change truth value during sampling.
    pub fn is_fixed(&self) -> bool {
        matches!(self, Club::EvidFixed)
    }
}

/// A signed reference to a [`GroundAtom`]: positive for the atom's positive sense, negative
/// for its negation. `0` is never a valid literal.
pub type RawLiteral = i32;

/// A literal, i.e. a polarity paired with an atom id, encoded as a single signed integer.
/// Kept as a newtype rather than a bare `i32` so clause-building code cannot confuse a
/// literal with a raw atom id or forget to check for `0`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Literal(RawLiteral);

/// Sentinel written into an in-progress grounding to mark "this clause is already satisfied,
/// discard it" — the existential-quantifier edge case where a grounding step discovers the
/// clause is trivially true before every literal has been produced. Chosen far outside any
/// realistic atom id range.
pub const SAT_SENTINEL: RawLiteral = 999_999_999;

impl Literal {
    /// Builds a literal from an atom id and a polarity. Panics on `atom == 0`, since `0` is
    /// reserved and never denotes a real atom.
    pub fn new(atom: AtomId, polarity: bool) -> Self {
        assert_ne!(atom, 0, "atom id 0 is reserved");
        Literal(if polarity { atom } else { -atom })
    }

    /// Builds a literal directly from its signed encoding.
    pub fn from_raw(raw: RawLiteral) -> Self {
        assert_ne!(raw, 0, "literal 0 is reserved");
        Literal(raw)
    }

    /// A literal carrying the sentinel value (see [`SAT_SENTINEL`]).
    pub fn sentinel() -> Self {
        Literal(SAT_SENTINEL)
    }

    pub fn is_sentinel(&self) -> bool {
        self.0.abs() == SAT_SENTINEL
    }

    pub fn atom(&self) -> AtomId {
        self.0.abs()
    }

    pub fn polarity(&self) -> bool {
        self.0 > 0
    }

    pub fn negate(&self) -> Self {
        Literal(-self.0)
    }

    pub fn raw(&self) -> RawLiteral {
        self.0
    }
}

impl std::fmt::Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Literals are ordered by atom, with negative (false) ordered before positive (true) for a
/// shared atom — matching the Rust default ordering of `false < true`. `GClause` relies on
/// this to keep its literal list strictly sorted by `|lit|`.
impl PartialOrd for Literal {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Literal {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.atom().cmp(&other.atom()).then(self.polarity().cmp(&other.polarity()))
    }
}

/// A ground atom: a predicate with every argument position bound to a constant.
#[derive(Clone, Debug)]
pub struct GroundAtom {
    pub id: AtomId,
    pub predicate: PredicateId,
    pub terms: Vec<ConstantId>,

    /// Current truth assignment.
    pub truth: bool,

    /// The atom's role in the input.
    pub club: Club,

    /// Soft-evidence prior probability, if this atom has one rather than a fixed truth value.
    pub prior: Option<f64>,

    /// Whether this atom is a member of the grounding closure.
    pub is_active: bool,

    /// Set once [`UnitPropagator`](crate::unit_propagator) retires this atom: the truth value
    /// it is permanently pinned to, with its incidence dropped.
    pub pinned: Option<bool>,

    /// MC-SAT tally: number of samples in which this atom held `true`.
    pub n_true: u64,
}

impl GroundAtom {
    pub fn new(id: AtomId, predicate: PredicateId, terms: Vec<ConstantId>, club: Club) -> Self {
        GroundAtom {
            id,
            predicate,
            terms,
            truth: false,
            club,
            prior: None,
            is_active: false,
            pinned: None,
            n_true: 0,
        }
    }

    pub fn is_immutable_club(&self) -> bool {
        self.club.is_fixed()
    }

    pub fn literal(&self, polarity: bool) -> Literal {
        Literal::new(self.id, polarity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_atom_and_polarity_round_trip() {
        let l = Literal::new(7, true);
        assert_eq!(l.atom(), 7);
        assert!(l.polarity());
        assert_eq!(l.negate(), Literal::new(7, false));
    }

    #[test]
    fn ordering_is_by_atom_then_polarity() {
        let mut lits = vec![Literal::new(3, true), Literal::new(1, false), Literal::new(3, false)];
        lits.sort();
        assert_eq!(
            lits,
            vec![Literal::new(1, false), Literal::new(3, false), Literal::new(3, true)]
        );
    }

    #[test]
    fn sentinel_is_recognised_either_polarity() {
        assert!(Literal::sentinel().is_sentinel());
        assert!(Literal::sentinel().negate().is_sentinel());
    }

    #[test]
    #[should_panic]
    fn zero_atom_panics() {
        Literal::new(0, true);
    }
}
