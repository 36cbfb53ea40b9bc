//! Key structures: typed predicates, ground atoms, literals, and ground clauses.
//!
//! # Predicates, atoms, and constants
//!
//! A [predicate](predicate::Predicate) is a named typed relation. Instantiating every argument
//! of a predicate with a [constant](atom::ConstantId) yields a [ground atom](atom::GroundAtom),
//! identified by a stable, non-zero [`AtomId`](atom::AtomId). A [literal](atom::Literal) pairs
//! an atom id with a polarity by way of sign: positive for true, negative for false, following
//! the DIMACS convention.
//!
//! # Ground clauses
//!
//! A [`GClause`](clause::GClause) is a disjunction of literals over distinct atoms, carrying a
//! real-valued weight. Clauses whose weight magnitude is at or above the configured
//! `hard_weight` threshold are *hard*: satisfying them is mandatory rather than merely costly.

pub mod atom;
pub mod clause;
pub mod predicate;
