/*!
Error types used throughout the crate.

Names of the error enums overlap with the sub-area they belong to, so call sites tend to read
`error::GroundingError::...` even when the surrounding function returns the union
[`ErrorKind`]. As such `error::{self}` is the usual import.
*/

use crate::structures::clause::ClauseId;

/// A union of the error kinds raised by any phase of the pipeline.
#[derive(Clone, Debug, PartialEq)]
pub enum ErrorKind {
    /// An error while validating a [`Config`](crate::config::Config).
    Config(ConfigError),

    /// An error while grounding clause templates.
    Grounding(GroundingError),

    /// An error while running [`UnitPropagator`](crate::unit_propagator).
    Propagation(PropagationError),

    /// An error from a [`Sampler`](crate::sampler).
    Sampler(SamplerError),

    /// An error surfaced by an external [`UnitSolver`](crate::unit_solver::UnitSolver).
    UnitSolver(UnitSolverError),

    /// Cooperative cancellation: a deadline expired mid-phase.
    ///
    /// Not a failure — the driver still emits partial tallies for this.
    Timeout,
}

/// Errors raised while validating a [`Config`](crate::config::Config).
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ConfigError {
    /// A bounded option was given a value outside of `[min, max]`.
    OutOfRange {
        name: &'static str,
        min: f64,
        max: f64,
        got: f64,
    },

    /// `mcsat_samples <= 0` was requested alongside marginal inference.
    NonPositiveSampleCount,
}

impl From<ConfigError> for ErrorKind {
    fn from(e: ConfigError) -> Self {
        ErrorKind::Config(e)
    }
}

/// Errors raised while grounding.
#[derive(Clone, Debug, PartialEq)]
pub enum GroundingError {
    /// Iterative unit propagation found the hard clauses already contradictory.
    Unsat,

    /// The configured clause-count ceiling was exceeded.
    Oversize {
        /// Number of clauses ground before the ceiling tripped.
        clauses_at_abort: usize,
        ceiling: usize,
    },
}

impl From<GroundingError> for ErrorKind {
    fn from(e: GroundingError) -> Self {
        ErrorKind::Grounding(e)
    }
}

/// Errors raised by [`UnitPropagator`](crate::unit_propagator).
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PropagationError {
    /// A hard unit clause pinned an atom to one value while another hard unit (or a prior
    /// pin) requires the opposite value.
    Unsat { atom: crate::structures::atom::AtomId, offending_clause: ClauseId },
}

impl From<PropagationError> for ErrorKind {
    fn from(e: PropagationError) -> Self {
        ErrorKind::Propagation(e)
    }
}

/// Errors raised by the [`sampler`](crate::sampler) module.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SamplerError {
    /// WalkSAT exhausted its try/flip budget without reaching `cost = 0` on the hard clauses.
    ///
    /// Not necessarily a sign of unsatisfiability — only that local search did not find a
    /// witness within budget.
    BudgetExhausted,
}

impl From<SamplerError> for ErrorKind {
    fn from(e: SamplerError) -> Self {
        ErrorKind::Sampler(e)
    }
}

/// Errors surfaced by an external [`UnitSolver`](crate::unit_solver::UnitSolver).
///
/// Recovered locally by the grounder: the offending IUP step is skipped with a `log::warn!`
/// and grounding continues without that literal set. No other error kind is recovered this way.
#[derive(Clone, Debug, PartialEq)]
pub enum UnitSolverError {
    /// The external process exited non-zero, or otherwise failed to answer.
    ProcessFailure(String),

    /// The solver's output could not be parsed as a literal set.
    MalformedOutput(String),

    /// The solver reported the supplied CNF was itself contradictory.
    Unsat,
}

impl From<UnitSolverError> for ErrorKind {
    fn from(e: UnitSolverError) -> Self {
        ErrorKind::UnitSolver(e)
    }
}
