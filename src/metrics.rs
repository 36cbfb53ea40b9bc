//! Counters threaded explicitly through a solve, rather than accumulated behind the scenes
//! in ambient/global state.

/// Summary counters emitted alongside per-atom marginals.
#[derive(Clone, Debug, Default)]
pub struct Metrics {
    /// Ground atoms minted during closure.
    pub number_ground_atoms: usize,

    /// Ground clauses surviving consolidation.
    pub number_ground_clauses: usize,

    /// Unit literals derived via IUP and post-grounding unit propagation, combined.
    pub number_units: usize,

    /// Wall-clock time spent grounding, in milliseconds.
    pub grounding_time_ms: u64,

    /// Wall-clock time spent in [`UnitSolver`](crate::unit_solver::UnitSolver) calls, in
    /// milliseconds.
    pub unit_solver_time_ms: u64,

    /// Times SampleSAT failed to satisfy the hard subset of a MC-SAT sample's sub-MRF.
    pub mcsat_steps_where_samplesat_fails: u64,

    /// Samples still outstanding when a deadline expired mid-sampling.
    pub number_samples_at_timeout: usize,

    /// Ground clauses still outstanding when a deadline expired mid-grounding.
    pub number_clauses_at_timeout: usize,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }
}
