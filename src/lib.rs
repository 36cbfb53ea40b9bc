/*!
Probabilistic inference over Markov Logic Networks.

Given a set of weighted first-order clauses (already grounded into clause *templates* by an
external parser — out of scope for this crate) plus a database of evidence atoms, this crate
computes marginal probabilities for a set of query atoms under the Gibbs distribution the
weighted formula induces.

# Orientation

The pipeline, leaves first:

- [`ground_store`] and [`unit_solver`] are the two external collaborators the core consumes:
  a join engine that produces active-atom and active-clause tuples, and a CNF oracle used
  during iterative unit propagation. Both are traits; this crate ships reference
  implementations used by its own tests and runnable demos.
- [`grounder`] drives the closure of active atoms and ground clauses.
- [`mrf`] is the in-memory Markov Random Field the grounder populates.
- [`unit_propagator`] simplifies a grounded MRF to a fixed point.
- [`sampler`] holds WalkSAT (MAP), SampleSAT, and MC-SAT (marginals).
- [`driver`] orchestrates the above into a single call.

Supporting modules ([`config`], [`error`], [`metrics`], [`rng`], [`timer`], [`log_targets`])
are the ambient engineering every phase shares.
*/

pub mod config;
pub mod error;
pub mod ground_store;
pub mod grounder;
pub mod log_targets;
pub mod metrics;
pub mod mrf;
pub mod rng;
pub mod sampler;
pub mod structures;
pub mod timer;
pub mod unit_propagator;
pub mod unit_solver;

pub mod driver;

pub use driver::InferenceDriver;
pub use error::ErrorKind;
