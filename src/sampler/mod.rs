/*!
Stochastic local search over an [`Mrf`](crate::mrf::Mrf): WalkSAT for MAP inference, and a
SampleSAT + MC-SAT pair for marginal inference (§4.5).

- [`walksat`] is the MAP search: greedy-with-noise local search, restarted, tracking the best
  assignment seen by cost.
- [`samplesat`] is the inner kernel MC-SAT uses to draw a near-uniform model of a sub-problem's
  satisfying set — a mix of simulated annealing and WalkSAT restricted to hard clauses.
- [`mcsat`] is the outer sampler: each sample restricts to a randomly retained subset of
  currently-satisfied clauses, asks SampleSAT for a model of that subset, and tallies marginals.

All three share the atom-flippability and random-selection helpers in `support`.
*/

mod support;

pub mod mcsat;
pub mod samplesat;
pub mod walksat;

pub use mcsat::McSatOutcome;
pub use samplesat::SampleSatOutcome;
pub use walksat::WalkSatOutcome;
