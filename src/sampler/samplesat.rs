/*!
SampleSAT: the hybrid simulated-annealing / restricted-WalkSAT kernel [`mcsat`](super::mcsat)
uses to draw a near-uniform model from the set of assignments satisfying a sub-MRF's hard
clauses.

Every clause passed in here is expected to already be hard — [`mcsat::build_sub_mrf`
](super::mcsat) marks both the original MRF's genuine hard clauses and its retained soft
clauses as hard in the sub-MRF it builds, since SampleSAT's only job is to find *a* satisfying
assignment of that sub-problem, not to weigh satisfied-ness by magnitude.
*/

use rand::Rng;

use crate::config::Config;
use crate::mrf::Mrf;
use crate::rng::{self, StreamTag};
use crate::timer::Deadline;

use super::support::{flippable_atoms, pick_flip_atom, pick_unsatisfied_clause};

/// The result of one SampleSAT run.
#[derive(Clone, Copy, Debug)]
pub struct SampleSatOutcome {
    /// Whether every hard clause of the sub-MRF was satisfied when the run ended.
    pub satisfied: bool,
    /// Whether the deadline expired before a satisfying assignment was found.
    pub timed_out: bool,
}

/// Runs SampleSAT against `mrf` for `max_flips` steps, mutating it in place. Each step is a
/// single Bernoulli trial: with probability `config.simulated_annealing_samplesat_prob`, a
/// simulated-annealing proposal; otherwise a WalkSAT step restricted to clauses the sub-MRF
/// marks hard.
///
/// The full budget always runs — satisfying every hard clause does not end the run early. A
/// sub-MRF with no genuinely unsatisfied hard clause (common when MC-SAT retains nothing, or
/// when the current sample already satisfies everything retained) still needs `max_flips`
/// worth of simulated-annealing proposals over its flippable atoms to mix towards a
/// near-uniform sample; returning as soon as `all_hard_satisfied` holds would instead freeze
/// the very first assignment handed in, which is not a draw from anything.
pub fn solve(mrf: &mut Mrf, config: &Config, seed: u64, max_flips: usize, deadline: &Deadline) -> SampleSatOutcome {
    let hard_weight = config.hard_weight.value;
    let mut rng = rng::stream(seed, StreamTag::SampleSatSa);

    for _ in 0..max_flips {
        if deadline.has_expired() {
            return SampleSatOutcome { satisfied: mrf.all_hard_satisfied(hard_weight), timed_out: true };
        }

        if rng.gen_bool(config.simulated_annealing_samplesat_prob.value) {
            simulated_annealing_step(mrf, config, &mut rng);
        } else {
            walksat_step(mrf, config, hard_weight, &mut rng);
        }
    }

    SampleSatOutcome { satisfied: mrf.all_hard_satisfied(hard_weight), timed_out: false }
}

/// Proposes a uniformly random flippable atom and accepts it with probability
/// `min(1, exp(-delta_cost * sa_coef))` — a standard Metropolis acceptance rule, so a move
/// that lowers cost is always taken and one that raises it is taken with decreasing
/// probability as the rise (scaled by the inverse temperature `sa_coef`) grows.
fn simulated_annealing_step(mrf: &mut Mrf, config: &Config, rng: &mut impl rand_core::RngCore) {
    let atoms = flippable_atoms(mrf);
    if atoms.is_empty() {
        return;
    }
    let atom = atoms[rng.gen_range(0..atoms.len())];
    let delta = mrf.delta_cost(atom);
    let accept = delta <= 0.0 || rng.gen::<f64>() < (-delta * config.samplesat_sa_coef.value).exp();
    if accept {
        mrf.flip(atom);
    }
}

/// A single WalkSAT step (§4.5.2) restricted to clauses the sub-MRF marks hard.
fn walksat_step(mrf: &mut Mrf, config: &Config, hard_weight: f64, rng: &mut impl rand_core::RngCore) {
    let random_prob = config.walksat_random_step_probability.value;
    let Some(clause) = pick_unsatisfied_clause(mrf, rng, |c| c.is_hard(hard_weight)) else { return };
    let atom = pick_flip_atom(mrf, clause, random_prob, rng);
    mrf.flip(atom);
}
