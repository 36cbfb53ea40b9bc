/*!
MC-SAT: the outer slice sampler that turns [`samplesat`](super::samplesat) draws into marginal
probability estimates (§4.5.4).

Each sample restricts the world to a uniformly-chosen satisfying region of the clauses
currently satisfied by the running assignment — hard clauses always, soft clauses
independently with probability `1 - exp(-|weight|)` — then asks [`samplesat::solve`] for a
near-uniform model of that region. Samples are therefore a Markov chain on `σ`, not
independent draws; reusing the previous `σ` on a SampleSAT failure keeps the chain valid rather
than restarting it.
*/

use rand::Rng;
use rand_core::RngCore;

use crate::config::Config;
use crate::metrics::Metrics;
use crate::mrf::Mrf;
use crate::rng::{self, StreamTag};
use crate::structures::atom::AtomId;
use crate::structures::clause::{BuildOutcome, GClause};
use crate::timer::Deadline;

use super::samplesat;

/// Per-atom and aggregate results of an MC-SAT run.
#[derive(Clone, Debug)]
pub struct McSatOutcome {
    /// `n_true[i]` is the number of samples in which atom `i + 1` held `true`. Immutable
    /// (fixed-evidence) atoms are not tallied — their marginal is definitionally `0` or `1`.
    pub n_true: Vec<u64>,
    /// Sum of `cost(σ)` (under the full MRF) across every sample drawn, for the driver's
    /// `sumCost / N` diagnostic.
    pub sum_cost: f64,
    /// Samples actually drawn before either the budget or the deadline was reached.
    pub samples_drawn: usize,
    /// Whether the deadline expired before `config.mcsat_samples` samples were drawn.
    pub timed_out: bool,
}

/// Runs MC-SAT for `config.mcsat_samples` samples starting from `mrf`'s current assignment,
/// mutating it in place to the final sample drawn. `metrics.mcsat_steps_where_samplesat_fails`
/// is incremented once per sample where the inner [`samplesat::solve`] failed to satisfy the
/// sub-MRF's hard clauses.
pub fn run(mrf: &mut Mrf, config: &Config, seed: u64, deadline: &Deadline, metrics: &mut Metrics) -> McSatOutcome {
    let hard_weight = config.hard_weight.value;
    let samples = config.mcsat_samples.value;
    let max_flips = config.resolved_max_flips(mrf.num_atoms());
    let mut retention_rng = rng::stream(seed, StreamTag::McSatRetention);

    let mut n_true = vec![0u64; mrf.num_atoms()];
    let mut sum_cost = 0.0;
    let mut drawn = 0usize;
    let mut timed_out = false;

    for i in 0..samples {
        if deadline.has_expired() {
            timed_out = true;
            break;
        }

        let sub_clauses = build_sub_mrf_clauses(mrf, hard_weight, &mut retention_rng);
        let mut sub = Mrf::new(mrf.atoms().to_vec(), sub_clauses);

        // A distinct, deterministic seed per sample so each SampleSAT draw is reproducible
        // without correlating with the clause-retention stream above.
        let sample_seed = seed ^ (i as u64).wrapping_mul(0x9E3779B97F4A7C15).wrapping_add(1);
        let outcome = samplesat::solve(&mut sub, config, sample_seed, max_flips, deadline);

        if outcome.satisfied {
            copy_truth_back(mrf, &sub);
        } else {
            log::warn!(
                target: crate::log_targets::MCSAT,
                "samplesat failed to satisfy sample {i}'s hard subset; reusing previous sample"
            );
            metrics.mcsat_steps_where_samplesat_fails += 1;
        }

        tally(mrf, &mut n_true);
        sum_cost += mrf.cost();
        drawn += 1;

        if outcome.timed_out {
            timed_out = true;
            break;
        }
    }

    McSatOutcome { n_true, sum_cost, samples_drawn: drawn, timed_out }
}

/// Builds the clause set of one sample's sub-MRF: every genuinely hard clause of `mrf`
/// unconditionally, plus each clause currently in `M` independently retained with probability
/// `1 - exp(-|weight|)`. Membership in `M` is "currently satisfied as written" for a
/// positive-weight clause, but per §4.5.4 a negative-weight clause's claim is the opposite of
/// what its literals say, so it belongs to `M` exactly when it is currently *unsatisfied* as
/// written. A retained clause with negative weight then has every literal negated before being
/// added as a hard constraint of the sub-MRF — the sub-MRF's only job is "satisfied or not",
/// so the original weight magnitude is not carried through; it already did its job by setting
/// the retention probability.
fn build_sub_mrf_clauses(mrf: &Mrf, hard_weight: f64, rng: &mut impl RngCore) -> Vec<GClause> {
    let mut out = Vec::new();
    for (id, clause) in mrf.clauses() {
        if clause.is_hard(hard_weight) {
            out.push(clause.clone());
            continue;
        }

        let in_m = if clause.weight < 0.0 { !mrf.is_satisfied(id) } else { mrf.is_satisfied(id) };
        if !in_m {
            continue;
        }

        let retain_prob = 1.0 - (-clause.weight.abs()).exp();
        if rng.gen::<f64>() >= retain_prob {
            continue;
        }

        let lits = if clause.weight < 0.0 {
            clause.lits().iter().map(|l| l.negate()).collect()
        } else {
            clause.lits().to_vec()
        };

        match GClause::build(lits, hard_weight) {
            BuildOutcome::Clause(c) => out.push(c),
            BuildOutcome::Tautology => {}
            BuildOutcome::Empty => unreachable!("literal count is preserved by negation"),
        }
    }
    out
}

/// Copies every non-immutable atom's truth value from a satisfied sub-MRF sample back onto
/// the running assignment. Both MRFs share the same atom id space (the sub-MRF is built from
/// a clone of `mrf`'s full atom list), so no remapping is needed.
fn copy_truth_back(mrf: &mut Mrf, sub: &Mrf) {
    for id in 1..=mrf.num_atoms() as AtomId {
        if mrf.atom(id).is_immutable_club() {
            continue;
        }
        let truth = sub.atom(id).truth;
        if mrf.atom(id).truth != truth {
            mrf.flip(id);
        }
    }
}

fn tally(mrf: &Mrf, n_true: &mut [u64]) {
    for (idx, atom) in mrf.atoms().iter().enumerate() {
        if !atom.is_immutable_club() && atom.truth {
            n_true[idx] += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structures::atom::{Club, GroundAtom, Literal};

    /// Scenario 4 / MC-SAT convergence law: a single soft unit clause `{x}` with weight `w`
    /// should converge to `p = sigma(w) = 1 / (1 + e^-w)`.
    #[test]
    fn converges_to_the_sigmoid_of_the_unit_weight() {
        let w = 1.0;
        let atoms = vec![GroundAtom::new(1, 0, vec![], Club::Query)];
        let clause = match GClause::build(vec![Literal::new(1, true)], w) {
            BuildOutcome::Clause(c) => c,
            _ => unreachable!(),
        };
        let mut mrf = Mrf::new(atoms, vec![clause]);

        let mut config = Config::default();
        config.mcsat_samples.value = 100_000;
        let mut metrics = Metrics::new();

        let outcome = run(&mut mrf, &config, 42, &Deadline::none(), &mut metrics);
        let p_hat = outcome.n_true[0] as f64 / outcome.samples_drawn as f64;
        let expected = 1.0 / (1.0 + (-w as f64).exp());
        assert!((p_hat - expected).abs() < 0.02, "p_hat={p_hat} expected={expected}");
    }

    /// Same law, stated for a negative weight: a single soft unit clause `{x}` with `w < 0`
    /// belongs to `M` when it is currently *unsatisfied* as written (§4.5.4), not when it's
    /// satisfied, and should still converge to `sigma(w)`.
    #[test]
    fn converges_to_the_sigmoid_of_a_negative_unit_weight() {
        let w = -1.0;
        let atoms = vec![GroundAtom::new(1, 0, vec![], Club::Query)];
        let clause = match GClause::build(vec![Literal::new(1, true)], w) {
            BuildOutcome::Clause(c) => c,
            _ => unreachable!(),
        };
        let mut mrf = Mrf::new(atoms, vec![clause]);

        let mut config = Config::default();
        config.mcsat_samples.value = 100_000;
        let mut metrics = Metrics::new();

        let outcome = run(&mut mrf, &config, 42, &Deadline::none(), &mut metrics);
        let p_hat = outcome.n_true[0] as f64 / outcome.samples_drawn as f64;
        let expected = 1.0 / (1.0 + (-w as f64).exp());
        assert!((p_hat - expected).abs() < 0.02, "p_hat={p_hat} expected={expected}");
    }

    #[test]
    fn samplesat_failure_reuses_the_previous_sample_and_is_counted() {
        // Two atoms with a hard clause that is always satisfiable, so SampleSAT should
        // essentially never fail here; this just exercises that the tally still advances
        // when `config.mcsat_samples` is small.
        let atoms = vec![GroundAtom::new(1, 0, vec![], Club::Query)];
        let clause = match GClause::build(vec![Literal::new(1, true)], 1e7) {
            BuildOutcome::Clause(c) => c,
            _ => unreachable!(),
        };
        let mut mrf = Mrf::new(atoms, vec![clause]);
        let mut config = Config::default();
        config.mcsat_samples.value = 10;
        let mut metrics = Metrics::new();

        let outcome = run(&mut mrf, &config, 1, &Deadline::none(), &mut metrics);
        assert_eq!(outcome.samples_drawn, 10);
        assert_eq!(outcome.n_true[0], 10);
    }
}
