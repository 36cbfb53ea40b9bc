/*!
WalkSAT: the MAP (maximum a posteriori) sampler.

A straightforward greedy-with-noise local search, restarted `max_tries` times, each restart
running up to `max_flips` flips. Matches §4.5.2 of the spec this crate grounds on: pick an
unsatisfied clause uniformly, then within it either flip a uniformly random atom (with
probability [`Config::walksat_random_step_probability`]) or the atom that most reduces
[`Mrf::cost`], ties broken uniformly. The best assignment seen across every try/flip is
restored into `mrf` before returning, even if it never reaches `cost = 0`.
*/

use crate::config::Config;
use crate::error::{ErrorKind, SamplerError};
use crate::mrf::Mrf;
use crate::rng::{self, StreamTag};
use crate::timer::Deadline;

use super::support::{pick_flip_atom, pick_unsatisfied_clause, randomize, restore, snapshot};

/// The result of a WalkSAT run.
#[derive(Clone, Debug)]
pub struct WalkSatOutcome {
    /// Whether the returned assignment satisfies every hard clause (`cost = 0` on them).
    pub satisfied: bool,
    /// The cost of the assignment left in `mrf` (the best one observed across every try).
    pub cost: f64,
    /// Total flips performed across every try.
    pub flips: usize,
    /// Whether the deadline expired before a satisfying assignment (or the full budget) was
    /// reached.
    pub timed_out: bool,
}

/// Runs WalkSAT against `mrf`, leaving it at the best assignment found (by [`Mrf::cost`]).
///
/// Returns [`SamplerError::BudgetExhausted`] only when the full try/flip budget is spent
/// without satisfying every hard clause and no deadline intervened — a timeout is reported as
/// `Ok` with `timed_out: true`, since §7 treats it as cooperative cancellation rather than a
/// failure.
pub fn solve(mrf: &mut Mrf, config: &Config, seed: u64, deadline: &Deadline) -> Result<WalkSatOutcome, ErrorKind> {
    let max_flips = config.resolved_max_flips(mrf.num_atoms());
    let max_tries = config.resolved_max_tries();
    let hard_weight = config.hard_weight.value;
    let random_prob = config.walksat_random_step_probability.value;

    let mut rng = rng::stream(seed, StreamTag::WalkSat);

    let mut best_snapshot = snapshot(mrf);
    let mut best_cost = f64::INFINITY;
    let mut total_flips = 0usize;
    let mut timed_out = false;

    'tries: for _try in 0..max_tries.max(1) {
        randomize(mrf, &mut rng);
        mrf.recompute_sat_counts();
        let mut cost = mrf.cost();
        mrf.note_cost(cost);
        if cost < best_cost {
            best_cost = cost;
            best_snapshot = snapshot(mrf);
        }

        for _flip in 0..max_flips {
            if deadline.has_expired() {
                timed_out = true;
                break 'tries;
            }

            if cost == 0.0 && mrf.all_hard_satisfied(hard_weight) {
                return Ok(WalkSatOutcome { satisfied: true, cost: 0.0, flips: total_flips, timed_out: false });
            }

            let Some(clause) = pick_unsatisfied_clause(mrf, &mut rng, |_| true) else {
                // Nothing left this try can fix (every unsatisfied clause has no flippable
                // atom) — move to the next restart rather than spin.
                break;
            };
            let atom = pick_flip_atom(mrf, clause, random_prob, &mut rng);
            cost += mrf.flip(atom);
            total_flips += 1;
            mrf.note_cost(cost);

            if cost < best_cost {
                best_cost = cost;
                best_snapshot = snapshot(mrf);
            }
        }
    }

    restore(mrf, &best_snapshot);
    mrf.recompute_sat_counts();
    let satisfied = mrf.cost() == 0.0 && mrf.all_hard_satisfied(hard_weight);

    if satisfied {
        Ok(WalkSatOutcome { satisfied, cost: mrf.cost(), flips: total_flips, timed_out })
    } else if timed_out {
        Ok(WalkSatOutcome { satisfied, cost: mrf.cost(), flips: total_flips, timed_out })
    } else {
        Err(SamplerError::BudgetExhausted.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structures::atom::{Club, GroundAtom, Literal};
    use crate::structures::clause::GClause;

    fn atom(id: i32) -> GroundAtom {
        GroundAtom::new(id, 0, vec![], Club::Query)
    }

    fn clause(a: i32, b: i32, weight: f64) -> GClause {
        let la = if a > 0 { Literal::new(a, true) } else { Literal::new(-a, false) };
        let lb = if b > 0 { Literal::new(b, true) } else { Literal::new(-b, false) };
        match GClause::build(vec![la, lb], weight) {
            crate::structures::clause::BuildOutcome::Clause(c) => c,
            other => panic!("expected a clause, got {other:?}"),
        }
    }

    /// Scenario 5: `{+inf: x v y}, {+inf: -x v -y}` over 2 atoms — WalkSAT must find a
    /// satisfying assignment (x xor y) well within budget.
    #[test]
    fn satisfies_a_simple_xor_within_budget() {
        let hard = 1e7;
        for seed in 0..20u64 {
            let atoms = vec![atom(1), atom(2)];
            let clauses = vec![clause(1, 2, hard), clause(-1, -2, hard)];
            let mut mrf = Mrf::new(atoms, clauses);
            let mut config = Config::default();
            config.max_flips.value = 10;
            config.max_tries.value = 1;

            let outcome = solve(&mut mrf, &config, seed, &Deadline::none()).unwrap();
            assert!(outcome.satisfied, "seed {seed} failed to satisfy within budget");
            assert_eq!(mrf.cost(), 0.0);
        }
    }

    #[test]
    fn budget_exhausted_on_unsatisfiable_hard_clauses() {
        let hard = 1e7;
        let atoms = vec![atom(1)];
        // x and -x both hard: unsatisfiable.
        let clauses = vec![
            match GClause::build(vec![Literal::new(1, true)], hard) {
                crate::structures::clause::BuildOutcome::Clause(c) => c,
                _ => unreachable!(),
            },
            match GClause::build(vec![Literal::new(1, false)], hard) {
                crate::structures::clause::BuildOutcome::Clause(c) => c,
                _ => unreachable!(),
            },
        ];
        let mut mrf = Mrf::new(atoms, clauses);
        let mut config = Config::default();
        config.max_flips.value = 5;
        config.max_tries.value = 1;

        let result = solve(&mut mrf, &config, 1, &Deadline::none());
        assert!(matches!(result, Err(ErrorKind::Sampler(SamplerError::BudgetExhausted))));
    }
}
