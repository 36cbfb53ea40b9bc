//! Black-box integration tests exercising the driver end to end against a handful of the
//! scenarios its component unit tests already cover individually, using only the crate's
//! public surface and its reference `GroundStore`/`UnitSolver` implementations.

use mln_core::config::Config;
use mln_core::driver::InferenceDriver;
use mln_core::error::{ErrorKind, GroundingError, PropagationError};
use mln_core::ground_store::{ClauseTemplate, InMemoryGroundStore, TemplateLiteral};
use mln_core::structures::predicate::Predicate;
use mln_core::timer::Deadline;
use mln_core::unit_solver::PlainUnitPropagationSolver;

const P: u32 = 0;
const Q: u32 = 1;

#[test]
fn scenario_1_single_hard_unit_resolves_to_certainty() {
    let mut store = InMemoryGroundStore::new();
    let p = Predicate::new(P, "X", 0);
    store.register_predicate(p.clone());
    store.register_atom(P, vec![]);

    let template = ClauseTemplate::new(0, vec![TemplateLiteral::new(P, vec![], true)], 1e8);

    let mut config = Config::default();
    config.mcsat_samples.value = 5;
    let driver = InferenceDriver::new(config);

    let outcome = driver
        .run(vec![p], vec![template], &mut store, &PlainUnitPropagationSolver, 1, Deadline::none())
        .unwrap();

    assert_eq!(outcome.marginals.len(), 1);
    assert_eq!(outcome.marginals[0].probability, 1.0);
    assert_eq!(outcome.metrics.number_ground_atoms, 1);
}

#[test]
fn scenario_2_conflicting_hard_units_are_rejected() {
    let mut store = InMemoryGroundStore::new();
    let p = Predicate::new(P, "X", 0);
    store.register_predicate(p.clone());
    store.register_atom(P, vec![]);

    let templates = vec![
        ClauseTemplate::new(0, vec![TemplateLiteral::new(P, vec![], true)], 1e8),
        ClauseTemplate::new(1, vec![TemplateLiteral::new(P, vec![], false)], 1e8),
    ];

    let driver = InferenceDriver::new(Config::default());
    let result = driver.run(vec![p], templates, &mut store, &PlainUnitPropagationSolver, 1, Deadline::none());

    // Iterative unit propagation during grounding may catch the contradiction first
    // (GroundingError::Unsat); if IUP is disabled it surfaces from post-grounding
    // UnitPropagator instead (PropagationError::Unsat). Either is a correct report of the
    // same underlying contradiction.
    match result {
        Err(ErrorKind::Grounding(GroundingError::Unsat)) => {}
        Err(ErrorKind::Propagation(PropagationError::Unsat { .. })) => {}
        other => panic!("expected a contradiction error, got {other:?}"),
    }
}

#[test]
fn scenario_3_key_constraint_forbids_two_true_dependents() {
    let mut store = InMemoryGroundStore::new();
    let age = Predicate::new(P, "Age", 2).with_key(vec![0], vec![1]);
    store.register_predicate(age.clone());

    let a1 = store.register_atom(P, vec![1, 30]);
    let a2 = store.register_atom(P, vec![1, 40]);
    store.set_evidence(a1, true);
    store.set_evidence(a2, true);

    let mut config = Config::default();
    config.mcsat_samples.value = 200;
    let driver = InferenceDriver::new(config);
    let result = driver.run(vec![age], vec![], &mut store, &PlainUnitPropagationSolver, 1, Deadline::none());

    // The mutex clause is binary, not unit, so `UnitPropagator` never enqueues it and the
    // pipeline runs to completion rather than erroring — the contradiction instead shows up
    // as a hard clause MC-SAT's inner SampleSAT can never satisfy (both atoms are fixed
    // evidence, so neither is flippable), which the driver reports via the sampler's failure
    // counter rather than a propagated error.
    let outcome = result.expect("a non-unit mutex clause does not raise UnitPropagator::Unsat");
    assert!(outcome.metrics.mcsat_steps_where_samplesat_fails > 0);
}

#[test]
fn scenario_4_mcsat_converges_to_the_sigmoid_of_the_unit_weight() {
    let mut store = InMemoryGroundStore::new();
    let p = Predicate::new(P, "X", 0).with_soft_evidence();
    store.register_predicate(p.clone());
    let atom = store.register_atom(P, vec![]);
    store.set_prior(atom, 1.0 / (1.0 + (-1.0_f64).exp()));

    let mut config = Config::default();
    config.mcsat_samples.value = 50_000;
    config.unit_propagate = false;
    let driver = InferenceDriver::new(config);

    let outcome = driver.run(vec![p], vec![], &mut store, &PlainUnitPropagationSolver, 99, Deadline::none()).unwrap();

    let marginal = outcome.marginals.iter().find(|m| m.atom == atom).unwrap();
    let expected = 1.0 / (1.0 + (-1.0_f64).exp());
    assert!((marginal.probability - expected).abs() < 0.03, "p_hat={} expected={expected}", marginal.probability);
}

#[test]
fn scenario_6_closure_stays_minimal_over_a_large_implication() {
    let mut store = InMemoryGroundStore::new();
    let p = Predicate::new(P, "P", 1);
    let q = Predicate::new(Q, "Q", 1);
    store.register_predicate(p.clone());
    store.register_predicate(q.clone());

    for x in 1..=500u32 {
        let p_atom = store.register_atom(P, vec![x]);
        store.set_evidence(p_atom, true);
        store.register_atom(Q, vec![x]);
    }

    let template = ClauseTemplate::new(
        0,
        vec![TemplateLiteral::new(P, vec![10], false), TemplateLiteral::new(Q, vec![10], true)],
        1.0,
    );

    let mut config = Config::default();
    config.mcsat_samples.value = 5;
    let driver = InferenceDriver::new(config);

    let outcome = driver
        .run(vec![p, q], vec![template], &mut store, &PlainUnitPropagationSolver, 1, Deadline::none())
        .unwrap();

    assert_eq!(outcome.metrics.number_ground_clauses, 500);
    assert_eq!(store.active_atoms_of(P).len(), 0);
    assert_eq!(store.active_atoms_of(Q).len(), 500);
}
