//! A functional-dependency demo: `Age(person, value)` keyed on `person`. One tuple is fixed
//! evidence; a second candidate tuple for the same key is a query atom with a soft prior, so
//! the key-constraint clause the grounder emits is a genuine mutual exclusion the sampler has
//! to resolve, rather than a standing contradiction between two pieces of fixed evidence.
//!
//! Run with `cargo run --example key_constraint`.

use mln_core::config::Config;
use mln_core::driver::InferenceDriver;
use mln_core::ground_store::InMemoryGroundStore;
use mln_core::structures::predicate::Predicate;
use mln_core::timer::Deadline;
use mln_core::unit_solver::PlainUnitPropagationSolver;

const AGE: u32 = 0;

fn main() {
    env_logger::init();

    let mut store = InMemoryGroundStore::new();

    // Position 0 (the person) is the key; position 1 (the age value) is the dependent attr:
    // a person has exactly one age.
    let age = Predicate::new(AGE, "Age", 2).with_key(vec![0], vec![1]).with_soft_evidence();
    store.register_predicate(age.clone());

    let person_is_thirty = store.register_atom(AGE, vec![1, 30]);
    let person_is_forty = store.register_atom(AGE, vec![1, 40]);
    store.set_evidence(person_is_thirty, true);
    store.set_prior(person_is_forty, 0.6);

    let mut config = Config::default();
    config.mcsat_samples.value = 1_000;

    let driver = InferenceDriver::new(config);
    let outcome = driver
        .run(vec![age], vec![], &mut store, &PlainUnitPropagationSolver, 7, Deadline::none())
        .expect("a key-constraint clause, not a contradiction, should resolve this");

    println!(
        "grounded {} atoms, {} clauses ({} key-constraint units derived)",
        outcome.metrics.number_ground_atoms, outcome.metrics.number_ground_clauses, outcome.metrics.number_units,
    );
    for m in &outcome.marginals {
        println!("atom {} terms {:?}: p = {:.3}", m.atom, m.terms, m.probability);
    }
}
