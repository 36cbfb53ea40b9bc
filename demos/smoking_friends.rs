//! The canonical "smokers and friends" MLN: `Smokes(x) => Cancer(x)` and
//! `Friends(x, y) & Smokes(x) => Smokes(y)`, over a tiny social network with partial evidence.
//!
//! Run with `cargo run --example smoking_friends`.

use mln_core::config::Config;
use mln_core::driver::InferenceDriver;
use mln_core::ground_store::{ClauseTemplate, InMemoryGroundStore, TemplateLiteral};
use mln_core::structures::predicate::Predicate;
use mln_core::timer::Deadline;
use mln_core::unit_solver::PlainUnitPropagationSolver;

const SMOKES: u32 = 0;
const CANCER: u32 = 1;
const FRIENDS: u32 = 2;

fn main() {
    env_logger::init();

    let mut store = InMemoryGroundStore::new();

    let smokes = Predicate::new(SMOKES, "Smokes", 1).with_soft_evidence();
    let cancer = Predicate::new(CANCER, "Cancer", 1);
    let friends = Predicate::new(FRIENDS, "Friends", 2).immutable();

    store.register_predicate(smokes.clone());
    store.register_predicate(cancer.clone());
    store.register_predicate(friends.clone());

    // People: Anna (1), Bob (2), Carl (3).
    let anna_smokes = store.register_atom(SMOKES, vec![1]);
    let bob_smokes = store.register_atom(SMOKES, vec![2]);
    let _carl_smokes = store.register_atom(SMOKES, vec![3]);
    store.register_atom(CANCER, vec![1]);
    store.register_atom(CANCER, vec![2]);
    store.register_atom(CANCER, vec![3]);

    // Anna is known to smoke; Bob's habit is uncertain but likely (soft evidence); Carl is
    // query-only (no prior at all, so he starts outside the closure until a rule pulls him in).
    store.set_evidence(anna_smokes, true);
    store.set_prior(bob_smokes, 0.8);

    let anna_bob = store.register_atom(FRIENDS, vec![1, 2]);
    let bob_carl = store.register_atom(FRIENDS, vec![2, 3]);
    store.set_evidence(anna_bob, true);
    store.set_evidence(bob_carl, true);

    // Smokes(x) => Cancer(x), weight 1.5.
    let smoking_causes_cancer = ClauseTemplate::new(
        0,
        vec![
            TemplateLiteral::new(SMOKES, vec![0], false),
            TemplateLiteral::new(CANCER, vec![0], true),
        ],
        1.5,
    );

    // Friends(x, y) & Smokes(x) => Smokes(y), weight 1.1.
    let friends_influence = ClauseTemplate::new(
        1,
        vec![
            TemplateLiteral::new(FRIENDS, vec![0, 1], false),
            TemplateLiteral::new(SMOKES, vec![0], false),
            TemplateLiteral::new(SMOKES, vec![1], true),
        ],
        1.1,
    );

    let mut config = Config::default();
    config.mcsat_samples.value = 20_000;

    let driver = InferenceDriver::new(config);
    let outcome = driver
        .run(
            vec![smokes, cancer, friends],
            vec![smoking_causes_cancer, friends_influence],
            &mut store,
            &PlainUnitPropagationSolver,
            42,
            Deadline::none(),
        )
        .expect("this MLN has no hard contradictions");

    println!("grounded {} atoms, {} clauses ({} units)",
        outcome.metrics.number_ground_atoms,
        outcome.metrics.number_ground_clauses,
        outcome.metrics.number_units,
    );

    let mut marginals = outcome.marginals;
    marginals.sort_by_key(|m| m.atom);
    for m in &marginals {
        println!("atom {} (predicate {}, terms {:?}): p = {:.3}", m.atom, m.predicate, m.terms, m.probability);
    }
}
