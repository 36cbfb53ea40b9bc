/*!
Post-grounding unit propagation (§4.4): a fixed-point pass over an already-built [`Mrf`] that
pins every atom unit propagation forces from the hard clauses, drops clauses it satisfies, and
shortens clauses it partially falsifies — producing a smaller `Mrf` a [`Sampler`](crate::sampler)
never has to reconsider those atoms or clauses against.

Distinct from the [`Grounder`](crate::grounder::Grounder)'s *iterative* unit propagation, which
interleaves the same idea with grounding itself to prune what gets ground in the first place;
this pass runs once, after grounding, over the complete set of hard clauses.
*/

use std::collections::{HashMap, HashSet, VecDeque};

use crate::error::PropagationError;
use crate::mrf::Mrf;
use crate::structures::atom::AtomId;
use crate::structures::clause::{ClauseId, GClause};

/// The outcome of a successful propagation: the simplified `Mrf` and the pinned atoms that
/// were removed from it (for the driver to fold into the final per-atom output).
pub struct PropagationOutcome {
    pub mrf: Mrf,
    pub pinned: HashMap<AtomId, bool>,
}

/// Runs unit propagation to a fixed point on `mrf`, then returns a compacted `Mrf` with every
/// pinned atom and the clauses it satisfied removed.
///
/// `Err(PropagationError::Unsat)` if two hard unit clauses (or a hard unit and a clause
/// shortened down to empty) disagree on some atom's forced value.
pub fn propagate(mut mrf: Mrf, hard_weight: f64) -> Result<PropagationOutcome, PropagationError> {
    let pinned = run_fixed_point(&mut mrf, hard_weight)?;

    let compacted = mrf
        .compact(&pinned, hard_weight)
        .expect("fixed-point propagation already rejects any hard contradiction it would find");

    Ok(PropagationOutcome { mrf: compacted, pinned })
}

fn run_fixed_point(mrf: &mut Mrf, hard_weight: f64) -> Result<HashMap<AtomId, bool>, PropagationError> {
    let mut queue: VecDeque<ClauseId> = VecDeque::new();
    let mut queued: HashSet<ClauseId> = HashSet::new();
    for (id, clause) in mrf.clauses() {
        if clause.is_hard(hard_weight) && clause.is_unit() {
            queue.push_back(id);
            queued.insert(id);
        }
    }

    let mut pinned: HashMap<AtomId, bool> = HashMap::new();

    while let Some(cid) = queue.pop_front() {
        queued.remove(&cid);
        let Some(clause) = mrf.clause(cid) else { continue };
        let Some(lit) = clause.unit_literal() else { continue };
        let atom = lit.atom();
        let value = lit.polarity();

        if let Some(&existing) = pinned.get(&atom) {
            if existing != value {
                return Err(PropagationError::Unsat { atom, offending_clause: cid });
            }
            mrf.retire_clause(cid);
            continue;
        }

        pinned.insert(atom, value);
        mrf.atom_mut(atom).pinned = Some(value);
        mrf.retire_clause(cid);

        log::trace!(target: crate::log_targets::PROPAGATION, "pinned atom {atom} := {value}");

        let incident: Vec<ClauseId> = mrf.incidence(atom).collect();
        for c in incident {
            let Some(clause) = mrf.clause(c) else { continue };
            if clause.contains(lit) {
                mrf.retire_clause(c);
                continue;
            }

            let before = clause.lits().len();
            let mut new_lits = clause.lits().to_vec();
            new_lits.retain(|&l| l != lit.negate());
            if new_lits.len() == before {
                continue;
            }

            let weight = clause.weight;
            let was_hard = clause.is_hard(hard_weight);

            if new_lits.is_empty() {
                if was_hard {
                    return Err(PropagationError::Unsat { atom, offending_clause: c });
                }
                // A soft clause struck down to nothing can never be satisfied again; it
                // contributes a fixed `|weight|` to the cost of every remaining world, which
                // is a constant the sampler's argmax/marginals are invariant to, so dropping
                // it rather than tracking an offset is exact, not approximate.
                mrf.retire_clause(c);
                continue;
            }

            let rebuilt = GClause::with_consolidated_weight(new_lits, weight)
                .expect("weight is unchanged and was already non-zero");
            let now_unit_hard = rebuilt.is_unit() && rebuilt.is_hard(hard_weight);
            mrf.shorten_clause(c, rebuilt);

            if now_unit_hard && !queued.contains(&c) {
                queue.push_back(c);
                queued.insert(c);
            }
        }
    }

    Ok(pinned)
}
