/*!
The CNF oracle invoked during iterative unit propagation.

A real deployment typically shells out to an external SAT solver (a CDCL engine run as a
subprocess, fed a DIMACS dump) to ask "what does unit propagation alone already force on this
set of hard clauses?" — or, more expensively, "what is forced in *every* model" (the
backbone). [`UnitSolver`] fixes that boundary as a pure function from a CNF to a set of forced
literals; [`PlainUnitPropagationSolver`] and, behind the `backbone` feature,
[`BackboneSolver`], are small in-process reference implementations used by this crate's own
tests and demos in place of a real external process.
*/

use std::collections::HashMap;
use std::collections::HashSet;

use crate::error::UnitSolverError;
use crate::structures::atom::{AtomId, Literal};

/// The hard-clause CNF handed to a [`UnitSolver`] between grounding steps.
#[derive(Clone, Debug, Default)]
pub struct Cnf {
    pub num_atoms: usize,
    pub clauses: Vec<Vec<Literal>>,
}

impl Cnf {
    pub fn new(num_atoms: usize) -> Self {
        Cnf { num_atoms, clauses: Vec::new() }
    }

    pub fn push_clause(&mut self, lits: Vec<Literal>) {
        self.clauses.push(lits);
    }

    /// Renders this CNF in DIMACS form, for a solver invoked as an external process:
    ///
    /// ```text
    /// p cnf <numAtoms> <numClauses>
    /// <lit>* 0
    /// ```
    pub fn to_dimacs(&self) -> String {
        let mut out = format!("p cnf {} {}\n", self.num_atoms, self.clauses.len());
        for clause in &self.clauses {
            for lit in clause {
                out.push_str(&lit.raw().to_string());
                out.push(' ');
            }
            out.push_str("0\n");
        }
        out
    }
}

/// A pure oracle from a CNF to the literals unit propagation (or, for an implementation that
/// supports it, backbone computation) forces.
///
/// Must not retain state across calls: each call receives the complete CNF accumulated so
/// far and answers independently of any previous call.
pub trait UnitSolver {
    /// Every literal forced by this CNF. Empty on a CNF with no unit consequences.
    /// `Err(UnitSolverError::Unsat)` if the CNF is itself contradictory.
    fn units(&self, cnf: &Cnf) -> Result<HashSet<Literal>, UnitSolverError>;
}

/// Propagates units to a fixed point against `clauses`, extending `assigned` in place.
/// Returns `false` on conflict, leaving `assigned` in whatever partial state it reached.
fn propagate(clauses: &[Vec<Literal>], assigned: &mut HashMap<AtomId, bool>) -> bool {
    loop {
        let mut progressed = false;
        for clause in clauses {
            let mut satisfied = false;
            let mut unassigned_count = 0;
            let mut last_unassigned = None;

            for lit in clause {
                match assigned.get(&lit.atom()) {
                    Some(v) if *v == lit.polarity() => {
                        satisfied = true;
                        break;
                    }
                    Some(_) => {}
                    None => {
                        unassigned_count += 1;
                        last_unassigned = Some(*lit);
                    }
                }
            }

            if satisfied {
                continue;
            }
            if unassigned_count == 0 {
                return false;
            }
            if unassigned_count == 1 {
                let lit = last_unassigned.expect("counted exactly one unassigned literal");
                assigned.insert(lit.atom(), lit.polarity());
                progressed = true;
            }
        }
        if !progressed {
            return true;
        }
    }
}

/// Unit propagation only: the weakest (and cheapest) reading of `UnitSolver`.
#[derive(Clone, Copy, Debug, Default)]
pub struct PlainUnitPropagationSolver;

impl UnitSolver for PlainUnitPropagationSolver {
    fn units(&self, cnf: &Cnf) -> Result<HashSet<Literal>, UnitSolverError> {
        let mut assigned = HashMap::new();
        if !propagate(&cnf.clauses, &mut assigned) {
            return Err(UnitSolverError::Unsat);
        }
        Ok(assigned.into_iter().map(|(a, v)| Literal::new(a, v)).collect())
    }
}

/// A complete DPLL search, used both to find a witness model and, atom by atom, to test
/// whether forcing the opposite value is still satisfiable.
#[cfg(feature = "backbone")]
fn dpll(num_atoms: usize, clauses: &[Vec<Literal>], assigned: &mut HashMap<AtomId, bool>) -> bool {
    if !propagate(clauses, assigned) {
        return false;
    }

    let next_unassigned = (1..=num_atoms as AtomId).find(|a| !assigned.contains_key(a));
    let Some(atom) = next_unassigned else { return true };

    for candidate in [true, false] {
        let mut trial = assigned.clone();
        trial.insert(atom, candidate);
        if dpll(num_atoms, clauses, &mut trial) {
            *assigned = trial;
            return true;
        }
    }
    false
}

/// Computes the true backbone: literals true in every satisfying assignment, not merely those
/// unit propagation alone derives. Finds one witness model, then for each atom it didn't
/// already pin, checks whether the opposite value is still satisfiable.
///
/// A reference implementation only: this is `O(num_atoms)` complete-solver calls, each
/// exponential in the worst case, and is meant for the modestly sized CNFs this crate's own
/// tests and demos produce, not for standing in as a production backbone oracle.
#[cfg(feature = "backbone")]
#[derive(Clone, Copy, Debug, Default)]
pub struct BackboneSolver;

#[cfg(feature = "backbone")]
impl UnitSolver for BackboneSolver {
    fn units(&self, cnf: &Cnf) -> Result<HashSet<Literal>, UnitSolverError> {
        let mut root = HashMap::new();
        if !propagate(&cnf.clauses, &mut root) {
            return Err(UnitSolverError::Unsat);
        }

        let mut model = root.clone();
        if !dpll(cnf.num_atoms, &cnf.clauses, &mut model) {
            return Err(UnitSolverError::Unsat);
        }

        let mut backbone: HashSet<Literal> =
            root.iter().map(|(a, v)| Literal::new(*a, *v)).collect();

        for atom in 1..=cnf.num_atoms as AtomId {
            if root.contains_key(&atom) {
                continue;
            }
            let value = model[&atom];
            let mut trial = HashMap::new();
            trial.insert(atom, !value);
            if !dpll(cnf.num_atoms, &cnf.clauses, &mut trial) {
                backbone.insert(Literal::new(atom, value));
            }
        }

        Ok(backbone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(a: i32) -> Literal {
        if a > 0 { Literal::new(a, true) } else { Literal::new(-a, false) }
    }

    #[test]
    fn dimacs_rendering_matches_the_expected_shape() {
        let mut cnf = Cnf::new(2);
        cnf.push_clause(vec![lit(1), lit(-2)]);
        assert_eq!(cnf.to_dimacs(), "p cnf 2 1\n1 -2 0\n");
    }

    #[test]
    fn plain_solver_derives_a_chain_of_units() {
        let mut cnf = Cnf::new(3);
        cnf.push_clause(vec![lit(1)]);
        cnf.push_clause(vec![lit(-1), lit(2)]);
        cnf.push_clause(vec![lit(-2), lit(3)]);

        let units = PlainUnitPropagationSolver.units(&cnf).unwrap();
        assert_eq!(units.len(), 3);
        assert!(units.contains(&lit(1)));
        assert!(units.contains(&lit(2)));
        assert!(units.contains(&lit(3)));
    }

    #[test]
    fn plain_solver_detects_contradiction() {
        let mut cnf = Cnf::new(1);
        cnf.push_clause(vec![lit(1)]);
        cnf.push_clause(vec![lit(-1)]);
        assert_eq!(PlainUnitPropagationSolver.units(&cnf), Err(UnitSolverError::Unsat));
    }

    #[test]
    fn plain_solver_is_silent_without_units() {
        let mut cnf = Cnf::new(2);
        cnf.push_clause(vec![lit(1), lit(2)]);
        let units = PlainUnitPropagationSolver.units(&cnf).unwrap();
        assert!(units.is_empty());
    }

    #[cfg(feature = "backbone")]
    #[test]
    fn backbone_solver_finds_literals_unit_propagation_misses() {
        // (a v b) & (-a v b) & (a v -b): unit propagation alone derives nothing, but b is
        // true in every model (a=false forces b via clause 1; a=true forces b via clause 3).
        let mut cnf = Cnf::new(2);
        cnf.push_clause(vec![lit(1), lit(2)]);
        cnf.push_clause(vec![lit(-1), lit(2)]);
        cnf.push_clause(vec![lit(1), lit(-2)]);

        let units = PlainUnitPropagationSolver.units(&cnf).unwrap();
        assert!(units.is_empty());

        let backbone = BackboneSolver.units(&cnf).unwrap();
        assert_eq!(backbone, HashSet::from([lit(2)]));
    }

    #[cfg(feature = "backbone")]
    #[test]
    fn backbone_solver_detects_contradiction() {
        let mut cnf = Cnf::new(1);
        cnf.push_clause(vec![lit(1)]);
        cnf.push_clause(vec![lit(-1)]);
        assert_eq!(BackboneSolver.units(&cnf), Err(UnitSolverError::Unsat));
    }
}
