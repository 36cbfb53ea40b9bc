//! Typed relations evidence and queries range over.

/// Identifies a predicate within a [`Grounder`](crate::grounder::Grounder)'s universe.
pub type PredicateId = u32;

/// A named typed relation with fixed arity.
///
/// Predicates do not carry their own argument domains directly — an implementation's
/// [`GroundStore`](crate::ground_store::GroundStore) owns the typed constants and is
/// responsible for enumerating groundings consistent with them. What a `Predicate` fixes here
/// is the shape and the flags that govern how atoms of this predicate are activated and
/// whether key-constraint clauses apply to it.
#[derive(Clone, Debug)]
pub struct Predicate {
    pub id: PredicateId,
    pub name: String,
    pub arity: usize,

    /// Tuples absent from evidence are implicitly false (closed-world assumption).
    pub closed_world: bool,

    /// Evidence only: never a query atom, never flipped by a sampler.
    pub immutable: bool,

    /// At least one atom of this predicate carries a soft-evidence prior rather than a fixed
    /// truth value.
    pub has_soft_evidence: bool,

    /// Argument positions forming the key of a functional dependency, if any.
    pub key_attrs: Vec<usize>,

    /// Argument positions functionally dependent on `key_attrs`.
    pub dependent_attrs: Vec<usize>,
}

impl Predicate {
    pub fn new(id: PredicateId, name: impl Into<String>, arity: usize) -> Self {
        Predicate {
            id,
            name: name.into(),
            arity,
            closed_world: true,
            immutable: false,
            has_soft_evidence: false,
            key_attrs: Vec::new(),
            dependent_attrs: Vec::new(),
        }
    }

    /// Whether this predicate has a functional-dependency key constraint to enforce.
    pub fn has_key_constraint(&self) -> bool {
        !self.key_attrs.is_empty() && !self.dependent_attrs.is_empty()
    }

    pub fn with_key(mut self, key_attrs: Vec<usize>, dependent_attrs: Vec<usize>) -> Self {
        self.key_attrs = key_attrs;
        self.dependent_attrs = dependent_attrs;
        self
    }

    pub fn immutable(mut self) -> Self {
        self.immutable = true;
        self
    }

    pub fn with_soft_evidence(mut self) -> Self {
        self.has_soft_evidence = true;
        self
    }

    /// A predicate is "completely specified" when evidence lists both positive and negative
    /// ground atoms explicitly, so the closed-world assumption does not apply to it. This is
    /// a property of the evidence a `GroundStore` holds, not of the
    /// `Predicate` value itself, so it is exposed here only as documentation: implementations
    /// of [`GroundStore`](crate::ground_store::GroundStore) decide it per predicate.
    pub fn closed_world_applies(&self) -> bool {
        self.closed_world
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_constraint_requires_both_key_and_dependent_attrs() {
        let p = Predicate::new(0, "P", 2);
        assert!(!p.has_key_constraint());

        let p = Predicate::new(0, "P", 2).with_key(vec![0], vec![1]);
        assert!(p.has_key_constraint());
    }
}
