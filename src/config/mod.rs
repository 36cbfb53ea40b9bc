/*!
Configuration of an [`InferenceDriver`](crate::driver::InferenceDriver).

Every knob the pipeline exposes is a field here, each wrapped in a [`ConfigOption`] so a host
can enforce reasonable bounds without threading validation through every phase of the
pipeline — [`Config::validate`] is called once, at driver construction.
*/

mod config_option;
pub use config_option::ConfigOption;

use crate::error::ConfigError;

/// Threshold above which `|clause.weight| ` makes a clause hard. Default matches the
/// reference system's `1e7`.
pub const DEFAULT_HARD_WEIGHT: f64 = 1e7;

/// The full configuration surface of the pipeline.
#[derive(Clone, Debug)]
pub struct Config {
    /// Weight magnitude at or above which a clause is treated as hard.
    pub hard_weight: ConfigOption<f64>,

    /// Per-try WalkSAT flip budget. `0` means `100 * num_atoms`, resolved by the sampler.
    pub max_flips: ConfigOption<usize>,

    /// WalkSAT restart count. `0` means `3`, resolved by the sampler.
    pub max_tries: ConfigOption<usize>,

    /// Number of MC-SAT samples to draw for marginal inference.
    pub mcsat_samples: ConfigOption<usize>,

    /// Probability of a pure random step (rather than a greedy one) in WalkSAT.
    pub walksat_random_step_probability: ConfigOption<f64>,

    /// Probability SampleSAT takes a simulated-annealing step rather than a restricted
    /// WalkSAT step.
    pub simulated_annealing_samplesat_prob: ConfigOption<f64>,

    /// Inverse temperature used by SampleSAT's simulated-annealing acceptance rule.
    pub samplesat_sa_coef: ConfigOption<f64>,

    /// Prior lower bound above which a soft-evidence atom seeds the closure.
    pub soft_evidence_activation_threshold: ConfigOption<f64>,

    /// Enable interleaving hard-clause grounding with unit propagation.
    pub iterative_unit_propagate: bool,

    /// Enable full post-grounding unit propagation.
    pub unit_propagate: bool,

    /// Records whether the pipeline is intended to run with a full backbone computation
    /// rather than plain unit propagation. The [`UnitSolver`](crate::unit_solver::UnitSolver)
    /// itself is supplied by the caller as a type parameter of
    /// [`InferenceDriver::run`](crate::driver::InferenceDriver::run), so this flag cannot
    /// switch implementations at runtime — the actual substitution is the caller choosing
    /// between [`PlainUnitPropagationSolver`](crate::unit_solver::PlainUnitPropagationSolver)
    /// and, behind the crate's `backbone` feature,
    /// [`BackboneSolver`](crate::unit_solver::BackboneSolver). This field exists so a caller's
    /// own config plumbing has one place to record and report that choice alongside every
    /// other pipeline knob.
    pub use_backbones: bool,

    /// Bypass closure and activate every atom of unknown truth.
    pub mark_all_atoms_active: bool,

    /// If `false`, emit an existence clause per key alongside each key-constraint's mutual
    /// exclusion clauses.
    pub key_constraint_allows_null_label: bool,

    /// Ceiling on the number of ground clauses before grounding aborts with
    /// [`GroundingError::Oversize`](crate::error::GroundingError::Oversize).
    pub clause_count_ceiling: ConfigOption<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            hard_weight: ConfigOption {
                name: "hard_weight",
                min: 1.0,
                max: f64::MAX,
                value: DEFAULT_HARD_WEIGHT,
            },

            max_flips: ConfigOption {
                name: "max_flips",
                min: 0,
                max: usize::MAX,
                value: 0,
            },

            max_tries: ConfigOption {
                name: "max_tries",
                min: 0,
                max: usize::MAX,
                value: 0,
            },

            mcsat_samples: ConfigOption {
                name: "mcsat_samples",
                min: 0,
                max: usize::MAX,
                value: 1000,
            },

            walksat_random_step_probability: ConfigOption {
                name: "walksat_random_step_probability",
                min: 0.0,
                max: 1.0,
                value: 0.5,
            },

            simulated_annealing_samplesat_prob: ConfigOption {
                name: "simulated_annealing_samplesat_prob",
                min: 0.0,
                max: 1.0,
                value: 0.5,
            },

            samplesat_sa_coef: ConfigOption {
                name: "samplesat_sa_coef",
                min: 0.0,
                max: f64::MAX,
                value: 1.0,
            },

            soft_evidence_activation_threshold: ConfigOption {
                name: "soft_evidence_activation_threshold",
                min: 0.0,
                max: 1.0,
                value: 0.0,
            },

            iterative_unit_propagate: true,
            unit_propagate: true,
            use_backbones: false,
            mark_all_atoms_active: false,
            key_constraint_allows_null_label: true,

            clause_count_ceiling: ConfigOption {
                name: "clause_count_ceiling",
                min: 1,
                max: usize::MAX,
                value: 50_000_000,
            },
        }
    }
}

impl Config {
    /// Validates every bounded option and the cross-field rule that `mcsat_samples > 0`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.hard_weight.check()?;
        self.max_flips.check()?;
        self.max_tries.check()?;
        self.mcsat_samples.check()?;
        self.walksat_random_step_probability.check()?;
        self.simulated_annealing_samplesat_prob.check()?;
        self.samplesat_sa_coef.check()?;
        self.soft_evidence_activation_threshold.check()?;
        self.clause_count_ceiling.check()?;

        if self.mcsat_samples.value == 0 {
            return Err(ConfigError::NonPositiveSampleCount);
        }

        Ok(())
    }

    /// Resolves `max_flips = 0` to `100 * num_atoms`.
    pub fn resolved_max_flips(&self, num_atoms: usize) -> usize {
        if self.max_flips.value == 0 {
            100 * num_atoms.max(1)
        } else {
            self.max_flips.value
        }
    }

    /// Resolves `max_tries = 0` to `3`.
    pub fn resolved_max_tries(&self) -> usize {
        if self.max_tries.value == 0 {
            3
        } else {
            self.max_tries.value
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn zero_samples_is_invalid() {
        let mut cfg = Config::default();
        cfg.mcsat_samples.value = 0;
        assert_eq!(cfg.validate(), Err(ConfigError::NonPositiveSampleCount));
    }

    #[test]
    fn out_of_range_probability_is_invalid() {
        let mut cfg = Config::default();
        cfg.walksat_random_step_probability.value = 1.5;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::OutOfRange { name: "walksat_random_step_probability", .. })
        ));
    }

    #[test]
    fn resolves_zero_max_flips_and_tries() {
        let cfg = Config::default();
        assert_eq!(cfg.resolved_max_flips(50), 5000);
        assert_eq!(cfg.resolved_max_tries(), 3);
    }
}
