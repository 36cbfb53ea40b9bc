//! Targets to be used within a [log]! macro.
//!
//! No logging backend is bundled. Calls to the `log` macros are made throughout the pipeline
//! to help a host binary trace a solve; picking and configuring a backend (`env_logger`,
//! `log4rs`, ...) is left to that binary.

/// Logs related to [grounding closure](crate::grounder).
pub const GROUNDING: &str = "grounding";

/// Logs related to [iterative unit propagation](crate::grounder) during grounding.
pub const IUP: &str = "iup";

/// Logs related to [consolidation](crate::grounder) of duplicate groundings.
pub const CONSOLIDATION: &str = "consolidation";

/// Logs related to post-grounding [unit propagation](crate::unit_propagator).
pub const PROPAGATION: &str = "propagation";

/// Logs related to [WalkSAT](crate::sampler::walksat).
pub const WALKSAT: &str = "walksat";

/// Logs related to [SampleSAT](crate::sampler::samplesat).
pub const SAMPLESAT: &str = "samplesat";

/// Logs related to [MC-SAT](crate::sampler::mcsat).
pub const MCSAT: &str = "mcsat";

/// Logs related to the [driver](crate::driver).
pub const DRIVER: &str = "driver";
