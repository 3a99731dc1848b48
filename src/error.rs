// Error types for phase-space construction.
//
// Only configuration problems are errors. A kinematically impossible point
// is an ordinary outcome of sampling and is reported through
// `TrialOutcome` instead.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum KinematicsError {
    #[error("{topology}: unsupported central multiplicity {multiplicity}")]
    UnsupportedMultiplicity {
        topology: &'static str,
        multiplicity: usize,
    },

    #[error("Malformed cut '{name}': [min, max] = [{min}, {max}]")]
    MalformedCut { name: &'static str, min: f64, max: f64 },

    #[error("{topology}: decay tree first level has {found} particles (expected {expected})")]
    TopologyMismatch {
        topology: &'static str,
        expected: String,
        found: usize,
    },

    #[error("Random vector length mismatch: expected {expected}, got {found}")]
    RandomVectorLength { expected: usize, found: usize },

    #[error("Invalid beams: {0}")]
    InvalidBeams(String),

    #[error("Invalid decay tree: {0}")]
    InvalidDecayTree(String),

    #[error("{context}: no valid mass configuration after {trials} trials, check the decay mode and cuts")]
    IterationExhausted { context: String, trials: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, KinematicsError>;
