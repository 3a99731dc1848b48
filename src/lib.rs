pub mod boost;
pub mod collinear;
pub mod config;
pub mod continuum;
pub mod cuts;
pub mod decay;
pub mod decay_tree;
pub mod error;
pub mod event;
pub mod factorized;
pub mod four_vector;
pub mod linear;
pub mod longitudinal;
pub mod mass;
pub mod particle;
pub mod random;
pub mod sampler;
pub mod stats;
pub mod validity;
pub mod weight;

pub use boost::{BoostDirection, FrameBooster};
pub use collinear::CollinearSampler;
pub use config::{Beams, RunConfig};
pub use continuum::ContinuumSampler;
pub use cuts::{FiducialCuts, GenerationCuts};
pub use decay_tree::{DecayNode, DecayState, DecayTree, NodeId};
pub use error::{KinematicsError, Result};
pub use event::{AuxIntegrationData, KinematicEvent, MandelstamInvariants};
pub use factorized::FactorizedSampler;
pub use four_vector::FourMomentum;
pub use linear::LinearSystem;
pub use mass::{BreitWignerSampler, OffshellMassSampler, PoleMassSampler};
pub use particle::ParticleInfo;
pub use random::RandomVector;
pub use sampler::{event_weight, PhaseSpaceSampler, SamplerCore, SamplerOptions};
pub use stats::{PhaseSpaceCheck, WeightTally};
pub use validity::{ForwardRapidityVeto, RejectReason, TrialOutcome, ValidityGate, Veto};
