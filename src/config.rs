// Run configuration shared read-only by every sampler and worker
use crate::cuts::{FiducialCuts, GenerationCuts};
use crate::error::{KinematicsError, Result};
use crate::four_vector::FourMomentum;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// Process-wide configuration handle, installed once.
static GLOBAL: OnceCell<Arc<RunConfig>> = OnceCell::new();

/// Default relative tolerance of the energy-momentum conservation check.
pub const DEFAULT_EMC_TOLERANCE: f64 = 1e-6;

/// Default cap on offshell mass resampling loops.
pub const DEFAULT_MAX_MASS_TRIALS: usize = 100_000;

/// The two incoming beams. Beam 1 travels along +z in the working frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Beams {
    pub beam1: FourMomentum,
    pub beam2: FourMomentum,
}

impl Beams {
    /// Back-to-back beams of equal energy sqrt_s/2 and mass `mass`.
    pub fn symmetric(sqrt_s: f64, mass: f64) -> Self {
        let e = sqrt_s / 2.0;
        let p = (e * e - mass * mass).sqrt();
        Beams {
            beam1: FourMomentum::new(e, 0.0, 0.0, p),
            beam2: FourMomentum::new(e, 0.0, 0.0, -p),
        }
    }

    /// Collinear beams with independent energies, e.g. p-Pb style.
    pub fn asymmetric(e1: f64, e2: f64, mass: f64) -> Self {
        Beams {
            beam1: FourMomentum::new(e1, 0.0, 0.0, (e1 * e1 - mass * mass).sqrt()),
            beam2: FourMomentum::new(e2, 0.0, 0.0, -(e2 * e2 - mass * mass).sqrt()),
        }
    }

    pub fn sum(&self) -> FourMomentum {
        self.beam1 + self.beam2
    }

    pub fn s(&self) -> f64 {
        self.sum().m2()
    }

    pub fn sqrt_s(&self) -> f64 {
        self.sum().m()
    }

    pub fn validate(&self) -> Result<()> {
        for (name, b) in [("beam1", &self.beam1), ("beam2", &self.beam2)] {
            if !b.is_finite() || b.e <= 0.0 || b.m2() < -1e-9 * b.e * b.e {
                return Err(KinematicsError::InvalidBeams(format!(
                    "{} = {:?} is not a physical four-momentum",
                    name, b
                )));
            }
            if b.pt() > 1e-9 {
                return Err(KinematicsError::InvalidBeams(format!(
                    "{} has non-zero transverse momentum",
                    name
                )));
            }
        }
        if self.beam1.pz <= 0.0 || self.beam2.pz >= 0.0 {
            return Err(KinematicsError::InvalidBeams(
                "beam1 must travel along +z and beam2 along -z".to_string(),
            ));
        }
        Ok(())
    }
}

/// Immutable per-run configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    pub beams: Beams,
    #[serde(default)]
    pub cuts: GenerationCuts,
    #[serde(default)]
    pub fiducial: FiducialCuts,
    /// Number of diffractively excited forward legs (0, 1 or 2)
    #[serde(default)]
    pub excitation: usize,
    #[serde(default = "default_emc_tolerance")]
    pub emc_tolerance: f64,
    #[serde(default = "default_max_mass_trials")]
    pub max_mass_trials: usize,
}

fn default_emc_tolerance() -> f64 {
    DEFAULT_EMC_TOLERANCE
}

fn default_max_mass_trials() -> usize {
    DEFAULT_MAX_MASS_TRIALS
}

impl RunConfig {
    pub fn new(beams: Beams, cuts: GenerationCuts) -> Self {
        RunConfig {
            beams,
            cuts,
            fiducial: FiducialCuts::default(),
            excitation: 0,
            emc_tolerance: DEFAULT_EMC_TOLERANCE,
            max_mass_trials: DEFAULT_MAX_MASS_TRIALS,
        }
    }

    /// Symmetric proton-proton run.
    pub fn symmetric(sqrt_s: f64, beam_mass: f64, cuts: GenerationCuts) -> Self {
        RunConfig::new(Beams::symmetric(sqrt_s, beam_mass), cuts)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: RunConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        RunConfig::from_json_str(&content)
    }

    pub fn validate(&self) -> Result<()> {
        self.beams.validate()?;
        self.cuts.validate()?;
        if self.excitation > 2 {
            return Err(KinematicsError::InvalidConfig(format!(
                "excitation = {} (allowed 0, 1, 2)",
                self.excitation
            )));
        }
        if !(self.emc_tolerance > 0.0) {
            return Err(KinematicsError::InvalidConfig(format!(
                "emc_tolerance = {} must be positive",
                self.emc_tolerance
            )));
        }
        if self.max_mass_trials == 0 {
            return Err(KinematicsError::InvalidConfig(
                "max_mass_trials must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn s(&self) -> f64 {
        self.beams.s()
    }

    pub fn sqrt_s(&self) -> f64 {
        self.beams.sqrt_s()
    }

    /// Validate and install the process-wide handle. The first caller wins;
    /// later callers receive the already installed configuration.
    pub fn install_global(self) -> Result<Arc<RunConfig>> {
        self.validate()?;
        let handle = GLOBAL.get_or_init(|| {
            log::debug!("Installing global run configuration");
            Arc::new(self)
        });
        Ok(Arc::clone(handle))
    }

    pub fn global() -> Option<Arc<RunConfig>> {
        GLOBAL.get().cloned()
    }
}
