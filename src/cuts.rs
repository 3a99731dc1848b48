// Generation and fiducial cuts

use crate::error::{KinematicsError, Result};
use crate::four_vector::FourMomentum;
use serde::{Deserialize, Serialize};

/// Immutable per-run sampling boundaries, shared read-only across trials.
///
/// Momenta and masses in GeV. Only the windows relevant to a topology are
/// read by it: the continuum sampler uses `kt_*` and `rap_*`, the
/// factorized sampler uses `y_*` and `m_*`, both use `forward_pt_*` and
/// (for excited forward legs) `xi_*`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationCuts {
    pub forward_pt_min: f64,
    pub forward_pt_max: f64,
    pub kt_min: f64,
    pub kt_max: f64,
    pub rap_min: f64,
    pub rap_max: f64,
    pub y_min: f64,
    pub y_max: f64,
    pub m_min: f64,
    pub m_max: f64,
    pub xi_min: f64,
    pub xi_max: f64,
}

impl Default for GenerationCuts {
    fn default() -> Self {
        GenerationCuts {
            forward_pt_min: 0.0,
            forward_pt_max: 3.0,
            kt_min: 0.0,
            kt_max: 5.0,
            rap_min: -2.5,
            rap_max: 2.5,
            y_min: -2.5,
            y_max: 2.5,
            m_min: 0.0,
            m_max: 1.0e5,
            xi_min: 1.0e-9,
            xi_max: 0.05,
        }
    }
}

impl GenerationCuts {
    /// Default cuts with the intermediate kt window scaled to the central
    /// multiplicity, low-pt Pomeron-like exchanges.
    pub fn technical_defaults(multiplicity: usize) -> Self {
        let mut cuts = GenerationCuts::default();
        cuts.kt_max = 10.0 / multiplicity.max(1) as f64;
        cuts
    }

    /// Reject windows with min >= max, non-finite bounds or negative
    /// momentum/mass lower edges.
    pub fn validate(&self) -> Result<()> {
        let windows: [(&'static str, f64, f64); 6] = [
            ("forward_pt", self.forward_pt_min, self.forward_pt_max),
            ("kt", self.kt_min, self.kt_max),
            ("rap", self.rap_min, self.rap_max),
            ("y", self.y_min, self.y_max),
            ("m", self.m_min, self.m_max),
            ("xi", self.xi_min, self.xi_max),
        ];
        for (name, min, max) in windows {
            if !min.is_finite() || !max.is_finite() || min >= max {
                return Err(KinematicsError::MalformedCut { name, min, max });
            }
        }
        if self.forward_pt_min < 0.0 || self.kt_min < 0.0 || self.m_min < 0.0 {
            let (name, min, max) = if self.forward_pt_min < 0.0 {
                ("forward_pt", self.forward_pt_min, self.forward_pt_max)
            } else if self.kt_min < 0.0 {
                ("kt", self.kt_min, self.kt_max)
            } else {
                ("m", self.m_min, self.m_max)
            };
            return Err(KinematicsError::MalformedCut { name, min, max });
        }
        if self.xi_min <= 0.0 || self.xi_max > 1.0 {
            return Err(KinematicsError::MalformedCut {
                name: "xi",
                min: self.xi_min,
                max: self.xi_max,
            });
        }
        Ok(())
    }
}

/// Fiducial (user) cuts applied to the first-level central products.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FiducialCuts {
    pub active: bool,
    /// Minimum pt of every central product
    pub pt_min: f64,
    /// Maximum |η| of every central product
    pub eta_max: f64,
    /// Central system invariant mass window
    pub m_min: f64,
    pub m_max: f64,
}

impl Default for FiducialCuts {
    fn default() -> Self {
        FiducialCuts {
            active: false,
            pt_min: 0.0,
            eta_max: 1.0e3,
            m_min: 0.0,
            m_max: 1.0e5,
        }
    }
}

impl FiducialCuts {
    pub fn accept(&self, system: &FourMomentum, products: &[FourMomentum]) -> bool {
        if !self.active {
            return true;
        }
        let m = system.m();
        if m < self.m_min || m > self.m_max {
            return false;
        }
        products
            .iter()
            .all(|p| p.pt() >= self.pt_min && p.pseudorapidity().abs() <= self.eta_max)
    }
}
