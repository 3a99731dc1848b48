// Sequential validity checks of a constructed point.
//
// The first failing check decides the `RejectReason`. Rejection is an
// ordinary sampling outcome and never an error.

use crate::cuts::FiducialCuts;
use crate::decay_tree::DecayTree;
use crate::event::KinematicEvent;
use crate::four_vector::FourMomentum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RejectReason {
    /// Longitudinal solution puts a forward leg in the wrong hemisphere
    BranchFlip,
    /// Not enough energy left for the forward legs
    EnergyOverflow,
    /// Central system lighter than the sum of its daughters
    BelowMassThreshold,
    EnergyMomentumViolation,
    FiducialCut,
    Veto,
    /// NaN or infinity in momenta or jacobians
    NumericDegeneracy,
    /// A decay in the tree is kinematically closed
    DecayKinematics,
    /// Parton-parton mass below the central threshold after the retry cap
    PartonThreshold,
}

impl RejectReason {
    pub const ALL: [RejectReason; 9] = [
        RejectReason::BranchFlip,
        RejectReason::EnergyOverflow,
        RejectReason::BelowMassThreshold,
        RejectReason::EnergyMomentumViolation,
        RejectReason::FiducialCut,
        RejectReason::Veto,
        RejectReason::NumericDegeneracy,
        RejectReason::DecayKinematics,
        RejectReason::PartonThreshold,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            RejectReason::BranchFlip => "branch flip",
            RejectReason::EnergyOverflow => "energy overflow",
            RejectReason::BelowMassThreshold => "below mass threshold",
            RejectReason::EnergyMomentumViolation => "energy-momentum violation",
            RejectReason::FiducialCut => "fiducial cut",
            RejectReason::Veto => "veto",
            RejectReason::NumericDegeneracy => "numeric degeneracy",
            RejectReason::DecayKinematics => "decay kinematics",
            RejectReason::PartonThreshold => "parton threshold",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Result of one trial construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrialOutcome {
    Accepted,
    Rejected(RejectReason),
}

impl TrialOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, TrialOutcome::Accepted)
    }

    pub fn reason(&self) -> Option<RejectReason> {
        match self {
            TrialOutcome::Accepted => None,
            TrialOutcome::Rejected(r) => Some(*r),
        }
    }
}

impl From<std::result::Result<(), RejectReason>> for TrialOutcome {
    fn from(r: std::result::Result<(), RejectReason>) -> Self {
        match r {
            Ok(()) => TrialOutcome::Accepted,
            Err(reason) => TrialOutcome::Rejected(reason),
        }
    }
}

/// External veto on a fully constructed event, e.g. forward fragmentation
/// landing inside detector acceptance.
pub trait Veto: Send + Sync + fmt::Debug {
    /// `true` removes the event.
    fn veto(&self, event: &KinematicEvent) -> bool;
}

/// Vetoes events where a forward leg is more central than `min_abs_rapidity`.
#[derive(Debug, Clone)]
pub struct ForwardRapidityVeto {
    pub min_abs_rapidity: f64,
}

impl Veto for ForwardRapidityVeto {
    fn veto(&self, event: &KinematicEvent) -> bool {
        event
            .forward_legs()
            .iter()
            .any(|p| p.rapidity().abs() < self.min_abs_rapidity)
    }
}

pub fn check_finite(momenta: &[FourMomentum]) -> bool {
    momenta.iter().all(|p| p.is_finite())
}

/// Component-wise |beam_sum − produced| ≤ tol · sqrt_s.
pub fn check_emc(beam_sum: &FourMomentum, produced: &FourMomentum, tol: f64, sqrt_s: f64) -> bool {
    (*beam_sum - *produced).max_abs() <= tol * sqrt_s
}

/// Cheap test before the longitudinal solve.
pub fn check_energy_overflow(central_e: f64, sqrt_s: f64, m1: f64, m2: f64) -> bool {
    central_e <= sqrt_s - (m1 + m2)
}

pub fn check_mass_threshold(system: &FourMomentum, daughter_masses: &[f64]) -> bool {
    system.m() >= daughter_masses.iter().sum::<f64>()
}

/// Checks applied after the point is fully constructed and boosted.
#[derive(Debug, Clone, Default)]
pub struct ValidityGate {
    pub emc_tolerance: f64,
    pub fiducial: FiducialCuts,
    pub vetoes: Vec<Arc<dyn Veto>>,
}

impl ValidityGate {
    pub fn new(emc_tolerance: f64, fiducial: FiducialCuts) -> Self {
        ValidityGate {
            emc_tolerance,
            fiducial,
            vetoes: Vec::new(),
        }
    }

    pub fn with_veto(mut self, veto: Arc<dyn Veto>) -> Self {
        self.vetoes.push(veto);
        self
    }

    /// Mass threshold, finiteness, conservation, fiducial cuts and vetoes, in
    /// that order.
    pub fn check(&self, event: &KinematicEvent, tree: &DecayTree) -> std::result::Result<(), RejectReason> {
        let roots: Vec<f64> = tree.roots().iter().map(|&r| event.decay.offshell[r]).collect();
        if !check_mass_threshold(event.central(), &roots) {
            return Err(RejectReason::BelowMassThreshold);
        }
        if !check_finite(&event.pfinal) || !check_finite(&event.decay.p4) {
            return Err(RejectReason::NumericDegeneracy);
        }
        if !check_emc(
            &event.beams.sum(),
            &event.produced_sum(),
            self.emc_tolerance,
            event.sqrt_s,
        ) {
            return Err(RejectReason::EnergyMomentumViolation);
        }
        if !self.fiducial.accept(event.central(), event.products()) {
            return Err(RejectReason::FiducialCut);
        }
        if self.vetoes.iter().any(|v| v.veto(event)) {
            return Err(RejectReason::Veto);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emc_tolerance_is_relative() {
        let beams = FourMomentum::new(13000.0, 0.0, 0.0, 0.0);
        let close = FourMomentum::new(13000.0 + 1e-3, 1e-3, 0.0, -1e-3);
        assert!(check_emc(&beams, &close, 1e-6, 13000.0));
        let off = FourMomentum::new(13000.0, 0.1, 0.0, 0.0);
        assert!(!check_emc(&beams, &off, 1e-6, 13000.0));
    }

    #[test]
    fn test_energy_overflow_precheck() {
        assert!(check_energy_overflow(100.0, 200.0, 0.938, 0.938));
        assert!(!check_energy_overflow(199.0, 200.0, 0.938, 0.938));
    }

    #[test]
    fn test_mass_threshold() {
        let x = FourMomentum::from_mass_rapidity(0.0, 0.0, 1.0, 0.0);
        assert!(check_mass_threshold(&x, &[0.4, 0.5]));
        assert!(!check_mass_threshold(&x, &[0.6, 0.5]));
    }

    #[test]
    fn test_outcome_from_check() {
        assert!(TrialOutcome::from(Ok(())).is_accepted());
        let r = TrialOutcome::from(Err(RejectReason::Veto));
        assert_eq!(r.reason(), Some(RejectReason::Veto));
        assert_eq!(r.reason().map(|x| x.to_string()), Some("veto".to_string()));
    }
}
