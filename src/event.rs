// Per-trial kinematic record.
//
// One `KinematicEvent` belongs to one worker and is overwritten by every
// build. Slot layout of `pfinal`:
//
// | slot | content |
// |------|---------|
// | 0 | central system (sum of the first-level products) |
// | 1, 2 | forward legs (beam 1 side, beam 2 side) |
// | 3.. | first-level central products, in decay-tree root order |

use crate::config::Beams;
use crate::decay_tree::{DecayState, DecayTree};
use crate::four_vector::FourMomentum;
use crate::validity::{RejectReason, TrialOutcome};
use crate::weight::WeightFactors;
use serde::{Deserialize, Serialize};

pub const CENTRAL: usize = 0;
pub const LEG1: usize = 1;
pub const LEG2: usize = 2;
pub const FIRST_PRODUCT: usize = 3;

/// Lorentz invariants of the 2 → 3 skeleton (beams, two legs, system X).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MandelstamInvariants {
    pub s: f64,
    /// (beam1 − p1)²
    pub t1: f64,
    /// (beam2 − p2)²
    pub t2: f64,
    /// (p1 + X)²
    pub s1: f64,
    /// (p2 + X)²
    pub s2: f64,
    /// X²
    pub m2: f64,
}

#[derive(Debug, Clone)]
pub struct KinematicEvent {
    /// Lab-frame beams
    pub beams: Beams,
    pub sqrt_s: f64,
    pub s: f64,
    pub pfinal: Vec<FourMomentum>,
    /// Offshell masses and momenta of every decay-tree node
    pub decay: DecayState,
    /// Forward-leg masses of the trial (beam masses unless excited)
    pub forward_mass: [f64; 2],
    /// Sampled difference vectors q_i = P_i − P_{i+1} (continuum only)
    pub kt_vectors: Vec<FourMomentum>,
    pub factors: WeightFactors,
    /// Hypercube volume of the trial
    pub volume: f64,
    /// Product of all decay phase-space weights below the skeleton
    pub cascade_weight: f64,
    /// Sampled Φ_K of the central system into the first-level products,
    /// zero for topologies that do not decay the system as a whole
    pub decay_phase_space: f64,
    pub invariants: MandelstamInvariants,
}

impl KinematicEvent {
    pub fn new(beams: &Beams, tree: &DecayTree) -> Self {
        let mut event = KinematicEvent {
            beams: beams.clone(),
            sqrt_s: beams.sqrt_s(),
            s: beams.s(),
            pfinal: vec![FourMomentum::ZERO; FIRST_PRODUCT + tree.multiplicity()],
            decay: tree.new_state(),
            forward_mass: [beams.beam1.m(), beams.beam2.m()],
            kt_vectors: Vec::with_capacity(tree.multiplicity().saturating_sub(1)),
            factors: WeightFactors::default(),
            volume: 0.0,
            cascade_weight: 1.0,
            decay_phase_space: 0.0,
            invariants: MandelstamInvariants::default(),
        };
        event.reset();
        event
    }

    /// Clear all per-trial quantities. Offshell masses are left for the
    /// next resampling to overwrite.
    pub fn reset(&mut self) {
        self.pfinal.iter_mut().for_each(|p| *p = FourMomentum::ZERO);
        self.decay.p4.iter_mut().for_each(|p| *p = FourMomentum::ZERO);
        self.forward_mass = [self.beams.beam1.m(), self.beams.beam2.m()];
        self.kt_vectors.clear();
        self.factors = WeightFactors::default();
        self.volume = 0.0;
        self.cascade_weight = 1.0;
        self.decay_phase_space = 0.0;
        self.invariants = MandelstamInvariants::default();
    }

    pub fn central(&self) -> &FourMomentum {
        &self.pfinal[CENTRAL]
    }

    pub fn forward_legs(&self) -> [FourMomentum; 2] {
        [self.pfinal[LEG1], self.pfinal[LEG2]]
    }

    pub fn products(&self) -> &[FourMomentum] {
        &self.pfinal[FIRST_PRODUCT..]
    }

    /// Legs plus first-level products.
    pub fn produced_sum(&self) -> FourMomentum {
        self.pfinal[LEG1..].iter().copied().sum()
    }

    /// Copy the first-level node momenta into the product slots and rebuild
    /// the central-system slot from them.
    pub fn sync_products(&mut self, tree: &DecayTree) {
        for (i, &r) in tree.roots().iter().enumerate() {
            self.pfinal[FIRST_PRODUCT + i] = self.decay.p4[r];
        }
        self.pfinal[CENTRAL] = self.products().iter().copied().sum();
    }

    /// Momenta of the final-state (leaf) particles of the decay tree.
    pub fn final_state(&self, tree: &DecayTree) -> Vec<FourMomentum> {
        tree.leaves().iter().map(|&l| self.decay.p4[l]).collect()
    }

    pub fn compute_invariants(&mut self) {
        let [p1, p2] = self.forward_legs();
        let x = *self.central();
        self.invariants = MandelstamInvariants {
            s: self.s,
            t1: (self.beams.beam1 - p1).m2(),
            t2: (self.beams.beam2 - p2).m2(),
            s1: (p1 + x).m2(),
            s2: (p2 + x).m2(),
            m2: x.m2(),
        };
    }
}

/// Per-trial record handed back to the outer integration driver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AuxIntegrationData {
    pub kinematics_ok: bool,
    pub fiducial_ok: bool,
    pub veto_ok: bool,
    pub amplitude_ok: bool,
    /// Importance-sampling weight of the driver, carried through untouched
    pub vegas_weight: f64,
    /// Why the last trial was dropped, if it was
    pub rejection: Option<RejectReason>,
}

impl Default for AuxIntegrationData {
    fn default() -> Self {
        AuxIntegrationData {
            kinematics_ok: false,
            fiducial_ok: false,
            veto_ok: false,
            amplitude_ok: false,
            vegas_weight: 1.0,
            rejection: None,
        }
    }
}

impl AuxIntegrationData {
    pub fn valid(&self) -> bool {
        self.kinematics_ok && self.fiducial_ok && self.veto_ok && self.amplitude_ok
    }

    pub fn clear_flags(&mut self) {
        self.kinematics_ok = false;
        self.fiducial_ok = false;
        self.veto_ok = false;
        self.amplitude_ok = false;
        self.rejection = None;
    }

    pub fn outcome(&self) -> TrialOutcome {
        match self.rejection {
            Some(reason) => TrialOutcome::Rejected(reason),
            None => TrialOutcome::Accepted,
        }
    }
}
