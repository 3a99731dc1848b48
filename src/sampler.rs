// Shared orchestration of the three phase-space topologies and the
// assembly of the final Monte Carlo weight.
//
// Every topology builds its skeleton in the centre-of-mass working frame
// (beam sum at rest, sqrt_s along E), closes it longitudinally with the
// forward legs where it has them, decays the central products and only then
// boosts everything to the lab and runs the validity gate.

use crate::boost::FrameBooster;
use crate::config::RunConfig;
use crate::cuts::GenerationCuts;
use crate::decay::construct_cascade;
use crate::decay_tree::DecayTree;
use crate::error::Result;
use crate::event::{AuxIntegrationData, KinematicEvent, LEG1, LEG2};
use crate::four_vector::FourMomentum;
use crate::longitudinal::{balance, BalanceInput};
use crate::mass::{sample_forward_mass, BreitWignerSampler, OffshellMassSampler};
use crate::random::{draw_uniform, RandomVector};
use crate::validity::{check_energy_overflow, RejectReason, TrialOutcome, ValidityGate, Veto};
use crate::weight::PT_LOG_EPSILON;
use rand::RngCore;
use std::f64::consts::PI;
use std::sync::Arc;

pub trait PhaseSpaceSampler: Send + Sync {
    fn name(&self) -> &'static str;

    /// Required length of the random vector.
    fn dimension(&self) -> usize;

    fn core(&self) -> &SamplerCore;

    /// Construct one point from `randvec`. Kinematic failure is reported as
    /// [`TrialOutcome::Rejected`]; errors are configuration problems only.
    fn build(
        &self,
        randvec: &[f64],
        event: &mut KinematicEvent,
        rng: &mut dyn RngCore,
    ) -> Result<TrialOutcome>;

    fn integral_volume(&self, event: &KinematicEvent) -> f64;

    fn phase_space_weight(&self, event: &KinematicEvent) -> f64;

    fn tree(&self) -> &DecayTree {
        &self.core().tree
    }

    fn config(&self) -> &RunConfig {
        &self.core().config
    }

    fn new_event(&self) -> KinematicEvent {
        KinematicEvent::new(&self.core().config.beams, &self.core().tree)
    }

    /// Draw a fresh random vector from `rng` and build.
    fn sample(&self, event: &mut KinematicEvent, rng: &mut dyn RngCore) -> Result<TrialOutcome> {
        let randvec = draw_uniform(self.dimension(), &mut *rng);
        self.build(&randvec, event, rng)
    }
}

/// State common to every topology: run configuration, decay tree, line-shape
/// collaborator, frame booster and validity gate.
#[derive(Debug, Clone)]
pub struct SamplerCore {
    pub config: Arc<RunConfig>,
    pub tree: Arc<DecayTree>,
    pub mass_sampler: Arc<dyn OffshellMassSampler>,
    pub booster: FrameBooster,
    pub gate: ValidityGate,
    /// Π n_i! of identical first-level products
    pub symmetry_factor: f64,
}

impl SamplerCore {
    pub fn new(config: Arc<RunConfig>, tree: DecayTree) -> Result<Self> {
        config.validate()?;
        tree.validate()?;
        let booster = FrameBooster::from_beams(&config.beams.beam1, &config.beams.beam2);
        if booster.is_active() {
            log::debug!(
                "Asymmetric beams (Pz = {:.6e}), boosting to the lab frame",
                config.beams.sum().pz
            );
        }
        let gate = ValidityGate::new(config.emc_tolerance, config.fiducial.clone());
        let symmetry_factor = tree.symmetry_factor();
        log::debug!("Identical-particle symmetry factor {}", symmetry_factor);
        Ok(SamplerCore {
            config,
            tree: Arc::new(tree),
            mass_sampler: Arc::new(BreitWignerSampler::default()),
            booster,
            gate,
            symmetry_factor,
        })
    }

    pub fn cuts(&self) -> &GenerationCuts {
        &self.config.cuts
    }

    pub fn excitation(&self) -> usize {
        self.config.excitation
    }

    pub fn root_masses(&self, event: &KinematicEvent) -> Vec<f64> {
        self.tree.roots().iter().map(|&r| event.decay.offshell[r]).collect()
    }

    pub fn resample_masses(&self, event: &mut KinematicEvent, rng: &mut dyn RngCore) -> Result<()> {
        self.tree.resample_masses(
            &mut event.decay,
            self.mass_sampler.as_ref(),
            self.config.max_mass_trials,
            rng,
        )
    }

    /// Forward pt from one draw, uniform in ln(pt).
    pub fn forward_pt(&self, r: f64) -> f64 {
        let cuts = self.cuts();
        let lo = (cuts.forward_pt_min + PT_LOG_EPSILON).ln();
        let hi = cuts.forward_pt_max.ln();
        (lo + (hi - lo) * r).exp()
    }

    /// pt1, pt2, φ1, φ2 as two transverse vectors.
    pub fn forward_transverse(&self, rv: &mut RandomVector<'_>) -> (FourMomentum, FourMomentum) {
        let pt1 = self.forward_pt(rv.take());
        let pt2 = self.forward_pt(rv.take());
        let phi1 = 2.0 * PI * rv.take();
        let phi2 = 2.0 * PI * rv.take();
        (
            FourMomentum::from_pt_phi(pt1, phi1),
            FourMomentum::from_pt_phi(pt2, phi2),
        )
    }

    /// Trailing excitation draws; leg 1 is excited first.
    pub fn forward_masses(&self, rv: &mut RandomVector<'_>, event: &mut KinematicEvent) {
        let cuts = self.cuts();
        let mut jacobian = 1.0;
        for leg in 0..self.excitation() {
            let fm = sample_forward_mass(cuts.xi_min, cuts.xi_max, event.s, rv.take());
            event.forward_mass[leg] = fm.mass;
            jacobian *= fm.jacobian;
        }
        event.factors.forward_mass_jacobian = jacobian;
    }

    /// Solve the forward-leg longitudinal momenta against the central system
    /// already stored in the event and fill the legs.
    pub fn close_longitudinal(
        &self,
        event: &mut KinematicEvent,
        p1t: &FourMomentum,
        p2t: &FourMomentum,
    ) -> std::result::Result<(), RejectReason> {
        let x = *event.central();
        let [m1, m2] = event.forward_mass;
        if !check_energy_overflow(x.e, event.sqrt_s, m1, m2) {
            return Err(RejectReason::EnergyOverflow);
        }
        let sol = balance(&BalanceInput {
            m1,
            m2,
            pt1: p1t.pt(),
            pt2: p2t.pt(),
            central_pz: x.pz,
            central_e: x.e,
            sqrt_s: event.sqrt_s,
        })?;
        let jacobian = sol.jacobian();
        if !jacobian.is_finite() {
            return Err(RejectReason::NumericDegeneracy);
        }

        event.pfinal[LEG1] = FourMomentum::new(sol.e1, p1t.px, p1t.py, sol.p1z);
        event.pfinal[LEG2] = FourMomentum::new(sol.e2, p2t.px, p2t.py, sol.p2z);
        event.factors.longitudinal_jacobian = jacobian;
        event.factors.leg_pt = [p1t.pt(), p2t.pt()];
        event.factors.leg_energy = [sol.e1, sol.e2];
        Ok(())
    }

    /// Decay the first-level products, boost to the lab, run the gate and
    /// compute the invariants.
    pub fn finish(
        &self,
        event: &mut KinematicEvent,
        rng: &mut dyn RngCore,
    ) -> std::result::Result<(), RejectReason> {
        let w = construct_cascade(&self.tree, &mut event.decay, rng)
            .ok_or(RejectReason::DecayKinematics)?;
        event.cascade_weight *= w;

        if self.booster.is_active() {
            self.booster.to_lab(&mut event.pfinal[LEG1]);
            self.booster.to_lab(&mut event.pfinal[LEG2]);
            self.booster.all_to_lab(&mut event.decay.p4);
        }
        event.sync_products(&self.tree);

        self.gate.check(event, &self.tree)?;
        event.compute_invariants();
        Ok(())
    }

    /// Working-frame copies of the beams.
    pub fn working_beams(&self) -> [FourMomentum; 2] {
        let mut b1 = self.config.beams.beam1;
        let mut b2 = self.config.beams.beam2;
        self.booster.to_working(&mut b1);
        self.booster.to_working(&mut b2);
        [b1, b2]
    }
}

/// Builder helpers shared by the samplers.
pub trait SamplerOptions: Sized {
    fn core_mut(&mut self) -> &mut SamplerCore;

    fn with_mass_sampler(mut self, sampler: Arc<dyn OffshellMassSampler>) -> Self {
        self.core_mut().mass_sampler = sampler;
        self
    }

    fn with_veto(mut self, veto: Arc<dyn Veto>) -> Self {
        self.core_mut().gate.vetoes.push(veto);
        self
    }
}

/// Build one point and assemble
/// `W = cascade · phase_space_weight · integral_volume · |M|² / (S · flux)`
/// with `S` the identical-particle factor of the first-level products.
///
/// Rejected points return 0 with the corresponding `aux` flag cleared. A
/// non-finite result is logged and returned as 0.
pub fn event_weight<S, F>(
    sampler: &S,
    randvec: &[f64],
    event: &mut KinematicEvent,
    aux: &mut AuxIntegrationData,
    rng: &mut dyn RngCore,
    matrix_element: F,
    flux: f64,
) -> Result<f64>
where
    S: PhaseSpaceSampler + ?Sized,
    F: FnOnce(&KinematicEvent) -> f64,
{
    aux.clear_flags();
    match sampler.build(randvec, event, rng)? {
        TrialOutcome::Accepted => {
            aux.kinematics_ok = true;
            aux.fiducial_ok = true;
            aux.veto_ok = true;
        }
        TrialOutcome::Rejected(reason) => {
            aux.kinematics_ok = matches!(reason, RejectReason::FiducialCut | RejectReason::Veto);
            aux.fiducial_ok = reason == RejectReason::Veto;
            aux.rejection = Some(reason);
            return Ok(0.0);
        }
    }

    let me2 = matrix_element(event);
    aux.amplitude_ok = me2.is_finite() && me2 >= 0.0;
    if !aux.amplitude_ok {
        log::warn!("{}: matrix element {} discarded", sampler.name(), me2);
        aux.rejection = Some(RejectReason::NumericDegeneracy);
        return Ok(0.0);
    }

    let w = event.cascade_weight
        * sampler.phase_space_weight(event)
        * sampler.integral_volume(event)
        * me2
        / (sampler.core().symmetry_factor * flux);
    if !w.is_finite() {
        log::warn!(
            "{}: non-finite event weight (cascade = {}, volume = {}, flux = {}), set to zero",
            sampler.name(),
            event.cascade_weight,
            sampler.integral_volume(event),
            flux
        );
        aux.kinematics_ok = false;
        aux.rejection = Some(RejectReason::NumericDegeneracy);
        return Ok(0.0);
    }
    Ok(w)
}
