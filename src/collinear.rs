// Collinear 2 → 1 × (1 → N) topology: one parton from each beam fuses
// into the central system, the beam remnants continue forward.
//
// Random vector layout (length 2): momentum fractions x1, x2.

use crate::config::RunConfig;
use crate::decay::n_body;
use crate::decay_tree::DecayTree;
use crate::error::{KinematicsError, Result};
use crate::event::{KinematicEvent, CENTRAL, LEG1, LEG2};
use crate::four_vector::FourMomentum;
use crate::random::RandomVector;
use crate::sampler::{PhaseSpaceSampler, SamplerCore, SamplerOptions};
use crate::validity::{RejectReason, TrialOutcome};
use crate::weight::collinear_weight;
use rand::RngCore;
use std::sync::Arc;

/// Offshell-mass redraws allowed before a parton pair below threshold is
/// rejected.
pub const PARTON_MASS_TRIALS: usize = 10_000;

#[derive(Debug, Clone)]
pub struct CollinearSampler {
    core: SamplerCore,
}

impl CollinearSampler {
    pub fn new(config: Arc<RunConfig>, tree: DecayTree) -> Result<Self> {
        if tree.multiplicity() < 2 {
            return Err(KinematicsError::TopologyMismatch {
                topology: "collinear",
                expected: "at least 2".to_string(),
                found: tree.multiplicity(),
            });
        }
        let core = SamplerCore::new(config, tree)?;
        log::debug!(
            "Collinear sampler: {} first-level products",
            core.tree.multiplicity()
        );
        Ok(CollinearSampler { core })
    }

    /// Massless partons carrying x1, x2 of the working-frame beam energy.
    pub fn partons(&self, sqrt_s: f64, x1: f64, x2: f64) -> [FourMomentum; 2] {
        let half = sqrt_s / 2.0;
        [
            FourMomentum::new(x1 * half, 0.0, 0.0, x1 * half),
            FourMomentum::new(x2 * half, 0.0, 0.0, -x2 * half),
        ]
    }

    /// Redraw offshell masses until the products fit into `m`. `Ok(false)`
    /// when the cap is reached.
    fn fit_masses(&self, event: &mut KinematicEvent, m: f64, rng: &mut dyn RngCore) -> Result<bool> {
        for _ in 0..PARTON_MASS_TRIALS.min(self.core.config.max_mass_trials) {
            self.core.resample_masses(event, rng)?;
            if self.core.root_masses(event).iter().sum::<f64>() < m {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn construct(
        &self,
        x1: f64,
        x2: f64,
        event: &mut KinematicEvent,
        rng: &mut dyn RngCore,
    ) -> Result<std::result::Result<(), RejectReason>> {
        let [q1, q2] = self.partons(event.sqrt_s, x1, x2);
        let x = q1 + q2;
        let m = x.m();
        if !self.fit_masses(event, m, rng)? {
            return Ok(Err(RejectReason::PartonThreshold));
        }

        let [b1, b2] = self.core.working_beams();
        let remnants = [b1 - q1, b2 - q2];
        // x -> 1 leaves less than the beam light-cone energy behind
        if remnants.iter().any(|r| r.e <= 0.0 || r.m2() < 0.0) {
            return Ok(Err(RejectReason::DecayKinematics));
        }
        event.pfinal[LEG1] = remnants[0];
        event.pfinal[LEG2] = remnants[1];
        event.pfinal[CENTRAL] = x;
        event.factors.longitudinal_jacobian = 1.0;

        let masses = self.core.root_masses(event);
        let Some((products, phase_space)) = n_body(&x, m, &masses, &mut *rng) else {
            return Ok(Err(RejectReason::DecayKinematics));
        };
        for (&r, p) in self.core.tree.roots().iter().zip(products) {
            event.decay.p4[r] = p;
        }
        event.sync_products(&self.core.tree);
        event.cascade_weight = phase_space;
        event.decay_phase_space = phase_space;
        event.volume = 1.0;

        Ok(self.core.finish(event, rng))
    }
}

impl SamplerOptions for CollinearSampler {
    fn core_mut(&mut self) -> &mut SamplerCore {
        &mut self.core
    }
}

impl PhaseSpaceSampler for CollinearSampler {
    fn name(&self) -> &'static str {
        "collinear"
    }

    fn dimension(&self) -> usize {
        2
    }

    fn core(&self) -> &SamplerCore {
        &self.core
    }

    fn build(
        &self,
        randvec: &[f64],
        event: &mut KinematicEvent,
        rng: &mut dyn RngCore,
    ) -> Result<TrialOutcome> {
        event.reset();
        let mut rv = RandomVector::new(randvec, self.dimension())?;
        let x1 = rv.take();
        let x2 = rv.take();
        Ok(self.construct(x1, x2, event, rng)?.into())
    }

    fn integral_volume(&self, _event: &KinematicEvent) -> f64 {
        1.0
    }

    fn phase_space_weight(&self, _event: &KinematicEvent) -> f64 {
        collinear_weight()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cuts::GenerationCuts;
    use crate::particle::ParticleInfo;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn sampler() -> CollinearSampler {
        let config = RunConfig::symmetric(13000.0, 0.938272, GenerationCuts::default());
        let tree = DecayTree::from_stable(vec![ParticleInfo::kaon_plus(), ParticleInfo::kaon_minus()]);
        CollinearSampler::new(Arc::new(config), tree).unwrap()
    }

    #[test]
    fn test_parton_system_mass() {
        let s = sampler();
        let mut event = s.new_event();
        let mut rng = StdRng::seed_from_u64(4);
        let outcome = s.build(&[0.01, 0.04], &mut event, &mut rng).unwrap();
        assert!(outcome.is_accepted());
        // M² = x1 x2 s
        let expected = (0.01_f64 * 0.04).sqrt() * 13000.0;
        assert!((event.central().m() - expected).abs() < 1e-6 * expected);
        assert!(event.cascade_weight > 0.0);
        assert_eq!(s.integral_volume(&event), 1.0);
    }

    #[test]
    fn test_below_threshold_is_rejected() {
        let s = sampler();
        let mut event = s.new_event();
        let mut rng = StdRng::seed_from_u64(4);
        let outcome = s.build(&[1e-9, 1e-9], &mut event, &mut rng).unwrap();
        assert_eq!(outcome, TrialOutcome::Rejected(RejectReason::PartonThreshold));
    }

    #[test]
    fn test_spacelike_remnant_is_rejected() {
        let s = sampler();
        let mut event = s.new_event();
        let mut rng = StdRng::seed_from_u64(4);
        // Parton takes more than E − m²/(4E) of beam 1
        let outcome = s.build(&[1.0 - 1e-10, 0.01], &mut event, &mut rng).unwrap();
        assert_eq!(outcome, TrialOutcome::Rejected(RejectReason::DecayKinematics));

        let outcome = s.build(&[0.5, 0.01], &mut event, &mut rng).unwrap();
        assert!(outcome.is_accepted());
        for leg in event.forward_legs() {
            assert!(leg.m2() > 0.0);
        }
    }
}
