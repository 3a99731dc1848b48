// Factorized 2 → 3 topology: two forward legs plus one central system X
// of sampled mass M and rapidity Y, which then decays isotropically into
// the first-level products.
//
// Random vector layout (length 6 + excitation): pt1, pt2, φ1, φ2, Y, M²,
// then the forward-mass draws.

use crate::config::RunConfig;
use crate::decay::n_body;
use crate::decay_tree::DecayTree;
use crate::error::{KinematicsError, Result};
use crate::event::{KinematicEvent, CENTRAL};
use crate::four_vector::FourMomentum;
use crate::random::RandomVector;
use crate::sampler::{PhaseSpaceSampler, SamplerCore, SamplerOptions};
use crate::validity::{RejectReason, TrialOutcome};
use crate::weight::{factorized_volume, factorized_weight};
use rand::RngCore;
use std::f64::consts::PI;
use std::sync::Arc;

/// Gap between the summed daughter masses and the lowest system mass.
pub const M_MIN_OFFSET: f64 = 1e-4;

#[derive(Debug, Clone)]
pub struct FactorizedSampler {
    core: SamplerCore,
}

impl FactorizedSampler {
    pub fn new(config: Arc<RunConfig>, tree: DecayTree) -> Result<Self> {
        if tree.multiplicity() < 2 {
            return Err(KinematicsError::TopologyMismatch {
                topology: "factorized",
                expected: "at least 2".to_string(),
                found: tree.multiplicity(),
            });
        }
        let core = SamplerCore::new(config, tree)?;
        log::debug!(
            "Factorized sampler: {} first-level products, excitation = {}",
            core.tree.multiplicity(),
            core.excitation()
        );
        Ok(FactorizedSampler { core })
    }

    /// Resample the offshell masses until the system-mass window
    /// [M_MIN, M_MAX] is open.
    fn mass_window(&self, event: &mut KinematicEvent, rng: &mut dyn RngCore) -> Result<(f64, f64)> {
        let cuts = self.core.cuts();
        let beams = &self.core.config.beams;
        let kinematic_max = event.sqrt_s - (beams.beam1.m() + beams.beam2.m());
        let trials = self.core.config.max_mass_trials;

        for _ in 0..trials {
            self.core.resample_masses(event, rng)?;
            let threshold: f64 = self.core.root_masses(event).iter().sum::<f64>() + M_MIN_OFFSET;
            let m_min = threshold.max(cuts.m_min);
            let m_max = kinematic_max.min(cuts.m_max);
            if m_min < m_max {
                return Ok((m_min, m_max));
            }
        }
        Err(KinematicsError::IterationExhausted {
            context: format!(
                "factorized central mass window [{}, {}]",
                cuts.m_min, cuts.m_max
            ),
            trials,
        })
    }

    fn construct(
        &self,
        rv: &mut RandomVector<'_>,
        event: &mut KinematicEvent,
        (m_min, m_max): (f64, f64),
        rng: &mut dyn RngCore,
    ) -> std::result::Result<(), RejectReason> {
        let cuts = self.core.cuts();

        let (p1t, p2t) = self.core.forward_transverse(rv);
        let y = rv.take_linear(cuts.y_min, cuts.y_max);
        let m2 = rv.take_linear(m_min * m_min, m_max * m_max);
        self.core.forward_masses(rv, event);

        let m = m2.sqrt();
        let x = FourMomentum::from_mass_rapidity(-(p1t.px + p2t.px), -(p1t.py + p2t.py), m, y);
        event.pfinal[CENTRAL] = x;
        self.core.close_longitudinal(event, &p1t, &p2t)?;

        let masses = self.core.root_masses(event);
        let (products, phase_space) =
            n_body(&x, m, &masses, &mut *rng).ok_or(RejectReason::DecayKinematics)?;
        for (&r, p) in self.core.tree.roots().iter().zip(products) {
            event.decay.p4[r] = p;
        }
        event.sync_products(&self.core.tree);
        // dM²/(2π) of the system times its decay phase space
        event.cascade_weight = phase_space / (2.0 * PI);
        event.decay_phase_space = phase_space;
        event.volume = factorized_volume(cuts, self.core.excitation(), m_max * m_max - m_min * m_min);

        self.core.finish(event, rng)
    }
}

impl SamplerOptions for FactorizedSampler {
    fn core_mut(&mut self) -> &mut SamplerCore {
        &mut self.core
    }
}

impl PhaseSpaceSampler for FactorizedSampler {
    fn name(&self) -> &'static str {
        "factorized"
    }

    fn dimension(&self) -> usize {
        6 + self.core.excitation()
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
        let window = self.mass_window(event, rng)?;
        Ok(self.construct(&mut rv, event, window, rng).into())
    }

    /// Depends on the trial through the lower mass edge.
    fn integral_volume(&self, event: &KinematicEvent) -> f64 {
        event.volume
    }

    fn phase_space_weight(&self, event: &KinematicEvent) -> f64 {
        factorized_weight(self.core.excitation(), &event.factors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cuts::GenerationCuts;
    use crate::particle::ParticleInfo;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn pion_pair() -> DecayTree {
        DecayTree::from_stable(vec![ParticleInfo::pion_plus(), ParticleInfo::pion_minus()])
    }

    #[test]
    fn test_single_product_is_a_mismatch() {
        let config = RunConfig::symmetric(13000.0, 0.938272, GenerationCuts::default());
        let tree = DecayTree::from_stable(vec![ParticleInfo::rho0()]);
        assert!(matches!(
            FactorizedSampler::new(Arc::new(config), tree),
            Err(KinematicsError::TopologyMismatch { found: 1, .. })
        ));
    }

    #[test]
    fn test_system_mass_inside_window() {
        let mut cuts = GenerationCuts::default();
        cuts.m_min = 1.0;
        cuts.m_max = 2.0;
        let config = Arc::new(RunConfig::symmetric(13000.0, 0.938272, cuts));
        let s = FactorizedSampler::new(config, pion_pair()).unwrap();
        assert_eq!(s.dimension(), 6);

        let mut event = s.new_event();
        let mut rng = StdRng::seed_from_u64(8);
        let mut accepted = 0;
        for _ in 0..300 {
            if s.sample(&mut event, &mut rng).unwrap().is_accepted() {
                accepted += 1;
                let m = event.central().m();
                assert!(m > 1.0 - 1e-6 && m < 2.0 + 1e-6);
                let expected_volume = crate::weight::factorized_volume(&s.config().cuts, 0, 3.0);
                assert!((s.integral_volume(&event) - expected_volume).abs() < 1e-9 * expected_volume);
            }
        }
        assert!(accepted > 200);
    }

    #[test]
    fn test_closed_mass_window_exhausts() {
        let mut cuts = GenerationCuts::default();
        cuts.m_min = 0.01;
        cuts.m_max = 0.2;
        let mut config = RunConfig::symmetric(13000.0, 0.938272, cuts);
        config.max_mass_trials = 50;
        let s = FactorizedSampler::new(Arc::new(config), pion_pair()).unwrap();
        let mut event = s.new_event();
        let mut rng = StdRng::seed_from_u64(8);
        let err = s.sample(&mut event, &mut rng).unwrap_err();
        assert!(matches!(err, KinematicsError::IterationExhausted { trials: 50, .. }));
    }
}
