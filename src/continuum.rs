// General 2 → (K+2) continuum topology: two forward legs and K central
// products sampled directly in transverse difference momenta and
// rapidities.
//
// Random vector layout (length 3(K+2) − 4 + excitation):
//
// | index | variable |
// |-------|----------|
// | 0, 1 | forward pt1, pt2 (log-uniform) |
// | 2, 3 | forward azimuths φ1, φ2 |
// | 4 .. 4+K−1 | difference magnitudes kt_i (linear) |
// | .. +K−1 | difference azimuths |
// | .. +K | central rapidities y_i (linear) |
// | tail | 0, 1 or 2 forward-mass draws |

use crate::config::RunConfig;
use crate::decay_tree::DecayTree;
use crate::error::{KinematicsError, Result};
use crate::event::KinematicEvent;
use crate::four_vector::FourMomentum;
use crate::linear::LinearSystem;
use crate::random::RandomVector;
use crate::sampler::{PhaseSpaceSampler, SamplerCore, SamplerOptions};
use crate::validity::{RejectReason, TrialOutcome};
use crate::weight::{continuum_volume, continuum_weight};
use rand::RngCore;
use std::f64::consts::PI;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct ContinuumSampler {
    core: SamplerCore,
    system: Arc<LinearSystem>,
    volume: f64,
}

impl ContinuumSampler {
    pub fn new(config: Arc<RunConfig>, tree: DecayTree) -> Result<Self> {
        let k = tree.multiplicity();
        if k < 2 {
            return Err(KinematicsError::UnsupportedMultiplicity {
                topology: "continuum",
                multiplicity: k,
            });
        }
        let core = SamplerCore::new(config, tree)?;
        let system = LinearSystem::for_multiplicity(k)?;
        let volume = continuum_volume(core.cuts(), k, core.excitation());
        log::debug!(
            "Continuum sampler: K = {}, excitation = {}, dimension = {}, volume = {:.6e}",
            k,
            core.excitation(),
            Self::dimension_for(k, core.excitation()),
            volume
        );
        Ok(ContinuumSampler {
            core,
            system,
            volume,
        })
    }

    pub fn multiplicity(&self) -> usize {
        self.system.multiplicity()
    }

    pub fn dimension_for(k: usize, excitation: usize) -> usize {
        3 * (k + 2) - 4 + excitation
    }

    fn construct(
        &self,
        rv: &mut RandomVector<'_>,
        event: &mut KinematicEvent,
        rng: &mut dyn RngCore,
    ) -> std::result::Result<(), RejectReason> {
        let k = self.multiplicity();
        let cuts = self.core.cuts();

        let (p1t, p2t) = self.core.forward_transverse(rv);
        let kt: Vec<f64> = (0..k - 1)
            .map(|_| rv.take_linear(cuts.kt_min, cuts.kt_max))
            .collect();
        for &q in &kt {
            event.kt_vectors.push(FourMomentum::from_pt_phi(q, 2.0 * PI * rv.take()));
        }
        let rapidities: Vec<f64> = (0..k)
            .map(|_| rv.take_linear(cuts.rap_min, cuts.rap_max))
            .collect();
        self.core.forward_masses(rv, event);

        let transverse = self.system.solve(&event.kt_vectors, &p1t, &p2t);
        for (i, &r) in self.core.tree.roots().iter().enumerate() {
            event.decay.p4[r] = FourMomentum::from_mass_rapidity(
                transverse[i].px,
                transverse[i].py,
                event.decay.offshell[r],
                rapidities[i],
            );
        }
        event.sync_products(&self.core.tree);

        self.core.close_longitudinal(event, &p1t, &p2t)?;
        event.factors.kt_product = kt.iter().product();
        event.volume = self.volume;

        self.core.finish(event, rng)
    }
}

impl SamplerOptions for ContinuumSampler {
    fn core_mut(&mut self) -> &mut SamplerCore {
        &mut self.core
    }
}

impl PhaseSpaceSampler for ContinuumSampler {
    fn name(&self) -> &'static str {
        "continuum"
    }

    fn dimension(&self) -> usize {
        Self::dimension_for(self.multiplicity(), self.core.excitation())
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
        self.core.resample_masses(event, rng)?;
        Ok(self.construct(&mut rv, event, rng).into())
    }

    fn integral_volume(&self, _event: &KinematicEvent) -> f64 {
        self.volume
    }

    fn phase_space_weight(&self, event: &KinematicEvent) -> f64 {
        continuum_weight(self.multiplicity(), self.core.excitation(), &event.factors)
    }
}
