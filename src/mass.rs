// Line-shape sampling of offshell masses and forward-system masses.
//
// The samplers here are collaborators of the phase-space construction:
// they only ever propose a mass, the retry policy (and its cap) lives with
// the caller.

use crate::particle::ParticleInfo;
use rand::RngCore;
use rand_distr::{Cauchy, Distribution};

/// Default truncation of the Breit-Wigner tails, in units of the width.
pub const DEFAULT_BW_LIMIT: f64 = 5.0;

/// Proposes an offshell mass for a particle inside `[min_mass, max_mass]`.
///
/// Returns `None` when the proposal falls outside the window; the caller
/// retries up to its iteration cap.
pub trait OffshellMassSampler: Send + Sync + std::fmt::Debug {
    fn propose(
        &self,
        particle: &ParticleInfo,
        min_mass: f64,
        max_mass: f64,
        rng: &mut dyn RngCore,
    ) -> Option<f64>;
}

/// Relativistic Breit-Wigner line shape, flat in the Cauchy variable of m².
/// Zero-width particles always return their pole mass.
#[derive(Debug, Clone)]
pub struct BreitWignerSampler {
    pub limit: f64,
}

impl Default for BreitWignerSampler {
    fn default() -> Self {
        Self {
            limit: DEFAULT_BW_LIMIT,
        }
    }
}

impl OffshellMassSampler for BreitWignerSampler {
    fn propose(
        &self,
        particle: &ParticleInfo,
        min_mass: f64,
        max_mass: f64,
        rng: &mut dyn RngCore,
    ) -> Option<f64> {
        let m0 = particle.mass;
        if particle.is_stable() || m0 <= 0.0 {
            return if m0 >= min_mass && m0 <= max_mass {
                Some(m0)
            } else {
                None
            };
        }
        let gamma = particle.width;
        let cauchy = Cauchy::new(m0 * m0, m0 * gamma).ok()?;
        let m2 = cauchy.sample(rng);
        if m2 <= 0.0 {
            return None;
        }
        let m = m2.sqrt();
        let lo = min_mass.max(m0 - self.limit * gamma);
        let hi = max_mass.min(m0 + self.limit * gamma);
        if m < lo || m > hi {
            return None;
        }
        Some(m)
    }
}

/// Pole mass only, ignores widths.
#[derive(Debug, Clone, Default)]
pub struct PoleMassSampler;

impl OffshellMassSampler for PoleMassSampler {
    fn propose(
        &self,
        particle: &ParticleInfo,
        min_mass: f64,
        max_mass: f64,
        _rng: &mut dyn RngCore,
    ) -> Option<f64> {
        let m0 = particle.mass;
        (m0 >= min_mass && m0 <= max_mass).then_some(m0)
    }
}

/// A sampled forward-system mass with its change-of-variable factor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForwardMass {
    pub mass: f64,
    /// dM²/dr divided by the volume factor ln(ξ_max/ξ_min), i.e. M²
    pub jacobian: f64,
}

/// Sample M² log-uniformly in [ξ_min s, ξ_max s] from one uniform draw.
pub fn sample_forward_mass(xi_min: f64, xi_max: f64, s: f64, r: f64) -> ForwardMass {
    let m2 = s * xi_min * (xi_max / xi_min).powf(r);
    ForwardMass {
        mass: m2.sqrt(),
        jacobian: m2,
    }
}

/// Volume of the log-M² variable of one excited forward leg.
pub fn forward_mass_volume(xi_min: f64, xi_max: f64) -> f64 {
    (xi_max / xi_min).ln()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_stable_particle_returns_pole_mass() {
        let mut rng = StdRng::seed_from_u64(1);
        let s = BreitWignerSampler::default();
        let pi = ParticleInfo::pion_plus();
        assert_eq!(s.propose(&pi, 0.0, 10.0, &mut rng), Some(pi.mass));
        assert_eq!(s.propose(&pi, 0.2, 10.0, &mut rng), None);
    }

    #[test]
    fn test_breit_wigner_respects_window() {
        let mut rng = StdRng::seed_from_u64(7);
        let s = BreitWignerSampler::default();
        let rho = ParticleInfo::rho0();
        let mut accepted = Vec::new();
        for _ in 0..5000 {
            if let Some(m) = s.propose(&rho, 0.5, 1.2, &mut rng) {
                accepted.push(m);
            }
        }
        assert!(accepted.len() > 1000);
        assert!(accepted.iter().all(|&m| (0.5..=1.2).contains(&m)));
        let mean = accepted.iter().sum::<f64>() / accepted.len() as f64;
        assert!((mean - rho.mass).abs() < 0.08, "mean {} far from pole", mean);
    }

    #[test]
    fn test_forward_mass_edges() {
        let s = 13000.0_f64.powi(2);
        let lo = sample_forward_mass(1e-6, 1e-2, s, 0.0);
        let hi = sample_forward_mass(1e-6, 1e-2, s, 1.0);
        assert!((lo.mass * lo.mass / s - 1e-6).abs() < 1e-15);
        assert!((hi.mass * hi.mass / s - 1e-2).abs() < 1e-12);
        assert!((forward_mass_volume(1e-6, 1e-2) - 1e4_f64.ln()).abs() < 1e-12);
    }
}
