// Sampling volumes and point-dependent phase-space weights.
//
// Phase space is normalized as
// dΦ_N = (2π)^(4−3N) δ⁴(P − Σp) Π d³p_i / (2E_i).
// The product `volume × weight` of a sampled point is an unbiased estimate
// of the phase-space integral over the generation region.

use crate::cuts::GenerationCuts;
use crate::decay::kallen;
use crate::mass::forward_mass_volume;
use std::f64::consts::PI;

const TWO_PI: f64 = 2.0 * PI;

/// Offset added to the lower forward-pt edge so that ln(pt_min) stays finite.
pub const PT_LOG_EPSILON: f64 = 1e-9;

/// Point-dependent inputs to the weight, captured in the symmetric working
/// frame before any boost to the lab.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightFactors {
    /// 1/|p1z/E1 − p2z/E2|
    pub longitudinal_jacobian: f64,
    /// Working-frame forward-leg transverse momenta
    pub leg_pt: [f64; 2],
    /// Working-frame forward-leg energies
    pub leg_energy: [f64; 2],
    /// Π kt_i of the sampled difference vectors (continuum only)
    pub kt_product: f64,
    /// Π M_i² of the excited forward legs, paired with one 1/(2π) each
    pub forward_mass_jacobian: f64,
}

impl Default for WeightFactors {
    fn default() -> Self {
        WeightFactors {
            longitudinal_jacobian: 0.0,
            leg_pt: [0.0; 2],
            leg_energy: [1.0; 2],
            kt_product: 1.0,
            forward_mass_jacobian: 1.0,
        }
    }
}

impl WeightFactors {
    /// Π pt_i²/(2E_i): d³p/(2E) of a forward leg in log-pt variables.
    pub fn leg_factor(&self) -> f64 {
        (0..2)
            .map(|i| self.leg_pt[i] * self.leg_pt[i] / (2.0 * self.leg_energy[i]))
            .product()
    }
}

/// Forward-leg part of every hypercube volume: log-pt ranges, azimuths and
/// one log-M² range per excited leg.
pub fn forward_volume(cuts: &GenerationCuts, excitation: usize) -> f64 {
    let log_range = cuts.forward_pt_max.ln() - (cuts.forward_pt_min + PT_LOG_EPSILON).ln();
    let mut v = log_range.powi(2) * TWO_PI.powi(2);
    for _ in 0..excitation {
        v *= forward_mass_volume(cuts.xi_min, cuts.xi_max);
    }
    v
}

pub fn continuum_volume(cuts: &GenerationCuts, k: usize, excitation: usize) -> f64 {
    let k = k as i32;
    forward_volume(cuts, excitation)
        * (cuts.kt_max - cuts.kt_min).powi(k - 1)
        * TWO_PI.powi(k - 1)
        * (cuts.rap_max - cuts.rap_min).powi(k)
}

/// `m2_range` is M_MAX² − M_MIN² of the trial; the lower mass edge depends
/// on the offshell masses drawn for it.
pub fn factorized_volume(cuts: &GenerationCuts, excitation: usize, m2_range: f64) -> f64 {
    forward_volume(cuts, excitation) * m2_range * (cuts.y_max - cuts.y_min)
}

/// Weight of the 2 → (K+2) continuum point.
pub fn continuum_weight(k: usize, excitation: usize, f: &WeightFactors) -> f64 {
    let n = k as i32 + 2;
    TWO_PI.powi(4 - 3 * n)
        * f.longitudinal_jacobian
        * f.leg_factor()
        * 0.5_f64.powi(k as i32)
        / (k * k) as f64
        * f.kt_product
        * f.forward_mass_jacobian
        / TWO_PI.powi(excitation as i32)
}

/// Weight of the 2 → 3 skeleton (two legs plus the central system of
/// mass M). The dM²/(2π) of the system and its decay live in the cascade
/// weight.
pub fn factorized_weight(excitation: usize, f: &WeightFactors) -> f64 {
    TWO_PI.powi(-5) * 0.5 * f.longitudinal_jacobian * f.leg_factor() * f.forward_mass_jacobian
        / TWO_PI.powi(excitation as i32)
}

/// Collinear topology: the parton luminosity and the 2 → 1 delta function
/// are left to the matrix element, so the skeleton carries unit weight.
pub fn collinear_weight() -> f64 {
    1.0
}

/// Two-body phase space Φ_2 = √λ(s, m1², m2²) / (8π s).
pub fn ps2_massive(s: f64, m1_sq: f64, m2_sq: f64) -> f64 {
    let lambda = kallen(s, m1_sq, m2_sq);
    if s <= 0.0 || lambda <= 0.0 {
        return 0.0;
    }
    lambda.sqrt() / (8.0 * PI * s)
}

/// Massless n-body phase space
/// Φ_n = (2π)^(4−3n) (π/2)^(n−1) s^(n−2) / ((n−1)! (n−2)!).
pub fn psn_massless(s: f64, n: usize) -> f64 {
    if n < 2 {
        return 0.0;
    }
    let fact = |k: usize| (1..=k).map(|i| i as f64).product::<f64>();
    TWO_PI.powi(4 - 3 * n as i32) * (PI / 2.0).powi(n as i32 - 1) * s.powi(n as i32 - 2)
        / (fact(n - 1) * fact(n - 2))
}

/// Closed-form Φ_n of a system of invariant mass² `s` decaying into
/// `masses`, where one exists: any two-body final state, or n massless
/// bodies.
pub fn closed_form_phase_space(s: f64, masses: &[f64]) -> Option<f64> {
    match masses {
        [m1, m2] => Some(ps2_massive(s, m1 * m1, m2 * m2)),
        _ if masses.len() > 2 && masses.iter().all(|&m| m == 0.0) => {
            Some(psn_massless(s, masses.len()))
        }
        _ => None,
    }
}
