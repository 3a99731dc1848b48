// Exact longitudinal momentum balance of the two forward legs
//
// Once the central system (E_X, Pz_X) and the leg transverse momenta are
// fixed, the legs must carry a = sqrt_s − E_X and b = −Pz_X. Treating each
// leg as a 1+1 dimensional particle of transverse mass mt_i reduces the two
// conservation equations to a two-body problem of mass M² = a² − b².

use crate::decay::kallen;
use crate::validity::RejectReason;

/// Forward-leg longitudinal momenta and energies solving the balance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LongitudinalSolution {
    pub p1z: f64,
    pub p2z: f64,
    pub e1: f64,
    pub e2: f64,
}

impl LongitudinalSolution {
    /// 1/|p1z/E1 − p2z/E2| from eliminating the energy and p_z deltas.
    pub fn jacobian(&self) -> f64 {
        1.0 / (self.p1z / self.e1 - self.p2z / self.e2).abs()
    }
}

/// Inputs of one balance problem. Masses and momenta in GeV.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BalanceInput {
    pub m1: f64,
    pub m2: f64,
    pub pt1: f64,
    pub pt2: f64,
    pub central_pz: f64,
    pub central_e: f64,
    pub sqrt_s: f64,
}

impl BalanceInput {
    fn targets(&self) -> (f64, f64) {
        (self.sqrt_s - self.central_e, -self.central_pz)
    }

    fn mt2(&self) -> (f64, f64) {
        (
            self.m1 * self.m1 + self.pt1 * self.pt1,
            self.m2 * self.m2 + self.pt2 * self.pt2,
        )
    }
}

/// Solve on the physical branch (leg 1 along +z, leg 2 along −z).
pub fn balance(input: &BalanceInput) -> Result<LongitudinalSolution, RejectReason> {
    let (a, b) = input.targets();
    let (mt1_sq, mt2_sq) = input.mt2();

    if !(a > 0.0) {
        return Err(RejectReason::EnergyOverflow);
    }
    let m_sq = a * a - b * b;
    if !(m_sq > 0.0) {
        return Err(RejectReason::EnergyOverflow);
    }
    let lambda = kallen(m_sq, mt1_sq, mt2_sq);
    let m_sum = mt1_sq.sqrt() + mt2_sq.sqrt();
    if lambda < 0.0 || m_sq < m_sum * m_sum {
        return Err(RejectReason::EnergyOverflow);
    }

    let p1z = (b * (m_sq + mt1_sq - mt2_sq) + a * lambda.sqrt()) / (2.0 * m_sq);
    let p2z = b - p1z;
    if !p1z.is_finite() || !p2z.is_finite() {
        return Err(RejectReason::NumericDegeneracy);
    }
    if p1z < 0.0 || p2z > 0.0 {
        return Err(RejectReason::BranchFlip);
    }

    Ok(LongitudinalSolution {
        p1z,
        p2z,
        e1: (mt1_sq + p1z * p1z).sqrt(),
        e2: (mt2_sq + p2z * p2z).sqrt(),
    })
}

/// Solve for (p1z, p2z); `None` when no physical root exists.
pub fn solve_pz(input: &BalanceInput) -> Option<(f64, f64)> {
    balance(input).ok().map(|s| (s.p1z, s.p2z))
}

/// Both analytic roots for p1z, physical (+) branch first.
pub fn roots(input: &BalanceInput) -> Option<[f64; 2]> {
    let (a, b) = input.targets();
    let (mt1_sq, mt2_sq) = input.mt2();
    let m_sq = a * a - b * b;
    let lambda = kallen(m_sq, mt1_sq, mt2_sq);
    if !(m_sq > 0.0) || lambda < 0.0 {
        return None;
    }
    let base = b * (m_sq + mt1_sq - mt2_sq);
    let spread = a * lambda.sqrt();
    Some([
        (base + spread) / (2.0 * m_sq),
        (base - spread) / (2.0 * m_sq),
    ])
}

/// Energy and p_z residuals of a candidate solution.
pub fn residual(input: &BalanceInput, p1z: f64, p2z: f64) -> (f64, f64) {
    let (a, b) = input.targets();
    let (mt1_sq, mt2_sq) = input.mt2();
    let e = (mt1_sq + p1z * p1z).sqrt() + (mt2_sq + p2z * p2z).sqrt();
    (e - a, p1z + p2z - b)
}
