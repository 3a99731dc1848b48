use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

/// Four-momentum in natural units (c = 1), GeV.
///
/// p^μ = (E, p_x, p_y, p_z), Minkowski metric (+, −, −, −).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FourMomentum {
    pub e: f64,
    pub px: f64,
    pub py: f64,
    pub pz: f64,
}

impl FourMomentum {
    pub const ZERO: FourMomentum = FourMomentum {
        e: 0.0,
        px: 0.0,
        py: 0.0,
        pz: 0.0,
    };

    pub fn new(e: f64, px: f64, py: f64, pz: f64) -> Self {
        Self { e, px, py, pz }
    }

    /// Purely transverse vector with zero energy, used as a 2-vector carrier.
    pub fn transverse(px: f64, py: f64) -> Self {
        Self::new(0.0, px, py, 0.0)
    }

    /// Transverse 2-vector of magnitude `pt` at azimuth `phi`.
    pub fn from_pt_phi(pt: f64, phi: f64) -> Self {
        Self::transverse(pt * phi.cos(), pt * phi.sin())
    }

    /// On-shell vector from transverse components, mass and rapidity.
    pub fn from_mass_rapidity(px: f64, py: f64, m: f64, y: f64) -> Self {
        let mt = (m * m + px * px + py * py).sqrt();
        Self::new(mt * y.cosh(), px, py, mt * y.sinh())
    }

    /// On-shell vector at rest with mass `m`.
    pub fn at_rest(m: f64) -> Self {
        Self::new(m, 0.0, 0.0, 0.0)
    }

    /// Minkowski scalar product.
    pub fn dot(&self, other: &FourMomentum) -> f64 {
        self.e * other.e - self.px * other.px - self.py * other.py - self.pz * other.pz
    }

    pub fn m2(&self) -> f64 {
        self.dot(self)
    }

    /// Invariant mass. Spacelike vectors return −√|m²|.
    pub fn m(&self) -> f64 {
        let m2 = self.m2();
        if m2 >= 0.0 {
            m2.sqrt()
        } else {
            -(-m2).sqrt()
        }
    }

    pub fn pt2(&self) -> f64 {
        self.px * self.px + self.py * self.py
    }

    pub fn pt(&self) -> f64 {
        self.pt2().sqrt()
    }

    pub fn p3mag(&self) -> f64 {
        (self.pt2() + self.pz * self.pz).sqrt()
    }

    /// Rapidity y = ½ ln((E + p_z)/(E − p_z)).
    pub fn rapidity(&self) -> f64 {
        0.5 * ((self.e + self.pz) / (self.e - self.pz)).ln()
    }

    /// Pseudorapidity η = −ln tan(θ/2).
    pub fn pseudorapidity(&self) -> f64 {
        let p = self.p3mag();
        0.5 * ((p + self.pz) / (p - self.pz)).ln()
    }

    /// Azimuth in (−π, π].
    pub fn phi(&self) -> f64 {
        self.py.atan2(self.px)
    }

    pub fn p3(&self) -> nalgebra::Vector3<f64> {
        nalgebra::Vector3::new(self.px, self.py, self.pz)
    }

    pub fn is_finite(&self) -> bool {
        self.e.is_finite() && self.px.is_finite() && self.py.is_finite() && self.pz.is_finite()
    }

    /// Largest absolute component.
    pub fn max_abs(&self) -> f64 {
        self.e
            .abs()
            .max(self.px.abs())
            .max(self.py.abs())
            .max(self.pz.abs())
    }
}

impl Add for FourMomentum {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(
            self.e + rhs.e,
            self.px + rhs.px,
            self.py + rhs.py,
            self.pz + rhs.pz,
        )
    }
}

impl Sub for FourMomentum {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(
            self.e - rhs.e,
            self.px - rhs.px,
            self.py - rhs.py,
            self.pz - rhs.pz,
        )
    }
}

impl AddAssign for FourMomentum {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl SubAssign for FourMomentum {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl Mul<f64> for FourMomentum {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        Self::new(self.e * rhs, self.px * rhs, self.py * rhs, self.pz * rhs)
    }
}

impl Neg for FourMomentum {
    type Output = Self;

    fn neg(self) -> Self {
        self * -1.0
    }
}

impl std::iter::Sum for FourMomentum {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(FourMomentum::ZERO, |acc, p| acc + p)
    }
}
