use serde::{Deserialize, Serialize};

/// Static particle metadata. Masses and widths in GeV.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticleInfo {
    pub name: String,
    pub pdg: i32,
    pub mass: f64,
    #[serde(default)]
    pub width: f64,
    /// Spin × 2
    #[serde(default)]
    pub spin_x2: i32,
    /// Electric charge × 3
    #[serde(default)]
    pub charge_x3: i32,
}

impl ParticleInfo {
    pub fn new(name: &str, pdg: i32, mass: f64, width: f64) -> Self {
        Self {
            name: name.to_string(),
            pdg,
            mass,
            width,
            spin_x2: 0,
            charge_x3: 0,
        }
    }

    pub fn with_quantum_numbers(mut self, spin_x2: i32, charge_x3: i32) -> Self {
        self.spin_x2 = spin_x2;
        self.charge_x3 = charge_x3;
        self
    }

    pub fn is_stable(&self) -> bool {
        self.width <= 0.0
    }

    pub fn pion_plus() -> Self {
        Self::new("pi+", 211, 0.13957039, 0.0).with_quantum_numbers(0, 3)
    }

    pub fn pion_minus() -> Self {
        Self::new("pi-", -211, 0.13957039, 0.0).with_quantum_numbers(0, -3)
    }

    pub fn kaon_plus() -> Self {
        Self::new("K+", 321, 0.493677, 0.0).with_quantum_numbers(0, 3)
    }

    pub fn kaon_minus() -> Self {
        Self::new("K-", -321, 0.493677, 0.0).with_quantum_numbers(0, -3)
    }

    pub fn proton() -> Self {
        Self::new("p+", 2212, 0.938272088, 0.0).with_quantum_numbers(1, 3)
    }

    pub fn photon() -> Self {
        Self::new("gamma", 22, 0.0, 0.0).with_quantum_numbers(2, 0)
    }

    pub fn rho0() -> Self {
        Self::new("rho0", 113, 0.77526, 0.1491).with_quantum_numbers(2, 0)
    }

    pub fn phi1020() -> Self {
        Self::new("phi", 333, 1.019461, 0.004249).with_quantum_numbers(2, 0)
    }
}
