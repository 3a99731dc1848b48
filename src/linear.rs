// Transverse-momentum linear system of the continuum topology.
//
// With K central particles, K−1 sampled difference vectors
// q_i = P_i − P_{i+1} and the forward transverse momenta p1, p2, the
// central transverse momenta follow from P = A(K)⁻¹ b where
//
// ```text
//   b_0 =  q_0     − w
//   b_i = −q_{i−1} − w      (i = 1..K−1),   w = p1⊥ + p2⊥
// ```
//
// and A(K) has the corner block [[2,0],[0,2]], ones elsewhere, and row
// 2+i (i = 1..K−2) carries 0 in column i and 2 in column i+1. For K = 4:
//
// ```text
//   [2 0 1 1]
//   [0 2 1 1]
//   [1 0 2 1]
//   [1 1 0 2]
// ```
//
// The inverse is built once per K and cached for the lifetime of the
// process; the cache lock is taken only when a sampler is constructed.

use crate::error::{KinematicsError, Result};
use crate::four_vector::FourMomentum;
use nalgebra::DMatrix;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

static SYSTEMS: Lazy<Mutex<HashMap<usize, Arc<LinearSystem>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

#[derive(Debug, Clone)]
pub struct LinearSystem {
    multiplicity: usize,
    inverse: DMatrix<f64>,
    jacobian: f64,
}

impl LinearSystem {
    /// Fetch (or build and cache) the system for K central particles.
    pub fn for_multiplicity(k: usize) -> Result<Arc<LinearSystem>> {
        let mut systems = SYSTEMS.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(sys) = systems.get(&k) {
            return Ok(Arc::clone(sys));
        }
        let sys = Arc::new(LinearSystem::build(k)?);
        systems.insert(k, Arc::clone(&sys));
        Ok(sys)
    }

    /// Build and invert A(K) without touching the cache.
    pub fn build(k: usize) -> Result<LinearSystem> {
        let unsupported = KinematicsError::UnsupportedMultiplicity {
            topology: "continuum linear system",
            multiplicity: k,
        };
        if k < 2 {
            return Err(unsupported);
        }
        let inverse = system_matrix(k).try_inverse().ok_or(unsupported)?;

        let det = difference_matrix(k).determinant();
        let jacobian = 1.0 / (det * det);
        log::debug!(
            "Built continuum linear system K = {} (|det D| = {}, jacobian = {:.6e})",
            k,
            det.abs(),
            jacobian
        );

        Ok(LinearSystem {
            multiplicity: k,
            inverse,
            jacobian,
        })
    }

    pub fn multiplicity(&self) -> usize {
        self.multiplicity
    }

    pub fn inverse(&self) -> &DMatrix<f64> {
        &self.inverse
    }

    /// Jacobian of d²P_0 … d²P_{K−1} δ²(ΣP + w) → d²q_0 … d²q_{K−2}.
    /// Equals 1/K².
    pub fn transverse_jacobian(&self) -> f64 {
        self.jacobian
    }

    /// Central transverse momenta (as transverse four-vectors, E = p_z = 0)
    /// from the difference vectors `q` and the forward legs.
    pub fn solve(
        &self,
        q: &[FourMomentum],
        p1: &FourMomentum,
        p2: &FourMomentum,
    ) -> Vec<FourMomentum> {
        let k = self.multiplicity;
        debug_assert_eq!(q.len(), k - 1);

        let w = FourMomentum::transverse(p1.px + p2.px, p1.py + p2.py);
        let b: Vec<FourMomentum> = (0..k)
            .map(|i| if i == 0 { q[0] - w } else { -q[i - 1] - w })
            .collect();

        (0..k)
            .map(|i| {
                let (mut px, mut py) = (0.0, 0.0);
                for (j, bj) in b.iter().enumerate() {
                    let a = self.inverse[(i, j)];
                    px += a * bj.px;
                    py += a * bj.py;
                }
                FourMomentum::transverse(px, py)
            })
            .collect()
    }
}

/// The K×K system matrix A(K) built by the corner-plus-recurrence rule.
pub fn system_matrix(k: usize) -> DMatrix<f64> {
    let mut a = DMatrix::from_element(k, k, 1.0);
    a[(0, 0)] = 2.0;
    a[(0, 1)] = 0.0;
    a[(1, 0)] = 0.0;
    a[(1, 1)] = 2.0;
    for i in 1..k.saturating_sub(1) {
        a[(1 + i, i)] = 0.0;
        a[(1 + i, i + 1)] = 2.0;
    }
    a
}

/// Rows e_i − e_{i+1} followed by the all-ones sum row.
fn difference_matrix(k: usize) -> DMatrix<f64> {
    let mut d = DMatrix::zeros(k, k);
    for i in 0..k - 1 {
        d[(i, i)] = 1.0;
        d[(i, i + 1)] = -1.0;
    }
    for j in 0..k {
        d[(k - 1, j)] = 1.0;
    }
    d
}
