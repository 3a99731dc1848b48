// Decay kinematics: two-body and N-body phase-space generators and the
// recursive construction of a whole decay tree.
//
// Every generator works in the rest frame of the mother and boosts the
// products back to the frame the mother momentum is given in. The
// returned weight is an unbiased estimate of the Lorentz-invariant
// phase-space volume Φ_n(M; m_1..m_n) with (2π)^(4−3n) normalization.

use crate::boost::{lorentz_boost, BoostDirection};
use crate::decay_tree::{DecayState, DecayTree, NodeId};
use crate::four_vector::FourMomentum;
use rand::Rng;
use std::f64::consts::PI;

/// Källén triangle function λ(x, y, z).
pub fn kallen(x: f64, y: f64, z: f64) -> f64 {
    x * x + y * y + z * z - 2.0 * (x * y + x * z + y * z)
}

/// Momentum of either daughter in the rest frame of a mother of mass `m`.
pub fn breakup_momentum(m: f64, m1: f64, m2: f64) -> Option<f64> {
    if m <= 0.0 || m < m1 + m2 {
        return None;
    }
    let lambda = kallen(m * m, m1 * m1, m2 * m2);
    Some(lambda.max(0.0).sqrt() / (2.0 * m))
}

/// Isotropic two-body decay of `mother` (mass `m`) into masses `m1`, `m2`.
pub fn two_body<R: Rng + ?Sized>(
    mother: &FourMomentum,
    m: f64,
    m1: f64,
    m2: f64,
    rng: &mut R,
) -> Option<([FourMomentum; 2], f64)> {
    let pstar = breakup_momentum(m, m1, m2)?;

    let cos_theta: f64 = 2.0 * rng.gen::<f64>() - 1.0;
    let phi = 2.0 * PI * rng.gen::<f64>();
    let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();

    let px = pstar * sin_theta * phi.cos();
    let py = pstar * sin_theta * phi.sin();
    let pz = pstar * cos_theta;

    let mut d1 = FourMomentum::new((m1 * m1 + pstar * pstar).sqrt(), px, py, pz);
    let mut d2 = FourMomentum::new((m2 * m2 + pstar * pstar).sqrt(), -px, -py, -pz);
    lorentz_boost(mother, m, &mut d1, BoostDirection::ToLab);
    lorentz_boost(mother, m, &mut d2, BoostDirection::ToLab);

    Some(([d1, d2], pstar / (4.0 * PI * m)))
}

/// N-body decay by sequential two-body splittings with uniformly ordered
/// intermediate masses (Raubold-Lynch). Handles n >= 2; for n = 2 it
/// reduces to [`two_body`].
pub fn n_body<R: Rng + ?Sized>(
    mother: &FourMomentum,
    m: f64,
    masses: &[f64],
    rng: &mut R,
) -> Option<(Vec<FourMomentum>, f64)> {
    let n = masses.len();
    match n {
        0 | 1 => return None,
        2 => {
            let (d, w) = two_body(mother, m, masses[0], masses[1], rng)?;
            return Some((d.to_vec(), w));
        }
        _ => {}
    }

    let sum_m: f64 = masses.iter().sum();
    let t = m - sum_m;
    if t <= 0.0 {
        return None;
    }

    // Ordered uniforms give the invariant masses of the first k particles
    let mut r: Vec<f64> = (0..n - 2).map(|_| rng.gen::<f64>()).collect();
    r.sort_by(|a, b| a.total_cmp(b));

    let mut inv = vec![0.0; n];
    let mut partial = 0.0;
    for k in 0..n {
        partial += masses[k];
        inv[k] = if k == 0 {
            masses[0]
        } else if k == n - 1 {
            m
        } else {
            partial + r[k - 1] * t
        };
    }

    let mut weight = t.powi(n as i32 - 2) / factorial(n - 2);
    for &mk in &inv[1..n - 1] {
        weight *= 2.0 * mk / (2.0 * PI);
    }

    let mut products = vec![FourMomentum::ZERO; n];
    let mut system = *mother;
    for k in (1..n).rev() {
        let ([sub, pk], w) = two_body(&system, inv[k], inv[k - 1], masses[k], rng)?;
        weight *= w;
        products[k] = pk;
        system = sub;
    }
    products[0] = system;

    Some((products, weight))
}

fn factorial(k: usize) -> f64 {
    (1..=k).map(|i| i as f64).product()
}

/// Construct the full decay cascade below `id`, whose four-momentum and
/// offshell mass must already be set in `state`.
///
/// Returns the product of the phase-space weights of all decays in the
/// subtree, or `None` when any decay is kinematically closed.
pub fn construct_decay<R: Rng + ?Sized>(
    tree: &DecayTree,
    state: &mut DecayState,
    id: NodeId,
    rng: &mut R,
) -> Option<f64> {
    let node = tree.node(id);
    if node.children.is_empty() {
        return Some(1.0);
    }
    let masses: Vec<f64> = node.children.iter().map(|&c| state.offshell[c]).collect();
    let mother = state.p4[id];
    let (products, mut weight) = n_body(&mother, state.offshell[id], &masses, rng)?;

    for (&c, p) in node.children.iter().zip(products) {
        state.p4[c] = p;
    }
    for &c in &node.children {
        weight *= construct_decay(tree, state, c, rng)?;
    }
    Some(weight)
}

/// Decay every first-level particle of the tree. `None` if any branch fails.
pub fn construct_cascade<R: Rng + ?Sized>(
    tree: &DecayTree,
    state: &mut DecayState,
    rng: &mut R,
) -> Option<f64> {
    let mut weight = 1.0;
    for &r in tree.roots() {
        weight *= construct_decay(tree, state, r, rng)?;
    }
    Some(weight)
}
