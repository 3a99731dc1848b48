// Lorentz boosts between the symmetric working frame and the lab

use crate::four_vector::FourMomentum;

/// Beam sums with |p_z| below this are treated as back-to-back.
pub const ASYMMETRY_EPS: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoostDirection {
    /// From the rest frame of `frame` into the frame where `frame` has its momentum.
    ToLab,
    /// Inverse: into the rest frame of `frame`.
    ToRest,
}

/// Boost `p` in place by the frame defined by four-momentum `frame` of mass `frame_mass`.
pub fn lorentz_boost(
    frame: &FourMomentum,
    frame_mass: f64,
    p: &mut FourMomentum,
    direction: BoostDirection,
) {
    let sign = match direction {
        BoostDirection::ToLab => 1.0,
        BoostDirection::ToRest => -1.0,
    };
    let pf = frame.p3();
    let pp = p.p3();
    let pf_dot_p = pf.dot(&pp);

    let e = (frame.e * p.e + sign * pf_dot_p) / frame_mass;
    let c = pf_dot_p / (frame_mass * (frame.e + frame_mass)) + sign * p.e / frame_mass;
    let out = pp + pf * c;

    p.e = e;
    p.px = out.x;
    p.py = out.y;
    p.pz = out.z;
}

/// Maps momenta from the centre-of-mass working frame to the lab frame
/// when the beams are not back-to-back.
#[derive(Debug, Clone, Copy)]
pub struct FrameBooster {
    beam_sum: FourMomentum,
    sqrt_s: f64,
    active: bool,
}

impl FrameBooster {
    pub fn from_beams(beam1: &FourMomentum, beam2: &FourMomentum) -> Self {
        let beam_sum = *beam1 + *beam2;
        Self {
            beam_sum,
            sqrt_s: beam_sum.m(),
            active: beam_sum.pz.abs() > ASYMMETRY_EPS,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn to_lab(&self, p: &mut FourMomentum) {
        if self.active {
            lorentz_boost(&self.beam_sum, self.sqrt_s, p, BoostDirection::ToLab);
        }
    }

    pub fn to_working(&self, p: &mut FourMomentum) {
        if self.active {
            lorentz_boost(&self.beam_sum, self.sqrt_s, p, BoostDirection::ToRest);
        }
    }

    /// Boost every momentum in the slice. Must be applied to the full
    /// produced set so that conservation survives the transformation.
    pub fn all_to_lab(&self, momenta: &mut [FourMomentum]) {
        if self.active {
            for p in momenta.iter_mut() {
                self.to_lab(p);
            }
        }
    }
}
