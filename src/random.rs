// Positional access to the uniform draws of one trial
use crate::error::{KinematicsError, Result};
use rand::Rng;

/// Cursor over a fixed-length vector of uniform(0,1) draws.
///
/// The length is checked once against the topology contract; afterwards
/// every `take` is infallible and consumes the next draw in order.
#[derive(Debug, Clone)]
pub struct RandomVector<'a> {
    draws: &'a [f64],
    pos: usize,
}

impl<'a> RandomVector<'a> {
    pub fn new(draws: &'a [f64], expected: usize) -> Result<Self> {
        if draws.len() != expected {
            return Err(KinematicsError::RandomVectorLength {
                expected,
                found: draws.len(),
            });
        }
        Ok(Self { draws, pos: 0 })
    }

    pub fn take(&mut self) -> f64 {
        let r = self.draws[self.pos];
        self.pos += 1;
        r
    }

    /// Linear map of the next draw onto [min, max].
    pub fn take_linear(&mut self, min: f64, max: f64) -> f64 {
        min + (max - min) * self.take()
    }

    pub fn take_n(&mut self, n: usize) -> &'a [f64] {
        let out = &self.draws[self.pos..self.pos + n];
        self.pos += n;
        out
    }

    pub fn consumed(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.draws.len() - self.pos
    }
}

/// Fill a fresh random vector of `dim` uniform draws from `rng`.
pub fn draw_uniform<R: Rng + ?Sized>(dim: usize, rng: &mut R) -> Vec<f64> {
    (0..dim).map(|_| rng.gen::<f64>()).collect()
}
