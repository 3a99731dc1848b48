use crate::validity::{RejectReason, TrialOutcome};
use std::collections::BTreeMap;
use std::fmt;

/// Running Monte Carlo estimate of a weighted integral plus acceptance
/// diagnostics. Rejected trials enter the mean with weight zero.
#[derive(Debug, Clone, Default)]
pub struct WeightTally {
    pub name: Option<String>,
    calls: u64,
    accepted: u64,
    sum: f64,
    sum_sq: f64,
    rejected: BTreeMap<RejectReason, u64>,
}

impl WeightTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            ..Self::default()
        }
    }

    /// Record one trial. The weight of a rejected trial is ignored.
    pub fn add(&mut self, outcome: TrialOutcome, weight: f64) {
        self.calls += 1;
        match outcome {
            TrialOutcome::Accepted => {
                self.accepted += 1;
                self.sum += weight;
                self.sum_sq += weight * weight;
            }
            TrialOutcome::Rejected(reason) => {
                *self.rejected.entry(reason).or_insert(0) += 1;
            }
        }
    }

    /// Combine with the tally of another worker.
    pub fn merge(&mut self, other: &WeightTally) {
        self.calls += other.calls;
        self.accepted += other.accepted;
        self.sum += other.sum;
        self.sum_sq += other.sum_sq;
        for (&reason, &n) in &other.rejected {
            *self.rejected.entry(reason).or_insert(0) += n;
        }
    }

    pub fn calls(&self) -> u64 {
        self.calls
    }

    pub fn accepted(&self) -> u64 {
        self.accepted
    }

    pub fn rejections(&self, reason: RejectReason) -> u64 {
        self.rejected.get(&reason).copied().unwrap_or(0)
    }

    pub fn mean(&self) -> f64 {
        if self.calls == 0 {
            return 0.0;
        }
        self.sum / self.calls as f64
    }

    /// Sample variance of the per-call weight.
    pub fn variance(&self) -> f64 {
        if self.calls < 2 {
            return 0.0;
        }
        let n = self.calls as f64;
        ((self.sum_sq - self.sum * self.sum / n) / (n - 1.0)).max(0.0)
    }

    pub fn std_error(&self) -> f64 {
        if self.calls == 0 {
            return 0.0;
        }
        (self.variance() / self.calls as f64).sqrt()
    }

    pub fn rel_error(&self) -> f64 {
        let mean = self.mean();
        if mean != 0.0 {
            self.std_error() / mean.abs()
        } else {
            0.0
        }
    }

    pub fn acceptance_rate(&self) -> f64 {
        if self.calls == 0 {
            return 0.0;
        }
        self.accepted as f64 / self.calls as f64
    }

    pub fn display_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| "Unnamed tally".to_string())
    }

    pub fn log_summary(&self) {
        log::info!(
            "{}: {:.6e} +- {:.6e} ({} calls, acceptance {:.2}%)",
            self.display_name(),
            self.mean(),
            self.std_error(),
            self.calls,
            100.0 * self.acceptance_rate()
        );
    }
}

impl fmt::Display for WeightTally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Tally name: {}", self.display_name())?;
        writeln!(f, "  Mean: {:.6e}", self.mean())?;
        writeln!(f, "    Std Error: {:.6e}", self.std_error())?;
        writeln!(f, "    Rel Error: {:.4} ({:.2}%)", self.rel_error(), self.rel_error() * 100.0)?;
        writeln!(f, "  Calls: {}", self.calls)?;
        write!(
            f,
            "  Accepted: {} ({:.2}%)",
            self.accepted,
            100.0 * self.acceptance_rate()
        )?;
        for (reason, n) in &self.rejected {
            write!(f, "\n    Rejected ({}): {}", reason, n)?;
        }
        Ok(())
    }
}

/// Running comparison of the sampled central-system decay phase space with
/// its closed form. The ratio of the two means tends to one for an
/// unbiased generator.
#[derive(Debug, Clone, Default)]
pub struct PhaseSpaceCheck {
    sampled: WeightTally,
    exact: WeightTally,
}

impl PhaseSpaceCheck {
    pub fn new() -> Self {
        PhaseSpaceCheck {
            sampled: WeightTally::with_name("sampled decay phase space"),
            exact: WeightTally::with_name("closed-form decay phase space"),
        }
    }

    pub fn add(&mut self, sampled: f64, exact: f64) {
        self.sampled.add(TrialOutcome::Accepted, sampled);
        self.exact.add(TrialOutcome::Accepted, exact);
    }

    pub fn sampled(&self) -> &WeightTally {
        &self.sampled
    }

    pub fn exact(&self) -> &WeightTally {
        &self.exact
    }

    pub fn ratio(&self) -> f64 {
        let exact = self.exact.mean();
        if exact != 0.0 {
            self.sampled.mean() / exact
        } else {
            0.0
        }
    }

    pub fn log_summary(&self) {
        log::info!(
            "Decay phase space: sampled {:.6e} +- {:.6e}, exact {:.6e}, ratio {:.4}",
            self.sampled.mean(),
            self.sampled.std_error(),
            self.exact.mean(),
            self.ratio()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_includes_rejections_as_zero() {
        let mut t = WeightTally::with_name("xs");
        t.add(TrialOutcome::Accepted, 2.0);
        t.add(TrialOutcome::Accepted, 4.0);
        t.add(TrialOutcome::Rejected(RejectReason::BranchFlip), f64::NAN);
        t.add(TrialOutcome::Rejected(RejectReason::BranchFlip), 0.0);
        assert_eq!(t.calls(), 4);
        assert!((t.mean() - 1.5).abs() < 1e-15);
        assert!((t.acceptance_rate() - 0.5).abs() < 1e-15);
        assert_eq!(t.rejections(RejectReason::BranchFlip), 2);
        assert_eq!(t.rejections(RejectReason::Veto), 0);
        // weights 2, 4, 0, 0: variance 11/3
        assert!((t.variance() - 11.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_merge() {
        let mut a = WeightTally::new();
        let mut b = WeightTally::new();
        a.add(TrialOutcome::Accepted, 1.0);
        b.add(TrialOutcome::Accepted, 3.0);
        b.add(TrialOutcome::Rejected(RejectReason::FiducialCut), 0.0);
        a.merge(&b);
        assert_eq!(a.calls(), 3);
        assert_eq!(a.accepted(), 2);
        assert!((a.mean() - 4.0 / 3.0).abs() < 1e-15);
        assert_eq!(a.rejections(RejectReason::FiducialCut), 1);
    }

    #[test]
    fn test_display_lists_rejections() {
        let mut t = WeightTally::with_name("continuum");
        t.add(TrialOutcome::Rejected(RejectReason::EnergyOverflow), 0.0);
        let text = t.to_string();
        assert!(text.contains("Tally name: continuum"));
        assert!(text.contains("Rejected (energy overflow): 1"));
    }

    #[test]
    fn test_phase_space_check_ratio() {
        let mut check = PhaseSpaceCheck::new();
        assert_eq!(check.ratio(), 0.0);
        check.add(1.0, 2.0);
        check.add(3.0, 2.0);
        assert!((check.ratio() - 1.0).abs() < 1e-15);
        assert_eq!(check.sampled().calls(), 2);
        assert!(check.sampled().variance() > 0.0);
        assert_eq!(check.exact().variance(), 0.0);
    }
}
