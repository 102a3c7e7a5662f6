use tracing::info;

use crate::species::{Concentrations, NUM_SPECIES, Species};
use crate::vecutils::relative_change;

/// Result of one convergence check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConvergenceReport {
    pub converged: bool,
    /// Relative change of each species' total mass since the last check.
    pub changes: [f64; NUM_SPECIES],
}

/// Compares per-species total mass between periodic checks.
///
/// Converged only when every species' relative change is finite and within
/// tolerance. A zero prior sum gives a non-finite change, so the first check
/// after a clean start never converges.
#[derive(Debug, Clone)]
pub struct ConvergenceMonitor {
    tolerance: f64,
    previous: Concentrations,
    checks: usize,
}

impl ConvergenceMonitor {
    pub fn new(tolerance: f64) -> Self {
        Self {
            tolerance,
            previous: [0.0; NUM_SPECIES],
            checks: 0,
        }
    }

    pub fn checks(&self) -> usize {
        self.checks
    }

    /// Records `sums` and reports whether they differ from the previous
    /// record by at most the tolerance.
    pub fn check(&mut self, sums: &Concentrations) -> ConvergenceReport {
        let mut changes = [0.0; NUM_SPECIES];
        for ((change, &new), &old) in changes.iter_mut().zip(sums).zip(&self.previous) {
            *change = relative_change(new, old);
        }
        let converged = changes
            .iter()
            .all(|c| c.is_finite() && c.abs() <= self.tolerance);

        self.previous = *sums;
        self.checks += 1;

        for species in Species::ALL {
            info!(
                species = species.label(),
                mass = sums[species.index()],
                change = changes[species.index()],
                "convergence check"
            );
        }

        ConvergenceReport { converged, changes }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_sums_converge() {
        let mut m = ConvergenceMonitor::new(0.005);
        let sums = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0];
        assert!(!m.check(&sums).converged);
        let r = m.check(&sums);
        assert!(r.converged);
        assert!(r.changes.iter().all(|&c| c == 0.0));
        assert_eq!(m.checks(), 2);
    }

    #[test]
    fn test_zero_prior_never_converges() {
        let mut m = ConvergenceMonitor::new(0.005);
        let mut sums = [1.0; NUM_SPECIES];
        sums[3] = 0.0;
        m.check(&sums);
        // Species 3 goes from 0 to a tiny value: infinite relative change.
        sums[3] = 1e-30;
        let r = m.check(&sums);
        assert!(!r.converged);
        assert!(r.changes[3].is_infinite());
    }

    #[test]
    fn test_zero_to_zero_is_not_converged() {
        let mut m = ConvergenceMonitor::new(0.005);
        let zeros = [0.0; NUM_SPECIES];
        m.check(&zeros);
        let r = m.check(&zeros);
        assert!(r.changes[0].is_nan());
        assert!(!r.converged);
    }

    #[test]
    fn test_change_above_tolerance() {
        let mut m = ConvergenceMonitor::new(0.01);
        m.check(&[100.0; NUM_SPECIES]);
        let mut next = [100.5; NUM_SPECIES];
        assert!(m.check(&next).converged);
        next[8] = 110.0;
        let r = m.check(&next);
        assert!(!r.converged);
        assert!((r.changes[8] - 9.5 / 100.5).abs() < 1e-12);
    }
}
