//! Small numeric helpers shared by the topology and convergence code.

/// Harmonic mean `2ab / (a + b)`.
///
/// Two diffusive resistances in series. Returns `0.0` when `a + b == 0`.
pub fn harmonic_mean(a: f64, b: f64) -> f64 {
    let sum = a + b;
    if sum == 0.0 {
        return 0.0;
    }
    2.0 * a * b / sum
}

/// Relative change `(new - old) / old`. Non-finite when `old` is zero.
pub fn relative_change(new: f64, old: f64) -> f64 {
    (new - old) / old
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn test_harmonic_mean_identity() {
        assert_eq!(harmonic_mean(3.0, 3.0), 3.0);
        assert_eq!(harmonic_mean(0.0, 0.0), 0.0);
        assert_eq!(harmonic_mean(0.0, 5.0), 0.0);
    }

    #[test]
    fn test_harmonic_mean_properties() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1000 {
            let a: f64 = rng.gen_range(1e-6..1e3);
            let b: f64 = rng.gen_range(1e-6..1e3);
            let h = harmonic_mean(a, b);
            assert_eq!(h, harmonic_mean(b, a));
            assert!(h >= 0.0);
            assert!(h <= 2.0 * a.min(b) + 1e-12);
            assert!(h <= a.max(b) + 1e-12);
        }
    }

    #[test]
    fn test_relative_change() {
        assert_eq!(relative_change(110.0, 100.0), 0.1);
        assert!(!relative_change(1.0, 0.0).is_finite());
        assert!(relative_change(0.0, 0.0).is_nan());
    }
}
