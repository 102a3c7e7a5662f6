//! Concentration-response functions for the derived mortality variables.

/// Maps a PM2.5 concentration to a relative risk, and a relative risk to an
/// expected death count.
pub trait ConcentrationResponse: Send + Sync {
    /// Relative risk at `concentration` [μg/m³].
    fn relative_risk(&self, concentration: f64) -> f64;

    /// Expected deaths per year for `population` people with a baseline rate
    /// of `mortality_rate` deaths per 100,000 people per year.
    fn deaths(&self, relative_risk: f64, population: f64, mortality_rate: f64) -> f64 {
        if relative_risk <= 0.0 {
            return 0.0;
        }
        (relative_risk - 1.0) / relative_risk * population * mortality_rate / 100_000.0
    }
}

/// Log-linear relative risk `RR = exp(β C)` with a 6% increase per
/// 10 μg/m³ by default.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogLinearResponse {
    pub beta: f64,
}

impl LogLinearResponse {
    pub fn new() -> Self {
        Self {
            beta: 1.06f64.ln() / 10.0,
        }
    }

    pub fn with_beta(beta: f64) -> Self {
        Self { beta }
    }
}

impl Default for LogLinearResponse {
    fn default() -> Self {
        Self::new()
    }
}

impl ConcentrationResponse for LogLinearResponse {
    fn relative_risk(&self, concentration: f64) -> f64 {
        (self.beta * concentration).exp()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_six_percent_per_ten() {
        let crf = LogLinearResponse::new();
        assert!((crf.relative_risk(10.0) - 1.06).abs() < 1e-12);
        assert_eq!(crf.relative_risk(0.0), 1.0);
    }

    #[test]
    fn test_no_excess_deaths_at_zero() {
        let crf = LogLinearResponse::new();
        assert_eq!(crf.deaths(crf.relative_risk(0.0), 1e6, 800.0), 0.0);
    }

    #[test]
    fn test_attributable_deaths() {
        let crf = LogLinearResponse::new();
        let d = crf.deaths(1.06, 100_000.0, 800.0);
        assert!((d - 0.06 / 1.06 * 800.0).abs() < 1e-9);
    }
}
