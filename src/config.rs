use std::fs::File;
use std::io::BufReader;
use std::num::NonZeroUsize;
use std::path::Path;
use std::thread;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Model configuration, built once and passed to the run driver and the
/// output accessor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Courant number applied to every stability bound.
    pub courant: f64,
    /// Timestep [s] of a domain with no wind and no diffusion, where every
    /// stability bound is unbounded. Never caps a finite bound.
    pub fallback_timestep_s: f64,
    /// Fixed number of iterations. `None` runs until convergence.
    pub num_iterations: Option<usize>,
    /// Safety cap on iterations in convergence mode.
    pub max_iterations: Option<usize>,
    /// Largest accepted relative change of per-species total mass.
    pub tolerance: f64,
    /// Model time between convergence checks [s].
    pub check_period_s: f64,
    /// Cells above this layer are skipped by every operator.
    pub top_layer_to_calc: usize,
    /// Worker threads. `None` uses every available processor.
    pub workers: Option<usize>,
    /// Population demographics reported in the output.
    pub population_names: Vec<String>,
}

impl ModelConfig {
    pub fn new() -> Self {
        Self {
            courant: 1.0,
            fallback_timestep_s: 3600.0,
            num_iterations: None,
            max_iterations: None,
            tolerance: 0.005,
            check_period_s: 3600.0,
            top_layer_to_calc: 28,
            workers: None,
            population_names: vec!["TotalPop".to_string()],
        }
    }

    /// Loads a JSON configuration file. Missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open config: {}", path.display()))?;
        let config: ModelConfig = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> std::result::Result<(), ModelError> {
        let positive = [
            ("courant", self.courant),
            ("fallback_timestep_s", self.fallback_timestep_s),
            ("tolerance", self.tolerance),
            ("check_period_s", self.check_period_s),
        ];
        for (name, v) in positive {
            if !(v.is_finite() && v > 0.0) {
                return Err(ModelError::InvalidConfig(format!(
                    "{name} must be finite and positive, got {v}"
                )));
            }
        }
        if self.workers == Some(0) {
            return Err(ModelError::InvalidConfig(
                "workers must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Resolved worker count.
    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(|| {
            thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1)
        })
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let c = ModelConfig::new();
        assert_eq!(c.courant, 1.0);
        assert_eq!(c.tolerance, 0.005);
        assert_eq!(c.check_period_s, 3600.0);
        assert_eq!(c.top_layer_to_calc, 28);
        assert!(c.num_iterations.is_none());
        assert!(c.worker_count() >= 1);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        let mut f = File::create(&path).unwrap();
        writeln!(f, r#"{{ "num_iterations": 12, "workers": 3 }}"#).unwrap();

        let c = ModelConfig::from_json_file(&path).unwrap();
        assert_eq!(c.num_iterations, Some(12));
        assert_eq!(c.worker_count(), 3);
        assert_eq!(c.courant, 1.0);
        assert_eq!(c.population_names, vec!["TotalPop".to_string()]);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let mut c = ModelConfig::new();
        c.tolerance = 0.0;
        assert!(matches!(c.validate(), Err(ModelError::InvalidConfig(_))));

        let mut c = ModelConfig::new();
        c.workers = Some(0);
        assert!(matches!(c.validate(), Err(ModelError::InvalidConfig(_))));
    }

    #[test]
    fn test_missing_file_has_context() {
        let err = ModelConfig::from_json_file(Path::new("/nonexistent/model.json")).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to open config"));
    }
}
