//! Scenario files: a JSON description of one run.
//!
//! A scenario bundles the model configuration, a regular grid, emissions
//! keyed by pollutant name and the list of transport operators to apply.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::ModelConfig;
use crate::grid::{Domain, RegularGrid};
use crate::sim::framework::ScienceOperator;
use crate::sim::operators::{DryDeposition, TurbulentMixing, UpwindAdvection, WetDeposition};
use crate::sim::{Emissions, Model};

/// Reference operators selectable from a scenario file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatorKind {
    Advection,
    Mixing,
    DryDeposition,
    WetDeposition,
}

impl OperatorKind {
    pub fn build(self) -> Box<dyn ScienceOperator> {
        match self {
            OperatorKind::Advection => Box::new(UpwindAdvection),
            OperatorKind::Mixing => Box::new(TurbulentMixing),
            OperatorKind::DryDeposition => Box::new(DryDeposition),
            OperatorKind::WetDeposition => Box::new(WetDeposition),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    pub model: ModelConfig,
    pub grid: RegularGrid,
    /// Emission rates [μg/s] per pollutant name, one value per cell.
    pub emissions: BTreeMap<String, Vec<f64>>,
    /// Operators run after emissions injection, in order.
    pub operators: Vec<OperatorKind>,
    /// Report every layer instead of the ground layer only.
    pub output_all_layers: bool,
    /// Where `airshed run` writes results. Defaults next to the scenario.
    pub output: Option<PathBuf>,
}

impl Scenario {
    pub fn new() -> Self {
        Self {
            model: ModelConfig::new(),
            grid: RegularGrid::default(),
            emissions: BTreeMap::new(),
            operators: vec![
                OperatorKind::Advection,
                OperatorKind::Mixing,
                OperatorKind::DryDeposition,
                OperatorKind::WetDeposition,
            ],
            output_all_layers: false,
            output: None,
        }
    }

    /// Reads and validates a scenario file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open scenario: {}", path.display()))?;
        let scenario: Scenario = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse scenario: {}", path.display()))?;
        scenario
            .model
            .validate()
            .with_context(|| format!("Invalid model settings in {}", path.display()))?;
        Ok(scenario)
    }

    /// Parses and validates a scenario held in memory.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let scenario: Scenario =
            serde_json::from_str(json).context("Failed to parse scenario from string")?;
        scenario
            .model
            .validate()
            .context("Invalid model settings in scenario string")?;
        Ok(scenario)
    }

    pub fn build_domain(&self) -> Result<Domain> {
        Domain::new(self.grid.cells()).context("Failed to build grid")
    }

    pub fn build_emissions(&self) -> Result<Emissions> {
        Emissions::from_named(self.emissions.iter().map(|(k, v)| (k, v.clone())))
            .context("Invalid emissions")
    }

    pub fn build_model(&self) -> Model {
        self.operators
            .iter()
            .fold(Model::new(self.model.clone()), |model, kind| {
                model.with_boxed_operator(kind.build())
            })
    }
}

impl Default for Scenario {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_minimal_scenario_uses_defaults() -> Result<()> {
        let s = Scenario::from_json_str("{}")?;
        assert_eq!(s.grid.len(), 1);
        assert_eq!(s.operators.len(), 4);
        assert!(!s.output_all_layers);
        assert_eq!(
            s.build_model().operator_names(),
            vec!["emissions", "advection", "mixing", "dry deposition", "wet deposition"]
        );
        Ok(())
    }

    #[test]
    fn test_read_scenario_file() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("scenario.json");
        let mut f = File::create(&path)?;
        write!(
            f,
            r#"{{
                "model": {{ "num_iterations": 3 }},
                "grid": {{ "nx": 2, "ny": 1, "dx": 100.0, "dy": 100.0,
                           "layer_thicknesses": [10.0] }},
                "emissions": {{ "PM2_5": [1.0, 0.0] }},
                "operators": ["dry_deposition"]
            }}"#
        )?;

        let s = Scenario::from_json_file(&path)?;
        assert_eq!(s.model.num_iterations, Some(3));
        let domain = s.build_domain()?;
        assert_eq!(domain.len(), 2);
        assert!(s.build_emissions()?.fluxes(&domain).is_ok());
        assert_eq!(s.build_model().operator_names(), vec!["emissions", "dry deposition"]);
        Ok(())
    }

    #[test]
    fn test_unknown_pollutant_in_scenario() {
        let s = Scenario::from_json_str(r#"{ "emissions": { "CO2": [1.0] } }"#).unwrap();
        let err = s.build_emissions().unwrap_err();
        assert!(format!("{err:#}").contains("unknown emissions pollutant `CO2`"));
    }

    #[test]
    fn test_invalid_model_settings_are_rejected() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("bad.json");
        std::fs::write(&path, r#"{ "model": { "courant": -1.0 } }"#)?;
        let err = Scenario::from_json_file(&path).unwrap_err();
        assert!(format!("{err:#}").contains("courant"));
        Ok(())
    }

    #[test]
    fn test_invalid_model_settings_in_string_are_rejected() {
        let err = Scenario::from_json_str(r#"{ "model": { "workers": 0 } }"#).unwrap_err();
        assert!(format!("{err:#}").contains("workers must be at least 1"));

        let err = Scenario::from_json_str(r#"{ "model": { "tolerance": 0.0 } }"#).unwrap_err();
        assert!(format!("{err:#}").contains("tolerance"));
    }
}
