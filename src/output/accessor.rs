use std::collections::BTreeMap;
use std::sync::Arc;

use super::health::{ConcentrationResponse, LogLinearResponse};
use super::registry::{Namespace, Variable, VariableRegistry};
use crate::config::ModelConfig;
use crate::error::Result;
use crate::grid::Domain;

/// Resolves named variables to per-cell values, layer by layer.
///
/// Meant to run between iterations or after a run; each cell's state lock
/// is held only while that cell is read.
pub struct OutputAccessor<'a> {
    domain: &'a Domain,
    registry: VariableRegistry,
}

impl<'a> OutputAccessor<'a> {
    /// Accessor with the default PM2.5 concentration-response function.
    pub fn new(domain: &'a Domain, config: &ModelConfig) -> Self {
        Self::with_response(domain, config, Arc::new(LogLinearResponse::new()))
    }

    pub fn with_response(
        domain: &'a Domain,
        config: &ModelConfig,
        response: Arc<dyn ConcentrationResponse>,
    ) -> Self {
        Self {
            domain,
            registry: VariableRegistry::new(&config.population_names, response),
        }
    }

    pub fn registry(&self) -> &VariableRegistry {
        &self.registry
    }

    pub fn units(&self, name: &str) -> Result<&'static str> {
        Ok(self.registry.get(name)?.units)
    }

    /// One value per cell of `layer`, in cell order.
    pub fn layer_values(&self, name: &str, layer: usize) -> Result<Vec<f64>> {
        let variable = self.registry.get(name)?;
        Ok(self.extract(variable, layer))
    }

    fn extract(&self, variable: &Variable, layer: usize) -> Vec<f64> {
        let mut out = Vec::new();
        for cell in self.domain.cells() {
            // Cells are sorted by layer.
            if cell.layer() > layer {
                break;
            }
            if cell.layer() == layer {
                let state = cell.read();
                out.push(variable.value(cell, &state));
            }
        }
        out
    }

    /// Standard output: every concentration, population and mortality
    /// variable plus the baseline mortality rate, as `name -> [layer][cell]`.
    ///
    /// Ground layer only unless `all_layers` is set.
    pub fn collect(&self, all_layers: bool) -> BTreeMap<String, Vec<Vec<f64>>> {
        let n_layers = if all_layers {
            self.domain.n_layers()
        } else {
            self.domain.n_layers().min(1)
        };
        self.registry
            .iter()
            .filter(|v| match v.namespace {
                Namespace::Concentration | Namespace::Population | Namespace::Mortality => true,
                Namespace::Physical => v.name == "MortalityRate",
                Namespace::Emissions => false,
            })
            .map(|v| {
                let layers = (0..n_layers).map(|k| self.extract(v, k)).collect();
                (v.name.clone(), layers)
            })
            .collect()
    }
}
