//! Emissions input: per-pollutant mass rates aligned with the cell order.

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::{ModelError, Result};
use crate::grid::Domain;
use crate::species::{Concentrations, EmissionPollutant, ZERO_CONCENTRATIONS};

/// Emission rates [μg/s], one value per active cell in domain order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Emissions {
    rates: BTreeMap<EmissionPollutant, Vec<f64>>,
}

impl Emissions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses pollutant names (`VOC`, `NOx`, `NH3`, `SOx`, `PM2_5`).
    /// An unrecognized name is an error.
    pub fn from_named<I, K>(named: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, Vec<f64>)>,
        K: AsRef<str>,
    {
        let mut emissions = Self::new();
        for (name, values) in named {
            let pollutant: EmissionPollutant = name.as_ref().parse()?;
            emissions.insert(pollutant, values);
        }
        Ok(emissions)
    }

    pub fn with(mut self, pollutant: EmissionPollutant, values: Vec<f64>) -> Self {
        self.insert(pollutant, values);
        self
    }

    pub fn insert(&mut self, pollutant: EmissionPollutant, values: Vec<f64>) {
        self.rates.insert(pollutant, values);
    }

    pub fn get(&self, pollutant: EmissionPollutant) -> Option<&[f64]> {
        self.rates.get(&pollutant).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// Volumetric flux [μg/m³/s] per cell: rate times the pollutant's mass
    /// scale, divided by the cell volume.
    pub fn fluxes(&self, domain: &Domain) -> Result<Vec<Concentrations>> {
        let n = domain.len();
        let mut fluxes = vec![ZERO_CONCENTRATIONS; n];
        for (&pollutant, values) in &self.rates {
            if values.len() != n {
                return Err(ModelError::EmissionsLength {
                    pollutant: pollutant.name().to_string(),
                    expected: n,
                    found: values.len(),
                });
            }
            let s = pollutant.species().index();
            let scale = pollutant.scale();
            for ((flux, cell), rate) in fluxes.iter_mut().zip(domain.cells()).zip(values) {
                flux[s] += rate * scale / cell.props.volume();
            }
        }
        Ok(fluxes)
    }

    /// Stores the fluxes on every cell, replacing previous ones.
    pub fn apply(&self, domain: &mut Domain) -> Result<()> {
        let fluxes = self.fluxes(domain)?;
        for (cell, flux) in domain.cells_mut().iter_mut().zip(fluxes) {
            cell.state_mut().emis_flux = flux;
        }
        debug!(pollutants = self.rates.len(), "emissions applied");
        Ok(())
    }
}
