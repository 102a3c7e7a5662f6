//! Immutable name → extractor table for every output variable.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::health::ConcentrationResponse;
use crate::error::{ModelError, Result};
use crate::grid::{Cell, CellProperties, CellState};
use crate::species::{CONCENTRATION_LABELS, EmissionPollutant, TOTAL_PM25, concentration_label};

/// Lookup namespaces, in resolution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Namespace {
    Emissions,
    Concentration,
    Population,
    Mortality,
    Physical,
}

type Extractor = Box<dyn Fn(&Cell, &CellState) -> f64 + Send + Sync>;

pub struct Variable {
    pub name: String,
    pub namespace: Namespace,
    pub units: &'static str,
    pub description: String,
    extract: Extractor,
}

impl Variable {
    fn new(
        name: impl Into<String>,
        namespace: Namespace,
        units: &'static str,
        description: impl Into<String>,
        extract: Extractor,
    ) -> Self {
        Self {
            name: name.into(),
            namespace,
            units,
            description: description.into(),
            extract,
        }
    }

    /// Value for one cell. The caller holds the cell's state lock.
    pub fn value(&self, cell: &Cell, state: &CellState) -> f64 {
        (self.extract)(cell, state)
    }
}

impl fmt::Debug for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Variable")
            .field("name", &self.name)
            .field("namespace", &self.namespace)
            .field("units", &self.units)
            .finish()
    }
}

type PropertyField = (&'static str, &'static str, &'static str, fn(&CellProperties) -> f64);

const PHYSICAL_FIELDS: &[PropertyField] = &[
    ("UAvg", "m/s", "Average East-West wind speed", |p| p.u_avg),
    ("VAvg", "m/s", "Average North-South wind speed", |p| p.v_avg),
    ("WAvg", "m/s", "Average vertical wind speed", |p| p.w_avg),
    ("UDeviation", "m/s", "Turbulent East-West wind deviation", |p| p.u_deviation),
    ("VDeviation", "m/s", "Turbulent North-South wind deviation", |p| p.v_deviation),
    ("WDeviation", "m/s", "Turbulent vertical wind deviation", |p| p.w_deviation),
    ("Kzz", "m²/s", "Vertical turbulent diffusivity", |p| p.kzz),
    ("Kxxyy", "m²/s", "Horizontal turbulent diffusivity", |p| p.kxxyy),
    ("M2u", "1/s", "ACM2 upward mixing rate", |p| p.m2u),
    ("M2d", "1/s", "ACM2 downward mixing rate", |p| p.m2d),
    ("Dx", "m", "Cell width", |p| p.dx),
    ("Dy", "m", "Cell depth", |p| p.dy),
    ("Dz", "m", "Cell height", |p| p.dz),
    ("Volume", "m³", "Cell volume", |p| p.volume()),
    ("Layer", "-", "Vertical layer index", |p| p.layer as f64),
    ("LayerHeight", "m", "Height of the layer top", |p| p.layer_height),
    ("Temperature", "K", "Average temperature", |p| p.temperature),
    ("WindSpeed", "m/s", "RMS wind speed", |p| p.wind_speed),
    ("ParticleDryDep", "m/s", "Particle dry deposition velocity", |p| p.particle_dry_dep),
    ("SO2DryDep", "m/s", "SO2 dry deposition velocity", |p| p.so2_dry_dep),
    ("NH3DryDep", "m/s", "NH3 dry deposition velocity", |p| p.nh3_dry_dep),
    ("VOCDryDep", "m/s", "VOC dry deposition velocity", |p| p.voc_dry_dep),
    ("NOxDryDep", "m/s", "NOx dry deposition velocity", |p| p.nox_dry_dep),
    ("ParticleWetDep", "1/s", "Particle wet deposition rate", |p| p.particle_wet_dep),
    ("SO2WetDep", "1/s", "SO2 wet deposition rate", |p| p.so2_wet_dep),
    ("OtherGasWetDep", "1/s", "Wet deposition rate of other gases", |p| p.other_gas_wet_dep),
];

/// Every resolvable output variable, registered once.
///
/// Names are registered namespace by namespace; when two namespaces offer
/// the same name the earlier one wins.
pub struct VariableRegistry {
    variables: Vec<Variable>,
    index: HashMap<String, usize>,
}

impl VariableRegistry {
    pub fn new(population_names: &[String], response: Arc<dyn ConcentrationResponse>) -> Self {
        let mut registry = Self {
            variables: Vec::new(),
            index: HashMap::new(),
        };

        for pollutant in EmissionPollutant::ALL {
            let species = pollutant.species();
            let s = species.index();
            registry.register(Variable::new(
                pollutant.flux_label(),
                Namespace::Emissions,
                "μg/m³/s",
                format!("Emissions of {} as {} mass", pollutant.name(), species.label()),
                Box::new(move |_: &Cell, state: &CellState| state.emis_flux[s]),
            ));
        }

        for label in CONCENTRATION_LABELS {
            registry.register(Variable::new(
                label.name,
                Namespace::Concentration,
                "μg/m³",
                label.description,
                Box::new(move |_: &Cell, state: &CellState| label.evaluate(&state.cf)),
            ));
        }

        for name in population_names {
            let key = name.clone();
            registry.register(Variable::new(
                name.as_str(),
                Namespace::Population,
                "people/m²",
                format!("{name} population density"),
                Box::new(move |cell: &Cell, _: &CellState| {
                    cell.population.count(&key) / cell.props.footprint_area()
                }),
            ));
        }

        if let Some(pm25) = concentration_label(TOTAL_PM25) {
            for name in population_names {
                let key = name.clone();
                let response = Arc::clone(&response);
                registry.register(Variable::new(
                    format!("{name} deaths"),
                    Namespace::Mortality,
                    "deaths/grid cell",
                    format!("Deaths among {name} attributable to PM2.5"),
                    Box::new(move |cell: &Cell, state: &CellState| {
                        let rr = response.relative_risk(pm25.evaluate(&state.cf));
                        response.deaths(
                            rr,
                            cell.population.count(&key),
                            cell.population.mortality_rate,
                        )
                    }),
                ));
            }
        }

        for &(name, units, description, field) in PHYSICAL_FIELDS {
            registry.register(Variable::new(
                name,
                Namespace::Physical,
                units,
                description,
                Box::new(move |cell: &Cell, _: &CellState| field(&cell.props)),
            ));
        }
        registry.register(Variable::new(
            "MortalityRate",
            Namespace::Physical,
            "deaths/100,000/year",
            "Baseline mortality rate",
            Box::new(|cell: &Cell, _: &CellState| cell.population.mortality_rate),
        ));

        registry
    }

    fn register(&mut self, variable: Variable) {
        if self.index.contains_key(&variable.name) {
            return;
        }
        self.index.insert(variable.name.clone(), self.variables.len());
        self.variables.push(variable);
    }

    pub fn get(&self, name: &str) -> Result<&Variable> {
        self.index
            .get(name)
            .map(|&i| &self.variables[i])
            .ok_or_else(|| ModelError::UnknownVariable(name.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Variable> {
        self.variables.iter()
    }

    pub fn in_namespace(&self, namespace: Namespace) -> impl Iterator<Item = &Variable> {
        self.variables.iter().filter(move |v| v.namespace == namespace)
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::health::LogLinearResponse;
    use crate::species::Species;

    fn registry(names: &[&str]) -> VariableRegistry {
        let names: Vec<String> = names.iter().map(|s| s.to_string()).collect();
        VariableRegistry::new(&names, Arc::new(LogLinearResponse::new()))
    }

    #[test]
    fn test_namespaces_in_order() {
        let r = registry(&["TotalPop"]);
        let order: Vec<Namespace> = r.iter().map(|v| v.namespace).collect();
        assert!(order.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(r.in_namespace(Namespace::Emissions).count(), 5);
        assert_eq!(r.in_namespace(Namespace::Concentration).count(), 10);
        assert_eq!(r.get("TotalPop deaths").unwrap().namespace, Namespace::Mortality);
        assert_eq!(r.get("Kzz").unwrap().units, "m²/s");
    }

    #[test]
    fn test_first_registration_wins() {
        // A population named like a concentration stays a concentration.
        let r = registry(&["VOC", "Dx"]);
        assert_eq!(r.get("VOC").unwrap().namespace, Namespace::Concentration);
        assert_eq!(r.get("Dx").unwrap().namespace, Namespace::Population);
        assert_eq!(r.get("VOC deaths").unwrap().namespace, Namespace::Mortality);
    }

    #[test]
    fn test_unknown_name() {
        let r = registry(&[]);
        assert!(matches!(
            r.get("Ozone"),
            Err(ModelError::UnknownVariable(ref n)) if n == "Ozone"
        ));
    }

    #[test]
    fn test_extractors_read_cell() {
        let r = registry(&["TotalPop"]);
        let mut cell = Cell::new(CellProperties::with_size(10.0, 10.0, 5.0, 0));
        cell.population.counts.insert("TotalPop".to_string(), 200.0);
        cell.population.mortality_rate = 800.0;
        let mut state = CellState::default();
        state.cf[Species::PrimaryPm25.index()] = 10.0;
        state.emis_flux[Species::GasSulfur.index()] = 2.0;

        assert_eq!(r.get("PrimaryPM2_5").unwrap().value(&cell, &state), 10.0);
        assert_eq!(r.get("TotalPop").unwrap().value(&cell, &state), 2.0);
        assert_eq!(r.get("Volume").unwrap().value(&cell, &state), 500.0);
        assert_eq!(r.get("MortalityRate").unwrap().value(&cell, &state), 800.0);
        // Stored flux, already in the tracked species' mass.
        assert_eq!(r.get("SOx emissions").unwrap().value(&cell, &state), 2.0);
        assert!(r.get("SOx emissions").unwrap().description.contains("SOx"));
        let deaths = r.get("TotalPop deaths").unwrap().value(&cell, &state);
        assert!((deaths - 0.06 / 1.06 * 200.0 * 800.0 / 100_000.0).abs() < 1e-12);
    }
}
