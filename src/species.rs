//! Tracked species, accepted emission pollutants and unit conversions.
//!
//! All tables here are immutable; the variable registry and the emissions
//! loader read them directly instead of keeping mutable lookup maps.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Number of tracked species.
pub const NUM_SPECIES: usize = 9;

/// Per-species concentration (or flux) vector.
pub type Concentrations = [f64; NUM_SPECIES];

/// All-zero concentrations, used for ghost cells.
pub const ZERO_CONCENTRATIONS: Concentrations = [0.0; NUM_SPECIES];

// Molar masses in g/mol.
const MW_NOX: f64 = 46.0055;
const MW_N: f64 = 14.0067;
const MW_NO3: f64 = 62.00501;
const MW_NH3: f64 = 17.03056;
const MW_NH4: f64 = 18.03851;
const MW_S: f64 = 32.0655;
const MW_SO2: f64 = 64.0644;
const MW_SO4: f64 = 96.0632;

/// Mass of N per mass of NOx.
pub const NOX_TO_N: f64 = MW_N / MW_NOX;
/// Mass of NO3 per mass of N.
pub const N_TO_NO3: f64 = MW_NO3 / MW_N;
/// Mass of S per mass of SO2.
pub const SOX_TO_S: f64 = MW_S / MW_SO2;
/// Mass of SO4 per mass of S.
pub const S_TO_SO4: f64 = MW_SO4 / MW_S;
/// Mass of N per mass of NH3.
pub const NH3_TO_N: f64 = MW_N / MW_NH3;
/// Mass of NH4 per mass of N.
pub const N_TO_NH4: f64 = MW_NH4 / MW_N;

/// The nine tracked tracers: gas- and particle-phase organic matter, primary
/// PM2.5, and the N (ammonia), S (sulfur) and N (nitrate) carriers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Species {
    GasOrganic,
    ParticleOrganic,
    PrimaryPm25,
    GasAmmonia,
    ParticleAmmonium,
    GasSulfur,
    ParticleSulfate,
    GasNitrogenOxide,
    ParticleNitrate,
}

impl Species {
    pub const ALL: [Species; NUM_SPECIES] = [
        Species::GasOrganic,
        Species::ParticleOrganic,
        Species::PrimaryPm25,
        Species::GasAmmonia,
        Species::ParticleAmmonium,
        Species::GasSulfur,
        Species::ParticleSulfate,
        Species::GasNitrogenOxide,
        Species::ParticleNitrate,
    ];

    /// Position of this species in every [`Concentrations`] vector.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Short label used in logs.
    pub fn label(self) -> &'static str {
        match self {
            Species::GasOrganic => "gOrg",
            Species::ParticleOrganic => "pOrg",
            Species::PrimaryPm25 => "PM2_5",
            Species::GasAmmonia => "gNH",
            Species::ParticleAmmonium => "pNH",
            Species::GasSulfur => "gS",
            Species::ParticleSulfate => "pS",
            Species::GasNitrogenOxide => "gNO",
            Species::ParticleNitrate => "pNO",
        }
    }

    pub fn is_particle(self) -> bool {
        matches!(
            self,
            Species::ParticleOrganic
                | Species::PrimaryPm25
                | Species::ParticleAmmonium
                | Species::ParticleSulfate
                | Species::ParticleNitrate
        )
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Pollutants accepted as emissions input, in μg/s per cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EmissionPollutant {
    Voc,
    Nox,
    Nh3,
    Sox,
    Pm25,
}

impl EmissionPollutant {
    pub const ALL: [EmissionPollutant; 5] = [
        EmissionPollutant::Voc,
        EmissionPollutant::Nox,
        EmissionPollutant::Nh3,
        EmissionPollutant::Sox,
        EmissionPollutant::Pm25,
    ];

    pub fn name(self) -> &'static str {
        match self {
            EmissionPollutant::Voc => "VOC",
            EmissionPollutant::Nox => "NOx",
            EmissionPollutant::Nh3 => "NH3",
            EmissionPollutant::Sox => "SOx",
            EmissionPollutant::Pm25 => "PM2_5",
        }
    }

    /// Species that receives this pollutant. Everything except PM2.5 is
    /// emitted into the gas phase.
    pub fn species(self) -> Species {
        match self {
            EmissionPollutant::Voc => Species::GasOrganic,
            EmissionPollutant::Nox => Species::GasNitrogenOxide,
            EmissionPollutant::Nh3 => Species::GasAmmonia,
            EmissionPollutant::Sox => Species::GasSulfur,
            EmissionPollutant::Pm25 => Species::PrimaryPm25,
        }
    }

    /// Mass conversion from emitted compound to tracked carrier.
    pub fn scale(self) -> f64 {
        match self {
            EmissionPollutant::Voc | EmissionPollutant::Pm25 => 1.0,
            EmissionPollutant::Nox => NOX_TO_N,
            EmissionPollutant::Nh3 => NH3_TO_N,
            EmissionPollutant::Sox => SOX_TO_S,
        }
    }

    /// Output label of the emissions-flux variable for this pollutant.
    pub fn flux_label(self) -> &'static str {
        match self {
            EmissionPollutant::Voc => "VOC emissions",
            EmissionPollutant::Nox => "NOx emissions",
            EmissionPollutant::Nh3 => "NH3 emissions",
            EmissionPollutant::Sox => "SOx emissions",
            EmissionPollutant::Pm25 => "PM2.5 emissions",
        }
    }
}

impl FromStr for EmissionPollutant {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EmissionPollutant::ALL
            .into_iter()
            .find(|p| p.name() == s)
            .ok_or_else(|| ModelError::UnknownEmission(s.to_string()))
    }
}

/// A named concentration output: weighted sum of species.
#[derive(Debug, Clone, Copy)]
pub struct ConcentrationLabel {
    pub name: &'static str,
    pub description: &'static str,
    pub terms: &'static [(Species, f64)],
}

impl ConcentrationLabel {
    pub fn evaluate(&self, c: &Concentrations) -> f64 {
        self.terms.iter().map(|(s, k)| c[s.index()] * k).sum()
    }
}

/// Label used for the fine-particulate total fed to health functions.
pub const TOTAL_PM25: &str = "TotalPM2_5";

pub const CONCENTRATION_LABELS: &[ConcentrationLabel] = &[
    ConcentrationLabel {
        name: TOTAL_PM25,
        description: "Total PM2.5 concentration",
        terms: &[
            (Species::PrimaryPm25, 1.0),
            (Species::ParticleOrganic, 1.0),
            (Species::ParticleAmmonium, N_TO_NH4),
            (Species::ParticleSulfate, S_TO_SO4),
            (Species::ParticleNitrate, N_TO_NO3),
        ],
    },
    ConcentrationLabel {
        name: "VOC",
        description: "Gas-phase organic matter",
        terms: &[(Species::GasOrganic, 1.0)],
    },
    ConcentrationLabel {
        name: "SOA",
        description: "Secondary organic aerosol",
        terms: &[(Species::ParticleOrganic, 1.0)],
    },
    ConcentrationLabel {
        name: "PrimaryPM2_5",
        description: "Primary PM2.5",
        terms: &[(Species::PrimaryPm25, 1.0)],
    },
    ConcentrationLabel {
        name: "NH3",
        description: "Ammonia",
        terms: &[(Species::GasAmmonia, 1.0 / NH3_TO_N)],
    },
    ConcentrationLabel {
        name: "pNH4",
        description: "Particulate ammonium",
        terms: &[(Species::ParticleAmmonium, N_TO_NH4)],
    },
    ConcentrationLabel {
        name: "SOx",
        description: "Sulfur oxides",
        terms: &[(Species::GasSulfur, 1.0 / SOX_TO_S)],
    },
    ConcentrationLabel {
        name: "pSO4",
        description: "Particulate sulfate",
        terms: &[(Species::ParticleSulfate, S_TO_SO4)],
    },
    ConcentrationLabel {
        name: "NOx",
        description: "Nitrogen oxides",
        terms: &[(Species::GasNitrogenOxide, 1.0 / NOX_TO_N)],
    },
    ConcentrationLabel {
        name: "pNO3",
        description: "Particulate nitrate",
        terms: &[(Species::ParticleNitrate, N_TO_NO3)],
    },
];

pub fn concentration_label(name: &str) -> Option<&'static ConcentrationLabel> {
    CONCENTRATION_LABELS.iter().find(|l| l.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_species_indices_are_dense() {
        for (i, s) in Species::ALL.iter().enumerate() {
            assert_eq!(s.index(), i);
        }
    }

    #[test]
    fn test_emission_names_round_trip() {
        for p in EmissionPollutant::ALL {
            assert_eq!(p.name().parse::<EmissionPollutant>().unwrap(), p);
        }
    }

    #[test]
    fn test_unknown_emission_is_error() {
        let err = "CO2".parse::<EmissionPollutant>().unwrap_err();
        assert!(matches!(err, ModelError::UnknownEmission(ref n) if n == "CO2"));
    }

    #[test]
    fn test_sox_label_inverts_emission_scale() {
        // 1 μg SOx emitted and reported back as SOx is still 1 μg.
        let mut c = ZERO_CONCENTRATIONS;
        c[Species::GasSulfur.index()] = EmissionPollutant::Sox.scale();
        let sox = concentration_label("SOx").unwrap();
        assert!((sox.evaluate(&c) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_total_pm25_weights_align_with_species() {
        let label = concentration_label(TOTAL_PM25).unwrap();
        let mut c = ZERO_CONCENTRATIONS;
        c[Species::ParticleSulfate.index()] = 1.0;
        assert!((label.evaluate(&c) - S_TO_SO4).abs() < 1e-12);
        c = ZERO_CONCENTRATIONS;
        c[Species::ParticleNitrate.index()] = 1.0;
        assert!((label.evaluate(&c) - N_TO_NO3).abs() < 1e-12);
    }

    #[test]
    fn test_gas_species_are_not_particles() {
        assert!(!Species::GasSulfur.is_particle());
        assert!(Species::ParticleSulfate.is_particle());
        assert!(Species::PrimaryPm25.is_particle());
    }
}
