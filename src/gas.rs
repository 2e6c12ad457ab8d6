//! Gas-phase state as seen by the particle processes.
//!
//! The gas-phase chemistry solver owns this state and writes it through the
//! setters; processes only read it.

use serde::{Deserialize, Serialize};

use crate::constants::air_viscosity;
use crate::error::{Result, SweepError};

/// Ordered list of gas-phase species names; a species' position is the index
/// used for its concentration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SpeciesTable {
    names: Vec<String>,
}

impl SpeciesTable {
    pub fn new<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Index of the first of `aliases` present in the table.
    pub fn require_any(&self, aliases: &[&str]) -> Result<usize> {
        aliases
            .iter()
            .find_map(|alias| self.index_of(alias))
            .ok_or_else(|| SweepError::UnknownSpecies(aliases.join("|")))
    }

    pub fn require(&self, name: &str) -> Result<usize> {
        self.index_of(name)
            .ok_or_else(|| SweepError::UnknownSpecies(name.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GasPhase {
    temperature_k: f64,
    pressure_pa: f64,
    viscosity_pa_s: f64,
    concentrations_mol_m3: Vec<f64>,
}

impl GasPhase {
    pub fn new(temperature_k: f64, pressure_pa: f64, viscosity_pa_s: f64, concentrations_mol_m3: Vec<f64>) -> Self {
        Self {
            temperature_k,
            pressure_pa,
            viscosity_pa_s,
            concentrations_mol_m3,
        }
    }

    /// Gas state with the viscosity of air at `temperature_k`.
    pub fn with_air_viscosity(temperature_k: f64, pressure_pa: f64, concentrations_mol_m3: Vec<f64>) -> Self {
        Self::new(temperature_k, pressure_pa, air_viscosity(temperature_k), concentrations_mol_m3)
    }

    pub fn temperature(&self) -> f64 {
        self.temperature_k
    }

    pub fn pressure(&self) -> f64 {
        self.pressure_pa
    }

    pub fn viscosity(&self) -> f64 {
        self.viscosity_pa_s
    }

    /// Concentration in mol/m³; zero for an index outside the mechanism.
    pub fn species_concentration(&self, index: usize) -> f64 {
        self.concentrations_mol_m3.get(index).copied().unwrap_or(0.0)
    }

    pub fn concentrations(&self) -> &[f64] {
        &self.concentrations_mol_m3
    }

    pub fn set_temperature(&mut self, temperature_k: f64) {
        self.temperature_k = temperature_k;
    }

    pub fn set_pressure(&mut self, pressure_pa: f64) {
        self.pressure_pa = pressure_pa;
    }

    pub fn set_viscosity(&mut self, viscosity_pa_s: f64) {
        self.viscosity_pa_s = viscosity_pa_s;
    }

    pub fn set_concentrations(&mut self, concentrations_mol_m3: Vec<f64>) {
        self.concentrations_mol_m3 = concentrations_mol_m3;
    }
}
