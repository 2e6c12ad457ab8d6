use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

pub const BOLTZMANN_J_PER_K: f64 = 1.380649e-23;
pub const AVOGADRO_PER_MOL: f64 = 6.02214076e23;
pub const ONE_ATM_PA: f64 = 101_325.0;

// Transition-regime coagulation
pub const CUNNINGHAM_SLIP_COEFF: f64 = 1.257;
pub const FREE_MOL_MAJORANT_FACTOR: f64 = 1.4178; // valid for spherical pairs
pub const DEFAULT_ENHANCEMENT_FM: f64 = 2.2;
pub const MEAN_FREE_PATH_AIR_COEFF: f64 = 2.371e-5; // m·Pa/K, lambda = coeff * T / P
pub const DISTINCT_SELECTION_RETRIES: u32 = 1000;

// Sutherland's law for air
pub const SUTHERLAND_AIR_COEFF: f64 = 1.458e-6; // Pa·s/K^0.5
pub const SUTHERLAND_AIR_TEMP_K: f64 = 110.4;

/// Physical constants handed to every rate law.
///
/// Nothing in the process code reads the module-level constants directly; they
/// only seed [`PhysicalConstants::default`], and a mechanism config may override
/// any field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicalConstants {
    pub boltzmann_j_per_k: f64,
    pub avogadro_per_mol: f64,
    pub slip_coefficient: f64,
    pub mean_free_path_coefficient: f64,
}

impl Default for PhysicalConstants {
    fn default() -> Self {
        Self {
            boltzmann_j_per_k: BOLTZMANN_J_PER_K,
            avogadro_per_mol: AVOGADRO_PER_MOL,
            slip_coefficient: CUNNINGHAM_SLIP_COEFF,
            mean_free_path_coefficient: MEAN_FREE_PATH_AIR_COEFF,
        }
    }
}

impl PhysicalConstants {
    /// Slip-flow kernel prefactor, 2·k_B/3.
    pub fn slip_flow_prefactor(&self) -> f64 {
        2.0 * self.boltzmann_j_per_k / 3.0
    }

    /// Free-molecular kernel prefactor, sqrt(π·k_B/2).
    pub fn free_mol_prefactor(&self) -> f64 {
        (PI * self.boltzmann_j_per_k / 2.0).sqrt()
    }

    /// Mean thermal speed of a gas molecule, sqrt(8kT/(πm)), in m/s.
    pub fn mean_molecular_speed(&self, temperature_k: f64, molar_mass_kg_per_mol: f64) -> f64 {
        let molecule_mass = molar_mass_kg_per_mol / self.avogadro_per_mol;
        (8.0 * self.boltzmann_j_per_k * temperature_k / (PI * molecule_mass)).sqrt()
    }
}

/// Dynamic viscosity of air from Sutherland's law, in Pa·s.
pub fn air_viscosity(temperature_k: f64) -> f64 {
    SUTHERLAND_AIR_COEFF * temperature_k * temperature_k.sqrt() / (temperature_k + SUTHERLAND_AIR_TEMP_K)
}
