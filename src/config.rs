//! JSON mechanism configuration.
//!
//! Names (species, components) are resolved to indices once, in
//! [`MechanismConfig::build`]; a missing name aborts construction.

use std::fs;
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::constants::{PhysicalConstants, DEFAULT_ENHANCEMENT_FM, DISTINCT_SELECTION_RETRIES};
use crate::error::{Result, SweepError};
use crate::gas::SpeciesTable;
use crate::mechanism::Mechanism;
use crate::particle::{
    builtin_component, AggregationModel, CollisionEfficiency, Component, ComponentChange, ComponentKind,
    ParticleModel,
};
use crate::process::mass_diffusion::{DEFAULT_MAX_COVER_FRACTION, DEFAULT_RATE_CONSTANT};
use crate::process::{
    CoagulationParams, MassDiffusion, MassDiffusionParams, ParticleProcess, SurfaceOxidation,
    SurfaceOxidationParams, TemperatureSchedule, TransitionCoagulation,
};

/// A built-in component by name, or a full inline definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ComponentConfig {
    Builtin(String),
    Custom(Component),
}

/// A species name, or several aliases of which the first present is used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SpeciesRef {
    Name(String),
    Aliases(Vec<String>),
}

impl SpeciesRef {
    fn resolve(&self, species: &SpeciesTable) -> Result<usize> {
        match self {
            SpeciesRef::Name(name) => species.require(name),
            SpeciesRef::Aliases(aliases) => {
                let aliases: Vec<&str> = aliases.iter().map(String::as_str).collect();
                species.require_any(&aliases)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeConfig {
    pub component: String,
    pub delta: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CollisionEfficiencyConfig {
    #[default]
    Unity,
    Constant {
        value: f64,
    },
    ComponentThreshold {
        component: String,
        min_units: f64,
        below: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoagulationConfig {
    #[serde(default = "default_enhancement_fm")]
    pub enhancement_fm: f64,
    #[serde(default = "default_unit")]
    pub rate_scale: f64,
    #[serde(default = "default_retries")]
    pub max_selection_retries: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceOxidationConfig {
    pub oxidizer: SpeciesRef,
    #[serde(default = "default_oxidizer_molar_mass")]
    pub oxidizer_molar_mass_kg_per_mol: f64,
    #[serde(default = "default_sticking")]
    pub sticking_coefficient: f64,
    #[serde(default = "default_oxidizer_per_event")]
    pub oxidizer_per_event: f64,
    #[serde(default = "TemperatureSchedule::aluminum_oxidation")]
    pub schedule: TemperatureSchedule,
    pub changes: Vec<ChangeConfig>,
    #[serde(default)]
    pub deferred: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MassDiffusionConfig {
    pub fuel: SpeciesRef,
    pub cap_species: SpeciesRef,
    pub core_component: String,
    pub cap_component: String,
    #[serde(default = "default_rate_constant")]
    pub rate_constant: f64,
    #[serde(default = "default_max_cover")]
    pub max_cover_fraction: f64,
    #[serde(default = "TemperatureSchedule::aluminum_diffusion")]
    pub schedule: TemperatureSchedule,
    pub changes: Vec<ChangeConfig>,
    #[serde(default)]
    pub deferred: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProcessConfig {
    TransitionCoagulation(CoagulationConfig),
    SurfaceOxidation(SurfaceOxidationConfig),
    MassDiffusion(MassDiffusionConfig),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MechanismConfig {
    pub species: Vec<String>,
    pub components: Vec<ComponentConfig>,
    #[serde(default)]
    pub aggregation: AggregationModel,
    #[serde(default)]
    pub collision_efficiency: CollisionEfficiencyConfig,
    #[serde(default)]
    pub constants: PhysicalConstants,
    pub processes: Vec<ProcessConfig>,
}

fn default_enhancement_fm() -> f64 {
    DEFAULT_ENHANCEMENT_FM
}

fn default_unit() -> f64 {
    1.0
}

fn default_retries() -> u32 {
    DISTINCT_SELECTION_RETRIES
}

fn default_oxidizer_molar_mass() -> f64 {
    0.031998
}

fn default_sticking() -> f64 {
    0.1
}

fn default_oxidizer_per_event() -> f64 {
    3.0
}

fn default_rate_constant() -> f64 {
    DEFAULT_RATE_CONSTANT
}

fn default_max_cover() -> f64 {
    DEFAULT_MAX_COVER_FRACTION
}

impl MechanismConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    pub fn build(&self) -> Result<Mechanism> {
        if self.components.is_empty() {
            return Err(SweepError::InvalidConfig("mechanism has no particle components".to_string()));
        }
        let components = self
            .components
            .iter()
            .map(resolve_component)
            .collect::<Result<Vec<_>>>()?;
        let species = SpeciesTable::new(self.species.iter().cloned());
        let mut model = ParticleModel::new(components, self.aggregation)
            .with_avogadro(self.constants.avogadro_per_mol);
        let efficiency = resolve_efficiency(&self.collision_efficiency, &model)?;
        model = model.with_collision_efficiency(efficiency);

        let mut mechanism = Mechanism::new(self.constants, species, model);
        for process in &self.processes {
            let built = resolve_process(process, &mechanism)?;
            mechanism.add_process(built);
        }
        debug!(
            "mechanism built: {} species, {} components, {} processes",
            mechanism.species().len(),
            mechanism.model().component_count(),
            mechanism.processes().len()
        );
        Ok(mechanism)
    }
}

fn resolve_component(config: &ComponentConfig) -> Result<Component> {
    match config {
        ComponentConfig::Builtin(name) => ComponentKind::from_name(name)
            .and_then(builtin_component)
            .cloned()
            .ok_or_else(|| SweepError::UnknownComponent(name.clone())),
        ComponentConfig::Custom(component) => {
            if component.molar_mass_kg_per_mol > 0.0 && component.density_kg_m3 > 0.0 {
                Ok(component.clone())
            } else {
                Err(SweepError::InvalidConfig(format!(
                    "component '{}' needs positive molar mass and density",
                    component.name
                )))
            }
        }
    }
}

fn require_component(model: &ParticleModel, name: &str) -> Result<usize> {
    model
        .component_index(name)
        .ok_or_else(|| SweepError::UnknownComponent(name.to_string()))
}

fn check_efficiency(value: f64) -> Result<f64> {
    if value > 0.0 && value <= 1.0 {
        Ok(value)
    } else {
        Err(SweepError::InvalidConfig(format!(
            "collision efficiency must be in (0, 1], got {}",
            value
        )))
    }
}

fn resolve_efficiency(config: &CollisionEfficiencyConfig, model: &ParticleModel) -> Result<CollisionEfficiency> {
    match config {
        CollisionEfficiencyConfig::Unity => Ok(CollisionEfficiency::Unity),
        CollisionEfficiencyConfig::Constant { value } => Ok(CollisionEfficiency::Constant(check_efficiency(*value)?)),
        CollisionEfficiencyConfig::ComponentThreshold {
            component,
            min_units,
            below,
        } => Ok(CollisionEfficiency::ComponentThreshold {
            component: require_component(model, component)?,
            min_units: *min_units,
            below: check_efficiency(*below)?,
        }),
    }
}

fn resolve_changes(changes: &[ChangeConfig], model: &ParticleModel) -> Result<Vec<ComponentChange>> {
    changes
        .iter()
        .map(|change| {
            Ok(ComponentChange {
                component: require_component(model, &change.component)?,
                delta: change.delta,
            })
        })
        .collect()
}

fn resolve_process(config: &ProcessConfig, mechanism: &Mechanism) -> Result<ParticleProcess> {
    let model = mechanism.model();
    let constants = mechanism.constants();
    match config {
        ProcessConfig::TransitionCoagulation(c) => {
            let mut params = CoagulationParams::from_constants(constants, c.enhancement_fm).with_rate_scale(c.rate_scale);
            params.max_selection_retries = c.max_selection_retries;
            Ok(TransitionCoagulation::new(params).into())
        }
        ProcessConfig::SurfaceOxidation(c) => {
            if c.oxidizer_per_event <= 0.0 {
                return Err(SweepError::InvalidConfig(
                    "surface oxidation needs a positive oxidizer_per_event".to_string(),
                ));
            }
            Ok(SurfaceOxidation::new(SurfaceOxidationParams {
                oxidizer_species: c.oxidizer.resolve(mechanism.species())?,
                oxidizer_molar_mass_kg_per_mol: c.oxidizer_molar_mass_kg_per_mol,
                sticking_coefficient: c.sticking_coefficient,
                oxidizer_per_event: c.oxidizer_per_event,
                schedule: c.schedule.clone(),
                changes: resolve_changes(&c.changes, model)?,
                deferred: c.deferred,
                boltzmann_j_per_k: constants.boltzmann_j_per_k,
                avogadro_per_mol: constants.avogadro_per_mol,
            })
            .into())
        }
        ProcessConfig::MassDiffusion(c) => {
            if !(0.0..1.0).contains(&c.max_cover_fraction) {
                return Err(SweepError::InvalidConfig(format!(
                    "max_cover_fraction must be in [0, 1), got {}",
                    c.max_cover_fraction
                )));
            }
            Ok(MassDiffusion::new(MassDiffusionParams {
                fuel_species: c.fuel.resolve(mechanism.species())?,
                cap_species: c.cap_species.resolve(mechanism.species())?,
                core_component: require_component(model, &c.core_component)?,
                cap_component: require_component(model, &c.cap_component)?,
                rate_constant: c.rate_constant,
                max_cover_fraction: c.max_cover_fraction,
                schedule: c.schedule.clone(),
                changes: resolve_changes(&c.changes, model)?,
                deferred: c.deferred,
            })
            .into())
        }
    }
}
