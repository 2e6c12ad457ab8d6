//! Heterogeneous surface oxidation.
//!
//! Each event consumes `oxidizer_per_event` oxidizer molecules at the surface of
//! one particle and applies the configured composition change. The event rate
//! is linear in surface area, so selecting by surface area makes the total rate
//! exact and every event real.

use std::io::{Read, Write};

use log::debug;

use crate::cell::Cell;
use crate::constants::PhysicalConstants;
use crate::error::Result;
use crate::gas::GasPhase;
use crate::mechanism::Mechanism;
use crate::particle::{ComponentChange, Particle, ParticleModel, PropertyKey, Weighting};
use crate::process::record::{
    read_bool, read_changes, read_f64, read_index, write_bool, write_changes, write_f64, write_header,
    write_index, SURFACE_OXIDATION_TAG,
};
use crate::process::schedule::TemperatureSchedule;
use crate::process::{age_particle, NoOpReason, ParticleRateLaw, PerformStatus, Process, SelectionFailure};
use crate::random::RandomSource;

#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceOxidationParams {
    /// Gas-phase index of the oxidizer.
    pub oxidizer_species: usize,
    pub oxidizer_molar_mass_kg_per_mol: f64,
    pub sticking_coefficient: f64,
    pub oxidizer_per_event: f64,
    pub schedule: TemperatureSchedule,
    pub changes: Vec<ComponentChange>,
    pub deferred: bool,
    pub boltzmann_j_per_k: f64,
    pub avogadro_per_mol: f64,
}

impl SurfaceOxidationParams {
    /// Aluminium burning in O2: three O2 per event turn four Al into two Al2O3.
    pub fn aluminum(oxidizer_species: usize, aluminum: usize, alumina: usize, constants: &PhysicalConstants) -> Self {
        Self {
            oxidizer_species,
            oxidizer_molar_mass_kg_per_mol: 0.031998,
            sticking_coefficient: 0.1,
            oxidizer_per_event: 3.0,
            schedule: TemperatureSchedule::aluminum_oxidation(),
            changes: vec![
                ComponentChange { component: aluminum, delta: -4.0 },
                ComponentChange { component: alumina, delta: 2.0 },
            ],
            deferred: false,
            boltzmann_j_per_k: constants.boltzmann_j_per_k,
            avogadro_per_mol: constants.avogadro_per_mol,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceOxidation {
    params: SurfaceOxidationParams,
}

impl SurfaceOxidation {
    pub const NAME: &'static str = "surface_oxidation";

    pub fn new(params: SurfaceOxidationParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &SurfaceOxidationParams {
        &self.params
    }

    /// Events per second per m² of particle surface.
    pub fn surface_rate(&self, gas: &GasPhase) -> f64 {
        let p = &self.params;
        let temperature = gas.temperature();
        let multiplier = p.schedule.multiplier(temperature);
        if multiplier <= 0.0 || p.oxidizer_per_event <= 0.0 {
            return 0.0;
        }
        let constants = PhysicalConstants {
            boltzmann_j_per_k: p.boltzmann_j_per_k,
            avogadro_per_mol: p.avogadro_per_mol,
            ..PhysicalConstants::default()
        };
        let speed = constants.mean_molecular_speed(temperature, p.oxidizer_molar_mass_kg_per_mol);
        let flux = speed * gas.species_concentration(p.oxidizer_species) * p.avogadro_per_mol;
        (p.sticking_coefficient * flux / p.oxidizer_per_event * multiplier).max(0.0)
    }

    pub(crate) fn read_fields(input: &mut dyn Read) -> Result<Self> {
        let sticking_coefficient = read_f64(input)?;
        let oxidizer_molar_mass_kg_per_mol = read_f64(input)?;
        let oxidizer_per_event = read_f64(input)?;
        let boltzmann_j_per_k = read_f64(input)?;
        let avogadro_per_mol = read_f64(input)?;
        let schedule = TemperatureSchedule::read_fields(input)?;
        let oxidizer_species = read_index(input)?;
        let changes = read_changes(input)?;
        let deferred = read_bool(input)?;
        Ok(Self::new(SurfaceOxidationParams {
            oxidizer_species,
            oxidizer_molar_mass_kg_per_mol,
            sticking_coefficient,
            oxidizer_per_event,
            schedule,
            changes,
            deferred,
            boltzmann_j_per_k,
            avogadro_per_mol,
        }))
    }
}

impl ParticleRateLaw for SurfaceOxidation {
    fn particle_rate(&self, gas: &GasPhase, particle: &Particle, _model: &ParticleModel) -> f64 {
        self.surface_rate(gas) * particle.surface_area()
    }

    fn changes(&self) -> &[ComponentChange] {
        &self.params.changes
    }

    fn is_deferred(&self) -> bool {
        self.params.deferred
    }
}

impl Process for SurfaceOxidation {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn term_count(&self) -> usize {
        1
    }

    fn rate_terms(&self, _time: f64, cell: &Cell, terms: &mut Vec<f64>) -> f64 {
        let total_surface = cell.particles().sums().property(PropertyKey::SurfaceArea);
        let rate = self.surface_rate(cell.gas()) * total_surface;
        let rate = if rate.is_finite() { rate } else { 0.0 };
        terms.push(rate);
        rate
    }

    fn perform(
        &self,
        time: f64,
        cell: &mut Cell,
        _term: usize,
        mechanism: &Mechanism,
        rng: &mut RandomSource,
    ) -> PerformStatus {
        let Some(index) = cell.particles().select(Weighting::By(PropertyKey::SurfaceArea), rng) else {
            debug!("surface oxidation: no particle with surface area");
            return PerformStatus::Failed(SelectionFailure::NoFirstParticle);
        };
        if !age_particle(cell, index, time, mechanism, rng) {
            cell.particles_mut().remove(index);
            return PerformStatus::NoOp(NoOpReason::ParticleInvalidated);
        }

        let ensemble = cell.particles_mut();
        let still_valid = match ensemble.at_mut(index) {
            Some(particle) => {
                particle.adjust(&self.params.changes, 1.0, mechanism.model());
                particle.is_valid()
            }
            None => false,
        };
        if still_valid {
            ensemble.update(index);
        } else {
            ensemble.remove(index);
        }
        PerformStatus::Success
    }

    fn write_record(&self, out: &mut dyn Write) -> Result<()> {
        let p = &self.params;
        write_header(out, SURFACE_OXIDATION_TAG)?;
        write_f64(out, p.sticking_coefficient)?;
        write_f64(out, p.oxidizer_molar_mass_kg_per_mol)?;
        write_f64(out, p.oxidizer_per_event)?;
        write_f64(out, p.boltzmann_j_per_k)?;
        write_f64(out, p.avogadro_per_mol)?;
        p.schedule.write_fields(out)?;
        write_index(out, p.oxidizer_species)?;
        write_changes(out, &p.changes)?;
        write_bool(out, p.deferred)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::ONE_ATM_PA;
    use crate::gas::SpeciesTable;
    use crate::particle::{builtin_component, AggregationModel, ComponentKind};
    use crate::process::ParticleProcess;
    use approx::assert_relative_eq;
    use more_asserts::assert_gt;
    use std::io::Cursor;

    const VOLUME: f64 = 1.0e-12;

    fn mechanism(deferred: bool) -> (Mechanism, SurfaceOxidation) {
        let constants = PhysicalConstants::default();
        let model = ParticleModel::new(
            vec![
                builtin_component(ComponentKind::Aluminum).unwrap().clone(),
                builtin_component(ComponentKind::Alumina).unwrap().clone(),
            ],
            AggregationModel::Spherical,
        );
        let mut params = SurfaceOxidationParams::aluminum(1, 0, 1, &constants);
        params.deferred = deferred;
        let process = SurfaceOxidation::new(params);
        let mechanism = Mechanism::new(constants, SpeciesTable::new(["N2", "O2"]), model).with_process(process.clone());
        (mechanism, process)
    }

    fn cell(mechanism: &Mechanism, temperature: f64, diameters: &[f64]) -> Cell {
        let gas = GasPhase::with_air_viscosity(temperature, ONE_ATM_PA, vec![30.0, 8.0]);
        let mut cell = Cell::new(gas, 64, VOLUME).unwrap();
        let mut rng = RandomSource::seeded(3);
        for &d in diameters {
            cell.add_particle(mechanism.model().sphere_of_diameter(0, d, 0.0).unwrap(), &mut rng);
        }
        cell
    }

    #[test]
    fn test_total_rate_is_sum_of_particle_rates() {
        let (mechanism, process) = mechanism(false);
        let cell = cell(&mechanism, 2500.0, &[1.0e-7, 2.0e-7, 5.0e-8]);
        let expected: f64 = cell
            .particles()
            .iter()
            .map(|p| process.particle_rate(cell.gas(), p, mechanism.model()))
            .sum::<f64>();
        let mut terms = Vec::new();
        let total = process.rate_terms(0.0, &cell, &mut terms);
        assert_eq!(terms.len(), 1);
        assert_gt!(total, 0.0);
        assert_relative_eq!(total, expected, max_relative = 1e-10);
    }

    #[test]
    fn test_surface_rate_at_2500_k() {
        // O2 at 2500 K: mean speed 1286.16 m/s, 8 mol/m³, sticking 0.1, 3 O2 per event.
        let (mechanism, process) = mechanism(false);
        let cell = cell(&mechanism, 2500.0, &[]);
        assert_relative_eq!(process.surface_rate(cell.gas()), 2.0654532602245212e26, max_relative = 1e-9);
    }

    #[test]
    fn test_schedule_scales_rate() {
        let (mechanism, process) = mechanism(false);
        let hot = process.rate(0.0, &cell(&mechanism, 2500.0, &[1.0e-7]));
        let warm = process.rate(0.0, &cell(&mechanism, 2000.0, &[1.0e-7]));
        let boiling = process.rate(0.0, &cell(&mechanism, 2800.0, &[1.0e-7]));
        // Mean speed goes as sqrt(T); the schedule halves the rate below 2350 K.
        assert_relative_eq!(warm / hot, 0.5 * (2000.0f64 / 2500.0).sqrt(), max_relative = 1e-10);
        assert_eq!(boiling, 0.0);
    }

    #[test]
    fn test_perform_converts_aluminum() {
        let (mechanism, process) = mechanism(false);
        let mut cell = cell(&mechanism, 2500.0, &[1.0e-7]);
        let before = cell.particles().at(0).unwrap().composition().to_vec();
        let mut rng = RandomSource::seeded(8);
        assert_eq!(process.perform(0.1, &mut cell, 0, &mechanism, &mut rng), PerformStatus::Success);
        let after = cell.particles().at(0).unwrap();
        assert_eq!(after.composition(), &[before[0] - 4.0, 2.0]);
        assert_relative_eq!(
            cell.particles().sums().property(PropertyKey::Mass),
            cell.particles().recompute_sums().property(PropertyKey::Mass),
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_tiny_particle_is_consumed() {
        let (mechanism, process) = mechanism(false);
        let mut cell = cell(&mechanism, 2500.0, &[]);
        let particle = Particle::new(vec![3.0, 0.0], 0.0, mechanism.model());
        let mut rng = RandomSource::seeded(8);
        cell.add_particle(particle, &mut rng);
        assert_eq!(process.perform(0.0, &mut cell, 0, &mechanism, &mut rng), PerformStatus::Success);
        assert_eq!(cell.particle_count(), 0);
    }

    #[test]
    fn test_empty_cell_fails_selection() {
        let (mechanism, process) = mechanism(false);
        let mut cell = cell(&mechanism, 2500.0, &[]);
        let mut rng = RandomSource::seeded(8);
        assert_eq!(
            process.perform(0.0, &mut cell, 0, &mechanism, &mut rng),
            PerformStatus::Failed(SelectionFailure::NoFirstParticle)
        );
    }

    #[test]
    fn test_record_round_trip_keeps_indices() {
        let (_, process) = mechanism(true);
        let process = ParticleProcess::from(process);
        let mut buf = Vec::new();
        process.write_record(&mut buf).unwrap();
        let restored = ParticleProcess::read_record(&mut Cursor::new(buf)).unwrap();
        assert_eq!(restored, process);
        assert!(restored.is_deferred());
        match restored {
            ParticleProcess::SurfaceOxidation(p) => {
                assert_eq!(p.params().oxidizer_species, 1);
                assert_eq!(p.params().changes[1].component, 1);
            }
            other => panic!("restored wrong variant {:?}", other),
        }
    }
}
