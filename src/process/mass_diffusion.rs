//! Fuel vapour leaving a particle core through the part of its surface not
//! shadowed by the oxide cap.
//!
//! The uncovered fraction is at most one, so the per-particle majorant drops it
//! and the total rate is O(1) in the particle count. `perform` draws a particle
//! uniformly and accepts with the uncovered fraction.

use std::io::{Read, Write};

use log::debug;

use crate::cell::Cell;
use crate::error::Result;
use crate::gas::GasPhase;
use crate::mechanism::Mechanism;
use crate::particle::{ComponentChange, Particle, ParticleModel, Weighting};
use crate::process::record::{
    read_bool, read_changes, read_f64, read_index, write_bool, write_changes, write_f64, write_header,
    write_index, MASS_DIFFUSION_TAG,
};
use crate::process::schedule::TemperatureSchedule;
use crate::process::{age_particle, NoOpReason, ParticleRateLaw, PerformStatus, Process, SelectionFailure};
use crate::random::RandomSource;

pub const DEFAULT_RATE_CONSTANT: f64 = 1.0e8;
pub const DEFAULT_MAX_COVER_FRACTION: f64 = 0.5;

#[derive(Debug, Clone, PartialEq)]
pub struct MassDiffusionParams {
    pub fuel_species: usize,
    pub cap_species: usize,
    pub core_component: usize,
    pub cap_component: usize,
    /// Events per second per particle per mol/m³ of fuel vapour.
    pub rate_constant: f64,
    pub max_cover_fraction: f64,
    pub schedule: TemperatureSchedule,
    pub changes: Vec<ComponentChange>,
    pub deferred: bool,
}

impl MassDiffusionParams {
    /// One aluminium unit leaves the core per event.
    pub fn aluminum(fuel_species: usize, cap_species: usize, aluminum: usize, alumina: usize) -> Self {
        Self {
            fuel_species,
            cap_species,
            core_component: aluminum,
            cap_component: alumina,
            rate_constant: DEFAULT_RATE_CONSTANT,
            max_cover_fraction: DEFAULT_MAX_COVER_FRACTION,
            schedule: TemperatureSchedule::aluminum_diffusion(),
            changes: vec![ComponentChange { component: aluminum, delta: -1.0 }],
            deferred: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MassDiffusion {
    params: MassDiffusionParams,
}

impl MassDiffusion {
    pub const NAME: &'static str = "mass_diffusion";

    pub fn new(params: MassDiffusionParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &MassDiffusionParams {
        &self.params
    }

    /// Fraction of the core surface under the oxide cap.
    ///
    /// The cap is a sphere of the oxide's volume centred on the core surface;
    /// it covers a spherical cap of height r²/2R on the core, that is a
    /// fraction (r/R)²/4 of the core surface.
    pub fn cover_fraction(&self, particle: &Particle, model: &ParticleModel) -> f64 {
        let p = &self.params;
        let core = model.component_volume(particle.composition(), p.core_component);
        let cap = model.component_volume(particle.composition(), p.cap_component);
        if core <= 0.0 {
            return p.max_cover_fraction;
        }
        if cap <= 0.0 {
            return 0.0;
        }
        let radius_ratio = (cap / core).cbrt();
        (0.25 * radius_ratio * radius_ratio).min(p.max_cover_fraction)
    }

    /// Per-particle majorant rate, s⁻¹.
    pub fn majorant_rate(&self, gas: &GasPhase) -> f64 {
        let p = &self.params;
        let rate = p.rate_constant * gas.species_concentration(p.fuel_species) * p.schedule.multiplier(gas.temperature());
        if rate.is_finite() { rate.max(0.0) } else { 0.0 }
    }

    pub(crate) fn read_fields(input: &mut dyn Read) -> Result<Self> {
        let rate_constant = read_f64(input)?;
        let max_cover_fraction = read_f64(input)?;
        let schedule = TemperatureSchedule::read_fields(input)?;
        let fuel_species = read_index(input)?;
        let cap_species = read_index(input)?;
        let core_component = read_index(input)?;
        let cap_component = read_index(input)?;
        let changes = read_changes(input)?;
        let deferred = read_bool(input)?;
        Ok(Self::new(MassDiffusionParams {
            fuel_species,
            cap_species,
            core_component,
            cap_component,
            rate_constant,
            max_cover_fraction,
            schedule,
            changes,
            deferred,
        }))
    }
}

impl ParticleRateLaw for MassDiffusion {
    fn particle_rate(&self, gas: &GasPhase, particle: &Particle, model: &ParticleModel) -> f64 {
        self.majorant_rate(gas) * (1.0 - self.cover_fraction(particle, model))
    }

    fn changes(&self) -> &[ComponentChange] {
        &self.params.changes
    }

    fn is_deferred(&self) -> bool {
        self.params.deferred
    }
}

impl Process for MassDiffusion {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn term_count(&self) -> usize {
        1
    }

    fn rate_terms(&self, _time: f64, cell: &Cell, terms: &mut Vec<f64>) -> f64 {
        let rate = self.majorant_rate(cell.gas()) * cell.particle_count() as f64;
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
        let Some(index) = cell.particles().select(Weighting::Uniform, rng) else {
            debug!("mass diffusion: empty ensemble");
            return PerformStatus::Failed(SelectionFailure::NoFirstParticle);
        };
        if !age_particle(cell, index, time, mechanism, rng) {
            cell.particles_mut().remove(index);
            return PerformStatus::NoOp(NoOpReason::ParticleInvalidated);
        }

        let model = mechanism.model();
        let ensemble = cell.particles_mut();
        let Some(particle) = ensemble.at_mut(index) else {
            return PerformStatus::Failed(SelectionFailure::NoFirstParticle);
        };
        let uncovered = 1.0 - self.cover_fraction(particle, model);
        if rng.uniform() >= uncovered {
            ensemble.update(index);
            return PerformStatus::NoOp(NoOpReason::Fictitious);
        }

        particle.adjust(&self.params.changes, 1.0, model);
        if particle.is_valid() {
            ensemble.update(index);
        } else {
            ensemble.remove(index);
        }
        PerformStatus::Success
    }

    fn write_record(&self, out: &mut dyn Write) -> Result<()> {
        let p = &self.params;
        write_header(out, MASS_DIFFUSION_TAG)?;
        write_f64(out, p.rate_constant)?;
        write_f64(out, p.max_cover_fraction)?;
        p.schedule.write_fields(out)?;
        write_index(out, p.fuel_species)?;
        write_index(out, p.cap_species)?;
        write_index(out, p.core_component)?;
        write_index(out, p.cap_component)?;
        write_changes(out, &p.changes)?;
        write_bool(out, p.deferred)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{PhysicalConstants, ONE_ATM_PA};
    use crate::gas::SpeciesTable;
    use crate::particle::{builtin_component, AggregationModel, ComponentKind};
    use crate::process::ParticleProcess;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use more_asserts::assert_lt;
    use std::io::Cursor;

    fn setup() -> (Mechanism, MassDiffusion) {
        let model = ParticleModel::new(
            vec![
                builtin_component(ComponentKind::Aluminum).unwrap().clone(),
                builtin_component(ComponentKind::Alumina).unwrap().clone(),
            ],
            AggregationModel::Spherical,
        );
        let process = MassDiffusion::new(MassDiffusionParams::aluminum(1, 2, 0, 1));
        let mechanism = Mechanism::new(
            PhysicalConstants::default(),
            SpeciesTable::new(["N2", "AL(L)", "AL2O3"]),
            model,
        )
        .with_process(process.clone());
        (mechanism, process)
    }

    fn capped_particle(model: &ParticleModel, core_units: f64, cap_units: f64) -> Particle {
        Particle::new(vec![core_units, cap_units], 0.0, model)
    }

    #[test]
    fn test_cover_fraction_geometry() {
        let (mechanism, process) = setup();
        let model = mechanism.model();
        assert_eq!(process.cover_fraction(&capped_particle(model, 1.0e6, 0.0), model), 0.0);

        // Equal core and cap volumes: (r/R)² / 4 = 0.25.
        let unit_ratio = model.components()[0].unit_volume_m3(crate::constants::AVOGADRO_PER_MOL)
            / model.components()[1].unit_volume_m3(crate::constants::AVOGADRO_PER_MOL);
        let p = capped_particle(model, 1.0e6, 1.0e6 * unit_ratio);
        assert_relative_eq!(process.cover_fraction(&p, model), 0.25, max_relative = 1e-9);

        // A cap much larger than the core is clamped.
        let p = capped_particle(model, 1.0e3, 1.0e7);
        assert_eq!(process.cover_fraction(&p, model), DEFAULT_MAX_COVER_FRACTION);
    }

    #[test]
    fn test_rate_needs_hot_gas() {
        let (mechanism, process) = setup();
        let mut cell = Cell::new(GasPhase::with_air_viscosity(2500.0, ONE_ATM_PA, vec![30.0, 2.0, 0.0]), 8, 1.0e-12)
            .unwrap();
        let mut rng = RandomSource::seeded(1);
        for _ in 0..3 {
            cell.add_particle(capped_particle(mechanism.model(), 1.0e6, 0.0), &mut rng);
        }
        assert_eq!(process.rate(0.0, &cell), 0.0);

        cell.gas_mut().set_temperature(3000.0);
        assert_relative_eq!(process.rate(0.0, &cell), 3.0 * DEFAULT_RATE_CONSTANT * 2.0);
    }

    #[test]
    fn test_acceptance_follows_uncovered_fraction() {
        let (mechanism, process) = setup();
        let gas = GasPhase::with_air_viscosity(3000.0, ONE_ATM_PA, vec![30.0, 2.0, 0.0]);
        let mut template = Cell::new(gas, 8, 1.0e-12).unwrap();
        let mut rng = RandomSource::seeded(4);
        let particle = capped_particle(mechanism.model(), 1.0e6, 2.0e5);
        let expected = 1.0 - process.cover_fraction(&particle, mechanism.model());
        assert_lt!(expected, 1.0);
        template.add_particle(particle, &mut rng);

        let trials = 10_000;
        let mut accepted = 0;
        for _ in 0..trials {
            let mut cell = template.clone();
            match process.perform(0.0, &mut cell, 0, &mechanism, &mut rng) {
                PerformStatus::Success => {
                    accepted += 1;
                    assert_eq!(cell.particles().at(0).unwrap().composition()[0], 1.0e6 - 1.0);
                }
                PerformStatus::NoOp(NoOpReason::Fictitious) => {
                    assert_eq!(cell.particles().at(0).unwrap().composition()[0], 1.0e6);
                }
                other => panic!("unexpected status {:?}", other),
            }
        }
        assert_abs_diff_eq!(accepted as f64 / trials as f64, expected, epsilon = 0.02);
    }

    #[test]
    fn test_record_round_trip() {
        let (_, process) = setup();
        let process = ParticleProcess::from(process);
        let mut buf = Vec::new();
        process.write_record(&mut buf).unwrap();
        let restored = ParticleProcess::read_record(&mut Cursor::new(buf.clone())).unwrap();
        assert_eq!(restored, process);
        let mut again = Vec::new();
        restored.write_record(&mut again).unwrap();
        assert_eq!(buf, again);
    }
}
