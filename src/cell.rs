use crate::ensemble::Ensemble;
use crate::error::{Result, SweepError};
use crate::gas::GasPhase;
use crate::particle::Particle;
use crate::random::RandomSource;

/// A spatially homogeneous region: gas state, particle sample and the volume
/// that sample stands for.
#[derive(Debug, Clone)]
pub struct Cell {
    gas: GasPhase,
    ensemble: Ensemble,
    sample_volume_m3: f64,
}

impl Cell {
    pub fn new(gas: GasPhase, capacity: usize, sample_volume_m3: f64) -> Result<Self> {
        if sample_volume_m3 <= 0.0 || !sample_volume_m3.is_finite() {
            return Err(SweepError::InvalidConfig(format!(
                "sample volume must be positive, got {}",
                sample_volume_m3
            )));
        }
        Ok(Self {
            gas,
            ensemble: Ensemble::with_capacity(capacity),
            sample_volume_m3,
        })
    }

    pub fn gas(&self) -> &GasPhase {
        &self.gas
    }

    pub fn gas_mut(&mut self) -> &mut GasPhase {
        &mut self.gas
    }

    pub fn particles(&self) -> &Ensemble {
        &self.ensemble
    }

    pub fn particles_mut(&mut self) -> &mut Ensemble {
        &mut self.ensemble
    }

    /// Split borrow: read-only gas alongside the mutable ensemble.
    pub fn parts_mut(&mut self) -> (&GasPhase, &mut Ensemble) {
        (&self.gas, &mut self.ensemble)
    }

    pub fn particle_count(&self) -> usize {
        self.ensemble.len()
    }

    /// Effective sample volume, including the ensemble's contraction scaling.
    pub fn sample_volume(&self) -> f64 {
        self.sample_volume_m3 * self.ensemble.scaling_factor()
    }

    /// Particle number density in m⁻³.
    pub fn number_density(&self) -> f64 {
        self.ensemble.len() as f64 / self.sample_volume()
    }

    pub fn add_particle(&mut self, particle: Particle, rng: &mut RandomSource) -> usize {
        self.ensemble.add(particle, rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::ONE_ATM_PA;
    use crate::particle::{builtin_component, AggregationModel, ComponentKind, ParticleModel};
    use approx::assert_relative_eq;

    #[test]
    fn test_rejects_bad_sample_volume() {
        let gas = GasPhase::with_air_viscosity(1500.0, ONE_ATM_PA, vec![]);
        assert!(Cell::new(gas.clone(), 16, 0.0).is_err());
        assert!(Cell::new(gas.clone(), 16, f64::NAN).is_err());
        assert!(Cell::new(gas, 16, 1.0e-12).is_ok());
    }

    #[test]
    fn test_number_density_follows_contraction() {
        let model = ParticleModel::new(
            vec![builtin_component(ComponentKind::Carbon).unwrap().clone()],
            AggregationModel::Spherical,
        );
        let gas = GasPhase::with_air_viscosity(1500.0, ONE_ATM_PA, vec![]);
        let mut cell = Cell::new(gas, 4, 1.0e-12).unwrap();
        let mut rng = RandomSource::seeded(9);
        for _ in 0..4 {
            cell.add_particle(model.sphere_of_diameter(0, 1.0e-8, 0.0).unwrap(), &mut rng);
        }
        assert_relative_eq!(cell.number_density(), 4.0e12);

        // A fifth particle overwrites one; the sample now stands for less volume.
        cell.add_particle(model.sphere_of_diameter(0, 1.0e-8, 0.0).unwrap(), &mut rng);
        assert_eq!(cell.particle_count(), 4);
        assert_relative_eq!(cell.sample_volume(), 0.75e-12);
    }
}
