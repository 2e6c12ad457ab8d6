use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::constants::AVOGADRO_PER_MOL;
use crate::particle::component::Component;
use crate::particle::Particle;

/// How two particles' geometry combines when they coagulate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AggregationModel {
    /// Coalescing spheres; surface and diameters follow from volume alone.
    #[default]
    Spherical,
    /// Point-contact aggregates; surface areas add on coagulation and the
    /// collision diameter is the mean of the volume- and surface-equivalent
    /// sphere diameters.
    SurfaceVolume,
}

/// Collision efficiency multiplying the true kernel. Must stay in (0, 1] so the
/// majorant still bounds the scaled kernel.
#[derive(Debug, Clone, PartialEq)]
pub enum CollisionEfficiency {
    Unity,
    Constant(f64),
    /// Full efficiency when both particles hold at least `min_units` of
    /// `component`, `below` otherwise.
    ComponentThreshold {
        component: usize,
        min_units: f64,
        below: f64,
    },
}

impl CollisionEfficiency {
    pub fn efficiency(&self, p1: &Particle, p2: &Particle) -> f64 {
        match self {
            CollisionEfficiency::Unity => 1.0,
            CollisionEfficiency::Constant(value) => *value,
            CollisionEfficiency::ComponentThreshold {
                component,
                min_units,
                below,
            } => {
                if p1.component_units(*component) >= *min_units
                    && p2.component_units(*component) >= *min_units
                {
                    1.0
                } else {
                    *below
                }
            }
        }
    }
}

/// A change in one composition entry, applied per process event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComponentChange {
    pub component: usize,
    pub delta: f64,
}

/// Everything needed to turn a composition into physical attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleModel {
    components: Vec<Component>,
    aggregation: AggregationModel,
    collision_efficiency: CollisionEfficiency,
    avogadro: f64,
}

impl ParticleModel {
    pub fn new(components: Vec<Component>, aggregation: AggregationModel) -> Self {
        Self {
            components,
            aggregation,
            collision_efficiency: CollisionEfficiency::Unity,
            avogadro: AVOGADRO_PER_MOL,
        }
    }

    pub fn with_collision_efficiency(mut self, efficiency: CollisionEfficiency) -> Self {
        self.collision_efficiency = efficiency;
        self
    }

    pub fn with_avogadro(mut self, avogadro: f64) -> Self {
        self.avogadro = avogadro;
        self
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    pub fn component_index(&self, name: &str) -> Option<usize> {
        self.components.iter().position(|c| c.name == name)
    }

    pub fn aggregation(&self) -> AggregationModel {
        self.aggregation
    }

    pub fn collision_efficiency(&self) -> &CollisionEfficiency {
        &self.collision_efficiency
    }

    /// Mass (kg) and volume (m³) of a composition.
    pub fn mass_and_volume(&self, composition: &[f64]) -> (f64, f64) {
        composition
            .iter()
            .zip(self.components.iter())
            .fold((0.0, 0.0), |(m, v), (&units, component)| {
                (
                    m + units * component.unit_mass_kg(self.avogadro),
                    v + units * component.unit_volume_m3(self.avogadro),
                )
            })
    }

    /// Volume (m³) held by one component of a composition.
    pub fn component_volume(&self, composition: &[f64], component: usize) -> f64 {
        match (composition.get(component), self.components.get(component)) {
            (Some(&units), Some(c)) => units * c.unit_volume_m3(self.avogadro),
            _ => 0.0,
        }
    }

    /// Particle of a single component with the given sphere diameter.
    pub fn sphere_of_diameter(&self, component: usize, diameter_m: f64, time: f64) -> Option<Particle> {
        let profile = self.components.get(component)?;
        let volume = PI * diameter_m.powi(3) / 6.0;
        let mut composition = vec![0.0; self.components.len()];
        composition[component] = volume / profile.unit_volume_m3(self.avogadro);
        Some(Particle::new(composition, time, self))
    }

}

/// Diameter of the sphere with the given volume.
pub fn sphere_diameter(volume_m3: f64) -> f64 {
    if volume_m3 > 0.0 {
        (6.0 * volume_m3 / PI).cbrt()
    } else {
        0.0
    }
}
