//! Stochastic particles and the cache of weighting properties they carry.
//!
//! A particle is a composition vector plus derived geometry. The physical
//! fields are private; every mutation goes through a method that recomputes
//! the derived attributes and the [`PropertyCache`], so the cache can never
//! lag behind the composition.

pub mod cache;
pub mod component;
pub mod model;

pub use cache::{PropertyCache, PropertyKey, Weighting};
pub use component::{builtin_component, Component, ComponentKind, COMPONENT_PROFILES};
pub use model::{AggregationModel, CollisionEfficiency, ComponentChange, ParticleModel};

use std::f64::consts::PI;

use model::sphere_diameter;

#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    composition: Vec<f64>,
    mass_kg: f64,
    volume_m3: f64,
    surface_area_m2: f64,
    sphere_diameter_m: f64,
    collision_diameter_m: f64,
    create_time: f64,
    last_update_time: f64,
    coagulation_count: u32,
    cache: PropertyCache,
}

impl Particle {
    pub fn new(composition: Vec<f64>, time: f64, model: &ParticleModel) -> Self {
        let mut particle = Particle {
            composition,
            mass_kg: 0.0,
            volume_m3: 0.0,
            surface_area_m2: 0.0,
            sphere_diameter_m: 0.0,
            collision_diameter_m: 0.0,
            create_time: time,
            last_update_time: time,
            coagulation_count: 0,
            cache: PropertyCache::zero(),
        };
        particle.recompute(model, None);
        particle
    }

    pub fn composition(&self) -> &[f64] {
        &self.composition
    }

    pub fn component_units(&self, component: usize) -> f64 {
        self.composition.get(component).copied().unwrap_or(0.0)
    }

    pub fn mass(&self) -> f64 {
        self.mass_kg
    }

    pub fn volume(&self) -> f64 {
        self.volume_m3
    }

    pub fn surface_area(&self) -> f64 {
        self.surface_area_m2
    }

    pub fn sphere_diameter(&self) -> f64 {
        self.sphere_diameter_m
    }

    pub fn collision_diameter(&self) -> f64 {
        self.collision_diameter_m
    }

    pub fn create_time(&self) -> f64 {
        self.create_time
    }

    pub fn last_update_time(&self) -> f64 {
        self.last_update_time
    }

    pub fn set_last_update_time(&mut self, time: f64) {
        self.last_update_time = time;
    }

    pub fn coagulation_count(&self) -> u32 {
        self.coagulation_count
    }

    pub fn cache(&self) -> &PropertyCache {
        &self.cache
    }

    pub fn property(&self, key: PropertyKey) -> f64 {
        self.cache.property(key)
    }

    /// A particle is valid while it has positive mass and no negative
    /// composition entry.
    pub fn is_valid(&self) -> bool {
        self.mass_kg > 0.0 && self.composition.iter().all(|&units| units >= 0.0)
    }

    /// Apply `times` repetitions of a set of composition changes.
    pub fn adjust(&mut self, changes: &[ComponentChange], times: f64, model: &ParticleModel) {
        let old_volume = self.volume_m3;
        let old_surface = self.surface_area_m2;
        for change in changes {
            if change.component >= self.composition.len() {
                self.composition.resize(change.component + 1, 0.0);
            }
            self.composition[change.component] += change.delta * times;
        }

        // Aggregates keep their shape: surface scales with volume^(2/3).
        let surface = if old_volume > 0.0 {
            let (_, new_volume) = model.mass_and_volume(&self.composition);
            Some(old_surface * (new_volume.max(0.0) / old_volume).powf(2.0 / 3.0))
        } else {
            None
        };
        self.recompute(model, surface);
    }

    /// Absorb `other` into this particle.
    pub fn coagulate(&mut self, other: &Particle, model: &ParticleModel) {
        if self.composition.len() < other.composition.len() {
            self.composition.resize(other.composition.len(), 0.0);
        }
        for (units, extra) in self.composition.iter_mut().zip(other.composition.iter()) {
            *units += extra;
        }
        self.coagulation_count += other.coagulation_count + 1;
        self.create_time = self.create_time.min(other.create_time);
        self.recompute(model, Some(self.surface_area_m2 + other.surface_area_m2));
    }

    fn recompute(&mut self, model: &ParticleModel, surface_hint: Option<f64>) {
        let (mass, volume) = model.mass_and_volume(&self.composition);
        self.mass_kg = mass;
        self.volume_m3 = volume;
        self.sphere_diameter_m = sphere_diameter(volume);
        let sphere_surface = PI * self.sphere_diameter_m * self.sphere_diameter_m;

        match model.aggregation() {
            AggregationModel::Spherical => {
                self.surface_area_m2 = sphere_surface;
                self.collision_diameter_m = self.sphere_diameter_m;
            }
            AggregationModel::SurfaceVolume => {
                // A sphere is the least surface a volume can have.
                self.surface_area_m2 = surface_hint.unwrap_or(sphere_surface).max(sphere_surface);
                let surface_diameter = (self.surface_area_m2 / PI).sqrt();
                self.collision_diameter_m = 0.5 * (self.sphere_diameter_m + surface_diameter);
            }
        }

        self.cache = if self.is_valid() {
            PropertyCache::from_physical(self.collision_diameter_m, self.mass_kg, self.surface_area_m2)
        } else {
            PropertyCache::zero()
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use more_asserts::assert_gt;

    fn model(aggregation: AggregationModel) -> ParticleModel {
        ParticleModel::new(
            vec![
                builtin_component(ComponentKind::Aluminum).unwrap().clone(),
                builtin_component(ComponentKind::Alumina).unwrap().clone(),
            ],
            aggregation,
        )
    }

    #[test]
    fn test_spherical_coagulation_conserves_volume() {
        let model = model(AggregationModel::Spherical);
        let mut a = model.sphere_of_diameter(0, 1.0e-8, 0.0).unwrap();
        let b = model.sphere_of_diameter(0, 2.0e-8, 0.0).unwrap();
        let expected_volume = a.volume() + b.volume();
        let expected_mass = a.mass() + b.mass();

        a.coagulate(&b, &model);

        assert_relative_eq!(a.volume(), expected_volume, max_relative = 1e-12);
        assert_relative_eq!(a.mass(), expected_mass, max_relative = 1e-12);
        assert_relative_eq!(a.collision_diameter(), (1.0e-24f64 + 8.0e-24).cbrt(), max_relative = 1e-9);
        assert_eq!(a.coagulation_count(), 1);
        assert_relative_eq!(a.property(PropertyKey::CollisionDiameter), a.collision_diameter());
    }

    #[test]
    fn test_surface_volume_coagulation_adds_surface() {
        let model = model(AggregationModel::SurfaceVolume);
        let mut a = model.sphere_of_diameter(0, 1.0e-8, 0.0).unwrap();
        let b = model.sphere_of_diameter(0, 1.0e-8, 0.0).unwrap();
        let surface = a.surface_area() + b.surface_area();

        a.coagulate(&b, &model);

        assert_relative_eq!(a.surface_area(), surface, max_relative = 1e-12);
        assert_gt!(a.collision_diameter(), a.sphere_diameter());
    }

    #[test]
    fn test_adjust_refreshes_cache() {
        let model = model(AggregationModel::Spherical);
        let mut p = Particle::new(vec![1.0e5, 0.0], 0.0, &model);
        let before = *p.cache();
        p.adjust(
            &[
                ComponentChange { component: 0, delta: -4.0 },
                ComponentChange { component: 1, delta: 2.0 },
            ],
            10.0,
            &model,
        );
        assert_eq!(p.composition(), &[1.0e5 - 40.0, 20.0]);
        assert_ne!(*p.cache(), before);
        assert_eq!(*p.cache(), PropertyCache::from_physical(p.collision_diameter(), p.mass(), p.surface_area()));
    }

    #[test]
    fn test_consumed_particle_is_invalid() {
        let model = model(AggregationModel::Spherical);
        let mut p = Particle::new(vec![3.0, 0.0], 0.0, &model);
        assert!(p.is_valid());
        p.adjust(&[ComponentChange { component: 0, delta: -4.0 }], 1.0, &model);
        assert!(!p.is_valid());
        assert_eq!(*p.cache(), PropertyCache::zero());
    }
}
