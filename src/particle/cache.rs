use std::ops::{Add, AddAssign, Sub};

/// Cached scalar properties a particle can be selected by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyKey {
    CollisionDiameter,
    DiameterSquared,
    InverseDiameter,
    InverseDiameterSquared,
    InverseSqrtMass,
    DiameterSquaredInverseSqrtMass,
    Mass,
    SurfaceArea,
}

impl PropertyKey {
    pub const COUNT: usize = 8;

    pub const ALL: [PropertyKey; PropertyKey::COUNT] = [
        PropertyKey::CollisionDiameter,
        PropertyKey::DiameterSquared,
        PropertyKey::InverseDiameter,
        PropertyKey::InverseDiameterSquared,
        PropertyKey::InverseSqrtMass,
        PropertyKey::DiameterSquaredInverseSqrtMass,
        PropertyKey::Mass,
        PropertyKey::SurfaceArea,
    ];

    #[inline]
    fn slot(self) -> usize {
        self as usize
    }
}

/// How a particle is drawn from an ensemble.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Weighting {
    Uniform,
    By(PropertyKey),
}

/// Fixed-size vector of weighting properties.
///
/// The same type holds a single particle's cache and the element-wise sums
/// stored in the ensemble's tree nodes.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PropertyCache {
    values: [f64; PropertyKey::COUNT],
}

impl PropertyCache {
    pub fn zero() -> Self {
        Self::default()
    }

    /// Cache for a particle with the given collision diameter, mass and surface.
    /// Non-positive diameter or mass yields the zero cache.
    pub fn from_physical(collision_diameter: f64, mass: f64, surface_area: f64) -> Self {
        if !(collision_diameter > 0.0 && mass > 0.0) {
            return Self::zero();
        }
        let d = collision_diameter;
        let d2 = d * d;
        let inv_sqrt_m = 1.0 / mass.sqrt();

        let mut cache = Self::zero();
        cache.set(PropertyKey::CollisionDiameter, d);
        cache.set(PropertyKey::DiameterSquared, d2);
        cache.set(PropertyKey::InverseDiameter, 1.0 / d);
        cache.set(PropertyKey::InverseDiameterSquared, 1.0 / d2);
        cache.set(PropertyKey::InverseSqrtMass, inv_sqrt_m);
        cache.set(PropertyKey::DiameterSquaredInverseSqrtMass, d2 * inv_sqrt_m);
        cache.set(PropertyKey::Mass, mass);
        cache.set(PropertyKey::SurfaceArea, surface_area.max(0.0));
        cache
    }

    #[inline]
    pub fn property(&self, key: PropertyKey) -> f64 {
        self.values[key.slot()]
    }

    #[inline]
    fn set(&mut self, key: PropertyKey, value: f64) {
        self.values[key.slot()] = value;
    }
}

impl Add for PropertyCache {
    type Output = PropertyCache;

    fn add(mut self, rhs: PropertyCache) -> PropertyCache {
        self += rhs;
        self
    }
}

impl AddAssign for PropertyCache {
    fn add_assign(&mut self, rhs: PropertyCache) {
        for (a, b) in self.values.iter_mut().zip(rhs.values.iter()) {
            *a += b;
        }
    }
}

impl Sub for PropertyCache {
    type Output = PropertyCache;

    fn sub(mut self, rhs: PropertyCache) -> PropertyCache {
        for (a, b) in self.values.iter_mut().zip(rhs.values.iter()) {
            *a -= b;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_cache_from_physical() {
        let cache = PropertyCache::from_physical(2.0e-8, 4.0e-21, 1.0e-15);
        assert_relative_eq!(cache.property(PropertyKey::CollisionDiameter), 2.0e-8);
        assert_relative_eq!(cache.property(PropertyKey::DiameterSquared), 4.0e-16);
        assert_relative_eq!(cache.property(PropertyKey::InverseDiameter), 5.0e7);
        assert_relative_eq!(cache.property(PropertyKey::InverseDiameterSquared), 2.5e15);
        assert_relative_eq!(cache.property(PropertyKey::InverseSqrtMass), 1.0 / 4.0e-21f64.sqrt());
        assert_relative_eq!(
            cache.property(PropertyKey::DiameterSquaredInverseSqrtMass),
            4.0e-16 / 4.0e-21f64.sqrt()
        );
        assert_relative_eq!(cache.property(PropertyKey::SurfaceArea), 1.0e-15);
    }

    #[test]
    fn test_degenerate_particle_has_zero_cache() {
        assert_eq!(PropertyCache::from_physical(0.0, 1.0, 1.0), PropertyCache::zero());
        assert_eq!(PropertyCache::from_physical(1.0e-8, -1.0, 1.0), PropertyCache::zero());
    }

    #[test]
    fn test_add_sub() {
        let a = PropertyCache::from_physical(1.0e-8, 1.0e-21, 3.0e-16);
        let b = PropertyCache::from_physical(3.0e-8, 9.0e-21, 2.8e-15);
        let sum = a + b;
        assert_relative_eq!(sum.property(PropertyKey::CollisionDiameter), 4.0e-8);
        let back = sum - b;
        for key in PropertyKey::ALL {
            assert_relative_eq!(back.property(key), a.property(key), max_relative = 1e-12);
        }
    }
}
