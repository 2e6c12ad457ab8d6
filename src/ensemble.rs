//! Weighted particle ensemble.
//!
//! Particles live in a dense `Vec`; their caches are mirrored into the leaves
//! of an implicit binary sum tree stored in a second `Vec`. Node `k` has
//! children `2k` and `2k + 1`, the root is node 1 and leaf `i` is node
//! `leaf_base + i`. Each internal node holds the element-wise sum of its
//! children, so the root is the aggregate over the whole population for every
//! weighting property, and drawing by any property is a single root-to-leaf
//! descent.
//!
//! Parents are recomputed from their children rather than patched with a
//! difference, so the sums never drift away from the leaves.

use log::warn;

use crate::particle::{Particle, PropertyCache, Weighting};
use crate::random::RandomSource;

#[derive(Debug, Clone)]
pub struct Ensemble {
    particles: Vec<Particle>,
    tree: Vec<PropertyCache>,
    leaf_base: usize,
    capacity: usize,
    contractions: u32,
}

impl Ensemble {
    /// Ensemble holding at most `capacity` particles (at least 2).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(2);
        let leaf_base = capacity.next_power_of_two();
        Self {
            particles: Vec::with_capacity(capacity),
            tree: vec![PropertyCache::zero(); 2 * leaf_base],
            leaf_base,
            capacity,
            contractions: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.particles.len() >= self.capacity
    }

    /// Number of inserts that had to overwrite a particle because the
    /// ensemble was full.
    pub fn contractions(&self) -> u32 {
        self.contractions
    }

    /// Factor applied to the cell's sample volume to account for contractions.
    pub fn scaling_factor(&self) -> f64 {
        let keep = (self.capacity as f64 - 1.0) / self.capacity as f64;
        keep.powf(self.contractions as f64)
    }

    /// Aggregate of every cached property over the live particles.
    pub fn sums(&self) -> &PropertyCache {
        &self.tree[1]
    }

    pub fn at(&self, index: usize) -> Option<&Particle> {
        self.particles.get(index)
    }

    /// Mutable access to one particle. The tree is not told about the change
    /// until [`Ensemble::update`] is called for the same index.
    pub fn at_mut(&mut self, index: usize) -> Option<&mut Particle> {
        self.particles.get_mut(index)
    }

    /// Mutable access to two distinct particles at once.
    pub fn pair_mut(&mut self, i: usize, j: usize) -> Option<(&mut Particle, &mut Particle)> {
        let len = self.particles.len();
        if i == j || i >= len || j >= len {
            return None;
        }
        if i < j {
            let (head, tail) = self.particles.split_at_mut(j);
            Some((&mut head[i], &mut tail[0]))
        } else {
            let (head, tail) = self.particles.split_at_mut(i);
            Some((&mut tail[0], &mut head[j]))
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Particle> {
        self.particles.iter()
    }

    /// Insert a particle and return its index. A full ensemble overwrites a
    /// uniformly chosen particle instead.
    pub fn add(&mut self, particle: Particle, rng: &mut RandomSource) -> usize {
        if !self.is_full() {
            self.particles.push(particle);
            let index = self.particles.len() - 1;
            self.update(index);
            return index;
        }

        let index = rng.uniform_index(self.particles.len()).unwrap_or(0);
        self.replace(index, particle);
        self.contractions += 1;
        if self.contractions == 1 {
            warn!("ensemble full at {} particles, contracting", self.capacity);
        }
        index
    }

    /// Swap in a new particle at `index`, returning the old one.
    pub fn replace(&mut self, index: usize, particle: Particle) -> Option<Particle> {
        let slot = self.particles.get_mut(index)?;
        let old = std::mem::replace(slot, particle);
        self.update(index);
        Some(old)
    }

    /// Push the current cache of particle `index` into the tree.
    pub fn update(&mut self, index: usize) {
        if let Some(particle) = self.particles.get(index) {
            let cache = *particle.cache();
            self.set_leaf(index, cache);
        }
    }

    /// Remove particle `index`. The last particle moves into the vacated slot,
    /// so any other index held by the caller may now be stale.
    pub fn remove(&mut self, index: usize) -> Option<Particle> {
        if index >= self.particles.len() {
            return None;
        }
        let last = self.particles.len() - 1;
        let removed = self.particles.swap_remove(index);
        self.set_leaf(last, PropertyCache::zero());
        if index != last {
            self.update(index);
        }
        Some(removed)
    }

    pub fn clear(&mut self) {
        self.particles.clear();
        self.tree.fill(PropertyCache::zero());
        self.contractions = 0;
    }

    /// Draw a particle index, uniformly or proportional to a cached property.
    ///
    /// Returns `None` for an empty ensemble, or when the requested property
    /// sums to zero (or to something non-finite).
    pub fn select(&self, weighting: Weighting, rng: &mut RandomSource) -> Option<usize> {
        if self.particles.is_empty() {
            return None;
        }
        let key = match weighting {
            Weighting::Uniform => return rng.uniform_index(self.particles.len()),
            Weighting::By(key) => key,
        };

        let total = self.tree[1].property(key);
        if total <= 0.0 || !total.is_finite() {
            return None;
        }

        let mut target = rng.uniform() * total;
        let mut node = 1;
        while node < self.leaf_base {
            let left = 2 * node;
            let left_weight = self.tree[left].property(key);
            let right_weight = self.tree[left + 1].property(key);
            // Rounding can leave target just past the left sum of a subtree
            // whose right half is empty.
            if target < left_weight || right_weight <= 0.0 {
                node = left;
            } else {
                target -= left_weight;
                node = left + 1;
            }
        }

        let index = node - self.leaf_base;
        if index < self.particles.len() {
            Some(index)
        } else {
            None
        }
    }

    /// Sums recomputed from scratch over the particles themselves.
    pub fn recompute_sums(&self) -> PropertyCache {
        self.particles
            .iter()
            .fold(PropertyCache::zero(), |acc, p| acc + *p.cache())
    }

    fn set_leaf(&mut self, index: usize, cache: PropertyCache) {
        let mut node = self.leaf_base + index;
        self.tree[node] = cache;
        node /= 2;
        while node >= 1 {
            self.tree[node] = self.tree[2 * node] + self.tree[2 * node + 1];
            node /= 2;
        }
    }
}
