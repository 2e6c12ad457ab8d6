//! Random source shared by every stochastic decision in a cell.
//!
//! Wraps a ChaCha8 stream so that a seed plus a stream number fully determines
//! a run. Parallel cells each get their own stream from the same seed.

use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Exp, Poisson};

#[derive(Debug, Clone)]
pub struct RandomSource {
    rng: ChaCha8Rng,
}

impl RandomSource {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Independent stream `stream` of the generator seeded with `seed`.
    pub fn for_stream(seed: u64, stream: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        rng.set_stream(stream);
        Self { rng }
    }

    /// Uniform deviate in [0, 1).
    #[inline]
    pub fn uniform(&mut self) -> f64 {
        self.rng.random::<f64>()
    }

    /// Uniform index in `0..n`; `None` when `n == 0`.
    #[inline]
    pub fn uniform_index(&mut self, n: usize) -> Option<usize> {
        if n == 0 {
            None
        } else {
            Some(self.rng.random_range(0..n))
        }
    }

    /// Exponential waiting time for a process running at `rate`.
    ///
    /// Returns `None` for a non-positive or non-finite rate.
    pub fn exponential(&mut self, rate: f64) -> Option<f64> {
        if rate <= 0.0 || !rate.is_finite() {
            return None;
        }
        Exp::new(rate).ok().map(|dist| dist.sample(&mut self.rng))
    }

    /// Poisson-distributed event count with the given mean. Means beyond the
    /// sampler's range return the mean itself.
    pub fn poisson(&mut self, mean: f64) -> u64 {
        if mean <= 0.0 || !mean.is_finite() {
            return 0;
        }
        match Poisson::new(mean) {
            Ok(dist) => {
                let draw: f64 = dist.sample(&mut self.rng);
                draw as u64
            }
            Err(_) => mean as u64,
        }
    }
}

impl RngCore for RandomSource {
    fn next_u32(&mut self) -> u32 {
        self.rng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.rng.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.rng.fill_bytes(dest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use more_asserts::{assert_ge, assert_lt};

    #[test]
    fn test_seeded_streams_are_deterministic() {
        let mut a = RandomSource::seeded(42);
        let mut b = RandomSource::seeded(42);
        for _ in 0..100 {
            assert_eq!(a.uniform(), b.uniform());
        }
    }

    #[test]
    fn test_streams_differ() {
        let mut a = RandomSource::for_stream(7, 0);
        let mut b = RandomSource::for_stream(7, 1);
        let same = (0..32).filter(|_| a.next_u64() == b.next_u64()).count();
        assert_eq!(same, 0);
    }

    #[test]
    fn test_uniform_range() {
        let mut rng = RandomSource::seeded(1);
        for _ in 0..1000 {
            let u = rng.uniform();
            assert_ge!(u, 0.0);
            assert_lt!(u, 1.0);
        }
        assert_eq!(rng.uniform_index(0), None);
        for _ in 0..100 {
            assert_lt!(rng.uniform_index(5).unwrap(), 5);
        }
    }

    #[test]
    fn test_exponential_mean() {
        let mut rng = RandomSource::seeded(3);
        let n = 20_000;
        let mean: f64 = (0..n).map(|_| rng.exponential(4.0).unwrap()).sum::<f64>() / n as f64;
        assert_abs_diff_eq!(mean, 0.25, epsilon = 0.01);
        assert_eq!(rng.exponential(0.0), None);
        assert_eq!(rng.exponential(f64::NAN), None);
    }

    #[test]
    fn test_poisson_mean() {
        let mut rng = RandomSource::seeded(5);
        let n = 20_000;
        let mean = (0..n).map(|_| rng.poisson(3.0) as f64).sum::<f64>() / n as f64;
        assert_abs_diff_eq!(mean, 3.0, epsilon = 0.1);
        assert_eq!(rng.poisson(0.0), 0);
    }
}
