//! Seeded Perlin noise.

use noise::{NoiseFn, Perlin};
use rand::Rng;

/// Seeded 2D Perlin noise with octave summation.
///
/// The same non-zero seed always produces the same values for the same inputs.
pub struct NoiseGenerator {
    perlin: Perlin,
    seed: u32,
}

impl NoiseGenerator {
    /// Generator seeded with `seed` (0 picks a random seed)
    pub fn new(seed: u32) -> Self {
        let mut generator = NoiseGenerator {
            perlin: Perlin::new(1),
            seed: 1,
        };
        generator.seed(seed);
        generator
    }

    /// Re-seed the permutation table. A seed of 0 is reserved as "unspecified"
    /// and replaced with a random non-zero seed. Returns the seed in use.
    pub fn seed(&mut self, value: u32) -> u32 {
        let seed = if value == 0 {
            random_seed(&mut rand::thread_rng())
        } else {
            value
        };
        self.perlin = Perlin::new(seed);
        self.seed = seed;
        seed
    }

    /// Seed currently in use
    pub fn current_seed(&self) -> u32 {
        self.seed
    }

    /// Single-octave gradient noise in `[-1, 1]`
    #[inline]
    pub fn sample_2d(&self, x: f64, y: f64) -> f64 {
        self.perlin.get([x, y]).clamp(-1.0, 1.0)
    }

    /// Fractal sum of `octaves` samples, normalised by the total amplitude.
    ///
    /// `octaves <= 0` is treated as a single octave; this runs once per map
    /// cell, so bad input degrades instead of failing.
    pub fn sample_2d_octaves(&self, x: f64, y: f64, octaves: i32, persistence: f64) -> f64 {
        let octaves = octaves.max(1);
        let mut total = 0.0;
        let mut amplitude = 1.0;
        let mut frequency = 1.0;
        let mut max_value = 0.0;

        for _ in 0..octaves {
            total += amplitude * self.sample_2d(x * frequency, y * frequency);
            max_value += f64::abs(amplitude);
            amplitude *= persistence;
            frequency *= 2.0;
        }

        if max_value == 0.0 {
            return 0.0;
        }
        total / max_value
    }
}

impl Default for NoiseGenerator {
    fn default() -> Self {
        NoiseGenerator::new(0)
    }
}

/// Random non-zero seed
pub fn random_seed<R: Rng + ?Sized>(rng: &mut R) -> u32 {
    rng.gen_range(1..=u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_values() {
        let a = NoiseGenerator::new(42);
        let b = NoiseGenerator::new(42);
        for i in 0..64 {
            let x = i as f64 * 0.137;
            let y = i as f64 * 0.291;
            assert_eq!(
                a.sample_2d_octaves(x, y, 8, 0.5).to_bits(),
                b.sample_2d_octaves(x, y, 8, 0.5).to_bits()
            );
        }
    }

    #[test]
    fn zero_seed_is_replaced() {
        let mut n = NoiseGenerator::new(7);
        let used = n.seed(0);
        assert_ne!(used, 0);
        assert_eq!(n.current_seed(), used);
    }

    #[test]
    fn octave_sum_stays_in_range() {
        let n = NoiseGenerator::new(3);
        for i in 0..200 {
            let v = n.sample_2d_octaves(i as f64 * 0.05, i as f64 * 0.031, 8, 0.5);
            assert!((-1.0..=1.0).contains(&v), "{v}");
        }
    }

    #[test]
    fn non_positive_octaves_act_as_one() {
        let n = NoiseGenerator::new(11);
        let one = n.sample_2d_octaves(0.3, 0.7, 1, 0.5);
        assert_eq!(n.sample_2d_octaves(0.3, 0.7, 0, 0.5), one);
        assert_eq!(n.sample_2d_octaves(0.3, 0.7, -4, 0.5), one);
        assert_eq!(one, n.sample_2d(0.3, 0.7));
    }
}
