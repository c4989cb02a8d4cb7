/// Seeded coherent noise for terrain undulation away from the road
use constants::terrain::DEFAULT_NOISE_SEED;
use noise::{NoiseFn, Perlin};

pub struct UndulationNoise {
    perlin: Perlin,
    frequency: f64,
}

impl UndulationNoise {
    /// Seed 0 falls back to the default seed so "unset" still yields a fixed landscape.
    pub fn new(seed: u32, frequency: f64) -> Self {
        let seed = if seed == 0 { DEFAULT_NOISE_SEED } else { seed };
        Self {
            perlin: Perlin::new(seed),
            frequency,
        }
    }

    /// Noise in roughly [-1, 1] at world XY; zero when the frequency is not positive.
    pub fn sample(&self, x: f64, y: f64) -> f64 {
        if self.frequency <= 0.0 {
            return 0.0;
        }
        self.perlin.get([x * self.frequency, y * self.frequency])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_field() {
        let a = UndulationNoise::new(7, 0.01);
        let b = UndulationNoise::new(7, 0.01);
        for i in 0..50 {
            let (x, y) = (i as f64 * 13.7, i as f64 * -5.3);
            assert_eq!(a.sample(x, y), b.sample(x, y));
        }
    }

    #[test]
    fn zero_seed_uses_default() {
        let a = UndulationNoise::new(0, 0.01);
        let b = UndulationNoise::new(DEFAULT_NOISE_SEED, 0.01);
        assert_eq!(a.sample(123.4, 567.8), b.sample(123.4, 567.8));
    }

    #[test]
    fn non_positive_frequency_is_flat() {
        let n = UndulationNoise::new(3, 0.0);
        assert_eq!(n.sample(10.5, 20.25), 0.0);
    }

    #[test]
    fn stays_in_unit_range() {
        let n = UndulationNoise::new(99, 0.0031);
        for i in 0..500 {
            let v = n.sample(i as f64 * 7.1, i as f64 * 3.3 + 11.0);
            assert!(v.abs() <= 1.5);
        }
    }
}
