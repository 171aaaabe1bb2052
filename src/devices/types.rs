//! Common types and traits for device simulation components.

use rand::{Rng, SeedableRng, rngs::StdRng};

/// Source of uniformly distributed samples used to perturb device outputs.
///
/// The environment generator draws every random perturbation through this
/// trait so runs can be made reproducible (seeded) or fully deterministic
/// (constant) without touching the physics.
pub trait NoiseSource {
    /// Returns a sample in `[0.0, 1.0)`.
    fn sample(&mut self) -> f32;

    /// Returns a sample scaled into `[lo, hi)`.
    fn uniform(&mut self, lo: f32, hi: f32) -> f32 {
        lo + (hi - lo) * self.sample()
    }
}

/// Seeded pseudo-random noise backed by [`StdRng`].
///
/// # Examples
///
/// ```
/// use energy_twin::devices::types::{NoiseSource, SeededNoise};
///
/// let mut a = SeededNoise::new(42);
/// let mut b = SeededNoise::new(42);
/// assert_eq!(a.sample(), b.sample());
/// ```
#[derive(Debug, Clone)]
pub struct SeededNoise {
    rng: StdRng,
}

impl SeededNoise {
    /// Creates a noise source from a seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl NoiseSource for SeededNoise {
    fn sample(&mut self) -> f32 {
        self.rng.random::<f32>()
    }
}

/// Noise source that always returns the same sample.
///
/// `ConstantNoise(0.5)` centres every symmetric perturbation on zero.
#[derive(Debug, Clone, Copy)]
pub struct ConstantNoise(pub f32);

impl NoiseSource for ConstantNoise {
    fn sample(&mut self) -> f32 {
        self.0.clamp(0.0, 1.0 - f32::EPSILON)
    }
}

/// Returns `true` when `hour` lies strictly inside `(start, end)`.
pub fn within_open_window(hour: f32, start: f32, end: f32) -> bool {
    hour > start && hour < end
}

/// Returns `true` when `hour` lies inside the half-open window `[start, end)`.
pub fn within_window(hour: f32, start: f32, end: f32) -> bool {
    hour >= start && hour < end
}
