//! Discrete Gaussian sampling
//!
//! Provides a sampler for the discrete Gaussian over Z, used for secret keys,
//! ephemeral encryption randomness and error terms.

use rand::Rng;

/// Default Gaussian standard deviation
pub const DEFAULT_SIGMA: f64 = 3.2;

/// Discrete Gaussian sampler over Z using rejection sampling.
///
/// The sampler is stateless apart from σ; randomness comes from the caller's
/// RNG so that the same sampler can serve seeded (test) and entropy-backed
/// (production) generators.
#[derive(Debug, Clone, Copy)]
pub struct GaussianSampler {
    sigma: f64,
    /// Reject samples beyond this many integers from zero
    tailcut: i64,
}

impl GaussianSampler {
    pub fn new(sigma: f64) -> Self {
        Self {
            sigma,
            tailcut: (sigma * 6.0).ceil() as i64,
        }
    }

    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    /// Sample a single value from D_σ
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> i64 {
        if self.tailcut == 0 {
            return 0;
        }
        let two_sigma_sq = 2.0 * self.sigma * self.sigma;
        loop {
            let x = rng.gen_range(-self.tailcut..=self.tailcut);
            let prob = (-((x * x) as f64) / two_sigma_sq).exp();
            if rng.gen::<f64>() < prob {
                return x;
            }
        }
    }

    /// Sample `len` values and lift them into Z_q
    pub fn sample_vec_centered<R: Rng + ?Sized>(&self, len: usize, q: u64, rng: &mut R) -> Vec<u64> {
        (0..len)
            .map(|_| super::ModQ::from_signed(self.sample(rng), q))
            .collect()
    }
}
