//! RLWE key generation, encryption and decryption
//!
//! Secret-key encryption: (a, b = -a·s + e + Δ·m) with uniform `a`.
//! Public-key encryption: (pk.a·u + e1, pk.b·u + e2 + Δ·m) with small `u`.
//! Both decrypt as ⌊(b + a·s) / Δ⌉ mod p.

use rand::Rng;

use crate::math::{GaussianSampler, NttContext, Poly};
use crate::params::SchemeParameters;

use super::types::{RlweCiphertext, RlwePublicKey, RlweSecretKey};

impl RlweSecretKey {
    /// Generate a secret key from the Gaussian distribution
    pub fn generate<R: Rng + ?Sized>(
        params: &SchemeParameters,
        sampler: &GaussianSampler,
        rng: &mut R,
    ) -> Self {
        let poly = Poly::sample_gaussian(
            params.ring_dim,
            params.ciphertext_modulus(),
            sampler,
            rng,
        );
        Self { poly }
    }
}

impl RlwePublicKey {
    /// Derive the public key b = -a·s + e for a fresh uniform `a`
    pub fn generate<R: Rng + ?Sized>(
        sk: &RlweSecretKey,
        sampler: &GaussianSampler,
        rng: &mut R,
        ctx: &NttContext,
    ) -> Self {
        let d = sk.ring_dim();
        let q = sk.modulus();
        let a = Poly::random_with_rng(d, q, rng);
        let e = Poly::sample_gaussian(d, q, sampler, rng);
        let b = &(-&a.mul_ntt(&sk.poly, ctx)) + &e;
        Self { a, b }
    }
}

impl RlweCiphertext {
    /// Encrypt under the secret key
    ///
    /// Computes: (a, b) where b = -a·s + e + Δ·m
    ///
    /// # Arguments
    /// * `sk` - Secret key
    /// * `message_poly` - Message polynomial (coefficients in [0, p))
    /// * `delta` - Scaling factor Δ = ⌊q/p⌋
    /// * `a_random` - Uniform polynomial a ∈ R_q
    /// * `error` - Error polynomial e
    /// * `ctx` - NTT context for polynomial multiplication
    pub fn encrypt_sk(
        sk: &RlweSecretKey,
        message_poly: &Poly,
        delta: u64,
        a_random: Poly,
        error: &Poly,
        ctx: &NttContext,
    ) -> Self {
        let scaled_msg = message_poly.scalar_mul(delta);
        let neg_a_s = -&a_random.mul_ntt(&sk.poly, ctx);
        let b = &(&neg_a_s + error) + &scaled_msg;
        Self { a: a_random, b }
    }

    /// Encrypt under the public key
    ///
    /// Computes: (pk.a·u + e1, pk.b·u + e2 + Δ·m). Decrypting with `s` leaves
    /// the noise e·u + e2 + e1·s on top of Δ·m.
    pub fn encrypt_pk(
        pk: &RlwePublicKey,
        message_poly: &Poly,
        delta: u64,
        u: &Poly,
        e1: &Poly,
        e2: &Poly,
        ctx: &NttContext,
    ) -> Self {
        let scaled_msg = message_poly.scalar_mul(delta);
        let a = &pk.a.mul_ntt(u, ctx) + e1;
        let b = &(&pk.b.mul_ntt(u, ctx) + e2) + &scaled_msg;
        Self { a, b }
    }

    /// Decrypt to message coefficients
    ///
    /// Computes: m_i = ⌊(a·s + b)_i / Δ⌉ mod p
    pub fn decrypt(&self, sk: &RlweSecretKey, delta: u64, p: u64, ctx: &NttContext) -> Vec<u64> {
        let noisy_msg = &self.a.mul_ntt(&sk.poly, ctx) + &self.b;
        let half_delta = (delta / 2) as u128;
        noisy_msg
            .coeffs()
            .iter()
            .map(|&val| (((val as u128 + half_delta) / delta as u128) % p as u128) as u64)
            .collect()
    }

    /// Homomorphic addition
    ///
    /// (a1, b1) + (a2, b2) = (a1 + a2, b1 + b2), decrypts to m1 + m2 mod p
    pub fn add(&self, other: &RlweCiphertext) -> RlweCiphertext {
        RlweCiphertext {
            a: &self.a + &other.a,
            b: &self.b + &other.b,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn test_params() -> SchemeParameters {
        SchemeParameters {
            ring_dim: 256,
            ..SchemeParameters::default()
        }
    }

    struct Fixture {
        params: SchemeParameters,
        ctx: NttContext,
        sampler: GaussianSampler,
        rng: ChaCha20Rng,
    }

    fn fixture() -> Fixture {
        let params = test_params();
        let ctx = NttContext::new(params.ring_dim, params.ciphertext_modulus()).unwrap();
        let sampler = GaussianSampler::new(params.sigma);
        Fixture {
            params,
            ctx,
            sampler,
            rng: ChaCha20Rng::seed_from_u64(99),
        }
    }

    fn message(params: &SchemeParameters, f: impl Fn(usize) -> u64) -> Poly {
        let coeffs = (0..params.ring_dim).map(f).collect();
        Poly::from_coeffs(coeffs, params.ciphertext_modulus())
    }

    #[test]
    fn test_secret_key_roundtrip() {
        let mut fx = fixture();
        let (q, d, delta, p) = (
            fx.params.ciphertext_modulus(),
            fx.params.ring_dim,
            fx.params.delta(),
            fx.params.plaintext_modulus,
        );
        let sk = RlweSecretKey::generate(&fx.params, &fx.sampler, &mut fx.rng);
        let msg = message(&fx.params, |i| (i as u64 * 257) % p);

        let a = Poly::random_with_rng(d, q, &mut fx.rng);
        let e = Poly::sample_gaussian(d, q, &fx.sampler, &mut fx.rng);
        let ct = RlweCiphertext::encrypt_sk(&sk, &msg, delta, a, &e, &fx.ctx);

        assert_eq!(ct.decrypt(&sk, delta, p, &fx.ctx), msg.coeffs());
    }

    #[test]
    fn test_public_key_roundtrip() {
        let mut fx = fixture();
        let (q, d, delta, p) = (
            fx.params.ciphertext_modulus(),
            fx.params.ring_dim,
            fx.params.delta(),
            fx.params.plaintext_modulus,
        );
        let sk = RlweSecretKey::generate(&fx.params, &fx.sampler, &mut fx.rng);
        let pk = RlwePublicKey::generate(&sk, &fx.sampler, &mut fx.rng, &fx.ctx);
        let msg = message(&fx.params, |i| p - 1 - (i as u64 % 1000));

        let u = Poly::sample_gaussian(d, q, &fx.sampler, &mut fx.rng);
        let e1 = Poly::sample_gaussian(d, q, &fx.sampler, &mut fx.rng);
        let e2 = Poly::sample_gaussian(d, q, &fx.sampler, &mut fx.rng);
        let ct = RlweCiphertext::encrypt_pk(&pk, &msg, delta, &u, &e1, &e2, &fx.ctx);

        assert_eq!(ct.decrypt(&sk, delta, p, &fx.ctx), msg.coeffs());
    }

    #[test]
    fn test_homomorphic_addition_wraps_mod_p() {
        let mut fx = fixture();
        let (q, d, delta, p) = (
            fx.params.ciphertext_modulus(),
            fx.params.ring_dim,
            fx.params.delta(),
            fx.params.plaintext_modulus,
        );
        let sk = RlweSecretKey::generate(&fx.params, &fx.sampler, &mut fx.rng);
        let msg1 = message(&fx.params, |i| p - 1 - i as u64);
        let msg2 = message(&fx.params, |i| 2 * i as u64 + 1);

        let a1 = Poly::random_with_rng(d, q, &mut fx.rng);
        let e1 = Poly::sample_gaussian(d, q, &fx.sampler, &mut fx.rng);
        let ct1 = RlweCiphertext::encrypt_sk(&sk, &msg1, delta, a1, &e1, &fx.ctx);
        let a2 = Poly::random_with_rng(d, q, &mut fx.rng);
        let e2 = Poly::sample_gaussian(d, q, &fx.sampler, &mut fx.rng);
        let ct2 = RlweCiphertext::encrypt_sk(&sk, &msg2, delta, a2, &e2, &fx.ctx);

        let decrypted = ct1.add(&ct2).decrypt(&sk, delta, p, &fx.ctx);
        for i in 0..d {
            let expected = (msg1.coeff(i) + msg2.coeff(i)) % p;
            assert_eq!(decrypted[i], expected, "Mismatch at coefficient {}", i);
        }
    }

    #[test]
    fn test_wrong_secret_key_does_not_decrypt() {
        let mut fx = fixture();
        let (q, d, delta, p) = (
            fx.params.ciphertext_modulus(),
            fx.params.ring_dim,
            fx.params.delta(),
            fx.params.plaintext_modulus,
        );
        let sk = RlweSecretKey::generate(&fx.params, &fx.sampler, &mut fx.rng);
        let other = RlweSecretKey::generate(&fx.params, &fx.sampler, &mut fx.rng);
        let msg = message(&fx.params, |i| i as u64);

        let a = Poly::random_with_rng(d, q, &mut fx.rng);
        let e = Poly::sample_gaussian(d, q, &fx.sampler, &mut fx.rng);
        let ct = RlweCiphertext::encrypt_sk(&sk, &msg, delta, a, &e, &fx.ctx);

        // Silent failure: no error, just a different plaintext.
        assert_ne!(ct.decrypt(&other, delta, p, &fx.ctx), msg.coeffs());
    }
}
