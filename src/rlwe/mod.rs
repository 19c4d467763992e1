//! RLWE (Ring Learning With Errors) reference backend
//!
//! Implements [`HomomorphicScheme`] over R_q = Z_q[X]/(X^d + 1) with
//! coefficient packing: slot i of a plaintext is coefficient i of the message
//! polynomial, scaled by Δ = ⌊q/p⌋ before encryption. Coefficient-wise
//! addition of ciphertexts is therefore slot-wise addition mod p.
//!
//! # Example
//!
//! ```
//! use fhesrv::params::SchemeParameters;
//! use fhesrv::rlwe::RlweScheme;
//! use fhesrv::scheme::{EncryptionKey, HomomorphicScheme, Plaintext};
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha20Rng;
//!
//! let params = SchemeParameters { ring_dim: 256, ..SchemeParameters::default() };
//! let scheme = RlweScheme::new(&params).unwrap();
//! let mut rng = ChaCha20Rng::seed_from_u64(1);
//! let (sk, pk) = scheme.generate_key_pair(&mut rng);
//!
//! let pt = Plaintext::from_slots(vec![7; 256], params.plaintext_modulus);
//! let ct = scheme.encrypt(EncryptionKey::Public(&pk), &pt, &mut rng).unwrap();
//! assert_eq!(scheme.decrypt(&sk, &ct), pt);
//! ```

mod enc;
mod types;

pub use types::{RlweCiphertext, RlwePublicKey, RlweSecretKey};

use rand::{CryptoRng, RngCore};

use crate::error::{Error, Result};
use crate::math::{GaussianSampler, NttContext, Poly};
use crate::params::SchemeParameters;
use crate::scheme::{EncryptionKey, HomomorphicScheme, Plaintext};

/// Reference RLWE backend bound to one parameter set
#[derive(Clone, Debug)]
pub struct RlweScheme {
    params: SchemeParameters,
    ctx: NttContext,
    sampler: GaussianSampler,
}

impl RlweScheme {
    fn message_poly(&self, plaintext: &Plaintext) -> Result<Poly> {
        if plaintext.capacity() != self.params.ring_dim {
            return Err(Error::InvalidInput(format!(
                "plaintext has {} slots, ring capacity is {}",
                plaintext.capacity(),
                self.params.ring_dim
            )));
        }
        if plaintext.modulus() != self.params.plaintext_modulus {
            return Err(Error::InvalidInput(format!(
                "plaintext modulus {} does not match parameters ({})",
                plaintext.modulus(),
                self.params.plaintext_modulus
            )));
        }
        Ok(Poly::from_coeffs(
            plaintext.slots().to_vec(),
            self.params.ciphertext_modulus(),
        ))
    }

    fn check_poly(&self, poly: &Poly, what: &str) -> Result<()> {
        if poly.dimension() != self.params.ring_dim {
            return Err(Error::Serialization(format!(
                "{} has dimension {}, expected {}",
                what,
                poly.dimension(),
                self.params.ring_dim
            )));
        }
        if poly.modulus() != self.params.ciphertext_modulus() {
            return Err(Error::Serialization(format!(
                "{} has modulus {}, expected {}",
                what,
                poly.modulus(),
                self.params.ciphertext_modulus()
            )));
        }
        if !poly.is_reduced() {
            return Err(Error::Serialization(format!(
                "{} has coefficients outside [0, q)",
                what
            )));
        }
        Ok(())
    }
}

impl HomomorphicScheme for RlweScheme {
    type SecretKey = RlweSecretKey;
    type PublicKey = RlwePublicKey;
    type Ciphertext = RlweCiphertext;

    fn new(params: &SchemeParameters) -> Result<Self> {
        params.validate()?;
        if params.moduli.len() != 1 {
            return Err(Error::Parameters(format!(
                "RLWE backend supports a single-level modulus chain, got {} levels",
                params.moduli.len()
            )));
        }
        let ctx = NttContext::new(params.ring_dim, params.ciphertext_modulus())
            .map_err(Error::Parameters)?;
        Ok(Self {
            params: params.clone(),
            ctx,
            sampler: GaussianSampler::new(params.sigma),
        })
    }

    fn params(&self) -> &SchemeParameters {
        &self.params
    }

    fn generate_key_pair<R: RngCore + CryptoRng>(
        &self,
        rng: &mut R,
    ) -> (RlweSecretKey, RlwePublicKey) {
        let sk = RlweSecretKey::generate(&self.params, &self.sampler, rng);
        let pk = RlwePublicKey::generate(&sk, &self.sampler, rng, &self.ctx);
        (sk, pk)
    }

    fn encrypt<R: RngCore + CryptoRng>(
        &self,
        key: EncryptionKey<'_, Self>,
        plaintext: &Plaintext,
        rng: &mut R,
    ) -> Result<RlweCiphertext> {
        let message = self.message_poly(plaintext)?;
        let d = self.params.ring_dim;
        let q = self.params.ciphertext_modulus();
        let delta = self.params.delta();

        let ct = match key {
            EncryptionKey::Secret(sk) => {
                let a = Poly::random_with_rng(d, q, rng);
                let e = Poly::sample_gaussian(d, q, &self.sampler, rng);
                RlweCiphertext::encrypt_sk(sk, &message, delta, a, &e, &self.ctx)
            }
            EncryptionKey::Public(pk) => {
                let u = Poly::sample_gaussian(d, q, &self.sampler, rng);
                let e1 = Poly::sample_gaussian(d, q, &self.sampler, rng);
                let e2 = Poly::sample_gaussian(d, q, &self.sampler, rng);
                RlweCiphertext::encrypt_pk(pk, &message, delta, &u, &e1, &e2, &self.ctx)
            }
        };
        Ok(ct)
    }

    fn decrypt(&self, secret_key: &RlweSecretKey, ciphertext: &RlweCiphertext) -> Plaintext {
        let p = self.params.plaintext_modulus;
        let slots = ciphertext.decrypt(secret_key, self.params.delta(), p, &self.ctx);
        Plaintext::from_slots(slots, p)
    }

    fn add(&self, lhs: &RlweCiphertext, rhs: &RlweCiphertext) -> RlweCiphertext {
        lhs.add(rhs)
    }

    fn check_ciphertext(&self, ciphertext: &RlweCiphertext) -> Result<()> {
        self.check_poly(&ciphertext.a, "ciphertext component a")?;
        self.check_poly(&ciphertext.b, "ciphertext component b")
    }

    fn check_secret_key(&self, secret_key: &RlweSecretKey) -> Result<()> {
        self.check_poly(&secret_key.poly, "secret key")
    }

    fn check_public_key(&self, public_key: &RlwePublicKey) -> Result<()> {
        self.check_poly(&public_key.a, "public key component a")?;
        self.check_poly(&public_key.b, "public key component b")
    }
}
