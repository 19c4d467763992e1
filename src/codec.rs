//! Vector ↔ ciphertext pipeline
//!
//! `CipherCodec` wraps a [`HomomorphicScheme`] with the slot-packing rules the
//! protocol relies on:
//!
//! - vectors up to ring capacity are accepted and zero-padded
//! - longer vectors are rejected, never truncated
//! - values are interpreted modulo the plaintext modulus p
//!
//! Encryption randomness comes from a ChaCha20 generator owned by the codec,
//! seeded from OS entropy unless a seed is supplied.

use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

use crate::error::{Error, Result};
use crate::params::SchemeParameters;
use crate::rlwe::RlweScheme;
use crate::scheme::{EncryptionKey, HomomorphicScheme, Plaintext};

/// Encode/encrypt/decrypt/decode for one parameter set
pub struct CipherCodec<S: HomomorphicScheme = RlweScheme> {
    scheme: S,
    rng: ChaCha20Rng,
}

impl<S: HomomorphicScheme> CipherCodec<S> {
    /// Codec for `params`, randomness from OS entropy
    pub fn new(params: &SchemeParameters) -> Result<Self> {
        Ok(Self::from_scheme(S::new(params)?))
    }

    /// Deterministic codec for reproducible tests and benchmarks
    pub fn with_seed(params: &SchemeParameters, seed: u64) -> Result<Self> {
        Ok(Self {
            scheme: S::new(params)?,
            rng: ChaCha20Rng::seed_from_u64(seed),
        })
    }

    pub fn from_scheme(scheme: S) -> Self {
        Self {
            scheme,
            rng: ChaCha20Rng::from_entropy(),
        }
    }

    pub fn scheme(&self) -> &S {
        &self.scheme
    }

    pub fn params(&self) -> &SchemeParameters {
        self.scheme.params()
    }

    /// Ring capacity in slots
    pub fn capacity(&self) -> usize {
        self.scheme.capacity()
    }

    /// Pack `values` into a full-capacity plaintext
    ///
    /// Returns `InvalidInput` if `values` is longer than the ring capacity.
    pub fn encode_vector(&self, values: &[u64]) -> Result<Plaintext> {
        let capacity = self.capacity();
        if values.len() > capacity {
            return Err(Error::InvalidInput(format!(
                "vector of length {} exceeds ring capacity {}",
                values.len(),
                capacity
            )));
        }
        let mut slots = values.to_vec();
        slots.resize(capacity, 0);
        Ok(Plaintext::from_slots(slots, self.scheme.plaintext_modulus()))
    }

    /// Slot values of a plaintext, full capacity
    pub fn decode_vector(&self, plaintext: &Plaintext) -> Vec<u64> {
        plaintext.slots().to_vec()
    }

    pub fn encrypt(
        &mut self,
        key: EncryptionKey<'_, S>,
        plaintext: &Plaintext,
    ) -> Result<S::Ciphertext> {
        self.scheme.encrypt(key, plaintext, &mut self.rng)
    }

    pub fn decrypt(&self, secret_key: &S::SecretKey, ciphertext: &S::Ciphertext) -> Plaintext {
        self.scheme.decrypt(secret_key, ciphertext)
    }

    /// Homomorphic sum of two ciphertexts
    pub fn add(&self, lhs: &S::Ciphertext, rhs: &S::Ciphertext) -> S::Ciphertext {
        self.scheme.add(lhs, rhs)
    }

    /// Encode then encrypt
    pub fn encrypt_vector(
        &mut self,
        key: EncryptionKey<'_, S>,
        values: &[u64],
    ) -> Result<S::Ciphertext> {
        let plaintext = self.encode_vector(values)?;
        self.encrypt(key, &plaintext)
    }

    /// Decrypt then decode
    pub fn decrypt_vector(&self, secret_key: &S::SecretKey, ciphertext: &S::Ciphertext) -> Vec<u64> {
        self.decode_vector(&self.decrypt(secret_key, ciphertext))
    }

    /// Fresh key pair from the codec's generator
    pub fn generate_key_pair(&mut self) -> (S::SecretKey, S::PublicKey) {
        self.scheme.generate_key_pair(&mut self.rng)
    }
}
