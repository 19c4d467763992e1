//! Abstract additively-homomorphic encryption capability.
//!
//! The protocol layers (codec, envelope, key store, client) only talk to a
//! [`HomomorphicScheme`]; [`crate::rlwe::RlweScheme`] is the reference
//! backend. A backend promises:
//!
//! - `decrypt(sk, encrypt(k, m)) == m` for `k` either half of a pair generated
//!   together with `sk`
//! - `decrypt(sk, add(c1, c2)) == m1 + m2 (mod p)` slot-wise, as long as the
//!   accumulated noise stays within the backend's budget
//!
//! A key pair whose halves were generated separately decrypts to garbage
//! without any error at this layer; see [`crate::keystore`] for the check that
//! prevents that.

use rand::{CryptoRng, RngCore};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::params::SchemeParameters;

/// Fixed-capacity vector of slot values in Z_p
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plaintext {
    slots: Vec<u64>,
    modulus: u64,
}

impl Plaintext {
    /// All-zero plaintext with `capacity` slots
    pub fn zero(capacity: usize, modulus: u64) -> Self {
        Self {
            slots: vec![0; capacity],
            modulus,
        }
    }

    /// Build from slot values, reducing each mod `modulus`
    pub fn from_slots(slots: Vec<u64>, modulus: u64) -> Self {
        let slots = slots.into_iter().map(|v| v % modulus).collect();
        Self { slots, modulus }
    }

    pub fn slots(&self) -> &[u64] {
        &self.slots
    }

    pub fn into_slots(self) -> Vec<u64> {
        self.slots
    }

    pub fn modulus(&self) -> u64 {
        self.modulus
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }
}

/// Which half of a key pair performs an encryption.
///
/// Both produce ciphertexts that only the secret key decrypts.
pub enum EncryptionKey<'a, S: HomomorphicScheme> {
    Public(&'a S::PublicKey),
    Secret(&'a S::SecretKey),
}

impl<S: HomomorphicScheme> Clone for EncryptionKey<'_, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S: HomomorphicScheme> Copy for EncryptionKey<'_, S> {}

impl<S: HomomorphicScheme> std::fmt::Debug for EncryptionKey<'_, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Public(_) => f.write_str("EncryptionKey::Public"),
            Self::Secret(_) => f.write_str("EncryptionKey::Secret(..)"),
        }
    }
}

/// An additively-homomorphic public-key scheme over packed slot vectors.
pub trait HomomorphicScheme: Sized {
    type SecretKey: Clone + Serialize + DeserializeOwned;
    type PublicKey: Clone + Serialize + DeserializeOwned;
    type Ciphertext: Clone + Serialize + DeserializeOwned;

    /// Instantiate the backend for validated parameters
    fn new(params: &SchemeParameters) -> Result<Self>;

    fn params(&self) -> &SchemeParameters;

    /// Slots per plaintext
    fn capacity(&self) -> usize {
        self.params().capacity()
    }

    fn plaintext_modulus(&self) -> u64 {
        self.params().plaintext_modulus
    }

    /// Generate a fresh (secret, public) pair
    fn generate_key_pair<R: RngCore + CryptoRng>(
        &self,
        rng: &mut R,
    ) -> (Self::SecretKey, Self::PublicKey);

    /// Encrypt a full-capacity plaintext under either key
    fn encrypt<R: RngCore + CryptoRng>(
        &self,
        key: EncryptionKey<'_, Self>,
        plaintext: &Plaintext,
        rng: &mut R,
    ) -> Result<Self::Ciphertext>;

    fn decrypt(&self, secret_key: &Self::SecretKey, ciphertext: &Self::Ciphertext) -> Plaintext;

    /// Homomorphic addition
    fn add(&self, lhs: &Self::Ciphertext, rhs: &Self::Ciphertext) -> Self::Ciphertext;

    /// Structural checks for a deserialized ciphertext
    fn check_ciphertext(&self, ciphertext: &Self::Ciphertext) -> Result<()>;

    /// Structural checks for a deserialized secret key
    fn check_secret_key(&self, secret_key: &Self::SecretKey) -> Result<()>;

    /// Structural checks for a deserialized public key
    fn check_public_key(&self, public_key: &Self::PublicKey) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plaintext_reduces_slots() {
        let pt = Plaintext::from_slots(vec![1, 17, 35], 17);
        assert_eq!(pt.slots(), &[1, 0, 1]);
        assert_eq!(pt.capacity(), 3);
    }

    #[test]
    fn test_zero_plaintext() {
        let pt = Plaintext::zero(8, 257);
        assert!(pt.slots().iter().all(|&v| v == 0));
        assert_eq!(pt.modulus(), 257);
    }
}
