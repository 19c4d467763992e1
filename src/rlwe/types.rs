//! RLWE key and ciphertext types.
//!
//! Ring-LWE over R_q = Z_q[X]/(X^d + 1).

use crate::math::Poly;
use serde::{Deserialize, Serialize};

/// RLWE secret key: polynomial in R_q with small (Gaussian) coefficients.
///
/// # Example
///
/// ```
/// use fhesrv::rlwe::RlweSecretKey;
/// use fhesrv::math::{Poly, DEFAULT_Q};
///
/// let sk = RlweSecretKey::from_poly(Poly::zero(256, DEFAULT_Q));
/// assert_eq!(sk.ring_dim(), 256);
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RlweSecretKey {
    /// Secret polynomial in R_q.
    pub poly: Poly,
}

/// RLWE public key: (a, b) with b = -a·s + e.
///
/// An encryption of zero under the secret key, published so that anyone can
/// encrypt without holding `s`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RlwePublicKey {
    /// Uniformly random polynomial.
    pub a: Poly,
    /// b = -a·s + e.
    pub b: Poly,
}

/// RLWE ciphertext: (a, b) ∈ R_q × R_q with b + a·s = Δ·m + e.
///
/// Decryption computes `b + a·s` and rounds each coefficient to the nearest
/// multiple of Δ. Adding two ciphertexts component-wise adds their messages.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RlweCiphertext {
    pub a: Poly,
    pub b: Poly,
}

impl RlweSecretKey {
    pub fn from_poly(poly: Poly) -> Self {
        Self { poly }
    }

    pub fn ring_dim(&self) -> usize {
        self.poly.dimension()
    }

    pub fn modulus(&self) -> u64 {
        self.poly.modulus()
    }
}

impl RlwePublicKey {
    pub fn ring_dim(&self) -> usize {
        self.a.dimension()
    }

    pub fn modulus(&self) -> u64 {
        self.a.modulus()
    }
}

impl RlweCiphertext {
    /// Creates a ciphertext from component polynomials.
    ///
    /// # Panics
    ///
    /// Debug-asserts that `a` and `b` have the same dimension and modulus.
    pub fn from_parts(a: Poly, b: Poly) -> Self {
        debug_assert_eq!(
            a.dimension(),
            b.dimension(),
            "Ciphertext polynomials must have same dimension"
        );
        debug_assert_eq!(
            a.modulus(),
            b.modulus(),
            "Ciphertext polynomials must have same modulus"
        );
        Self { a, b }
    }

    pub fn ring_dim(&self) -> usize {
        self.a.dimension()
    }

    pub fn modulus(&self) -> u64 {
        self.a.modulus()
    }
}
