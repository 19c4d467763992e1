//! Polynomial operations over R_q = Z_q[X]/(X^d + 1).
//!
//! Polynomials are kept in coefficient form; multiplication goes through an
//! [`NttContext`] and converts back before returning.
//!
//! # Example
//!
//! ```
//! use fhesrv::math::{NttContext, Poly, DEFAULT_Q};
//!
//! let ctx = NttContext::new(256, DEFAULT_Q).unwrap();
//! let a = Poly::constant(3, 256, DEFAULT_Q);
//! let b = Poly::constant(5, 256, DEFAULT_Q);
//! assert_eq!(a.mul_ntt(&b, &ctx).coeff(0), 15);
//! ```

use std::ops::{Add, Neg, Sub};

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::modular::ModQ;
use super::ntt::NttContext;
use super::sampler::GaussianSampler;

/// Polynomial in R_q, coefficients in `[0, q)`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Poly {
    coeffs: Vec<u64>,
    q: u64,
}

impl Poly {
    /// Zero polynomial with given dimension and modulus
    pub fn zero(dim: usize, q: u64) -> Self {
        Self {
            coeffs: vec![0; dim],
            q,
        }
    }

    /// Polynomial from a coefficient vector, reducing every entry mod q
    pub fn from_coeffs(coeffs: Vec<u64>, q: u64) -> Self {
        let coeffs = coeffs.into_iter().map(|c| c % q).collect();
        Self { coeffs, q }
    }

    /// Constant polynomial `value`
    pub fn constant(value: u64, dim: usize, q: u64) -> Self {
        let mut p = Self::zero(dim, q);
        p.coeffs[0] = value % q;
        p
    }

    /// Uniformly random polynomial
    pub fn random_with_rng<R: Rng + ?Sized>(dim: usize, q: u64, rng: &mut R) -> Self {
        let coeffs = (0..dim).map(|_| rng.gen_range(0..q)).collect();
        Self { coeffs, q }
    }

    /// Polynomial with discrete Gaussian coefficients
    pub fn sample_gaussian<R: Rng + ?Sized>(
        dim: usize,
        q: u64,
        sampler: &GaussianSampler,
        rng: &mut R,
    ) -> Self {
        Self {
            coeffs: sampler.sample_vec_centered(dim, q, rng),
            q,
        }
    }

    pub fn dimension(&self) -> usize {
        self.coeffs.len()
    }

    pub fn modulus(&self) -> u64 {
        self.q
    }

    pub fn coeff(&self, i: usize) -> u64 {
        self.coeffs[i]
    }

    pub fn coeffs(&self) -> &[u64] {
        &self.coeffs
    }

    /// True when every coefficient lies in `[0, q)`.
    ///
    /// Deserialized polynomials bypass `from_coeffs`, so this is the check for
    /// untrusted input.
    pub fn is_reduced(&self) -> bool {
        self.q > 0 && self.coeffs.iter().all(|&c| c < self.q)
    }

    pub fn is_zero(&self) -> bool {
        self.coeffs.iter().all(|&c| c == 0)
    }

    pub fn scalar_mul(&self, scalar: u64) -> Self {
        let scalar = scalar % self.q;
        Self {
            coeffs: self
                .coeffs
                .iter()
                .map(|&c| ModQ::mul(c, scalar, self.q))
                .collect(),
            q: self.q,
        }
    }

    /// Negacyclic product using the NTT
    pub fn mul_ntt(&self, other: &Self, ctx: &NttContext) -> Self {
        assert_eq!(self.q, other.q, "Moduli must match");
        assert_eq!(self.q, ctx.modulus(), "NTT context modulus must match");
        assert_eq!(
            self.coeffs.len(),
            other.coeffs.len(),
            "Dimensions must match"
        );

        let mut a = self.coeffs.clone();
        let mut b = other.coeffs.clone();
        ctx.forward(&mut a);
        ctx.forward(&mut b);
        let mut product = ctx.pointwise_mul(&a, &b);
        ctx.inverse(&mut product);

        Self {
            coeffs: product,
            q: self.q,
        }
    }
}

impl Add for &Poly {
    type Output = Poly;

    fn add(self, rhs: Self) -> Poly {
        assert_eq!(self.q, rhs.q, "Moduli must match");
        assert_eq!(self.coeffs.len(), rhs.coeffs.len(), "Dimensions must match");
        Poly {
            coeffs: self
                .coeffs
                .iter()
                .zip(&rhs.coeffs)
                .map(|(&a, &b)| ModQ::add(a, b, self.q))
                .collect(),
            q: self.q,
        }
    }
}

impl Sub for &Poly {
    type Output = Poly;

    fn sub(self, rhs: Self) -> Poly {
        assert_eq!(self.q, rhs.q, "Moduli must match");
        assert_eq!(self.coeffs.len(), rhs.coeffs.len(), "Dimensions must match");
        Poly {
            coeffs: self
                .coeffs
                .iter()
                .zip(&rhs.coeffs)
                .map(|(&a, &b)| ModQ::sub(a, b, self.q))
                .collect(),
            q: self.q,
        }
    }
}

impl Neg for &Poly {
    type Output = Poly;

    fn neg(self) -> Poly {
        Poly {
            coeffs: self.coeffs.iter().map(|&c| ModQ::negate(c, self.q)).collect(),
            q: self.q,
        }
    }
}
