//! Negacyclic Number-Theoretic Transform over Z_q[X]/(X^n + 1).
//!
//! Cooley-Tukey forward / Gentleman-Sande inverse with twiddle factors stored
//! in bit-reversed order. Requires a prime q with q ≡ 1 (mod 2n) so that a
//! primitive 2n-th root of unity ψ (ψ^n = -1) exists.
//!
//! # Example
//!
//! ```
//! use fhesrv::math::{NttContext, DEFAULT_Q};
//!
//! let ctx = NttContext::new(256, DEFAULT_Q).unwrap();
//! let mut coeffs = vec![1u64; 256];
//! ctx.forward(&mut coeffs);
//! ctx.inverse(&mut coeffs);
//! assert_eq!(coeffs[0], 1);
//! ```

use super::modular::ModQ;

/// Precomputed twiddle factors for one (dimension, modulus) pair.
#[derive(Clone, Debug)]
pub struct NttContext {
    n: usize,
    q: u64,
    /// ψ^bitrev(i)
    psi_rev: Vec<u64>,
    /// ψ^-bitrev(i)
    psi_inv_rev: Vec<u64>,
    /// n^-1 mod q
    n_inv: u64,
}

impl NttContext {
    /// Build a context, or explain why `(n, q)` cannot support a negacyclic NTT.
    pub fn new(n: usize, q: u64) -> Result<Self, String> {
        if n < 2 || !n.is_power_of_two() {
            return Err(format!("ring dimension {} is not a power of two >= 2", n));
        }
        if q % (2 * n as u64) != 1 {
            return Err(format!("modulus {} is not ≡ 1 (mod 2·{})", q, n));
        }

        let psi = Self::find_primitive_root(2 * n as u64, q)
            .ok_or_else(|| format!("no primitive {}-th root of unity modulo {}", 2 * n, q))?;
        let psi_inv = ModQ::inverse(psi, q);
        let log_n = n.trailing_zeros();

        let mut psi_rev = vec![0u64; n];
        let mut psi_inv_rev = vec![0u64; n];
        let mut pow = 1u64;
        let mut pow_inv = 1u64;
        for i in 0..n {
            let r = bit_reverse(i, log_n);
            psi_rev[r] = pow;
            psi_inv_rev[r] = pow_inv;
            pow = ModQ::mul(pow, psi, q);
            pow_inv = ModQ::mul(pow_inv, psi_inv, q);
        }

        Ok(Self {
            n,
            q,
            psi_rev,
            psi_inv_rev,
            n_inv: ModQ::inverse(n as u64, q),
        })
    }

    pub fn dimension(&self) -> usize {
        self.n
    }

    pub fn modulus(&self) -> u64 {
        self.q
    }

    /// Forward transform in place. Input in natural order, output bit-reversed.
    pub fn forward(&self, a: &mut [u64]) {
        assert_eq!(a.len(), self.n, "input length must match ring dimension");
        let q = self.q;
        let mut t = self.n;
        let mut m = 1;
        while m < self.n {
            t >>= 1;
            for i in 0..m {
                let j1 = 2 * i * t;
                let s = self.psi_rev[m + i];
                for j in j1..j1 + t {
                    let u = a[j];
                    let v = ModQ::mul(a[j + t], s, q);
                    a[j] = ModQ::add(u, v, q);
                    a[j + t] = ModQ::sub(u, v, q);
                }
            }
            m <<= 1;
        }
    }

    /// Inverse transform in place, including the n^-1 scaling.
    pub fn inverse(&self, a: &mut [u64]) {
        assert_eq!(a.len(), self.n, "input length must match ring dimension");
        let q = self.q;
        let mut t = 1;
        let mut m = self.n;
        while m > 1 {
            let h = m >> 1;
            let mut j1 = 0;
            for i in 0..h {
                let s = self.psi_inv_rev[h + i];
                for j in j1..j1 + t {
                    let u = a[j];
                    let v = a[j + t];
                    a[j] = ModQ::add(u, v, q);
                    a[j + t] = ModQ::mul(ModQ::sub(u, v, q), s, q);
                }
                j1 += 2 * t;
            }
            t <<= 1;
            m = h;
        }
        for c in a.iter_mut() {
            *c = ModQ::mul(*c, self.n_inv, q);
        }
    }

    /// Pointwise product of two transformed vectors.
    pub fn pointwise_mul(&self, a: &[u64], b: &[u64]) -> Vec<u64> {
        a.iter()
            .zip(b.iter())
            .map(|(&x, &y)| ModQ::mul(x, y, self.q))
            .collect()
    }

    /// ψ of exact order `order` (a power of two), i.e. ψ^(order/2) = -1.
    fn find_primitive_root(order: u64, q: u64) -> Option<u64> {
        let exp = (q - 1) / order;
        (2..q.min(1 << 20))
            .map(|g| ModQ::pow(g, exp, q))
            .find(|&candidate| ModQ::pow(candidate, order / 2, q) == q - 1)
    }
}

fn bit_reverse(x: usize, bits: u32) -> usize {
    if bits == 0 {
        return 0;
    }
    x.reverse_bits() >> (usize::BITS - bits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::DEFAULT_Q;

    fn schoolbook_negacyclic(a: &[u64], b: &[u64], q: u64) -> Vec<u64> {
        let n = a.len();
        let mut out = vec![0u64; n];
        for i in 0..n {
            for j in 0..n {
                let prod = ModQ::mul(a[i], b[j], q);
                let k = i + j;
                if k < n {
                    out[k] = ModQ::add(out[k], prod, q);
                } else {
                    out[k - n] = ModQ::sub(out[k - n], prod, q);
                }
            }
        }
        out
    }

    #[test]
    fn test_roundtrip() {
        let ctx = NttContext::new(64, DEFAULT_Q).unwrap();
        let original: Vec<u64> = (0..64u64).map(|i| i * 1_000_003).collect();
        let mut coeffs = original.clone();
        ctx.forward(&mut coeffs);
        assert_ne!(coeffs, original);
        ctx.inverse(&mut coeffs);
        assert_eq!(coeffs, original);
    }

    #[test]
    fn test_matches_schoolbook() {
        let n = 32;
        let q = DEFAULT_Q;
        let ctx = NttContext::new(n, q).unwrap();
        let a: Vec<u64> = (0..n as u64).map(|i| (i * 7 + 3) % 101).collect();
        let b: Vec<u64> = (0..n as u64).map(|i| q - 1 - (i * 13) % 97).collect();

        let mut fa = a.clone();
        let mut fb = b.clone();
        ctx.forward(&mut fa);
        ctx.forward(&mut fb);
        let mut prod = ctx.pointwise_mul(&fa, &fb);
        ctx.inverse(&mut prod);

        assert_eq!(prod, schoolbook_negacyclic(&a, &b, q));
    }

    #[test]
    fn test_rejects_bad_modulus() {
        assert!(NttContext::new(256, 65537 * 3).is_err());
        assert!(NttContext::new(100, DEFAULT_Q).is_err());
    }

    #[test]
    fn test_bit_reverse() {
        assert_eq!(bit_reverse(1, 3), 4);
        assert_eq!(bit_reverse(6, 3), 3);
        assert_eq!(bit_reverse(0, 0), 0);
    }
}
