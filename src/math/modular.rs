//! Modular arithmetic operations over Z_q

/// Modular arithmetic helpers over Z_q
///
/// All inputs are expected to already be reduced into `[0, q)` unless noted.
pub struct ModQ;

impl ModQ {
    /// Add two values modulo q
    #[inline]
    pub fn add(a: u64, b: u64, q: u64) -> u64 {
        let sum = a as u128 + b as u128;
        if sum >= q as u128 {
            (sum - q as u128) as u64
        } else {
            sum as u64
        }
    }

    /// Subtract two values modulo q
    #[inline]
    pub fn sub(a: u64, b: u64, q: u64) -> u64 {
        if a >= b {
            a - b
        } else {
            q - (b - a)
        }
    }

    /// Multiply two values modulo q
    #[inline]
    pub fn mul(a: u64, b: u64, q: u64) -> u64 {
        ((a as u128 * b as u128) % q as u128) as u64
    }

    /// Negate a value modulo q
    #[inline]
    pub fn negate(a: u64, q: u64) -> u64 {
        if a == 0 {
            0
        } else {
            q - a
        }
    }

    /// Square-and-multiply exponentiation
    pub fn pow(mut base: u64, mut exp: u64, q: u64) -> u64 {
        let mut result = 1u64 % q;
        base %= q;
        while exp > 0 {
            if exp & 1 == 1 {
                result = Self::mul(result, base, q);
            }
            base = Self::mul(base, base, q);
            exp >>= 1;
        }
        result
    }

    /// Inverse of `a` modulo a prime q (Fermat)
    pub fn inverse(a: u64, q: u64) -> u64 {
        Self::pow(a, q - 2, q)
    }

    /// Deterministic Miller-Rabin for 64-bit integers
    pub fn is_prime(n: u64) -> bool {
        const WITNESSES: [u64; 12] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37];
        if n < 2 {
            return false;
        }
        for &p in &WITNESSES {
            if n % p == 0 {
                return n == p;
            }
        }

        let s = (n - 1).trailing_zeros();
        let d = (n - 1) >> s;
        'witness: for &a in &WITNESSES {
            let mut x = Self::pow(a, d, n);
            if x == 1 || x == n - 1 {
                continue;
            }
            for _ in 1..s {
                x = Self::mul(x, x, n);
                if x == n - 1 {
                    continue 'witness;
                }
            }
            return false;
        }
        true
    }

    /// Convert a signed integer to its representation in Z_q
    #[inline]
    pub fn from_signed(val: i64, q: u64) -> u64 {
        if val >= 0 {
            (val as u64) % q
        } else {
            Self::negate(val.unsigned_abs() % q, q)
        }
    }
}
