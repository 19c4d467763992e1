//! Ring arithmetic backing the reference RLWE backend.
//!
//! - **Modular arithmetic** over Z_q
//! - **Negacyclic NTT** for O(n log n) polynomial multiplication
//! - **Polynomials** over R_q = Z_q[X]/(X^d + 1)
//! - **Discrete Gaussian sampling** for keys and error terms

pub mod modular;
pub mod ntt;
pub mod poly;
pub mod sampler;

pub use modular::ModQ;
pub use ntt::NttContext;
pub use poly::Poly;
pub use sampler::{GaussianSampler, DEFAULT_SIGMA};

/// q = 2^60 - 2^14 + 1, prime, q ≡ 1 (mod 2^14).
///
/// Supports negacyclic NTTs for ring dimensions up to 8192.
pub const DEFAULT_Q: u64 = 1152921504606830593;
