//! Scheme parameter sets
//!
//! Client and server must agree on these byte for byte. Every envelope and
//! key record carries a fingerprint of the parameters that produced it, so a
//! mismatch fails at decode time instead of yielding a wrong plaintext.

use std::hash::Hasher;
use std::path::Path;

use fnv::FnvHasher;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::math::{ModQ, NttContext, DEFAULT_Q};

/// Parameter format version
///
/// Bump this when the meaning of any field, or the encoding the fingerprint is
/// computed over, changes.
pub const PARAMS_VERSION: u16 = 1;

/// Named parameter presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamsPreset {
    /// d = 2048, 2048 slots per ciphertext
    #[default]
    D2048,
    /// d = 4096, 4096 slots per ciphertext
    D4096,
}

impl ParamsPreset {
    pub fn parameters(self) -> SchemeParameters {
        match self {
            Self::D2048 => SchemeParameters::secure_128_d2048(),
            Self::D4096 => SchemeParameters::secure_128_d4096(),
        }
    }
}

/// Cryptographic configuration shared by client and server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemeParameters {
    /// Must equal [`PARAMS_VERSION`]
    pub version: u16,

    /// Ring dimension d (power of two); also the ring capacity in slots
    pub ring_dim: usize,

    /// Ciphertext modulus chain, each prime ≡ 1 (mod 2d)
    ///
    /// The reference RLWE backend works at a single level, so the chain has
    /// exactly one element there.
    pub moduli: Vec<u64>,

    /// Plaintext modulus p; slot values and their sums live in Z_p
    pub plaintext_modulus: u64,

    /// Standard deviation of the error distribution
    pub sigma: f64,
}

impl SchemeParameters {
    /// 128-bit secure parameters for d=2048
    pub fn secure_128_d2048() -> Self {
        Self {
            version: PARAMS_VERSION,
            ring_dim: 2048,
            moduli: vec![DEFAULT_Q],
            plaintext_modulus: 65537,
            sigma: 3.2,
        }
    }

    /// 128-bit secure parameters for d=4096 (twice the slots)
    pub fn secure_128_d4096() -> Self {
        Self {
            ring_dim: 4096,
            ..Self::secure_128_d2048()
        }
    }

    /// Number of plaintext slots per ciphertext
    pub fn capacity(&self) -> usize {
        self.ring_dim
    }

    /// Top-level ciphertext modulus q
    pub fn ciphertext_modulus(&self) -> u64 {
        self.moduli.first().copied().unwrap_or(0)
    }

    /// Scaling factor Δ = ⌊q/p⌋
    pub fn delta(&self) -> u64 {
        self.ciphertext_modulus() / self.plaintext_modulus
    }

    /// Check that the parameters describe a usable ring
    pub fn validate(&self) -> Result<()> {
        if self.version != PARAMS_VERSION {
            return Err(Error::Parameters(format!(
                "version mismatch: expected v{}, got v{}",
                PARAMS_VERSION, self.version
            )));
        }
        if self.moduli.is_empty() {
            return Err(Error::Parameters("modulus chain is empty".into()));
        }
        for &q in &self.moduli {
            if !ModQ::is_prime(q) {
                return Err(Error::Parameters(format!("modulus {} is not prime", q)));
            }
            if q >= 1 << 62 {
                return Err(Error::Parameters(format!("modulus {} exceeds 62 bits", q)));
            }
        }
        NttContext::new(self.ring_dim, self.ciphertext_modulus()).map_err(Error::Parameters)?;

        if self.plaintext_modulus < 2 {
            return Err(Error::Parameters("plaintext modulus must be >= 2".into()));
        }
        // Leave room for noise: Δ must dwarf the fresh-encryption error.
        if self.delta() < 1 << 20 {
            return Err(Error::Parameters(format!(
                "plaintext modulus {} too large for q = {}",
                self.plaintext_modulus,
                self.ciphertext_modulus()
            )));
        }
        if !(self.sigma > 0.0 && self.sigma < 64.0) {
            return Err(Error::Parameters(format!("sigma {} out of range", self.sigma)));
        }
        Ok(())
    }

    /// FNV-1a fingerprint of the canonical encoding
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = FnvHasher::default();
        hasher.write(&self.canonical_bytes());
        hasher.finish()
    }

    /// Canonical binary encoding (bincode, fixed field order)
    pub fn canonical_bytes(&self) -> Vec<u8> {
        // Serializing a plain struct of integers/floats into a Vec cannot fail.
        bincode::serialize(self).unwrap_or_default()
    }

    /// Save parameters to a JSON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| Error::Serialization(e.to_string()))?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load and validate parameters from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let params: Self =
            serde_json::from_str(&json).map_err(|e| Error::Serialization(e.to_string()))?;
        params.validate()?;
        Ok(params)
    }
}

impl Default for SchemeParameters {
    fn default() -> Self {
        Self::secure_128_d2048()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params_valid() {
        assert!(SchemeParameters::default().validate().is_ok());
        assert!(SchemeParameters::secure_128_d4096().validate().is_ok());
    }

    #[test]
    fn test_delta_calculation() {
        let params = SchemeParameters::secure_128_d2048();
        // q / p ≈ 2^60 / 2^16 = 2^44
        assert!(params.delta() > 1 << 43);
    }

    #[test]
    fn test_version_mismatch() {
        let old = SchemeParameters {
            version: 0,
            ..SchemeParameters::default()
        };
        assert!(matches!(old.validate(), Err(Error::Parameters(_))));
    }

    #[test]
    fn test_rejects_non_ntt_friendly_modulus() {
        let params = SchemeParameters {
            moduli: vec![1_000_000_007],
            ..SchemeParameters::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_rejects_oversized_plaintext_modulus() {
        let params = SchemeParameters {
            plaintext_modulus: 1 << 50,
            ..SchemeParameters::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_fingerprint_distinguishes_parameters() {
        let a = SchemeParameters::secure_128_d2048();
        let b = SchemeParameters::secure_128_d4096();
        let c = SchemeParameters {
            plaintext_modulus: 257,
            ..a.clone()
        };
        assert_eq!(a.fingerprint(), a.clone().fingerprint());
        assert_ne!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), c.fingerprint());
    }

    #[test]
    fn test_json_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("params.json");
        let params = SchemeParameters::secure_128_d4096();
        params.save(&path).unwrap();
        assert_eq!(SchemeParameters::load(&path).unwrap(), params);
    }

    #[test]
    fn test_preset_serde_names() {
        let preset: ParamsPreset = serde_json::from_str("\"d4096\"").unwrap();
        assert_eq!(preset.parameters().ring_dim, 4096);
    }
}
