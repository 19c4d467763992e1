//! fhesrv: client for an encrypted aggregation service
//!
//! A client encrypts numeric vectors under its own key pair and uploads them;
//! the service sums the ciphertexts stored in a timestamp range without ever
//! seeing a plaintext, and the client decrypts the sum.
//!
//! Key components:
//! - KeyStore: key pair generation and persistence
//! - CipherCodec: vector packing, encryption and decryption over an abstract
//!   additively-homomorphic scheme (RLWE reference backend)
//! - Envelope: versioned, parameter-fingerprinted wire format
//! - ProtocolClient: Write / WriteMany / Evaluate over a Transport

pub mod math;
pub mod params;
pub mod error;
pub mod scheme;
pub mod rlwe;
pub mod codec;
pub mod envelope;
pub mod keystore;
pub mod transport;
pub mod bulk;
pub mod client;
pub mod config;

pub use client::ProtocolClient;
pub use codec::CipherCodec;
pub use config::ClientConfig;
pub use error::{Error, Result};
pub use keystore::{KeyPair, KeyStore};
pub use params::{ParamsPreset, SchemeParameters};
pub use rlwe::RlweScheme;
pub use scheme::{EncryptionKey, HomomorphicScheme, Plaintext};
pub use transport::{EvalReply, HttpTransport, TimestampRange, Transport};
