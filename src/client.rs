//! Protocol client: Write and Evaluate over a [`Transport`]
//!
//! Every operation loads the key pair from the client's [`KeyStore`], so a
//! client never holds keys between calls. Each call is a single blocking
//! request/response; a failure at any step aborts the call and nothing
//! partial is returned.
//!
//! ```no_run
//! use fhesrv::client::ProtocolClient;
//! use fhesrv::keystore::KeyStore;
//! use fhesrv::params::SchemeParameters;
//! use fhesrv::transport::HttpTransport;
//!
//! # fn main() -> fhesrv::Result<()> {
//! let params = SchemeParameters::default();
//! let transport = HttpTransport::new("http://localhost:8080", "secret-token")?;
//! let client = ProtocolClient::new(transport, KeyStore::in_dir("."));
//!
//! client.generate_keys(&params)?;
//! client.write(&params, &[1, 2, 3])?;
//! let sums = client.evaluate(&params, 0, i64::MAX)?;
//! println!("{:?}", &sums[..3]);
//! # Ok(())
//! # }
//! ```

use std::marker::PhantomData;
use std::path::Path;

use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use tracing::{debug, info, warn};

use crate::bulk;
use crate::codec::CipherCodec;
use crate::envelope::{decode_ciphertext, encode_ciphertext, encode_query};
use crate::error::{Error, Result};
use crate::keystore::{KeyPair, KeyStore};
use crate::params::SchemeParameters;
use crate::rlwe::RlweScheme;
use crate::scheme::{EncryptionKey, HomomorphicScheme};
use crate::transport::{TimestampRange, Transport};

/// Client for one identity (one key store) and one service endpoint
pub struct ProtocolClient<T: Transport, S: HomomorphicScheme = RlweScheme> {
    transport: T,
    keys: KeyStore,
    _scheme: PhantomData<fn() -> S>,
}

impl<T: Transport> ProtocolClient<T, RlweScheme> {
    /// Client using the reference RLWE backend
    pub fn new(transport: T, keys: KeyStore) -> Self {
        Self::with_backend(transport, keys)
    }
}

impl<T: Transport, S: HomomorphicScheme> ProtocolClient<T, S> {
    /// Client using backend `S`
    pub fn with_backend(transport: T, keys: KeyStore) -> Self {
        Self {
            transport,
            keys,
            _scheme: PhantomData,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn key_store(&self) -> &KeyStore {
        &self.keys
    }

    /// Generate a fresh key pair and overwrite the key store's records
    ///
    /// Must not run concurrently with any other operation on the same store.
    pub fn generate_keys(&self, params: &SchemeParameters) -> Result<KeyPair<S>> {
        let scheme = S::new(params)?;
        let mut rng = ChaCha20Rng::from_entropy();
        self.keys.generate_and_persist(&scheme, &mut rng)
    }

    /// Encrypt `values` under the public key and upload them
    ///
    /// The server stores the row stamped with its arrival time. A timed-out
    /// upload may still have been stored; retrying can duplicate the row.
    pub fn write(&self, params: &SchemeParameters, values: &[u64]) -> Result<()> {
        let mut codec = CipherCodec::<S>::new(params)?;
        let plaintext = codec.encode_vector(values)?;
        let pair = self.keys.load(codec.scheme())?;

        let ciphertext = codec.encrypt(EncryptionKey::Public(&pair.public), &plaintext)?;
        let envelope = encode_ciphertext::<S>(params, &ciphertext)?;
        debug!("Uploading {} values ({} bytes)", values.len(), envelope.len());

        let ack = self.transport.upload(&envelope)?;
        info!("Uploaded row: {}", ack);
        Ok(())
    }

    /// Write each row in order, stopping at the first failure
    ///
    /// Not transactional: rows written before a failure stay on the server.
    /// Returns the number of rows written, or `PartialWrite` carrying that
    /// count and the failing row's error.
    pub fn write_many<I, V>(&self, params: &SchemeParameters, rows: I) -> Result<usize>
    where
        I: IntoIterator<Item = V>,
        V: AsRef<[u64]>,
    {
        let mut written = 0;
        for row in rows {
            if let Err(err) = self.write(params, row.as_ref()) {
                warn!("Bulk write stopped at row {}: {}", written + 1, err);
                return Err(Error::PartialWrite {
                    written,
                    source: Box::new(err),
                });
            }
            written += 1;
        }
        info!("Wrote {} rows", written);
        Ok(written)
    }

    /// Parse a bulk table file, then write its rows
    ///
    /// The whole file is parsed first; a malformed cell fails with `Parse`
    /// before any row is sent.
    pub fn write_from_file(&self, params: &SchemeParameters, path: impl AsRef<Path>) -> Result<usize> {
        let rows = bulk::load_file(path)?;
        self.write_many(params, &rows)
    }

    /// Ask the server for the sum of the rows stored in `[from, to)` and decrypt it
    ///
    /// The query carries the parameters and an encryption of zero under the
    /// secret key. The returned vector has full ring capacity; unused slots
    /// are 0. Which rows the server actually summed cannot be verified here.
    pub fn evaluate(&self, params: &SchemeParameters, from: i64, to: i64) -> Result<Vec<u64>> {
        let range = TimestampRange::new(from, to)?;
        let mut codec = CipherCodec::<S>::new(params)?;
        let pair = self.keys.load(codec.scheme())?;

        let zero = codec.encode_vector(&[])?;
        let credential = codec.encrypt(EncryptionKey::Secret(&pair.secret), &zero)?;
        let query = encode_query::<S>(params, &credential)?;
        debug!(
            "Evaluating [{}, {}) with a {} byte query",
            range.from,
            range.to,
            query.len()
        );

        let reply = self.transport.eval(&query, range)?;
        info!("files: {}", reply.message);

        let result = decode_ciphertext(codec.scheme(), &reply.result)?;
        Ok(codec.decrypt_vector(&pair.secret, &result))
    }
}
