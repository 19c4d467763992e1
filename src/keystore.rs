//! Key pair persistence
//!
//! A `KeyStore` is two file paths: one record for the secret key, one for the
//! public key. Both records are key envelopes tagged with the parameter
//! fingerprint and a random pair identifier drawn at generation time, so
//! `load` can refuse halves that were never generated together.
//!
//! `generate_and_persist` overwrites both records. Running it while another
//! caller is inside `load` (or mid-operation with a loaded pair) is unsafe.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use rand::{CryptoRng, RngCore};
use tracing::{debug, info};

use crate::envelope::{decode_key_record, encode_key_record, EnvelopeKind};
use crate::error::{Error, Result};
use crate::scheme::HomomorphicScheme;

pub const DEFAULT_SECRET_KEY_FILE: &str = "enc.sk";
pub const DEFAULT_PUBLIC_KEY_FILE: &str = "enc.pk";

const GENERATE_HINT: &str = "generate keys first";

/// Secret and public key generated together
pub struct KeyPair<S: HomomorphicScheme> {
    pub secret: S::SecretKey,
    pub public: S::PublicKey,
    id: [u8; 16],
}

impl<S: HomomorphicScheme> KeyPair<S> {
    /// Random identifier shared by both records of this pair
    pub fn id(&self) -> [u8; 16] {
        self.id
    }

    pub fn id_hex(&self) -> String {
        hex::encode(self.id)
    }
}

impl<S: HomomorphicScheme> Clone for KeyPair<S> {
    fn clone(&self) -> Self {
        Self {
            secret: self.secret.clone(),
            public: self.public.clone(),
            id: self.id,
        }
    }
}

impl<S: HomomorphicScheme> std::fmt::Debug for KeyPair<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("id", &self.id_hex())
            .finish_non_exhaustive()
    }
}

/// Location of the two key records
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyStore {
    secret_path: PathBuf,
    public_path: PathBuf,
}

impl KeyStore {
    pub fn new(secret_path: impl Into<PathBuf>, public_path: impl Into<PathBuf>) -> Self {
        Self {
            secret_path: secret_path.into(),
            public_path: public_path.into(),
        }
    }

    /// `dir/enc.sk` and `dir/enc.pk`
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self::new(
            dir.join(DEFAULT_SECRET_KEY_FILE),
            dir.join(DEFAULT_PUBLIC_KEY_FILE),
        )
    }

    pub fn secret_path(&self) -> &Path {
        &self.secret_path
    }

    pub fn public_path(&self) -> &Path {
        &self.public_path
    }

    /// True if both records are present (says nothing about their validity)
    pub fn exists(&self) -> bool {
        self.secret_path.is_file() && self.public_path.is_file()
    }

    /// Generate a fresh pair for `scheme` and overwrite both records
    pub fn generate_and_persist<S, R>(&self, scheme: &S, rng: &mut R) -> Result<KeyPair<S>>
    where
        S: HomomorphicScheme,
        R: RngCore + CryptoRng,
    {
        let (secret, public) = scheme.generate_key_pair(rng);
        let mut id = [0u8; 16];
        rng.fill_bytes(&mut id);

        let params = scheme.params();
        let sk_bytes = encode_key_record(EnvelopeKind::SecretKey, params, id, &secret)?;
        let pk_bytes = encode_key_record(EnvelopeKind::PublicKey, params, id, &public)?;

        write_record(&self.secret_path, &sk_bytes, true)?;
        write_record(&self.public_path, &pk_bytes, false)?;

        let pair = KeyPair { secret, public, id };
        info!(
            "Generated key pair {} ({} + {} bytes)",
            pair.id_hex(),
            sk_bytes.len(),
            pk_bytes.len()
        );
        debug!(
            secret = %self.secret_path.display(),
            public = %self.public_path.display(),
            "key records written"
        );
        Ok(pair)
    }

    /// Load both records, verifying they belong to one pair under `scheme`'s parameters
    pub fn load<S: HomomorphicScheme>(&self, scheme: &S) -> Result<KeyPair<S>> {
        let params = scheme.params();

        let sk_bytes = read_record(&self.secret_path)?;
        let (sk_id, secret): (_, S::SecretKey) =
            decode_key_record(EnvelopeKind::SecretKey, params, &sk_bytes)
                .map_err(|e| corrupt(&self.secret_path, e))?;
        scheme
            .check_secret_key(&secret)
            .map_err(|e| corrupt(&self.secret_path, e))?;

        let pk_bytes = read_record(&self.public_path)?;
        let (pk_id, public): (_, S::PublicKey) =
            decode_key_record(EnvelopeKind::PublicKey, params, &pk_bytes)
                .map_err(|e| corrupt(&self.public_path, e))?;
        scheme
            .check_public_key(&public)
            .map_err(|e| corrupt(&self.public_path, e))?;

        if sk_id != pk_id {
            return Err(Error::key_storage(
                &self.public_path,
                format!(
                    "public key belongs to pair {}, secret key to pair {}; {}",
                    hex::encode(pk_id),
                    hex::encode(sk_id),
                    GENERATE_HINT
                ),
            ));
        }

        debug!("Loaded key pair {}", hex::encode(sk_id));
        Ok(KeyPair {
            secret,
            public,
            id: sk_id,
        })
    }
}

fn corrupt(path: &Path, err: Error) -> Error {
    let reason = match err {
        Error::Serialization(msg) => msg,
        other => other.to_string(),
    };
    Error::key_storage(path, format!("unreadable key record ({}); {}", reason, GENERATE_HINT))
}

fn read_record(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => {
            Error::key_storage(path, format!("no key record; {}", GENERATE_HINT))
        }
        _ => Error::key_storage(path, e.to_string()),
    })
}

/// Write via a sibling temp file and rename, so a crash never leaves a torn record
fn write_record(path: &Path, bytes: &[u8], private: bool) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| Error::key_storage(parent, e.to_string()))?;
    }

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    let write = || -> io::Result<()> {
        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        if private {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        #[cfg(not(unix))]
        let _ = private;

        let mut file = options.open(&tmp_path)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        fs::rename(&tmp_path, path)
    };

    write().map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        Error::key_storage(path, e.to_string())
    })
}
