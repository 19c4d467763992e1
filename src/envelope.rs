//! Canonical wire/storage framing
//!
//! Every envelope is a fixed header followed by a bincode payload:
//!
//! ```text
//! magic    4 bytes  "FHSV"
//! version  u16 LE   ENVELOPE_VERSION
//! kind     u8       EnvelopeKind
//! params   u64 LE   SchemeParameters::fingerprint() of the producer
//! length   u32 LE   payload length
//! payload  bincode  kind-specific body, exactly `length` bytes
//! ```
//!
//! Decoding checks magic, version, kind, parameter fingerprint and length
//! before touching the payload, then runs the backend's structural checks on
//! whatever was decoded. A ciphertext produced under other parameters is
//! rejected here rather than decrypted into a plausible-looking wrong vector.

use std::io::{Cursor, Read, Write};

use bincode::Options;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{ser_err, Error, Result};
use crate::params::SchemeParameters;
use crate::scheme::HomomorphicScheme;

pub const ENVELOPE_MAGIC: [u8; 4] = *b"FHSV";

/// Envelope format version
///
/// History:
/// - v1: initial layout
pub const ENVELOPE_VERSION: u16 = 1;

/// Header size in bytes
pub const HEADER_LEN: usize = 4 + 2 + 1 + 8 + 4;

/// Payload size cap (64 MiB), well above a d=8192 ciphertext
const MAX_PAYLOAD_LEN: u32 = 64 << 20;

/// What an envelope carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum EnvelopeKind {
    /// Bare ciphertext: uploads and aggregation results
    Ciphertext = 1,
    /// Scheme parameters plus the credential ciphertext
    Query = 2,
    /// Persisted secret key record
    SecretKey = 3,
    /// Persisted public key record
    PublicKey = 4,
}

impl TryFrom<u8> for EnvelopeKind {
    type Error = Error;

    fn try_from(tag: u8) -> Result<Self> {
        match tag {
            1 => Ok(Self::Ciphertext),
            2 => Ok(Self::Query),
            3 => Ok(Self::SecretKey),
            4 => Ok(Self::PublicKey),
            other => Err(ser_err!("unknown envelope kind {}", other)),
        }
    }
}

/// Parsed envelope header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvelopeHeader {
    pub version: u16,
    pub kind: EnvelopeKind,
    pub fingerprint: u64,
    pub length: u32,
}

impl EnvelopeHeader {
    /// Parse and sanity-check the header of `bytes`
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let mut cursor = Cursor::new(bytes);
        let truncated = |_: std::io::Error| ser_err!("truncated envelope header ({} bytes)", bytes.len());

        let mut magic = [0u8; 4];
        cursor.read_exact(&mut magic).map_err(truncated)?;
        if magic != ENVELOPE_MAGIC {
            return Err(ser_err!("bad envelope magic {:02x?}", magic));
        }
        let version = cursor.read_u16::<LittleEndian>().map_err(truncated)?;
        if version != ENVELOPE_VERSION {
            return Err(ser_err!(
                "unsupported envelope version {} (expected {})",
                version,
                ENVELOPE_VERSION
            ));
        }
        let kind = EnvelopeKind::try_from(cursor.read_u8().map_err(truncated)?)?;
        let fingerprint = cursor.read_u64::<LittleEndian>().map_err(truncated)?;
        let length = cursor.read_u32::<LittleEndian>().map_err(truncated)?;

        let remaining = bytes.len() - HEADER_LEN;
        if length as usize != remaining {
            return Err(ser_err!(
                "envelope declares {} payload bytes but carries {}",
                length,
                remaining
            ));
        }

        Ok(Self {
            version,
            kind,
            fingerprint,
            length,
        })
    }
}

fn payload_options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_little_endian()
        .with_limit(MAX_PAYLOAD_LEN as u64)
        .reject_trailing_bytes()
}

fn seal<T: Serialize>(kind: EnvelopeKind, fingerprint: u64, body: &T) -> Result<Vec<u8>> {
    let payload = payload_options().serialize(body)?;
    let length = u32::try_from(payload.len())
        .ok()
        .filter(|&len| len <= MAX_PAYLOAD_LEN)
        .ok_or_else(|| ser_err!("payload of {} bytes exceeds envelope limit", payload.len()))?;

    let mut out = Vec::with_capacity(HEADER_LEN + payload.len());
    out.write_all(&ENVELOPE_MAGIC)?;
    out.write_u16::<LittleEndian>(ENVELOPE_VERSION)?;
    out.write_u8(kind as u8)?;
    out.write_u64::<LittleEndian>(fingerprint)?;
    out.write_u32::<LittleEndian>(length)?;
    out.extend_from_slice(&payload);
    Ok(out)
}

/// Check the header against `kind` (and `fingerprint`, if given); return the payload
fn open<'a>(bytes: &'a [u8], kind: EnvelopeKind, fingerprint: Option<u64>) -> Result<(EnvelopeHeader, &'a [u8])> {
    let header = EnvelopeHeader::parse(bytes)?;
    if header.kind != kind {
        return Err(ser_err!(
            "expected {:?} envelope, got {:?}",
            kind,
            header.kind
        ));
    }
    if let Some(expected) = fingerprint {
        if header.fingerprint != expected {
            return Err(ser_err!(
                "scheme parameter mismatch: envelope fingerprint {:016x}, expected {:016x}",
                header.fingerprint,
                expected
            ));
        }
    }
    Ok((header, &bytes[HEADER_LEN..]))
}

fn decode_payload<T: DeserializeOwned>(payload: &[u8]) -> Result<T> {
    Ok(payload_options().deserialize(payload)?)
}

/// Encode a bare ciphertext (upload payload or aggregation result)
pub fn encode_ciphertext<S: HomomorphicScheme>(
    params: &SchemeParameters,
    ciphertext: &S::Ciphertext,
) -> Result<Vec<u8>> {
    seal(EnvelopeKind::Ciphertext, params.fingerprint(), ciphertext)
}

/// Decode a bare ciphertext produced under `scheme`'s parameters
pub fn decode_ciphertext<S: HomomorphicScheme>(scheme: &S, bytes: &[u8]) -> Result<S::Ciphertext> {
    let (_, payload) = open(
        bytes,
        EnvelopeKind::Ciphertext,
        Some(scheme.params().fingerprint()),
    )?;
    let ciphertext: S::Ciphertext = decode_payload(payload)?;
    scheme.check_ciphertext(&ciphertext)?;
    Ok(ciphertext)
}

#[derive(Serialize)]
struct QueryBodyRef<'a, C> {
    params: &'a SchemeParameters,
    credential: &'a C,
}

#[derive(Deserialize)]
struct QueryBody<C> {
    params: SchemeParameters,
    credential: C,
}

/// Encode a query: full parameters plus the credential ciphertext
pub fn encode_query<S: HomomorphicScheme>(
    params: &SchemeParameters,
    credential: &S::Ciphertext,
) -> Result<Vec<u8>> {
    let body = QueryBodyRef { params, credential };
    seal(EnvelopeKind::Query, params.fingerprint(), &body)
}

/// Decode a query envelope, instantiating the backend from the embedded parameters.
///
/// This is the receiving side's view; the client only ever encodes queries.
pub fn decode_query<S: HomomorphicScheme>(bytes: &[u8]) -> Result<(S, S::Ciphertext)> {
    let (header, payload) = open(bytes, EnvelopeKind::Query, None)?;
    let body: QueryBody<S::Ciphertext> = decode_payload(payload)?;
    if body.params.fingerprint() != header.fingerprint {
        return Err(ser_err!("query header fingerprint does not match embedded parameters"));
    }
    let scheme = S::new(&body.params).map_err(|e| ser_err!("query parameters rejected: {}", e))?;
    scheme.check_ciphertext(&body.credential)?;
    Ok((scheme, body.credential))
}

#[derive(Serialize)]
struct KeyRecordRef<'a, K> {
    pair_id: [u8; 16],
    key: &'a K,
}

#[derive(Deserialize)]
struct KeyRecord<K> {
    pair_id: [u8; 16],
    key: K,
}

/// Encode a key record tagged with the identifier of its pair
pub fn encode_key_record<K: Serialize>(
    kind: EnvelopeKind,
    params: &SchemeParameters,
    pair_id: [u8; 16],
    key: &K,
) -> Result<Vec<u8>> {
    debug_assert!(matches!(kind, EnvelopeKind::SecretKey | EnvelopeKind::PublicKey));
    seal(kind, params.fingerprint(), &KeyRecordRef { pair_id, key })
}

/// Decode a key record produced under `params`; returns `(pair_id, key)`
pub fn decode_key_record<K: DeserializeOwned>(
    kind: EnvelopeKind,
    params: &SchemeParameters,
    bytes: &[u8],
) -> Result<([u8; 16], K)> {
    let (_, payload) = open(bytes, kind, Some(params.fingerprint()))?;
    let record: KeyRecord<K> = decode_payload(payload)?;
    Ok((record.pair_id, record.key))
}
