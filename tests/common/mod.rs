//! In-memory stand-in for the aggregation service
#![allow(dead_code)]

use std::sync::Mutex;

use fhesrv::envelope::{decode_ciphertext, decode_query, encode_ciphertext, EnvelopeHeader, EnvelopeKind};
use fhesrv::params::SchemeParameters;
use fhesrv::transport::{EvalReply, TimestampRange};
use fhesrv::{Error, HomomorphicScheme, Result, RlweScheme};

pub fn small_params() -> SchemeParameters {
    SchemeParameters {
        ring_dim: 256,
        ..SchemeParameters::default()
    }
}

/// Stores uploaded envelopes stamped with a logical clock and sums them on request
#[derive(Default)]
pub struct Aggregator {
    inner: Mutex<State>,
}

#[derive(Default)]
struct State {
    clock: i64,
    rows: Vec<(i64, Vec<u8>)>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Timestamp the next upload will receive
    pub fn set_clock(&self, timestamp: i64) {
        self.inner.lock().unwrap().clock = timestamp;
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().rows.len()
    }

    /// Stored envelopes in arrival order
    pub fn uploads(&self) -> Vec<Vec<u8>> {
        let state = self.inner.lock().unwrap();
        state.rows.iter().map(|(_, bytes)| bytes.clone()).collect()
    }

    pub fn store(&self, envelope: &[u8]) -> Result<String> {
        let header = EnvelopeHeader::parse(envelope)?;
        if header.kind != EnvelopeKind::Ciphertext {
            return Err(Error::Serialization(format!("unexpected {:?}", header.kind)));
        }
        let mut state = self.inner.lock().unwrap();
        let timestamp = state.clock;
        state.clock += 1;
        state.rows.push((timestamp, envelope.to_vec()));
        Ok(format!("stored at {}", timestamp))
    }

    /// Sum every stored row in `range`, seeded with the query's credential
    pub fn evaluate(&self, query: &[u8], range: TimestampRange) -> Result<EvalReply> {
        let (scheme, credential) = decode_query::<RlweScheme>(query)?;
        let state = self.inner.lock().unwrap();

        let mut acc = credential;
        let mut count = 0;
        for (timestamp, bytes) in &state.rows {
            if range.contains(*timestamp) {
                let ct = decode_ciphertext(&scheme, bytes)?;
                acc = scheme.add(&acc, &ct);
                count += 1;
            }
        }

        Ok(EvalReply {
            message: format!("{} files", count),
            result: encode_ciphertext::<RlweScheme>(scheme.params(), &acc)?,
        })
    }
}
