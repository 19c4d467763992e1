//! Client configuration file
//!
//! JSON, every field optional:
//!
//! ```json
//! {
//!   "server_url": "http://localhost:8080",
//!   "token": "secret-token",
//!   "deadline_secs": 20,
//!   "secret_key_path": "enc.sk",
//!   "public_key_path": "enc.pk",
//!   "params": "d2048"
//! }
//! ```
//!
//! `params` is either a preset name or a full `SchemeParameters` object.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::client::ProtocolClient;
use crate::error::{Error, Result};
use crate::keystore::{KeyStore, DEFAULT_PUBLIC_KEY_FILE, DEFAULT_SECRET_KEY_FILE};
use crate::params::{ParamsPreset, SchemeParameters};
use crate::transport::{HttpTransport, DEFAULT_DEADLINE};

/// Preset name or explicit parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamsSource {
    Preset(ParamsPreset),
    Explicit(SchemeParameters),
}

impl Default for ParamsSource {
    fn default() -> Self {
        Self::Preset(ParamsPreset::default())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub server_url: String,
    pub token: String,
    pub deadline_secs: u64,
    pub secret_key_path: PathBuf,
    pub public_key_path: PathBuf,
    pub params: ParamsSource,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:8080".to_string(),
            token: String::new(),
            deadline_secs: DEFAULT_DEADLINE.as_secs(),
            secret_key_path: PathBuf::from(DEFAULT_SECRET_KEY_FILE),
            public_key_path: PathBuf::from(DEFAULT_PUBLIC_KEY_FILE),
            params: ParamsSource::default(),
        }
    }
}

impl ClientConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(|e| Error::Serialization(e.to_string()))
    }

    pub fn deadline(&self) -> Duration {
        Duration::from_secs(self.deadline_secs)
    }

    pub fn key_store(&self) -> KeyStore {
        KeyStore::new(&self.secret_key_path, &self.public_key_path)
    }

    /// Resolved and validated scheme parameters
    pub fn scheme_parameters(&self) -> Result<SchemeParameters> {
        let params = match &self.params {
            ParamsSource::Preset(preset) => preset.parameters(),
            ParamsSource::Explicit(params) => params.clone(),
        };
        params.validate()?;
        Ok(params)
    }

    pub fn transport(&self) -> Result<HttpTransport> {
        HttpTransport::with_deadline(self.server_url.clone(), &self.token, self.deadline())
    }

    /// HTTP client with this configuration's endpoint, credential and key store
    pub fn client(&self) -> Result<ProtocolClient<HttpTransport>> {
        Ok(ProtocolClient::new(self.transport()?, self.key_store()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_uses_defaults() {
        let config: ClientConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.deadline(), Duration::from_secs(20));
        assert_eq!(config.key_store().secret_path(), Path::new("enc.sk"));
        assert_eq!(config.scheme_parameters().unwrap().ring_dim, 2048);
    }

    #[test]
    fn test_preset_by_name() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"params": "d4096", "deadline_secs": 3}"#).unwrap();
        assert_eq!(config.scheme_parameters().unwrap().ring_dim, 4096);
        assert_eq!(config.deadline(), Duration::from_secs(3));
    }

    #[test]
    fn test_explicit_parameters() {
        let explicit = SchemeParameters {
            ring_dim: 1024,
            ..SchemeParameters::default()
        };
        let json = serde_json::json!({ "params": explicit });
        let config: ClientConfig = serde_json::from_value(json).unwrap();
        assert_eq!(config.scheme_parameters().unwrap(), explicit);
    }

    #[test]
    fn test_invalid_explicit_parameters_rejected() {
        let bad = SchemeParameters {
            ring_dim: 1000,
            ..SchemeParameters::default()
        };
        let config = ClientConfig {
            params: ParamsSource::Explicit(bad),
            ..ClientConfig::default()
        };
        assert!(matches!(
            config.scheme_parameters(),
            Err(Error::Parameters(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("client.json");
        std::fs::write(&path, r#"{"server_url": "http://agg:9000", "token": "abc"}"#).unwrap();

        let config = ClientConfig::load(&path).unwrap();
        assert_eq!(config.server_url, "http://agg:9000");
        assert_eq!(config.token, "abc");
        assert_eq!(config.transport().unwrap().base_url(), "http://agg:9000");
    }
}
