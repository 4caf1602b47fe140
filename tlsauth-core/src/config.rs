//! Construction-time configuration.
//!
//! ```
//! use tlsauth_core::config::{Config, KeySource};
//! use tlsauth_core::DigestAlgorithm;
//!
//! let config = Config::from_json(r#"{
//!     "digest_algorithm": "sha384",
//!     "public_key_material": { "path": "/etc/tlsauth/public.pem" }
//! }"#).unwrap();
//!
//! assert_eq!(config.digest().unwrap(), DigestAlgorithm::Sha384);
//! assert!(config.private_key_material.is_none());
//! assert!(matches!(config.public_key_material, Some(KeySource::Path(_))));
//! ```

use std::path::PathBuf;

use serde::Deserialize;

use crate::{ConfigError, DigestAlgorithm, KeyError};

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Digest paired with the signature scheme, `sha256` unless set.
    #[serde(default = "default_digest")]
    pub digest_algorithm: String,
    /// Required to issue tokens.
    #[serde(default)]
    pub private_key_material: Option<KeySource>,
    /// Required to redeem tokens.
    #[serde(default)]
    pub public_key_material: Option<KeySource>,
}

fn default_digest() -> String {
    DigestAlgorithm::default().name().to_owned()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            digest_algorithm: default_digest(),
            private_key_material: None,
            public_key_material: None,
        }
    }
}

impl Config {
    pub fn from_json(s: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(s).map_err(ConfigError::Malformed)
    }

    /// Resolve the configured digest name.
    pub fn digest(&self) -> Result<DigestAlgorithm, ConfigError> {
        self.digest_algorithm.parse()
    }
}

/// Where key material comes from.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeySource {
    /// Inline PEM text.
    Pem(String),
    /// A file holding PEM or DER key material.
    Path(PathBuf),
}

impl KeySource {
    /// Read the key material. Files are opened, read and closed within this call.
    pub fn read(&self) -> Result<Vec<u8>, KeyError> {
        match self {
            KeySource::Pem(pem) => Ok(pem.as_bytes().to_vec()),
            KeySource::Path(path) => std::fs::read(path).map_err(KeyError::Unreadable),
        }
    }
}
