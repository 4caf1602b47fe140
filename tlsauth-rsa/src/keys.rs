use core::fmt;
use std::path::Path;

use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey};
use rsa::pkcs8::DecodePrivateKey;
use rsa::pkcs8::LineEnding;
use rsa::pkcs8::spki::{DecodePublicKey, EncodePublicKey};
use rsa::traits::PublicKeyParts;
use tlsauth_core::KeyError;

/// Smallest modulus accepted when loading or generating keys.
pub const MIN_MODULUS_BITS: usize = 2048;

/// An RSA private key, used to issue tokens.
#[derive(Clone)]
pub struct PrivateKey(pub(crate) rsa::RsaPrivateKey);

/// An RSA public key, used to redeem tokens.
#[derive(Clone, PartialEq, Eq)]
pub struct PublicKey(pub(crate) rsa::RsaPublicKey);

impl PrivateKey {
    /// Parse a PKCS#8 or PKCS#1 private key, DER or PEM encoded.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        let key = if let Ok(key) = rsa::RsaPrivateKey::from_pkcs8_der(bytes) {
            key
        } else if let Ok(key) = rsa::RsaPrivateKey::from_pkcs1_der(bytes) {
            key
        } else {
            let s = pem_text(bytes)?;
            if let Ok(key) = rsa::RsaPrivateKey::from_pkcs8_pem(s) {
                key
            } else {
                rsa::RsaPrivateKey::from_pkcs1_pem(s)
                    .map_err(|_| KeyError::Invalid("not an RSA private key".to_owned()))?
            }
        };

        check_size(key.n().bits())?;
        tracing::debug!(bits = key.n().bits(), "loaded private key");
        Ok(Self(key))
    }

    pub fn from_pem(pem: &str) -> Result<Self, KeyError> {
        Self::from_bytes(pem.as_bytes())
    }

    /// Read and parse a private key file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, KeyError> {
        let bytes = std::fs::read(path).map_err(KeyError::Unreadable)?;
        Self::from_bytes(&bytes)
    }

    /// Generate a new key with a `bits` sized modulus.
    pub fn random(bits: usize) -> Result<Self, KeyError> {
        use rsa::rand_core::OsRng;

        check_size(bits)?;
        rsa::RsaPrivateKey::new(&mut OsRng, bits)
            .map_err(|e| KeyError::Invalid(e.to_string()))
            .map(Self)
    }

    /// The matching public key.
    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.0.to_public_key())
    }

    pub fn bits(&self) -> usize {
        self.0.n().bits()
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("bits", &self.bits())
            .finish_non_exhaustive()
    }
}

impl PublicKey {
    /// Parse an SPKI or PKCS#1 public key, DER or PEM encoded.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        let key = if let Ok(key) = rsa::RsaPublicKey::from_public_key_der(bytes) {
            key
        } else if let Ok(key) = rsa::RsaPublicKey::from_pkcs1_der(bytes) {
            key
        } else {
            let s = pem_text(bytes)?;
            if let Ok(key) = rsa::RsaPublicKey::from_public_key_pem(s) {
                key
            } else {
                rsa::RsaPublicKey::from_pkcs1_pem(s)
                    .map_err(|_| KeyError::Invalid("not an RSA public key".to_owned()))?
            }
        };

        check_size(key.n().bits())?;
        tracing::debug!(bits = key.n().bits(), "loaded public key");
        Ok(Self(key))
    }

    pub fn from_pem(pem: &str) -> Result<Self, KeyError> {
        Self::from_bytes(pem.as_bytes())
    }

    /// Read and parse a public key file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, KeyError> {
        let bytes = std::fs::read(path).map_err(KeyError::Unreadable)?;
        Self::from_bytes(&bytes)
    }

    /// Export as an SPKI PEM document.
    pub fn to_pem(&self) -> String {
        self.0
            .to_public_key_pem(LineEnding::LF)
            .expect("encoding to spki pem should succeed")
    }

    pub fn bits(&self) -> usize {
        self.0.n().bits()
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublicKey")
            .field("bits", &self.bits())
            .finish_non_exhaustive()
    }
}

fn pem_text(bytes: &[u8]) -> Result<&str, KeyError> {
    if bytes.trim_ascii().is_empty() {
        return Err(KeyError::Unreadable(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "key material is empty",
        )));
    }

    str::from_utf8(bytes)
        .map(str::trim)
        .map_err(|_| KeyError::Invalid("key material is neither DER nor PEM".to_owned()))
}

fn check_size(bits: usize) -> Result<(), KeyError> {
    if bits < MIN_MODULUS_BITS {
        return Err(KeyError::Invalid(format!(
            "{bits} bit modulus is below the {MIN_MODULUS_BITS} bit minimum"
        )));
    }
    Ok(())
}
