use digest::Digest;
use rsa::BigUint;
use rsa::Pkcs1v15Sign;
use rsa::traits::PublicKeyParts;
use tlsauth_core::config::Config;
use tlsauth_core::{ConfigError, DigestAlgorithm, Error, SignError, Signer, VerifyError, Verifier};

use crate::keys::{PrivateKey, PublicKey};

/// The keys and digest of one token authority.
///
/// Either key may be absent. Issuing needs the private key and redeeming needs the public
/// key; a missing key is reported when the operation is attempted.
#[derive(Clone, Debug)]
pub struct KeyStore {
    private_key: Option<PrivateKey>,
    public_key: Option<PublicKey>,
    digest: DigestAlgorithm,
}

impl KeyStore {
    /// An empty store signing with the named digest.
    pub fn new(digest: &str) -> Result<Self, ConfigError> {
        let digest: DigestAlgorithm = digest.parse()?;
        Self::with_digest(digest)
    }

    pub fn with_digest(digest: DigestAlgorithm) -> Result<Self, ConfigError> {
        if prehash(digest, b"").is_none() {
            return Err(ConfigError::UnsupportedDigest(digest.name().to_owned()));
        }
        Ok(Self {
            private_key: None,
            public_key: None,
            digest,
        })
    }

    pub fn with_private_key(mut self, key: PrivateKey) -> Self {
        self.private_key = Some(key);
        self
    }

    pub fn with_public_key(mut self, key: PublicKey) -> Self {
        self.public_key = Some(key);
        self
    }

    /// Build a store from configuration, reading any configured key material.
    pub fn from_config(config: &Config) -> Result<Self, Error> {
        let mut store = Self::with_digest(config.digest()?)?;
        if let Some(source) = &config.private_key_material {
            store.private_key = Some(PrivateKey::from_bytes(&source.read()?)?);
        }
        if let Some(source) = &config.public_key_material {
            store.public_key = Some(PublicKey::from_bytes(&source.read()?)?);
        }
        Ok(store)
    }

    pub fn digest(&self) -> DigestAlgorithm {
        self.digest
    }

    pub fn private_key(&self) -> Option<&PrivateKey> {
        self.private_key.as_ref()
    }

    pub fn public_key(&self) -> Option<&PublicKey> {
        self.public_key.as_ref()
    }
}

/// The PKCS#1 v1.5 scheme for `digest`, and `content` hashed with it.
fn prehash(digest: DigestAlgorithm, content: &[u8]) -> Option<(Pkcs1v15Sign, Vec<u8>)> {
    let pair = match digest {
        DigestAlgorithm::Sha224 => (
            Pkcs1v15Sign::new::<sha2::Sha224>(),
            sha2::Sha224::digest(content).to_vec(),
        ),
        DigestAlgorithm::Sha256 => (
            Pkcs1v15Sign::new::<sha2::Sha256>(),
            sha2::Sha256::digest(content).to_vec(),
        ),
        DigestAlgorithm::Sha384 => (
            Pkcs1v15Sign::new::<sha2::Sha384>(),
            sha2::Sha384::digest(content).to_vec(),
        ),
        DigestAlgorithm::Sha512 => (
            Pkcs1v15Sign::new::<sha2::Sha512>(),
            sha2::Sha512::digest(content).to_vec(),
        ),
        _ => return None,
    };
    Some(pair)
}

impl Signer for KeyStore {
    fn sign(&self, content: &[u8]) -> Result<Vec<u8>, SignError> {
        let key = self.private_key.as_ref().ok_or(SignError::MissingKey)?;
        if content.is_empty() {
            return Err(SignError::EmptyInput);
        }

        let (scheme, hashed) = prehash(self.digest, content)
            .ok_or_else(|| SignError::ProviderFailure(format!("{} is unavailable", self.digest)))?;
        let signature = key
            .0
            .sign(scheme, &hashed)
            .map_err(|e| SignError::ProviderFailure(e.to_string()))?;

        if signature.is_empty() {
            return Err(SignError::ProviderFailure("empty signature".to_owned()));
        }
        Ok(signature)
    }
}

impl Verifier for KeyStore {
    fn verify(&self, content: &[u8], signature: &[u8]) -> Result<bool, VerifyError> {
        let key = &self.public_key.as_ref().ok_or(VerifyError::MissingKey)?.0;

        // malformed signatures never reach the primitive, which would call them a mismatch
        if signature.len() != key.size() {
            return Err(VerifyError::ProviderFailure(format!(
                "signature is {} bytes, expected {}",
                signature.len(),
                key.size()
            )));
        }
        if BigUint::from_bytes_be(signature) >= *key.n() {
            return Err(VerifyError::ProviderFailure(
                "signature is not below the modulus".to_owned(),
            ));
        }

        let (scheme, hashed) = prehash(self.digest, content).ok_or_else(|| {
            VerifyError::ProviderFailure(format!("{} is unavailable", self.digest))
        })?;
        match key.verify(scheme, &hashed, signature) {
            Ok(()) => Ok(true),
            Err(rsa::Error::Verification) => Ok(false),
            Err(e) => Err(VerifyError::ProviderFailure(e.to_string())),
        }
    }
}
