use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde::de::DeserializeOwned;
use tlsauth_rsa::{KeyStore, PrivateKey, PublicKey};

pub const PRIVATE_PEM: &str = include_str!("../keys/private.pem");
pub const PRIVATE_PKCS1_PEM: &str = include_str!("../keys/private_pkcs1.pem");
pub const PUBLIC_PEM: &str = include_str!("../keys/public.pem");
pub const PUBLIC_PKCS1_PEM: &str = include_str!("../keys/public_pkcs1.pem");
pub const OTHER_PRIVATE_PEM: &str = include_str!("../keys/other_private.pem");
pub const OTHER_PUBLIC_PEM: &str = include_str!("../keys/other_public.pem");
/// A 1024 bit key, below the accepted minimum.
pub const WEAK_PRIVATE_PEM: &str = include_str!("../keys/weak_private.pem");
/// A P-256 key, not RSA.
pub const EC_PRIVATE_PEM: &str = include_str!("../keys/ec_private.pem");

/// Path of a file in the fixture key directory.
pub fn key_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("keys").join(name)
}

pub fn private_key() -> PrivateKey {
    PrivateKey::from_pem(PRIVATE_PEM).unwrap()
}

pub fn public_key() -> PublicKey {
    PublicKey::from_pem(PUBLIC_PEM).unwrap()
}

/// The fixture keypair with the given digest.
pub fn key_store(digest: &str) -> KeyStore {
    KeyStore::new(digest)
        .unwrap()
        .with_private_key(private_key())
        .with_public_key(public_key())
}

pub fn read_test<Test: DeserializeOwned>(v: &str) -> TestFile<Test> {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/vectors")
        .join(v);
    let file = std::fs::read_to_string(path).unwrap();
    serde_json::from_str(&file).unwrap()
}

#[derive(Deserialize)]
pub struct TestFile<T> {
    pub tests: Vec<Test<T>>,
}

#[derive(Deserialize)]
pub struct Test<T> {
    pub name: String,
    #[serde(flatten)]
    pub test_data: T,
}

/// Only deserializes from the boolean `B`, for telling untagged variants apart.
#[derive(Debug)]
pub struct Bool<const B: bool>;

impl<'a, const B: bool> Deserialize<'a> for Bool<B> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'a>,
    {
        let v = bool::deserialize(deserializer)?;
        (v == B)
            .then_some(Bool)
            .ok_or_else(|| serde::de::Error::custom(format!("expected {B}, got {v}")))
    }
}
