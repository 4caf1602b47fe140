//! RSA signed data tokens (RustCrypto)
//!
//! ```
//! use tlsauth_rsa::{KeyStore, PrivateKey, TokenAuthority};
//!
//! // create a new keypair
//! let private_key = PrivateKey::random(2048).unwrap();
//! let public_key = private_key.public_key();
//!
//! // the issuer only needs the private key
//! let issuer = TokenAuthority::new(
//!     KeyStore::new("sha256").unwrap().with_private_key(private_key),
//! );
//! let token = issuer.issue("user=42", 3600).unwrap();
//!
//! // ...
//!
//! // the verifier only needs the public key
//! let verifier = TokenAuthority::new(
//!     KeyStore::new("sha256").unwrap().with_public_key(public_key),
//! );
//! let verified = verifier.redeem(token.as_str()).unwrap();
//! assert_eq!(verified.data, "user=42");
//! ```
#![forbid(unsafe_code)]

mod keys;
mod store;

pub use keys::{MIN_MODULUS_BITS, PrivateKey, PublicKey};
pub use store::KeyStore;
pub use tlsauth_core::Error;

/// A [`tlsauth_core::TokenAuthority`] backed by RSA keys.
pub type TokenAuthority<C = tlsauth_core::SystemClock> = tlsauth_core::TokenAuthority<KeyStore, C>;
