//! Self-contained, tamper-evident data tokens.
//!
//! A token carries an opaque string payload together with its issue time and lifetime,
//! signed with an asymmetric key so that anyone holding the public key can check it was
//! not altered. Nothing is stored server side.
//!
//! This crate holds the token format and the issue/redeem pipelines. Signature schemes plug
//! in through the [`Signer`] and [`Verifier`] traits.
#![forbid(unsafe_code)]

pub mod base64;
pub mod canonical;
pub mod clock;
pub mod config;
pub mod digest;
pub mod envelope;
mod error;
pub mod key;
pub mod tokens;
pub mod validation;

pub use clock::{Clock, ManualClock, SystemClock};
pub use digest::DigestAlgorithm;
pub use envelope::Token;
pub use error::{CodecError, ConfigError, Error, KeyError, SignError, VerifyError};
pub use key::{Signer, Verifier};
pub use tokens::{TokenAuthority, VerifiedToken};
