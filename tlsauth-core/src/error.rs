//! Error taxonomy.
//!
//! Every stage of the issue and redeem pipelines reports its own tagged error. The
//! orchestrator surfaces the first failure unchanged, wrapped in [`Error`].

use std::fmt;
use std::io;

#[derive(Debug)]
#[non_exhaustive]
/// Error returned for all token operations that can fail
pub enum Error {
    /// The instance was configured with something the provider cannot do.
    Config(ConfigError),
    /// Key material could not be read or parsed.
    Key(KeyError),
    /// The token could not be signed.
    Sign(SignError),
    /// The token signature could not be verified, or it did not match.
    Verify(VerifyError),
    /// The token envelope could not be encoded or decoded.
    Codec(CodecError),
    /// The token has a valid signature but its lifetime has passed.
    Expired {
        /// Unix timestamp at which the token stopped being valid.
        expires_at: i64,
        /// Unix timestamp the token was checked against.
        now: i64,
    },
    /// The token was rejected by an additional validation.
    Rejected {
        /// Why the validation failed, as written by that validation.
        reason: String,
    },
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Config(x) => Some(x),
            Error::Key(x) => Some(x),
            Error::Sign(x) => Some(x),
            Error::Verify(x) => Some(x),
            Error::Codec(x) => Some(x),
            Error::Expired { .. } | Error::Rejected { .. } => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(_) => f.write_str("invalid token configuration"),
            Error::Key(_) => f.write_str("could not load the key"),
            Error::Sign(_) => f.write_str("could not sign the token"),
            Error::Verify(_) => f.write_str("token signature could not be validated"),
            Error::Codec(_) => f.write_str("could not process the token envelope"),
            Error::Expired { expires_at, now } => {
                write!(f, "token expired at {expires_at}, current time is {now}")
            }
            Error::Rejected { reason } => write!(f, "token rejected: {reason}"),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(value: ConfigError) -> Self {
        Error::Config(value)
    }
}

impl From<KeyError> for Error {
    fn from(value: KeyError) -> Self {
        Error::Key(value)
    }
}

impl From<SignError> for Error {
    fn from(value: SignError) -> Self {
        Error::Sign(value)
    }
}

impl From<VerifyError> for Error {
    fn from(value: VerifyError) -> Self {
        Error::Verify(value)
    }
}

impl From<CodecError> for Error {
    fn from(value: CodecError) -> Self {
        Error::Codec(value)
    }
}

#[derive(Debug)]
#[non_exhaustive]
/// Construction-time configuration errors.
pub enum ConfigError {
    /// The requested digest algorithm is not supported.
    UnsupportedDigest(String),
    /// The configuration document could not be parsed.
    Malformed(serde_json::Error),
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Malformed(x) => Some(x),
            ConfigError::UnsupportedDigest(_) => None,
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::UnsupportedDigest(name) => {
                write!(f, "digest algorithm {name:?} is not supported")
            }
            ConfigError::Malformed(x) => write!(f, "malformed configuration: {x}"),
        }
    }
}

#[derive(Debug)]
#[non_exhaustive]
pub enum KeyError {
    /// The key material could not be read from its source.
    Unreadable(io::Error),
    /// The key material was read but is not a usable key.
    Invalid(String),
}

impl std::error::Error for KeyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            KeyError::Unreadable(x) => Some(x),
            KeyError::Invalid(_) => None,
        }
    }
}

impl fmt::Display for KeyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyError::Unreadable(x) => write!(f, "key material could not be read: {x}"),
            KeyError::Invalid(reason) => write!(f, "invalid key material: {reason}"),
        }
    }
}

#[derive(Debug)]
#[non_exhaustive]
pub enum SignError {
    /// No private key is loaded.
    MissingKey,
    /// There was no content to sign.
    EmptyInput,
    /// The signing primitive failed.
    ProviderFailure(String),
}

impl std::error::Error for SignError {}

impl fmt::Display for SignError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignError::MissingKey => f.write_str("no private key is loaded"),
            SignError::EmptyInput => f.write_str("refusing to sign empty content"),
            SignError::ProviderFailure(x) => write!(f, "signing failed: {x}"),
        }
    }
}

#[derive(Debug)]
#[non_exhaustive]
/// Signature verification errors.
///
/// [`VerifyError::ProviderFailure`] means the verifier could not reach a verdict, which is
/// not evidence of tampering. [`VerifyError::InvalidSignature`] means it did, and the
/// signature does not match.
pub enum VerifyError {
    /// No public key is loaded.
    MissingKey,
    /// The verification primitive failed, e.g. on a malformed signature.
    ProviderFailure(String),
    /// The signature is well formed but does not match the content.
    InvalidSignature,
}

impl std::error::Error for VerifyError {}

impl fmt::Display for VerifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerifyError::MissingKey => f.write_str("no public key is loaded"),
            VerifyError::ProviderFailure(x) => write!(f, "verification failed: {x}"),
            VerifyError::InvalidSignature => f.write_str("signature does not match"),
        }
    }
}

#[derive(Debug)]
#[non_exhaustive]
/// Errors from the envelope codec, tagged by pipeline stage.
pub enum CodecError {
    SerializeFailure(serde_json::Error),
    CompressFailure(io::Error),
    EncodeFailure,
    /// The token (or its signature field) is not valid base64.
    DecodeFailure,
    DecompressFailure(io::Error),
    ParseFailure(serde_json::Error),
    /// A required envelope field was absent.
    MissingField(&'static str),
}

impl std::error::Error for CodecError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CodecError::SerializeFailure(x) | CodecError::ParseFailure(x) => Some(x),
            CodecError::CompressFailure(x) | CodecError::DecompressFailure(x) => Some(x),
            CodecError::EncodeFailure | CodecError::DecodeFailure | CodecError::MissingField(_) => {
                None
            }
        }
    }
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::SerializeFailure(x) => write!(f, "could not serialize envelope: {x}"),
            CodecError::CompressFailure(x) => write!(f, "could not compress envelope: {x}"),
            CodecError::EncodeFailure => f.write_str("could not encode the token"),
            CodecError::DecodeFailure => f.write_str("the token could not be base64 decoded"),
            CodecError::DecompressFailure(x) => write!(f, "could not decompress envelope: {x}"),
            CodecError::ParseFailure(x) => write!(f, "could not parse envelope: {x}"),
            CodecError::MissingField(name) => write!(f, "envelope is missing field {name:?}"),
        }
    }
}
