//! Signing seams implemented by key backends.

use std::rc::Rc;
use std::sync::Arc;

use crate::{SignError, VerifyError};

/// Produces signatures over canonical content.
pub trait Signer {
    /// Sign `content`, returning the raw (never empty) signature bytes.
    fn sign(&self, content: &[u8]) -> Result<Vec<u8>, SignError>;
}

/// Checks signatures over canonical content.
pub trait Verifier {
    /// Verify `signature` over `content`.
    ///
    /// There are three outcomes: `Ok(true)` for a valid signature, `Ok(false)` for a well
    /// formed signature that does not match, and `Err` when no verdict could be reached.
    /// Implementations must not fold provider errors into `Ok(false)`.
    fn verify(&self, content: &[u8], signature: &[u8]) -> Result<bool, VerifyError>;
}

macro_rules! forward {
    ($($ptr:ident),*) => {
        $(
            impl<T: Signer + ?Sized> Signer for $ptr<T> {
                fn sign(&self, content: &[u8]) -> Result<Vec<u8>, SignError> {
                    T::sign(self, content)
                }
            }

            impl<T: Verifier + ?Sized> Verifier for $ptr<T> {
                fn verify(&self, content: &[u8], signature: &[u8]) -> Result<bool, VerifyError> {
                    T::verify(self, content, signature)
                }
            }
        )*
    };
}

forward!(Box, Arc, Rc);

impl<T: Signer + ?Sized> Signer for &T {
    fn sign(&self, content: &[u8]) -> Result<Vec<u8>, SignError> {
        T::sign(self, content)
    }
}

impl<T: Verifier + ?Sized> Verifier for &T {
    fn verify(&self, content: &[u8], signature: &[u8]) -> Result<bool, VerifyError> {
        T::verify(self, content, signature)
    }
}
