//! Issuing and redeeming tokens.

use serde::Serialize;

use crate::clock::{Clock, SystemClock};
use crate::envelope::{self, Envelope, Token};
use crate::key::{Signer, Verifier};
use crate::validation::{Expiry, Validate};
use crate::{Error, VerifyError};

/// The contents of a token whose signature and lifetime have been checked.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct VerifiedToken {
    /// The payload the token was issued for
    pub data: String,
    /// Unix timestamp the token was issued at
    pub issued_at: i64,
    /// Lifetime in seconds, 0 if the token never expires
    pub expire_after: u64,
}

impl VerifiedToken {
    /// When the token stops being valid, `None` if it never does.
    pub fn expires_at(&self) -> Option<i64> {
        (self.expire_after != 0).then(|| self.issued_at.saturating_add_unsigned(self.expire_after))
    }
}

/// Issues and redeems tokens with one set of keys.
///
/// The keys are only ever read, so an authority can be shared between threads as long as
/// `K` and `C` allow it. No state is kept between calls.
#[derive(Clone, Debug)]
pub struct TokenAuthority<K, C = SystemClock> {
    keys: K,
    clock: C,
}

impl<K> TokenAuthority<K> {
    pub fn new(keys: K) -> Self {
        Self {
            keys,
            clock: SystemClock,
        }
    }
}

impl<K, C> TokenAuthority<K, C> {
    /// Replace the time source.
    pub fn with_clock<C2: Clock>(self, clock: C2) -> TokenAuthority<K, C2> {
        TokenAuthority {
            keys: self.keys,
            clock,
        }
    }

    pub fn keys(&self) -> &K {
        &self.keys
    }
}

impl<K: Signer, C: Clock> TokenAuthority<K, C> {
    /// Issue a token for `data` that stays valid for `ttl` seconds, or forever if `ttl` is 0.
    #[tracing::instrument(level = "debug", skip_all, fields(ttl = ttl))]
    pub fn issue(&self, data: &str, ttl: u64) -> Result<Token, Error> {
        let issued_at = self.clock.now();

        let content = crate::canonical::canonicalize(data, ttl, issued_at);
        let signature = self.keys.sign(&content)?;

        let token = Envelope {
            data: data.to_owned(),
            expire_after: ttl,
            issued_at,
            signature,
        }
        .encode()?;

        tracing::debug!(issued_at, len = token.as_str().len(), "issued token");
        Ok(token)
    }
}

impl<K: Verifier, C: Clock> TokenAuthority<K, C> {
    /// Check a token's signature and lifetime, and return its contents.
    pub fn redeem(&self, token: &str) -> Result<VerifiedToken, Error> {
        self.redeem_with(token, &[] as &[Expiry])
    }

    /// Like [`TokenAuthority::redeem`], then also apply `validation` to the contents.
    ///
    /// The lifetime is always checked first.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn redeem_with<V>(&self, token: &str, validation: &V) -> Result<VerifiedToken, Error>
    where
        V: Validate<Claims = VerifiedToken> + ?Sized,
    {
        let now = self.clock.now();
        match self.redeem_at(token, now, validation) {
            Ok(verified) => {
                tracing::debug!(
                    issued_at = verified.issued_at,
                    expire_after = verified.expire_after,
                    "redeemed token"
                );
                Ok(verified)
            }
            Err(err) => {
                if let Error::Verify(VerifyError::ProviderFailure(detail)) = &err {
                    tracing::warn!(detail = %detail, "signature verifier failed");
                } else {
                    tracing::debug!(error = %err, "rejected token");
                }
                Err(err)
            }
        }
    }

    fn redeem_at<V>(&self, token: &str, now: i64, validation: &V) -> Result<VerifiedToken, Error>
    where
        V: Validate<Claims = VerifiedToken> + ?Sized,
    {
        let untrusted = envelope::decode(token)?;

        let content = untrusted.canonical();
        let signature = untrusted.signature()?;
        if !self.keys.verify(&content, &signature)? {
            return Err(VerifyError::InvalidSignature.into());
        }

        let claims = VerifiedToken {
            data: untrusted.data,
            issued_at: untrusted.issued_at,
            expire_after: untrusted.expire_after,
        };

        Expiry::at(now).validate(&claims)?;
        validation.validate(&claims)?;

        Ok(claims)
    }
}
