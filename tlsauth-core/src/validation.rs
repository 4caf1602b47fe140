use std::rc::Rc;
use std::sync::Arc;

use crate::Error;
use crate::tokens::VerifiedToken;

/// Whether a token issued at `issued_at` with lifetime `expire_after` is still valid at `now`.
///
/// `expire_after == 0` means the token never expires. Otherwise the token is valid up to and
/// including the second `issued_at + expire_after`. No clock skew tolerance is applied.
pub fn is_valid(issued_at: i64, expire_after: u64, now: i64) -> bool {
    expire_after == 0 || issued_at.saturating_add_unsigned(expire_after) >= now
}

pub trait Validate {
    /// The type of claim that can be validated
    type Claims;

    /// The validation to perform on the claims
    fn validate(&self, claims: &Self::Claims) -> Result<(), Error>;

    /// Extend the validation with another validation.
    fn then<V>(self, other: V) -> impl Validate<Claims = Self::Claims>
    where
        Self: Sized,
        V: Validate<Claims = Self::Claims>,
    {
        ValidateThen(self, other)
    }
}

/// Rejects tokens past their lifetime.
pub struct Expiry {
    now: i64,
}

impl Expiry {
    pub fn at(now: i64) -> Self {
        Self { now }
    }
}

impl Validate for Expiry {
    type Claims = VerifiedToken;

    fn validate(&self, claims: &Self::Claims) -> Result<(), Error> {
        if is_valid(claims.issued_at, claims.expire_after, self.now) {
            return Ok(());
        }

        Err(Error::Expired {
            expires_at: claims.issued_at.saturating_add_unsigned(claims.expire_after),
            now: self.now,
        })
    }
}

/// Rejects tokens issued more than `max_age` seconds before `now`, whatever their own
/// lifetime says.
pub struct MaxAge {
    now: i64,
    max_age: u64,
}

impl MaxAge {
    pub fn at(now: i64, max_age: u64) -> Self {
        Self { now, max_age }
    }
}

impl Validate for MaxAge {
    type Claims = VerifiedToken;

    fn validate(&self, claims: &Self::Claims) -> Result<(), Error> {
        if claims.issued_at.saturating_add_unsigned(self.max_age) >= self.now {
            return Ok(());
        }

        Err(Error::Rejected {
            reason: format!(
                "issued at {} which is more than {}s before {}",
                claims.issued_at, self.max_age, self.now
            ),
        })
    }
}

struct ValidateThen<T, U>(T, U);

impl<T: Validate, U: Validate<Claims = T::Claims>> Validate for ValidateThen<T, U> {
    type Claims = T::Claims;

    fn validate(&self, claims: &Self::Claims) -> Result<(), Error> {
        self.0.validate(claims)?;
        self.1.validate(claims)
    }
}

impl<T: Validate> Validate for [T] {
    type Claims = T::Claims;

    fn validate(&self, claims: &Self::Claims) -> Result<(), Error> {
        for v in self {
            T::validate(v, claims)?;
        }
        Ok(())
    }
}

impl<T: Validate> Validate for Vec<T> {
    type Claims = T::Claims;

    fn validate(&self, claims: &Self::Claims) -> Result<(), Error> {
        <[T]>::validate(self, claims)
    }
}

impl<T: Validate + ?Sized> Validate for &T {
    type Claims = T::Claims;

    fn validate(&self, claims: &Self::Claims) -> Result<(), Error> {
        T::validate(self, claims)
    }
}

impl<T: Validate + ?Sized> Validate for Box<T> {
    type Claims = T::Claims;

    fn validate(&self, claims: &Self::Claims) -> Result<(), Error> {
        T::validate(self, claims)
    }
}

impl<T: Validate + ?Sized> Validate for Arc<T> {
    type Claims = T::Claims;

    fn validate(&self, claims: &Self::Claims) -> Result<(), Error> {
        T::validate(self, claims)
    }
}

impl<T: Validate + ?Sized> Validate for Rc<T> {
    type Claims = T::Claims;

    fn validate(&self, claims: &Self::Claims) -> Result<(), Error> {
        T::validate(self, claims)
    }
}
