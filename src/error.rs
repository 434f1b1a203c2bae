//! # Errors
//!
//! Error types used across DID resolution, key management, JWT proofs and
//! Verifiable Credentials.
//!
//! Failures are raised as an [`Error`] carrying one of the [`Err`] codes plus
//! a human-readable context message. DID resolution is the exception: it
//! reports failure inside the resolution result rather than raising an error
//! (see [`crate::did::ResolutionError`]).

use std::fmt::Display;

use thiserror::Error;

/// Simplify creation of errors with tracing.
///
/// # Example
/// ```
/// use vercre_identity::error::Err;
/// use vercre_identity::{tracerr, Result};
///
/// fn with_msg() -> Result<()> {
///     tracerr!(Err::InvalidInput, "message: {}", "some message")
/// }
///
/// fn no_msg() -> Result<()> {
///     tracerr!(Err::InvalidInput)
/// }
/// ```
#[macro_export]
macro_rules! tracerr {
    // with context
    ($code:expr, $($msg:tt)*) => {
        {
        use $crate::error::Context as _;
        tracing::error!($($msg)*);
        return Err($code).context(format!($($msg)*));
        }
    };
    // no context
    ($code:expr) => {
        {
        tracing::error!("{}", $code);
        return Err($code.into());
        }
    }
}

/// Public error type.
#[derive(Error, Debug)]
#[error(transparent)]
pub struct Error(#[from] anyhow::Error);

impl Error {
    /// Transfer the error to `OAuth2` compatible format.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "error": self.0.root_cause().to_string(),
            "error_description": self.to_string(),
        })
    }

    /// Returns true if `err` is the code held by this error object.
    #[must_use]
    pub fn is(&self, err: Err) -> bool {
        self.0.downcast_ref::<Err>().is_some_and(|e| e == &err)
    }
}

/// Typed error codes.
#[derive(Clone, Copy, Error, Debug, PartialEq, Eq)]
pub enum Err {
    /// The caller supplied arguments that cannot be used together or are
    /// missing required values.
    #[error("invalid_input")]
    InvalidInput,

    /// Invalid format. Used for malformed tokens and claims. (See context for
    /// details)
    #[error("invalid_format")]
    InvalidFormat,

    /// The DID could not be parsed or its method-specific identifier could not
    /// be decoded.
    #[error("invalid_did")]
    InvalidDid,

    /// The DID method is not supported by the resolver or does not match the
    /// method implementation it was handed to.
    #[error("method_not_supported")]
    MethodNotSupported,

    /// The format of the key is incorrect or the key type is not supported.
    #[error("invalid_key")]
    InvalidKey,

    /// A key could not be found in the key manager or a verification method
    /// could not be found in a DID document.
    #[error("key_not_found")]
    KeyNotFound,

    /// A requested key signing algorithm is not supported.
    #[error("unsupported_algorithm")]
    UnsupportedAlgorithm,

    /// Failure to sign a message.
    #[error("signing_error")]
    SigningError,

    /// Failure to verify a signature.
    #[error("failed_signature_verification")]
    FailedSignatureVerification,

    /// A DID referenced during verification could not be resolved.
    #[error("resolution_error")]
    ResolutionError,

    /// An error occurred trying to serialize data.
    #[error("serialization_error")]
    SerializationError,

    /// An error occurred trying to deserialize data.
    #[error("deserialization_error")]
    DeserializationError,

    /// Operation is not supported.
    #[error("not_supported")]
    NotSupported,

    /// The requested resource was not found.
    #[error("not_found")]
    NotFound,

    /// The credential has passed its expiration date.
    #[error("expired")]
    Expired,
}

/// Context is used to decorate errors with useful context information.
pub trait Context<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    /// Adds context to the error.
    ///
    /// # Errors
    ///
    /// * Original error with context appended.
    fn context<C>(self, context: C) -> Result<T, Error>
    where
        C: Display + Send + Sync + 'static;
}

impl<T, E> Context<T, E> for core::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn context<C>(self, context: C) -> Result<T, Error>
    where
        C: Display + Send + Sync + 'static,
    {
        match self {
            Ok(ok) => Ok(ok),
            Err(e) => Err(Error(anyhow::Error::from(e).context(context))),
        }
    }
}

impl From<Err> for Error {
    fn from(error: Err) -> Self {
        Self(error.into())
    }
}

impl From<base64ct::Error> for Error {
    fn from(err: base64ct::Error) -> Self {
        Self(err.into())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self(err.into())
    }
}
