//! # Vercre Identity
//!
//! Decentralized Identifier (DID) resolution and Verifiable Credential proofs.
//!
//! DIDs are resolved through a [`did::Resolver`] that dispatches to registered
//! [`did::DidMethod`] implementations. The `did:jwk` method is provided.
//!
//! Credentials are secured as VC-JWTs: [`jose::jwt`] signs with a
//! [`did::BearerDid`]'s key (held by a [`kms::KeyManager`]) and verifies by
//! resolving the `kid` header to the signer's public key.

pub mod did;
pub mod error;
pub mod jose;
pub mod kms;
pub mod vc;

pub use self::error::Error;
pub use self::vc::{VerifiableCredential, VerifiedCredential};

/// Result type for this crate.
pub type Result<T, E = Error> = core::result::Result<T, E>;
