//! # JSON Object Signing and Encryption (JOSE)
//!
//! JWT ([RFC7519]) proofs signed with keys held by a [`crate::kms::KeyManager`]
//! and verified against public keys recovered by resolving the signer's DID.
//!
//! [RFC7519]: https://www.rfc-editor.org/rfc/rfc7519

pub mod jwa;
pub mod jwk;
pub mod jwt;

pub use self::jwa::Algorithm;
pub use self::jwk::{Curve, Jwk, KeyType, KeyUse};
pub use self::jwt::{Decoded, Header, JwtPayload, SignOptions, Verified};
