//! # Decentralized Identifiers
//!
//! DID parsing, DID documents, the contract every DID method implements and a
//! resolver that dispatches resolution to registered methods.
//!
//! The `did:jwk` method is implemented in full. Other methods plug in by
//! implementing [`DidMethod`] and registering with a [`Resolver`].
//!
//! See [DID resolution](https://www.w3.org/TR/did-core/#did-resolution) for more.

mod bearer;
mod document;
pub mod jwk;
mod method;
mod resolver;
mod url;

pub use self::bearer::{BearerDid, DidSigner, PortableDid, PortableVerificationMethod};
pub use self::document::{
    DID_CONTEXT, Document, DocumentBuilder, DocumentMetadata, JSON_WEB_KEY_2020, JWS_2020_CONTEXT,
    Relationship, Service, VerificationMethod,
};
pub use self::jwk::DidJwk;
pub use self::method::{CreateOptions, DidMethod, MethodDescriptor};
pub use self::resolver::{
    RESOLUTION_CONTEXT, Resolution, ResolutionError, ResolutionMetadata, ResolutionOptions,
    Resolver, Resource,
};
pub use self::url::Did;
