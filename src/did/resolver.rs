//! # DID Resolver
//!
//! Dispatches DID resolution to the registered [`DidMethod`] for the DID's
//! method and dereferences DID URLs to the document resources they identify.
//!
//! See [DID resolution](https://www.w3.org/TR/did-core/#did-resolution) for more.

use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::did::{Did, DidJwk, DidMethod, Document, DocumentMetadata, Service, VerificationMethod};
use crate::error::Err;
use crate::{tracerr, Result};

/// Context of every resolution result.
pub const RESOLUTION_CONTEXT: &str = "https://w3id.org/did-resolution/v1";

/// The outcome of resolving a DID. Exactly one of `did_document` and
/// `did_resolution_metadata.error` is set.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Resolution {
    /// Resolution context.
    #[serde(rename = "@context")]
    pub context: String,

    /// The resolved DID document, absent when resolution failed.
    pub did_document: Option<Document>,

    /// Metadata about the DID document.
    pub did_document_metadata: DocumentMetadata,

    /// Metadata about the resolution process.
    pub did_resolution_metadata: ResolutionMetadata,
}

impl Default for Resolution {
    fn default() -> Self {
        Self {
            context: RESOLUTION_CONTEXT.to_string(),
            did_document: None,
            did_document_metadata: DocumentMetadata::default(),
            did_resolution_metadata: ResolutionMetadata::default(),
        }
    }
}

impl Resolution {
    /// A successful resolution.
    #[must_use]
    pub fn from_document(document: Document) -> Self {
        Self {
            did_document: Some(document),
            ..Self::default()
        }
    }

    /// A failed resolution with an error code and message.
    #[must_use]
    pub fn from_error(error: ResolutionError, message: impl Into<String>) -> Self {
        let message = message.into();
        tracing::debug!("resolution failed: {error}: {message}");

        Self {
            did_resolution_metadata: ResolutionMetadata {
                error: Some(error),
                error_message: Some(message),
                ..ResolutionMetadata::default()
            },
            ..Self::default()
        }
    }

    /// The resolution error, if any.
    #[must_use]
    pub const fn error(&self) -> Option<ResolutionError> {
        self.did_resolution_metadata.error
    }
}

/// Metadata about the resolution process.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionMetadata {
    /// Media type of the returned representation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,

    /// Error code when resolution failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ResolutionError>,

    /// Human-readable description of the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// DID resolution error codes.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ResolutionError {
    /// The DID is not valid, or its method-specific identifier could not be
    /// decoded by the method.
    InvalidDid,

    /// The DID URL is not valid.
    InvalidDidUrl,

    /// The DID method is not supported.
    MethodNotSupported,

    /// The DID, or the resource a DID URL refers to, does not exist.
    NotFound,

    /// The public key in the DID is invalid.
    InvalidPublicKey,

    /// The requested representation is not supported.
    RepresentationNotSupported,

    /// An unexpected error occurred during resolution.
    InternalError,
}

impl Display for ResolutionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let code = match self {
            Self::InvalidDid => "invalidDid",
            Self::InvalidDidUrl => "invalidDidUrl",
            Self::MethodNotSupported => "methodNotSupported",
            Self::NotFound => "notFound",
            Self::InvalidPublicKey => "invalidPublicKey",
            Self::RepresentationNotSupported => "representationNotSupported",
            Self::InternalError => "internalError",
        };
        write!(f, "{code}")
    }
}

/// Options for resolving a DID.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionOptions {
    /// Preferred media type of the representation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accept: Option<String>,
}

/// A resource a DID URL dereferences to.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum Resource {
    /// The DID document, for DID URLs without a fragment.
    Document(Document),

    /// A verification method.
    VerificationMethod(VerificationMethod),

    /// A service.
    Service(Service),
}

/// Resolves DIDs using the DID methods registered with it.
#[derive(Clone)]
pub struct Resolver {
    methods: HashMap<String, Arc<dyn DidMethod>>,
}

impl Default for Resolver {
    /// A resolver for every DID method implemented by this crate.
    fn default() -> Self {
        Self::new().with_method(Arc::new(DidJwk))
    }
}

impl Resolver {
    /// Create a resolver with no registered methods.
    #[must_use]
    pub fn new() -> Self {
        Self {
            methods: HashMap::new(),
        }
    }

    /// Register a DID method, replacing any method registered under the same
    /// name.
    #[must_use]
    pub fn with_method(mut self, method: Arc<dyn DidMethod>) -> Self {
        self.register(method);
        self
    }

    /// Register a DID method, replacing any method registered under the same
    /// name.
    pub fn register(&mut self, method: Arc<dyn DidMethod>) {
        self.methods.insert(method.name().to_string(), method);
    }

    /// The method registered under `name`.
    #[must_use]
    pub fn method(&self, name: &str) -> Option<Arc<dyn DidMethod>> {
        self.methods.get(name).cloned()
    }

    /// Resolve a DID. Failures are reported in the resolution metadata with
    /// `invalidDid` for unparseable DIDs and `methodNotSupported` for DIDs
    /// whose method is not registered.
    pub async fn resolve(&self, did_uri: &str, options: Option<&ResolutionOptions>) -> Resolution {
        let Some(did) = Did::parse(did_uri) else {
            return Resolution::from_error(
                ResolutionError::InvalidDid,
                format!("invalid DID: {did_uri}"),
            );
        };
        let Some(method) = self.methods.get(&did.method) else {
            return Resolution::from_error(
                ResolutionError::MethodNotSupported,
                format!("method not supported: {}", did.method),
            );
        };

        tracing::debug!("resolving {} with did:{}", did.uri, did.method);
        method.resolve(did_uri, options).await
    }

    /// Dereference a DID URL to the DID document, or to the verification
    /// method or service its fragment identifies.
    ///
    /// # Errors
    ///
    /// Returns `Err::InvalidDid` if the URL cannot be parsed,
    /// `Err::ResolutionError` if the DID cannot be resolved and
    /// `Err::NotFound` if the fragment does not identify a resource.
    pub async fn dereference(&self, did_url: &str) -> Result<Resource> {
        let did: Did = did_url.parse()?;

        let resolution = self.resolve(&did.uri, None).await;
        if let Some(error) = resolution.error() {
            let message = resolution.did_resolution_metadata.error_message.unwrap_or_default();
            tracerr!(Err::ResolutionError, "unable to resolve {}: {error}: {message}", did.uri);
        }
        let Some(document) = resolution.did_document else {
            tracerr!(Err::ResolutionError, "no document for {}", did.uri);
        };

        if did.fragment.is_none() {
            return Ok(Resource::Document(document));
        }

        let id = did.resource_id();
        if let Some(vm) = document.verification_method(&id) {
            return Ok(Resource::VerificationMethod(vm.clone()));
        }
        if let Some(service) = document.service(&id) {
            return Ok(Resource::Service(service.clone()));
        }
        tracerr!(Err::NotFound, "{did_url} does not identify a resource in the DID document")
    }
}
