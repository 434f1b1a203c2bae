//! # DID Method
//!
//! The contract every DID method implements. A method knows how to create
//! DIDs (generating or importing keys), resolve its DIDs to documents and
//! choose the verification method used for signing.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::did::{
    BearerDid, Document, PortableVerificationMethod, Relationship, Resolution, ResolutionOptions,
    VerificationMethod,
};
use crate::jose::Algorithm;
use crate::kms::KeyManager;
use crate::Result;

/// A DID method. Implementations are registered with a
/// [`crate::did::Resolver`] under their [`DidMethod::name`].
#[async_trait]
pub trait DidMethod: Send + Sync {
    /// Method name, as it appears in the DID: `did:<name>:...`.
    fn name(&self) -> &'static str;

    /// Create a new DID, generating keys with the key manager. When no key
    /// manager is provided an in-memory
    /// [`LocalKeyManager`](crate::kms::LocalKeyManager) is used.
    ///
    /// # Errors
    ///
    /// Returns an error if the options are invalid for the method or key
    /// generation fails.
    async fn create(
        &self, key_manager: Option<Arc<dyn KeyManager>>, options: CreateOptions,
    ) -> Result<BearerDid>;

    /// Recreate a DID from existing key material, importing the private keys
    /// into the key manager.
    ///
    /// # Errors
    ///
    /// Returns an error if the keys cannot be used by the method or cannot be
    /// imported.
    async fn from_keys(
        &self, key_manager: Option<Arc<dyn KeyManager>>,
        verification_methods: &[PortableVerificationMethod],
    ) -> Result<BearerDid>;

    /// Resolve a DID to its document. Resolution never fails: problems are
    /// reported in the resolution metadata.
    async fn resolve(&self, did_uri: &str, options: Option<&ResolutionOptions>) -> Resolution;

    /// Select the verification method to sign with. `method_id` narrows the
    /// selection, otherwise the method's default signing key is used.
    ///
    /// Returns `None` when no verification method matches.
    ///
    /// # Errors
    ///
    /// Returns `Err::MethodNotSupported` if the document does not belong to
    /// this method.
    fn signing_method(
        &self, document: &Document, method_id: Option<&str>,
    ) -> Result<Option<VerificationMethod>>;
}

/// Options for creating a DID.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CreateOptions {
    /// Signing algorithm of the key to generate. Defaults to `EdDSA`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<Algorithm>,

    /// Verification methods to generate keys for. Cannot be combined with
    /// `algorithm`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_methods: Option<Vec<MethodDescriptor>>,
}

/// Describes a verification method to generate.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MethodDescriptor {
    /// Signing algorithm of the key to generate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<Algorithm>,

    /// Relationships the verification method should be listed under, for
    /// methods that let the caller choose.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purposes: Option<Vec<Relationship>>,
}
