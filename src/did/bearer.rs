//! # Bearer DID
//!
//! A DID together with access to its private keys. The keys never leave the
//! key manager: signing goes through a [`DidSigner`] that holds the key URI.

use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::did::{DidMethod, Document, DocumentMetadata, Relationship};
use crate::error::Err;
use crate::jose::{Algorithm, Jwk};
use crate::kms::KeyManager;
use crate::{tracerr, Result};

/// A DID whose controller holds the private keys, via a key manager.
#[derive(Clone)]
pub struct BearerDid {
    /// The DID.
    pub uri: String,

    /// The DID document.
    pub document: Document,

    /// The DID document metadata.
    pub metadata: DocumentMetadata,

    key_manager: Arc<dyn KeyManager>,
    method: Arc<dyn DidMethod>,
}

impl BearerDid {
    pub(crate) fn new(
        uri: String, document: Document, key_manager: Arc<dyn KeyManager>,
        method: Arc<dyn DidMethod>,
    ) -> Self {
        Self {
            uri,
            document,
            metadata: DocumentMetadata::default(),
            key_manager,
            method,
        }
    }

    /// The key manager holding the DID's private keys.
    #[must_use]
    pub fn key_manager(&self) -> &Arc<dyn KeyManager> {
        &self.key_manager
    }

    /// Return a signer for the verification method identified by `method_id`
    /// or, when `None`, the method's default signing key.
    ///
    /// # Errors
    ///
    /// Returns `Err::KeyNotFound` if no suitable verification method exists
    /// or the key manager does not hold its private key.
    pub async fn signer(&self, method_id: Option<&str>) -> Result<DidSigner> {
        let Some(vm) = self.method.signing_method(&self.document, method_id)? else {
            tracerr!(
                Err::KeyNotFound,
                "A verification method intended for signing could not be determined from the \
                 DID Document"
            );
        };
        let Some(public_key) = vm.public_key_jwk else {
            tracerr!(Err::KeyNotFound, "verification method {} has no public key", vm.id);
        };

        let key_uri = self.key_manager.key_uri(&public_key)?;
        let public_key = self.key_manager.public_key(&key_uri).await?;
        let algorithm = Algorithm::from_jwk(&public_key)?;

        let key_id =
            if vm.id.starts_with('#') { format!("{}{}", self.uri, vm.id) } else { vm.id };

        Ok(DidSigner {
            key_id,
            algorithm,
            public_key,
            key_uri,
            key_manager: Arc::clone(&self.key_manager),
        })
    }

    /// Export the DID, including private keys, in a portable format.
    ///
    /// # Errors
    ///
    /// Returns `Err::NotSupported` if the key manager does not allow keys to
    /// be exported.
    pub async fn export(&self) -> Result<PortableDid> {
        let mut verification_methods = vec![];
        for vm in self.document.verification_method.iter().flatten() {
            let Some(public_key) = &vm.public_key_jwk else {
                continue;
            };
            let key_uri = self.key_manager.key_uri(public_key)?;
            let private_key = self.key_manager.export_key(&key_uri).await?;

            verification_methods.push(PortableVerificationMethod {
                public_key_jwk: Some(public_key.clone()),
                private_key_jwk: Some(private_key),
                purposes: Some(self.document.relationships_of(&vm.id)),
            });
        }

        Ok(PortableDid {
            did: self.uri.clone(),
            document: self.document.clone(),
            metadata: self.metadata.clone(),
            verification_methods,
        })
    }
}

impl Debug for BearerDid {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("BearerDid")
            .field("uri", &self.uri)
            .field("document", &self.document)
            .field("metadata", &self.metadata)
            .field("method", &self.method.name())
            .finish_non_exhaustive()
    }
}

/// Signs with a single verification method of a [`BearerDid`].
#[derive(Clone)]
pub struct DidSigner {
    key_id: String,
    algorithm: Algorithm,
    public_key: Jwk,
    key_uri: String,
    key_manager: Arc<dyn KeyManager>,
}

impl DidSigner {
    /// Absolute ID of the verification method, e.g. `did:jwk:...#0`. Used as
    /// the JWT `kid`.
    #[must_use]
    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    /// Signing algorithm of the key.
    #[must_use]
    pub const fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Public key of the verification method.
    #[must_use]
    pub const fn public_key(&self) -> &Jwk {
        &self.public_key
    }

    /// Sign the message.
    ///
    /// # Errors
    ///
    /// Returns an error if the key manager fails to sign.
    pub async fn sign(&self, msg: &[u8]) -> Result<Vec<u8>> {
        self.key_manager.sign(&self.key_uri, msg).await
    }

    /// Verify a signature made by this signer.
    ///
    /// # Errors
    ///
    /// Returns an error if the public key cannot be used for verification.
    pub async fn verify(&self, msg: &[u8], signature: &[u8]) -> Result<bool> {
        self.key_manager.verify(&self.public_key, msg, signature).await
    }
}

/// A DID and its private keys in a form that can be stored and later used to
/// recreate a [`BearerDid`].
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PortableDid {
    /// The DID.
    pub did: String,

    /// The DID document.
    pub document: Document,

    /// The DID document metadata.
    pub metadata: DocumentMetadata,

    /// Key material for the document's verification methods.
    pub verification_methods: Vec<PortableVerificationMethod>,
}

/// Key material for a verification method.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PortableVerificationMethod {
    /// The public key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key_jwk: Option<Jwk>,

    /// The private key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_key_jwk: Option<Jwk>,

    /// Relationships the verification method is listed under.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purposes: Option<Vec<Relationship>>,
}
