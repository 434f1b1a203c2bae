//! # DID Document
//!
//! A DID Document is a JSON-LD document that contains information related to a
//! DID.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Err;
use crate::jose::Jwk;
use crate::{tracerr, Result};

/// The base DID context every document carries.
pub const DID_CONTEXT: &str = "https://www.w3.org/ns/did/v1";

/// Context for documents with `JsonWebKey2020` verification methods.
pub const JWS_2020_CONTEXT: &str = "https://w3id.org/security/suites/jws-2020/v1";

/// Verification method type for keys expressed as a JWK.
pub const JSON_WEB_KEY_2020: &str = "JsonWebKey2020";

/// DID Document
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// The context of the DID document.
    #[serde(rename = "@context")]
    pub context: Vec<String>,

    /// The DID for a particular DID subject.
    pub id: String,

    /// If set, MUST be a set of verification methods for the DID subject.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_method: Option<Vec<VerificationMethod>>,

    /// IDs of verification methods used to authenticate the DID subject.
    ///
    /// <https://www.w3.org/TR/did-core/#authentication>
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authentication: Option<Vec<String>>,

    /// IDs of verification methods used to express claims, such as for the
    /// purposes of issuing a Verifiable Credential.
    ///
    /// <https://www.w3.org/TR/did-core/#assertion>
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assertion_method: Option<Vec<String>>,

    /// IDs of verification methods used to establish secure communication with
    /// the DID subject.
    ///
    /// <https://www.w3.org/TR/did-core/#key-agreement>
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_agreement: Option<Vec<String>>,

    /// IDs of verification methods used to invoke a cryptographic capability,
    /// such as the authorization to update the DID Document.
    ///
    /// <https://www.w3.org/TR/did-core/#capability-invocation>
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capability_invocation: Option<Vec<String>>,

    /// IDs of verification methods used to delegate a cryptographic capability
    /// to another party.
    ///
    /// <https://www.w3.org/TR/did-core/#capability-delegation>
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capability_delegation: Option<Vec<String>>,

    /// A set of services, that express ways of communicating with the DID
    /// subject or related entities.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<Vec<Service>>,
}

impl Document {
    /// Retrieve a verification method by its ID. Document-relative IDs
    /// (`#0`) and absolute IDs (`did:...#0`) match each other.
    #[must_use]
    pub fn verification_method(&self, id: &str) -> Option<&VerificationMethod> {
        let id = self.absolute_id(id);
        self.verification_method.as_ref()?.iter().find(|vm| self.absolute_id(&vm.id) == id)
    }

    /// Retrieve a service by its ID.
    #[must_use]
    pub fn service(&self, id: &str) -> Option<&Service> {
        let id = self.absolute_id(id);
        self.service.as_ref()?.iter().find(|s| self.absolute_id(&s.id) == id)
    }

    /// The verification method IDs listed under a relationship.
    #[must_use]
    pub fn relationship(&self, relationship: Relationship) -> Option<&Vec<String>> {
        match relationship {
            Relationship::Authentication => self.authentication.as_ref(),
            Relationship::AssertionMethod => self.assertion_method.as_ref(),
            Relationship::KeyAgreement => self.key_agreement.as_ref(),
            Relationship::CapabilityInvocation => self.capability_invocation.as_ref(),
            Relationship::CapabilityDelegation => self.capability_delegation.as_ref(),
        }
    }

    /// Every relationship the verification method is listed under.
    #[must_use]
    pub fn relationships_of(&self, vm_id: &str) -> Vec<Relationship> {
        let vm_id = self.absolute_id(vm_id);
        Relationship::ALL
            .into_iter()
            .filter(|rel| {
                self.relationship(*rel)
                    .is_some_and(|ids| ids.iter().any(|id| self.absolute_id(id) == vm_id))
            })
            .collect()
    }

    fn absolute_id(&self, id: &str) -> String {
        if id.starts_with('#') {
            format!("{}{id}", self.id)
        } else {
            id.to_string()
        }
    }
}

/// A way in which a verification method may be used by the DID subject.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum Relationship {
    /// `authentication`
    Authentication,

    /// `assertionMethod`
    AssertionMethod,

    /// `keyAgreement`
    KeyAgreement,

    /// `capabilityInvocation`
    CapabilityInvocation,

    /// `capabilityDelegation`
    CapabilityDelegation,
}

impl Relationship {
    /// All relationships, in document order.
    pub const ALL: [Self; 5] = [
        Self::Authentication,
        Self::AssertionMethod,
        Self::KeyAgreement,
        Self::CapabilityInvocation,
        Self::CapabilityDelegation,
    ];
}

/// A verification method is a public key or other cryptographic material
/// used to verify proofs made by the DID subject.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VerificationMethod {
    /// Verification method ID, typically `<did>#<fragment>`.
    pub id: String,

    /// Verification method type, e.g. `JsonWebKey2020`.
    #[serde(rename = "type")]
    pub type_: String,

    /// The DID of the controller of the verification method.
    pub controller: String,

    /// The public key as a JWK.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key_jwk: Option<Jwk>,
}

/// A way of communicating with the DID subject or related entities.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    /// Service ID.
    pub id: String,

    /// Service type.
    #[serde(rename = "type")]
    pub type_: String,

    /// One or more endpoints: a URI, a map or a set of either.
    pub service_endpoint: Value,
}

/// DID document metadata. Empty for methods, like `did:jwk`, whose documents
/// are derived rather than stored.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    /// Timestamp of the Create operation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,

    /// Timestamp of the last Update operation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated: Option<DateTime<Utc>>,

    /// Whether the DID has been deactivated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deactivated: Option<bool>,

    /// Version ID of the last Update operation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_id: Option<String>,

    /// Equivalent DIDs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub equivalent_id: Option<Vec<String>>,

    /// The canonical DID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub canonical_id: Option<String>,
}

/// A builder for creating a DID Document.
#[derive(Default)]
pub struct DocumentBuilder {
    // Document under construction
    doc: Document,
}

impl DocumentBuilder {
    /// Creates a new `DocumentBuilder` for the given DID with the base DID
    /// context.
    #[must_use]
    pub fn new(did: &str) -> Self {
        let doc = Document {
            context: vec![DID_CONTEXT.to_string()],
            id: did.to_string(),
            ..Document::default()
        };
        Self { doc }
    }

    /// Add a context.
    ///
    /// Chain to add multiple contexts.
    #[must_use]
    pub fn context(mut self, context: &str) -> Self {
        if !self.doc.context.iter().any(|c| c == context) {
            self.doc.context.push(context.to_string());
        }
        self
    }

    /// Add a verification method.
    ///
    /// Chain to add multiple verification methods.
    #[must_use]
    pub fn verification_method(mut self, vm: VerificationMethod) -> Self {
        self.doc.verification_method.get_or_insert(vec![]).push(vm);
        self
    }

    /// Reference a verification method, by ID, from a relationship.
    ///
    /// Chain to add multiple relationships.
    #[must_use]
    pub fn relationship(mut self, relationship: Relationship, vm_id: &str) -> Self {
        let ids = match relationship {
            Relationship::Authentication => &mut self.doc.authentication,
            Relationship::AssertionMethod => &mut self.doc.assertion_method,
            Relationship::KeyAgreement => &mut self.doc.key_agreement,
            Relationship::CapabilityInvocation => &mut self.doc.capability_invocation,
            Relationship::CapabilityDelegation => &mut self.doc.capability_delegation,
        };
        ids.get_or_insert(vec![]).push(vm_id.to_string());
        self
    }

    /// Add a service endpoint.
    ///
    /// Chain to add multiple service endpoints.
    #[must_use]
    pub fn service(mut self, service: Service) -> Self {
        self.doc.service.get_or_insert(vec![]).push(service);
        self
    }

    /// Build the DID document.
    ///
    /// # Errors
    ///
    /// Returns `Err::InvalidFormat` if a relationship references a
    /// verification method the document does not contain.
    pub fn build(self) -> Result<Document> {
        let doc = self.doc;
        for rel in Relationship::ALL {
            for id in doc.relationship(rel).into_iter().flatten() {
                if doc.verification_method(id).is_none() {
                    tracerr!(
                        Err::InvalidFormat,
                        "{rel:?} references unknown verification method {id}"
                    );
                }
            }
        }
        Ok(doc)
    }
}
