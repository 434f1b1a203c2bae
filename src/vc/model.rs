//! # W3C Verifiable Credential data model
//!
//! The credential data model as carried in the `vc` claim of a VC-JWT.
//!
//! See <https://www.w3.org/TR/vc-data-model>

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::did::Did;
use crate::error::Err;
use crate::{tracerr, Result};

/// The base Verifiable Credential context.
pub const BASE_CONTEXT: &str = "https://www.w3.org/2018/credentials/v1";

/// The base Verifiable Credential type.
pub const BASE_TYPE: &str = "VerifiableCredential";

/// `VcDataModel` is a W3C Verifiable Credential.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VcDataModel {
    /// The @context property is used to map property URIs into short-form
    /// aliases. The first entry is always the base credentials context.
    #[serde(rename = "@context")]
    pub context: Vec<String>,

    /// The credential's types. The first entry is always
    /// `VerifiableCredential`.
    #[serde(rename = "type")]
    pub type_: Vec<String>,

    /// The credential's URI, a `urn:uuid:` for credentials created here.
    #[serde(default)]
    pub id: String,

    /// The DID of the credential's issuer.
    pub issuer: String,

    /// The date-time the credential becomes valid.
    pub issuance_date: DateTime<Utc>,

    /// The date-time the credential ceases to be valid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<DateTime<Utc>>,

    /// Claims about the subject.
    pub credential_subject: CredentialSubject,

    /// Used to determine the status of the credential, such as whether it is
    /// suspended or revoked.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential_status: Option<CredentialStatus>,

    /// The schema the credential's claims conform to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential_schema: Option<CredentialSchema>,
}

impl VcDataModel {
    /// Check the credential is well formed and has not expired.
    ///
    /// # Errors
    ///
    /// Returns `Err::InvalidFormat` for a malformed credential and
    /// `Err::Expired` if the expiration date has passed.
    pub fn validate(&self) -> Result<()> {
        if self.context.first().map(String::as_str) != Some(BASE_CONTEXT) {
            tracerr!(Err::InvalidFormat, "Expected first @context to be {BASE_CONTEXT}");
        }
        if self.type_.first().map(String::as_str) != Some(BASE_TYPE) {
            tracerr!(Err::InvalidFormat, "Expected first type to be {BASE_TYPE}");
        }
        if Did::parse(&self.issuer).is_none() {
            tracerr!(Err::InvalidFormat, "Expected issuer to be a DID, got '{}'", self.issuer);
        }
        let subject = &self.credential_subject.id;
        if Did::parse(subject).is_none() {
            tracerr!(
                Err::InvalidFormat,
                "Expected credentialSubject.id to be a DID, got '{subject}'"
            );
        }
        if let Some(expiration) = self.expiration_date {
            if expiration < self.issuance_date {
                tracerr!(Err::InvalidFormat, "Expected expirationDate to follow issuanceDate");
            }
            if expiration <= Utc::now() {
                tracerr!(Err::Expired, "Credential expired at {}", expiration.to_rfc3339());
            }
        }
        Ok(())
    }
}

/// The subject of the credential and the claims made about it.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct CredentialSubject {
    /// The subject's DID.
    #[serde(default)]
    pub id: String,

    /// Claims about the subject.
    #[serde(flatten)]
    pub claims: Map<String, Value>,
}

/// Credential status information.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CredentialStatus {
    /// URI of the status entry.
    pub id: String,

    /// Status method, e.g. `StatusList2021Entry`.
    #[serde(rename = "type")]
    pub type_: String,

    /// Method-specific status properties.
    #[serde(flatten)]
    pub properties: Map<String, Value>,
}

/// A schema the credential's claims conform to.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct CredentialSchema {
    /// URI of the schema.
    pub id: String,

    /// Schema type, e.g. `JsonSchema`.
    #[serde(rename = "type")]
    pub type_: String,
}
