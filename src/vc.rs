//! # Verifiable Credentials
//!
//! Create W3C Verifiable Credentials and secure them as VC-JWTs signed by a
//! [`BearerDid`]. Verification resolves the signer's DID to check the proof;
//! [`VerifiableCredential::parse_jwt`] decodes a VC-JWT without checking it.
//!
//! ```rust,no_run
//! use serde_json::json;
//! use vercre_identity::did::{CreateOptions, DidJwk, DidMethod, Resolver};
//! use vercre_identity::vc::{self, VerifiableCredential};
//!
//! # async fn example() -> vercre_identity::Result<()> {
//! let issuer = DidJwk.create(None, CreateOptions::default()).await?;
//! let credential = VerifiableCredential::create(vc::CreateOptions {
//!     type_: Some("EmployeeCredential".into()),
//!     issuer: issuer.uri.clone(),
//!     subject: "did:example:alice".into(),
//!     data: json!({"employer": "Acme"}),
//!     ..vc::CreateOptions::default()
//! })?;
//!
//! let vc_jwt = credential.sign(&issuer).await?;
//! let verified = VerifiableCredential::verify(&vc_jwt, &Resolver::default()).await?;
//! assert_eq!(verified.issuer, issuer.uri);
//! # Ok(())
//! # }
//! ```

mod model;

use std::fmt::{Display, Formatter};

use chrono::{DateTime, SubsecRound, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

pub use self::model::{
    BASE_CONTEXT, BASE_TYPE, CredentialSchema, CredentialStatus, CredentialSubject, VcDataModel,
};
use crate::did::{BearerDid, Resolver};
use crate::error::Err;
use crate::jose::{jwt, JwtPayload};
use crate::{tracerr, Result};

/// Name of the JWT claim carrying the credential.
const VC_CLAIM: &str = "vc";

/// Options for creating a credential.
#[derive(Clone, Debug, Default)]
pub struct CreateOptions<T> {
    /// The credential type, added after `VerifiableCredential`.
    pub type_: Option<String>,

    /// The issuer's DID.
    pub issuer: String,

    /// The subject's DID.
    pub subject: String,

    /// Claims about the subject. Must serialize to a JSON object.
    pub data: T,

    /// When the credential becomes valid. Defaults to now.
    pub issuance_date: Option<DateTime<Utc>>,

    /// When the credential ceases to be valid.
    pub expiration_date: Option<DateTime<Utc>>,

    /// Status information, such as a revocation list entry.
    pub credential_status: Option<CredentialStatus>,

    /// Schema the claims conform to.
    pub credential_schema: Option<CredentialSchema>,
}

/// An unsigned Verifiable Credential.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerifiableCredential {
    /// The credential.
    pub vc_data_model: VcDataModel,
}

/// The result of verifying a VC-JWT.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerifiedCredential {
    /// The JWT issuer.
    pub issuer: String,

    /// The JWT subject.
    pub subject: String,

    /// The credential.
    pub vc: VcDataModel,
}

impl VerifiableCredential {
    /// Create a new credential.
    ///
    /// # Errors
    ///
    /// Returns `Err::InvalidInput` if the issuer or subject is blank or the
    /// data does not serialize to a JSON object.
    pub fn create<T: Serialize>(options: CreateOptions<T>) -> Result<Self> {
        if options.issuer.trim().is_empty() || options.subject.trim().is_empty() {
            tracerr!(Err::InvalidInput, "Issuer and subject must be defined");
        }
        let Ok(Value::Object(mut claims)) = serde_json::to_value(&options.data) else {
            tracerr!(Err::InvalidInput, "Expected data to be parseable into a JSON object");
        };
        // the subject is always the credential subject's id
        claims.remove("id");

        let mut type_ = vec![BASE_TYPE.to_string()];
        if let Some(t) = options.type_.filter(|t| t != BASE_TYPE) {
            type_.push(t);
        }

        let vc_data_model = VcDataModel {
            context: vec![BASE_CONTEXT.to_string()],
            type_,
            id: format!("urn:uuid:{}", Uuid::new_v4()),
            issuer: options.issuer,
            issuance_date: options.issuance_date.unwrap_or_else(Utc::now).trunc_subsecs(0),
            expiration_date: options.expiration_date.map(|d| d.trunc_subsecs(0)),
            credential_subject: CredentialSubject {
                id: options.subject,
                claims,
            },
            credential_status: options.credential_status,
            credential_schema: options.credential_schema,
        };

        Ok(Self { vc_data_model })
    }

    /// The credential's most specific type.
    #[must_use]
    pub fn type_(&self) -> &str {
        self.vc_data_model.type_.last().map_or(BASE_TYPE, String::as_str)
    }

    /// The issuer's DID.
    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.vc_data_model.issuer
    }

    /// The subject's DID.
    #[must_use]
    pub fn subject(&self) -> &str {
        &self.vc_data_model.credential_subject.id
    }

    /// Sign the credential as a VC-JWT.
    ///
    /// # Errors
    ///
    /// Returns an error if the bearer DID cannot sign.
    pub async fn sign(&self, bearer: &BearerDid) -> Result<String> {
        let vc = &self.vc_data_model;

        let mut claims = Map::new();
        claims.insert(VC_CLAIM.to_string(), serde_json::to_value(vc)?);

        let payload = JwtPayload {
            iss: Some(vc.issuer.clone()),
            sub: Some(vc.credential_subject.id.clone()),
            jti: Some(vc.id.clone()),
            nbf: Some(vc.issuance_date.timestamp()),
            iat: Some(Utc::now().timestamp()),
            exp: vc.expiration_date.map(|d| d.timestamp()),
            claims,
            ..JwtPayload::default()
        };

        jwt::sign(bearer, &payload, None).await
    }

    /// Decode a VC-JWT without verifying its signature.
    ///
    /// Use only to inspect a token. Use [`VerifiableCredential::verify`] to
    /// establish that it can be trusted.
    ///
    /// # Errors
    ///
    /// Returns `Err::InvalidFormat` if the JWT is malformed or does not carry a
    /// credential.
    pub fn parse_jwt(vc_jwt: &str) -> Result<Self> {
        let decoded = jwt::parse(vc_jwt)?;
        let mut vc_data_model = vc_claim(&decoded.payload)?;

        if let Some(iss) = decoded.payload.iss {
            vc_data_model.issuer = iss;
        }
        if let Some(sub) = decoded.payload.sub {
            vc_data_model.credential_subject.id = sub;
        }

        Ok(Self { vc_data_model })
    }

    /// Verify a VC-JWT's signature and credential.
    ///
    /// # Errors
    ///
    /// Returns an error if the JWT fails verification, does not carry a
    /// well-formed credential or the credential has expired.
    pub async fn verify(vc_jwt: &str, resolver: &Resolver) -> Result<VerifiedCredential> {
        let verified = jwt::verify(vc_jwt, resolver).await?;
        let vc = vc_claim(&verified.payload)?;
        vc.validate()?;

        Ok(VerifiedCredential {
            issuer: verified.payload.iss.unwrap_or_else(|| vc.issuer.clone()),
            subject: verified.payload.sub.unwrap_or_else(|| vc.credential_subject.id.clone()),
            vc,
        })
    }
}

impl Display for VerifiableCredential {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let json = serde_json::to_string(&self.vc_data_model).map_err(|_| std::fmt::Error)?;
        write!(f, "{json}")
    }
}

// Extract the credential from the `vc` claim.
fn vc_claim(payload: &JwtPayload) -> Result<VcDataModel> {
    let Some(vc) = payload.claims.get(VC_CLAIM) else {
        tracerr!(Err::InvalidFormat, "Jwt payload missing vc property");
    };
    if !vc.is_object() {
        tracerr!(Err::InvalidFormat, "Expected vc property in JWT payload to be an object");
    }
    match serde_json::from_value(vc.clone()) {
        Ok(vc) => Ok(vc),
        Err(e) => tracerr!(Err::InvalidFormat, "Invalid vc property in JWT payload: {e}"),
    }
}
