//! # JSON Web Token (JWT)
//!
//! Compact JWS-signed JWTs ([RFC7519]) whose `kid` header is the absolute ID
//! of a DID verification method. Signing goes through the bearer DID's key
//! manager; verification resolves the `kid` to recover the public key.
//!
//! [RFC7519]: https://www.rfc-editor.org/rfc/rfc7519

use base64ct::{Base64UrlUnpadded, Encoding};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::did::{BearerDid, Did, Resolver};
use crate::error::Err;
use crate::jose::Algorithm;
use crate::{kms, tracerr, Result};

/// JWT `typ` header value.
pub const JWT_TYPE: &str = "JWT";

/// JOSE header of a signed JWT.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct Header {
    /// Signing algorithm.
    pub alg: Algorithm,

    /// Media type of the token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub typ: Option<String>,

    /// Absolute ID of the verification method that signed the token.
    pub kid: String,
}

/// JWT claims. Registered claims are typed; everything else, e.g. a
/// Verifiable Credential's `vc` claim, is held in `claims`.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct JwtPayload {
    /// Issuer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    /// Subject.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    /// Audience.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,

    /// Expiration time, in seconds since the epoch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,

    /// Not-before time, in seconds since the epoch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,

    /// Issued-at time, in seconds since the epoch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    /// Unique token ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,

    /// Private and public claims.
    #[serde(flatten)]
    pub claims: Map<String, Value>,
}

/// Options for signing a JWT.
#[derive(Clone, Debug, Default)]
pub struct SignOptions {
    /// Verification method to sign with. Defaults to the DID method's default
    /// signing key.
    pub method_id: Option<String>,

    /// Overrides the `typ` header, which defaults to `JWT`.
    pub typ: Option<String>,
}

/// A JWT decoded without verifying its signature.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Decoded {
    /// JOSE header.
    pub header: Header,

    /// Claims.
    pub payload: JwtPayload,

    /// Raw signature bytes.
    pub signature: Vec<u8>,

    /// The signed portion of the token: `<header>.<payload>`.
    pub signing_input: String,
}

/// A JWT whose signature has been verified.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Verified {
    /// JOSE header.
    pub header: Header,

    /// Claims.
    pub payload: JwtPayload,
}

/// Sign the claims as a compact JWT using the bearer DID's signing key.
///
/// # Errors
///
/// Returns an error if no signing key can be selected or signing fails.
pub async fn sign(
    bearer: &BearerDid, payload: &JwtPayload, options: Option<SignOptions>,
) -> Result<String> {
    let options = options.unwrap_or_default();
    let signer = bearer.signer(options.method_id.as_deref()).await?;

    let header = Header {
        alg: signer.algorithm(),
        typ: Some(options.typ.unwrap_or_else(|| JWT_TYPE.to_string())),
        kid: signer.key_id().to_string(),
    };

    let header = Base64UrlUnpadded::encode_string(&serde_json::to_vec(&header)?);
    let payload = Base64UrlUnpadded::encode_string(&serde_json::to_vec(payload)?);
    let signing_input = format!("{header}.{payload}");

    let signature = match signer.sign(signing_input.as_bytes()).await {
        Ok(sig) => sig,
        Err(e) => tracerr!(Err::SigningError, "unable to sign JWT with {}: {e}", signer.key_id()),
    };

    Ok(format!("{signing_input}.{}", Base64UrlUnpadded::encode_string(&signature)))
}

/// Decode a compact JWT without verifying its signature.
///
/// # Errors
///
/// Returns `Err::InvalidFormat` if the token does not have three base64url
/// segments with JSON header and payload objects, or the header does not
/// contain `alg` and `kid`.
pub fn parse(jwt: &str) -> Result<Decoded> {
    let parts: Vec<&str> = jwt.split('.').collect();
    let [header, payload, signature] = parts.as_slice() else {
        tracerr!(Err::InvalidFormat, "Malformed JWT. Expected 3 parts, got {}", parts.len());
    };
    let signing_input = format!("{header}.{payload}");

    let header_json: Map<String, Value> = decode_segment(header, "header")?;
    if !header_json.contains_key("alg") || !header_json.contains_key("kid") {
        tracerr!(Err::InvalidFormat, "Expected JWT header to contain alg and kid");
    }
    let header: Header = match serde_json::from_value(Value::Object(header_json)) {
        Ok(header) => header,
        Err(e) => tracerr!(Err::UnsupportedAlgorithm, "Unsupported JWT header: {e}"),
    };

    let payload: JwtPayload = decode_segment(payload, "payload")?;
    let signature = match Base64UrlUnpadded::decode_vec(signature) {
        Ok(sig) if !sig.is_empty() => sig,
        Ok(_) => tracerr!(Err::InvalidFormat, "Malformed JWT. Empty signature"),
        Err(e) => tracerr!(Err::InvalidFormat, "Malformed JWT. Failed to decode signature: {e}"),
    };

    Ok(Decoded {
        header,
        payload,
        signature,
        signing_input,
    })
}

/// Verify a compact JWT. The `kid` header is resolved to a DID document and
/// the signature checked with the referenced verification method's key.
///
/// # Errors
///
/// Returns an error if the token is malformed, the `kid` cannot be resolved
/// to a verification method, the `alg` header does not match the key, or the
/// signature is invalid.
pub async fn verify(jwt: &str, resolver: &Resolver) -> Result<Verified> {
    let decoded = parse(jwt)?;
    let kid = &decoded.header.kid;

    let Some(did) = Did::parse(kid) else {
        tracerr!(Err::InvalidDid, "Verification failed: kid is not a DID URL: {kid}");
    };

    let resolution = resolver.resolve(&did.uri, None).await;
    if let Some(error) = resolution.error() {
        tracerr!(Err::ResolutionError, "Verification failed: Failed to resolve {kid}: {error}");
    }
    let Some(document) = resolution.did_document else {
        tracerr!(Err::ResolutionError, "Verification failed: Failed to resolve {kid}");
    };

    let Some(vm) = document.verification_method(kid) else {
        tracerr!(
            Err::KeyNotFound,
            "Verification failed: Expected kid in JWT header to dereference a DID Document \
             Verification Method"
        );
    };
    let Some(public_key) = &vm.public_key_jwk else {
        tracerr!(
            Err::KeyNotFound,
            "Verification failed: Expected kid in JWT header to dereference a DID Document \
             Verification Method with publicKeyJwk"
        );
    };

    let alg = decoded.header.alg;
    let key_alg = Algorithm::from_jwk(public_key)?;
    let declared = public_key.alg.as_deref().map_or(true, |a| a == alg.to_string());
    if key_alg != alg || !declared {
        tracerr!(
            Err::UnsupportedAlgorithm,
            "Verification failed: Expected alg in JWT header to match DID Document \
             Verification Method alg"
        );
    }

    if !kms::verify(public_key, decoded.signing_input.as_bytes(), &decoded.signature)? {
        tracerr!(
            Err::FailedSignatureVerification,
            "Signature verification failed: Integrity mismatch"
        );
    }

    tracing::debug!("verified JWT signed by {kid}");
    Ok(Verified {
        header: decoded.header,
        payload: decoded.payload,
    })
}

fn decode_segment<T: DeserializeOwned>(segment: &str, name: &str) -> Result<T> {
    let bytes = match Base64UrlUnpadded::decode_vec(segment) {
        Ok(bytes) => bytes,
        Err(e) => tracerr!(Err::InvalidFormat, "Malformed JWT. Failed to decode {name}: {e}"),
    };
    match serde_json::from_slice(&bytes) {
        Ok(value) => Ok(value),
        Err(e) => tracerr!(Err::InvalidFormat, "Malformed JWT. Failed to parse {name}: {e}"),
    }
}
