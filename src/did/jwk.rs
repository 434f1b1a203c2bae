//! # DID JWK
//!
//! The `did:jwk` method encodes a single public key directly in the DID:
//! `did:jwk:<base64url(JSON(public JWK))>`. Documents are derived from the
//! key itself, so resolution needs no network access and nothing is stored.
//!
//! The document has one verification method, `<did>#0`, listed under the
//! relationships its key's `use` allows.
//!
//! See <https://github.com/quartzjer/did-jwk/blob/main/spec.md>

use std::sync::Arc;

use async_trait::async_trait;
use base64ct::{Base64UrlUnpadded, Encoding};

use crate::did::{
    BearerDid, CreateOptions, Did, DidMethod, Document, DocumentBuilder, PortableDid,
    PortableVerificationMethod, Relationship, Resolution, ResolutionError, ResolutionOptions,
    VerificationMethod, JSON_WEB_KEY_2020, JWS_2020_CONTEXT,
};
use crate::error::Err;
use crate::jose::{Algorithm, Jwk, KeyType, KeyUse};
use crate::kms::{KeyManager, LocalKeyManager};
use crate::{tracerr, Result};

/// Fragment of the single verification method in a `did:jwk` document.
const VM_FRAGMENT: &str = "#0";

/// The `did:jwk` method.
#[derive(Clone, Copy, Debug, Default)]
pub struct DidJwk;

impl DidJwk {
    /// Method name.
    pub const METHOD: &'static str = "jwk";

    /// Create a `BearerDid` for a public key already held by the key manager.
    ///
    /// # Errors
    ///
    /// Returns `Err::InvalidKey` if the key contains private key material and
    /// `Err::InvalidDid` if the resulting DID cannot be resolved.
    pub async fn from_public_key(
        key_manager: Arc<dyn KeyManager>, public_key: &Jwk,
    ) -> Result<BearerDid> {
        if public_key.is_private() {
            tracerr!(Err::InvalidKey, "did:jwk keys must not contain private key material");
        }

        let encoded = Base64UrlUnpadded::encode_string(&serde_json::to_vec(public_key)?);
        let uri = format!("did:{}:{encoded}", Self::METHOD);

        let resolution = Self.resolve(&uri, None).await;
        let Some(document) = resolution.did_document else {
            let message = resolution.did_resolution_metadata.error_message.unwrap_or_default();
            tracerr!(Err::InvalidDid, "unable to resolve {uri}: {message}");
        };

        tracing::debug!("created {uri}");
        Ok(BearerDid::new(uri, document, key_manager, Arc::new(Self)))
    }

    /// Recreate a `BearerDid` from its exported form.
    ///
    /// # Errors
    ///
    /// Returns an error if the portable DID's keys cannot be imported or do
    /// not produce the same DID.
    pub async fn from_portable(
        key_manager: Option<Arc<dyn KeyManager>>, portable: &PortableDid,
    ) -> Result<BearerDid> {
        let bearer = Self.from_keys(key_manager, &portable.verification_methods).await?;
        if bearer.uri != portable.did {
            tracerr!(
                Err::InvalidInput,
                "portable DID {} does not match its key, which produces {}",
                portable.did,
                bearer.uri
            );
        }
        Ok(bearer)
    }

    /// Derive the DID document for a `did:jwk` DID and its public key.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be built.
    pub fn document(did: &str, public_key: &Jwk) -> Result<Document> {
        let vm_id = format!("{did}{VM_FRAGMENT}");
        let mut builder = DocumentBuilder::new(did).context(JWS_2020_CONTEXT).verification_method(
            VerificationMethod {
                id: vm_id.clone(),
                type_: JSON_WEB_KEY_2020.to_string(),
                controller: did.to_string(),
                public_key_jwk: Some(public_key.clone()),
            },
        );
        for rel in relationships(public_key.use_.as_ref()) {
            builder = builder.relationship(*rel, &vm_id);
        }
        builder.build()
    }
}

// The relationships a key may be listed under, by its declared use.
const fn relationships(key_use: Option<&KeyUse>) -> &'static [Relationship] {
    match key_use {
        Some(KeyUse::Signature) => &[
            Relationship::Authentication,
            Relationship::AssertionMethod,
            Relationship::CapabilityInvocation,
            Relationship::CapabilityDelegation,
        ],
        Some(KeyUse::Encryption) => &[Relationship::KeyAgreement],
        None => &Relationship::ALL,
    }
}

// Decode the method-specific id into the public key it encodes.
fn decode(id: &str) -> Result<Jwk> {
    let bytes = match Base64UrlUnpadded::decode_vec(id) {
        Ok(bytes) => bytes,
        Err(e) => tracerr!(Err::InvalidDid, "method-specific id is not base64url: {e}"),
    };
    let jwk: Jwk = match serde_json::from_slice(&bytes) {
        Ok(jwk) => jwk,
        Err(e) => tracerr!(Err::InvalidDid, "method-specific id is not a JWK: {e}"),
    };
    if jwk.is_private() {
        tracerr!(Err::InvalidDid, "method-specific id contains private key material");
    }
    // keys of an unknown type are passed through unchecked
    if !matches!(jwk.kty, KeyType::Other(_)) {
        if let Err(e) = jwk.thumbprint() {
            tracerr!(Err::InvalidDid, "method-specific id is not a valid JWK: {e}");
        }
    }
    Ok(jwk)
}

#[async_trait]
impl DidMethod for DidJwk {
    fn name(&self) -> &'static str {
        Self::METHOD
    }

    async fn create(
        &self, key_manager: Option<Arc<dyn KeyManager>>, options: CreateOptions,
    ) -> Result<BearerDid> {
        let algorithm = match (options.algorithm, &options.verification_methods) {
            (Some(_), Some(_)) => tracerr!(
                Err::InvalidInput,
                "The 'algorithm' and 'verificationMethods' options are mutually exclusive"
            ),
            (Some(algorithm), None) => algorithm,
            (None, Some(methods)) => {
                if methods.len() != 1 {
                    tracerr!(
                        Err::InvalidInput,
                        "Only one verification method can be specified but {} were given",
                        methods.len()
                    );
                }
                methods[0].algorithm.unwrap_or_default()
            }
            (None, None) => Algorithm::default(),
        };

        let key_manager = key_manager.unwrap_or_else(LocalKeyManager::shared);
        let key_uri = key_manager.generate_key(algorithm).await?;
        let public_key = key_manager.public_key(&key_uri).await?;

        Self::from_public_key(key_manager, &public_key).await
    }

    async fn from_keys(
        &self, key_manager: Option<Arc<dyn KeyManager>>,
        verification_methods: &[PortableVerificationMethod],
    ) -> Result<BearerDid> {
        let [vm] = verification_methods else {
            tracerr!(
                Err::InvalidInput,
                "Only one verification method can be specified but {} were given",
                verification_methods.len()
            );
        };
        let (Some(public_key), Some(private_key)) = (&vm.public_key_jwk, &vm.private_key_jwk)
        else {
            tracerr!(
                Err::InvalidInput,
                "Verification method does not contain a public and private key in JWK format"
            );
        };
        if !public_key.same_key(private_key) {
            tracerr!(Err::InvalidKey, "public and private keys are not a key pair");
        }

        let key_manager = key_manager.unwrap_or_else(LocalKeyManager::shared);
        key_manager.import_key(private_key).await?;

        Self::from_public_key(key_manager, &public_key.to_public()).await
    }

    async fn resolve(&self, did_uri: &str, _: Option<&ResolutionOptions>) -> Resolution {
        let Some(did) = Did::parse(did_uri) else {
            return Resolution::from_error(
                ResolutionError::InvalidDid,
                format!("invalid DID: {did_uri}"),
            );
        };
        if did.method != Self::METHOD {
            return Resolution::from_error(
                ResolutionError::MethodNotSupported,
                format!("method not supported: {}", did.method),
            );
        }

        let public_key = match decode(&did.id) {
            Ok(jwk) => jwk,
            Err(e) => return Resolution::from_error(ResolutionError::InvalidDid, e.to_string()),
        };
        match Self::document(&did.uri, &public_key) {
            Ok(document) => Resolution::from_document(document),
            Err(e) => Resolution::from_error(ResolutionError::InvalidDid, e.to_string()),
        }
    }

    // Selects the first verification method whose ID ends with `method_id`.
    fn signing_method(
        &self, document: &Document, method_id: Option<&str>,
    ) -> Result<Option<VerificationMethod>> {
        if let Some(did) = Did::parse(&document.id) {
            if did.method != Self::METHOD {
                tracerr!(
                    Err::MethodNotSupported,
                    "method not supported: expected did:jwk, got did:{}",
                    did.method
                );
            }
        }

        let method_id = method_id.unwrap_or(VM_FRAGMENT);
        let mut methods = document.verification_method.iter().flatten();
        Ok(methods.find(|vm| vm.id.ends_with(method_id)).cloned())
    }
}

#[cfg(test)]
mod tests {
    use insta::assert_json_snapshot as assert_snapshot;

    use super::*;
    use crate::jose::Curve;

    // X25519 key-agreement key from the did:jwk method specification.
    const ENC_DID: &str = "did:jwk:eyJrdHkiOiJPS1AiLCJjcnYiOiJYMjU1MTkiLCJ1c2UiOiJlbmMiLCJ4IjoiM3A3YmZYdDl3YlRUVzJIQzdPUTFOei1EUThoYmVHZE5yZngtRkctSUswOCJ9";

    // P-256 key without `use`, from the same specification.
    const P256_DID: &str = "did:jwk:eyJjcnYiOiJQLTI1NiIsImt0eSI6IkVDIiwieCI6ImFjYklRaXVNczNpOF91c3pFakoydHBUdFJNNEVVM3l6OTFQSDZDZEgyVjAiLCJ5IjoiX0tjeUxqOXZXTXB0bm1LdG00NkdxRHo4d2Y3NEk1TEtncmwyR3pIM25TRSJ9";

    #[tokio::test]
    async fn resolve_encryption_key() {
        let resolution = DidJwk.resolve(ENC_DID, None).await;
        assert!(resolution.error().is_none());
        assert_snapshot!("enc_document", resolution.did_document);
    }

    #[tokio::test]
    async fn resolve_without_use() {
        let resolution = DidJwk.resolve(P256_DID, None).await;
        let document = resolution.did_document.expect("should resolve");

        let vm_id = format!("{P256_DID}#0");
        let vm = document.verification_method(&vm_id).expect("should have #0");
        let jwk = vm.public_key_jwk.as_ref().expect("should have key");
        assert_eq!(jwk.kty, KeyType::Ec);
        assert_eq!(jwk.crv, Some(Curve::P256));

        for rel in Relationship::ALL {
            assert_eq!(document.relationship(rel), Some(&vec![vm_id.clone()]), "{rel:?}");
        }
    }

    fn did_for(jwk: &serde_json::Value) -> String {
        let json = serde_json::to_vec(jwk).expect("should serialize");
        format!("did:jwk:{}", Base64UrlUnpadded::encode_string(&json))
    }

    // Keys on curves this crate cannot sign with still resolve.
    #[tokio::test]
    async fn resolve_other_curve() {
        let did = did_for(&serde_json::json!({
            "kty": "EC",
            "crv": "P-384",
            "x": "vlgzJl6o25KeYECdYQYkni6J1uhimAeow0f5aRe1hcaV1025V7Vh7bXbMNQjqW_d",
            "y": "PVqSBAPPJVEG76RIsSnTXeWoavnvYyBOrcboCm-lQ0FUIJjSmOXwVnwUsXpwKQMC"
        }));
        let resolution = DidJwk.resolve(&did, None).await;
        assert!(resolution.error().is_none());
        let document = resolution.did_document.expect("should resolve");

        let vm_id = format!("{did}#0");
        let vm = document.verification_method(&vm_id).expect("should have #0");
        let jwk = vm.public_key_jwk.as_ref().expect("should have key");
        assert_eq!(jwk.crv, Some(Curve::Other("P-384".into())));
        for rel in Relationship::ALL {
            assert_eq!(document.relationship(rel), Some(&vec![vm_id.clone()]), "{rel:?}");
        }

        // but cannot be used to verify signatures
        let err = Algorithm::from_jwk(jwk).expect_err("should fail");
        assert!(err.is(Err::UnsupportedAlgorithm));
    }

    #[tokio::test]
    async fn resolve_rsa_key() {
        let did = did_for(&serde_json::json!({
            "kty": "RSA",
            "n": "0vx7agoebGcQSuuPiLJXZptN9nndrQmbXEps2aiAFbWhM78LhWx4cbbfAAtVT86zwu1RK7aPFFxuhDR1L6tSoc",
            "e": "AQAB"
        }));
        let document = DidJwk.resolve(&did, None).await.did_document.expect("should resolve");

        let vm = document.verification_method(&format!("{did}#0")).expect("should have #0");
        let jwk = vm.public_key_jwk.as_ref().expect("should have key");
        assert_eq!(jwk.kty, KeyType::Rsa);
        assert!(jwk.crv.is_none());
        assert_eq!(jwk.extra.get("e"), Some(&serde_json::json!("AQAB")));
    }

    // Members without a field of their own are carried into the document.
    #[tokio::test]
    async fn resolve_keeps_members() {
        let did = did_for(&serde_json::json!({
            "kty": "OKP",
            "crv": "Ed25519",
            "x": "11qYAYKxCrfVS_7TyWQHOg7hcvPapiMlrwIaaPcHURo",
            "key_ops": ["verify"],
            "ext": true
        }));
        let document = DidJwk.resolve(&did, None).await.did_document.expect("should resolve");

        let vm = document.verification_method(&format!("{did}#0")).expect("should have #0");
        let json = serde_json::to_value(vm).expect("should serialize");
        assert_eq!(json["publicKeyJwk"]["key_ops"], serde_json::json!(["verify"]));
        assert_eq!(json["publicKeyJwk"]["ext"], true);
    }

    #[tokio::test]
    async fn resolve_signing_key() {
        let jwk = Jwk {
            crv: Some(Curve::Ed25519),
            x: Some("11qYAYKxCrfVS_7TyWQHOg7hcvPapiMlrwIaaPcHURo".into()),
            use_: Some(KeyUse::Signature),
            ..Jwk::default()
        };
        let bearer = DidJwk::from_public_key(LocalKeyManager::shared(), &jwk)
            .await
            .expect("should create");

        let document = bearer.document;
        assert!(document.key_agreement.is_none());
        assert!(document.authentication.is_some());
        assert!(document.assertion_method.is_some());
        assert!(document.capability_invocation.is_some());
        assert!(document.capability_delegation.is_some());
    }

    #[tokio::test]
    async fn resolve_undecodable() {
        for did in [
            "did:jwk:!!!",
            "did:jwk:bm90LWpzb24",
            "did:jwk:eyJrdHkiOiJPS1AifQ",
            "did:jwk:eyJrdHkiOiJPS1AiLCJjcnYiOiJFZDI1NTE5In0",
        ] {
            let resolution = DidJwk.resolve(did, None).await;
            assert_eq!(resolution.error(), Some(ResolutionError::InvalidDid), "{did}");
            assert!(resolution.did_document.is_none());
        }
    }

    #[tokio::test]
    async fn resolve_wrong_method() {
        let resolution = DidJwk.resolve("did:example:123", None).await;
        assert_eq!(resolution.error(), Some(ResolutionError::MethodNotSupported));
    }

    #[tokio::test]
    async fn create_default() {
        let bearer = DidJwk.create(None, CreateOptions::default()).await.expect("should create");
        assert!(bearer.uri.starts_with("did:jwk:"));

        let vm = &bearer.document.verification_method.as_ref().expect("should have vm")[0];
        assert_eq!(vm.id, format!("{}#0", bearer.uri));
        assert_eq!(vm.controller, bearer.uri);
        let jwk = vm.public_key_jwk.as_ref().expect("should have key");
        assert_eq!(jwk.crv, Some(Curve::Ed25519));

        let resolved = DidJwk.resolve(&bearer.uri, None).await;
        assert_eq!(resolved.did_document, Some(bearer.document));
    }

    #[tokio::test]
    async fn create_options() {
        let options = CreateOptions {
            algorithm: Some(Algorithm::ES256K),
            ..CreateOptions::default()
        };
        let bearer = DidJwk.create(None, options).await.expect("should create");
        let signer = bearer.signer(None).await.expect("should get signer");
        assert_eq!(signer.algorithm(), Algorithm::ES256K);

        let options = CreateOptions {
            algorithm: Some(Algorithm::EdDSA),
            verification_methods: Some(vec![]),
        };
        let err = DidJwk.create(None, options).await.expect_err("should fail");
        assert!(err.is(Err::InvalidInput));
        assert!(err.to_string().contains("mutually exclusive"));
    }

    #[tokio::test]
    async fn signing_method_suffix() {
        let resolution = DidJwk.resolve(ENC_DID, None).await;
        let document = resolution.did_document.expect("should resolve");

        let vm = DidJwk.signing_method(&document, None).expect("should select");
        assert_eq!(vm.map(|vm| vm.id), Some(format!("{ENC_DID}#0")));
        assert!(DidJwk.signing_method(&document, Some("#1")).expect("should select").is_none());

        let other = Document {
            id: "did:example:123".into(),
            ..Document::default()
        };
        let err = DidJwk.signing_method(&other, None).expect_err("should fail");
        assert!(err.is(Err::MethodNotSupported));
    }

    #[tokio::test]
    async fn from_keys() {
        let bearer = DidJwk.create(None, CreateOptions::default()).await.expect("should create");
        let portable = bearer.export().await.expect("should export");
        assert_eq!(portable.did, bearer.uri);
        assert_eq!(portable.verification_methods.len(), 1);

        let restored =
            DidJwk.from_keys(None, &portable.verification_methods).await.expect("should restore");
        assert_eq!(restored.uri, bearer.uri);
        assert_eq!(restored.document, bearer.document);

        let restored = DidJwk::from_portable(None, &portable).await.expect("should restore");
        assert_eq!(restored.uri, bearer.uri);

        let vm = &portable.verification_methods[0];
        let err = DidJwk.from_keys(None, &[vm.clone(), vm.clone()]).await.expect_err("should fail");
        assert_eq!(
            err.to_string(),
            "Only one verification method can be specified but 2 were given"
        );
    }
}
