//! Tests for creating, resolving and dereferencing `did:jwk` DIDs.

use std::sync::Arc;

use async_trait::async_trait;
use base64ct::{Base64UrlUnpadded, Encoding};
use vercre_identity::did::{
    BearerDid, CreateOptions, DidJwk, DidMethod, Document, PortableVerificationMethod, Resolution,
    ResolutionError, ResolutionOptions, Resolver, Resource, VerificationMethod,
};
use vercre_identity::error::Err;
use vercre_identity::jose::{Algorithm, Jwk};
use vercre_identity::kms::{KeyManager, LocalKeyManager};
use vercre_identity::Result;

// A created DID resolves to the same document it was created with.
#[tokio::test]
async fn create_then_resolve() {
    let key_manager = LocalKeyManager::shared();
    let bearer = DidJwk
        .create(Some(Arc::clone(&key_manager)), CreateOptions::default())
        .await
        .expect("should create");

    let resolution = Resolver::default().resolve(&bearer.uri, None).await;
    assert!(resolution.error().is_none());
    assert_eq!(resolution.did_document.as_ref(), Some(&bearer.document));

    // the DID encodes exactly the public key in the document
    let encoded = bearer.uri.strip_prefix("did:jwk:").expect("should be did:jwk");
    let decoded = Base64UrlUnpadded::decode_vec(encoded).expect("should decode");
    let jwk: Jwk = serde_json::from_slice(&decoded).expect("should be a JWK");
    assert!(!jwk.is_private());

    let vm_id = format!("{}#0", bearer.uri);
    let vm = bearer.document.verification_method(&vm_id).expect("should have #0");
    assert_eq!(vm.public_key_jwk.as_ref(), Some(&jwk));

    // the key manager holds the private key
    let key_uri = key_manager.key_uri(&jwk).expect("should compute key uri");
    assert_eq!(key_manager.public_key(&key_uri).await.expect("should find key"), jwk);
}

// Mutually exclusive options are rejected before any key is generated.
#[tokio::test]
async fn exclusive_options() {
    let options = CreateOptions {
        algorithm: Some(Algorithm::EdDSA),
        verification_methods: Some(vec![Default::default()]),
    };
    let err = DidJwk.create(None, options).await.expect_err("should fail");
    assert!(err.is(Err::InvalidInput));
    assert_eq!(
        err.to_string(),
        "The 'algorithm' and 'verificationMethods' options are mutually exclusive"
    );
}

#[tokio::test]
async fn from_keys_requires_key_pair() {
    let bearer = DidJwk.create(None, CreateOptions::default()).await.expect("should create");
    let mut portable = bearer.export().await.expect("should export");
    portable.verification_methods[0].private_key_jwk = None;

    let err = DidJwk
        .from_keys(None, &portable.verification_methods)
        .await
        .expect_err("should fail");
    assert!(err.is(Err::InvalidInput));

    let err = DidJwk.from_keys(None, &[]).await.expect_err("should fail");
    assert_eq!(err.to_string(), "Only one verification method can be specified but 0 were given");
}

// Exported DIDs can be restored into a different key manager and still sign.
#[tokio::test]
async fn export_import() {
    let options = CreateOptions {
        algorithm: Some(Algorithm::ES256K),
        ..CreateOptions::default()
    };
    let bearer = DidJwk.create(None, options).await.expect("should create");
    let portable = bearer.export().await.expect("should export");

    let json = serde_json::to_string(&portable).expect("should serialize");
    let portable = serde_json::from_str(&json).expect("should deserialize");
    let restored = DidJwk::from_portable(Some(LocalKeyManager::shared()), &portable)
        .await
        .expect("should restore");
    assert_eq!(restored.uri, bearer.uri);

    let signer = restored.signer(None).await.expect("should get signer");
    let sig = signer.sign(b"payload").await.expect("should sign");
    let original = bearer.signer(None).await.expect("should get signer");
    assert!(original.verify(b"payload", &sig).await.expect("should verify"));
}

#[tokio::test]
async fn resolution_errors() {
    let resolver = Resolver::default();

    let resolution = resolver.resolve("did:jwk:!!!", None).await;
    assert_eq!(resolution.error(), Some(ResolutionError::InvalidDid));
    assert!(resolution.did_document.is_none());

    let resolution = resolver.resolve("did:unknown:abc", None).await;
    assert_eq!(resolution.error(), Some(ResolutionError::MethodNotSupported));

    let resolution = resolver.resolve("did:", None).await;
    assert_eq!(resolution.error(), Some(ResolutionError::InvalidDid));
}

#[tokio::test]
async fn dereference() {
    let bearer = DidJwk.create(None, CreateOptions::default()).await.expect("should create");
    let resolver = Resolver::default();

    let resource = resolver.dereference(&bearer.uri).await.expect("should dereference");
    assert_eq!(resource, Resource::Document(bearer.document.clone()));

    let vm_id = format!("{}#0", bearer.uri);
    let resource = resolver.dereference(&vm_id).await.expect("should dereference");
    let Resource::VerificationMethod(vm) = resource else {
        panic!("expected verification method");
    };
    assert_eq!(vm.id, vm_id);

    let err = resolver.dereference(&format!("{}#1", bearer.uri)).await.expect_err("should fail");
    assert!(err.is(Err::NotFound));
}

// A minimal method used to check the resolver dispatches by method name.
struct Static;

#[async_trait]
impl DidMethod for Static {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn create(
        &self, _: Option<Arc<dyn KeyManager>>, _: CreateOptions,
    ) -> Result<BearerDid> {
        Err(Err::NotSupported.into())
    }

    async fn from_keys(
        &self, _: Option<Arc<dyn KeyManager>>, _: &[PortableVerificationMethod],
    ) -> Result<BearerDid> {
        Err(Err::NotSupported.into())
    }

    async fn resolve(&self, did_uri: &str, _: Option<&ResolutionOptions>) -> Resolution {
        Resolution::from_document(Document {
            id: did_uri.to_string(),
            ..Document::default()
        })
    }

    fn signing_method(
        &self, _: &Document, _: Option<&str>,
    ) -> Result<Option<VerificationMethod>> {
        Ok(None)
    }
}

#[tokio::test]
async fn custom_method() {
    let resolver = Resolver::default().with_method(Arc::new(Static));

    let resolution = resolver.resolve("did:static:123", None).await;
    assert_eq!(resolution.did_document.map(|d| d.id), Some("did:static:123".to_string()));

    // did:jwk is still registered
    let bearer = DidJwk.create(None, CreateOptions::default()).await.expect("should create");
    assert!(resolver.resolve(&bearer.uri, None).await.error().is_none());
}
