//! # Key Management
//!
//! The key management capability DID methods and JWT proofs depend on. Keys
//! are addressed by key URI; this crate never touches private key material
//! except through a [`KeyManager`].
//!
//! [`LocalKeyManager`] is an in-process reference implementation that holds
//! keys in memory for the lifetime of the manager.

mod ed25519;
mod secp256k1;

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::error::Err;
use crate::jose::{Algorithm, Curve, Jwk};
use crate::{tracerr, Result};

/// Prefix of key URIs derived from a JWK thumbprint.
pub const KEY_URI_PREFIX: &str = "urn:jwk:";

/// Key generation, storage and signing provider. The `self` reference allows
/// for configuration information such as key store location and credentials.
///
/// Implementations must be safe to call concurrently: the same manager is
/// shared by every [`crate::did::BearerDid`] created with it.
#[async_trait]
pub trait KeyManager: Send + Sync {
    /// Generate a new key pair for the algorithm and return its key URI.
    async fn generate_key(&self, algorithm: Algorithm) -> Result<String>;

    /// Get the public key for the key URI.
    async fn public_key(&self, key_uri: &str) -> Result<Jwk>;

    /// Import a private key, returning the key URI it can be addressed by.
    async fn import_key(&self, private_key: &Jwk) -> Result<String>;

    /// Sign the message with the key addressed by the key URI.
    async fn sign(&self, key_uri: &str, msg: &[u8]) -> Result<Vec<u8>>;

    /// Verify a signature over `msg` with the public key. Returns `false` when
    /// the signature does not match.
    async fn verify(&self, public_key: &Jwk, msg: &[u8], signature: &[u8]) -> Result<bool> {
        verify(public_key, msg, signature)
    }

    /// Export the private key addressed by the key URI. Managers backed by
    /// hardware or remote vaults will typically not support this.
    async fn export_key(&self, key_uri: &str) -> Result<Jwk> {
        tracerr!(Err::NotSupported, "key manager does not support exporting key {key_uri}")
    }

    /// The key URI the manager uses for the key.
    fn key_uri(&self, key: &Jwk) -> Result<String> {
        key_uri(key)
    }
}

/// Compute the default key URI for a key: `urn:jwk:<thumbprint>`.
///
/// # Errors
///
/// Returns an error if the key thumbprint cannot be computed.
pub fn key_uri(key: &Jwk) -> Result<String> {
    Ok(format!("{KEY_URI_PREFIX}{}", key.thumbprint()?))
}

/// Verify a signature over `msg` using the public key.
///
/// # Errors
///
/// Returns `Err::InvalidKey` if the key is malformed and
/// `Err::UnsupportedAlgorithm` if the key's curve is not a signing curve.
pub fn verify(public_key: &Jwk, msg: &[u8], signature: &[u8]) -> Result<bool> {
    let Some(crv) = &public_key.crv else {
        let kty = &public_key.kty;
        tracerr!(Err::UnsupportedAlgorithm, "cannot verify signatures with {kty} keys");
    };
    match crv {
        Curve::Ed25519 => ed25519::verify(public_key, msg, signature),
        Curve::Secp256k1 => secp256k1::verify(public_key, msg, signature),
        _ => tracerr!(Err::UnsupportedAlgorithm, "cannot verify signatures with {crv} keys"),
    }
}

/// In-memory key manager. Keys disappear when the last clone of the manager is
/// dropped.
#[derive(Clone, Default)]
pub struct LocalKeyManager {
    keys: Arc<RwLock<HashMap<String, Jwk>>>,
}

impl LocalKeyManager {
    /// Create a new, empty key manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new key manager wrapped for sharing between DIDs.
    #[must_use]
    pub fn shared() -> Arc<dyn KeyManager> {
        Arc::new(Self::new())
    }

    fn private_key(&self, key_uri: &str) -> Result<Jwk> {
        let keys = match self.keys.read() {
            Ok(keys) => keys,
            Err(e) => tracerr!(Err::NotFound, "key store unavailable: {e}"),
        };
        let Some(key) = keys.get(key_uri) else {
            tracerr!(Err::KeyNotFound, "key not found: {key_uri}");
        };
        Ok(key.clone())
    }

    fn store(&self, private_key: Jwk) -> Result<String> {
        let key_uri = key_uri(&private_key)?;
        let mut keys = match self.keys.write() {
            Ok(keys) => keys,
            Err(e) => tracerr!(Err::SigningError, "key store unavailable: {e}"),
        };
        keys.insert(key_uri.clone(), private_key);
        Ok(key_uri)
    }
}

#[async_trait]
impl KeyManager for LocalKeyManager {
    async fn generate_key(&self, algorithm: Algorithm) -> Result<String> {
        let private_key = match algorithm {
            Algorithm::EdDSA => ed25519::generate(),
            Algorithm::ES256K => secp256k1::generate()?,
        };
        let key_uri = self.store(private_key)?;
        tracing::debug!("generated {algorithm} key {key_uri}");
        Ok(key_uri)
    }

    async fn public_key(&self, key_uri: &str) -> Result<Jwk> {
        Ok(self.private_key(key_uri)?.to_public())
    }

    async fn import_key(&self, private_key: &Jwk) -> Result<String> {
        if !private_key.is_private() {
            tracerr!(Err::InvalidKey, "imported key must contain private key material");
        }
        Algorithm::from_jwk(private_key)?;

        let key_uri = self.store(private_key.clone())?;
        tracing::debug!("imported key {key_uri}");
        Ok(key_uri)
    }

    async fn sign(&self, key_uri: &str, msg: &[u8]) -> Result<Vec<u8>> {
        let private_key = self.private_key(key_uri)?;
        match Algorithm::from_jwk(&private_key)? {
            Algorithm::EdDSA => ed25519::sign(&private_key, msg),
            Algorithm::ES256K => secp256k1::sign(&private_key, msg),
        }
    }

    async fn export_key(&self, key_uri: &str) -> Result<Jwk> {
        self.private_key(key_uri)
    }
}
