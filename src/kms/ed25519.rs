//! Ed25519 key pairs.

use base64ct::{Base64UrlUnpadded, Encoding};
use ed25519_dalek::{Signature, Signer as _, SigningKey, Verifier as _, VerifyingKey};
use rand::rngs::OsRng;

use crate::error::Err;
use crate::jose::{Curve, Jwk, KeyType};
use crate::{tracerr, Result};

/// Generate a new key pair, expressed as a private JWK.
pub fn generate() -> Jwk {
    let signing_key = SigningKey::generate(&mut OsRng);
    Jwk {
        kty: KeyType::Okp,
        crv: Some(Curve::Ed25519),
        x: Some(Base64UrlUnpadded::encode_string(signing_key.verifying_key().as_bytes())),
        d: Some(Base64UrlUnpadded::encode_string(signing_key.as_bytes())),
        ..Jwk::default()
    }
}

/// Sign a message with the private key.
pub fn sign(private_key: &Jwk, msg: &[u8]) -> Result<Vec<u8>> {
    let secret: [u8; 32] = key_bytes("d", private_key.d.as_deref())?;
    let signing_key = SigningKey::from_bytes(&secret);
    Ok(signing_key.sign(msg).to_bytes().to_vec())
}

/// Verify a signature with the public key.
pub fn verify(public_key: &Jwk, msg: &[u8], sig: &[u8]) -> Result<bool> {
    let x: [u8; 32] = key_bytes("x", public_key.x.as_deref())?;
    let verifying_key = match VerifyingKey::from_bytes(&x) {
        Ok(key) => key,
        Err(e) => tracerr!(Err::InvalidKey, "unable to build verifying key: {e}"),
    };
    let Ok(signature) = Signature::from_slice(sig) else {
        tracing::debug!("signature is not a valid Ed25519 signature");
        return Ok(false);
    };
    Ok(verifying_key.verify(msg, &signature).is_ok())
}

fn key_bytes(name: &str, value: Option<&str>) -> Result<[u8; 32]> {
    let bytes = Jwk::decode_member(name, value)?;
    let len = bytes.len();
    let Ok(bytes) = bytes.try_into() else {
        tracerr!(Err::InvalidKey, "invalid '{name}' length. Expected 32 bytes, got {len}");
    };
    Ok(bytes)
}
