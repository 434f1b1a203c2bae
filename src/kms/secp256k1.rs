//! secp256k1 key pairs (`ES256K`).

use base64ct::{Base64UrlUnpadded, Encoding};
use k256::ecdsa::signature::{Signer as _, Verifier as _};
use k256::ecdsa::{Signature, SigningKey, VerifyingKey};
use rand::rngs::OsRng;

use crate::error::Err;
use crate::jose::{Curve, Jwk, KeyType};
use crate::{tracerr, Result};

/// Generate a new key pair, expressed as a private JWK.
pub fn generate() -> Result<Jwk> {
    let signing_key = SigningKey::random(&mut OsRng);
    let point = signing_key.verifying_key().to_encoded_point(false);
    let (Some(x), Some(y)) = (point.x(), point.y()) else {
        tracerr!(Err::InvalidKey, "generated key is not an uncompressed point");
    };

    Ok(Jwk {
        kty: KeyType::Ec,
        crv: Some(Curve::Secp256k1),
        x: Some(Base64UrlUnpadded::encode_string(x)),
        y: Some(Base64UrlUnpadded::encode_string(y)),
        d: Some(Base64UrlUnpadded::encode_string(&signing_key.to_bytes())),
        ..Jwk::default()
    })
}

/// Sign a message with the private key. The message is hashed with SHA-256
/// and the signature returned in compact `r || s` form.
pub fn sign(private_key: &Jwk, msg: &[u8]) -> Result<Vec<u8>> {
    let secret = Jwk::decode_member("d", private_key.d.as_deref())?;
    let signing_key = match SigningKey::from_slice(&secret) {
        Ok(key) => key,
        Err(e) => tracerr!(Err::InvalidKey, "unable to build signing key: {e}"),
    };
    let signature: Signature = signing_key.sign(msg);
    Ok(signature.to_bytes().to_vec())
}

/// Verify a signature with the public key.
pub fn verify(public_key: &Jwk, msg: &[u8], sig: &[u8]) -> Result<bool> {
    // uncompressed SEC1 point
    let mut sec1 = vec![0x04];
    sec1.append(&mut Jwk::decode_member("x", public_key.x.as_deref())?);
    sec1.append(&mut Jwk::decode_member("y", public_key.y.as_deref())?);

    let verifying_key = match VerifyingKey::from_sec1_bytes(&sec1) {
        Ok(key) => key,
        Err(e) => tracerr!(Err::InvalidKey, "unable to build verifying key: {e}"),
    };
    let Ok(signature) = Signature::from_slice(sig) else {
        tracing::debug!("signature is not a valid secp256k1 signature");
        return Ok(false);
    };
    let normalised = signature.normalize_s().unwrap_or(signature);

    Ok(verifying_key.verify(msg, &normalised).is_ok())
}
