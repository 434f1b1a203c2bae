//! # JSON Web Key (JWK)
//!
//! A JWK ([RFC7517]) is a JSON representation of a cryptographic key.
//!
//! See [RFC7517] for more detail.
//!
//! [RFC7517]: https://www.rfc-editor.org/rfc/rfc7517

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use base64ct::{Base64UrlUnpadded, Encoding};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::error::Err;
use crate::{tracerr, Result};

/// Members that only appear on private keys.
const PRIVATE_MEMBERS: [&str; 6] = ["d", "p", "q", "dp", "dq", "qi"];

/// Simplified JSON Web Key (JWK) key structure.
///
/// Public and private forms share every member except the private key
/// material. Members without a field of their own, such as `key_ops` or the
/// RSA modulus, are kept in `extra` so a key survives a round trip unchanged.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Jwk {
    /// Key type.
    pub kty: KeyType,

    /// Cryptographic curve type. Not present for RSA keys.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crv: Option<Curve>,

    /// X coordinate (or the public key itself for octet key pairs).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,

    /// Y coordinate. Only present for EC keys.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<String>,

    /// Private key material. Only present on private keys.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub d: Option<String>,

    /// Use of the key.
    #[serde(rename = "use")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_: Option<KeyUse>,

    /// Key identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,

    /// Algorithm the key is intended for, e.g. "`EdDSA`".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,

    /// Any other members.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Jwk {
    /// True when the key carries private key material.
    #[must_use]
    pub const fn is_private(&self) -> bool {
        self.d.is_some()
    }

    /// The public form of the key: every member except private key material.
    #[must_use]
    pub fn to_public(&self) -> Self {
        let mut public = Self {
            d: None,
            ..self.clone()
        };
        public.extra.retain(|k, _| !PRIVATE_MEMBERS.contains(&k.as_str()));
        public
    }

    /// Whether two keys describe the same key pair, i.e. they agree on the
    /// members that make up the public key.
    #[must_use]
    pub fn same_key(&self, other: &Self) -> bool {
        self.kty == other.kty
            && self.crv == other.crv
            && self.x == other.x
            && self.y == other.y
            && self.extra.get("n") == other.extra.get("n")
            && self.extra.get("e") == other.extra.get("e")
    }

    /// Compute the JWK thumbprint as specified in [RFC7638]: the SHA-256 hash
    /// of the required members serialized in lexicographic order, base64url
    /// encoded.
    ///
    /// [RFC7638]: https://www.rfc-editor.org/rfc/rfc7638
    ///
    /// # Errors
    ///
    /// Returns `Err::InvalidKey` when a member required for the key type is
    /// missing and `Err::NotSupported` for unknown key types.
    pub fn thumbprint(&self) -> Result<String> {
        let mut members = BTreeMap::new();
        members.insert("kty", self.kty.to_string());
        match self.kty {
            KeyType::Okp | KeyType::Ec => {
                let Some(crv) = &self.crv else {
                    tracerr!(Err::InvalidKey, "{} key is missing crv", self.kty);
                };
                members.insert("crv", crv.to_string());
                members.insert("x", self.required("x", self.x.as_deref())?);
                if self.kty == KeyType::Ec {
                    members.insert("y", self.required("y", self.y.as_deref())?);
                }
            }
            KeyType::Rsa => {
                for name in ["n", "e"] {
                    let value = self.extra.get(name).and_then(Value::as_str);
                    members.insert(name, self.required(name, value)?);
                }
            }
            KeyType::Other(_) => {
                tracerr!(Err::NotSupported, "no thumbprint for {} keys", self.kty);
            }
        }

        let canonical = serde_json::to_vec(&members)?;
        Ok(Base64UrlUnpadded::encode_string(&Sha256::digest(canonical)))
    }

    fn required(&self, name: &str, value: Option<&str>) -> Result<String> {
        let Some(value) = value else {
            tracerr!(Err::InvalidKey, "{} key is missing {name}", self.kty);
        };
        Ok(value.to_string())
    }

    /// Decode a base64url member of the key into raw bytes.
    pub(crate) fn decode_member(name: &str, value: Option<&str>) -> Result<Vec<u8>> {
        let Some(value) = value else {
            tracerr!(Err::InvalidKey, "key is missing '{name}'");
        };
        match Base64UrlUnpadded::decode_vec(value) {
            Ok(bytes) => Ok(bytes),
            Err(e) => tracerr!(Err::InvalidKey, "invalid '{name}' encoding: {e}"),
        }
    }
}

/// Cryptographic key type.
#[derive(Clone, Debug, Default, Deserialize, Serialize, Eq, PartialEq)]
pub enum KeyType {
    /// Octet key pair (Edwards or Montgomery curve).
    #[default]
    #[serde(rename = "OKP")]
    Okp,

    /// Elliptic curve key pair.
    #[serde(rename = "EC")]
    Ec,

    /// RSA key pair.
    #[serde(rename = "RSA")]
    Rsa,

    /// Any other key type. Such keys can be resolved but not used.
    #[serde(untagged)]
    Other(String),
}

impl Display for KeyType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Okp => write!(f, "OKP"),
            Self::Ec => write!(f, "EC"),
            Self::Rsa => write!(f, "RSA"),
            Self::Other(kty) => write!(f, "{kty}"),
        }
    }
}

/// Cryptographic curve type.
#[derive(Clone, Debug, Default, Deserialize, Serialize, Eq, PartialEq)]
pub enum Curve {
    /// Ed25519 signature curve.
    #[default]
    Ed25519,

    /// X25519 key agreement curve.
    X25519,

    /// secp256k1 curve.
    #[serde(rename = "secp256k1")]
    Secp256k1,

    /// NIST P-256 curve.
    #[serde(rename = "P-256")]
    P256,

    /// Any other curve, e.g. `P-384` or `Ed448`. Such keys can be resolved
    /// but not used.
    #[serde(untagged)]
    Other(String),
}

impl Display for Curve {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ed25519 => write!(f, "Ed25519"),
            Self::X25519 => write!(f, "X25519"),
            Self::Secp256k1 => write!(f, "secp256k1"),
            Self::P256 => write!(f, "P-256"),
            Self::Other(crv) => write!(f, "{crv}"),
        }
    }
}

/// The intended usage of the public key.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub enum KeyUse {
    /// Public key is to be used for signature verification.
    #[serde(rename = "sig")]
    Signature,

    /// Public key is to be used for encryption.
    #[serde(rename = "enc")]
    Encryption,
}
