//! # JSON Web Algorithms (JWA)
//!
//! JWA [RFC7518] defines a set of cryptographic algorithms for use with
//! JWS ([RFC7515]) and JWK ([RFC7517]).
//!
//! [RFC7515]: https://www.rfc-editor.org/rfc/rfc7515
//! [RFC7517]: https://www.rfc-editor.org/rfc/rfc7517
//! [RFC7518]: https://www.rfc-editor.org/rfc/rfc7518

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Err;
use crate::jose::jwk::{Curve, Jwk};
use crate::{tracerr, Result};

/// Signing algorithm supported for keys generated, imported and verified by
/// this crate.
///
/// Key generation requests accept the curve name as well as the JOSE name,
/// so `"Ed25519"` and `"EdDSA"` select the same algorithm.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq, Hash)]
pub enum Algorithm {
    /// `EdDSA` over the Ed25519 curve.
    #[default]
    #[serde(rename = "EdDSA", alias = "Ed25519")]
    EdDSA,

    /// ECDSA over the secp256k1 curve with SHA-256.
    #[serde(rename = "ES256K", alias = "secp256k1")]
    ES256K,
}

impl Algorithm {
    /// The curve keys for this algorithm are generated on.
    #[must_use]
    pub const fn curve(&self) -> Curve {
        match self {
            Self::EdDSA => Curve::Ed25519,
            Self::ES256K => Curve::Secp256k1,
        }
    }

    /// Infer the signing algorithm from a public or private key.
    ///
    /// # Errors
    ///
    /// Returns `Err::UnsupportedAlgorithm` when the key's curve cannot be used
    /// for signing by this crate.
    pub fn from_jwk(jwk: &Jwk) -> Result<Self> {
        match &jwk.crv {
            Some(Curve::Ed25519) => Ok(Self::EdDSA),
            Some(Curve::Secp256k1) => Ok(Self::ES256K),
            Some(crv) => {
                tracerr!(Err::UnsupportedAlgorithm, "no signature algorithm for curve {crv}")
            }
            None => {
                tracerr!(Err::UnsupportedAlgorithm, "no signature algorithm for {} keys", jwk.kty)
            }
        }
    }
}

impl Display for Algorithm {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EdDSA => write!(f, "EdDSA"),
            Self::ES256K => write!(f, "ES256K"),
        }
    }
}

impl FromStr for Algorithm {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "EdDSA" | "Ed25519" => Ok(Self::EdDSA),
            "ES256K" | "secp256k1" => Ok(Self::ES256K),
            _ => tracerr!(Err::UnsupportedAlgorithm, "unsupported algorithm: {s}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_aliases() {
        assert_eq!(Algorithm::from_str("Ed25519").expect("should parse"), Algorithm::EdDSA);
        assert_eq!(Algorithm::from_str("secp256k1").expect("should parse"), Algorithm::ES256K);
        assert!(Algorithm::from_str("RS256").is_err());

        let alg: Algorithm = serde_json::from_str(r#""secp256k1""#).expect("should deserialize");
        assert_eq!(alg, Algorithm::ES256K);
        assert_eq!(serde_json::to_string(&alg).expect("should serialize"), r#""ES256K""#);
    }

    #[test]
    fn unsigned_curves() {
        for crv in ["X25519", "P-256", "P-384", "Ed448"] {
            let jwk: Jwk = serde_json::from_value(serde_json::json!({
                "kty": "EC", "crv": crv, "x": "AAAA", "y": "BBBB"
            }))
            .expect("should deserialize");
            let err = Algorithm::from_jwk(&jwk).expect_err("should fail");
            assert!(err.is(Err::UnsupportedAlgorithm));
            assert_eq!(err.to_string(), format!("no signature algorithm for curve {crv}"));
        }

        let rsa: Jwk = serde_json::from_str(r#"{"kty":"RSA","n":"0vx7","e":"AQAB"}"#)
            .expect("should deserialize");
        let err = Algorithm::from_jwk(&rsa).expect_err("should fail");
        assert_eq!(err.to_string(), "no signature algorithm for RSA keys");
    }
}
