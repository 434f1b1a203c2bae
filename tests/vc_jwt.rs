//! Tests for signing and verifying Verifiable Credentials as JWTs.

use base64ct::{Base64UrlUnpadded, Encoding};
use serde_json::{json, Map, Value};
use vercre_identity::did::{BearerDid, CreateOptions as DidOptions, DidJwk, DidMethod, Resolver};
use vercre_identity::error::Err;
use vercre_identity::jose::{jwt, Algorithm, JwtPayload};
use vercre_identity::vc::{self, VerifiableCredential};

async fn issuer(algorithm: Algorithm) -> BearerDid {
    let options = DidOptions {
        algorithm: Some(algorithm),
        ..DidOptions::default()
    };
    DidJwk.create(None, options).await.expect("should create DID")
}

fn credential(did: &BearerDid) -> VerifiableCredential {
    VerifiableCredential::create(vc::CreateOptions {
        type_: Some("EmployeeCredential".into()),
        issuer: did.uri.clone(),
        subject: did.uri.clone(),
        data: json!({"employer": "Acme", "role": "engineer"}),
        ..vc::CreateOptions::default()
    })
    .expect("should create credential")
}

#[tokio::test]
async fn sign_then_verify() {
    for algorithm in [Algorithm::EdDSA, Algorithm::ES256K] {
        let did = issuer(algorithm).await;
        let vc = credential(&did);

        let vc_jwt = vc.sign(&did).await.expect("should sign");
        let verified = VerifiableCredential::verify(&vc_jwt, &Resolver::default())
            .await
            .expect("should verify");

        assert_eq!(verified.issuer, did.uri);
        assert_eq!(verified.subject, did.uri);
        assert_eq!(verified.vc, vc.vc_data_model);
    }
}

// Changing one character of the payload breaks verification.
#[tokio::test]
async fn tampered() {
    let did = issuer(Algorithm::EdDSA).await;
    let vc_jwt = credential(&did).sign(&did).await.expect("should sign");

    let parts: Vec<&str> = vc_jwt.split('.').collect();
    let mut payload: Vec<char> = parts[1].chars().collect();
    let mid = payload.len() / 2;
    payload[mid] = if payload[mid] == 'A' { 'B' } else { 'A' };
    let payload: String = payload.into_iter().collect();
    let tampered = format!("{}.{payload}.{}", parts[0], parts[2]);

    VerifiableCredential::verify(&tampered, &Resolver::default())
        .await
        .expect_err("tampered credential should fail");
}

#[tokio::test]
async fn malformed_jwt() {
    let err = VerifiableCredential::verify("not-a-jwt", &Resolver::default())
        .await
        .expect_err("should fail");
    assert!(err.to_string().contains("Malformed JWT"));

    let err = VerifiableCredential::parse_jwt("not-a-jwt").expect_err("should fail");
    assert!(err.to_string().contains("Malformed JWT"));
}

// A signed JWT without a `vc` claim fails differently from one whose `vc`
// claim is not a credential.
#[tokio::test]
async fn missing_and_malformed_claim() {
    let did = issuer(Algorithm::EdDSA).await;
    let resolver = Resolver::default();

    let payload = JwtPayload {
        iss: Some(did.uri.clone()),
        ..JwtPayload::default()
    };
    let token = jwt::sign(&did, &payload, None).await.expect("should sign");
    let missing = VerifiableCredential::verify(&token, &resolver).await.expect_err("should fail");
    assert!(missing.is(Err::InvalidFormat));
    assert_eq!(missing.to_string(), "Jwt payload missing vc property");

    let err = VerifiableCredential::parse_jwt(&token).expect_err("should fail");
    assert_eq!(err.to_string(), "Jwt payload missing vc property");

    let mut claims = Map::new();
    claims.insert("vc".into(), Value::String("not a credential".into()));
    let payload = JwtPayload {
        iss: Some(did.uri.clone()),
        claims,
        ..JwtPayload::default()
    };
    let token = jwt::sign(&did, &payload, None).await.expect("should sign");
    let malformed = VerifiableCredential::verify(&token, &resolver).await.expect_err("should fail");
    assert!(malformed.is(Err::InvalidFormat));
    assert_ne!(malformed.to_string(), missing.to_string());
}

#[tokio::test]
async fn expired_credential() {
    let did = issuer(Algorithm::EdDSA).await;
    let now = chrono::Utc::now();
    let vc = VerifiableCredential::create(vc::CreateOptions {
        issuer: did.uri.clone(),
        subject: did.uri.clone(),
        data: json!({"a": 1}),
        issuance_date: Some(now - chrono::Duration::days(30)),
        expiration_date: Some(now - chrono::Duration::days(1)),
        ..vc::CreateOptions::default()
    })
    .expect("should create");

    let vc_jwt = vc.sign(&did).await.expect("should sign");
    let err = VerifiableCredential::verify(&vc_jwt, &Resolver::default())
        .await
        .expect_err("should fail");
    assert!(err.is(Err::Expired));
}

// `parse_jwt` trusts nothing: it decodes a token with a bad signature.
#[tokio::test]
async fn parse_unverified() {
    let did = issuer(Algorithm::EdDSA).await;
    let vc = credential(&did);
    let vc_jwt = vc.sign(&did).await.expect("should sign");

    let parts: Vec<&str> = vc_jwt.split('.').collect();
    let bad_sig = Base64UrlUnpadded::encode_string(&[0u8; 64]);
    let forged = format!("{}.{}.{bad_sig}", parts[0], parts[1]);

    let parsed = VerifiableCredential::parse_jwt(&forged).expect("should parse");
    assert_eq!(parsed, vc);

    VerifiableCredential::verify(&forged, &Resolver::default())
        .await
        .expect_err("should fail verification");
}
