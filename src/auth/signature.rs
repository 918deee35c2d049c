use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rsa::pkcs1::DecodeRsaPublicKey;
use rsa::pkcs1v15::{Signature, VerifyingKey};
use rsa::pkcs8::DecodePublicKey;
use rsa::signature::Verifier;
use rsa::RsaPublicKey;
use sha2::{Digest, Sha256};

/// Capability consumed by the attendance engine. The production
/// implementation is the only place that touches RSA primitives; tests
/// substitute a deterministic stub.
pub trait SignatureVerifier: Send + Sync {
    /// Checks an RSA-SHA256 signature (base64 on the wire) against a PEM
    /// public key. Any parse or verification failure is `false`; nothing
    /// propagates.
    fn verify(&self, public_key_pem: &str, data: &str, signature_b64: &str) -> bool;

    /// True iff the PEM parses to an RSA public key.
    fn validate_public_key(&self, public_key_pem: &str) -> bool;
}

pub struct RsaSha256Verifier;

impl SignatureVerifier for RsaSha256Verifier {
    fn verify(&self, public_key_pem: &str, data: &str, signature_b64: &str) -> bool {
        let Some(key) = parse_public_key(public_key_pem) else {
            return false;
        };
        let Ok(raw) = STANDARD.decode(signature_b64) else {
            return false;
        };
        let Ok(signature) = Signature::try_from(raw.as_slice()) else {
            return false;
        };

        VerifyingKey::<Sha256>::new(key)
            .verify(data.as_bytes(), &signature)
            .is_ok()
    }

    fn validate_public_key(&self, public_key_pem: &str) -> bool {
        parse_public_key(public_key_pem).is_some()
    }
}

/// Accepts both SubjectPublicKeyInfo ("BEGIN PUBLIC KEY") and PKCS#1
/// ("BEGIN RSA PUBLIC KEY") encodings, since devices differ.
fn parse_public_key(pem: &str) -> Option<RsaPublicKey> {
    RsaPublicKey::from_public_key_pem(pem)
        .ok()
        .or_else(|| RsaPublicKey::from_pkcs1_pem(pem).ok())
}

/// SHA-256 of the serialized JSON value, hex-encoded. Used for audit
/// content hashes.
pub fn sha256_hex_json(value: &serde_json::Value) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.to_string().as_bytes());
    hex::encode(hasher.finalize())
}
