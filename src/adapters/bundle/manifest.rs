//! Signed bundle manifest.
//!
//! `manifest.json` lists the SHA-256 of every bundle resource; `bundle.sig`
//! holds the raw 64-byte Ed25519 signature over the exact manifest bytes.

use std::collections::BTreeMap;

use base64::Engine;
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::ArtifactError;

/// Current manifest format version.
pub const MANIFEST_VERSION: u32 = 1;

/// Allowed clock skew for `created_at`, in seconds.
const MAX_CLOCK_SKEW_SECS: i64 = 300;

/// Contents of `manifest.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleManifest {
    pub version: u32,
    /// Monotonic release number (CI build number or timestamp)
    pub serial: u64,
    /// Unix timestamp (seconds) when the manifest was written
    pub created_at: i64,
    /// Resource file name -> lowercase hex SHA-256
    pub files: BTreeMap<String, String>,
}

impl BundleManifest {
    /// Parse and sanity-check manifest bytes.
    ///
    /// # Errors
    /// Returns `ArtifactError::Integrity` on malformed or unsupported manifests.
    pub fn parse(bytes: &[u8]) -> Result<Self, ArtifactError> {
        let manifest: Self = serde_json::from_slice(bytes)
            .map_err(|e| ArtifactError::Integrity(format!("invalid manifest.json: {e}")))?;
        if manifest.version != MANIFEST_VERSION {
            return Err(ArtifactError::Integrity(format!(
                "unsupported manifest version {}",
                manifest.version
            )));
        }
        if manifest.created_at > unix_now() + MAX_CLOCK_SKEW_SECS {
            return Err(ArtifactError::Integrity(
                "manifest created_at is in the future".into(),
            ));
        }
        if manifest.files.is_empty() {
            return Err(ArtifactError::Integrity(
                "manifest.json lists no files".into(),
            ));
        }
        Ok(manifest)
    }

    /// Check that `resource` is listed and that `bytes` match its digest.
    ///
    /// # Errors
    /// Returns `ArtifactError::Integrity` if the resource is unlisted or altered.
    pub fn verify_file(&self, resource: &str, bytes: &[u8]) -> Result<(), ArtifactError> {
        let expected = self.files.get(resource).ok_or_else(|| {
            ArtifactError::Integrity(format!("manifest.json does not bind {resource}"))
        })?;
        if !constant_time_eq_str(&sha256_hex(bytes), expected) {
            return Err(ArtifactError::Integrity(format!(
                "hash mismatch for {resource}"
            )));
        }
        Ok(())
    }
}

/// Verify the Ed25519 signature over the manifest bytes.
///
/// # Errors
/// Returns `ArtifactError::Integrity` if the signature is malformed or invalid.
pub fn verify_signature(
    key: &VerifyingKey,
    manifest_bytes: &[u8],
    sig_bytes: &[u8],
) -> Result<(), ArtifactError> {
    let sig: [u8; 64] = sig_bytes.try_into().map_err(|_| {
        ArtifactError::Integrity(format!(
            "invalid signature length {} (expected 64 bytes)",
            sig_bytes.len()
        ))
    })?;
    key.verify(manifest_bytes, &Signature::from_bytes(&sig))
        .map_err(|_| ArtifactError::Integrity("invalid bundle signature".into()))
}

/// Decode a base64 Ed25519 verifying key.
///
/// # Errors
/// Returns `ArtifactError::Integrity` on bad base64, length or curve point.
pub fn verifying_key_from_b64(b64: &str) -> Result<VerifyingKey, ArtifactError> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(b64.trim())
        .map_err(|_| ArtifactError::Integrity("invalid public key base64".into()))?;
    let key: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
        ArtifactError::Integrity("invalid public key length (expected 32 bytes)".into())
    })?;
    VerifyingKey::from_bytes(&key)
        .map_err(|_| ArtifactError::Integrity("invalid verifying key".into()))
}

#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

#[must_use]
pub fn unix_now() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

fn constant_time_eq_str(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff: u8 = 0;
    for (x, y) in a.as_bytes().iter().zip(b.as_bytes()) {
        diff |= x ^ y;
    }
    diff == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::{Signer, SigningKey};

    fn manifest_for(files: &[(&str, &str)]) -> BundleManifest {
        BundleManifest {
            version: MANIFEST_VERSION,
            serial: 7,
            created_at: unix_now(),
            files: files
                .iter()
                .map(|(name, body)| ((*name).to_string(), sha256_hex(body.as_bytes())))
                .collect(),
        }
    }

    #[test]
    fn test_sha256_hex_known_vector() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_verify_file_detects_tampering() {
        let manifest = manifest_for(&[("labels.json", "[1]")]);
        assert!(manifest.verify_file("labels.json", b"[1]").is_ok());
        assert!(manifest.verify_file("labels.json", b"[2]").is_err());
        assert!(manifest.verify_file("scaler.json", b"{}").is_err());
    }

    #[test]
    fn test_parse_rejects_bad_manifests() {
        let mut manifest = manifest_for(&[("a", "a")]);
        manifest.version = 2;
        let bytes = serde_json::to_vec(&manifest).expect("serialize");
        assert!(BundleManifest::parse(&bytes).is_err());

        let mut manifest = manifest_for(&[("a", "a")]);
        manifest.created_at = unix_now() + 3600;
        let bytes = serde_json::to_vec(&manifest).expect("serialize");
        assert!(BundleManifest::parse(&bytes).is_err());

        let manifest = manifest_for(&[]);
        let bytes = serde_json::to_vec(&manifest).expect("serialize");
        assert!(BundleManifest::parse(&bytes).is_err());

        assert!(BundleManifest::parse(b"not json").is_err());
    }

    #[test]
    fn test_signature_round_trip_and_rejection() {
        let signing_key = SigningKey::from_bytes(&[7u8; 32]);
        let other_key = SigningKey::from_bytes(&[9u8; 32]);
        let bytes = br#"{"version":1}"#;
        let sig = signing_key.sign(bytes).to_bytes();

        let key = signing_key.verifying_key();
        assert!(verify_signature(&key, bytes, &sig).is_ok());
        assert!(verify_signature(&other_key.verifying_key(), bytes, &sig).is_err());
        assert!(verify_signature(&key, b"tampered", &sig).is_err());
        assert!(verify_signature(&key, bytes, &sig[..10]).is_err());
    }

    #[test]
    fn test_verifying_key_from_b64() {
        let key = SigningKey::from_bytes(&[3u8; 32]).verifying_key();
        let b64 = base64::engine::general_purpose::STANDARD.encode(key.as_bytes());
        assert_eq!(verifying_key_from_b64(&format!("{b64}\n")).ok(), Some(key));
        assert!(verifying_key_from_b64("!!").is_err());
        assert!(verifying_key_from_b64("AAAA").is_err());
    }
}
