//! Model bundle signing utility.
//!
//! Writes `manifest.json` (SHA-256 of every bundle resource) and `bundle.sig`
//! (Ed25519 signature over the manifest bytes) into a bundle directory.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin sign_bundle -- --generate-key <seed_path>
//! WEIGHTWISE_SIGNING_KEY_B64_FILE=<seed_path> cargo run --bin sign_bundle -- <bundle_dir> [--serial <n>]
//! ```
//!
//! The printed public key (base64) goes into `WEIGHTWISE_BUNDLE_PUBKEY_B64`.
//! The seed is zeroized after use.

use std::env;
use std::fs;
use std::io::Write;
#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose;
use base64::Engine;
use ed25519_dalek::{Signature, Signer, SigningKey};
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use weightwise::adapters::bundle::{
    sha256_hex, unix_now, BundleManifest, BUNDLE_FILES, MANIFEST_FILE, MANIFEST_VERSION,
    SIGNATURE_FILE,
};

const KEY_FILE_ENV: &str = "WEIGHTWISE_SIGNING_KEY_B64_FILE";
const KEY_ENV: &str = "WEIGHTWISE_SIGNING_KEY_B64";

#[derive(Zeroize, ZeroizeOnDrop)]
struct Seed([u8; 32]);

enum Command {
    Sign { dir: PathBuf, serial: Option<u64> },
    GenerateKey { out: PathBuf, force: bool },
}

fn usage() -> String {
    "Usage: sign_bundle <bundle_dir> [--serial <u64>]\n       sign_bundle --generate-key <seed_path> [--force]".to_string()
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Command, String> {
    let mut args = args.into_iter();
    let mut dir: Option<PathBuf> = None;
    let mut serial: Option<u64> = None;
    let mut generate: Option<PathBuf> = None;
    let mut force = false;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--serial" => {
                let v = args.next().ok_or_else(usage)?;
                serial = Some(
                    v.trim()
                        .parse::<u64>()
                        .map_err(|_| "--serial must be a u64".to_string())?,
                );
            }
            "--generate-key" => {
                generate = Some(PathBuf::from(args.next().ok_or_else(usage)?));
            }
            "--force" => force = true,
            "-h" | "--help" => return Err(usage()),
            _ if dir.is_none() => dir = Some(PathBuf::from(arg)),
            _ => return Err(usage()),
        }
    }

    match (generate, dir) {
        (Some(out), None) => Ok(Command::GenerateKey { out, force }),
        (None, Some(dir)) => Ok(Command::Sign { dir, serial }),
        _ => Err(usage()),
    }
}

fn read_signing_seed_b64() -> Result<Zeroizing<String>, String> {
    let secret = if let Ok(path) = env::var(KEY_FILE_ENV) {
        fs::read_to_string(path.trim())
            .map_err(|e| format!("Failed reading signing key file: {e}"))?
    } else if cfg!(debug_assertions) {
        // Dev-only fallback.
        env::var(KEY_ENV).map_err(|_| {
            format!("Missing signing key. Set {KEY_FILE_ENV} (or {KEY_ENV} in debug builds).")
        })?
    } else {
        return Err(format!("Missing signing key. Set {KEY_FILE_ENV}."));
    };

    let secret = Zeroizing::new(secret);
    let trimmed = Zeroizing::new(secret.trim().to_string());
    if trimmed.is_empty() {
        return Err("Empty signing key".to_string());
    }
    Ok(trimmed)
}

fn read_signing_seed() -> Result<Seed, String> {
    let b64 = read_signing_seed_b64()?;
    let raw = Zeroizing::new(
        general_purpose::STANDARD
            .decode(b64.as_bytes())
            .map_err(|e| format!("Invalid base64 in signing key: {e}"))?,
    );
    let seed: [u8; 32] = raw.as_slice().try_into().map_err(|_| {
        format!(
            "Signing key seed must be 32 bytes after base64 decode (got {})",
            raw.len()
        )
    })?;
    Ok(Seed(seed))
}

fn sign(dir: &Path, serial: Option<u64>) -> Result<(), String> {
    let seed = read_signing_seed()?;
    let signing_key = SigningKey::from_bytes(&seed.0);
    drop(seed);

    let manifest = write_signed_manifest(dir, &signing_key, serial)?;
    println!("Signed {:?} (serial {})", dir.join(MANIFEST_FILE), manifest.serial);
    println!("Wrote signature: {:?}", dir.join(SIGNATURE_FILE));
    println!(
        "WEIGHTWISE_BUNDLE_PUBKEY_B64={}",
        general_purpose::STANDARD.encode(signing_key.verifying_key().as_bytes())
    );
    Ok(())
}

/// Hash the bundle resources, then write the manifest and its signature.
fn write_signed_manifest(
    dir: &Path,
    signing_key: &SigningKey,
    serial: Option<u64>,
) -> Result<BundleManifest, String> {
    let mut files = std::collections::BTreeMap::new();
    for resource in BUNDLE_FILES {
        let path = dir.join(resource);
        let bytes = fs::read(&path).map_err(|e| format!("Failed to read {path:?}: {e}"))?;
        files.insert(resource.to_string(), sha256_hex(&bytes));
    }

    let created_at = unix_now();
    let manifest = BundleManifest {
        version: MANIFEST_VERSION,
        serial: serial.unwrap_or_else(|| u64::try_from(created_at).unwrap_or(1)),
        created_at,
        files,
    };
    let manifest_bytes = serde_json::to_vec_pretty(&manifest)
        .map_err(|e| format!("Failed to serialize {MANIFEST_FILE}: {e}"))?;

    let manifest_path = dir.join(MANIFEST_FILE);
    fs::write(&manifest_path, &manifest_bytes)
        .map_err(|e| format!("Failed to write {manifest_path:?}: {e}"))?;

    let sig: Signature = signing_key.sign(&manifest_bytes);
    let sig_path = dir.join(SIGNATURE_FILE);
    fs::write(&sig_path, sig.to_bytes())
        .map_err(|e| format!("Failed to write {sig_path:?}: {e}"))?;

    Ok(manifest)
}

fn generate_key(out: &Path, force: bool) -> Result<(), String> {
    if out.exists() && !force {
        return Err(format!(
            "Refusing to overwrite existing file {out:?}. Use --force."
        ));
    }

    let mut seed = Seed([0u8; 32]);
    OsRng.fill_bytes(&mut seed.0);
    let signing_key = SigningKey::from_bytes(&seed.0);
    let seed_b64 = Zeroizing::new(general_purpose::STANDARD.encode(seed.0));
    drop(seed);

    if let Some(parent) = out.parent() {
        fs::create_dir_all(parent).map_err(|e| format!("Failed to create {parent:?}: {e}"))?;
    }
    let mut opts = fs::OpenOptions::new();
    opts.write(true).create(true).truncate(true);
    #[cfg(unix)]
    opts.mode(0o600);

    let mut file = opts
        .open(out)
        .map_err(|e| format!("Failed to open {out:?}: {e}"))?;
    file.write_all(seed_b64.as_bytes())
        .and_then(|()| file.write_all(b"\n"))
        .map_err(|e| format!("Failed to write {out:?}: {e}"))?;

    // Only non-secret material on stdout.
    println!("Wrote signing seed (base64) to {out:?}");
    println!(
        "WEIGHTWISE_BUNDLE_PUBKEY_B64={}",
        general_purpose::STANDARD.encode(signing_key.verifying_key().as_bytes())
    );
    Ok(())
}

fn main() -> Result<(), String> {
    match parse_args(env::args().skip(1))? {
        Command::Sign { dir, serial } => sign(&dir, serial),
        Command::GenerateKey { out, force } => generate_key(&out, force),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use weightwise::adapters::{LoadOptions, ModelBundle};

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|a| (*a).to_string()).collect()
    }

    #[test]
    fn test_parse_sign_command() {
        match parse_args(args(&["models", "--serial", " 42 "])) {
            Ok(Command::Sign { dir, serial }) => {
                assert_eq!(dir, PathBuf::from("models"));
                assert_eq!(serial, Some(42));
            }
            _ => panic!("expected sign command"),
        }
        assert!(matches!(
            parse_args(args(&["models"])),
            Ok(Command::Sign { serial: None, .. })
        ));
    }

    #[test]
    fn test_parse_generate_key_command() {
        assert!(matches!(
            parse_args(args(&["--generate-key", "seed.b64", "--force"])),
            Ok(Command::GenerateKey { force: true, .. })
        ));
        assert!(matches!(
            parse_args(args(&["--generate-key", "seed.b64"])),
            Ok(Command::GenerateKey { force: false, .. })
        ));
    }

    #[test]
    fn test_parse_rejects_bad_arguments() {
        assert!(parse_args(args(&[])).is_err());
        assert!(parse_args(args(&["--help"])).is_err());
        assert!(parse_args(args(&["a", "b"])).is_err());
        assert!(parse_args(args(&["models", "--serial", "-1"])).is_err());
        assert!(parse_args(args(&["models", "--serial"])).is_err());
        assert!(parse_args(args(&["models", "--generate-key", "seed.b64"])).is_err());
    }

    #[test]
    fn test_signed_manifest_loads_with_matching_key() {
        let dir = tempdir().expect("tempdir");
        let source = Path::new(env!("CARGO_MANIFEST_DIR")).join("models");
        for resource in BUNDLE_FILES {
            fs::copy(source.join(resource), dir.path().join(resource)).expect("copy");
        }

        let signing_key = SigningKey::from_bytes(&[9u8; 32]);
        let manifest = write_signed_manifest(dir.path(), &signing_key, Some(7)).expect("signs");
        assert_eq!(manifest.serial, 7);
        assert_eq!(manifest.files.len(), BUNDLE_FILES.len());

        let options = LoadOptions {
            allow_unsigned: false,
            verifying_key: Some(signing_key.verifying_key()),
        };
        let bundle = ModelBundle::load(dir.path(), &options).expect("verified load");
        assert_eq!(bundle.manifest().map(|m| m.serial), Some(7));

        let other = SigningKey::from_bytes(&[3u8; 32]);
        let options = LoadOptions {
            allow_unsigned: false,
            verifying_key: Some(other.verifying_key()),
        };
        assert!(ModelBundle::load(dir.path(), &options).is_err());
    }

    #[test]
    fn test_missing_resource_fails_signing() {
        let dir = tempdir().expect("tempdir");
        let signing_key = SigningKey::from_bytes(&[9u8; 32]);
        let err = write_signed_manifest(dir.path(), &signing_key, None).expect_err("missing");
        assert!(err.contains("Failed to read"));
        assert!(!dir.path().join(MANIFEST_FILE).exists());
    }
}
