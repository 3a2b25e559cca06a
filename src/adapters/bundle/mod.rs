//! Model bundle adapter: loads the pre-trained artifacts from a directory.
//!
//! A bundle is five JSON resources exported by the training notebook:
//!
//! | File | Content |
//! |---|---|
//! | `feature_names.json` | feature schema, in training column order |
//! | `scaler.json` | fitted scaler over the numeric columns |
//! | `classifier.json` | multinomial linear model |
//! | `labels.json` | class names in class-index order |
//! | `metadata.json` | model name and evaluation scores |
//!
//! # Integrity
//!
//! When `manifest.json` and `bundle.sig` are present, the Ed25519 signature
//! over the manifest is verified and every resource must match its listed
//! SHA-256. The digest is checked on the same bytes that are parsed.
//! Bundles without a manifest load only with `allow_unsigned`.
//!
//! Write the manifest with `cargo run --bin sign_bundle -- <bundle_dir>`.

mod manifest;

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use ed25519_dalek::VerifyingKey;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

pub use manifest::{
    sha256_hex, unix_now, verify_signature, verifying_key_from_b64, BundleManifest,
    MANIFEST_VERSION,
};

use super::linear::LinearClassifier;
use super::scaler::FittedScaler;
use crate::domain::{FeatureSchema, LabelMapping, ONE_HOT_GROUPS};
use crate::ports::{Classifier, Scaler};

pub const SCHEMA_FILE: &str = "feature_names.json";
pub const SCALER_FILE: &str = "scaler.json";
pub const CLASSIFIER_FILE: &str = "classifier.json";
pub const LABELS_FILE: &str = "labels.json";
pub const METADATA_FILE: &str = "metadata.json";
pub const MANIFEST_FILE: &str = "manifest.json";
pub const SIGNATURE_FILE: &str = "bundle.sig";

/// Every resource a manifest must bind.
pub const BUNDLE_FILES: [&str; 5] = [
    SCHEMA_FILE,
    SCALER_FILE,
    CLASSIFIER_FILE,
    LABELS_FILE,
    METADATA_FILE,
];

/// Errors raised while loading a bundle. Every variant names the resource.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ArtifactError {
    #[error("Bundle resource {resource} not found in {dir}")]
    Missing { resource: String, dir: String },

    #[error("Failed to read {resource}: {reason}")]
    Unreadable { resource: String, reason: String },

    #[error("Invalid {resource}: {reason}")]
    Corrupt { resource: String, reason: String },

    #[error("Bundle integrity check failed: {0}")]
    Integrity(String),

    #[error("Bundle at {0} is unsigned; set WEIGHTWISE_ALLOW_UNSIGNED_BUNDLES=true to load it")]
    Unsigned(String),
}

fn corrupt(resource: &str, reason: impl ToString) -> ArtifactError {
    ArtifactError::Corrupt {
        resource: resource.to_string(),
        reason: reason.to_string(),
    }
}

/// Training metadata shipped with the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub model_name: String,
    pub accuracy: f64,
    pub f1_score: f64,
    #[serde(default)]
    pub trained_at: Option<DateTime<Utc>>,
}

impl ModelMetadata {
    fn validate(&self) -> Result<(), String> {
        if self.model_name.trim().is_empty() {
            return Err("model_name is empty".into());
        }
        for (name, score) in [("accuracy", self.accuracy), ("f1_score", self.f1_score)] {
            if !(0.0..=1.0).contains(&score) {
                return Err(format!("{name} {score} is outside 0..=1"));
            }
        }
        Ok(())
    }
}

/// Options for [`ModelBundle::load`].
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Accept a bundle with no manifest or signature
    pub allow_unsigned: bool,
    /// Key used to verify `bundle.sig`
    pub verifying_key: Option<VerifyingKey>,
}

/// Loaded, cross-checked model artifacts. Immutable after load.
#[derive(Debug, Clone)]
pub struct ModelBundle {
    pub(crate) schema: FeatureSchema,
    pub(crate) scaler: FittedScaler,
    pub(crate) classifier: LinearClassifier,
    pub(crate) labels: LabelMapping,
    pub(crate) metadata: ModelMetadata,
    pub(crate) manifest: Option<BundleManifest>,
}

impl ModelBundle {
    /// Load and verify the bundle in `dir`.
    ///
    /// # Errors
    /// Returns `ArtifactError` naming the first resource that is missing,
    /// malformed, inconsistent or fails integrity verification.
    pub fn load(dir: &Path, options: &LoadOptions) -> Result<Self, ArtifactError> {
        let manifest = read_manifest(dir, options)?;

        let mut resources = Vec::with_capacity(BUNDLE_FILES.len());
        for resource in BUNDLE_FILES {
            let bytes = read_resource(dir, resource)?;
            if let Some(manifest) = &manifest {
                manifest.verify_file(resource, &bytes)?;
            }
            resources.push(bytes);
        }
        let [schema, scaler, classifier, labels, metadata]: [Vec<u8>; 5] = resources
            .try_into()
            .map_err(|_| ArtifactError::Integrity("bundle resource count changed".into()))?;

        let names: Vec<String> = parse(SCHEMA_FILE, &schema)?;
        let label_names: Vec<String> = parse(LABELS_FILE, &labels)?;

        let bundle = Self::from_parts(
            FeatureSchema::new(names).map_err(|e| corrupt(SCHEMA_FILE, e))?,
            parse(SCALER_FILE, &scaler)?,
            parse(CLASSIFIER_FILE, &classifier)?,
            LabelMapping::from_names(&label_names).map_err(|e| corrupt(LABELS_FILE, e))?,
            parse(METADATA_FILE, &metadata)?,
        )?;

        tracing::info!(
            "Loaded model bundle {:?} from {:?} (features={}, numeric={}, classes={}, signed={}, serial={:?})",
            bundle.metadata.model_name,
            dir,
            bundle.schema.len(),
            bundle.scaler.columns().len(),
            bundle.labels.len(),
            manifest.is_some(),
            manifest.as_ref().map(|m| m.serial),
        );

        Ok(Self {
            manifest,
            ..bundle
        })
    }

    /// Assemble a bundle from already-parsed parts and cross-check them.
    ///
    /// # Errors
    /// Returns `ArtifactError::Corrupt` if the parts disagree with each other.
    pub fn from_parts(
        schema: FeatureSchema,
        scaler: FittedScaler,
        classifier: LinearClassifier,
        labels: LabelMapping,
        metadata: ModelMetadata,
    ) -> Result<Self, ArtifactError> {
        scaler.validate().map_err(|r| corrupt(SCALER_FILE, r))?;
        classifier
            .validate()
            .map_err(|r| corrupt(CLASSIFIER_FILE, r))?;
        metadata.validate().map_err(|r| corrupt(METADATA_FILE, r))?;

        if classifier.class_count() != labels.len() {
            return Err(corrupt(
                CLASSIFIER_FILE,
                format!(
                    "{} coefficient rows for {} labels",
                    classifier.class_count(),
                    labels.len()
                ),
            ));
        }
        if classifier.feature_names.as_slice() != schema.names() {
            return Err(corrupt(
                CLASSIFIER_FILE,
                "feature_names differ from feature_names.json",
            ));
        }

        let expected: BTreeSet<&str> = schema.numeric_features().into_iter().collect();
        let fitted: BTreeSet<&str> = scaler.columns().iter().map(String::as_str).collect();
        if expected != fitted {
            return Err(corrupt(
                SCALER_FILE,
                format!("fitted on {fitted:?}, schema numeric columns are {expected:?}"),
            ));
        }

        for group in ONE_HOT_GROUPS {
            for warning in group.audit(schema.names()) {
                tracing::warn!("{warning}");
            }
        }

        Ok(Self {
            schema,
            scaler,
            classifier,
            labels,
            metadata,
            manifest: None,
        })
    }

    #[must_use]
    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    #[must_use]
    pub fn scaler(&self) -> &FittedScaler {
        &self.scaler
    }

    #[must_use]
    pub fn classifier(&self) -> &LinearClassifier {
        &self.classifier
    }

    #[must_use]
    pub fn labels(&self) -> &LabelMapping {
        &self.labels
    }

    #[must_use]
    pub fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    /// The verified manifest, if the bundle was signed.
    #[must_use]
    pub fn manifest(&self) -> Option<&BundleManifest> {
        self.manifest.as_ref()
    }
}

fn read_resource(dir: &Path, resource: &str) -> Result<Vec<u8>, ArtifactError> {
    let path = dir.join(resource);
    if !path.is_file() {
        return Err(ArtifactError::Missing {
            resource: resource.to_string(),
            dir: dir.display().to_string(),
        });
    }
    fs::read(&path).map_err(|e| ArtifactError::Unreadable {
        resource: resource.to_string(),
        reason: e.to_string(),
    })
}

fn parse<T: DeserializeOwned>(resource: &str, bytes: &[u8]) -> Result<T, ArtifactError> {
    serde_json::from_slice(bytes).map_err(|e| corrupt(resource, e))
}

/// Verify the manifest signature. Returns `None` for an accepted unsigned bundle.
fn read_manifest(
    dir: &Path,
    options: &LoadOptions,
) -> Result<Option<BundleManifest>, ArtifactError> {
    let manifest_path = dir.join(MANIFEST_FILE);
    let sig_path = dir.join(SIGNATURE_FILE);

    match (manifest_path.exists(), sig_path.exists()) {
        (false, false) => {
            if options.allow_unsigned {
                tracing::warn!(
                    "Loading UNSIGNED model bundle from {:?} (WEIGHTWISE_ALLOW_UNSIGNED_BUNDLES=true)",
                    dir
                );
                return Ok(None);
            }
            tracing::error!("No {MANIFEST_FILE}/{SIGNATURE_FILE} in {:?}", dir);
            return Err(ArtifactError::Unsigned(dir.display().to_string()));
        }
        (true, false) | (false, true) => {
            return Err(ArtifactError::Integrity(format!(
                "{MANIFEST_FILE} and {SIGNATURE_FILE} must be present together"
            )));
        }
        (true, true) => {}
    }

    let key = options.verifying_key.as_ref().ok_or_else(|| {
        ArtifactError::Integrity(
            "bundle is signed but no verifying key is configured (WEIGHTWISE_BUNDLE_PUBKEY_B64)"
                .into(),
        )
    })?;

    let manifest_bytes = read_resource(dir, MANIFEST_FILE)?;
    let sig_bytes = read_resource(dir, SIGNATURE_FILE)?;
    verify_signature(key, &manifest_bytes, &sig_bytes)?;

    let manifest = BundleManifest::parse(&manifest_bytes)?;
    if let Some(unbound) = BUNDLE_FILES
        .iter()
        .find(|resource| !manifest.files.contains_key(**resource))
    {
        return Err(ArtifactError::Integrity(format!(
            "{MANIFEST_FILE} does not bind {unbound}"
        )));
    }
    Ok(Some(manifest))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    use ed25519_dalek::{Signer, SigningKey};
    use rand::RngCore;
    use tempfile::tempdir;

    use crate::domain::ObesityClass;

    /// Directory of the demo bundle shipped with the crate.
    pub(crate) fn demo_bundle_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("models")
    }

    pub(crate) fn demo_bundle() -> ModelBundle {
        let options = LoadOptions {
            allow_unsigned: true,
            verifying_key: None,
        };
        ModelBundle::load(&demo_bundle_dir(), &options).expect("demo bundle loads")
    }

    fn copy_demo_bundle(dir: &Path) {
        for resource in BUNDLE_FILES {
            fs::copy(demo_bundle_dir().join(resource), dir.join(resource)).expect("copy resource");
        }
    }

    fn random_signing_key() -> SigningKey {
        let mut seed = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut seed);
        SigningKey::from_bytes(&seed)
    }

    fn sign_dir(dir: &Path, signing_key: &SigningKey, files: &[&str]) {
        let files: BTreeMap<String, String> = files
            .iter()
            .map(|rel| {
                let bytes = fs::read(dir.join(rel)).expect("read resource");
                ((*rel).to_string(), sha256_hex(&bytes))
            })
            .collect();
        let manifest = BundleManifest {
            version: MANIFEST_VERSION,
            serial: 1,
            created_at: unix_now(),
            files,
        };
        let bytes = serde_json::to_vec_pretty(&manifest).expect("serialize manifest");
        fs::write(dir.join(MANIFEST_FILE), &bytes).expect("write manifest");
        let sig = signing_key.sign(&bytes);
        fs::write(dir.join(SIGNATURE_FILE), sig.to_bytes()).expect("write signature");
    }

    fn signed_options(signing_key: &SigningKey) -> LoadOptions {
        LoadOptions {
            allow_unsigned: false,
            verifying_key: Some(signing_key.verifying_key()),
        }
    }

    #[test]
    fn test_demo_bundle_is_consistent() {
        let bundle = demo_bundle();
        assert_eq!(bundle.labels().len(), 7);
        assert_eq!(bundle.classifier().class_count(), 7);
        assert_eq!(bundle.scaler().columns().len(), 9);
        assert_eq!(
            bundle.labels().class_at(1),
            Some(ObesityClass::NormalWeight)
        );
        assert!(bundle.manifest().is_none());
    }

    #[test]
    fn test_unsigned_bundle_requires_opt_in() {
        let err = ModelBundle::load(&demo_bundle_dir(), &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, ArtifactError::Unsigned(_)));
    }

    #[test]
    fn test_signed_bundle_loads() {
        let temp = tempdir().expect("tempdir");
        copy_demo_bundle(temp.path());
        let key = random_signing_key();
        sign_dir(temp.path(), &key, &BUNDLE_FILES);

        let bundle = ModelBundle::load(temp.path(), &signed_options(&key)).expect("loads");
        assert_eq!(bundle.manifest().map(|m| m.serial), Some(1));
    }

    #[test]
    fn test_tampered_resource_is_rejected() {
        let temp = tempdir().expect("tempdir");
        copy_demo_bundle(temp.path());
        let key = random_signing_key();
        sign_dir(temp.path(), &key, &BUNDLE_FILES);

        let metadata = temp.path().join(METADATA_FILE);
        let mut json = fs::read_to_string(&metadata).expect("read");
        json = json.replace("\"accuracy\"", "\"accuracy\" ");
        fs::write(&metadata, json).expect("write");

        let err = ModelBundle::load(temp.path(), &signed_options(&key)).unwrap_err();
        assert_eq!(
            err,
            ArtifactError::Integrity(format!("hash mismatch for {METADATA_FILE}"))
        );
    }

    #[test]
    fn test_wrong_key_and_partial_manifest_are_rejected() {
        let temp = tempdir().expect("tempdir");
        copy_demo_bundle(temp.path());
        let key = random_signing_key();

        sign_dir(temp.path(), &key, &[SCHEMA_FILE, SCALER_FILE]);
        let err = ModelBundle::load(temp.path(), &signed_options(&key)).unwrap_err();
        assert!(matches!(err, ArtifactError::Integrity(ref m) if m.contains(CLASSIFIER_FILE)));

        sign_dir(temp.path(), &key, &BUNDLE_FILES);
        let other = random_signing_key();
        let err = ModelBundle::load(temp.path(), &signed_options(&other)).unwrap_err();
        assert_eq!(err, ArtifactError::Integrity("invalid bundle signature".into()));

        // Signed bundles are verified even when unsigned ones are allowed.
        let options = LoadOptions {
            allow_unsigned: true,
            verifying_key: None,
        };
        assert!(ModelBundle::load(temp.path(), &options).is_err());
    }

    #[test]
    fn test_missing_resource_is_named() {
        let temp = tempdir().expect("tempdir");
        copy_demo_bundle(temp.path());
        fs::remove_file(temp.path().join(LABELS_FILE)).expect("remove");

        let options = LoadOptions {
            allow_unsigned: true,
            verifying_key: None,
        };
        let err = ModelBundle::load(temp.path(), &options).unwrap_err();
        assert!(matches!(err, ArtifactError::Missing { ref resource, .. } if resource == LABELS_FILE));
    }

    #[test]
    fn test_inconsistent_parts_are_rejected() {
        let bundle = demo_bundle();

        let mut classifier = bundle.classifier.clone();
        classifier.feature_names.swap(0, 1);
        let err = ModelBundle::from_parts(
            bundle.schema.clone(),
            bundle.scaler.clone(),
            classifier,
            bundle.labels.clone(),
            bundle.metadata.clone(),
        )
        .unwrap_err();
        assert!(matches!(err, ArtifactError::Corrupt { ref resource, .. } if resource == CLASSIFIER_FILE));

        let scaler = FittedScaler::Standard {
            feature_names: vec!["Age".into()],
            mean: vec![0.0],
            scale: vec![1.0],
        };
        let err = ModelBundle::from_parts(
            bundle.schema.clone(),
            scaler,
            bundle.classifier.clone(),
            bundle.labels.clone(),
            bundle.metadata.clone(),
        )
        .unwrap_err();
        assert!(matches!(err, ArtifactError::Corrupt { ref resource, .. } if resource == SCALER_FILE));

        let mut metadata = bundle.metadata.clone();
        metadata.accuracy = 1.5;
        assert!(ModelBundle::from_parts(
            bundle.schema.clone(),
            bundle.scaler.clone(),
            bundle.classifier.clone(),
            bundle.labels.clone(),
            metadata,
        )
        .is_err());
    }

    #[test]
    fn test_corrupt_json_names_resource() {
        let temp = tempdir().expect("tempdir");
        copy_demo_bundle(temp.path());
        fs::write(temp.path().join(SCALER_FILE), "{\"kind\":\"robust\"}").expect("write");

        let options = LoadOptions {
            allow_unsigned: true,
            verifying_key: None,
        };
        let err = ModelBundle::load(temp.path(), &options).unwrap_err();
        assert!(matches!(err, ArtifactError::Corrupt { ref resource, .. } if resource == SCALER_FILE));
    }
}
