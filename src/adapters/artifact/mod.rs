//! Artifact adapter: persisted model and scaler loading.
//!
//! The artifacts are opaque, externally produced JSON files:
//! - `model.json`: linear classifier coefficients plus its fitted column
//!   order (`feature_names_in`)
//! - `scaler.json`: per-feature standardization parameters
//!
//! Both carry a `feature_names_in` list. The loader aligns each artifact's
//! columns against the canonical serving schema once, at load time, so the
//! runtime path operates purely in canonical order. Anything that is not a
//! permutation of the 13 serving columns is rejected as a configuration
//! error.
//!
//! # Security
//!
//! Artifact directories are verified via an Ed25519-signed manifest
//! (`manifest.json` + `artifacts.sig`) binding the SHA-256 of each file.
//! Verification is mandatory in release builds; debug builds may bypass it
//! with `CARDIOSCOPE_ALLOW_UNSIGNED_ARTIFACTS=true` for local testing.
//!
//! # Key Rotation
//!
//! To rotate the publisher public key:
//! 1. Generate a new keypair: `cargo run --bin keygen`
//! 2. Replace `PUBLISHER_PUBKEY` with the new public key bytes
//! 3. Re-sign all artifact directories with the new private key

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use base64::Engine;
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::{FEATURE_COUNT, FEATURE_NAMES};
use crate::ports::{Classifier, InferenceError, ModelHandle, ProbabilisticClassifier, Scaler};

/// Environment variable to allow loading unsigned artifacts.
///
/// The bypass is compiled only in debug builds; release builds always
/// require a valid signature.
#[cfg(debug_assertions)]
const ALLOW_UNSIGNED_ENV: &str = "CARDIOSCOPE_ALLOW_UNSIGNED_ARTIFACTS";

/// Runtime override for the verifying key (base64 seed file).
const PUBKEY_FILE_ENV: &str = "CARDIOSCOPE_ARTIFACT_PUBKEY_B64_FILE";

/// Embedded publisher public key for artifact verification.
///
/// Compiled into the binary; see the module docs for rotation.
const PUBLISHER_PUBKEY: [u8; 32] = [
    0xba, 0x1d, 0x60, 0xe0, 0xd4, 0x6e, 0x0e, 0xee, 0xb6, 0xbb, 0xec, 0x6b, 0x93, 0xcc, 0x22,
    0xa8, 0xfc, 0xb9, 0x69, 0x2a, 0xd5, 0x9f, 0x7d, 0xb8, 0x86, 0x8e, 0x2d, 0x77, 0x0e, 0x53,
    0x12, 0x5a,
];

/// Errors from artifact loading and verification.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("failed to read artifact: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid artifact format: {0}")]
    Format(String),

    #[error("artifact signature rejected: {0}")]
    Signature(String),

    #[error("artifact columns do not match the serving schema: {0}")]
    Columns(String),
}

/// Classifier family declared by the artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    /// Logistic regression: exposes probability estimates
    Logistic,
    /// Linear margin classifier: class labels only
    Margin,
}

/// `model.json` on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub kind: ModelKind,
    pub feature_names_in: Vec<String>,
    pub coef: Vec<f64>,
    pub intercept: f64,
}

/// `scaler.json` on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScalerArtifact {
    pub feature_names_in: Vec<String>,
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

/// Signed manifest binding the artifact files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactManifest {
    pub version: u32,
    pub created_at: i64,
    /// Relative file name -> SHA-256 hex digest
    pub files: BTreeMap<String, String>,
}

/// Linear decision function over canonically ordered, scaled features.
pub struct LinearModel {
    coef: Vec<f64>,
    intercept: f64,
}

impl LinearModel {
    /// Build a model whose coefficients are already in canonical column
    /// order.
    #[must_use]
    pub fn new(coef: Vec<f64>, intercept: f64) -> Self {
        Self { coef, intercept }
    }

    fn decision_value(&self, features: &[f64]) -> Result<f64, InferenceError> {
        if features.len() != self.coef.len() {
            return Err(InferenceError::ShapeMismatch {
                expected: self.coef.len(),
                actual: features.len(),
            });
        }

        let z = self
            .coef
            .iter()
            .zip(features)
            .fold(self.intercept, |acc, (c, x)| acc + c * x);

        if z.is_finite() {
            Ok(z)
        } else {
            Err(InferenceError::Numeric { stage: "predict" })
        }
    }
}

impl Classifier for LinearModel {
    fn predict(&self, features: &[f64]) -> Result<u8, InferenceError> {
        Ok(u8::from(self.decision_value(features)? >= 0.0))
    }
}

impl ProbabilisticClassifier for LinearModel {
    fn predict_proba(&self, features: &[f64]) -> Result<Vec<f64>, InferenceError> {
        let z = self.decision_value(features)?;
        let p1 = 1.0 / (1.0 + (-z).exp());
        Ok(vec![1.0 - p1, p1])
    }
}

/// Standardization with parameters in canonical column order.
pub struct StandardScaler {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl StandardScaler {
    /// Build a scaler whose parameters are already in canonical column
    /// order.
    #[must_use]
    pub fn new(mean: Vec<f64>, scale: Vec<f64>) -> Self {
        Self { mean, scale }
    }

    /// Identity transform over the serving schema, for tests and tooling.
    #[must_use]
    pub fn identity() -> Self {
        Self {
            mean: vec![0.0; FEATURE_COUNT],
            scale: vec![1.0; FEATURE_COUNT],
        }
    }
}

impl Scaler for StandardScaler {
    fn transform(&self, features: &[f64]) -> Result<Vec<f64>, InferenceError> {
        if features.len() != self.mean.len() {
            return Err(InferenceError::ShapeMismatch {
                expected: self.mean.len(),
                actual: features.len(),
            });
        }

        Ok(features
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (m, s))| (x - m) / s)
            .collect())
    }
}

/// The verified, column-aligned artifact pair.
pub struct LoadedArtifacts {
    pub model: ModelHandle,
    pub scaler: Box<dyn Scaler>,
}

/// Load and verify the model/scaler pair from an artifact directory.
///
/// # Errors
/// Returns an error when verification fails, a file is missing or
/// malformed, or an artifact's columns do not match the serving schema.
pub fn load_artifacts(dir: &Path) -> Result<LoadedArtifacts, ArtifactError> {
    verify_signature(dir)?;

    let model_raw: ModelArtifact = read_json(&dir.join("model.json"))?;
    let scaler_raw: ScalerArtifact = read_json(&dir.join("scaler.json"))?;

    let model = build_model(&model_raw)?;
    let scaler = build_scaler(&scaler_raw)?;

    tracing::info!(
        "Loaded artifacts from {:?} (kind={:?}, n_features={})",
        dir,
        model_raw.kind,
        FEATURE_COUNT
    );

    Ok(LoadedArtifacts {
        model,
        scaler: Box::new(scaler),
    })
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    let content = fs::read_to_string(path)
        .map_err(|e| ArtifactError::Format(format!("cannot read {path:?}: {e}")))?;
    serde_json::from_str(&content)
        .map_err(|e| ArtifactError::Format(format!("cannot parse {path:?}: {e}")))
}

fn build_model(raw: &ModelArtifact) -> Result<ModelHandle, ArtifactError> {
    if raw.coef.len() != raw.feature_names_in.len() {
        return Err(ArtifactError::Format(format!(
            "model declares {} columns but carries {} coefficients",
            raw.feature_names_in.len(),
            raw.coef.len()
        )));
    }

    let order = column_order(&raw.feature_names_in)?;
    let mut coef = vec![0.0; FEATURE_COUNT];
    for (i, &canonical) in order.iter().enumerate() {
        coef[canonical] = raw.coef[i];
    }

    let model = LinearModel::new(coef, raw.intercept);
    Ok(match raw.kind {
        ModelKind::Logistic => ModelHandle::Probabilistic(Box::new(model)),
        ModelKind::Margin => ModelHandle::Plain(Box::new(model)),
    })
}

fn build_scaler(raw: &ScalerArtifact) -> Result<StandardScaler, ArtifactError> {
    if raw.mean.len() != raw.feature_names_in.len() || raw.scale.len() != raw.feature_names_in.len()
    {
        return Err(ArtifactError::Format(
            "scaler parameter lengths do not match feature_names_in".into(),
        ));
    }
    if let Some(idx) = raw.scale.iter().position(|s| *s == 0.0) {
        return Err(ArtifactError::Format(format!(
            "scaler has zero std for column {}",
            raw.feature_names_in[idx]
        )));
    }

    let order = column_order(&raw.feature_names_in)?;
    let mut mean = vec![0.0; FEATURE_COUNT];
    let mut scale = vec![1.0; FEATURE_COUNT];
    for (i, &canonical) in order.iter().enumerate() {
        mean[canonical] = raw.mean[i];
        scale[canonical] = raw.scale[i];
    }

    Ok(StandardScaler::new(mean, scale))
}

/// Map each artifact column to its canonical index.
///
/// The artifact columns must be an exact permutation of the serving schema;
/// a missing, duplicated, or unknown name means the artifact was fitted on a
/// different schema.
fn column_order(names: &[String]) -> Result<Vec<usize>, ArtifactError> {
    if names.len() != FEATURE_COUNT {
        return Err(ArtifactError::Columns(format!(
            "expected {} columns, got {}",
            FEATURE_COUNT,
            names.len()
        )));
    }

    let mut seen = [false; FEATURE_COUNT];
    let mut order = Vec::with_capacity(FEATURE_COUNT);

    for name in names {
        let canonical = FEATURE_NAMES
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| ArtifactError::Columns(format!("unknown column {name}")))?;
        if seen[canonical] {
            return Err(ArtifactError::Columns(format!("duplicate column {name}")));
        }
        seen[canonical] = true;
        order.push(canonical);
    }

    Ok(order)
}

/// Verify the signed manifest for an artifact directory.
///
/// Returns `Ok(None)` only when the debug-build bypass is active and no
/// signature is present.
fn verify_signature(dir: &Path) -> Result<Option<ArtifactManifest>, ArtifactError> {
    let sig_path = dir.join("artifacts.sig");
    let manifest_path = dir.join("manifest.json");

    if !sig_path.exists() || !manifest_path.exists() {
        #[cfg(debug_assertions)]
        {
            let allow = std::env::var(ALLOW_UNSIGNED_ENV)
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false);
            if allow {
                tracing::warn!(
                    "Loading UNSIGNED artifacts ({ALLOW_UNSIGNED_ENV}=true). \
                     This is only allowed in debug builds for testing."
                );
                return Ok(None);
            }
            return Err(ArtifactError::Signature(format!(
                "signature not found in {dir:?}; set {ALLOW_UNSIGNED_ENV}=true for testing"
            )));
        }

        #[cfg(not(debug_assertions))]
        {
            return Err(ArtifactError::Signature(format!(
                "signature not found in {dir:?}; production builds require signed artifacts"
            )));
        }
    }

    let sig_bytes = fs::read(&sig_path)?;
    let sig_bytes: &[u8; 64] = sig_bytes
        .as_slice()
        .try_into()
        .map_err(|_| ArtifactError::Signature("invalid signature length".into()))?;
    let signature = Signature::from_bytes(sig_bytes);

    let manifest_bytes = fs::read(&manifest_path)?;
    publisher_public_key()?
        .verify(&manifest_bytes, &signature)
        .map_err(|_| ArtifactError::Signature("invalid artifact signature".into()))?;

    let manifest: ArtifactManifest = serde_json::from_slice(&manifest_bytes)
        .map_err(|e| ArtifactError::Signature(format!("invalid manifest.json: {e}")))?;

    if manifest.version != 1 {
        return Err(ArtifactError::Signature(format!(
            "unsupported manifest version {}",
            manifest.version
        )));
    }
    for required in ["model.json", "scaler.json"] {
        if !manifest.files.contains_key(required) {
            return Err(ArtifactError::Signature(format!(
                "manifest does not bind {required}"
            )));
        }
    }

    // The signed manifest must bind the bytes actually loaded.
    for (rel, expected_hex) in &manifest.files {
        let bytes = fs::read(dir.join(rel)).map_err(|e| {
            ArtifactError::Signature(format!("manifest references unreadable file {rel}: {e}"))
        })?;
        let actual_hex = sha256_hex(&bytes);
        if actual_hex != *expected_hex {
            return Err(ArtifactError::Signature(format!(
                "file hash mismatch for {rel}"
            )));
        }
    }

    tracing::info!("Artifact signature and hashes verified");
    Ok(Some(manifest))
}

/// SHA-256 hex digest, as bound by the manifest.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

fn publisher_public_key() -> Result<VerifyingKey, ArtifactError> {
    let bytes: [u8; 32] = match std::env::var(PUBKEY_FILE_ENV) {
        Ok(path) => {
            let content = fs::read_to_string(path.trim()).map_err(|e| {
                ArtifactError::Signature(format!("cannot read publisher key file: {e}"))
            })?;
            let raw = base64::engine::general_purpose::STANDARD
                .decode(content.trim())
                .map_err(|e| {
                    ArtifactError::Signature(format!("invalid base64 in publisher key: {e}"))
                })?;
            raw.as_slice().try_into().map_err(|_| {
                ArtifactError::Signature("publisher key must be 32 bytes".into())
            })?
        }
        Err(_) => PUBLISHER_PUBKEY,
    };

    VerifyingKey::from_bytes(&bytes)
        .map_err(|e| ArtifactError::Signature(format!("invalid publisher key: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn canonical_names() -> Vec<String> {
        FEATURE_NAMES.iter().map(|n| n.to_string()).collect()
    }

    fn allow_unsigned_for_tests() {
        use std::sync::Once;
        static ONCE: Once = Once::new();
        ONCE.call_once(|| {
            std::env::set_var("CARDIOSCOPE_ALLOW_UNSIGNED_ARTIFACTS", "true");
        });
    }

    /// Tests that resolve the publisher key must not interleave with the
    /// one that overrides it through the environment.
    fn pubkey_env_lock() -> std::sync::MutexGuard<'static, ()> {
        static LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
        LOCK.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn write_artifacts(dir: &Path, model: &ModelArtifact, scaler: &ScalerArtifact) {
        let mut f = fs::File::create(dir.join("model.json")).expect("create model.json");
        f.write_all(serde_json::to_vec(model).expect("serialize").as_slice())
            .expect("write");
        let mut f = fs::File::create(dir.join("scaler.json")).expect("create scaler.json");
        f.write_all(serde_json::to_vec(scaler).expect("serialize").as_slice())
            .expect("write");
    }

    fn simple_model() -> ModelArtifact {
        // Only ap_hi carries weight: z = ap_hi - 100.
        let mut coef = vec![0.0; FEATURE_COUNT];
        coef[3] = 1.0;
        ModelArtifact {
            kind: ModelKind::Logistic,
            feature_names_in: canonical_names(),
            coef,
            intercept: -100.0,
        }
    }

    fn identity_scaler() -> ScalerArtifact {
        ScalerArtifact {
            feature_names_in: canonical_names(),
            mean: vec![0.0; FEATURE_COUNT],
            scale: vec![1.0; FEATURE_COUNT],
        }
    }

    #[test]
    fn test_load_unsigned_artifacts_in_debug() {
        allow_unsigned_for_tests();
        let dir = tempfile::tempdir().expect("tempdir");
        write_artifacts(dir.path(), &simple_model(), &identity_scaler());

        let loaded = load_artifacts(dir.path()).expect("Should load");
        assert!(loaded.model.is_probabilistic());

        let mut features = vec![0.0; FEATURE_COUNT];
        features[3] = 140.0;
        let scaled = loaded.scaler.transform(&features).expect("transform");
        assert_eq!(loaded.model.predict(&scaled).expect("predict"), 1);
    }

    #[test]
    fn test_margin_model_has_no_probability_capability() {
        allow_unsigned_for_tests();
        let dir = tempfile::tempdir().expect("tempdir");
        let mut model = simple_model();
        model.kind = ModelKind::Margin;
        write_artifacts(dir.path(), &model, &identity_scaler());

        let loaded = load_artifacts(dir.path()).expect("Should load");
        assert!(!loaded.model.is_probabilistic());
    }

    #[test]
    fn test_column_permutation_is_realigned() {
        allow_unsigned_for_tests();
        let dir = tempfile::tempdir().expect("tempdir");

        // Same model, but the artifact lists ap_hi first.
        let mut names = canonical_names();
        names.swap(0, 3);
        let mut coef = vec![0.0; FEATURE_COUNT];
        coef[0] = 1.0; // ap_hi weight, now at artifact position 0
        let model = ModelArtifact {
            kind: ModelKind::Logistic,
            feature_names_in: names,
            coef,
            intercept: -100.0,
        };
        write_artifacts(dir.path(), &model, &identity_scaler());

        let loaded = load_artifacts(dir.path()).expect("Should load");
        let mut features = vec![0.0; FEATURE_COUNT];
        features[3] = 150.0; // ap_hi in canonical position
        assert_eq!(loaded.model.predict(&features).expect("predict"), 1);
        features[3] = 50.0;
        assert_eq!(loaded.model.predict(&features).expect("predict"), 0);
    }

    #[test]
    fn test_unknown_column_is_rejected() {
        let mut names = canonical_names();
        names[2] = "waistline".into();
        let err = column_order(&names).expect_err("Should reject");
        assert!(matches!(err, ArtifactError::Columns(_)));
    }

    #[test]
    fn test_wrong_column_count_is_rejected() {
        let names = canonical_names()[..10].to_vec();
        let err = column_order(&names).expect_err("Should reject");
        assert!(matches!(err, ArtifactError::Columns(_)));
    }

    #[test]
    fn test_scaler_shape_mismatch() {
        let scaler = StandardScaler::identity();
        let err = scaler.transform(&[1.0, 2.0]).expect_err("Should reject");
        assert!(matches!(
            err,
            InferenceError::ShapeMismatch {
                expected: 13,
                actual: 2
            }
        ));
    }

    #[test]
    fn test_scaler_standardizes() {
        let mut mean = vec![0.0; FEATURE_COUNT];
        let mut scale = vec![1.0; FEATURE_COUNT];
        mean[1] = 160.0;
        scale[1] = 8.0;
        let scaler = StandardScaler::new(mean, scale);

        let mut features = vec![0.0; FEATURE_COUNT];
        features[1] = 176.0;
        let out = scaler.transform(&features).expect("transform");
        assert!((out[1] - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_predict_rejects_non_finite_input() {
        let model = LinearModel::new(vec![1.0; FEATURE_COUNT], 0.0);
        let mut features = vec![0.0; FEATURE_COUNT];
        features[11] = f64::INFINITY; // degenerate bmi from height = 0
        let err = model.predict(&features).expect_err("Should reject");
        assert!(matches!(err, InferenceError::Numeric { .. }));
    }

    #[test]
    fn test_logistic_probabilities_sum_to_one() {
        let mut coef = vec![0.0; FEATURE_COUNT];
        coef[0] = 0.5;
        let model = LinearModel::new(coef, -0.2);
        let mut features = vec![0.0; FEATURE_COUNT];
        features[0] = 1.0;

        let probs = model.predict_proba(&features).expect("proba");
        assert_eq!(probs.len(), 2);
        assert!((probs[0] + probs[1] - 1.0).abs() < 1e-12);
        assert!(probs[1] > 0.0 && probs[1] < 1.0);
    }

    #[test]
    fn test_embedded_key_is_not_a_published_test_vector() {
        // RFC 8032 test vector 1's public key; its private seed is printed
        // in the RFC, so a manifest signed with it verifies for anyone.
        const RFC8032_TV1_PUBKEY: [u8; 32] = [
            0xd7, 0x5a, 0x98, 0x01, 0x82, 0xb1, 0x0a, 0xb7, 0xd5, 0x4b, 0xfe, 0xd3, 0xc9, 0x64,
            0x07, 0x3a, 0x0e, 0xe1, 0x72, 0xf3, 0xda, 0xa6, 0x23, 0x25, 0xaf, 0x02, 0x1a, 0x68,
            0xf7, 0x07, 0x51, 0x1a,
        ];
        assert_ne!(PUBLISHER_PUBKEY, RFC8032_TV1_PUBKEY);
        VerifyingKey::from_bytes(&PUBLISHER_PUBKEY).expect("embedded key must be valid");
    }

    #[test]
    fn test_shipped_artifacts_verify_against_embedded_key() {
        let _guard = pubkey_env_lock();
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("models");
        let loaded = load_artifacts(&dir).expect("shipped artifacts should verify");
        assert!(loaded.model.is_probabilistic());
    }

    #[test]
    fn test_signed_roundtrip_and_tamper_detection() {
        use ed25519_dalek::{Signer, SigningKey};

        allow_unsigned_for_tests();
        let _guard = pubkey_env_lock();
        let dir = tempfile::tempdir().expect("tempdir");
        write_artifacts(dir.path(), &simple_model(), &identity_scaler());

        let signing_key = SigningKey::from_bytes(&[7u8; 32]);
        let pubkey_b64 = base64::engine::general_purpose::STANDARD
            .encode(signing_key.verifying_key().as_bytes());
        let pubkey_path = dir.path().join("publisher.pub");
        fs::write(&pubkey_path, pubkey_b64).expect("write pubkey");
        std::env::set_var(PUBKEY_FILE_ENV, &pubkey_path);

        let mut files = BTreeMap::new();
        for rel in ["model.json", "scaler.json"] {
            let bytes = fs::read(dir.path().join(rel)).expect("read");
            files.insert(rel.to_string(), sha256_hex(&bytes));
        }
        let manifest = ArtifactManifest {
            version: 1,
            created_at: 0,
            files,
        };
        let manifest_bytes = serde_json::to_vec_pretty(&manifest).expect("serialize");
        fs::write(dir.path().join("manifest.json"), &manifest_bytes).expect("write manifest");
        let sig = signing_key.sign(&manifest_bytes);
        fs::write(dir.path().join("artifacts.sig"), sig.to_bytes()).expect("write sig");

        load_artifacts(dir.path()).expect("signed artifacts should load");

        // Tampering with a bound file must be detected.
        let mut model = simple_model();
        model.intercept = 0.0;
        write_artifacts(dir.path(), &model, &identity_scaler());
        match load_artifacts(dir.path()) {
            Ok(_) => panic!("tampered artifacts must be rejected"),
            Err(err) => assert!(matches!(err, ArtifactError::Signature(_))),
        }

        std::env::remove_var(PUBKEY_FILE_ENV);
    }
}
