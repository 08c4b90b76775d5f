//! Artifact signing utility.
//!
//! Creates a signed manifest (`manifest.json`) and Ed25519 signature
//! (`artifacts.sig`) for an artifact directory, enabling cryptographic
//! verification at load time.
//!
//! ```bash
//! cargo run --bin sign_artifacts -- <artifact_dir>
//! ```
//!
//! The signing seed is read from the file named by
//! `CARDIOSCOPE_SIGNING_KEY_B64_FILE`, or, in debug builds only, from the
//! `CARDIOSCOPE_SIGNING_KEY_B64` environment variable.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{bail, Context, Result};
use base64::engine::general_purpose;
use base64::Engine;
use clap::Parser;
use ed25519_dalek::{Signature, Signer, SigningKey};

use cardioscope::adapters::artifact::sha256_hex;

const KEY_FILE_ENV: &str = "CARDIOSCOPE_SIGNING_KEY_B64_FILE";
#[cfg(debug_assertions)]
const KEY_ENV: &str = "CARDIOSCOPE_SIGNING_KEY_B64";

#[derive(Parser)]
#[command(name = "sign_artifacts", about = "Sign a model artifact directory")]
struct Cli {
    /// Directory containing model.json and scaler.json.
    artifact_dir: PathBuf,
}

#[derive(serde::Serialize)]
struct Manifest {
    version: u32,
    created_at: i64,
    files: BTreeMap<String, String>,
}

fn read_signing_seed() -> Result<[u8; 32]> {
    let seed_b64 = if let Ok(path) = std::env::var(KEY_FILE_ENV) {
        fs::read_to_string(path.trim())
            .with_context(|| format!("failed reading signing key file from {KEY_FILE_ENV}"))?
    } else {
        #[cfg(debug_assertions)]
        {
            match std::env::var(KEY_ENV) {
                Ok(v) => v,
                Err(_) => bail!("missing signing key; set {KEY_FILE_ENV} (or {KEY_ENV} in debug builds)"),
            }
        }
        #[cfg(not(debug_assertions))]
        {
            bail!("missing signing key; set {KEY_FILE_ENV}")
        }
    };

    let raw = general_purpose::STANDARD
        .decode(seed_b64.trim())
        .context("invalid base64 in signing key")?;
    let seed: [u8; 32] = raw
        .as_slice()
        .try_into()
        .map_err(|_| anyhow::anyhow!("signing key seed must be 32 bytes after base64 decode"))?;
    Ok(seed)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let seed = read_signing_seed()?;
    let signing_key = SigningKey::from_bytes(&seed);
    let verifying_key = signing_key.verifying_key();

    let mut files = BTreeMap::new();
    for rel in ["model.json", "scaler.json"] {
        let path = cli.artifact_dir.join(rel);
        let bytes = fs::read(&path).with_context(|| format!("failed to read {path:?}"))?;
        files.insert(rel.to_string(), sha256_hex(&bytes));
    }

    let created_at = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0);

    let manifest = Manifest {
        version: 1,
        created_at,
        files,
    };
    let manifest_bytes = serde_json::to_vec_pretty(&manifest)?;

    let manifest_path = cli.artifact_dir.join("manifest.json");
    fs::write(&manifest_path, &manifest_bytes)
        .with_context(|| format!("failed to write {manifest_path:?}"))?;

    let sig: Signature = signing_key.sign(&manifest_bytes);
    let sig_path = cli.artifact_dir.join("artifacts.sig");
    fs::write(&sig_path, sig.to_bytes())
        .with_context(|| format!("failed to write {sig_path:?}"))?;

    println!("Signed manifest: {manifest_path:?}");
    println!("Wrote signature: {sig_path:?}");
    println!(
        "PUBKEY (base64)={}",
        general_purpose::STANDARD.encode(verifying_key.as_bytes())
    );

    Ok(())
}
