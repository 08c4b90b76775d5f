//! Ed25519 keypair generation utility for artifact signing.
//!
//! Generates a signing keypair:
//! - Private seed (32 bytes, base64) written to file with 0600 permissions
//! - Public key optionally written separately
//!
//! ```bash
//! cargo run --bin keygen -- --out-seed <path> [--out-pub <path>] [--force]
//! ```

use std::io::Write;
#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use base64::engine::general_purpose;
use base64::Engine;
use clap::Parser;
use ed25519_dalek::SigningKey;
use rand::rngs::OsRng;
use rand::RngCore;

#[derive(Parser)]
#[command(name = "keygen", about = "Generate an Ed25519 artifact signing keypair")]
struct Cli {
    /// Where to write the base64 signing seed (mode 0600).
    #[arg(long)]
    out_seed: PathBuf,

    /// Optionally write the base64 public key here (mode 0644).
    #[arg(long)]
    out_pub: Option<PathBuf>,

    /// Overwrite existing files.
    #[arg(long)]
    force: bool,
}

fn refuse_existing(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("refusing to overwrite existing file {path:?}; use --force");
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    refuse_existing(&cli.out_seed, cli.force)?;
    if let Some(pub_path) = &cli.out_pub {
        refuse_existing(pub_path, cli.force)?;
    }

    let mut seed = [0u8; 32];
    OsRng.fill_bytes(&mut seed);

    let signing_key = SigningKey::from_bytes(&seed);
    let verifying_key = signing_key.verifying_key();

    let seed_b64 = general_purpose::STANDARD.encode(seed);
    let pub_b64 = general_purpose::STANDARD.encode(verifying_key.as_bytes());

    if let Some(parent) = cli.out_seed.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let mut opts = std::fs::OpenOptions::new();
    opts.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        opts.mode(0o600);
    }
    let mut file = opts
        .open(&cli.out_seed)
        .with_context(|| format!("failed to open {:?}", cli.out_seed))?;
    file.write_all(seed_b64.as_bytes())?;
    file.write_all(b"\n")?;

    if let Some(pub_path) = &cli.out_pub {
        if let Some(parent) = pub_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }

        let mut pub_opts = std::fs::OpenOptions::new();
        pub_opts.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            // Public key is non-secret; allow read access.
            pub_opts.mode(0o644);
        }
        let mut pub_file = pub_opts
            .open(pub_path)
            .with_context(|| format!("failed to open {pub_path:?}"))?;
        pub_file.write_all(pub_b64.as_bytes())?;
        pub_file.write_all(b"\n")?;
    }

    // Print only non-secret material.
    println!("Wrote signing seed (base64) to {:?}", cli.out_seed);
    if let Some(pub_path) = &cli.out_pub {
        println!("Wrote public key (base64) to {pub_path:?}");
    }
    println!("PUBKEY (base64)={pub_b64}");

    Ok(())
}
