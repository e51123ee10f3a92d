//! Subcommand implementations.

use std::io::Write as _;
use std::path::{Path, PathBuf};

use balloon_core::base::{Digest, HasherKind};
use balloon_sdk::config::{BalloonConfig, StorageConfig};
use balloon_sdk::{Balloon, MembershipProof, Snapshot};
use eyre::{Context as _, ensure};
use serde::Serialize;
use tracing::{debug, info, instrument};

/// Database directory used when neither flag nor configuration names one.
const DEFAULT_DB: &str = "balloon.db";

#[derive(Debug, Serialize)]
struct Info {
    hasher: HasherKind,
    version: u64,
    root: Option<Digest>,
}

/// Resolve the configuration and open the balloon.
///
/// `--db` and `--hasher` override the file and environment. The CLI always persists, so
/// an in-memory storage selection falls back to the default database directory.
pub(crate) fn open(
    config: Option<PathBuf>,
    db: Option<PathBuf>,
    hasher: Option<HasherKind>,
) -> eyre::Result<Balloon> {
    let mut resolved =
        BalloonConfig::load(config.as_deref()).wrap_err("Failed to load configuration")?;
    if let Some(hasher) = hasher {
        resolved.hasher = hasher;
    }
    if let Some(path) = db {
        resolved.storage = StorageConfig::Sled { path };
    } else if resolved.storage == StorageConfig::Memory {
        resolved.storage = StorageConfig::Sled {
            path: PathBuf::from(DEFAULT_DB),
        };
    }

    let validated = resolved.validate()?;
    Balloon::open_from_config(&validated).wrap_err("Failed to open balloon")
}

fn print_json(value: &impl Serialize) -> eyre::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    writeln!(std::io::stdout().lock(), "{json}")?;
    Ok(())
}

#[instrument(skip_all)]
pub(crate) fn add(balloon: &Balloon, event: &str) -> eyre::Result<()> {
    let snapshot = balloon.add(event.as_bytes())?;
    balloon.close()?;
    print_json(&snapshot)
}

#[instrument(skip_all)]
pub(crate) fn membership(
    balloon: &Balloon,
    event: &str,
    proof_out: Option<PathBuf>,
) -> eyre::Result<()> {
    let proof = balloon
        .query_membership(event.as_bytes())
        .wrap_err("Failed to build membership proof")?;
    balloon.close()?;

    match proof_out {
        Some(path) => {
            let json = serde_json::to_string_pretty(&proof)?;
            std::fs::write(&path, json)
                .wrap_err_with(|| format!("Failed to write proof to {}", path.display()))?;
            info!(file = %path.display(), version = proof.event_version(), "Saved membership proof");
            Ok(())
        }
        None => print_json(&proof),
    }
}

#[instrument(skip_all, fields(proof = %proof_file.display()))]
pub(crate) fn verify(
    proof_file: &Path,
    root: Digest,
    event: Option<&str>,
) -> eyre::Result<()> {
    let contents = std::fs::read_to_string(proof_file)
        .wrap_err_with(|| format!("Failed to read proof file {}", proof_file.display()))?;
    let proof: MembershipProof =
        serde_json::from_str(&contents).wrap_err("Failed to parse proof JSON")?;

    if let Some(recorded) = proof.hyper_digest.as_ref().filter(|recorded| **recorded != root) {
        debug!(%recorded, trusted = %root, "Proof was built against another root");
    }
    let snapshot = Snapshot {
        event_digest: proof.event_digest.clone(),
        hyper_digest: root,
        version: proof.current_version,
    };

    let valid = match event {
        Some(event) => proof.verify_event(event.as_bytes(), &snapshot),
        None => Balloon::verify(&proof, &snapshot),
    };
    ensure!(valid, "Membership proof is invalid");

    info!(
        version = proof.event_version(),
        root = %snapshot.hyper_digest,
        "Membership proof is valid"
    );
    Ok(())
}

pub(crate) fn info(balloon: &Balloon) -> eyre::Result<()> {
    let info = Info {
        hasher: balloon.hasher(),
        version: balloon.version()?,
        root: balloon.root()?,
    };
    balloon.close()?;
    print_json(&info)
}

pub(crate) fn config_schema() -> eyre::Result<()> {
    print_json(&BalloonConfig::schema())
}
