//! Command-line interface for the `balloon` CLI application.

use std::path::PathBuf;

use balloon_core::base::{Digest, HasherKind};
use clap::Parser;
use eyre::{Result, eyre};

/// Command-line interface definition
#[derive(Debug, Parser)]
#[command(name = "balloon")]
#[command(about = "Append-only event log with membership proofs")]
pub struct Cli {
    /// Optional JSON configuration file, overridden by `BALLOON__*` variables.
    #[arg(long, global = true, env = "BALLOON_CONFIG")]
    pub config: Option<PathBuf>,

    /// Sled database directory. Defaults to `balloon.db` unless the configuration
    /// selects a sled path.
    #[arg(long, global = true, env = "BALLOON_DB")]
    pub db: Option<PathBuf>,

    /// Hasher of the tree: `sha256`, `blake2b256` or `xor`.
    #[arg(long, global = true, env = "BALLOON_HASHER", value_parser = parse_hasher)]
    pub hasher: Option<HasherKind>,

    /// Cli subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Cli subcommands
#[derive(Debug, clap::Subcommand)]
pub enum Commands {
    /// Add an event and print the resulting snapshot as JSON.
    Add {
        /// Event payload.
        #[arg(long)]
        event: String,
    },
    /// Build the membership proof of an event.
    Membership {
        /// Event payload.
        #[arg(long)]
        event: String,
        /// Write the proof here instead of printing it.
        #[arg(long)]
        proof_out: Option<PathBuf>,
    },
    /// Check a saved membership proof. Needs no database.
    ///
    /// Exits with an error when the proof does not hold.
    Verify {
        /// Proof file written by `membership`.
        #[arg(long)]
        proof: PathBuf,
        /// Trusted root to check against, obtained from the log itself. The root recorded
        /// in the proof file is never trusted.
        #[arg(long, value_parser = parse_digest)]
        root: Digest,
        /// Also check that the proof is about this event payload.
        #[arg(long)]
        event: Option<String>,
    },
    /// Print the current version and root.
    Info,
    /// Print the JSON schema of the configuration file.
    ConfigSchema,
}

fn parse_hasher(s: &str) -> Result<HasherKind> {
    HasherKind::from_str_name(s).ok_or_else(|| {
        eyre!("Invalid hasher: {s}. Expected 'sha256', 'blake2b256', or 'xor'.")
    })
}

fn parse_digest(s: &str) -> Result<Digest> {
    Digest::from_hex(s.trim_start_matches("0x")).map_err(|e| eyre!("Invalid hex digest: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hasher_parse() {
        assert_eq!(
            parse_hasher("sha256").expect("Failed to parse sha256"),
            HasherKind::Sha256
        );
        assert_eq!(
            parse_hasher("xor").expect("Failed to parse xor"),
            HasherKind::Xor
        );
        assert!(parse_hasher("md5").is_err());
    }

    #[test]
    fn digest_parse() {
        assert_eq!(
            parse_digest("0x0a0b").expect("Failed to parse digest"),
            Digest::from([0x0a, 0x0b])
        );
        assert!(parse_digest("zz").is_err());
    }

    #[test]
    fn cli_parses_global_flags_after_the_subcommand() {
        let cli = Cli::try_parse_from(["balloon", "add", "--event", "x", "--hasher", "xor"])
            .expect("arguments parse");
        assert_eq!(cli.hasher, Some(HasherKind::Xor));
        assert!(matches!(cli.command, Commands::Add { event } if event == "x"));
    }

    #[test]
    fn verify_requires_a_trusted_root() {
        assert!(Cli::try_parse_from(["balloon", "verify", "--proof", "p.json"]).is_err());

        let root = "ab".repeat(32);
        let cli = Cli::try_parse_from(["balloon", "verify", "--proof", "p.json", "--root", &root])
            .expect("arguments parse");
        assert!(matches!(cli.command, Commands::Verify { root, .. } if root.len() == 32));
    }
}
