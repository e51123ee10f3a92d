//! Hashers used by the hyper tree.
//!
//! A hasher fixes the width of the tree: its bit length is both the tree height and the
//! size of the leaf key space.

use std::fmt;
use std::sync::Arc;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};

use super::Digest;

/// Output length in bytes of the BLAKE2b hasher.
const BLAKE2B_OUTPUT_BYTES: usize = 32;

/// A hash function over a sequence of byte slices.
///
/// Hashing `[a, b]` is the hash of the concatenation `a ‖ b`.
pub trait Hasher: Send + Sync + fmt::Debug {
    /// Hash the concatenation of `parts`.
    fn digest(&self, parts: &[&[u8]]) -> Digest;

    /// Width of the produced digests in bits.
    fn bit_len(&self) -> u16;

    /// Descriptor that rebuilds an equivalent hasher on the verifying side.
    fn kind(&self) -> HasherKind;
}

/// Serializable descriptor of a supported hasher.
#[derive(
    Debug, Clone, Copy, Deserialize, Serialize, JsonSchema, PartialEq, Eq, Hash, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum HasherKind {
    /// SHA-256, 256-bit digests.
    #[default]
    Sha256,
    /// BLAKE2b with a 32-byte output.
    Blake2b256,
    /// Single-byte XOR fold. Only meant for small trees in tests.
    Xor,
}

impl HasherKind {
    /// Build the hasher described by this kind.
    #[must_use]
    pub fn build(self) -> Arc<dyn Hasher> {
        match self {
            Self::Sha256 => Arc::new(Sha256Hasher),
            Self::Blake2b256 => Arc::new(Blake2bHasher),
            Self::Xor => Arc::new(XorHasher),
        }
    }

    /// Parse from a CLI/config string.
    #[must_use]
    pub fn from_str_name(s: &str) -> Option<Self> {
        match s {
            "sha256" => Some(Self::Sha256),
            "blake2b256" => Some(Self::Blake2b256),
            "xor" => Some(Self::Xor),
            _ => None,
        }
    }

    /// Canonical name, as accepted by [`Self::from_str_name`].
    #[must_use]
    pub const fn as_str_name(self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
            Self::Blake2b256 => "blake2b256",
            Self::Xor => "xor",
        }
    }
}

impl fmt::Display for HasherKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str_name())
    }
}

/// SHA-256 hasher.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Hasher;

impl Hasher for Sha256Hasher {
    fn digest(&self, parts: &[&[u8]]) -> Digest {
        let mut hasher = Sha256::new();
        for part in parts {
            hasher.update(part);
        }
        Digest::new(hasher.finalize().to_vec())
    }

    fn bit_len(&self) -> u16 {
        256
    }

    fn kind(&self) -> HasherKind {
        HasherKind::Sha256
    }
}

/// BLAKE2b hasher truncated to 256 bits through the output-length parameter.
#[derive(Debug, Clone, Copy, Default)]
pub struct Blake2bHasher;

impl Hasher for Blake2bHasher {
    fn digest(&self, parts: &[&[u8]]) -> Digest {
        let mut state = blake2b_simd::Params::new()
            .hash_length(BLAKE2B_OUTPUT_BYTES)
            .to_state();
        for part in parts {
            state.update(part);
        }
        Digest::new(state.finalize().as_bytes().to_vec())
    }

    fn bit_len(&self) -> u16 {
        256
    }

    fn kind(&self) -> HasherKind {
        HasherKind::Blake2b256
    }
}

/// Folds every input byte with XOR into a single byte.
///
/// Not collision resistant. It exists so that an 8-level tree can be exercised exhaustively.
#[derive(Debug, Clone, Copy, Default)]
pub struct XorHasher;

impl Hasher for XorHasher {
    fn digest(&self, parts: &[&[u8]]) -> Digest {
        let folded = parts
            .iter()
            .flat_map(|part| part.iter())
            .fold(0_u8, |acc, byte| acc ^ byte);
        Digest::new(vec![folded])
    }

    fn bit_len(&self) -> u16 {
        8
    }

    fn kind(&self) -> HasherKind {
        HasherKind::Xor
    }
}
