//! Shared test utilities for the workspace.

#![allow(
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects,
    reason = "Test helpers index within the digest they were handed"
)]

mod store;

pub use balloon_core::base::Digest;
pub use store::FailingStore;
use rand::Rng;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Helper macro to create a digest of `$len` bytes whose last byte is `$v`.
///
/// With a single argument the digest is 32 bytes long.
#[macro_export]
macro_rules! digest {
    ($v:expr) => {
        $crate::digest!($v, 32)
    };
    ($v:expr, $len:expr) => {{
        let mut bytes = vec![0_u8; $len];
        if let Some(last) = bytes.last_mut() {
            *last = $v;
        }
        $crate::Digest::new(bytes)
    }};
}

/// Helper macro to create a vector of single-byte digests, for 8-bit trees.
#[macro_export]
macro_rules! digests8 {
    ($($v:expr),* $(,)?) => {
        vec![$( $crate::digest!($v, 1) ),*]
    };
}

/// A deterministic RNG so failing tests reproduce.
#[must_use]
pub fn seeded_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// A random digest of `len` bytes.
pub fn random_digest(rng: &mut impl Rng, len: usize) -> Digest {
    let mut bytes = vec![0_u8; len];
    rng.fill(bytes.as_mut_slice());
    Digest::new(bytes)
}

/// Copy of `digest` with bit `bit` flipped, counting from the most significant bit.
///
/// # Panics
/// If `bit` is outside the digest.
#[must_use]
pub fn flip_bit(digest: &Digest, bit: usize) -> Digest {
    let mut bytes = digest.as_bytes().to_vec();
    bytes[bit / 8] ^= 0x80 >> (bit % 8);
    Digest::new(bytes)
}
