//! Foundational primitive types: digests and hashers.

mod digest;
mod hasher;

pub use digest::Digest;
pub use hasher::{Blake2bHasher, Hasher, HasherKind, Sha256Hasher, XorHasher};
