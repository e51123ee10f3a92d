//! Bit addressing of hyper tree nodes.
//!
//! Bits are numbered from the most significant bit of the first byte (bit 0) to the least
//! significant bit of the last byte (bit `n - 1`). A node of height `h` fixes the first
//! `n - h` bits of its base and spans the `2^h` keys sharing that prefix.

#![allow(
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects,
    reason = "Bit offsets are bounded by the tree width, which matches the base length"
)]

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_with::hex::Hex;
use serde_with::serde_as;

use crate::HyperError;

const HEIGHT_BYTES: usize = 4;

fn bit_is_set(bits: &[u8], i: usize) -> bool {
    bits[i / 8] & (1 << (7 - i % 8)) != 0
}

fn bit_set(bits: &mut [u8], i: usize) {
    bits[i / 8] |= 1 << (7 - i % 8);
}

/// Address of one node: the key of its leftmost leaf and its height.
#[serde_as]
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawPosition")]
pub struct Position {
    #[serde_as(as = "Hex")]
    base: Vec<u8>,
    height: u16,
    n: u16,
}

#[serde_as]
#[derive(Deserialize)]
struct RawPosition {
    #[serde_as(as = "Hex")]
    base: Vec<u8>,
    height: u16,
    n: u16,
}

impl TryFrom<RawPosition> for Position {
    type Error = HyperError;

    fn try_from(raw: RawPosition) -> Result<Self, Self::Error> {
        Self::new(raw.base, raw.height, raw.n)
    }
}

impl Position {
    /// Build a position from its parts.
    ///
    /// # Errors
    /// [`HyperError::MalformedPosition`] unless `base` is `n / 8` bytes long, `n` is a
    /// whole number of bytes and `height <= n`.
    pub fn new(base: Vec<u8>, height: u16, n: u16) -> Result<Self, HyperError> {
        if n % 8 != 0 || base.len() != usize::from(n / 8) || height > n {
            return Err(HyperError::MalformedPosition(base.len()));
        }
        Ok(Self { base, height, n })
    }

    /// Root of a tree over `n`-bit keys.
    #[must_use]
    pub fn root(n: u16) -> Self {
        Self {
            base: vec![0; usize::from(n / 8)],
            height: n,
            n,
        }
    }

    /// Key of the leftmost leaf under this node.
    #[must_use]
    pub fn base(&self) -> &[u8] {
        &self.base
    }

    /// Height of the node, 0 for leaves.
    #[must_use]
    pub const fn height(&self) -> u16 {
        self.height
    }

    /// Bit width of the tree.
    #[must_use]
    pub const fn n(&self) -> u16 {
        self.n
    }

    /// Whether this is a leaf.
    #[must_use]
    pub const fn is_leaf(&self) -> bool {
        self.height == 0
    }

    /// Whether this is the root of its tree.
    #[must_use]
    pub const fn is_root(&self) -> bool {
        self.height == self.n
    }

    /// Index of the bit that separates the left and right halves of this node.
    fn split_bit(&self) -> usize {
        usize::from(self.n - self.height)
    }

    /// Left child.
    ///
    /// # Errors
    /// [`HyperError::InvalidState`] when called on a leaf.
    pub fn left(&self) -> Result<Self, HyperError> {
        if self.is_leaf() {
            return Err(HyperError::InvalidState("a leaf has no left child"));
        }
        Ok(Self {
            base: self.base.clone(),
            height: self.height - 1,
            n: self.n,
        })
    }

    /// Right child.
    ///
    /// # Errors
    /// [`HyperError::InvalidState`] when called on a leaf.
    pub fn right(&self) -> Result<Self, HyperError> {
        if self.is_leaf() {
            return Err(HyperError::InvalidState("a leaf has no right child"));
        }
        let mut base = self.base.clone();
        bit_set(&mut base, self.split_bit());
        Ok(Self {
            base,
            height: self.height - 1,
            n: self.n,
        })
    }

    /// Leftmost leaf under this node. A leaf is its own first descendant.
    #[must_use]
    pub fn first_descendant(&self) -> Self {
        Self {
            base: self.base.clone(),
            height: 0,
            n: self.n,
        }
    }

    /// Rightmost leaf under this node. A leaf is its own last descendant.
    #[must_use]
    pub fn last_descendant(&self) -> Self {
        let mut base = self.base.clone();
        for i in self.split_bit()..usize::from(self.n) {
            bit_set(&mut base, i);
        }
        Self {
            base,
            height: 0,
            n: self.n,
        }
    }

    /// Whether `key` falls inside the span of this node.
    #[must_use]
    pub fn contains(&self, key: &[u8]) -> bool {
        key.len() == self.base.len()
            && (0..self.split_bit()).all(|i| bit_is_set(key, i) == bit_is_set(&self.base, i))
    }

    /// Height encoded as 4 little-endian bytes.
    #[must_use]
    pub fn height_bytes(&self) -> [u8; HEIGHT_BYTES] {
        u32::from(self.height).to_le_bytes()
    }

    /// Storage key: `base ‖ height (4-byte LE)`.
    #[must_use]
    pub fn bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.base.len() + HEIGHT_BYTES);
        out.extend_from_slice(&self.base);
        out.extend_from_slice(&self.height_bytes());
        out
    }

    /// Decode a storage key produced by [`Self::bytes`] for a tree of width `n`.
    ///
    /// # Errors
    /// [`HyperError::MalformedPosition`] if the key length or the height does not fit `n`.
    pub fn from_bytes(bytes: &[u8], n: u16) -> Result<Self, HyperError> {
        let malformed = || HyperError::MalformedPosition(bytes.len());
        let base_len = usize::from(n / 8);
        if bytes.len() != base_len + HEIGHT_BYTES {
            return Err(malformed());
        }
        let (base, height) = bytes.split_at(base_len);
        let height: [u8; HEIGHT_BYTES] = height.try_into().map_err(|_| malformed())?;
        let height = u16::try_from(u32::from_le_bytes(height)).map_err(|_| malformed())?;
        if height > n {
            return Err(malformed());
        }
        Ok(Self {
            base: base.to_vec(),
            height,
            n,
        })
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "base: {}, height: {}", hex::encode(&self.base), self.height)
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Position({}, h={}, n={})",
            hex::encode(&self.base),
            self.height,
            self.n
        )
    }
}
