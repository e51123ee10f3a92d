use std::fmt;

use serde::{Deserialize, Serialize};
use serde_with::hex::Hex;
use serde_with::serde_as;

/// Output of a [`Hasher`](super::Hasher).
///
/// The length is fixed per hasher but not per type, so the bytes live on the heap. Digests
/// serialize as lowercase hex strings.
#[serde_as]
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Digest(#[serde_as(as = "Hex")] Vec<u8>);

impl Digest {
    /// Wrap raw digest bytes.
    #[must_use]
    pub const fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Borrow the digest bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Number of bytes in the digest.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the digest holds no bytes.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Lowercase hex rendering.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    /// Parse a digest from a hex string.
    ///
    /// # Errors
    /// Returns an error if the string is not valid hex.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        hex::decode(s.trim()).map(Self)
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.to_hex())
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl AsRef<[u8]> for Digest {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for Digest {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for Digest {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl<const N: usize> From<[u8; N]> for Digest {
    fn from(bytes: [u8; N]) -> Self {
        Self(bytes.to_vec())
    }
}

impl From<Digest> for Vec<u8> {
    fn from(digest: Digest) -> Self {
        digest.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_round_trip_and_display() {
        let digest = Digest::from([0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(digest.to_hex(), "deadbeef");
        assert_eq!(digest.to_string(), "deadbeef");
        assert_eq!(
            Digest::from_hex(" deadbeef\n").expect("valid hex"),
            digest
        );
        assert!(Digest::from_hex("xyz").is_err());
    }

    #[test]
    fn serializes_as_hex_string() {
        let digest = Digest::from([0x00, 0xff]);
        let json = serde_json::to_string(&digest).expect("digest should serialize");
        assert_eq!(json, "\"00ff\"");

        let back: Digest = serde_json::from_str(&json).expect("digest should deserialize");
        assert_eq!(back, digest);
    }
}
