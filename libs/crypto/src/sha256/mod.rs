//! Wrappers for the SHA256 cryptographic hash algorithm.
use crate::ByteFmt;
use sha2::{digest::Update as _, Digest as _};
use std::fmt;

pub mod testonly;

/// SHA256 hash.
#[derive(Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Sha256(pub(crate) [u8; 32]);

impl Sha256 {
    /// Length of the digest in bytes.
    pub const LEN: usize = 32;

    /// Computes a SHA256 hash of a message.
    pub fn new(msg: &[u8]) -> Self {
        Self(sha2::Sha256::new().chain(msg).finalize().into())
    }

    /// Computes a SHA256 hash of the concatenation of `parts`,
    /// without materializing the concatenation.
    pub fn concat<'a>(parts: impl IntoIterator<Item = &'a [u8]>) -> Self {
        let h = parts
            .into_iter()
            .fold(sha2::Sha256::new(), |h, part| h.chain(part));
        Self(h.finalize().into())
    }

    /// Returns a reference to the bytes of this hash.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// All-zero digest. It is never the output of the hash function
    /// in practice, so it is treated as an empty value.
    pub fn is_zero(&self) -> bool {
        self.0 == [0; 32]
    }
}

impl fmt::Debug for Sha256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl ByteFmt for Sha256 {
    fn decode(bytes: &[u8]) -> anyhow::Result<Self> {
        Ok(Self(bytes.try_into()?))
    }

    fn encode(&self) -> Vec<u8> {
        self.0.to_vec()
    }
}
