//! Cryptographic primitives used by the consensus core:
//! SHA256 digests for facts, ballots and voteproofs, and
//! ed25519 signatures for ballots.

pub use fmt::*;

pub mod ed25519;
mod fmt;
pub mod sha256;
