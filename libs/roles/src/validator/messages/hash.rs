//! Digests of the consensus objects.
//! Each kind of object has its own digest type, so that e.g. a block hash
//! cannot be passed where a fact hash is expected.
use isaac_consensus_crypto::{sha256::Sha256, ByteFmt, Text, TextFmt};
use std::fmt;

macro_rules! digest_type {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(pub(crate) Sha256);

        impl $name {
            /// Hashes `msg`.
            pub fn new(msg: &[u8]) -> Self {
                Self(Sha256::new(msg))
            }

            /// Hashes the concatenation of `parts`.
            pub fn concat<'a>(parts: impl IntoIterator<Item = &'a [u8]>) -> Self {
                Self(Sha256::concat(parts))
            }

            /// Raw bytes of the digest.
            pub fn as_bytes(&self) -> &[u8; 32] {
                self.0.as_bytes()
            }

            /// Whether this is the all-zero (unset) digest.
            pub fn is_empty(&self) -> bool {
                self.0.is_zero()
            }
        }

        impl ByteFmt for $name {
            fn decode(bytes: &[u8]) -> anyhow::Result<Self> {
                ByteFmt::decode(bytes).map(Self)
            }
            fn encode(&self) -> Vec<u8> {
                ByteFmt::encode(&self.0)
            }
        }

        impl TextFmt for $name {
            fn decode(text: Text) -> anyhow::Result<Self> {
                text.strip($prefix)?.decode_hex().map(Self)
            }
            fn encode(&self) -> String {
                format!("{}{}", $prefix, hex::encode(ByteFmt::encode(&self.0)))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
                fmt.write_str(&TextFmt::encode(self))
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
                isaac_consensus_crypto::serde_text::serialize(self, s)
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
                isaac_consensus_crypto::serde_text::deserialize(d)
            }
        }
    };
}

digest_type!(
    /// Hash of the canonical bytes of a `Fact`.
    FactHash,
    "fact:sha256:"
);

digest_type!(
    /// Hash of a ballot body: its fact and embedded voteproof.
    BodyHash,
    "ballot_body:sha256:"
);

digest_type!(
    /// Hash of a whole signed ballot envelope.
    BallotHash,
    "ballot:sha256:"
);

digest_type!(
    /// Hash of a block manifest.
    BlockHash,
    "block:sha256:"
);

digest_type!(
    /// Hash of a proposal.
    ProposalHash,
    "proposal:sha256:"
);

digest_type!(
    /// Hash of an operation included in a proposal.
    OperationHash,
    "operation:sha256:"
);

digest_type!(
    /// Identifier of a voteproof: hash of its canonical bytes.
    VoteproofId,
    "voteproof:sha256:"
);
