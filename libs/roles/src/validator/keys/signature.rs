use super::{InvalidSignatureError, PublicKey};
use crate::validator::NetworkId;
use isaac_consensus_crypto::{ed25519, ByteFmt, Text, TextFmt};
use std::fmt;

/// A signature of a validator.
#[derive(Clone, PartialEq, Eq)]
pub struct Signature(pub(crate) ed25519::Signature);

impl Signature {
    /// Verifies that this is a signature of `msg ∥ network_id` by `pk`.
    pub fn verify(
        &self,
        msg: &[u8],
        network_id: &NetworkId,
        pk: &PublicKey,
    ) -> Result<(), InvalidSignatureError> {
        pk.0.verify_parts(&[msg, network_id.as_bytes()], &self.0)
    }

    /// Raw bytes of the signature, as included in the canonical encodings.
    pub fn to_bytes(&self) -> [u8; 64] {
        self.0.to_bytes()
    }
}

impl ByteFmt for Signature {
    fn encode(&self) -> Vec<u8> {
        ByteFmt::encode(&self.0)
    }
    fn decode(bytes: &[u8]) -> anyhow::Result<Self> {
        ByteFmt::decode(bytes).map(Self)
    }
}

impl TextFmt for Signature {
    fn encode(&self) -> String {
        format!(
            "validator:signature:ed25519:{}",
            hex::encode(ByteFmt::encode(&self.0))
        )
    }
    fn decode(text: Text) -> anyhow::Result<Self> {
        text.strip("validator:signature:ed25519:")?
            .decode_hex()
            .map(Self)
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.write_str(&TextFmt::encode(self))
    }
}

impl serde::Serialize for Signature {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        isaac_consensus_crypto::serde_text::serialize(self, s)
    }
}

impl<'de> serde::Deserialize<'de> for Signature {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        isaac_consensus_crypto::serde_text::deserialize(d)
    }
}
