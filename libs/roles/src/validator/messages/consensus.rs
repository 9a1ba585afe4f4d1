//! Coordinates of the consensus protocol: heights, rounds and stages.
use isaac_consensus_crypto::{Text, TextFmt};
use std::fmt;

/// Height of a block.
/// Valid heights are non-negative; `Height::INVALID` is only used on error paths.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct Height(pub i64);

impl Height {
    /// Height which never appears in valid data.
    pub const INVALID: Self = Self(-1);
    /// Height of the genesis block.
    pub const GENESIS: Self = Self(0);

    /// Whether the height is non-negative.
    pub fn is_valid(self) -> bool {
        self.0 >= 0
    }

    /// Returns the next height.
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// Returns the previous height, unless this is the genesis height.
    pub fn prev(self) -> Option<Self> {
        self.checked_sub(1)
    }

    /// Subtracts `n`, returning `None` on underflow below the genesis height.
    pub fn checked_sub(self, n: i64) -> Option<Self> {
        self.0
            .checked_sub(n)
            .filter(|h| *h >= 0)
            .map(Self)
    }

    /// Canonical encoding: 8 bytes, signed little-endian.
    pub fn to_bytes(self) -> [u8; 8] {
        self.0.to_le_bytes()
    }
}

impl fmt::Display for Height {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Round within a height. It is reset to 0 whenever the height advances.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(transparent)]
pub struct Round(pub u64);

impl Round {
    /// First round of every height.
    pub const ZERO: Self = Self(0);

    /// Returns the next round.
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// Canonical encoding: 8 bytes, unsigned little-endian.
    pub fn to_bytes(self) -> [u8; 8] {
        self.0.to_le_bytes()
    }
}

impl fmt::Display for Round {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Stage of the consensus protocol.
/// Only INIT, SIGN and ACCEPT are voted on; PROPOSAL carries no vote.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Stage {
    /// Agreement on starting a new (height, round).
    Init,
    /// Agreement on the proposal.
    Sign,
    /// Agreement on the new block.
    Accept,
    /// Proposal of the round leader.
    Proposal,
}

/// Error returned when decoding an unknown stage byte.
#[derive(Debug, thiserror::Error)]
#[error("unknown stage {0}")]
pub struct UnknownStageError(pub u8);

impl Stage {
    /// Whether ballots of this stage are voted on.
    pub fn can_vote(self) -> bool {
        matches!(self, Self::Init | Self::Sign | Self::Accept)
    }

    /// Canonical encoding: a single byte.
    pub fn to_byte(self) -> u8 {
        match self {
            Self::Init => 1,
            Self::Sign => 2,
            Self::Accept => 3,
            Self::Proposal => 9,
        }
    }
}

impl TryFrom<u8> for Stage {
    type Error = UnknownStageError;
    fn try_from(b: u8) -> Result<Self, Self::Error> {
        Ok(match b {
            1 => Self::Init,
            2 => Self::Sign,
            3 => Self::Accept,
            9 => Self::Proposal,
            b => return Err(UnknownStageError(b)),
        })
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Self::Init => "INIT",
            Self::Sign => "SIGN",
            Self::Accept => "ACCEPT",
            Self::Proposal => "PROPOSAL",
        })
    }
}

/// Identifier of the network, mixed into every signature
/// so that ballots cannot be replayed on another network.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct NetworkId(Vec<u8>);

impl NetworkId {
    /// Constructs a network id from raw bytes.
    pub fn new(id: impl Into<Vec<u8>>) -> Self {
        Self(id.into())
    }

    /// Raw bytes of the network id.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl TextFmt for NetworkId {
    fn encode(&self) -> String {
        format!("network:{}", hex::encode(&self.0))
    }
    fn decode(text: Text) -> anyhow::Result<Self> {
        Ok(Self(hex::decode(text.strip("network:")?.rest())?))
    }
}

impl fmt::Debug for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match std::str::from_utf8(&self.0) {
            Ok(s) => write!(f, "network:{s:?}"),
            Err(_) => f.write_str(&TextFmt::encode(self)),
        }
    }
}

impl serde::Serialize for NetworkId {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        isaac_consensus_crypto::serde_text::serialize(self, s)
    }
}

impl<'de> serde::Deserialize<'de> for NetworkId {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        isaac_consensus_crypto::serde_text::deserialize(d)
    }
}
