//! The acting suffrage: validators allowed to vote.
use super::{Threshold, ThresholdError};
use crate::{node, validator::PublicKey};
use std::collections::BTreeMap;

/// Set of the currently acting validators, with the key of each of them.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "Vec<SuffrageMember>", into = "Vec<SuffrageMember>")]
pub struct Suffrage(BTreeMap<node::Address, PublicKey>);

/// A single member of the suffrage.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SuffrageMember {
    /// Address of the validator.
    pub address: node::Address,
    /// Key the validator signs its ballots with.
    pub key: PublicKey,
}

impl Suffrage {
    /// Constructs a suffrage. Fails if it is empty or an address is repeated.
    pub fn new(members: impl IntoIterator<Item = SuffrageMember>) -> anyhow::Result<Self> {
        let mut map = BTreeMap::new();
        for m in members {
            anyhow::ensure!(
                map.insert(m.address.clone(), m.key).is_none(),
                "duplicate suffrage member {}",
                m.address
            );
        }
        anyhow::ensure!(!map.is_empty(), "suffrage must not be empty");
        Ok(Self(map))
    }

    /// Whether `node` belongs to the suffrage.
    pub fn contains(&self, node: &node::Address) -> bool {
        self.0.contains_key(node)
    }

    /// Key registered for `node`.
    pub fn key(&self, node: &node::Address) -> Option<&PublicKey> {
        self.0.get(node)
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterates over the members, ordered by address.
    pub fn iter(&self) -> impl Iterator<Item = (&node::Address, &PublicKey)> {
        self.0.iter()
    }

    /// Threshold of `percent`% over the members of the suffrage.
    pub fn threshold(&self, percent: f64) -> Result<Threshold, ThresholdError> {
        Threshold::new(u32::try_from(self.len()).unwrap_or(u32::MAX), percent)
    }
}

impl TryFrom<Vec<SuffrageMember>> for Suffrage {
    type Error = anyhow::Error;
    fn try_from(members: Vec<SuffrageMember>) -> anyhow::Result<Self> {
        Self::new(members)
    }
}

impl From<Suffrage> for Vec<SuffrageMember> {
    fn from(s: Suffrage) -> Self {
        s.0.into_iter()
            .map(|(address, key)| SuffrageMember { address, key })
            .collect()
    }
}
