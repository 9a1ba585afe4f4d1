//! Block manifests.
use super::{BlockHash, Height, ProposalHash, Round};

/// Header of a stored block. Voteproofs are cross-checked against it.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Manifest {
    /// Height of the block.
    pub height: Height,
    /// Round in which the block was accepted.
    pub round: Round,
    /// Proposal the block was built from.
    pub proposal: ProposalHash,
    /// Hash of the parent block. Unset for the genesis block.
    pub previous_block: BlockHash,
}

impl Manifest {
    /// Canonical encoding of the manifest.
    pub fn to_bytes(&self) -> Vec<u8> {
        [
            &self.height.to_bytes()[..],
            &self.round.to_bytes(),
            self.proposal.as_bytes(),
            self.previous_block.as_bytes(),
        ]
        .concat()
    }

    /// Hash of the block.
    pub fn hash(&self) -> BlockHash {
        BlockHash::new(&self.to_bytes())
    }

    /// Whether this is the manifest of the genesis block.
    pub fn is_genesis(&self) -> bool {
        self.height == Height::GENESIS
    }
}
