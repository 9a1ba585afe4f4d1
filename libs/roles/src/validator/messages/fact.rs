//! Facts: the hashable semantic content of ballots.
use super::{BlockHash, FactHash, Height, OperationHash, ProposalHash, Round, Stage};
use isaac_consensus_utils::enum_util::{BadVariantError, Variant};

/// Error returned when a fact is malformed.
#[derive(Debug, thiserror::Error)]
pub enum FactError {
    /// Height is negative.
    #[error("invalid height {0}")]
    InvalidHeight(Height),
    /// A required digest is unset.
    #[error("empty {0}")]
    EmptyHash(&'static str),
}

/// Fact of an INIT ballot: the node is ready to start (height, round)
/// on top of `previous_block`, finished in `previous_round`.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct InitFact {
    /// Height of the block being agreed on.
    pub height: Height,
    /// Round within the height.
    pub round: Round,
    /// Hash of the block at `height - 1`.
    pub previous_block: BlockHash,
    /// Round in which the previous block was accepted.
    pub previous_round: Round,
}

/// Fact of a SIGN ballot: the node has validated `proposal`
/// and built `new_block` from it.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SignFact {
    /// Height of the block being agreed on.
    pub height: Height,
    /// Round within the height.
    pub round: Round,
    /// Hash of the proposal of the round.
    pub proposal: ProposalHash,
    /// Hash of the block built from the proposal.
    pub new_block: BlockHash,
}

/// Fact of an ACCEPT ballot: the node accepts `new_block`.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AcceptFact {
    /// Height of the block being agreed on.
    pub height: Height,
    /// Round within the height.
    pub round: Round,
    /// Hash of the proposal of the round.
    pub proposal: ProposalHash,
    /// Hash of the block built from the proposal.
    pub new_block: BlockHash,
}

/// Fact of a PROPOSAL ballot. Proposals are not voted on.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ProposalFact {
    /// Height of the proposed block.
    pub height: Height,
    /// Round of the proposal.
    pub round: Round,
    /// Operations included in the proposed block.
    pub operations: Vec<OperationHash>,
}

/// Content of a ballot.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "stage", rename_all = "UPPERCASE")]
pub enum Fact {
    /// INIT fact.
    Init(InitFact),
    /// SIGN fact.
    Sign(SignFact),
    /// ACCEPT fact.
    Accept(AcceptFact),
    /// PROPOSAL fact.
    Proposal(ProposalFact),
}

impl Fact {
    /// Stage of the ballots carrying this fact.
    pub fn stage(&self) -> Stage {
        match self {
            Self::Init(_) => Stage::Init,
            Self::Sign(_) => Stage::Sign,
            Self::Accept(_) => Stage::Accept,
            Self::Proposal(_) => Stage::Proposal,
        }
    }

    /// Height the fact refers to.
    pub fn height(&self) -> Height {
        match self {
            Self::Init(f) => f.height,
            Self::Sign(f) => f.height,
            Self::Accept(f) => f.height,
            Self::Proposal(f) => f.height,
        }
    }

    /// Round the fact refers to.
    pub fn round(&self) -> Round {
        match self {
            Self::Init(f) => f.round,
            Self::Sign(f) => f.round,
            Self::Accept(f) => f.round,
            Self::Proposal(f) => f.round,
        }
    }

    /// Canonical encoding of the fact. The stage is not part of it.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut b = Vec::with_capacity(80);
        b.extend(self.height().to_bytes());
        b.extend(self.round().to_bytes());
        match self {
            Self::Init(f) => {
                b.extend(f.previous_block.as_bytes());
                b.extend(f.previous_round.to_bytes());
            }
            Self::Sign(SignFact {
                proposal,
                new_block,
                ..
            })
            | Self::Accept(AcceptFact {
                proposal,
                new_block,
                ..
            }) => {
                b.extend(proposal.as_bytes());
                b.extend(new_block.as_bytes());
            }
            Self::Proposal(f) => {
                for op in &f.operations {
                    b.extend(op.as_bytes());
                }
            }
        }
        b
    }

    /// Hash of the canonical encoding.
    pub fn hash(&self) -> FactHash {
        FactHash::new(&self.to_bytes())
    }

    /// Checks the fields of the fact.
    pub fn validate(&self) -> Result<(), FactError> {
        if !self.height().is_valid() {
            return Err(FactError::InvalidHeight(self.height()));
        }
        match self {
            Self::Init(f) => {
                if f.previous_block.is_empty() {
                    return Err(FactError::EmptyHash("previous block"));
                }
            }
            Self::Sign(SignFact {
                proposal,
                new_block,
                ..
            })
            | Self::Accept(AcceptFact {
                proposal,
                new_block,
                ..
            }) => {
                if proposal.is_empty() {
                    return Err(FactError::EmptyHash("proposal"));
                }
                if new_block.is_empty() {
                    return Err(FactError::EmptyHash("new block"));
                }
            }
            Self::Proposal(f) => {
                if f.operations.iter().any(OperationHash::is_empty) {
                    return Err(FactError::EmptyHash("operation"));
                }
            }
        }
        Ok(())
    }
}

impl Variant<Fact> for InitFact {
    fn insert(self) -> Fact {
        Fact::Init(self)
    }
    fn extract(fact: Fact) -> Result<Self, BadVariantError> {
        let Fact::Init(this) = fact else {
            return Err(BadVariantError);
        };
        Ok(this)
    }
}

impl Variant<Fact> for SignFact {
    fn insert(self) -> Fact {
        Fact::Sign(self)
    }
    fn extract(fact: Fact) -> Result<Self, BadVariantError> {
        let Fact::Sign(this) = fact else {
            return Err(BadVariantError);
        };
        Ok(this)
    }
}

impl Variant<Fact> for AcceptFact {
    fn insert(self) -> Fact {
        Fact::Accept(self)
    }
    fn extract(fact: Fact) -> Result<Self, BadVariantError> {
        let Fact::Accept(this) = fact else {
            return Err(BadVariantError);
        };
        Ok(this)
    }
}

impl Variant<Fact> for ProposalFact {
    fn insert(self) -> Fact {
        Fact::Proposal(self)
    }
    fn extract(fact: Fact) -> Result<Self, BadVariantError> {
        let Fact::Proposal(this) = fact else {
            return Err(BadVariantError);
        };
        Ok(this)
    }
}

impl Variant<Fact> for Fact {
    fn insert(self) -> Fact {
        self
    }
    fn extract(fact: Fact) -> Result<Self, BadVariantError> {
        Ok(fact)
    }
}
