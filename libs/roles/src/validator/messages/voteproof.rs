//! Voteproofs: self-contained certificates of the outcome of a (height, round, stage).
use super::{
    tally::{self, Tally},
    BallotHash, BlockHash, Fact, FactError, FactHash, Height, Manifest, NetworkId, Round, Stage,
    Threshold, ThresholdError, VoteproofId,
};
use crate::{
    node,
    validator::{InvalidSignatureError, PublicKey, Signature},
};
use isaac_concurrency::time;
use isaac_consensus_crypto::TextFmt as _;
use std::collections::{BTreeMap, BTreeSet};

/// Result of a vote.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VoteResult {
    /// The vote is still open.
    NotYet,
    /// No fact can reach the threshold.
    Draw,
    /// A fact reached the threshold.
    Majority,
}

impl VoteResult {
    /// Canonical encoding: a single byte.
    pub fn to_byte(self) -> u8 {
        match self {
            Self::NotYet => 0,
            Self::Draw => 1,
            Self::Majority => 2,
        }
    }
}

impl From<Tally> for VoteResult {
    fn from(t: Tally) -> Self {
        match t {
            Tally::NotYet => Self::NotYet,
            Tally::Draw => Self::Draw,
            Tally::Majority(_) => Self::Majority,
        }
    }
}

/// Evidence that `node` voted for `fact`: the fact signature of its ballot.
/// Voteproofs keep these rather than whole ballots.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct VoteproofNodeFact {
    /// Voter.
    pub node: node::Address,
    /// Fact the voter voted for.
    pub fact: FactHash,
    /// Signature of `fact ∥ network_id`.
    pub fact_signature: Signature,
    /// Key of the voter.
    pub signer: PublicKey,
}

impl VoteproofNodeFact {
    /// Verifies the fact signature.
    pub fn verify(&self, network_id: &NetworkId) -> Result<(), InvalidSignatureError> {
        self.fact_signature
            .verify(self.fact.as_bytes(), network_id, &self.signer)
    }

    fn to_bytes(&self) -> Vec<u8> {
        [
            self.node.as_bytes(),
            self.fact.as_bytes(),
            &self.fact_signature.to_bytes(),
            self.signer.encode().as_bytes(),
        ]
        .concat()
    }
}

/// Error returned when a voteproof is invalid.
#[derive(Debug, thiserror::Error)]
pub enum VoteproofError {
    /// Height is negative.
    #[error("invalid height {0}")]
    InvalidHeight(Height),
    /// Stage is not voted on.
    #[error("stage {0} is not a voting stage")]
    NotVotingStage(Stage),
    /// Threshold is invalid.
    #[error("threshold: {0}")]
    Threshold(#[from] ThresholdError),
    /// The voteproof has not finished.
    #[error("voteproof is not finished")]
    NotFinished,
    /// Finished voteproof without the finishing time.
    #[error("finished voteproof without finished_at")]
    MissingFinishedAt,
    /// Result is `Majority`, but there is no majority fact.
    #[error("majority result without majority fact")]
    MissingMajority,
    /// Result is not `Majority`, but there is a majority fact.
    #[error("majority fact with {0:?} result")]
    UnexpectedMajority(VoteResult),
    /// The majority fact is malformed.
    #[error("majority: {0}")]
    InvalidMajority(#[source] FactError),
    /// One of the collections is empty.
    #[error("empty {0}")]
    Empty(&'static str),
    /// Ballots and votes are not keyed by the same nodes.
    #[error("ballots and votes mismatch: {ballots} ballots, {votes} votes")]
    BallotsVotesMismatch {
        /// Number of ballots.
        ballots: usize,
        /// Number of votes.
        votes: usize,
    },
    /// A vote is keyed by another node than the one which cast it.
    #[error("vote of {node} stored under {key}")]
    VoteNodeMismatch {
        /// Key in the votes map.
        key: node::Address,
        /// Voter recorded in the vote.
        node: node::Address,
    },
    /// A vote references a fact which is not included.
    #[error("{node} voted for unknown fact {fact:?}")]
    UnknownFact {
        /// Voter.
        node: node::Address,
        /// The missing fact.
        fact: FactHash,
    },
    /// A fact is included, but nobody voted for it.
    #[error("fact {0:?} has no votes")]
    SurplusFact(FactHash),
    /// A fact is stored under a wrong hash.
    #[error("fact stored under {key:?}, but its hash is {got:?}")]
    FactHashMismatch {
        /// Key in the facts map.
        key: FactHash,
        /// Actual hash of the fact.
        got: FactHash,
    },
    /// A fact is malformed.
    #[error("fact {key:?}: {err}")]
    InvalidFact {
        /// Key in the facts map.
        key: FactHash,
        /// Cause.
        #[source]
        err: FactError,
    },
    /// A fact refers to another (height, round, stage) than the voteproof.
    #[error("fact {0:?} does not belong to the voteproof's height, round and stage")]
    FactOutOfPlace(FactHash),
    /// A vote signature is invalid.
    #[error("vote of {node}: {err}")]
    InvalidVoteSignature {
        /// Voter.
        node: node::Address,
        /// Cause.
        #[source]
        err: InvalidSignatureError,
    },
    /// Recomputed tally does not match the stored result.
    #[error("stored result {stored:?}, recomputed {computed:?}")]
    ResultMismatch {
        /// Stored result.
        stored: VoteResult,
        /// Recomputed result.
        computed: VoteResult,
    },
    /// Recomputed majority does not match the stored majority fact.
    #[error("stored majority {stored:?}, recomputed {computed:?}")]
    MajorityMismatch {
        /// Hash of the stored majority fact.
        stored: FactHash,
        /// Recomputed majority.
        computed: FactHash,
    },
    /// Genesis voteproof for a non-genesis height.
    #[error("genesis voteproof at height {0}")]
    InvalidGenesis(Height),
    /// Voteproof height is incompatible with the block.
    #[error("voteproof height {voteproof} does not match block height {block}")]
    BlockHeightMismatch {
        /// Height of the voteproof.
        voteproof: Height,
        /// Height of the block.
        block: Height,
    },
    /// Voteproof round is incompatible with the block.
    #[error("voteproof round {voteproof} does not match block round {block}")]
    BlockRoundMismatch {
        /// Round (or previous round) referenced by the voteproof.
        voteproof: Round,
        /// Round of the block.
        block: Round,
    },
    /// The majority fact references another block.
    #[error("voteproof references block {voteproof:?}, want {block:?}")]
    BlockHashMismatch {
        /// Block referenced by the majority fact.
        voteproof: BlockHash,
        /// Expected block.
        block: BlockHash,
    },
}

/// Voteproof of the genesis block. It has no votes and is always
/// a closed ACCEPT majority; it justifies the INIT ballots of height 1.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct GenesisVoteproof {
    /// Height of the genesis block.
    pub height: Height,
}

impl Default for GenesisVoteproof {
    fn default() -> Self {
        Self {
            height: Height::GENESIS,
        }
    }
}

/// Voteproof built from the ballots of a (height, round, stage).
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct VoteproofV0 {
    /// Height.
    pub height: Height,
    /// Round.
    pub round: Round,
    /// Stage.
    pub stage: Stage,
    /// Threshold the votes were counted against.
    pub threshold: Threshold,
    /// Result of the vote.
    pub result: VoteResult,
    /// The winning fact, iff `result` is `Majority`.
    pub majority: Option<Fact>,
    /// Every fact voted for, by hash.
    pub facts: BTreeMap<FactHash, Fact>,
    /// Hash of the ballot each voter voted with.
    pub ballots: BTreeMap<node::Address, BallotHash>,
    /// Vote of each voter.
    pub votes: BTreeMap<node::Address, VoteproofNodeFact>,
    /// Time the vote finished. Unset while `result` is `NotYet`.
    pub finished_at: Option<time::Utc>,
    /// Set once a vote arrived after the voteproof had finished.
    /// Not part of the canonical encoding.
    pub closed: bool,
}

impl VoteproofV0 {
    /// Empty voteproof for (height, round, stage).
    pub fn new(height: Height, round: Round, stage: Stage, threshold: Threshold) -> Self {
        Self {
            height,
            round,
            stage,
            threshold,
            result: VoteResult::NotYet,
            majority: None,
            facts: BTreeMap::new(),
            ballots: BTreeMap::new(),
            votes: BTreeMap::new(),
            finished_at: None,
            closed: false,
        }
    }

    /// Counts the votes against the threshold.
    pub fn tally(&self) -> Tally {
        tally::find_majority(
            self.threshold.total(),
            self.threshold.required(),
            self.votes.values().map(|v| &v.fact),
        )
    }

    /// Whether the vote has been decided.
    pub fn is_finished(&self) -> bool {
        self.result != VoteResult::NotYet
    }

    fn to_bytes(&self) -> Vec<u8> {
        let mut b = vec![];
        b.extend(self.height.to_bytes());
        b.extend(self.round.to_bytes());
        b.extend(self.threshold.to_bytes());
        b.push(self.result.to_byte());
        b.push(self.stage.to_byte());
        if let Some(m) = &self.majority {
            b.extend(m.hash().as_bytes());
        }
        for f in self.facts.values() {
            b.extend(f.to_bytes());
        }
        for (node, ballot) in &self.ballots {
            b.extend(node.as_bytes());
            b.extend(ballot.as_bytes());
        }
        for v in self.votes.values() {
            b.extend(v.to_bytes());
        }
        if let Some(t) = &self.finished_at {
            b.extend(t.to_string().as_bytes());
        }
        b
    }

    fn verify(&self, network_id: &NetworkId) -> Result<(), VoteproofError> {
        self.verify_fields()?;
        self.verify_facts()?;
        for (node, v) in &self.votes {
            v.verify(network_id)
                .map_err(|err| VoteproofError::InvalidVoteSignature {
                    node: node.clone(),
                    err,
                })?;
        }
        self.verify_tally()
    }

    fn verify_fields(&self) -> Result<(), VoteproofError> {
        if !self.height.is_valid() {
            return Err(VoteproofError::InvalidHeight(self.height));
        }
        if !self.stage.can_vote() {
            return Err(VoteproofError::NotVotingStage(self.stage));
        }
        self.threshold.validate()?;
        if !self.is_finished() {
            return Err(VoteproofError::NotFinished);
        }
        if self.finished_at.map_or(true, |t| t.is_zero()) {
            return Err(VoteproofError::MissingFinishedAt);
        }
        match (&self.majority, self.result) {
            (Some(m), VoteResult::Majority) => {
                m.validate().map_err(VoteproofError::InvalidMajority)?
            }
            (None, VoteResult::Majority) => return Err(VoteproofError::MissingMajority),
            (Some(_), res) => return Err(VoteproofError::UnexpectedMajority(res)),
            (None, _) => {}
        }
        Ok(())
    }

    fn verify_facts(&self) -> Result<(), VoteproofError> {
        if self.facts.is_empty() {
            return Err(VoteproofError::Empty("facts"));
        }
        if self.ballots.is_empty() {
            return Err(VoteproofError::Empty("ballots"));
        }
        if self.votes.is_empty() {
            return Err(VoteproofError::Empty("votes"));
        }
        if self.ballots.len() != self.votes.len() || !self.ballots.keys().eq(self.votes.keys()) {
            return Err(VoteproofError::BallotsVotesMismatch {
                ballots: self.ballots.len(),
                votes: self.votes.len(),
            });
        }
        let mut voted = BTreeSet::new();
        for (key, v) in &self.votes {
            if key != &v.node {
                return Err(VoteproofError::VoteNodeMismatch {
                    key: key.clone(),
                    node: v.node.clone(),
                });
            }
            if !self.facts.contains_key(&v.fact) {
                return Err(VoteproofError::UnknownFact {
                    node: key.clone(),
                    fact: v.fact,
                });
            }
            voted.insert(v.fact);
        }
        for (key, fact) in &self.facts {
            if !voted.contains(key) {
                return Err(VoteproofError::SurplusFact(*key));
            }
            let got = fact.hash();
            if got != *key {
                return Err(VoteproofError::FactHashMismatch { key: *key, got });
            }
            fact.validate()
                .map_err(|err| VoteproofError::InvalidFact { key: *key, err })?;
            if (fact.height(), fact.round(), fact.stage()) != (self.height, self.round, self.stage)
            {
                return Err(VoteproofError::FactOutOfPlace(*key));
            }
        }
        Ok(())
    }

    fn verify_tally(&self) -> Result<(), VoteproofError> {
        let tally = self.tally();
        let computed = VoteResult::from(tally);
        if computed != self.result {
            return Err(VoteproofError::ResultMismatch {
                stored: self.result,
                computed,
            });
        }
        if let (Tally::Majority(computed), Some(m)) = (tally, &self.majority) {
            let stored = m.hash();
            if stored != computed {
                return Err(VoteproofError::MajorityMismatch { stored, computed });
            }
        }
        Ok(())
    }
}

/// Certificate of the outcome of a (height, round, stage).
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Voteproof {
    /// Voteproof of the genesis block.
    Genesis(GenesisVoteproof),
    /// Voteproof aggregated from ballots.
    V0(VoteproofV0),
}

impl From<VoteproofV0> for Voteproof {
    fn from(vp: VoteproofV0) -> Self {
        Self::V0(vp)
    }
}

impl Voteproof {
    /// Voteproof of the genesis block.
    pub fn genesis() -> Self {
        Self::Genesis(GenesisVoteproof::default())
    }

    /// Height.
    pub fn height(&self) -> Height {
        match self {
            Self::Genesis(vp) => vp.height,
            Self::V0(vp) => vp.height,
        }
    }

    /// Round.
    pub fn round(&self) -> Round {
        match self {
            Self::Genesis(_) => Round::ZERO,
            Self::V0(vp) => vp.round,
        }
    }

    /// Stage.
    pub fn stage(&self) -> Stage {
        match self {
            Self::Genesis(_) => Stage::Accept,
            Self::V0(vp) => vp.stage,
        }
    }

    /// Result of the vote.
    pub fn result(&self) -> VoteResult {
        match self {
            Self::Genesis(_) => VoteResult::Majority,
            Self::V0(vp) => vp.result,
        }
    }

    /// The winning fact. The genesis voteproof has none.
    pub fn majority(&self) -> Option<&Fact> {
        match self {
            Self::Genesis(_) => None,
            Self::V0(vp) => vp.majority.as_ref(),
        }
    }

    /// Threshold the votes were counted against.
    pub fn threshold(&self) -> Option<&Threshold> {
        match self {
            Self::Genesis(_) => None,
            Self::V0(vp) => Some(&vp.threshold),
        }
    }

    /// Votes, by voter.
    pub fn votes(&self) -> Option<&BTreeMap<node::Address, VoteproofNodeFact>> {
        match self {
            Self::Genesis(_) => None,
            Self::V0(vp) => Some(&vp.votes),
        }
    }

    /// Time the vote finished.
    pub fn finished_at(&self) -> Option<time::Utc> {
        match self {
            Self::Genesis(_) => None,
            Self::V0(vp) => vp.finished_at,
        }
    }

    /// Whether the vote has been decided.
    pub fn is_finished(&self) -> bool {
        self.result() != VoteResult::NotYet
    }

    /// Whether a vote arrived after the voteproof had finished.
    pub fn is_closed(&self) -> bool {
        match self {
            Self::Genesis(_) => true,
            Self::V0(vp) => vp.closed,
        }
    }

    /// Canonical encoding, embedded in the body of the ballots justified by this voteproof.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Self::Genesis(vp) => [
                &vp.height.to_bytes()[..],
                &Round::ZERO.to_bytes(),
                &[Stage::Accept.to_byte(), VoteResult::Majority.to_byte()],
            ]
            .concat(),
            Self::V0(vp) => vp.to_bytes(),
        }
    }

    /// Identifier of the voteproof.
    pub fn id(&self) -> VoteproofId {
        VoteproofId::new(&self.to_bytes())
    }

    /// Verifies the voteproof: its fields, its facts, the signatures of its votes,
    /// and that its result is what its votes add up to.
    pub fn verify(&self, network_id: &NetworkId) -> Result<(), VoteproofError> {
        match self {
            Self::Genesis(vp) => {
                if vp.height != Height::GENESIS {
                    return Err(VoteproofError::InvalidGenesis(vp.height));
                }
                Ok(())
            }
            Self::V0(vp) => vp.verify(network_id),
        }
    }

    /// Checks that the voteproof is consistent with a stored block.
    ///
    /// An INIT voteproof at the block's height must be the one which started the block's round,
    /// and an INIT voteproof at the next height must be built on top of the block.
    /// An ACCEPT voteproof must have accepted exactly this block.
    pub fn compare_with_block(&self, block: &Manifest) -> Result<(), VoteproofError> {
        let height_mismatch = || VoteproofError::BlockHeightMismatch {
            voteproof: self.height(),
            block: block.height,
        };
        if let Self::Genesis(vp) = self {
            if vp.height != block.height {
                return Err(height_mismatch());
            }
            return Ok(());
        }
        match self.stage() {
            Stage::Init => {
                let Some(Fact::Init(fact)) = self.majority() else {
                    return Err(VoteproofError::MissingMajority);
                };
                if self.height() == block.height {
                    if self.round() != block.round {
                        return Err(VoteproofError::BlockRoundMismatch {
                            voteproof: self.round(),
                            block: block.round,
                        });
                    }
                    if fact.previous_block != block.previous_block {
                        return Err(VoteproofError::BlockHashMismatch {
                            voteproof: fact.previous_block,
                            block: block.previous_block,
                        });
                    }
                } else if self.height() == block.height.next() {
                    if fact.previous_round != block.round {
                        return Err(VoteproofError::BlockRoundMismatch {
                            voteproof: fact.previous_round,
                            block: block.round,
                        });
                    }
                    if fact.previous_block != block.hash() {
                        return Err(VoteproofError::BlockHashMismatch {
                            voteproof: fact.previous_block,
                            block: block.hash(),
                        });
                    }
                } else {
                    return Err(height_mismatch());
                }
            }
            Stage::Accept => {
                let Some(Fact::Accept(fact)) = self.majority() else {
                    return Err(VoteproofError::MissingMajority);
                };
                if self.height() != block.height {
                    return Err(height_mismatch());
                }
                if self.round() != block.round {
                    return Err(VoteproofError::BlockRoundMismatch {
                        voteproof: self.round(),
                        block: block.round,
                    });
                }
                if fact.new_block != block.hash() {
                    return Err(VoteproofError::BlockHashMismatch {
                        voteproof: fact.new_block,
                        block: block.hash(),
                    });
                }
            }
            Stage::Sign | Stage::Proposal => {}
        }
        Ok(())
    }
}
