//! Errors of the ballot aggregation core.
use isaac_consensus_roles::{
    node,
    validator::{self, BallotError, ThresholdError, VoteproofError},
};

use crate::policy::PolicyError;

/// Category of an error, deciding how the caller reacts to it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed data: wrong hash, bad signature, bad threshold. Not retried.
    InvalidData,
    /// Height or round too low compared to the local state. Dropped.
    StaleBallot,
    /// The voter is not in the acting suffrage. Dropped.
    NotInSuffrage,
    /// A non-voting stage reached the vote path. Programmer error.
    NotVotingStage,
    /// Storage or crypto failure. Fatal to the caller.
    Fault,
    /// A voteproof contradicts itself or the local chain.
    Inconsistent,
}

/// Error returned by `Ballotbox::vote`.
#[derive(Debug, thiserror::Error)]
pub enum BallotboxError {
    /// Only INIT, SIGN and ACCEPT ballots are counted.
    #[error("{0} is not a voting stage")]
    NotVotingStage(validator::Stage),
    /// The ballot cannot be counted: its fact is malformed or does not match its hash.
    #[error("invalid ballot: {0}")]
    InvalidBallot(#[source] BallotError),
}

impl BallotboxError {
    /// Category of the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotVotingStage(_) => ErrorKind::NotVotingStage,
            Self::InvalidBallot(_) => ErrorKind::InvalidData,
        }
    }
}

/// Error returned by `BallotChecker`.
#[derive(Debug, thiserror::Error)]
pub enum CheckerError {
    /// Ballot was signed too far from the local time.
    #[error("out of timespan: {0}")]
    OutOfTimespan(#[source] BallotError),
    /// Voter is not in the suffrage.
    #[error("{0} is not in the suffrage")]
    NotInSuffrage(node::Address),
    /// Voter signed with another key than the one registered in the suffrage.
    #[error("{node} signed with {signer:?}, but its key is {want:?}")]
    SignerMismatch {
        /// Voter.
        node: node::Address,
        /// Key the ballot was signed with.
        signer: validator::PublicKey,
        /// Key registered in the suffrage.
        want: validator::PublicKey,
    },
    /// Ballot is not above the last block.
    #[error("ballot height {ballot} is not above the last block {last_block}")]
    BelowLastBlock {
        /// Height of the ballot.
        ballot: validator::Height,
        /// Height of the last block.
        last_block: validator::Height,
    },
    /// INIT ballot for the next height is not built on the last block.
    #[error("INIT ballot builds on {ballot:?}, but the last block is {last_block:?}")]
    PreviousBlockMismatch {
        /// Previous block referenced by the ballot.
        ballot: validator::BlockHash,
        /// Hash of the last block.
        last_block: validator::BlockHash,
    },
    /// INIT ballot for the next height references another round of the last block.
    #[error("INIT ballot builds on round {ballot}, but the last block was accepted in {last_block}")]
    PreviousRoundMismatch {
        /// Previous round referenced by the ballot.
        ballot: validator::Round,
        /// Round of the last block.
        last_block: validator::Round,
    },
    /// Ballot is below the last INIT voteproof.
    #[error("ballot height {ballot} is below the last INIT voteproof {last_init}")]
    BelowLastInit {
        /// Height of the ballot.
        ballot: validator::Height,
        /// Height of the last INIT voteproof.
        last_init: validator::Height,
    },
    /// Non-INIT ballot does not belong to the (height, round) of the last INIT voteproof.
    #[error("{stage} ballot at {ballot:?}, but the last INIT voteproof is at {last_init:?}")]
    NotInLastInit {
        /// Stage of the ballot.
        stage: validator::Stage,
        /// (height, round) of the ballot.
        ballot: (validator::Height, validator::Round),
        /// (height, round) of the last INIT voteproof.
        last_init: (validator::Height, validator::Round),
    },
    /// INIT ballot at the height of the last INIT voteproof does not advance the round.
    #[error("INIT ballot round {ballot} does not advance the last INIT voteproof round {last_init}")]
    RoundNotAdvanced {
        /// Round of the ballot.
        ballot: validator::Round,
        /// Round of the last INIT voteproof.
        last_init: validator::Round,
    },
    /// Ballot failed verification.
    #[error("invalid ballot: {0}")]
    InvalidBallot(#[from] BallotError),
    /// Voteproof embedded in an INIT ballot contradicts the last block.
    #[error("embedded voteproof contradicts the last block: {0}")]
    LastBlockMismatch(#[source] VoteproofError),
    /// Voteproof embedded in the ballot counts a vote of a node outside of the suffrage.
    #[error("embedded voteproof counts a vote of {0}, which is not in the suffrage")]
    VoterNotInSuffrage(node::Address),
    /// Voteproof embedded in the ballot counts a vote signed with another key than the voter's.
    #[error("embedded voteproof counts a vote of {node} signed with {signer:?}, but its key is {want:?}")]
    VoterSignerMismatch {
        /// Voter.
        node: node::Address,
        /// Key the vote was signed with.
        signer: validator::PublicKey,
        /// Key registered in the suffrage.
        want: validator::PublicKey,
    },
    /// Voteproof embedded in the ballot was counted against another threshold than the local one.
    #[error("embedded voteproof threshold {got:?} does not match the local threshold {want:?}")]
    ThresholdMismatch {
        /// Threshold of the voteproof.
        got: validator::Threshold,
        /// Threshold of the local policy.
        want: validator::Threshold,
    },
    /// The local policy does not define a valid threshold.
    #[error("local policy: {0}")]
    InvalidPolicy(#[source] ThresholdError),
}

impl CheckerError {
    /// Category of the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotInSuffrage(_) => ErrorKind::NotInSuffrage,
            Self::BelowLastBlock { .. }
            | Self::BelowLastInit { .. }
            | Self::NotInLastInit { .. }
            | Self::RoundNotAdvanced { .. } => ErrorKind::StaleBallot,
            Self::OutOfTimespan(_)
            | Self::SignerMismatch { .. }
            | Self::PreviousBlockMismatch { .. }
            | Self::PreviousRoundMismatch { .. }
            | Self::InvalidBallot(_) => ErrorKind::InvalidData,
            Self::LastBlockMismatch(_)
            | Self::VoterNotInSuffrage(_)
            | Self::VoterSignerMismatch { .. }
            | Self::ThresholdMismatch { .. } => ErrorKind::Inconsistent,
            Self::InvalidPolicy(_) => ErrorKind::Fault,
        }
    }
}

/// Error of the ballot aggregation core. Every subsystem error converts into it.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Ballot verification failed.
    #[error(transparent)]
    Ballot(#[from] BallotError),
    /// Voteproof verification failed.
    #[error(transparent)]
    Voteproof(#[from] VoteproofError),
    /// Ballotbox rejected the ballot.
    #[error(transparent)]
    Ballotbox(#[from] BallotboxError),
    /// Ballot checker rejected the ballot.
    #[error(transparent)]
    Checker(#[from] CheckerError),
    /// Policy is invalid.
    #[error(transparent)]
    Policy(#[from] PolicyError),
    /// Internal error. Unlike other error types, this one isn't supposed to be easily recoverable.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl Error {
    /// Category of the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Ballot(_) | Self::Policy(_) => ErrorKind::InvalidData,
            Self::Voteproof(_) => ErrorKind::Inconsistent,
            Self::Ballotbox(err) => err.kind(),
            Self::Checker(err) => err.kind(),
            Self::Internal(_) => ErrorKind::Fault,
        }
    }
}
