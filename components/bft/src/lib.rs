//! Ballot aggregation core of the ISAAC consensus.
//!
//! Validators vote on every (height, round, stage) of the protocol by broadcasting signed ballots.
//! This crate checks the incoming ballots against the local state of the node, counts them in the
//! [`Ballotbox`] and produces voteproofs: self-contained certificates of the outcome of a vote,
//! which drive the consensus to the next stage.

pub use ballotbox::{Ballotbox, RecordKey};
pub use checker::BallotChecker;
pub use config::Config;
pub use error::{BallotboxError, CheckerError, Error, ErrorKind};
pub use policy::{Policy, PolicyError};
pub use processor::BallotProcessor;
pub use state::{LocalState, Snapshot};
pub use vote_records::VoteRecords;

mod ballotbox;
mod checker;
mod config;
mod error;
mod metrics;
mod policy;
mod processor;
mod state;
pub mod testonly;
#[cfg(test)]
mod tests;
mod vote_records;
