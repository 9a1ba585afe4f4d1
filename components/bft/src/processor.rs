//! Entry point of incoming ballots: checks them, votes them and publishes finished voteproofs.
use crate::{
    error::{CheckerError, Error, ErrorKind},
    metrics::{DropReason, METRICS},
    policy::PolicyError,
    Ballotbox, BallotChecker, Config, LocalState,
};
use isaac_concurrency::ctx;
use isaac_consensus_roles::validator::{Ballot, Stage, Voteproof};
use std::sync::Arc;

/// Feeds ballots into the ballotbox of the local node.
#[derive(Debug)]
pub struct BallotProcessor {
    config: Arc<Config>,
    state: Arc<LocalState>,
    ballotbox: Ballotbox,
}

fn drop_reason(err: &CheckerError) -> DropReason {
    match err {
        CheckerError::OutOfTimespan(_) => DropReason::OutOfTimespan,
        err => match err.kind() {
            ErrorKind::NotInSuffrage => DropReason::NotInSuffrage,
            ErrorKind::StaleBallot => DropReason::Stale,
            _ => DropReason::Invalid,
        },
    }
}

impl BallotProcessor {
    /// Constructs a processor voting with the threshold of the current policy.
    pub fn new(config: Arc<Config>, state: Arc<LocalState>) -> Result<Self, Error> {
        let threshold = state
            .snapshot()
            .policy
            .threshold()
            .map_err(PolicyError::from)?;
        Ok(Self {
            config,
            state,
            ballotbox: Ballotbox::new(threshold),
        })
    }

    /// Local state updated by the processor.
    pub fn state(&self) -> &Arc<LocalState> {
        &self.state
    }

    /// Ballotbox of the processor.
    pub fn ballotbox(&self) -> &Ballotbox {
        &self.ballotbox
    }

    /// Processes a ballot received from the network.
    ///
    /// Returns the voteproof finished by this ballot, if any. Stale ballots and ballots of
    /// nodes outside of the suffrage are dropped silently; invalid ballots are returned as errors.
    pub fn process(&self, ctx: &ctx::Ctx, ballot: &Ballot) -> Result<Option<Voteproof>, Error> {
        let snapshot = self.state.snapshot();
        let checker = BallotChecker::new(
            ballot,
            &snapshot,
            &self.config.network_id,
            &self.config.address,
        );
        match checker.check(ctx) {
            Ok(true) => {}
            Ok(false) => {
                METRICS.ballots_dropped[&DropReason::FromLocal].inc();
                tracing::debug!(hash = ?ballot.hash, "ballot of the local node from the network, ignoring");
                return Ok(None);
            }
            Err(err) => {
                METRICS.ballots_dropped[&drop_reason(&err)].inc();
                tracing::debug!(
                    height = %ballot.height(),
                    round = %ballot.round(),
                    stage = %ballot.stage(),
                    node = %ballot.node,
                    "dropping ballot: {err:#}",
                );
                return match err.kind() {
                    ErrorKind::StaleBallot | ErrorKind::NotInSuffrage => Ok(None),
                    _ => Err(err.into()),
                };
            }
        }
        self.vote(ctx, ballot)
    }

    /// Votes a ballot signed by the local node. It skips the checks of `process`.
    pub fn vote_local(&self, ctx: &ctx::Ctx, ballot: &Ballot) -> Result<Option<Voteproof>, Error> {
        self.vote(ctx, ballot)
    }

    fn vote(&self, ctx: &ctx::Ctx, ballot: &Ballot) -> Result<Option<Voteproof>, Error> {
        let threshold = self
            .state
            .snapshot()
            .policy
            .threshold()
            .map_err(PolicyError::from)?;
        self.ballotbox.set_threshold(threshold);

        let (vp, finished) = self.ballotbox.vote_and_report(ctx, ballot)?;
        if !finished {
            return Ok(None);
        }
        match vp.stage() {
            Stage::Init => {
                self.state.set_last_init_voteproof(vp.clone());
            }
            Stage::Accept => {
                self.state.set_last_accept_voteproof(vp.clone());
            }
            Stage::Sign | Stage::Proposal => {}
        }
        Ok(Some(vp))
    }
}
