//! Votes of a single (height, round, stage).
use isaac_concurrency::ctx;
use isaac_consensus_roles::{
    node,
    validator::{self, tally::Tally, Ballot, Voteproof, VoteproofV0},
};
use std::collections::BTreeMap;

/// Accumulates the ballots of a single (height, round, stage) and builds its voteproof.
///
/// The first ballot of each node wins; later ballots of the same node are ignored.
/// Once the voteproof has finished, its result never changes: ballots arriving
/// afterwards only mark it as closed.
#[derive(Debug)]
pub struct VoteRecords {
    ballots: BTreeMap<node::Address, Ballot>,
    voteproof: VoteproofV0,
}

impl VoteRecords {
    /// Empty records for (height, round, stage), counted against `threshold`.
    pub fn new(
        height: validator::Height,
        round: validator::Round,
        stage: validator::Stage,
        threshold: validator::Threshold,
    ) -> Self {
        Self {
            ballots: BTreeMap::new(),
            voteproof: VoteproofV0::new(height, round, stage, threshold),
        }
    }

    /// Threshold the votes are counted against.
    pub fn threshold(&self) -> &validator::Threshold {
        &self.voteproof.threshold
    }

    /// Ballots counted so far, including those which arrived after the vote finished.
    pub fn ballots(&self) -> &BTreeMap<node::Address, Ballot> {
        &self.ballots
    }

    /// Whether the vote has been decided.
    pub fn is_finished(&self) -> bool {
        self.voteproof.is_finished()
    }

    /// Current voteproof.
    pub fn voteproof(&self) -> Voteproof {
        self.voteproof.clone().into()
    }

    /// Counts `ballot` and returns the resulting voteproof.
    /// The ballot has to belong to the (height, round, stage) of the records.
    pub fn vote(&mut self, ctx: &ctx::Ctx, ballot: &Ballot) -> Voteproof {
        let vp = &mut self.voteproof;
        debug_assert_eq!(
            (ballot.height(), ballot.round(), ballot.stage()),
            (vp.height, vp.round, vp.stage)
        );
        if self.ballots.contains_key(&ballot.node) {
            tracing::debug!(
                height = %vp.height,
                round = %vp.round,
                stage = %vp.stage,
                node = %ballot.node,
                "duplicate ballot, ignoring",
            );
            return self.voteproof();
        }
        self.ballots.insert(ballot.node.clone(), ballot.clone());

        if vp.is_finished() {
            vp.closed = true;
            return self.voteproof();
        }

        vp.facts
            .entry(ballot.fact_hash)
            .or_insert_with(|| ballot.fact.clone());
        vp.ballots.insert(ballot.node.clone(), ballot.hash);
        vp.votes.insert(ballot.node.clone(), ballot.vote());

        let required = usize::try_from(vp.threshold.required()).unwrap_or(usize::MAX);
        if vp.votes.len() < required {
            return self.voteproof();
        }

        let tally = vp.tally();
        vp.result = tally.into();
        if let Tally::Majority(fact) = tally {
            vp.majority = vp.facts.get(&fact).cloned();
        }
        if vp.is_finished() {
            vp.finished_at = Some(ctx.now_utc());
        }
        self.voteproof()
    }
}
