//! Checks of an incoming ballot against the local state, run before it is voted.
use crate::{error::CheckerError, state::Snapshot};
use isaac_concurrency::ctx;
use isaac_consensus_roles::{
    node,
    validator::{Ballot, Fact, NetworkId, Stage},
};

#[cfg(test)]
mod tests;

/// Chain of predicates deciding whether a ballot should reach the ballotbox.
///
/// Every predicate returns `Ok(true)` to continue the chain, `Ok(false)` to stop
/// it silently and `Err` when the ballot has to be rejected.
#[derive(Debug)]
pub struct BallotChecker<'a> {
    ballot: &'a Ballot,
    state: &'a Snapshot,
    network_id: &'a NetworkId,
    local: &'a node::Address,
}

impl<'a> BallotChecker<'a> {
    /// Constructs a checker of `ballot` received by the node `local`.
    pub fn new(
        ballot: &'a Ballot,
        state: &'a Snapshot,
        network_id: &'a NetworkId,
        local: &'a node::Address,
    ) -> Self {
        Self {
            ballot,
            state,
            network_id,
            local,
        }
    }

    /// Runs the whole chain, cheapest predicates first.
    pub fn check(&self, ctx: &ctx::Ctx) -> Result<bool, CheckerError> {
        let chain: [&dyn Fn() -> Result<bool, CheckerError>; 10] = [
            &|| self.is_from_local(),
            &|| self.in_timespan(ctx),
            &|| self.is_in_suffrage(),
            &|| self.check_signing(),
            &|| self.height_vs_tip(),
            &|| self.round_vs_tip(),
            &|| self.vs_last_init(),
            &|| self.validity(),
            &|| self.voteproof_in_suffrage(),
            &|| self.vs_last_accept(),
        ];
        for check in chain {
            if !check()? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Ballots of the local node coming back from the network are not voted again.
    pub fn is_from_local(&self) -> Result<bool, CheckerError> {
        Ok(&self.ballot.node != self.local)
    }

    /// The ballot has been signed within the valid timespan from now.
    pub fn in_timespan(&self, ctx: &ctx::Ctx) -> Result<bool, CheckerError> {
        self.ballot
            .verify_signed_at(ctx.now_utc(), self.state.policy.timespan_valid_ballot())
            .map_err(CheckerError::OutOfTimespan)?;
        Ok(true)
    }

    /// The voter is a member of the suffrage.
    pub fn is_in_suffrage(&self) -> Result<bool, CheckerError> {
        if !self.state.suffrage.contains(&self.ballot.node) {
            return Err(CheckerError::NotInSuffrage(self.ballot.node.clone()));
        }
        Ok(true)
    }

    /// The voter signed with the key registered for it in the suffrage.
    pub fn check_signing(&self) -> Result<bool, CheckerError> {
        let Some(want) = self.state.suffrage.key(&self.ballot.node) else {
            return Err(CheckerError::NotInSuffrage(self.ballot.node.clone()));
        };
        if *want != self.ballot.signer {
            return Err(CheckerError::SignerMismatch {
                node: self.ballot.node.clone(),
                signer: self.ballot.signer,
                want: *want,
            });
        }
        Ok(true)
    }

    /// The ballot is above the last block.
    pub fn height_vs_tip(&self) -> Result<bool, CheckerError> {
        let last_block = self.state.last_block.height;
        if self.ballot.height() <= last_block {
            return Err(CheckerError::BelowLastBlock {
                ballot: self.ballot.height(),
                last_block,
            });
        }
        Ok(true)
    }

    /// An INIT ballot for the next height builds on the last block, in the round it was accepted in.
    /// INIT ballots for higher heights cannot be checked against the last block.
    pub fn round_vs_tip(&self) -> Result<bool, CheckerError> {
        let Fact::Init(fact) = &self.ballot.fact else {
            return Ok(true);
        };
        let tip = &self.state.last_block;
        if fact.height != tip.height.next() {
            return Ok(true);
        }
        let tip_hash = tip.hash();
        if fact.previous_block != tip_hash {
            return Err(CheckerError::PreviousBlockMismatch {
                ballot: fact.previous_block,
                last_block: tip_hash,
            });
        }
        if fact.previous_round != tip.round {
            return Err(CheckerError::PreviousRoundMismatch {
                ballot: fact.previous_round,
                last_block: tip.round,
            });
        }
        Ok(true)
    }

    /// The ballot is not behind the last finished INIT voteproof.
    /// Ballots of other stages belong to its (height, round);
    /// INIT ballots at its height advance the round.
    pub fn vs_last_init(&self) -> Result<bool, CheckerError> {
        let Some(last) = self.state.last_init_voteproof.as_deref() else {
            return Ok(true);
        };
        if !last.is_finished() {
            return Ok(true);
        }
        let (height, round) = (self.ballot.height(), self.ballot.round());
        if height < last.height() {
            return Err(CheckerError::BelowLastInit {
                ballot: height,
                last_init: last.height(),
            });
        }
        match self.ballot.stage() {
            Stage::Init => {
                if height == last.height() && round <= last.round() {
                    return Err(CheckerError::RoundNotAdvanced {
                        ballot: round,
                        last_init: last.round(),
                    });
                }
            }
            stage => {
                if (height, round) != (last.height(), last.round()) {
                    return Err(CheckerError::NotInLastInit {
                        stage,
                        ballot: (height, round),
                        last_init: (last.height(), last.round()),
                    });
                }
            }
        }
        Ok(true)
    }

    /// The ballot, including its embedded voteproof, is well-formed and correctly signed.
    pub fn validity(&self) -> Result<bool, CheckerError> {
        self.ballot.verify(self.network_id)?;
        Ok(true)
    }

    /// The voteproof embedded in the ballot was counted by the local suffrage: every voter is a
    /// member and signed with its registered key, and the threshold is the local one.
    pub fn voteproof_in_suffrage(&self) -> Result<bool, CheckerError> {
        let Some(vp) = &self.ballot.voteproof else {
            return Ok(true);
        };
        // Genesis voteproofs carry no votes.
        let (Some(votes), Some(threshold)) = (vp.votes(), vp.threshold()) else {
            return Ok(true);
        };
        for (node, vote) in votes {
            let Some(want) = self.state.suffrage.key(node) else {
                return Err(CheckerError::VoterNotInSuffrage(node.clone()));
            };
            if *want != vote.signer {
                return Err(CheckerError::VoterSignerMismatch {
                    node: node.clone(),
                    signer: vote.signer,
                    want: *want,
                });
            }
        }
        let want = self
            .state
            .policy
            .threshold()
            .map_err(CheckerError::InvalidPolicy)?;
        if *threshold != want {
            return Err(CheckerError::ThresholdMismatch {
                got: *threshold,
                want,
            });
        }
        Ok(true)
    }

    /// The ACCEPT voteproof embedded in an INIT ballot for the next height
    /// agrees with the last block.
    pub fn vs_last_accept(&self) -> Result<bool, CheckerError> {
        if self.ballot.stage() != Stage::Init {
            return Ok(true);
        }
        let Some(vp) = &self.ballot.voteproof else {
            return Ok(true);
        };
        let tip = &self.state.last_block;
        if vp.height() != tip.height {
            return Ok(true);
        }
        vp.compare_with_block(tip)
            .map_err(CheckerError::LastBlockMismatch)?;
        Ok(true)
    }
}
