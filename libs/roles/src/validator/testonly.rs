//! Test-only utilities.
use super::{
    AcceptFact, Ballot, BlockHash, Fact, Height, InitFact, Manifest, NetworkId, Round, SecretKey, Suffrage,
    SuffrageMember, Threshold, Voteproof, VoteproofV0, VoteResult,
};
use super::tally::Tally;
use crate::node;
use isaac_concurrency::time;
use isaac_consensus_utils::enum_util::Variant;
use rand::Rng;

/// Test setup: a network of validators forming the suffrage,
/// on top of a genesis block.
#[derive(Debug, Clone)]
pub struct Setup {
    /// Network the validators sign for.
    pub network_id: NetworkId,
    /// Validators' secret keys.
    pub keys: Vec<SecretKey>,
    /// Validators' addresses. `addresses[i]` signs with `keys[i]`.
    pub addresses: Vec<node::Address>,
    /// Suffrage made of all the validators.
    pub suffrage: Suffrage,
    /// Threshold percent.
    pub percent: f64,
    /// Genesis block.
    pub genesis: Manifest,
}

impl Setup {
    /// New `Setup` with a 67% threshold.
    pub fn new(rng: &mut impl Rng, validators: usize) -> Self {
        Self::new_with_percent(rng, validators, 67.)
    }

    /// New `Setup` with the given threshold percent.
    pub fn new_with_percent(rng: &mut impl Rng, validators: usize, percent: f64) -> Self {
        let keys: Vec<SecretKey> = (0..validators).map(|_| rng.gen()).collect();
        let addresses: Vec<_> = (0..validators)
            .map(|i| node::Address::new(format!("n{i}")).unwrap())
            .collect();
        let suffrage = Suffrage::new(keys.iter().zip(&addresses).map(|(k, a)| SuffrageMember {
            address: a.clone(),
            key: k.public(),
        }))
        .unwrap();
        Self {
            network_id: NetworkId::new(format!("isaac-test-{}", rng.gen::<u32>())),
            keys,
            addresses,
            suffrage,
            percent,
            genesis: Manifest {
                height: Height::GENESIS,
                round: Round::ZERO,
                proposal: rng.gen(),
                previous_block: BlockHash::default(),
            },
        }
    }

    /// Threshold over the whole suffrage.
    pub fn threshold(&self) -> Threshold {
        self.suffrage.threshold(self.percent).unwrap()
    }

    /// Ballot of the `i`-th validator.
    pub fn ballot(
        &self,
        i: usize,
        fact: impl Variant<Fact>,
        voteproof: Option<Voteproof>,
        signed_at: time::Utc,
    ) -> Ballot {
        Ballot::new(
            &self.keys[i],
            self.addresses[i].clone(),
            fact.insert(),
            voteproof,
            signed_at,
            &self.network_id,
        )
    }

    /// INIT fact for (height, round) on top of `parent`.
    pub fn init_fact(&self, parent: &Manifest, round: Round) -> InitFact {
        InitFact {
            height: parent.height.next(),
            round,
            previous_block: parent.hash(),
            previous_round: parent.round,
        }
    }

    /// A child block of `parent`, accepted in `round`.
    pub fn next_block(&self, rng: &mut impl Rng, parent: &Manifest, round: Round) -> Manifest {
        Manifest {
            height: parent.height.next(),
            round,
            proposal: rng.gen(),
            previous_block: parent.hash(),
        }
    }

    /// ACCEPT fact accepting `block`.
    pub fn accept_fact(&self, block: &Manifest) -> AcceptFact {
        AcceptFact {
            height: block.height,
            round: block.round,
            proposal: block.proposal,
            new_block: block.hash(),
        }
    }

    /// Voteproof aggregating `votes` (validator index, fact), as a ballotbox would.
    /// All facts must have the same height, round and stage.
    pub fn voteproof(&self, votes: &[(usize, Fact)], finished_at: time::Utc) -> VoteproofV0 {
        let first = &votes[0].1;
        let mut vp = VoteproofV0::new(first.height(), first.round(), first.stage(), self.threshold());
        for (i, fact) in votes {
            let b = self.ballot(*i, fact.clone(), None, finished_at);
            vp.facts.insert(b.fact_hash, b.fact.clone());
            vp.ballots.insert(b.node.clone(), b.hash);
            vp.votes.insert(b.node.clone(), b.vote());
        }
        let tally = vp.tally();
        vp.result = VoteResult::from(tally);
        if let Tally::Majority(h) = tally {
            vp.majority = vp.facts.get(&h).cloned();
        }
        if vp.is_finished() {
            vp.finished_at = Some(finished_at);
        }
        vp
    }

    /// Finished ACCEPT voteproof of `block`, signed by every validator.
    pub fn accept_voteproof(&self, block: &Manifest, finished_at: time::Utc) -> Voteproof {
        if block.is_genesis() {
            return Voteproof::genesis();
        }
        let fact = Fact::Accept(self.accept_fact(block));
        let votes: Vec<_> = (0..self.keys.len()).map(|i| (i, fact.clone())).collect();
        self.voteproof(&votes, finished_at).into()
    }

    /// Finished INIT voteproof for (parent.height + 1, round), signed by every validator.
    pub fn init_voteproof(
        &self,
        parent: &Manifest,
        round: Round,
        finished_at: time::Utc,
    ) -> Voteproof {
        let fact = Fact::Init(self.init_fact(parent, round));
        let votes: Vec<_> = (0..self.keys.len()).map(|i| (i, fact.clone())).collect();
        self.voteproof(&votes, finished_at).into()
    }
}
