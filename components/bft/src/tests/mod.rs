use crate::{
    metrics::{DropReason, METRICS},
    testonly, BallotProcessor, ErrorKind, Policy,
};
use assert_matches::assert_matches;
use isaac_concurrency::{ctx, time};
use isaac_consensus_roles::{
    node,
    validator::{
        testonly::Setup, Ballot, Fact, Manifest, ProposalFact, Round, SecretKey, Stage,
        VoteResult, Voteproof,
    },
};
use rand::Rng as _;
use std::sync::Arc;
use test_casing::test_casing;

/// Validators, each running its own processor.
struct Network {
    setup: Setup,
    nodes: Vec<BallotProcessor>,
}

impl Network {
    fn new(rng: &mut impl rand::Rng, validators: usize) -> Self {
        let setup = Setup::new(rng, validators);
        let nodes = (0..validators)
            .map(|i| {
                BallotProcessor::new(
                    Arc::new(testonly::config(&setup, i)),
                    Arc::new(testonly::local_state(&setup)),
                )
                .unwrap()
            })
            .collect();
        Self { setup, nodes }
    }

    /// Delivers a ballot of validator `from` to every node: the local one votes it directly,
    /// the others receive it over the wire. Returns the voteproofs finished by it, per node.
    fn broadcast(&self, ctx: &ctx::Ctx, from: usize, ballot: &Ballot) -> Vec<Option<Voteproof>> {
        let json = serde_json::to_string(ballot).unwrap();
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, node)| {
                if i == from {
                    return node.vote_local(ctx, ballot).unwrap();
                }
                let ballot: Ballot = serde_json::from_str(&json).unwrap();
                node.process(ctx, &ballot).unwrap()
            })
            .collect()
    }

    /// Every validator votes `fact`, justified by its own entry of `voteproofs`.
    /// Returns the voteproof finished at every node.
    fn vote_round(
        &self,
        ctx: &ctx::Ctx,
        fact: &Fact,
        voteproofs: &[Voteproof],
    ) -> Vec<Voteproof> {
        let mut finished = vec![None; self.nodes.len()];
        for (i, vp) in voteproofs.iter().enumerate() {
            let ballot = self.setup.ballot(i, fact.clone(), Some(vp.clone()), ctx.now_utc());
            for (j, vp) in self.broadcast(ctx, i, &ballot).into_iter().enumerate() {
                if let Some(vp) = vp {
                    assert!(finished[j].replace(vp).is_none(), "finished twice");
                }
            }
        }
        finished.into_iter().map(Option::unwrap).collect()
    }
}

#[test_casing(3, [1, 4, 7])]
#[test]
fn test_finalize_blocks(validators: usize) {
    isaac_concurrency::testonly::abort_on_panic();
    let clock = ctx::ManualClock::new();
    let ctx = &ctx::test_root(&clock);
    let rng = &mut ctx.rng();
    let net = Network::new(rng, validators);

    let mut tip = net.setup.genesis.clone();
    let mut accepts = vec![Voteproof::genesis(); net.nodes.len()];
    for _ in 0..3 {
        let fact = Fact::Init(net.setup.init_fact(&tip, Round::ZERO));
        let inits = net.vote_round(ctx, &fact, &accepts);
        for (node, vp) in net.nodes.iter().zip(&inits) {
            assert_eq!(vp.stage(), Stage::Init);
            assert_eq!(vp.result(), VoteResult::Majority);
            assert_eq!(vp.majority(), Some(&fact));
            let state = node.state().snapshot();
            assert_eq!(state.last_init_voteproof.as_deref(), Some(vp));
        }

        clock.advance(time::Duration::seconds(1));
        let block = net.setup.next_block(rng, &tip, Round::ZERO);
        let fact = Fact::Accept(net.setup.accept_fact(&block));
        accepts = net.vote_round(ctx, &fact, &inits);
        for (node, vp) in net.nodes.iter().zip(&accepts) {
            assert_eq!(vp.stage(), Stage::Accept);
            assert_eq!(vp.majority(), Some(&fact));
            vp.compare_with_block(&block).unwrap();
            let state = node.state().snapshot();
            assert_eq!(state.last_accept_voteproof.as_deref(), Some(vp));
            assert!(node.state().set_last_block(block.clone()));
        }

        clock.advance(time::Duration::seconds(1));
        tip = block;
    }

    // Records of the previous heights have been purged.
    for node in &net.nodes {
        assert_eq!(node.ballotbox().len(), 2);
    }
}

/// Node 0 has stored the block at height 1.
fn network_at_height_1(ctx: &ctx::Ctx) -> (Network, Manifest) {
    let rng = &mut ctx.rng();
    let net = Network::new(rng, 4);
    let block = net.setup.next_block(rng, &net.setup.genesis, Round::ZERO);
    assert!(net.nodes[0].state().set_last_block(block.clone()));
    (net, block)
}

#[test]
fn test_stale_ballot_dropped() {
    let ctx = &ctx::test_root(&ctx::ManualClock::new());
    let (net, _) = network_at_height_1(ctx);

    let fact = net.setup.init_fact(&net.setup.genesis, Round::ZERO);
    let ballot = net
        .setup
        .ballot(1, fact, Some(Voteproof::genesis()), ctx.now_utc());
    assert_eq!(net.nodes[0].process(ctx, &ballot).unwrap(), None);
    assert_eq!(net.nodes[0].ballotbox().len(), 0);
}

#[test]
fn test_outsider_dropped() {
    let ctx = &ctx::test_root(&ctx::ManualClock::new());
    let rng = &mut ctx.rng();
    let (net, block) = network_at_height_1(ctx);

    let key: SecretKey = rng.gen();
    let ballot = Ballot::new(
        &key,
        node::Address::new("outsider").unwrap(),
        Fact::Init(net.setup.init_fact(&block, Round::ZERO)),
        Some(net.setup.accept_voteproof(&block, ctx.now_utc())),
        ctx.now_utc(),
        &net.setup.network_id,
    );
    let dropped = &METRICS.ballots_dropped[&DropReason::NotInSuffrage];
    let before = dropped.get();
    assert_eq!(net.nodes[0].process(ctx, &ballot).unwrap(), None);
    assert_eq!(net.nodes[0].ballotbox().len(), 0);
    // Other tests share the counter.
    assert!(dropped.get() > before);
}

#[test]
fn test_invalid_ballot_rejected() {
    let ctx = &ctx::test_root(&ctx::ManualClock::new());
    let (net, block) = network_at_height_1(ctx);

    let mut ballot = net.setup.ballot(
        1,
        net.setup.init_fact(&block, Round::ZERO),
        Some(net.setup.accept_voteproof(&block, ctx.now_utc())),
        ctx.now_utc(),
    );
    ballot.signature = net.setup.keys[1].sign(b"garbage", &net.setup.network_id);
    let err = net.nodes[0].process(ctx, &ballot).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidData);
    assert_eq!(net.nodes[0].ballotbox().len(), 0);
}

#[test]
fn test_last_block_mismatch_rejected() {
    let ctx = &ctx::test_root(&ctx::ManualClock::new());
    let rng = &mut ctx.rng();
    let (net, block) = network_at_height_1(ctx);

    // Validator 1 claims a different block was accepted at height 1.
    let fork = net.setup.next_block(rng, &net.setup.genesis, Round::ZERO);
    let ballot = net.setup.ballot(
        1,
        net.setup.init_fact(&block, Round::ZERO),
        Some(net.setup.accept_voteproof(&fork, ctx.now_utc())),
        ctx.now_utc(),
    );
    let err = net.nodes[0].process(ctx, &ballot).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Inconsistent);
}

#[test]
fn test_local_ballots() {
    let ctx = &ctx::test_root(&ctx::ManualClock::new());
    let (net, block) = network_at_height_1(ctx);

    let ballot = net.setup.ballot(
        0,
        net.setup.init_fact(&block, Round::ZERO),
        Some(net.setup.accept_voteproof(&block, ctx.now_utc())),
        ctx.now_utc(),
    );
    // Echoed back by the network.
    assert_eq!(net.nodes[0].process(ctx, &ballot).unwrap(), None);
    assert_eq!(net.nodes[0].ballotbox().len(), 0);

    assert_eq!(net.nodes[0].vote_local(ctx, &ballot).unwrap(), None);
    assert_eq!(net.nodes[0].ballotbox().len(), 1);

    let proposal = ProposalFact {
        height: block.height.next(),
        round: Round::ZERO,
        operations: vec![],
    };
    let ballot = net.setup.ballot(0, proposal, None, ctx.now_utc());
    let err = net.nodes[0].vote_local(ctx, &ballot).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotVotingStage);
}

#[test]
fn test_duplicate_ballot() {
    let ctx = &ctx::test_root(&ctx::ManualClock::new());
    let (net, block) = network_at_height_1(ctx);

    let ballot = net.setup.ballot(
        1,
        net.setup.init_fact(&block, Round::ZERO),
        Some(net.setup.accept_voteproof(&block, ctx.now_utc())),
        ctx.now_utc(),
    );
    let node = &net.nodes[0];
    assert_eq!(node.process(ctx, &ballot).unwrap(), None);
    assert_eq!(node.process(ctx, &ballot).unwrap(), None);
    let key = (ballot.height(), ballot.round(), ballot.stage());
    let vp = node.ballotbox().voteproof(&key).unwrap();
    assert_eq!(vp.votes().unwrap().len(), 1);
    assert_eq!(vp.result(), VoteResult::NotYet);
}

#[test]
fn test_threshold_follows_policy() {
    let ctx = &ctx::test_root(&ctx::ManualClock::new());
    let (net, block) = network_at_height_1(ctx);
    let node = &net.nodes[0];

    let mut policy = Policy::clone(&node.state().snapshot().policy);
    policy.set_threshold_ratio(100.).unwrap();
    node.state().set_policy(policy).unwrap();

    let fact = net.setup.init_fact(&block, Round::ZERO);
    // Voteproofs counted against the old threshold no longer justify ballots.
    let old = net.setup.accept_voteproof(&block, ctx.now_utc());
    let ballot = net.setup.ballot(1, fact.clone(), Some(old), ctx.now_utc());
    let err = node.process(ctx, &ballot).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Inconsistent);
    assert_eq!(node.ballotbox().len(), 0);

    let mut strict = net.setup.clone();
    strict.percent = 100.;
    let vp = strict.accept_voteproof(&block, ctx.now_utc());
    for i in 1..4 {
        let ballot = net.setup.ballot(i, fact.clone(), Some(vp.clone()), ctx.now_utc());
        assert_eq!(node.process(ctx, &ballot).unwrap(), None);
    }
    let ballot = net.setup.ballot(0, fact, Some(vp), ctx.now_utc());
    let got = node.vote_local(ctx, &ballot).unwrap().unwrap();
    assert_eq!(got.result(), VoteResult::Majority);
    assert_eq!(got.votes().unwrap().len(), 4);
    assert_matches!(got.threshold(), Some(t) if t.required() == 4);
}
