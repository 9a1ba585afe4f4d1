use super::*;
use crate::{testonly, LocalState};
use assert_matches::assert_matches;
use isaac_concurrency::time;
use isaac_consensus_roles::validator::{
    testonly::Setup, Height, Manifest, Round, SignFact, Voteproof,
};
use rand::Rng as _;

/// Network of 4 validators, observed by validator 0.
/// The last block is at height 10, accepted in round 3.
struct Env {
    setup: Setup,
    state: LocalState,
    tip: Manifest,
}

impl Env {
    fn new(ctx: &ctx::Ctx) -> Self {
        let rng = &mut ctx.rng();
        let setup = Setup::new(rng, 4);
        let state = testonly::local_state(&setup);
        let mut tip = setup.genesis.clone();
        for i in 1..=10 {
            let round = if i == 10 { Round(3) } else { Round::ZERO };
            tip = setup.next_block(rng, &tip, round);
        }
        assert!(state.set_last_block(tip.clone()));
        Self { setup, state, tip }
    }

    fn checker<'a>(&'a self, ballot: &'a Ballot, snapshot: &'a Snapshot) -> BallotChecker<'a> {
        BallotChecker::new(
            ballot,
            snapshot,
            &self.setup.network_id,
            &self.setup.addresses[0],
        )
    }

    /// Valid INIT ballot of validator `i` for (11, round), on top of the tip.
    fn init_ballot(&self, i: usize, round: Round, now: time::Utc) -> Ballot {
        let fact = self.setup.init_fact(&self.tip, round);
        let vp = self.setup.accept_voteproof(&self.tip, now);
        self.setup.ballot(i, fact, Some(vp), now)
    }

    /// Valid SIGN ballot of validator `i` for (height, round).
    fn sign_ballot(
        &self,
        rng: &mut impl rand::Rng,
        i: usize,
        height: Height,
        round: Round,
        now: time::Utc,
    ) -> Ballot {
        let fact = SignFact {
            height,
            round,
            proposal: rng.gen(),
            new_block: rng.gen(),
        };
        self.setup.ballot(i, fact, None, now)
    }
}

#[test]
fn test_valid_init_ballot() {
    let ctx = &ctx::test_root(&ctx::ManualClock::new());
    let env = Env::new(ctx);
    let snapshot = env.state.snapshot();
    let b = env.init_ballot(1, Round::ZERO, ctx.now_utc());
    assert!(env.checker(&b, &snapshot).check(ctx).unwrap());
}

#[test]
fn test_ballot_from_local() {
    let ctx = &ctx::test_root(&ctx::ManualClock::new());
    let env = Env::new(ctx);
    let snapshot = env.state.snapshot();
    let b = env.init_ballot(0, Round::ZERO, ctx.now_utc());
    assert!(!env.checker(&b, &snapshot).check(ctx).unwrap());
}

#[test]
fn test_out_of_timespan() {
    let clock = ctx::ManualClock::new();
    let ctx = &ctx::test_root(&clock);
    let env = Env::new(ctx);
    let snapshot = env.state.snapshot();
    let b = env.init_ballot(1, Round::ZERO, ctx.now_utc());
    clock.advance(snapshot.policy.timespan_valid_ballot() + time::Duration::seconds(1));
    let err = env.checker(&b, &snapshot).check(ctx).unwrap_err();
    assert_matches!(err, CheckerError::OutOfTimespan(_));
    assert_eq!(err.kind(), crate::ErrorKind::InvalidData);
}

#[test]
fn test_not_in_suffrage() {
    let ctx = &ctx::test_root(&ctx::ManualClock::new());
    let rng = &mut ctx.rng();
    let env = Env::new(ctx);
    let snapshot = env.state.snapshot();
    let now = ctx.now_utc();

    let outsider = node::Address::new("outsider").unwrap();
    let b = Ballot::new(
        &rng.gen(),
        outsider.clone(),
        Fact::Init(env.setup.init_fact(&env.tip, Round::ZERO)),
        Some(env.setup.accept_voteproof(&env.tip, now)),
        now,
        &env.setup.network_id,
    );
    let err = env.checker(&b, &snapshot).check(ctx).unwrap_err();
    assert_matches!(&err, CheckerError::NotInSuffrage(node) if *node == outsider);
    assert_eq!(err.kind(), crate::ErrorKind::NotInSuffrage);
}

#[test]
fn test_signer_mismatch() {
    let ctx = &ctx::test_root(&ctx::ManualClock::new());
    let env = Env::new(ctx);
    let snapshot = env.state.snapshot();
    let now = ctx.now_utc();

    // Validator 2 signs in the name of validator 1.
    let b = Ballot::new(
        &env.setup.keys[2],
        env.setup.addresses[1].clone(),
        Fact::Init(env.setup.init_fact(&env.tip, Round::ZERO)),
        Some(env.setup.accept_voteproof(&env.tip, now)),
        now,
        &env.setup.network_id,
    );
    assert_matches!(
        env.checker(&b, &snapshot).check(ctx),
        Err(CheckerError::SignerMismatch { .. })
    );
}

#[test]
fn test_height_vs_tip() {
    let ctx = &ctx::test_root(&ctx::ManualClock::new());
    let rng = &mut ctx.rng();
    let env = Env::new(ctx);
    let snapshot = env.state.snapshot();
    let now = ctx.now_utc();

    for height in [Height(9), Height(10)] {
        let b = env.sign_ballot(rng, 1, height, Round(3), now);
        let err = env.checker(&b, &snapshot).check(ctx).unwrap_err();
        assert_matches!(
            err,
            CheckerError::BelowLastBlock {
                last_block: Height(10),
                ..
            }
        );
        assert_eq!(err.kind(), crate::ErrorKind::StaleBallot);
    }
    let b = env.sign_ballot(rng, 1, Height(11), Round(3), now);
    assert!(env.checker(&b, &snapshot).height_vs_tip().unwrap());
}

#[test]
fn test_round_vs_tip() {
    let ctx = &ctx::test_root(&ctx::ManualClock::new());
    let rng = &mut ctx.rng();
    let env = Env::new(ctx);
    let snapshot = env.state.snapshot();
    let now = ctx.now_utc();
    let setup = &env.setup;

    let mut fact = setup.init_fact(&env.tip, Round::ZERO);
    fact.previous_block = rng.gen();
    let b = setup.ballot(1, fact, None, now);
    assert_matches!(
        env.checker(&b, &snapshot).round_vs_tip(),
        Err(CheckerError::PreviousBlockMismatch { .. })
    );

    let mut fact = setup.init_fact(&env.tip, Round::ZERO);
    fact.previous_round = Round(2);
    let b = setup.ballot(1, fact, None, now);
    assert_matches!(
        env.checker(&b, &snapshot).round_vs_tip(),
        Err(CheckerError::PreviousRoundMismatch {
            ballot: Round(2),
            last_block: Round(3),
        })
    );

    // Higher heights are not constrained by the tip.
    let next = setup.next_block(rng, &env.tip, Round::ZERO);
    let b = setup.ballot(1, setup.init_fact(&next, Round(5)), None, now);
    assert!(env.checker(&b, &snapshot).round_vs_tip().unwrap());
}

#[test]
fn test_vs_last_init() {
    let ctx = &ctx::test_root(&ctx::ManualClock::new());
    let rng = &mut ctx.rng();
    let env = Env::new(ctx);
    let now = ctx.now_utc();

    // No finished INIT voteproof yet.
    let snapshot = env.state.snapshot();
    let b = env.sign_ballot(rng, 1, Height(11), Round(7), now);
    assert!(env.checker(&b, &snapshot).vs_last_init().unwrap());

    assert!(env
        .state
        .set_last_init_voteproof(env.setup.init_voteproof(&env.tip, Round(3), now)));
    let snapshot = env.state.snapshot();

    // Ballots of other stages have to be in the (height, round) of the last INIT voteproof.
    let b = env.sign_ballot(rng, 1, Height(11), Round(3), now);
    assert!(env.checker(&b, &snapshot).check(ctx).unwrap());
    for (height, round) in [(11, 2), (11, 4), (12, 3)] {
        let b = env.sign_ballot(rng, 1, Height(height), Round(round), now);
        let err = env.checker(&b, &snapshot).check(ctx).unwrap_err();
        assert_matches!(err, CheckerError::NotInLastInit { .. });
        assert_eq!(err.kind(), crate::ErrorKind::StaleBallot);
    }

    // INIT ballots at the same height have to advance the round.
    for round in [Round(2), Round(3)] {
        let b = env.init_ballot(1, round, now);
        assert_matches!(
            env.checker(&b, &snapshot).check(ctx),
            Err(CheckerError::RoundNotAdvanced { .. })
        );
    }
    let b = env.init_ballot(1, Round(4), now);
    assert!(env.checker(&b, &snapshot).check(ctx).unwrap());
}

#[test]
fn test_below_last_init() {
    let ctx = &ctx::test_root(&ctx::ManualClock::new());
    let rng = &mut ctx.rng();
    let env = Env::new(ctx);
    let now = ctx.now_utc();
    let next = env.setup.next_block(rng, &env.tip, Round::ZERO);
    assert!(env
        .state
        .set_last_init_voteproof(env.setup.init_voteproof(&next, Round::ZERO, now)));
    let snapshot = env.state.snapshot();

    // Height 11 is above the tip, but below the last INIT voteproof at 12.
    let b = env.init_ballot(1, Round(9), now);
    assert_matches!(
        env.checker(&b, &snapshot).check(ctx),
        Err(CheckerError::BelowLastInit {
            ballot: Height(11),
            last_init: Height(12),
        })
    );
}

#[test]
fn test_sign_ballot_after_round_change() {
    let ctx = &ctx::test_root(&ctx::ManualClock::new());
    let rng = &mut ctx.rng();
    let env = Env::new(ctx);
    let now = ctx.now_utc();
    assert!(env
        .state
        .set_last_init_voteproof(env.setup.init_voteproof(&env.tip, Round(2), now)));
    let snapshot = env.state.snapshot();

    let b = env.sign_ballot(rng, 1, Height(11), Round(3), now);
    assert_matches!(
        env.checker(&b, &snapshot).vs_last_init(),
        Err(CheckerError::NotInLastInit {
            stage: Stage::Sign,
            ballot: (Height(11), Round(3)),
            last_init: (Height(11), Round(2)),
        })
    );
}

#[test]
fn test_invalid_ballot() {
    let ctx = &ctx::test_root(&ctx::ManualClock::new());
    let env = Env::new(ctx);
    let snapshot = env.state.snapshot();

    let mut b = env.init_ballot(1, Round::ZERO, ctx.now_utc());
    b.signature = b.fact_signature.clone();
    let err = env.checker(&b, &snapshot).check(ctx).unwrap_err();
    assert_matches!(err, CheckerError::InvalidBallot(_));
    assert_eq!(err.kind(), crate::ErrorKind::InvalidData);

    // INIT ballot without the ACCEPT voteproof of the tip.
    let b = env.setup.ballot(
        1,
        env.setup.init_fact(&env.tip, Round::ZERO),
        None,
        ctx.now_utc(),
    );
    assert_matches!(
        env.checker(&b, &snapshot).check(ctx),
        Err(CheckerError::InvalidBallot(_))
    );
}

#[test]
fn test_vs_last_accept() {
    let ctx = &ctx::test_root(&ctx::ManualClock::new());
    let rng = &mut ctx.rng();
    let env = Env::new(ctx);
    let snapshot = env.state.snapshot();
    let now = ctx.now_utc();
    let setup = &env.setup;

    // The embedded voteproof accepted another block at the tip height.
    let mut fork = env.tip.clone();
    fork.proposal = rng.gen();
    let b = setup.ballot(
        1,
        setup.init_fact(&env.tip, Round::ZERO),
        Some(setup.accept_voteproof(&fork, now)),
        now,
    );
    let err = env.checker(&b, &snapshot).check(ctx).unwrap_err();
    assert_matches!(err, CheckerError::LastBlockMismatch(_));
    assert_eq!(err.kind(), crate::ErrorKind::Inconsistent);

    // Voteproofs of other heights are not compared.
    let next = setup.next_block(rng, &env.tip, Round::ZERO);
    let b = setup.ballot(
        1,
        setup.init_fact(&next, Round::ZERO),
        Some(setup.accept_voteproof(&next, now)),
        now,
    );
    assert!(env.checker(&b, &snapshot).vs_last_accept().unwrap());
}

#[test]
fn test_genesis_tip() {
    let ctx = &ctx::test_root(&ctx::ManualClock::new());
    let rng = &mut ctx.rng();
    let setup = Setup::new(rng, 4);
    let state = testonly::local_state(&setup);
    let snapshot = state.snapshot();
    let b = setup.ballot(
        1,
        setup.init_fact(&setup.genesis, Round::ZERO),
        Some(Voteproof::genesis()),
        ctx.now_utc(),
    );
    let checker = BallotChecker::new(&b, &snapshot, &setup.network_id, &setup.addresses[0]);
    assert!(checker.check(ctx).unwrap());
}

#[test]
fn test_skewed_signer_clock() {
    let ctx = &ctx::test_root(&ctx::ManualClock::new());
    let env = Env::new(ctx);
    let snapshot = env.state.snapshot();
    let timespan = snapshot.policy.timespan_valid_ballot();

    // Validator 1 runs ahead of the local clock.
    let skewed = ctx::ManualClock::new();
    let signer = &ctx::test_with_clock(ctx, &skewed);
    skewed.advance(timespan - time::Duration::seconds(1));
    let b = env.init_ballot(1, Round::ZERO, signer.now_utc());
    assert!(env.checker(&b, &snapshot).check(ctx).unwrap());

    skewed.advance(time::Duration::seconds(2));
    let b = env.init_ballot(1, Round::ZERO, signer.now_utc());
    assert_matches!(
        env.checker(&b, &snapshot).check(ctx),
        Err(CheckerError::OutOfTimespan(_))
    );
}

#[test]
fn test_voteproof_in_suffrage() {
    let ctx = &ctx::test_root(&ctx::ManualClock::new());
    let env = Env::new(ctx);
    let snapshot = env.state.snapshot();
    let b = env.init_ballot(1, Round::ZERO, ctx.now_utc());
    assert!(env.checker(&b, &snapshot).voteproof_in_suffrage().unwrap());
}

#[test]
fn test_voteproof_voter_not_in_suffrage() {
    let ctx = &ctx::test_root(&ctx::ManualClock::new());
    let env = Env::new(ctx);
    let snapshot = env.state.snapshot();
    let now = ctx.now_utc();

    // Validator 0 votes under an address unknown to the suffrage.
    let mut other = env.setup.clone();
    other.addresses[0] = node::Address::new("outsider").unwrap();
    let b = env.setup.ballot(
        1,
        env.setup.init_fact(&env.tip, Round::ZERO),
        Some(other.accept_voteproof(&env.tip, now)),
        now,
    );
    let err = env.checker(&b, &snapshot).check(ctx).unwrap_err();
    assert_matches!(&err, CheckerError::VoterNotInSuffrage(node) if node.as_str() == "outsider");
    assert_eq!(err.kind(), crate::ErrorKind::Inconsistent);
}

#[test]
fn test_voteproof_signed_by_foreign_key() {
    let ctx = &ctx::test_root(&ctx::ManualClock::new());
    let rng = &mut ctx.rng();
    let env = Env::new(ctx);
    let snapshot = env.state.snapshot();
    let now = ctx.now_utc();

    // A single validator on the same network, claiming the address of validator 0.
    let mut foreign = Setup::new_with_percent(rng, 1, 100.);
    foreign.network_id = env.setup.network_id.clone();
    let next = env.setup.next_block(rng, &env.tip, Round::ZERO);

    // INIT ballot for height 12, justified by a foreign ACCEPT voteproof of height 11.
    let b = env.setup.ballot(
        1,
        env.setup.init_fact(&next, Round::ZERO),
        Some(foreign.accept_voteproof(&next, now)),
        now,
    );
    let err = env.checker(&b, &snapshot).check(ctx).unwrap_err();
    assert_matches!(
        &err,
        CheckerError::VoterSignerMismatch { node, signer, want }
            if *node == env.setup.addresses[0]
                && *signer == foreign.keys[0].public()
                && *want == env.setup.keys[0].public()
    );
    assert_eq!(err.kind(), crate::ErrorKind::Inconsistent);

    // ACCEPT ballot for height 11, justified by a foreign INIT voteproof.
    let b = env.setup.ballot(
        1,
        env.setup.accept_fact(&next),
        Some(foreign.init_voteproof(&env.tip, Round::ZERO, now)),
        now,
    );
    let err = env.checker(&b, &snapshot).check(ctx).unwrap_err();
    assert_matches!(err, CheckerError::VoterSignerMismatch { .. });
    assert_eq!(err.kind(), crate::ErrorKind::Inconsistent);
}

#[test]
fn test_voteproof_threshold_mismatch() {
    let ctx = &ctx::test_root(&ctx::ManualClock::new());
    let env = Env::new(ctx);
    let snapshot = env.state.snapshot();
    let now = ctx.now_utc();

    let mut strict = env.setup.clone();
    strict.percent = 100.;
    let b = env.setup.ballot(
        1,
        env.setup.init_fact(&env.tip, Round::ZERO),
        Some(strict.accept_voteproof(&env.tip, now)),
        now,
    );
    let err = env.checker(&b, &snapshot).check(ctx).unwrap_err();
    assert_matches!(
        &err,
        CheckerError::ThresholdMismatch { got, want }
            if *got == strict.threshold() && *want == env.setup.threshold()
    );
    assert_eq!(err.kind(), crate::ErrorKind::Inconsistent);
}
