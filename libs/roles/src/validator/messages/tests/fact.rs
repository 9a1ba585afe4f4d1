use super::*;
use assert_matches::assert_matches;
use isaac_consensus_utils::enum_util::Variant as _;

#[test]
fn test_init_fact_bytes() {
    let ctx = ctx::test_root(&ctx::ManualClock::new());
    let rng = &mut ctx.rng();
    let f: InitFact = rng.gen();
    let want = [
        &f.height.to_bytes()[..],
        &f.round.to_bytes(),
        f.previous_block.as_bytes(),
        &f.previous_round.to_bytes(),
    ]
    .concat();
    let fact = Fact::Init(f);
    assert_eq!(fact.to_bytes(), want);
    assert_eq!(fact.hash(), FactHash::new(&want));
}

#[test]
fn test_sign_and_accept_fact_bytes() {
    let ctx = ctx::test_root(&ctx::ManualClock::new());
    let rng = &mut ctx.rng();
    let f: SignFact = rng.gen();
    let want = [
        &f.height.to_bytes()[..],
        &f.round.to_bytes(),
        f.proposal.as_bytes(),
        f.new_block.as_bytes(),
    ]
    .concat();
    assert_eq!(Fact::Sign(f.clone()).to_bytes(), want);
    let accept = AcceptFact {
        height: f.height,
        round: f.round,
        proposal: f.proposal,
        new_block: f.new_block,
    };
    assert_eq!(Fact::Accept(accept).to_bytes(), want);
}

#[test]
fn test_fact_accessors() {
    let ctx = ctx::test_root(&ctx::ManualClock::new());
    let rng = &mut ctx.rng();
    let f: AcceptFact = rng.gen();
    let fact = f.clone().insert();
    assert_eq!(fact.stage(), Stage::Accept);
    assert_eq!(fact.height(), f.height);
    assert_eq!(fact.round(), f.round);
    assert_eq!(AcceptFact::extract(fact.clone()).unwrap(), f);
    assert!(InitFact::extract(fact).is_err());
}

#[test]
fn test_fact_validate() {
    let ctx = ctx::test_root(&ctx::ManualClock::new());
    let rng = &mut ctx.rng();

    let f: Fact = rng.gen();
    f.validate().unwrap();

    let mut f: InitFact = rng.gen();
    f.height = Height::INVALID;
    assert_matches!(
        Fact::Init(f).validate(),
        Err(FactError::InvalidHeight(Height::INVALID))
    );

    let mut f: InitFact = rng.gen();
    f.previous_block = BlockHash::default();
    assert_matches!(Fact::Init(f).validate(), Err(FactError::EmptyHash(_)));

    let mut f: SignFact = rng.gen();
    f.proposal = ProposalHash::default();
    assert_matches!(Fact::Sign(f).validate(), Err(FactError::EmptyHash(_)));

    let mut f: AcceptFact = rng.gen();
    f.new_block = BlockHash::default();
    assert_matches!(Fact::Accept(f).validate(), Err(FactError::EmptyHash(_)));

    let mut f: ProposalFact = rng.gen();
    f.operations.push(OperationHash::default());
    assert_matches!(Fact::Proposal(f).validate(), Err(FactError::EmptyHash(_)));
}

#[test]
fn test_fact_serde() {
    let ctx = ctx::test_root(&ctx::ManualClock::new());
    let rng = &mut ctx.rng();
    for _ in 0..10 {
        let f: Fact = rng.gen();
        let json = serde_json::to_value(&f).unwrap();
        assert_eq!(json["stage"], f.stage().to_string());
        let got: Fact = serde_json::from_value(json).unwrap();
        assert_eq!(got.hash(), f.hash());
        assert_eq!(got, f);
    }
}
