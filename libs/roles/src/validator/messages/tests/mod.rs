use super::*;
use crate::validator::testonly::Setup;
use isaac_concurrency::{ctx, time};
use isaac_consensus_crypto::{ByteFmt, Text, TextFmt};
use rand::Rng as _;

mod fact;

#[test]
fn test_byte_encoding() {
    let ctx = ctx::test_root(&ctx::ManualClock::new());
    let rng = &mut ctx.rng();

    let h: FactHash = rng.gen();
    assert_eq!(h, ByteFmt::decode(&ByteFmt::encode(&h)).unwrap());
}

#[test]
fn test_text_encoding() {
    let ctx = ctx::test_root(&ctx::ManualClock::new());
    let rng = &mut ctx.rng();

    let h: FactHash = rng.gen();
    let t = TextFmt::encode(&h);
    assert!(t.starts_with("fact:sha256:"));
    assert_eq!(h, Text::new(&t).decode::<FactHash>().unwrap());
    // Digests of different kinds do not parse as each other.
    assert!(Text::new(&t).decode::<BlockHash>().is_err());

    let h: BallotHash = rng.gen();
    let t = TextFmt::encode(&h);
    assert_eq!(h, Text::new(&t).decode::<BallotHash>().unwrap());

    let nid = NetworkId::new("isaac");
    let t = TextFmt::encode(&nid);
    assert_eq!(nid, Text::new(&t).decode::<NetworkId>().unwrap());
}

#[test]
fn test_height() {
    assert!(Height::GENESIS.is_valid());
    assert!(!Height::INVALID.is_valid());
    assert_eq!(Height(10).next(), Height(11));
    assert_eq!(Height(10).prev(), Some(Height(9)));
    assert_eq!(Height::GENESIS.prev(), None);
    assert_eq!(Height(5).checked_sub(6), None);
    assert_eq!(Height(i64::MIN).checked_sub(1), None);
    assert_eq!(Height(-2).to_bytes(), (-2i64).to_le_bytes());
}

#[test]
fn test_stage_bytes() {
    for (stage, b) in [
        (Stage::Init, 1),
        (Stage::Sign, 2),
        (Stage::Accept, 3),
        (Stage::Proposal, 9),
    ] {
        assert_eq!(stage.to_byte(), b);
        assert_eq!(Stage::try_from(b).unwrap(), stage);
    }
    assert!(Stage::try_from(4).is_err());
    assert!(!Stage::Proposal.can_vote());
    assert!(Stage::Sign.can_vote());
}

#[test]
fn test_manifest_hash() {
    let ctx = ctx::test_root(&ctx::ManualClock::new());
    let rng = &mut ctx.rng();
    let m: Manifest = rng.gen();
    let mut m2 = m.clone();
    assert_eq!(m.hash(), m2.hash());
    m2.round = m2.round.next();
    assert_ne!(m.hash(), m2.hash());
}

#[test]
fn test_suffrage() {
    let ctx = ctx::test_root(&ctx::ManualClock::new());
    let rng = &mut ctx.rng();
    let setup = Setup::new(rng, 4);
    assert_eq!(setup.suffrage.len(), 4);
    assert!(setup.suffrage.contains(&setup.addresses[2]));
    assert_eq!(
        setup.suffrage.key(&setup.addresses[2]),
        Some(&setup.keys[2].public())
    );
    assert!(!setup.suffrage.contains(&rng.gen()));
    assert_eq!(setup.threshold().required(), 3);

    let json = serde_json::to_string(&setup.suffrage).unwrap();
    assert_eq!(setup.suffrage, serde_json::from_str(&json).unwrap());

    // Duplicates and empty suffrages are rejected.
    let m = SuffrageMember {
        address: setup.addresses[0].clone(),
        key: setup.keys[0].public(),
    };
    assert!(Suffrage::new([m.clone(), m]).is_err());
    assert!(Suffrage::new([]).is_err());
}
