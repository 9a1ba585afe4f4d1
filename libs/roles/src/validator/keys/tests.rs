use super::*;
use crate::validator::NetworkId;
use isaac_concurrency::ctx;
use isaac_consensus_crypto::{ByteFmt, Text, TextFmt};
use rand::Rng as _;

#[test]
fn test_byte_encoding() {
    let ctx = ctx::test_root(&ctx::ManualClock::new());
    let rng = &mut ctx.rng();
    let key: SecretKey = rng.gen();
    assert_eq!(key, ByteFmt::decode(&ByteFmt::encode(&key)).unwrap());
    assert_eq!(
        key.public(),
        ByteFmt::decode(&ByteFmt::encode(&key.public())).unwrap()
    );
}

#[test]
fn test_text_encoding() {
    let ctx = ctx::test_root(&ctx::ManualClock::new());
    let rng = &mut ctx.rng();

    let key: SecretKey = rng.gen();
    let t1 = TextFmt::encode(&key);
    let t2 = TextFmt::encode(&key.public());
    assert_eq!(key, Text::new(&t1).decode::<SecretKey>().unwrap());
    assert_eq!(key.public(), Text::new(&t2).decode().unwrap());
    assert!(Text::new(&t1).decode::<PublicKey>().is_err());
    assert!(Text::new(&t2).decode::<SecretKey>().is_err());

    let sig: Signature = rng.gen();
    let t3 = TextFmt::encode(&sig);
    assert_eq!(sig, Text::new(&t3).decode::<Signature>().unwrap());
}

#[test]
fn test_signature_binds_network_id() {
    let ctx = ctx::test_root(&ctx::ManualClock::new());
    let rng = &mut ctx.rng();
    let key: SecretKey = rng.gen();
    let nid = NetworkId::new("testnet");
    let msg: [u8; 32] = rng.gen();

    let sig = key.sign(&msg, &nid);
    sig.verify(&msg, &nid, &key.public()).unwrap();
    assert!(sig
        .verify(&msg, &NetworkId::new("mainnet"), &key.public())
        .is_err());
    assert!(sig.verify(&msg, &nid, &rng.gen()).is_err());
    assert!(sig.verify(&rng.gen::<[u8; 32]>(), &nid, &key.public()).is_err());
}

#[test]
fn test_serde() {
    let ctx = ctx::test_root(&ctx::ManualClock::new());
    let rng = &mut ctx.rng();
    let key: SecretKey = rng.gen();
    let json = serde_json::to_string(&key.public()).unwrap();
    assert_eq!(json, format!("\"{}\"", TextFmt::encode(&key.public())));
    assert_eq!(key.public(), serde_json::from_str(&json).unwrap());
    let json = serde_json::to_string(&key).unwrap();
    assert_eq!(key, serde_json::from_str(&json).unwrap());
}
