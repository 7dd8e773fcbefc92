use curve25519_dalek::scalar::Scalar;
use merlin::Transcript;

use super::*;

fn transcript(msg: &[u8]) -> Transcript {
    let mut t = Transcript::new(b"Headsig.test");
    t.append_message(b"msg", msg);
    t
}

#[test]
fn sign_and_verify() {
    let privkey = Scalar::from(1u64);
    let sig = Signature::sign(&mut transcript(b"hello"), privkey);

    assert!(sig
        .verify(&mut transcript(b"hello"), VerificationKey::from_secret(&privkey))
        .is_ok());
}

#[test]
fn verify_rejects_wrong_key() {
    let privkey = Scalar::from(1u64);
    let other = VerificationKey::from_secret(&Scalar::from(2u64));
    let sig = Signature::sign(&mut transcript(b"hello"), privkey);

    assert_eq!(
        sig.verify(&mut transcript(b"hello"), other),
        Err(MultisigError::InvalidSignature)
    );
}

#[test]
fn verify_rejects_wrong_message() {
    let privkey = Scalar::from(1u64);
    let sig = Signature::sign(&mut transcript(b"hello"), privkey);

    assert_eq!(
        sig.verify(&mut transcript(b"goodbye"), VerificationKey::from_secret(&privkey)),
        Err(MultisigError::InvalidSignature)
    );
}

#[test]
fn signature_bytes_roundtrip() {
    let sig = Signature::sign_message(b"msg", b"payload", Scalar::from(3u64));
    let restored = Signature::from_bytes(&sig.to_bytes()[..]).unwrap();

    assert_eq!(sig, restored);
    assert!(restored
        .verify_message(b"msg", b"payload", VerificationKey::from_secret(&Scalar::from(3u64)))
        .is_ok());
}

#[test]
fn signature_serde_roundtrip() {
    let sig = Signature::sign_message(b"msg", b"payload", Scalar::from(5u64));
    let bytes = bincode::serialize(&sig).unwrap();
    let restored: Signature = bincode::deserialize(&bytes).unwrap();

    assert_eq!(sig, restored);
}

fn parties(keys: &[Scalar]) -> Vec<Party> {
    keys.iter()
        .enumerate()
        .map(|(i, k)| Party::from_secret(i as u32, k))
        .collect()
}

#[test]
fn aggregate_verifies_when_everyone_signed() {
    let keys = vec![Scalar::from(1u64), Scalar::from(2u64), Scalar::from(3u64)];
    let parties = parties(&keys);

    let sigs = keys
        .iter()
        .map(|k| Signature::sign(&mut transcript(b"snapshot"), *k))
        .collect();
    let multi = MultiSignature::aggregate(sigs);

    assert!(multi.verify_all(&parties, &transcript(b"snapshot")).is_ok());
}

#[test]
fn aggregate_attributes_the_failing_share() {
    let keys = vec![Scalar::from(1u64), Scalar::from(2u64), Scalar::from(3u64)];
    let parties = parties(&keys);

    // Party #1 signs a different message.
    let sigs = vec![
        Signature::sign(&mut transcript(b"snapshot"), keys[0]),
        Signature::sign(&mut transcript(b"something else"), keys[1]),
        Signature::sign(&mut transcript(b"snapshot"), keys[2]),
    ];
    let multi = MultiSignature::aggregate(sigs);

    assert_eq!(
        multi.verify_all(&parties, &transcript(b"snapshot")),
        Err(MultisigError::ShareError { index: 1 })
    );
}

#[test]
fn aggregate_rejects_wrong_cardinality() {
    let keys = vec![Scalar::from(1u64), Scalar::from(2u64)];
    let parties = parties(&keys);

    let multi = MultiSignature::aggregate(vec![Signature::sign(
        &mut transcript(b"snapshot"),
        keys[0],
    )]);

    assert_eq!(
        multi.verify_all(&parties, &transcript(b"snapshot")),
        Err(MultisigError::BadArguments)
    );
}

#[test]
fn hash_value_is_deterministic_and_labelled() {
    let a = hash_value(b"utxo", &vec![1u64, 2, 3]);
    let b = hash_value(b"utxo", &vec![1u64, 2, 3]);
    let c = hash_value(b"utxo", &vec![1u64, 2, 4]);
    let d = hash_value(b"txids", &vec![1u64, 2, 3]);

    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_ne!(a, d);
}

#[test]
fn parties_order_by_index() {
    let p1 = Party::from_secret(0, &Scalar::from(9u64));
    let p2 = Party::from_secret(1, &Scalar::from(1u64));

    assert!(p1 < p2);
}
