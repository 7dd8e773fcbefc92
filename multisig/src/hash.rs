use core::fmt;
use merlin::Transcript;
use serde::{Deserialize, Serialize};

/// A 32-byte hash value.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Hash32(pub [u8; 32]);

impl AsRef<[u8]> for Hash32 {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl core::ops::Deref for Hash32 {
    type Target = [u8];
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Debug for Hash32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash32({})", hex::encode(&self.0))
    }
}

/// Deterministic hash of a UTxO set, shared by snapshots and the on-chain
/// close/contest/fanout transactions.
pub fn hash_utxo<T: Serialize>(utxo: &T) -> Hash32 {
    hash_value(b"utxo", utxo)
}

/// Hashes any serializable value into a 32-byte digest under a labelled
/// transcript. The canonical bincode encoding is fed into the transcript, so
/// equal values hash equally across processes.
pub fn hash_value<T: Serialize>(label: &'static [u8], value: &T) -> Hash32 {
    let bytes = bincode::serialize(value).expect("serialization of a value in memory never fails");
    let mut t = Transcript::new(b"Head.hash");
    t.append_message(label, &bytes);
    let mut out = [0u8; 32];
    t.challenge_bytes(b"hash", &mut out);
    Hash32(out)
}
