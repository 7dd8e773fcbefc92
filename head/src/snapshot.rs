use merlin::Transcript;
use serde::{Deserialize, Serialize};

use chain::HeadId;
use ledger::Ledger;
use multisig::{hash_utxo, hash_value, Hash32, MultiSignature, Party, Signature, SigningKey};

/// A signed, numbered, agreed-upon UTxO state of the open head.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Snapshot<L: Ledger> {
    /// Head the snapshot belongs to.
    pub head_id: HeadId,
    /// Strictly sequential snapshot number; 0 is the collect-com snapshot.
    pub number: u64,
    /// The agreed UTxO set.
    pub utxo: L::Utxo,
    /// Transactions folded into this snapshot, in application order.
    pub confirmed: Vec<L::TxId>,
}

impl<L: Ledger> Snapshot<L> {
    /// Signing domain of the snapshot: head id, number, UTxO hash and the
    /// confirmed transaction list. Binding the number and the UTxO hash
    /// prevents a signature from being replayed for any other snapshot.
    pub fn transcript(&self) -> Transcript {
        let mut t = Transcript::new(b"Head.snapshot");
        t.append_message(b"head-id", self.head_id.0.as_ref());
        t.append_u64(b"number", self.number);
        t.append_message(b"utxo-hash", self.utxo_hash().as_ref());
        t.append_message(b"txids-hash", hash_value(b"txids", &self.confirmed).as_ref());
        t
    }

    /// Hash of the snapshot's UTxO set.
    pub fn utxo_hash(&self) -> Hash32 {
        hash_utxo(&self.utxo)
    }

    /// Signs the snapshot body.
    pub fn sign(&self, key: &SigningKey) -> Signature {
        Signature::sign(&mut self.transcript(), *key)
    }

    /// Whether `signature` is `party`'s signature over exactly this body.
    pub fn verify(&self, party: &Party, signature: &Signature) -> bool {
        signature.verify(&mut self.transcript(), party.key).is_ok()
    }
}

/// The latest snapshot every party has signed off on.
///
/// Snapshot 0 is formed implicitly at collect-com and carries no
/// signatures; every later snapshot carries the full aggregate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub enum ConfirmedSnapshot<L: Ledger> {
    /// The initial snapshot formed at collect-com.
    Initial {
        /// UTxO set collected from all commits.
        utxo: L::Utxo,
    },
    /// A multi-signed snapshot.
    Confirmed {
        /// The snapshot body.
        snapshot: Snapshot<L>,
        /// One verifying signature per party, in party order.
        signatures: MultiSignature,
    },
}

impl<L: Ledger> ConfirmedSnapshot<L> {
    /// Number of the confirmed snapshot.
    pub fn number(&self) -> u64 {
        match self {
            ConfirmedSnapshot::Initial { .. } => 0,
            ConfirmedSnapshot::Confirmed { snapshot, .. } => snapshot.number,
        }
    }

    /// The confirmed UTxO set.
    pub fn utxo(&self) -> &L::Utxo {
        match self {
            ConfirmedSnapshot::Initial { utxo } => utxo,
            ConfirmedSnapshot::Confirmed { snapshot, .. } => &snapshot.utxo,
        }
    }

    /// Hash of the confirmed UTxO set.
    pub fn utxo_hash(&self) -> Hash32 {
        hash_utxo(self.utxo())
    }

    /// The aggregate signature, absent for snapshot 0.
    pub fn signatures(&self) -> Option<&MultiSignature> {
        match self {
            ConfirmedSnapshot::Initial { .. } => None,
            ConfirmedSnapshot::Confirmed { signatures, .. } => Some(signatures),
        }
    }
}

/// The snapshot currently being signed. At most one exists per head.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct SnapshotInProgress<L: Ledger> {
    /// Party that requested the snapshot.
    pub leader: Party,
    /// Locally computed candidate body being signed.
    pub body: Snapshot<L>,
    /// Verified acknowledgement signatures, keyed by party index.
    pub acks: std::collections::BTreeMap<u32, Signature>,
}

impl<L: Ledger> SnapshotInProgress<L> {
    /// Number of the in-flight snapshot.
    pub fn number(&self) -> u64 {
        self.body.number
    }
}
