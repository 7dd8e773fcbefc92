use serde::{Deserialize, Serialize};

use ledger::Ledger;
use multisig::{hash_value, Hash32, MultiSignature, Party};

use crate::types::{ChainSlot, ContestationPeriod, HeadId, OutputRef, UnixTime};

/// A base-ledger transaction driving the head lifecycle.
///
/// The base ledger's full transaction language is out of scope here; what
/// the protocol engine constructs and observes are the structured head
/// transitions below, identified by a transcript-derived hash.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct ChainTx<L: Ledger> {
    /// The lifecycle transition the transaction performs.
    pub body: ChainTxBody<L>,
}

impl<L: Ledger> ChainTx<L> {
    /// Wraps a transition body into a transaction.
    pub fn new(body: ChainTxBody<L>) -> Self {
        ChainTx { body }
    }

    /// Stable identifier of the transaction.
    pub fn id(&self) -> Hash32 {
        hash_value(b"chain-tx", &self.body)
    }

    /// The head the transaction belongs to.
    pub fn head_id(&self) -> HeadId {
        self.body.head_id()
    }
}

/// Bodies of the seven head lifecycle transactions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub enum ChainTxBody<L: Ledger> {
    /// Announces a new head and freezes its parameters.
    Init {
        /// Identifier of the announced head.
        head_id: HeadId,
        /// The seed output spent to make the head id unique.
        seed: OutputRef,
        /// The frozen ordered party list.
        parties: Vec<Party>,
        /// The frozen contestation period.
        contestation_period: ContestationPeriod,
    },
    /// Deposits a party's UTxO into the head.
    Commit {
        /// Head being committed to.
        head_id: HeadId,
        /// The committing party.
        party: Party,
        /// The deposited outputs.
        committed: L::Utxo,
    },
    /// Collects all commits and opens the head.
    Collect {
        /// Head being opened.
        head_id: HeadId,
    },
    /// Aborts an initialising head, reimbursing all commits.
    Abort {
        /// Head being aborted.
        head_id: HeadId,
    },
    /// Closes the head with a confirmed snapshot.
    Close {
        /// Head being closed.
        head_id: HeadId,
        /// Party posting the close.
        closer: Party,
        /// Number of the closing snapshot.
        snapshot_number: u64,
        /// Hash of the closing snapshot's UTxO set.
        utxo_hash: Hash32,
        /// Aggregate signature over the snapshot, absent for snapshot 0.
        signatures: Option<MultiSignature>,
        /// Lower bound of the transaction validity window.
        lower_slot: ChainSlot,
        /// Upper bound of the transaction validity window.
        upper_time: UnixTime,
    },
    /// Overrules a close (or an earlier contest) with a newer snapshot.
    Contest {
        /// Head being contested.
        head_id: HeadId,
        /// Party posting the contest.
        contester: Party,
        /// Number of the contesting snapshot.
        snapshot_number: u64,
        /// Hash of the contesting snapshot's UTxO set.
        utxo_hash: Hash32,
        /// Aggregate signature over the contesting snapshot.
        signatures: MultiSignature,
    },
    /// Materialises the final head UTxO back on the base chain.
    Fanout {
        /// Head being finalised.
        head_id: HeadId,
        /// The distributed UTxO set.
        utxo: L::Utxo,
    },
}

impl<L: Ledger> ChainTxBody<L> {
    /// The head the transition belongs to.
    pub fn head_id(&self) -> HeadId {
        match self {
            ChainTxBody::Init { head_id, .. }
            | ChainTxBody::Commit { head_id, .. }
            | ChainTxBody::Collect { head_id }
            | ChainTxBody::Abort { head_id }
            | ChainTxBody::Close { head_id, .. }
            | ChainTxBody::Contest { head_id, .. }
            | ChainTxBody::Fanout { head_id, .. } => *head_id,
        }
    }
}
