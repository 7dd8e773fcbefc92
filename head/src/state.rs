use std::collections::{BTreeMap, BTreeSet};

use chain::{HeadId, HeadParameters, UnixTime};
use ledger::Ledger;
use multisig::Party;

use crate::snapshot::{ConfirmedSnapshot, SnapshotInProgress};

/// State of the head as tracked by this node.
#[derive(Clone, Debug, PartialEq)]
pub enum HeadState<L: Ledger> {
    /// No head is known.
    Idle,
    /// A head was initialised and is collecting commits.
    Initial(InitialHead<L>),
    /// The head is open and processing off-chain transactions.
    Open(OpenHead<L>),
    /// The head was closed; waiting out the contestation period.
    Closed(ClosedHead<L>),
    /// The head is finalised. No further events are accepted.
    Final(FinalHead<L>),
}

/// Head state while commits are collected.
#[derive(Clone, Debug, PartialEq)]
pub struct InitialHead<L: Ledger> {
    /// The initialised head.
    pub head_id: HeadId,
    /// Frozen head parameters.
    pub parameters: HeadParameters,
    /// Commits observed so far, keyed by party index.
    pub committed: BTreeMap<u32, L::Utxo>,
    /// Parties whose commit is still outstanding.
    pub pending_commits: Vec<Party>,
}

/// Head state of an open head.
#[derive(Clone, Debug, PartialEq)]
pub struct OpenHead<L: Ledger> {
    /// The open head.
    pub head_id: HeadId,
    /// Frozen head parameters.
    pub parameters: HeadParameters,
    /// The latest snapshot everyone signed.
    pub confirmed_snapshot: ConfirmedSnapshot<L>,
    /// The confirmed UTxO with all locally seen transactions applied.
    pub local_utxo: L::Utxo,
    /// Transactions applied since the last confirmed snapshot, in
    /// application order.
    pub seen_txs: Vec<L::Tx>,
    /// Acknowledgements received per unconfirmed transaction.
    pub acks: BTreeMap<L::TxId, BTreeSet<u32>>,
    /// Transactions acknowledged by every party, awaiting snapshotting,
    /// in confirmation order.
    pub confirmed_txs: Vec<L::TxId>,
    /// The snapshot currently being signed, if any.
    pub pending_snapshot: Option<SnapshotInProgress<L>>,
}

impl<L: Ledger> OpenHead<L> {
    /// Looks up a seen transaction by id.
    pub fn seen_tx(&self, id: &L::TxId) -> Option<&L::Tx> {
        self.seen_txs.iter().find(|tx| L::tx_id(tx) == *id)
    }
}

/// Head state after a close was observed.
#[derive(Clone, Debug, PartialEq)]
pub struct ClosedHead<L: Ledger> {
    /// The closed head.
    pub head_id: HeadId,
    /// Frozen head parameters.
    pub parameters: HeadParameters,
    /// Our latest confirmed snapshot, used for contesting and fanout.
    pub confirmed_snapshot: ConfirmedSnapshot<L>,
    /// Instant after which the head can be fanned out.
    pub contestation_deadline: UnixTime,
    /// Parties observed contesting so far.
    pub contesters: Vec<Party>,
}

/// Terminal head state.
#[derive(Clone, Debug, PartialEq)]
pub struct FinalHead<L: Ledger> {
    /// The UTxO set materialised back on the base chain.
    pub utxo: L::Utxo,
}
