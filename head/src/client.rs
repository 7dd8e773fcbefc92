use serde::{Deserialize, Serialize};

use chain::{ChainPoint, ContestationPeriod, UnixTime};
use ledger::Ledger;
use multisig::Party;

use crate::snapshot::Snapshot;

/// Commands a client may submit to the node.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub enum ClientCommand<L: Ledger> {
    /// Announce a new head with the given parties.
    Init {
        /// The full ordered party list, including this node's party.
        parties: Vec<Party>,
        /// Contestation period to freeze into the head.
        contestation_period: ContestationPeriod,
    },
    /// Deposit the given outputs into the initialising head.
    Commit {
        /// Outputs to deposit.
        utxo: L::Utxo,
    },
    /// Submit a transaction to the open head.
    NewTx {
        /// The transaction.
        tx: L::Tx,
    },
    /// Close the head with the latest confirmed snapshot.
    Close,
    /// Ask for the current local UTxO set.
    GetUtxo,
    /// Abort the initialising head and reimburse all commits.
    Abort,
}

/// Notifications reported back to the client. Every command produces
/// exactly one terminal notification.
#[derive(Clone, Debug, PartialEq)]
pub enum ClientNotification<L: Ledger> {
    /// A head including this node was announced; commits may be made.
    ReadyToCommit {
        /// The frozen party list.
        parties: Vec<Party>,
    },
    /// A party's commit was observed.
    Committed {
        /// The committing party.
        party: Party,
        /// The deposited outputs.
        utxo: L::Utxo,
    },
    /// All commits were collected; the head is open.
    HeadIsOpen {
        /// The initial UTxO set of the head.
        utxo: L::Utxo,
    },
    /// A transaction was acknowledged by every party.
    TxReceived {
        /// The confirmed transaction.
        tx: L::Tx,
    },
    /// A snapshot was signed by every party.
    SnapshotConfirmed {
        /// The confirmed snapshot body.
        snapshot: Snapshot<L>,
    },
    /// The head was closed on chain.
    HeadIsClosed {
        /// Deadline after which fanout becomes possible.
        contestation_deadline: UnixTime,
    },
    /// A close or contest was overruled by a newer snapshot.
    HeadIsContested {
        /// Number of the now-winning snapshot.
        snapshot_number: u64,
    },
    /// The head was aborted; commits were reimbursed.
    HeadIsAborted {
        /// The reimbursed outputs.
        utxo: L::Utxo,
    },
    /// The final UTxO was materialised on the base chain.
    HeadIsFinalized {
        /// The distributed outputs.
        utxo: L::Utxo,
    },
    /// A peer announced itself.
    PeerConnected {
        /// Host the peer is reachable at.
        host: String,
    },
    /// The chain rolled back; observations are being replayed.
    RolledBack {
        /// Point the chain state was restored to.
        point: ChainPoint,
    },
    /// Reply to a `GetUtxo` command.
    GetUtxoResponse {
        /// The current local UTxO set.
        utxo: L::Utxo,
    },
    /// A command could not be carried out.
    CommandFailed {
        /// Human-readable reason.
        reason: String,
    },
    /// A waiting event was dropped because the wait queue overflowed.
    EventDropped {
        /// Human-readable description of the dropped event.
        description: String,
    },
}
