use serde::{Deserialize, Serialize};

use chain::{ContestationPeriod, HeadId, UnixTime};
use ledger::Ledger;
use multisig::Party;

use crate::client::ClientNotification;
use crate::event::Event;
use crate::message::Message;
use crate::snapshot::ConfirmedSnapshot;

/// Request to post a head lifecycle transaction on the base chain.
///
/// The state machine only decides *that* a transition should be posted;
/// turning the request into an actual base-ledger transaction is the chain
/// layer's job (see the constructors in the `chain` crate).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub enum PostChainTx<L: Ledger> {
    /// Announce a new head.
    Init {
        /// The frozen party list.
        parties: Vec<Party>,
        /// The frozen contestation period.
        contestation_period: ContestationPeriod,
    },
    /// Deposit outputs into the head.
    Commit {
        /// The head to commit to.
        head_id: HeadId,
        /// Outputs to deposit.
        utxo: L::Utxo,
    },
    /// Collect all commits and open the head.
    Collect {
        /// The head to open.
        head_id: HeadId,
    },
    /// Abort the initialising head.
    Abort {
        /// The head to abort.
        head_id: HeadId,
    },
    /// Close the head with the given confirmed snapshot.
    Close {
        /// The head to close.
        head_id: HeadId,
        /// Snapshot to close with.
        confirmed: ConfirmedSnapshot<L>,
    },
    /// Contest a close with a newer confirmed snapshot.
    Contest {
        /// The contested head.
        head_id: HeadId,
        /// The newer snapshot.
        confirmed: ConfirmedSnapshot<L>,
    },
    /// Fan out the final UTxO after the contestation deadline.
    Fanout {
        /// The head to finalise.
        head_id: HeadId,
        /// The UTxO set to distribute.
        utxo: L::Utxo,
        /// Deadline the fanout must respect.
        contestation_deadline: UnixTime,
    },
}

/// Side effect produced by one `update` step.
///
/// Effects are dispatched by the node in the order returned, and only
/// after the causing event is durable in the journal.
#[derive(Clone, Debug, PartialEq)]
pub enum Effect<L: Ledger> {
    /// Broadcast a message to every head member, including ourselves.
    SendToPeers(Message<L>),
    /// Report a notification to the client.
    NotifyClient(ClientNotification<L>),
    /// Post a lifecycle transaction on the base chain.
    PostTx(PostChainTx<L>),
    /// Re-enqueue an event after a delay. The only core-level timeout is
    /// the contestation deadline, delivered back as a `Tick`.
    Delay {
        /// Delay before the event fires, in milliseconds.
        duration_ms: u64,
        /// The event to enqueue.
        event: Event<L>,
    },
}
