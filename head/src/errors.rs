use thiserror::Error;

use ledger::{Ledger, LedgerError};
use multisig::Party;

use crate::event::Event;
use crate::state::HeadState;

/// Protocol violations detected by the head state machine.
///
/// These are reported to the client and logged but never crash the node,
/// and the state is left untouched.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum LogicError<L: Ledger> {
    /// Occurs when an event is not acceptable in the current head state.
    #[error("Event {event:?} is not valid in the current head state.")]
    InvalidEvent {
        /// The offending event.
        event: Box<Event<L>>,
        /// The state it arrived in.
        state: Box<HeadState<L>>,
    },

    /// Occurs when the ledger rejects a transaction during snapshot
    /// computation.
    #[error("Ledger rejected transaction {tx_id:?}: {cause}")]
    LedgerRejection {
        /// The rejected transaction.
        tx_id: <L as Ledger>::TxId,
        /// The ledger's reason.
        cause: LedgerError,
    },

    /// Occurs when an aggregated snapshot signature fails final
    /// verification.
    #[error("Signature of party {party:?} is invalid.")]
    BadSignature {
        /// The party whose signature failed.
        party: Party,
    },

    /// Occurs when an all-acknowledged snapshot candidate does not extend
    /// the confirmed snapshot by exactly one.
    #[error("Snapshot is out of order: expected {expected}, got {got}.")]
    OutOfOrderSnapshot {
        /// The only acceptable number.
        expected: u64,
        /// The number actually seen.
        got: u64,
    },
}
