use bincode::Options;
use serde::{Deserialize, Serialize};

use ledger::Ledger;
use multisig::{Party, Signature};

/// Messages exchanged between head members.
///
/// Serialization is canonical bincode; a message with trailing bytes or an
/// unknown variant is a hard decode error. Loose decoding would let two
/// nodes disagree about the bytes a signature covers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub enum Message<L: Ledger> {
    /// Asks every member to apply and acknowledge a transaction.
    ReqTx {
        /// The transaction to confirm.
        tx: L::Tx,
    },
    /// Acknowledges that a member applied the transaction.
    AckTx {
        /// The acknowledging party.
        party: Party,
        /// The acknowledged transaction.
        tx: L::Tx,
    },
    /// The snapshot leader requests signatures for the next snapshot.
    ReqSn {
        /// The requesting party; must be the leader for `number`.
        leader: Party,
        /// The requested snapshot number.
        number: u64,
        /// Confirmed transactions to fold in, in application order.
        tx_ids: Vec<L::TxId>,
    },
    /// A member's signature over the requested snapshot.
    AckSn {
        /// The signing party.
        party: Party,
        /// The acknowledged snapshot number.
        number: u64,
        /// Signature over the locally computed snapshot body.
        signature: Signature,
    },
    /// Peer liveness announcement.
    Ping {
        /// Host the peer is reachable at.
        host: String,
    },
}

fn codec() -> impl Options {
    bincode::options()
        .with_fixint_encoding()
        .reject_trailing_bytes()
}

/// Encodes a message canonically.
pub fn encode<L: Ledger>(message: &Message<L>) -> Vec<u8> {
    codec()
        .serialize(message)
        .expect("serialization of a message in memory never fails")
}

/// Decodes a message. Unknown variants and trailing bytes are errors.
pub fn decode<L: Ledger>(bytes: &[u8]) -> Result<Message<L>, bincode::Error> {
    codec().deserialize(bytes)
}
