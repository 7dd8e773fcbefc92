use serde::{Deserialize, Serialize};

use chain::ChainEvent;
use ledger::Ledger;

use crate::client::ClientCommand;
use crate::message::Message;

/// Input to the head state machine.
///
/// Client requests, peer messages and chain events all funnel into one
/// queue and are applied strictly in arrival order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub enum Event<L: Ledger> {
    /// A command submitted by the client.
    Client(ClientCommand<L>),
    /// A message received from a head member (possibly ourselves).
    Network(Message<L>),
    /// An observation, tick or rollback from the chain follower.
    Chain(ChainEvent<L>),
}
