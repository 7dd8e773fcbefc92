use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tracing::warn;

use head::{decode, encode, Event, Message};
use ledger::Ledger;

use crate::comm::EventSender;

/// Broadcast seam to the head members.
///
/// The transport is assumed to provide ordered, authenticated delivery per
/// peer. Delivery reaches every member *including the sender*: the head
/// logic relies on seeing its own requests and acknowledgements come back
/// through the same path as everyone else's.
#[async_trait]
pub trait Network<L: Ledger>: Send + 'static {
    /// Broadcasts a message to all head members.
    async fn broadcast(&mut self, message: Message<L>);
}

/// In-memory hub connecting the nodes of one process.
///
/// Mainly used by tests and simulations; messages are delivered to every
/// registered node's event queue, in registration order. Each delivery
/// goes through the canonical wire encoding, so what a recipient sees is
/// exactly what a real transport would have handed it.
pub struct InMemoryHub<L: Ledger> {
    inboxes: Arc<Mutex<Vec<EventSender<L>>>>,
}

impl<L: Ledger> InMemoryHub<L> {
    /// Creates an empty hub.
    pub fn new() -> Self {
        InMemoryHub {
            inboxes: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Adds a node's event queue to the broadcast set.
    pub fn register(&self, events: EventSender<L>) {
        if let Ok(mut inboxes) = self.inboxes.lock() {
            inboxes.push(events);
        }
    }

    /// Returns a network endpoint for one node.
    pub fn endpoint(&self) -> InMemoryNetwork<L> {
        InMemoryNetwork {
            inboxes: Arc::clone(&self.inboxes),
        }
    }
}

impl<L: Ledger> Default for InMemoryHub<L> {
    fn default() -> Self {
        Self::new()
    }
}

/// One node's endpoint into an [`InMemoryHub`].
pub struct InMemoryNetwork<L: Ledger> {
    inboxes: Arc<Mutex<Vec<EventSender<L>>>>,
}

#[async_trait]
impl<L: Ledger> Network<L> for InMemoryNetwork<L> {
    async fn broadcast(&mut self, message: Message<L>) {
        let bytes = encode(&message);
        let message: Message<L> = match decode(&bytes) {
            Ok(message) => message,
            Err(error) => {
                warn!(%error, "dropping message that does not survive the wire codec");
                return;
            }
        };
        let inboxes: Vec<EventSender<L>> = match self.inboxes.lock() {
            Ok(inboxes) => inboxes.clone(),
            Err(_) => return,
        };
        for inbox in inboxes {
            // A dropped receiver just means that node has shut down.
            let _ = inbox.send(Event::Network(message.clone())).await;
        }
    }
}
