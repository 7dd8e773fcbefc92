use tokio::sync::broadcast;
use tokio::sync::mpsc;

use head::{ClientNotification, Event};
use ledger::Ledger;

/// Sender half of a node's event queue.
pub type EventSender<L> = mpsc::Sender<Event<L>>;

/// Receiver half of a node's event queue.
pub type EventReceiver<L> = mpsc::Receiver<Event<L>>;

/// Creates the event queue feeding a node's worker: network messages,
/// client commands and chain events all go through here.
pub fn event_channel<L: Ledger>(capacity: usize) -> (EventSender<L>, EventReceiver<L>) {
    mpsc::channel(capacity)
}

/// Sender of client notifications.
pub type NotificationSender<L> = broadcast::Sender<ClientNotification<L>>;

/// Receiver of client notifications.
pub type NotificationReceiver<L> = broadcast::Receiver<ClientNotification<L>>;

/// Creates the broadcast channel carrying notifications to clients.
pub fn notification_channel<L: Ledger>(
    capacity: usize,
) -> (NotificationSender<L>, NotificationReceiver<L>) {
    broadcast::channel(capacity)
}
