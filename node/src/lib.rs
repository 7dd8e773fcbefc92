//! Head protocol node.
//!
//! Wires the pure head state machine to the outside world: one worker task
//! owns the [`head::HeadState`] and the event journal, consumes a single
//! event queue and dispatches effects to the network, the chain submitter
//! and the client notification channel. See [`Node::spawn`].

mod chain_client;
mod comm;
mod config;
mod errors;
mod network;
mod node;

pub use self::chain_client::{post_channel, ChainClient, ChainClientError, ChannelChain};
pub use self::comm::{
    event_channel, notification_channel, EventReceiver, EventSender, NotificationReceiver,
    NotificationSender,
};
pub use self::config::Config;
pub use self::errors::NodeError;
pub use self::network::{InMemoryHub, InMemoryNetwork, Network};
pub use self::node::{spawn_follower, Node, NodeHandle};
