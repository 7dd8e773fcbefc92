//! Implementation of the off-chain head state machine.
//!
//! The heart of this crate is [`update`]: a pure function consuming client
//! commands, peer messages and chain events against a [`HeadState`] and
//! producing a successor state plus effects. Everything stateful or
//! effectful lives in the surrounding node.

mod client;
mod effect;
mod errors;
mod event;
mod logic;
mod message;
mod snapshot;
mod state;


pub use self::client::{ClientCommand, ClientNotification};
pub use self::effect::{Effect, PostChainTx};
pub use self::errors::LogicError;
pub use self::event::Event;
pub use self::logic::{update, Environment, Outcome, WaitReason};
pub use self::message::{decode, encode, Message};
pub use self::snapshot::{ConfirmedSnapshot, Snapshot, SnapshotInProgress};
pub use self::state::{ClosedHead, FinalHead, HeadState, InitialHead, OpenHead};
