//! On-chain head lifecycle as seen and driven from off-chain.
//!
//! Two dual families of operations live here: pure constructors building
//! the init/commit/collect/abort/close/contest/fanout transactions, and
//! observers matching those transactions against the tracked chain state.
//! A chain follower feeds observations, ticks and rollbacks into the head
//! state machine, backed by a rewindable local history.

mod build;
mod errors;
mod follower;
mod local;
mod state;
mod time;
mod tx;
mod types;

#[cfg(test)]
mod tests;

pub use self::build::{ChainContext, MAINNET_COMMIT_CAP};
pub use self::errors::{ChainError, CloseError, CommitError, TimeConversionError};
pub use self::follower::{BlockInfo, ChainEvent, ChainFollower, ChainSyncMessage};
pub use self::local::{LocalChainState, DEFAULT_RETENTION};
pub use self::state::{ChainState, ClosedState, FinalState, InitialState, OnChainTx, OpenState};
pub use self::time::TimeHandle;
pub use self::tx::{ChainTx, ChainTxBody};
pub use self::types::{
    ChainNetwork, ChainPoint, ChainSlot, ContestationPeriod, HeadId, HeadParameters, OutputRef,
    UnixTime,
};
