//! Chain follower: turns the base-chain sync stream into head events.
//!
//! For every `RollForward` the follower matches the block's transactions
//! against the tracked [`ChainState`], records the resulting state in the
//! rewindable history and emits the observed transitions plus a `Tick`
//! carrying the block time. For every `RollBackward` it restores the
//! retained state at or before the rollback point.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use ledger::Ledger;
use multisig::Party;

use crate::errors::ChainError;
use crate::local::LocalChainState;
use crate::state::{ChainState, OnChainTx};
use crate::tx::ChainTx;
use crate::types::{ChainPoint, UnixTime};

/// Block metadata delivered by the base-chain sync client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockInfo {
    /// Point of the block on the chain.
    pub point: ChainPoint,
    /// Wall-clock time of the block's slot.
    pub timestamp: UnixTime,
}

/// Input to the follower from the base-chain sync client.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub enum ChainSyncMessage<L: Ledger> {
    /// The chain extended by one block.
    RollForward {
        /// The new block.
        block: BlockInfo,
        /// Transactions in the block.
        txs: Vec<ChainTx<L>>,
    },
    /// The chain switched to a fork; state must rewind.
    RollBackward {
        /// Point to rewind to.
        point: ChainPoint,
    },
}

/// Event emitted by the chain layer into the head state machine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub enum ChainEvent<L: Ledger> {
    /// A head lifecycle transition was observed on chain.
    Observation {
        /// The observed transition.
        tx: OnChainTx<L>,
        /// Point of the observing block.
        point: ChainPoint,
        /// Wall-clock time of the observing block.
        time: UnixTime,
    },
    /// The chain rolled back; the attached state was restored.
    Rollback {
        /// Point the retained state was recorded at.
        point: ChainPoint,
        /// The restored chain state.
        state: ChainState<L>,
    },
    /// Wall-clock advance derived from a new block.
    Tick {
        /// Time of the newest block.
        time: UnixTime,
    },
}

/// Follows the base chain on behalf of one head member.
#[derive(Clone, Debug)]
pub struct ChainFollower<L: Ledger> {
    party: Party,
    local: LocalChainState<L>,
}

impl<L: Ledger> ChainFollower<L> {
    /// Creates a follower for `party`, starting from `initial` state with
    /// the given history retention.
    pub fn new(party: Party, initial: ChainState<L>, retention: usize) -> Self {
        ChainFollower {
            party,
            local: LocalChainState::new(initial, retention),
        }
    }

    /// The currently tracked chain state.
    pub fn state(&self) -> &ChainState<L> {
        self.local.current()
    }

    /// The point the tracked state was recorded at.
    pub fn point(&self) -> &ChainPoint {
        self.local.current_point()
    }

    /// Processes one sync message, returning the head events it gives rise to.
    pub fn handle(&mut self, msg: ChainSyncMessage<L>) -> Result<Vec<ChainEvent<L>>, ChainError> {
        match msg {
            ChainSyncMessage::RollForward { block, txs } => {
                let mut events = Vec::new();
                let mut state = self.local.current().clone();
                for tx in txs.iter() {
                    if let Some((observed, next)) = state.observe(&self.party, tx) {
                        trace!(?observed, slot = block.point.slot.0, "observed head transition");
                        events.push(ChainEvent::Observation {
                            tx: observed,
                            point: block.point,
                            time: block.timestamp,
                        });
                        state = next;
                    }
                }
                self.local.record(block.point, state);
                events.push(ChainEvent::Tick {
                    time: block.timestamp,
                });
                Ok(events)
            }
            ChainSyncMessage::RollBackward { point } => {
                let (restored_at, state) = self.local.rollback(&point)?;
                debug!(
                    requested = point.slot.0,
                    restored = restored_at.slot.0,
                    "chain rolled back"
                );
                Ok(vec![ChainEvent::Rollback {
                    point: restored_at,
                    state,
                }])
            }
        }
    }
}
