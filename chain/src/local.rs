use std::collections::VecDeque;

use ledger::Ledger;

use crate::errors::ChainError;
use crate::state::ChainState;
use crate::types::ChainPoint;

/// Default retention of the rewindable history, matching the security
/// parameter of the base chain.
pub const DEFAULT_RETENTION: usize = 2160;

/// Short-lived rewindable history of chain observations.
///
/// Keeps the last `retention` observed states indexed by chain point so a
/// rollback from the follower can restore the state the chain has rolled
/// back to. Rollbacks past the retained window are unrecoverable and abort
/// the node.
#[derive(Clone, Debug)]
pub struct LocalChainState<L: Ledger> {
    history: VecDeque<(ChainPoint, ChainState<L>)>,
    retention: usize,
}

impl<L: Ledger> LocalChainState<L> {
    /// Creates a history seeded with `initial` recorded at the chain origin.
    pub fn new(initial: ChainState<L>, retention: usize) -> Self {
        let mut history = VecDeque::with_capacity(retention.min(1024));
        history.push_back((ChainPoint::origin(), initial));
        LocalChainState { history, retention }
    }

    /// The most recently recorded state.
    pub fn current(&self) -> &ChainState<L> {
        &self
            .history
            .back()
            .expect("history always holds at least the seed entry")
            .1
    }

    /// The point the current state was recorded at.
    pub fn current_point(&self) -> &ChainPoint {
        &self
            .history
            .back()
            .expect("history always holds at least the seed entry")
            .0
    }

    /// Records the state observed at `point`, pruning history beyond the
    /// retention window.
    pub fn record(&mut self, point: ChainPoint, state: ChainState<L>) {
        self.history.push_back((point, state));
        while self.history.len() > self.retention {
            self.history.pop_front();
        }
    }

    /// Restores the newest retained state recorded at or before `point`.
    pub fn rollback(
        &mut self,
        point: &ChainPoint,
    ) -> Result<(ChainPoint, ChainState<L>), ChainError> {
        while let Some((recorded_at, _)) = self.history.back() {
            if recorded_at.slot <= point.slot {
                let (restored_at, state) = self
                    .history
                    .back()
                    .expect("checked non-empty above")
                    .clone();
                return Ok((restored_at, state));
            }
            self.history.pop_back();
        }
        Err(ChainError::UnrecoverableRollback(*point))
    }
}
