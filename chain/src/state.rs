//! Off-chain mirror of the on-chain head lifecycle.
//!
//! Observers are the sole authority advancing the [`ChainState`]:
//! `Idle → Initial → Open → Closed → Final`. Each observer matches one
//! lifecycle transaction against the current state and returns the
//! resulting transition event plus the successor state, or `None` when the
//! transaction is unrelated (including any transaction for another head).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use ledger::{Ledger, UtxoSet};
use multisig::{hash_utxo, Hash32, Party};

use crate::tx::{ChainTx, ChainTxBody};
use crate::types::{ContestationPeriod, HeadId, HeadParameters, UnixTime};

/// Lifecycle state of the head as anchored on the base chain.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub enum ChainState<L: Ledger> {
    /// No head is known.
    Idle,
    /// A head was announced and is collecting commits.
    Initial(InitialState<L>),
    /// The head is open.
    Open(OpenState<L>),
    /// The head was closed and can be contested until the deadline.
    Closed(ClosedState),
    /// The head's final UTxO has been fanned out; nothing more can happen.
    Final(FinalState<L>),
}

/// Chain state while commits are being collected.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct InitialState<L: Ledger> {
    /// The announced head.
    pub head_id: HeadId,
    /// Frozen head parameters.
    pub parameters: HeadParameters,
    /// Commits observed so far, keyed by party index.
    pub committed: BTreeMap<u32, L::Utxo>,
    /// Parties whose commit is still outstanding.
    pub pending: Vec<Party>,
}

/// Chain state of an open head.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct OpenState<L: Ledger> {
    /// The open head.
    pub head_id: HeadId,
    /// Frozen head parameters.
    pub parameters: HeadParameters,
    /// UTxO set collected at open.
    pub utxo: L::Utxo,
}

/// Chain state of a closed head awaiting fanout.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClosedState {
    /// The closed head.
    pub head_id: HeadId,
    /// Frozen head parameters.
    pub parameters: HeadParameters,
    /// Number of the currently winning snapshot.
    pub snapshot_number: u64,
    /// UTxO hash of the currently winning snapshot.
    pub utxo_hash: Hash32,
    /// Instant after which the head can be fanned out.
    pub contestation_deadline: UnixTime,
    /// Parties that have contested so far.
    pub contesters: Vec<Party>,
}

/// Terminal chain state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct FinalState<L: Ledger> {
    /// UTxO set materialised back on the base chain.
    pub utxo: L::Utxo,
}

/// A head lifecycle transition observed on the base chain.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub enum OnChainTx<L: Ledger> {
    /// A head was announced.
    Init {
        /// The announced head.
        head_id: HeadId,
        /// Its frozen party list.
        parties: Vec<Party>,
        /// Its frozen contestation period.
        contestation_period: ContestationPeriod,
    },
    /// A party deposited outputs into the head.
    Commit {
        /// The committing party.
        party: Party,
        /// The deposited outputs.
        committed: L::Utxo,
    },
    /// All commits were collected; the head is open.
    Collect {
        /// The initial UTxO set of the head.
        utxo: L::Utxo,
    },
    /// The head was aborted; commits are reimbursed.
    Abort {
        /// The reimbursed outputs.
        utxo: L::Utxo,
    },
    /// The head was closed.
    Close {
        /// Number of the closing snapshot.
        snapshot_number: u64,
        /// Deadline until which contests are accepted.
        contestation_deadline: UnixTime,
    },
    /// The close was contested with a newer snapshot.
    Contest {
        /// Number of the contesting snapshot.
        snapshot_number: u64,
        /// All parties that have contested so far.
        contesters: Vec<Party>,
    },
    /// The final UTxO was fanned out.
    Fanout {
        /// The distributed UTxO set.
        utxo: L::Utxo,
    },
}

impl<L: Ledger> ChainState<L> {
    /// Matches any lifecycle transaction against the current state.
    ///
    /// `own_party` scopes init observations: announcements of heads we are
    /// not a member of are ignored.
    pub fn observe(
        &self,
        own_party: &Party,
        tx: &ChainTx<L>,
    ) -> Option<(OnChainTx<L>, ChainState<L>)> {
        match self {
            ChainState::Idle => self.observe_init(own_party, tx),
            ChainState::Initial(st) => st
                .observe_commit(tx)
                .or_else(|| st.observe_collect(tx))
                .or_else(|| st.observe_abort(tx)),
            ChainState::Open(st) => st.observe_close(tx),
            ChainState::Closed(st) => st
                .observe_contest(tx)
                .or_else(|| st.observe_fanout(tx)),
            ChainState::Final(_) => None,
        }
    }

    /// Observes a head announcement. Only possible while idle.
    pub fn observe_init(
        &self,
        own_party: &Party,
        tx: &ChainTx<L>,
    ) -> Option<(OnChainTx<L>, ChainState<L>)> {
        if !matches!(self, ChainState::Idle) {
            return None;
        }
        match &tx.body {
            ChainTxBody::Init {
                head_id,
                parties,
                contestation_period,
                ..
            } if parties.contains(own_party) => {
                let parameters = HeadParameters {
                    contestation_period: *contestation_period,
                    parties: parties.clone(),
                };
                let event = OnChainTx::Init {
                    head_id: *head_id,
                    parties: parties.clone(),
                    contestation_period: *contestation_period,
                };
                let state = ChainState::Initial(InitialState {
                    head_id: *head_id,
                    parameters,
                    committed: BTreeMap::new(),
                    pending: parties.clone(),
                });
                Some((event, state))
            }
            _ => None,
        }
    }
}

impl<L: Ledger> InitialState<L> {
    /// Observes a commit by a party that has not committed yet.
    pub fn observe_commit(&self, tx: &ChainTx<L>) -> Option<(OnChainTx<L>, ChainState<L>)> {
        match &tx.body {
            ChainTxBody::Commit {
                head_id,
                party,
                committed,
            } if *head_id == self.head_id && self.pending.contains(party) => {
                let mut next = self.clone();
                next.pending.retain(|p| p != party);
                next.committed.insert(party.index, committed.clone());
                let event = OnChainTx::Commit {
                    party: *party,
                    committed: committed.clone(),
                };
                Some((event, ChainState::Initial(next)))
            }
            _ => None,
        }
    }

    /// Observes the collect-com opening the head. Requires every commit.
    pub fn observe_collect(&self, tx: &ChainTx<L>) -> Option<(OnChainTx<L>, ChainState<L>)> {
        match &tx.body {
            ChainTxBody::Collect { head_id }
                if *head_id == self.head_id && self.pending.is_empty() =>
            {
                let utxo = self.collected_utxo();
                let event = OnChainTx::Collect { utxo: utxo.clone() };
                let state = ChainState::Open(OpenState {
                    head_id: self.head_id,
                    parameters: self.parameters.clone(),
                    utxo,
                });
                Some((event, state))
            }
            _ => None,
        }
    }

    /// Observes an abort, reimbursing all commits made so far.
    pub fn observe_abort(&self, tx: &ChainTx<L>) -> Option<(OnChainTx<L>, ChainState<L>)> {
        match &tx.body {
            ChainTxBody::Abort { head_id } if *head_id == self.head_id => {
                let utxo = self.collected_utxo();
                let event = OnChainTx::Abort { utxo: utxo.clone() };
                Some((event, ChainState::Final(FinalState { utxo })))
            }
            _ => None,
        }
    }

    /// Union of all observed commits, in party order.
    pub fn collected_utxo(&self) -> L::Utxo {
        self.committed
            .values()
            .fold(L::Utxo::default(), |acc, u| acc.union(u))
    }
}

impl<L: Ledger> OpenState<L> {
    /// Observes a close transaction.
    pub fn observe_close(&self, tx: &ChainTx<L>) -> Option<(OnChainTx<L>, ChainState<L>)> {
        match &tx.body {
            ChainTxBody::Close {
                head_id,
                closer,
                snapshot_number,
                utxo_hash,
                signatures,
                upper_time,
                ..
            } if *head_id == self.head_id && self.parameters.includes(closer) => {
                // Snapshot 0 is implicitly agreed; anything later needs the
                // full aggregate.
                let properly_signed = match signatures {
                    None => *snapshot_number == 0,
                    Some(sigs) => {
                        *snapshot_number > 0 && sigs.len() == self.parameters.parties.len()
                    }
                };
                if !properly_signed {
                    return None;
                }
                let contestation_deadline =
                    upper_time.plus_millis(self.parameters.contestation_period.as_millis());
                let event = OnChainTx::Close {
                    snapshot_number: *snapshot_number,
                    contestation_deadline,
                };
                let state = ChainState::Closed(ClosedState {
                    head_id: self.head_id,
                    parameters: self.parameters.clone(),
                    snapshot_number: *snapshot_number,
                    utxo_hash: *utxo_hash,
                    contestation_deadline,
                    contesters: Vec::new(),
                });
                Some((event, state))
            }
            _ => None,
        }
    }
}

impl ClosedState {
    /// Observes a contest carrying a newer snapshot.
    pub fn observe_contest<L: Ledger>(
        &self,
        tx: &ChainTx<L>,
    ) -> Option<(OnChainTx<L>, ChainState<L>)> {
        match &tx.body {
            ChainTxBody::Contest {
                head_id,
                contester,
                snapshot_number,
                utxo_hash,
                signatures,
            } if *head_id == self.head_id
                && *snapshot_number > self.snapshot_number
                && self.parameters.includes(contester)
                && !self.contesters.contains(contester)
                && signatures.len() == self.parameters.parties.len() =>
            {
                let mut next = self.clone();
                next.snapshot_number = *snapshot_number;
                next.utxo_hash = *utxo_hash;
                next.contesters.push(*contester);
                let event = OnChainTx::Contest {
                    snapshot_number: *snapshot_number,
                    contesters: next.contesters.clone(),
                };
                Some((event, ChainState::Closed(next)))
            }
            _ => None,
        }
    }

    /// Observes the fanout distributing the final UTxO.
    pub fn observe_fanout<L: Ledger>(
        &self,
        tx: &ChainTx<L>,
    ) -> Option<(OnChainTx<L>, ChainState<L>)> {
        match &tx.body {
            ChainTxBody::Fanout { head_id, utxo }
                if *head_id == self.head_id && hash_utxo(utxo) == self.utxo_hash =>
            {
                let event = OnChainTx::Fanout { utxo: utxo.clone() };
                Some((event, ChainState::Final(FinalState { utxo: utxo.clone() })))
            }
            _ => None,
        }
    }
}
