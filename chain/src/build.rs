//! Constructors for the head lifecycle transactions.
//!
//! Each constructor is pure: given the construction context and the current
//! chain state it yields a transaction (or a structured rejection) without
//! touching the chain. The dual observers live in [`crate::state`]; for
//! every constructor, observing its output from the intended state yields
//! the transition the constructor was meant to drive.

use ledger::{Ledger, UtxoSet};
use multisig::{Hash32, MultiSignature, Party};

use crate::errors::{CloseError, CommitError};
use crate::state::{ClosedState, InitialState, OpenState};
use crate::time::TimeHandle;
use crate::tx::{ChainTx, ChainTxBody};
use crate::types::{ChainNetwork, ChainSlot, HeadId, HeadParameters, OutputRef, UnixTime};

/// Hard ceiling on the value a single commit may deposit into a mainnet
/// head. Testnets are not capped.
pub const MAINNET_COMMIT_CAP: u64 = 100_000_000;

/// Static context for constructing head lifecycle transactions.
#[derive(Clone, Debug)]
pub struct ChainContext {
    /// Network the head anchors to.
    pub network: ChainNetwork,
    /// The party this node signs and commits as.
    pub party: Party,
    /// Slot/wall-clock conversion for validity windows.
    pub time: TimeHandle,
}

impl ChainContext {
    /// Builds the init transaction announcing a head. Always succeeds given
    /// a spendable seed output.
    pub fn initialize<L: Ledger>(
        &self,
        parameters: &HeadParameters,
        seed: OutputRef,
    ) -> ChainTx<L> {
        ChainTx::new(ChainTxBody::Init {
            head_id: HeadId::from_seed(&seed),
            seed,
            parties: parameters.parties.clone(),
            contestation_period: parameters.contestation_period,
        })
    }

    /// Builds the commit transaction depositing `to_commit` into the head.
    pub fn commit<L: Ledger>(
        &self,
        state: &InitialState<L>,
        spendable: &L::Utxo,
        to_commit: &L::Utxo,
    ) -> Result<ChainTx<L>, CommitError> {
        if !state.pending.contains(&self.party) {
            return Err(CommitError::CannotFindOwnInitial);
        }
        for profile in to_commit.output_profiles() {
            if profile.legacy_address {
                return Err(CommitError::UnsupportedLegacyOutput);
            }
            if profile.reference_script {
                return Err(CommitError::CannotCommitReferenceScript);
            }
        }
        let amount = to_commit.total_value();
        if self.network == ChainNetwork::Mainnet && amount > MAINNET_COMMIT_CAP {
            return Err(CommitError::CommittedTooMuchForMainnet {
                amount,
                limit: MAINNET_COMMIT_CAP,
            });
        }
        if !spendable.contains_all(to_commit) {
            return Err(CommitError::MissingSpendableOutput);
        }
        Ok(ChainTx::new(ChainTxBody::Commit {
            head_id: state.head_id,
            party: self.party,
            committed: to_commit.clone(),
        }))
    }

    /// Builds the collect transaction opening the head.
    pub fn collect<L: Ledger>(&self, state: &InitialState<L>) -> ChainTx<L> {
        ChainTx::new(ChainTxBody::Collect {
            head_id: state.head_id,
        })
    }

    /// Builds the abort transaction reimbursing all commits.
    pub fn abort<L: Ledger>(&self, state: &InitialState<L>) -> ChainTx<L> {
        ChainTx::new(ChainTxBody::Abort {
            head_id: state.head_id,
        })
    }

    /// Builds the close transaction for the given confirmed snapshot.
    ///
    /// The validity window `[lower_slot, upper_time]` must not be wider than
    /// the contestation period, or the on-chain deadline computation would
    /// let a closer stretch the contestation phase arbitrarily.
    pub fn close<L: Ledger>(
        &self,
        state: &OpenState<L>,
        snapshot_number: u64,
        utxo_hash: Hash32,
        signatures: Option<MultiSignature>,
        lower_slot: ChainSlot,
        upper_time: UnixTime,
    ) -> Result<ChainTx<L>, CloseError> {
        let lower_time = self.time.slot_to_time(lower_slot)?;
        let window_ms = upper_time.saturating_millis_since(lower_time);
        let period_ms = state.parameters.contestation_period.as_millis();
        if window_ms > period_ms {
            return Err(CloseError::ValidityWindowTooWide {
                window_ms,
                period_ms,
            });
        }
        Ok(ChainTx::new(ChainTxBody::Close {
            head_id: state.head_id,
            closer: self.party,
            snapshot_number,
            utxo_hash,
            signatures,
            lower_slot,
            upper_time,
        }))
    }

    /// Builds the contest transaction carrying a newer snapshot.
    pub fn contest<L: Ledger>(
        &self,
        state: &ClosedState,
        snapshot_number: u64,
        utxo_hash: Hash32,
        signatures: MultiSignature,
    ) -> ChainTx<L> {
        ChainTx::new(ChainTxBody::Contest {
            head_id: state.head_id,
            contester: self.party,
            snapshot_number,
            utxo_hash,
            signatures,
        })
    }

    /// Builds the fanout transaction distributing the final UTxO.
    pub fn fanout<L: Ledger>(&self, state: &ClosedState, utxo: L::Utxo) -> ChainTx<L> {
        ChainTx::new(ChainTxBody::Fanout {
            head_id: state.head_id,
            utxo,
        })
    }
}
