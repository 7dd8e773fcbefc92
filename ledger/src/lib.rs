//! UTxO ledger interface for the head protocol.
//!
//! The protocol core treats transactions and UTxO sets as opaque values
//! behind the [`Ledger`] trait; the only structure it relies on is the
//! ability to validate-and-apply a transaction and a handful of queries
//! needed when depositing outputs into a head on the base chain.

mod errors;
mod simple;


pub use self::errors::LedgerError;
pub use self::simple::{SimpleLedger, SimpleOutput, SimpleTx, SimpleUtxo};

use core::fmt::Debug;
use core::hash::Hash;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Facts about a single output, used when screening a commit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OutputProfile {
    /// Value held by the output, in the smallest currency unit.
    pub value: u64,
    /// The output is locked by a legacy address form.
    pub legacy_address: bool,
    /// The output carries a reference script.
    pub reference_script: bool,
}

/// Set of unspent transaction outputs, opaque to the protocol core.
pub trait UtxoSet:
    Clone + Debug + Default + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Union of two sets. References present in both keep the output of `other`.
    fn union(&self, other: &Self) -> Self;

    /// Whether every output of `other` is also present in `self`.
    fn contains_all(&self, other: &Self) -> bool;

    /// Total value held by the set.
    fn total_value(&self) -> u64;

    /// Per-output facts for commit screening.
    fn output_profiles(&self) -> Vec<OutputProfile>;
}

/// Validates and applies transactions against a UTxO set.
///
/// Implementations must be pure: applying the same transaction to the same
/// set always yields the same result and has no side effects.
pub trait Ledger: Clone + Debug + Send + Sync + 'static {
    /// Off-chain transaction format.
    type Tx: Clone + Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static;
    /// Stable transaction identifier.
    type TxId: Clone + Debug + Eq + Ord + Hash + Serialize + DeserializeOwned + Send + Sync + 'static;
    /// UTxO set the transactions operate on.
    type Utxo: UtxoSet;

    /// Returns the stable identifier of a transaction.
    fn tx_id(tx: &Self::Tx) -> Self::TxId;

    /// An empty UTxO set.
    fn empty_utxo(&self) -> Self::Utxo;

    /// Applies `tx` to `utxo`, returning the updated set or a rejection.
    fn apply(&self, utxo: &Self::Utxo, tx: &Self::Tx) -> Result<Self::Utxo, LedgerError>;
}
