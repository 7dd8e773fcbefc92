use thiserror::Error;

use crate::types::{ChainPoint, ChainSlot, UnixTime};

/// Rejection reasons of the commit constructor.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CommitError {
    /// Occurs when a committed output uses a legacy address form.
    #[error("Committed outputs may not use a legacy address form.")]
    UnsupportedLegacyOutput,

    /// Occurs when a committed output carries a reference script.
    #[error("Committed outputs may not carry reference scripts.")]
    CannotCommitReferenceScript,

    /// Occurs when the committed value exceeds the mainnet ceiling.
    #[error("Cannot commit {amount} to a mainnet head; the limit is {limit}.")]
    CommittedTooMuchForMainnet {
        /// Total value of the attempted commit.
        amount: u64,
        /// The mainnet ceiling.
        limit: u64,
    },

    /// Occurs when the party has no initial marker left to redeem.
    #[error("Cannot find own initial output; the party has already committed or is not a member.")]
    CannotFindOwnInitial,

    /// Occurs when the committed outputs are not covered by the spendable set.
    #[error("Committed outputs are not part of the spendable UTxO set.")]
    MissingSpendableOutput,
}

/// Rejection reasons of the close constructor.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CloseError {
    /// Occurs when the transaction validity window is longer than the
    /// contestation period.
    #[error("Close validity window of {window_ms}ms exceeds the contestation period of {period_ms}ms.")]
    ValidityWindowTooWide {
        /// Width of the requested window in milliseconds.
        window_ms: u64,
        /// Contestation period in milliseconds.
        period_ms: u64,
    },

    /// Occurs when the lower validity bound cannot be converted to wall-clock time.
    #[error(transparent)]
    Time(#[from] TimeConversionError),
}

/// Slot/wall-clock conversion failures. Fatal to the node.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TimeConversionError {
    /// Occurs when an instant predates the chain's system start.
    #[error("Time {0:?} is before the system start.")]
    BeforeSystemStart(UnixTime),

    /// Occurs when a slot does not fit the wall-clock range.
    #[error("Slot {0:?} does not fit the wall-clock range.")]
    SlotOutOfRange(ChainSlot),

    /// Occurs when the configured slot length is zero.
    #[error("Slot length must be positive.")]
    InvalidSlotLength,
}

/// Chain-following failures. Fatal to the node.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ChainError {
    /// Occurs when a rollback reaches past the retained history window.
    #[error("Rollback to {0:?} is older than the retained chain history.")]
    UnrecoverableRollback(ChainPoint),
}
