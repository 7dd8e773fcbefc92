use thiserror::Error;

/// Reasons the ledger rejects a transaction.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    /// Occurs when an input reference is not present in the UTxO set.
    #[error("Input {0} is not in the UTxO set.")]
    MissingInput(u64),

    /// Occurs when a created output reference already exists.
    #[error("Output {0} already exists in the UTxO set.")]
    DuplicateOutput(u64),
}
