use std::path::PathBuf;
use thiserror::Error;

/// Journal failure conditions. All of these are fatal to the node;
/// recovery is restart plus replay.
#[derive(Debug, Error)]
pub enum JournalError {
    /// Occurs when a complete record cannot be decoded.
    #[error("Corrupt journal record at byte offset {0}.")]
    CorruptRecord(u64),

    /// Occurs when the journal file is already held by a live writer.
    #[error("Journal {0} is already opened by another writer.")]
    IncorrectAccess(PathBuf),

    /// Underlying I/O failure.
    #[error("Journal I/O failed: {0}")]
    Io(#[from] std::io::Error),
}
