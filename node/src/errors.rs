use std::path::PathBuf;
use thiserror::Error;

use chain::{ChainError, TimeConversionError};
use journal::JournalError;

use crate::chain_client::ChainClientError;

/// System errors of the node. All of these are fatal; recovery is restart
/// plus journal replay.
#[derive(Debug, Error)]
pub enum NodeError {
    /// The journal failed.
    #[error("Journal failure: {0}")]
    Journal(#[from] JournalError),

    /// The chain follower failed.
    #[error("Chain follower failure: {0}")]
    Chain(#[from] ChainError),

    /// A lifecycle transaction could not be handed to the submitter.
    #[error("Chain submission failed: {0}")]
    ChainSubmission(#[from] ChainClientError),

    /// Slot/wall-clock conversion failed.
    #[error("Time conversion failed: {0}")]
    Time(#[from] TimeConversionError),

    /// A journalled event did not re-apply during replay. The journal and
    /// the code that wrote it disagree; refusing to run on a guessed state.
    #[error("Replay of journal record {id} diverged from the recorded run.")]
    ReplayDiverged {
        /// Id of the record that failed to re-apply.
        id: u64,
    },

    /// The configuration file could not be read.
    #[error("Cannot read configuration {path}: {cause}")]
    ConfigRead {
        /// Path of the configuration file.
        path: PathBuf,
        /// The underlying I/O error.
        cause: std::io::Error,
    },

    /// The configuration file could not be parsed.
    #[error("Cannot parse configuration {path}: {cause}")]
    ConfigParse {
        /// Path of the configuration file.
        path: PathBuf,
        /// The underlying parse error.
        cause: toml::de::Error,
    },

    /// The node's event channel is closed; the worker is gone.
    #[error("The node's event channel is closed.")]
    ChannelClosed,
}
