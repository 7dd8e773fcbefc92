use thiserror::Error;

/// Represents an error in signing, verification or aggregation.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum MultisigError {
    /// Occurs when a point is not a valid compressed Ristretto point.
    #[error("Point decoding failed.")]
    InvalidPoint,

    /// Occurs when a signature fails to verify.
    #[error("Signature is invalid.")]
    InvalidSignature,

    /// Occurs when a signature share in an aggregate fails to verify.
    #[error("Signature share of party #{index} failed to verify.")]
    ShareError {
        /// Index of the party whose share failed.
        index: u32,
    },

    /// Occurs when a function is called with inconsistent arguments.
    #[error("Bad arguments.")]
    BadArguments,
}
