#![deny(missing_docs)]
#![allow(non_snake_case)]
//! Schnorr signatures over Ristretto with merlin transcripts, plus the
//! per-party signature aggregate used to certify head snapshots.

mod errors;
mod hash;
mod key;
mod multisignature;
mod party;
mod signature;
mod transcript;

#[cfg(test)]
mod tests;

pub use self::errors::MultisigError;
pub use self::hash::{hash_utxo, hash_value, Hash32};
pub use self::key::{SigningKey, VerificationKey};
pub use self::multisignature::MultiSignature;
pub use self::party::Party;
pub use self::signature::Signature;
pub use self::transcript::TranscriptProtocol;
