use merlin::Transcript;
use serde::{Deserialize, Serialize};

use super::errors::MultisigError;
use super::party::Party;
use super::signature::Signature;

/// An aggregate of one signature per party, stored in party order.
///
/// Unlike an interactive combined signature, the aggregate keeps the
/// individual shares so a verifier can attribute a failure to a party.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiSignature {
    sigs: Vec<Signature>,
}

impl MultiSignature {
    /// Aggregates per-party signatures given in party order.
    pub fn aggregate(sigs: Vec<Signature>) -> Self {
        MultiSignature { sigs }
    }

    /// Number of signature shares in the aggregate.
    pub fn len(&self) -> usize {
        self.sigs.len()
    }

    /// Whether the aggregate holds no shares.
    pub fn is_empty(&self) -> bool {
        self.sigs.is_empty()
    }

    /// Iterates over the shares in party order.
    pub fn iter(&self) -> impl Iterator<Item = &Signature> {
        self.sigs.iter()
    }

    /// Verifies that every party signed the same transcript.
    ///
    /// `parties` must be the full ordered party list of the head; the
    /// transcript must be in the state it had when the shares were produced.
    pub fn verify_all(
        &self,
        parties: &[Party],
        transcript: &Transcript,
    ) -> Result<(), MultisigError> {
        if self.sigs.len() != parties.len() {
            return Err(MultisigError::BadArguments);
        }
        for (party, sig) in parties.iter().zip(self.sigs.iter()) {
            sig.verify(&mut transcript.clone(), party.key)
                .map_err(|_| MultisigError::ShareError { index: party.index })?;
        }
        Ok(())
    }
}
