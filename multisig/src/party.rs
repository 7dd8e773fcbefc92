use core::cmp::Ordering;
use core::hash::{Hash, Hasher};
use serde::{Deserialize, Serialize};

use super::key::{SigningKey, VerificationKey};

/// A participant identity: a verification key plus its index in the ordered
/// party list. The party set is frozen when a head is initialised.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Party {
    /// Position in the ordered party list.
    pub index: u32,
    /// Key the party signs snapshots with.
    pub key: VerificationKey,
}

impl Party {
    /// Creates a party identity.
    pub fn new(index: u32, key: VerificationKey) -> Self {
        Party { index, key }
    }

    /// Creates a party identity from a private key.
    pub fn from_secret(index: u32, privkey: &SigningKey) -> Self {
        Party {
            index,
            key: VerificationKey::from_secret(privkey),
        }
    }
}

impl Ord for Party {
    fn cmp(&self, other: &Self) -> Ordering {
        self.index
            .cmp(&other.index)
            .then_with(|| self.key.as_bytes().cmp(other.key.as_bytes()))
    }
}

impl PartialOrd for Party {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Hash for Party {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
        self.key.as_bytes().hash(state);
    }
}
