use serde::{Deserialize, Serialize};

use multisig::{hash_value, Hash32, Party};

/// Slot number on the base chain.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct ChainSlot(pub u64);

/// Wall-clock instant in milliseconds since the Unix epoch.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct UnixTime(pub u64);

impl UnixTime {
    /// Instant `millis` later than this one.
    pub fn plus_millis(self, millis: u64) -> UnixTime {
        UnixTime(self.0.saturating_add(millis))
    }

    /// Milliseconds elapsed since `earlier`, or 0 if `earlier` is later.
    pub fn saturating_millis_since(self, earlier: UnixTime) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

/// On-chain delay after a close during which a better snapshot can still
/// overrule the closing one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContestationPeriod {
    millis: u64,
}

impl ContestationPeriod {
    /// Period of the given number of seconds.
    pub fn from_secs(secs: u64) -> Self {
        ContestationPeriod {
            millis: secs.saturating_mul(1000),
        }
    }

    /// Period of the given number of milliseconds.
    pub fn from_millis(millis: u64) -> Self {
        ContestationPeriod { millis }
    }

    /// Length of the period in milliseconds.
    pub fn as_millis(&self) -> u64 {
        self.millis
    }
}

/// Point on the base chain: a slot plus the hash of the block at it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChainPoint {
    /// Slot of the block.
    pub slot: ChainSlot,
    /// Hash of the block.
    pub block: Hash32,
}

impl ChainPoint {
    /// The very beginning of the chain.
    pub fn origin() -> Self {
        ChainPoint {
            slot: ChainSlot(0),
            block: Hash32::default(),
        }
    }
}

/// Reference to an output on the base chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutputRef {
    /// Transaction that produced the output.
    pub tx: Hash32,
    /// Position of the output within that transaction.
    pub index: u32,
}

/// Unique identifier of a head instance, derived from the seed output spent
/// by the init transaction. Seeds are spendable only once, so head ids never
/// repeat.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HeadId(pub Hash32);

impl HeadId {
    /// Derives the head id from the seed output.
    pub fn from_seed(seed: &OutputRef) -> HeadId {
        HeadId(hash_value(b"head-id", seed))
    }
}

/// Network a head is anchored to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChainNetwork {
    /// The production network, subject to the commit value ceiling.
    Mainnet,
    /// A test network identified by its magic number.
    Testnet(u32),
}

impl Default for ChainNetwork {
    fn default() -> Self {
        ChainNetwork::Testnet(42)
    }
}

/// Parameters fixed when a head is initialised, immutable for its lifetime.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HeadParameters {
    /// Contestation period of the head.
    pub contestation_period: ContestationPeriod,
    /// The full ordered party list.
    pub parties: Vec<Party>,
}

impl HeadParameters {
    /// Whether the given party is a member of the head.
    pub fn includes(&self, party: &Party) -> bool {
        self.parties.contains(party)
    }
}
