use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use chain::{ChainNetwork, ContestationPeriod, TimeHandle, UnixTime};

use crate::errors::NodeError;

/// Configuration file for the head node.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Location of the event journal.
    #[serde(default = "Config::default_journal_path")]
    pub journal_path: PathBuf,

    /// Capacity of the event queue feeding the worker.
    #[serde(default = "Config::default_event_queue_depth")]
    pub event_queue_depth: usize,

    /// Maximum number of events parked for retry. Overflow drops the
    /// oldest waiting event.
    #[serde(default = "Config::default_wait_queue_depth")]
    pub wait_queue_depth: usize,

    /// Network the head anchors to.
    #[serde(default)]
    pub network: ChainNetwork,

    /// Contestation period frozen into initialised heads, in seconds.
    #[serde(default = "Config::default_contestation_period_secs")]
    pub contestation_period_secs: u64,

    /// Base-chain slot length in milliseconds.
    #[serde(default = "Config::default_slot_length_ms")]
    pub slot_length_ms: u64,

    /// Wall-clock time of base-chain slot 0, in milliseconds since the
    /// Unix epoch.
    #[serde(default)]
    pub system_start_ms: u64,

    /// Number of chain states retained for rollback.
    #[serde(default = "Config::default_chain_retention")]
    pub chain_retention: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            journal_path: Self::default_journal_path(),
            event_queue_depth: Self::default_event_queue_depth(),
            wait_queue_depth: Self::default_wait_queue_depth(),
            network: ChainNetwork::default(),
            contestation_period_secs: Self::default_contestation_period_secs(),
            slot_length_ms: Self::default_slot_length_ms(),
            system_start_ms: 0,
            chain_retention: Self::default_chain_retention(),
        }
    }
}

impl Config {
    fn default_journal_path() -> PathBuf {
        PathBuf::from("head.journal")
    }

    fn default_event_queue_depth() -> usize {
        256
    }

    fn default_wait_queue_depth() -> usize {
        64
    }

    fn default_contestation_period_secs() -> u64 {
        60
    }

    fn default_slot_length_ms() -> u64 {
        1_000
    }

    fn default_chain_retention() -> usize {
        chain::DEFAULT_RETENTION
    }

    /// Loads the configuration from a toml file.
    pub fn load(path: &Path) -> Result<Config, NodeError> {
        let text = fs::read_to_string(path).map_err(|cause| NodeError::ConfigRead {
            path: path.to_path_buf(),
            cause,
        })?;
        toml::from_str(&text).map_err(|cause| NodeError::ConfigParse {
            path: path.to_path_buf(),
            cause,
        })
    }

    /// The configured contestation period.
    pub fn contestation_period(&self) -> ContestationPeriod {
        ContestationPeriod::from_secs(self.contestation_period_secs)
    }

    /// Slot/wall-clock conversion for the configured chain.
    pub fn time_handle(&self) -> TimeHandle {
        TimeHandle::new(UnixTime(self.system_start_ms), self.slot_length_ms)
    }

    /// Returns a documentation for the config file.
    pub fn description() -> &'static str {
        r##"
    journal_path = "head.journal"   # event journal location
    event_queue_depth = 256         # worker event queue capacity
    wait_queue_depth = 64           # parked-event capacity before dropping
    contestation_period_secs = 60   # contestation period of new heads
    slot_length_ms = 1000           # base-chain slot length
    system_start_ms = 0             # wall-clock time of slot 0
    chain_retention = 2160          # chain states retained for rollback

    [network]                       # network the head anchors to
    Testnet = 42
"##
    }
}
