use serde::{Deserialize, Serialize};

use crate::errors::TimeConversionError;
use crate::types::{ChainSlot, UnixTime};

/// Converts between base-chain slots and wall-clock time.
///
/// The base chain is assumed to have a fixed slot length from a known
/// system start, which holds for the eras a head can be anchored in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeHandle {
    /// Wall-clock time of slot 0.
    pub system_start: UnixTime,
    /// Length of a slot in milliseconds. Must be positive.
    pub slot_length_ms: u64,
}

impl TimeHandle {
    /// Creates a handle for a chain starting at `system_start` with
    /// `slot_length_ms` long slots.
    pub fn new(system_start: UnixTime, slot_length_ms: u64) -> Self {
        TimeHandle {
            system_start,
            slot_length_ms,
        }
    }

    /// Wall-clock time at the start of `slot`.
    pub fn slot_to_time(&self, slot: ChainSlot) -> Result<UnixTime, TimeConversionError> {
        if self.slot_length_ms == 0 {
            return Err(TimeConversionError::InvalidSlotLength);
        }
        slot.0
            .checked_mul(self.slot_length_ms)
            .and_then(|offset| self.system_start.0.checked_add(offset))
            .map(UnixTime)
            .ok_or(TimeConversionError::SlotOutOfRange(slot))
    }

    /// Slot containing the wall-clock instant `time`.
    pub fn time_to_slot(&self, time: UnixTime) -> Result<ChainSlot, TimeConversionError> {
        if self.slot_length_ms == 0 {
            return Err(TimeConversionError::InvalidSlotLength);
        }
        if time < self.system_start {
            return Err(TimeConversionError::BeforeSystemStart(time));
        }
        Ok(ChainSlot((time.0 - self.system_start.0) / self.slot_length_ms))
    }
}
