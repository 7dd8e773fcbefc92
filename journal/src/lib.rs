//! Durable append-only event log.
//!
//! Every state-changing event of the node is appended here before its
//! effects become visible, so a restarted node can replay the log and end
//! up in the exact state it crashed in.
//!
//! Each record is framed as `[version: u8][length: u32 LE][bincode body]`.
//! Two body versions are accepted on read: the legacy form (bare payload,
//! record id implied by position) and the current form (`{ id, payload }`).
//! Only the current form is written. A torn trailing record, e.g. from a
//! crash mid-append, is detected and truncated away on open.

mod errors;


pub use self::errors::JournalError;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};
use tracing::warn;

use bincode::Options;

/// Monotonically increasing, dense record identifier.
pub type EventId = u64;

/// A journalled event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Record<E> {
    /// Position of the record in the journal, starting at 0.
    pub id: EventId,
    /// The event itself.
    pub payload: E,
}

const VERSION_LEGACY: u8 = 0;
const VERSION_CURRENT: u8 = 1;
const HEADER_LEN: usize = 5;

/// Append-only journal of events of type `E`.
///
/// A journal file has exactly one writer at a time: opening a path that is
/// already held by another live journal fails with
/// [`JournalError::IncorrectAccess`]. This prevents a concurrent reload
/// while a node is live.
pub struct EventJournal<E> {
    file: File,
    path: PathBuf,
    next_id: EventId,
    _marker: PhantomData<E>,
}

fn open_journals() -> &'static Mutex<HashSet<PathBuf>> {
    static REGISTRY: OnceLock<Mutex<HashSet<PathBuf>>> = OnceLock::new();
    REGISTRY.get_or_init(|| Mutex::new(HashSet::new()))
}

fn codec() -> impl Options {
    bincode::options()
        .with_fixint_encoding()
        .reject_trailing_bytes()
}

impl<E: Serialize + DeserializeOwned> EventJournal<E> {
    /// Opens (or creates) the journal at `path`, recovering from a torn
    /// trailing record and claiming exclusive write ownership of the file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, JournalError> {
        let file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(path.as_ref())?;
        let canonical = path.as_ref().canonicalize()?;

        {
            let mut held = open_journals().lock().expect("journal registry poisoned");
            if !held.insert(canonical.clone()) {
                return Err(JournalError::IncorrectAccess(canonical));
            }
        }

        let mut journal = EventJournal {
            file,
            path: canonical,
            next_id: 0,
            _marker: PhantomData,
        };

        // Scan once to recover and to learn where the id sequence continues.
        let mut bytes = Vec::new();
        journal.file.read_to_end(&mut bytes)?;
        let (records, valid_len) = scan::<E>(&bytes)?;
        if (valid_len as usize) < bytes.len() {
            warn!(
                path = %journal.path.display(),
                offset = valid_len,
                "truncating torn record at the end of the journal"
            );
            journal.file.set_len(valid_len)?;
        }
        journal.next_id = records.len() as EventId;

        Ok(journal)
    }

    /// Returns every previously appended event, in append order.
    pub fn load_all(&mut self) -> Result<Vec<Record<E>>, JournalError> {
        let bytes = std::fs::read(&self.path)?;
        let (records, _) = scan::<E>(&bytes)?;
        Ok(records)
    }

    /// Durably appends one event and returns its id.
    ///
    /// The record is fully written and fsynced before this returns, so an
    /// effect of the event can never become visible without the event
    /// itself being recoverable.
    pub fn append(&mut self, payload: &E) -> Result<EventId, JournalError> {
        let id = self.next_id;
        let body = codec()
            .serialize(&RecordRef { id, payload })
            .map_err(|e| {
                JournalError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
            })?;

        let mut frame = Vec::with_capacity(HEADER_LEN + body.len());
        frame.push(VERSION_CURRENT);
        frame.extend_from_slice(&(body.len() as u32).to_le_bytes());
        frame.extend_from_slice(&body);

        self.file.write_all(&frame)?;
        self.file.sync_data()?;
        self.next_id = id + 1;
        Ok(id)
    }

    /// Flushes outstanding writes to disk.
    pub fn sync(&mut self) -> Result<(), JournalError> {
        self.file.sync_data()?;
        Ok(())
    }

    /// Id the next appended event will receive.
    pub fn next_id(&self) -> EventId {
        self.next_id
    }
}

impl<E> Drop for EventJournal<E> {
    fn drop(&mut self) {
        if let Ok(mut held) = open_journals().lock() {
            held.remove(&self.path);
        }
    }
}

// Borrowing flavour of `Record`, so append does not clone the payload.
#[derive(Serialize)]
struct RecordRef<'a, E> {
    id: EventId,
    payload: &'a E,
}

/// Walks the raw journal bytes. Returns the decoded records plus the byte
/// length of the valid prefix; anything beyond it is a torn tail.
fn scan<E: DeserializeOwned>(bytes: &[u8]) -> Result<(Vec<Record<E>>, u64), JournalError> {
    let mut records = Vec::new();
    let mut offset = 0usize;

    while offset < bytes.len() {
        if offset + HEADER_LEN > bytes.len() {
            break; // torn header
        }
        let version = bytes[offset];
        let mut len_bytes = [0u8; 4];
        len_bytes.copy_from_slice(&bytes[offset + 1..offset + HEADER_LEN]);
        let len = u32::from_le_bytes(len_bytes) as usize;

        if offset + HEADER_LEN + len > bytes.len() {
            break; // torn body
        }
        let body = &bytes[offset + HEADER_LEN..offset + HEADER_LEN + len];
        let expected = records.len() as EventId;

        match version {
            VERSION_LEGACY => {
                // Legacy records carry the bare payload; the id is positional.
                let payload: E = codec()
                    .deserialize(body)
                    .map_err(|_| JournalError::CorruptRecord(offset as u64))?;
                records.push(Record {
                    id: expected,
                    payload,
                });
            }
            VERSION_CURRENT => {
                let record: Record<E> = codec()
                    .deserialize(body)
                    .map_err(|_| JournalError::CorruptRecord(offset as u64))?;
                if record.id != expected {
                    return Err(JournalError::CorruptRecord(offset as u64));
                }
                records.push(record);
            }
            _ => return Err(JournalError::CorruptRecord(offset as u64)),
        }

        offset += HEADER_LEN + len;
    }

    Ok((records, offset as u64))
}
