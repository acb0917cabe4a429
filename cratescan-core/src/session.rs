//! The scan session state machine.
//!
//! One session exists per process. It owns a single scan-to-resolution
//! cycle at a time: validate the decoded payload, look the pair up in
//! the remote collection, and land in a terminal `Matched` or `Missed`
//! state (or back in `Idle` on failure). Duplicate decode events are
//! dropped by the single-flight guard, and a cycle abandoned via
//! [`ScanSession::cancel`] can no longer mutate state even if its remote
//! call eventually answers.

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info, instrument, warn};

use crate::client::{CollectionService, Folder, ReleaseInstance, ALL_ITEMS_FOLDER_ID};
use crate::error::{Result, ScanError};
use crate::identity::{Credential, IdentityProvider};
use crate::payload::ScanPayload;

/// The resolved entry for the current cycle. Field-for-field the
/// collection service's answer; `folder_id` seeds the current-folder
/// selection and is not updated afterwards (the session tracks the
/// confirmed current folder separately).
pub type MatchRecord = ReleaseInstance;

/// Session states. `Moving` is `Matched` with a relocation in flight;
/// every other relocation request during it is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Idle,
    Scanning,
    Resolving,
    Matched,
    Missed,
    Moving,
}

/// Result of feeding one decode event to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeOutcome {
    /// Dropped with no observable effect: either no cycle was open or
    /// the single-flight guard was held by an earlier decode.
    Ignored,
    /// The scanned pair is in the collection. Terminal for the cycle.
    Matched(MatchRecord),
    /// Lookup succeeded but the pair is not in the collection. A normal
    /// outcome, not an error; terminal for the cycle.
    Missed,
}

pub(crate) struct CycleState {
    pub(crate) state: ScanState,
    /// Bumped whenever a new cycle starts or an in-flight one is
    /// cancelled. A resolution holding a stale id must not commit.
    pub(crate) cycle: u64,
    pub(crate) record: Option<MatchRecord>,
    pub(crate) folders: Vec<Folder>,
    pub(crate) current_folder: Option<i64>,
}

impl CycleState {
    fn clear_cycle_data(&mut self) {
        self.record = None;
        self.folders.clear();
        self.current_folder = None;
    }
}

/// The single-flight scan session.
pub struct ScanSession {
    pub(crate) service: Arc<dyn CollectionService>,
    pub(crate) identity: Arc<dyn IdentityProvider>,
    pub(crate) inner: Mutex<CycleState>,
}

impl ScanSession {
    pub fn new(service: Arc<dyn CollectionService>, identity: Arc<dyn IdentityProvider>) -> Self {
        Self {
            service,
            identity,
            inner: Mutex::new(CycleState {
                state: ScanState::Idle,
                cycle: 0,
                record: None,
                folders: Vec::new(),
                current_folder: None,
            }),
        }
    }

    /// Open the scanner: `Idle | Matched | Missed → Scanning`.
    ///
    /// Returns `false` (and changes nothing) when no credential is
    /// configured, or when a cycle is still in flight - starting a new
    /// cycle must never interleave with one being resolved.
    pub fn start_scan(&self) -> bool {
        if self.identity.get_credential().is_none() {
            debug!("start_scan ignored: no credential configured");
            return false;
        }

        let mut inner = self.lock();
        match inner.state {
            ScanState::Idle | ScanState::Scanning | ScanState::Matched | ScanState::Missed => {
                inner.cycle += 1;
                inner.clear_cycle_data();
                inner.state = ScanState::Scanning;
                debug!(cycle = inner.cycle, "scan cycle opened");
                true
            }
            ScanState::Resolving | ScanState::Moving => {
                debug!(state = ?inner.state, "start_scan ignored: cycle in flight");
                false
            }
        }
    }

    /// Abandon the current cycle: the scanner view was closed.
    ///
    /// Releases the guard and invalidates any in-flight resolution; a
    /// late response will observe the stale cycle id and discard itself.
    pub fn cancel(&self) {
        let mut inner = self.lock();
        match inner.state {
            ScanState::Scanning | ScanState::Resolving => {
                inner.cycle += 1;
                inner.clear_cycle_data();
                inner.state = ScanState::Idle;
                debug!(cycle = inner.cycle, "scan cycle cancelled");
            }
            _ => {}
        }
    }

    /// Feed one decode event into the session.
    ///
    /// The first event of a cycle takes the guard; anything arriving
    /// before that cycle terminates is [`DecodeOutcome::Ignored`]. A
    /// malformed payload rejects locally (`Scanning → Idle`, zero
    /// network calls); transport and credential failures return the
    /// session to `Idle` as recoverable errors.
    #[instrument(level = "debug", skip(self, raw))]
    pub async fn handle_decode(&self, raw: &str) -> Result<DecodeOutcome> {
        let (payload, cycle, credential) = {
            let mut inner = self.lock();
            if inner.state != ScanState::Scanning {
                debug!(state = ?inner.state, "decode dropped by single-flight guard");
                return Ok(DecodeOutcome::Ignored);
            }

            let payload = match ScanPayload::parse(raw) {
                Ok(payload) => payload,
                Err(err) => {
                    warn!(error = %err, "payload rejected");
                    inner.state = ScanState::Idle;
                    return Err(err);
                }
            };

            let Some(credential) = self.identity.get_credential() else {
                // Credential vanished between start_scan and decode.
                inner.state = ScanState::Idle;
                return Err(ScanError::MissingCredential);
            };

            inner.state = ScanState::Resolving;
            (payload, inner.cycle, credential)
        };

        debug!(payload = %payload, "resolving scanned pair");
        self.resolve(payload, cycle, credential).await
    }

    async fn resolve(
        &self,
        payload: ScanPayload,
        cycle: u64,
        credential: Credential,
    ) -> Result<DecodeOutcome> {
        let entries = match self
            .service
            .fetch_collection_entry(&credential, &payload.release_id)
            .await
        {
            Ok(entries) => entries,
            Err(err) => {
                self.abort_resolving(cycle);
                return Err(err);
            }
        };

        if self.lock().cycle != cycle {
            debug!(cycle, "stale lookup response discarded");
            return Ok(DecodeOutcome::Ignored);
        }

        // Exact string equality on both ids; "07" never matches "7".
        let matched = entries.into_iter().find(|entry| {
            entry.release_id == payload.release_id && entry.instance_id == payload.instance_id
        });

        let Some(record) = matched else {
            let mut inner = self.lock();
            if inner.cycle != cycle {
                return Ok(DecodeOutcome::Ignored);
            }
            inner.state = ScanState::Missed;
            info!(payload = %payload, "no matching instance in collection");
            return Ok(DecodeOutcome::Missed);
        };

        let folders = match self.service.fetch_folders(&credential).await {
            Ok(folders) => folders,
            Err(err) => {
                self.abort_resolving(cycle);
                return Err(err);
            }
        };

        let mut inner = self.lock();
        if inner.cycle != cycle {
            debug!(cycle, "stale resolution discarded");
            return Ok(DecodeOutcome::Ignored);
        }
        inner.folders = folders
            .into_iter()
            .filter(|f| f.id != ALL_ITEMS_FOLDER_ID)
            .collect();
        inner.current_folder = Some(record.folder_id);
        inner.record = Some(record.clone());
        inner.state = ScanState::Matched;
        info!(payload = %payload, folder_id = record.folder_id, "matched");
        Ok(DecodeOutcome::Matched(record))
    }

    /// `Resolving → Idle` after a failed remote call, unless the cycle
    /// was already cancelled.
    fn abort_resolving(&self, cycle: u64) {
        let mut inner = self.lock();
        if inner.cycle == cycle && inner.state == ScanState::Resolving {
            inner.state = ScanState::Idle;
        }
    }

    pub fn state(&self) -> ScanState {
        self.lock().state
    }

    /// The current cycle's match, if it reached `Matched`.
    pub fn match_record(&self) -> Option<MatchRecord> {
        self.lock().record.clone()
    }

    /// Candidate relocation targets for the current cycle. Never
    /// contains the synthetic id-0 folder.
    pub fn folders(&self) -> Vec<Folder> {
        self.lock().folders.clone()
    }

    /// Last confirmed folder of the matched instance.
    pub fn current_folder(&self) -> Option<i64> {
        self.lock().current_folder
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, CycleState> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
