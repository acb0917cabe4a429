//! In-memory collection service for tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{CollectionPage, CollectionService, Folder, ReleaseInstance};
use crate::error::{Result, ScanError};
use crate::identity::Credential;

/// Failure to inject into the next calls of one operation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockFault {
    /// Every call fails as a generic transport error.
    Transport,
    /// Every call fails as a rejected credential.
    InvalidCredential,
}

#[derive(Default)]
struct MockState {
    instances: Vec<ReleaseInstance>,
    folders: Vec<Folder>,
    account_id: String,
    lookup_fault: Option<MockFault>,
    folders_fault: Option<MockFault>,
    move_fault: Option<MockFault>,
}

/// Deterministic collection service double.
///
/// Counts calls per operation so tests can assert the zero-network
/// properties (payload rejection, single-flight, same-folder no-op), and
/// applies successful moves to its own state so follow-up lookups see
/// the new folder.
#[derive(Default)]
pub struct MockCollection {
    state: Mutex<MockState>,
    lookup_calls: AtomicUsize,
    folder_calls: AtomicUsize,
    move_calls: AtomicUsize,
}

impl MockCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an owned instance to the collection.
    pub fn add_instance(&self, instance: ReleaseInstance) {
        self.lock().instances.push(instance);
    }

    /// Replace the folder list (include the synthetic id-0 folder to
    /// exercise filtering).
    pub fn set_folders(&self, folders: Vec<Folder>) {
        self.lock().folders = folders;
    }

    /// Account the mock answers identity requests with.
    pub fn set_account_id(&self, account_id: impl Into<String>) {
        self.lock().account_id = account_id.into();
    }

    pub fn fail_lookups(&self, fault: Option<MockFault>) {
        self.lock().lookup_fault = fault;
    }

    pub fn fail_folders(&self, fault: Option<MockFault>) {
        self.lock().folders_fault = fault;
    }

    pub fn fail_moves(&self, fault: Option<MockFault>) {
        self.lock().move_fault = fault;
    }

    pub fn lookup_calls(&self) -> usize {
        self.lookup_calls.load(Ordering::SeqCst)
    }

    pub fn folder_calls(&self) -> usize {
        self.folder_calls.load(Ordering::SeqCst)
    }

    pub fn move_calls(&self) -> usize {
        self.move_calls.load(Ordering::SeqCst)
    }

    /// Folder the given instance currently sits in, if owned.
    pub fn folder_of(&self, release_id: &str, instance_id: &str) -> Option<i64> {
        self.lock()
            .instances
            .iter()
            .find(|i| i.release_id == release_id && i.instance_id == instance_id)
            .map(|i| i.folder_id)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

fn fault_error(fault: MockFault) -> ScanError {
    match fault {
        MockFault::Transport => ScanError::Transport("injected transport failure".into()),
        MockFault::InvalidCredential => ScanError::InvalidCredential,
    }
}

#[async_trait]
impl CollectionService for MockCollection {
    async fn fetch_collection_entry(
        &self,
        _credential: &Credential,
        release_id: &str,
    ) -> Result<Vec<ReleaseInstance>> {
        self.lookup_calls.fetch_add(1, Ordering::SeqCst);
        let state = self.lock();
        if let Some(fault) = state.lookup_fault {
            return Err(fault_error(fault));
        }
        Ok(state
            .instances
            .iter()
            .filter(|i| i.release_id == release_id)
            .cloned()
            .collect())
    }

    async fn fetch_folders(&self, _credential: &Credential) -> Result<Vec<Folder>> {
        self.folder_calls.fetch_add(1, Ordering::SeqCst);
        let state = self.lock();
        if let Some(fault) = state.folders_fault {
            return Err(fault_error(fault));
        }
        Ok(state.folders.clone())
    }

    async fn move_instance(
        &self,
        _credential: &Credential,
        source_folder_id: i64,
        release_id: &str,
        instance_id: &str,
        target_folder_id: i64,
    ) -> Result<()> {
        self.move_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.lock();
        if let Some(fault) = state.move_fault {
            return Err(fault_error(fault));
        }
        let instance = state
            .instances
            .iter_mut()
            .find(|i| {
                i.release_id == release_id
                    && i.instance_id == instance_id
                    && i.folder_id == source_folder_id
            })
            .ok_or_else(|| {
                ScanError::Transport(format!(
                    "no instance {release_id}.{instance_id} in folder {source_folder_id}"
                ))
            })?;
        instance.folder_id = target_folder_id;
        Ok(())
    }

    async fn fetch_identity(&self, _token: &str) -> Result<String> {
        Ok(self.lock().account_id.clone())
    }

    async fn fetch_collection_page(
        &self,
        _credential: &Credential,
        page: u32,
    ) -> Result<CollectionPage> {
        // 100-per-page like the real service; tests keep collections small.
        const PER_PAGE: usize = 100;

        let state = self.lock();
        if let Some(fault) = state.lookup_fault {
            return Err(fault_error(fault));
        }
        let pages = (state.instances.len().div_ceil(PER_PAGE)).max(1) as u32;
        let start = (page.saturating_sub(1) as usize) * PER_PAGE;
        let releases = state
            .instances
            .iter()
            .skip(start)
            .take(PER_PAGE)
            .cloned()
            .collect();
        Ok(CollectionPage {
            page,
            pages,
            releases,
        })
    }
}

/// Convenience constructor for test entries.
pub fn test_instance(release_id: &str, instance_id: &str, folder_id: i64) -> ReleaseInstance {
    ReleaseInstance {
        release_id: release_id.to_string(),
        instance_id: instance_id.to_string(),
        title: format!("Test Release {release_id}"),
        artists: vec!["Test Artist".to_string()],
        labels: vec!["Test Label".to_string()],
        catalog_numbers: vec!["TL-001".to_string()],
        thumbnail_url: None,
        folder_id,
    }
}
