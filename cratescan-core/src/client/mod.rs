//! Collection service abstraction.
//!
//! The scan session talks to the remote collection through the
//! [`CollectionService`] trait so the state machine can be exercised
//! against a deterministic in-memory double.
//!
//! ## Implementations
//!
//! - [`DiscogsClient`] - the real HTTP client
//! - [`MockCollection`] - in-memory double with fault injection (tests)

mod http;
mod mock;

pub use http::{DiscogsClient, DiscogsConfig};
pub use mock::{test_instance, MockCollection, MockFault};

use async_trait::async_trait;
use serde::Serialize;

use crate::error::Result;
use crate::identity::Credential;

/// The synthetic "all items" folder. It is a view, not a location, and
/// is never a relocation target.
pub const ALL_ITEMS_FOLDER_ID: i64 = 0;

/// One owned copy of a release, as reported by the collection service.
///
/// Ids are stringified exactly once, at the wire boundary; everything
/// downstream compares them as strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReleaseInstance {
    pub release_id: String,
    pub instance_id: String,
    pub title: String,
    pub artists: Vec<String>,
    pub labels: Vec<String>,
    pub catalog_numbers: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    /// Folder the instance lived in when the service answered.
    #[serde(skip_serializing)]
    pub folder_id: i64,
}

/// A user-defined storage folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Folder {
    pub id: i64,
    pub name: String,
}

/// One page of the full collection listing (export supplement).
#[derive(Debug, Clone)]
pub struct CollectionPage {
    pub page: u32,
    pub pages: u32,
    pub releases: Vec<ReleaseInstance>,
}

/// Stateless request/response operations against the remote collection.
///
/// Every call attaches the credential; none of them retain state or
/// retry. Authentication rejection is surfaced as
/// [`ScanError::InvalidCredential`](crate::ScanError::InvalidCredential)
/// so callers can prompt for re-entry instead of a generic retry.
#[async_trait]
pub trait CollectionService: Send + Sync {
    /// All owned instances of `release_id` in the account's collection.
    ///
    /// An empty list is a normal answer (the account does not own the
    /// release), not an error.
    async fn fetch_collection_entry(
        &self,
        credential: &Credential,
        release_id: &str,
    ) -> Result<Vec<ReleaseInstance>>;

    /// The account's folder list, as returned by the service. The
    /// synthetic id-0 folder is included here; callers filter it.
    async fn fetch_folders(&self, credential: &Credential) -> Result<Vec<Folder>>;

    /// Move one instance between folders. The remote API addresses the
    /// move by the instance's *current* folder.
    async fn move_instance(
        &self,
        credential: &Credential,
        source_folder_id: i64,
        release_id: &str,
        instance_id: &str,
        target_folder_id: i64,
    ) -> Result<()>;

    /// Resolve a candidate token to its account id (`/oauth/identity`).
    async fn fetch_identity(&self, token: &str) -> Result<String>;

    /// One page of the whole collection, ordered by date added.
    /// `page` is 1-based, per the remote pagination contract.
    async fn fetch_collection_page(
        &self,
        credential: &Credential,
        page: u32,
    ) -> Result<CollectionPage>;
}
