//! Discogs HTTP client.
//!
//! Thin request/response mapping over the Discogs collection API. No
//! retries: a failed call surfaces immediately and re-attempting is the
//! caller's decision.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use super::{CollectionPage, CollectionService, Folder, ReleaseInstance};
use crate::error::{Result, ScanError};
use crate::identity::Credential;

/// Default Discogs API endpoint.
const DEFAULT_API_URL: &str = "https://api.discogs.com";

/// Default timeout for API requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Discogs requires an identifying User-Agent on every request.
const DEFAULT_USER_AGENT: &str = concat!("cratescan/", env!("CARGO_PKG_VERSION"));

/// Page size used by the paginated collection listing.
const EXPORT_PAGE_SIZE: u32 = 100;

/// Configuration for the Discogs client.
#[derive(Debug, Clone)]
pub struct DiscogsConfig {
    /// API base URL, without a trailing slash.
    pub api_url: String,
    /// Request timeout.
    pub timeout: Duration,
    /// User-Agent header value.
    pub user_agent: String,
}

impl Default for DiscogsConfig {
    fn default() -> Self {
        Self {
            api_url: std::env::var("DISCOGS_API_URL")
                .unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// HTTP client for the Discogs collection API.
pub struct DiscogsClient {
    client: Client,
    config: DiscogsConfig,
}

impl DiscogsClient {
    /// Create a client with default settings.
    pub fn new() -> Result<Self> {
        Self::with_config(DiscogsConfig::default())
    }

    /// Create a client with custom configuration.
    #[instrument(level = "debug", skip_all, fields(
        api_url = %config.api_url,
        timeout_ms = config.timeout.as_millis() as u64
    ))]
    pub fn with_config(config: DiscogsConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| ScanError::Transport(format!("failed to create HTTP client: {e}")))?;

        debug!("Discogs client created");
        Ok(Self { client, config })
    }

    fn auth_header(token: &str) -> String {
        format!("Discogs token={token}")
    }

    /// GET a JSON resource. `Ok(None)` means the resource does not exist
    /// (HTTP 404), which for collection lookups is a miss, not a failure.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        token: &str,
    ) -> Result<Option<T>> {
        let url = format!("{}{path}", self.config.api_url);

        let response = self
            .client
            .get(&url)
            .query(query)
            .header(reqwest::header::AUTHORIZATION, Self::auth_header(token))
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, path, "request failed");
                ScanError::Transport(format!("GET {path} failed: {e}"))
            })?;

        let status = response.status();
        debug!(status = %status, path, "received response");

        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        classify_status(status, path)?;

        let parsed = response.json::<T>().await.map_err(|e| {
            warn!(error = %e, path, "failed to parse response body");
            ScanError::Transport(format!("malformed response from {path}: {e}"))
        })?;
        Ok(Some(parsed))
    }
}

/// Map a non-2xx status to the error taxonomy: credential rejection is
/// distinguished from generic transport failure.
fn classify_status(status: StatusCode, path: &str) -> Result<()> {
    if status.is_success() {
        return Ok(());
    }
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        warn!(status = %status, path, "credential rejected");
        return Err(ScanError::InvalidCredential);
    }
    warn!(status = %status, path, "unexpected status");
    Err(ScanError::Transport(format!(
        "{path} returned status {status}"
    )))
}

#[async_trait]
impl CollectionService for DiscogsClient {
    #[instrument(level = "debug", skip(self, credential), fields(account = %credential.account_id))]
    async fn fetch_collection_entry(
        &self,
        credential: &Credential,
        release_id: &str,
    ) -> Result<Vec<ReleaseInstance>> {
        let path = format!(
            "/users/{}/collection/releases/{release_id}",
            credential.account_id
        );

        // 404 here means the account does not own the release at all:
        // an empty entry list, resolved by the session as a miss.
        let body: Option<CollectionReleasesResponse> =
            self.get_json(&path, &[], &credential.token).await?;

        Ok(body
            .map(|b| b.releases.into_iter().map(ReleaseInstance::from).collect())
            .unwrap_or_default())
    }

    #[instrument(level = "debug", skip(self, credential), fields(account = %credential.account_id))]
    async fn fetch_folders(&self, credential: &Credential) -> Result<Vec<Folder>> {
        let path = format!("/users/{}/collection/folders", credential.account_id);

        let body: FoldersResponse = self
            .get_json(&path, &[], &credential.token)
            .await?
            .ok_or_else(|| ScanError::Transport(format!("{path} returned status 404")))?;

        Ok(body
            .folders
            .into_iter()
            .map(|f| Folder {
                id: f.id,
                name: f.name,
            })
            .collect())
    }

    #[instrument(
        level = "debug",
        skip(self, credential),
        fields(account = %credential.account_id, source_folder_id, target_folder_id)
    )]
    async fn move_instance(
        &self,
        credential: &Credential,
        source_folder_id: i64,
        release_id: &str,
        instance_id: &str,
        target_folder_id: i64,
    ) -> Result<()> {
        let path = format!(
            "/users/{}/collection/folders/{source_folder_id}/releases/{release_id}/instances/{instance_id}",
            credential.account_id
        );
        let url = format!("{}{path}", self.config.api_url);

        let response = self
            .client
            .post(&url)
            .header(
                reqwest::header::AUTHORIZATION,
                Self::auth_header(&credential.token),
            )
            .json(&MoveRequest {
                folder_id: target_folder_id,
            })
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, path, "move request failed");
                ScanError::Transport(format!("POST {path} failed: {e}"))
            })?;

        classify_status(response.status(), &path)
    }

    #[instrument(level = "debug", skip_all)]
    async fn fetch_identity(&self, token: &str) -> Result<String> {
        let path = "/oauth/identity";

        let body: IdentityResponse = self
            .get_json(path, &[], token)
            .await?
            .ok_or_else(|| ScanError::Transport(format!("{path} returned status 404")))?;

        debug!(account = %body.username, "identity resolved");
        Ok(body.username)
    }

    #[instrument(level = "debug", skip(self, credential), fields(account = %credential.account_id, page))]
    async fn fetch_collection_page(
        &self,
        credential: &Credential,
        page: u32,
    ) -> Result<CollectionPage> {
        let path = format!(
            "/users/{}/collection/folders/0/releases",
            credential.account_id
        );
        let query = [
            ("per_page", EXPORT_PAGE_SIZE.to_string()),
            ("page", page.to_string()),
            ("sort", "added".to_string()),
        ];

        let body: PaginatedReleasesResponse = self
            .get_json(&path, &query, &credential.token)
            .await?
            .ok_or_else(|| ScanError::Transport(format!("{path} returned status 404")))?;

        Ok(CollectionPage {
            page: body.pagination.page,
            pages: body.pagination.pages,
            releases: body.releases.into_iter().map(ReleaseInstance::from).collect(),
        })
    }
}

// =============================================================================
// Wire DTOs
// =============================================================================

#[derive(Debug, Deserialize)]
struct CollectionReleasesResponse {
    #[serde(default)]
    releases: Vec<RawEntry>,
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    basic_information: RawBasicInformation,
    instance_id: i64,
    folder_id: i64,
}

#[derive(Debug, Deserialize)]
struct RawBasicInformation {
    id: i64,
    title: String,
    #[serde(default)]
    artists: Vec<RawArtist>,
    #[serde(default)]
    labels: Vec<RawLabel>,
    #[serde(default)]
    thumb: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawArtist {
    name: String,
}

#[derive(Debug, Deserialize)]
struct RawLabel {
    name: String,
    #[serde(default)]
    catno: String,
}

#[derive(Debug, Deserialize)]
struct FoldersResponse {
    folders: Vec<RawFolder>,
}

#[derive(Debug, Deserialize)]
struct RawFolder {
    id: i64,
    name: String,
}

#[derive(Debug, Deserialize)]
struct IdentityResponse {
    username: String,
}

#[derive(Debug, Deserialize)]
struct PaginatedReleasesResponse {
    pagination: RawPagination,
    #[serde(default)]
    releases: Vec<RawEntry>,
}

#[derive(Debug, Deserialize)]
struct RawPagination {
    page: u32,
    pages: u32,
}

#[derive(Debug, Serialize)]
struct MoveRequest {
    folder_id: i64,
}

impl From<RawEntry> for ReleaseInstance {
    fn from(entry: RawEntry) -> Self {
        let info = entry.basic_information;
        ReleaseInstance {
            release_id: info.id.to_string(),
            instance_id: entry.instance_id.to_string(),
            title: info.title,
            artists: info.artists.into_iter().map(|a| a.name).collect(),
            labels: info.labels.iter().map(|l| l.name.clone()).collect(),
            catalog_numbers: info.labels.into_iter().map(|l| l.catno).collect(),
            // The service sends "" when no thumbnail exists.
            thumbnail_url: info.thumb.filter(|t| !t.is_empty()),
            folder_id: entry.folder_id,
        }
    }
}
