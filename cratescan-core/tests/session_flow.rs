//! End-to-end session tests: full scan cycles against the in-memory
//! collection service, including the in-flight interleavings that the
//! unit tests cannot reach.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Notify;

use cratescan_core::client::test_instance;
use cratescan_core::{
    CollectionPage, CollectionService, Credential, DecodeOutcome, Folder, MemoryIdentity,
    MockCollection, MoveOutcome, ReleaseInstance, Result, ScanSession, ScanState,
};

fn shelved_mock() -> Arc<MockCollection> {
    let mock = Arc::new(MockCollection::new());
    mock.add_instance(test_instance("123", "456", 7));
    mock.set_folders(vec![
        Folder {
            id: 0,
            name: "All".into(),
        },
        Folder {
            id: 7,
            name: "Shelf A".into(),
        },
        Folder {
            id: 9,
            name: "Shelf B".into(),
        },
    ]);
    mock
}

fn session_over(service: Arc<dyn CollectionService>) -> Arc<ScanSession> {
    Arc::new(ScanSession::new(
        service,
        Arc::new(MemoryIdentity::with_credential("tok", "geoff")),
    ))
}

/// Scenario from the workflow contract: scan `123.456`, land in
/// `Matched` with folders `[7, 9]` and current folder 7, then move to 9.
#[tokio::test]
async fn scan_then_relocate_happy_path() {
    let mock = shelved_mock();
    let session = session_over(mock.clone());

    assert!(session.start_scan());
    let outcome = session.handle_decode("123.456").await.unwrap();

    let DecodeOutcome::Matched(record) = outcome else {
        panic!("expected match, got {outcome:?}");
    };
    assert_eq!(record.title, "Test Release 123");
    assert_eq!(session.state(), ScanState::Matched);
    assert_eq!(session.current_folder(), Some(7));
    assert_eq!(
        session.folders().iter().map(|f| f.id).collect::<Vec<_>>(),
        vec![7, 9]
    );

    let moved = session.move_to_folder(9).await.unwrap();
    assert_eq!(moved, MoveOutcome::Moved { from: 7, to: 9 });
    assert_eq!(session.current_folder(), Some(9));
    assert_eq!(mock.move_calls(), 1);
    assert_eq!(mock.folder_of("123", "456"), Some(9));
}

/// Scenario from the workflow contract: `abc.456` is rejected locally
/// with zero network calls and the session back in `Idle`.
#[tokio::test]
async fn malformed_payload_never_reaches_the_network() {
    let mock = shelved_mock();
    let session = session_over(mock.clone());

    session.start_scan();
    assert!(session.handle_decode("abc.456").await.is_err());
    assert_eq!(session.state(), ScanState::Idle);
    assert_eq!(mock.lookup_calls(), 0);
    assert_eq!(mock.folder_calls(), 0);
}

/// Wraps the mock and parks every lookup until released, so tests can
/// observe the session mid-`Resolving`.
struct GatedService {
    inner: Arc<MockCollection>,
    entered: Notify,
    release: Notify,
}

impl GatedService {
    fn new(inner: Arc<MockCollection>) -> Self {
        Self {
            inner,
            entered: Notify::new(),
            release: Notify::new(),
        }
    }
}

#[async_trait]
impl CollectionService for GatedService {
    async fn fetch_collection_entry(
        &self,
        credential: &Credential,
        release_id: &str,
    ) -> Result<Vec<ReleaseInstance>> {
        self.entered.notify_one();
        let result = self.inner.fetch_collection_entry(credential, release_id).await;
        self.release.notified().await;
        result
    }

    async fn fetch_folders(&self, credential: &Credential) -> Result<Vec<Folder>> {
        self.inner.fetch_folders(credential).await
    }

    async fn move_instance(
        &self,
        credential: &Credential,
        source_folder_id: i64,
        release_id: &str,
        instance_id: &str,
        target_folder_id: i64,
    ) -> Result<()> {
        self.inner
            .move_instance(
                credential,
                source_folder_id,
                release_id,
                instance_id,
                target_folder_id,
            )
            .await
    }

    async fn fetch_identity(&self, token: &str) -> Result<String> {
        self.inner.fetch_identity(token).await
    }

    async fn fetch_collection_page(
        &self,
        credential: &Credential,
        page: u32,
    ) -> Result<CollectionPage> {
        self.inner.fetch_collection_page(credential, page).await
    }
}

/// A decode arriving while the first one is still resolving has no
/// observable effect: no second lookup, no state change.
#[tokio::test]
async fn second_decode_during_resolve_is_dropped() {
    let mock = shelved_mock();
    let gated = Arc::new(GatedService::new(mock.clone()));
    let session = session_over(gated.clone());

    session.start_scan();

    let first = {
        let session = session.clone();
        tokio::spawn(async move { session.handle_decode("123.456").await })
    };

    gated.entered.notified().await;
    assert_eq!(session.state(), ScanState::Resolving);

    let duplicate = session.handle_decode("123.456").await.unwrap();
    assert_eq!(duplicate, DecodeOutcome::Ignored);
    assert_eq!(mock.lookup_calls(), 1);
    assert_eq!(session.state(), ScanState::Resolving);

    gated.release.notify_one();
    let outcome = first.await.unwrap().unwrap();
    assert!(matches!(outcome, DecodeOutcome::Matched(_)));
    assert_eq!(session.state(), ScanState::Matched);
}

/// Cancelling mid-resolve discards the eventual response: it must not
/// mutate state belonging to the cycle opened afterwards.
#[tokio::test]
async fn late_response_after_cancel_is_inert() {
    let mock = shelved_mock();
    let gated = Arc::new(GatedService::new(mock.clone()));
    let session = session_over(gated.clone());

    session.start_scan();

    let stale = {
        let session = session.clone();
        tokio::spawn(async move { session.handle_decode("123.456").await })
    };

    gated.entered.notified().await;
    session.cancel();
    assert_eq!(session.state(), ScanState::Idle);

    // A fresh cycle opens while the stale lookup is still parked.
    assert!(session.start_scan());
    assert_eq!(session.state(), ScanState::Scanning);

    gated.release.notify_one();
    let outcome = stale.await.unwrap().unwrap();
    assert_eq!(outcome, DecodeOutcome::Ignored);
    assert_eq!(mock.folder_calls(), 0);

    // The new cycle is untouched by the stale response.
    assert_eq!(session.state(), ScanState::Scanning);
    assert!(session.match_record().is_none());
}

/// Folder id 0 is filtered no matter what the service returns.
#[tokio::test]
async fn synthetic_all_items_folder_is_never_offered() {
    let mock = shelved_mock();
    mock.set_folders(vec![
        Folder {
            id: 0,
            name: "All".into(),
        },
        Folder {
            id: 0,
            name: "All (again)".into(),
        },
        Folder {
            id: 3,
            name: "Crate".into(),
        },
    ]);
    let session = session_over(mock);

    session.start_scan();
    session.handle_decode("123.456").await.unwrap();

    let folders = session.folders();
    assert!(folders.iter().all(|f| f.id != 0));
    assert_eq!(folders.len(), 1);
}

/// MatchRecord fields mirror the service entry exactly.
#[tokio::test]
async fn match_record_preserves_entry_fields() {
    let mock = Arc::new(MockCollection::new());
    mock.add_instance(ReleaseInstance {
        release_id: "123".into(),
        instance_id: "456".into(),
        title: "Blue Lines".into(),
        artists: vec!["Massive Attack".into()],
        labels: vec!["Wild Bunch Records".into()],
        catalog_numbers: vec!["WBRLP 1".into()],
        thumbnail_url: Some("https://img.example/123.jpg".into()),
        folder_id: 7,
    });
    mock.set_folders(vec![Folder {
        id: 7,
        name: "Shelf A".into(),
    }]);
    let session = session_over(mock);

    session.start_scan();
    let DecodeOutcome::Matched(record) = session.handle_decode("123.456").await.unwrap() else {
        panic!("expected match");
    };
    assert_eq!(record.title, "Blue Lines");
    assert_eq!(record.artists, vec!["Massive Attack"]);
    assert_eq!(record.labels, vec!["Wild Bunch Records"]);
    assert_eq!(record.catalog_numbers, vec!["WBRLP 1"]);
    assert_eq!(
        record.thumbnail_url.as_deref(),
        Some("https://img.example/123.jpg")
    );
    assert_eq!(record.folder_id, 7);
}

/// A full re-scan after a move sees the relocated instance.
#[tokio::test]
async fn rescan_after_move_reflects_remote_state() {
    let mock = shelved_mock();
    let session = session_over(mock.clone());

    session.start_scan();
    session.handle_decode("123.456").await.unwrap();
    session.move_to_folder(9).await.unwrap();

    session.start_scan();
    let DecodeOutcome::Matched(record) = session.handle_decode("123.456").await.unwrap() else {
        panic!("expected match");
    };
    assert_eq!(record.folder_id, 9);
    assert_eq!(session.current_folder(), Some(9));
}
