//! The relocation coordinator.
//!
//! Moves the currently matched instance to another folder. Relocation is
//! orthogonal to the scan lifecycle: the cycle stays terminal-`Matched`
//! throughout, and the only thing a successful move changes is the
//! confirmed current folder.

use tracing::{info, instrument, warn};

use crate::error::{Result, ScanError};
use crate::session::{ScanSession, ScanState};

/// Result of a relocation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The target already is the current folder: declared no-op, zero
    /// network calls, nothing changed. Repeating a move is free.
    AlreadyThere,
    /// The instance was moved; `to` is now the confirmed current folder.
    Moved { from: i64, to: i64 },
}

impl ScanSession {
    /// Move the matched instance to `target_folder_id`.
    ///
    /// Preconditions: the cycle must be in `Matched`, and no other
    /// relocation may be in flight. The remote move is addressed by the
    /// *current* folder; the local current-folder selection is only
    /// updated after the service confirms the move, so the displayed
    /// location always reflects the last confirmed remote state.
    #[instrument(level = "debug", skip(self))]
    pub async fn move_to_folder(&self, target_folder_id: i64) -> Result<MoveOutcome> {
        let (record, source, credential) = {
            let mut inner = self.lock();
            match inner.state {
                ScanState::Matched => {}
                ScanState::Moving => {
                    warn!("relocation requested while one is in flight");
                    return Err(ScanError::RelocationInFlight);
                }
                state => {
                    warn!(?state, "relocation requested with no active match");
                    return Err(ScanError::NoActiveMatch);
                }
            }
            let record = inner.record.clone().ok_or(ScanError::NoActiveMatch)?;
            let source = inner.current_folder.ok_or(ScanError::NoActiveMatch)?;

            if target_folder_id == source {
                info!(folder_id = source, "already in target folder");
                return Ok(MoveOutcome::AlreadyThere);
            }

            let credential = self
                .identity
                .get_credential()
                .ok_or(ScanError::MissingCredential)?;

            inner.state = ScanState::Moving;
            (record, source, credential)
        };

        let moved = self
            .service
            .move_instance(
                &credential,
                source,
                &record.release_id,
                &record.instance_id,
                target_folder_id,
            )
            .await;

        // start_scan and cancel both refuse while Moving, so the cycle
        // is still ours when the call returns.
        let mut inner = self.lock();
        inner.state = ScanState::Matched;
        match moved {
            Ok(()) => {
                inner.current_folder = Some(target_folder_id);
                info!(from = source, to = target_folder_id, "instance relocated");
                Ok(MoveOutcome::Moved {
                    from: source,
                    to: target_folder_id,
                })
            }
            Err(err) => {
                // No optimistic update: current folder stays at the last
                // confirmed remote state.
                warn!(error = %err, from = source, to = target_folder_id, "relocation failed");
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::client::{test_instance, Folder, MockCollection, MockFault};
    use crate::identity::MemoryIdentity;
    use crate::session::DecodeOutcome;

    async fn matched_session() -> (Arc<MockCollection>, ScanSession) {
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
        let session = ScanSession::new(
            mock.clone(),
            Arc::new(MemoryIdentity::with_credential("tok", "geoff")),
        );
        session.start_scan();
        let outcome = session.handle_decode("123.456").await.unwrap();
        assert!(matches!(outcome, DecodeOutcome::Matched(_)));
        (mock, session)
    }

    #[tokio::test]
    async fn test_move_to_current_folder_is_noop() {
        let (mock, session) = matched_session().await;

        let outcome = session.move_to_folder(7).await.unwrap();
        assert_eq!(outcome, MoveOutcome::AlreadyThere);
        assert_eq!(mock.move_calls(), 0);
        assert_eq!(session.current_folder(), Some(7));
        assert_eq!(session.state(), ScanState::Matched);
    }

    #[tokio::test]
    async fn test_successful_move_updates_current_folder() {
        let (mock, session) = matched_session().await;

        let outcome = session.move_to_folder(9).await.unwrap();
        assert_eq!(outcome, MoveOutcome::Moved { from: 7, to: 9 });
        assert_eq!(mock.move_calls(), 1);
        assert_eq!(session.current_folder(), Some(9));
        assert_eq!(session.state(), ScanState::Matched);
        // The mock verified the request was addressed by source folder 7.
        assert_eq!(mock.folder_of("123", "456"), Some(9));
    }

    #[tokio::test]
    async fn test_repeated_move_is_idempotent() {
        let (mock, session) = matched_session().await;

        session.move_to_folder(9).await.unwrap();
        let outcome = session.move_to_folder(9).await.unwrap();
        assert_eq!(outcome, MoveOutcome::AlreadyThere);
        assert_eq!(mock.move_calls(), 1);
    }

    #[tokio::test]
    async fn test_failed_move_leaves_current_folder() {
        let (mock, session) = matched_session().await;
        mock.fail_moves(Some(MockFault::Transport));

        let result = session.move_to_folder(9).await;
        assert!(matches!(result, Err(ScanError::Transport(_))));
        assert_eq!(session.current_folder(), Some(7));
        assert_eq!(session.state(), ScanState::Matched);

        // Recoverable: clearing the fault and retrying succeeds.
        mock.fail_moves(None);
        session.move_to_folder(9).await.unwrap();
        assert_eq!(session.current_folder(), Some(9));
    }

    #[tokio::test]
    async fn test_move_without_match_fails_loudly() {
        let mock = Arc::new(MockCollection::new());
        let session = ScanSession::new(
            mock.clone(),
            Arc::new(MemoryIdentity::with_credential("tok", "geoff")),
        );

        let result = session.move_to_folder(9).await;
        assert!(matches!(result, Err(ScanError::NoActiveMatch)));
        assert_eq!(mock.move_calls(), 0);
    }

    #[tokio::test]
    async fn test_move_after_miss_fails_loudly() {
        let mock = Arc::new(MockCollection::new());
        let session = ScanSession::new(
            mock.clone(),
            Arc::new(MemoryIdentity::with_credential("tok", "geoff")),
        );
        session.start_scan();
        assert_eq!(
            session.handle_decode("1.2").await.unwrap(),
            DecodeOutcome::Missed
        );

        let result = session.move_to_folder(9).await;
        assert!(matches!(result, Err(ScanError::NoActiveMatch)));
    }

    #[tokio::test]
    async fn test_concurrent_relocation_is_rejected() {
        let (_mock, session) = matched_session().await;

        // Simulate an in-flight relocation.
        session.lock().state = ScanState::Moving;

        let result = session.move_to_folder(9).await;
        assert!(matches!(result, Err(ScanError::RelocationInFlight)));
    }

    #[tokio::test]
    async fn test_rescan_is_refused_while_moving() {
        let (_mock, session) = matched_session().await;
        session.lock().state = ScanState::Moving;

        assert!(!session.start_scan());
        session.cancel();
        assert_eq!(session.state(), ScanState::Moving);
    }
}
