//! Cratescan core - scan-resolve-relocate for a Discogs collection.
//!
//! A QR label on a record sleeve encodes `{release_id}.{instance_id}`.
//! This crate owns everything between the decoder and the screen: the
//! single-flight [`ScanSession`] state machine that validates the
//! payload and resolves it against the remote collection, the
//! relocation coordinator that moves a matched instance between storage
//! folders, and the [`CollectionService`] client the two talk through.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use cratescan_core::{
//!     DecodeOutcome, DiscogsClient, MemoryIdentity, ScanSession,
//! };
//!
//! # async fn example() -> cratescan_core::Result<()> {
//! let service = Arc::new(DiscogsClient::new()?);
//! let identity = Arc::new(MemoryIdentity::with_credential("token", "account"));
//! let session = ScanSession::new(service, identity);
//!
//! session.start_scan();
//! if let DecodeOutcome::Matched(record) = session.handle_decode("123.456").await? {
//!     println!("{} is in folder {}", record.title, record.folder_id);
//!     session.move_to_folder(9).await?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod identity;
pub mod payload;
pub mod relocate;
pub mod session;

// Re-export main types for convenience
pub use client::{
    CollectionPage, CollectionService, DiscogsClient, DiscogsConfig, Folder, MockCollection,
    MockFault, ReleaseInstance, ALL_ITEMS_FOLDER_ID,
};
pub use error::{Result, ScanError};
pub use identity::{Credential, IdentityProvider, MemoryIdentity};
pub use payload::ScanPayload;
pub use relocate::MoveOutcome;
pub use session::{DecodeOutcome, MatchRecord, ScanSession, ScanState};
