use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("invalid scan payload: {0}")]
    InvalidPayload(String),

    #[error("no credential configured")]
    MissingCredential,

    #[error("collection service rejected the credential")]
    InvalidCredential,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("no active match to relocate")]
    NoActiveMatch,

    #[error("a relocation is already in flight")]
    RelocationInFlight,

    #[error("credential store error: {0}")]
    Store(String),
}

impl ScanError {
    /// True when the failure means the stored credential should be
    /// re-entered rather than the action retried.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::InvalidCredential)
    }
}

pub type Result<T> = std::result::Result<T, ScanError>;
