//! Credential ownership.
//!
//! The core never persists a credential; it asks an [`IdentityProvider`]
//! for one at each remote call. Where the credential actually lives
//! (memory, a config file, a keychain) is the provider's business.

use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A Discogs personal access token paired with the account it belongs to.
///
/// Immutable for the lifetime of a scan cycle.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Credential {
    pub token: String,
    pub account_id: String,
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"[REDACTED]")
            .field("account_id", &self.account_id)
            .finish()
    }
}

/// Supplies and stores the session credential.
///
/// Implementations must be thread-safe (`Send + Sync`).
pub trait IdentityProvider: Send + Sync {
    /// Current credential, if one is configured.
    fn get_credential(&self) -> Option<Credential>;

    /// Replace the stored credential.
    fn set_credential(&self, token: String, account_id: String) -> Result<()>;

    /// Forget the stored credential.
    fn clear(&self) -> Result<()>;
}

/// In-memory identity provider. Used in tests and anywhere persistence
/// is not wanted.
#[derive(Default)]
pub struct MemoryIdentity {
    credential: Mutex<Option<Credential>>,
}

impl MemoryIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Construct an already-populated provider.
    pub fn with_credential(token: impl Into<String>, account_id: impl Into<String>) -> Self {
        Self {
            credential: Mutex::new(Some(Credential {
                token: token.into(),
                account_id: account_id.into(),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<Credential>> {
        match self.credential.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl IdentityProvider for MemoryIdentity {
    fn get_credential(&self) -> Option<Credential> {
        self.lock().clone()
    }

    fn set_credential(&self, token: String, account_id: String) -> Result<()> {
        *self.lock() = Some(Credential { token, account_id });
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.lock() = None;
        Ok(())
    }
}
