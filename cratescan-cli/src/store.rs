//! File-backed credential store.
//!
//! Persists the token/account pair as JSON under the user config
//! directory, standing in for the mobile app's key-value storage. The
//! core only sees the [`IdentityProvider`] trait.

use std::fs;
use std::path::PathBuf;

use cratescan_core::{Credential, IdentityProvider, Result, ScanError};
use tracing::{debug, warn};

const APP_DIR: &str = "cratescan";
const CREDENTIAL_FILE: &str = "credentials.json";

pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    /// Store under the platform config directory
    /// (`~/.config/cratescan/credentials.json` on Linux).
    pub fn open_default() -> Result<Self> {
        let base = dirs::config_dir()
            .ok_or_else(|| ScanError::Store("no user config directory available".into()))?;
        Ok(Self {
            path: base.join(APP_DIR).join(CREDENTIAL_FILE),
        })
    }

    #[cfg(test)]
    pub fn at(path: PathBuf) -> Self {
        Self { path }
    }
}

impl IdentityProvider for FileCredentialStore {
    fn get_credential(&self) -> Option<Credential> {
        let raw = fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&raw) {
            Ok(credential) => Some(credential),
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "unreadable credential file");
                None
            }
        }
    }

    fn set_credential(&self, token: String, account_id: String) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                ScanError::Store(format!("failed to create {}: {e}", parent.display()))
            })?;
        }

        let credential = Credential { token, account_id };
        let body = serde_json::to_string_pretty(&credential)
            .map_err(|e| ScanError::Store(format!("failed to serialize credential: {e}")))?;
        fs::write(&self.path, body)
            .map_err(|e| ScanError::Store(format!("failed to write {}: {e}", self.path.display())))?;

        debug!(path = %self.path.display(), "credential stored");
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(ScanError::Store(format!(
                "failed to remove {}: {err}",
                self.path.display()
            ))),
        }
    }
}
