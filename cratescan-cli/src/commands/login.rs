//! Credential commands: login, logout, whoami.

use anyhow::{bail, Context, Result};
use colored::Colorize;
use cratescan_core::{CollectionService, DiscogsClient, IdentityProvider};
use tracing::info;

use crate::store::FileCredentialStore;

/// Validate a token against the service and persist it together with
/// the account it belongs to.
pub async fn execute(token: String) -> Result<()> {
    let service = DiscogsClient::new()?;

    let account_id = service
        .fetch_identity(&token)
        .await
        .context("token validation failed")?;

    let store = FileCredentialStore::open_default()?;
    store.set_credential(token, account_id.clone())?;

    info!(account = %account_id, "credential stored");
    println!("{} logged in as {}", "ok:".green().bold(), account_id.bold());
    Ok(())
}

pub fn logout() -> Result<()> {
    let store = FileCredentialStore::open_default()?;
    store.clear()?;
    println!("credential removed");
    Ok(())
}

pub fn whoami() -> Result<()> {
    let store = FileCredentialStore::open_default()?;
    match store.get_credential() {
        Some(credential) => {
            println!("{}", credential.account_id);
            Ok(())
        }
        None => bail!("no credential configured; run `cratescan login <TOKEN>`"),
    }
}
