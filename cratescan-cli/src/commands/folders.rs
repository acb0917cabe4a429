//! Folders command: list relocation targets.

use anyhow::{bail, Result};
use cratescan_core::{CollectionService, DiscogsClient, IdentityProvider, ALL_ITEMS_FOLDER_ID};

use crate::store::FileCredentialStore;

pub async fn execute() -> Result<()> {
    let store = FileCredentialStore::open_default()?;
    let Some(credential) = store.get_credential() else {
        bail!("no credential configured; run `cratescan login <TOKEN>`");
    };

    let service = DiscogsClient::new()?;
    let folders = service.fetch_folders(&credential).await?;

    for folder in folders.iter().filter(|f| f.id != ALL_ITEMS_FOLDER_ID) {
        println!("{:>6}  {}", folder.id, folder.name);
    }
    Ok(())
}
