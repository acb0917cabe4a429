//! Export command: dump the whole collection as JSON lines.
//!
//! One object per owned instance, carrying the `release.instance`
//! payload a QR label for that copy would encode. Pages are streamed
//! straight to the writer; nothing is kept in memory or on disk.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use cratescan_core::{CollectionService, DiscogsClient, IdentityProvider, ReleaseInstance};
use serde::Serialize;
use tracing::{debug, info};

use crate::store::FileCredentialStore;

#[derive(Serialize)]
struct ExportRow<'a> {
    /// What the QR label for this copy encodes.
    payload: String,
    #[serde(flatten)]
    instance: &'a ReleaseInstance,
}

pub async fn execute(out: Option<PathBuf>) -> Result<()> {
    let store = FileCredentialStore::open_default()?;
    let Some(credential) = store.get_credential() else {
        bail!("no credential configured; run `cratescan login <TOKEN>`");
    };

    let service = DiscogsClient::new()?;

    let mut writer: Box<dyn Write> = match &out {
        Some(path) => Box::new(BufWriter::new(File::create(path).with_context(|| {
            format!("Failed to create {}", path.display())
        })?)),
        None => Box::new(std::io::stdout().lock()),
    };

    let mut page = 1;
    let mut total = 0usize;
    loop {
        let batch = service.fetch_collection_page(&credential, page).await?;
        debug!(page = batch.page, pages = batch.pages, count = batch.releases.len(), "fetched page");

        for instance in &batch.releases {
            let row = ExportRow {
                payload: format!("{}.{}", instance.release_id, instance.instance_id),
                instance,
            };
            let line = serde_json::to_string(&row).context("Failed to serialize instance")?;
            writeln!(writer, "{line}").context("Failed to write export line")?;
        }
        total += batch.releases.len();

        if batch.page >= batch.pages {
            break;
        }
        page += 1;
    }
    writer.flush().context("Failed to write export")?;

    info!(total, "export complete");
    eprintln!("exported {total} instances");
    Ok(())
}
