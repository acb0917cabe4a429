//! Scan command: one full session cycle, optionally followed by a move.

use std::sync::Arc;

use anyhow::{bail, Result};
use colored::Colorize;
use cratescan_core::{
    DecodeOutcome, DiscogsClient, IdentityProvider, MatchRecord, MoveOutcome, ScanPayload,
    ScanSession,
};

use crate::store::FileCredentialStore;

/// The scanned pair resolved to a miss but the command needed the item
/// to exist. Carried as a typed error so exit-code classification does
/// not depend on message wording.
#[derive(Debug)]
pub struct NotInCollection(pub String);

impl std::fmt::Display for NotInCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} is not in the collection", self.0)
    }
}

impl std::error::Error for NotInCollection {}

pub async fn execute(payload: String, move_to: Option<i64>) -> Result<()> {
    // Shape check first: a malformed payload is a usage error and must
    // not touch the credential store or the network.
    ScanPayload::parse(&payload)?;

    let store = Arc::new(FileCredentialStore::open_default()?);
    if store.get_credential().is_none() {
        bail!("no credential configured; run `cratescan login <TOKEN>`");
    }

    let service = Arc::new(DiscogsClient::new()?);
    let session = ScanSession::new(service, store);

    if !session.start_scan() {
        bail!("no credential configured; run `cratescan login <TOKEN>`");
    }

    match session.handle_decode(&payload).await? {
        DecodeOutcome::Matched(record) => {
            print_match(&record, &session);
            if let Some(target) = move_to {
                relocate(&session, target).await?;
            }
            Ok(())
        }
        DecodeOutcome::Missed => {
            // A miss is a normal outcome, presented distinctly from a
            // failure - unless the caller needed the item to exist.
            println!("{}", "Not found in collection".yellow());
            if move_to.is_some() {
                return Err(NotInCollection(payload).into());
            }
            Ok(())
        }
        DecodeOutcome::Ignored => bail!("a scan is already in progress"),
    }
}

fn print_match(record: &MatchRecord, session: &ScanSession) {
    println!("{}", record.title.bold());
    println!("{}", record.artists.join(", "));
    if !record.labels.is_empty() {
        println!(
            "{} ({})",
            record.labels.join(", "),
            record.catalog_numbers.join(", ")
        );
    }

    let folders = session.folders();
    let current = session.current_folder();
    let location = current
        .and_then(|id| folders.iter().find(|f| f.id == id))
        .map(|f| f.name.as_str())
        .unwrap_or("Unknown");
    println!("{} {}", "Location:".dimmed(), location);

    for folder in &folders {
        let marker = if Some(folder.id) == current { "*" } else { " " };
        println!("  {marker} {:>6}  {}", folder.id, folder.name);
    }
}

async fn relocate(session: &ScanSession, target: i64) -> Result<()> {
    let folder_name = session
        .folders()
        .iter()
        .find(|f| f.id == target)
        .map(|f| f.name.clone())
        .unwrap_or_else(|| format!("folder {target}"));

    match session.move_to_folder(target).await? {
        MoveOutcome::AlreadyThere => {
            println!("already in {folder_name}");
        }
        MoveOutcome::Moved { from, to } => {
            println!(
                "{} moved to {} ({from} -> {to})",
                "ok:".green().bold(),
                folder_name.bold()
            );
        }
    }
    Ok(())
}
