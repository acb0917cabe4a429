//! Cratescan CLI - scan, resolve, and relocate Discogs collection items.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use colored::Colorize;

mod commands;
mod exit_codes;
mod store;

#[derive(Parser)]
#[command(name = "cratescan")]
#[command(author, version, about = "Scan and relocate items in a Discogs collection", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a Discogs personal access token and store it
    Login {
        /// Personal access token from discogs.com/settings/developers
        #[arg(value_name = "TOKEN")]
        token: String,
    },

    /// Forget the stored credential
    Logout,

    /// Print the account the stored credential belongs to
    Whoami,

    /// Resolve a scanned QR payload against the collection
    Scan {
        /// Decoded QR payload: release_id.instance_id
        #[arg(value_name = "PAYLOAD")]
        payload: String,

        /// Move the matched instance to this folder after resolving
        #[arg(long, value_name = "FOLDER_ID")]
        move_to: Option<i64>,
    },

    /// List the folders an instance can be relocated to
    Folders,

    /// Dump every collection instance as JSON lines for label generation
    Export {
        /// Write to a file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        out: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Login { token } => commands::login::execute(token).await,
        Commands::Logout => commands::login::logout(),
        Commands::Whoami => commands::login::whoami(),
        Commands::Scan { payload, move_to } => commands::scan::execute(payload, move_to).await,
        Commands::Folders => commands::folders::execute().await,
        Commands::Export { out } => commands::export::execute(out).await,
    };

    if let Err(err) = result {
        eprintln!("{} {err:#}", "error:".red().bold());
        std::process::exit(exit_codes::classify(&err));
    }
}
