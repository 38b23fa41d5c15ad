//! CLI command implementations

use std::path::PathBuf;

use clap::Subcommand;
use tokio::fs;
use tracing::Level;
use undertow_core::config::UndertowConfig;
use undertow_core::tracing_setup::init_tracing;
use undertow_core::{Result, TorrentMetadata};
use undertow_web::run_server;

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Start the API server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        /// Port to bind to
        #[arg(short, long, default_value = "5000")]
        port: u16,
    },
    /// Parse a torrent file and print its metadata
    Inspect {
        /// Path to the torrent file
        file: PathBuf,
    },
}

/// Handle the CLI command
///
/// # Errors
/// Returns appropriate error based on the command that fails
pub async fn handle_command(command: Commands) -> Result<()> {
    match command {
        Commands::Serve { host, port } => serve(host, port).await,
        Commands::Inspect { file } => inspect(file).await,
    }
}

/// Start the API server
///
/// # Errors
/// - `UndertowError::Io` - The bind address is unavailable
pub async fn serve(host: String, port: u16) -> Result<()> {
    init_tracing(Level::INFO, Some(std::path::Path::new("logs")))?;

    let mut config = UndertowConfig::from_env();
    config.http.bind_addr = format!("{host}:{port}");

    println!("Undertow catalog server on http://{}", config.http.bind_addr);
    run_server(config).await
}

/// Parse a torrent file and print its metadata
///
/// # Errors
/// - `UndertowError::Torrent` - The file is not a valid torrent
/// - `UndertowError::Io` - The file cannot be read
pub async fn inspect(file: PathBuf) -> Result<()> {
    let bytes = fs::read(&file).await?;
    let metadata = TorrentMetadata::from_bytes(&bytes)?;
    print!("{}", describe(&metadata));
    Ok(())
}

fn describe(metadata: &TorrentMetadata) -> String {
    let mut out = String::new();
    out.push_str(&format!("Name:          {}\n", metadata.name));
    out.push_str(&format!("Info hash:     {}\n", metadata.info_hash()));
    out.push_str(&format!("Total size:    {} bytes\n", metadata.total_size));
    out.push_str(&format!("Piece length:  {} bytes\n", metadata.piece_length));
    out.push_str(&format!("Pieces:        {}\n", metadata.piece_hashes.len()));
    match &metadata.files {
        Some(files) => {
            out.push_str(&format!("Files:         {}\n", files.len()));
            for file in files {
                out.push_str(&format!("  {} ({} bytes)\n", file.path, file.length));
            }
        }
        None => out.push_str("Files:         single-file torrent\n"),
    }
    out
}
