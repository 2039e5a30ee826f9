//! Main entry point for the romzip CLI application.
//!
//! Lists a ZIP container, or locates the media entry inside it and
//! materializes that entry in the scratch directory (or on stdout).

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::AsyncWriteExt;

use romzip::{ArchiveHandle, ArchiveSession, Cli, is_media, is_wanted_media};

/// Application entry point.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.is_quiet() { "error" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let session = ArchiveSession::new(cli.session_config());
    let handle = session
        .open(&cli.file)
        .await
        .with_context(|| format!("cannot open {}", cli.file.display()))?;

    let result = if cli.list || cli.verbose {
        list_entries(&handle, &cli)
    } else {
        extract(&session, &handle, &cli).await
    };

    handle.close();
    result
}

/// Print the catalog.
///
/// `-l` prints one name per line; `-v` prints a table with sizes,
/// compression ratio and a `*` next to entries that count as media.
fn list_entries(handle: &ArchiveHandle, cli: &Cli) -> Result<()> {
    let entries = handle.entries()?;

    if !cli.verbose {
        for entry in entries.iter() {
            println!("{}", entry.name());
        }
        return Ok(());
    }

    println!("{:>10}  {:>10}  {:>5}  {:>1}  Name", "Length", "Size", "Cmpr", "M");
    println!("{}", "-".repeat(60));

    let mut total_uncompressed = 0u64;
    let mut total_compressed = 0u64;
    let mut file_count = 0usize;

    for entry in entries.iter() {
        let media = if entry.is_directory() {
            false
        } else {
            match cli.wanted() {
                Some(wanted) => is_wanted_media(entry.name(), wanted),
                None => is_media(entry.name()),
            }
        };

        println!(
            "{:>10}  {:>10}  {}  {:>1}  {}",
            entry.uncompressed_size(),
            entry.compressed_size(),
            ratio(entry.compressed_size(), entry.uncompressed_size()),
            if media { "*" } else { "" },
            entry.name()
        );

        if !entry.is_directory() {
            total_uncompressed += entry.uncompressed_size();
            total_compressed += entry.compressed_size();
            file_count += 1;
        }
    }

    println!("{}", "-".repeat(60));
    println!(
        "{:>10}  {:>10}  {}     {} files",
        total_uncompressed,
        total_compressed,
        ratio(total_compressed, total_uncompressed),
        file_count
    );

    Ok(())
}

/// Extract the requested entry, or the first media entry, and report
/// where it went.
async fn extract(session: &ArchiveSession, handle: &ArchiveHandle, cli: &Cli) -> Result<()> {
    let name = match &cli.entry {
        Some(name) => name.clone(),
        None => handle.find_media(cli.wanted())?,
    };

    if cli.pipe {
        let bytes = handle
            .extract_to_buffer(&name)
            .await
            .with_context(|| format!("cannot extract {name}"))?;
        let mut stdout = tokio::io::stdout();
        stdout.write_all(&bytes).await?;
        stdout.flush().await?;
        return Ok(());
    }

    let path = session
        .extract_to_scratch(handle, &name)
        .await
        .with_context(|| format!("cannot extract {name}"))?;

    if !cli.is_very_quiet() {
        if !cli.is_quiet() {
            eprintln!("  extracting: {name}");
        }
        println!("{}", path.display());
    }

    Ok(())
}

/// Percentage saved by compression, formatted to five columns.
fn ratio(compressed: u64, uncompressed: u64) -> String {
    if uncompressed > 0 && compressed <= uncompressed {
        format!("{:>4}%", 100 - (compressed * 100 / uncompressed))
    } else {
        "   0%".to_string()
    }
}
