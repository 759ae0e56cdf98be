//! Main entry point for the kar CLI application.
//!
//! Dispatches the `pack`, `unpack`, `list` and `verify` subcommands onto the
//! library and renders per-entry progress on stdout. Diagnostics go to
//! stderr through `tracing`, filtered by `RUST_LOG`.

use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::path::Path;
use tracing_subscriber::EnvFilter;

use kar::archive::ArchiveEntry;
use kar::cli::Command;
use kar::{Cli, Extractor, Packer, Progress, list, open_archive, verify};

/// Application entry point.
///
/// Any error surfaces through `anyhow`, which prints the message chain on
/// stderr and exits with a non-zero status.
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let quiet = cli.command.is_quiet();
    let very_quiet = cli.command.is_very_quiet();

    match cli.command {
        Command::Pack {
            source, archive, ..
        } => {
            let mut progress = ConsoleProgress::new("packing", quiet);
            let summary = Packer::new()
                .pack_to_file(&source, &archive, &mut progress)
                .with_context(|| format!("failed to pack {}", source.display()))?;
            if !very_quiet {
                println!(
                    "Archive created: {} ({} files, {})",
                    archive.display(),
                    summary.entries,
                    format_size(summary.total_bytes)
                );
            }
        }
        Command::Unpack {
            archive,
            dest,
            never_overwrite,
            ..
        } => {
            let mut progress = ConsoleProgress::new("extracting", quiet);
            let written = Extractor::new()
                .overwrite(!never_overwrite)
                .unpack_file(&archive, &dest, &mut progress)
                .with_context(|| format!("failed to unpack {}", archive.display()))?;
            if !very_quiet {
                println!("Extracted {} files to: {}", written, dest.display());
            }
        }
        Command::List { archive, verbose } => {
            list_entries(&archive, verbose)
                .with_context(|| format!("failed to list {}", archive.display()))?;
        }
        Command::Verify { archive, .. } => {
            let mut progress = ConsoleProgress::new("OK", quiet);
            let report = open_archive(&archive)
                .and_then(|input| verify(input, &mut progress))
                .with_context(|| format!("failed to verify {}", archive.display()))?;
            if !very_quiet {
                println!(
                    "ok: {} entries, {}",
                    report.entries,
                    format_size(report.total_bytes)
                );
            }
        }
    }

    Ok(())
}

/// Per-entry progress lines on stdout.
struct ConsoleProgress {
    verb: &'static str,
    quiet: bool,
}

impl ConsoleProgress {
    /// # Arguments
    ///
    /// * `verb` - Label printed before each entry, e.g. `"packing"`
    /// * `quiet` - Suppress per-entry lines
    fn new(verb: &'static str, quiet: bool) -> Self {
        Self { verb, quiet }
    }
}

impl Progress for ConsoleProgress {
    fn entry(&mut self, index: u32, total: u32, entry: &ArchiveEntry) {
        if !self.quiet {
            println!("  {:>10}: ({}/{}) {}", self.verb, index, total, entry.path);
        }
    }

    fn skipped(&mut self, entry: &ArchiveEntry) {
        if !self.quiet {
            eprintln!("Skipping: {} (file exists)", entry.path);
        }
    }
}

/// List entries in the archive.
///
/// # Arguments
///
/// * `archive` - Path of the container to read
/// * `verbose` - If true, display the detailed table instead of the plain listing
///
/// # Returns
///
/// Returns `Ok(())` on success, or an error if the archive cannot be read.
fn list_entries(archive: &Path, verbose: bool) -> Result<()> {
    let entries = list(open_archive(archive)?)?;
    let stdout = std::io::stdout();
    render_listing(&mut stdout.lock(), archive, &entries, verbose)?;
    Ok(())
}

/// Write the listing of `entries` to `out`.
///
/// Supports two output formats:
/// - Simple format: `Archive:`/`Entries:` header, then path and human-readable size
/// - Verbose format (`-v`): table with size, mode, mtime and CRC32, plus a totals line
fn render_listing<W: Write>(
    out: &mut W,
    archive: &Path,
    entries: &[ArchiveEntry],
    verbose: bool,
) -> std::io::Result<()> {
    writeln!(out, "Archive: {}", archive.display())?;

    if !verbose {
        writeln!(out, "Entries: {}", entries.len())?;
        writeln!(out, "{}", "-".repeat(24))?;
        for entry in entries {
            writeln!(out, "{} ({})", entry.path, format_size(entry.content_size))?;
        }
        return Ok(());
    }

    writeln!(
        out,
        "{:>12}  {:<9}  {:<16}  {:<8}  Name",
        "Length", "Mode", "Modified", "CRC32"
    )?;
    writeln!(out, "{}", "-".repeat(70))?;

    let mut total = 0u64;
    for entry in entries {
        writeln!(
            out,
            "{:>12}  {}  {:<16}  {:08x}  {}",
            entry.content_size,
            entry.mode_string(),
            format_mtime(entry.modified_time),
            entry.checksum,
            entry.path
        )?;
        total += entry.content_size;
    }

    writeln!(out, "{}", "-".repeat(70))?;
    writeln!(out, "{:>12}  {:>38}  {} files", total, "", entries.len())
}

/// Format Unix seconds as `YYYY-MM-DD HH:MM` (UTC).
///
/// # Returns
///
/// Returns `"-"` when the timestamp is out of range.
fn format_mtime(secs: u64) -> String {
    i64::try_from(secs)
        .ok()
        .and_then(|s| chrono::DateTime::from_timestamp(s, 0))
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// Format a byte size into a human-readable string.
///
/// # Arguments
///
/// * `size` - Size in bytes
///
/// # Returns
///
/// A string with two decimals and a B, KB, MB or GB unit.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(format_size(500), "500.00 B");
/// assert_eq!(format_size(1536), "1.50 KB");
/// assert_eq!(format_size(1048576), "1.00 MB");
/// ```
fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{:.2} B", size as f64)
    }
}
