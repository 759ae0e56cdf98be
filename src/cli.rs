use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "kar")]
#[command(version)]
#[command(about = "Pack, unpack and inspect KAR archives", long_about = None)]
#[command(after_help = "Examples:\n  \
  kar pack ./assets assets.kar       bundle a directory\n  \
  kar list -v assets.kar             show entries with sizes and checksums\n  \
  kar unpack assets.kar ./restored   extract with CRC32 verification\n\n\
Set RUST_LOG=debug for diagnostic logs on stderr.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Pack a directory into an archive
    Pack {
        /// Directory to pack
        #[arg(value_name = "SOURCE_DIR")]
        source: PathBuf,

        /// Archive file to create
        #[arg(value_name = "ARCHIVE")]
        archive: PathBuf,

        /// Quiet mode (-qq => quieter)
        #[arg(short = 'q', action = clap::ArgAction::Count)]
        quiet: u8,
    },

    /// Extract an archive into a directory
    Unpack {
        /// Archive file to read
        #[arg(value_name = "ARCHIVE")]
        archive: PathBuf,

        /// Destination directory (created if missing)
        #[arg(value_name = "DEST_DIR")]
        dest: PathBuf,

        /// Never overwrite existing files
        #[arg(short = 'n', conflicts_with = "overwrite")]
        never_overwrite: bool,

        /// Overwrite files WITHOUT prompting (default)
        #[arg(short = 'o')]
        overwrite: bool,

        /// Quiet mode (-qq => quieter)
        #[arg(short = 'q', action = clap::ArgAction::Count)]
        quiet: u8,
    },

    /// List archive entries without extracting
    List {
        /// Archive file to read
        #[arg(value_name = "ARCHIVE")]
        archive: PathBuf,

        /// List verbosely (size, mode, mtime, CRC32)
        #[arg(short = 'v')]
        verbose: bool,
    },

    /// Check every entry's CRC32 without extracting
    Verify {
        /// Archive file to read
        #[arg(value_name = "ARCHIVE")]
        archive: PathBuf,

        /// Quiet mode (-qq => quieter)
        #[arg(short = 'q', action = clap::ArgAction::Count)]
        quiet: u8,
    },
}

impl Command {
    pub fn quiet(&self) -> u8 {
        match self {
            Command::Pack { quiet, .. }
            | Command::Unpack { quiet, .. }
            | Command::Verify { quiet, .. } => *quiet,
            Command::List { .. } => 0,
        }
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet() > 0
    }

    pub fn is_very_quiet(&self) -> bool {
        self.quiet() > 1
    }
}
