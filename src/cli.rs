use clap::Parser;
use std::path::PathBuf;

use crate::config::{ExistingFilePolicy, ScratchNaming, SessionConfig, UnreadableEntryPolicy};

#[derive(Parser, Debug)]
#[command(name = "romzip")]
#[command(version)]
#[command(
    about = "Find the ROM inside a ZIP and hand it to a loader as a plain file",
    long_about = None
)]
#[command(after_help = "Examples:\n  \
  romzip games.zip                 extract the first disk/tape/cartridge image\n  \
  romzip -e .d64,.t64 games.zip    only consider disk and tape images\n  \
  romzip -v games.zip              list entries, marking media files\n  \
  romzip -p games.zip | xxd        send the selected image to stdout")]
pub struct Cli {
    /// ZIP file path
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Entry to extract instead of searching for one
    #[arg(value_name = "ENTRY")]
    pub entry: Option<String>,

    /// List entries (short format)
    #[arg(short = 'l')]
    pub list: bool,

    /// List entries verbosely
    #[arg(short = 'v')]
    pub verbose: bool,

    /// Wanted media extensions, most preferred first (default: built-in list)
    #[arg(short = 'e', long = "ext", value_name = "EXT", value_delimiter = ',')]
    pub extensions: Vec<String>,

    /// Scratch directory for extracted files
    #[arg(short = 'd', value_name = "DIR", env = "ROMZIP_SCRATCH_DIR")]
    pub scratch_dir: Option<PathBuf>,

    /// Write the selected entry to stdout instead of the scratch directory
    #[arg(short = 'p')]
    pub pipe: bool,

    /// Name scratch files temp_<n>_<name>, without the per-run token
    #[arg(long)]
    pub counter_names: bool,

    /// Fail instead of overwriting an existing scratch file
    #[arg(long)]
    pub no_overwrite: bool,

    /// Fail when any entry's metadata is unreadable instead of skipping it
    #[arg(long)]
    pub strict: bool,

    /// Quiet mode (-qq => quieter)
    #[arg(short = 'q', action = clap::ArgAction::Count)]
    pub quiet: u8,
}

impl Cli {
    pub fn is_quiet(&self) -> bool {
        self.quiet > 0 || self.pipe
    }

    pub fn is_very_quiet(&self) -> bool {
        self.quiet > 1
    }

    /// Extensions to search for; `None` selects the default list.
    pub fn wanted(&self) -> Option<&[String]> {
        (!self.extensions.is_empty()).then_some(self.extensions.as_slice())
    }

    pub fn session_config(&self) -> SessionConfig {
        let mut config = match &self.scratch_dir {
            Some(dir) => SessionConfig::with_scratch_dir(dir),
            None => SessionConfig::default(),
        };
        if self.counter_names {
            config.naming = ScratchNaming::Counter;
        }
        if self.no_overwrite {
            config.existing = ExistingFilePolicy::Fail;
        }
        if self.strict {
            config.unreadable = UnreadableEntryPolicy::Abort;
        }
        config
    }
}
