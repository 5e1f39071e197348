use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

use crate::config::{ConfigFile, Overrides};
use crate::error::SnapverifyError;

pub mod extract;
pub mod verify;

#[derive(Debug, Parser)]
#[command(name = "snapverify")]
#[command(about = "Differential verifier for utility-class snapshot fixtures")]
#[command(
    long_about = "Extracts (input tokens, expected CSS) cases from inline-snapshot test fixtures and verifies a compiler under test against them. Canonical flow: extract to inspect the corpus, verify to run it."
)]
pub struct Cli {
    #[arg(
        short,
        long,
        global = true,
        action = ArgAction::Count,
        help = "Increase log verbosity on stderr (-v debug, -vv trace)"
    )]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    #[command(about = "Compile every extracted case and compare against its snapshot")]
    Verify(verify::VerifyArgs),
    #[command(about = "List the test cases extracted from the fixture corpus")]
    Extract(extract::ExtractArgs),
}

/// Corpus selection and extraction flags shared by every subcommand.
#[derive(Debug, Args)]
pub struct CorpusArgs {
    #[arg(
        value_name = "DIR",
        help = "Fixture directory (defaults to fixture_dir from the config, then ./fixtures)"
    )]
    pub dir: Option<PathBuf>,
    #[arg(
        long,
        value_name = "FILE",
        help = "Config file (defaults to ./snapverify.toml when present)"
    )]
    pub config: Option<PathBuf>,
    #[arg(
        long,
        value_name = "GLOB",
        help = "File-name glob for fixture files (default '*.test.ts')"
    )]
    pub glob: Option<String>,
    #[arg(
        long,
        value_name = "GLOB",
        help = "Only extract test blocks whose name matches this glob"
    )]
    pub filter: Option<String>,
    #[arg(
        long,
        value_name = "BYTES",
        help = "Maximum distance between expect( and the call that feeds it"
    )]
    pub proximity_window: Option<usize>,
    #[arg(
        long,
        value_name = "BYTES",
        help = "How far past a call to look for its expectation marker"
    )]
    pub lookahead_window: Option<usize>,
}

impl CorpusArgs {
    pub fn load_config(&self) -> Result<ConfigFile, SnapverifyError> {
        ConfigFile::load(self.config.as_deref())
    }

    pub fn overrides(&self) -> Overrides {
        Overrides {
            fixture_dir: self.dir.clone(),
            fixture_glob: self.glob.clone(),
            group_filter: self.filter.clone(),
            proximity_window: self.proximity_window,
            lookahead_window: self.lookahead_window,
            ..Overrides::default()
        }
    }
}
