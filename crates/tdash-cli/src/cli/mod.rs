//! CLI for the tdash transfer dashboard.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::{Path, PathBuf};
use tdash_core::checksum::ChecksumKind;
use tdash_core::config;

use commands::{run_checksum, run_completions, run_copy, CopyArgs};

/// Top-level CLI for tdash.
#[derive(Debug, Parser)]
#[command(name = "tdash")]
#[command(about = "tdash: concurrent file transfers with a live dashboard and checksum verification", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Copy files into a directory while showing the dashboard, then verify them.
    Copy {
        /// Files to copy.
        #[arg(required_unless_present = "interactive", value_name = "SRC")]
        sources: Vec<PathBuf>,

        /// Edit the source list on a batch screen before copying (SRC pre-fills it).
        #[arg(long, short = 'i')]
        interactive: bool,

        /// Destination directory (created if missing).
        #[arg(long, short = 'd', value_name = "DIR")]
        dest: PathBuf,

        /// Copy up to N files concurrently (default from config).
        #[arg(long, short = 'j', value_name = "N")]
        jobs: Option<usize>,

        /// Compute this digest for every file as soon as it finishes.
        #[arg(long, value_name = "KIND")]
        checksum: Option<ChecksumKind>,

        /// Expected digest, matched to SRC by position. Repeat once per file.
        #[arg(long = "expect", value_name = "HEX")]
        expect: Vec<String>,

        /// Skip the interactive verification step.
        #[arg(long)]
        no_verify: bool,

        /// Write the verification outcome as JSON to this path.
        #[arg(long, value_name = "PATH")]
        report: Option<PathBuf>,
    },

    /// Compute the digest of a file.
    Checksum {
        /// Path to the file.
        path: String,

        /// Digest algorithm (md5 or sha256).
        #[arg(long, default_value = "sha256")]
        kind: ChecksumKind,
    },

    /// Print shell completions to stdout.
    Completions {
        /// Target shell.
        shell: Shell,
    },
}

impl CliCommand {
    /// True for commands that draw the dashboard.
    pub fn takes_over_terminal(&self) -> bool {
        matches!(self, CliCommand::Copy { .. })
    }
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            CliCommand::Copy {
                sources,
                interactive,
                dest,
                jobs,
                checksum,
                expect,
                no_verify,
                report,
            } => {
                let cfg = config::load_or_init()?;
                tracing::debug!("loaded config: {:?}", cfg);
                run_copy(
                    &cfg,
                    CopyArgs {
                        sources,
                        interactive,
                        dest,
                        jobs,
                        checksum,
                        expect,
                        no_verify,
                        report,
                    },
                )?;
            }
            CliCommand::Checksum { path, kind } => run_checksum(Path::new(&path), kind)?,
            CliCommand::Completions { shell } => run_completions(shell),
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
