//! Command-line options.

use std::path::PathBuf;

use clap::Parser;
use clap_verbosity_flag::{InfoLevel, Verbosity};

/// Application subcommands.
#[derive(Parser)]
pub enum SubCommands {
    /// Check one or more environment manifests
    ///
    /// Parses each file, runs the lint checks (duplicate active
    /// dependencies, duplicate channels) and reports findings with source
    /// snippets. Exits non-zero if any file has errors.
    Check(CheckOpts),

    /// List the active dependency specifiers of a manifest
    List(ListOpts),

    /// Rewrite a manifest in canonical form
    ///
    /// Canonical form uses two-space indent, `- ` items, and normalized
    /// specifier spacing (`meson >= 1.2.1` becomes `meson>=1.2.1`).
    /// Comment lines, including commented-out dependencies, are kept in
    /// place.
    Fmt(FmtOpts),
}

/// The complete command line.
#[derive(Parser)]
#[clap(version)]
pub struct App {
    #[clap(subcommand)]
    pub subcommand: SubCommands,

    #[command(flatten)]
    pub verbose: Verbosity<InfoLevel>,
}

/// Options for the check command
#[derive(Parser)]
pub struct CheckOpts {
    /// The manifest files to check
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Treat warnings as errors
    #[arg(long)]
    pub strict: bool,
}

/// Options for the list command
#[derive(Parser)]
pub struct ListOpts {
    /// The manifest file to list
    pub file: PathBuf,

    /// Only list the group under this comment header
    #[arg(short, long)]
    pub group: Option<String>,

    /// Only list specifiers that restrict the version
    #[arg(long)]
    pub constrained_only: bool,
}

/// Options for the fmt command
#[derive(Parser)]
pub struct FmtOpts {
    /// The manifest file to format
    pub file: PathBuf,

    /// Exit non-zero if the file is not canonical, without writing
    #[arg(long)]
    pub check: bool,
}
