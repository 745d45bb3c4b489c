//! CLI argument definitions for the pep517 command-line interface.
//!
//! All `#[derive(Parser)]` and `#[derive(Subcommand)]` types are defined here,
//! keeping `main.rs` focused on dispatch logic.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// pep517 - Call PEP 517 build backend hooks
#[derive(Parser)]
#[command(name = "pep517")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// List the extra requirements the backend needs for a build
    Requires {
        /// Which build to ask about
        #[arg(long = "for", value_enum, default_value = "wheel")]
        target: BuildTarget,

        #[command(flatten)]
        backend: BackendArgs,
    },

    /// Prepare wheel metadata (a .dist-info directory)
    Metadata {
        /// Directory to write the .dist-info directory into
        #[arg(short, long)]
        out: PathBuf,

        #[command(flatten)]
        backend: BackendArgs,
    },

    /// Build a wheel
    Wheel {
        /// Directory to write the wheel into
        #[arg(short, long)]
        out: PathBuf,

        /// .dist-info directory from an earlier `metadata` run
        #[arg(long)]
        metadata_dir: Option<PathBuf>,

        #[command(flatten)]
        backend: BackendArgs,
    },

    /// Build an sdist
    Sdist {
        /// Directory to write the sdist into
        #[arg(short, long)]
        out: PathBuf,

        #[command(flatten)]
        backend: BackendArgs,
    },

    /// Check that hooks can be launched on this system
    Doctor {
        /// Python interpreter to check (default: PEP517_PYTHON or PATH lookup)
        #[arg(long)]
        python: Option<PathBuf>,
    },
}

/// Build kinds with a requirements hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum BuildTarget {
    Wheel,
    Sdist,
}

/// Options shared by every hook command.
#[derive(Debug, Args)]
pub(crate) struct BackendArgs {
    /// Project source directory
    #[arg(short, long, default_value = ".")]
    pub source_dir: PathBuf,

    /// Build backend import spec, e.g. setuptools.build_meta
    #[arg(short, long)]
    pub backend: String,

    /// In-tree backend location, relative to the source directory (repeatable)
    #[arg(long = "backend-path")]
    pub backend_path: Vec<PathBuf>,

    /// Config settings passed to the backend, as a JSON object
    #[arg(short = 'C', long)]
    pub config_settings: Option<String>,

    /// Python interpreter used to run the hook
    #[arg(long)]
    pub python: Option<PathBuf>,

    /// Kill the hook process after this many seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Output machine-readable JSON (no colored output)
    #[arg(long)]
    pub json: bool,
}
