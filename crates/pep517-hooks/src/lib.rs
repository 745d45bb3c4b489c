//! PEP 517 hook caller
//!
//! This crate lets a build frontend call the hooks of a Python build backend
//! (`get_requires_for_build_wheel`, `prepare_metadata_for_build_wheel`,
//! `build_wheel`, `get_requires_for_build_sdist`, `build_sdist`) without
//! importing the backend into its own process.
//!
//! # Architecture
//!
//! Every hook call follows the same path:
//!
//! 1. **Rust caller** - [`HookCaller`] creates a scratch directory, writes
//!    `input.json` and hands the command line to a [`SubprocessRunner`]
//! 2. **Hook process** - the embedded `hook_host.py` imports the backend named
//!    by `PEP517_BUILD_BACKEND`, calls the hook and writes `output.json`
//!
//! The output is decoded once into a [`HookOutcome`] and turned into either the
//! hook's return value or a [`HookError`]. The scratch directory is removed on
//! every path.
//!
//! # Example
//!
//! ```ignore
//! use pep517_hooks::HookCaller;
//! use std::path::Path;
//!
//! let caller = HookCaller::new("path/to/project", "setuptools.build_meta", None)?;
//! let requires = caller.get_requires_for_build_wheel(None)?;
//! let wheel = caller.build_wheel(Path::new("dist"), None, None)?;
//!
//! println!("Extra requirements: {:?}", requires);
//! println!("Built: {}", wheel);
//! ```
//!
//! # Crate Structure
//!
//! - [`caller`] - The hook caller and invocation routine
//! - [`protocol`] - Hook names and the `input.json`/`output.json` contract
//! - [`runner`] - Subprocess runner strategies
//! - [`path`] - Backend path validation
//! - [`config`] - Interpreter and hook script resolution
//! - [`error`] - Error types

pub mod caller;
pub mod config;
pub mod error;
pub mod path;
pub mod protocol;
pub mod runner;

// Re-export main types at crate root
pub use caller::{HookCaller, RunnerOverride};
pub use config::HookCallerConfig;
pub use error::{HookError, HookResult, InvalidPathError, InvalidPathKind, SubprocessError};
pub use path::validate_backend_path;
pub use protocol::{Hook, HookKwargs, HookOutcome};
pub use runner::{DefaultRunner, ExtraEnv, SubprocessRunner, TimeoutRunner};
