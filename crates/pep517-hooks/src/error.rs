//! Error types for hook invocation.

use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;
use thiserror::Error;

use crate::protocol::Hook;

/// Result type for hook caller operations.
pub type HookResult<T> = Result<T, HookError>;

/// Why a backend path entry was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidPathKind {
    /// The entry was an absolute path.
    Absolute,
    /// The entry resolved to a location outside the source tree.
    OutsideSourceTree,
    /// The entry could not be made absolute.
    Unresolvable(String),
}

impl std::fmt::Display for InvalidPathKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvalidPathKind::Absolute => f.write_str("paths must be relative"),
            InvalidPathKind::OutsideSourceTree => f.write_str("paths must be inside source tree"),
            InvalidPathKind::Unresolvable(reason) => {
                write!(f, "path cannot be resolved: {}", reason)
            }
        }
    }
}

/// A backend path entry failed validation against the source tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid backend path '{}': {kind}", .path.display())]
pub struct InvalidPathError {
    /// The entry as it was requested.
    pub path: PathBuf,
    /// The reason it was rejected.
    pub kind: InvalidPathKind,
}

impl InvalidPathError {
    pub(crate) fn new(path: impl Into<PathBuf>, kind: InvalidPathKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }
}

/// Failures raised by a [`SubprocessRunner`](crate::runner::SubprocessRunner).
#[derive(Debug, Error)]
pub enum SubprocessError {
    /// The command vector was empty.
    #[error("cannot run an empty command")]
    EmptyCommand,

    /// The child process could not be launched.
    #[error("failed to spawn '{program}': {source}")]
    SpawnFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Waiting on the child process failed.
    #[error("failed to wait for '{program}': {source}")]
    WaitFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The child process exited unsuccessfully.
    #[error("'{program}' did not exit cleanly ({status})")]
    NonZeroExit { program: String, status: ExitStatus },

    /// The child process ran past its deadline and was killed.
    #[error("'{program}' timed out after {timeout:?}")]
    Timeout { program: String, timeout: Duration },

    /// Failure reported by a caller-supplied runner.
    #[error("{0}")]
    Custom(String),
}

impl SubprocessError {
    /// Creates an error for a caller-supplied runner.
    pub fn custom(message: impl Into<String>) -> Self {
        Self::Custom(message.into())
    }

    /// Returns the exit code if the child exited with one.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            SubprocessError::NonZeroExit { status, .. } => status.code(),
            _ => None,
        }
    }
}

/// Errors that can occur while calling a backend hook.
#[derive(Debug, Error)]
pub enum HookError {
    /// A backend path entry is absolute or escapes the source tree.
    #[error(transparent)]
    InvalidPath(#[from] InvalidPathError),

    /// A path argument could not be made absolute.
    #[error("cannot resolve path '{}': {source}", .path.display())]
    ResolvePath {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A path argument cannot be represented in JSON.
    #[error("path is not valid UTF-8: {}", .path.display())]
    NonUtf8Path { path: PathBuf },

    /// No Python interpreter could be located.
    #[error("Python interpreter not found. Install python3 or set PEP517_PYTHON")]
    PythonNotFound,

    /// The configured hook script does not exist.
    #[error("hook script not found at: {}", .path.display())]
    HookScriptNotFound { path: PathBuf },

    /// The scratch directory could not be created or populated.
    #[error("failed to prepare scratch directory: {0}")]
    ScratchDir(#[source] std::io::Error),

    /// Serializing the hook input failed.
    #[error("failed to serialize hook input: {0}")]
    SerializeInput(#[source] serde_json::Error),

    /// Writing `input.json` failed.
    #[error("failed to write hook input to {}: {source}", .path.display())]
    WriteInput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Reading `output.json` failed.
    #[error("failed to read hook output from {}: {source}", .path.display())]
    ReadOutput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// `output.json` was not valid JSON.
    #[error("failed to parse hook output from {}: {source}", .path.display())]
    ParseOutput {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// `output.json` did not match any known result shape.
    #[error("malformed hook output: {message}")]
    MalformedOutput { message: String },

    /// The hook returned a value of the wrong shape.
    #[error("hook '{hook}' returned an unexpected value: {source}")]
    UnexpectedReturn {
        hook: Hook,
        #[source]
        source: serde_json::Error,
    },

    /// The subprocess runner failed; surfaced unchanged.
    #[error(transparent)]
    Subprocess(#[from] SubprocessError),

    /// The backend cannot perform the requested operation.
    #[error("backend does not support this operation:\n{traceback}")]
    UnsupportedOperation { traceback: String },

    /// The backend could not be imported in the hook process.
    #[error("backend could not be imported:\n{traceback}")]
    BackendUnavailable { traceback: String },

    /// The backend was imported but does not satisfy the hook contract.
    #[error("backend '{backend_name}' is invalid: {message}")]
    BackendInvalid {
        backend_name: String,
        backend_path: Option<Vec<PathBuf>>,
        message: String,
    },
}

impl HookError {
    /// Returns a stable code for programmatic error handling.
    pub fn code(&self) -> &'static str {
        match self {
            HookError::InvalidPath(_) => "HOOK_001",
            HookError::ResolvePath { .. } => "HOOK_002",
            HookError::NonUtf8Path { .. } => "HOOK_003",
            HookError::PythonNotFound => "HOOK_004",
            HookError::HookScriptNotFound { .. } => "HOOK_005",
            HookError::ScratchDir(_) => "HOOK_006",
            HookError::SerializeInput(_) => "HOOK_007",
            HookError::WriteInput { .. } => "HOOK_008",
            HookError::ReadOutput { .. } => "HOOK_009",
            HookError::ParseOutput { .. } => "HOOK_010",
            HookError::MalformedOutput { .. } => "HOOK_011",
            HookError::UnexpectedReturn { .. } => "HOOK_012",
            HookError::Subprocess(_) => "HOOK_013",
            HookError::UnsupportedOperation { .. } => "HOOK_014",
            HookError::BackendUnavailable { .. } => "HOOK_015",
            HookError::BackendInvalid { .. } => "HOOK_016",
        }
    }

    /// Returns the error category for grouping related errors.
    pub fn category(&self) -> &'static str {
        "pep517"
    }

    /// Returns the backend-supplied traceback, if this error carries one.
    pub fn traceback(&self) -> Option<&str> {
        match self {
            HookError::UnsupportedOperation { traceback }
            | HookError::BackendUnavailable { traceback } => Some(traceback),
            _ => None,
        }
    }

    /// Returns true if the backend reported the operation as unsupported.
    ///
    /// Frontends use this to fall back, e.g. to building an sdist by other means.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, HookError::UnsupportedOperation { .. })
    }
}
