//! The file-based contract between the caller and the hook process.
//!
//! The caller writes `input.json` into a scratch directory, launches the hook
//! process with the hook name and that directory, and reads `output.json`
//! back once it exits.

use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::{HookError, HookResult};

/// Environment variable naming the backend to import.
pub const BUILD_BACKEND_ENV: &str = "PEP517_BUILD_BACKEND";

/// Environment variable listing extra import locations for the backend.
pub const BACKEND_PATH_ENV: &str = "PEP517_BACKEND_PATH";

/// File the caller writes before launching the hook process.
pub const INPUT_FILE: &str = "input.json";

/// File the hook process writes before exiting.
pub const OUTPUT_FILE: &str = "output.json";

/// Keyword arguments passed to a hook.
pub type HookKwargs = Map<String, Value>;

/// The backend hooks a frontend may call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hook {
    /// Lists extra requirements for building a wheel.
    GetRequiresForBuildWheel,
    /// Writes a `.dist-info` directory without building the wheel.
    PrepareMetadataForBuildWheel,
    /// Builds a wheel.
    BuildWheel,
    /// Lists extra requirements for building an sdist.
    GetRequiresForBuildSdist,
    /// Builds an sdist.
    BuildSdist,
}

impl Hook {
    /// Every hook, in declaration order.
    pub const ALL: [Hook; 5] = [
        Hook::GetRequiresForBuildWheel,
        Hook::PrepareMetadataForBuildWheel,
        Hook::BuildWheel,
        Hook::GetRequiresForBuildSdist,
        Hook::BuildSdist,
    ];

    /// Returns the name the hook process dispatches on.
    pub fn as_str(&self) -> &'static str {
        match self {
            Hook::GetRequiresForBuildWheel => "get_requires_for_build_wheel",
            Hook::PrepareMetadataForBuildWheel => "prepare_metadata_for_build_wheel",
            Hook::BuildWheel => "build_wheel",
            Hook::GetRequiresForBuildSdist => "get_requires_for_build_sdist",
            Hook::BuildSdist => "build_sdist",
        }
    }
}

impl fmt::Display for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Hook {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Hook::ALL
            .into_iter()
            .find(|hook| hook.as_str() == s)
            .ok_or_else(|| format!("unknown hook: {}", s))
    }
}

/// Contents of `input.json`.
#[derive(Debug, Serialize)]
pub struct HookInput<'a> {
    pub kwargs: &'a HookKwargs,
}

impl<'a> HookInput<'a> {
    pub fn new(kwargs: &'a HookKwargs) -> Self {
        Self { kwargs }
    }

    /// Writes the input file into `dir`.
    pub fn write_to(&self, dir: &Path) -> HookResult<()> {
        let path = dir.join(INPUT_FILE);
        let json = serde_json::to_string_pretty(self).map_err(HookError::SerializeInput)?;
        std::fs::write(&path, json).map_err(|source| HookError::WriteInput { path, source })
    }
}

/// Decoded contents of `output.json`.
#[derive(Debug, Clone, PartialEq)]
pub enum HookOutcome {
    /// The hook ran and returned a value.
    Success(Value),
    /// The backend cannot perform the operation.
    Unsupported { traceback: String },
    /// The backend could not be imported.
    BackendUnavailable { traceback: String },
    /// The backend does not satisfy the hook contract.
    BackendInvalid { message: String },
}

impl HookOutcome {
    /// Reads and decodes the output file in `dir`.
    pub fn read_from(dir: &Path) -> HookResult<Self> {
        let path = dir.join(OUTPUT_FILE);
        let content = std::fs::read_to_string(&path).map_err(|source| HookError::ReadOutput {
            path: path.clone(),
            source,
        })?;
        let value: Value = serde_json::from_str(&content)
            .map_err(|source| HookError::ParseOutput { path, source })?;
        Self::from_value(value)
    }

    /// Decodes a parsed output object.
    ///
    /// Failure markers are checked before `return_val`, in the order
    /// `unsupported`, `no_backend`, `backend_invalid`.
    pub fn from_value(value: Value) -> HookResult<Self> {
        let Value::Object(mut data) = value else {
            return Err(HookError::MalformedOutput {
                message: "expected a JSON object".to_string(),
            });
        };

        if is_set(&data, "unsupported") {
            return Ok(HookOutcome::Unsupported {
                traceback: take_text(&mut data, "traceback"),
            });
        }
        if is_set(&data, "no_backend") {
            return Ok(HookOutcome::BackendUnavailable {
                traceback: take_text(&mut data, "traceback"),
            });
        }
        if is_set(&data, "backend_invalid") {
            return Ok(HookOutcome::BackendInvalid {
                message: take_text(&mut data, "backend_error"),
            });
        }

        data.remove("return_val")
            .map(HookOutcome::Success)
            .ok_or_else(|| HookError::MalformedOutput {
                message: "missing 'return_val'".to_string(),
            })
    }
}

fn is_set(data: &Map<String, Value>, key: &str) -> bool {
    match data.get(key) {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64() != Some(0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(a)) => !a.is_empty(),
        Some(Value::Object(o)) => !o.is_empty(),
    }
}

fn take_text(data: &mut Map<String, Value>, key: &str) -> String {
    match data.remove(key) {
        Some(Value::String(s)) => s,
        None | Some(Value::Null) => String::new(),
        Some(other) => other.to_string(),
    }
}
