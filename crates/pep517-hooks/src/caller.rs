//! The hook caller bound to one source tree.

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::ffi::OsString;
use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};

use crate::config::HookCallerConfig;
use crate::error::{HookError, HookResult};
use crate::path::{absolutize, validate_backend_path};
use crate::protocol::{
    Hook, HookInput, HookKwargs, HookOutcome, BACKEND_PATH_ENV, BUILD_BACKEND_ENV,
};
use crate::runner::{DefaultRunner, ExtraEnv, SubprocessRunner};

#[cfg(windows)]
const PATH_LIST_SEPARATOR: &str = ";";
#[cfg(not(windows))]
const PATH_LIST_SEPARATOR: &str = ":";

/// Calls the hooks of one project's build backend in a subprocess.
///
/// A `HookCaller` is not meant to be shared between threads while the runner
/// is being overridden; separate callers are fully independent.
pub struct HookCaller {
    source_dir: PathBuf,
    build_backend: String,
    backend_path: Option<Vec<PathBuf>>,
    config: HookCallerConfig,
    runner: Box<dyn SubprocessRunner>,
}

impl std::fmt::Debug for HookCaller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookCaller")
            .field("source_dir", &self.source_dir)
            .field("build_backend", &self.build_backend)
            .field("backend_path", &self.backend_path)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl HookCaller {
    /// Creates a caller for the project in `source_dir`.
    ///
    /// `build_backend` is the backend's import spec (`module` or
    /// `module:object`). Each `backend_path` entry must be relative and stay
    /// inside `source_dir`; an empty list is treated as no backend path.
    pub fn new(
        source_dir: impl AsRef<Path>,
        build_backend: impl Into<String>,
        backend_path: Option<&[PathBuf]>,
    ) -> HookResult<Self> {
        let source_dir = resolve(source_dir.as_ref())?;
        let backend_path = match backend_path {
            Some(entries) if !entries.is_empty() => Some(
                entries
                    .iter()
                    .map(|entry| backend_path_entry(&source_dir, entry))
                    .collect::<HookResult<Vec<_>>>()?,
            ),
            _ => None,
        };

        Ok(Self {
            source_dir,
            build_backend: build_backend.into(),
            backend_path,
            config: HookCallerConfig::default(),
            runner: Box::new(DefaultRunner),
        })
    }

    /// Sets the launch configuration.
    pub fn with_config(mut self, config: HookCallerConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the subprocess runner for the lifetime of this caller.
    pub fn with_subprocess_runner(mut self, runner: impl SubprocessRunner + 'static) -> Self {
        self.runner = Box::new(runner);
        self
    }

    /// Installs `runner` until the returned guard is dropped.
    ///
    /// Hooks called through the guard use `runner`; the previous runner is
    /// restored when the guard goes out of scope, including during unwinding.
    pub fn subprocess_runner(
        &mut self,
        runner: impl SubprocessRunner + 'static,
    ) -> RunnerOverride<'_> {
        let previous = std::mem::replace(&mut self.runner, Box::new(runner));
        tracing::debug!(source_dir = %self.source_dir.display(), "Subprocess runner overridden");
        RunnerOverride {
            caller: self,
            previous: Some(previous),
        }
    }

    /// Returns the absolute source directory.
    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    /// Returns the backend import spec.
    pub fn build_backend(&self) -> &str {
        &self.build_backend
    }

    /// Returns the validated, absolute backend path entries.
    pub fn backend_path(&self) -> Option<&[PathBuf]> {
        self.backend_path.as_deref()
    }

    /// Returns the launch configuration.
    pub fn config(&self) -> &HookCallerConfig {
        &self.config
    }

    /// Lists extra requirements for building a wheel, e.g. `["wheel >= 0.25"]`.
    ///
    /// Requirements declared statically in the project are not included.
    pub fn get_requires_for_build_wheel(
        &self,
        config_settings: Option<&Value>,
    ) -> HookResult<Vec<String>> {
        let mut kwargs = HookKwargs::new();
        kwargs.insert("config_settings".into(), settings(config_settings));
        self.call_typed(Hook::GetRequiresForBuildWheel, kwargs)
    }

    /// Writes a `.dist-info` directory into `metadata_directory`.
    ///
    /// Returns the name of the created directory.
    pub fn prepare_metadata_for_build_wheel(
        &self,
        metadata_directory: &Path,
        config_settings: Option<&Value>,
    ) -> HookResult<String> {
        let mut kwargs = HookKwargs::new();
        kwargs.insert("metadata_directory".into(), path_arg(metadata_directory)?);
        kwargs.insert("config_settings".into(), settings(config_settings));
        self.call_typed(Hook::PrepareMetadataForBuildWheel, kwargs)
    }

    /// Builds a wheel into `wheel_directory` and returns its file name.
    ///
    /// Passing the `metadata_directory` of an earlier
    /// [`prepare_metadata_for_build_wheel`](Self::prepare_metadata_for_build_wheel)
    /// call lets the backend reuse that work.
    pub fn build_wheel(
        &self,
        wheel_directory: &Path,
        config_settings: Option<&Value>,
        metadata_directory: Option<&Path>,
    ) -> HookResult<String> {
        let metadata_directory = match metadata_directory {
            Some(dir) => path_arg(dir)?,
            None => Value::Null,
        };
        let mut kwargs = HookKwargs::new();
        kwargs.insert("wheel_directory".into(), path_arg(wheel_directory)?);
        kwargs.insert("config_settings".into(), settings(config_settings));
        kwargs.insert("metadata_directory".into(), metadata_directory);
        self.call_typed(Hook::BuildWheel, kwargs)
    }

    /// Lists extra requirements for building an sdist, e.g. `["setuptools >= 26"]`.
    pub fn get_requires_for_build_sdist(
        &self,
        config_settings: Option<&Value>,
    ) -> HookResult<Vec<String>> {
        let mut kwargs = HookKwargs::new();
        kwargs.insert("config_settings".into(), settings(config_settings));
        self.call_typed(Hook::GetRequiresForBuildSdist, kwargs)
    }

    /// Builds an sdist into `sdist_directory` and returns its file name.
    ///
    /// Fails with [`HookError::UnsupportedOperation`] if the backend cannot.
    pub fn build_sdist(
        &self,
        sdist_directory: &Path,
        config_settings: Option<&Value>,
    ) -> HookResult<String> {
        let mut kwargs = HookKwargs::new();
        kwargs.insert("sdist_directory".into(), path_arg(sdist_directory)?);
        kwargs.insert("config_settings".into(), settings(config_settings));
        self.call_typed(Hook::BuildSdist, kwargs)
    }

    fn call_typed<T: DeserializeOwned>(&self, hook: Hook, kwargs: HookKwargs) -> HookResult<T> {
        let value = self.call_hook(hook, kwargs)?;
        serde_json::from_value(value).map_err(|source| HookError::UnexpectedReturn { hook, source })
    }

    /// Environment entries identifying the backend to the hook process.
    pub fn hook_environment(&self) -> ExtraEnv {
        let mut env = ExtraEnv::new();
        env.insert(BUILD_BACKEND_ENV.to_string(), self.build_backend.clone());
        if let Some(ref entries) = self.backend_path {
            let joined = entries
                .iter()
                .filter_map(|p| p.to_str())
                .collect::<Vec<_>>()
                .join(PATH_LIST_SEPARATOR);
            env.insert(BACKEND_PATH_ENV.to_string(), joined);
        }
        env
    }

    /// Runs `hook` in a subprocess and returns its raw return value.
    ///
    /// A fresh scratch directory holds `input.json` and `output.json` for the
    /// call and is removed before this returns, whatever the outcome.
    pub fn call_hook(&self, hook: Hook, kwargs: HookKwargs) -> HookResult<Value> {
        let extra_env = self.hook_environment();
        let python = self.config.find_python()?;

        let scratch = tempfile::Builder::new()
            .prefix("pep517-")
            .tempdir()
            .map_err(HookError::ScratchDir)?;
        let script = self.config.resolve_hook_script(scratch.path())?;
        HookInput::new(&kwargs).write_to(scratch.path())?;

        let cmd: Vec<OsString> = vec![
            python.into_os_string(),
            script.into_os_string(),
            hook.as_str().into(),
            scratch.path().as_os_str().to_owned(),
        ];

        tracing::debug!(
            hook = %hook,
            backend = %self.build_backend,
            scratch = %scratch.path().display(),
            "Dispatching backend hook"
        );
        self.runner.run(&cmd, &self.source_dir, &extra_env)?;

        let outcome = HookOutcome::read_from(scratch.path())?;
        tracing::debug!(hook = %hook, outcome = outcome_kind(&outcome), "Backend hook returned");

        match outcome {
            HookOutcome::Success(value) => Ok(value),
            HookOutcome::Unsupported { traceback } => {
                Err(HookError::UnsupportedOperation { traceback })
            }
            HookOutcome::BackendUnavailable { traceback } => {
                Err(HookError::BackendUnavailable { traceback })
            }
            HookOutcome::BackendInvalid { message } => Err(HookError::BackendInvalid {
                backend_name: self.build_backend.clone(),
                backend_path: self.backend_path.clone(),
                message,
            }),
        }
    }
}

/// Guard returned by [`HookCaller::subprocess_runner`].
///
/// Dereferences to the caller; restores the previous runner on drop.
pub struct RunnerOverride<'a> {
    caller: &'a mut HookCaller,
    previous: Option<Box<dyn SubprocessRunner>>,
}

impl Deref for RunnerOverride<'_> {
    type Target = HookCaller;

    fn deref(&self) -> &HookCaller {
        &*self.caller
    }
}

impl DerefMut for RunnerOverride<'_> {
    fn deref_mut(&mut self) -> &mut HookCaller {
        &mut *self.caller
    }
}

impl Drop for RunnerOverride<'_> {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            self.caller.runner = previous;
            tracing::debug!(
                source_dir = %self.caller.source_dir.display(),
                "Subprocess runner restored"
            );
        }
    }
}

fn outcome_kind(outcome: &HookOutcome) -> &'static str {
    match outcome {
        HookOutcome::Success(_) => "success",
        HookOutcome::Unsupported { .. } => "unsupported",
        HookOutcome::BackendUnavailable { .. } => "no_backend",
        HookOutcome::BackendInvalid { .. } => "backend_invalid",
    }
}

fn resolve(path: &Path) -> HookResult<PathBuf> {
    absolutize(path).map_err(|source| HookError::ResolvePath {
        path: path.to_path_buf(),
        source,
    })
}

/// Validates one backend-path entry. Entries travel through the environment
/// as text, so they must be valid UTF-8.
fn backend_path_entry(source_dir: &Path, entry: &Path) -> HookResult<PathBuf> {
    let path = validate_backend_path(source_dir, entry)?;
    if path.to_str().is_none() {
        return Err(HookError::NonUtf8Path { path });
    }
    Ok(path)
}

fn path_arg(path: &Path) -> HookResult<Value> {
    let abs = resolve(path)?;
    match abs.to_str() {
        Some(s) => Ok(Value::String(s.to_string())),
        None => Err(HookError::NonUtf8Path { path: abs }),
    }
}

fn settings(config_settings: Option<&Value>) -> Value {
    config_settings.cloned().unwrap_or(Value::Null)
}
