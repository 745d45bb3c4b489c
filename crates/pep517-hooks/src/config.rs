//! Interpreter and hook-script resolution.

use std::path::{Path, PathBuf};

use crate::error::{HookError, HookResult};

/// Environment variable overriding the Python interpreter.
pub const PYTHON_ENV: &str = "PEP517_PYTHON";

/// Environment variable overriding the hook script location.
pub const HOOK_SCRIPT_ENV: &str = "PEP517_HOOK_SCRIPT";

/// File name the embedded hook script is written under.
pub const HOOK_SCRIPT_NAME: &str = "hook_host.py";

/// The in-process entry script, run by the interpreter in the hook process.
pub const EMBEDDED_HOOK_SCRIPT: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/python/hook_host.py"));

/// Configuration for how hook processes are launched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HookCallerConfig {
    /// Interpreter used to run the hook script. Used verbatim when set.
    pub python: Option<PathBuf>,
    /// Hook script to run instead of the embedded one.
    pub hook_script: Option<PathBuf>,
}

impl HookCallerConfig {
    /// Sets the Python interpreter.
    pub fn python(mut self, python: impl Into<PathBuf>) -> Self {
        self.python = Some(python.into());
        self
    }

    /// Sets the hook script path.
    pub fn hook_script(mut self, path: impl Into<PathBuf>) -> Self {
        self.hook_script = Some(path.into());
        self
    }

    /// Finds the Python interpreter.
    ///
    /// Checks the config, then `PEP517_PYTHON`, then `python3` and `python` on `PATH`.
    pub fn find_python(&self) -> HookResult<PathBuf> {
        if let Some(ref python) = self.python {
            return Ok(python.clone());
        }

        if let Some(python) = std::env::var_os(PYTHON_ENV).filter(|p| !p.is_empty()) {
            return Ok(PathBuf::from(python));
        }

        let names = if cfg!(windows) {
            vec!["python.exe", "python3.exe", "python"]
        } else {
            vec!["python3", "python"]
        };

        for name in names {
            if let Ok(path) = which::which(name) {
                return Ok(path);
            }
        }

        Err(HookError::PythonNotFound)
    }

    /// Resolves the hook script for one call.
    ///
    /// Without an override the embedded script is written into `scratch_dir`,
    /// so it is removed along with it.
    pub fn resolve_hook_script(&self, scratch_dir: &Path) -> HookResult<PathBuf> {
        if let Some(ref path) = self.hook_script {
            return existing_script(path.clone());
        }

        if let Some(path) = std::env::var_os(HOOK_SCRIPT_ENV).filter(|p| !p.is_empty()) {
            return existing_script(PathBuf::from(path));
        }

        let path = scratch_dir.join(HOOK_SCRIPT_NAME);
        std::fs::write(&path, EMBEDDED_HOOK_SCRIPT).map_err(HookError::ScratchDir)?;
        Ok(path)
    }
}

fn existing_script(path: PathBuf) -> HookResult<PathBuf> {
    if path.is_file() {
        Ok(path)
    } else {
        Err(HookError::HookScriptNotFound { path })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serial_test::serial;

    #[test]
    fn test_config_builder() {
        let config = HookCallerConfig::default()
            .python("/opt/python/bin/python3")
            .hook_script("custom/hook.py");

        assert_eq!(config.python, Some(PathBuf::from("/opt/python/bin/python3")));
        assert_eq!(config.hook_script, Some(PathBuf::from("custom/hook.py")));
    }

    #[test]
    fn test_configured_python_used_verbatim() {
        let config = HookCallerConfig::default().python("python3.12");
        assert_eq!(config.find_python().unwrap(), PathBuf::from("python3.12"));
    }

    #[test]
    #[serial]
    fn test_python_from_environment() {
        std::env::set_var(PYTHON_ENV, "/custom/python");
        let found = HookCallerConfig::default().find_python();
        std::env::remove_var(PYTHON_ENV);
        assert_eq!(found.unwrap(), PathBuf::from("/custom/python"));
    }

    #[test]
    #[serial]
    fn test_embedded_script_written_to_scratch_dir() {
        let scratch = tempfile::tempdir().unwrap();
        let path = HookCallerConfig::default()
            .resolve_hook_script(scratch.path())
            .unwrap();

        assert_eq!(path, scratch.path().join(HOOK_SCRIPT_NAME));
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("PEP517_BUILD_BACKEND"));
    }

    #[test]
    fn test_missing_configured_script() {
        let scratch = tempfile::tempdir().unwrap();
        let err = HookCallerConfig::default()
            .hook_script(scratch.path().join("missing.py"))
            .resolve_hook_script(scratch.path())
            .unwrap_err();
        assert!(matches!(err, HookError::HookScriptNotFound { .. }));
    }

    #[test]
    #[serial]
    fn test_script_from_environment() {
        let scratch = tempfile::tempdir().unwrap();
        let script = scratch.path().join("host.py");
        std::fs::write(&script, "print('hi')").unwrap();

        std::env::set_var(HOOK_SCRIPT_ENV, &script);
        let resolved = HookCallerConfig::default().resolve_hook_script(scratch.path());
        std::env::remove_var(HOOK_SCRIPT_ENV);

        assert_eq!(resolved.unwrap(), script);
        assert!(!scratch.path().join(HOOK_SCRIPT_NAME).exists());
    }
}
