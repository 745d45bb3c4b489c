//! Hook command implementations
//!
//! Each command builds a [`HookCaller`] from the shared backend options, calls
//! one hook and reports the result.

use anyhow::{bail, Context, Result};
use colored::Colorize;
use pep517_hooks::{Hook, HookCaller, HookCallerConfig, HookError, TimeoutRunner};
use serde_json::{json, Value};
use std::path::Path;
use std::process::ExitCode;

use crate::cli_args::{BackendArgs, BuildTarget};

/// Run the requires command
pub fn requires(target: BuildTarget, args: &BackendArgs) -> Result<ExitCode> {
    let caller = build_caller(args)?;
    let settings = parse_config_settings(args.config_settings.as_deref())?;

    let (hook, result) = match target {
        BuildTarget::Wheel => (
            Hook::GetRequiresForBuildWheel,
            caller.get_requires_for_build_wheel(settings.as_ref()),
        ),
        BuildTarget::Sdist => (
            Hook::GetRequiresForBuildSdist,
            caller.get_requires_for_build_sdist(settings.as_ref()),
        ),
    };

    report(hook, args.json, result, |requires| {
        if requires.is_empty() {
            println!("{}", "No extra requirements".dimmed());
        }
        for requirement in requires {
            println!("  {} {}", "->".green(), requirement);
        }
    })
}

/// Run the metadata command
pub fn metadata(out: &Path, args: &BackendArgs) -> Result<ExitCode> {
    let caller = build_caller(args)?;
    let settings = parse_config_settings(args.config_settings.as_deref())?;
    ensure_dir(out)?;

    let result = caller.prepare_metadata_for_build_wheel(out, settings.as_ref());
    report(Hook::PrepareMetadataForBuildWheel, args.json, result, |name| {
        println!("{} {}", "Metadata:".green().bold(), out.join(name).display());
    })
}

/// Run the wheel command
pub fn wheel(out: &Path, metadata_dir: Option<&Path>, args: &BackendArgs) -> Result<ExitCode> {
    let caller = build_caller(args)?;
    let settings = parse_config_settings(args.config_settings.as_deref())?;
    ensure_dir(out)?;

    let result = caller.build_wheel(out, settings.as_ref(), metadata_dir);
    report(Hook::BuildWheel, args.json, result, |name| {
        println!("{} {}", "Built:".green().bold(), out.join(name).display());
    })
}

/// Run the sdist command
pub fn sdist(out: &Path, args: &BackendArgs) -> Result<ExitCode> {
    let caller = build_caller(args)?;
    let settings = parse_config_settings(args.config_settings.as_deref())?;
    ensure_dir(out)?;

    let result = caller.build_sdist(out, settings.as_ref());
    report(Hook::BuildSdist, args.json, result, |name| {
        println!("{} {}", "Built:".green().bold(), out.join(name).display());
    })
}

/// Builds a caller from the shared options.
pub(crate) fn build_caller(args: &BackendArgs) -> Result<HookCaller> {
    let backend_path = (!args.backend_path.is_empty()).then_some(args.backend_path.as_slice());
    let mut config = HookCallerConfig::default();
    if let Some(ref python) = args.python {
        config = config.python(python);
    }

    let caller = HookCaller::new(&args.source_dir, args.backend.as_str(), backend_path)
        .with_context(|| format!("Invalid backend configuration for {}", args.backend))?
        .with_config(config);

    Ok(match args.timeout {
        Some(secs) => caller.with_subprocess_runner(TimeoutRunner::from_secs(secs)),
        None => caller,
    })
}

/// Parses `--config-settings`, which must be a JSON object.
pub(crate) fn parse_config_settings(raw: Option<&str>) -> Result<Option<Value>> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let value: Value = serde_json::from_str(raw).context("Failed to parse --config-settings")?;
    if !value.is_object() {
        bail!("--config-settings must be a JSON object, got: {}", raw);
    }
    Ok(Some(value))
}

fn ensure_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory: {}", dir.display()))
}

fn report<T: serde::Serialize>(
    hook: Hook,
    json_output: bool,
    result: Result<T, HookError>,
    print_human: impl FnOnce(&T),
) -> Result<ExitCode> {
    if json_output {
        let output = match &result {
            Ok(value) => json!({"hook": hook.as_str(), "ok": true, "result": value}),
            Err(err) => json!({
                "hook": hook.as_str(),
                "ok": false,
                "error": {
                    "code": err.code(),
                    "message": err.to_string(),
                    "traceback": err.traceback(),
                }
            }),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(if result.is_ok() {
            ExitCode::SUCCESS
        } else {
            ExitCode::from(1)
        });
    }

    println!("{} {}", "Hook:".cyan().bold(), hook);
    match result {
        Ok(value) => {
            print_human(&value);
            Ok(ExitCode::SUCCESS)
        }
        Err(err) if err.is_unsupported() => {
            println!("{} backend does not support {}", "!!".yellow(), hook);
            if let Some(traceback) = err.traceback().filter(|t| !t.is_empty()) {
                println!("{}", traceback.dimmed());
            }
            Ok(ExitCode::from(2))
        }
        Err(err) => Err(err).with_context(|| format!("Hook {} failed", hook)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn backend_args(source_dir: &str, backend_path: &[&str]) -> BackendArgs {
        BackendArgs {
            source_dir: PathBuf::from(source_dir),
            backend: "flit_core.buildapi".to_string(),
            backend_path: backend_path.iter().map(PathBuf::from).collect(),
            config_settings: None,
            python: Some(PathBuf::from("python3")),
            timeout: None,
            json: false,
        }
    }

    #[test]
    fn test_parse_config_settings() {
        assert_eq!(parse_config_settings(None).unwrap(), None);
        assert_eq!(
            parse_config_settings(Some(r#"{"--global-option": ["--quiet"]}"#)).unwrap(),
            Some(json!({"--global-option": ["--quiet"]}))
        );
        assert!(parse_config_settings(Some("[1, 2]")).is_err());
        assert!(parse_config_settings(Some("{not json")).is_err());
    }

    #[test]
    fn test_build_caller_validates_backend_path() {
        let caller = build_caller(&backend_args(".", &["backend"])).unwrap();
        assert_eq!(caller.backend_path().unwrap().len(), 1);
        assert_eq!(caller.config().python, Some(PathBuf::from("python3")));

        let err = build_caller(&backend_args(".", &["../elsewhere"])).unwrap_err();
        assert!(err.to_string().contains("Invalid backend configuration"));
    }

    #[test]
    fn test_build_caller_without_backend_path() {
        let caller = build_caller(&backend_args(".", &[])).unwrap();
        assert!(caller.backend_path().is_none());
        assert_eq!(caller.build_backend(), "flit_core.buildapi");
    }
}
