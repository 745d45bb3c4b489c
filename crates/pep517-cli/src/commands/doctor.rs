//! Doctor command implementation
//!
//! Checks that hook processes can be launched.

use anyhow::Result;
use colored::Colorize;
use pep517_hooks::config::{HOOK_SCRIPT_ENV, PYTHON_ENV};
use pep517_hooks::HookCallerConfig;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitCode};

/// Run the doctor command
///
/// Checks:
/// - Python interpreter resolution
/// - Hook script override, if any
///
/// # Returns
/// Exit code: 0 if all checks pass, 1 if any fail
pub fn run(python: Option<&Path>) -> Result<ExitCode> {
    println!("{}", "pep517 Doctor".cyan().bold());
    println!("{}", "=============".cyan());
    println!();

    let mut all_ok = true;

    println!("{}", "Versions:".bold());
    println!("  {} pep517 v{}", "->".green(), env!("CARGO_PKG_VERSION"));
    println!();

    println!("{}", "Dependencies:".bold());
    let mut config = HookCallerConfig::default();
    if let Some(python) = python {
        config = config.python(python);
    }

    match config.find_python() {
        Ok(path) => match python_version(&path) {
            Some(version) => {
                println!("  {} {} ({})", "ok".green(), version, path.display());
            }
            None => {
                println!("  {} {} does not run", "!!".red(), path.display());
                all_ok = false;
            }
        },
        Err(e) => {
            println!("  {} {}", "!!".red(), e);
            println!(
                "     {}",
                format!("Set {} or put python3 on PATH.", PYTHON_ENV).dimmed()
            );
            all_ok = false;
        }
    }

    match hook_script_override() {
        Some(script) => {
            if script.is_file() {
                println!("  {} hook script {}", "ok".green(), script.display());
            } else {
                println!(
                    "  {} {} points to a missing file: {}",
                    "!!".red(),
                    HOOK_SCRIPT_ENV,
                    script.display()
                );
                all_ok = false;
            }
        }
        None => println!("  {} hook script (embedded)", "ok".green()),
    }

    println!();
    if all_ok {
        println!("{}", "All checks passed.".green().bold());
        Ok(ExitCode::SUCCESS)
    } else {
        println!("{}", "Some checks failed.".red().bold());
        Ok(ExitCode::from(1))
    }
}

/// Hook script named by the environment. An empty value counts as unset,
/// matching how the hook caller resolves it.
fn hook_script_override() -> Option<PathBuf> {
    std::env::var_os(HOOK_SCRIPT_ENV)
        .filter(|p| !p.is_empty())
        .map(PathBuf::from)
}

fn python_version(python: &Path) -> Option<String> {
    let output = Command::new(python).arg("--version").output().ok()?;
    if !output.status.success() {
        return None;
    }
    // Python 2 printed its version to stderr.
    let text = if output.stdout.is_empty() {
        output.stderr
    } else {
        output.stdout
    };
    Some(String::from_utf8_lossy(&text).trim().to_string())
}
