//! Subprocess runner strategies.
//!
//! The hook caller never spawns processes itself; it hands the command line,
//! working directory and extra environment to a [`SubprocessRunner`]. Frontends
//! substitute their own strategy to redirect output, sandbox the backend or add
//! a deadline.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::Path;
use std::process::{Child, Command, ExitStatus};
use std::time::{Duration, Instant};

use crate::error::SubprocessError;

/// Environment entries laid over the parent environment for the child.
pub type ExtraEnv = BTreeMap<String, String>;

/// Launches a hook process and waits for it to finish.
pub trait SubprocessRunner: Send + Sync {
    /// Runs `cmd` in `cwd` with `extra_env` overlaid on the current environment.
    ///
    /// Returns an error if the process cannot be launched or exits unsuccessfully.
    fn run(
        &self,
        cmd: &[OsString],
        cwd: &Path,
        extra_env: &ExtraEnv,
    ) -> Result<(), SubprocessError>;
}

impl<F> SubprocessRunner for F
where
    F: Fn(&[OsString], &Path, &ExtraEnv) -> Result<(), SubprocessError> + Send + Sync,
{
    fn run(
        &self,
        cmd: &[OsString],
        cwd: &Path,
        extra_env: &ExtraEnv,
    ) -> Result<(), SubprocessError> {
        self(cmd, cwd, extra_env)
    }
}

/// Copies the current process environment and overlays `extra_env` on it.
///
/// The parent environment is left untouched.
pub fn merged_environment(extra_env: &ExtraEnv) -> BTreeMap<OsString, OsString> {
    let mut env: BTreeMap<OsString, OsString> = std::env::vars_os().collect();
    for (key, value) in extra_env {
        env.insert(OsString::from(key), OsString::from(value));
    }
    env
}

fn build_command(
    cmd: &[OsString],
    cwd: &Path,
    extra_env: &ExtraEnv,
) -> Result<Command, SubprocessError> {
    let (program, args) = cmd.split_first().ok_or(SubprocessError::EmptyCommand)?;
    let mut command = Command::new(program);
    command
        .args(args)
        .current_dir(cwd)
        .env_clear()
        .envs(merged_environment(extra_env));
    Ok(command)
}

fn program_name(cmd: &[OsString]) -> String {
    cmd.first()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn check_status(program: String, status: ExitStatus) -> Result<(), SubprocessError> {
    if status.success() {
        Ok(())
    } else {
        Err(SubprocessError::NonZeroExit { program, status })
    }
}

/// Runs the hook process to completion with inherited stdio.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultRunner;

impl SubprocessRunner for DefaultRunner {
    fn run(
        &self,
        cmd: &[OsString],
        cwd: &Path,
        extra_env: &ExtraEnv,
    ) -> Result<(), SubprocessError> {
        let mut command = build_command(cmd, cwd, extra_env)?;
        let program = program_name(cmd);
        let status = command.status().map_err(|source| SubprocessError::SpawnFailed {
            program: program.clone(),
            source,
        })?;
        check_status(program, status)
    }
}

/// Runs the hook process with a deadline, killing it when the deadline passes.
#[derive(Debug, Clone, Copy)]
pub struct TimeoutRunner {
    timeout: Duration,
    poll_interval: Duration,
}

impl TimeoutRunner {
    /// Creates a runner that allows the hook process `timeout` to finish.
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            poll_interval: Duration::from_millis(50),
        }
    }

    /// Creates a runner with a timeout in seconds.
    pub fn from_secs(secs: u64) -> Self {
        Self::new(Duration::from_secs(secs))
    }

    /// Sets how often the child is polled.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Returns the configured timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn wait(&self, mut child: Child, program: String) -> Result<ExitStatus, SubprocessError> {
        let start = Instant::now();
        loop {
            match child.try_wait() {
                Ok(Some(status)) => return Ok(status),
                Ok(None) => {
                    if start.elapsed() > self.timeout {
                        let _ = child.kill();
                        let _ = child.wait();
                        return Err(SubprocessError::Timeout {
                            program,
                            timeout: self.timeout,
                        });
                    }
                    std::thread::sleep(self.poll_interval);
                }
                Err(source) => return Err(SubprocessError::WaitFailed { program, source }),
            }
        }
    }
}

impl SubprocessRunner for TimeoutRunner {
    fn run(
        &self,
        cmd: &[OsString],
        cwd: &Path,
        extra_env: &ExtraEnv,
    ) -> Result<(), SubprocessError> {
        let mut command = build_command(cmd, cwd, extra_env)?;
        let program = program_name(cmd);
        let child = command.spawn().map_err(|source| SubprocessError::SpawnFailed {
            program: program.clone(),
            source,
        })?;
        let status = self.wait(child, program.clone())?;
        check_status(program, status)
    }
}
