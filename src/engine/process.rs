//! External-process primitive.
//!
//! Jobs build a `ToolCommand` (program path + raw argument vector) and hand
//! it to a `CommandRunner`. Spawning always passes the token vector directly
//! to the OS; the shell-quoted string exists only for logging and is never
//! re-parsed or executed.

use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::info;

/// One external-tool invocation: executable path plus argument vector.
#[derive(Debug, Clone)]
pub struct ToolCommand {
    program: PathBuf,
    args: Vec<String>,
}

impl ToolCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I>(mut self, args: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn argv(&self) -> &[String] {
        &self.args
    }

    /// Shell-quoted rendering for logs. Tokens containing whitespace or
    /// single quotes are wrapped in double quotes. Embedded double quotes
    /// are NOT escaped: this string is for human eyes, not for a shell.
    pub fn display(&self) -> String {
        let mut out = self.program.display().to_string();
        for arg in &self.args {
            out.push(' ');
            if arg.contains(char::is_whitespace) || arg.contains('\'') {
                out.push('"');
                out.push_str(arg);
                out.push('"');
            } else {
                out.push_str(arg);
            }
        }
        out
    }

    fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }
}

/// Spawn-and-wait seam consumed by the jobs. The production implementation
/// is `SystemRunner`; tests substitute scripted runners.
pub trait CommandRunner {
    /// Run to completion; non-zero exit is an error.
    fn run(&self, cmd: &ToolCommand) -> Result<()>;

    /// Run to completion and return captured stdout; non-zero exit is an
    /// error.
    fn capture(&self, cmd: &ToolCommand) -> Result<String>;
}

/// Blocking runner over `std::process::Command`.
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, cmd: &ToolCommand) -> Result<()> {
        info!("running: {}", cmd.display());

        let status = cmd
            .to_command()
            .status()
            .with_context(|| format!("failed to spawn {}", cmd.program.display()))?;

        if !status.success() {
            bail!("{} exited with {}", cmd.program.display(), status);
        }
        Ok(())
    }

    fn capture(&self, cmd: &ToolCommand) -> Result<String> {
        info!("running: {}", cmd.display());

        let output = cmd
            .to_command()
            .output()
            .with_context(|| format!("failed to spawn {}", cmd.program.display()))?;

        if !output.status.success() {
            bail!(
                "{} exited with {}: {}",
                cmd.program.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
