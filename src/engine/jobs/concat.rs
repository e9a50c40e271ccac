//! Lossless concatenation via mkvmerge append.
//!
//! mkvmerge stitches the inputs without re-encoding, which only produces a
//! playable file when every input shares compatible codec and stream
//! parameters. That compatibility is NOT validated here — mkvmerge itself
//! rejects hopeless combinations, but subtle mismatches (different encoder
//! settings, frame rates) can survive the merge. Known limitation.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::info;
use uuid::Uuid;

use super::ConfigError;
use crate::engine::process::{CommandRunner, ToolCommand};
use crate::engine::tools::Toolchain;

/// Merge two or more files into one, stream-copied.
#[derive(Debug, Clone)]
pub struct ConcatJob {
    pub id: Uuid,
    pub inputs: Vec<PathBuf>,
    pub output: PathBuf,
}

impl ConcatJob {
    pub fn builder() -> ConcatBuilder {
        ConcatBuilder::default()
    }

    /// mkvmerge argument vector: `-o <output> <in1> + <in2> + ...`.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        args.push("-o".to_string());
        args.push(self.output.display().to_string());

        for (i, input) in self.inputs.iter().enumerate() {
            if i > 0 {
                args.push("+".to_string());
            }
            args.push(input.display().to_string());
        }
        args
    }

    /// Log rendering with every path quoted, whether or not it contains
    /// whitespace.
    pub fn command_string(&self, mkvmerge: &Path) -> String {
        let mut out = format!("{} -o \"{}\"", mkvmerge.display(), self.output.display());
        for (i, input) in self.inputs.iter().enumerate() {
            if i > 0 {
                out.push_str(" +");
            }
            out.push_str(&format!(" \"{}\"", input.display()));
        }
        out
    }

    pub fn execute(&self, tools: &Toolchain, runner: &dyn CommandRunner) -> Result<()> {
        for input in &self.inputs {
            if !input.exists() {
                anyhow::bail!("input file does not exist: {}", input.display());
            }
        }

        info!(job_id = %self.id, "concat command: {}", self.command_string(&tools.mkvmerge));

        let cmd = ToolCommand::new(&tools.mkvmerge).args(self.build_args());
        runner
            .run(&cmd)
            .with_context(|| format!("concatenation into {} failed", self.output.display()))
    }
}

#[derive(Debug, Default, Clone)]
pub struct ConcatBuilder {
    inputs: Vec<PathBuf>,
    output: PathBuf,
}

impl ConcatBuilder {
    pub fn add_input(mut self, path: impl Into<PathBuf>) -> Self {
        self.inputs.push(path.into());
        self
    }

    pub fn inputs<I>(mut self, paths: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<PathBuf>,
    {
        self.inputs.extend(paths.into_iter().map(Into::into));
        self
    }

    pub fn output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output = path.into();
        self
    }

    pub fn build(self) -> Result<ConcatJob, ConfigError> {
        if self.inputs.len() < 2 {
            return Err(ConfigError::NotEnoughInputs(self.inputs.len()));
        }
        if self.output.as_os_str().is_empty() {
            return Err(ConfigError::MissingOutput);
        }

        Ok(ConcatJob {
            id: Uuid::new_v4(),
            inputs: self.inputs,
            output: self.output,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fewer_than_two_inputs_is_rejected() {
        let err = ConcatJob::builder()
            .add_input("a.mkv")
            .output("out.mkv")
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::NotEnoughInputs(1));

        let err = ConcatJob::builder().output("out.mkv").build().unwrap_err();
        assert_eq!(err, ConfigError::NotEnoughInputs(0));
    }

    #[test]
    fn two_inputs_build_the_append_argv() {
        let job = ConcatJob::builder()
            .add_input("a.mkv")
            .add_input("b.mkv")
            .output("out.mkv")
            .build()
            .unwrap();
        assert_eq!(job.build_args(), vec!["-o", "out.mkv", "a.mkv", "+", "b.mkv"]);
    }

    #[test]
    fn command_string_always_quotes_paths() {
        let job = ConcatJob::builder()
            .add_input("a.mkv")
            .add_input("b.mkv")
            .output("out.mkv")
            .build()
            .unwrap();
        assert_eq!(
            job.command_string(Path::new("mkvmerge")),
            "mkvmerge -o \"out.mkv\" \"a.mkv\" + \"b.mkv\""
        );
    }

    #[test]
    fn many_inputs_are_joined_with_plus() {
        let job = ConcatJob::builder()
            .inputs(["a.mkv", "b.mkv", "c.mkv", "d.mkv"])
            .output("out.mkv")
            .build()
            .unwrap();
        let args = job.build_args();
        assert_eq!(
            args,
            vec!["-o", "out.mkv", "a.mkv", "+", "b.mkv", "+", "c.mkv", "+", "d.mkv"]
        );
    }
}
