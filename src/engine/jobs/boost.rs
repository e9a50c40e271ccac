//! SVT-AV1 encoding through the external Auto-Boost script.
//!
//! Four strictly gated steps: extract the audio verbatim, hand the source to
//! the booster (which writes a video-only `.ivf` next to it), remux video
//! and audio with mkvmerge, then best-effort cleanup of the booster's
//! working directory. Every intermediate lands next to the source file, not
//! inside the working directory — the booster overwrites that directory and
//! would eat them.
//!
//! Cleanup never changes the job verdict. After a failed step the
//! intermediates are deliberately left on disk for diagnosis.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use super::ConfigError;
use crate::engine::process::{CommandRunner, ToolCommand};
use crate::engine::tools::Toolchain;

/// Booster quality tier. The booster derives its own CRF ladder from this;
/// there is no numeric quality knob.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoostQuality {
    Low,
    Medium,
    High,
}

impl Default for BoostQuality {
    fn default() -> Self {
        BoostQuality::High
    }
}

impl BoostQuality {
    pub fn as_str(&self) -> &'static str {
        match self {
            BoostQuality::Low => "low",
            BoostQuality::Medium => "medium",
            BoostQuality::High => "high",
        }
    }
}

/// Pipeline failure, tagged with the step that failed.
#[derive(Debug, Error)]
pub enum BoostError {
    #[error("input file does not exist: {0}")]
    InputMissing(PathBuf),

    #[error("could not create output directory {path}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not create working directory {path}")]
    WorkDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("audio extraction failed")]
    AudioExtraction(#[source] anyhow::Error),

    #[error("booster encoding failed")]
    Booster(#[source] anyhow::Error),

    /// The booster exited 0 but the expected file never appeared. Distinct
    /// from a non-zero exit so a silently misbehaving tool can't push a
    /// broken stream into the mux step.
    #[error("booster exited cleanly but produced no output at {0}")]
    BoosterOutputMissing(PathBuf),

    #[error("muxing failed")]
    Mux(#[source] anyhow::Error),

    #[error("could not copy merged file to {path}")]
    FinalCopy {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// The SVT-AV1-Essential encode pipeline.
#[derive(Debug, Clone)]
pub struct Av1BoostJob {
    pub id: Uuid,
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub quality: BoostQuality,
    pub aggressive: bool,
    pub unshackle: bool,
    pub verbose: bool,
    pub cleanup: bool,
}

impl Av1BoostJob {
    pub fn builder() -> Av1BoostBuilder {
        Av1BoostBuilder::default()
    }

    fn input_parent(&self) -> &Path {
        self.input_path.parent().unwrap_or(Path::new(""))
    }

    fn input_stem(&self) -> String {
        self.input_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// The booster's working directory: a folder named after the source
    /// video, next to it.
    pub fn work_dir(&self) -> PathBuf {
        self.input_parent().join(self.input_stem())
    }

    /// Where the booster writes its video-only output.
    pub fn booster_output_path(&self) -> PathBuf {
        self.input_parent().join(format!("{}.ivf", self.input_stem()))
    }

    /// Where the extracted audio lands.
    pub fn audio_path(&self) -> PathBuf {
        self.input_parent()
            .join(format!("{}_audio.mka", self.input_stem()))
    }

    fn merged_temp_path(&self) -> PathBuf {
        self.input_parent().join("output_temp.mkv")
    }

    /// Run the pipeline. Steps 1-4 decide the verdict; cleanup is
    /// informational only.
    pub fn execute(
        &self,
        tools: &Toolchain,
        runner: &dyn CommandRunner,
    ) -> Result<(), BoostError> {
        info!(
            job_id = %self.id,
            input = %self.input_path.display(),
            output = %self.output_path.display(),
            quality = self.quality.as_str(),
            aggressive = self.aggressive,
            unshackle = self.unshackle,
            "starting Auto-Boost pipeline"
        );

        self.validate()?;
        self.extract_audio(tools, runner)?;
        self.run_booster(tools, runner)?;
        self.mux(tools, runner)?;
        self.run_cleanup();

        info!(job_id = %self.id, "Auto-Boost pipeline finished: {}", self.output_path.display());
        Ok(())
    }

    fn validate(&self) -> Result<(), BoostError> {
        if !self.input_path.exists() {
            return Err(BoostError::InputMissing(self.input_path.clone()));
        }

        // The only step allowed to silently create filesystem state.
        if let Some(parent) = self.output_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                info!("creating output directory: {}", parent.display());
                fs::create_dir_all(parent).map_err(|source| BoostError::OutputDir {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }
        Ok(())
    }

    fn extract_audio(
        &self,
        tools: &Toolchain,
        runner: &dyn CommandRunner,
    ) -> Result<(), BoostError> {
        info!("[1/4] extracting audio");

        let work_dir = self.work_dir();
        if !work_dir.exists() {
            fs::create_dir_all(&work_dir).map_err(|source| BoostError::WorkDir {
                path: work_dir.clone(),
                source,
            })?;
        }

        let cmd = ToolCommand::new(&tools.ffmpeg)
            .arg("-i")
            .arg(self.input_path.display().to_string())
            .arg("-vn")
            .args(["-c:a", "copy"])
            .arg(self.audio_path().display().to_string())
            .arg("-y");

        runner.run(&cmd).map_err(BoostError::AudioExtraction)?;
        info!("audio extracted: {}", self.audio_path().display());
        Ok(())
    }

    fn run_booster(
        &self,
        tools: &Toolchain,
        runner: &dyn CommandRunner,
    ) -> Result<(), BoostError> {
        info!("[2/4] SVT-AV1 encoding via Auto-Boost (this may take a while)");

        let mut cmd = ToolCommand::new(&tools.booster)
            .arg("--input")
            .arg(self.input_path.display().to_string())
            .args(["--quality", self.quality.as_str()]);
        if self.aggressive {
            cmd = cmd.arg("--aggressive");
        }
        if self.unshackle {
            cmd = cmd.arg("--unshackle");
        }
        if self.verbose {
            cmd = cmd.arg("--verbose");
        }

        runner.run(&cmd).map_err(BoostError::Booster)?;

        let expected = self.booster_output_path();
        if !expected.exists() {
            return Err(BoostError::BoosterOutputMissing(expected));
        }

        info!("encoding finished: {}", expected.display());
        Ok(())
    }

    fn mux(&self, tools: &Toolchain, runner: &dyn CommandRunner) -> Result<(), BoostError> {
        info!("[3/4] muxing AV1 video with extracted audio");

        let merged = self.merged_temp_path();
        let cmd = ToolCommand::new(&tools.mkvmerge)
            .arg("-o")
            .arg(merged.display().to_string())
            .arg(self.booster_output_path().display().to_string())
            .arg(self.audio_path().display().to_string());

        runner.run(&cmd).map_err(BoostError::Mux)?;

        // Copy, not move: a failure mid-copy leaves the merged file intact
        // for diagnosis.
        fs::copy(&merged, &self.output_path).map_err(|source| BoostError::FinalCopy {
            path: self.output_path.clone(),
            source,
        })?;

        info!("final file created: {}", self.output_path.display());
        Ok(())
    }

    fn run_cleanup(&self) {
        if !self.cleanup {
            info!("[4/4] cleanup disabled, temporary files kept");
            return;
        }

        info!("[4/4] cleaning up temporary files");
        let work_dir = self.work_dir();
        if work_dir.exists() {
            match fs::remove_dir_all(&work_dir) {
                Ok(()) => info!("working directory removed: {}", work_dir.display()),
                Err(e) => warn!(
                    "could not remove working directory {}: {e}",
                    work_dir.display()
                ),
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct Av1BoostBuilder {
    input_path: PathBuf,
    output_path: PathBuf,
    quality: BoostQuality,
    aggressive: bool,
    unshackle: bool,
    verbose: bool,
    cleanup: bool,
}

impl Default for Av1BoostBuilder {
    fn default() -> Self {
        Self {
            input_path: PathBuf::new(),
            output_path: PathBuf::new(),
            quality: BoostQuality::default(),
            aggressive: false,
            unshackle: false,
            verbose: false,
            cleanup: true,
        }
    }
}

impl Av1BoostBuilder {
    pub fn input(mut self, path: impl Into<PathBuf>) -> Self {
        self.input_path = path.into();
        self
    }

    pub fn output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = path.into();
        self
    }

    pub fn quality(mut self, quality: BoostQuality) -> Self {
        self.quality = quality;
        self
    }

    pub fn aggressive(mut self, enabled: bool) -> Self {
        self.aggressive = enabled;
        self
    }

    pub fn unshackle(mut self, enabled: bool) -> Self {
        self.unshackle = enabled;
        self
    }

    pub fn verbose(mut self, enabled: bool) -> Self {
        self.verbose = enabled;
        self
    }

    pub fn cleanup(mut self, enabled: bool) -> Self {
        self.cleanup = enabled;
        self
    }

    pub fn build(self) -> Result<Av1BoostJob, ConfigError> {
        if self.input_path.as_os_str().is_empty() {
            return Err(ConfigError::MissingInput);
        }
        if self.output_path.as_os_str().is_empty() {
            return Err(ConfigError::MissingOutput);
        }

        Ok(Av1BoostJob {
            id: Uuid::new_v4(),
            input_path: self.input_path,
            output_path: self.output_path,
            quality: self.quality,
            aggressive: self.aggressive,
            unshackle: self.unshackle,
            verbose: self.verbose,
            cleanup: self.cleanup,
        })
    }
}
