//! Image-sequence to video encode.
//!
//! Unlike the re-encode job, the codec quality/preset block is delegated to
//! the rules engine wholesale: sequence encodes expose only the codec,
//! quality and preset knobs.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use uuid::Uuid;

use super::ConfigError;
use crate::engine::codec;
use crate::engine::encode::Codec;
use crate::engine::process::{CommandRunner, ToolCommand};
use crate::engine::tools::Toolchain;

/// A validated encode of a numbered image sequence into one video file.
#[derive(Debug, Clone)]
pub struct SequenceEncodeJob {
    pub id: Uuid,
    pub input_dir: PathBuf,
    pub input_pattern: String,
    pub output_dir: PathBuf,
    pub output_filename: String,
    pub framerate: i32,
    pub container: String,
    pub codec: Codec,
    pub quality: i32,
    pub preset: String,
}

impl SequenceEncodeJob {
    pub fn builder() -> SequenceEncodeBuilder {
        SequenceEncodeBuilder::default()
    }

    /// Final output path: directory + filename, container extension
    /// appended when the filename doesn't already carry it.
    pub fn output_path(&self) -> PathBuf {
        let extension = codec::container_extension(&self.container);
        let mut filename = self.output_filename.clone();
        if !filename.ends_with(extension) {
            filename.push_str(extension);
        }
        self.output_dir.join(filename)
    }

    pub fn build_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        args.push("-hide_banner".to_string());

        // The framerate flag must precede the input pattern: it describes
        // how the image sequence is read, not how the output is written.
        args.push("-framerate".to_string());
        args.push(self.framerate.to_string());

        args.push("-i".to_string());
        args.push(self.input_dir.join(&self.input_pattern).display().to_string());

        args.push("-c:v".to_string());
        args.push(codec::encoder_name(self.codec, ""));

        codec::append_codec_args(&mut args, self.codec, self.quality, &self.preset);

        // ProRes and FFV1 blocks carry their own pixel format
        if self.codec != Codec::ProRes && self.codec != Codec::Ffv1 {
            args.push("-pix_fmt".to_string());
            args.push("yuv420p".to_string());
        }

        args.push(self.output_path().display().to_string());
        args
    }

    pub fn command_string(&self, ffmpeg: &Path) -> String {
        ToolCommand::new(ffmpeg).args(self.build_args()).display()
    }

    pub fn execute(&self, tools: &Toolchain, runner: &dyn CommandRunner) -> Result<()> {
        if !self.input_dir.exists() {
            anyhow::bail!("input directory does not exist: {}", self.input_dir.display());
        }

        if !self.output_dir.exists() {
            fs::create_dir_all(&self.output_dir).with_context(|| {
                format!("could not create output directory {}", self.output_dir.display())
            })?;
        }

        let cmd = ToolCommand::new(&tools.ffmpeg).args(self.build_args());
        info!(job_id = %self.id, "sequence encode command: {}", cmd.display());

        runner
            .run(&cmd)
            .with_context(|| format!("sequence encode into {} failed", self.output_path().display()))
    }
}

#[derive(Debug, Clone)]
pub struct SequenceEncodeBuilder {
    input_dir: PathBuf,
    input_pattern: String,
    output_dir: PathBuf,
    output_filename: String,
    framerate: i32,
    container: String,
    codec: Codec,
    quality: i32,
    preset: String,
}

impl Default for SequenceEncodeBuilder {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::new(),
            input_pattern: "%08d.png".to_string(),
            output_dir: PathBuf::new(),
            output_filename: String::new(),
            framerate: 30,
            container: "mkv".to_string(),
            codec: Codec::X264,
            quality: 18,
            preset: "slow".to_string(),
        }
    }
}

impl SequenceEncodeBuilder {
    pub fn input_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.input_dir = path.into();
        self
    }

    pub fn input_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.input_pattern = pattern.into();
        self
    }

    pub fn output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = path.into();
        self
    }

    pub fn output_filename(mut self, name: impl Into<String>) -> Self {
        self.output_filename = name.into();
        self
    }

    pub fn framerate(mut self, fps: i32) -> Self {
        self.framerate = fps;
        self
    }

    pub fn container(mut self, name: impl Into<String>) -> Self {
        self.container = name.into();
        self
    }

    pub fn codec(mut self, codec: Codec) -> Self {
        self.codec = codec;
        self
    }

    pub fn quality(mut self, value: i32) -> Self {
        self.quality = value;
        self
    }

    pub fn preset(mut self, preset: impl Into<String>) -> Self {
        self.preset = preset.into();
        self
    }

    pub fn build(self) -> Result<SequenceEncodeJob, ConfigError> {
        if self.input_dir.as_os_str().is_empty() {
            return Err(ConfigError::MissingInput);
        }
        if self.output_dir.as_os_str().is_empty() {
            return Err(ConfigError::MissingOutputDir);
        }
        if self.output_filename.is_empty() {
            return Err(ConfigError::MissingOutputFilename);
        }
        if !codec::validate_quality(self.codec, self.quality) {
            return Err(ConfigError::QualityOutOfRange(self.quality));
        }
        if !codec::codec_container_compatible(self.codec, &self.container) {
            return Err(ConfigError::IncompatibleContainer {
                codec: self.codec.name(),
                container: self.container.clone(),
            });
        }

        Ok(SequenceEncodeJob {
            id: Uuid::new_v4(),
            input_dir: self.input_dir,
            input_pattern: self.input_pattern,
            output_dir: self.output_dir,
            output_filename: self.output_filename,
            framerate: self.framerate,
            container: self.container,
            codec: self.codec,
            quality: self.quality,
            preset: self.preset,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> SequenceEncodeBuilder {
        SequenceEncodeJob::builder()
            .input_dir("/frames")
            .output_dir("/out")
            .output_filename("movie")
    }

    #[test]
    fn framerate_precedes_input() {
        let job = base().framerate(24).build().unwrap();
        let args = job.build_args();

        let fr = args.iter().position(|a| a == "-framerate").unwrap();
        let input = args.iter().position(|a| a == "-i").unwrap();
        assert!(fr < input);
        assert_eq!(args[fr + 1], "24");
    }

    #[test]
    fn default_pixel_format_is_yuv420p() {
        let job = base().build().unwrap();
        let args = job.build_args();
        assert!(args.windows(2).any(|w| w == ["-pix_fmt", "yuv420p"]));
    }

    #[test]
    fn prores_and_ffv1_bring_their_own_pixel_format() {
        let job = base().codec(Codec::ProRes).container("mov").build().unwrap();
        let args = job.build_args();
        // Exactly one -pix_fmt, the one from the ProRes block
        let count = args.iter().filter(|a| *a == "-pix_fmt").count();
        assert_eq!(count, 1);
        assert!(args.windows(2).any(|w| w == ["-pix_fmt", "yuva444p10le"]));

        let job = base().codec(Codec::Ffv1).container("mkv").build().unwrap();
        let args = job.build_args();
        assert!(!args.windows(2).any(|w| w == ["-pix_fmt", "yuv420p"]));
    }

    #[test]
    fn output_extension_is_appended_once() {
        let job = base().container("mp4").build().unwrap();
        assert_eq!(job.output_path(), PathBuf::from("/out/movie.mp4"));

        let job = base()
            .output_filename("movie.mp4")
            .container("mp4")
            .build()
            .unwrap();
        assert_eq!(job.output_path(), PathBuf::from("/out/movie.mp4"));
    }

    #[test]
    fn unknown_container_falls_back_to_mkv() {
        let job = base().container("avi").build().unwrap();
        assert_eq!(job.output_path(), PathBuf::from("/out/movie.mkv"));
    }

    #[test]
    fn build_requires_output_names() {
        let err = SequenceEncodeJob::builder()
            .input_dir("/frames")
            .output_filename("movie")
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::MissingOutputDir);

        let err = SequenceEncodeJob::builder()
            .input_dir("/frames")
            .output_dir("/out")
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::MissingOutputFilename);
    }

    #[test]
    fn build_validates_quality_through_rules_engine() {
        assert!(base().quality(51).build().is_ok());
        assert_eq!(
            base().quality(52).build().unwrap_err(),
            ConfigError::QualityOutOfRange(52)
        );
        // FFV1 has no numeric quality constraint
        assert!(
            base()
                .codec(Codec::Ffv1)
                .quality(52)
                .container("mkv")
                .build()
                .is_ok()
        );
    }

    #[test]
    fn execute_fails_fast_on_missing_input_dir() {
        use crate::engine::process::CommandRunner;
        use std::cell::Cell;

        struct CountingRunner(Cell<usize>);
        impl CommandRunner for CountingRunner {
            fn run(&self, _cmd: &ToolCommand) -> Result<()> {
                self.0.set(self.0.get() + 1);
                Ok(())
            }
            fn capture(&self, _cmd: &ToolCommand) -> Result<String> {
                self.0.set(self.0.get() + 1);
                Ok(String::new())
            }
        }

        let tmp = tempfile::TempDir::new().unwrap();
        let job = SequenceEncodeJob::builder()
            .input_dir(tmp.path().join("does-not-exist"))
            .output_dir(tmp.path().join("out"))
            .output_filename("movie")
            .build()
            .unwrap();

        let runner = CountingRunner(Cell::new(0));
        let tools = Toolchain {
            ffmpeg: PathBuf::from("ffmpeg"),
            ffprobe: PathBuf::from("ffprobe"),
            mkvmerge: PathBuf::from("mkvmerge"),
            booster: PathBuf::from("auto-boost"),
        };
        assert!(job.execute(&tools, &runner).is_err());
        assert_eq!(runner.0.get(), 0, "no process may be spawned");
    }
}
