//! Scene-change thumbnail extraction.
//!
//! A `select` filter keeps only frames whose scene-change score exceeds the
//! threshold; variable-frame-rate sync stops ffmpeg from duplicating the
//! kept frames back to a constant rate. The threshold is the only tunable
//! knob — everything else is the same per-format block used by frame
//! extraction.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use uuid::Uuid;

use super::ConfigError;
use super::frames::ImageFormat;
use crate::engine::process::{CommandRunner, ToolCommand};
use crate::engine::tools::Toolchain;

pub const DEFAULT_SCENE_THRESHOLD: f32 = 0.15;

/// Extract thumbnails at detected scene changes.
#[derive(Debug, Clone)]
pub struct ThumbnailsJob {
    pub id: Uuid,
    pub input_path: PathBuf,
    pub output_dir: PathBuf,
    pub create_subfolder: bool,
    pub subfolder_name: String,
    pub format: ImageFormat,
    pub scene_threshold: f32,
}

impl ThumbnailsJob {
    pub fn builder() -> ThumbnailsBuilder {
        ThumbnailsBuilder::default()
    }

    pub fn target_dir(&self) -> PathBuf {
        if self.create_subfolder && !self.subfolder_name.is_empty() {
            self.output_dir.join(&self.subfolder_name)
        } else {
            self.output_dir.clone()
        }
    }

    pub fn output_pattern(&self) -> PathBuf {
        self.target_dir()
            .join(format!("thumb_%08d{}", self.format.extension()))
    }

    /// The scene-detection filter graph, e.g.
    /// `select='gt(scene,0.15)',showinfo`.
    pub fn scene_filter(&self) -> String {
        format!("select='gt(scene,{:.2})',showinfo", self.scene_threshold)
    }

    pub fn build_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        args.push("-hide_banner".to_string());
        args.push("-i".to_string());
        args.push(self.input_path.display().to_string());

        args.push("-sws_flags".to_string());
        args.push("spline+accurate_rnd+full_chroma_int".to_string());

        args.push("-vf".to_string());
        args.push(self.scene_filter());

        args.push("-vsync".to_string());
        args.push("vfr".to_string());

        self.format.push_args(&mut args);

        args.push(self.output_pattern().display().to_string());
        args
    }

    pub fn command_string(&self, ffmpeg: &Path) -> String {
        ToolCommand::new(ffmpeg).args(self.build_args()).display()
    }

    pub fn execute(&self, tools: &Toolchain, runner: &dyn CommandRunner) -> Result<()> {
        if !self.input_path.exists() {
            anyhow::bail!("input file does not exist: {}", self.input_path.display());
        }

        let target = self.target_dir();
        if !target.exists() {
            fs::create_dir_all(&target)
                .with_context(|| format!("could not create directory {}", target.display()))?;
        }

        let cmd = ToolCommand::new(&tools.ffmpeg).args(self.build_args());
        info!(
            job_id = %self.id,
            threshold = self.scene_threshold,
            "thumbnails command: {}",
            cmd.display()
        );

        runner
            .run(&cmd)
            .with_context(|| format!("thumbnail extraction from {} failed", self.input_path.display()))
    }
}

#[derive(Debug, Clone)]
pub struct ThumbnailsBuilder {
    input_path: PathBuf,
    output_dir: PathBuf,
    create_subfolder: bool,
    subfolder_name: String,
    format: ImageFormat,
    scene_threshold: f32,
}

impl Default for ThumbnailsBuilder {
    fn default() -> Self {
        Self {
            input_path: PathBuf::new(),
            output_dir: PathBuf::new(),
            create_subfolder: false,
            subfolder_name: String::new(),
            format: ImageFormat::Png,
            scene_threshold: DEFAULT_SCENE_THRESHOLD,
        }
    }
}

impl ThumbnailsBuilder {
    pub fn input(mut self, path: impl Into<PathBuf>) -> Self {
        self.input_path = path.into();
        self
    }

    pub fn output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = path.into();
        self
    }

    pub fn create_subfolder(mut self, create: bool) -> Self {
        self.create_subfolder = create;
        self
    }

    pub fn subfolder_name(mut self, name: impl Into<String>) -> Self {
        self.subfolder_name = name.into();
        self
    }

    pub fn format(mut self, format: ImageFormat) -> Self {
        self.format = format;
        self
    }

    pub fn png(self) -> Self {
        self.format(ImageFormat::Png)
    }

    pub fn tiff(self) -> Self {
        self.format(ImageFormat::Tiff)
    }

    pub fn jpeg(self) -> Self {
        self.format(ImageFormat::Jpeg)
    }

    pub fn scene_threshold(mut self, threshold: f32) -> Self {
        self.scene_threshold = threshold;
        self
    }

    pub fn build(self) -> Result<ThumbnailsJob, ConfigError> {
        if self.input_path.as_os_str().is_empty() {
            return Err(ConfigError::MissingInput);
        }
        if self.output_dir.as_os_str().is_empty() {
            return Err(ConfigError::MissingOutputDir);
        }
        if !(0.0..=1.0).contains(&self.scene_threshold) {
            return Err(ConfigError::SceneThresholdOutOfRange(self.scene_threshold));
        }

        Ok(ThumbnailsJob {
            id: Uuid::new_v4(),
            input_path: self.input_path,
            output_dir: self.output_dir,
            create_subfolder: self.create_subfolder,
            subfolder_name: self.subfolder_name,
            format: self.format,
            scene_threshold: self.scene_threshold,
        })
    }
}
