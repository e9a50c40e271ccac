//! Frame extraction to still-image sequences.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use uuid::Uuid;

use super::ConfigError;
use crate::engine::process::{CommandRunner, ToolCommand};
use crate::engine::tools::Toolchain;

/// Still-image output format. Each format carries a fixed color-tag /
/// codec / pixel-format triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// Lossless RGB.
    Png,
    /// BT.709-tagged RGB with deflate compression.
    Tiff,
    /// Full-range YUV at top quality.
    Jpeg,
}

impl ImageFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => ".png",
            ImageFormat::Tiff => ".tiff",
            ImageFormat::Jpeg => ".jpg",
        }
    }

    /// Per-format output block: color tags, stream mapping, image codec,
    /// pixel format, and numbering. The ffmpeg color tags are numeric here
    /// (2 = unspecified/sRGB-ish, 1 = BT.709) to match what the image
    /// encoders expect.
    pub(crate) fn push_args(&self, args: &mut Vec<String>) {
        match self {
            ImageFormat::Png => {
                for pair in [
                    ["-color_trc", "2"],
                    ["-colorspace", "2"],
                    ["-color_primaries", "2"],
                    ["-map", "0:v"],
                    ["-c:v", "png"],
                    ["-pix_fmt", "rgb24"],
                    ["-start_number", "0"],
                ] {
                    args.push(pair[0].to_string());
                    args.push(pair[1].to_string());
                }
            }
            ImageFormat::Tiff => {
                for pair in [
                    ["-color_trc", "1"],
                    ["-colorspace", "1"],
                    ["-color_primaries", "1"],
                    ["-map", "0:v"],
                    ["-c:v", "tiff"],
                    ["-pix_fmt", "rgb24"],
                    ["-compression_algo", "deflate"],
                    ["-start_number", "0"],
                    [
                        "-movflags",
                        "frag_keyframe+empty_moov+delay_moov+use_metadata_tags+write_colr",
                    ],
                    ["-bf", "0"],
                ] {
                    args.push(pair[0].to_string());
                    args.push(pair[1].to_string());
                }
            }
            ImageFormat::Jpeg => {
                for pair in [
                    ["-color_trc", "2"],
                    ["-colorspace", "2"],
                    ["-color_primaries", "2"],
                    ["-map", "0:v"],
                    ["-c:v", "mjpeg"],
                    ["-pix_fmt", "yuvj420p"],
                    ["-q:v", "1"],
                    ["-start_number", "0"],
                ] {
                    args.push(pair[0].to_string());
                    args.push(pair[1].to_string());
                }
            }
        }
    }
}

/// Extract every frame of the input into numbered still images.
#[derive(Debug, Clone)]
pub struct ExtractFramesJob {
    pub id: Uuid,
    pub input_path: PathBuf,
    pub output_dir: PathBuf,
    pub create_subfolder: bool,
    pub subfolder_name: String,
    pub format: ImageFormat,
}

impl ExtractFramesJob {
    pub fn builder() -> ExtractFramesBuilder {
        ExtractFramesBuilder::default()
    }

    /// Directory the images land in, including the optional subfolder.
    pub fn target_dir(&self) -> PathBuf {
        if self.create_subfolder && !self.subfolder_name.is_empty() {
            self.output_dir.join(&self.subfolder_name)
        } else {
            self.output_dir.clone()
        }
    }

    pub fn output_pattern(&self) -> PathBuf {
        self.target_dir()
            .join(format!("%08d{}", self.format.extension()))
    }

    pub fn build_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        args.push("-hide_banner".to_string());
        args.push("-i".to_string());
        args.push(self.input_path.display().to_string());

        args.push("-sws_flags".to_string());
        args.push("spline+accurate_rnd+full_chroma_int".to_string());

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
        info!(job_id = %self.id, "extract frames command: {}", cmd.display());

        runner
            .run(&cmd)
            .with_context(|| format!("frame extraction from {} failed", self.input_path.display()))
    }
}

#[derive(Debug, Clone)]
pub struct ExtractFramesBuilder {
    input_path: PathBuf,
    output_dir: PathBuf,
    create_subfolder: bool,
    subfolder_name: String,
    format: ImageFormat,
}

impl Default for ExtractFramesBuilder {
    fn default() -> Self {
        Self {
            input_path: PathBuf::new(),
            output_dir: PathBuf::new(),
            create_subfolder: false,
            subfolder_name: String::new(),
            format: ImageFormat::Png,
        }
    }
}

impl ExtractFramesBuilder {
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

    pub fn build(self) -> Result<ExtractFramesJob, ConfigError> {
        if self.input_path.as_os_str().is_empty() {
            return Err(ConfigError::MissingInput);
        }
        if self.output_dir.as_os_str().is_empty() {
            return Err(ConfigError::MissingOutputDir);
        }

        Ok(ExtractFramesJob {
            id: Uuid::new_v4(),
            input_path: self.input_path,
            output_dir: self.output_dir,
            create_subfolder: self.create_subfolder,
            subfolder_name: self.subfolder_name,
            format: self.format,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> ExtractFramesBuilder {
        ExtractFramesJob::builder().input("in.mkv").output_dir("/out")
    }

    #[test]
    fn png_block() {
        let job = base().png().build().unwrap();
        let args = job.build_args();
        assert!(args.windows(2).any(|w| w == ["-c:v", "png"]));
        assert!(args.windows(2).any(|w| w == ["-pix_fmt", "rgb24"]));
        assert!(args.windows(2).any(|w| w == ["-color_trc", "2"]));
        assert!(args.windows(2).any(|w| w == ["-start_number", "0"]));
        assert_eq!(args.last().unwrap(), "/out/%08d.png");
    }

    #[test]
    fn tiff_block_uses_deflate_and_bt601_tags() {
        let job = base().tiff().build().unwrap();
        let args = job.build_args();
        assert!(args.windows(2).any(|w| w == ["-c:v", "tiff"]));
        assert!(args.windows(2).any(|w| w == ["-compression_algo", "deflate"]));
        assert!(args.windows(2).any(|w| w == ["-color_trc", "1"]));
        assert!(args.windows(2).any(|w| w == ["-bf", "0"]));
        assert_eq!(args.last().unwrap(), "/out/%08d.tiff");
    }

    #[test]
    fn jpeg_block_is_top_quality_yuvj() {
        let job = base().jpeg().build().unwrap();
        let args = job.build_args();
        assert!(args.windows(2).any(|w| w == ["-c:v", "mjpeg"]));
        assert!(args.windows(2).any(|w| w == ["-pix_fmt", "yuvj420p"]));
        assert!(args.windows(2).any(|w| w == ["-q:v", "1"]));
        assert_eq!(args.last().unwrap(), "/out/%08d.jpg");
    }

    #[test]
    fn scaler_flags_are_always_present() {
        let job = base().build().unwrap();
        let args = job.build_args();
        assert_eq!(args[0], "-hide_banner");
        assert!(
            args.windows(2)
                .any(|w| w == ["-sws_flags", "spline+accurate_rnd+full_chroma_int"])
        );
    }

    #[test]
    fn subfolder_shapes_output_pattern() {
        let job = base()
            .create_subfolder(true)
            .subfolder_name("frames")
            .build()
            .unwrap();
        assert_eq!(job.output_pattern(), PathBuf::from("/out/frames/%08d.png"));

        // Flag without a name keeps the flat layout
        let job = base().create_subfolder(true).build().unwrap();
        assert_eq!(job.output_pattern(), PathBuf::from("/out/%08d.png"));
    }

    #[test]
    fn build_requires_paths() {
        let err = ExtractFramesJob::builder().output_dir("/out").build().unwrap_err();
        assert_eq!(err, ConfigError::MissingInput);

        let err = ExtractFramesJob::builder().input("in.mkv").build().unwrap_err();
        assert_eq!(err, ConfigError::MissingOutputDir);
    }
}
