use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use ffkit::engine::{BoostQuality, Codec, ImageFormat};

#[derive(Parser)]
#[command(name = "ffkit")]
#[command(about = "FFmpeg front-end toolkit", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Re-encode a video file
    Reencode {
        /// Input video file
        input: PathBuf,

        /// Output video file
        output: PathBuf,

        /// Video codec
        #[arg(long, value_enum, default_value = "x264")]
        codec: CodecArg,

        /// CRF quality value (0-51, lower is better)
        #[arg(long, conflicts_with_all = ["qp", "vbr", "cbr"])]
        crf: Option<i32>,

        /// Constant quantizer value (0-51)
        #[arg(long, conflicts_with_all = ["vbr", "cbr"])]
        qp: Option<i32>,

        /// Variable bitrate target in kb/s
        #[arg(long, conflicts_with = "cbr")]
        vbr: Option<i32>,

        /// Constant bitrate in kb/s (VBV buffer defaults to 2x)
        #[arg(long)]
        cbr: Option<i32>,

        /// Encoder speed preset
        #[arg(long)]
        preset: Option<String>,

        /// Content tune (film, grain, animation, ...)
        #[arg(long)]
        tune: Option<String>,

        /// Use a 10-bit 4:2:0 pixel format
        #[arg(long)]
        ten_bit: bool,

        /// Output container (mp4, mkv, webm, mov)
        #[arg(long)]
        container: Option<String>,

        /// Copy the audio stream unchanged
        #[arg(long, conflicts_with = "audio_codec")]
        copy_audio: bool,

        /// Re-encode audio with this codec
        #[arg(long)]
        audio_codec: Option<String>,

        /// Audio bitrate in kb/s
        #[arg(long)]
        audio_bitrate: Option<i32>,

        /// Tag the output as HDR10 (BT.2020 / PQ / limited range)
        #[arg(long)]
        hdr10: bool,

        /// Extra ffmpeg arguments, shell-quoted (e.g. --extra "-movflags +faststart")
        #[arg(long)]
        extra: Option<String>,
    },

    /// Encode a numbered image sequence into a video
    EncodeSequence {
        /// Directory containing the image sequence
        input_dir: PathBuf,

        /// printf-style input pattern
        #[arg(long, default_value = "%08d.png")]
        pattern: String,

        /// Output directory
        #[arg(long)]
        output_dir: PathBuf,

        /// Output filename (container extension appended when missing)
        #[arg(long)]
        filename: String,

        /// Input framerate
        #[arg(long, default_value_t = 30)]
        framerate: i32,

        /// Video codec
        #[arg(long, value_enum, default_value = "x264")]
        codec: CodecArg,

        /// CRF/CQ quality value
        #[arg(long)]
        quality: Option<i32>,

        /// Encoder speed preset
        #[arg(long)]
        preset: Option<String>,

        /// Output container (mp4, mkv, webm, mov)
        #[arg(long)]
        container: Option<String>,
    },

    /// Extract every frame as still images
    ExtractFrames {
        /// Input video file
        input: PathBuf,

        /// Output directory
        #[arg(long)]
        output_dir: PathBuf,

        /// Image format
        #[arg(long, value_enum, default_value = "png")]
        format: ImageFormatArg,

        /// Create this subfolder under the output directory
        #[arg(long)]
        subfolder: Option<String>,
    },

    /// Extract thumbnails at scene changes
    Thumbnails {
        /// Input video file
        input: PathBuf,

        /// Output directory
        #[arg(long)]
        output_dir: PathBuf,

        /// Image format
        #[arg(long, value_enum, default_value = "png")]
        format: ImageFormatArg,

        /// Scene-change threshold (0.0-1.0)
        #[arg(long)]
        threshold: Option<f32>,

        /// Create this subfolder under the output directory
        #[arg(long)]
        subfolder: Option<String>,
    },

    /// Concatenate files losslessly with mkvmerge
    Concat {
        /// Output file
        #[arg(short, long)]
        output: PathBuf,

        /// Input files, in order (at least 2)
        inputs: Vec<PathBuf>,
    },

    /// Encode to AV1 through the Auto-Boost pipeline
    Av1Boost {
        /// Input video file
        input: PathBuf,

        /// Output mkv file
        output: PathBuf,

        /// Quality tier
        #[arg(long, value_enum, default_value = "high")]
        quality: QualityArg,

        /// More aggressive quality boosting
        #[arg(long)]
        aggressive: bool,

        /// Lift the booster's internal encoder limits
        #[arg(long)]
        unshackle: bool,

        /// Forward the booster's progress output
        #[arg(long)]
        verbose: bool,

        /// Keep the booster's working directory
        #[arg(long)]
        keep_temp: bool,
    },

    /// Inspect a media file with ffprobe
    Probe {
        /// Path to the media file
        file: PathBuf,

        /// Also write <name>_ffprobe.json and <name>_ffprobe.txt next to it
        #[arg(long)]
        export: bool,
    },

    /// Check that the external tools can be resolved
    CheckTools,

    /// Show config status and location, or create default config if missing
    InitConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CodecArg {
    X264,
    X265,
    H264Nvenc,
    H265Nvenc,
    Av1,
    SvtAv1,
    Prores,
    Ffv1,
}

impl CodecArg {
    pub fn to_codec(self) -> Codec {
        match self {
            CodecArg::X264 => Codec::X264,
            CodecArg::X265 => Codec::X265,
            CodecArg::H264Nvenc => Codec::H264Nvenc,
            CodecArg::H265Nvenc => Codec::H265Nvenc,
            CodecArg::Av1 => Codec::Av1,
            CodecArg::SvtAv1 => Codec::SvtAv1,
            CodecArg::Prores => Codec::ProRes,
            CodecArg::Ffv1 => Codec::Ffv1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ImageFormatArg {
    Png,
    Tiff,
    Jpeg,
}

impl ImageFormatArg {
    pub fn to_format(self) -> ImageFormat {
        match self {
            ImageFormatArg::Png => ImageFormat::Png,
            ImageFormatArg::Tiff => ImageFormat::Tiff,
            ImageFormatArg::Jpeg => ImageFormat::Jpeg,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum QualityArg {
    Low,
    Medium,
    High,
}

impl QualityArg {
    pub fn to_quality(self) -> BoostQuality {
        match self {
            QualityArg::Low => BoostQuality::Low,
            QualityArg::Medium => BoostQuality::Medium,
            QualityArg::High => BoostQuality::High,
        }
    }
}

pub fn parse() -> Cli {
    Cli::parse()
}
