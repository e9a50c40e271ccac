//! Job types: one module per job, each pairing a frozen job value with a
//! fluent builder whose `build()` is the single validation checkpoint.

mod boost;
mod concat;
mod frames;
mod probe;
mod reencode;
mod sequence;
mod thumbnails;

pub use boost::{Av1BoostBuilder, Av1BoostJob, BoostError, BoostQuality};
pub use concat::{ConcatBuilder, ConcatJob};
pub use frames::{ExtractFramesBuilder, ExtractFramesJob, ImageFormat};
pub use probe::{
    AudioStreamInfo, ProbeJob, ProbeReport, VideoStreamInfo, format_bytes, format_duration,
};
pub use reencode::{ReencodeBuilder, ReencodeJob};
pub use sequence::{SequenceEncodeBuilder, SequenceEncodeJob};
pub use thumbnails::{ThumbnailsBuilder, ThumbnailsJob};

use thiserror::Error;

/// Configuration errors caught at `build()` time, before any external
/// process is spawned.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("input path is required")]
    MissingInput,

    #[error("output path is required")]
    MissingOutput,

    #[error("output directory is required")]
    MissingOutputDir,

    #[error("output filename is required")]
    MissingOutputFilename,

    #[error("quality/CRF value must be between 0 and 51, got {0}")]
    QualityOutOfRange(i32),

    #[error("bitrate must be > 0 for VBR/CBR modes")]
    InvalidBitrate,

    #[error("codec {codec} cannot be stored in a {container} container")]
    IncompatibleContainer {
        codec: &'static str,
        container: String,
    },

    #[error("scene threshold must be between 0.0 and 1.0, got {0}")]
    SceneThresholdOutOfRange(f32),

    #[error("at least 2 input files are required to concatenate, got {0}")]
    NotEnoughInputs(usize),
}
