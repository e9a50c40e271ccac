// Core command-construction engine - independent of the CLI surface

pub mod codec;
pub mod encode;
pub mod jobs;
pub mod process;
pub mod tools;

pub use encode::{
    AudioConfig, Codec, ColorPrimaries, ColorProfile, ColorRange, ContentLightLevel, EncodeConfig,
    MasteringDisplay, MatrixCoefficients, PixelFormat, RateControl, TransferCharacteristic,
};
pub use jobs::{
    AudioStreamInfo, Av1BoostBuilder, Av1BoostJob, BoostError, BoostQuality, ConcatBuilder,
    ConcatJob, ConfigError, ExtractFramesBuilder, ExtractFramesJob, ImageFormat, ProbeJob,
    ProbeReport, ReencodeBuilder, ReencodeJob, SequenceEncodeBuilder, SequenceEncodeJob,
    ThumbnailsBuilder, ThumbnailsJob, VideoStreamInfo,
};
pub use process::{CommandRunner, SystemRunner, ToolCommand};
pub use tools::Toolchain;
