//! Declarative encode configuration.
//!
//! `EncodeConfig` describes a desired encode (codec, rate control, color,
//! HDR metadata, audio) without referencing any particular input or output.
//! Job builders freeze one into a job; translating it into an argument
//! vector is a pure function of the frozen value.

use serde::{Deserialize, Serialize};

/// Video codec selection.
///
/// The variant decides which argument-block rules apply when the command is
/// assembled (see `engine::codec`). `SvtAv1Essential` is encoded through the
/// external Auto-Boost pipeline rather than a plain ffmpeg invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Codec {
    X264,
    X265,
    H264Nvenc,
    H265Nvenc,
    Av1,
    SvtAv1,
    SvtAv1Essential,
    ProRes,
    Ffv1,
}

impl Default for Codec {
    fn default() -> Self {
        Codec::X264
    }
}

impl Codec {
    /// Codec family name for display and diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Codec::X264 => "x264",
            Codec::X265 => "x265",
            Codec::H264Nvenc => "h264_nvenc",
            Codec::H265Nvenc => "hevc_nvenc",
            Codec::Av1 => "av1",
            Codec::SvtAv1 => "svt-av1",
            Codec::SvtAv1Essential => "svt-av1-essential",
            Codec::ProRes => "prores",
            Codec::Ffv1 => "ffv1",
        }
    }

    /// Codecs driven with `-crf`.
    pub fn is_crf_family(&self) -> bool {
        matches!(
            self,
            Codec::X264 | Codec::X265 | Codec::Av1 | Codec::SvtAv1 | Codec::SvtAv1Essential
        )
    }

    /// NVENC hardware encoders, driven with `-cq`.
    pub fn is_nvenc(&self) -> bool {
        matches!(self, Codec::H264Nvenc | Codec::H265Nvenc)
    }

    /// HEVC-family codecs are the only ones that carry HDR10 static metadata.
    pub fn is_hevc_family(&self) -> bool {
        matches!(self, Codec::X265 | Codec::H265Nvenc)
    }
}

/// Rate-control mode. Decides whether `quality` or the bitrate fields of an
/// `EncodeConfig` are meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RateControl {
    /// Constant Rate Factor (quality-targeting).
    Crf,
    /// Constant Quantization Parameter.
    Cqp,
    /// Variable bitrate.
    Vbr,
    /// Constant bitrate with VBV buffer.
    Cbr,
}

impl Default for RateControl {
    fn default() -> Self {
        RateControl::Crf
    }
}

/// Pixel format, each mapping to exactly one ffmpeg wire string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PixelFormat {
    Rgb24,
    Rgb48,
    RgbF16,
    Yuv420p8,
    Yuv420p10,
    P010,
    Nv12,
    Yuv422p10,
    Yuv444p10,
    Yuva444p10,
}

impl Default for PixelFormat {
    fn default() -> Self {
        PixelFormat::Yuv420p8
    }
}

impl PixelFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            PixelFormat::Rgb24 => "rgb24",
            PixelFormat::Rgb48 => "rgb48le",
            PixelFormat::RgbF16 => "rgbf16le",
            PixelFormat::Yuv420p8 => "yuv420p",
            PixelFormat::Yuv420p10 => "yuv420p10le",
            PixelFormat::P010 => "p010le",
            PixelFormat::Nv12 => "nv12",
            PixelFormat::Yuv422p10 => "yuv422p10le",
            PixelFormat::Yuv444p10 => "yuv444p10le",
            PixelFormat::Yuva444p10 => "yuva444p10le",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorPrimaries {
    Bt601,
    Bt709,
    Bt2020,
    P3D65,
}

impl ColorPrimaries {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColorPrimaries::Bt601 => "bt470bg",
            ColorPrimaries::Bt709 => "bt709",
            ColorPrimaries::Bt2020 => "bt2020",
            ColorPrimaries::P3D65 => "smpte432",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferCharacteristic {
    Srgb,
    Bt1886,
    Pq,
    Hlg,
}

impl TransferCharacteristic {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferCharacteristic::Srgb => "iec61966-2-1",
            TransferCharacteristic::Bt1886 => "bt709",
            TransferCharacteristic::Pq => "smpte2084",
            TransferCharacteristic::Hlg => "arib-std-b67",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatrixCoefficients {
    Bt601,
    Bt709,
    Bt2020Ncl,
}

impl MatrixCoefficients {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatrixCoefficients::Bt601 => "bt470bg",
            MatrixCoefficients::Bt709 => "bt709",
            MatrixCoefficients::Bt2020Ncl => "bt2020nc",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorRange {
    /// TV range (16-235).
    Limited,
    /// PC range (0-255).
    Full,
}

impl ColorRange {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColorRange::Limited => "tv",
            ColorRange::Full => "pc",
        }
    }
}

/// Explicit color-space override, applied only when `passthrough_color` is
/// off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorProfile {
    pub primaries: ColorPrimaries,
    pub transfer: TransferCharacteristic,
    pub matrix: MatrixCoefficients,
    pub range: ColorRange,
}

impl Default for ColorProfile {
    fn default() -> Self {
        Self {
            primaries: ColorPrimaries::Bt709,
            transfer: TransferCharacteristic::Bt1886,
            matrix: MatrixCoefficients::Bt709,
            range: ColorRange::Full,
        }
    }
}

/// HDR10 content light level metadata (nits).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentLightLevel {
    pub max_cll: u16,
    pub max_fall: u16,
}

impl ContentLightLevel {
    /// Wire form consumed by `-max-cll`: `<cll>,<fall>`.
    pub fn to_arg(&self) -> String {
        format!("{},{}", self.max_cll, self.max_fall)
    }
}

/// HDR10 mastering display color volume. Chromaticities are CIE xy
/// coordinates, luminance is cd/m².
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MasteringDisplay {
    pub red_x: f32,
    pub red_y: f32,
    pub green_x: f32,
    pub green_y: f32,
    pub blue_x: f32,
    pub blue_y: f32,
    pub white_x: f32,
    pub white_y: f32,
    pub min_luminance: f32,
    pub max_luminance: f32,
}

impl Default for MasteringDisplay {
    fn default() -> Self {
        // P3-D65 mastering display with 1000-nit peak
        Self {
            red_x: 0.708,
            red_y: 0.292,
            green_x: 0.170,
            green_y: 0.797,
            blue_x: 0.131,
            blue_y: 0.046,
            white_x: 0.3127,
            white_y: 0.3290,
            min_luminance: 0.0,
            max_luminance: 1000.0,
        }
    }
}

impl MasteringDisplay {
    /// Wire form consumed by `-master-display`. The field order is Green,
    /// Blue, Red, white point, then luminance as (max,min).
    pub fn to_arg(&self) -> String {
        format!(
            "G({},{})B({},{})R({},{})WP({},{})L({},{})",
            self.green_x,
            self.green_y,
            self.blue_x,
            self.blue_y,
            self.red_x,
            self.red_y,
            self.white_x,
            self.white_y,
            self.max_luminance,
            self.min_luminance,
        )
    }
}

/// Audio handling for a re-encode. `copy_audio` short-circuits everything
/// else: the stream is passed through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub copy_audio: bool,
    pub codec: String,
    pub sample_rate: u32,
    pub channels: u16,
    pub bitrate_kbps: i32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            copy_audio: false,
            codec: "aac".to_string(),
            sample_rate: 48_000,
            channels: 2,
            bitrate_kbps: 192,
        }
    }
}

/// The aggregate encode description a job builder freezes into a job.
///
/// Codec-specific knobs (ProRes, FFV1, x264, NVENC) live alongside the
/// common fields; only the block matching `codec` is ever emitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodeConfig {
    pub codec: Codec,
    /// Forces a specific ffmpeg encoder name, bypassing the codec table.
    pub encoder_override: String,

    pub rate_control: RateControl,
    /// CRF/CQP value; lower is better quality.
    pub quality: i32,
    pub bitrate_kbps: i32,
    pub max_bitrate_kbps: i32,
    pub buffer_size_kbps: i32,

    pub preset: String,
    pub tune: String,
    pub gop_size: i32,
    pub bframes: i32,
    /// 0 = let the encoder decide.
    pub threads: i32,

    pub pixel_format: PixelFormat,

    /// Keep the input's color metadata. On by default; the color profile
    /// below only applies once this is switched off.
    pub passthrough_color: bool,
    pub color_profile: ColorProfile,
    pub mastering_display: Option<MasteringDisplay>,
    pub content_light_level: Option<ContentLightLevel>,

    pub container: String,
    pub audio: AudioConfig,
    /// Appended verbatim, in order, just before the output path.
    pub extra_args: Vec<String>,

    // ProRes (prores_ks)
    pub prores_profile: i32,
    pub prores_vendor: String,
    pub prores_bits_per_mb: i32,

    // FFV1
    pub ffv1_level: i32,
    /// 0 = Golomb-Rice, 1 = range coder, 2 = range coder with custom state
    pub ffv1_coder: i32,
    /// 0 = small context, 1 = large context
    pub ffv1_context: i32,
    pub ffv1_slices: i32,

    // x264
    pub x264_params: String,

    // NVENC
    pub b_adapt: i32,
    pub rc_lookahead: i32,
    pub qp_cb_offset: i32,
    pub qp_cr_offset: i32,
}

impl Default for EncodeConfig {
    fn default() -> Self {
        Self {
            codec: Codec::X264,
            encoder_override: String::new(),
            rate_control: RateControl::Crf,
            quality: 18,
            bitrate_kbps: 0,
            max_bitrate_kbps: 0,
            buffer_size_kbps: 0,
            preset: "slow".to_string(),
            tune: String::new(),
            gop_size: 250,
            bframes: 3,
            threads: 0,
            pixel_format: PixelFormat::Yuv420p8,
            passthrough_color: true,
            color_profile: ColorProfile::default(),
            mastering_display: None,
            content_light_level: None,
            container: "mp4".to_string(),
            audio: AudioConfig::default(),
            extra_args: Vec::new(),
            prores_profile: 4,
            prores_vendor: "apl0".to_string(),
            prores_bits_per_mb: 8000,
            ffv1_level: 3,
            ffv1_coder: 2,
            ffv1_context: 1,
            ffv1_slices: 12,
            x264_params: String::new(),
            b_adapt: 0,
            rc_lookahead: 0,
            qp_cb_offset: 0,
            qp_cr_offset: 0,
        }
    }
}
