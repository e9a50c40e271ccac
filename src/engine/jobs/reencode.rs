//! File-to-file re-encode job.
//!
//! The argument vector follows the ffmpeg convention of input first, then
//! per-stream options, then the output path. Section ordering is fixed —
//! some options are global vs. per-stream sensitive — and reproduced
//! exactly by `build_args`:
//! input, video codec (+ codec-specific block), rate control, encoding
//! params, pixel format, color space, HDR metadata, audio, extra args,
//! output.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::info;
use uuid::Uuid;

use super::ConfigError;
use crate::engine::codec;
use crate::engine::encode::{
    Codec, ColorPrimaries, ColorProfile, ColorRange, ContentLightLevel, EncodeConfig,
    MasteringDisplay, MatrixCoefficients, PixelFormat, RateControl, TransferCharacteristic,
};
use crate::engine::process::{CommandRunner, ToolCommand};
use crate::engine::tools::Toolchain;

/// A validated re-encode of one input file into one output file.
#[derive(Debug, Clone)]
pub struct ReencodeJob {
    pub id: Uuid,
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    config: EncodeConfig,
}

impl ReencodeJob {
    pub fn builder() -> ReencodeBuilder {
        ReencodeBuilder::default()
    }

    pub fn config(&self) -> &EncodeConfig {
        &self.config
    }

    /// Assemble the full ffmpeg argument vector. Pure: same config, same
    /// args.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        self.push_input_args(&mut args);
        self.push_video_codec_args(&mut args);
        self.push_rate_control_args(&mut args);
        self.push_encoding_params(&mut args);
        self.push_pixel_format_args(&mut args);
        self.push_color_space_args(&mut args);
        self.push_hdr_metadata(&mut args);
        self.push_audio_args(&mut args);

        for extra in &self.config.extra_args {
            args.push(extra.clone());
        }

        args.push(self.output_path.display().to_string());
        args
    }

    /// Shell-quoted command line for logging only.
    pub fn command_string(&self, ffmpeg: &Path) -> String {
        ToolCommand::new(ffmpeg).args(self.build_args()).display()
    }

    pub fn execute(&self, tools: &Toolchain, runner: &dyn CommandRunner) -> Result<()> {
        if !self.input_path.exists() {
            anyhow::bail!("input file does not exist: {}", self.input_path.display());
        }

        let cmd = ToolCommand::new(&tools.ffmpeg).args(self.build_args());
        info!(job_id = %self.id, "encode command: {}", cmd.display());

        runner
            .run(&cmd)
            .with_context(|| format!("re-encode of {} failed", self.input_path.display()))
    }

    fn push_input_args(&self, args: &mut Vec<String>) {
        args.push("-i".to_string());
        args.push(self.input_path.display().to_string());
    }

    fn push_video_codec_args(&self, args: &mut Vec<String>) {
        args.push("-c:v".to_string());
        args.push(codec::encoder_name(
            self.config.codec,
            &self.config.encoder_override,
        ));

        match self.config.codec {
            Codec::ProRes => {
                args.push("-profile:v".to_string());
                args.push(self.config.prores_profile.to_string());

                args.push("-vendor".to_string());
                args.push(self.config.prores_vendor.clone());

                args.push("-bits_per_mb".to_string());
                args.push(self.config.prores_bits_per_mb.to_string());
            }
            Codec::Ffv1 => {
                args.push("-coder".to_string());
                args.push(self.config.ffv1_coder.to_string());

                args.push("-context".to_string());
                args.push(self.config.ffv1_context.to_string());

                args.push("-level".to_string());
                args.push(self.config.ffv1_level.to_string());

                args.push("-slices".to_string());
                args.push(self.config.ffv1_slices.to_string());
            }
            Codec::X264 if !self.config.x264_params.is_empty() => {
                args.push("-x264-params".to_string());
                args.push(self.config.x264_params.clone());
            }
            Codec::H264Nvenc | Codec::H265Nvenc => {
                args.push("-b_adapt".to_string());
                args.push(self.config.b_adapt.to_string());

                args.push("-rc-lookahead".to_string());
                args.push(self.config.rc_lookahead.to_string());

                if self.config.qp_cb_offset != 0 {
                    args.push("-qp_cb_offset".to_string());
                    args.push(self.config.qp_cb_offset.to_string());
                }
                if self.config.qp_cr_offset != 0 {
                    args.push("-qp_cr_offset".to_string());
                    args.push(self.config.qp_cr_offset.to_string());
                }
            }
            _ => {}
        }
    }

    fn push_rate_control_args(&self, args: &mut Vec<String>) {
        match self.config.rate_control {
            RateControl::Crf => {
                args.push("-crf".to_string());
                args.push(self.config.quality.to_string());
            }
            RateControl::Cqp => {
                args.push("-qp".to_string());
                args.push(self.config.quality.to_string());
            }
            RateControl::Vbr => {
                if self.config.bitrate_kbps > 0 {
                    args.push("-b:v".to_string());
                    args.push(format!("{}k", self.config.bitrate_kbps));
                }
            }
            RateControl::Cbr => {
                if self.config.bitrate_kbps > 0 {
                    args.push("-b:v".to_string());
                    args.push(format!("{}k", self.config.bitrate_kbps));

                    args.push("-maxrate".to_string());
                    args.push(format!("{}k", self.config.bitrate_kbps));

                    let bufsize = if self.config.buffer_size_kbps > 0 {
                        self.config.buffer_size_kbps
                    } else {
                        self.config.bitrate_kbps * 2
                    };
                    args.push("-bufsize".to_string());
                    args.push(format!("{bufsize}k"));
                }
            }
        }
    }

    fn push_encoding_params(&self, args: &mut Vec<String>) {
        if !self.config.preset.is_empty() {
            args.push("-preset".to_string());
            args.push(self.config.preset.clone());
        }

        if !self.config.tune.is_empty() {
            args.push("-tune".to_string());
            args.push(self.config.tune.clone());
        }

        if self.config.gop_size > 0 {
            args.push("-g".to_string());
            args.push(self.config.gop_size.to_string());
        }

        // B-frames are always emitted; 0 is a meaningful setting
        args.push("-bf".to_string());
        args.push(self.config.bframes.to_string());

        if self.config.threads > 0 {
            args.push("-threads".to_string());
            args.push(self.config.threads.to_string());
        }
    }

    fn push_pixel_format_args(&self, args: &mut Vec<String>) {
        args.push("-pix_fmt".to_string());
        args.push(self.config.pixel_format.as_str().to_string());
    }

    fn push_color_space_args(&self, args: &mut Vec<String>) {
        if self.config.passthrough_color {
            return;
        }

        let profile = &self.config.color_profile;

        args.push("-color_range".to_string());
        args.push(profile.range.as_str().to_string());

        args.push("-colorspace".to_string());
        args.push(profile.matrix.as_str().to_string());

        args.push("-color_primaries".to_string());
        args.push(profile.primaries.as_str().to_string());

        args.push("-color_trc".to_string());
        args.push(profile.transfer.as_str().to_string());
    }

    fn push_hdr_metadata(&self, args: &mut Vec<String>) {
        // HDR10 static metadata only exists for HEVC-family streams; for
        // anything else the optionals stay unread.
        if !self.config.codec.is_hevc_family() {
            return;
        }

        if let Some(cll) = &self.config.content_light_level {
            args.push("-max-cll".to_string());
            args.push(cll.to_arg());
        }

        if let Some(md) = &self.config.mastering_display {
            args.push("-master-display".to_string());
            args.push(md.to_arg());
        }
    }

    fn push_audio_args(&self, args: &mut Vec<String>) {
        let audio = &self.config.audio;

        if audio.copy_audio {
            args.push("-c:a".to_string());
            args.push("copy".to_string());
            return;
        }

        args.push("-c:a".to_string());
        args.push(audio.codec.clone());

        if audio.bitrate_kbps > 0 {
            args.push("-b:a".to_string());
            args.push(format!("{}k", audio.bitrate_kbps));
        }

        args.push("-ar".to_string());
        args.push(audio.sample_rate.to_string());

        args.push("-ac".to_string());
        args.push(audio.channels.to_string());
    }
}

/// Fluent builder for `ReencodeJob`. Shortcut methods can be applied in any
/// order; `build()` validates and freezes.
#[derive(Debug, Default, Clone)]
pub struct ReencodeBuilder {
    input_path: PathBuf,
    output_path: PathBuf,
    config: EncodeConfig,
}

impl ReencodeBuilder {
    pub fn input(mut self, path: impl Into<PathBuf>) -> Self {
        self.input_path = path.into();
        self
    }

    pub fn output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = path.into();
        self
    }

    // Codec shortcuts

    pub fn x264(mut self) -> Self {
        self.config.codec = Codec::X264;
        self
    }

    pub fn x265(mut self) -> Self {
        self.config.codec = Codec::X265;
        self
    }

    /// Alias for `x265`.
    pub fn hevc(self) -> Self {
        self.x265()
    }

    pub fn av1(mut self) -> Self {
        self.config.codec = Codec::Av1;
        self
    }

    pub fn svt_av1(mut self) -> Self {
        self.config.codec = Codec::SvtAv1;
        self
    }

    /// ProRes 4444 defaults: profile 4, Apple vendor tag, 8000 bits/MB,
    /// alpha-capable 10-bit pixel format.
    pub fn prores(mut self) -> Self {
        self.config.codec = Codec::ProRes;
        self.config.prores_profile = 4;
        self.config.prores_vendor = "apl0".to_string();
        self.config.prores_bits_per_mb = 8000;
        self.config.pixel_format = PixelFormat::Yuva444p10;
        self
    }

    /// FFV1 archival defaults, intra-only.
    pub fn ffv1(mut self) -> Self {
        self.config.codec = Codec::Ffv1;
        self.config.ffv1_coder = 2;
        self.config.ffv1_context = 1;
        self.config.ffv1_level = 3;
        self.config.ffv1_slices = 12;
        self.config.gop_size = 1;
        self
    }

    pub fn h264_nvenc(mut self) -> Self {
        self.config.codec = Codec::H264Nvenc;
        self
    }

    pub fn h265_nvenc(mut self) -> Self {
        self.config.codec = Codec::H265Nvenc;
        self
    }

    pub fn codec(mut self, codec: Codec) -> Self {
        self.config.codec = codec;
        self
    }

    pub fn encoder_override(mut self, encoder: impl Into<String>) -> Self {
        self.config.encoder_override = encoder.into();
        self
    }

    // Rate control

    pub fn crf(mut self, value: i32) -> Self {
        self.config.rate_control = RateControl::Crf;
        self.config.quality = value;
        self
    }

    pub fn qp(mut self, value: i32) -> Self {
        self.config.rate_control = RateControl::Cqp;
        self.config.quality = value;
        self
    }

    pub fn vbr(mut self, kbps: i32) -> Self {
        self.config.rate_control = RateControl::Vbr;
        self.config.bitrate_kbps = kbps;
        self
    }

    /// CBR with a default VBV buffer of twice the bitrate; override with
    /// `buffer_size` afterwards if needed.
    pub fn cbr(mut self, kbps: i32) -> Self {
        self.config.rate_control = RateControl::Cbr;
        self.config.bitrate_kbps = kbps;
        self.config.buffer_size_kbps = kbps * 2;
        self
    }

    pub fn buffer_size(mut self, kbps: i32) -> Self {
        self.config.buffer_size_kbps = kbps;
        self
    }

    // Encoding parameters

    pub fn preset(mut self, preset: impl Into<String>) -> Self {
        self.config.preset = preset.into();
        self
    }

    pub fn tune(mut self, tune: impl Into<String>) -> Self {
        self.config.tune = tune.into();
        self
    }

    pub fn gop_size(mut self, frames: i32) -> Self {
        self.config.gop_size = frames;
        self
    }

    pub fn bframes(mut self, count: i32) -> Self {
        self.config.bframes = count;
        self
    }

    pub fn threads(mut self, count: i32) -> Self {
        self.config.threads = count;
        self
    }

    // Pixel format

    pub fn eight_bit(mut self) -> Self {
        self.config.pixel_format = PixelFormat::Yuv420p8;
        self
    }

    pub fn ten_bit(mut self) -> Self {
        self.config.pixel_format = PixelFormat::Yuv420p10;
        self
    }

    pub fn pixel_format(mut self, format: PixelFormat) -> Self {
        self.config.pixel_format = format;
        self
    }

    // ProRes knobs

    pub fn prores_profile(mut self, profile: i32) -> Self {
        self.config.prores_profile = profile;
        self
    }

    pub fn prores_vendor(mut self, vendor: impl Into<String>) -> Self {
        self.config.prores_vendor = vendor.into();
        self
    }

    pub fn prores_bits_per_mb(mut self, bits: i32) -> Self {
        self.config.prores_bits_per_mb = bits;
        self
    }

    // FFV1 knobs

    pub fn ffv1_coder(mut self, coder: i32) -> Self {
        self.config.ffv1_coder = coder;
        self
    }

    pub fn ffv1_context(mut self, context: i32) -> Self {
        self.config.ffv1_context = context;
        self
    }

    pub fn ffv1_level(mut self, level: i32) -> Self {
        self.config.ffv1_level = level;
        self
    }

    pub fn ffv1_slices(mut self, slices: i32) -> Self {
        self.config.ffv1_slices = slices;
        self
    }

    // x264 / NVENC knobs

    pub fn x264_params(mut self, params: impl Into<String>) -> Self {
        self.config.x264_params = params.into();
        self
    }

    pub fn nvenc_b_adapt(mut self, value: i32) -> Self {
        self.config.b_adapt = value;
        self
    }

    pub fn nvenc_rc_lookahead(mut self, frames: i32) -> Self {
        self.config.rc_lookahead = frames;
        self
    }

    pub fn nvenc_qp_cb_offset(mut self, offset: i32) -> Self {
        self.config.qp_cb_offset = offset;
        self
    }

    pub fn nvenc_qp_cr_offset(mut self, offset: i32) -> Self {
        self.config.qp_cr_offset = offset;
        self
    }

    // Color space presets; all of them clear passthrough

    pub fn sdr(mut self) -> Self {
        self.config.passthrough_color = false;
        self.config.color_profile = ColorProfile {
            primaries: ColorPrimaries::Bt709,
            transfer: TransferCharacteristic::Bt1886,
            matrix: MatrixCoefficients::Bt709,
            range: ColorRange::Limited,
        };
        self
    }

    pub fn hdr10(mut self) -> Self {
        self.config.passthrough_color = false;
        self.config.color_profile = ColorProfile {
            primaries: ColorPrimaries::Bt2020,
            transfer: TransferCharacteristic::Pq,
            matrix: MatrixCoefficients::Bt2020Ncl,
            range: ColorRange::Limited,
        };
        self
    }

    pub fn hlg(mut self) -> Self {
        self.config.passthrough_color = false;
        self.config.color_profile = ColorProfile {
            primaries: ColorPrimaries::Bt2020,
            transfer: TransferCharacteristic::Hlg,
            matrix: MatrixCoefficients::Bt2020Ncl,
            range: ColorRange::Limited,
        };
        self
    }

    pub fn color_space(
        mut self,
        primaries: ColorPrimaries,
        transfer: TransferCharacteristic,
        matrix: MatrixCoefficients,
        range: ColorRange,
    ) -> Self {
        self.config.passthrough_color = false;
        self.config.color_profile = ColorProfile {
            primaries,
            transfer,
            matrix,
            range,
        };
        self
    }

    // HDR metadata

    pub fn max_cll(mut self, max_cll: u16, max_fall: u16) -> Self {
        self.config.content_light_level = Some(ContentLightLevel { max_cll, max_fall });
        self
    }

    #[allow(clippy::too_many_arguments)]
    pub fn mastering_display(
        mut self,
        rx: f32,
        ry: f32,
        gx: f32,
        gy: f32,
        bx: f32,
        by: f32,
        wx: f32,
        wy: f32,
        min_lum: f32,
        max_lum: f32,
    ) -> Self {
        self.config.mastering_display = Some(MasteringDisplay {
            red_x: rx,
            red_y: ry,
            green_x: gx,
            green_y: gy,
            blue_x: bx,
            blue_y: by,
            white_x: wx,
            white_y: wy,
            min_luminance: min_lum,
            max_luminance: max_lum,
        });
        self
    }

    // Audio

    pub fn copy_audio(mut self) -> Self {
        self.config.audio.copy_audio = true;
        self
    }

    pub fn audio_codec(mut self, codec: impl Into<String>) -> Self {
        self.config.audio.copy_audio = false;
        self.config.audio.codec = codec.into();
        self
    }

    pub fn audio_bitrate(mut self, kbps: i32) -> Self {
        self.config.audio.bitrate_kbps = kbps;
        self
    }

    pub fn audio_sample_rate(mut self, hz: u32) -> Self {
        self.config.audio.sample_rate = hz;
        self
    }

    pub fn audio_channels(mut self, channels: u16) -> Self {
        self.config.audio.channels = channels;
        self
    }

    // Container and extras

    pub fn container(mut self, name: impl Into<String>) -> Self {
        self.config.container = name.into();
        self
    }

    pub fn extra_args<I>(mut self, args: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.config.extra_args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn add_extra_arg(mut self, arg: impl Into<String>) -> Self {
        self.config.extra_args.push(arg.into());
        self
    }

    // Complete presets

    /// x264 CRF 23 medium, 8-bit, audio copied, mp4.
    pub fn youtube_preset(self) -> Self {
        self.x264()
            .crf(23)
            .preset("medium")
            .eight_bit()
            .copy_audio()
            .container("mp4")
    }

    /// High-quality x264 with tuned motion estimation.
    pub fn x264_preset(self) -> Self {
        self.x264()
            .crf(16)
            .preset("slow")
            .x264_params("direct=spatial:me=umh")
            .pixel_format(PixelFormat::Yuv420p8)
            .copy_audio()
            .container("mp4")
    }

    pub fn x265_preset(self) -> Self {
        self.x265()
            .crf(18)
            .preset("medium")
            .pixel_format(PixelFormat::Yuv420p8)
            .copy_audio()
            .container("mp4")
    }

    pub fn h264_nvenc_preset(self) -> Self {
        self.h264_nvenc()
            .qp(18)
            .preset("p6")
            .nvenc_b_adapt(1)
            .nvenc_rc_lookahead(30)
            .nvenc_qp_cb_offset(-2)
            .nvenc_qp_cr_offset(-2)
            .pixel_format(PixelFormat::Nv12)
            .copy_audio()
            .container("mp4")
    }

    pub fn h265_nvenc_preset(self) -> Self {
        self.h265_nvenc()
            .qp(18)
            .preset("p6")
            .nvenc_b_adapt(1)
            .nvenc_rc_lookahead(30)
            .nvenc_qp_cb_offset(-2)
            .nvenc_qp_cr_offset(-2)
            .pixel_format(PixelFormat::Nv12)
            .copy_audio()
            .container("mp4")
    }

    pub fn prores_preset(self, profile: i32) -> Self {
        self.prores()
            .prores_profile(profile)
            .copy_audio()
            .container("mov")
    }

    pub fn ffv1_preset(self) -> Self {
        self.ffv1().copy_audio().container("mkv")
    }

    /// Validate and freeze. No partially-valid job ever escapes.
    pub fn build(self) -> Result<ReencodeJob, ConfigError> {
        if self.input_path.as_os_str().is_empty() {
            return Err(ConfigError::MissingInput);
        }
        if self.output_path.as_os_str().is_empty() {
            return Err(ConfigError::MissingOutput);
        }

        match self.config.rate_control {
            RateControl::Crf | RateControl::Cqp => {
                if !(0..=51).contains(&self.config.quality) {
                    return Err(ConfigError::QualityOutOfRange(self.config.quality));
                }
            }
            RateControl::Vbr | RateControl::Cbr => {
                if self.config.bitrate_kbps <= 0 {
                    return Err(ConfigError::InvalidBitrate);
                }
            }
        }

        if !codec::codec_container_compatible(self.config.codec, &self.config.container) {
            return Err(ConfigError::IncompatibleContainer {
                codec: self.config.codec.name(),
                container: self.config.container.clone(),
            });
        }

        Ok(ReencodeJob {
            id: Uuid::new_v4(),
            input_path: self.input_path,
            output_path: self.output_path,
            config: self.config,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> ReencodeBuilder {
        ReencodeJob::builder().input("in.mp4").output("out.mp4")
    }

    #[test]
    fn default_build_is_x264_crf() {
        let job = base().build().unwrap();
        let args = job.build_args();

        assert_eq!(args[0], "-i");
        assert_eq!(args[1], "in.mp4");
        assert_eq!(args[2], "-c:v");
        assert_eq!(args[3], "libx264");
        assert!(args.windows(2).any(|w| w == ["-crf", "18"]));
        assert_eq!(args.last().unwrap(), "out.mp4");
    }

    #[test]
    fn section_order_is_fixed() {
        let job = base()
            .x265()
            .crf(20)
            .preset("medium")
            .tune("grain")
            .gop_size(120)
            .threads(8)
            .copy_audio()
            .add_extra_arg("-movflags")
            .add_extra_arg("+faststart")
            .build()
            .unwrap();
        let args = job.build_args();

        let pos = |flag: &str| args.iter().position(|a| a == flag).unwrap();
        assert!(pos("-i") < pos("-c:v"));
        assert!(pos("-c:v") < pos("-crf"));
        assert!(pos("-crf") < pos("-preset"));
        assert!(pos("-preset") < pos("-tune"));
        assert!(pos("-tune") < pos("-g"));
        assert!(pos("-g") < pos("-bf"));
        assert!(pos("-bf") < pos("-threads"));
        assert!(pos("-threads") < pos("-pix_fmt"));
        assert!(pos("-pix_fmt") < pos("-c:a"));
        assert!(pos("-c:a") < pos("-movflags"));
        assert_eq!(args.last().unwrap(), "out.mp4");
    }

    #[test]
    fn qp_emits_qp_not_crf() {
        let job = base().qp(22).build().unwrap();
        let args = job.build_args();
        assert!(args.windows(2).any(|w| w == ["-qp", "22"]));
        assert!(!args.contains(&"-crf".to_string()));
    }

    #[test]
    fn vbr_emits_bitrate_only() {
        let job = base().vbr(4000).build().unwrap();
        let args = job.build_args();
        assert!(args.windows(2).any(|w| w == ["-b:v", "4000k"]));
        assert!(!args.contains(&"-maxrate".to_string()));
        assert!(!args.contains(&"-bufsize".to_string()));
    }

    #[test]
    fn cbr_defaults_buffer_to_twice_bitrate() {
        let job = base().cbr(5000).build().unwrap();
        assert_eq!(job.config().bitrate_kbps, 5000);
        assert_eq!(job.config().buffer_size_kbps, 10000);

        let args = job.build_args();
        assert!(args.windows(2).any(|w| w == ["-b:v", "5000k"]));
        assert!(args.windows(2).any(|w| w == ["-maxrate", "5000k"]));
        assert!(args.windows(2).any(|w| w == ["-bufsize", "10000k"]));
    }

    #[test]
    fn cbr_buffer_override_sticks() {
        let job = base().cbr(5000).buffer_size(8000).build().unwrap();
        let args = job.build_args();
        assert!(args.windows(2).any(|w| w == ["-bufsize", "8000k"]));
    }

    #[test]
    fn passthrough_color_emits_no_color_tokens() {
        // Even with an explicit profile set, passthrough (the default)
        // suppresses the whole color block.
        let job = base().hdr10().build().unwrap();
        let args_tagged = job.build_args();
        assert!(args_tagged.contains(&"-color_primaries".to_string()));

        let job = base().build().unwrap();
        let args = job.build_args();
        for flag in ["-color_range", "-colorspace", "-color_primaries", "-color_trc"] {
            assert!(!args.contains(&flag.to_string()), "{flag} leaked");
        }
    }

    #[test]
    fn color_block_order_is_range_matrix_primaries_trc() {
        let job = base().x265().hdr10().build().unwrap();
        let args = job.build_args();

        let pos = |flag: &str| args.iter().position(|a| a == flag).unwrap();
        assert!(pos("-color_range") < pos("-colorspace"));
        assert!(pos("-colorspace") < pos("-color_primaries"));
        assert!(pos("-color_primaries") < pos("-color_trc"));

        assert!(args.windows(2).any(|w| w == ["-color_range", "tv"]));
        assert!(args.windows(2).any(|w| w == ["-colorspace", "bt2020nc"]));
        assert!(args.windows(2).any(|w| w == ["-color_primaries", "bt2020"]));
        assert!(args.windows(2).any(|w| w == ["-color_trc", "smpte2084"]));
    }

    #[test]
    fn hdr_metadata_requires_hevc_family() {
        let hevc = base()
            .x265()
            .max_cll(1000, 400)
            .mastering_display(0.708, 0.292, 0.170, 0.797, 0.131, 0.046, 0.3127, 0.3290, 0.0, 1000.0)
            .build()
            .unwrap();
        let args = hevc.build_args();
        assert!(args.windows(2).any(|w| w == ["-max-cll", "1000,400"]));
        assert!(args.windows(2).any(|w| {
            w == [
                "-master-display",
                "G(0.17,0.797)B(0.131,0.046)R(0.708,0.292)WP(0.3127,0.329)L(1000,0)",
            ]
        }));

        // Same metadata on x264: nothing emitted
        let x264 = base().x264().max_cll(1000, 400).build().unwrap();
        let args = x264.build_args();
        assert!(!args.contains(&"-max-cll".to_string()));
        assert!(!args.contains(&"-master-display".to_string()));
    }

    #[test]
    fn absent_hdr_metadata_is_never_synthesized() {
        let job = base().x265().build().unwrap();
        let args = job.build_args();
        assert!(!args.contains(&"-max-cll".to_string()));
        assert!(!args.contains(&"-master-display".to_string()));
    }

    #[test]
    fn copy_audio_short_circuits_audio_fields() {
        let job = base()
            .audio_codec("libopus")
            .audio_bitrate(160)
            .copy_audio()
            .build()
            .unwrap();
        let args = job.build_args();
        assert!(args.windows(2).any(|w| w == ["-c:a", "copy"]));
        assert!(!args.contains(&"-b:a".to_string()));
        assert!(!args.contains(&"-ar".to_string()));
        assert!(!args.contains(&"-ac".to_string()));
    }

    #[test]
    fn explicit_audio_settings() {
        let job = base()
            .audio_codec("libopus")
            .audio_bitrate(160)
            .audio_sample_rate(48000)
            .audio_channels(6)
            .build()
            .unwrap();
        let args = job.build_args();
        assert!(args.windows(2).any(|w| w == ["-c:a", "libopus"]));
        assert!(args.windows(2).any(|w| w == ["-b:a", "160k"]));
        assert!(args.windows(2).any(|w| w == ["-ar", "48000"]));
        assert!(args.windows(2).any(|w| w == ["-ac", "6"]));
    }

    #[test]
    fn nvenc_block_and_qp_offsets() {
        let job = base().h265_nvenc_preset().build().unwrap();
        let args = job.build_args();
        assert!(args.windows(2).any(|w| w == ["-c:v", "hevc_nvenc"]));
        assert!(args.windows(2).any(|w| w == ["-b_adapt", "1"]));
        assert!(args.windows(2).any(|w| w == ["-rc-lookahead", "30"]));
        assert!(args.windows(2).any(|w| w == ["-qp_cb_offset", "-2"]));
        assert!(args.windows(2).any(|w| w == ["-qp_cr_offset", "-2"]));
        assert!(args.windows(2).any(|w| w == ["-qp", "18"]));
    }

    #[test]
    fn zero_qp_offsets_are_omitted() {
        let job = base().h264_nvenc().qp(20).build().unwrap();
        let args = job.build_args();
        assert!(!args.contains(&"-qp_cb_offset".to_string()));
        assert!(!args.contains(&"-qp_cr_offset".to_string()));
        // b_adapt and rc-lookahead are always part of the NVENC block
        assert!(args.contains(&"-b_adapt".to_string()));
        assert!(args.contains(&"-rc-lookahead".to_string()));
    }

    #[test]
    fn x264_params_only_for_x264() {
        let job = base().x264_preset().build().unwrap();
        let args = job.build_args();
        assert!(
            args.windows(2)
                .any(|w| w == ["-x264-params", "direct=spatial:me=umh"])
        );

        let job = base().x265().x264_params("me=umh").build().unwrap();
        assert!(!job.build_args().contains(&"-x264-params".to_string()));
    }

    #[test]
    fn build_rejects_out_of_range_quality() {
        assert_eq!(
            base().crf(52).build().unwrap_err(),
            ConfigError::QualityOutOfRange(52)
        );
        assert_eq!(
            base().crf(-1).build().unwrap_err(),
            ConfigError::QualityOutOfRange(-1)
        );
        assert!(base().crf(0).build().is_ok());
        assert!(base().crf(51).build().is_ok());
    }

    #[test]
    fn build_rejects_non_positive_bitrate() {
        assert_eq!(
            base().vbr(0).build().unwrap_err(),
            ConfigError::InvalidBitrate
        );
        assert_eq!(
            base().cbr(-100).build().unwrap_err(),
            ConfigError::InvalidBitrate
        );
    }

    #[test]
    fn build_rejects_missing_paths() {
        let err = ReencodeJob::builder().output("o.mp4").build().unwrap_err();
        assert_eq!(err, ConfigError::MissingInput);

        let err = ReencodeJob::builder().input("i.mp4").build().unwrap_err();
        assert_eq!(err, ConfigError::MissingOutput);
    }

    #[test]
    fn build_gates_container_compatibility() {
        let err = base().container("webm").build().unwrap_err();
        assert!(matches!(err, ConfigError::IncompatibleContainer { .. }));

        assert!(base().av1().crf(30).container("webm").build().is_ok());
        assert!(base().ffv1_preset().build().is_ok());
        assert!(base().ffv1().container("mp4").build().is_err());
    }

    #[test]
    fn encoder_override_bypasses_table() {
        let job = base().encoder_override("libx264rgb").build().unwrap();
        let args = job.build_args();
        assert!(args.windows(2).any(|w| w == ["-c:v", "libx264rgb"]));
    }

    #[test]
    fn extra_args_keep_supplied_order() {
        let job = base()
            .extra_args(["-movflags", "+faststart", "-metadata", "title=x"])
            .build()
            .unwrap();
        let args = job.build_args();
        let start = args.iter().position(|a| a == "-movflags").unwrap();
        assert_eq!(
            &args[start..start + 4],
            &["-movflags", "+faststart", "-metadata", "title=x"]
        );
        assert_eq!(args[start + 4], "out.mp4");
    }

    #[test]
    fn command_string_quotes_spaced_paths() {
        let job = ReencodeJob::builder()
            .input("my movie.mp4")
            .output("out.mp4")
            .build()
            .unwrap();
        let display = job.command_string(Path::new("ffmpeg"));
        assert!(display.starts_with("ffmpeg -i \"my movie.mp4\""));
    }
}
