//! Codec rules engine.
//!
//! The single source of truth for codec-to-argument mapping. Flag names
//! differ non-obviously between families (`-crf` vs `-cq` vs `-qp`) and a
//! wrong flag is silently misinterpreted by the encoder rather than
//! rejected, so every job type routes through this module instead of
//! carrying its own codec knowledge.

use crate::engine::encode::Codec;

/// Map a codec to its ffmpeg encoder name. A non-empty `encoder_override`
/// wins unconditionally.
pub fn encoder_name(codec: Codec, encoder_override: &str) -> String {
    if !encoder_override.is_empty() {
        return encoder_override.to_string();
    }

    let name = match codec {
        Codec::X264 => "libx264",
        Codec::X265 => "libx265",
        Codec::H264Nvenc => "h264_nvenc",
        Codec::H265Nvenc => "hevc_nvenc",
        Codec::Av1 => "libaom-av1",
        Codec::SvtAv1 | Codec::SvtAv1Essential => "libsvtav1",
        Codec::ProRes => "prores_ks",
        Codec::Ffv1 => "ffv1",
    };
    name.to_string()
}

/// Append the codec-specific quality/preset block.
///
/// CRF-family codecs take `-crf`, NVENC takes `-cq`; ProRes and FFV1 ignore
/// the numeric quality entirely and emit their dedicated blocks.
pub fn append_codec_args(args: &mut Vec<String>, codec: Codec, quality: i32, preset: &str) {
    match codec {
        Codec::X264 | Codec::X265 | Codec::Av1 | Codec::SvtAv1 | Codec::SvtAv1Essential => {
            args.push("-crf".to_string());
            args.push(quality.to_string());
            if !preset.is_empty() {
                args.push("-preset".to_string());
                args.push(preset.to_string());
            }
        }
        Codec::H264Nvenc | Codec::H265Nvenc => {
            args.push("-cq".to_string());
            args.push(quality.to_string());
            if !preset.is_empty() {
                args.push("-preset".to_string());
                args.push(preset.to_string());
            }
        }
        Codec::ProRes => append_prores_args(args, 4, "apl0", 8000),
        Codec::Ffv1 => append_ffv1_args(args, 3, 2, 1, 12),
    }
}

/// ProRes argument block. ProRes carries its own alpha-capable 10-bit pixel
/// format; callers must not emit another `-pix_fmt` for it.
pub fn append_prores_args(args: &mut Vec<String>, profile: i32, vendor: &str, bits_per_mb: i32) {
    args.push("-profile:v".to_string());
    args.push(profile.to_string());

    args.push("-vendor".to_string());
    args.push(vendor.to_string());

    args.push("-bits_per_mb".to_string());
    args.push(bits_per_mb.to_string());

    args.push("-pix_fmt".to_string());
    args.push("yuva444p10le".to_string());
}

/// FFV1 argument block. GOP is forced to 1: FFV1 archives are intra-only.
pub fn append_ffv1_args(args: &mut Vec<String>, level: i32, coder: i32, context: i32, slices: i32) {
    args.push("-level".to_string());
    args.push(level.to_string());

    args.push("-coder".to_string());
    args.push(coder.to_string());

    args.push("-context".to_string());
    args.push(context.to_string());

    args.push("-g".to_string());
    args.push("1".to_string());

    args.push("-slices".to_string());
    args.push(slices.to_string());
}

/// File extension for a container name, `.mkv` when unrecognized.
pub fn container_extension(container: &str) -> &'static str {
    match container {
        "mkv" => ".mkv",
        "webm" => ".webm",
        "mp4" => ".mp4",
        "mov" => ".mov",
        _ => ".mkv",
    }
}

/// Whether a codec can be stored in a container.
///
/// WebM only takes AV1-family streams, MP4 takes everything but FFV1, and
/// MKV/MOV take anything.
pub fn codec_container_compatible(codec: Codec, container: &str) -> bool {
    match container {
        "webm" => matches!(codec, Codec::Av1 | Codec::SvtAv1),
        "mp4" => codec != Codec::Ffv1,
        _ => true,
    }
}

/// Whether a quality value is valid for a codec. CRF/CQ codecs constrain to
/// [0,51]; ProRes, FFV1 and the Auto-Boost tiered encoder have no numeric
/// quality to validate.
pub fn validate_quality(codec: Codec, quality: i32) -> bool {
    match codec {
        Codec::X264
        | Codec::X265
        | Codec::Av1
        | Codec::SvtAv1
        | Codec::H264Nvenc
        | Codec::H265Nvenc => (0..=51).contains(&quality),
        _ => true,
    }
}

const X26X_PRESETS: &[&str] = &[
    "ultrafast",
    "superfast",
    "veryfast",
    "faster",
    "fast",
    "medium",
    "slow",
    "slower",
    "veryslow",
];

/// Whether a preset name is valid for a codec. Empty is always accepted
/// (the preset is simply not emitted). NVENC takes its four named presets
/// or the numbered "p1".."p7" family.
pub fn validate_preset(codec: Codec, preset: &str) -> bool {
    if preset.is_empty() {
        return true;
    }

    match codec {
        Codec::X264 | Codec::X265 => X26X_PRESETS.contains(&preset),
        Codec::H264Nvenc | Codec::H265Nvenc => {
            matches!(preset, "fast" | "medium" | "slow" | "hq") || preset.starts_with('p')
        }
        _ => true,
    }
}
