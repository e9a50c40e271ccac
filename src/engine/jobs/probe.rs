//! Media inspection via ffprobe.
//!
//! ffprobe's JSON output is parsed structurally, but the selection rules
//! are deliberately simple: format-block scalars, stream counts by
//! `codec_type`, and the first video and first audio stream only.

use anyhow::{Context, Result};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::engine::process::{CommandRunner, ToolCommand};
use crate::engine::tools::Toolchain;

/// Probe one media file, optionally exporting the raw JSON and the rendered
/// report next to it.
#[derive(Debug, Clone)]
pub struct ProbeJob {
    pub input_path: PathBuf,
    pub export: bool,
}

impl ProbeJob {
    pub fn new(input_path: impl Into<PathBuf>) -> Self {
        Self {
            input_path: input_path.into(),
            export: false,
        }
    }

    pub fn export(mut self, enabled: bool) -> Self {
        self.export = enabled;
        self
    }

    pub fn build_args(&self) -> Vec<String> {
        vec![
            "-v".to_string(),
            "quiet".to_string(),
            "-print_format".to_string(),
            "json".to_string(),
            "-show_format".to_string(),
            "-show_streams".to_string(),
            self.input_path.display().to_string(),
        ]
    }

    fn export_path(&self, extension: &str) -> PathBuf {
        let stem = self
            .input_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.input_path
            .parent()
            .unwrap_or(Path::new(""))
            .join(format!("{stem}_ffprobe{extension}"))
    }

    pub fn execute(&self, tools: &Toolchain, runner: &dyn CommandRunner) -> Result<ProbeReport> {
        if !self.input_path.exists() {
            anyhow::bail!("input file does not exist: {}", self.input_path.display());
        }

        let cmd = ToolCommand::new(&tools.ffprobe).args(self.build_args());
        info!("probe command: {}", cmd.display());

        let json = runner
            .capture(&cmd)
            .with_context(|| format!("probe of {} failed", self.input_path.display()))?;

        let report = ProbeReport::parse(&json)?;

        if self.export {
            let json_path = self.export_path(".json");
            fs::write(&json_path, &json)
                .with_context(|| format!("could not write {}", json_path.display()))?;

            let txt_path = self.export_path(".txt");
            fs::write(&txt_path, report.render())
                .with_context(|| format!("could not write {}", txt_path.display()))?;

            info!(
                "probe results exported to {} and {}",
                json_path.display(),
                txt_path.display()
            );
        }

        Ok(report)
    }
}

/// First-video-stream metadata.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VideoStreamInfo {
    pub codec_name: Option<String>,
    pub codec_long_name: Option<String>,
    pub width: Option<u64>,
    pub height: Option<u64>,
    pub pix_fmt: Option<String>,
    pub fps: Option<f64>,
}

/// First-audio-stream metadata.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AudioStreamInfo {
    pub codec_name: Option<String>,
    pub codec_long_name: Option<String>,
    pub sample_rate: Option<u32>,
    pub channels: Option<u64>,
    pub channel_layout: Option<String>,
}

/// Parsed and selected subset of an ffprobe run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProbeReport {
    pub filename: Option<String>,
    pub format_name: Option<String>,
    pub format_long_name: Option<String>,
    pub duration_s: Option<f64>,
    pub size_bytes: Option<u64>,
    pub bit_rate: Option<u64>,
    pub video_streams: usize,
    pub audio_streams: usize,
    pub subtitle_streams: usize,
    pub video: Option<VideoStreamInfo>,
    pub audio: Option<AudioStreamInfo>,
}

impl ProbeReport {
    pub fn parse(json: &str) -> Result<Self> {
        let root: Value = serde_json::from_str(json).context("failed to parse ffprobe JSON")?;

        let mut report = ProbeReport::default();

        let format = &root["format"];
        report.filename = format["filename"].as_str().map(str::to_string);
        report.format_name = format["format_name"].as_str().map(str::to_string);
        report.format_long_name = format["format_long_name"].as_str().map(str::to_string);
        // ffprobe emits numeric format fields as strings
        report.duration_s = format["duration"].as_str().and_then(|s| s.parse().ok());
        report.size_bytes = format["size"].as_str().and_then(|s| s.parse().ok());
        report.bit_rate = format["bit_rate"].as_str().and_then(|s| s.parse().ok());

        let streams = root["streams"].as_array().cloned().unwrap_or_default();
        for stream in &streams {
            match stream["codec_type"].as_str() {
                Some("video") => {
                    report.video_streams += 1;
                    if report.video.is_none() {
                        report.video = Some(VideoStreamInfo {
                            codec_name: stream["codec_name"].as_str().map(str::to_string),
                            codec_long_name: stream["codec_long_name"]
                                .as_str()
                                .map(str::to_string),
                            width: stream["width"].as_u64(),
                            height: stream["height"].as_u64(),
                            pix_fmt: stream["pix_fmt"].as_str().map(str::to_string),
                            fps: stream["r_frame_rate"].as_str().and_then(parse_fraction),
                        });
                    }
                }
                Some("audio") => {
                    report.audio_streams += 1;
                    if report.audio.is_none() {
                        report.audio = Some(AudioStreamInfo {
                            codec_name: stream["codec_name"].as_str().map(str::to_string),
                            codec_long_name: stream["codec_long_name"]
                                .as_str()
                                .map(str::to_string),
                            sample_rate: stream["sample_rate"]
                                .as_str()
                                .and_then(|s| s.parse().ok()),
                            channels: stream["channels"].as_u64(),
                            channel_layout: stream["channel_layout"]
                                .as_str()
                                .map(str::to_string),
                        });
                    }
                }
                Some("subtitle") => report.subtitle_streams += 1,
                _ => {}
            }
        }

        Ok(report)
    }

    /// Human-readable report.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let na = "N/A".to_string();

        out.push_str("Media information\n");
        out.push_str("=================\n\n");

        out.push_str("File\n");
        out.push_str(&format!("  {}\n\n", self.filename.as_ref().unwrap_or(&na)));

        out.push_str("Format\n");
        out.push_str(&format!(
            "  Type       : {}\n",
            self.format_name.as_ref().unwrap_or(&na)
        ));
        out.push_str(&format!(
            "  Name       : {}\n",
            self.format_long_name.as_ref().unwrap_or(&na)
        ));
        if let Some(duration) = self.duration_s {
            out.push_str(&format!("  Duration   : {}\n", format_duration(duration)));
        }
        if let Some(size) = self.size_bytes {
            out.push_str(&format!("  Size       : {}\n", format_bytes(size)));
        }
        if let Some(bit_rate) = self.bit_rate {
            out.push_str(&format!("  Bitrate    : {} kb/s\n", bit_rate / 1000));
        }

        out.push_str("\nStreams\n");
        out.push_str(&format!("  Video      : {}\n", self.video_streams));
        out.push_str(&format!("  Audio      : {}\n", self.audio_streams));
        out.push_str(&format!("  Subtitle   : {}\n", self.subtitle_streams));

        if let Some(video) = &self.video {
            out.push_str("\nVideo\n");
            let mut codec = video.codec_name.clone().unwrap_or_else(|| na.clone());
            if let Some(long) = &video.codec_long_name {
                codec.push_str(&format!(" ({long})"));
            }
            out.push_str(&format!("  Codec      : {codec}\n"));
            if let (Some(w), Some(h)) = (video.width, video.height) {
                out.push_str(&format!("  Resolution : {w}x{h}\n"));
            }
            if let Some(pix_fmt) = &video.pix_fmt {
                out.push_str(&format!("  Format     : {pix_fmt}\n"));
            }
            if let Some(fps) = video.fps {
                out.push_str(&format!("  FPS        : {fps:.2}\n"));
            }
        }

        if let Some(audio) = &self.audio {
            out.push_str("\nAudio\n");
            let mut codec = audio.codec_name.clone().unwrap_or_else(|| na.clone());
            if let Some(long) = &audio.codec_long_name {
                codec.push_str(&format!(" ({long})"));
            }
            out.push_str(&format!("  Codec      : {codec}\n"));
            if let Some(rate) = audio.sample_rate {
                out.push_str(&format!("  Sample rate: {rate} Hz\n"));
            }
            if let Some(channels) = audio.channels {
                let layout = audio
                    .channel_layout
                    .as_ref()
                    .map(|l| format!(" ({l})"))
                    .unwrap_or_default();
                out.push_str(&format!("  Channels   : {channels}{layout}\n"));
            }
        }

        out
    }
}

/// `HH:MM:SS.mmm` from seconds.
pub fn format_duration(seconds: f64) -> String {
    let whole = seconds as u64;
    let hours = whole / 3600;
    let minutes = (whole % 3600) / 60;
    let secs = whole % 60;
    let millis = ((seconds - whole as f64) * 1000.0) as u64;
    format!("{hours:02}:{minutes:02}:{secs:02}.{millis:03}")
}

/// Scaled byte count with two decimals, up to TB.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{:.2} {}", size, UNITS[unit])
}

/// Parse a frame-rate fraction like `30000/1001`.
fn parse_fraction(s: &str) -> Option<f64> {
    let (num, den) = s.split_once('/')?;
    let num: f64 = num.parse().ok()?;
    let den: f64 = den.parse().ok()?;
    if den == 0.0 {
        return None;
    }
    Some(num / den)
}
