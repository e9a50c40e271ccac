// Integration tests for the Auto-Boost pipeline's step gating, driven
// through the public CommandRunner seam with a scripted runner.

use anyhow::{Result, bail};
use std::cell::RefCell;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

use ffkit::engine::{Av1BoostJob, BoostError, BoostQuality, CommandRunner, ToolCommand, Toolchain};

struct ScriptedRunner<F: Fn(&ToolCommand) -> Result<()>> {
    calls: RefCell<Vec<String>>,
    behavior: F,
}

impl<F: Fn(&ToolCommand) -> Result<()>> ScriptedRunner<F> {
    fn new(behavior: F) -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            behavior,
        }
    }

    fn programs(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl<F: Fn(&ToolCommand) -> Result<()>> CommandRunner for ScriptedRunner<F> {
    fn run(&self, cmd: &ToolCommand) -> Result<()> {
        self.calls.borrow_mut().push(
            cmd.program()
                .file_name()
                .unwrap()
                .to_string_lossy()
                .into_owned(),
        );
        (self.behavior)(cmd)
    }

    fn capture(&self, cmd: &ToolCommand) -> Result<String> {
        self.run(cmd)?;
        Ok(String::new())
    }
}

fn tools() -> Toolchain {
    Toolchain {
        ffmpeg: PathBuf::from("ffmpeg"),
        ffprobe: PathBuf::from("ffprobe"),
        mkvmerge: PathBuf::from("mkvmerge"),
        booster: PathBuf::from("auto-boost"),
    }
}

#[test]
fn test_pipeline_success_runs_all_three_tools_in_order() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("clip.mkv");
    fs::write(&input, b"fake video").unwrap();

    let job = Av1BoostJob::builder()
        .input(&input)
        .output(tmp.path().join("clip_av1.mkv"))
        .quality(BoostQuality::Medium)
        .build()
        .unwrap();

    let ivf = job.booster_output_path();
    let merged = tmp.path().join("output_temp.mkv");
    let runner = ScriptedRunner::new(move |cmd: &ToolCommand| {
        match cmd.program().to_string_lossy().as_ref() {
            "auto-boost" => fs::write(&ivf, b"av1")?,
            "mkvmerge" => fs::write(&merged, b"merged")?,
            _ => {}
        }
        Ok(())
    });

    job.execute(&tools(), &runner).unwrap();
    assert_eq!(runner.programs(), vec!["ffmpeg", "auto-boost", "mkvmerge"]);
    assert!(job.output_path.exists());
}

#[test]
fn test_booster_silent_failure_stops_before_mux() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("clip.mkv");
    fs::write(&input, b"fake video").unwrap();

    let job = Av1BoostJob::builder()
        .input(&input)
        .output(tmp.path().join("clip_av1.mkv"))
        .build()
        .unwrap();

    // Every external process "succeeds" but the booster never writes its
    // output file.
    let runner = ScriptedRunner::new(|_: &ToolCommand| Ok(()));
    let err = job.execute(&tools(), &runner).unwrap_err();

    assert!(matches!(err, BoostError::BoosterOutputMissing(_)));
    assert_eq!(runner.programs(), vec!["ffmpeg", "auto-boost"]);
    assert!(!job.output_path.exists());
}

#[test]
fn test_mux_failure_reports_mux_step() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("clip.mkv");
    fs::write(&input, b"fake video").unwrap();

    let job = Av1BoostJob::builder()
        .input(&input)
        .output(tmp.path().join("clip_av1.mkv"))
        .build()
        .unwrap();

    let ivf = job.booster_output_path();
    let runner = ScriptedRunner::new(move |cmd: &ToolCommand| {
        match cmd.program().to_string_lossy().as_ref() {
            "auto-boost" => {
                fs::write(&ivf, b"av1")?;
                Ok(())
            }
            "mkvmerge" => bail!("track mismatch"),
            _ => Ok(()),
        }
    });

    let err = job.execute(&tools(), &runner).unwrap_err();
    assert!(matches!(err, BoostError::Mux(_)));
}

#[test]
fn test_audio_extraction_demuxes_stream_copy() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("clip.mkv");
    fs::write(&input, b"fake video").unwrap();

    let job = Av1BoostJob::builder()
        .input(&input)
        .output(tmp.path().join("out.mkv"))
        .build()
        .unwrap();

    let seen = RefCell::new(Vec::new());
    let runner = ScriptedRunner::new(|cmd: &ToolCommand| {
        if cmd.program().to_string_lossy() == "ffmpeg" {
            seen.borrow_mut().extend(cmd.argv().to_vec());
        }
        bail!("stop after the first step")
    });

    let _ = job.execute(&tools(), &runner);

    let argv = seen.borrow();
    assert!(argv.contains(&"-vn".to_string()));
    assert!(argv.windows(2).any(|w| w == ["-c:a", "copy"]));
    assert!(argv.iter().any(|a| a.ends_with("clip_audio.mka")));
    assert_eq!(argv.last().unwrap(), "-y");
}
