use crate::cli::{Cli, Commands};
use anyhow::Result;
use ffkit::config::Config;
use ffkit::engine::{
    Av1BoostJob, CommandRunner, ConcatJob, ExtractFramesJob, ProbeJob, ReencodeJob,
    SequenceEncodeJob, SystemRunner, ThumbnailsJob, Toolchain,
};
use std::path::PathBuf;
use std::process;

pub fn run(cli: Cli) {
    let config = Config::load().unwrap_or_default();
    let tools = Toolchain::locate();
    let runner = SystemRunner;

    let result = dispatch(cli, &config, &tools, &runner);

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn dispatch(
    cli: Cli,
    config: &Config,
    tools: &Toolchain,
    runner: &dyn CommandRunner,
) -> Result<()> {
    match cli.command {
        Commands::Reencode {
            input,
            output,
            codec,
            crf,
            qp,
            vbr,
            cbr,
            preset,
            tune,
            ten_bit,
            container,
            copy_audio,
            audio_codec,
            audio_bitrate,
            hdr10,
            extra,
        } => {
            let mut builder = ReencodeJob::builder()
                .input(input)
                .output(output)
                .codec(codec.to_codec())
                .crf(config.defaults.crf)
                .preset(config.defaults.preset.clone())
                .container(config.defaults.container.clone());

            if let Some(crf) = crf {
                builder = builder.crf(crf);
            }
            if let Some(qp) = qp {
                builder = builder.qp(qp);
            }
            if let Some(kbps) = vbr {
                builder = builder.vbr(kbps);
            }
            if let Some(kbps) = cbr {
                builder = builder.cbr(kbps);
            }
            if let Some(preset) = preset {
                builder = builder.preset(preset);
            }
            if let Some(tune) = tune {
                builder = builder.tune(tune);
            }
            if ten_bit {
                builder = builder.ten_bit();
            }
            if let Some(container) = container {
                builder = builder.container(container);
            }
            if let Some(codec) = audio_codec {
                builder = builder.audio_codec(codec);
            } else if copy_audio || config.defaults.copy_audio {
                builder = builder.copy_audio();
            }
            if let Some(kbps) = audio_bitrate {
                builder = builder.audio_bitrate(kbps);
            }
            if hdr10 {
                builder = builder.hdr10();
            }
            if let Some(extra) = extra {
                // Shell-style parsing so quoted strings with spaces survive
                let tokens = shlex::split(&extra)
                    .unwrap_or_else(|| extra.split_whitespace().map(str::to_string).collect());
                builder = builder.extra_args(tokens);
            }

            let job = builder.build()?;
            job.execute(tools, runner)?;
            println!("Encode finished: {}", job.output_path.display());
            Ok(())
        }

        Commands::EncodeSequence {
            input_dir,
            pattern,
            output_dir,
            filename,
            framerate,
            codec,
            quality,
            preset,
            container,
        } => {
            let job = SequenceEncodeJob::builder()
                .input_dir(input_dir)
                .input_pattern(pattern)
                .output_dir(output_dir)
                .output_filename(filename)
                .framerate(framerate)
                .codec(codec.to_codec())
                .quality(quality.unwrap_or(config.defaults.crf))
                .preset(preset.unwrap_or_else(|| config.defaults.preset.clone()))
                .container(container.unwrap_or_else(|| "mkv".to_string()))
                .build()?;
            job.execute(tools, runner)?;
            println!("Encode finished: {}", job.output_path().display());
            Ok(())
        }

        Commands::ExtractFrames {
            input,
            output_dir,
            format,
            subfolder,
        } => {
            let mut builder = ExtractFramesJob::builder()
                .input(input)
                .output_dir(output_dir)
                .format(format.to_format());
            if let Some(name) = subfolder {
                builder = builder.create_subfolder(true).subfolder_name(name);
            }

            let job = builder.build()?;
            job.execute(tools, runner)?;
            println!("Frames extracted to {}", job.target_dir().display());
            Ok(())
        }

        Commands::Thumbnails {
            input,
            output_dir,
            format,
            threshold,
            subfolder,
        } => {
            let mut builder = ThumbnailsJob::builder()
                .input(input)
                .output_dir(output_dir)
                .format(format.to_format())
                .scene_threshold(threshold.unwrap_or(config.defaults.scene_threshold));
            if let Some(name) = subfolder {
                builder = builder.create_subfolder(true).subfolder_name(name);
            }

            let job = builder.build()?;
            job.execute(tools, runner)?;
            println!(
                "Thumbnails extracted to {} (scene threshold {})",
                job.target_dir().display(),
                job.scene_threshold
            );
            Ok(())
        }

        Commands::Concat { output, inputs } => {
            let job = ConcatJob::builder().inputs(inputs).output(output).build()?;
            job.execute(tools, runner)?;
            println!("Concatenated into {}", job.output.display());
            Ok(())
        }

        Commands::Av1Boost {
            input,
            output,
            quality,
            aggressive,
            unshackle,
            verbose,
            keep_temp,
        } => {
            let job = Av1BoostJob::builder()
                .input(input)
                .output(output)
                .quality(quality.to_quality())
                .aggressive(aggressive)
                .unshackle(unshackle)
                .verbose(verbose || config.boost.verbose)
                .cleanup(!keep_temp && config.boost.cleanup)
                .build()?;
            job.execute(tools, runner)?;
            println!("AV1 encode finished: {}", job.output_path.display());
            Ok(())
        }

        Commands::Probe { file, export } => {
            let job = ProbeJob::new(file).export(export);
            let report = job.execute(tools, runner)?;
            println!("{}", report.render());
            Ok(())
        }

        Commands::CheckTools => {
            print_tool(&tools.ffmpeg, "ffmpeg");
            print_tool(&tools.ffprobe, "ffprobe");
            print_tool(&tools.mkvmerge, "mkvmerge");
            print_tool(&tools.booster, "auto-boost");
            Ok(())
        }

        Commands::InitConfig => {
            let path = Config::config_path()?;
            if Config::exists() {
                println!("Config file already exists: {}", path.display());
            } else {
                Config::ensure_default()?;
                println!("Created default config: {}", path.display());
            }
            Ok(())
        }
    }
}

fn print_tool(path: &PathBuf, name: &str) {
    if path == &PathBuf::from(name) {
        println!("{name}: not bundled, relying on PATH");
    } else {
        println!("{name}: {}", path.display());
    }
}
