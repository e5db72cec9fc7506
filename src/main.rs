//! Recut - Scene-Cut Video Editing with Generated Subtitles
//!
//! Command-line entry point: cuts a video at its scene changes, re-assembles
//! it with ffmpeg and writes subtitles transcribed with whisper.

use anyhow::Result;
use clap::Parser;
use std::path::Path;
use tracing::{info, Level};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tracing_appender::{non_blocking, rolling};

use recut::cli::{Args, Commands};
use recut::config::{Config, TimestampFormat};
use recut::error::RecutError;
use recut::setup::SetupManager;
use recut::workflow::Workflow;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Setup logging to both console and file
    setup_logging(args.verbose)?;

    info!("Starting Recut - Scene-Cut Video Editing");

    // Load configuration
    let mut config = match &args.config {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            if Path::new("recut.toml").exists() {
                info!("Found recut.toml in current directory, loading...");
                Config::from_file("recut.toml")?
            } else {
                Config::default()
            }
        }
    };

    let setup_manager = SetupManager::new()?;

    match args.command {
        Commands::Process { input, output_dir, threshold, timestamp_format, sequential, json } => {
            info!("Processing video file: {}", input.display());

            if let Some(threshold) = threshold {
                config.detector.threshold = threshold;
            }
            if let Some(format) = timestamp_format {
                config.subtitle.timestamp_format = parse_timestamp_format(&format)?;
            }
            if sequential {
                config.pipeline.parallel_transcription = false;
            }

            setup_manager.initialize(&mut config).await?;
            let workflow = Workflow::new(config)?;
            let artifacts = workflow.process_single_file(&input, output_dir.as_ref()).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&artifacts)?);
            } else {
                println!("Edited video: {}", artifacts.video_path.display());
                println!("Subtitles:    {}", artifacts.subtitle_path.display());
            }
        }
        Commands::Batch { input_dir, output_dir, threshold } => {
            info!("Processing directory: {}", input_dir.display());

            if let Some(threshold) = threshold {
                config.detector.threshold = threshold;
            }

            setup_manager.initialize(&mut config).await?;
            let workflow = Workflow::new(config)?;
            let artifacts = workflow.process_directory(&input_dir, output_dir.as_ref()).await?;

            for artifact in &artifacts {
                println!("{} | {}", artifact.video_path.display(), artifact.subtitle_path.display());
            }
            println!("Processed {} files", artifacts.len());
        }
        Commands::Analyze { input, threshold, json } => {
            info!("Analyzing scenes: {}", input.display());

            if let Some(threshold) = threshold {
                config.detector.threshold = threshold;
            }

            let workflow = Workflow::for_analysis(config)?;
            let report = workflow.analyze(&input).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!(
                    "\n{}x{} @ {:.3} fps, {:.3}s",
                    report.info.width, report.info.height, report.info.fps, report.info.duration
                );
                println!("Cut points (frame index): {:?}", report.cut_points);
                println!("{:<6} {:<12} {:<12} {:<10}", "Clip", "Start (s)", "End (s)", "Length");
                println!("{}", "-".repeat(42));
                for (i, clip) in report.clips.iter().enumerate() {
                    println!(
                        "{:<6} {:<12.3} {:<12.3} {:<10.3}",
                        i, clip.start_time, clip.end_time, clip.duration()
                    );
                }
            }
        }
        Commands::Transcribe { input, output, language } => {
            info!("Transcribing: {}", input.display());

            if let Some(language) = language {
                config.transcriber.language = match language.as_str() {
                    "auto" => None,
                    _ => Some(language),
                };
            }

            setup_manager.initialize(&mut config).await?;
            let workflow = Workflow::new(config)?;
            workflow.transcribe_to_subtitles(&input, &output).await?;
            println!("Subtitles: {}", output.display());
        }
        Commands::Models { download } => {
            info!("Listing available whisper.cpp models...");

            let models = setup_manager.get_available_models();
            println!("\nAvailable Whisper Models:");
            println!("{:<15} {:<24} {:<10} {:<10}", "Name", "Filename", "Size (MB)", "Status");
            println!("{}", "-".repeat(65));

            let models_dir = setup_manager.models_dir();
            for model in &models {
                let status = if models_dir.join(&model.filename).exists() {
                    "Downloaded"
                } else {
                    "Missing"
                };

                println!("{:<15} {:<24} {:<10.1} {:<10}",
                    model.name, model.filename, model.size_mb, status);
            }

            if download {
                info!("Downloading all missing models...");
                for model in &models {
                    setup_manager.download_model(model).await?;
                }
                info!("All models downloaded successfully");
            }
        }
        Commands::InitConfig { output } => {
            if output.exists() {
                return Err(RecutError::Config(format!(
                    "Refusing to overwrite existing file: {}",
                    output.display()
                ))
                .into());
            }
            Config::default().save_to_file(&output)?;
            println!("Wrote default configuration to {}", output.display());
        }
    }

    info!("Recut completed successfully");
    Ok(())
}

/// Setup logging to both console and file
fn setup_logging(verbose: bool) -> Result<()> {
    let log_dir = std::env::current_dir()?.join(".recut").join("log");
    std::fs::create_dir_all(&log_dir)?;

    // Set up file appender with daily rotation
    let file_appender = rolling::daily(&log_dir, "recut.log");
    let (non_blocking_file, guard) = non_blocking(file_appender);
    // Keep the guard alive for the duration of the program
    std::mem::forget(guard);

    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    let console_layer = fmt::layer()
        .with_target(false)
        .with_file(true)
        .with_line_number(true);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!("Logging initialized - console: {}, file: {}",
          log_level, log_dir.join("recut.log").display());

    Ok(())
}

/// Parse timestamp format from string
fn parse_timestamp_format(format: &str) -> Result<TimestampFormat> {
    match format.to_lowercase().as_str() {
        "seconds" | "whole-seconds" => Ok(TimestampFormat::WholeSeconds),
        "srt" => Ok(TimestampFormat::Srt),
        _ => Err(RecutError::Config(format!(
            "Invalid timestamp format '{}'. Valid formats: seconds, srt",
            format
        )).into()),
    }
}
