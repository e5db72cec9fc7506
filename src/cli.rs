use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Cut a video at its scene changes and generate subtitles
    Process {
        /// Input video file
        #[arg(short, long)]
        input: PathBuf,

        /// Output directory for processed files
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Scene change threshold (mean absolute pixel difference, 0-255)
        #[arg(short, long)]
        threshold: Option<f64>,

        /// Subtitle timestamp format (seconds, srt)
        #[arg(long)]
        timestamp_format: Option<String>,

        /// Transcribe after assembly instead of alongside it
        #[arg(long)]
        sequential: bool,

        /// Print output paths as JSON
        #[arg(long)]
        json: bool,
    },

    /// Process all video files in a directory
    Batch {
        /// Input directory containing video files
        #[arg(short, long)]
        input_dir: PathBuf,

        /// Output directory for processed files
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Scene change threshold (mean absolute pixel difference, 0-255)
        #[arg(short, long)]
        threshold: Option<f64>,
    },

    /// Detect scene cuts and print the resulting clips without encoding
    Analyze {
        /// Input video file
        #[arg(short, long)]
        input: PathBuf,

        /// Scene change threshold (mean absolute pixel difference, 0-255)
        #[arg(short, long)]
        threshold: Option<f64>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Transcribe a video straight to a subtitle file
    Transcribe {
        /// Input video file
        #[arg(short, long)]
        input: PathBuf,

        /// Output subtitle file
        #[arg(short, long)]
        output: PathBuf,

        /// Source language hint ("auto" for detection)
        #[arg(short, long)]
        language: Option<String>,
    },

    /// List available whisper.cpp models and their status
    Models {
        /// Download all missing models
        #[arg(long)]
        download: bool,
    },

    /// Write the default configuration to a file
    InitConfig {
        /// Destination path
        #[arg(short, long, default_value = "recut.toml")]
        output: PathBuf,
    },
}
