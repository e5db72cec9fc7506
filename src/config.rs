use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use crate::error::{Result, RecutError};

// Default values for optional sections
fn default_parallel_transcription() -> bool {
    true
}

fn default_allowed_extensions() -> Vec<String> {
    ["mp4", "avi", "mov", "mkv"].iter().map(|s| s.to_string()).collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub detector: DetectorConfig,
    pub media: MediaConfig,
    pub transcriber: TranscriberConfig,
    pub subtitle: SubtitleConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Mean absolute pixel difference (0-255) above which a frame starts a new scene
    pub threshold: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Path to ffmpeg binary
    pub binary_path: String,
    /// Path to ffprobe binary
    pub probe_path: String,
    /// Video codec used when extracting and writing clips
    pub video_codec: String,
    /// Audio codec used when extracting and writing clips
    pub audio_codec: String,
    /// Container extension of the edited output
    pub output_extension: String,
    /// Additional encoding options for clip extraction
    /// Common options: ["-preset", "medium", "-crf", "23", "-pix_fmt", "yuv420p"]
    pub encode_options: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriberConfig {
    /// Transcription engine
    pub implementation: TranscriberImplementation,
    /// Path to transcriber binary (whisper or whisper-cli)
    pub binary_path: String,
    /// Model name, or a ggml model path for whisper.cpp
    pub model: String,
    /// Inference device (cpu, cuda)
    pub device: String,
    /// Compute precision (int8, float16, float32)
    pub compute_type: String,
    /// Language hint passed to the engine, None for auto-detection
    pub language: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TranscriberImplementation {
    /// OpenAI whisper command-line tool, reads the video directly
    OpenAI,
    /// whisper.cpp command-line tool, reads 16kHz mono WAV
    WhisperCpp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubtitleConfig {
    /// Cue timestamp rendering policy
    pub timestamp_format: TimestampFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimestampFormat {
    /// Truncate to whole seconds, render H:MM:SS
    WholeSeconds,
    /// Strict SRT, render HH:MM:SS,mmm
    Srt,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory receiving the edited video and subtitle file
    pub output_dir: PathBuf,
    /// Video extensions accepted by single-file and batch processing
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Run transcription concurrently with scene detection and assembly
    #[serde(default = "default_parallel_transcription")]
    pub parallel_transcription: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            parallel_transcription: default_parallel_transcription(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            detector: DetectorConfig { threshold: 30.0 },
            media: MediaConfig {
                binary_path: "ffmpeg".to_string(),
                probe_path: "ffprobe".to_string(),
                video_codec: "libx264".to_string(),
                audio_codec: "aac".to_string(),
                output_extension: "mp4".to_string(),
                encode_options: vec![
                    // Example encoding options users can customize:
                    // "-preset".to_string(), "medium".to_string(),
                    // "-crf".to_string(), "23".to_string(),
                ],
            },
            transcriber: TranscriberConfig {
                implementation: TranscriberImplementation::OpenAI,
                binary_path: "whisper".to_string(),
                model: "base".to_string(),
                device: "cpu".to_string(),
                compute_type: "int8".to_string(),
                language: Some("ko".to_string()),
            },
            subtitle: SubtitleConfig {
                timestamp_format: TimestampFormat::WholeSeconds,
            },
            output: OutputConfig {
                output_dir: PathBuf::from("outputs"),
                allowed_extensions: default_allowed_extensions(),
            },
            pipeline: PipelineConfig::default(),
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| RecutError::Config(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| RecutError::Config(format!("Failed to parse config file: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| RecutError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| RecutError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        let threshold = self.detector.threshold;
        if !threshold.is_finite() || !(0.0..=255.0).contains(&threshold) {
            return Err(RecutError::Config(format!(
                "Detector threshold must be within 0-255, got {}",
                threshold
            )));
        }

        let extension = self.media.output_extension.trim_start_matches('.');
        if extension.is_empty() {
            return Err(RecutError::Config("Output extension must not be empty".to_string()));
        }

        if self.media.video_codec.is_empty() {
            return Err(RecutError::Config("Video codec must not be empty".to_string()));
        }

        if self.transcriber.model.is_empty() {
            return Err(RecutError::Config("Transcriber model must not be empty".to_string()));
        }

        Ok(())
    }

    /// Whether a path carries one of the accepted video extensions (case-insensitive)
    pub fn is_allowed_video<P: AsRef<Path>>(&self, path: P) -> bool {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                let ext = ext.to_lowercase();
                self.output.allowed_extensions.iter().any(|allowed| allowed.to_lowercase() == ext)
            })
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.detector.threshold, 30.0);
        assert_eq!(config.transcriber.model, "base");
        assert_eq!(config.transcriber.device, "cpu");
        assert_eq!(config.transcriber.compute_type, "int8");
        assert_eq!(config.transcriber.language.as_deref(), Some("ko"));
        assert_eq!(config.media.video_codec, "libx264");
        assert_eq!(config.subtitle.timestamp_format, TimestampFormat::WholeSeconds);
        assert!(config.pipeline.parallel_transcription);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recut.toml");

        let mut config = Config::default();
        config.detector.threshold = 12.5;
        config.subtitle.timestamp_format = TimestampFormat::Srt;
        config.transcriber.implementation = TranscriberImplementation::WhisperCpp;
        config.save_to_file(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.detector.threshold, 12.5);
        assert_eq!(loaded.subtitle.timestamp_format, TimestampFormat::Srt);
        assert_eq!(loaded.transcriber.implementation, TranscriberImplementation::WhisperCpp);
    }

    #[test]
    fn test_pipeline_section_is_optional() {
        use assert_fs::prelude::*;

        let dir = assert_fs::TempDir::new().unwrap();
        let file = dir.child("recut.toml");

        let content = toml::to_string_pretty(&Config::default()).unwrap();
        let without_pipeline = content.split("[pipeline]").next().unwrap();
        file.write_str(without_pipeline).unwrap();

        let loaded = Config::from_file(file.path()).unwrap();
        assert!(loaded.pipeline.parallel_transcription);
    }

    #[test]
    fn test_validate_rejects_out_of_range_threshold() {
        let mut config = Config::default();
        config.detector.threshold = 300.0;
        assert!(matches!(config.validate(), Err(RecutError::Config(_))));

        config.detector.threshold = f64::NAN;
        assert!(matches!(config.validate(), Err(RecutError::Config(_))));
    }

    #[test]
    fn test_is_allowed_video() {
        let config = Config::default();
        assert!(config.is_allowed_video("clip.mp4"));
        assert!(config.is_allowed_video("CLIP.MKV"));
        assert!(!config.is_allowed_video("notes.txt"));
        assert!(!config.is_allowed_video("no_extension"));
    }
}
