use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Command;
use tracing::{debug, info};

use crate::config::TranscriberConfig;
use crate::error::{Result, RecutError};
use crate::media::MediaCommandBuilder;
use super::{TranscriberTrait, common::{read_json_output, scratch_dir, TranscriptSegment, Transcription, TranscriptionMapper}};

// Structs for parsing whisper.cpp JSON output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhisperCppOutput {
    pub result: Option<WhisperCppResult>,
    pub transcription: Vec<WhisperCppSegment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhisperCppResult {
    pub language: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhisperCppSegment {
    pub offsets: WhisperCppOffsets,
    pub text: String,
}

/// Segment bounds in milliseconds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhisperCppOffsets {
    pub from: i64,
    pub to: i64,
}

pub struct WhisperCppMapper;

impl TranscriptionMapper<WhisperCppOutput> for WhisperCppMapper {
    fn to_transcription(whisper_output: WhisperCppOutput) -> Result<Transcription> {
        let segments = whisper_output
            .transcription
            .into_iter()
            .map(|seg| {
                let start = seg.offsets.from as f64 / 1000.0; // Convert ms to seconds
                let end = seg.offsets.to as f64 / 1000.0;
                TranscriptSegment::new(start, end, seg.text)
            })
            .collect();

        Ok(Transcription {
            segments,
            language: whisper_output.result.map(|r| r.language),
        })
    }
}

/// whisper.cpp implementation, transcribes a 16kHz mono WAV extracted from the source
pub struct WhisperCppTranscriber {
    config: TranscriberConfig,
    command_builder: MediaCommandBuilder,
}

impl WhisperCppTranscriber {
    pub fn new(config: TranscriberConfig, ffmpeg_path: &str) -> Self {
        Self {
            config,
            command_builder: MediaCommandBuilder::new(ffmpeg_path, ""),
        }
    }

    fn build_command(&self, audio_path: &Path, output_base: &Path, language: Option<&str>) -> Command {
        let mut cmd = Command::new(&self.config.binary_path);
        cmd.arg("-oj") // Output JSON format
            .arg("-of").arg(output_base) // Output file base name (without extension)
            .arg("-m").arg(&self.config.model)
            .arg("-f").arg(audio_path)
            .arg("-l").arg(language.unwrap_or("auto"));

        if self.config.device == "cpu" {
            cmd.arg("-ng");
        }

        cmd
    }
}

#[async_trait]
impl TranscriberTrait for WhisperCppTranscriber {
    async fn transcribe(&self, source: &Path, language: Option<&str>) -> Result<Transcription> {
        info!("Transcribing {} with whisper.cpp model {}", source.display(), self.config.model);

        let temp_dir = scratch_dir()?;
        let audio_path = temp_dir.path().join("audio.wav");
        let output_base = temp_dir.path().join("transcript");

        self.command_builder
            .extract_audio(source, audio_path.as_path())
            .execute_with(RecutError::Transcription)
            .await?;

        let mut cmd = tokio::process::Command::from(self.build_command(&audio_path, &output_base, language));
        cmd.kill_on_drop(true);
        debug!("Executing whisper command: {:?}", cmd);

        let output = cmd
            .output()
            .await
            .map_err(|e| RecutError::Transcription(format!("Failed to execute whisper: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RecutError::Transcription(format!("Whisper failed: {}", stderr.trim())));
        }

        let whisper_output: WhisperCppOutput = read_json_output(output_base.with_extension("json"))?;
        let transcription = WhisperCppMapper::to_transcription(whisper_output)?;

        info!("Transcription produced {} segments", transcription.segments.len());
        Ok(transcription)
    }

    fn check_availability(&self) -> Result<()> {
        let output = Command::new(&self.config.binary_path)
            .arg("--help")
            .output()
            .map_err(|e| RecutError::Config(format!("whisper-cli not found: {}", e)))?;

        if output.status.success() {
            info!("whisper.cpp is available");
            Ok(())
        } else {
            Err(RecutError::Config("whisper-cli help check failed".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn test_mapper_converts_millisecond_offsets() {
        let json = r#"{
            "systeminfo": "AVX = 1",
            "result": { "language": "ko" },
            "transcription": [
                {
                    "timestamps": { "from": "00:00:00,000", "to": "00:00:02,400" },
                    "offsets": { "from": 0, "to": 2400 },
                    "text": " hello"
                },
                {
                    "timestamps": { "from": "00:00:03,100", "to": "00:00:05,900" },
                    "offsets": { "from": 3100, "to": 5900 },
                    "text": " world"
                }
            ]
        }"#;

        let output: WhisperCppOutput = serde_json::from_str(json).unwrap();
        let transcription = WhisperCppMapper::to_transcription(output).unwrap();

        assert_eq!(transcription.language.as_deref(), Some("ko"));
        assert_eq!(transcription.segments[0], TranscriptSegment::new(0.0, 2.4, " hello"));
        assert_eq!(transcription.segments[1], TranscriptSegment::new(3.1, 5.9, " world"));
    }

    #[test]
    fn test_auto_language_without_hint() {
        let mut config = Config::default().transcriber;
        config.binary_path = "whisper-cli".to_string();
        let transcriber = WhisperCppTranscriber::new(config, "ffmpeg");

        let cmd = transcriber.build_command(Path::new("a.wav"), Path::new("/tmp/t"), None);
        let args: Vec<String> = cmd.get_args().map(|a| a.to_string_lossy().to_string()).collect();

        let language = args.iter().position(|a| a == "-l").unwrap();
        assert_eq!(args[language + 1], "auto");
        assert!(args.contains(&"-ng".to_string()));
    }
}
