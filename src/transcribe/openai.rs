// OpenAI Whisper Python implementation
// The command-line tool decodes the container itself, so the source video is passed as-is.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Command;
use tracing::{debug, info};

use crate::config::TranscriberConfig;
use crate::error::{Result, RecutError};
use super::{TranscriberTrait, common::{read_json_output, scratch_dir, TranscriptSegment, Transcription, TranscriptionMapper}};

/// OpenAI Whisper specific JSON output format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAIWhisperOutput {
    #[serde(default)]
    pub text: String,
    pub segments: Vec<OpenAIWhisperSegment>,
    pub language: Option<String>,
}

/// OpenAI Whisper specific segment format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAIWhisperSegment {
    pub id: u64,
    pub start: f64,
    pub end: f64,
    pub text: String,
    pub avg_logprob: Option<f64>,
    pub no_speech_prob: Option<f64>,
}

/// Mapper for OpenAI Whisper format to the shared format
pub struct OpenAIWhisperMapper;

impl TranscriptionMapper<OpenAIWhisperOutput> for OpenAIWhisperMapper {
    fn to_transcription(whisper_output: OpenAIWhisperOutput) -> Result<Transcription> {
        let segments = whisper_output
            .segments
            .into_iter()
            .map(|seg| TranscriptSegment::new(seg.start, seg.end, seg.text))
            .collect();

        Ok(Transcription {
            segments,
            language: whisper_output.language,
        })
    }
}

/// OpenAI Whisper implementation
pub struct OpenAITranscriber {
    config: TranscriberConfig,
}

impl OpenAITranscriber {
    pub fn new(config: TranscriberConfig) -> Self {
        Self { config }
    }

    /// Half precision only makes sense for float16 compute on a GPU
    fn use_fp16(&self) -> bool {
        self.config.compute_type.eq_ignore_ascii_case("float16") && self.config.device != "cpu"
    }

    fn build_command(&self, source: &Path, output_dir: &Path, language: Option<&str>) -> Command {
        let mut cmd = Command::new(&self.config.binary_path);
        cmd.arg(source)
            .arg("--model").arg(&self.config.model)
            .arg("--device").arg(&self.config.device)
            .arg("--fp16").arg(if self.use_fp16() { "True" } else { "False" })
            .arg("--output_dir").arg(output_dir)
            .arg("--output_format").arg("json")
            .arg("--verbose").arg("False");

        // Add language if specified
        if let Some(lang) = language {
            cmd.arg("--language").arg(lang);
        }

        cmd
    }
}

#[async_trait]
impl TranscriberTrait for OpenAITranscriber {
    async fn transcribe(&self, source: &Path, language: Option<&str>) -> Result<Transcription> {
        info!("Transcribing {} with whisper model {}", source.display(), self.config.model);

        let temp_dir = scratch_dir()?;
        let output_dir = temp_dir.path();

        let mut cmd = tokio::process::Command::from(self.build_command(source, output_dir, language));
        cmd.kill_on_drop(true);
        debug!("Executing whisper command: {:?}", cmd);

        let output = cmd
            .output()
            .await
            .map_err(|e| RecutError::Transcription(format!("Failed to execute whisper command: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RecutError::Transcription(format!(
                "OpenAI Whisper transcription failed: {}",
                stderr.trim()
            )));
        }

        // whisper names its output after the input stem
        let stem = source
            .file_stem()
            .ok_or_else(|| RecutError::Transcription("Invalid source filename".to_string()))?;
        let json_file = output_dir.join(format!("{}.json", stem.to_string_lossy()));

        let whisper_output: OpenAIWhisperOutput = read_json_output(&json_file)?;
        let transcription = OpenAIWhisperMapper::to_transcription(whisper_output)?;

        info!("Transcription produced {} segments", transcription.segments.len());
        Ok(transcription)
    }

    fn check_availability(&self) -> Result<()> {
        let output = Command::new(&self.config.binary_path)
            .arg("--help")
            .output()
            .map_err(|e| RecutError::Config(format!("whisper command not found: {}", e)))?;

        if output.status.success() {
            info!("OpenAI Whisper command-line tool is available");
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(RecutError::Config(format!(
                "OpenAI Whisper not available. Install with: pip install openai-whisper\nError: {}",
                stderr
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn test_mapper_keeps_segment_order_and_times() {
        let json = r#"{
            "text": " hello world",
            "segments": [
                { "id": 0, "seek": 0, "start": 0.0, "end": 2.4, "text": " hello", "tokens": [1, 2], "avg_logprob": -0.2 },
                { "id": 1, "seek": 0, "start": 3.1, "end": 5.9, "text": " world" }
            ],
            "language": "ko"
        }"#;

        let output: OpenAIWhisperOutput = serde_json::from_str(json).unwrap();
        let transcription = OpenAIWhisperMapper::to_transcription(output).unwrap();

        assert_eq!(transcription.language.as_deref(), Some("ko"));
        assert_eq!(
            transcription.segments,
            vec![
                TranscriptSegment::new(0.0, 2.4, " hello"),
                TranscriptSegment::new(3.1, 5.9, " world"),
            ]
        );
    }

    #[test]
    fn test_command_carries_model_device_and_language() {
        let transcriber = OpenAITranscriber::new(Config::default().transcriber);
        let cmd = transcriber.build_command(Path::new("in.mp4"), Path::new("/tmp/out"), Some("ko"));
        let args: Vec<String> = cmd.get_args().map(|a| a.to_string_lossy().to_string()).collect();

        assert_eq!(args[0], "in.mp4");
        let model = args.iter().position(|a| a == "--model").unwrap();
        assert_eq!(args[model + 1], "base");
        let fp16 = args.iter().position(|a| a == "--fp16").unwrap();
        assert_eq!(args[fp16 + 1], "False");
        let language = args.iter().position(|a| a == "--language").unwrap();
        assert_eq!(args[language + 1], "ko");
    }

    #[test]
    fn test_fp16_only_for_float16_on_gpu() {
        let mut config = Config::default().transcriber;
        config.compute_type = "float16".to_string();
        config.device = "cuda".to_string();
        assert!(OpenAITranscriber::new(config.clone()).use_fp16());

        config.device = "cpu".to_string();
        assert!(!OpenAITranscriber::new(config).use_fp16());
    }
}
