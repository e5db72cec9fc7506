// Speech-to-text engines behind one trait
//
// - OpenAI: whisper command-line tool, reads the source video directly
// - WhisperCpp: whisper-cli over a 16kHz mono WAV extracted with ffmpeg
//
// Each engine parses its own JSON output and maps it into `Transcription`
// through a `TranscriptionMapper`.

pub mod common;
pub mod openai;
pub mod whisper_cpp;

use async_trait::async_trait;
use std::path::Path;

pub use common::*;
pub use crate::config::TranscriberImplementation;
use crate::config::{MediaConfig, TranscriberConfig};
use crate::error::Result;

/// Main trait for speech-to-text engines
#[async_trait]
pub trait TranscriberTrait: Send + Sync {
    /// Transcribe the audio track of a media file into time-ordered segments
    async fn transcribe(&self, source: &Path, language: Option<&str>) -> Result<Transcription>;

    /// Check if the engine is installed
    fn check_availability(&self) -> Result<()>;
}

/// Factory for creating transcriber instances
pub struct TranscriberFactory;

impl TranscriberFactory {
    /// Create a transcriber based on the configured implementation
    pub fn create_transcriber(config: TranscriberConfig, media: &MediaConfig) -> Box<dyn TranscriberTrait> {
        match config.implementation {
            TranscriberImplementation::OpenAI => Box::new(openai::OpenAITranscriber::new(config)),
            TranscriberImplementation::WhisperCpp => {
                Box::new(whisper_cpp::WhisperCppTranscriber::new(config, &media.binary_path))
            }
        }
    }
}
