use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Result, RecutError};

/// One time-coded span of recognized speech
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

impl TranscriptSegment {
    pub fn new<S: Into<String>>(start: f64, end: f64, text: S) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }
}

/// Engine-agnostic transcription result, segments in chronological order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transcription {
    pub segments: Vec<TranscriptSegment>,
    pub language: Option<String>,
}

/// Trait for converting service-specific transcription formats to the shared format
pub trait TranscriptionMapper<T> {
    fn to_transcription(service_result: T) -> Result<Transcription>;
}

/// Read and decode an engine's JSON output file
pub fn read_json_output<T, P>(path: P) -> Result<T>
where
    T: serde::de::DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    if !path.exists() {
        return Err(RecutError::Transcription(format!(
            "Transcriber output not found: {}",
            path.display()
        )));
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| RecutError::Transcription(format!("Failed to read transcriber output: {}", e)))?;

    serde_json::from_str(&content)
        .map_err(|e| RecutError::Transcription(format!("Failed to parse transcriber output: {}", e)))
}

/// Create a scratch directory for engine output
pub fn scratch_dir() -> Result<tempfile::TempDir> {
    tempfile::Builder::new()
        .prefix("recut-transcribe-")
        .tempdir()
        .map_err(|e| RecutError::Transcription(format!("Failed to create temp directory: {}", e)))
}
