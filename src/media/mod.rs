// Modular media processing architecture
//
// This module provides a clean abstraction over media processing operations:
// - Processor: ffmpeg/ffprobe-backed implementation
// - Commands: Command builders and abstractions
// - Frames: Sequential raw frame reader over a decoder child process

pub mod commands;
pub mod frames;
pub mod processor;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub use commands::*;
pub use frames::*;
pub use processor::*;

use crate::config::MediaConfig;
use crate::error::Result;
use crate::segment::ClipDescriptor;

/// Stream properties needed to decode frames and convert indices to time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoInfo {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub duration: f64,
    pub frame_count: Option<u64>,
}

impl VideoInfo {
    /// Bytes per packed rgb24 frame
    pub fn frame_size(&self) -> usize {
        self.width as usize * self.height as usize * 3
    }
}

/// Ordered, finite frame sequence handed to the scene detector
pub type FrameStream = Box<dyn Iterator<Item = Result<FrameSample>> + Send>;

/// Main trait for media processing operations
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaProcessorTrait: Send + Sync {
    /// Read stream properties of the first video stream
    async fn probe(&self, video_path: &Path) -> Result<VideoInfo>;

    /// Start a fresh decode of every frame in the video
    fn open_frames(&self, video_path: &Path, info: &VideoInfo) -> Result<FrameStream>;

    /// Extract one time range of the source into its own file
    async fn extract_clip(
        &self,
        video_path: &Path,
        clip: &ClipDescriptor,
        output_path: &Path,
    ) -> Result<()>;

    /// Concatenate extracted clips in order into the output file
    async fn concat_clips(&self, clip_paths: &[PathBuf], output_path: &Path) -> Result<()>;

    /// Extract 16kHz mono PCM audio from video
    async fn extract_audio(&self, video_path: &Path, audio_path: &Path) -> Result<()>;

    /// Check if media processor is available
    fn check_availability(&self) -> Result<()>;
}

/// Factory for creating media processor instances
pub struct MediaProcessorFactory;

impl MediaProcessorFactory {
    /// Create the default media processor implementation (FFmpeg-based)
    pub fn create_processor(config: MediaConfig) -> Box<dyn MediaProcessorTrait> {
        Box::new(processor::MediaProcessorImpl::new(config))
    }
}
