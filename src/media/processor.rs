use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

use crate::config::MediaConfig;
use crate::error::{Result, RecutError};
use crate::segment::ClipDescriptor;
use super::{concat_list, FrameStream, MediaCommandBuilder, MediaProcessorTrait, RawFrameReader, VideoInfo};

/// ffprobe `-of json` output for the selected stream and container
#[derive(Debug, Deserialize)]
pub struct ProbeOutput {
    #[serde(default)]
    pub streams: Vec<ProbeStream>,
    pub format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
pub struct ProbeStream {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub r_frame_rate: Option<String>,
    pub avg_frame_rate: Option<String>,
    pub nb_frames: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProbeFormat {
    pub duration: Option<String>,
}

/// Parse an ffprobe rational such as `30000/1001`; zero or malformed yields None
pub fn parse_frame_rate(value: &str) -> Option<f64> {
    let rate = match value.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().ok()?;
            let den: f64 = den.trim().parse().ok()?;
            if den == 0.0 {
                return None;
            }
            num / den
        }
        None => value.trim().parse().ok()?,
    };

    if rate.is_finite() && rate > 0.0 {
        Some(rate)
    } else {
        None
    }
}

impl ProbeOutput {
    /// Convert probe output into the properties the pipeline relies on
    pub fn into_video_info(self) -> Result<VideoInfo> {
        let stream = self
            .streams
            .into_iter()
            .next()
            .ok_or_else(|| RecutError::SourceUnreadable("No video stream found".to_string()))?;

        let (width, height) = match (stream.width, stream.height) {
            (Some(w), Some(h)) if w > 0 && h > 0 => (w, h),
            _ => {
                return Err(RecutError::SourceUnreadable(
                    "Video stream has no frame dimensions".to_string(),
                ))
            }
        };

        // avg_frame_rate matches the decoded frame cadence; r_frame_rate is the fallback
        let fps = stream
            .avg_frame_rate
            .as_deref()
            .and_then(parse_frame_rate)
            .or_else(|| stream.r_frame_rate.as_deref().and_then(parse_frame_rate))
            .ok_or_else(|| RecutError::SourceUnreadable("Video stream has no frame rate".to_string()))?;

        let duration = self
            .format
            .and_then(|f| f.duration)
            .and_then(|d| d.trim().parse::<f64>().ok())
            .filter(|d| d.is_finite() && *d > 0.0)
            .ok_or_else(|| RecutError::SourceUnreadable("Video has no duration".to_string()))?;

        let frame_count = stream.nb_frames.and_then(|n| n.trim().parse().ok());

        Ok(VideoInfo {
            width,
            height,
            fps,
            duration,
            frame_count,
        })
    }
}

/// Concrete implementation of media processor (FFmpeg-based)
pub struct MediaProcessorImpl {
    config: MediaConfig,
    command_builder: MediaCommandBuilder,
}

impl MediaProcessorImpl {
    /// Create a new media processor implementation
    pub fn new(config: MediaConfig) -> Self {
        let command_builder = MediaCommandBuilder::new(&config.binary_path, &config.probe_path);

        Self {
            config,
            command_builder,
        }
    }
}

#[async_trait]
impl MediaProcessorTrait for MediaProcessorImpl {
    async fn probe(&self, video_path: &Path) -> Result<VideoInfo> {
        debug!("Probing {}", video_path.display());

        let stdout = self
            .command_builder
            .probe(video_path)
            .capture_with(RecutError::SourceUnreadable)
            .await?;

        let probe: ProbeOutput = serde_json::from_slice(&stdout)
            .map_err(|e| RecutError::SourceUnreadable(format!("Failed to parse probe output: {}", e)))?;

        let info = probe.into_video_info()?;
        info!(
            "Video {}x{} at {:.3} fps, {:.3}s",
            info.width, info.height, info.fps, info.duration
        );
        Ok(info)
    }

    fn open_frames(&self, video_path: &Path, info: &VideoInfo) -> Result<FrameStream> {
        let command = self.command_builder.decode_frames(video_path);
        debug!("Starting frame decoder: {:?}", command.args);

        let reader = RawFrameReader::spawn(command.to_command(), info.frame_size())?;
        Ok(Box::new(reader))
    }

    async fn extract_clip(
        &self,
        video_path: &Path,
        clip: &ClipDescriptor,
        output_path: &Path,
    ) -> Result<()> {
        debug!(
            "Extracting {:.3}s-{:.3}s to {}",
            clip.start_time,
            clip.end_time,
            output_path.display()
        );

        self.command_builder
            .extract_clip(
                video_path,
                clip,
                output_path,
                &self.config.video_codec,
                &self.config.audio_codec,
                &self.config.encode_options,
            )
            .execute_with(RecutError::Encoding)
            .await
    }

    async fn concat_clips(&self, clip_paths: &[PathBuf], output_path: &Path) -> Result<()> {
        info!("Concatenating {} clips into {}", clip_paths.len(), output_path.display());

        let list_file = tempfile::Builder::new()
            .prefix("recut-concat-")
            .suffix(".txt")
            .tempfile()
            .map_err(|e| RecutError::Encoding(format!("Failed to create concat list: {}", e)))?;

        tokio::fs::write(list_file.path(), concat_list(clip_paths))
            .await
            .map_err(|e| RecutError::Encoding(format!("Failed to write concat list: {}", e)))?;

        self.command_builder
            .concatenate(list_file.path(), output_path)
            .execute_with(RecutError::Encoding)
            .await
    }

    async fn extract_audio(&self, video_path: &Path, audio_path: &Path) -> Result<()> {
        info!("Extracting audio from {} to {}", video_path.display(), audio_path.display());

        self.command_builder
            .extract_audio(video_path, audio_path)
            .execute_with(RecutError::Transcription)
            .await?;

        info!("Audio extraction completed");
        Ok(())
    }

    fn check_availability(&self) -> Result<()> {
        for binary in [&self.config.binary_path, &self.config.probe_path] {
            let output = Command::new(binary)
                .arg("-version")
                .output()
                .map_err(|e| RecutError::Config(format!("{} not found: {}", binary, e)))?;

            if !output.status.success() {
                return Err(RecutError::Config(format!("{} version check failed", binary)));
            }
        }

        info!("Media processor is available");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_frame_rate() {
        assert_eq!(parse_frame_rate("30/1"), Some(30.0));
        assert!((parse_frame_rate("30000/1001").unwrap() - 29.97).abs() < 0.01);
        assert_eq!(parse_frame_rate("25"), Some(25.0));
        assert_eq!(parse_frame_rate("0/0"), None);
        assert_eq!(parse_frame_rate("abc"), None);
    }

    #[test]
    fn test_probe_output_to_video_info() {
        let json = r#"{
            "programs": [],
            "streams": [
                { "width": 1280, "height": 720, "r_frame_rate": "30/1", "avg_frame_rate": "30/1", "nb_frames": "300" }
            ],
            "format": { "duration": "10.000000" }
        }"#;

        let probe: ProbeOutput = serde_json::from_str(json).unwrap();
        let info = probe.into_video_info().unwrap();

        assert_eq!(info.width, 1280);
        assert_eq!(info.height, 720);
        assert_eq!(info.fps, 30.0);
        assert_eq!(info.duration, 10.0);
        assert_eq!(info.frame_count, Some(300));
        assert_eq!(info.frame_size(), 1280 * 720 * 3);
    }

    #[test]
    fn test_probe_falls_back_to_r_frame_rate() {
        let json = r#"{
            "streams": [ { "width": 2, "height": 2, "r_frame_rate": "24/1", "avg_frame_rate": "0/0" } ],
            "format": { "duration": "1.5" }
        }"#;

        let info = serde_json::from_str::<ProbeOutput>(json).unwrap().into_video_info().unwrap();
        assert_eq!(info.fps, 24.0);
        assert_eq!(info.frame_count, None);
    }

    #[test]
    fn test_probe_without_video_stream_is_unreadable() {
        let json = r#"{ "streams": [], "format": { "duration": "1.0" } }"#;
        let result = serde_json::from_str::<ProbeOutput>(json).unwrap().into_video_info();
        assert!(matches!(result, Err(RecutError::SourceUnreadable(_))));
    }
}
