use std::path::Path;
use tokio::fs;
use tracing::info;

use crate::config::TimestampFormat;
use crate::error::{Result, RecutError};
use crate::transcribe::{TranscriptSegment, Transcription};

/// One numbered subtitle entry
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleCue {
    pub index: usize,
    pub start: f64,
    pub end: f64,
    pub text: String,
}

/// Number segments from 1 in source order; no re-sorting.
/// Every segment keeps its cue, so a blank segment renders an empty text line.
pub fn build_cues(segments: &[TranscriptSegment]) -> Vec<SubtitleCue> {
    segments
        .iter()
        .enumerate()
        .map(|(position, segment)| {
            let start = segment.start.max(0.0);
            SubtitleCue {
                index: position + 1,
                start,
                end: segment.end.max(start),
                text: segment.text.trim().to_string(),
            }
        })
        .collect()
}

/// Render cue blocks: index, time range, text, blank line
pub fn render_cues(cues: &[SubtitleCue], format: TimestampFormat) -> String {
    let mut content = String::new();

    for cue in cues {
        content.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            cue.index,
            format_timestamp(cue.start, format),
            format_timestamp(cue.end, format),
            cue.text
        ));
    }

    content
}

/// Render a transcription as subtitle file content
pub fn format_subtitles(segments: &[TranscriptSegment], format: TimestampFormat) -> String {
    render_cues(&build_cues(segments), format)
}

/// Write subtitle file (UTF-8) from transcription
pub async fn write_subtitles<P: AsRef<Path>>(
    transcription: &Transcription,
    output_path: P,
    format: TimestampFormat,
) -> Result<()> {
    let output_path = output_path.as_ref();
    info!("Generating subtitle file: {}", output_path.display());

    let content = format_subtitles(&transcription.segments, format);

    fs::write(output_path, content).await.map_err(RecutError::Io)?;

    info!("Subtitle file written with {} cues", transcription.segments.len());
    Ok(())
}

pub fn format_timestamp(seconds: f64, format: TimestampFormat) -> String {
    match format {
        TimestampFormat::WholeSeconds => format_clock_time(seconds),
        TimestampFormat::Srt => format_srt_time(seconds),
    }
}

/// Truncate to whole seconds and format as H:MM:SS (hours unpadded)
fn format_clock_time(seconds: f64) -> String {
    let total_seconds = seconds.max(0.0) as u64;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;

    format!("{}:{:02}:{:02}", hours, minutes, secs)
}

/// Format time in seconds to SRT time format (HH:MM:SS,mmm)
fn format_srt_time(seconds: f64) -> String {
    let total_milliseconds = (seconds.max(0.0) * 1000.0).round() as u64;
    let hours = total_milliseconds / 3_600_000;
    let minutes = (total_milliseconds % 3_600_000) / 60_000;
    let secs = (total_milliseconds % 60_000) / 1_000;
    let millis = total_milliseconds % 1_000;

    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, secs, millis)
}
