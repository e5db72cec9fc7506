use std::path::Path;
use std::process::Command;
use tracing::debug;

use crate::error::{Result, RecutError};
use crate::segment::ClipDescriptor;

/// Abstract media processing command representation
#[derive(Debug, Clone)]
pub struct MediaCommand {
    pub binary_path: String,
    pub args: Vec<String>,
    pub description: String,
}

impl MediaCommand {
    /// Create a new media processing command
    pub fn new<S1: Into<String>, S2: Into<String>>(binary_path: S1, description: S2) -> Self {
        Self {
            binary_path: binary_path.into(),
            args: Vec::new(),
            description: description.into(),
        }
    }

    /// Add an argument
    pub fn arg<S: Into<String>>(mut self, arg: S) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add input file
    pub fn input<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg("-i").arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Add output file
    pub fn output<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Force overwrite output
    pub fn overwrite(self) -> Self {
        self.arg("-y")
    }

    /// Keep ffmpeg quiet apart from errors
    pub fn quiet(self) -> Self {
        self.arg("-hide_banner").arg("-loglevel").arg("error").arg("-nostdin")
    }

    /// Set video codec
    pub fn video_codec<S: Into<String>>(self, codec: S) -> Self {
        self.arg("-c:v").arg(codec)
    }

    /// Set audio codec
    pub fn audio_codec<S: Into<String>>(self, codec: S) -> Self {
        self.arg("-c:a").arg(codec)
    }

    /// Copy all streams
    pub fn copy_streams(self) -> Self {
        self.arg("-c").arg("copy")
    }

    /// Disable video
    pub fn no_video(self) -> Self {
        self.arg("-vn")
    }

    /// Set audio sample rate
    pub fn audio_sample_rate(self, rate: u32) -> Self {
        self.arg("-ar").arg(rate.to_string())
    }

    /// Set audio channels
    pub fn audio_channels(self, channels: u32) -> Self {
        self.arg("-ac").arg(channels.to_string())
    }

    /// Seek to a position in seconds, placed before the input
    pub fn seek(self, seconds: f64) -> Self {
        self.arg("-ss").arg(format!("{:.6}", seconds))
    }

    /// Limit output duration in seconds
    pub fn duration(self, seconds: f64) -> Self {
        self.arg("-t").arg(format!("{:.6}", seconds))
    }

    /// Build the std command without running it
    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.binary_path);
        cmd.args(&self.args);
        cmd
    }

    /// Execute the command, mapping failures with the given error constructor
    pub async fn execute_with(&self, on_error: fn(String) -> RecutError) -> Result<()> {
        self.run(on_error).await.map(|_| ())
    }

    /// Execute the command and return its stdout
    pub async fn capture_with(&self, on_error: fn(String) -> RecutError) -> Result<Vec<u8>> {
        self.run(on_error).await
    }

    /// The child is killed if the returned future is dropped before it exits
    async fn run(&self, on_error: fn(String) -> RecutError) -> Result<Vec<u8>> {
        debug!("Executing media processing command: {} {:?}", self.binary_path, self.args);
        debug!("Description: {}", self.description);

        let output = tokio::process::Command::new(&self.binary_path)
            .args(&self.args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| on_error(format!("Failed to execute {}: {}", self.binary_path, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(on_error(format!(
                "{} failed: {}",
                self.description,
                stderr.trim()
            )));
        }

        Ok(output.stdout)
    }
}

/// Builder for the ffmpeg and ffprobe invocations the pipeline needs
pub struct MediaCommandBuilder {
    binary_path: String,
    probe_path: String,
}

impl MediaCommandBuilder {
    /// Create a new command builder
    pub fn new<S1: Into<String>, S2: Into<String>>(binary_path: S1, probe_path: S2) -> Self {
        Self {
            binary_path: binary_path.into(),
            probe_path: probe_path.into(),
        }
    }

    /// Build stream probe command (JSON on stdout)
    pub fn probe<P: AsRef<Path>>(&self, video_path: P) -> MediaCommand {
        MediaCommand::new(&self.probe_path, "Video probe")
            .arg("-v").arg("error")
            .arg("-select_streams").arg("v:0")
            .arg("-show_entries")
            .arg("stream=width,height,r_frame_rate,avg_frame_rate,nb_frames:format=duration")
            .arg("-of").arg("json")
            .output(video_path)
    }

    /// Build raw frame decode command, frames are written to stdout as packed rgb24
    pub fn decode_frames<P: AsRef<Path>>(&self, video_path: P) -> MediaCommand {
        MediaCommand::new(&self.binary_path, "Frame decoding")
            .quiet()
            .input(video_path)
            .arg("-map").arg("0:v:0")
            .arg("-f").arg("rawvideo")
            .arg("-pix_fmt").arg("rgb24")
            .arg("-")
    }

    /// Build clip extraction command for one time range
    pub fn extract_clip<P: AsRef<Path>>(
        &self,
        video_path: P,
        clip: &ClipDescriptor,
        output_path: P,
        video_codec: &str,
        audio_codec: &str,
        additional_options: &[String],
    ) -> MediaCommand {
        let mut cmd = MediaCommand::new(
            &self.binary_path,
            format!("Clip extraction ({:.3}s-{:.3}s)", clip.start_time, clip.end_time),
        )
        .quiet()
        .overwrite()
        .seek(clip.start_time)
        .input(video_path)
        .duration(clip.duration())
        .video_codec(video_codec)
        .audio_codec(audio_codec)
        .arg("-avoid_negative_ts").arg("make_zero");

        // Add user-specified additional options
        for option in additional_options {
            cmd = cmd.arg(option);
        }

        cmd.output(output_path)
    }

    /// Build concat demuxer command over a list file
    pub fn concatenate<P: AsRef<Path>>(&self, list_file: P, output_path: P) -> MediaCommand {
        MediaCommand::new(&self.binary_path, "Clip concatenation")
            .quiet()
            .overwrite()
            .arg("-f").arg("concat")
            .arg("-safe").arg("0")
            .input(list_file)
            .copy_streams()
            .output(output_path)
    }

    /// Build audio extraction command
    pub fn extract_audio<P: AsRef<Path>>(&self, video_path: P, audio_path: P) -> MediaCommand {
        MediaCommand::new(&self.binary_path, "Audio extraction")
            .quiet()
            .input(video_path)
            .no_video()
            .audio_codec("pcm_s16le")
            .audio_sample_rate(16000)
            .audio_channels(1)
            .overwrite()
            .output(audio_path)
    }
}

/// Render a concat demuxer list, one `file` line per clip
pub fn concat_list<P: AsRef<Path>>(clip_paths: &[P]) -> String {
    let mut list = String::new();
    for path in clip_paths {
        let escaped = path.as_ref().to_string_lossy().replace('\'', "'\\''");
        list.push_str(&format!("file '{}'\n", escaped));
    }
    list
}
