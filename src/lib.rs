//! Recut - Scene-Cut Video Editing with Generated Subtitles
//!
//! Detects hard scene changes in a video, cuts it into clips at those
//! boundaries, re-assembles the clips with ffmpeg and writes a subtitle
//! file transcribed from the original audio with whisper.

pub mod cli;
pub mod config;
pub mod error;
pub mod media;
pub mod scene;
pub mod segment;
pub mod assemble;
pub mod subtitle;
pub mod transcribe;
pub mod setup;
pub mod workflow;
