use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, RecutError};
use crate::scene::CutPoint;

/// Half-open time range `[start_time, end_time)` of the source, in seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClipDescriptor {
    pub start_time: f64,
    pub end_time: f64,
}

impl ClipDescriptor {
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }
}

/// Convert cut points into an ordered, contiguous partition of `[0, duration)`
pub fn segment(cut_points: &[CutPoint], fps: f64, duration: f64) -> Result<Vec<ClipDescriptor>> {
    if !fps.is_finite() || fps <= 0.0 {
        return Err(RecutError::Segmentation(format!("Invalid frame rate: {}", fps)));
    }
    if !duration.is_finite() || duration <= 0.0 {
        return Err(RecutError::Segmentation(format!("Invalid duration: {}", duration)));
    }

    let mut clips = Vec::with_capacity(cut_points.len() + 1);
    let mut start_time = 0.0;

    for &cut in cut_points {
        let end_time = cut as f64 / fps;

        if end_time >= duration {
            debug!("Cut at frame {} ({:.3}s) lies past the end, stopping", cut, end_time);
            break;
        }
        if end_time <= start_time {
            debug!("Cut at frame {} does not advance past {:.3}s, skipping", cut, start_time);
            continue;
        }

        clips.push(ClipDescriptor { start_time, end_time });
        start_time = end_time;
    }

    if start_time < duration {
        clips.push(ClipDescriptor { start_time, end_time: duration });
    }

    Ok(clips)
}
