use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info};

use crate::error::{Result, RecutError};
use crate::media::FrameSample;

/// Frame index at which a new scene starts
pub type CutPoint = usize;

/// Frame-difference scene boundary detector.
///
/// Each frame is compared against the frame immediately before it, never
/// against the frame of the last recorded cut.
#[derive(Debug, Clone, Copy)]
pub struct SceneDetector {
    threshold: f64,
}

impl SceneDetector {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    /// Mean absolute per-byte difference between two frames of equal size
    pub fn frame_difference(previous: &[u8], current: &[u8]) -> Result<f64> {
        if previous.len() != current.len() {
            return Err(RecutError::Detection(format!(
                "Frame size changed from {} to {} bytes",
                previous.len(),
                current.len()
            )));
        }

        if current.is_empty() {
            return Ok(0.0);
        }

        let total: u64 = previous
            .iter()
            .zip(current)
            .map(|(a, b)| a.abs_diff(*b) as u64)
            .sum();

        Ok(total as f64 / current.len() as f64)
    }

    /// Scan the frame sequence and return strictly increasing cut points
    pub fn detect<I>(&self, frames: I) -> Result<Vec<CutPoint>>
    where
        I: IntoIterator<Item = Result<FrameSample>>,
    {
        self.detect_cancellable(frames, &AtomicBool::new(false))
    }

    /// Like `detect`, but stops before the next frame once `cancel` is set.
    /// The frame source is dropped on return either way.
    pub fn detect_cancellable<I>(&self, frames: I, cancel: &AtomicBool) -> Result<Vec<CutPoint>>
    where
        I: IntoIterator<Item = Result<FrameSample>>,
    {
        let mut previous: Option<Vec<u8>> = None;
        let mut cut_points = Vec::new();
        let mut frame_count: usize = 0;

        for frame in frames {
            if cancel.load(Ordering::Relaxed) {
                debug!("Scene detection cancelled after {} frames", frame_count);
                return Err(RecutError::Detection("Scene detection cancelled".to_string()));
            }

            let frame = frame?;
            let index = frame_count;

            if let Some(ref retained) = previous {
                let score = Self::frame_difference(retained, &frame.data)?;
                if score > self.threshold {
                    debug!("Scene change at frame {} (score {:.2})", index, score);
                    cut_points.push(index);
                }
            }

            previous = Some(frame.data);
            frame_count += 1;
        }

        info!(
            "Scanned {} frames, found {} scene changes (threshold {:.1})",
            frame_count,
            cut_points.len(),
            self.threshold
        );

        Ok(cut_points)
    }
}

impl Default for SceneDetector {
    fn default() -> Self {
        Self::new(30.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid_frames(levels: &[u8], size: usize) -> Vec<Result<FrameSample>> {
        levels
            .iter()
            .enumerate()
            .map(|(index, level)| Ok(FrameSample { index, data: vec![*level; size] }))
            .collect()
    }

    #[test]
    fn test_single_spike_ten_seconds_at_thirty_fps() {
        let levels: Vec<u8> = (0..300).map(|i| if i < 150 { 10 } else { 200 }).collect();
        let cuts = SceneDetector::new(30.0).detect(solid_frames(&levels, 12)).unwrap();
        assert_eq!(cuts, vec![150]);
    }

    #[test]
    fn test_no_change_above_threshold() {
        let levels: Vec<u8> = (0..100).map(|i| (i % 20) as u8).collect();
        let cuts = SceneDetector::default().detect(solid_frames(&levels, 6)).unwrap();
        assert!(cuts.is_empty());
    }

    #[test]
    fn test_zero_or_one_frame_yields_no_cuts() {
        let detector = SceneDetector::default();
        assert!(detector.detect(Vec::<Result<FrameSample>>::new()).unwrap().is_empty());
        assert!(detector.detect(solid_frames(&[255], 3)).unwrap().is_empty());
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let detector = SceneDetector::new(30.0);
        assert!(detector.detect(solid_frames(&[0, 30], 4)).unwrap().is_empty());
        assert_eq!(detector.detect(solid_frames(&[0, 31], 4)).unwrap(), vec![1]);
    }

    #[test]
    fn test_compares_against_previous_frame_not_last_cut() {
        // Slow drift never crosses the threshold between neighbours
        let drift: Vec<u8> = (0..50).map(|i| (i * 5) as u8).collect();
        assert!(SceneDetector::new(30.0).detect(solid_frames(&drift, 4)).unwrap().is_empty());

        // Alternating frames cut at every step
        let flicker = [0u8, 100, 0, 100, 0];
        let cuts = SceneDetector::new(30.0).detect(solid_frames(&flicker, 4)).unwrap();
        assert_eq!(cuts, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_mean_covers_all_channels_and_positions() {
        // One pixel out of four changes fully on one channel: 255 / 12 bytes
        let previous = vec![0u8; 12];
        let mut current = previous.clone();
        current[5] = 255;
        let score = SceneDetector::frame_difference(&previous, &current).unwrap();
        assert!((score - 21.25).abs() < 1e-9);
    }

    #[test]
    fn test_cut_points_strictly_increasing_and_in_range() {
        let levels: Vec<u8> = (0..200u32).map(|i| ((i * 37) % 256) as u8).collect();
        let cuts = SceneDetector::new(10.0).detect(solid_frames(&levels, 3)).unwrap();

        assert!(!cuts.is_empty());
        assert!(cuts.windows(2).all(|w| w[0] < w[1]));
        assert!(cuts.iter().all(|&c| c > 0 && c < levels.len()));
    }

    #[test]
    fn test_cancel_stops_reading_frames() {
        use std::sync::atomic::AtomicUsize;
        use std::sync::Arc;

        let cancel = Arc::new(AtomicBool::new(false));
        let pulled = Arc::new(AtomicUsize::new(0));

        let flag = cancel.clone();
        let counter = pulled.clone();
        let frames = (0..1000).map(move |index| {
            counter.fetch_add(1, Ordering::SeqCst);
            if index == 5 {
                flag.store(true, Ordering::SeqCst);
            }
            Ok(FrameSample { index, data: vec![0; 4] })
        });

        let result = SceneDetector::default().detect_cancellable(frames, &cancel);
        assert!(matches!(result, Err(RecutError::Detection(_))));
        assert_eq!(pulled.load(Ordering::SeqCst), 6);
    }

    #[test]
    fn test_frame_size_mismatch_is_detection_error() {
        let frames = vec![
            Ok(FrameSample { index: 0, data: vec![0; 4] }),
            Ok(FrameSample { index: 1, data: vec![0; 8] }),
        ];
        let result = SceneDetector::default().detect(frames);
        assert!(matches!(result, Err(RecutError::Detection(_))));
    }

    #[test]
    fn test_source_error_stops_detection() {
        let frames = vec![
            Ok(FrameSample { index: 0, data: vec![0; 4] }),
            Err(RecutError::Detection("corrupt stream".to_string())),
            Ok(FrameSample { index: 2, data: vec![255; 4] }),
        ];
        let result = SceneDetector::default().detect(frames);
        assert!(matches!(result, Err(RecutError::Detection(message)) if message == "corrupt stream"));
    }
}
