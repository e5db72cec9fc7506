use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{Result, RecutError};
use crate::media::MediaProcessorTrait;
use crate::segment::ClipDescriptor;

/// `<output_dir>/<source-stem>_<suffix>.<extension>`
pub fn derived_output_path(
    source: &Path,
    output_dir: &Path,
    suffix: &str,
    extension: &str,
) -> Result<PathBuf> {
    let stem = source
        .file_stem()
        .ok_or_else(|| RecutError::Config(format!("Invalid video filename: {}", source.display())))?
        .to_string_lossy();

    let extension = extension.trim_start_matches('.');
    Ok(output_dir.join(format!("{}_{}.{}", stem, suffix, extension)))
}

/// Re-assembles the source from its clips, in order, with hard cuts
pub struct VideoAssembler<'a> {
    media: &'a dyn MediaProcessorTrait,
    extension: String,
}

impl<'a> VideoAssembler<'a> {
    pub fn new<S: Into<String>>(media: &'a dyn MediaProcessorTrait, extension: S) -> Self {
        Self {
            media,
            extension: extension.into(),
        }
    }

    /// Extract every clip into a scratch directory, then concatenate into `output_path`.
    ///
    /// The scratch directory is removed when this returns, whether or not
    /// extraction or concatenation failed.
    pub async fn assemble(
        &self,
        source: &Path,
        clips: &[ClipDescriptor],
        output_path: &Path,
    ) -> Result<()> {
        if clips.is_empty() {
            return Err(RecutError::Encoding("No clips to assemble".to_string()));
        }

        info!("Assembling {} clips from {}", clips.len(), source.display());

        let scratch = tempfile::Builder::new()
            .prefix("recut-clips-")
            .tempdir()
            .map_err(|e| RecutError::Encoding(format!("Failed to create clip directory: {}", e)))?;

        let extension = self.extension.trim_start_matches('.');
        let mut clip_paths = Vec::with_capacity(clips.len());

        for (i, clip) in clips.iter().enumerate() {
            let clip_path = scratch.path().join(format!("clip_{:04}.{}", i, extension));
            debug!("Clip {}: {:.3}s-{:.3}s", i, clip.start_time, clip.end_time);

            self.media.extract_clip(source, clip, &clip_path).await?;
            clip_paths.push(clip_path);
        }

        self.media.concat_clips(&clip_paths, output_path).await?;

        info!("Edited video written to {}", output_path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::MockMediaProcessorTrait;
    use mockall::Sequence;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_derived_output_path() {
        let path = derived_output_path(Path::new("/uploads/trip.mov"), Path::new("outputs"), "edited", "mp4").unwrap();
        assert_eq!(path, PathBuf::from("outputs/trip_edited.mp4"));

        let path = derived_output_path(Path::new("trip.mov"), Path::new("out"), "subtitles", ".srt").unwrap();
        assert_eq!(path, PathBuf::from("out/trip_subtitles.srt"));
    }

    #[tokio::test]
    async fn test_extracts_in_clip_order_then_concatenates() {
        let clips = vec![
            ClipDescriptor { start_time: 0.0, end_time: 5.0 },
            ClipDescriptor { start_time: 5.0, end_time: 10.0 },
        ];

        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut media = MockMediaProcessorTrait::new();
        let mut seq = Sequence::new();

        let recorded = seen.clone();
        media
            .expect_extract_clip()
            .times(2)
            .in_sequence(&mut seq)
            .returning(move |_, clip, _| {
                recorded.lock().unwrap().push(*clip);
                Ok(())
            });
        media
            .expect_concat_clips()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|paths, _| {
                assert_eq!(paths.len(), 2);
                assert!(paths[0].ends_with("clip_0000.mp4"));
                assert!(paths[1].ends_with("clip_0001.mp4"));
                Ok(())
            });

        let assembler = VideoAssembler::new(&media, "mp4");
        assembler.assemble(Path::new("in.mp4"), &clips, Path::new("out.mp4")).await.unwrap();

        assert_eq!(*seen.lock().unwrap(), clips);
    }

    #[tokio::test]
    async fn test_extraction_failure_stops_before_concat() {
        let clips = vec![
            ClipDescriptor { start_time: 0.0, end_time: 1.0 },
            ClipDescriptor { start_time: 1.0, end_time: 2.0 },
        ];

        let mut media = MockMediaProcessorTrait::new();
        media
            .expect_extract_clip()
            .times(1)
            .returning(|_, _, _| Err(RecutError::Encoding("seek failed".to_string())));
        media.expect_concat_clips().times(0);

        let assembler = VideoAssembler::new(&media, "mp4");
        let result = assembler.assemble(Path::new("in.mp4"), &clips, Path::new("out.mp4")).await;
        assert!(matches!(result, Err(RecutError::Encoding(_))));
    }

    #[tokio::test]
    async fn test_scratch_dir_removed_after_failure() {
        let clips = vec![ClipDescriptor { start_time: 0.0, end_time: 1.0 }];
        let written = Arc::new(Mutex::new(None));

        let recorded = written.clone();
        let mut media = MockMediaProcessorTrait::new();
        media.expect_extract_clip().returning(move |_, _, out| {
            std::fs::write(out, b"partial").unwrap();
            *recorded.lock().unwrap() = Some(out.to_path_buf());
            Err(RecutError::Encoding("encoder crashed".to_string()))
        });

        let assembler = VideoAssembler::new(&media, "mp4");
        let result = assembler.assemble(Path::new("in.mp4"), &clips, Path::new("out.mp4")).await;
        assert!(result.is_err());

        let clip_path = written.lock().unwrap().clone().unwrap();
        let scratch = clip_path.parent().unwrap();
        assert!(scratch.file_name().unwrap().to_string_lossy().starts_with("recut-clips-"));
        assert!(!scratch.exists());
    }

    #[tokio::test]
    async fn test_empty_clip_list_is_encoding_error() {
        let media = MockMediaProcessorTrait::new();
        let assembler = VideoAssembler::new(&media, "mp4");
        let result = assembler.assemble(Path::new("in.mp4"), &[], Path::new("out.mp4")).await;
        assert!(matches!(result, Err(RecutError::Encoding(_))));
    }
}
