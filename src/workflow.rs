use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::fs;
use tracing::{info, warn, Instrument};
use uuid::Uuid;
use walkdir::WalkDir;

use crate::assemble::{derived_output_path, VideoAssembler};
use crate::config::Config;
use crate::error::{Result, RecutError};
use crate::media::{MediaProcessorFactory, MediaProcessorTrait, VideoInfo};
use crate::scene::{CutPoint, SceneDetector};
use crate::segment::{segment, ClipDescriptor};
use crate::subtitle::write_subtitles;
use crate::transcribe::{TranscriberFactory, TranscriberTrait};

/// Paths of the two artifacts produced for one source
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputArtifactSet {
    pub video_path: PathBuf,
    pub subtitle_path: PathBuf,
}

/// Scene analysis of a source without encoding anything
#[derive(Debug, Clone, Serialize)]
pub struct SceneReport {
    pub info: VideoInfo,
    pub cut_points: Vec<CutPoint>,
    pub clips: Vec<ClipDescriptor>,
}

/// Raises the flag when dropped so blocking work notices an abandoned caller
struct CancelOnDrop(Arc<AtomicBool>);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

pub struct Workflow {
    config: Config,
    media: Box<dyn MediaProcessorTrait>,
    transcriber: Box<dyn TranscriberTrait>,
}

impl Workflow {
    pub fn new(config: Config) -> Result<Self> {
        let workflow = Self::for_analysis(config)?;
        workflow.transcriber.check_availability()?;
        Ok(workflow)
    }

    /// Build a workflow for `analyze`; only the media tools are required to be installed
    pub fn for_analysis(config: Config) -> Result<Self> {
        config.validate()?;

        let media = MediaProcessorFactory::create_processor(config.media.clone());
        let transcriber = TranscriberFactory::create_transcriber(config.transcriber.clone(), &config.media);

        media.check_availability()?;

        Ok(Self::with_components(config, media, transcriber))
    }

    /// Build a workflow over already constructed collaborators
    pub fn with_components(
        config: Config,
        media: Box<dyn MediaProcessorTrait>,
        transcriber: Box<dyn TranscriberTrait>,
    ) -> Self {
        Self {
            config,
            media,
            transcriber,
        }
    }

    /// Produce the edited video and subtitle file for one source into the configured output directory
    pub async fn process<P: AsRef<Path>>(&self, source: P) -> Result<OutputArtifactSet> {
        self.process_into(source.as_ref(), &self.config.output.output_dir).await
    }

    /// Process a single video file, validating it first
    pub async fn process_single_file<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input_path: P,
        output_dir: Option<Q>,
    ) -> Result<OutputArtifactSet> {
        let input_path = input_path.as_ref();
        info!("Processing single file: {}", input_path.display());

        // Validate input file
        if !input_path.is_file() {
            return Err(RecutError::FileNotFound(input_path.display().to_string()));
        }
        if !self.config.is_allowed_video(input_path) {
            return Err(RecutError::UnsupportedFormat(input_path.display().to_string()));
        }

        let output_dir = match output_dir {
            Some(dir) => dir.as_ref().to_path_buf(),
            None => self.config.output.output_dir.clone(),
        };

        self.process_into(input_path, &output_dir).await
    }

    /// Process all video files in a directory, continuing past per-file failures
    pub async fn process_directory<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input_dir: P,
        output_dir: Option<Q>,
    ) -> Result<Vec<OutputArtifactSet>> {
        let input_dir = input_dir.as_ref();
        info!("Processing directory: {}", input_dir.display());

        if !input_dir.is_dir() {
            return Err(RecutError::Config("Input path is not a directory".to_string()));
        }

        let output_dir = match output_dir {
            Some(dir) => dir.as_ref().to_path_buf(),
            None => self.config.output.output_dir.clone(),
        };

        // Skip our own outputs when they live under the input tree
        let output_root = std::fs::canonicalize(&output_dir).ok();
        let is_output = |path: &Path| match &output_root {
            Some(root) => path
                .canonicalize()
                .map(|p| p.starts_with(root))
                .unwrap_or(false),
            None => false,
        };

        let mut video_files: Vec<PathBuf> = WalkDir::new(input_dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|p| !is_output(p.as_path()))
            .filter(|p| self.config.is_allowed_video(p))
            .collect();
        video_files.sort();

        info!("Found {} video files to process", video_files.len());

        let mut artifacts = Vec::new();
        for video_path in video_files {
            let relative = pathdiff::diff_paths(&video_path, input_dir).unwrap_or_else(|| video_path.clone());
            match self.process_into(&video_path, &output_dir).await {
                Ok(result) => {
                    info!("Successfully processed: {}", relative.display());
                    artifacts.push(result);
                }
                Err(e) => warn!("Failed to process {}: {}", relative.display(), e),
            }
        }

        Ok(artifacts)
    }

    /// Probe, detect and segment without encoding
    pub async fn analyze<P: AsRef<Path>>(&self, source: P) -> Result<SceneReport> {
        let source = source.as_ref();
        let info = self
            .media
            .probe(source)
            .await
            .map_err(|e| RecutError::processing("probe", e))?;

        let cut_points = self
            .detect_scenes(source, &info)
            .await
            .map_err(|e| RecutError::processing("scene detection", e))?;

        let clips = segment(&cut_points, info.fps, info.duration)
            .map_err(|e| RecutError::processing("segmentation", e))?;

        Ok(SceneReport { info, cut_points, clips })
    }

    /// Transcribe a source and write its subtitle file
    pub async fn transcribe_to_subtitles<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        source: P,
        output_path: Q,
    ) -> Result<()> {
        self.generate_subtitles(source.as_ref(), output_path.as_ref()).await
    }

    async fn process_into(&self, source: &Path, output_dir: &Path) -> Result<OutputArtifactSet> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("process", %run_id, source = %source.display());

        async move {
            fs::create_dir_all(output_dir)
                .await
                .map_err(|e| RecutError::processing("output setup", RecutError::Io(e)))?;

            let video_path = derived_output_path(
                source,
                output_dir,
                "edited",
                &self.config.media.output_extension,
            )?;
            let subtitle_path = derived_output_path(source, output_dir, "subtitles", "srt")?;

            let video_branch = self.cut_video(source, &video_path);
            let subtitle_branch = async {
                self.generate_subtitles(source, &subtitle_path)
                    .await
                    .map_err(|e| RecutError::processing("transcription", e))
            };

            if self.config.pipeline.parallel_transcription {
                tokio::try_join!(video_branch, subtitle_branch)?;
            } else {
                video_branch.await?;
                subtitle_branch.await?;
            }

            info!("Processing complete: {} and {}", video_path.display(), subtitle_path.display());
            Ok::<_, RecutError>(OutputArtifactSet {
                video_path,
                subtitle_path,
            })
        }
        .instrument(span)
        .await
    }

    /// Stages 1-3: detect, segment, assemble
    async fn cut_video(&self, source: &Path, output_path: &Path) -> Result<()> {
        let report = self.analyze(source).await?;
        info!(
            "Detected {} cut points, assembling {} clips",
            report.cut_points.len(),
            report.clips.len()
        );

        VideoAssembler::new(self.media.as_ref(), self.config.media.output_extension.as_str())
            .assemble(source, &report.clips, output_path)
            .await
            .map_err(|e| RecutError::processing("assembly", e))
    }

    async fn detect_scenes(&self, source: &Path, info: &VideoInfo) -> Result<Vec<CutPoint>> {
        let frames = self.media.open_frames(source, info)?;
        let detector = SceneDetector::new(self.config.detector.threshold);

        // Dropping this future stops the scan, which drops and kills the decoder
        let cancel = Arc::new(AtomicBool::new(false));
        let _guard = CancelOnDrop(cancel.clone());

        // Frame diffing is CPU-bound and reads a blocking pipe
        tokio::task::spawn_blocking(move || detector.detect_cancellable(frames, &cancel))
            .await
            .map_err(|e| RecutError::Detection(format!("Detection task failed: {}", e)))?
    }

    /// Stage 4: transcribe the original source and format subtitles
    async fn generate_subtitles(&self, source: &Path, output_path: &Path) -> Result<()> {
        let transcription = self
            .transcriber
            .transcribe(source, self.config.transcriber.language.as_deref())
            .await?;

        write_subtitles(&transcription, output_path, self.config.subtitle.timestamp_format).await
    }
}
