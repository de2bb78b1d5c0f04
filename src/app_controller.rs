use anyhow::{anyhow, Context, Result};
use log::{error, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;

use crate::app_config::Config;
use crate::engines::command::CommandRecognizerLoader;
use crate::engines::ollama::OllamaTranslator;
use crate::engines::{LazyRecognizer, RecognizerLoader, Translator};
use crate::errors::{EngineError, WorkflowError};
use crate::file_utils::FileManager;
use crate::progress::{CancellationFlag, EventSender, RunStatus, WorkflowEvent};
use crate::subtitle_generator;
use crate::subtitle_processor::SubtitleTrack;
use crate::sync;

// @module: Per-video decision workflow and the directory loop

/// What to do with one video
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoPlan {
    /// A sibling subtitle exists: verify, resync and reuse it
    Resync(PathBuf),
    /// No subtitle next to the video: transcribe from scratch
    Transcribe,
}

/// Result of processing one video
#[derive(Debug, Clone, PartialEq)]
pub struct VideoOutcome {
    /// Branch that was taken
    pub plan: VideoPlan,
    /// Offset applied to the reused subtitle, 0.0 when none
    pub applied_offset: f64,
    /// Number of entries written
    pub entries: usize,
    /// Generated subtitle file
    pub output_path: PathBuf,
    /// Preview text sent to the caller
    pub preview: String,
}

/// Input of a run
#[derive(Debug, Clone)]
pub enum RunTarget {
    /// Every video directly inside the directory
    Directory(PathBuf),
    /// An explicit list of videos
    Files(Vec<PathBuf>),
}

/// Handle on a run executing on its background worker
#[derive(Debug)]
pub struct RunHandle {
    /// Progress, preview and completion events
    pub events: UnboundedReceiver<WorkflowEvent>,
    /// Stops the run before its next video
    pub cancel: CancellationFlag,
    /// Resolves to the final status
    pub join: JoinHandle<RunStatus>,
}

/// Main application controller for subtitle generation
#[derive(Debug)]
pub struct Controller {
    // @field: App configuration
    config: Config,
    // @field: Recognizer owned by this run, loaded on first use
    recognizer: LazyRecognizer,
    // @field: Translation service, required only when translation is enabled
    translator: Option<Arc<dyn Translator>>,
}

impl Controller {
    /// Create a controller with explicit engines
    pub fn new(config: Config, loader: Arc<dyn RecognizerLoader>, translator: Option<Arc<dyn Translator>>) -> Self {
        let recognizer = LazyRecognizer::new(loader, config.transcription.model.clone());
        Self {
            config,
            recognizer,
            translator,
        }
    }

    // @method: Create a controller with the engines named by the configuration
    pub fn with_config(config: Config) -> Result<Self> {
        let loader = Arc::new(CommandRecognizerLoader::new(config.transcription.clone()));
        let translator: Option<Arc<dyn Translator>> = if config.translation.enabled {
            Some(Arc::new(OllamaTranslator::new(&config.translation)?))
        } else {
            None
        };

        Ok(Self::new(config, loader, translator))
    }

    pub fn recognizer(&self) -> &LazyRecognizer {
        &self.recognizer
    }

    /// Decide the branch for a video from the files next to it
    pub fn plan_video(video_path: &Path) -> VideoPlan {
        match FileManager::find_sibling_subtitle(video_path) {
            Some(subtitle) => VideoPlan::Resync(subtitle),
            None => VideoPlan::Transcribe,
        }
    }

    /// Move the controller onto a background worker and start a run
    pub fn spawn(self, target: RunTarget) -> RunHandle {
        let (events, rx) = EventSender::channel();
        let cancel = CancellationFlag::new();
        let worker_cancel = cancel.clone();

        let join = tokio::spawn(async move {
            self.run(target, &events, &worker_cancel).await
        });

        RunHandle { events: rx, cancel, join }
    }

    /// Process a run target sequentially. Always ends with a `Finished` event.
    pub async fn run(&self, target: RunTarget, events: &EventSender, cancel: &CancellationFlag) -> RunStatus {
        let videos = match target {
            RunTarget::Directory(dir) => match Self::collect_videos(&dir) {
                Ok(videos) => videos,
                Err(e) => {
                    error!("Directory workflow error: {}", e);
                    events.finished(RunStatus::Failed, e.to_string());
                    return RunStatus::Failed;
                }
            },
            RunTarget::Files(videos) => videos,
        };

        self.run_videos(&videos, events, cancel).await
    }

    fn collect_videos(dir: &Path) -> Result<Vec<PathBuf>, WorkflowError> {
        if !FileManager::dir_exists(dir) {
            return Err(WorkflowError::MissingInput(format!("Input directory does not exist: {}", dir.display())));
        }

        let videos = FileManager::find_videos(dir).map_err(|e| WorkflowError::File(format!("{:#}", e)))?;
        if videos.is_empty() {
            return Err(WorkflowError::MissingInput(format!("No video files found in directory: {}", dir.display())));
        }
        Ok(videos)
    }

    /// Run the per-video workflow over `videos`. A failing video is reported and skipped.
    pub async fn run_videos(&self, videos: &[PathBuf], events: &EventSender, cancel: &CancellationFlag) -> RunStatus {
        let start_time = Instant::now();
        let total = videos.len();

        if total == 0 {
            let message = WorkflowError::MissingInput("No video files to process".to_string()).to_string();
            events.finished(RunStatus::Failed, message);
            return RunStatus::Failed;
        }

        let mut success_count = 0;
        let mut error_count = 0;

        for (index, video) in videos.iter().enumerate() {
            if cancel.is_cancelled() {
                let message = format!("Cancelled after {} of {} files", index, total);
                warn!("{}", message);
                events.finished(RunStatus::Cancelled, message);
                return RunStatus::Cancelled;
            }

            let name = display_name(video);
            events.progress(format!("Analyzing: {}", name), index, total);

            match self.process_video(video, events).await {
                Ok(outcome) => {
                    info!("Success: {}", outcome.output_path.display());
                    success_count += 1;
                }
                Err(e) => {
                    error!("Error processing file {}: {:#}", name, e);
                    events.send(WorkflowEvent::VideoFailed {
                        index,
                        video: name,
                        message: format!("{:#}", e),
                    });
                    error_count += 1;
                }
            }
        }

        events.progress("Done", total, total);

        let duration = start_time.elapsed();
        info!("Processed {} files in {:.1}s: {} succeeded, {} failed", total, duration.as_secs_f64(), success_count, error_count);

        if error_count == 0 {
            events.finished(RunStatus::Succeeded, format!("Processing of {} files completed.", total));
            RunStatus::Succeeded
        } else {
            events.finished(
                RunStatus::Failed,
                format!("Processed {} of {} files, {} failed.", success_count, total, error_count),
            );
            RunStatus::Failed
        }
    }

    /// Decide, build, style and write the subtitle for one video
    pub async fn process_video(&self, video_path: &Path, events: &EventSender) -> Result<VideoOutcome> {
        if !FileManager::file_exists(video_path) {
            return Err(WorkflowError::MissingInput(format!("Video file does not exist: {}", video_path.display())).into());
        }

        let base_name = video_path.file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .ok_or_else(|| anyhow!("Video path has no file name: {}", video_path.display()))?;

        let plan = Self::plan_video(video_path);
        let mut applied_offset = 0.0;

        let mut track = match &plan {
            VideoPlan::Resync(subtitle_path) => {
                events.progress(format!("Subtitle found for {}. Validating...", base_name), 0, 0);
                let mut track = SubtitleTrack::load(subtitle_path)
                    .map_err(WorkflowError::from)
                    .with_context(|| format!("Failed to load subtitle {}", subtitle_path.display()))?;

                if self.config.sync.auto_verify {
                    let offset = self.probe_offset(video_path, &track).await;
                    if sync::should_apply(offset, self.config.sync.min_offset) {
                        events.progress(format!("Adjusting sync ({}s)...", offset), 0, 0);
                        sync::adjust_offset(&mut track, offset);
                        applied_offset = offset;
                    }
                }
                track
            }
            VideoPlan::Transcribe => {
                events.progress(format!("Transcribing audio of {}...", base_name), 0, 0);
                let engine = self.recognizer.get().await.map_err(WorkflowError::from)?;
                let segments = engine.transcribe(video_path).await.map_err(WorkflowError::from)?;
                SubtitleTrack::from_segments(video_path.to_path_buf(), &segments)
            }
        };

        if self.config.translation.enabled {
            events.progress(format!("Translating subtitles of {}...", base_name), 0, 0);
            self.translate_track(&mut track).await.map_err(WorkflowError::from)?;
        }

        let output_dir = FileManager::resolve_output_dir(&self.config.general.output_dir)?;
        FileManager::ensure_dir(&output_dir)?;

        let output_path = FileManager::generate_output_path(
            video_path,
            &output_dir,
            &self.config.general.output_suffix,
            self.config.general.output_extension(),
        );
        subtitle_generator::generate(&track, &output_path, &self.config.font)?;

        let preview = subtitle_generator::format_preview(&track);
        events.preview(preview.clone());

        Ok(VideoOutcome {
            plan,
            applied_offset,
            entries: track.len(),
            output_path,
            preview,
        })
    }

    /// Alignment probe against the first entry. Any engine trouble means no correction.
    async fn probe_offset(&self, video_path: &Path, track: &SubtitleTrack) -> f64 {
        let Some(first_entry) = track.first() else {
            warn!("Subtitle for {} has no entries, skipping alignment check", video_path.display());
            return 0.0;
        };

        let engine = match self.recognizer.get().await {
            Ok(engine) => engine,
            Err(e) => {
                warn!("Alignment check unavailable: {}", e);
                return 0.0;
            }
        };

        sync::verify_alignment(
            engine.as_ref(),
            video_path,
            first_entry,
            self.config.transcription.probe_seconds,
            self.config.sync.probe_dead_zone,
        )
        .await
    }

    /// Replace entry text through the translator. Timings and count stay as they are.
    async fn translate_track(&self, track: &mut SubtitleTrack) -> Result<(), EngineError> {
        let translator = self.translator.as_ref().ok_or_else(|| {
            EngineError::Translation("translation is enabled but no translator is configured".to_string())
        })?;

        for entry in track.entries.iter_mut() {
            if entry.original_text.is_none() {
                entry.original_text = Some(entry.text.clone());
            }
        }

        let target = &self.config.translation.target_language;
        let translated = translator.translate_batch(&track.entries, target).await?;

        if translated.len() != track.len() {
            return Err(EngineError::EntryCountMismatch {
                expected: track.len(),
                actual: translated.len(),
            });
        }

        for (entry, translation) in track.entries.iter_mut().zip(translated) {
            entry.text = translation.text;
        }

        Ok(())
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
