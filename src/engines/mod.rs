/*!
 * External collaborators used by the workflow.
 *
 * The speech recognizer and the translation service are opaque engines
 * reached through these traits:
 * - `command`: recognizer that runs an external speech-to-text program
 * - `ollama`: translator backed by a local Ollama server
 * - `mock`: deterministic engines for tests
 */

use async_trait::async_trait;
use log::info;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::OnceCell;

use crate::errors::EngineError;
use crate::subtitle_processor::SubtitleEntry;

pub mod command;
pub mod mock;
pub mod ollama;

/// A timed text segment produced by the recognizer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscribedSegment {
    /// Start in seconds
    pub start: f64,
    /// End in seconds
    pub end: f64,
    /// Recognized text
    pub text: String,
}

impl TranscribedSegment {
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self { start, end, text: text.into() }
    }
}

/// Speech recognition engine
#[async_trait]
pub trait RecognitionEngine: Send + Sync + Debug {
    /// Transcribe the whole media file
    ///
    /// # Returns
    /// * Ordered segments, or an error when the engine fails
    async fn transcribe(&self, media_path: &Path) -> Result<Vec<TranscribedSegment>, EngineError>;

    /// Transcribe at most the first `max_seconds` of the media file
    async fn probe_alignment(&self, media_path: &Path, max_seconds: f64) -> Result<Vec<TranscribedSegment>, EngineError>;
}

/// Batch text translation service
#[async_trait]
pub trait Translator: Send + Sync + Debug {
    /// Translate the text of every entry into `target_language`.
    ///
    /// Implementations must return the same number of entries in the same order.
    async fn translate_batch(&self, entries: &[SubtitleEntry], target_language: &str) -> Result<Vec<SubtitleEntry>, EngineError>;
}

/// Builds a recognizer for a model name. Loading is the expensive part.
#[async_trait]
pub trait RecognizerLoader: Send + Sync + Debug {
    async fn load(&self, model: &str) -> Result<Arc<dyn RecognitionEngine>, EngineError>;
}

/// Recognizer owned by a single workflow run, loaded on first use
#[derive(Debug)]
pub struct LazyRecognizer {
    loader: Arc<dyn RecognizerLoader>,
    model: String,
    engine: OnceCell<Arc<dyn RecognitionEngine>>,
}

impl LazyRecognizer {
    pub fn new(loader: Arc<dyn RecognizerLoader>, model: impl Into<String>) -> Self {
        Self {
            loader,
            model: model.into(),
            engine: OnceCell::new(),
        }
    }

    /// Model name this handle loads
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Whether the model has been loaded yet
    pub fn is_loaded(&self) -> bool {
        self.engine.initialized()
    }

    /// Return the engine, loading it the first time. A failed load is retried
    /// on the next call.
    pub async fn get(&self) -> Result<Arc<dyn RecognitionEngine>, EngineError> {
        let engine = self.engine
            .get_or_try_init(|| async {
                info!("Loading recognition model: {}", self.model);
                self.loader.load(&self.model).await
            })
            .await?;
        Ok(Arc::clone(engine))
    }
}
