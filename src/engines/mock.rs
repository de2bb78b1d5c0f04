/*!
 * Mock engine implementations for testing.
 *
 * - `MockRecognizer::working(...)` - Returns canned transcript and probe segments
 * - `MockRecognizer::failing()` - Always fails with an error
 * - `MockTranslator` - Prefixes text, fails, or drops entries on demand
 */

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::engines::{RecognitionEngine, RecognizerLoader, TranscribedSegment, Translator};
use crate::errors::EngineError;
use crate::subtitle_processor::SubtitleEntry;

/// Behavior mode for the mock engines
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds
    Working,
    /// Always fails with an error
    Failing,
    /// Fails for media whose file name contains the marker
    FailOnName(&'static str),
    /// Translator only: returns one entry fewer than it was given
    DropLast,
}

/// Mock recognizer with canned responses
#[derive(Debug)]
pub struct MockRecognizer {
    behavior: MockBehavior,
    transcript: Vec<TranscribedSegment>,
    probe: Vec<TranscribedSegment>,
    transcribe_calls: AtomicUsize,
    probe_calls: AtomicUsize,
    seen: Mutex<Vec<PathBuf>>,
}

impl MockRecognizer {
    pub fn new(behavior: MockBehavior, transcript: Vec<TranscribedSegment>, probe: Vec<TranscribedSegment>) -> Self {
        Self {
            behavior,
            transcript,
            probe,
            transcribe_calls: AtomicUsize::new(0),
            probe_calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Create a working recognizer
    pub fn working(transcript: Vec<TranscribedSegment>, probe: Vec<TranscribedSegment>) -> Self {
        Self::new(MockBehavior::Working, transcript, probe)
    }

    /// Create a recognizer that always errors
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing, Vec::new(), Vec::new())
    }

    /// Number of full transcriptions requested
    pub fn transcribe_calls(&self) -> usize {
        self.transcribe_calls.load(Ordering::SeqCst)
    }

    /// Number of alignment probes requested
    pub fn probe_calls(&self) -> usize {
        self.probe_calls.load(Ordering::SeqCst)
    }

    /// Media paths seen so far, in call order
    pub fn seen_paths(&self) -> Vec<PathBuf> {
        self.seen.lock().map(|seen| seen.clone()).unwrap_or_default()
    }

    fn check(&self, media_path: &Path) -> Result<(), EngineError> {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(media_path.to_path_buf());
        }
        if should_fail(self.behavior, media_path) {
            return Err(EngineError::Recognition(format!("mock failure for {}", media_path.display())));
        }
        Ok(())
    }
}

fn should_fail(behavior: MockBehavior, media_path: &Path) -> bool {
    match behavior {
        MockBehavior::Failing => true,
        MockBehavior::FailOnName(marker) => media_path
            .file_name()
            .is_some_and(|name| name.to_string_lossy().contains(marker)),
        _ => false,
    }
}

#[async_trait]
impl RecognitionEngine for MockRecognizer {
    async fn transcribe(&self, media_path: &Path) -> Result<Vec<TranscribedSegment>, EngineError> {
        self.transcribe_calls.fetch_add(1, Ordering::SeqCst);
        self.check(media_path)?;
        Ok(self.transcript.clone())
    }

    async fn probe_alignment(&self, media_path: &Path, max_seconds: f64) -> Result<Vec<TranscribedSegment>, EngineError> {
        self.probe_calls.fetch_add(1, Ordering::SeqCst);
        self.check(media_path)?;
        Ok(self.probe.iter().filter(|s| s.start < max_seconds).cloned().collect())
    }
}

/// Loader handing out a shared mock recognizer and counting loads
#[derive(Debug)]
pub struct MockRecognizerLoader {
    engine: Option<Arc<MockRecognizer>>,
    loads: AtomicUsize,
}

impl MockRecognizerLoader {
    pub fn new(engine: Arc<MockRecognizer>) -> Self {
        Self { engine: Some(engine), loads: AtomicUsize::new(0) }
    }

    /// Loader whose model never loads
    pub fn broken() -> Self {
        Self { engine: None, loads: AtomicUsize::new(0) }
    }

    /// Number of load attempts
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecognizerLoader for MockRecognizerLoader {
    async fn load(&self, model: &str) -> Result<Arc<dyn RecognitionEngine>, EngineError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        match &self.engine {
            Some(engine) => Ok(Arc::clone(engine) as Arc<dyn RecognitionEngine>),
            None => Err(EngineError::ModelLoad {
                model: model.to_string(),
                message: "mock loader is broken".to_string(),
            }),
        }
    }
}

/// Mock translator that prefixes text with `[lang] `
#[derive(Debug)]
pub struct MockTranslator {
    behavior: MockBehavior,
    calls: AtomicUsize,
}

impl MockTranslator {
    pub fn new(behavior: MockBehavior) -> Self {
        Self { behavior, calls: AtomicUsize::new(0) }
    }

    /// Create a working translator
    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    /// Number of batches translated
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Translator for MockTranslator {
    async fn translate_batch(&self, entries: &[SubtitleEntry], target_language: &str) -> Result<Vec<SubtitleEntry>, EngineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.behavior == MockBehavior::Failing {
            return Err(EngineError::Translation("mock translation failure".to_string()));
        }

        let mut translated: Vec<SubtitleEntry> = entries.iter()
            .map(|entry| {
                let mut out = entry.clone();
                out.text = format!("[{}] {}", target_language, entry.text);
                out
            })
            .collect();

        if self.behavior == MockBehavior::DropLast {
            translated.pop();
        }

        Ok(translated)
    }
}
