use async_trait::async_trait;
use log::{debug, error};
use serde::Deserialize;
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;

use crate::app_config::TranscriptionConfig;
use crate::engines::{RecognitionEngine, RecognizerLoader, TranscribedSegment};
use crate::errors::EngineError;

// @module: Recognizer backed by an external speech-to-text program

/// Output accepted on the program's stdout: `{"segments": [...]}` or a bare array
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RecognizerOutput {
    Wrapped { segments: Vec<TranscribedSegment> },
    Bare(Vec<TranscribedSegment>),
}

impl RecognizerOutput {
    fn into_segments(self) -> Vec<TranscribedSegment> {
        match self {
            Self::Wrapped { segments } => segments,
            Self::Bare(segments) => segments,
        }
    }
}

/// Runs a configured program once per request and parses its JSON output
#[derive(Debug, Clone)]
pub struct CommandRecognizer {
    program: String,
    model: String,
    args: Vec<String>,
    probe_args: Vec<String>,
    timeout: Duration,
}

impl CommandRecognizer {
    pub fn new(config: &TranscriptionConfig, model: impl Into<String>) -> Self {
        Self {
            program: config.program.clone(),
            model: model.into(),
            args: config.args.clone(),
            probe_args: config.probe_args.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Substitute `{input}`, `{model}` and `{duration}` in an argument template
    pub fn expand_args(template: &[String], input: &Path, model: &str, duration: Option<f64>) -> Vec<String> {
        let input = input.to_string_lossy();
        let duration = duration.map(|d| format!("{}", d)).unwrap_or_default();

        template.iter()
            .map(|arg| {
                arg.replace("{input}", &input)
                    .replace("{model}", model)
                    .replace("{duration}", &duration)
            })
            .collect()
    }

    /// Parse recognizer stdout into segments
    pub fn parse_output(stdout: &str) -> Result<Vec<TranscribedSegment>, EngineError> {
        let output: RecognizerOutput = serde_json::from_str(stdout.trim())
            .map_err(|e| EngineError::InvalidOutput(format!("Failed to parse recognizer JSON: {}", e)))?;
        Ok(output.into_segments())
    }

    async fn run(&self, args: Vec<String>) -> Result<Vec<TranscribedSegment>, EngineError> {
        debug!("Running {} {:?}", self.program, args);

        let child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        let output = tokio::select! {
            result = child => {
                result.map_err(|e| EngineError::Recognition(format!("Failed to execute {}: {}", self.program, e)))?
            },
            _ = tokio::time::sleep(self.timeout) => {
                return Err(EngineError::Timeout(self.timeout.as_secs()));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            error!("{} failed: {}", self.program, stderr.trim());
            return Err(EngineError::Recognition(format!("{} exited with {}: {}", self.program, output.status, stderr.trim())));
        }

        Self::parse_output(&String::from_utf8_lossy(&output.stdout))
    }
}

#[async_trait]
impl RecognitionEngine for CommandRecognizer {
    async fn transcribe(&self, media_path: &Path) -> Result<Vec<TranscribedSegment>, EngineError> {
        let args = Self::expand_args(&self.args, media_path, &self.model, None);
        self.run(args).await
    }

    async fn probe_alignment(&self, media_path: &Path, max_seconds: f64) -> Result<Vec<TranscribedSegment>, EngineError> {
        let args = Self::expand_args(&self.probe_args, media_path, &self.model, Some(max_seconds));
        let segments = self.run(args).await?;

        // Programs that ignore {duration} still only count within the window
        Ok(segments.into_iter().filter(|s| s.start < max_seconds).collect())
    }
}

/// Loader that hands out [`CommandRecognizer`]s for the configured program
#[derive(Debug, Clone)]
pub struct CommandRecognizerLoader {
    config: TranscriptionConfig,
}

impl CommandRecognizerLoader {
    pub fn new(config: TranscriptionConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl RecognizerLoader for CommandRecognizerLoader {
    async fn load(&self, model: &str) -> Result<Arc<dyn RecognitionEngine>, EngineError> {
        if self.config.program.trim().is_empty() {
            return Err(EngineError::ModelLoad {
                model: model.to_string(),
                message: "no transcription program configured".to_string(),
            });
        }
        Ok(Arc::new(CommandRecognizer::new(&self.config, model)))
    }
}
