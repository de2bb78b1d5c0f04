use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::subtitle_generator::FontStyle;
use crate::subtitle_processor::SubtitleFormat;
use crate::sync::{DEFAULT_MIN_APPLIED_OFFSET, DEFAULT_PROBE_DEAD_ZONE, DEFAULT_PROBE_SECONDS};

/// Upper bound for `translation.retry_count`
pub const MAX_RETRY_COUNT: u32 = 10;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct Config {
    /// Speech recognition settings
    #[serde(default)]
    pub transcription: TranscriptionConfig,

    /// Alignment verification settings
    #[serde(default)]
    pub sync: SyncConfig,

    /// Translation settings
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Output font styling
    #[serde(default)]
    pub font: FontStyle,

    /// Output location and naming
    #[serde(default)]
    pub general: GeneralConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Speech recognition configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TranscriptionConfig {
    // @field: Model name handed to the recognizer
    #[serde(default = "default_model")]
    pub model: String,

    // @field: Speech-to-text program printing JSON segments on stdout
    #[serde(default = "default_program")]
    pub program: String,

    // @field: Arguments for a full transcription ({input}, {model})
    #[serde(default = "default_args")]
    pub args: Vec<String>,

    // @field: Arguments for the alignment probe ({input}, {model}, {duration})
    #[serde(default = "default_probe_args")]
    pub probe_args: Vec<String>,

    // @field: Seconds of audio the alignment probe listens to
    #[serde(default = "default_probe_seconds")]
    pub probe_seconds: f64,

    // @field: Timeout for one recognizer invocation
    #[serde(default = "default_transcription_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            program: default_program(),
            args: default_args(),
            probe_args: default_probe_args(),
            probe_seconds: default_probe_seconds(),
            timeout_secs: default_transcription_timeout_secs(),
        }
    }
}

/// Alignment verification configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SyncConfig {
    /// Probe existing subtitles against the audio before reuse
    #[serde(default = "default_true")]
    pub auto_verify: bool,

    /// Probe offsets below this magnitude report as zero
    #[serde(default = "default_probe_dead_zone")]
    pub probe_dead_zone: f64,

    /// Offsets must exceed this magnitude to be applied
    #[serde(default = "default_min_offset")]
    pub min_offset: f64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            auto_verify: true,
            probe_dead_zone: default_probe_dead_zone(),
            min_offset: default_min_offset(),
        }
    }
}

/// Translation configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TranslationConfig {
    /// Translate subtitles after sync or transcription
    #[serde(default)]
    pub enabled: bool,

    /// Target language code (ISO 639)
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// Ollama service URL
    #[serde(default = "default_ollama_endpoint")]
    pub endpoint: String,

    /// Ollama model name
    #[serde(default = "default_ollama_model")]
    pub model: String,

    /// Request timeout in seconds
    #[serde(default = "default_translation_timeout_secs")]
    pub timeout_secs: u64,

    /// Retry count for failed requests
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            target_language: default_target_language(),
            endpoint: default_ollama_endpoint(),
            model: default_ollama_model(),
            timeout_secs: default_translation_timeout_secs(),
            retry_count: default_retry_count(),
        }
    }
}

/// Output configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct GeneralConfig {
    /// Output directory, relative paths resolve against the working directory
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Appended to the video basename
    #[serde(default = "default_output_suffix")]
    pub output_suffix: String,

    /// "srt" or "ass"
    #[serde(default = "default_output_format")]
    pub output_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            output_suffix: default_output_suffix(),
            output_format: default_output_format(),
        }
    }
}

impl GeneralConfig {
    /// Output file extension; unknown values fall back to SRT
    pub fn output_extension(&self) -> &'static str {
        if self.output_format.eq_ignore_ascii_case("ass") {
            SubtitleFormat::Ass.extension()
        } else {
            SubtitleFormat::Srt.extension()
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

fn default_true() -> bool {
    true
}

fn default_model() -> String {
    "base".to_string()
}

fn default_program() -> String {
    "whisper-json".to_string()
}

fn default_args() -> Vec<String> {
    ["--model", "{model}", "{input}"].iter().map(|s| s.to_string()).collect()
}

fn default_probe_args() -> Vec<String> {
    ["--model", "{model}", "--duration", "{duration}", "{input}"].iter().map(|s| s.to_string()).collect()
}

fn default_probe_seconds() -> f64 {
    DEFAULT_PROBE_SECONDS
}

fn default_transcription_timeout_secs() -> u64 {
    3600 // One hour, long videos on CPU are slow
}

fn default_probe_dead_zone() -> f64 {
    DEFAULT_PROBE_DEAD_ZONE
}

fn default_min_offset() -> f64 {
    DEFAULT_MIN_APPLIED_OFFSET
}

fn default_target_language() -> String {
    "pt".to_string()
}

fn default_ollama_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_ollama_model() -> String {
    "llama3.2:3b".to_string()
}

fn default_translation_timeout_secs() -> u64 {
    60
}

fn default_retry_count() -> u32 {
    3
}

fn default_output_dir() -> String {
    "output".to_string()
}

fn default_output_suffix() -> String {
    "_Amarelo".to_string()
}

fn default_output_format() -> String {
    "srt".to_string()
}

impl Config {
    /// Load a configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open config file: {}", path.display()))?;

        let reader = BufReader::new(file);
        serde_json::from_reader(reader)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Save the configuration as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize config to JSON")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write config file: {}", path.display()))
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        let color = self.font.color.trim_start_matches('#');
        if !self.font.color.starts_with('#') || color.len() != 6 || !color.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(anyhow!("Font color must be #RRGGBB, got '{}'", self.font.color));
        }

        if self.font.size == 0 {
            return Err(anyhow!("Font size must be positive"));
        }

        if self.font.name.trim().is_empty() {
            return Err(anyhow!("Font name must not be empty"));
        }

        if !(self.sync.probe_dead_zone >= 0.0 && self.sync.min_offset >= 0.0) {
            return Err(anyhow!("Sync thresholds must be non-negative"));
        }

        if !(self.transcription.probe_seconds > 0.0) {
            return Err(anyhow!("Probe duration must be positive"));
        }

        if self.transcription.program.trim().is_empty() {
            return Err(anyhow!("Transcription program must not be empty"));
        }

        if self.general.output_dir.trim().is_empty() {
            return Err(anyhow!("Output directory must not be empty"));
        }

        if self.translation.retry_count > MAX_RETRY_COUNT {
            return Err(anyhow!(
                "Translation retry count must be at most {}, got {}",
                MAX_RETRY_COUNT, self.translation.retry_count
            ));
        }

        if self.translation.enabled {
            crate::language_utils::get_language_name(&self.translation.target_language)?;
        }

        Ok(())
    }
}
