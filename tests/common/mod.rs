/*!
 * Common test utilities for the amarelo test suite
 */

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

use amarelo::app_config::Config;
use amarelo::app_controller::Controller;
use amarelo::engines::mock::{MockRecognizer, MockRecognizerLoader};
use amarelo::engines::{TranscribedSegment, Translator};

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Creates a sample SRT subtitle file for testing
pub fn create_test_subtitle(dir: &Path, filename: &str) -> Result<PathBuf> {
    let content = r#"1
00:00:01,500 --> 00:00:03,000
Hello there.

2
00:00:04,000 --> 00:00:06,250
It contains multiple entries.

3
00:00:07,000 --> 00:00:09,000
For testing purposes.
"#;
    create_test_file(dir, filename, content)
}

/// Creates an empty placeholder video file
pub fn create_test_video(dir: &Path, filename: &str) -> Result<PathBuf> {
    create_test_file(dir, filename, "not really a video")
}

/// Default configuration writing into `output_dir`
pub fn test_config(output_dir: &Path) -> Config {
    let mut config = Config::default();
    config.general.output_dir = output_dir.to_string_lossy().to_string();
    config
}

/// Canned transcript used by the mock recognizer
pub fn sample_transcript() -> Vec<TranscribedSegment> {
    vec![
        TranscribedSegment::new(0.5, 2.0, "  First line  "),
        TranscribedSegment::new(2.5, 4.0, "Second line"),
    ]
}

/// Controller wired to mock engines, returning the recognizer and loader for inspection
pub fn mock_controller(
    config: Config,
    recognizer: MockRecognizer,
    translator: Option<Arc<dyn Translator>>,
) -> (Controller, Arc<MockRecognizer>, Arc<MockRecognizerLoader>) {
    let recognizer = Arc::new(recognizer);
    let loader = Arc::new(MockRecognizerLoader::new(Arc::clone(&recognizer)));
    let controller = Controller::new(config, loader.clone(), translator);
    (controller, recognizer, loader)
}
