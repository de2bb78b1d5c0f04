/*!
 * Tests for the recognizer and translator engines
 */

use std::path::Path;
use std::sync::Arc;
use amarelo::app_config::{TranscriptionConfig, TranslationConfig};
use amarelo::engines::command::{CommandRecognizer, CommandRecognizerLoader};
use amarelo::engines::mock::{MockBehavior, MockRecognizer, MockRecognizerLoader, MockTranslator};
use amarelo::engines::ollama::{backoff_delay_ms, GenerationRequest, OllamaTranslator};
use amarelo::engines::{LazyRecognizer, RecognitionEngine, RecognizerLoader, TranscribedSegment, Translator};
use amarelo::errors::EngineError;
use amarelo::subtitle_processor::SubtitleEntry;

#[test]
fn test_expand_args_withPlaceholders_shouldSubstituteAll() {
    let template: Vec<String> = ["--model", "{model}", "--duration", "{duration}", "{input}"]
        .iter()
        .map(|s| s.to_string())
        .collect();

    let args = CommandRecognizer::expand_args(&template, Path::new("/videos/a b.mp4"), "small", Some(20.0));

    assert_eq!(args, vec!["--model", "small", "--duration", "20", "/videos/a b.mp4"]);
}

#[test]
fn test_expand_args_withoutDuration_shouldLeaveEmptyPlaceholder() {
    let template = vec!["{input}".to_string(), "t={duration}".to_string()];

    let args = CommandRecognizer::expand_args(&template, Path::new("x.mkv"), "base", None);

    assert_eq!(args, vec!["x.mkv", "t="]);
}

#[test]
fn test_parse_output_withWrappedSegments_shouldParse() -> Result<(), EngineError> {
    let stdout = r#"{"segments": [{"start": 0.5, "end": 1.25, "text": " hi "}]}"#;

    let segments = CommandRecognizer::parse_output(stdout)?;

    assert_eq!(segments, vec![TranscribedSegment::new(0.5, 1.25, " hi ")]);
    Ok(())
}

#[test]
fn test_parse_output_withBareArray_shouldParse() -> Result<(), EngineError> {
    let stdout = "\n[{\"start\": 1, \"end\": 2, \"text\": \"a\"}, {\"start\": 2, \"end\": 3, \"text\": \"b\"}]\n";

    let segments = CommandRecognizer::parse_output(stdout)?;

    assert_eq!(segments.len(), 2);
    assert_eq!(segments[1].text, "b");
    Ok(())
}

#[test]
fn test_parse_output_withGarbage_shouldReturnInvalidOutput() {
    let result = CommandRecognizer::parse_output("Loading model...");

    assert!(matches!(result, Err(EngineError::InvalidOutput(_))));
}

#[tokio::test]
async fn test_command_loader_withEmptyProgram_shouldFailToLoad() {
    let config = TranscriptionConfig { program: " ".to_string(), ..TranscriptionConfig::default() };
    let loader = CommandRecognizerLoader::new(config);

    let result = loader.load("base").await;

    assert!(matches!(result, Err(EngineError::ModelLoad { ref model, .. }) if model == "base"));
}

#[tokio::test]
async fn test_command_recognizer_withMissingProgram_shouldReportRecognitionError() {
    let config = TranscriptionConfig {
        program: "amarelo-no-such-recognizer-binary".to_string(),
        ..TranscriptionConfig::default()
    };
    let recognizer = CommandRecognizer::new(&config, "base");

    let result = recognizer.transcribe(Path::new("x.mp4")).await;

    assert!(matches!(result, Err(EngineError::Recognition(_))));
}

#[tokio::test]
async fn test_lazy_recognizer_withRepeatedGets_shouldLoadOnce() -> Result<(), EngineError> {
    let engine = Arc::new(MockRecognizer::working(Vec::new(), Vec::new()));
    let loader = Arc::new(MockRecognizerLoader::new(engine));
    let lazy = LazyRecognizer::new(loader.clone(), "tiny");

    assert!(!lazy.is_loaded());
    lazy.get().await?;
    lazy.get().await?;

    assert!(lazy.is_loaded());
    assert_eq!(lazy.model(), "tiny");
    assert_eq!(loader.load_count(), 1);
    Ok(())
}

#[tokio::test]
async fn test_lazy_recognizer_withBrokenLoader_shouldRetryOnNextGet() {
    let loader = Arc::new(MockRecognizerLoader::broken());
    let lazy = LazyRecognizer::new(loader.clone(), "tiny");

    assert!(lazy.get().await.is_err());
    assert!(lazy.get().await.is_err());

    assert!(!lazy.is_loaded());
    assert_eq!(loader.load_count(), 2);
}

#[tokio::test]
async fn test_mock_recognizer_withFailOnName_shouldOnlyFailMatchingMedia() {
    let engine = MockRecognizer::new(MockBehavior::FailOnName("broken"), Vec::new(), Vec::new());

    assert!(engine.transcribe(Path::new("ok.mp4")).await.is_ok());
    assert!(engine.transcribe(Path::new("broken.mp4")).await.is_err());
    assert_eq!(engine.transcribe_calls(), 2);
}

#[tokio::test]
async fn test_mock_translator_withDropLast_shouldReturnFewerEntries() -> Result<(), EngineError> {
    let entries = vec![SubtitleEntry::new(1, 0.0, 1.0, "a"), SubtitleEntry::new(2, 1.0, 2.0, "b")];

    let working = MockTranslator::working().translate_batch(&entries, "es").await?;
    let dropped = MockTranslator::new(MockBehavior::DropLast).translate_batch(&entries, "es").await?;

    assert_eq!(working[1].text, "[es] b");
    assert_eq!(dropped.len(), 1);
    Ok(())
}

#[test]
fn test_ollama_translator_withDefaultConfig_shouldBuild() {
    assert!(OllamaTranslator::new(&TranslationConfig::default()).is_ok());
}

#[test]
fn test_system_prompt_withLanguageCode_shouldNameTheLanguage() {
    assert!(OllamaTranslator::system_prompt("pt").contains("Portuguese"));
    assert!(OllamaTranslator::system_prompt("klingon").contains("klingon"));
}

#[test]
fn test_generation_request_serialization_shouldDisableStreaming() -> Result<(), serde_json::Error> {
    let request = GenerationRequest::new("llama3.2:3b", "Hello").system("Translate");

    let json = serde_json::to_value(&request)?;

    assert_eq!(json["model"], "llama3.2:3b");
    assert_eq!(json["system"], "Translate");
    assert_eq!(json["stream"], false);
    Ok(())
}

#[tokio::test]
async fn test_ollama_translator_withUnreachableServer_shouldFail() {
    let config = TranslationConfig {
        endpoint: "http://127.0.0.1:9".to_string(),
        retry_count: 0,
        timeout_secs: 2,
        ..TranslationConfig::default()
    };
    let translator = OllamaTranslator::new(&config).map_err(|e| e.to_string());
    let entries = vec![SubtitleEntry::new(1, 0.0, 1.0, "Hello")];

    let result = match translator {
        Ok(translator) => translator.translate_batch(&entries, "es").await,
        Err(e) => panic!("{}", e),
    };

    assert!(matches!(result, Err(EngineError::Translation(_))));
}

#[test]
fn test_backoff_delay_withLateAttempts_shouldDoubleThenSaturate() {
    assert_eq!(backoff_delay_ms(500, 1), 500);
    assert_eq!(backoff_delay_ms(500, 2), 1000);
    assert_eq!(backoff_delay_ms(500, 4), 4000);
    assert_eq!(backoff_delay_ms(500, 0), 500);
    assert_eq!(backoff_delay_ms(500, 60), u64::MAX);
    assert_eq!(backoff_delay_ms(500, 65), u64::MAX);
    assert_eq!(backoff_delay_ms(500, u32::MAX), u64::MAX);
}
