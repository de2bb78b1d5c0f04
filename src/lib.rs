/*!
 * # Amarelo - styled subtitles for your videos
 *
 * A Rust library that produces styled subtitle files for videos, either by
 * transcribing the audio from scratch or by checking and resynchronizing a
 * subtitle that already sits next to the video.
 *
 * ## Features
 *
 * - SRT and ASS time code conversion with lenient and strict parsing
 * - SRT, ASS and WebVTT loaders
 * - Styled SRT (font/bold tags) and ASS (`Default` style) output
 * - Offset correction: uniform shift, scene-anchor calibration, speech probe
 * - Per-video decision workflow on a background worker with progress events
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `timecode`: Time code formatting and parsing
 * - `subtitle_processor`: Subtitle entries, tracks and format loaders
 * - `subtitle_generator`: Styled SRT/ASS output and previews
 * - `sync`: Offset synchronization
 * - `engines`: Recognition and translation collaborators
 * - `app_controller`: Per-video workflow and directory loop
 * - `progress`: Workflow events and cancellation
 * - `app_config`: Configuration management
 * - `file_utils`: File system operations
 * - `language_utils`: ISO language code utilities
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
#![allow(clippy::uninlined_format_args)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod engines;
pub mod errors;
pub mod file_utils;
pub mod language_utils;
pub mod progress;
pub mod subtitle_generator;
pub mod subtitle_processor;
pub mod sync;
pub mod timecode;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::{Controller, RunTarget, VideoPlan};
pub use errors::{EngineError, SubtitleError, WorkflowError};
pub use progress::{CancellationFlag, RunStatus, WorkflowEvent};
pub use subtitle_generator::FontStyle;
pub use subtitle_processor::{SubtitleEntry, SubtitleFormat, SubtitleTrack};
