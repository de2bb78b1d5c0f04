use std::path::Path;

use log::{info, warn};

use crate::engines::RecognitionEngine;
use crate::subtitle_processor::{SubtitleEntry, SubtitleTrack};

// @module: Offset synchronization of subtitle tracks

/// Dead-zone applied to the raw alignment-probe offset
pub const DEFAULT_PROBE_DEAD_ZONE: f64 = 0.15;

/// Minimum offset the workflow will actually apply
pub const DEFAULT_MIN_APPLIED_OFFSET: f64 = 0.1;

/// Seconds of audio the alignment probe listens to
pub const DEFAULT_PROBE_SECONDS: f64 = 20.0;

/// Shift every entry by `offset_seconds`, flooring both ends at zero.
///
/// Mutates in place and hands the same track back.
pub fn adjust_offset(track: &mut SubtitleTrack, offset_seconds: f64) -> &mut SubtitleTrack {
    for entry in track.entries.iter_mut() {
        entry.start = (entry.start + offset_seconds).max(0.0);
        entry.end = (entry.end + offset_seconds).max(0.0);
    }
    track
}

/// Move the first entry onto the first scene anchor and shift the rest with it.
/// An empty track or an empty anchor list leaves the track untouched.
pub fn sync_by_scenes<'a>(track: &'a mut SubtitleTrack, scene_anchors: &[f64]) -> &'a mut SubtitleTrack {
    if track.is_empty() || scene_anchors.is_empty() {
        return track;
    }

    let offset = scene_anchors[0] - track.entries[0].start;
    info!("Applying sync adjustment of {:.3}s from the first scene anchor", offset);
    adjust_offset(track, offset)
}

/// Offset between the detected speech start and the subtitle's expected start.
/// Magnitudes below `dead_zone` report as 0.0; others are rounded to milliseconds.
pub fn alignment_offset(real_start: f64, expected_start: f64, dead_zone: f64) -> f64 {
    let offset = real_start - expected_start;
    if !offset.is_finite() || offset.abs() < dead_zone {
        return 0.0;
    }
    (offset * 1000.0).round() / 1000.0
}

/// True when `offset` is large enough for the workflow to apply it
pub fn should_apply(offset: f64, min_offset: f64) -> bool {
    offset.abs() > min_offset
}

/// Listen to the first `probe_seconds` of `media_path` and compare the first
/// detected speech with `first_entry`.
///
/// Engine failures are logged and reported as no correction.
pub async fn verify_alignment(
    engine: &dyn RecognitionEngine,
    media_path: &Path,
    first_entry: &SubtitleEntry,
    probe_seconds: f64,
    dead_zone: f64,
) -> f64 {
    info!("Verifying alignment for: {}", media_path.display());

    let segments = match engine.probe_alignment(media_path, probe_seconds).await {
        Ok(segments) => segments,
        Err(e) => {
            warn!("Alignment check failed for {}: {}", media_path.display(), e);
            return 0.0;
        }
    };

    let Some(first_speech) = segments.first() else {
        return 0.0;
    };

    alignment_offset(first_speech.start, first_entry.start, dead_zone)
}
