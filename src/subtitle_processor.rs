use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::engines::TranscribedSegment;
use crate::errors::SubtitleError;
use crate::timecode;

// @module: Subtitle track model and format loaders

// @const: ASS override blocks such as {\i1} or {\pos(10,10)}
static ASS_OVERRIDE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{[^}]*\}").unwrap()
});

// Column layout of a V4+ Dialogue line when no Format line precedes it
const DEFAULT_ASS_EVENT_FIELDS: [&str; 10] = [
    "layer", "start", "end", "style", "name", "marginl", "marginr", "marginv", "effect", "text",
];

// @struct: Single subtitle entry
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleEntry {
    // @field: 1-based position, re-derived on serialization
    pub index: usize,

    // @field: Start time in seconds
    pub start: f64,

    // @field: End time in seconds
    pub end: f64,

    // @field: Displayed text
    pub text: String,

    // @field: Text before translation
    pub original_text: Option<String>,
}

impl SubtitleEntry {
    /// Creates a new subtitle entry
    pub fn new(index: usize, start: f64, end: f64, text: impl Into<String>) -> Self {
        SubtitleEntry {
            index,
            start,
            end,
            text: text.into(),
            original_text: None,
        }
    }
}

/// Subtitle file formats understood by the loaders
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubtitleFormat {
    /// SubRip
    Srt,
    /// Advanced SubStation Alpha (also accepts .ssa)
    Ass,
    /// WebVTT
    Vtt,
}

impl SubtitleFormat {
    /// Sniff the format from a file extension
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, SubtitleError> {
        let path = path.as_ref();
        let ext = path.extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "srt" => Ok(Self::Srt),
            "ass" | "ssa" => Ok(Self::Ass),
            "vtt" => Ok(Self::Vtt),
            _ => Err(SubtitleError::UnsupportedFormat(path.display().to_string())),
        }
    }

    /// Lowercase file extension
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Srt => "srt",
            Self::Ass => "ass",
            Self::Vtt => "vtt",
        }
    }
}

/// Ordered list of subtitle entries for one video.
///
/// Entries are kept in insertion order; callers supply them chronologically.
/// Nothing in this crate sorts, drops or reorders entries once a track exists.
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleTrack {
    /// Where the entries came from
    pub source_file: PathBuf,

    /// List of subtitle entries
    pub entries: Vec<SubtitleEntry>,
}

impl SubtitleTrack {
    /// Create an empty track
    pub fn new(source_file: PathBuf) -> Self {
        SubtitleTrack {
            source_file,
            entries: Vec::new(),
        }
    }

    /// Create a track from entries, renumbering them by position
    pub fn from_entries(source_file: PathBuf, entries: Vec<SubtitleEntry>) -> Self {
        let mut track = SubtitleTrack { source_file, entries };
        track.renumber();
        track
    }

    /// Build a track from recognizer segments. Text is trimmed and also kept
    /// as the original text.
    pub fn from_segments(source_file: PathBuf, segments: &[TranscribedSegment]) -> Self {
        let entries = segments.iter()
            .enumerate()
            .map(|(i, segment)| {
                let text = segment.text.trim().to_string();
                let start = segment.start.max(0.0);
                let end = segment.end.max(start);
                SubtitleEntry {
                    index: i + 1,
                    start,
                    end,
                    original_text: Some(text.clone()),
                    text,
                }
            })
            .collect();

        SubtitleTrack { source_file, entries }
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the track has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First entry, if any
    pub fn first(&self) -> Option<&SubtitleEntry> {
        self.entries.first()
    }

    /// Re-derive 1-based indices from position
    pub fn renumber(&mut self) {
        for (i, entry) in self.entries.iter_mut().enumerate() {
            entry.index = i + 1;
        }
    }

    /// Load a subtitle file, picking the parser from its extension
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SubtitleError> {
        let path = path.as_ref();
        let format = SubtitleFormat::from_path(path)?;
        Self::load_as(path, format)
    }

    /// Load a subtitle file with an explicitly declared format
    pub fn load_as<P: AsRef<Path>>(path: P, format: SubtitleFormat) -> Result<Self, SubtitleError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| SubtitleError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        let entries = match format {
            SubtitleFormat::Srt => Self::parse_srt_string(&content)?,
            SubtitleFormat::Ass => Self::parse_ass_string(&content)?,
            SubtitleFormat::Vtt => Self::parse_vtt_string(&content)?,
        };

        debug!("Loaded {} entries from {}", entries.len(), path.display());
        Ok(Self::from_entries(path.to_path_buf(), entries))
    }

    /// Parse SRT content into entries. An input without cues yields an empty list.
    pub fn parse_srt_string(content: &str) -> Result<Vec<SubtitleEntry>, SubtitleError> {
        let mut entries = Vec::new();

        for block in split_blocks(content) {
            let Some(timing_pos) = block.iter().position(|(_, line)| line.contains("-->")) else {
                if let Some((line_no, line)) = block.first() {
                    warn!("Skipping SRT block without timing at line {}: {}", line_no, line);
                }
                continue;
            };

            let (line_no, timing_line) = block[timing_pos];
            let (start, end) = parse_timing_line(timing_line, line_no, false)?;
            let text = join_text(&block[timing_pos + 1..]);

            if text.is_empty() {
                warn!("Skipping empty subtitle entry at line {}", line_no);
                continue;
            }

            entries.push(SubtitleEntry::new(entries.len() + 1, start, end, text));
        }

        Ok(entries)
    }

    /// Parse WebVTT content into entries
    pub fn parse_vtt_string(content: &str) -> Result<Vec<SubtitleEntry>, SubtitleError> {
        let mut entries = Vec::new();
        let mut blocks = split_blocks(content).into_iter().peekable();

        let header = blocks.peek()
            .and_then(|block| block.first())
            .map(|(line_no, line)| (*line_no, line.starts_with("WEBVTT")));

        match header {
            Some((_, true)) => {
                blocks.next();
            }
            Some((line_no, false)) => {
                return Err(SubtitleError::Malformed {
                    line: line_no,
                    message: "missing WEBVTT header".to_string(),
                });
            }
            None => return Ok(entries),
        }

        for block in blocks {
            let Some((_, head)) = block.first() else { continue };
            if head.starts_with("NOTE") || head.starts_with("STYLE") || head.starts_with("REGION") {
                continue;
            }

            let Some(timing_pos) = block.iter().position(|(_, line)| line.contains("-->")) else {
                warn!("Skipping VTT block without cue timing: {}", head);
                continue;
            };

            let (line_no, timing_line) = block[timing_pos];
            let (start, end) = parse_timing_line(timing_line, line_no, true)?;
            let text = join_text(&block[timing_pos + 1..]);

            if text.is_empty() {
                warn!("Skipping empty cue at line {}", line_no);
                continue;
            }

            entries.push(SubtitleEntry::new(entries.len() + 1, start, end, text));
        }

        Ok(entries)
    }

    /// Parse ASS/SSA content into entries, reading only Dialogue events
    pub fn parse_ass_string(content: &str) -> Result<Vec<SubtitleEntry>, SubtitleError> {
        let mut entries = Vec::new();
        let mut in_events = false;
        let mut fields: Vec<String> = DEFAULT_ASS_EVENT_FIELDS.iter().map(|f| f.to_string()).collect();

        for (i, raw_line) in content.trim_start_matches('\u{feff}').lines().enumerate() {
            let line_no = i + 1;
            let line = raw_line.trim();

            if line.starts_with('[') {
                in_events = line.eq_ignore_ascii_case("[events]");
                continue;
            }
            if !in_events {
                continue;
            }

            if let Some(format) = line.strip_prefix("Format:") {
                fields = format.split(',').map(|f| f.trim().to_lowercase()).collect();
                continue;
            }

            let Some(body) = line.strip_prefix("Dialogue:") else {
                continue;
            };

            let column = |name: &str| fields.iter().position(|f| f == name);
            let (Some(start_col), Some(end_col), Some(text_col)) = (column("start"), column("end"), column("text")) else {
                return Err(SubtitleError::Malformed {
                    line: line_no,
                    message: "Format line lacks Start, End or Text".to_string(),
                });
            };

            let values: Vec<&str> = body.trim_start().splitn(fields.len(), ',').collect();
            if values.len() <= text_col.max(start_col).max(end_col) {
                warn!("Skipping truncated Dialogue at line {}", line_no);
                continue;
            }

            let start = checked_time(values[start_col], line_no, timecode::parse_ass_time_checked);
            let end = checked_time(values[end_col], line_no, timecode::parse_ass_time_checked);
            let text = clean_ass_text(values[text_col]);

            entries.push(SubtitleEntry::new(entries.len() + 1, start, end.max(start), text));
        }

        Ok(entries)
    }
}

/// Split content into blank-line separated blocks of (line number, trimmed line)
fn split_blocks(content: &str) -> Vec<Vec<(usize, &str)>> {
    let mut blocks = Vec::new();
    let mut current = Vec::new();

    for (i, line) in content.trim_start_matches('\u{feff}').lines().enumerate() {
        let trimmed = line.trim_end();
        if trimmed.trim().is_empty() {
            if !current.is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
            continue;
        }
        current.push((i + 1, trimmed));
    }

    if !current.is_empty() {
        blocks.push(current);
    }
    blocks
}

fn join_text(lines: &[(usize, &str)]) -> String {
    lines.iter()
        .map(|(_, line)| line.trim())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parse `start --> end [settings]`. VTT allows the `MM:SS.mmm` short form.
fn parse_timing_line(line: &str, line_no: usize, allow_short_form: bool) -> Result<(f64, f64), SubtitleError> {
    let (left, right) = line.split_once("-->").ok_or_else(|| SubtitleError::Malformed {
        line: line_no,
        message: format!("expected timing line, found '{}'", line),
    })?;

    let start_token = left.trim();
    let end_token = right.split_whitespace().next().unwrap_or("");

    let expand = |token: &str| -> String {
        if allow_short_form && token.matches(':').count() == 1 {
            format!("00:{}", token)
        } else {
            token.to_string()
        }
    };

    let start = checked_time(&expand(start_token), line_no, timecode::parse_srt_time_checked);
    let end = checked_time(&expand(end_token), line_no, timecode::parse_srt_time_checked);

    if end < start {
        warn!("End before start at line {}, clamping to start", line_no);
    }
    Ok((start, end.max(start)))
}

fn checked_time(value: &str, line_no: usize, parse: fn(&str) -> timecode::ParsedTime) -> f64 {
    let parsed = parse(value);
    if parsed.defaulted {
        warn!("Invalid timestamp '{}' at line {}, using 0", value.trim(), line_no);
    }
    parsed.seconds
}

fn clean_ass_text(raw: &str) -> String {
    ASS_OVERRIDE_REGEX.replace_all(raw, "")
        .replace("\\N", "\n")
        .replace("\\n", "\n")
        .replace("\\h", " ")
        .trim()
        .to_string()
}
