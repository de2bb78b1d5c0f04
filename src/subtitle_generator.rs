/*!
 * Styled subtitle output.
 *
 * Serializes a [`SubtitleTrack`] into SRT (default) or ASS. SRT styling is
 * carried by inline `<b>` and `<font color>` tags, ASS styling by a single
 * `Default` style line in the `[V4+ Styles]` section.
 */

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::file_utils::FileManager;
use crate::subtitle_processor::{SubtitleFormat, SubtitleTrack};
use crate::timecode;

/// Entries shown by [`format_preview`] before truncating
pub const PREVIEW_ENTRY_LIMIT: usize = 20;

const DEFAULT_ASS_COLOR: &str = "&H0000FFFF";

/// Font styling applied to generated subtitles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontStyle {
    /// Primary colour as `#RRGGBB`
    #[serde(default = "default_color")]
    pub color: String,

    /// Bold text
    #[serde(default)]
    pub bold: bool,

    /// Font family
    #[serde(default = "default_font_name")]
    pub name: String,

    /// Font size in points
    #[serde(default = "default_font_size")]
    pub size: u32,
}

impl Default for FontStyle {
    fn default() -> Self {
        Self {
            color: default_color(),
            bold: false,
            name: default_font_name(),
            size: default_font_size(),
        }
    }
}

fn default_color() -> String {
    "#FFFF00".to_string()
}

fn default_font_name() -> String {
    "Arial".to_string()
}

fn default_font_size() -> u32 {
    20
}

/// Output format for a path: `.ass` selects ASS, anything else SRT
pub fn output_format_for<P: AsRef<Path>>(output_path: P) -> SubtitleFormat {
    let is_ass = output_path.as_ref()
        .extension()
        .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case("ass"));

    if is_ass {
        SubtitleFormat::Ass
    } else {
        SubtitleFormat::Srt
    }
}

/// Write `track` to `output_path`, styled with `style`
pub fn generate<P: AsRef<Path>>(track: &SubtitleTrack, output_path: P, style: &FontStyle) -> Result<()> {
    let output_path = output_path.as_ref();
    let content = match output_format_for(output_path) {
        SubtitleFormat::Ass => render_ass(track, style),
        _ => render_srt(track, style),
    };

    FileManager::write_to_file(output_path, &content)
        .with_context(|| format!("Failed to write subtitles to {}", output_path.display()))?;

    debug!("Wrote {} entries to {}", track.len(), output_path.display());
    Ok(())
}

/// Render a track as SRT. Block numbers come from position, not from stored indices.
pub fn render_srt(track: &SubtitleTrack, style: &FontStyle) -> String {
    let color_hex = style.color.replace('#', "");
    let mut out = String::new();

    for (i, entry) in track.entries.iter().enumerate() {
        let mut text = entry.text.clone();
        if style.bold {
            text = format!("<b>{}</b>", text);
        }
        text = format!("<font color=\"#{}\">{}</font>", color_hex, text);

        let _ = write!(
            out,
            "{}\n{} --> {}\n{}\n\n",
            i + 1,
            timecode::format_srt_time(entry.start),
            timecode::format_srt_time(entry.end),
            text
        );
    }

    out
}

/// Render a track as ASS with one `Default` style
pub fn render_ass(track: &SubtitleTrack, style: &FontStyle) -> String {
    let color = hex_to_ass_color(&style.color);
    let bold = if style.bold { "-1" } else { "0" };

    let header = [
        "[Script Info]".to_string(),
        "Title: Amarelo Subs Generated".to_string(),
        "ScriptType: v4.00+".to_string(),
        "Collisions: Normal".to_string(),
        String::new(),
        "[V4+ Styles]".to_string(),
        "Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, OutlineColour, BackColour, Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, Encoding".to_string(),
        format!(
            "Style: Default,{},{},{},&H000000FF,&H00000000,&H00000000,{},0,0,0,100,100,0,0,1,2,2,2,10,10,10,1",
            style.name, style.size, color, bold
        ),
        String::new(),
        "[Events]".to_string(),
        "Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text".to_string(),
    ];

    let mut out = header.join("\n");
    out.push('\n');

    for entry in &track.entries {
        let _ = writeln!(
            out,
            "Dialogue: 0,{},{},Default,,0,0,0,,{}",
            timecode::format_ass_time(entry.start),
            timecode::format_ass_time(entry.end),
            entry.text.replace('\n', "\\N")
        );
    }

    out
}

/// Convert `#RRGGBB` to ASS `&H00BBGGRR` (opaque alpha, reversed byte order).
/// Anything that is not six hex digits falls back to opaque yellow.
pub fn hex_to_ass_color(hex_color: &str) -> String {
    let hex = hex_color.replace('#', "");
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        warn!("Invalid colour '{}', using default yellow", hex_color);
        return DEFAULT_ASS_COLOR.to_string();
    }

    let (r, g, b) = (&hex[0..2], &hex[2..4], &hex[4..6]);
    format!("&H00{}{}{}", b, g, r)
}

/// One `[HH:MM:SS,mmm] text` line per entry, capped at the first
/// [`PREVIEW_ENTRY_LIMIT`] entries with a trailing `...` when truncated.
pub fn format_preview(track: &SubtitleTrack) -> String {
    let mut lines: Vec<String> = track.entries.iter()
        .take(PREVIEW_ENTRY_LIMIT)
        .map(|entry| format!("[{}] {}", timecode::format_srt_time(entry.start), entry.text))
        .collect();

    if track.len() > PREVIEW_ENTRY_LIMIT {
        lines.push("...".to_string());
    }

    lines.join("\n")
}
