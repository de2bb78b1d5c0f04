use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::SubtitleError;

// @module: Time code conversion for SRT and ASS

// @const: SRT/VTT time code, comma or dot before the milliseconds
static SRT_TIME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{2}):(\d{2}):(\d{2})[,.](\d{3})").unwrap()
});

// Absorbs binary representation error (0.29 * 100 = 28.999...) before flooring
const UNIT_EPSILON: f64 = 1e-6;

/// Result of a lenient parse that also tells whether the input was understood
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParsedTime {
    /// Parsed value in seconds, 0.0 when defaulted
    pub seconds: f64,
    /// True when the input was rejected and the value fell back to zero
    pub defaulted: bool,
}

impl ParsedTime {
    fn from_result(result: Result<f64, SubtitleError>) -> Self {
        match result {
            Ok(seconds) => Self { seconds, defaulted: false },
            Err(_) => Self { seconds: 0.0, defaulted: true },
        }
    }
}

/// Floor `seconds` to a whole number of `units_per_second` ticks.
/// Negative and non-finite inputs collapse to zero.
///
/// Unlike a plain `floor(s * units)`, a value within `UNIT_EPSILON` below the
/// next tick counts as that tick, so 0.29 formats as `,290` and not `,289`.
fn whole_units(seconds: f64, units_per_second: f64) -> u64 {
    if !seconds.is_finite() || seconds <= 0.0 {
        return 0;
    }
    (seconds * units_per_second + UNIT_EPSILON).floor() as u64
}

/// `h:m:s` as whole seconds, `None` on overflow
fn total_seconds(hours: u64, minutes: u64, secs: u64) -> Option<u64> {
    hours.checked_mul(3600)?
        .checked_add(minutes.checked_mul(60)?)?
        .checked_add(secs)
}

/// Format seconds as an SRT time code (`HH:MM:SS,mmm`).
///
/// Hours are padded to two digits but never truncated, so 100+ hours
/// print with more digits. Milliseconds are floored after the epsilon
/// nudge of `whole_units`, which departs from a plain floor for values
/// sitting just under a millisecond boundary.
pub fn format_srt_time(seconds: f64) -> String {
    let total_ms = whole_units(seconds, 1000.0);
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms % 3_600_000) / 60_000;
    let secs = (total_ms % 60_000) / 1_000;
    let millis = total_ms % 1_000;

    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, secs, millis)
}

/// Format seconds as an ASS time code (`H:MM:SS.cc`)
pub fn format_ass_time(seconds: f64) -> String {
    let total_cs = whole_units(seconds, 100.0);
    let hours = total_cs / 360_000;
    let minutes = (total_cs % 360_000) / 6_000;
    let secs = (total_cs % 6_000) / 100;
    let centis = total_cs % 100;

    format!("{}:{:02}:{:02}.{:02}", hours, minutes, secs, centis)
}

/// Parse an SRT/VTT time code, rejecting anything off the fixed-width grammar
pub fn parse_srt_time_strict(time_str: &str) -> Result<f64, SubtitleError> {
    let invalid = || SubtitleError::InvalidTimestamp {
        format: "SRT",
        value: time_str.to_string(),
    };

    let caps = SRT_TIME_REGEX.captures(time_str.trim()).ok_or_else(invalid)?;
    let field = |idx: usize| -> Result<u64, SubtitleError> {
        caps.get(idx)
            .and_then(|m| m.as_str().parse::<u64>().ok())
            .ok_or_else(invalid)
    };

    let hours = field(1)?;
    let minutes = field(2)?;
    let secs = field(3)?;
    let millis = field(4)?;

    let whole = total_seconds(hours, minutes, secs).ok_or_else(invalid)?;
    Ok(whole as f64 + millis as f64 / 1000.0)
}

/// Parse an ASS time code (`H:MM:SS.cc`), rejecting missing or non-numeric fields
pub fn parse_ass_time_strict(time_str: &str) -> Result<f64, SubtitleError> {
    let invalid = || SubtitleError::InvalidTimestamp {
        format: "ASS",
        value: time_str.to_string(),
    };
    let number = |part: Option<&str>| -> Result<u64, SubtitleError> {
        part.map(str::trim)
            .and_then(|p| p.parse::<u64>().ok())
            .ok_or_else(invalid)
    };

    let mut parts = time_str.split(':');
    let hours = number(parts.next())?;
    let minutes = number(parts.next())?;
    let mut sec_parts = parts.next().ok_or_else(invalid)?.split('.');
    let secs = number(sec_parts.next())?;
    let centis = number(sec_parts.next())?;

    let whole = total_seconds(hours, minutes, secs).ok_or_else(invalid)?;
    Ok(whole as f64 + centis as f64 / 100.0)
}

/// Parse an SRT time code and report whether it fell back to zero
pub fn parse_srt_time_checked(time_str: &str) -> ParsedTime {
    ParsedTime::from_result(parse_srt_time_strict(time_str))
}

/// Parse an ASS time code and report whether it fell back to zero
pub fn parse_ass_time_checked(time_str: &str) -> ParsedTime {
    ParsedTime::from_result(parse_ass_time_strict(time_str))
}

/// Lenient SRT parse: malformed input yields 0.0
pub fn parse_srt_time(time_str: &str) -> f64 {
    parse_srt_time_checked(time_str).seconds
}

/// Lenient ASS parse: malformed input yields 0.0
pub fn parse_ass_time(time_str: &str) -> f64 {
    parse_ass_time_checked(time_str).seconds
}
