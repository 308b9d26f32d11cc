//! This module is responsible for SRT parsing and re-serialisation.
//! It turns raw SubRip text into timed caption entries measured in seconds.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::{trace, warn};

/// A single caption: a display window in seconds and its text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionEntry {
    /// Inclusive lower bound of the display window.
    pub start: f64,
    /// Inclusive upper bound of the display window.
    pub end: f64,
    /// Caption text, one `\n` per line break of the source block.
    pub text: String,
}

impl CaptionEntry {
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }

    /// Whether `position` falls inside `[start, end]`.
    /// NaN bounds never contain anything.
    pub fn contains(&self, position: f64) -> bool {
        self.start <= position && position <= self.end
    }

    /// The caption lines as they should be stacked on screen.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.split('\n')
    }

    /// Move both bounds by `delta` seconds.
    pub fn shift(&mut self, delta: f64) {
        self.start += delta;
        self.end += delta;
    }
}

/// How the parser treats a block whose timing line cannot be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseMode {
    /// Keep the block; unreadable bounds become NaN.
    #[default]
    Lenient,
    /// Drop the block.
    Strict,
}

/// Why a block was flagged while parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "detail")]
pub enum AnomalyKind {
    #[error("index line is not followed by a timing line")]
    MissingTimestamp,
    #[error("timing line has no `-->` separator: {0:?}")]
    MissingArrow(String),
    #[error("unreadable timestamp in {0:?}")]
    BadTimestamp(String),
}

/// A block the parser could not fully decipher.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParseAnomaly {
    /// 1-based line number of the block's index line.
    pub line: usize,
    #[serde(flatten)]
    pub kind: AnomalyKind,
    /// Whether the block was kept in the output.
    pub kept: bool,
}

impl fmt::Display for ParseAnomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let action = if self.kept { "kept" } else { "dropped" };
        write!(f, "block at line {} {}: {}", self.line, action, self.kind)
    }
}

/// Result of a parse: the entries in file order plus every anomaly seen.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParsedSubtitles {
    pub entries: Vec<CaptionEntry>,
    pub anomalies: Vec<ParseAnomaly>,
}

/// Parse SRT text into caption entries.
/// This function never fails: blocks it cannot read are either kept with NaN
/// bounds or dropped depending on `mode`, and reported in `anomalies`.
pub fn parse(input: &str, mode: ParseMode) -> ParsedSubtitles {
    let input = input.strip_prefix('\u{FEFF}').unwrap_or(input);
    let lines: Vec<&str> = input.split('\n').map(str::trim).collect();
    let mut parsed = ParsedSubtitles::default();

    let mut i = 0;
    while i < lines.len() {
        let line = lines[i];
        if line.is_empty() {
            i += 1;
            continue;
        }
        if !is_index_line(line) {
            trace!(line = i + 1, text = line, "skipping line outside a block");
            i += 1;
            continue;
        }

        let index_line = i + 1;
        let (timing, text_start) = match lines.get(i + 1) {
            Some(l) if !l.is_empty() => (parse_times(l), i + 2),
            _ => (Err(unreadable(AnomalyKind::MissingTimestamp)), i + 1),
        };

        let mut j = text_start;
        let mut text = Vec::new();
        while j < lines.len() && !lines[j].is_empty() {
            text.push(lines[j]);
            j += 1;
        }
        i = j;

        let (start, end) = match timing {
            Ok(bounds) => bounds,
            Err((kind, partial)) => {
                let kept = mode == ParseMode::Lenient;
                let anomaly = ParseAnomaly {
                    line: index_line,
                    kind,
                    kept,
                };
                warn!(%anomaly, "malformed subtitle block");
                parsed.anomalies.push(anomaly);
                if !kept {
                    continue;
                }
                partial
            }
        };
        parsed.entries.push(CaptionEntry {
            start,
            end,
            text: text.join("\n"),
        });
    }
    parsed
}

type Timing = Result<(f64, f64), (AnomalyKind, (f64, f64))>;

fn unreadable(kind: AnomalyKind) -> (AnomalyKind, (f64, f64)) {
    (kind, (f64::NAN, f64::NAN))
}

/// A block index: a non-empty run of ASCII digits.
fn is_index_line(line: &str) -> bool {
    !line.is_empty() && line.bytes().all(|b| b.is_ascii_digit())
}

/// Parse a time range like `00:00:01,000 --> 00:00:02,000` to seconds.
/// On failure the bounds that could be read are still handed back, the others are NaN.
fn parse_times(line: &str) -> Timing {
    let Some((start, end)) = line.split_once("-->") else {
        return Err(unreadable(AnomalyKind::MissingArrow(line.to_string())));
    };
    // Anything after the end timestamp (e.g. `X1:40 X2:600`) is ignored.
    let end = end.split_whitespace().next().unwrap_or("");
    match (parse_time(start), parse_time(end)) {
        (Some(s), Some(e)) => Ok((s, e)),
        (s, e) => Err((
            AnomalyKind::BadTimestamp(line.to_string()),
            (s.unwrap_or(f64::NAN), e.unwrap_or(f64::NAN)),
        )),
    }
}

/// Parse `HH:MM:SS,mmm` into seconds.
/// Short fields such as `1:2:3,4` are accepted and read as `01:02:03.4`.
pub fn parse_time(t: &str) -> Option<f64> {
    let mut parts = t.trim().splitn(3, ':');
    let h: u32 = parts.next()?.trim().parse().ok()?;
    let m: u32 = parts.next()?.trim().parse().ok()?;
    let seconds = parts.next()?.trim().replace(',', ".");
    if seconds.is_empty() || !seconds.bytes().all(|b| b.is_ascii_digit() || b == b'.') {
        return None;
    }
    let s: f64 = seconds.parse().ok()?;
    Some(f64::from(h) * 3600.0 + f64::from(m) * 60.0 + s)
}

/// Format entries back to SRT text.
/// Blocks are renumbered from 1 in timeline order.
pub fn format(entries: &[CaptionEntry]) -> String {
    let mut out = String::new();
    for (i, entry) in entries.iter().enumerate() {
        out.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            i + 1,
            format_time(entry.start),
            format_time(entry.end),
            entry.text
        ));
    }
    out
}

/// Largest time an SRT timestamp can hold with a two digit hour field.
const MAX_TIMESTAMP_MS: u64 = 99 * 3_600_000 + 59 * 60_000 + 59 * 1000 + 999;

/// Format seconds as `HH:MM:SS,mmm`.
/// Negative and non-finite values are written as zero, values past
/// `99:59:59,999` are clamped to it.
pub fn format_time(secs: f64) -> String {
    let total = if secs.is_finite() && secs > 0.0 {
        ((secs * 1000.0).round() as u64).min(MAX_TIMESTAMP_MS)
    } else {
        0
    };
    let (hours, rest) = (total / 3_600_000, total % 3_600_000);
    let (minutes, rest) = (rest / 60_000, rest % 60_000);
    let (seconds, millis) = (rest / 1000, rest % 1000);
    format!("{hours:02}:{minutes:02}:{seconds:02},{millis:03}")
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_BLOCKS: &str =
        "1\n00:00:01,000 --> 00:00:02,000\nHello\n\n2\n00:00:03,000 --> 00:00:04,000\nWorld\n\n";

    /// Ensure the canonical two block file yields both entries in order.
    #[test]
    fn parses_two_blocks() {
        let parsed = parse(TWO_BLOCKS, ParseMode::Lenient);
        assert!(parsed.anomalies.is_empty());
        assert_eq!(
            parsed.entries,
            vec![
                CaptionEntry::new(1.0, 2.0, "Hello"),
                CaptionEntry::new(3.0, 4.0, "World"),
            ]
        );
    }

    /// Ensure multi-line captions keep their line breaks.
    #[test]
    fn keeps_line_breaks() {
        let input = "7\n00:01:00,500 --> 00:01:02,250\n  first line\nsecond line \n\n";
        let parsed = parse(input, ParseMode::Lenient);
        let entry = &parsed.entries[0];
        assert_eq!(entry.text, "first line\nsecond line");
        assert_eq!(entry.lines().collect::<Vec<_>>(), vec!["first line", "second line"]);
        assert!((entry.start - 60.5).abs() < 1e-9);
        assert!((entry.end - 62.25).abs() < 1e-9);
    }

    /// Ensure Windows line endings and a byte order mark are tolerated.
    #[test]
    fn handles_crlf_and_bom() {
        let input = "\u{FEFF}1\r\n00:00:01,000 --> 00:00:02,000\r\nHi\r\n\r\n";
        let parsed = parse(input, ParseMode::Strict);
        assert_eq!(parsed.entries, vec![CaptionEntry::new(1.0, 2.0, "Hi")]);
    }

    /// Ensure lenient parsing keeps a bad block with NaN bounds and carries on.
    #[test]
    fn lenient_keeps_bad_block() {
        let input = "1\n00:00:xx,000 --> 00:00:02,000\nBroken\n\n2\n00:00:03,000 --> 00:00:04,000\nFine\n";
        let parsed = parse(input, ParseMode::Lenient);
        assert_eq!(parsed.entries.len(), 2);
        assert!(parsed.entries[0].start.is_nan());
        assert_eq!(parsed.entries[0].end, 2.0);
        assert_eq!(parsed.entries[0].text, "Broken");
        assert_eq!(parsed.entries[1], CaptionEntry::new(3.0, 4.0, "Fine"));
        assert_eq!(parsed.anomalies.len(), 1);
        assert_eq!(parsed.anomalies[0].line, 1);
        assert!(parsed.anomalies[0].kept);
    }

    /// Ensure strict parsing drops the bad block but keeps the rest.
    #[test]
    fn strict_drops_bad_block() {
        let input = "1\nnot a timing line\nBroken\n\n2\n00:00:03,000 --> 00:00:04,000\nFine\n";
        let parsed = parse(input, ParseMode::Strict);
        assert_eq!(parsed.entries, vec![CaptionEntry::new(3.0, 4.0, "Fine")]);
        assert!(matches!(parsed.anomalies[0].kind, AnomalyKind::MissingArrow(_)));
        assert!(!parsed.anomalies[0].kept);
    }

    /// Ensure an index with nothing after it does not swallow the next block.
    #[test]
    fn index_without_timing_line() {
        let input = "1\n\n2\n00:00:03,000 --> 00:00:04,000\nFine\n";
        let parsed = parse(input, ParseMode::Lenient);
        assert_eq!(parsed.entries.len(), 2);
        assert!(parsed.entries[0].start.is_nan() && parsed.entries[0].end.is_nan());
        assert_eq!(parsed.entries[0].text, "");
        assert_eq!(parsed.anomalies[0].kind, AnomalyKind::MissingTimestamp);
    }

    /// Ensure stray text outside blocks and position hints are ignored.
    #[test]
    fn skips_noise() {
        let input = "WEBVTT-ish header\n\n1\n00:00:01,000 --> 00:00:02,500 X1:40 X2:600\nHi\n";
        let parsed = parse(input, ParseMode::Strict);
        assert_eq!(parsed.entries, vec![CaptionEntry::new(1.0, 2.5, "Hi")]);
    }

    /// Ensure short fields are accepted and junk is refused.
    #[test]
    fn parses_timestamps() {
        assert_eq!(parse_time("01:01:01,200"), Some(3661.2));
        assert_eq!(parse_time("1:1:1,2"), Some(3661.2));
        assert_eq!(parse_time("00:00:01,"), Some(1.0));
        assert_eq!(parse_time("00:00:inf"), None);
        assert_eq!(parse_time("00:01"), None);
        assert_eq!(parse_time(""), None);
    }

    /// Ensure formatting renumbers blocks and clamps odd values.
    #[test]
    fn formats_entries() {
        let entries = vec![
            CaptionEntry::new(1.0, 2.0, "Hello"),
            CaptionEntry::new(3723.004, 3724.5, "Two\nlines"),
        ];
        assert_eq!(
            format(&entries),
            "1\n00:00:01,000 --> 00:00:02,000\nHello\n\n2\n01:02:03,004 --> 01:02:04,500\nTwo\nlines\n\n"
        );
        assert_eq!(format_time(-0.3), "00:00:00,000");
        assert_eq!(format_time(f64::NAN), "00:00:00,000");
    }

    /// Ensure times past the largest SRT timestamp are clamped to it.
    #[test]
    fn formats_huge_times_clamped() {
        assert_eq!(format_time(359_999.999), "99:59:59,999");
        assert_eq!(format_time(360_000.0), "99:59:59,999");
        assert_eq!(format_time(1e300), "99:59:59,999");
        assert_eq!(format_time(f64::INFINITY), "00:00:00,000");
    }

    /// Ensure a formatted timeline parses back to the same entries.
    #[test]
    fn formatted_output_parses_back() {
        let parsed = parse(TWO_BLOCKS, ParseMode::Lenient);
        assert_eq!(format(&parsed.entries), TWO_BLOCKS);
    }
}
