use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::{ConversionError, SubtitleError};

use super::cue::{Cue, CueDocument};
use super::{SubtitleCodec, SubtitleFormat};

// @module: SubRip (SRT) parsing and rendering

// @const: SRT timing line regex, optional trailing coordinates are ignored
static TIMING_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{2}):(\d{2}):(\d{2}),(\d{3}) --> (\d{2}):(\d{2}):(\d{2}),(\d{3})(?:[ \t].*)?$").unwrap()
});

// @const: Largest timestamp expressible with two hour digits
const MAX_TIMESTAMP_MS: u64 = 99 * 3_600_000 + 59 * 60_000 + 59 * 1_000 + 999;

/// SubRip implementation of `SubtitleCodec`
#[derive(Debug, Clone, Copy, Default)]
pub struct SubRipCodec;

impl SubRipCodec {
    /// Parse an SRT timestamp (`HH:MM:SS,mmm`) to milliseconds
    pub fn parse_timestamp(timestamp: &str) -> Option<u64> {
        let parts: Vec<&str> = timestamp.split([':', ',']).collect();
        if parts.len() != 4 || parts[0].len() != 2 || parts[1].len() != 2 || parts[2].len() != 2 || parts[3].len() != 3 {
            return None;
        }

        let hours: u64 = parts[0].parse().ok()?;
        let minutes: u64 = parts[1].parse().ok()?;
        let seconds: u64 = parts[2].parse().ok()?;
        let millis: u64 = parts[3].parse().ok()?;

        if minutes >= 60 || seconds >= 60 {
            return None;
        }

        Some(hours * 3_600_000 + minutes * 60_000 + seconds * 1_000 + millis)
    }

    /// Format a timestamp in milliseconds to SRT format (HH:MM:SS,mmm)
    pub fn format_timestamp(ms: u64) -> Result<String, ConversionError> {
        if ms > MAX_TIMESTAMP_MS {
            return Err(ConversionError::TimestampOverflow {
                timestamp_ms: ms,
                format: SubtitleFormat::SubRip,
            });
        }

        let hours = ms / 3_600_000;
        let minutes = (ms % 3_600_000) / 60_000;
        let seconds = (ms % 60_000) / 1_000;
        let millis = ms % 1_000;

        Ok(format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis))
    }

    fn timing_from_captures(caps: &regex::Captures, start_idx: usize) -> Option<u64> {
        let value = format!(
            "{}:{}:{},{}",
            &caps[start_idx],
            &caps[start_idx + 1],
            &caps[start_idx + 2],
            &caps[start_idx + 3]
        );
        Self::parse_timestamp(&value)
    }
}

impl SubtitleCodec for SubRipCodec {
    fn format(&self) -> SubtitleFormat {
        SubtitleFormat::SubRip
    }

    fn parse(&self, content: &str, language_code: &str) -> Result<CueDocument, SubtitleError> {
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);
        let normalized = content.replace("\r\n", "\n").replace('\r', "\n");
        let lines: Vec<&str> = normalized.split('\n').collect();

        let mut document = CueDocument::new(SubtitleFormat::SubRip, language_code);
        let mut index = 0;

        while index < lines.len() {
            if lines[index].trim().is_empty() {
                index += 1;
                continue;
            }

            let block_start = index;
            while index < lines.len() && !lines[index].trim().is_empty() {
                index += 1;
            }
            let block = &lines[block_start..index];
            let line_no = block_start + 1;

            // Sequence numbers are positional and get reassigned on render
            if block[0].trim().parse::<usize>().is_err() {
                return Err(SubtitleError::MalformedCue {
                    line: line_no,
                    reason: format!("expected a cue number, found '{}'", block[0]),
                });
            }

            let timing_line = block.get(1).ok_or_else(|| SubtitleError::MalformedCue {
                line: line_no,
                reason: "missing timing line".to_string(),
            })?;

            let caps = TIMING_REGEX.captures(timing_line.trim()).ok_or_else(|| {
                SubtitleError::MalformedCue {
                    line: line_no + 1,
                    reason: format!("invalid timing line '{}'", timing_line),
                }
            })?;

            let invalid_timestamp = || SubtitleError::InvalidTimestamp {
                line: line_no + 1,
                value: timing_line.trim().to_string(),
            };
            let start_ms = Self::timing_from_captures(&caps, 1).ok_or_else(invalid_timestamp)?;
            let end_ms = Self::timing_from_captures(&caps, 5).ok_or_else(invalid_timestamp)?;

            let text = &block[2..];
            if text.is_empty() {
                warn!("Skipping empty subtitle entry at line {}", line_no);
                continue;
            }
            if end_ms <= start_ms {
                warn!(
                    "Skipping subtitle entry at line {}: end time {} <= start time {}",
                    line_no, end_ms, start_ms
                );
                continue;
            }

            document.cues.push(Cue::new(
                start_ms,
                end_ms,
                text.iter().map(|line| line.to_string()).collect(),
            ));
        }

        Ok(document)
    }

    fn render(&self, document: &CueDocument) -> Result<String, ConversionError> {
        let mut output = String::new();

        for (position, cue) in document.cues.iter().enumerate() {
            output.push_str(&(position + 1).to_string());
            output.push('\n');
            output.push_str(&Self::format_timestamp(cue.start_ms)?);
            output.push_str(" --> ");
            output.push_str(&Self::format_timestamp(cue.end_ms)?);
            output.push('\n');
            for line in &cue.lines {
                output.push_str(line);
                output.push('\n');
            }
            output.push('\n');
        }

        Ok(output)
    }

    fn strip_header(&self, _document: &mut CueDocument) {
        // SubRip has no document header
    }
}
