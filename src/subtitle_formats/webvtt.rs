/*!
 * WebVTT codec.
 *
 * Handles the subset of WebVTT that segmented HLS subtitle tracks use:
 * - `WEBVTT` signature with optional trailing text
 * - header metadata lines (e.g. `X-TIMESTAMP-MAP=MPEGTS:900000,LOCAL:00:00:00.000`)
 * - STYLE, REGION and NOTE blocks before the first cue
 * - cues with optional identifier, `[HH:]MM:SS.mmm` timings and settings
 */

use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::{ConversionError, SubtitleError};

use super::cue::{Cue, CueDocument, CueSetting, HeaderBlock, HeaderBlockKind};
use super::{SubtitleCodec, SubtitleFormat, TextEncoding};

const SIGNATURE: &str = "WEBVTT";
const TIMING_ARROW: &str = "-->";

static TIMING_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\S+)[ \t]+-->[ \t]+(\S+)(?:[ \t]+(.*))?$").unwrap()
});

static TIMESTAMP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:(\d{2,}):)?(\d{2}):(\d{2})\.(\d{3})$").unwrap()
});

/// WebVTT implementation of `SubtitleCodec`
#[derive(Debug, Clone, Copy, Default)]
pub struct WebVttCodec;

impl WebVttCodec {
    /// Parse a WebVTT timestamp to milliseconds
    pub fn parse_timestamp(value: &str) -> Option<u64> {
        let caps = TIMESTAMP_REGEX.captures(value)?;
        let hours: u64 = caps.get(1).map_or(Some(0), |m| m.as_str().parse().ok())?;
        let minutes: u64 = caps[2].parse().ok()?;
        let seconds: u64 = caps[3].parse().ok()?;
        let millis: u64 = caps[4].parse().ok()?;

        if minutes >= 60 || seconds >= 60 {
            return None;
        }

        // Hours are unbounded in WebVTT; out-of-range values are rejected
        hours
            .checked_mul(3_600_000)?
            .checked_add(minutes * 60_000 + seconds * 1_000 + millis)
    }

    /// Format milliseconds as `HH:MM:SS.mmm`
    pub fn format_timestamp(ms: u64) -> String {
        let hours = ms / 3_600_000;
        let minutes = (ms % 3_600_000) / 60_000;
        let seconds = (ms % 60_000) / 1_000;
        let millis = ms % 1_000;

        format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, seconds, millis)
    }

    fn block_kind(first_line: &str) -> Option<HeaderBlockKind> {
        let keyword_matches = |keyword: &str| {
            first_line == keyword
                || first_line
                    .strip_prefix(keyword)
                    .is_some_and(|rest| rest.starts_with([' ', '\t']))
        };

        if keyword_matches("NOTE") {
            Some(HeaderBlockKind::Note)
        } else if keyword_matches("STYLE") {
            Some(HeaderBlockKind::Style)
        } else if keyword_matches("REGION") {
            Some(HeaderBlockKind::Region)
        } else {
            None
        }
    }

    fn parse_settings(raw: Option<&str>) -> Vec<CueSetting> {
        let Some(raw) = raw else {
            return Vec::new();
        };

        raw.split_whitespace()
            .filter_map(|token| match token.split_once(':') {
                Some((key, value)) if !key.is_empty() && !value.is_empty() => {
                    Some(CueSetting::new(key, value))
                }
                _ => {
                    debug!("Ignoring malformed cue setting '{}'", token);
                    None
                }
            })
            .collect()
    }

    /// Parse one cue block; `Ok(None)` means the cue was valid grammar but carries nothing to keep
    fn parse_cue(block: &[&str], first_line_no: usize) -> Result<Option<Cue>, SubtitleError> {
        let (identifier, timing_offset) = if block[0].contains(TIMING_ARROW) {
            (None, 0)
        } else {
            (Some(block[0].to_string()), 1)
        };

        let timing_line_no = first_line_no + timing_offset;
        let timing_line = block.get(timing_offset).ok_or_else(|| SubtitleError::MalformedCue {
            line: first_line_no,
            reason: "missing timing line".to_string(),
        })?;

        let caps = TIMING_REGEX
            .captures(timing_line.trim())
            .ok_or_else(|| SubtitleError::MalformedCue {
                line: timing_line_no,
                reason: format!("invalid timing line '{}'", timing_line),
            })?;

        let parse = |value: &str| {
            Self::parse_timestamp(value).ok_or_else(|| SubtitleError::InvalidTimestamp {
                line: timing_line_no,
                value: value.to_string(),
            })
        };
        let start_ms = parse(&caps[1])?;
        let end_ms = parse(&caps[2])?;
        let settings = Self::parse_settings(caps.get(3).map(|m| m.as_str()));

        let payload = &block[timing_offset + 1..];
        if let Some(position) = payload.iter().position(|line| line.contains(TIMING_ARROW)) {
            return Err(SubtitleError::MalformedCue {
                line: timing_line_no + 1 + position,
                reason: "cue text contains a timing arrow".to_string(),
            });
        }

        if payload.is_empty() {
            debug!("Skipping cue without text at line {}", timing_line_no);
            return Ok(None);
        }

        if end_ms <= start_ms {
            warn!(
                "Skipping cue at line {} with invalid time range: end {} <= start {}",
                timing_line_no, end_ms, start_ms
            );
            return Ok(None);
        }

        Ok(Some(Cue {
            identifier,
            start_ms,
            end_ms,
            lines: payload.iter().map(|line| line.to_string()).collect(),
            settings,
        }))
    }
}

impl SubtitleCodec for WebVttCodec {
    fn format(&self) -> SubtitleFormat {
        SubtitleFormat::WebVtt
    }

    fn parse(&self, content: &str, language_code: &str) -> Result<CueDocument, SubtitleError> {
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);
        let normalized = content.replace("\r\n", "\n").replace('\r', "\n");
        let lines: Vec<&str> = normalized.split('\n').collect();

        let first = lines.first().copied().unwrap_or_default();
        let signature_suffix = match first.strip_prefix(SIGNATURE) {
            Some("") => None,
            Some(rest) if rest.starts_with([' ', '\t']) => {
                let rest = rest.trim();
                (!rest.is_empty()).then(|| rest.to_string())
            }
            _ => {
                return Err(SubtitleError::MissingSignature {
                    format: SubtitleFormat::WebVtt,
                });
            }
        };

        let mut document = CueDocument::new(SubtitleFormat::WebVtt, language_code);
        document.signature_suffix = signature_suffix;
        document.encoding = TextEncoding::Utf8;

        // Header metadata runs until the first blank line
        let mut index = 1;
        while index < lines.len() && !lines[index].trim().is_empty() {
            if lines[index].contains(TIMING_ARROW) {
                return Err(SubtitleError::MalformedCue {
                    line: index + 1,
                    reason: "cue found before the blank line ending the header".to_string(),
                });
            }
            document.header_lines.push(lines[index].to_string());
            index += 1;
        }

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

            let is_header_block = !block.iter().any(|line| line.contains(TIMING_ARROW));
            if let (Some(kind), true) = (Self::block_kind(block[0]), is_header_block) {
                if document.cues.is_empty() {
                    document.header_blocks.push(HeaderBlock {
                        kind,
                        lines: block.iter().map(|line| line.to_string()).collect(),
                    });
                } else {
                    debug!("Dropping {:?} block after the first cue at line {}", kind, block_start + 1);
                }
                continue;
            }

            if let Some(cue) = Self::parse_cue(block, block_start + 1)? {
                document.cues.push(cue);
            }
        }

        Ok(document)
    }

    fn render(&self, document: &CueDocument) -> Result<String, ConversionError> {
        let mut output = String::from(SIGNATURE);
        if let Some(suffix) = &document.signature_suffix {
            output.push(' ');
            output.push_str(suffix);
        }
        output.push('\n');
        for line in &document.header_lines {
            output.push_str(line);
            output.push('\n');
        }
        output.push('\n');

        for block in &document.header_blocks {
            for line in &block.lines {
                output.push_str(line);
                output.push('\n');
            }
            output.push('\n');
        }

        for cue in &document.cues {
            if let Some(identifier) = &cue.identifier {
                output.push_str(identifier);
                output.push('\n');
            }
            output.push_str(&Self::format_timestamp(cue.start_ms));
            output.push_str(" --> ");
            output.push_str(&Self::format_timestamp(cue.end_ms));
            if !cue.settings.is_empty() {
                output.push(' ');
                output.push_str(&cue.settings_string());
            }
            output.push('\n');
            for line in &cue.lines {
                output.push_str(line);
                output.push('\n');
            }
            output.push('\n');
        }

        Ok(output)
    }

    fn strip_header(&self, document: &mut CueDocument) {
        document.signature_suffix = None;
        document.header_lines.clear();
        document.header_blocks.clear();
    }
}
