/*!
 * In-memory cue model shared by every subtitle format.
 */

use std::fmt;

use super::{SubtitleFormat, TextEncoding};

/// One `key:value` cue setting (WebVTT positioning/alignment)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CueSetting {
    pub key: String,
    pub value: String,
}

impl CueSetting {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for CueSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.key, self.value)
    }
}

/// Single timed subtitle entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cue {
    /// Optional cue identifier (WebVTT) or source index (SubRip)
    pub identifier: Option<String>,

    /// Start time in ms
    pub start_ms: u64,

    /// End time in ms
    pub end_ms: u64,

    /// Text lines, in display order
    pub lines: Vec<String>,

    /// Positioning and alignment settings, in source order
    pub settings: Vec<CueSetting>,
}

impl Cue {
    /// Creates a cue without identifier or settings
    pub fn new(start_ms: u64, end_ms: u64, lines: Vec<String>) -> Self {
        Self {
            identifier: None,
            start_ms,
            end_ms,
            lines,
            settings: Vec::new(),
        }
    }

    /// Convenience constructor splitting `text` on newlines
    pub fn from_text(start_ms: u64, end_ms: u64, text: &str) -> Self {
        Self::new(start_ms, end_ms, text.lines().map(str::to_string).collect())
    }

    /// Adds a setting, returning the cue
    pub fn with_setting(mut self, key: &str, value: &str) -> Self {
        self.settings.push(CueSetting::new(key, value));
        self
    }

    /// Text lines joined with `\n`
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    pub fn duration_ms(&self) -> u64 {
        self.end_ms.saturating_sub(self.start_ms)
    }

    /// Value of a setting by key
    pub fn setting(&self, key: &str) -> Option<&str> {
        self.settings
            .iter()
            .find(|s| s.key == key)
            .map(|s| s.value.as_str())
    }

    /// Settings rendered as a WebVTT settings list
    pub fn settings_string(&self) -> String {
        self.settings
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Kind of a header block preceding the first cue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderBlockKind {
    Style,
    Region,
    Note,
}

/// A STYLE, REGION or NOTE block kept verbatim
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderBlock {
    pub kind: HeaderBlockKind,

    /// Block lines including the leading keyword line
    pub lines: Vec<String>,
}

/// Parsed subtitle track
#[derive(Debug, Clone, PartialEq)]
pub struct CueDocument {
    /// Format the cue markup is expressed in
    pub format: SubtitleFormat,

    /// Language code of the track
    pub language_code: String,

    /// Text following the signature on the first line (e.g. `WEBVTT - title`)
    pub signature_suffix: Option<String>,

    /// Header metadata lines such as `X-TIMESTAMP-MAP=...`
    pub header_lines: Vec<String>,

    /// STYLE/REGION/NOTE blocks before the first cue
    pub header_blocks: Vec<HeaderBlock>,

    /// Cues in track order
    pub cues: Vec<Cue>,

    /// Declared text encoding
    pub encoding: TextEncoding,
}

impl CueDocument {
    /// Empty document in the given format
    pub fn new(format: SubtitleFormat, language_code: &str) -> Self {
        Self {
            format,
            language_code: language_code.to_string(),
            signature_suffix: None,
            header_lines: Vec::new(),
            header_blocks: Vec::new(),
            cues: Vec::new(),
            encoding: format.mandated_encoding().unwrap_or_default(),
        }
    }

    /// Document built from a list of cues
    pub fn with_cues(format: SubtitleFormat, language_code: &str, cues: Vec<Cue>) -> Self {
        let mut document = Self::new(format, language_code);
        document.cues = cues;
        document
    }

    /// Whether the document carries any header data
    pub fn has_header(&self) -> bool {
        self.signature_suffix.is_some()
            || !self.header_lines.is_empty()
            || !self.header_blocks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.cues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }
}

impl fmt::Display for CueDocument {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Cue Document")?;
        writeln!(f, "Format: {}", self.format)?;
        writeln!(f, "Language: {}", self.language_code)?;
        writeln!(f, "Cues: {}", self.cues.len())?;
        Ok(())
    }
}
