/*!
 * Subtitle formats understood by the pipeline.
 *
 * Every concrete format implements the `SubtitleCodec` capability set
 * (parse, render, header stripping) and is selected through its
 * `SubtitleFormat` tag:
 * - `webvtt`: the segmented source format
 * - `subrip`: the linear, index-numbered target format
 */

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::{ConversionError, SubtitleError};

pub mod cue;
pub mod encoding;
pub mod subrip;
pub mod webvtt;

pub use cue::{Cue, CueDocument, CueSetting, HeaderBlock, HeaderBlockKind};
pub use encoding::TextEncoding;
pub use subrip::SubRipCodec;
pub use webvtt::WebVttCodec;

/// Format tag used to pick a codec
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubtitleFormat {
    /// WebVTT (`.vtt`)
    WebVtt,
    /// SubRip (`.srt`)
    SubRip,
}

impl SubtitleFormat {
    /// Codec implementing this format
    pub fn codec(&self) -> &'static dyn SubtitleCodec {
        match self {
            Self::WebVtt => &WebVttCodec,
            Self::SubRip => &SubRipCodec,
        }
    }

    /// Conventional file extension, without the dot
    pub fn file_extension(&self) -> &'static str {
        match self {
            Self::WebVtt => "vtt",
            Self::SubRip => "srt",
        }
    }

    /// Encoding the format requires, if any
    pub fn mandated_encoding(&self) -> Option<TextEncoding> {
        match self {
            Self::WebVtt => Some(TextEncoding::Utf8),
            Self::SubRip => None,
        }
    }
}

impl fmt::Display for SubtitleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WebVtt => write!(f, "WebVTT"),
            Self::SubRip => write!(f, "SubRip"),
        }
    }
}

impl std::str::FromStr for SubtitleFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "webvtt" | "vtt" => Ok(Self::WebVtt),
            "subrip" | "srt" => Ok(Self::SubRip),
            _ => Err(anyhow::anyhow!("Unknown subtitle format: {}", s)),
        }
    }
}

/// Capability set every concrete subtitle format provides
pub trait SubtitleCodec: Send + Sync {
    /// Format tag of this codec
    fn format(&self) -> SubtitleFormat;

    /// Parse a complete document
    fn parse(&self, content: &str, language_code: &str) -> Result<CueDocument, SubtitleError>;

    /// Decode raw bytes and parse them, recording the detected encoding
    fn parse_bytes(&self, raw: &[u8], language_code: &str) -> Result<CueDocument, SubtitleError> {
        let (text, encoding) = TextEncoding::decode(raw)?;
        let mut document = self.parse(&text, language_code)?;
        document.encoding = encoding;
        Ok(document)
    }

    /// Render a document whose cues are already expressed in this format's markup
    fn render(&self, document: &CueDocument) -> Result<String, ConversionError>;

    /// Remove document-level header data, leaving only cues
    fn strip_header(&self, document: &mut CueDocument);
}
