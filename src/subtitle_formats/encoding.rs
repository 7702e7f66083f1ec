/*!
 * Text encodings a subtitle document can be declared in.
 */

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::SubtitleError;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
const UTF16LE_BOM: &[u8] = &[0xFF, 0xFE];

/// Declared text encoding of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TextEncoding {
    /// UTF-8 without byte order mark
    #[default]
    Utf8,
    /// UTF-8 with a leading byte order mark
    Utf8Bom,
    /// UTF-16 little endian with a leading byte order mark
    Utf16Le,
}

impl TextEncoding {
    /// Label reported next to rendered content
    pub fn label(&self) -> &'static str {
        match self {
            Self::Utf8 => "utf-8",
            Self::Utf8Bom => "utf-8-sig",
            Self::Utf16Le => "utf-16le",
        }
    }

    /// Decode raw bytes, detecting the encoding from a byte order mark
    pub fn decode(raw: &[u8]) -> Result<(String, TextEncoding), SubtitleError> {
        if let Some(rest) = raw.strip_prefix(UTF8_BOM) {
            let text = std::str::from_utf8(rest)
                .map_err(|e| SubtitleError::InvalidEncoding(e.to_string()))?;
            return Ok((text.to_string(), Self::Utf8Bom));
        }

        if let Some(rest) = raw.strip_prefix(UTF16LE_BOM) {
            if rest.len() % 2 != 0 {
                return Err(SubtitleError::InvalidEncoding(
                    "odd number of bytes in UTF-16 payload".to_string(),
                ));
            }
            let units: Vec<u16> = rest
                .chunks_exact(2)
                .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                .collect();
            let text = String::from_utf16(&units)
                .map_err(|e| SubtitleError::InvalidEncoding(e.to_string()))?;
            return Ok((text, Self::Utf16Le));
        }

        let text =
            std::str::from_utf8(raw).map_err(|e| SubtitleError::InvalidEncoding(e.to_string()))?;
        Ok((text.to_string(), Self::Utf8))
    }

    /// Encode text, prefixing a byte order mark where the encoding has one
    pub fn encode(&self, text: &str) -> Bytes {
        match self {
            Self::Utf8 => Bytes::from(text.to_string()),
            Self::Utf8Bom => {
                let mut out = Vec::with_capacity(text.len() + UTF8_BOM.len());
                out.extend_from_slice(UTF8_BOM);
                out.extend_from_slice(text.as_bytes());
                Bytes::from(out)
            }
            Self::Utf16Le => {
                let mut out = Vec::with_capacity(text.len() * 2 + UTF16LE_BOM.len());
                out.extend_from_slice(UTF16LE_BOM);
                for unit in text.encode_utf16() {
                    out.extend_from_slice(&unit.to_le_bytes());
                }
                Bytes::from(out)
            }
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}
