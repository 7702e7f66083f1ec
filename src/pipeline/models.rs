use bytes::Bytes;
use std::fmt;

use crate::errors::StreamError;
use crate::language_utils;
use crate::playlist::{PlaylistEntry, SubtitlesType};
use crate::subtitle_formats::{SubtitleFormat, TextEncoding};

/// Language code used for renditions without a `LANGUAGE` attribute
pub const UNDETERMINED_LANGUAGE: &str = "und";

/// Stage of one stream's pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamStage {
    Pending,
    Fetching,
    Merging,
    Polishing,
    Converting,
    Done,
    Failed,
}

impl StreamStage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

impl fmt::Display for StreamStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Pending => "pending",
            Self::Fetching => "fetching",
            Self::Merging => "merging",
            Self::Polishing => "polishing",
            Self::Converting => "converting",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        write!(f, "{}", label)
    }
}

/// Metadata derived from a rendition before any stage runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamMetadata {
    pub language_code: String,
    /// Playlist `NAME`, or the language's English name when the playlist has none
    pub language_name: String,
    pub special_type: SubtitlesType,
}

impl StreamMetadata {
    pub fn from_entry(entry: &PlaylistEntry) -> Self {
        let language_code = entry
            .language
            .as_deref()
            .map(str::trim)
            .filter(|code| !code.is_empty())
            .unwrap_or(UNDETERMINED_LANGUAGE)
            .to_string();

        let language_name = if entry.name.trim().is_empty() {
            language_utils::get_language_name(&language_code).unwrap_or_else(|_| language_code.clone())
        } else {
            entry.name.trim().to_string()
        };

        Self {
            language_code,
            language_name,
            special_type: entry.subtitles_type(),
        }
    }
}

impl fmt::Display for StreamMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.language_name, self.language_code)?;
        if self.special_type != SubtitlesType::Normal {
            write!(f, " [{}]", self.special_type)?;
        }
        Ok(())
    }
}

/// A track that made it through every stage
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitlesResult {
    pub language_code: String,
    pub language_name: String,
    pub special_type: SubtitlesType,
    pub format: SubtitleFormat,
    pub content: Bytes,
    pub encoding: TextEncoding,
}

impl SubtitlesResult {
    /// File name for storing the track next to a title, e.g. `Movie.en.forced.srt`
    pub fn file_name(&self, title: &str) -> String {
        let special = match self.special_type {
            SubtitlesType::Normal => "",
            SubtitlesType::Forced => ".forced",
            SubtitlesType::ClosedCaptions => ".cc",
        };
        format!("{}.{}{}.{}", title, self.language_code, special, self.format.file_extension())
    }
}

/// A track whose pipeline failed
#[derive(Debug)]
pub struct SubtitlesFailure {
    pub language_code: String,
    pub language_name: String,
    pub special_type: SubtitlesType,
    /// Stage that raised
    pub stage: StreamStage,
    pub cause: StreamError,
}

/// Outcome of one matched stream
#[derive(Debug)]
pub enum SubtitlesOutcome {
    Success(SubtitlesResult),
    Failure(SubtitlesFailure),
}

impl SubtitlesOutcome {
    pub(crate) fn failure(metadata: &StreamMetadata, stage: StreamStage, cause: StreamError) -> Self {
        Self::Failure(SubtitlesFailure {
            language_code: metadata.language_code.clone(),
            language_name: metadata.language_name.clone(),
            special_type: metadata.special_type,
            stage,
            cause,
        })
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn language_code(&self) -> &str {
        match self {
            Self::Success(result) => &result.language_code,
            Self::Failure(failure) => &failure.language_code,
        }
    }

    pub fn special_type(&self) -> SubtitlesType {
        match self {
            Self::Success(result) => result.special_type,
            Self::Failure(failure) => failure.special_type,
        }
    }

    pub fn as_success(&self) -> Option<&SubtitlesResult> {
        match self {
            Self::Success(result) => Some(result),
            Self::Failure(_) => None,
        }
    }

    pub fn as_failure(&self) -> Option<&SubtitlesFailure> {
        match self {
            Self::Success(_) => None,
            Self::Failure(failure) => Some(failure),
        }
    }
}
