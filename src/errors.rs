/*!
 * Error types for the segsubs library.
 *
 * Each layer gets its own error enum built with thiserror:
 * - `TransportError` for the network collaborator
 * - `SubtitleError` for cue format grammar problems
 * - `ConversionError` for targets that cannot represent a cue
 * - `StreamError` for anything that fails a single stream's pipeline
 * - `AppError` for batch-fatal configuration problems
 */

use thiserror::Error;

use crate::subtitle_formats::SubtitleFormat;

/// Errors raised by a transport implementation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    /// The request was sent but could not be completed
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The request did not finish in time
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// The URI could not be used for a request
    #[error("Invalid URI: {0}")]
    InvalidUri(String),
}

/// Grammar errors found while parsing a subtitle document
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SubtitleError {
    /// The document does not start with the format signature
    #[error("Missing {format} signature")]
    MissingSignature {
        /// Format that was expected
        format: SubtitleFormat,
    },

    /// A timestamp does not follow the format's grammar
    #[error("Invalid timestamp '{value}' at line {line}")]
    InvalidTimestamp {
        /// 1-based line number
        line: usize,
        /// Offending text
        value: String,
    },

    /// A cue block is structurally broken
    #[error("Malformed cue at line {line}: {reason}")]
    MalformedCue {
        /// 1-based line number
        line: usize,
        /// What was wrong
        reason: String,
    },

    /// The payload bytes are not valid for the declared encoding
    #[error("Invalid text encoding: {0}")]
    InvalidEncoding(String),
}

/// Errors raised when a document cannot be expressed in a target format
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConversionError {
    /// A timestamp is too large for the target timestamp grammar
    #[error("Timestamp {timestamp_ms}ms cannot be represented in {format}")]
    TimestampOverflow {
        /// Timestamp in milliseconds
        timestamp_ms: u64,
        /// Target format
        format: SubtitleFormat,
    },

    /// Rendering failed for another reason
    #[error("Failed to render {format}: {reason}")]
    RenderFailed {
        /// Target format
        format: SubtitleFormat,
        /// What went wrong
        reason: String,
    },
}

/// Errors that fail one stream's pipeline without affecting the batch
#[derive(Error, Debug)]
pub enum StreamError {
    /// The media playlist is missing, empty, unfetchable or unparseable
    #[error("Failed to load media playlist '{uri}': {reason}")]
    MediaPlaylistLoad {
        /// Media playlist URI (may be empty if the entry had none)
        uri: String,
        /// What went wrong
        reason: String,
    },

    /// A segment could not be retrieved
    #[error("Failed to fetch segment {index} ('{uri}'): {reason}")]
    SegmentFetch {
        /// Position of the segment in the playlist
        index: usize,
        /// Segment URI
        uri: String,
        /// What went wrong
        reason: String,
    },

    /// A segment or document failed the expected grammar
    #[error("Failed to parse segment {segment_index}: {source}")]
    CueParse {
        /// Position of the segment that failed
        segment_index: usize,
        /// Underlying grammar error
        #[source]
        source: SubtitleError,
    },

    /// The merged track could not be converted
    #[error("Conversion error: {0}")]
    Conversion(#[from] ConversionError),

    /// The batch was cancelled before this stream finished
    #[error("Cancelled before completion")]
    Cancelled,
}

/// Batch-fatal errors returned to the caller
#[derive(Error, Debug)]
pub enum AppError {
    /// A filter rule could not be built
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    /// The configuration is inconsistent
    #[error("Configuration error: {0}")]
    Config(String),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<regex::Error> for AppError {
    fn from(error: regex::Error) -> Self {
        Self::InvalidFilter(error.to_string())
    }
}
