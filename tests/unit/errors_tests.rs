/*!
 * Tests for error types
 */

use segsubs::errors::{AppError, ConversionError, StreamError, SubtitleError, TransportError};
use segsubs::subtitle_formats::SubtitleFormat;
use std::error::Error;

/// Test error messages
#[test]
fn test_error_display_shouldDescribeCause() {
    let transport = TransportError::ConnectionError("refused".to_string());
    assert_eq!(transport.to_string(), "Connection error: refused");

    let missing = SubtitleError::MissingSignature { format: SubtitleFormat::WebVtt };
    assert_eq!(missing.to_string(), "Missing WebVTT signature");

    let overflow = ConversionError::TimestampOverflow { timestamp_ms: 360_000_000, format: SubtitleFormat::SubRip };
    assert_eq!(overflow.to_string(), "Timestamp 360000000ms cannot be represented in SubRip");

    let fetch = StreamError::SegmentFetch {
        index: 3,
        uri: "https://x/3.vtt".to_string(),
        reason: "server responded with 404".to_string(),
    };
    assert_eq!(fetch.to_string(), "Failed to fetch segment 3 ('https://x/3.vtt'): server responded with 404");
}

/// Test error chaining
#[test]
fn test_streamError_cueParse_shouldExposeSource() {
    let error = StreamError::CueParse {
        segment_index: 0,
        source: SubtitleError::InvalidTimestamp { line: 4, value: "00:61.000".to_string() },
    };

    let source = error.source().map(|e| e.to_string());
    assert_eq!(source.as_deref(), Some("Invalid timestamp '00:61.000' at line 4"));
}

/// Test conversions into stream and application errors
#[test]
fn test_error_conversions_shouldWrap() {
    let stream: StreamError = ConversionError::RenderFailed {
        format: SubtitleFormat::SubRip,
        reason: "boom".to_string(),
    }
    .into();
    assert!(matches!(stream, StreamError::Conversion(_)));

    let app: AppError = anyhow::anyhow!("helper failed").into();
    assert!(matches!(app, AppError::Unknown(_)));

    let app: AppError = regex::Regex::new("(").unwrap_err().into();
    assert!(matches!(app, AppError::InvalidFilter(_)));
}
