/*!
 * Tests for media playlist resolution and segment fetching
 */

use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;

use segsubs::errors::{StreamError, TransportError};
use segsubs::segment_fetcher::{Segment, SegmentFetcher};
use segsubs::transport::MockTransport;

use crate::common::{init_logger, media_playlist, playlist_url, segment_url, serve_stream};

/// Test that payload order follows the playlist, not completion order
#[tokio::test]
async fn test_fetchAll_withReversedCompletionOrder_shouldReturnPlaylistOrder() {
    init_logger();
    let bodies: Vec<String> = (0..6).map(|i| format!("payload {}", i)).collect();
    let mut transport = serve_stream(MockTransport::new(), "en", &bodies);
    for index in 0..6 {
        // Earlier segments finish last
        transport = transport.with_delay(&segment_url("en", index), Duration::from_millis(5 * (6 - index as u64)));
    }
    let fetcher = SegmentFetcher::new(Arc::new(transport.clone()), 6);

    let segments = fetcher.fetch(&playlist_url("en")).await.unwrap();
    let payloads = fetcher.fetch_all(&segments).await.unwrap();

    let expected: Vec<Bytes> = bodies.into_iter().map(Bytes::from).collect();
    assert_eq!(payloads, expected);
    assert!(transport.max_in_flight() > 1);
}

/// Test that the concurrency limit is honoured
#[tokio::test]
async fn test_fetchAll_shouldRespectConcurrencyLimit() {
    let bodies: Vec<String> = (0..8).map(|i| i.to_string()).collect();
    let mut transport = serve_stream(MockTransport::new(), "fr", &bodies);
    for index in 0..8 {
        transport = transport.with_delay(&segment_url("fr", index), Duration::from_millis(10));
    }
    let fetcher = SegmentFetcher::new(Arc::new(transport.clone()), 2);
    let segments: Vec<Segment> = (0..8).map(|i| Segment::new(i, &segment_url("fr", i), 10.0)).collect();

    let payloads = fetcher.fetch_all(&segments).await.unwrap();

    assert_eq!(payloads.len(), 8);
    assert!(transport.max_in_flight() <= 2);
}

/// Test that a transport error on one segment fails the set
#[tokio::test]
async fn test_fetchAll_withTransportError_shouldReportSegment() {
    let transport = MockTransport::new()
        .with_body(&segment_url("de", 0), "ok")
        .with_error(&segment_url("de", 1), TransportError::Timeout("30s".to_string()));
    let fetcher = SegmentFetcher::new(Arc::new(transport), 4);
    let segments = vec![
        Segment::new(0, &segment_url("de", 0), 10.0),
        Segment::new(1, &segment_url("de", 1), 10.0),
    ];

    let error = fetcher.fetch_all(&segments).await.unwrap_err();

    match error {
        StreamError::SegmentFetch { index, uri, reason } => {
            assert_eq!(index, 1);
            assert_eq!(uri, segment_url("de", 1));
            assert!(reason.contains("timed out"));
        }
        other => panic!("unexpected error: {}", other),
    }
}

/// Test that a body which is not a playlist fails the load
#[tokio::test]
async fn test_fetch_withHtmlBody_shouldFail() {
    let transport = MockTransport::new().with_body(&playlist_url("it"), "<html>Access denied</html>");
    let fetcher = SegmentFetcher::new(Arc::new(transport), 4);

    let error = fetcher.fetch(&playlist_url("it")).await.unwrap_err();

    assert!(matches!(error, StreamError::MediaPlaylistLoad { .. }));
}

/// Test fetching from a blocking context
#[test]
fn test_fetch_withBlockOn_shouldListSegments() {
    let names = vec!["a.vtt".to_string(), "b.vtt".to_string()];
    let transport = MockTransport::new().with_body(&playlist_url("pt"), media_playlist(&names));
    let fetcher = SegmentFetcher::new(Arc::new(transport), 1);

    let segments = tokio_test::block_on(fetcher.fetch(&playlist_url("pt"))).unwrap();

    assert_eq!(segments.len(), 2);
    assert!(segments[1].uri.ends_with("/subs/pt/b.vtt"));
}
