/*!
 * Media playlist resolution and segment retrieval.
 *
 * A subtitle rendition's URI points at a media playlist listing the WebVTT
 * segments of the track. Segments are fetched concurrently into one slot
 * per segment and read back in playlist order.
 */

use bytes::Bytes;
use futures::stream::{self, StreamExt};
use log::{debug, error};
use std::sync::Arc;
use url::Url;

use crate::errors::StreamError;
use crate::transport::Transport;

/// One entry of a media playlist
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    /// Position in the media playlist
    pub index: usize,
    /// Absolute segment URI
    pub uri: String,
    /// Duration in seconds, from `#EXTINF`
    pub duration: f32,
}

impl Segment {
    pub fn new(index: usize, uri: &str, duration: f32) -> Self {
        Self {
            index,
            uri: uri.to_string(),
            duration,
        }
    }
}

/// Fetches media playlists and their segments through a transport
#[derive(Debug, Clone)]
pub struct SegmentFetcher {
    transport: Arc<dyn Transport>,
    max_concurrent_segments: usize,
}

impl SegmentFetcher {
    /// Create a fetcher dispatching up to `max_concurrent_segments` requests at once
    pub fn new(transport: Arc<dyn Transport>, max_concurrent_segments: usize) -> Self {
        Self {
            transport,
            max_concurrent_segments: max_concurrent_segments.max(1),
        }
    }

    /// Load a media playlist and list its segments with absolute URIs
    pub async fn fetch(&self, media_playlist_uri: &str) -> Result<Vec<Segment>, StreamError> {
        let load_error = |reason: String| StreamError::MediaPlaylistLoad {
            uri: media_playlist_uri.to_string(),
            reason,
        };

        let base = Url::parse(media_playlist_uri).map_err(|e| load_error(e.to_string()))?;

        let response = self
            .transport
            .get(media_playlist_uri)
            .await
            .map_err(|e| load_error(e.to_string()))?;
        if !response.is_success() {
            return Err(load_error(format!("server responded with {}", response.status)));
        }

        let playlist = m3u8_rs::parse_media_playlist_res(&response.body)
            .map_err(|_| load_error("not a valid media playlist".to_string()))?;

        let segments = playlist
            .segments
            .iter()
            .enumerate()
            .map(|(index, segment)| -> Result<Segment, StreamError> {
                let uri = base
                    .join(&segment.uri)
                    .map_err(|e| load_error(format!("invalid segment URI '{}': {}", segment.uri, e)))?;
                Ok(Segment {
                    index,
                    uri: uri.to_string(),
                    duration: segment.duration,
                })
            })
            .collect::<Result<Vec<_>, StreamError>>()?;

        if segments.is_empty() {
            return Err(load_error("playlist has no segments".to_string()));
        }

        debug!(
            "Media playlist {} lists {} segments ({:.1}s)",
            media_playlist_uri,
            segments.len(),
            segments.iter().map(|s| s.duration as f64).sum::<f64>()
        );

        Ok(segments)
    }

    /// Fetch every segment payload
    ///
    /// The returned payloads are aligned with `segments`. The first failure
    /// aborts the remaining requests and fails the whole set.
    pub async fn fetch_all(&self, segments: &[Segment]) -> Result<Vec<Bytes>, StreamError> {
        let mut slots: Vec<Option<Bytes>> = vec![None; segments.len()];

        let mut responses = stream::iter(segments.iter().enumerate())
            .map(|(slot, segment)| async move { (slot, self.fetch_segment(segment).await) })
            .buffer_unordered(self.max_concurrent_segments);

        while let Some((slot, result)) = responses.next().await {
            match result {
                Ok(body) => slots[slot] = Some(body),
                Err(e) => {
                    error!("{}", e);
                    return Err(e);
                }
            }
        }

        slots
            .into_iter()
            .zip(segments)
            .map(|(slot, segment)| {
                slot.ok_or_else(|| StreamError::SegmentFetch {
                    index: segment.index,
                    uri: segment.uri.clone(),
                    reason: "no payload received".to_string(),
                })
            })
            .collect()
    }

    async fn fetch_segment(&self, segment: &Segment) -> Result<Bytes, StreamError> {
        let fetch_error = |reason: String| StreamError::SegmentFetch {
            index: segment.index,
            uri: segment.uri.clone(),
            reason,
        };

        let response = self
            .transport
            .get(&segment.uri)
            .await
            .map_err(|e| fetch_error(e.to_string()))?;

        if !response.is_success() {
            return Err(fetch_error(format!("server responded with {}", response.status)));
        }

        Ok(response.body)
    }
}
