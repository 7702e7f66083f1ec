/*!
 * Segment merging.
 *
 * Segmented tracks carry a full WebVTT document per segment, and encoders
 * re-emit the last cue(s) of a segment at the start of the next one so
 * playback survives the cut. The merger keeps the first segment's header,
 * strips every later header and folds those repeated cues back into the
 * copy already merged.
 */

use log::{debug, warn};

use crate::errors::StreamError;
use crate::subtitle_formats::{Cue, CueDocument, SubtitleCodec, SubtitleFormat};

/// Timing tolerance for boundary duplicate detection, in milliseconds
pub const BOUNDARY_TOLERANCE_MS: u64 = 100;

/// How many trailing cues of the merged track a new segment's cues are compared with
pub const MAX_BOUNDARY_LOOKBACK: usize = 8;

/// Merges segment payloads into one continuous track
#[derive(Debug, Clone, Copy)]
pub struct CueMerger {
    tolerance_ms: u64,
}

impl Default for CueMerger {
    fn default() -> Self {
        Self::new(BOUNDARY_TOLERANCE_MS)
    }
}

impl CueMerger {
    /// Merger using a custom boundary tolerance
    pub fn new(tolerance_ms: u64) -> Self {
        Self { tolerance_ms }
    }

    pub fn tolerance_ms(&self) -> u64 {
        self.tolerance_ms
    }

    /// Merge WebVTT segment payloads, in playlist order, into a single document
    ///
    /// # Arguments
    /// * `payloads` - Raw segment bodies aligned with segment order
    /// * `language_code` - Language recorded on the merged document
    ///
    /// # Returns
    /// * `Result<CueDocument, StreamError>` - The merged track, or `CueParse` naming the first segment that failed
    pub fn merge<P: AsRef<[u8]>>(&self, payloads: &[P], language_code: &str) -> Result<CueDocument, StreamError> {
        let codec = SubtitleFormat::WebVtt.codec();
        let mut merged = CueDocument::new(SubtitleFormat::WebVtt, language_code);
        let mut dropped = 0;

        for (segment_index, payload) in payloads.iter().enumerate() {
            let mut document = codec
                .parse_bytes(payload.as_ref(), language_code)
                .map_err(|source| StreamError::CueParse { segment_index, source })?;

            if segment_index == 0 {
                merged = document;
                continue;
            }

            codec.strip_header(&mut document);
            dropped += self.append_segment(&mut merged, document.cues, segment_index);
        }

        debug!(
            "Merged {} segments into {} cues ({} boundary duplicates dropped)",
            payloads.len(),
            merged.cues.len(),
            dropped
        );

        Ok(merged)
    }

    /// Append one segment's cues, folding leading boundary duplicates into the merged tail
    ///
    /// Returns the number of cues dropped.
    fn append_segment(&self, merged: &mut CueDocument, cues: Vec<Cue>, segment_index: usize) -> usize {
        let tail_end = merged.cues.len();
        let tail_start = tail_end.saturating_sub(MAX_BOUNDARY_LOOKBACK);
        let mut scanning = true;
        let mut dropped = 0;

        for cue in cues {
            if scanning {
                let kept = merged.cues[tail_start..tail_end]
                    .iter_mut()
                    .rev()
                    .find(|kept| self.is_boundary_duplicate(kept, &cue));

                if let Some(kept) = kept {
                    if cue.end_ms > kept.end_ms {
                        debug!(
                            "Segment {}: extending cue ending at {}ms to {}ms",
                            segment_index, kept.end_ms, cue.end_ms
                        );
                        kept.end_ms = cue.end_ms;
                    }
                    dropped += 1;
                    continue;
                }
                scanning = false;
            }

            if let Some(last) = merged.cues.last() {
                if cue.start_ms.saturating_add(self.tolerance_ms) < last.start_ms {
                    warn!(
                        "Segment {}: cue at {}ms starts before the previous cue at {}ms",
                        segment_index, cue.start_ms, last.start_ms
                    );
                }
            }

            merged.cues.push(cue);
        }

        dropped
    }

    /// Whether `candidate` repeats `kept` across a segment cut
    pub fn is_boundary_duplicate(&self, kept: &Cue, candidate: &Cue) -> bool {
        if kept.lines != candidate.lines {
            return false;
        }

        let tolerance = self.tolerance_ms;
        let same_timing = kept.start_ms.abs_diff(candidate.start_ms) <= tolerance
            && kept.end_ms.abs_diff(candidate.end_ms) <= tolerance;
        let overlapping = candidate.start_ms <= kept.end_ms.saturating_add(tolerance)
            && kept.start_ms <= candidate.end_ms.saturating_add(tolerance);

        same_timing || overlapping
    }
}
