/*!
 * Track processing stages run after segments are fetched.
 *
 * - `merger`: stitches segment payloads into one track
 * - `polisher`: RTL correction and duplicate removal
 * - `converter`: re-renders a track in another subtitle format
 */

pub mod converter;
pub mod merger;
pub mod polisher;

pub use converter::{convert, ConvertedSubtitles};
pub use merger::{CueMerger, BOUNDARY_TOLERANCE_MS};
pub use polisher::{polish, PolishOptions};
