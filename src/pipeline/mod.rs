/*!
 * Subtitles download pipeline.
 *
 * - `models`: stream stages, metadata and per-stream outcomes
 * - `orchestrator`: drives every matched stream through fetch, merge, polish and convert
 */

pub mod models;
pub mod orchestrator;

pub use models::{StreamMetadata, StreamStage, SubtitlesFailure, SubtitlesOutcome, SubtitlesResult};
pub use orchestrator::{StageObserver, SubtitlesPipeline};
