/*!
 * Pipeline orchestrator for subtitle streams.
 *
 * Every rendition matched by the filter rules runs through:
 * 1. Fetching: media playlist and segment payloads
 * 2. Merging: one continuous WebVTT track
 * 3. Polishing: RTL correction and duplicate removal
 * 4. Converting: rendering in the configured target format
 *
 * Streams run concurrently and fail independently. Each yields exactly one
 * `SubtitlesOutcome`, returned in playlist order.
 */

use futures::stream::{self, StreamExt};
use log::{debug, error, info, warn};
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::app_config::Config;
use crate::errors::{AppError, StreamError};
use crate::language_utils;
use crate::playlist::{select, FilterRules, MasterPlaylist, PlaylistEntry};
use crate::processing::{convert, polish, CueMerger, PolishOptions};
use crate::segment_fetcher::SegmentFetcher;
use crate::subtitle_formats::SubtitleFormat;
use crate::transport::Transport;

use super::models::{StreamMetadata, StreamStage, SubtitlesOutcome, SubtitlesResult};

/// Callback receiving `(stream_index, stage)` on every stage transition
pub type StageObserver = Arc<dyn Fn(usize, StreamStage) + Send + Sync>;

/// Drives matched streams from playlist to rendered track
pub struct SubtitlesPipeline {
    config: Config,
    rules: FilterRules,
    fetcher: SegmentFetcher,
    merger: CueMerger,
    observer: Option<StageObserver>,
}

impl SubtitlesPipeline {
    /// Create a pipeline, validating the configuration and compiling its filters
    pub fn new(config: Config, transport: Arc<dyn Transport>) -> Result<Self, AppError> {
        let rules = config.filter_rules()?;
        config.validate().map_err(|e| AppError::Config(format!("{:#}", e)))?;

        Ok(Self {
            fetcher: SegmentFetcher::new(transport, config.fetch.max_concurrent_segments),
            merger: CueMerger::new(config.subtitles.boundary_tolerance_ms),
            rules,
            config,
            observer: None,
        })
    }

    /// Register a stage observer
    pub fn with_observer(mut self, observer: impl Fn(usize, StreamStage) + Send + Sync + 'static) -> Self {
        self.observer = Some(Arc::new(observer));
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Download every subtitles stream of `master` matching the configured filters
    ///
    /// # Arguments
    /// * `master` - Parsed master playlist
    /// * `languages` - Extra languages merged into the `LANGUAGE` filter
    /// * `cancel` - Token stopping streams that have not finished yet
    ///
    /// # Returns
    /// * `Result<Vec<SubtitlesOutcome>, AppError>` - One outcome per matched stream, in playlist order
    pub async fn download_subtitles(
        &self,
        master: &MasterPlaylist,
        languages: Option<&[String]>,
        cancel: &CancellationToken,
    ) -> Result<Vec<SubtitlesOutcome>, AppError> {
        let rules = self.rules.with_language_override(languages);
        let matched = select(master, &rules);

        info!(
            "{} of {} renditions match the subtitle filters",
            matched.len(),
            master.len()
        );

        let mut outcomes = stream::iter(matched.into_iter().enumerate())
            .map(|(index, entry)| self.process_stream(index, entry, cancel))
            .buffer_unordered(self.config.fetch.max_concurrent_streams.max(1))
            .collect::<Vec<_>>()
            .await;

        // Sort results by stream index to maintain playlist order
        outcomes.sort_by_key(|(index, _)| *index);
        let outcomes: Vec<SubtitlesOutcome> = outcomes.into_iter().map(|(_, outcome)| outcome).collect();

        let succeeded = outcomes.iter().filter(|outcome| outcome.is_success()).count();
        info!(
            "Subtitles download finished: {} succeeded, {} failed",
            succeeded,
            outcomes.len() - succeeded
        );

        Ok(outcomes)
    }

    async fn process_stream(
        &self,
        index: usize,
        entry: &PlaylistEntry,
        cancel: &CancellationToken,
    ) -> (usize, SubtitlesOutcome) {
        let metadata = StreamMetadata::from_entry(entry);
        let mut stage = StreamStage::Pending;
        self.notify(index, stage);

        let result = self.run_stages(index, entry, &metadata, cancel, &mut stage).await;
        let outcome = match result {
            Ok(result) => {
                debug!("Stream {} ({}) done", index, metadata);
                self.notify(index, StreamStage::Done);
                SubtitlesOutcome::Success(result)
            }
            Err(StreamError::Cancelled) => {
                warn!("Stream {} ({}) cancelled while {}", index, metadata, stage);
                self.notify(index, StreamStage::Failed);
                SubtitlesOutcome::failure(&metadata, stage, StreamError::Cancelled)
            }
            Err(cause) => {
                error!("Stream {} ({}) failed while {}: {}", index, metadata, stage, cause);
                self.notify(index, StreamStage::Failed);
                SubtitlesOutcome::failure(&metadata, stage, cause)
            }
        };

        (index, outcome)
    }

    async fn run_stages(
        &self,
        index: usize,
        entry: &PlaylistEntry,
        metadata: &StreamMetadata,
        cancel: &CancellationToken,
        stage: &mut StreamStage,
    ) -> Result<SubtitlesResult, StreamError> {
        self.enter(index, stage, StreamStage::Fetching, cancel)?;
        let uri = entry.uri.as_deref().ok_or_else(|| StreamError::MediaPlaylistLoad {
            uri: String::new(),
            reason: "rendition has no URI".to_string(),
        })?;
        let payloads = until_cancelled(cancel, async {
            let segments = self.fetcher.fetch(uri).await?;
            self.fetcher.fetch_all(&segments).await
        })
        .await?;

        self.enter(index, stage, StreamStage::Merging, cancel)?;
        let mut document = self.merger.merge(&payloads, &metadata.language_code)?;

        self.enter(index, stage, StreamStage::Polishing, cancel)?;
        polish(&mut document, self.polish_options(metadata));

        let converted = match self.config.subtitles.convert_to {
            Some(target) => {
                self.enter(index, stage, StreamStage::Converting, cancel)?;
                convert(&document, target, self.config.subtitles.output_encoding)?
            }
            None => convert(&document, SubtitleFormat::WebVtt, None)?,
        };

        Ok(SubtitlesResult {
            language_code: metadata.language_code.clone(),
            language_name: metadata.language_name.clone(),
            special_type: metadata.special_type,
            format: converted.format,
            content: converted.content,
            encoding: converted.encoding,
        })
    }

    /// Move to `next`, unless the batch was cancelled
    fn enter(
        &self,
        index: usize,
        stage: &mut StreamStage,
        next: StreamStage,
        cancel: &CancellationToken,
    ) -> Result<(), StreamError> {
        if cancel.is_cancelled() {
            return Err(StreamError::Cancelled);
        }
        debug!("Stream {}: {} -> {}", index, stage, next);
        *stage = next;
        self.notify(index, next);
        Ok(())
    }

    fn notify(&self, index: usize, stage: StreamStage) {
        if let Some(observer) = &self.observer {
            observer(index, stage);
        }
    }

    fn polish_options(&self, metadata: &StreamMetadata) -> PolishOptions {
        let settings = &self.config.subtitles;
        let rtl_language = settings.rtl_languages.is_empty()
            || language_utils::matches_any(&metadata.language_code, &settings.rtl_languages);

        PolishOptions {
            fix_rtl: settings.fix_rtl && rtl_language,
            remove_duplicates: settings.remove_duplicates,
        }
    }
}

/// Run `work` unless `cancel` fires first
async fn until_cancelled<T>(
    cancel: &CancellationToken,
    work: impl Future<Output = Result<T, StreamError>>,
) -> Result<T, StreamError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(StreamError::Cancelled),
        result = work => result,
    }
}
