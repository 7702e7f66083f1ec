/*!
 * End-to-end tests for the subtitles pipeline
 */

use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use segsubs::app_config::Config;
use segsubs::errors::StreamError;
use segsubs::pipeline::{StreamStage, SubtitlesOutcome, SubtitlesPipeline};
use segsubs::playlist::{MediaType, PlaylistEntry, SubtitlesType};
use segsubs::subtitle_formats::{SubtitleFormat, TextEncoding};
use segsubs::transport::MockTransport;

use crate::common::{
    english_segments, french_segments, init_logger, master_playlist, playlist_url, segment_url, serve_stream,
    subtitles_entry, webvtt_segment,
};

fn text(outcome: &SubtitlesOutcome) -> String {
    let result = outcome.as_success().expect("stream should succeed");
    String::from_utf8(result.content.to_vec()).unwrap()
}

/// Test the English/French scenario end to end
#[tokio::test]
async fn test_downloadSubtitles_withEnglishAndFrench_shouldProduceTwoSubRipTracks() {
    init_logger();
    let transport = serve_stream(MockTransport::new(), "en", &english_segments());
    let transport = serve_stream(transport, "fr", &french_segments());

    let mut audio = subtitles_entry("audio", "en", "English audio");
    audio.media_type = MediaType::Audio;
    let master = master_playlist(vec![
        subtitles_entry("en", "en", "English"),
        audio,
        subtitles_entry("fr", "fr", ""),
    ]);

    let pipeline = SubtitlesPipeline::new(Config::default(), Arc::new(transport)).unwrap();
    let outcomes = pipeline
        .download_subtitles(&master, None, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[0].language_code(), "en");
    assert_eq!(outcomes[1].language_code(), "fr");

    let english = outcomes[0].as_success().unwrap();
    assert_eq!(english.format, SubtitleFormat::SubRip);
    assert_eq!(english.encoding, TextEncoding::Utf8);
    assert_eq!(english.language_name, "English");
    assert_eq!(
        text(&outcomes[0]),
        "1\n00:00:01,000 --> 00:00:03,000\nHello there.\n\n\
         2\n00:00:08,000 --> 00:00:10,000\nAcross the cut.\n\n\
         3\n00:00:12,000 --> 00:00:14,000\n<i>Goodbye.</i>\n\n"
    );

    let french = outcomes[1].as_success().unwrap();
    assert_eq!(french.language_name, "French");
    let french_text = text(&outcomes[1]);
    assert!(french_text.starts_with("1\n"));
    assert!(french_text.contains("2\n00:00:11,000 --> 00:00:13,000\nAu revoir & merci.\n"));
}

/// Test that one failing stream does not affect the others
#[tokio::test]
async fn test_downloadSubtitles_withFailingMiddleStream_shouldIsolateFailure() {
    init_logger();
    let transport = serve_stream(MockTransport::new(), "en", &english_segments());
    let transport = serve_stream(transport, "de", &french_segments()).with_status(&segment_url("de", 1), 500);
    let transport = serve_stream(transport, "fr", &french_segments());

    let master = master_playlist(vec![
        subtitles_entry("en", "en", "English"),
        subtitles_entry("de", "de", "Deutsch"),
        subtitles_entry("fr", "fr", "Français"),
    ]);

    let pipeline = SubtitlesPipeline::new(Config::default(), Arc::new(transport)).unwrap();
    let outcomes = pipeline
        .download_subtitles(&master, None, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcomes.len(), 3);
    assert!(outcomes[0].is_success());
    assert!(outcomes[2].is_success());

    let failure = outcomes[1].as_failure().unwrap();
    assert_eq!(failure.language_code, "de");
    assert_eq!(failure.language_name, "Deutsch");
    assert_eq!(failure.stage, StreamStage::Fetching);
    assert!(matches!(failure.cause, StreamError::SegmentFetch { index: 1, .. }));
}

/// Test that a middle stream whose media playlist cannot be loaded fails alone
#[tokio::test]
async fn test_downloadSubtitles_withMiddleMediaPlaylistError_shouldIsolateFailure() {
    init_logger();
    let transport = serve_stream(MockTransport::new(), "en", &english_segments());
    let transport = serve_stream(transport, "de", &french_segments()).with_status(&playlist_url("de"), 500);
    let transport = serve_stream(transport, "fr", &french_segments());

    let master = master_playlist(vec![
        subtitles_entry("en", "en", "English"),
        subtitles_entry("de", "de", "Deutsch"),
        subtitles_entry("fr", "fr", "Français"),
    ]);

    let pipeline = SubtitlesPipeline::new(Config::default(), Arc::new(transport)).unwrap();
    let outcomes = pipeline
        .download_subtitles(&master, None, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcomes.len(), 3);
    assert!(outcomes[0].is_success());
    assert!(outcomes[2].is_success());
    assert!(text(&outcomes[2]).contains("Au revoir & merci."));

    let failure = outcomes[1].as_failure().unwrap();
    assert_eq!(failure.language_code, "de");
    assert_eq!(failure.stage, StreamStage::Fetching);
    assert!(matches!(failure.cause, StreamError::MediaPlaylistLoad { .. }));
}

/// Test that a cue emptied by conversion fails its stream instead of corrupting the track
#[tokio::test]
async fn test_downloadSubtitles_withCueEmptiedByConversion_shouldFailWhileConverting() {
    let segments = vec![webvtt_segment(&[
        ("00:00:01.000", "00:00:02.000", "<c.bg></c>\nkept"),
        ("00:00:03.000", "00:00:04.000", "&nbsp;"),
    ])];
    let transport = serve_stream(MockTransport::new(), "en", &segments);
    let master = master_playlist(vec![subtitles_entry("en", "en", "English")]);

    let pipeline = SubtitlesPipeline::new(Config::default(), Arc::new(transport)).unwrap();
    let outcomes = pipeline
        .download_subtitles(&master, None, &CancellationToken::new())
        .await
        .unwrap();

    let failure = outcomes[0].as_failure().unwrap();
    assert_eq!(failure.stage, StreamStage::Converting);
    assert!(matches!(failure.cause, StreamError::Conversion(_)));
}

/// Test that a broken segment fails its stream at the merging stage
#[tokio::test]
async fn test_downloadSubtitles_withUnparseableSegment_shouldFailWhileMerging() {
    let segments = vec![
        webvtt_segment(&[("00:00:01.000", "00:00:02.000", "fine")]),
        "WEBVTT\n\n00:00:99.000 --> 00:00:100.000\nbroken\n".to_string(),
    ];
    let transport = serve_stream(MockTransport::new(), "en", &segments);
    let master = master_playlist(vec![subtitles_entry("en", "en", "English")]);

    let pipeline = SubtitlesPipeline::new(Config::default(), Arc::new(transport)).unwrap();
    let outcomes = pipeline
        .download_subtitles(&master, None, &CancellationToken::new())
        .await
        .unwrap();

    let failure = outcomes[0].as_failure().unwrap();
    assert_eq!(failure.stage, StreamStage::Merging);
    assert!(matches!(failure.cause, StreamError::CueParse { segment_index: 1, .. }));
}

/// Test that a rendition without URI fails instead of disappearing
#[tokio::test]
async fn test_downloadSubtitles_withRenditionWithoutUri_shouldReportLoadFailure() {
    let mut entry = subtitles_entry("en", "en", "English");
    entry.uri = None;
    let master = master_playlist(vec![entry]);

    let pipeline = SubtitlesPipeline::new(Config::default(), Arc::new(MockTransport::new())).unwrap();
    let outcomes = pipeline
        .download_subtitles(&master, None, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcomes.len(), 1);
    assert!(matches!(
        outcomes[0].as_failure().map(|f| &f.cause),
        Some(StreamError::MediaPlaylistLoad { .. })
    ));
}

/// Test special type tagging
#[tokio::test]
async fn test_downloadSubtitles_shouldTagForcedAndClosedCaptions() {
    let transport = serve_stream(MockTransport::new(), "en", &english_segments());
    let transport = serve_stream(transport, "en-forced", &french_segments());
    let transport = serve_stream(transport, "en-sdh", &french_segments());

    let master = master_playlist(vec![
        subtitles_entry("en", "en", "English"),
        subtitles_entry("en-forced", "en", "English (Forced)").with_forced(true),
        subtitles_entry("en-sdh", "en", "English SDH")
            .with_characteristics("public.accessibility.transcribes-spoken-dialog"),
    ]);

    let pipeline = SubtitlesPipeline::new(Config::default(), Arc::new(transport)).unwrap();
    let outcomes = pipeline
        .download_subtitles(&master, None, &CancellationToken::new())
        .await
        .unwrap();

    let types: Vec<SubtitlesType> = outcomes.iter().map(SubtitlesOutcome::special_type).collect();
    assert_eq!(
        types,
        vec![SubtitlesType::Normal, SubtitlesType::Forced, SubtitlesType::ClosedCaptions]
    );
    assert!(outcomes.iter().all(SubtitlesOutcome::is_success));
}

/// Test the language override
#[tokio::test]
async fn test_downloadSubtitles_withLanguageOverride_shouldOnlyFetchRequestedLanguages() {
    let transport = serve_stream(MockTransport::new(), "en", &english_segments());
    let transport = serve_stream(transport, "fr", &french_segments());
    let master = master_playlist(vec![
        subtitles_entry("en", "en", "English"),
        subtitles_entry("fr", "fr", "Français"),
    ]);

    let pipeline = SubtitlesPipeline::new(Config::default(), Arc::new(transport.clone())).unwrap();
    let languages = vec!["fr".to_string()];
    let outcomes = pipeline
        .download_subtitles(&master, Some(&languages), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].language_code(), "fr");
    assert_eq!(transport.request_count(&segment_url("en", 0)), 0);
}

/// Test that streams finished before cancellation keep their results
#[tokio::test]
async fn test_downloadSubtitles_cancelledAfterFirstStream_shouldKeepCompletedResults() {
    let transport = serve_stream(MockTransport::new(), "en", &english_segments());
    let transport = serve_stream(transport, "fr", &french_segments());
    let master = master_playlist(vec![
        subtitles_entry("en", "en", "English"),
        subtitles_entry("fr", "fr", "Français"),
    ]);

    let mut config = Config::default();
    config.fetch.max_concurrent_streams = 1;
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    let pipeline = SubtitlesPipeline::new(config, Arc::new(transport))
        .unwrap()
        .with_observer(move |index, stage| {
            if index == 0 && stage == StreamStage::Done {
                trigger.cancel();
            }
        });

    let outcomes = pipeline.download_subtitles(&master, None, &cancel).await.unwrap();

    assert_eq!(outcomes.len(), 2);
    assert!(outcomes[0].is_success());
    let failure = outcomes[1].as_failure().unwrap();
    assert_eq!(failure.stage, StreamStage::Pending);
    assert!(matches!(failure.cause, StreamError::Cancelled));
}

/// Test that cancellation interrupts a stream waiting on the network
#[tokio::test]
async fn test_downloadSubtitles_cancelledDuringFetch_shouldStopWaiting() {
    let transport = serve_stream(MockTransport::new(), "en", &english_segments())
        .with_delay(&segment_url("en", 1), Duration::from_secs(30));
    let master = master_playlist(vec![subtitles_entry("en", "en", "English")]);
    let pipeline = SubtitlesPipeline::new(Config::default(), Arc::new(transport)).unwrap();

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let started = std::time::Instant::now();
    let outcomes = pipeline.download_subtitles(&master, None, &cancel).await.unwrap();

    assert!(started.elapsed() < Duration::from_secs(10));
    let failure = outcomes[0].as_failure().unwrap();
    assert_eq!(failure.stage, StreamStage::Fetching);
    assert!(matches!(failure.cause, StreamError::Cancelled));
}

/// Test streams processed concurrently still come back in playlist order
#[tokio::test]
async fn test_downloadSubtitles_withSlowFirstStream_shouldKeepPlaylistOrder() {
    let transport = serve_stream(MockTransport::new(), "en", &english_segments())
        .with_delay(&segment_url("en", 0), Duration::from_millis(60));
    let transport = serve_stream(transport, "fr", &french_segments());
    let transport = serve_stream(transport, "es", &french_segments());
    let master = master_playlist(vec![
        subtitles_entry("en", "en", "English"),
        subtitles_entry("fr", "fr", "Français"),
        subtitles_entry("es", "es", "Español"),
    ]);

    let pipeline = SubtitlesPipeline::new(Config::default(), Arc::new(transport)).unwrap();
    let outcomes = pipeline
        .download_subtitles(&master, None, &CancellationToken::new())
        .await
        .unwrap();

    let codes: Vec<&str> = outcomes.iter().map(SubtitlesOutcome::language_code).collect();
    assert_eq!(codes, vec!["en", "fr", "es"]);
}
