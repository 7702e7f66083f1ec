/*!
 * Tests for rendition filter rules
 */

use segsubs::playlist::{select, AllowedValue, FilterRules, MasterPlaylist, MediaType, PlaylistEntry};

fn master() -> MasterPlaylist {
    let mut audio = PlaylistEntry::subtitles("aud", "en", "English audio", "https://x/audio.m3u8");
    audio.media_type = MediaType::Audio;

    MasterPlaylist::new(vec![
        PlaylistEntry::subtitles("subs", "en", "English", "https://x/en.m3u8"),
        audio,
        PlaylistEntry::subtitles("subs", "fr", "Français", "https://x/fr.m3u8"),
        PlaylistEntry::subtitles("subs_cc", "de", "Deutsch", "https://x/de.m3u8"),
        PlaylistEntry::subtitles("subs", "es", "Español", "https://x/es.m3u8"),
    ])
}

fn languages(entries: &[&PlaylistEntry]) -> Vec<String> {
    entries
        .iter()
        .map(|entry| entry.language.clone().unwrap_or_default())
        .collect()
}

/// Test that only renditions satisfying every rule are selected, in playlist order
#[test]
fn test_select_withTypeAndLanguageRules_shouldKeepPlaylistOrder() {
    let master = master();
    let rules = FilterRules::new()
        .with_exact("TYPE", &["SUBTITLES"])
        .with_exact("LANGUAGE", &["fr", "en"]);

    let selected = select(&master, &rules);

    assert_eq!(languages(&selected), vec!["en", "fr"]);
}

/// Test that empty rules select every rendition
#[test]
fn test_select_withNoRules_shouldSelectEverything() {
    let master = master();
    assert_eq!(select(&master, &FilterRules::new()).len(), master.len());
}

/// Test that patterns must match the whole attribute value
#[test]
fn test_select_withPattern_shouldRequireFullMatch() {
    let master = master();
    let rules = FilterRules::new()
        .with_values("GROUP-ID", &[AllowedValue::pattern("subs")])
        .unwrap();

    let selected = select(&master, &rules);

    assert_eq!(languages(&selected), vec!["en", "fr", "es"]);

    let rules = FilterRules::new()
        .with_values("GROUP-ID", &[AllowedValue::pattern("subs.*")])
        .unwrap();
    assert_eq!(select(&master, &rules).len(), 4);
}

/// Test that a rendition lacking a constrained attribute is rejected
#[test]
fn test_select_withMissingAttribute_shouldReject() {
    let mut entry = PlaylistEntry::subtitles("subs", "en", "English", "https://x/en.m3u8");
    entry.language = None;
    let master = MasterPlaylist::new(vec![entry]);
    let rules = FilterRules::new().with_exact("LANGUAGE", &["en"]);

    assert!(select(&master, &rules).is_empty());
}

/// Test that merging never narrows a shared attribute
#[test]
fn test_merge_withSharedKey_shouldSelectSuperset() {
    let master = master();
    let base = FilterRules::new().with_exact("LANGUAGE", &["en"]);
    let other = FilterRules::new().with_exact("LANGUAGE", &["fr"]);

    let merged = base.merge(&other);

    let base_selection = languages(&select(&master, &base));
    let merged_selection = languages(&select(&master, &merged));
    assert!(base_selection.iter().all(|lang| merged_selection.contains(lang)));
    assert_eq!(merged_selection, vec!["en", "en", "fr"]);
    assert_eq!(merged.get("language").map(|set| set.len()), Some(2));
}

/// Test that a merged rule set selects everything either side selects
#[test]
fn test_merge_withDisjointKeys_shouldSelectUnionOfBothSides() {
    let master = master();
    let base = FilterRules::new().with_exact("TYPE", &["SUBTITLES"]);
    let other = FilterRules::new().with_exact("LANGUAGE", &["de"]);

    let merged = base.merge(&other);

    assert_eq!(languages(&select(&master, &base)), vec!["en", "fr", "de", "es"]);
    assert_eq!(languages(&select(&master, &merged)), vec!["en", "en", "fr", "de", "es"]);
}

/// Test that merging never excludes a rendition selected by either side
#[test]
fn test_merge_shouldNeverNarrowEitherSide() {
    let master = master();
    let rule_sets = vec![
        FilterRules::new(),
        FilterRules::new().with_exact("TYPE", &["SUBTITLES"]),
        FilterRules::new().with_exact("LANGUAGE", &["de"]),
        FilterRules::new()
            .with_exact("TYPE", &["AUDIO"])
            .with_exact("LANGUAGE", &["en"]),
        FilterRules::new()
            .with_values("GROUP-ID", &[AllowedValue::pattern("subs_.*")])
            .unwrap(),
    ];

    for left in &rule_sets {
        for right in &rule_sets {
            let merged = left.merge(right);
            let merged_selection: Vec<&str> = select(&master, &merged)
                .iter()
                .map(|entry| entry.uri.as_deref().unwrap_or_default())
                .collect();

            for side in [left, right] {
                for entry in select(&master, side) {
                    let uri = entry.uri.as_deref().unwrap_or_default();
                    assert!(merged_selection.contains(&uri), "merge dropped {}", uri);
                }
            }
        }
    }
}

/// Test the language override used by the pipeline
#[test]
fn test_withLanguageOverride_shouldUnionIntoLanguageRule() {
    let master = master();
    let rules = FilterRules::new()
        .with_exact("TYPE", &["SUBTITLES"])
        .with_exact("LANGUAGE", &["en"]);

    let overridden = rules.with_language_override(Some(&["es".to_string()]));
    assert_eq!(languages(&select(&master, &overridden)), vec!["en", "es"]);

    let unchanged = rules.with_language_override(None);
    assert_eq!(languages(&select(&master, &unchanged)), vec!["en"]);
}

/// Test that the override constrains the language when no rule did
#[test]
fn test_withLanguageOverride_withoutLanguageRule_shouldRestrictToLanguages() {
    let master = master();
    let rules = FilterRules::new().with_exact("TYPE", &["SUBTITLES"]);

    let overridden = rules.with_language_override(Some(&["de".to_string(), "fr".to_string()]));

    assert_eq!(languages(&select(&master, &overridden)), vec!["fr", "de"]);
}

/// Test that an invalid pattern is reported as a filter error
#[test]
fn test_withValues_withInvalidPattern_shouldFail() {
    let result = FilterRules::new().with_values("NAME", &[AllowedValue::pattern("[a-")]);
    assert!(matches!(result, Err(segsubs::AppError::InvalidFilter(_))));
}
