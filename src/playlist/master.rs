/*!
 * Parsed master playlist model.
 *
 * The master playlist itself is fetched and parsed by the caller; this module
 * only holds the media renditions (`#EXT-X-MEDIA` entries) the pipeline
 * selects from.
 */

use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

use crate::errors::AppError;

const CHARACTERISTIC_TRANSCRIBES_DIALOG: &str = "public.accessibility.transcribes-spoken-dialog";
const CHARACTERISTIC_DESCRIBES_SOUND: &str = "public.accessibility.describes-music-and-sound";

/// Media type of a rendition (`TYPE` attribute)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MediaType {
    Subtitles,
    ClosedCaptions,
    Audio,
    Video,
    Other(String),
}

impl MediaType {
    /// Attribute value as written in the playlist
    pub fn as_attribute(&self) -> &str {
        match self {
            Self::Subtitles => "SUBTITLES",
            Self::ClosedCaptions => "CLOSED-CAPTIONS",
            Self::Audio => "AUDIO",
            Self::Video => "VIDEO",
            Self::Other(value) => value,
        }
    }
}

impl From<&m3u8_rs::AlternativeMediaType> for MediaType {
    fn from(media_type: &m3u8_rs::AlternativeMediaType) -> Self {
        match media_type {
            m3u8_rs::AlternativeMediaType::Subtitles => Self::Subtitles,
            m3u8_rs::AlternativeMediaType::ClosedCaptions => Self::ClosedCaptions,
            m3u8_rs::AlternativeMediaType::Audio => Self::Audio,
            m3u8_rs::AlternativeMediaType::Video => Self::Video,
            m3u8_rs::AlternativeMediaType::Other(value) => Self::Other(value.clone()),
        }
    }
}

/// Special classification of a subtitles stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubtitlesType {
    /// Regular subtitles
    #[default]
    Normal,
    /// Forced subtitles (foreign dialogue, signs)
    Forced,
    /// Closed captions / SDH
    #[serde(rename = "cc")]
    ClosedCaptions,
}

impl fmt::Display for SubtitlesType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => write!(f, "normal"),
            Self::Forced => write!(f, "forced"),
            Self::ClosedCaptions => write!(f, "cc"),
        }
    }
}

/// One media rendition of a master playlist
#[derive(Debug, Clone, PartialEq)]
pub struct PlaylistEntry {
    pub media_type: MediaType,
    pub group_id: String,
    pub language: Option<String>,
    pub assoc_language: Option<String>,
    pub name: String,
    /// Absolute URI of the media playlist, if the rendition has one
    pub uri: Option<String>,
    pub characteristics: Option<String>,
    pub forced: bool,
    pub default: bool,
    pub autoselect: bool,
}

impl PlaylistEntry {
    /// Subtitles rendition with the given group, language and media playlist URI
    pub fn subtitles(group_id: &str, language: &str, name: &str, uri: &str) -> Self {
        Self {
            media_type: MediaType::Subtitles,
            group_id: group_id.to_string(),
            language: Some(language.to_string()),
            assoc_language: None,
            name: name.to_string(),
            uri: Some(uri.to_string()),
            characteristics: None,
            forced: false,
            default: false,
            autoselect: false,
        }
    }

    pub fn with_forced(mut self, forced: bool) -> Self {
        self.forced = forced;
        self
    }

    pub fn with_characteristics(mut self, characteristics: &str) -> Self {
        self.characteristics = Some(characteristics.to_string());
        self
    }

    /// Value of an attribute by its HLS name, case-insensitive
    pub fn attribute(&self, name: &str) -> Option<String> {
        let flag = |value: bool| if value { "YES" } else { "NO" }.to_string();

        match name.to_ascii_uppercase().as_str() {
            "TYPE" => Some(self.media_type.as_attribute().to_string()),
            "GROUP-ID" => Some(self.group_id.clone()),
            "LANGUAGE" => self.language.clone(),
            "ASSOC-LANGUAGE" => self.assoc_language.clone(),
            "NAME" => Some(self.name.clone()),
            "URI" => self.uri.clone(),
            "CHARACTERISTICS" => self.characteristics.clone(),
            "FORCED" => Some(flag(self.forced)),
            "DEFAULT" => Some(flag(self.default)),
            "AUTOSELECT" => Some(flag(self.autoselect)),
            _ => None,
        }
    }

    /// Forced, closed captions, or normal
    pub fn subtitles_type(&self) -> SubtitlesType {
        if self.forced {
            return SubtitlesType::Forced;
        }

        let is_captions = self.media_type == MediaType::ClosedCaptions
            || self.characteristics.as_deref().is_some_and(|value| {
                value.split(',').map(str::trim).any(|c| {
                    c == CHARACTERISTIC_TRANSCRIBES_DIALOG || c == CHARACTERISTIC_DESCRIBES_SOUND
                })
            });

        if is_captions {
            SubtitlesType::ClosedCaptions
        } else {
            SubtitlesType::Normal
        }
    }
}

/// Media renditions of a master playlist, in playlist order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MasterPlaylist {
    /// URL the master playlist was loaded from, if known
    pub url: Option<String>,
    pub entries: Vec<PlaylistEntry>,
}

impl MasterPlaylist {
    pub fn new(entries: Vec<PlaylistEntry>) -> Self {
        Self { url: None, entries }
    }

    /// Build from an `m3u8-rs` master playlist, resolving relative URIs against `url`
    pub fn from_m3u8(playlist: &m3u8_rs::MasterPlaylist, url: &str) -> Result<Self, AppError> {
        let base = Url::parse(url)
            .map_err(|e| AppError::Config(format!("Invalid master playlist URL '{}': {}", url, e)))?;

        let entries = playlist
            .alternatives
            .iter()
            .map(|media| {
                let uri = match &media.uri {
                    Some(uri) => Some(
                        base.join(uri)
                            .map_err(|e| {
                                AppError::Config(format!("Invalid rendition URI '{}': {}", uri, e))
                            })?
                            .to_string(),
                    ),
                    None => None,
                };

                Ok(PlaylistEntry {
                    media_type: MediaType::from(&media.media_type),
                    group_id: media.group_id.clone(),
                    language: media.language.clone(),
                    assoc_language: media.assoc_language.clone(),
                    name: media.name.clone(),
                    uri,
                    characteristics: media.characteristics.clone(),
                    forced: media.forced,
                    default: media.default,
                    autoselect: media.autoselect,
                })
            })
            .collect::<Result<Vec<_>, AppError>>()?;

        debug!("Master playlist {} has {} media renditions", url, entries.len());

        Ok(Self {
            url: Some(url.to_string()),
            entries,
        })
    }

    /// Parse master playlist text, for callers that hold the raw manifest
    pub fn parse(content: &[u8], url: &str) -> Result<Self, AppError> {
        let playlist = m3u8_rs::parse_master_playlist_res(content)
            .map_err(|_| AppError::Config(format!("'{}' is not a valid master playlist", url)))?;
        Self::from_m3u8(&playlist, url)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
