use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::default::Default;

use crate::playlist::{AllowedValue, FilterRules};
use crate::processing::merger::BOUNDARY_TOLERANCE_MS;
use crate::subtitle_formats::{SubtitleFormat, TextEncoding};

/// Attribute filters: HLS attribute name to allowed values
pub type FilterConfig = BTreeMap<String, Vec<AllowedValue>>;

/// Application configuration module
/// This module holds the settings the pipeline runs with: which renditions
/// to pick, how to polish and convert them, and how to fetch them.
/// Represents the pipeline configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Attribute filters, HLS attribute name to allowed values
    #[serde(default = "default_filters")]
    pub filters: FilterConfig,

    /// Subtitle processing settings
    #[serde(default)]
    pub subtitles: SubtitlesConfig,

    /// Network settings
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Subtitle processing settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SubtitlesConfig {
    /// Format to convert merged tracks to; `None` keeps WebVTT
    #[serde(default = "default_convert_to")]
    pub convert_to: Option<SubtitleFormat>,

    /// Encoding for formats that do not mandate one; `None` keeps the source encoding
    #[serde(default)]
    pub output_encoding: Option<TextEncoding>,

    /// Wrap right-to-left lines in directional embedding marks
    #[serde(default)]
    pub fix_rtl: bool,

    /// Languages RTL fixing applies to; empty means every stream
    #[serde(default = "default_rtl_languages")]
    pub rtl_languages: Vec<String>,

    /// Remove cues that exactly repeat an earlier cue
    #[serde(default = "default_true")]
    pub remove_duplicates: bool,

    /// Timing tolerance for boundary duplicate detection, in milliseconds
    #[serde(default = "default_boundary_tolerance_ms")]
    pub boundary_tolerance_ms: u64,
}

impl Default for SubtitlesConfig {
    fn default() -> Self {
        Self {
            convert_to: default_convert_to(),
            output_encoding: None,
            fix_rtl: false,
            rtl_languages: default_rtl_languages(),
            remove_duplicates: true,
            boundary_tolerance_ms: default_boundary_tolerance_ms(),
        }
    }
}

/// Network and concurrency settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct FetchConfig {
    /// Streams processed at the same time
    #[serde(default = "default_concurrent_streams")]
    pub max_concurrent_streams: usize,

    /// Segment requests in flight per stream
    #[serde(default = "default_concurrent_segments")]
    pub max_concurrent_segments: usize,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Retry count for failed requests
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Backoff base for retries (in milliseconds), doubled on each retry
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_concurrent_streams: default_concurrent_streams(),
            max_concurrent_segments: default_concurrent_segments(),
            timeout_secs: default_timeout_secs(),
            retry_count: default_retry_count(),
            retry_backoff_ms: default_retry_backoff_ms(),
            user_agent: default_user_agent(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Matching `log` level filter
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_filters() -> FilterConfig {
    let mut filters = BTreeMap::new();
    filters.insert("TYPE".to_string(), vec![AllowedValue::exact("SUBTITLES")]);
    filters
}

fn default_convert_to() -> Option<SubtitleFormat> {
    Some(SubtitleFormat::SubRip)
}

fn default_rtl_languages() -> Vec<String> {
    ["ar", "fa", "he", "ur", "yi", "ps", "syr", "dv"]
        .iter()
        .map(|code| code.to_string())
        .collect()
}

fn default_true() -> bool {
    true
}

fn default_boundary_tolerance_ms() -> u64 {
    BOUNDARY_TOLERANCE_MS
}

fn default_concurrent_streams() -> usize {
    4
}

fn default_concurrent_segments() -> usize {
    8
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_retry_count() -> u32 {
    3 // Default to 3 retries
}

fn default_retry_backoff_ms() -> u64 {
    1000 // 1 second base backoff time, doubled on each retry
}

fn default_user_agent() -> String {
    format!("segsubs/{}", env!("CARGO_PKG_VERSION"))
}

impl Config {
    /// Parse a configuration from JSON text, filling unset fields with defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json).context("Failed to parse configuration JSON")?;
        Ok(config)
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if self.fetch.max_concurrent_streams == 0 {
            return Err(anyhow!("max_concurrent_streams must be at least 1"));
        }
        if self.fetch.max_concurrent_segments == 0 {
            return Err(anyhow!("max_concurrent_segments must be at least 1"));
        }

        for code in &self.subtitles.rtl_languages {
            crate::language_utils::validate_language_code(code)
                .with_context(|| format!("Invalid RTL language in configuration: {}", code))?;
        }

        self.filter_rules()
            .map_err(|e| anyhow!("{}", e))?;

        Ok(())
    }

    /// Compile the configured filters
    pub fn filter_rules(&self) -> Result<FilterRules, crate::errors::AppError> {
        FilterRules::from_config(&self.filters)
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            filters: default_filters(),
            subtitles: SubtitlesConfig::default(),
            fetch: FetchConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
