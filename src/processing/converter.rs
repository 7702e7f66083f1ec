/*!
 * Format conversion for merged tracks.
 *
 * Cue count, order, timing and text survive a conversion; only the markup
 * changes. WebVTT styling that SubRip players understand (`<i>`, `<b>`,
 * `<u>`, top/side placement as an `{\anN}` tag) is carried over and the
 * rest is dropped. The reverse direction maps those back.
 */

use bytes::Bytes;
use log::debug;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::errors::{ConversionError, SubtitleError};
use crate::subtitle_formats::{Cue, CueDocument, CueSetting, SubtitleFormat, TextEncoding};

/// Any WebVTT cue tag, including inline timestamps (`<00:01.000>`)
static WEBVTT_TAG_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<(/?)([^\s./>]+)[^>]*>").unwrap()
});

/// Positional tag regex ({\an8} etc.)
static POSITION_TAG_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\\an([1-9])\}").unwrap()
});

/// Any other ASS override block
static OVERRIDE_BLOCK_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\\[^}]*\}").unwrap()
});

/// SRT font tags
static FONT_TAG_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)</?font[^>]*>").unwrap()
});

/// Formatting tags both formats share
static STYLE_TAG_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)</?[ibu]>").unwrap()
});

/// A rendered track ready to be stored
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertedSubtitles {
    /// Format of `content`
    pub format: SubtitleFormat,
    /// Encoded document
    pub content: Bytes,
    /// Encoding actually used for `content`
    pub encoding: TextEncoding,
}

impl ConvertedSubtitles {
    /// Decoded content
    pub fn text(&self) -> Result<String, SubtitleError> {
        TextEncoding::decode(&self.content).map(|(text, _)| text)
    }
}

/// Convert a document to `target`, re-rendering it through the target's codec
///
/// # Arguments
/// * `document` - Source track
/// * `target` - Format to render
/// * `output_encoding` - Preferred encoding when the target does not mandate one; `None` keeps the source encoding
pub fn convert(
    document: &CueDocument,
    target: SubtitleFormat,
    output_encoding: Option<TextEncoding>,
) -> Result<ConvertedSubtitles, ConversionError> {
    let converted = match (document.format, target) {
        (source, target) if source == target => document.clone(),
        (SubtitleFormat::WebVtt, SubtitleFormat::SubRip) => webvtt_to_subrip(document)?,
        (SubtitleFormat::SubRip, SubtitleFormat::WebVtt) => subrip_to_webvtt(document)?,
        (source, target) => {
            return Err(ConversionError::RenderFailed {
                format: target,
                reason: format!("no conversion from {}", source),
            });
        }
    };

    let text = target.codec().render(&converted)?;
    let encoding = target
        .mandated_encoding()
        .or(output_encoding)
        .unwrap_or(document.encoding);

    debug!(
        "Converted {} track from {} to {} ({} cues, {})",
        document.language_code,
        document.format,
        target,
        converted.cues.len(),
        encoding
    );

    Ok(ConvertedSubtitles {
        format: target,
        content: encoding.encode(&text),
        encoding,
    })
}

fn webvtt_to_subrip(document: &CueDocument) -> Result<CueDocument, ConversionError> {
    let cues = document
        .cues
        .iter()
        .enumerate()
        .map(|(index, cue)| -> Result<Cue, ConversionError> {
            let lines = cue.lines.iter().map(|line| webvtt_line_to_subrip(line));
            let mut lines = non_blank_lines(lines, index, SubtitleFormat::SubRip)?;
            if let Some(tag) = alignment_tag(cue) {
                lines[0].insert_str(0, &tag);
            }
            Ok(Cue::new(cue.start_ms, cue.end_ms, lines))
        })
        .collect::<Result<Vec<_>, ConversionError>>()?;

    let mut converted = CueDocument::with_cues(SubtitleFormat::SubRip, &document.language_code, cues);
    converted.encoding = document.encoding;
    Ok(converted)
}

fn subrip_to_webvtt(document: &CueDocument) -> Result<CueDocument, ConversionError> {
    let cues = document
        .cues
        .iter()
        .enumerate()
        .map(|(index, cue)| -> Result<Cue, ConversionError> {
            let mut position = None;
            let lines = cue.lines.iter().map(|line| {
                if let Some(captures) = POSITION_TAG_REGEX.captures(line) {
                    position = position.or_else(|| captures[1].parse::<u8>().ok());
                }
                subrip_line_to_webvtt(line)
            });
            let lines = non_blank_lines(lines, index, SubtitleFormat::WebVtt)?;

            let mut converted = Cue::new(cue.start_ms, cue.end_ms, lines);
            converted.settings = position.map(position_settings).unwrap_or_default();
            Ok(converted)
        })
        .collect::<Result<Vec<_>, ConversionError>>()?;

    Ok(CueDocument::with_cues(SubtitleFormat::WebVtt, &document.language_code, cues))
}

/// Drop lines left blank by markup removal
///
/// A blank line would end the cue early in either format, so a cue with no
/// text left cannot be rendered.
fn non_blank_lines(
    lines: impl Iterator<Item = String>,
    cue_index: usize,
    target: SubtitleFormat,
) -> Result<Vec<String>, ConversionError> {
    let lines: Vec<String> = lines.filter(|line| !line.trim().is_empty()).collect();
    if lines.is_empty() {
        return Err(ConversionError::RenderFailed {
            format: target,
            reason: format!("cue {} has no text left after markup conversion", cue_index + 1),
        });
    }
    Ok(lines)
}

/// Rewrite one WebVTT payload line in SubRip markup
pub fn webvtt_line_to_subrip(line: &str) -> String {
    let stripped = WEBVTT_TAG_REGEX.replace_all(line, |caps: &Captures| {
        let name = caps[2].to_ascii_lowercase();
        match name.as_str() {
            "i" | "b" | "u" => format!("<{}{}>", &caps[1], name),
            _ => String::new(),
        }
    });

    unescape_entities(&stripped)
}

/// Rewrite one SubRip line in WebVTT markup
pub fn subrip_line_to_webvtt(line: &str) -> String {
    let line = POSITION_TAG_REGEX.replace_all(line, "");
    let line = OVERRIDE_BLOCK_REGEX.replace_all(&line, "");
    let line = FONT_TAG_REGEX.replace_all(&line, "");

    let mut output = String::with_capacity(line.len());
    let mut last = 0;
    for tag in STYLE_TAG_REGEX.find_iter(&line) {
        output.push_str(&escape_entities(&line[last..tag.start()]));
        output.push_str(&tag.as_str().to_ascii_lowercase());
        last = tag.end();
    }
    output.push_str(&escape_entities(&line[last..]));
    output
}

fn unescape_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", "\u{00A0}")
        .replace("&lrm;", "\u{200E}")
        .replace("&rlm;", "\u{200F}")
        .replace("&amp;", "&")
}

fn escape_entities(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

/// `{\anN}` tag for a cue placed at the top or aligned to a side, numpad layout
fn alignment_tag(cue: &Cue) -> Option<String> {
    let top = cue.setting("line").is_some_and(is_top_line);
    let column = match cue.setting("align") {
        Some("start") | Some("left") => 1,
        Some("end") | Some("right") => 3,
        _ => 2,
    };

    if !top && column == 2 {
        return None;
    }

    let row_base = if top { 6 } else { 0 };
    Some(format!("{{\\an{}}}", row_base + column))
}

/// Whether a WebVTT `line` value places the cue in the top half
fn is_top_line(value: &str) -> bool {
    let position = value.split(',').next().unwrap_or_default().trim();

    match position.strip_suffix('%') {
        Some(percent) => percent.parse::<f64>().is_ok_and(|p| p < 50.0),
        None => position.parse::<i64>().is_ok_and(|line| line >= 0),
    }
}

/// WebVTT settings equivalent to a numpad `{\anN}` position
fn position_settings(an: u8) -> Vec<CueSetting> {
    let mut settings = Vec::new();

    match (an - 1) / 3 {
        2 => settings.push(CueSetting::new("line", "0")),
        1 => settings.push(CueSetting::new("line", "50%")),
        _ => {}
    }
    match (an - 1) % 3 {
        0 => settings.push(CueSetting::new("align", "start")),
        2 => settings.push(CueSetting::new("align", "end")),
        _ => {}
    }

    settings
}
