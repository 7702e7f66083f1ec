use log::debug;
use std::collections::HashSet;

use crate::subtitle_formats::CueDocument;

// @module: Post-merge track clean-up

// @const: RIGHT-TO-LEFT EMBEDDING
pub const RTL_EMBEDDING: char = '\u{202B}';

// @const: POP DIRECTIONAL FORMATTING
pub const POP_DIRECTIONAL_FORMATTING: char = '\u{202C}';

/// Which polishing steps to run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PolishOptions {
    /// Wrap right-to-left lines in directional embedding marks
    pub fix_rtl: bool,
    /// Drop cues repeating an earlier cue exactly
    pub remove_duplicates: bool,
}

/// Polish a merged track in place
pub fn polish(document: &mut CueDocument, options: PolishOptions) {
    if options.remove_duplicates {
        let removed = remove_duplicates(document);
        if removed > 0 {
            debug!("Removed {} duplicate cues from {} track", removed, document.language_code);
        }
    }

    if options.fix_rtl {
        let fixed = fix_rtl(document);
        debug!("Wrapped {} right-to-left lines in {} track", fixed, document.language_code);
    }
}

/// Drop every cue whose timing and lines exactly repeat an earlier cue
///
/// Returns the number of cues removed.
pub fn remove_duplicates(document: &mut CueDocument) -> usize {
    let before = document.cues.len();
    let mut seen = HashSet::with_capacity(before);

    document
        .cues
        .retain(|cue| seen.insert((cue.start_ms, cue.end_ms, cue.lines.clone())));

    before - document.cues.len()
}

/// Wrap every right-to-left line in RLE/PDF marks
///
/// Returns the number of lines changed. Lines already wrapped are skipped.
pub fn fix_rtl(document: &mut CueDocument) -> usize {
    let mut fixed = 0;

    for line in document.cues.iter_mut().flat_map(|cue| cue.lines.iter_mut()) {
        if line.starts_with(RTL_EMBEDDING) || !is_rtl_line(line) {
            continue;
        }
        *line = format!("{}{}{}", RTL_EMBEDDING, line, POP_DIRECTIONAL_FORMATTING);
        fixed += 1;
    }

    fixed
}

/// Whether strong right-to-left characters outnumber other letters on a line
pub fn is_rtl_line(line: &str) -> bool {
    let mut rtl = 0usize;
    let mut ltr = 0usize;

    for c in line.chars() {
        if is_rtl_char(c) {
            rtl += 1;
        } else if c.is_alphabetic() {
            ltr += 1;
        }
    }

    rtl > 0 && rtl > ltr
}

fn is_rtl_char(c: char) -> bool {
    matches!(c,
        '\u{0590}'..='\u{05FF}' // Hebrew
        | '\u{0600}'..='\u{06FF}' // Arabic
        | '\u{0700}'..='\u{074F}' // Syriac
        | '\u{0750}'..='\u{077F}' // Arabic Supplement
        | '\u{0780}'..='\u{07BF}' // Thaana
        | '\u{07C0}'..='\u{07FF}' // NKo
        | '\u{08A0}'..='\u{08FF}' // Arabic Extended-A
        | '\u{FB1D}'..='\u{FB4F}' // Hebrew presentation forms
        | '\u{FB50}'..='\u{FDFF}' // Arabic presentation forms A
        | '\u{FE70}'..='\u{FEFF}' // Arabic presentation forms B
    ) && c.is_alphabetic()
}
