//! Character classification: splitting lines into atomic character units
//! and sorting every unit into the word-forming or word-breaking list.

use crate::models::Analysis;
use unicode_normalization::char::is_combining_mark;

/// Zero-width joiner; kept attached to its neighboring unit.
pub const ZWJ: char = '\u{200d}';
/// Word joiner; only present to anchor ZWJs, always filtered out.
pub const WJ: char = '\u{2060}';
/// Zero-width space; used to mark affixes in display text, never data.
pub const ZWSP: char = '\u{200b}';

/// True for code points in the combining diacritical marks block.
pub fn is_combining_diacritic(c: char) -> bool {
    ('\u{300}'..='\u{36f}').contains(&c)
}

/// The base character of an atomic unit (skipping a leading ZWJ).
pub fn base_char(unit: &str) -> Option<char> {
    unit.chars().find(|&c| c != ZWJ)
}

/// True if a unit counts as word-forming: its base character's general
/// category is Letter or Mark.
pub fn is_word_forming(unit: &str) -> bool {
    match base_char(unit) {
        Some(c) => c.is_alphabetic() || is_combining_mark(c),
        None => false,
    }
}

/// Split a decomposed line into atomic character units.
///
/// A unit is a base character together with an attached leading/trailing
/// ZWJ and, unless `separate_diacritics` is set, any immediately following
/// combining diacritical marks. Word joiners are dropped entirely.
pub fn atomic_units(line: &str, separate_diacritics: bool) -> Vec<String> {
    let chars: Vec<char> = line.chars().collect();
    let mut units = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        if chars[i] == WJ {
            i += 1;
            continue;
        }

        let mut unit = String::new();
        if chars[i] == ZWJ && i + 1 < chars.len() && chars[i + 1] != WJ {
            unit.push(ZWJ);
            i += 1;
        }
        unit.push(chars[i]);
        i += 1;

        if !separate_diacritics {
            while i < chars.len() && is_combining_diacritic(chars[i]) {
                unit.push(chars[i]);
                i += 1;
            }
        }
        if i < chars.len() && chars[i] == ZWJ {
            unit.push(ZWJ);
            i += 1;
        }
        units.push(unit);
    }
    units
}

/// Record every character unit in the given lines, classifying each newly
/// seen unit as word-forming or word-breaking.
pub fn find_chars(analysis: &mut Analysis, lines: &[String]) {
    let separate = analysis.separate_diacritics;
    for line in lines {
        for mut unit in atomic_units(line, separate) {
            // a diacritic stacked on a non-letter base (say '-' or ']')
            // would poison the word-break set; treat it as plain space
            if unit.chars().last().is_some_and(is_combining_diacritic) && !is_word_forming(&unit) {
                unit = " ".to_string();
            }
            if analysis.chars.insert(unit.clone()) {
                if is_word_forming(&unit) {
                    analysis.word_form_chars.push(unit);
                } else {
                    // punctuation, symbols, digits, control codes
                    analysis.word_break_chars.push(unit);
                }
            }
        }
    }
}

/// Change the diacritic-separation mode and rebuild the character lists
/// accordingly. The teaching order is flagged for recomputation.
pub fn set_separate_diacritics(analysis: &mut Analysis, separate: bool) {
    if analysis.separate_diacritics == separate {
        return;
    }
    analysis.separate_diacritics = separate;
    analysis.data_changed = true;
    analysis.order_dirty = true;
    reclassify_all(analysis);
}

/// Discard and fully rebuild both character lists from all loaded texts,
/// e.g. after the diacritic mode changed. There is no incremental mode.
pub fn reclassify_all(analysis: &mut Analysis) {
    analysis.reset_alphabet();
    let file_lines = std::mem::take(&mut analysis.file_lines);
    for lines in &file_lines {
        find_chars(analysis, lines);
    }
    analysis.file_lines = file_lines;
}
