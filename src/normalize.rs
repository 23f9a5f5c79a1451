//! Unicode normalization of input text and encoding-consistency tracking.
//!
//! All downstream processing operates on fully-decomposed (NFD) text; this
//! module converts incoming lines and keeps track of what the corpus
//! originally contained, so outputs can be recomposed when appropriate.

use crate::models::Analysis;
use std::fmt;
use unicode_normalization::{is_nfc, is_nfd, UnicodeNormalization};

/// Advisory condition: the corpus mixes composed and decomposed input.
///
/// Raised at most once per corpus. The engine proceeds (all processing is
/// NFD); the caller is expected to surface the warning to the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodingWarning;

impl fmt::Display for EncodingWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "input data has inconsistent encoding, with some characters \
             composed and some decomposed; all output will be decomposed"
        )
    }
}

/// Remove a leading byte-order mark, if present.
pub fn strip_bom(line: &str) -> &str {
    line.strip_prefix('\u{feff}').unwrap_or(line)
}

/// Normalize a line to fully-decomposed form.
pub fn to_nfd(line: &str) -> String {
    line.nfd().collect()
}

/// Normalize a line to fully-composed form.
pub fn to_nfc(line: &str) -> String {
    line.nfc().collect()
}

/// Scan one file's lines for composed/decomposed characters, updating the
/// corpus-wide flags. Returns the warning the first time both kinds have
/// been observed; later files never repeat it.
pub fn check_encoding(analysis: &mut Analysis, lines: &[String]) -> Option<EncodingWarning> {
    if analysis.encoding_warned {
        // the operator already knows
        return None;
    }

    for line in lines {
        if !analysis.contains_nfc && !is_nfd(line) {
            analysis.contains_nfc = true;
        }
        if !analysis.contains_nfd && !is_nfc(line) {
            analysis.contains_nfd = true;
        }
        if analysis.contains_nfc && analysis.contains_nfd {
            break;
        }
    }

    if analysis.contains_nfc && analysis.contains_nfd {
        analysis.encoding_warned = true;
        return Some(EncodingWarning);
    }
    None
}

/// Prepare engine-produced report text for writing out.
///
/// If the corpus contained only composed input, the report is recomposed to
/// NFC to match the source files. Mixed input stays decomposed, and the
/// returned flag reminds the caller to warn that the output differs from
/// the sources.
pub fn prepare_output(analysis: &Analysis, text: &str) -> (String, bool) {
    if analysis.contains_nfc {
        if analysis.contains_nfd {
            (text.to_string(), true)
        } else {
            (to_nfc(text), false)
        }
    } else {
        (text.to_string(), false)
    }
}
