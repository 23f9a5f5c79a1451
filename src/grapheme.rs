//! Grapheme segmentation: tokenizing words and morphemes into the units
//! taught in a primer, honoring configured digraphs/multigraphs.

use crate::classify::{is_combining_diacritic, WJ, ZWJ, ZWSP};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum DigraphError {
    #[error("digraph '{0}' is too short; each entry needs at least two characters")]
    TooShort(String),
    #[error("digraph '{0}' appears more than once in the list")]
    Duplicate(String),
}

/// Validate a digraph/multigraph list: entries of two or more characters,
/// no duplicates.
pub fn validate_digraphs(entries: &[String]) -> Result<(), DigraphError> {
    let mut seen = std::collections::HashSet::new();
    for entry in entries {
        if entry.chars().count() < 2 {
            return Err(DigraphError::TooShort(entry.clone()));
        }
        if !seen.insert(entry.as_str()) {
            return Err(DigraphError::Duplicate(entry.clone()));
        }
    }
    Ok(())
}

/// Splits words and morphemes into grapheme sequences.
///
/// Multigraphs are tried longest-first at every position so that shorter
/// overlapping sequences never pre-empt a longer match; a single base
/// character is the fallback. Results are memoized per distinct input
/// string; build a fresh segmenter whenever the digraph list or diacritic
/// mode changes.
#[derive(Debug, Clone)]
pub struct GraphemeSegmenter {
    multigraphs: Vec<String>,
    separate_diacritics: bool,
    memo: HashMap<String, Vec<String>>,
}

impl GraphemeSegmenter {
    pub fn new(digraphs: &[String], separate_diacritics: bool) -> Self {
        let mut multigraphs = digraphs.to_vec();
        // longest first, ties in configured order
        multigraphs.sort_by_key(|b| std::cmp::Reverse(b.chars().count()));
        GraphemeSegmenter {
            multigraphs,
            separate_diacritics,
            memo: HashMap::new(),
        }
    }

    /// Tokenize into graphemes, memoized.
    pub fn segment(&mut self, text: &str) -> Vec<String> {
        if let Some(cached) = self.memo.get(text) {
            return cached.clone();
        }
        let graphemes = self.split(text);
        self.memo.insert(text.to_string(), graphemes.clone());
        graphemes
    }

    fn split(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        let mut graphemes = Vec::new();
        let mut i = 0;

        while i < chars.len() {
            let c = chars[i];
            if c == WJ || c == ZWSP {
                i += 1;
                continue;
            }

            let mut unit = String::new();
            if c == ZWJ && i + 1 < chars.len() {
                unit.push(ZWJ);
                i += 1;
            }

            // longest configured multigraph at this position, else one char
            match self.multigraphs.iter().find(|mg| starts_at(&chars[i..], mg)) {
                Some(mg) => {
                    unit.push_str(mg);
                    i += mg.chars().count();
                }
                None => {
                    unit.push(chars[i]);
                    i += 1;
                }
            }

            if !self.separate_diacritics {
                while i < chars.len() && is_combining_diacritic(chars[i]) {
                    unit.push(chars[i]);
                    i += 1;
                }
            }
            if i < chars.len() && chars[i] == ZWJ {
                unit.push(ZWJ);
                i += 1;
            }
            graphemes.push(unit);
        }
        graphemes
    }
}

/// True if the character sequence begins with the given string.
fn starts_at(chars: &[char], prefix: &str) -> bool {
    let mut it = chars.iter();
    prefix.chars().all(|p| it.next() == Some(&p))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segmenter(digraphs: &[&str]) -> GraphemeSegmenter {
        let digraphs: Vec<String> = digraphs.iter().map(|s| s.to_string()).collect();
        GraphemeSegmenter::new(&digraphs, false)
    }

    #[test]
    fn test_single_characters() {
        let mut seg = segmenter(&[]);
        assert_eq!(seg.segment("cat"), vec!["c", "a", "t"]);
    }

    #[test]
    fn test_digraph_longest_match_first() {
        // "ngg" must win over "ng" where both match
        let mut seg = segmenter(&["ng", "ngg"]);
        assert_eq!(seg.segment("nggo"), vec!["ngg", "o"]);
        assert_eq!(seg.segment("ngo"), vec!["ng", "o"]);
    }

    #[test]
    fn test_diacritics_attach_to_grapheme() {
        let mut seg = segmenter(&["ch"]);
        assert_eq!(seg.segment("ch\u{301}a"), vec!["ch\u{301}", "a"]);

        let digraphs = vec!["ch".to_string()];
        let mut sep = GraphemeSegmenter::new(&digraphs, true);
        assert_eq!(sep.segment("ch\u{301}a"), vec!["ch", "\u{301}", "a"]);
    }

    #[test]
    fn test_joiners() {
        let mut seg = segmenter(&[]);
        // ZWJ stays attached, word joiner disappears
        assert_eq!(seg.segment("a\u{200d}b"), vec!["a\u{200d}", "b"]);
        assert_eq!(seg.segment("a\u{2060}b"), vec!["a", "b"]);
        // zero-width space (affix marker in display text) is skipped
        assert_eq!(seg.segment("a\u{200b}b"), vec!["a", "b"]);
    }

    #[test]
    fn test_partition_reassembles_word() {
        let mut seg = segmenter(&["ng", "ch"]);
        for word in ["chang", "a\u{300}cha", "ngong"] {
            let joined: String = seg.segment(word).concat();
            assert_eq!(joined, word);
        }
    }

    #[test]
    fn test_memo_returns_same_result() {
        let mut seg = segmenter(&["ng"]);
        let first = seg.segment("ngona");
        let second = seg.segment("ngona");
        assert_eq!(first, second);
    }

    #[test]
    fn test_validate_digraphs() {
        let ok = vec!["ng".to_string(), "ch".to_string()];
        assert!(validate_digraphs(&ok).is_ok());

        let short = vec!["n".to_string()];
        assert_eq!(
            validate_digraphs(&short),
            Err(DigraphError::TooShort("n".to_string()))
        );

        let dup = vec!["ng".to_string(), "ng".to_string()];
        assert_eq!(
            validate_digraphs(&dup),
            Err(DigraphError::Duplicate("ng".to_string()))
        );
    }
}
