//! Word-in-context concordance and lesson-phrase discovery over the
//! loaded texts.

use crate::models::{Analysis, LessonUnit};
use std::collections::HashSet;

/// One occurrence of a word or phrase with its surrounding context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextMatch {
    pub before: String,
    pub matched: String,
    pub after: String,
}

/// Context window, in characters, kept on each side of a concordance match.
const CONTEXT_CHARS: usize = 40;
/// Context words kept on each side of a found phrase.
const CONTEXT_WORDS: usize = 3;

fn is_break(c: char, breaks: &HashSet<char>) -> bool {
    c.is_whitespace() || breaks.contains(&c)
}

/// Case-insensitive comparison of two characters.
fn chars_eq_fold(a: char, b: char) -> bool {
    a == b || a.to_lowercase().eq(b.to_lowercase())
}

/// Find every whole-word occurrence of `word` across the loaded texts.
///
/// Matching is literal and case-insensitive; a match must be bounded by
/// word-breaking characters (or the line edge) on both sides, so hits
/// inside longer words are skipped. Context is limited to 40 characters
/// each side and trimmed to whole words.
pub fn concordance(analysis: &Analysis, word: &str) -> Vec<ContextMatch> {
    let breaks = analysis.break_char_set();
    let target: Vec<char> = word.chars().collect();
    let mut matches = Vec::new();
    if target.is_empty() {
        return matches;
    }

    for lines in &analysis.file_lines {
        for line in lines {
            let chars: Vec<char> = line.chars().collect();
            let mut i = 0;
            while i + target.len() <= chars.len() {
                let hit = target
                    .iter()
                    .zip(&chars[i..])
                    .all(|(&t, &c)| chars_eq_fold(t, c));
                if !hit {
                    i += 1;
                    continue;
                }
                let end = i + target.len();
                let bounded_left = i == 0 || is_break(chars[i - 1], &breaks);
                let bounded_right = end == chars.len() || is_break(chars[end], &breaks);
                if !(bounded_left && bounded_right) {
                    i += 1;
                    continue;
                }

                let before = trim_context_before(&chars[..i], &breaks);
                let after = trim_context_after(&chars[end..], &breaks);
                matches.push(ContextMatch {
                    before: untabbed(&before),
                    matched: untabbed(&chars[i..end].iter().collect::<String>()),
                    after: untabbed(&after),
                });
                i = end;
            }
        }
    }
    matches
}

/// Last 40 characters of the pre-context, with any leading partial word
/// dropped (everything up to and including the first break run).
fn trim_context_before(pre: &[char], breaks: &HashSet<char>) -> String {
    let start = pre.len().saturating_sub(CONTEXT_CHARS);
    let window = &pre[start..];
    match window.iter().position(|&c| is_break(c, breaks)) {
        Some(first_break) => {
            let after_run = window[first_break..]
                .iter()
                .position(|&c| !is_break(c, breaks))
                .map(|off| first_break + off);
            match after_run {
                // nothing but breaks follow, so there is no partial word
                None => window.iter().collect(),
                Some(start) => window[start..].iter().collect(),
            }
        }
        None => window.iter().collect(),
    }
}

/// First 40 characters of the post-context, cut after the last break run
/// so a trailing partial word is dropped.
fn trim_context_after(post: &[char], breaks: &HashSet<char>) -> String {
    let window = &post[..post.len().min(CONTEXT_CHARS)];
    match window.iter().rposition(|&c| is_break(c, breaks)) {
        Some(last_break) => window[..=last_break].iter().collect(),
        None => window.iter().collect(),
    }
}

/// Tabs would throw off the tab-separated display columns.
fn untabbed(s: &str) -> String {
    s.replace('\t', " ")
}

/// Find phrases of two or more consecutive words that are all available at
/// the given teaching-order position (example words and sight words of
/// every unit up to and including it), with up to three words of context
/// on each side. Longest phrases come first; equal lengths keep discovery
/// order.
pub fn phrases(analysis: &Analysis, position: usize) -> Vec<ContextMatch> {
    assert!(
        position < analysis.teaching_order.len(),
        "phrases: teaching-order position {position} out of range"
    );

    let mut available: HashSet<String> = HashSet::new();
    for unit in &analysis.teaching_order[..=position] {
        match unit {
            LessonUnit::Grapheme(g) => {
                if let Some(words) = analysis.example_words.get(g) {
                    available.extend(words.iter().map(|w| w.to_lowercase()));
                }
            }
            LessonUnit::SightWords(id) => {
                available.extend(analysis.sight_lessons[*id].iter().map(|w| w.to_lowercase()));
            }
        }
    }

    let breaks = analysis.break_char_set();
    let mut found: Vec<(usize, ContextMatch)> = Vec::new();

    for lines in &analysis.file_lines {
        for line in lines {
            let tokens = split_keep_breaks(&untabbed(line), &breaks);
            // words sit at even indices, break runs at odd ones
            let mut i = 0;
            while i < tokens.len() {
                if !available.contains(&tokens[i].to_lowercase()) {
                    i += 2;
                    continue;
                }
                let mut j = i + 2;
                while j < tokens.len() && available.contains(&tokens[j].to_lowercase()) {
                    j += 2;
                }
                if j > i + 2 {
                    // at least two available words in a row
                    let start = i.saturating_sub(2 * CONTEXT_WORDS);
                    let finish = (j + 2 * CONTEXT_WORDS).min(tokens.len());
                    let phrase = tokens[i..j - 1].concat();
                    found.push((
                        phrase.chars().count(),
                        ContextMatch {
                            before: tokens[start..i].concat(),
                            matched: phrase,
                            after: tokens[j - 1..finish].concat(),
                        },
                    ));
                    // skip past the word that broke the run
                    i = j + 2;
                } else {
                    i += 2;
                }
            }
        }
    }

    found.sort_by_key(|(len, _)| std::cmp::Reverse(*len));
    found.into_iter().map(|(_, m)| m).collect()
}

/// Split a line into alternating word / break-run tokens, starting with a
/// (possibly empty) word at index 0.
fn split_keep_breaks(line: &str, breaks: &HashSet<char>) -> Vec<String> {
    let mut tokens = vec![String::new()];
    let mut in_break = false;
    for c in line.chars() {
        let breaking = is_break(c, breaks);
        if breaking != in_break {
            tokens.push(String::new());
            in_break = breaking;
        }
        if let Some(last) = tokens.last_mut() {
            last.push(c);
        }
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AnalysisParams;
    use crate::order;
    use crate::words;

    fn analyzed(lines: &[&str]) -> Analysis {
        let mut analysis = Analysis::new();
        let params = AnalysisParams::default();
        let lines: Vec<String> = lines.iter().map(|s| s.to_string()).collect();
        words::add_text(&mut analysis, "test.txt", lines, &params);
        order::calculate_teaching_order(&mut analysis, &params);
        analysis
    }

    #[test]
    fn test_concordance_whole_words_only() {
        let analysis = analyzed(&["concatenate cat", "a catalog"]);
        let matches = concordance(&analysis, "cat");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].matched, "cat");
        assert_eq!(matches[0].before, "concatenate ");
    }

    #[test]
    fn test_concordance_case_insensitive() {
        let analysis = analyzed(&["The cat. THE dog."]);
        let matches = concordance(&analysis, "the");
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].matched, "The");
        assert_eq!(matches[1].matched, "THE");
    }

    #[test]
    fn test_concordance_context_trimmed_to_whole_words() {
        let long = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa bb cat dd eeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee";
        let analysis = analyzed(&[long]);
        let matches = concordance(&analysis, "cat");
        assert_eq!(matches.len(), 1);
        // the 38-char word is cut by the 40-char window, so only the
        // whole word survives on each side
        assert_eq!(matches[0].before, "bb ");
        assert_eq!(matches[0].after, " dd ");
    }

    #[test]
    fn test_concordance_at_line_edges() {
        let analysis = analyzed(&["cat sat on cat"]);
        let matches = concordance(&analysis, "cat");
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].before, "");
        assert_eq!(matches[1].after, "");
    }

    #[test]
    fn test_phrases_finds_runs_of_available_words() {
        let mut analysis = analyzed(&["the cat sat on the mat", "a cat sat"]);
        // make every word available by selecting the last position
        let last = analysis.teaching_order.len() - 1;
        order::ensure_teaching_order(&mut analysis, &AnalysisParams::default());
        let found = phrases(&analysis, last);
        assert!(!found.is_empty());
        // the longest composable run comes first
        assert_eq!(found[0].matched, "the cat sat on the mat");
    }

    #[test]
    fn test_phrases_requires_two_words() {
        let analysis = analyzed(&["cat zzz cat"]);
        // pick the position of the unit teaching "cat"; "zzz" separates
        // the two occurrences so no 2-word run exists unless zzz is in
        let pos = analysis
            .teaching_order
            .iter()
            .position(|u| matches!(u, LessonUnit::Grapheme(g) if g == "c"))
            .expect("c taught");
        let found = phrases(&analysis, pos);
        // "cat zzz cat" has no two adjacent available words at c's lesson
        // unless zzz was claimed earlier in the order
        for m in &found {
            assert!(m.matched.split(' ').count() >= 2);
        }
    }

    #[test]
    fn test_phrases_includes_sight_words() {
        let mut analysis = analyzed(&["lo pi lo"]);
        let id = order::insert_sight_lesson(&mut analysis, 0, vec!["pi".to_string()])
            .expect("valid lesson");
        assert_eq!(id, 0);
        let order_now = analysis.teaching_order.clone();
        order::rebuild_example_words(&mut analysis, order_now);
        let last = analysis.teaching_order.len() - 1;
        let found = phrases(&analysis, last);
        assert!(found.iter().any(|m| m.matched == "lo pi lo"));
    }

    #[test]
    fn test_split_keep_breaks_alternates() {
        let breaks = HashSet::from([',']);
        let tokens = split_keep_breaks("ab, cd", &breaks);
        assert_eq!(tokens, vec!["ab", ", ", "cd"]);
        // leading break yields an empty word at index 0
        let tokens = split_keep_breaks(" ab", &breaks);
        assert_eq!(tokens, vec!["", " ", "ab"]);
    }
}
