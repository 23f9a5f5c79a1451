//! The teaching-order engine.
//!
//! Derives the order in which graphemes should be introduced in a primer,
//! using the elimination algorithm: repeatedly find the grapheme with the
//! least remaining morpheme-frequency support, schedule it last among the
//! remaining graphemes, claim the words that contain it as its example
//! words, and remove those words' frequency contributions before the next
//! round.

use crate::grapheme::GraphemeSegmenter;
use crate::models::{Analysis, AnalysisParams, CountMethod, LessonUnit};
use log::debug;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum SightWordError {
    #[error("a sight-word lesson needs at least one word")]
    Empty,
    #[error("sight word '{0}' appears more than once in the lesson")]
    Duplicate(String),
}

/// Validate a sight-word lesson: non-empty, all words distinct.
pub fn validate_sight_words(words: &[String]) -> Result<(), SightWordError> {
    if words.is_empty() {
        return Err(SightWordError::Empty);
    }
    let mut seen = std::collections::HashSet::new();
    for word in words {
        if !seen.insert(word.as_str()) {
            return Err(SightWordError::Duplicate(word.clone()));
        }
    }
    Ok(())
}

/// Bring the teaching order up to date with whatever changed since it was
/// last displayed: a full recompute if frequency inputs changed, a
/// reorder recompute if only the unit sequence was edited, and nothing at
/// all otherwise (so manual edits are never silently discarded).
pub fn ensure_teaching_order(analysis: &mut Analysis, params: &AnalysisParams) {
    if analysis.order_dirty {
        calculate_teaching_order(analysis, params);
    } else if analysis.examples_stale {
        let order = analysis.teaching_order.clone();
        rebuild_example_words(analysis, order);
    }
}

/// Full recompute: clear all derived state, rebuild the word/morpheme
/// grapheme decompositions and frequency tables, and run the elimination
/// algorithm. Sight-word lessons are discarded (their lesson texts with
/// them); grapheme lesson texts survive.
pub fn calculate_teaching_order(analysis: &mut Analysis, params: &AnalysisParams) {
    debug!(
        "full teaching-order recompute over {} words",
        analysis.words.len()
    );

    analysis.words_as_graphemes.clear();
    analysis.morphemes_as_graphemes.clear();
    analysis.analysis_words.clear();
    analysis.analysis_morphemes.clear();
    analysis.grapheme_use.clear();
    analysis.example_words.clear();
    analysis.teaching_order.clear();
    analysis.sight_lessons.clear();
    analysis
        .lesson_texts
        .retain(|(unit, _)| !unit.is_sight_words());

    analysis.order_dirty = false;
    analysis.examples_stale = false;

    if analysis.words.is_empty() {
        return;
    }

    build_frequency_tables(analysis, params);
    run_elimination(analysis, params);
}

/// Decompose every word and morpheme into graphemes and accumulate the
/// effective frequency tables, honoring the counting mode, the
/// exclude-affixes flag, and per-word exclusions (excluded entries stay
/// present with zero count).
fn build_frequency_tables(analysis: &mut Analysis, params: &AnalysisParams) {
    let mut segmenter =
        GraphemeSegmenter::new(&analysis.digraphs, analysis.separate_diacritics);

    for (word, rec) in &analysis.words {
        let count = match params.count_method {
            CountMethod::Tokens => rec.count,
            CountMethod::Types => 1,
        };

        analysis
            .words_as_graphemes
            .insert(word.clone(), segmenter.segment(word));
        analysis
            .analysis_words
            .insert(word.clone(), if rec.excluded { 0 } else { count });

        for morph in &rec.morphemes {
            let is_affix = morph.ends_with('-') || morph.starts_with('-');
            if params.exclude_affixes && is_affix {
                continue;
            }

            let entry = analysis
                .analysis_morphemes
                .entry(morph.clone())
                .or_insert(0);
            if !rec.excluded {
                *entry += count;
            }

            if !analysis.morphemes_as_graphemes.contains_key(morph) {
                let bare = if is_affix {
                    morph.replace('-', "")
                } else {
                    morph.clone()
                };
                analysis
                    .morphemes_as_graphemes
                    .insert(morph.clone(), segmenter.segment(&bare));
            }
            for g in &analysis.morphemes_as_graphemes[morph] {
                let entry = analysis.grapheme_use.entry(g.clone()).or_insert(0);
                if !rec.excluded {
                    *entry += count;
                }
            }
        }
    }
}

/// The elimination loop proper. Ties on minimum support break toward the
/// alphabetically first grapheme, so results are reproducible.
fn run_elimination(analysis: &mut Analysis, params: &AnalysisParams) {
    let mut remaining_graphemes = analysis.grapheme_use.clone();
    let mut remaining_words = analysis.analysis_words.clone();
    let mut remaining_morphemes = analysis.analysis_morphemes.clone();

    while !remaining_graphemes.is_empty() {
        // the grapheme with the least support from remaining morphemes
        // is introduced last among those left
        let mut selected: Option<(String, u32)> = None;
        for g in remaining_graphemes.keys() {
            let mut support = 0;
            for (morph, &count) in &remaining_morphemes {
                if analysis.morphemes_as_graphemes[morph].contains(g) {
                    support += match params.count_method {
                        CountMethod::Tokens => count,
                        CountMethod::Types => 1,
                    };
                }
            }
            let better = match &selected {
                Some((_, best)) => support < *best,
                None => true,
            };
            if better {
                selected = Some((g.clone(), support));
            }
        }
        let Some((grapheme, support)) = selected else {
            break;
        };
        debug!("eliminating '{}' with support {}", grapheme, support);

        if remaining_graphemes[&grapheme] > 0 {
            analysis
                .teaching_order
                .insert(0, LessonUnit::Grapheme(grapheme.clone()));
        }

        // claim every remaining word containing the grapheme, then drop
        // those words and their morphemes (collect first, apply after)
        let claimed: Vec<String> = remaining_words
            .keys()
            .filter(|w| analysis.words_as_graphemes[*w].contains(&grapheme))
            .cloned()
            .collect();
        for word in &claimed {
            remaining_words.remove(word);
            for morph in &analysis.words[word].morphemes {
                remaining_morphemes.remove(morph);
            }
        }
        analysis
            .example_words
            .insert(grapheme.clone(), sort_by_count(claimed, &analysis.analysis_words));

        remaining_graphemes.remove(&grapheme);
    }
}

/// Sort claimed words by descending corpus count (stable, so equal counts
/// stay in alphabetical order).
fn sort_by_count(mut words: Vec<String>, counts: &BTreeMap<String, u32>) -> Vec<String> {
    words.sort_by_key(|w| std::cmp::Reverse(counts.get(w).copied().unwrap_or(0)));
    words
}

/// Reorder recompute: adopt a caller-supplied unit sequence (after manual
/// drag-reordering or sight-word edits) and rebuild every grapheme's
/// example-word list back-to-front with the same claim-and-remove rule,
/// without re-deriving the order itself.
pub fn rebuild_example_words(analysis: &mut Analysis, order: Vec<LessonUnit>) {
    let mut remaining_words = analysis.analysis_words.clone();

    for unit in order.iter().rev() {
        if let LessonUnit::Grapheme(g) = unit {
            let claimed: Vec<String> = remaining_words
                .keys()
                .filter(|w| {
                    analysis
                        .words_as_graphemes
                        .get(*w)
                        .is_some_and(|gs| gs.contains(g))
                })
                .cloned()
                .collect();
            for word in &claimed {
                remaining_words.remove(word);
            }
            analysis
                .example_words
                .insert(g.clone(), sort_by_count(claimed, &analysis.analysis_words));
        }
    }

    analysis.teaching_order = order;
    analysis.examples_stale = false;
}

/// Insert a sight-word lesson at the given teaching-order position.
/// Returns the new lesson's identifier.
pub fn insert_sight_lesson(
    analysis: &mut Analysis,
    position: usize,
    words: Vec<String>,
) -> Result<usize, SightWordError> {
    validate_sight_words(&words)?;
    analysis.sight_lessons.push(words);
    let id = analysis.sight_lessons.len() - 1;
    analysis
        .teaching_order
        .insert(position, LessonUnit::SightWords(id));
    analysis.data_changed = true;
    analysis.examples_stale = true;
    Ok(id)
}

/// Remove the sight-word lesson at the given teaching-order position,
/// renumbering every later sight-word reference down by one (and remapping
/// lesson texts keyed by those identifiers). Returns the removed lesson's
/// identifier.
///
/// Calling this on a position that does not hold a sight-word lesson is a
/// programming-contract violation and panics.
pub fn remove_sight_lesson(analysis: &mut Analysis, position: usize) -> usize {
    let unit = analysis.teaching_order.remove(position);
    let LessonUnit::SightWords(id) = unit else {
        panic!("remove_sight_lesson: teaching-order position {position} is not a sight-word lesson");
    };

    analysis.sight_lessons.remove(id);
    analysis.remove_lesson_text(&LessonUnit::SightWords(id));

    for unit in analysis.teaching_order.iter_mut() {
        if let LessonUnit::SightWords(later) = unit {
            if *later > id {
                *later -= 1;
            }
        }
    }
    for (unit, _) in analysis.lesson_texts.iter_mut() {
        if let LessonUnit::SightWords(later) = unit {
            if *later > id {
                *later -= 1;
            }
        }
    }

    analysis.data_changed = true;
    analysis.examples_stale = true;
    id
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::words;

    fn analyzed(lines: &[&str]) -> Analysis {
        let mut analysis = Analysis::new();
        let params = AnalysisParams::default();
        let lines: Vec<String> = lines.iter().map(|s| s.to_string()).collect();
        words::add_text(&mut analysis, "test.txt", lines, &params);
        calculate_teaching_order(&mut analysis, &params);
        analysis
    }

    fn position(analysis: &Analysis, g: &str) -> usize {
        analysis
            .teaching_order
            .iter()
            .position(|u| *u == LessonUnit::Grapheme(g.to_string()))
            .unwrap_or_else(|| panic!("grapheme '{}' missing from order", g))
    }

    #[test]
    fn test_order_contains_each_grapheme_once() {
        let analysis = analyzed(&["the cat sat", "the cat ran"]);
        for g in ["t", "h", "e", "c", "a", "s", "r", "n"] {
            let occurrences = analysis
                .teaching_order
                .iter()
                .filter(|u| **u == LessonUnit::Grapheme(g.to_string()))
                .count();
            assert_eq!(occurrences, 1, "grapheme '{}'", g);
        }
        assert_eq!(analysis.teaching_order.len(), 8);
    }

    #[test]
    fn test_widely_used_graphemes_come_first() {
        // t, a, c each appear in two or more words of count 2;
        // s, r, n appear only in single-count words
        let analysis = analyzed(&["the cat sat", "the cat ran"]);
        for strong in ["t", "a", "c"] {
            for weak in ["s", "r", "n"] {
                assert!(
                    position(&analysis, strong) < position(&analysis, weak),
                    "'{}' should precede '{}'",
                    strong,
                    weak
                );
            }
        }
    }

    #[test]
    fn test_example_words_sorted_by_count() {
        let analysis = analyzed(&["the cat sat", "the cat ran"]);
        // whichever grapheme claims "cat"/"sat"/"ran" lists the
        // double-counted word first
        for words in analysis.example_words.values() {
            let counts: Vec<u32> = words.iter().map(|w| analysis.analysis_words[w]).collect();
            let mut sorted = counts.clone();
            sorted.sort_by_key(|c| std::cmp::Reverse(*c));
            assert_eq!(counts, sorted);
        }
    }

    #[test]
    fn test_each_word_claimed_once() {
        let analysis = analyzed(&["the cat sat", "the cat ran"]);
        let mut seen = std::collections::HashSet::new();
        for words in analysis.example_words.values() {
            for word in words {
                assert!(seen.insert(word.clone()), "word '{}' claimed twice", word);
            }
        }
        assert_eq!(seen.len(), 4);
    }

    #[test]
    fn test_excluded_words_carry_no_weight() {
        let mut analysis = Analysis::new();
        let params = AnalysisParams::default();
        let lines: Vec<String> = vec!["za za za cat".to_string()];
        words::add_text(&mut analysis, "t.txt", lines, &params);
        crate::affix::exclude_word(&mut analysis, "za").expect("known word");
        calculate_teaching_order(&mut analysis, &params);
        // z appears only in the excluded word: zero usage, not taught
        assert!(!analysis
            .teaching_order
            .contains(&LessonUnit::Grapheme("z".to_string())));
        // but its usage entry exists with zero count
        assert_eq!(analysis.grapheme_use["z"], 0);
    }

    #[test]
    fn test_type_counting_flattens_frequency() {
        let mut analysis = Analysis::new();
        let params = AnalysisParams {
            count_method: CountMethod::Types,
            ..Default::default()
        };
        let lines: Vec<String> = vec!["zo zo zo be".to_string()];
        words::add_text(&mut analysis, "t.txt", lines, &params);
        calculate_teaching_order(&mut analysis, &params);
        assert_eq!(analysis.grapheme_use["z"], 1);
        assert_eq!(analysis.analysis_words["zo"], 1);
    }

    #[test]
    fn test_digraph_treated_as_unit() {
        let mut analysis = Analysis::new();
        let params = AnalysisParams::default();
        analysis.digraphs = vec!["ng".to_string()];
        let lines: Vec<String> = vec!["ngoma ngo".to_string()];
        words::add_text(&mut analysis, "t.txt", lines, &params);
        calculate_teaching_order(&mut analysis, &params);
        assert!(analysis
            .teaching_order
            .contains(&LessonUnit::Grapheme("ng".to_string())));
        // 'n' and 'g' never occur outside the digraph
        assert!(!analysis.grapheme_use.contains_key("n"));
        assert!(!analysis.grapheme_use.contains_key("g"));
    }

    #[test]
    fn test_ensure_runs_once_then_leaves_order_alone() {
        let mut analysis = Analysis::new();
        let params = AnalysisParams::default();
        let lines: Vec<String> = vec!["cat".to_string()];
        words::add_text(&mut analysis, "t.txt", lines, &params);
        assert!(analysis.order_dirty);
        ensure_teaching_order(&mut analysis, &params);
        assert!(!analysis.order_dirty);

        // manual reorder must survive a second ensure call
        let mut reversed = analysis.teaching_order.clone();
        reversed.reverse();
        rebuild_example_words(&mut analysis, reversed.clone());
        ensure_teaching_order(&mut analysis, &params);
        assert_eq!(analysis.teaching_order, reversed);
    }

    #[test]
    fn test_rebuild_preserves_sequence_and_reclaims() {
        let mut analysis = analyzed(&["the cat sat", "the cat ran"]);
        let mut order = analysis.teaching_order.clone();
        order.reverse();
        rebuild_example_words(&mut analysis, order.clone());
        assert_eq!(analysis.teaching_order, order);
        // still a partition of the words
        let total: usize = analysis.example_words.values().map(|v| v.len()).sum();
        assert_eq!(total, 4);
    }

    #[test]
    fn test_sight_word_insert_and_remove_reindexes() {
        let mut analysis = analyzed(&["the cat sat", "the cat ran"]);
        let first = insert_sight_lesson(
            &mut analysis,
            1,
            vec!["the".to_string(), "is".to_string()],
        )
        .expect("valid lesson");
        let second =
            insert_sight_lesson(&mut analysis, 3, vec!["was".to_string()]).expect("valid lesson");
        assert_eq!(first, 0);
        assert_eq!(second, 1);
        analysis.set_lesson_text(LessonUnit::SightWords(second), "was it".to_string());

        let removed = remove_sight_lesson(&mut analysis, 1);
        assert_eq!(removed, first);
        // the later lesson's reference dropped by exactly one
        assert_eq!(analysis.teaching_order[2], LessonUnit::SightWords(0));
        assert_eq!(analysis.sight_lessons, vec![vec!["was".to_string()]]);
        // and its lesson text moved with it
        assert_eq!(
            analysis.lesson_text(&LessonUnit::SightWords(0)),
            Some("was it")
        );
    }

    #[test]
    #[should_panic(expected = "not a sight-word lesson")]
    fn test_remove_non_sight_position_panics() {
        let mut analysis = analyzed(&["cat"]);
        remove_sight_lesson(&mut analysis, 0);
    }

    #[test]
    fn test_validate_sight_words() {
        assert_eq!(validate_sight_words(&[]), Err(SightWordError::Empty));
        let dup = vec!["the".to_string(), "the".to_string()];
        assert!(matches!(
            validate_sight_words(&dup),
            Err(SightWordError::Duplicate(_))
        ));
        let ok = vec!["the".to_string(), "is".to_string()];
        assert!(validate_sight_words(&ok).is_ok());
    }

    #[test]
    fn test_full_recompute_discards_sight_lessons_keeps_grapheme_texts() {
        let mut analysis = analyzed(&["cat"]);
        let params = AnalysisParams::default();
        insert_sight_lesson(&mut analysis, 0, vec!["the".to_string()]).expect("valid");
        analysis.set_lesson_text(LessonUnit::SightWords(0), "the the".to_string());
        analysis.set_lesson_text(LessonUnit::Grapheme("a".to_string()), "a cat".to_string());

        calculate_teaching_order(&mut analysis, &params);
        assert!(analysis.sight_lessons.is_empty());
        assert!(analysis
            .lesson_text(&LessonUnit::SightWords(0))
            .is_none());
        assert_eq!(
            analysis.lesson_text(&LessonUnit::Grapheme("a".to_string())),
            Some("a cat")
        );
    }
}
