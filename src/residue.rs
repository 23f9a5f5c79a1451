//! Untaught-residue marking of lesson texts.
//!
//! Scans a lesson's free text against the teaching state at a chosen
//! teaching-order position and reports which spans use only material
//! already taught, plus auxiliary highlight spans (first-occurrence words
//! and filter matches).

use crate::models::{Analysis, LessonUnit};
use log::debug;
use std::collections::HashSet;
use thiserror::Error;
use unicode_normalization::is_nfd;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ResidueError {
    /// Offsets are computed against the given text, so normalizing
    /// mid-scan would corrupt them. Normalize first, then re-invoke.
    #[error("lesson text is not fully decomposed; normalize to NFD before scanning")]
    NotDecomposed,
}

/// A contiguous stretch of lesson text, byte-addressed into the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Section {
    pub start: usize,
    pub end: usize,
    pub taught: bool,
}

/// Everything the residue scan reports about one lesson text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResidueMarking {
    /// Alternating taught/untaught sections covering the whole text.
    pub sections: Vec<Section>,
    /// Words never used in any earlier lesson's text.
    pub new_words: Vec<(usize, usize)>,
    /// Case-insensitive occurrences of the filter string, if one is set.
    pub filter_matches: Vec<(usize, usize)>,
}

/// Scan `text` against the teaching state at `position`.
///
/// Word-breaking runs are always taught; a word matching a taught sight
/// word is taught as a whole; any other word is walked grapheme by
/// grapheme (longest graphemes first, so multigraphs match), and
/// characters matching no known grapheme at all count as untaught.
pub fn mark_residue(
    analysis: &Analysis,
    position: usize,
    text: &str,
    filter: Option<&str>,
) -> Result<ResidueMarking, ResidueError> {
    if !is_nfd(text) {
        return Err(ResidueError::NotDecomposed);
    }

    let mut marking = ResidueMarking::default();
    if text.is_empty() {
        return Ok(marking);
    }

    // with no teaching order there is nothing taught at all
    if analysis.teaching_order.is_empty() {
        marking.sections.push(Section {
            start: 0,
            end: text.len(),
            taught: false,
        });
        return Ok(marking);
    }
    assert!(
        position < analysis.teaching_order.len(),
        "mark_residue: teaching-order position {position} out of range"
    );

    // case-folded view of the text, one folded char per original char,
    // so char offsets line up and can be mapped back to byte offsets
    let mut byte_at: Vec<usize> = Vec::with_capacity(text.len() + 1);
    let mut folded: Vec<char> = Vec::with_capacity(text.len());
    for (off, c) in text.char_indices() {
        byte_at.push(off);
        folded.push(c.to_lowercase().next().unwrap_or(c));
    }
    byte_at.push(text.len());

    let state = TeachingState::at(analysis, position);

    if let Some(filter) = filter {
        find_filter_matches(&folded, &byte_at, filter, &mut marking.filter_matches);
    }

    let breaks = analysis.break_char_set();
    let is_break = |c: char| breaks.contains(&c) || c == '\n' || c == '\r';

    let mut sections = SectionBuilder::new();
    let mut pos = 0;
    while pos < folded.len() {
        // next word chunk, up to the following break run
        let word_end = (pos..folded.len())
            .find(|&i| is_break(folded[i]))
            .unwrap_or(folded.len());
        let break_end = (word_end..folded.len())
            .find(|&i| !is_break(folded[i]))
            .unwrap_or(folded.len());

        let word: String = folded[pos..word_end].iter().collect();
        if !word.is_empty() && !state.previously_used.contains(&word) {
            marking.new_words.push((byte_at[pos], byte_at[word_end]));
        }

        if state.sight_words.contains(&word) {
            debug!("taught sight word at {}..{}", pos, word_end);
            sections.advance(word_end, true);
        } else {
            // walk the word one grapheme at a time
            let mut p = pos;
            while p < word_end {
                match state.match_grapheme(&folded[p..word_end]) {
                    Some(grapheme) => {
                        let taught = state.taught.contains(grapheme.as_str());
                        p += grapheme.chars().count();
                        sections.advance(p, taught);
                    }
                    None => {
                        // not a known grapheme anywhere in the alphabet
                        p += 1;
                        sections.advance(p, false);
                    }
                }
            }
        }
        // the break run itself is always taught
        if break_end > word_end {
            sections.advance(break_end, true);
        }
        pos = break_end;
    }
    marking.sections = sections.finish(&byte_at);

    Ok(marking)
}

/// The material taught up to and including a teaching-order position.
struct TeachingState {
    taught: HashSet<String>,
    /// All graphemes of the alphabet, longest first, taught or not.
    all_graphemes: Vec<String>,
    sight_words: HashSet<String>,
    previously_used: HashSet<String>,
}

impl TeachingState {
    fn at(analysis: &Analysis, position: usize) -> Self {
        let mut taught = HashSet::new();
        let mut all_graphemes = Vec::new();
        let mut sight_words = HashSet::new();

        for (i, unit) in analysis.teaching_order.iter().enumerate() {
            match unit {
                LessonUnit::Grapheme(g) => {
                    all_graphemes.push(g.clone());
                    if i <= position {
                        taught.insert(g.clone());
                    }
                }
                LessonUnit::SightWords(id) if i <= position => {
                    for sw in &analysis.sight_lessons[*id] {
                        // affix-form sight words match better without
                        // their boundary hyphens
                        let sw = sw.trim_start_matches('-').trim_end_matches('-');
                        if !sw.is_empty() {
                            sight_words.insert(sw.to_lowercase());
                        }
                    }
                }
                LessonUnit::SightWords(_) => {}
            }
        }
        all_graphemes.sort_by_key(|g| std::cmp::Reverse(g.chars().count()));

        // words used in any earlier lesson's text
        let breaks = analysis.break_char_set();
        let mut previously_used = HashSet::new();
        for unit in &analysis.teaching_order[..position] {
            if let Some(text) = analysis.lesson_text(unit) {
                for word in text.split(|c: char| {
                    breaks.contains(&c) || c.is_whitespace()
                }) {
                    if !word.is_empty() {
                        previously_used.insert(word.to_lowercase());
                    }
                }
            }
        }

        TeachingState {
            taught,
            all_graphemes,
            sight_words,
            previously_used,
        }
    }

    /// Longest known grapheme matching at the start of `chars`.
    fn match_grapheme(&self, chars: &[char]) -> Option<&String> {
        self.all_graphemes.iter().find(|g| {
            let mut it = chars.iter();
            g.chars().all(|gc| it.next() == Some(&gc))
        })
    }
}

/// Accumulates alternating taught/untaught sections, merging adjacent
/// stretches in the same state (char-indexed until `finish`).
struct SectionBuilder {
    sections: Vec<(usize, usize, bool)>,
    sec_start: usize,
    pos: usize,
    in_taught: bool,
}

impl SectionBuilder {
    fn new() -> Self {
        SectionBuilder {
            sections: Vec::new(),
            sec_start: 0,
            pos: 0,
            in_taught: true,
        }
    }

    /// Extend to `end` (char offset) in the given state, flushing the
    /// open section when the state flips.
    fn advance(&mut self, end: usize, taught: bool) {
        if taught != self.in_taught {
            if self.pos > self.sec_start {
                debug!(
                    "{} section {}..{}",
                    if self.in_taught { "taught" } else { "untaught" },
                    self.sec_start,
                    self.pos
                );
                self.sections.push((self.sec_start, self.pos, self.in_taught));
                self.sec_start = self.pos;
            }
            self.in_taught = taught;
        }
        self.pos = end;
    }

    fn finish(mut self, byte_at: &[usize]) -> Vec<Section> {
        if self.pos > self.sec_start {
            self.sections.push((self.sec_start, self.pos, self.in_taught));
        }
        self.sections
            .into_iter()
            .map(|(start, end, taught)| Section {
                start: byte_at[start],
                end: byte_at[end],
                taught,
            })
            .collect()
    }
}

/// Every case-insensitive occurrence of the filter string, non-overlapping.
fn find_filter_matches(
    folded: &[char],
    byte_at: &[usize],
    filter: &str,
    out: &mut Vec<(usize, usize)>,
) {
    let needle: Vec<char> = filter.to_lowercase().chars().collect();
    if needle.is_empty() {
        return;
    }
    let mut i = 0;
    while i + needle.len() <= folded.len() {
        if folded[i..i + needle.len()] == needle[..] {
            out.push((byte_at[i], byte_at[i + needle.len()]));
            i += needle.len();
        } else {
            i += 1;
        }
    }
}
