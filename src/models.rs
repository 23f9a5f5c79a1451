//! Data structures for the primer analysis engine.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// How word and morpheme frequencies are aggregated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CountMethod {
    /// Count every occurrence of a word (token frequency).
    #[default]
    Tokens,
    /// Count each distinct word once (type frequency).
    Types,
}

/// Analysis options owned by the presentation layer and passed into
/// each recompute.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct AnalysisParams {
    /// Leave affix morphemes out of the teaching-order frequency counts.
    pub exclude_affixes: bool,
    pub count_method: CountMethod,
    /// The active display font needs zero-width joiners across markup
    /// boundaries to keep script joining intact.
    pub join_markup: bool,
}

/// One entry in the word frequency table.
///
/// The table key is the lowercased, NFD-normalized word; exactly one
/// record exists per distinct word across the whole corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordRecord {
    /// Occurrences across all loaded texts.
    pub count: u32,
    /// Excluded words stay in the table but contribute zero frequency.
    pub excluded: bool,
    /// A manual division is never overwritten by affix-list changes.
    pub manual_split: bool,
    /// Morpheme sequence: prefix* root+ suffix*. Prefixes end with '-',
    /// suffixes begin with '-', roots carry no marker.
    pub morphemes: Vec<String>,
    /// Markup form for display (bold roots, gray affixes).
    pub markup: String,
}

impl WordRecord {
    /// Default state for a word seen for the first time.
    pub fn new(word: &str) -> Self {
        WordRecord {
            count: 1,
            excluded: false,
            manual_split: false,
            morphemes: vec![word.to_string()],
            markup: format!("<b>{}</b>", word),
        }
    }
}

/// A unit of the teaching order: either a grapheme to introduce, or a
/// reference into the sight-word lesson table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LessonUnit {
    Grapheme(String),
    /// Index into `Analysis::sight_lessons`.
    SightWords(usize),
}

impl LessonUnit {
    pub fn is_sight_words(&self) -> bool {
        matches!(self, LessonUnit::SightWords(_))
    }
}

/// The complete analysis state for one project: loaded texts, the
/// discovered alphabet, the word frequency table, and everything derived
/// from them. One instance is exclusively owned by the calling
/// application and passed explicitly to every engine operation; the
/// engine holds no global state and does no internal synchronization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Analysis {
    /// Names of the loaded text files, in load order.
    pub file_names: Vec<String>,
    /// `file_lines[n]` holds the normalized lines of `file_names[n]`.
    pub file_lines: Vec<Vec<String>>,

    /// Some input line was not already fully decomposed.
    #[serde(default)]
    pub contains_nfc: bool,
    /// Some input line was not already fully composed.
    #[serde(default)]
    pub contains_nfd: bool,
    /// The inconsistent-encoding warning has been issued for this corpus.
    #[serde(default)]
    pub encoding_warned: bool,

    /// Every atomic character unit seen in the corpus.
    pub chars: HashSet<String>,
    /// Word-breaking characters in discovery order. Always contains at
    /// least space and no-break space.
    pub word_break_chars: Vec<String>,
    /// Word-forming characters in discovery order.
    pub word_form_chars: Vec<String>,

    /// Configured digraphs/multigraphs.
    pub digraphs: Vec<String>,
    /// Configured affixes; each entry carries '-' at its attachment end.
    pub affixes: Vec<String>,
    /// Combining diacritics are treated as separate units.
    pub separate_diacritics: bool,

    /// The word frequency table, keyed by lowercased NFD word.
    pub words: BTreeMap<String, WordRecord>,

    // Derived state, rebuilt wholesale by the teaching-order engine.
    /// Grapheme decomposition of every word.
    pub words_as_graphemes: BTreeMap<String, Vec<String>>,
    /// Grapheme decomposition of every morpheme (keyed with its marker).
    pub morphemes_as_graphemes: BTreeMap<String, Vec<String>>,
    /// Effective per-word counts used by the elimination algorithm
    /// (zero for excluded words).
    pub analysis_words: BTreeMap<String, u32>,
    /// Effective per-morpheme counts.
    pub analysis_morphemes: BTreeMap<String, u32>,
    /// Aggregate usage frequency per grapheme.
    pub grapheme_use: BTreeMap<String, u32>,
    /// Example words per grapheme, sorted by descending count.
    pub example_words: BTreeMap<String, Vec<String>>,

    /// The proposed teaching order.
    pub teaching_order: Vec<LessonUnit>,
    /// Sight-word lessons; referenced by index from the teaching order.
    pub sight_lessons: Vec<Vec<String>>,
    /// Free-form lesson texts keyed by teaching-order unit. Stored as
    /// pairs so the project file serializes as plain JSON.
    pub lesson_texts: Vec<(LessonUnit, String)>,

    /// Unsaved changes exist (project-level dirty flag).
    pub data_changed: bool,
    /// Frequency inputs changed; a full teaching-order recompute is due.
    pub order_dirty: bool,
    /// The unit sequence was edited; example words must be re-derived.
    pub examples_stale: bool,
}

impl Analysis {
    pub fn new() -> Self {
        let mut analysis = Analysis::default();
        analysis.reset_alphabet();
        analysis
    }

    /// Reset the alphabet to its seed state: space and no-break space are
    /// always present and always word-breaking.
    pub fn reset_alphabet(&mut self) {
        self.chars = HashSet::from([" ".to_string(), "\u{a0}".to_string()]);
        self.word_break_chars = vec![" ".to_string(), "\u{a0}".to_string()];
        self.word_form_chars = Vec::new();
    }

    pub fn num_files(&self) -> usize {
        self.file_names.len()
    }

    pub fn num_words(&self) -> usize {
        self.words.len()
    }

    /// Every character of every word-breaking unit, for split tests.
    pub fn break_char_set(&self) -> HashSet<char> {
        self.word_break_chars
            .iter()
            .flat_map(|unit| unit.chars())
            .collect()
    }

    /// Replace the word classification from the configuration surface.
    /// Space and no-break space stay word-breaking whether listed or not.
    /// The caller must reprocess words afterwards; the teaching order is
    /// flagged for recomputation here.
    pub fn set_word_classification(
        &mut self,
        break_chars: Vec<String>,
        form_chars: Vec<String>,
    ) {
        let mut all = vec![" ".to_string(), "\u{a0}".to_string()];
        all.extend(
            break_chars
                .into_iter()
                .filter(|c| c != " " && c != "\u{a0}"),
        );
        self.word_break_chars = all;
        self.word_form_chars = form_chars;
        self.data_changed = true;
        self.order_dirty = true;
    }

    pub fn lesson_text(&self, unit: &LessonUnit) -> Option<&str> {
        self.lesson_texts
            .iter()
            .find(|(u, _)| u == unit)
            .map(|(_, text)| text.as_str())
    }

    pub fn set_lesson_text(&mut self, unit: LessonUnit, text: String) {
        match self.lesson_texts.iter_mut().find(|(u, _)| *u == unit) {
            Some(entry) => entry.1 = text,
            None => self.lesson_texts.push((unit, text)),
        }
        self.data_changed = true;
    }

    pub fn remove_lesson_text(&mut self, unit: &LessonUnit) {
        self.lesson_texts.retain(|(u, _)| u != unit);
    }
}
