//! Primer Analysis Engine
//!
//! Analyzes raw language texts to build the letter/grapheme inventory of a
//! language, derive a pedagogically ordered sequence for introducing those
//! graphemes in a beginner's primer, and verify that lesson texts use only
//! already-taught graphemes and sight words.
//!
//! The engine is a plain library driven by a presentation layer: it never
//! opens dialogs or initiates I/O on its own. All state lives in a single
//! [`models::Analysis`] aggregate owned by the caller, every operation is
//! synchronous, and recomputation is whole-corpus (tracked by dirty flags,
//! so manual edits are never silently discarded).
//!
//! # Example
//!
//! ```
//! use primer_analysis::prelude::*;
//!
//! let mut analysis = Analysis::new();
//! let params = AnalysisParams::default();
//!
//! let lines = vec!["the cat sat".to_string(), "the cat ran".to_string()];
//! add_text(&mut analysis, "stories.txt", lines, &params);
//!
//! ensure_teaching_order(&mut analysis, &params);
//! println!("{}", teaching_order_report(&analysis));
//! ```

pub mod affix;
pub mod classify;
pub mod concordance;
pub mod grapheme;
pub mod loader;
pub mod models;
pub mod normalize;
pub mod order;
pub mod output;
pub mod project;
pub mod residue;
pub mod words;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::affix::{
        apply_division, exclude_word, levenshtein_ratio, markup_for, parse_division,
        process_affixes, validate_affix_list, AffixError, DivisionError,
    };
    pub use crate::classify::{
        atomic_units, find_chars, is_word_forming, reclassify_all, set_separate_diacritics,
    };
    pub use crate::concordance::{concordance, phrases, ContextMatch};
    pub use crate::grapheme::{validate_digraphs, DigraphError, GraphemeSegmenter};
    pub use crate::loader::{read_lines, sniff_sfm, LoadError, SfmPolicy, SfmSniff};
    pub use crate::models::{
        Analysis, AnalysisParams, CountMethod, LessonUnit, WordRecord,
    };
    pub use crate::normalize::{
        check_encoding, prepare_output, strip_bom, to_nfd, EncodingWarning,
    };
    pub use crate::order::{
        calculate_teaching_order, ensure_teaching_order, insert_sight_lesson,
        rebuild_example_words, remove_sight_lesson, validate_sight_words, SightWordError,
    };
    pub use crate::output::{teaching_order_report, unit_label, word_list_report};
    pub use crate::project::{
        load_project, save_project, ProjectError, ProjectFile, PROJECT_VERSION,
    };
    pub use crate::residue::{mark_residue, ResidueError, ResidueMarking, Section};
    pub use crate::words::{add_text, reprocess_words};
}

// Re-export the most commonly used types at the crate root
pub use models::{Analysis, AnalysisParams, CountMethod, LessonUnit, WordRecord};
