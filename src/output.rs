//! Tab-separated report generation: the teaching order and the word list.

use crate::classify;
use crate::models::{Analysis, LessonUnit};
use unicode_normalization::char::is_combining_mark;

/// Display label for a lesson unit. A grapheme that begins with a
/// combining mark is shown on a dotted-circle base so it stays visible.
pub fn unit_label(unit: &LessonUnit) -> String {
    match unit {
        LessonUnit::Grapheme(g) => match classify::base_char(g) {
            Some(c) if is_combining_mark(c) => format!("\u{25cc}{}", g),
            _ => g.clone(),
        },
        LessonUnit::SightWords(_) => "StWds".to_string(),
    }
}

/// The teaching-order report: one line per lesson unit of
/// `label<TAB>usage-count<TAB>example words`. Sight-word lessons carry an
/// empty count and their literal word list.
pub fn teaching_order_report(analysis: &Analysis) -> String {
    let mut out = String::new();
    for unit in &analysis.teaching_order {
        let (count, words) = match unit {
            LessonUnit::Grapheme(g) => (
                analysis.grapheme_use.get(g).copied().unwrap_or(0).to_string(),
                analysis
                    .example_words
                    .get(g)
                    .map(|w| w.join("  "))
                    .unwrap_or_default(),
            ),
            LessonUnit::SightWords(id) => {
                (String::new(), analysis.sight_lessons[*id].join("  "))
            }
        };
        out.push_str(&format!("{}\t{}\t{}\n", unit_label(unit), count, words));
    }
    out
}

/// The word list report, highest counts first: `word<TAB>count`, with the
/// morpheme-segmented form appended when affixes are configured.
pub fn word_list_report(analysis: &Analysis) -> String {
    let mut entries: Vec<(&String, u32)> = analysis
        .words
        .iter()
        .map(|(word, rec)| (word, rec.count))
        .collect();
    entries.sort_by_key(|&(_, count)| std::cmp::Reverse(count));

    let with_affix_form = !analysis.affixes.is_empty();
    let mut out = String::new();
    for (word, count) in entries {
        if with_affix_form {
            let form = analysis.words[word].morphemes.join(" ");
            out.push_str(&format!("{}\t{}\t{}\n", word, count, form));
        } else {
            out.push_str(&format!("{}\t{}\n", word, count));
        }
    }
    out
}
