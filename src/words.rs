//! Word segmentation and the corpus-wide word frequency table.

use crate::affix;
use crate::classify;
use crate::models::{Analysis, AnalysisParams, WordRecord};
use crate::normalize::{self, EncodingWarning};
use log::debug;
use std::collections::HashSet;

/// Split a line into word segments on runs of whitespace and
/// word-breaking characters.
pub fn split_words<'a>(line: &'a str, breaks: &HashSet<char>) -> Vec<&'a str> {
    line.split(|c: char| c.is_whitespace() || breaks.contains(&c))
        .filter(|seg| !seg.is_empty())
        .collect()
}

/// True for segments that are only digits and/or hyphens (verse numbers,
/// page numbers, dashes) and carry no letters to analyze.
fn is_numeric_segment(segment: &str) -> bool {
    segment.chars().all(|c| c.is_numeric() || c == '-')
}

/// Break the given lines into words and fold them into the frequency
/// table, then re-run affix analysis over the updated table.
pub fn find_words(analysis: &mut Analysis, lines: &[String], params: &AnalysisParams) {
    let breaks = analysis.break_char_set();
    for line in lines {
        for segment in split_words(line, &breaks) {
            if is_numeric_segment(segment) {
                continue;
            }
            let word = segment.to_lowercase();
            analysis
                .words
                .entry(word.clone())
                .and_modify(|rec| rec.count += 1)
                .or_insert_with(|| WordRecord::new(&word));
        }
    }
    // marks the teaching order dirty as well
    affix::process_affixes(analysis, params);
}

/// Feed one file's worth of lines into the analysis: check encoding,
/// normalize to NFD, store the lines, and update the character and word
/// tables. The lines are expected to come from the text-source
/// collaborator, already filtered for markup.
pub fn add_text(
    analysis: &mut Analysis,
    name: &str,
    lines: Vec<String>,
    params: &AnalysisParams,
) -> Option<EncodingWarning> {
    let warning = normalize::check_encoding(analysis, &lines);
    let lines: Vec<String> = lines.iter().map(|line| normalize::to_nfd(line)).collect();

    debug!("adding text '{}' with {} lines", name, lines.len());
    analysis.file_names.push(name.to_string());
    classify::find_chars(analysis, &lines);
    find_words(analysis, &lines, params);
    analysis.file_lines.push(lines);
    analysis.data_changed = true;
    warning
}

/// Rebuild the whole word table from the stored texts, e.g. after the
/// word-breaking character set changed. No incremental path exists.
pub fn reprocess_words(analysis: &mut Analysis, params: &AnalysisParams) {
    analysis.words.clear();
    let file_lines = std::mem::take(&mut analysis.file_lines);
    for lines in &file_lines {
        find_words(analysis, lines, params);
    }
    analysis.file_lines = file_lines;
    analysis.data_changed = true;
}
