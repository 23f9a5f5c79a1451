//! Affix matching and morpheme division of words.
//!
//! Affix matching is a longest-match heuristic, one prefix and one suffix
//! per word, not a morphological grammar. Manual divisions override the
//! lists and survive later affix-list changes.

use crate::models::{Analysis, AnalysisParams};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum AffixError {
    #[error("affix '{0}' must have at least two characters and exactly one '-' at the start or end")]
    BadEntry(String),
    #[error("affix '{0}' appears more than once in the list")]
    Duplicate(String),
}

#[derive(Error, Debug, PartialEq)]
pub enum DivisionError {
    #[error("an empty division of the word is not allowed")]
    Empty,
    #[error("word '{0}' is not in the word list")]
    UnknownWord(String),
    #[error(
        "invalid morpheme '{0}': prefixes end with '-', suffixes begin with '-', \
         and they must surround at least one unmarked root"
    )]
    BadMorpheme(String),
    #[error("the division must contain at least one root without '-'")]
    NoRoot,
    /// Soft check: the division looks like a very different word. Not an
    /// outright rejection; resubmit with `confirmed = true` to apply it.
    #[error("the division differs greatly from the original word (similarity {ratio:.2})")]
    NeedsConfirmation { ratio: f64 },
}

/// Validate an affix list: every entry at least two characters with
/// exactly one '-', at the start (suffix) or the end (prefix), no
/// duplicates.
pub fn validate_affix_list(entries: &[String]) -> Result<(), AffixError> {
    let mut seen = std::collections::HashSet::new();
    for entry in entries {
        let marker_count = entry.matches('-').count();
        let marked_end = entry.starts_with('-') ^ entry.ends_with('-');
        if entry.chars().count() < 2 || marker_count != 1 || !marked_end {
            return Err(AffixError::BadEntry(entry.clone()));
        }
        if !seen.insert(entry.as_str()) {
            return Err(AffixError::Duplicate(entry.clone()));
        }
    }
    Ok(())
}

/// Split the configured affixes into bare prefix and suffix tables, each
/// sorted longest-first so "mgba-" is tried before "m-".
fn affix_tables(affixes: &[String]) -> (Vec<String>, Vec<String>) {
    let mut prefixes: Vec<String> = affixes
        .iter()
        .filter_map(|a| a.strip_suffix('-'))
        .map(|a| a.to_string())
        .collect();
    let mut suffixes: Vec<String> = affixes
        .iter()
        .filter_map(|a| a.strip_prefix('-'))
        .map(|a| a.to_string())
        .collect();
    prefixes.sort_by_key(|a| std::cmp::Reverse(a.chars().count()));
    suffixes.sort_by_key(|a| std::cmp::Reverse(a.chars().count()));
    (prefixes, suffixes)
}

/// Re-derive the morpheme division and markup form of every word that is
/// neither excluded nor manually divided. One prefix and one suffix at
/// most, longest match first, never leaving an empty root.
pub fn process_affixes(analysis: &mut Analysis, params: &AnalysisParams) {
    let (prefixes, suffixes) = affix_tables(&analysis.affixes);

    for (word, rec) in analysis.words.iter_mut() {
        if rec.manual_split || rec.excluded {
            continue;
        }
        let mut morphemes = Vec::new();
        let mut rest: &str = word;

        if let Some(p) = prefixes
            .iter()
            .find(|p| rest.starts_with(p.as_str()) && rest.len() > p.len())
        {
            morphemes.push(format!("{}-", p));
            rest = &rest[p.len()..];
        }
        let suffix = suffixes
            .iter()
            .find(|s| rest.ends_with(s.as_str()) && rest.len() > s.len());
        if let Some(s) = suffix {
            rest = &rest[..rest.len() - s.len()];
        }
        morphemes.push(rest.to_string());
        if let Some(s) = suffix {
            morphemes.push(format!("-{}", s));
        }

        rec.markup = markup_for(&morphemes, params.join_markup);
        rec.morphemes = morphemes;
    }

    // recalculate the teaching order next time it is displayed
    analysis.order_dirty = true;
}

/// Build the display markup for a morpheme sequence: affixes de-emphasized
/// in gray, roots in bold (adjacent roots merged into one bold run). When
/// `join_markup` is set, zero-width joiners bridge the markup seams.
pub fn markup_for(morphemes: &[String], join_markup: bool) -> String {
    let zwj = if join_markup { "\u{200d}" } else { "" };

    // collapse into alternating affix/root chunks
    let mut chunks: Vec<(String, bool)> = Vec::new();
    for m in morphemes {
        let is_affix = m.ends_with('-') || m.starts_with('-');
        if is_affix {
            chunks.push((m.replace('-', ""), false));
        } else if matches!(chunks.last(), Some((_, true))) {
            if let Some((text, _)) = chunks.last_mut() {
                text.push_str(m);
            }
        } else {
            chunks.push((m.clone(), true));
        }
    }

    let mut out = String::new();
    for (i, (text, is_root)) in chunks.iter().enumerate() {
        let lead = if i > 0 { zwj } else { "" };
        let trail = if i + 1 < chunks.len() { zwj } else { "" };
        if *is_root {
            out.push_str(&format!("<b>{}{}{}</b>", lead, text, trail));
        } else {
            out.push_str(&format!(
                "<span foreground=\"gray\">{}{}{}</span>",
                lead, text, trail
            ));
        }
    }
    out
}

/// Mark a word as excluded from all frequency counts. It stays in the
/// table, displayed entirely de-emphasized.
pub fn exclude_word(analysis: &mut Analysis, word: &str) -> Result<(), DivisionError> {
    let rec = analysis
        .words
        .get_mut(word)
        .ok_or_else(|| DivisionError::UnknownWord(word.to_string()))?;
    rec.excluded = true;
    rec.morphemes = vec![word.to_string()];
    rec.markup = format!("<span foreground=\"gray\">{}</span>", word);
    analysis.data_changed = true;
    analysis.order_dirty = true;
    Ok(())
}

/// Parse and structurally validate a user-supplied, space-separated
/// morpheme division: prefix* root+ suffix*, each marked segment carrying
/// exactly one boundary marker.
pub fn parse_division(input: &str) -> Result<Vec<String>, DivisionError> {
    let morphemes: Vec<String> = input.split_whitespace().map(|m| m.to_string()).collect();
    if morphemes.is_empty() {
        return Err(DivisionError::Empty);
    }

    #[derive(PartialEq)]
    enum Stage {
        Prefix,
        Root,
        Suffix,
    }
    let mut stage = Stage::Prefix;
    let mut roots = 0;

    for m in &morphemes {
        if stage == Stage::Prefix {
            if m.ends_with('-') {
                if m.chars().count() < 2 || m.matches('-').count() != 1 {
                    return Err(DivisionError::BadMorpheme(m.clone()));
                }
                continue;
            }
            stage = Stage::Root;
        }
        if stage == Stage::Root {
            if m.starts_with('-') {
                stage = Stage::Suffix;
            } else {
                roots += 1;
                if m.ends_with('-') || m.matches('-').count() > 1 {
                    return Err(DivisionError::BadMorpheme(m.clone()));
                }
                continue;
            }
        }
        if stage == Stage::Suffix && (!m.starts_with('-') || m.matches('-').count() != 1) {
            return Err(DivisionError::BadMorpheme(m.clone()));
        }
    }

    if roots < 1 {
        return Err(DivisionError::NoRoot);
    }
    Ok(morphemes)
}

/// Apply a manual morpheme division to a word.
///
/// A division whose rejoined form is wildly different from the word
/// (similarity ratio below one half) is returned as `NeedsConfirmation`;
/// the caller surfaces the warning and resubmits with `confirmed` set.
pub fn apply_division(
    analysis: &mut Analysis,
    word: &str,
    input: &str,
    confirmed: bool,
    params: &AnalysisParams,
) -> Result<(), DivisionError> {
    if !analysis.words.contains_key(word) {
        return Err(DivisionError::UnknownWord(word.to_string()));
    }
    let morphemes = parse_division(input)?;

    let rejoined: String = morphemes.concat().replace('-', "");
    let ratio = levenshtein_ratio(word, &rejoined);
    if ratio < 0.5 && !confirmed {
        return Err(DivisionError::NeedsConfirmation { ratio });
    }

    let rec = analysis
        .words
        .get_mut(word)
        .ok_or_else(|| DivisionError::UnknownWord(word.to_string()))?;
    rec.excluded = false;
    rec.manual_split = true;
    rec.markup = markup_for(&morphemes, params.join_markup);
    rec.morphemes = morphemes;
    analysis.data_changed = true;
    analysis.order_dirty = true;
    Ok(())
}

/// Similarity ratio between two strings based on edit distance with
/// insertion cost 1, deletion cost 1 and substitution cost 2:
/// `(len(a) + len(b) - distance) / (len(a) + len(b))`, in [0, 1] with 1.0
/// meaning identical.
pub fn levenshtein_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (n, m) = (a.len(), b.len());
    if n + m == 0 {
        return 1.0;
    }

    // two-row DP over the classic edit-distance matrix
    let mut prev: Vec<usize> = (0..=m).collect();
    let mut curr = vec![0usize; m + 1];
    for i in 1..=n {
        curr[0] = i;
        for j in 1..=m {
            let cost = if a[i - 1] == b[j - 1] { 0 } else { 2 };
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    let distance = prev[m];
    (n + m - distance) as f64 / (n + m) as f64
}
