//! The text-source collaborator: reads corpus files and applies the
//! configured standard-format-marker (SFM) policy before lines reach the
//! engine.

use crate::normalize::strip_bom;
use log::debug;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("could not read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// What to do with backslash-marker lines in an SFM file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SfmPolicy {
    /// Strip marker codes but keep every line's text.
    #[default]
    KeepAll,
    /// Drop the listed markers' lines entirely, keep the rest.
    Drop(Vec<String>),
    /// Keep only the listed markers' lines, drop the rest.
    Keep(Vec<String>),
}

/// What a quick look at a file's first lines revealed.
#[derive(Debug, Clone, Default)]
pub struct SfmSniff {
    pub is_sfm: bool,
    /// Markers seen in the inspected lines.
    pub markers: Vec<String>,
    /// The inspected lines, clipped for display in a configuration prompt.
    pub preview: String,
    /// Policy suggested from the marker inventory, if any.
    pub suggested: Option<SfmPolicy>,
}

/// Default drop list for scripture-style SFM files.
const SCRIPTURE_DROP: &[&str] = &["id", "rem", "restore", "h", "toc1", "toc2", "toc3"];
/// Default keep list for lexicon-style SFM files.
const LEXICON_KEEP: &[&str] = &["lx", "pdv", "xv"];

/// Inspect the first ten lines of a file. A file with more than four
/// marker lines among them is treated as SFM, and the marker inventory
/// picks a suggested filtering policy.
pub fn sniff_sfm(path: &Path) -> Result<SfmSniff, LoadError> {
    let content = read_to_string(path)?;
    let mut sniff = SfmSniff::default();
    let mut marker_lines = 0;

    for (i, line) in content.lines().enumerate() {
        if i >= 10 {
            break;
        }
        let line = if i == 0 { strip_bom(line) } else { line };
        let mut clipped: String = line.chars().take(40).collect();
        if clipped.chars().count() == 40 && line.chars().count() > 40 {
            clipped.push('\u{2026}');
        }
        sniff.preview.push_str(&clipped);
        sniff.preview.push('\n');

        if let Some(marker) = leading_marker(line) {
            marker_lines += 1;
            sniff.markers.push(marker);
        }
    }

    sniff.is_sfm = marker_lines > 4;
    if sniff.is_sfm {
        if sniff.markers.iter().any(|m| m == "lx") {
            sniff.suggested = Some(SfmPolicy::Keep(
                LEXICON_KEEP.iter().map(|m| m.to_string()).collect(),
            ));
        } else if sniff
            .markers
            .iter()
            .any(|m| m == "h" || m == "toc1" || m == "mt1")
        {
            sniff.suggested = Some(SfmPolicy::Drop(
                SCRIPTURE_DROP.iter().map(|m| m.to_string()).collect(),
            ));
        }
    }
    debug!(
        "sniffed '{}': {} marker lines, sfm={}",
        path.display(),
        marker_lines,
        sniff.is_sfm
    );
    Ok(sniff)
}

/// Read a file's lines, stripping the BOM and applying the SFM policy.
///
/// `sfm` is `Some` when the file is marker-tagged: marker lines are
/// filtered per the policy and non-marker lines are glued onto the
/// previous marker line (continuation lines), unless that line was
/// removed. With `sfm` of `None` every non-blank line passes through.
pub fn read_lines(path: &Path, sfm: Option<&SfmPolicy>) -> Result<Vec<String>, LoadError> {
    let content = read_to_string(path)?;
    let mut lines: Vec<String> = Vec::new();
    let mut prev_removed = false;

    for (i, raw) in content.lines().enumerate() {
        let raw = if i == 0 { strip_bom(raw) } else { raw };

        if let Some(policy) = sfm {
            if leading_marker(raw).is_none() && !lines.is_empty() {
                // continuation line: attach to the previous marker line
                if !prev_removed {
                    let trimmed = raw.trim();
                    if let Some(last) = lines.last_mut() {
                        last.push(' ');
                        last.push_str(trimmed);
                    }
                }
                continue;
            }
            prev_removed = false;
            let line = apply_policy(raw, policy);
            let line = line.trim();
            if line.is_empty() {
                prev_removed = true;
            } else {
                lines.push(line.to_string());
            }
        } else {
            let line = raw.trim();
            if !line.is_empty() {
                lines.push(line.to_string());
            }
        }
    }
    Ok(lines)
}

fn read_to_string(path: &Path) -> Result<String, LoadError> {
    std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// The marker name if the line starts with a backslash code.
fn leading_marker(line: &str) -> Option<String> {
    let rest = line.strip_prefix('\\')?;
    let marker: String = rest
        .chars()
        .take_while(|c| c.is_alphanumeric() || *c == '_')
        .collect();
    Some(marker)
}

/// Filter one marker line per the policy and strip all marker codes from
/// whatever text remains.
fn apply_policy(line: &str, policy: &SfmPolicy) -> String {
    if let Some(marker) = leading_marker(line) {
        match policy {
            SfmPolicy::Drop(markers) if markers.contains(&marker) => return String::new(),
            SfmPolicy::Keep(markers) if !markers.contains(&marker) => return String::new(),
            _ => {}
        }
    }
    strip_markers(line)
}

/// Remove every `\code` sequence from the line.
fn strip_markers(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            while chars
                .peek()
                .is_some_and(|c| c.is_alphanumeric() || *c == '_')
            {
                chars.next();
            }
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn temp_file(content: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!(
            "primer-analysis-test-{}-{:p}.txt",
            std::process::id(),
            content
        ));
        let mut f = std::fs::File::create(&path).expect("create temp file");
        f.write_all(content.as_bytes()).expect("write temp file");
        path
    }

    #[test]
    fn test_plain_file_lines() {
        let path = temp_file("\u{feff}first line\n\nsecond line\n");
        let lines = read_lines(&path, None).expect("readable");
        assert_eq!(lines, vec!["first line", "second line"]);
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_missing_file_is_recoverable() {
        let err = read_lines(Path::new("/nonexistent/missing.txt"), None);
        assert!(matches!(err, Err(LoadError::Io { .. })));
    }

    #[test]
    fn test_sniff_detects_sfm() {
        let path = temp_file(
            "\\id GEN\n\\h Genesis\n\\c 1\n\\v 1 in the beginning\n\\v 2 and the earth\n",
        );
        let sniff = sniff_sfm(&path).expect("readable");
        assert!(sniff.is_sfm);
        assert_eq!(sniff.suggested, Some(SfmPolicy::Drop(
            SCRIPTURE_DROP.iter().map(|m| m.to_string()).collect()
        )));
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_sniff_plain_text() {
        let path = temp_file("just a line\nand another\n");
        let sniff = sniff_sfm(&path).expect("readable");
        assert!(!sniff.is_sfm);
        assert!(sniff.suggested.is_none());
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_drop_policy_removes_lines_and_markers() {
        let path = temp_file("\\id GEN\n\\v 1 in the beginning\n\\v 2 and the earth\n");
        let policy = SfmPolicy::Drop(vec!["id".to_string()]);
        let lines = read_lines(&path, Some(&policy)).expect("readable");
        assert_eq!(lines, vec!["1 in the beginning", "2 and the earth"]);
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_keep_policy_keeps_only_listed() {
        let path = temp_file("\\lx headword\n\\ps n\n\\xv example phrase\n");
        let policy = SfmPolicy::Keep(vec!["lx".to_string(), "xv".to_string()]);
        let lines = read_lines(&path, Some(&policy)).expect("readable");
        assert_eq!(lines, vec!["headword", "example phrase"]);
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_continuation_lines_glued() {
        let path = temp_file("\\v 1 in the\nbeginning\n\\v 2 and\n");
        let policy = SfmPolicy::KeepAll;
        let lines = read_lines(&path, Some(&policy)).expect("readable");
        assert_eq!(lines, vec!["1 in the beginning", "2 and"]);
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_continuation_after_removed_line_dropped() {
        let path = temp_file("\\v 1 kept\n\\skip gone\nand its continuation\n");
        let policy = SfmPolicy::Drop(vec!["skip".to_string()]);
        let lines = read_lines(&path, Some(&policy)).expect("readable");
        assert_eq!(lines, vec!["1 kept"]);
        std::fs::remove_file(path).ok();
    }
}
