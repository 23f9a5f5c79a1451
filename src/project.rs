//! Persisted-project serialization: the whole analysis state saved and
//! restored as one version-tagged JSON unit.

use crate::models::{Analysis, AnalysisParams};
use crate::normalize::{self, EncodingWarning};
use log::debug;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Current schema version. Version 1 predates the normalization-tracking
/// flags and is migrated on load.
pub const PROJECT_VERSION: u32 = 2;
const SUPPORTED_VERSIONS: [u32; 2] = [1, 2];

#[derive(Error, Debug)]
pub enum ProjectError {
    #[error("could not access project file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("this file does not contain valid project data: {0}")]
    Format(#[from] serde_json::Error),
    #[error("unknown project version {found} (supported: {supported:?})")]
    UnknownVersion { found: u32, supported: [u32; 2] },
}

/// One saved project: the full analysis state plus the presentation-layer
/// options, tagged with the schema version.
#[derive(Debug, Serialize, Deserialize)]
pub struct ProjectFile {
    pub version: u32,
    pub analysis: Analysis,
    pub options: AnalysisParams,
}

#[derive(Deserialize)]
struct VersionProbe {
    version: u32,
}

/// Serialize the project to a file. The dirty flag is cleared first so a
/// freshly loaded project does not immediately report unsaved changes.
pub fn save_project(
    path: &Path,
    analysis: &mut Analysis,
    options: &AnalysisParams,
) -> Result<(), ProjectError> {
    analysis.data_changed = false;
    let project = ProjectFile {
        version: PROJECT_VERSION,
        analysis: analysis.clone(),
        options: *options,
    };
    let json = serde_json::to_string(&project)?;
    std::fs::write(path, json).map_err(|source| ProjectError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("saved project to '{}'", path.display());
    Ok(())
}

/// Load a project file, migrating older schema versions.
///
/// A v1 project lacks the normalization-tracking flags: its stored lines
/// are re-scanned and renormalized to NFD, and the corpus is flagged
/// dirty so derived tables get rebuilt. The returned warning, when
/// present, reports inconsistent encoding and must be surfaced.
pub fn load_project(path: &Path) -> Result<(ProjectFile, Option<EncodingWarning>), ProjectError> {
    let json = std::fs::read_to_string(path).map_err(|source| ProjectError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let probe: VersionProbe = serde_json::from_str(&json)?;
    if !SUPPORTED_VERSIONS.contains(&probe.version) {
        return Err(ProjectError::UnknownVersion {
            found: probe.version,
            supported: SUPPORTED_VERSIONS,
        });
    }

    let mut project: ProjectFile = serde_json::from_str(&json)?;
    project.analysis.data_changed = false;

    let warning = if project.version == 1 {
        migrate_v1(&mut project.analysis)
    } else if project.analysis.contains_nfc && project.analysis.contains_nfd {
        // remind the operator on every load of a mixed-encoding corpus
        Some(EncodingWarning)
    } else {
        None
    };
    debug!(
        "loaded project '{}' (version {})",
        path.display(),
        project.version
    );
    Ok((project, warning))
}

/// Recompute what version 1 never stored: scan the text lines for
/// composed/decomposed characters and make sure everything is NFD.
fn migrate_v1(analysis: &mut Analysis) -> Option<EncodingWarning> {
    analysis.contains_nfc = false;
    analysis.contains_nfd = false;
    analysis.encoding_warned = false;

    let file_lines = std::mem::take(&mut analysis.file_lines);
    let mut warning = None;
    let mut normalized = Vec::with_capacity(file_lines.len());
    for lines in file_lines {
        warning = normalize::check_encoding(analysis, &lines).or(warning);
        normalized.push(lines.iter().map(|line| normalize::to_nfd(line)).collect());
    }
    analysis.file_lines = normalized;
    analysis.data_changed = true;
    analysis.order_dirty = true;
    warning
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LessonUnit;
    use crate::order;
    use crate::words;

    fn temp_path(tag: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!(
            "primer-analysis-project-{}-{}.json",
            std::process::id(),
            tag
        ));
        path
    }

    fn sample_analysis() -> Analysis {
        let mut analysis = Analysis::new();
        let params = AnalysisParams::default();
        let lines = vec!["the cat sat".to_string(), "the cat ran".to_string()];
        words::add_text(&mut analysis, "corpus.txt", lines, &params);
        order::calculate_teaching_order(&mut analysis, &params);
        order::insert_sight_lesson(&mut analysis, 0, vec!["the".to_string()]).expect("valid");
        analysis.set_lesson_text(LessonUnit::SightWords(0), "the the".to_string());
        analysis
    }

    #[test]
    fn test_round_trip_preserves_state() {
        let path = temp_path("roundtrip");
        let mut analysis = sample_analysis();
        let options = AnalysisParams::default();
        save_project(&path, &mut analysis, &options).expect("save");
        assert!(!analysis.data_changed);

        let (loaded, warning) = load_project(&path).expect("load");
        assert!(warning.is_none());
        assert_eq!(loaded.version, PROJECT_VERSION);
        assert_eq!(loaded.analysis.words, analysis.words);
        assert_eq!(loaded.analysis.teaching_order, analysis.teaching_order);
        assert_eq!(loaded.analysis.sight_lessons, analysis.sight_lessons);
        assert_eq!(loaded.analysis.lesson_texts, analysis.lesson_texts);
        assert_eq!(loaded.analysis.grapheme_use, analysis.grapheme_use);
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_unknown_version_rejected() {
        let path = temp_path("badversion");
        let mut analysis = sample_analysis();
        save_project(&path, &mut analysis, &AnalysisParams::default()).expect("save");
        let json = std::fs::read_to_string(&path).expect("read back");
        std::fs::write(&path, json.replace("\"version\":2", "\"version\":9")).expect("rewrite");

        let err = load_project(&path);
        assert!(matches!(
            err,
            Err(ProjectError::UnknownVersion { found: 9, .. })
        ));
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_garbage_rejected() {
        let path = temp_path("garbage");
        std::fs::write(&path, "not json at all").expect("write");
        assert!(matches!(load_project(&path), Err(ProjectError::Format(_))));
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_v1_migration_recomputes_flags() {
        let path = temp_path("v1");
        let mut analysis = sample_analysis();
        // simulate a v1 project holding composed lines and no flags
        analysis.file_lines = vec![vec!["caf\u{e9} the".to_string()]];
        save_project(&path, &mut analysis, &AnalysisParams::default()).expect("save");
        let json = std::fs::read_to_string(&path).expect("read back");
        std::fs::write(&path, json.replace("\"version\":2", "\"version\":1")).expect("rewrite");

        let (loaded, warning) = load_project(&path).expect("load");
        assert!(warning.is_none());
        assert!(loaded.analysis.contains_nfc);
        assert!(loaded.analysis.data_changed);
        assert!(loaded.analysis.order_dirty);
        // stored lines were renormalized to NFD
        assert_eq!(loaded.analysis.file_lines[0][0], "cafe\u{301} the");
        std::fs::remove_file(path).ok();
    }
}
