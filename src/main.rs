//! Primer analysis command line front end.
//!
//! A thin presentation layer over the analysis engine: loads texts (and
//! saved projects), runs the requested analysis, and prints or writes the
//! tab-separated reports.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use primer_analysis::affix::validate_affix_list;
use primer_analysis::concordance;
use primer_analysis::grapheme::validate_digraphs;
use primer_analysis::loader::{self, SfmPolicy};
use primer_analysis::models::{Analysis, AnalysisParams, CountMethod};
use primer_analysis::normalize::prepare_output;
use primer_analysis::order;
use primer_analysis::output::{teaching_order_report, word_list_report};
use primer_analysis::project;
use primer_analysis::residue;
use primer_analysis::words;

#[derive(Parser)]
#[command(name = "primer-analysis")]
#[command(about = "Suggest a grapheme teaching order for a literacy primer")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every command that builds an analysis.
#[derive(Args)]
struct CorpusArgs {
    /// Text files to analyze
    #[arg(long = "text")]
    texts: Vec<PathBuf>,

    /// Load a previously saved project first
    #[arg(long)]
    project: Option<PathBuf>,

    /// Save the resulting project state to this file
    #[arg(long)]
    save_project: Option<PathBuf>,

    /// Space-separated digraphs/multigraphs (e.g. "ng ch aa")
    #[arg(long)]
    digraphs: Option<String>,

    /// Space-separated affixes; prefixes end with '-', suffixes begin
    /// with '-' (e.g. "re- -ing")
    #[arg(long)]
    affixes: Option<String>,

    /// Treat combining diacritics as separate characters
    #[arg(long)]
    separate_diacritics: bool,

    /// Count each distinct word once instead of every occurrence
    #[arg(long)]
    count_types: bool,

    /// Leave affixes out of the teaching-order calculation
    #[arg(long)]
    exclude_affixes: bool,

    /// SFM marker handling: auto (sniff each file), none, or keep-all
    #[arg(long, default_value = "auto")]
    sfm: String,

    /// Drop lines with these markers (space-separated; implies SFM)
    #[arg(long)]
    sfm_drop: Option<String>,

    /// Keep only lines with these markers (space-separated; implies SFM)
    #[arg(long)]
    sfm_keep: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute and print the teaching order
    TeachingOrder {
        #[command(flatten)]
        corpus: CorpusArgs,

        /// Write the report here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Print the word frequency list
    WordList {
        #[command(flatten)]
        corpus: CorpusArgs,

        /// Write the report here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Show a word in context across the loaded texts
    Concordance {
        #[command(flatten)]
        corpus: CorpusArgs,

        /// The word to look up
        word: String,
    },

    /// List phrases composable at a teaching-order position
    Phrases {
        #[command(flatten)]
        corpus: CorpusArgs,

        /// Teaching-order position (0-based)
        position: usize,
    },

    /// Check a lesson text for untaught residue
    Check {
        #[command(flatten)]
        corpus: CorpusArgs,

        /// Teaching-order position of the lesson (0-based)
        position: usize,

        /// File holding the lesson text
        lesson: PathBuf,

        /// Highlight occurrences of this string as well
        #[arg(long)]
        filter: Option<String>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::TeachingOrder { corpus, output } => {
            let (mut analysis, params) = build_analysis(&corpus)?;
            order::ensure_teaching_order(&mut analysis, &params);
            let report = teaching_order_report(&analysis);
            emit(&analysis, &report, output.as_deref())?;
            finish(&corpus, &mut analysis, &params)?;
        }
        Commands::WordList { corpus, output } => {
            let (mut analysis, params) = build_analysis(&corpus)?;
            let report = word_list_report(&analysis);
            emit(&analysis, &report, output.as_deref())?;
            finish(&corpus, &mut analysis, &params)?;
        }
        Commands::Concordance { corpus, word } => {
            let (analysis, _) = build_analysis(&corpus)?;
            for m in concordance::concordance(&analysis, &word) {
                println!("{}\t{}\t{}", m.before, m.matched, m.after);
            }
        }
        Commands::Phrases { corpus, position } => {
            let (mut analysis, params) = build_analysis(&corpus)?;
            order::ensure_teaching_order(&mut analysis, &params);
            if position >= analysis.teaching_order.len() {
                return Err(format!(
                    "position {} is past the end of the teaching order ({} units)",
                    position,
                    analysis.teaching_order.len()
                )
                .into());
            }
            for m in concordance::phrases(&analysis, position) {
                println!("{}\t{}\t{}", m.before, m.matched, m.after);
            }
        }
        Commands::Check {
            corpus,
            position,
            lesson,
            filter,
        } => {
            let (mut analysis, params) = build_analysis(&corpus)?;
            order::ensure_teaching_order(&mut analysis, &params);
            if !analysis.teaching_order.is_empty() && position >= analysis.teaching_order.len() {
                return Err(format!(
                    "position {} is past the end of the teaching order ({} units)",
                    position,
                    analysis.teaching_order.len()
                )
                .into());
            }
            let text = loader::read_lines(&lesson, None)?.join("\n");
            let text = primer_analysis::normalize::to_nfd(&text);
            let marking = residue::mark_residue(&analysis, position, &text, filter.as_deref())?;
            print_residue(&text, &marking);
        }
    }
    Ok(())
}

/// Build the analysis state from a saved project and/or text files.
fn build_analysis(corpus: &CorpusArgs) -> Result<(Analysis, AnalysisParams), Box<dyn std::error::Error>> {
    let (mut analysis, mut params) = match &corpus.project {
        Some(path) => {
            let (project, warning) = project::load_project(path)?;
            if let Some(warning) = warning {
                eprintln!("warning: {}", warning);
            }
            (project.analysis, project.options)
        }
        None => (Analysis::new(), AnalysisParams::default()),
    };

    params.exclude_affixes |= corpus.exclude_affixes;
    if corpus.count_types {
        params.count_method = CountMethod::Types;
    }
    analysis.separate_diacritics |= corpus.separate_diacritics;

    if let Some(digraphs) = &corpus.digraphs {
        let digraphs = split_config_list(digraphs);
        validate_digraphs(&digraphs)?;
        analysis.digraphs = digraphs;
        analysis.order_dirty = true;
    }
    if let Some(affixes) = &corpus.affixes {
        let affixes = split_config_list(affixes);
        validate_affix_list(&affixes)?;
        analysis.affixes = affixes;
    }

    for path in &corpus.texts {
        let policy = sfm_policy_for(corpus, path)?;
        let lines = loader::read_lines(path, policy.as_ref())?;
        let name = path.display().to_string();
        if let Some(warning) = words::add_text(&mut analysis, &name, lines, &params) {
            eprintln!("warning: {}", warning);
        }
    }
    log::info!(
        "{} file(s) loaded, {} distinct words",
        analysis.num_files(),
        analysis.num_words()
    );

    Ok((analysis, params))
}

/// Lowercased, NFD-normalized entries of a space-separated option value.
fn split_config_list(value: &str) -> Vec<String> {
    primer_analysis::normalize::to_nfd(&value.to_lowercase())
        .split_whitespace()
        .map(|s| s.to_string())
        .collect()
}

/// Resolve the SFM policy for one file from the command-line options,
/// sniffing the file when set to auto.
fn sfm_policy_for(
    corpus: &CorpusArgs,
    path: &std::path::Path,
) -> Result<Option<SfmPolicy>, Box<dyn std::error::Error>> {
    if let Some(markers) = &corpus.sfm_drop {
        return Ok(Some(SfmPolicy::Drop(split_config_list(markers))));
    }
    if let Some(markers) = &corpus.sfm_keep {
        return Ok(Some(SfmPolicy::Keep(split_config_list(markers))));
    }
    match corpus.sfm.as_str() {
        "none" => Ok(None),
        "keep-all" => Ok(Some(SfmPolicy::KeepAll)),
        "auto" => {
            let sniff = loader::sniff_sfm(path)?;
            if sniff.is_sfm {
                Ok(Some(sniff.suggested.unwrap_or(SfmPolicy::KeepAll)))
            } else {
                Ok(None)
            }
        }
        other => Err(format!("unknown --sfm mode '{}' (use auto, none or keep-all)", other).into()),
    }
}

/// Print a report or write it to a file (with a BOM, recomposed to NFC
/// when the whole corpus was composed).
fn emit(
    analysis: &Analysis,
    report: &str,
    output: Option<&std::path::Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    match output {
        Some(path) => {
            let (text, mixed) = prepare_output(analysis, report);
            if mixed {
                eprintln!(
                    "warning: input encoding was inconsistent; output is saved decomposed"
                );
            }
            std::fs::write(path, format!("\u{feff}{}", text))?;
        }
        None => print!("{}", report),
    }
    Ok(())
}

/// Save the project back out if requested.
fn finish(
    corpus: &CorpusArgs,
    analysis: &mut Analysis,
    params: &AnalysisParams,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(path) = &corpus.save_project {
        project::save_project(path, analysis, params)?;
    }
    Ok(())
}

/// Render the residue marking: untaught spans bracketed, new words and
/// filter matches listed afterwards.
fn print_residue(text: &str, marking: &residue::ResidueMarking) {
    let mut rendered = String::new();
    for section in &marking.sections {
        let span = &text[section.start..section.end];
        if section.taught {
            rendered.push_str(span);
        } else {
            rendered.push('[');
            rendered.push_str(span);
            rendered.push(']');
        }
    }
    println!("{}", rendered);

    let new_words: Vec<&str> = marking
        .new_words
        .iter()
        .map(|&(s, e)| &text[s..e])
        .collect();
    if !new_words.is_empty() {
        println!("new words: {}", new_words.join(" "));
    }
    if !marking.filter_matches.is_empty() {
        println!("filter matches: {}", marking.filter_matches.len());
    }
}
