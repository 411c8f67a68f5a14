//! Document Mutator: applies a recommendation to the three template documents.
//!
//! Each document is an independent read → patch → atomic replace cycle.
//! A patch that cannot find its region aborts before anything is written,
//! so a document is either fully rewritten or left byte-identical.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::config::TemplateTargets;
use crate::documents::flags::{apply_flags, FlagLayout};
use crate::documents::patch::{escape_latex, replace_marker, PatchError, RegionPatch};
use crate::models::recommendation::MAX_INLINE_KEYWORDS;
use crate::models::{Locale, Recommendation, Track};

#[derive(Debug, Error)]
pub enum MutateError {
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}: {source}")]
    Patch {
        path: PathBuf,
        #[source]
        source: PatchError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// Title document (header).
    Header,
    /// Boilerplate/keyword document (sidebar).
    Sidebar,
    /// Flags document (main).
    Main,
}

#[derive(Debug, Clone)]
pub struct MutationResult {
    pub document: DocumentKind,
    pub path: PathBuf,
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct GenerationReport {
    pub results: Vec<MutationResult>,
}

impl GenerationReport {
    pub fn all_succeeded(&self) -> bool {
        self.results.iter().all(|r| r.success)
    }

    pub fn failures(&self) -> impl Iterator<Item = &MutationResult> {
        self.results.iter().filter(|r| !r.success)
    }
}

/// Compiled template targets, resolved against a template directory.
#[derive(Debug, Clone)]
pub struct DocumentMutator {
    header_path: PathBuf,
    title: RegionPatch,
    title_variable: Option<(PathBuf, RegionPatch)>,
    sidebar_path: PathBuf,
    ats_boost: RegionPatch,
    keyword_placeholder: String,
    keyword_cap: usize,
    main_path: PathBuf,
    flags: FlagLayout,
}

impl DocumentMutator {
    /// Compiles every pattern up front; a bad pattern is a configuration problem,
    /// not a per-run mutation failure.
    pub fn new(targets: &TemplateTargets, root: &Path, keyword_cap: usize) -> Result<Self, PatchError> {
        let title_variable = match (&targets.title_variable_file, &targets.title_variable_pattern) {
            (Some(file), Some(pattern)) => Some((root.join(file), RegionPatch::new(pattern)?)),
            _ => None,
        };

        Ok(Self {
            header_path: root.join(&targets.header_file),
            title: RegionPatch::new(&targets.header_title_pattern)?,
            title_variable,
            sidebar_path: root.join(&targets.sidebar_file),
            ats_boost: RegionPatch::new(&targets.ats_boost_pattern)?,
            keyword_placeholder: targets.keyword_placeholder.clone(),
            keyword_cap: keyword_cap.min(MAX_INLINE_KEYWORDS),
            main_path: root.join(&targets.main_file),
            flags: targets.flags.clone(),
        })
    }

    /// Runs all three document mutations. Every mutation is attempted even when
    /// an earlier one fails.
    pub fn generate(&self, rec: &Recommendation) -> GenerationReport {
        let results = vec![
            self.update_header_title(&rec.role),
            self.update_ats_boost(&rec.ats_text, rec.leading_keywords(self.keyword_cap)),
            self.update_track_flags(rec.track, rec.locale),
        ];
        for result in &results {
            if result.success {
                info!(document = ?result.document, "{}", result.message);
            } else {
                error!(document = ?result.document, "{}", result.message);
            }
        }
        GenerationReport { results }
    }

    /// Sets the title in the header document, then the companion title variable if present.
    pub fn update_header_title(&self, role: &str) -> MutationResult {
        let title = escape_latex(role);
        let outcome = rewrite(&self.header_path, |content| self.title.apply(content, &title));
        let mut result = to_result(
            DocumentKind::Header,
            &self.header_path,
            outcome,
            format!("Header title updated: {role}"),
        );

        if result.success {
            if let Some(note) = self.update_title_variable(&title) {
                result.message.push_str(&format!(" ({note})"));
            }
        }
        result
    }

    /// Companion title variable. Failures here are warnings, never a document failure.
    fn update_title_variable(&self, title: &str) -> Option<String> {
        let (path, patch) = self.title_variable.as_ref()?;
        match rewrite(path, |content| patch.apply(content, title)) {
            Ok(()) => Some(format!("title variable updated in {}", path.display())),
            Err(e) => {
                warn!("Title variable not updated: {e}");
                Some(format!("title variable skipped: {e}"))
            }
        }
    }

    /// Replaces the boost region interior, then fills the keyword placeholder if present.
    pub fn update_ats_boost(&self, ats_text: &str, keywords: &[String]) -> MutationResult {
        let inline: Vec<String> = keywords
            .iter()
            .take(self.keyword_cap)
            .map(|k| escape_latex(k))
            .collect();
        let boost = escape_latex(ats_text);

        let outcome = rewrite(&self.sidebar_path, |content| {
            let boosted = self.ats_boost.apply(content, &boost)?;
            if inline.is_empty() {
                return Ok(boosted);
            }
            Ok(replace_marker(&boosted, &self.keyword_placeholder, &inline.join(", "))
                .unwrap_or(boosted))
        });

        to_result(
            DocumentKind::Sidebar,
            &self.sidebar_path,
            outcome,
            format!(
                "ATS boost updated ({} chars, {} keywords)",
                ats_text.chars().count(),
                inline.len()
            ),
        )
    }

    /// Activates exactly the given track (plus the locale flag for secondary-locale postings).
    pub fn update_track_flags(&self, track: Track, locale: Locale) -> MutationResult {
        let outcome = rewrite(&self.main_path, |content| {
            apply_flags(content, &self.flags, track, locale)
        });
        let locale_note = if locale.is_secondary() {
            format!(" with {} locale flag", self.flags.locale_flag)
        } else {
            String::new()
        };
        to_result(
            DocumentKind::Main,
            &self.main_path,
            outcome,
            format!("Version flags updated: {track} activated{locale_note}"),
        )
    }
}

fn to_result(
    document: DocumentKind,
    path: &Path,
    outcome: Result<(), MutateError>,
    success_message: String,
) -> MutationResult {
    match outcome {
        Ok(()) => MutationResult {
            document,
            path: path.to_path_buf(),
            success: true,
            message: success_message,
        },
        Err(e) => MutationResult {
            document,
            path: path.to_path_buf(),
            success: false,
            message: e.to_string(),
        },
    }
}

/// Reads the whole file, computes the new content, and swaps it in atomically.
/// Nothing is written if `transform` fails. The replacement keeps the original's
/// permission bits.
fn rewrite<F>(path: &Path, transform: F) -> Result<(), MutateError>
where
    F: FnOnce(&str) -> Result<String, PatchError>,
{
    let io_err = |source| MutateError::Io {
        path: path.to_path_buf(),
        source,
    };

    let permissions = std::fs::metadata(path).map_err(io_err)?.permissions();
    let content = std::fs::read_to_string(path).map_err(io_err)?;
    let updated = transform(&content).map_err(|source| MutateError::Patch {
        path: path.to_path_buf(),
        source,
    })?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut staged = NamedTempFile::new_in(dir).map_err(io_err)?;
    staged.write_all(updated.as_bytes()).map_err(io_err)?;
    staged.as_file().sync_all().map_err(io_err)?;
    staged.as_file().set_permissions(permissions).map_err(io_err)?;
    staged.persist(path).map_err(|e| io_err(e.error))?;
    Ok(())
}
