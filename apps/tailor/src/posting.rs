use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::errors::AppError;

static NON_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s-]").expect("non-word pattern is valid"));
static SEPARATOR_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[-\s]+").expect("separator pattern is valid"));

/// Reads a job posting. Missing or zero-length files are rejected; non-UTF-8
/// files are decoded as Latin-1.
pub fn read_posting(path: &Path) -> Result<String, AppError> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(AppError::InvalidInput(format!(
                "Job posting file not found: {}",
                path.display()
            )))
        }
        Err(e) => return Err(e.into()),
    };

    if bytes.is_empty() {
        return Err(AppError::InvalidInput(format!(
            "Job posting file is empty: {}",
            path.display()
        )));
    }

    Ok(match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => {
            tracing::debug!("{} is not UTF-8, decoding as Latin-1", path.display());
            e.into_bytes().into_iter().map(char::from).collect()
        }
    })
}

/// Lower-cases, drops punctuation, and joins words with `_`.
///
/// `"Senior Software Engineer (Backend)"` → `"senior_software_engineer_backend"`
pub fn sanitize_filename(text: &str) -> String {
    let lowered = text.to_lowercase();
    let cleaned = NON_WORD.replace_all(&lowered, "");
    let joined = SEPARATOR_RUN.replace_all(&cleaned, "_");
    joined.trim_matches('_').to_string()
}

/// `0.857` → `"85%"`. Truncates, never rounds up.
pub fn format_confidence(confidence: f64) -> String {
    format!("{:.0}%", (confidence * 100.0).trunc())
}
