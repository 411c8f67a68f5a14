//! Region patches: locate a region by pattern, replace its interior, or abort.
//!
//! Patches work on strings only. File I/O lives in the mutator, so every
//! all-or-nothing guarantee here is testable without touching disk.

use regex::{Regex, RegexBuilder};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PatchError {
    #[error("invalid pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("pattern `{pattern}` needs 1 capture group (interior) or 3 (open, interior, close), found {groups}")]
    CaptureLayout { pattern: String, groups: usize },

    #[error("pattern `{pattern}` not found")]
    NotFound { pattern: String },

    #[error("anchor line containing `{anchor}` not found")]
    AnchorNotFound { anchor: String },
}

/// A compiled "find region, swap interior" operation.
///
/// `.` matches newlines, so a region may span several lines.
#[derive(Debug, Clone)]
pub struct RegionPatch {
    regex: Regex,
    interior: usize,
}

impl RegionPatch {
    pub fn new(pattern: &str) -> Result<Self, PatchError> {
        let regex = RegexBuilder::new(pattern)
            .dot_matches_new_line(true)
            .build()
            .map_err(|source| PatchError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })?;

        let interior = match regex.captures_len() - 1 {
            1 => 1,
            3 => 2,
            groups => {
                return Err(PatchError::CaptureLayout {
                    pattern: pattern.to_string(),
                    groups,
                })
            }
        };

        Ok(Self { regex, interior })
    }

    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    /// Replaces the interior of the first match. Everything outside it,
    /// including the delimiters, is preserved byte for byte.
    pub fn apply(&self, content: &str, replacement: &str) -> Result<String, PatchError> {
        let region = self
            .regex
            .captures(content)
            .and_then(|caps| caps.get(self.interior))
            .ok_or_else(|| PatchError::NotFound {
                pattern: self.pattern().to_string(),
            })?;

        let mut patched =
            String::with_capacity(content.len() - region.len() + replacement.len());
        patched.push_str(&content[..region.start()]);
        patched.push_str(replacement);
        patched.push_str(&content[region.end()..]);
        Ok(patched)
    }
}

/// Replaces every occurrence of a literal marker. `None` when the marker is absent.
pub fn replace_marker(content: &str, marker: &str, replacement: &str) -> Option<String> {
    if marker.is_empty() || !content.contains(marker) {
        return None;
    }
    Some(content.replace(marker, replacement))
}

/// Escapes plain text for insertion into a LaTeX document body.
pub fn escape_latex(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '#' | '$' | '%' | '&' | '_' | '{' | '}' => {
                escaped.push('\\');
                escaped.push(c);
            }
            '\\' => escaped.push_str("\\textbackslash{}"),
            '~' => escaped.push_str("\\textasciitilde{}"),
            '^' => escaped.push_str("\\textasciicircum{}"),
            _ => escaped.push(c),
        }
    }
    escaped
}
