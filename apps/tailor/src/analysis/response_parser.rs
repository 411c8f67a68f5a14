//! Parser for the labeled-line reply returned by the analysis prompt.
//!
//! Expected shape (any order, labels are case-sensitive):
//!
//! ```text
//! COMPANY: Acme
//! ROLE: Senior Backend Engineer
//! VERSION: FAANG
//! CONFIDENCE: 0.85
//! KEYWORDS: Rust, Kubernetes, AWS
//! ATS_TEXT: Backend engineer with ...
//! ... continuation lines are appended to ATS_TEXT
//! ```
//!
//! The parser never fails. Each malformed field degrades to its default on its own.

use crate::models::recommendation::DEFAULT_CONFIDENCE;

const COMPANY: &str = "COMPANY:";
const ROLE: &str = "ROLE:";
const VERSION: &str = "VERSION:";
const CONFIDENCE: &str = "CONFIDENCE:";
const KEYWORDS: &str = "KEYWORDS:";
const ATS_TEXT: &str = "ATS_TEXT:";

/// Raw, unvalidated fields extracted from an LLM reply.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecommendationDraft {
    pub company: String,
    pub role: String,
    /// Track label exactly as the model wrote it; validated by the analyzer.
    pub version: String,
    pub confidence: f64,
    pub keywords: Vec<String>,
    pub ats_text: String,
}

impl RecommendationDraft {
    /// True when no recognized label contributed anything.
    pub fn is_blank(&self) -> bool {
        *self == Self::default()
    }
}

pub fn parse_response(payload: &str) -> RecommendationDraft {
    let mut draft = RecommendationDraft::default();
    let mut in_ats_text = false;

    for raw_line in payload.lines() {
        let line = raw_line.trim();

        if let Some(rest) = line.strip_prefix(COMPANY) {
            draft.company = rest.trim().to_string();
        } else if let Some(rest) = line.strip_prefix(ROLE) {
            draft.role = rest.trim().to_string();
        } else if let Some(rest) = line.strip_prefix(VERSION) {
            draft.version = rest.trim().to_string();
        } else if let Some(rest) = line.strip_prefix(CONFIDENCE) {
            draft.confidence = rest.trim().parse().unwrap_or(DEFAULT_CONFIDENCE);
        } else if let Some(rest) = line.strip_prefix(KEYWORDS) {
            draft.keywords = split_keywords(rest.trim());
        } else if let Some(rest) = line.strip_prefix(ATS_TEXT) {
            in_ats_text = true;
            draft.ats_text = rest.trim().to_string();
        } else if in_ats_text && !line.is_empty() {
            if !draft.ats_text.is_empty() {
                draft.ats_text.push(' ');
            }
            draft.ats_text.push_str(line);
        }
    }

    draft
}

/// Comma-split with trimming. Empty segments (`a,,b`) keep their slot;
/// whitespace-only segments (`a, ,b`) are dropped.
fn split_keywords(raw: &str) -> Vec<String> {
    if raw.is_empty() {
        return Vec::new();
    }
    raw.split(',')
        .filter(|segment| segment.is_empty() || !segment.trim().is_empty())
        .map(|segment| segment.trim().to_string())
        .collect()
}
