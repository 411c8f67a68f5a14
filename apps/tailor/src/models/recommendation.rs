//! Recommendation: the structured result of analysing a job posting.
//!
//! Every field is always present. The analyzer fills gaps before a value
//! leaves its boundary, so downstream code never checks for "missing" keys.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Company placeholder used when neither the LLM nor the posting names one.
pub const UNKNOWN_COMPANY: &str = "Unknown";

/// Confidence assigned whenever no trustworthy score is available.
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

/// Hard cap on keywords inlined into the template or a fallback summary.
pub const MAX_INLINE_KEYWORDS: usize = 15;

/// CV emphasis category. Each variant maps to a `\if<Label>` switch in the main template.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Track {
    #[default]
    #[serde(rename = "FAANG")]
    Faang,
    Startup,
    Climate,
    Gaming,
}

#[derive(Debug, Error)]
#[error("unknown track '{0}'")]
pub struct UnknownTrack(pub String);

impl Track {
    pub const ALL: [Track; 4] = [Track::Faang, Track::Startup, Track::Climate, Track::Gaming];

    /// The label used in configuration, LLM replies, and template flag names.
    pub fn label(self) -> &'static str {
        match self {
            Track::Faang => "FAANG",
            Track::Startup => "Startup",
            Track::Climate => "Climate",
            Track::Gaming => "Gaming",
        }
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Track {
    type Err = UnknownTrack;

    /// Accepts a label with surrounding whitespace in any letter case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Track::ALL
            .into_iter()
            .find(|t| t.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownTrack(s.to_string()))
    }
}

/// Detected posting language. English is the primary locale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum Locale {
    #[default]
    #[serde(rename = "en")]
    English,
    #[serde(rename = "es")]
    Spanish,
}

impl Locale {
    pub fn code(self) -> &'static str {
        match self {
            Locale::English => "en",
            Locale::Spanish => "es",
        }
    }

    pub fn is_secondary(self) -> bool {
        self == Locale::Spanish
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Fully validated analysis result handed to the document mutator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub role: String,
    pub company: String,
    pub track: Track,
    /// Always in (0, 1].
    pub confidence: f64,
    /// Order matters: the leading keywords are the ones inlined into the template.
    pub keywords: Vec<String>,
    pub ats_text: String,
    pub locale: Locale,
}

impl Recommendation {
    /// The first `limit` keywords, never more than [`MAX_INLINE_KEYWORDS`].
    pub fn leading_keywords(&self, limit: usize) -> &[String] {
        let n = limit.min(MAX_INLINE_KEYWORDS).min(self.keywords.len());
        &self.keywords[..n]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_parses_case_insensitively() {
        assert_eq!("FAANG".parse::<Track>().unwrap(), Track::Faang);
        assert_eq!(" startup ".parse::<Track>().unwrap(), Track::Startup);
        assert_eq!("gaming".parse::<Track>().unwrap(), Track::Gaming);
    }

    #[test]
    fn test_unknown_track_is_rejected() {
        assert!("Fintech".parse::<Track>().is_err());
        assert!("".parse::<Track>().is_err());
    }

    #[test]
    fn test_track_serde_uses_labels() {
        let track: Track = serde_json::from_str(r#""FAANG""#).unwrap();
        assert_eq!(track, Track::Faang);
        assert_eq!(serde_json::to_string(&Track::Climate).unwrap(), r#""Climate""#);
    }

    #[test]
    fn test_defaults_are_primary() {
        assert_eq!(Track::default(), Track::Faang);
        assert_eq!(Locale::default(), Locale::English);
        assert!(!Locale::English.is_secondary());
        assert!(Locale::Spanish.is_secondary());
    }

    #[test]
    fn test_leading_keywords_respects_hard_cap() {
        let rec = Recommendation {
            role: "Engineer".to_string(),
            company: UNKNOWN_COMPANY.to_string(),
            track: Track::Faang,
            confidence: DEFAULT_CONFIDENCE,
            keywords: (0..30).map(|i| format!("kw{i}")).collect(),
            ats_text: String::new(),
            locale: Locale::English,
        };
        assert_eq!(rec.leading_keywords(100).len(), MAX_INLINE_KEYWORDS);
        assert_eq!(rec.leading_keywords(3), &rec.keywords[..3]);
    }
}
