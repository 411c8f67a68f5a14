//! Track/locale switches in the main template.
//!
//! The flag section starts at the line holding `section_start` and ends at the
//! line holding `section_end`:
//!
//! ```text
//! \newif\ifFAANG          <- section_start (declaration, kept)
//! \newif\ifStartup
//! \newif\ifClimate
//! \newif\ifSpanish
//! \newif\ifGaming         <- insert_after
//! \FAANGtrue              <- activation, inserted by us
//! \Spanishtrue            <- only for Spanish postings
//! \input{setup/preamble.tex}   <- section_end (outside again)
//! ```
//!
//! Every pass first drops all activation lines inside the section, so running
//! the mutation twice gives the same bytes as running it once.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use crate::documents::patch::PatchError;
use crate::models::{Locale, Track};

static ACTIVATION_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*\\[A-Za-z@]+true\b").expect("activation pattern is valid")
});

const DECLARATION_PREFIX: &str = r"\newif";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FlagLayout {
    pub section_start: String,
    pub section_end: String,
    /// Declaration line after which activation lines are inserted.
    pub insert_after: String,
    /// Flag switched on for secondary-locale postings (`\<locale_flag>true`).
    pub locale_flag: String,
}

impl Default for FlagLayout {
    fn default() -> Self {
        Self {
            section_start: r"\newif\ifFAANG".to_string(),
            section_end: r"\input{setup/preamble.tex}".to_string(),
            insert_after: r"\newif\ifGaming".to_string(),
            locale_flag: "Spanish".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Outside,
    Inside,
}

/// Rewrites the flag section so exactly the chosen track (and the locale flag,
/// for secondary-locale postings) is active.
pub fn apply_flags(
    content: &str,
    layout: &FlagLayout,
    track: Track,
    locale: Locale,
) -> Result<String, PatchError> {
    let mut out = String::with_capacity(content.len() + 32);
    let mut section = Section::Outside;
    let mut saw_section = false;
    let mut inserted = false;

    for line in content.split_inclusive('\n') {
        let text = line.trim_end_matches(|c| c == '\r' || c == '\n');

        section = match section {
            Section::Outside if text.contains(&layout.section_start) => {
                saw_section = true;
                Section::Inside
            }
            Section::Inside if text.contains(&layout.section_end) => Section::Outside,
            unchanged => unchanged,
        };

        if section == Section::Inside && is_activation(text) {
            continue;
        }
        out.push_str(line);

        if section == Section::Inside && !inserted && text.contains(&layout.insert_after) {
            let eol = if line.ends_with("\r\n") { "\r\n" } else { "\n" };
            if !line.ends_with('\n') {
                out.push_str(eol);
            }
            push_activation(&mut out, track.label(), eol);
            if locale.is_secondary() {
                push_activation(&mut out, &layout.locale_flag, eol);
            }
            inserted = true;
        }
    }

    if !saw_section {
        return Err(PatchError::AnchorNotFound {
            anchor: layout.section_start.clone(),
        });
    }
    if !inserted {
        return Err(PatchError::AnchorNotFound {
            anchor: layout.insert_after.clone(),
        });
    }
    Ok(out)
}

fn is_activation(text: &str) -> bool {
    !text.trim_start().starts_with(DECLARATION_PREFIX) && ACTIVATION_LINE.is_match(text)
}

fn push_activation(out: &mut String, flag: &str, eol: &str) {
    out.push('\\');
    out.push_str(flag);
    out.push_str("true");
    out.push_str(eol);
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAIN_TEX: &str = "\
\\documentclass{article}
\\newif\\ifFAANG
\\newif\\ifStartup
\\newif\\ifClimate
\\newif\\ifSpanish
\\newif\\ifGaming
\\Startuptrue
\\Spanishtrue
\\input{setup/preamble.tex}
\\begin{document}
\\ifFAANG Big tech\\fi
\\Climatetrue
\\end{document}
";

    fn layout() -> FlagLayout {
        FlagLayout::default()
    }

    #[test]
    fn test_previous_activations_are_replaced() {
        let out = apply_flags(MAIN_TEX, &layout(), Track::Gaming, Locale::English).unwrap();
        assert!(out.contains("\\newif\\ifGaming\n\\Gamingtrue\n\\input{setup/preamble.tex}"));
        assert!(!out.contains("\\Startuptrue"));
        assert!(!out.contains("\\Spanishtrue"));
    }

    #[test]
    fn test_declarations_are_preserved_verbatim() {
        let out = apply_flags(MAIN_TEX, &layout(), Track::Faang, Locale::English).unwrap();
        for decl in ["FAANG", "Startup", "Climate", "Spanish", "Gaming"] {
            assert!(out.contains(&format!("\\newif\\if{decl}\n")));
        }
    }

    #[test]
    fn test_lines_outside_section_are_untouched() {
        let out = apply_flags(MAIN_TEX, &layout(), Track::Faang, Locale::English).unwrap();
        assert!(out.starts_with("\\documentclass{article}\n"));
        // activation after the section end belongs to the document body
        assert!(out.contains("\\Climatetrue\n\\end{document}\n"));
    }

    #[test]
    fn test_secondary_locale_adds_locale_flag_after_track() {
        let out = apply_flags(MAIN_TEX, &layout(), Track::Climate, Locale::Spanish).unwrap();
        assert!(out.contains("\\newif\\ifGaming\n\\Climatetrue\n\\Spanishtrue\n\\input{"));
    }

    #[test]
    fn test_running_twice_is_idempotent() {
        let once = apply_flags(MAIN_TEX, &layout(), Track::Startup, Locale::Spanish).unwrap();
        let twice = apply_flags(&once, &layout(), Track::Startup, Locale::Spanish).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_switching_tracks_leaves_single_activation() {
        let first = apply_flags(MAIN_TEX, &layout(), Track::Gaming, Locale::Spanish).unwrap();
        let second = apply_flags(&first, &layout(), Track::Faang, Locale::English).unwrap();
        let section: Vec<&str> = second
            .lines()
            .skip_while(|l| !l.contains("\\newif\\ifFAANG"))
            .take_while(|l| !l.contains("\\input{setup/preamble.tex}"))
            .filter(|l| l.ends_with("true"))
            .collect();
        assert_eq!(section, vec!["\\FAANGtrue"]);
    }

    #[test]
    fn test_missing_insert_anchor_fails() {
        let content = MAIN_TEX.replace("\\newif\\ifGaming\n", "");
        let err = apply_flags(&content, &layout(), Track::Faang, Locale::English).unwrap_err();
        assert!(matches!(err, PatchError::AnchorNotFound { anchor } if anchor == "\\newif\\ifGaming"));
    }

    #[test]
    fn test_missing_section_start_fails() {
        let content = MAIN_TEX.replace("\\newif\\ifFAANG\n", "");
        let err = apply_flags(&content, &layout(), Track::Faang, Locale::English).unwrap_err();
        assert!(matches!(err, PatchError::AnchorNotFound { anchor } if anchor == "\\newif\\ifFAANG"));
    }

    #[test]
    fn test_crlf_line_endings_are_kept() {
        let content = MAIN_TEX.replace('\n', "\r\n");
        let out = apply_flags(&content, &layout(), Track::Faang, Locale::Spanish).unwrap();
        assert!(out.contains("\\newif\\ifGaming\r\n\\FAANGtrue\r\n\\Spanishtrue\r\n"));
        let again = apply_flags(&out, &layout(), Track::Faang, Locale::Spanish).unwrap();
        assert_eq!(out, again);
    }

    #[test]
    fn test_anchor_on_last_line_without_newline() {
        let content = "\\newif\\ifFAANG\n\\newif\\ifGaming";
        let once = apply_flags(content, &layout(), Track::Faang, Locale::English).unwrap();
        assert_eq!(once, "\\newif\\ifFAANG\n\\newif\\ifGaming\n\\FAANGtrue\n");
        let twice = apply_flags(&once, &layout(), Track::Faang, Locale::English).unwrap();
        assert_eq!(once, twice);
    }
}
