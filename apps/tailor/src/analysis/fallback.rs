//! Keyword-only building blocks for the LLM-free analysis path.

use crate::models::recommendation::MAX_INLINE_KEYWORDS;
use crate::models::Track;

/// Slot in a summary template replaced with the leading keywords.
pub const KEYWORDS_SLOT: &str = "{keywords}";

/// Technical vocabulary searched for in the posting. Output keeps this order.
const CANDIDATE_KEYWORDS: &[&str] = &[
    "python",
    "javascript",
    "java",
    "aws",
    "docker",
    "kubernetes",
    "sql",
    "api",
    "react",
    "node",
    "machine learning",
    "data",
    "cloud",
    "microservices",
    "agile",
    "ci/cd",
    "git",
    "rest",
    "backend",
    "frontend",
    "full-stack",
    "database",
    "linux",
];

/// Candidate keywords found in the lower-cased posting, in candidate order, at most `cap`.
pub fn extract_basic_keywords(text: &str, cap: usize) -> Vec<String> {
    let text_lower = text.to_lowercase();
    CANDIDATE_KEYWORDS
        .iter()
        .filter(|kw| text_lower.contains(*kw))
        .take(cap)
        .map(|kw| kw.to_string())
        .collect()
}

/// Built-in summary for a track, used when the configuration supplies none.
pub fn default_summary_template(track: Track) -> &'static str {
    match track {
        Track::Faang => {
            "Experienced software engineer with expertise in large-scale distributed systems. \
             Skilled in {keywords}. Proven track record in delivering scalable solutions for \
             high-traffic applications."
        }
        Track::Startup => {
            "Versatile full-stack developer with startup experience. Proficient in {keywords}. \
             Adaptable team player comfortable with fast-paced environments and rapid iteration."
        }
        Track::Climate => {
            "Data engineer passionate about environmental impact. Expertise in {keywords}. \
             Committed to leveraging technology for sustainability and climate solutions."
        }
        Track::Gaming => {
            "Creative developer with gaming industry experience. Technical skills in {keywords}. \
             Passionate about creating engaging interactive experiences."
        }
    }
}

/// Fills the template's keyword slot with the first keywords joined by ", ".
pub fn render_summary(template: &str, keywords: &[String]) -> String {
    let n = keywords.len().min(MAX_INLINE_KEYWORDS);
    template.replace(KEYWORDS_SLOT, &keywords[..n].join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords_follow_candidate_order() {
        let text = "Kubernetes and AWS experience; Python preferred";
        assert_eq!(
            extract_basic_keywords(text, 20),
            vec!["python", "aws", "kubernetes"]
        );
    }

    #[test]
    fn test_keywords_respect_cap() {
        let text = "python javascript aws docker kubernetes sql";
        let keywords = extract_basic_keywords(text, 3);
        assert_eq!(keywords, vec!["python", "javascript", "java"]);
    }

    #[test]
    fn test_unmentioned_keywords_are_absent() {
        let keywords = extract_basic_keywords("We use AWS", 20);
        assert!(keywords.contains(&"aws".to_string()));
        assert!(!keywords.contains(&"docker".to_string()));
    }

    #[test]
    fn test_summary_inlines_at_most_fifteen_keywords() {
        let keywords: Vec<String> = (0..20).map(|i| format!("k{i}")).collect();
        let summary = render_summary("Skilled in {keywords}.", &keywords);
        assert!(summary.contains("k14"));
        assert!(!summary.contains("k15"));
    }

    #[test]
    fn test_every_track_has_a_keyword_slot() {
        for track in Track::ALL {
            assert!(default_summary_template(track).contains(KEYWORDS_SLOT));
        }
    }
}
