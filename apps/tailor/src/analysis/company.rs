//! Best-effort company name recovery from email addresses and URLs in a posting.

use std::sync::LazyLock;

use regex::Regex;

static EMAIL_DOMAIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\w.-]+@([\w.-]+\.\w+)").expect("email pattern is valid")
});

static URL_HOST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"https?://(?:www\.)?([\w-]+)\.").expect("url pattern is valid")
});

/// Consumer mail providers that say nothing about the hiring company.
const GENERIC_PROVIDERS: &[&str] = &["gmail", "yahoo", "hotmail", "outlook", "mail"];

/// Returns the capitalized first domain label of the first usable email address,
/// else of the first usable URL, else an empty string.
pub fn extract_company(text: &str) -> String {
    let lower = text.to_lowercase();

    let from_email = EMAIL_DOMAIN
        .captures_iter(&lower)
        .filter_map(|caps| caps.get(1))
        .filter_map(|domain| domain.as_str().split('.').next())
        .find(|label| is_usable(label));

    let label = from_email.or_else(|| {
        URL_HOST
            .captures_iter(&lower)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str())
            .find(|label| is_usable(label))
    });

    label.map(capitalize).unwrap_or_default()
}

fn is_usable(label: &str) -> bool {
    !label.is_empty() && !GENERIC_PROVIDERS.contains(&label)
}

fn capitalize(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
