//! Language detection by counting distinctive function/content words.

use crate::models::Locale;

const SPANISH_INDICATORS: &[&str] = &[
    "años",
    "experiencia",
    "trabajo",
    "empresa",
    "equipo",
    "desarrollador",
    "ingeniero",
    "conocimientos",
    "habilidades",
    "requisitos",
    "buscamos",
    "para",
    "con",
    "del",
    "las",
    "los",
    "una",
    "y",
    "en",
    "de",
    "la",
    "el",
    "será",
    "tendrá",
    "debe",
    "nuestro",
    "nuestra",
    "sobre",
    "entre",
    "responsabilidades",
    "ofrecemos",
    "tecnologías",
    "proyectos",
];

const ENGLISH_INDICATORS: &[&str] = &[
    "experience",
    "work",
    "team",
    "developer",
    "engineer",
    "skills",
    "requirements",
    "looking",
    "for",
    "with",
    "the",
    "and",
    "in",
    "of",
    "will",
    "should",
    "our",
    "about",
    "between",
    "responsibilities",
    "offering",
    "technologies",
    "projects",
    "years",
    "company",
];

/// Classifies posting text as Spanish only when strictly more Spanish indicators
/// occur than English ones. Ties and empty text resolve to English.
pub fn detect_locale(text: &str) -> Locale {
    // Collapse all whitespace to single spaces and pad both ends, so every
    // indicator match needs a space on each side.
    let normalized = text.to_lowercase();
    let padded = format!(
        " {} ",
        normalized.split_whitespace().collect::<Vec<_>>().join(" ")
    );

    let spanish = count_indicators(&padded, SPANISH_INDICATORS);
    let english = count_indicators(&padded, ENGLISH_INDICATORS);

    if spanish > english {
        Locale::Spanish
    } else {
        Locale::English
    }
}

fn count_indicators(padded: &str, indicators: &[&str]) -> usize {
    indicators
        .iter()
        .filter(|word| padded.contains(&format!(" {word} ")))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spanish_posting_is_secondary_locale() {
        let text = "Buscamos un desarrollador con experiencia en proyectos de datos";
        assert_eq!(detect_locale(text), Locale::Spanish);
    }

    #[test]
    fn test_english_posting_is_primary_locale() {
        let text = "We are looking for a developer with experience in the cloud";
        assert_eq!(detect_locale(text), Locale::English);
    }

    #[test]
    fn test_tie_resolves_to_primary() {
        // one indicator each: "experiencia" vs "experience"
        assert_eq!(detect_locale("experiencia experience"), Locale::English);
    }

    #[test]
    fn test_empty_text_is_primary() {
        assert_eq!(detect_locale(""), Locale::English);
        assert_eq!(detect_locale("   \n\t "), Locale::English);
    }

    #[test]
    fn test_indicators_inside_longer_words_do_not_count() {
        // "con", "la", "en", "de" appear only as substrings here
        assert_eq!(detect_locale("Kubernetes consolidated delayed"), Locale::English);
    }

    #[test]
    fn test_newlines_count_as_word_boundaries() {
        let text = "requisitos\nexperiencia\nequipo";
        assert_eq!(detect_locale(text), Locale::Spanish);
    }
}
