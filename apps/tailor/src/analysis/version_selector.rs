//! Deterministic track selection by keyword scoring.
//!
//! Used when the LLM is unavailable or names a track outside the fixed set.

use tracing::debug;

use crate::config::TrackProfile;
use crate::models::Track;

/// Scores every configured track by how many of its keywords occur in the text
/// (case-insensitive substring match, one point per keyword).
///
/// The highest score wins; equal scores go to the track declared first.
/// When nothing matches, or no tracks are configured, the default track is returned.
pub fn select_fallback_track(text: &str, tracks: &[TrackProfile]) -> Track {
    let text_lower = text.to_lowercase();
    let mut best: Option<(Track, usize)> = None;

    for profile in tracks {
        let score = profile
            .keywords
            .iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty() && text_lower.contains(k.as_str()))
            .count();
        debug!(track = %profile.name, score, "fallback keyword score");

        match best {
            Some((_, best_score)) if best_score >= score => {}
            _ => best = Some((profile.name, score)),
        }
    }

    match best {
        Some((track, score)) if score > 0 => track,
        _ => Track::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(name: Track, keywords: &[&str]) -> TrackProfile {
        TrackProfile {
            name,
            description: String::new(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            summary_template: None,
        }
    }

    fn tracks() -> Vec<TrackProfile> {
        vec![
            profile(Track::Faang, &["distributed systems", "scale", "aws"]),
            profile(Track::Startup, &["startup", "fast-paced", "mvp"]),
            profile(Track::Climate, &["climate", "carbon"]),
            profile(Track::Gaming, &["unity", "multiplayer"]),
        ]
    }

    #[test]
    fn test_only_startup_keywords_selects_startup() {
        let text = "Early-stage STARTUP building an MVP in a fast-paced team";
        assert_eq!(select_fallback_track(text, &tracks()), Track::Startup);
    }

    #[test]
    fn test_no_keywords_selects_default() {
        let text = "Accountant position, spreadsheets required";
        assert_eq!(select_fallback_track(text, &tracks()), Track::Faang);
    }

    #[test]
    fn test_no_configured_tracks_selects_default() {
        assert_eq!(select_fallback_track("unity multiplayer", &[]), Track::Faang);
    }

    #[test]
    fn test_tie_goes_to_first_declared() {
        let text = "carbon accounting for multiplayer servers";
        // Climate and Gaming both score 1; Climate is declared first.
        assert_eq!(select_fallback_track(text, &tracks()), Track::Climate);

        let mut reversed = tracks();
        reversed.reverse();
        assert_eq!(select_fallback_track(text, &reversed), Track::Gaming);
    }

    #[test]
    fn test_highest_score_wins_regardless_of_order() {
        let text = "Unity developer for multiplayer games at a startup";
        assert_eq!(select_fallback_track(text, &tracks()), Track::Gaming);
    }

    #[test]
    fn test_blank_keywords_do_not_score() {
        let tracks = vec![profile(Track::Gaming, &["", "  "])];
        assert_eq!(select_fallback_track("anything", &tracks), Track::Faang);
    }
}
