//! Interactive track confirmation.
//!
//! Shows the configured tracks with the recommendation starred and reads one
//! line: a number picks that track, `ai` or an empty line keeps the
//! recommendation, anything else keeps it too after a notice.

use std::io::{self, BufRead, Write};

use crate::config::TrackProfile;
use crate::models::Track;

const KEEP_RECOMMENDATION: &str = "ai";

/// Prompts on stdout and reads the answer from stdin.
pub fn prompt_for_track(tracks: &[TrackProfile], recommended: Track) -> io::Result<Track> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    pick_track(&mut stdin.lock(), &mut stdout.lock(), tracks, recommended)
}

pub fn pick_track<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    tracks: &[TrackProfile],
    recommended: Track,
) -> io::Result<Track> {
    if tracks.is_empty() {
        return Ok(recommended);
    }

    writeln!(output, "Available CV tracks:")?;
    for (idx, profile) in tracks.iter().enumerate() {
        let marker = if profile.name == recommended { " *" } else { "" };
        writeln!(
            output,
            "{:>3}) {:<8}{marker}  {}",
            idx + 1,
            profile.name.label(),
            profile.description
        )?;
    }
    writeln!(output, "* = AI recommendation")?;

    let choices: Vec<String> = (1..=tracks.len()).map(|n| n.to_string()).collect();
    write!(
        output,
        "Select track [{}/{KEEP_RECOMMENDATION}] ({KEEP_RECOMMENDATION}): ",
        choices.join("/")
    )?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(recommended);
    }

    let answer = line.trim();
    if answer.is_empty() || answer.eq_ignore_ascii_case(KEEP_RECOMMENDATION) {
        return Ok(recommended);
    }

    match answer.parse::<usize>() {
        Ok(choice) if (1..=tracks.len()).contains(&choice) => Ok(tracks[choice - 1].name),
        _ => {
            writeln!(output, "Invalid choice. Using AI recommendation.")?;
            Ok(recommended)
        }
    }
}
