use std::fmt::Write;

use crate::library::Track;

/// Render the unresolved-track report for manual follow-up.
///
/// Pure so callers can redirect it; `main` prints it to stdout.
pub fn render(unresolved: &[Track]) -> String {
    if unresolved.is_empty() {
        return "Every track was matched on Spotify.\n".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(out, "Unable to find these tracks, try adding manually:");
    for track in unresolved {
        let _ = writeln!(
            out,
            "  {} - {} [{}]",
            track.artist, track.name, track.persistent_id
        );
    }
    out
}

pub fn print(unresolved: &[Track]) {
    print!("{}", render(unresolved));
}
