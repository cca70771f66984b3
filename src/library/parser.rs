use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;

use plist::Value;
use plist::stream::{Event, Reader};
use serde::Deserialize;

use crate::library::{Library, Playlist, Track};

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("unexpected end of library file")]
    UnexpectedEndOfInput,
    #[error("failed to read library file")]
    Io(#[from] std::io::Error),
    #[error("malformed library file")]
    Malformed(#[from] plist::Error),
}

/// Parse the library export at the given path.
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Library, ParseError> {
    let bytes = std::fs::read(path.as_ref())?;
    parse_bytes(&bytes)
}

/// Parse a library export already held in memory.
///
/// The document is streamed until the first top-level dictionary; anything
/// after that dictionary is ignored. A stream that ends (or holds no
/// dictionary at all) before one is seen yields
/// [`ParseError::UnexpectedEndOfInput`], so callers can tell a truncated
/// export from a corrupt one.
pub fn parse_bytes(bytes: &[u8]) -> Result<Library, ParseError> {
    scan_for_root_dictionary(bytes)?;

    let root = Value::from_reader(Cursor::new(bytes))?;
    let root = root
        .into_dictionary()
        .ok_or(ParseError::UnexpectedEndOfInput)?;

    let mut tracks = Vec::new();
    let mut by_track_id = HashMap::new();
    if let Some(Value::Dictionary(dict)) = root.get("Tracks") {
        for (_key, value) in dict.iter() {
            let record: TrackRecord = plist::from_value(value)?;
            let track = Track {
                persistent_id: record.persistent_id,
                artist: record.artist,
                name: record.name,
                album: record.album,
            };
            if let Some(track_id) = record.track_id {
                by_track_id.insert(track_id, track.clone());
            }
            tracks.push(track);
        }
    }

    let mut playlists = Vec::new();
    if let Some(Value::Array(array)) = root.get("Playlists") {
        for value in array {
            let record: PlaylistRecord = plist::from_value(value)?;
            let mut items = Vec::with_capacity(record.items.len());
            for item in record.items {
                match by_track_id.get(&item.track_id) {
                    Some(track) => items.push(track.clone()),
                    None => tracing::warn!(
                        playlist = %record.name,
                        track_id = item.track_id,
                        "Playlist item references a track missing from the library, skipping"
                    ),
                }
            }
            playlists.push(Playlist {
                name: record.name,
                items,
            });
        }
    }

    Ok(Library { tracks, playlists })
}

/// Walk the event stream until a top-level dictionary opens.
fn scan_for_root_dictionary(bytes: &[u8]) -> Result<(), ParseError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(ParseError::UnexpectedEndOfInput);
    }

    let mut depth = 0usize;
    for event in Reader::new(Cursor::new(bytes)) {
        match event? {
            Event::StartDictionary(_) if depth == 0 => return Ok(()),
            Event::StartDictionary(_) | Event::StartArray(_) => depth += 1,
            Event::EndCollection => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    Err(ParseError::UnexpectedEndOfInput)
}

/// Schema-aware view of one entry in the document's `Tracks` dictionary.
/// Unknown keys are ignored, missing ones default.
#[derive(Debug, Deserialize)]
struct TrackRecord {
    #[serde(rename = "Track ID", default)]
    track_id: Option<u64>,
    #[serde(rename = "Persistent ID", default)]
    persistent_id: String,
    #[serde(rename = "Artist", default)]
    artist: String,
    #[serde(rename = "Name", default)]
    name: String,
    #[serde(rename = "Album", default)]
    album: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlaylistRecord {
    #[serde(rename = "Name", default)]
    name: String,
    #[serde(rename = "Playlist Items", default)]
    items: Vec<PlaylistItemRecord>,
}

#[derive(Debug, Deserialize)]
struct PlaylistItemRecord {
    #[serde(rename = "Track ID")]
    track_id: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn library_xml() -> String {
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
    <key>Major Version</key><integer>1</integer>
    <key>Application Version</key><string>12.9</string>
    <key>Tracks</key>
    <dict>
        <key>1001</key>
        <dict>
            <key>Track ID</key><integer>1001</integer>
            <key>Name</key><string>Song1</string>
            <key>Artist</key><string>A</string>
            <key>Album</key><string>First</string>
            <key>Persistent ID</key><string>id1</string>
            <key>Total Time</key><integer>200000</integer>
        </dict>
        <key>1002</key>
        <dict>
            <key>Track ID</key><integer>1002</integer>
            <key>Name</key><string>Song2</string>
            <key>Artist</key><string>B</string>
            <key>Persistent ID</key><string>id2</string>
        </dict>
    </dict>
    <key>Playlists</key>
    <array>
        <dict>
            <key>Name</key><string>Mix</string>
            <key>Playlist Items</key>
            <array>
                <dict><key>Track ID</key><integer>1002</integer></dict>
                <dict><key>Track ID</key><integer>1001</integer></dict>
            </array>
        </dict>
        <dict>
            <key>Name</key><string>Empty</string>
        </dict>
    </array>
</dict>
</plist>"#
            .to_string()
    }

    #[test]
    fn parses_tracks_and_playlists_in_document_order() {
        let library = parse_bytes(library_xml().as_bytes()).unwrap();

        assert_eq!(library.tracks.len(), 2);
        assert_eq!(library.tracks[0].persistent_id, "id1");
        assert_eq!(library.tracks[0].artist, "A");
        assert_eq!(library.tracks[0].name, "Song1");
        assert_eq!(library.tracks[0].album.as_deref(), Some("First"));
        assert_eq!(library.tracks[1].persistent_id, "id2");
        assert_eq!(library.tracks[1].album, None);

        assert_eq!(library.playlists.len(), 2);
        assert_eq!(library.playlists[0].name, "Mix");
        assert_eq!(library.playlists[1].name, "Empty");
    }

    #[test]
    fn playlist_items_are_denormalized_in_playlist_order() {
        let library = parse_bytes(library_xml().as_bytes()).unwrap();

        let mix = &library.playlists[0];
        assert_eq!(mix.items.len(), 2);
        assert_eq!(mix.items[0].persistent_id, "id2");
        assert_eq!(mix.items[0].artist, "B");
        assert_eq!(mix.items[1].persistent_id, "id1");
        assert!(library.playlists[1].items.is_empty());
    }

    #[test]
    fn playlist_item_with_unknown_track_id_is_skipped() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<plist version="1.0">
<dict>
    <key>Tracks</key>
    <dict>
        <key>1</key>
        <dict>
            <key>Track ID</key><integer>1</integer>
            <key>Name</key><string>Song</string>
            <key>Artist</key><string>A</string>
            <key>Persistent ID</key><string>id1</string>
        </dict>
    </dict>
    <key>Playlists</key>
    <array>
        <dict>
            <key>Name</key><string>Mix</string>
            <key>Playlist Items</key>
            <array>
                <dict><key>Track ID</key><integer>999</integer></dict>
                <dict><key>Track ID</key><integer>1</integer></dict>
            </array>
        </dict>
    </array>
</dict>
</plist>"#;

        let library = parse_bytes(xml.as_bytes()).unwrap();
        assert_eq!(library.playlists[0].items.len(), 1);
        assert_eq!(library.playlists[0].items[0].persistent_id, "id1");
    }

    #[test]
    fn library_without_tracks_or_playlists_parses_empty() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<plist version="1.0">
<dict>
    <key>Major Version</key><integer>1</integer>
</dict>
</plist>"#;

        let library = parse_bytes(xml.as_bytes()).unwrap();
        assert!(library.tracks.is_empty());
        assert!(library.playlists.is_empty());
    }

    #[test]
    fn empty_input_is_unexpected_end_of_input() {
        assert!(matches!(
            parse_bytes(b""),
            Err(ParseError::UnexpectedEndOfInput)
        ));
        assert!(matches!(
            parse_bytes(b"   \n\t"),
            Err(ParseError::UnexpectedEndOfInput)
        ));
    }

    #[test]
    fn document_without_a_dictionary_is_unexpected_end_of_input() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<plist version="1.0"></plist>"#;
        assert!(matches!(
            parse_bytes(xml.as_bytes()),
            Err(ParseError::UnexpectedEndOfInput)
        ));
    }

    #[test]
    fn corrupt_document_after_the_root_dict_is_malformed_not_truncated() {
        // An invalid scalar inside the root dict: the top-level dictionary
        // was seen, so this must not be reported as end-of-input.
        let bad_value = r#"<?xml version="1.0" encoding="UTF-8"?>
<plist version="1.0">
<dict>
    <key>Tracks</key>
    <integer>not-a-number</integer>
</dict>
</plist>"#;
        assert!(matches!(
            parse_bytes(bad_value.as_bytes()),
            Err(ParseError::Malformed(_))
        ));

        // Mismatched closing tag past the root dict.
        let bad_markup = r#"<?xml version="1.0" encoding="UTF-8"?>
<plist version="1.0">
<dict>
    <key>Major Version</key><string>1</integer>
</dict>
</plist>"#;
        assert!(matches!(
            parse_bytes(bad_markup.as_bytes()),
            Err(ParseError::Malformed(_))
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let result = parse_file("/definitely/not/a/real/Library.xml");
        assert!(matches!(result, Err(ParseError::Io(_))));
    }

    #[test]
    fn parse_file_reads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(library_xml().as_bytes()).unwrap();

        let library = parse_file(file.path()).unwrap();
        assert_eq!(library.tracks.len(), 2);
        assert_eq!(library.playlists.len(), 2);
    }
}
