pub mod parser;

/// A single track from the exported library.
///
/// Identity is `persistent_id`; two values carrying the same persistent id
/// refer to the same logical track, even when one comes from the top-level
/// track listing and the other from a playlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub persistent_id: String,
    pub artist: String,
    pub name: String,
    pub album: Option<String>,
}

/// A playlist from the exported library. Items are denormalized copies of
/// the referenced tracks, in playlist order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Playlist {
    pub name: String,
    pub items: Vec<Track>,
}

/// The parsed library: all tracks and playlists in document order.
/// Built once per run and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Library {
    pub tracks: Vec<Track>,
    pub playlists: Vec<Playlist>,
}
