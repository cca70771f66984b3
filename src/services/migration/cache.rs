use std::collections::HashMap;

/// Per-run cache of resolved tracks, keyed by the library's persistent id.
///
/// A persistent id never remaps within a run: the first stored Spotify id
/// wins. No eviction; the cache lives for one migration and is dropped.
#[derive(Debug, Default)]
pub struct TrackCache {
    entries: HashMap<String, String>,
}

impl TrackCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&self, persistent_id: &str) -> Option<&str> {
        self.entries.get(persistent_id).map(String::as_str)
    }

    pub fn store(&mut self, persistent_id: String, spotify_track_id: String) {
        self.entries.entry(persistent_id).or_insert(spotify_track_id);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
