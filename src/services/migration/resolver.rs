use std::sync::Arc;

use color_eyre::eyre::Report;

use crate::library::Track;
use crate::ports::spotify::SpotifyApi;
use crate::services::migration::cache::TrackCache;

/// Outcome of resolving one local track against the Spotify catalog.
#[derive(Debug)]
pub enum Resolution {
    /// The Spotify track id the local track maps to.
    Found(String),
    /// The search ran but returned no candidates.
    NotFound,
    /// The search itself failed (transport, rate limit after retries, ...).
    Failed(Report),
}

/// Maps local tracks to Spotify track ids via cache-then-search.
///
/// The first search result wins; ranking authority stays with the catalog.
/// Failed searches are not retried here, so a failure surfaces as one
/// unresolved track and the run moves on.
pub struct TrackResolver<C: SpotifyApi> {
    client: Arc<C>,
    cache: TrackCache,
}

impl<C: SpotifyApi> TrackResolver<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self {
            client,
            cache: TrackCache::new(),
        }
    }

    pub async fn resolve(&mut self, track: &Track) -> Resolution {
        if let Some(spotify_id) = self.cache.lookup(&track.persistent_id) {
            return Resolution::Found(spotify_id.to_string());
        }

        let query = format!("{} {}", track.artist, track.name);
        let results = match self.client.search_track(&query).await {
            Ok(results) => results,
            Err(err) => return Resolution::Failed(err),
        };

        match results.into_iter().next() {
            Some(hit) => {
                self.cache
                    .store(track.persistent_id.clone(), hit.id.clone());
                Resolution::Found(hit.id)
            }
            None => Resolution::NotFound,
        }
    }
}
