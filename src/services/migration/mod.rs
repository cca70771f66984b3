pub mod cache;
pub mod resolver;

use std::sync::Arc;

use color_eyre::eyre::{Result, WrapErr};

use crate::library::{Library, Playlist, Track};
use crate::ports::spotify::{SpotifyApi, SpotifyApiUser};
use crate::services::migration::resolver::{Resolution, TrackResolver};

/// Maximum batch size of the save-to-library endpoint.
pub const SAVED_TRACKS_CHUNK_SIZE: usize = 50;
/// Maximum batch size of the add-to-playlist endpoint.
pub const PLAYLIST_ADD_CHUNK_SIZE: usize = 100;

/// Everything the run could not migrate, for manual follow-up.
///
/// Entries are in processing order and never deduplicated: a track that
/// failed both directly and through a playlist appears twice.
#[derive(Debug, Default)]
pub struct MigrationReport {
    pub unresolved: Vec<Track>,
}

/// Drives a full library migration against the Spotify API.
///
/// The credential check is the only fatal step; every later failure is
/// logged and the run moves on to the next independent unit of work, so one
/// bad playlist or chunk cannot wipe out the rest of the migration.
pub struct LibraryMigrator<C: SpotifyApi> {
    client: Arc<C>,
    resolver: TrackResolver<C>,
}

impl<C: SpotifyApi> LibraryMigrator<C> {
    pub fn new(client: C) -> Self {
        let client = Arc::new(client);
        Self {
            resolver: TrackResolver::new(Arc::clone(&client)),
            client,
        }
    }

    pub async fn run(mut self, library: &Library) -> Result<MigrationReport> {
        let user = self
            .client
            .current_user()
            .await
            .wrap_err("Spotify rejected the supplied access token")?;
        tracing::info!(
            user_id = %user.id,
            display_name = user.display_name.as_deref().unwrap_or_default(),
            "Logged in to Spotify"
        );

        self.clear_remote_playlists().await;

        let mut unresolved = self.save_library_tracks(&library.tracks).await;
        unresolved.extend(self.recreate_playlists(&user, &library.playlists).await);

        Ok(MigrationReport { unresolved })
    }

    /// Unfollow every playlist currently on the account.
    async fn clear_remote_playlists(&self) {
        let playlists = match self.client.current_user_playlists().await {
            Ok(playlists) => playlists,
            Err(err) => {
                tracing::error!(error = %err, "Unable to list existing playlists, skipping cleanup");
                return;
            }
        };

        tracing::info!(count = playlists.len(), "Clearing existing playlists");
        for playlist in playlists {
            if let Err(err) = self.client.unfollow_playlist(&playlist.id).await {
                tracing::error!(playlist = %playlist.name, error = %err, "Unable to unfollow playlist");
            }
        }
    }

    /// Resolve every library track, then save the matches in chunks.
    /// Returns the tracks that could not be resolved.
    async fn save_library_tracks(&mut self, tracks: &[Track]) -> Vec<Track> {
        tracing::info!(count = tracks.len(), "Searching Spotify for equivalent tracks");

        let mut resolved = Vec::new();
        let mut unresolved = Vec::new();
        for track in tracks {
            match self.resolver.resolve(track).await {
                Resolution::Found(spotify_id) => resolved.push(spotify_id),
                Resolution::NotFound => {
                    tracing::warn!(artist = %track.artist, name = %track.name, "No Spotify match for track");
                    unresolved.push(track.clone());
                }
                Resolution::Failed(err) => {
                    tracing::error!(artist = %track.artist, name = %track.name, error = %err, "Track search failed");
                    unresolved.push(track.clone());
                }
            }
        }

        for chunk in resolved.chunks(SAVED_TRACKS_CHUNK_SIZE) {
            tracing::info!(count = chunk.len(), "Adding tracks to the Spotify library");
            if let Err(err) = self.client.save_tracks(chunk).await {
                tracing::error!(error = %err, "Unable to add tracks to library");
            }
        }

        unresolved
    }

    /// Recreate each playlist and fill it chunk by chunk. Returns the
    /// playlist items that could not be resolved.
    async fn recreate_playlists(
        &mut self,
        user: &SpotifyApiUser,
        playlists: &[Playlist],
    ) -> Vec<Track> {
        tracing::info!(count = playlists.len(), "Recreating playlists");

        let mut unresolved = Vec::new();
        for playlist in playlists {
            let remote = match self
                .client
                .create_playlist(&user.id, &playlist.name, false)
                .await
            {
                Ok(remote) => remote,
                Err(err) => {
                    tracing::error!(playlist = %playlist.name, error = %err, "Unable to create playlist");
                    continue;
                }
            };
            tracing::info!(playlist = %remote.name, playlist_id = %remote.id, "Created playlist");

            for chunk in playlist.items.chunks(PLAYLIST_ADD_CHUNK_SIZE) {
                let mut spotify_ids = Vec::with_capacity(chunk.len());
                for item in chunk {
                    match self.resolver.resolve(item).await {
                        Resolution::Found(spotify_id) => spotify_ids.push(spotify_id),
                        Resolution::NotFound => {
                            tracing::warn!(artist = %item.artist, name = %item.name, "No Spotify match for playlist item");
                            unresolved.push(item.clone());
                        }
                        Resolution::Failed(err) => {
                            tracing::error!(artist = %item.artist, name = %item.name, error = %err, "Playlist item search failed");
                            unresolved.push(item.clone());
                        }
                    }
                }

                if spotify_ids.is_empty() {
                    continue;
                }
                tracing::info!(count = spotify_ids.len(), playlist = %remote.name, "Adding tracks to playlist");
                if let Err(err) = self
                    .client
                    .add_tracks_to_playlist(&remote.id, &spotify_ids)
                    .await
                {
                    tracing::error!(playlist = %remote.name, error = %err, "Unable to add tracks to playlist");
                }
            }
        }

        unresolved
    }
}
