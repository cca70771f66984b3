use color_eyre::eyre::Result;

/// Decoupled representation of the Spotify user profile.
#[derive(Debug, Clone)]
pub struct SpotifyApiUser {
    pub id: String,
    pub display_name: Option<String>,
}

/// Decoupled representation of a Spotify playlist from the API.
#[derive(Debug, Clone)]
pub struct SpotifyApiPlaylist {
    pub id: String,
    pub name: String,
}

/// Decoupled representation of a Spotify track from the API.
#[derive(Debug, Clone)]
pub struct SpotifyApiTrack {
    pub id: String,
    pub name: String,
    pub artists: Vec<String>,
}

/// Port trait wrapping the Spotify API capabilities used by the migration.
///
/// Implementations live in `services::spotify::client` (production) or test
/// mocks. Batch limits are enforced by the caller: `save_tracks` accepts at
/// most 50 ids per call, `add_tracks_to_playlist` at most 100.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait SpotifyApi: Send + Sync {
    /// Fetch the profile of the user the access token belongs to.
    async fn current_user(&self) -> Result<SpotifyApiUser>;
    /// List every playlist on the user's account.
    async fn current_user_playlists(&self) -> Result<Vec<SpotifyApiPlaylist>>;
    async fn unfollow_playlist(&self, playlist_id: &str) -> Result<()>;
    /// Search the catalog for tracks, best match first.
    async fn search_track(&self, query: &str) -> Result<Vec<SpotifyApiTrack>>;
    /// Save tracks to the user's library.
    async fn save_tracks(&self, track_ids: &[String]) -> Result<()>;
    async fn create_playlist(
        &self,
        user_id: &str,
        name: &str,
        public: bool,
    ) -> Result<SpotifyApiPlaylist>;
    async fn add_tracks_to_playlist(&self, playlist_id: &str, track_ids: &[String]) -> Result<()>;
}
