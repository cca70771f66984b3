use std::time::Duration;

use color_eyre::Result;
use reqwest::{StatusCode, header};
use serde::Deserialize;

use crate::ports::spotify::{SpotifyApi, SpotifyApiPlaylist, SpotifyApiTrack, SpotifyApiUser};

const API_BASE_URL: &str = "https://api.spotify.com/v1";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Spotify Web API client authenticated with a user access token.
pub struct SpotifyHttpClient {
    access_token: String,
    client: reqwest::Client,
}

impl SpotifyHttpClient {
    pub fn new(access_token: String) -> Self {
        Self {
            access_token,
            client: reqwest::Client::new(),
        }
    }

    /// Send a request, retrying a bounded number of times when Spotify
    /// answers 429 with a Retry-After header.
    async fn send_checked<F>(&self, build: F) -> Result<reqwest::Response>
    where
        F: Fn() -> reqwest::RequestBuilder,
    {
        let mut attempt = 0;
        loop {
            let response = build().send().await?;
            if response.status() == StatusCode::TOO_MANY_REQUESTS
                && attempt < MAX_RATE_LIMIT_RETRIES
            {
                attempt += 1;
                let delay_secs = response
                    .headers()
                    .get(header::RETRY_AFTER)
                    .and_then(|value| value.to_str().ok())
                    .and_then(|value| value.parse::<u64>().ok())
                    .unwrap_or(1);
                tracing::warn!(delay_secs, attempt, "Rate limited by Spotify, backing off");
                tokio::time::sleep(Duration::from_secs(delay_secs)).await;
                continue;
            }
            return Ok(response.error_for_status()?);
        }
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        self.client
            .get(url)
            .bearer_auth(&self.access_token)
            .timeout(REQUEST_TIMEOUT)
    }
}

#[async_trait::async_trait]
impl SpotifyApi for SpotifyHttpClient {
    async fn current_user(&self) -> Result<SpotifyApiUser> {
        let response = self
            .send_checked(|| self.get(&format!("{API_BASE_URL}/me")))
            .await?;

        #[derive(Deserialize)]
        struct UserResponse {
            id: String,
            display_name: Option<String>,
        }

        let user: UserResponse = response.json().await?;
        Ok(SpotifyApiUser {
            id: user.id,
            display_name: user.display_name,
        })
    }

    async fn current_user_playlists(&self) -> Result<Vec<SpotifyApiPlaylist>> {
        let mut all_playlists = Vec::new();
        let mut next_url = Some(format!("{API_BASE_URL}/me/playlists?limit=50"));

        while let Some(url) = next_url {
            let response = self.send_checked(|| self.get(&url)).await?;

            #[derive(Deserialize)]
            struct PlaylistObject {
                id: String,
                name: String,
            }

            #[derive(Deserialize)]
            struct PlaylistsResponse {
                items: Vec<PlaylistObject>,
                next: Option<String>,
            }

            let page: PlaylistsResponse = response.json().await?;
            all_playlists.extend(
                page.items
                    .into_iter()
                    .map(|playlist| SpotifyApiPlaylist {
                        id: playlist.id,
                        name: playlist.name,
                    }),
            );
            next_url = page.next;
        }

        Ok(all_playlists)
    }

    async fn unfollow_playlist(&self, playlist_id: &str) -> Result<()> {
        self.send_checked(|| {
            self.client
                .delete(format!("{API_BASE_URL}/playlists/{playlist_id}/followers"))
                .bearer_auth(&self.access_token)
                .timeout(REQUEST_TIMEOUT)
        })
        .await?;
        Ok(())
    }

    async fn search_track(&self, query: &str) -> Result<Vec<SpotifyApiTrack>> {
        let response = self
            .send_checked(|| {
                self.get(&format!("{API_BASE_URL}/search"))
                    .query(&[("q", query), ("type", "track"), ("limit", "10")])
            })
            .await?;

        #[derive(Deserialize)]
        struct ArtistObject {
            name: String,
        }

        #[derive(Deserialize)]
        struct TrackObject {
            id: String,
            name: String,
            artists: Vec<ArtistObject>,
        }

        #[derive(Deserialize)]
        struct TracksPage {
            items: Vec<TrackObject>,
        }

        #[derive(Deserialize)]
        struct SearchResponse {
            tracks: TracksPage,
        }

        let results: SearchResponse = response.json().await?;
        Ok(results
            .tracks
            .items
            .into_iter()
            .map(|track| SpotifyApiTrack {
                id: track.id,
                name: track.name,
                artists: track.artists.into_iter().map(|artist| artist.name).collect(),
            })
            .collect())
    }

    async fn save_tracks(&self, track_ids: &[String]) -> Result<()> {
        let body = serde_json::json!({ "ids": track_ids });
        self.send_checked(|| {
            self.client
                .put(format!("{API_BASE_URL}/me/tracks"))
                .bearer_auth(&self.access_token)
                .timeout(REQUEST_TIMEOUT)
                .json(&body)
        })
        .await?;
        Ok(())
    }

    async fn create_playlist(
        &self,
        user_id: &str,
        name: &str,
        public: bool,
    ) -> Result<SpotifyApiPlaylist> {
        let body = serde_json::json!({ "name": name, "public": public });
        let response = self
            .send_checked(|| {
                self.client
                    .post(format!("{API_BASE_URL}/users/{user_id}/playlists"))
                    .bearer_auth(&self.access_token)
                    .timeout(REQUEST_TIMEOUT)
                    .json(&body)
            })
            .await?;

        #[derive(Deserialize)]
        struct PlaylistResponse {
            id: String,
            name: String,
        }

        let playlist: PlaylistResponse = response.json().await?;
        Ok(SpotifyApiPlaylist {
            id: playlist.id,
            name: playlist.name,
        })
    }

    async fn add_tracks_to_playlist(&self, playlist_id: &str, track_ids: &[String]) -> Result<()> {
        let uris: Vec<String> = track_ids
            .iter()
            .map(|id| format!("spotify:track:{id}"))
            .collect();
        let body = serde_json::json!({ "uris": uris });
        self.send_checked(|| {
            self.client
                .post(format!("{API_BASE_URL}/playlists/{playlist_id}/tracks"))
                .bearer_auth(&self.access_token)
                .timeout(REQUEST_TIMEOUT)
                .json(&body)
        })
        .await?;
        Ok(())
    }
}
