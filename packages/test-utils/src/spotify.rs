//! Wiremock double for the Spotify-shaped metadata provider.

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub struct MockSpotifyServer {
    server: MockServer,
}

impl MockSpotifyServer {
    pub async fn start() -> Self {
        Self { server: MockServer::start().await }
    }

    pub fn url(&self) -> String {
        self.server.uri()
    }

    /// Mocks the client-credentials token exchange at `/api/token`.
    pub async fn mock_token_exchange(&self) {
        Mock::given(method("POST"))
            .and(path("/api/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "mock-access-token",
                "token_type": "Bearer",
                "expires_in": 3600,
            })))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_search_artists(&self, query: &str, artists: &[(&str, &str)]) {
        let items: Vec<_> = artists
            .iter()
            .map(|(id, name)| {
                json!({
                    "id": id,
                    "name": name,
                    "genres": ["alternative"],
                    "images": [{"url": format!("https://img.example/{id}.jpg")}],
                    "popularity": 70,
                    "followers": {"total": 500000},
                })
            })
            .collect();
        Mock::given(method("GET"))
            .and(path("/v1/search"))
            .and(wiremock::matchers::query_param("q", query))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "artists": {"items": items}
            })))
            .mount(&self.server)
            .await;
    }

    /// Mocks `GET /v1/artists/{id}/albums`, a single page with no
    /// continuation (`next: null`), matching the default discography groups.
    pub async fn mock_artist_albums(&self, artist_id: &str, albums: &[(&str, &str)]) {
        let items: Vec<_> = albums
            .iter()
            .map(|(id, name)| {
                json!({
                    "id": id,
                    "name": name,
                    "release_date": "2020-01-01",
                    "total_tracks": 1,
                    "images": [{"url": format!("https://img.example/{id}.jpg")}],
                    "label": "Mock Records",
                })
            })
            .collect();
        Mock::given(method("GET"))
            .and(path(format!("/v1/artists/{artist_id}/albums")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": items,
                "next": null,
            })))
            .mount(&self.server)
            .await;
    }

    /// Mocks `GET /v1/albums/{id}/tracks`, a single page with no
    /// continuation.
    pub async fn mock_album_tracks(&self, album_id: &str, tracks: &[(&str, &str)]) {
        let items: Vec<_> = tracks
            .iter()
            .map(|(id, name)| {
                json!({
                    "id": id,
                    "name": name,
                    "duration_ms": 200_000,
                    "popularity": 50,
                })
            })
            .collect();
        Mock::given(method("GET"))
            .and(path(format!("/v1/albums/{album_id}/tracks")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": items,
                "next": null,
            })))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_get_artist(&self, artist_id: &str, name: &str) {
        Mock::given(method("GET"))
            .and(path(format!("/v1/artists/{artist_id}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": artist_id,
                "name": name,
                "genres": ["alternative"],
                "images": [{"url": "https://img.example/a.jpg"}],
                "popularity": 70,
                "followers": {"total": 500000},
            })))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_not_found(&self, path_suffix: &str) {
        Mock::given(method("GET"))
            .and(path(path_suffix.to_string()))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error": {"status": 404, "message": "not found"}
            })))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_quota_exceeded(&self, path_suffix: &str) {
        Mock::given(method("GET"))
            .and(path(path_suffix.to_string()))
            .respond_with(
                ResponseTemplate::new(429)
                    .insert_header("Retry-After", "2")
                    .set_body_json(json!({"error": {"status": 429, "message": "rate limited"}})),
            )
            .mount(&self.server)
            .await;
    }
}
