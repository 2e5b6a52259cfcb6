//! Wiremock double for the Last.fm-shaped stats/similarity provider.

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub struct MockLastfmServer {
    server: MockServer,
}

impl MockLastfmServer {
    pub async fn start() -> Self {
        Self { server: MockServer::start().await }
    }

    pub fn url(&self) -> String {
        self.server.uri()
    }

    pub async fn mock_similar_artists(&self, artist: &str, similar: &[&str]) {
        let matches: Vec<_> = similar.iter().map(|name| json!({"name": name, "match": "0.8"})).collect();
        Mock::given(method("GET"))
            .and(path("/2.0/"))
            .and(wiremock::matchers::query_param("method", "artist.getsimilar"))
            .and(wiremock::matchers::query_param("artist", artist))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "similarartists": {"artist": matches}
            })))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_top_artists_by_tag(&self, tag: &str, artists: &[&str]) {
        let matches: Vec<_> = artists.iter().map(|name| json!({"name": name})).collect();
        Mock::given(method("GET"))
            .and(path("/2.0/"))
            .and(wiremock::matchers::query_param("method", "tag.gettopartists"))
            .and(wiremock::matchers::query_param("tag", tag))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "topartists": {"artist": matches}
            })))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_track_info_tags(&self, artist: &str, track: &str, tags: &[&str]) {
        let toptags: Vec<_> = tags.iter().map(|name| json!({"name": name})).collect();
        Mock::given(method("GET"))
            .and(path("/2.0/"))
            .and(wiremock::matchers::query_param("method", "track.getinfo"))
            .and(wiremock::matchers::query_param("artist", artist))
            .and(wiremock::matchers::query_param("track", track))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "track": {"toptags": {"tag": toptags}}
            })))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_api_error(&self, error_code: u32, message: &str) {
        Mock::given(method("GET"))
            .and(path("/2.0/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "error": error_code,
                "message": message,
            })))
            .mount(&self.server)
            .await;
    }
}
