//! Wiremock double for the YouTube-shaped video search provider.

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub struct MockYoutubeServer {
    server: MockServer,
}

impl MockYoutubeServer {
    pub async fn start() -> Self {
        Self { server: MockServer::start().await }
    }

    pub fn url(&self) -> String {
        self.server.uri()
    }

    pub async fn mock_search(&self, query: &str, videos: &[(&str, &str, &str)]) {
        let items: Vec<_> = videos
            .iter()
            .map(|(id, title, channel)| {
                json!({
                    "id": {"videoId": id},
                    "snippet": {"title": title, "channelTitle": channel},
                })
            })
            .collect();
        Mock::given(method("GET"))
            .and(path("/youtube/v3/search"))
            .and(wiremock::matchers::query_param("q", query))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": items})))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_quota_exceeded(&self) {
        Mock::given(method("GET"))
            .and(path("/youtube/v3/search"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "error": {
                    "code": 403,
                    "errors": [{"reason": "quotaExceeded"}],
                }
            })))
            .mount(&self.server)
            .await;
    }
}
