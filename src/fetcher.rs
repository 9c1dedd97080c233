use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::config::Config;

const USER_AGENT: &str = "NewsHub/1.0 (News Aggregator)";

/// Errors from a single category fetch.
///
/// The coordinator decides retry-or-skip policy; the client only classifies.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level failure, including the per-request timeout.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// The feed answered with a non-success status code.
    #[error("feed returned HTTP {status}")]
    Upstream { status: u16 },
    /// The body was not the expected JSON payload.
    #[error("malformed feed response: {0}")]
    MalformedResponse(String),
}

/// One article as the feed delivers it. Every field is untrusted and
/// optional at the wire level; the normalizer decides what is usable.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawArticle {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub url_to_image: Option<String>,
    #[serde(default)]
    pub source: Option<RawSource>,
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSource {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FeedPayload {
    articles: Vec<RawArticle>,
}

pub struct FeedClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    country: String,
    page_size: u32,
}

impl FeedClient {
    pub fn new(config: &Config) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.fetch_timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            country: config.country.clone(),
            page_size: config.page_size,
        }
    }

    /// Fetch one category's batch. Exactly one outbound call; the feed's
    /// own page-size cap governs volume.
    pub async fn fetch_category(&self, category: &str) -> Result<Vec<RawArticle>, FetchError> {
        let page_size = self.page_size.to_string();
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("apiKey", self.api_key.as_str()),
                ("country", self.country.as_str()),
                ("pageSize", page_size.as_str()),
                ("category", category),
            ])
            .header("X-Api-Key", &self.api_key)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(FetchError::Upstream {
                status: status.as_u16(),
            });
        }

        let payload: FeedPayload = serde_json::from_str(&body)
            .map_err(|e| FetchError::MalformedResponse(e.to_string()))?;

        debug!(
            category = category,
            articles = payload.articles.len(),
            "fetched category batch"
        );
        Ok(payload.articles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(endpoint: String) -> Config {
        Config::from_str(&format!(
            r#"
            api_key = "test-key"
            endpoint = "{}"
            country = "us"
            page_size = 20
            "#,
            endpoint
        ))
        .unwrap()
    }

    fn article_json(title: &str, url: &str) -> serde_json::Value {
        serde_json::json!({
            "title": title,
            "description": "A description",
            "url": url,
            "urlToImage": "https://img.example.com/a.jpg",
            "source": { "id": null, "name": "Example Wire" },
            "publishedAt": "2024-12-09T12:00:00Z"
        })
    }

    #[tokio::test]
    async fn test_fetch_category_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/top-headlines"))
            .and(query_param("category", "science"))
            .and(query_param("apiKey", "test-key"))
            .and(query_param("country", "us"))
            .and(query_param("pageSize", "20"))
            .and(header("X-Api-Key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "ok",
                "totalResults": 1,
                "articles": [article_json("Probe Reaches Europa", "https://example.com/europa")]
            })))
            .mount(&server)
            .await;

        let config = test_config(format!("{}/v2/top-headlines", server.uri()));
        let client = FeedClient::new(&config);
        let articles = client.fetch_category("science").await.unwrap();

        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].title.as_deref(), Some("Probe Reaches Europa"));
        assert_eq!(
            articles[0].source.as_ref().unwrap().name.as_deref(),
            Some("Example Wire")
        );
        assert_eq!(
            articles[0].published_at.as_deref(),
            Some("2024-12-09T12:00:00Z")
        );
    }

    #[tokio::test]
    async fn test_fetch_category_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string("upstream broke"))
            .mount(&server)
            .await;

        let config = test_config(server.uri());
        let client = FeedClient::new(&config);
        let err = client.fetch_category("sports").await.unwrap_err();

        assert!(matches!(err, FetchError::Upstream { status: 500 }));
    }

    #[tokio::test]
    async fn test_fetch_category_rate_limited_is_upstream() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let config = test_config(server.uri());
        let client = FeedClient::new(&config);
        let err = client.fetch_category("sports").await.unwrap_err();

        assert!(matches!(err, FetchError::Upstream { status: 429 }));
    }

    #[tokio::test]
    async fn test_fetch_category_invalid_json() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
            .mount(&server)
            .await;

        let config = test_config(server.uri());
        let client = FeedClient::new(&config);
        let err = client.fetch_category("health").await.unwrap_err();

        assert!(matches!(err, FetchError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_fetch_category_missing_articles_field() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "status": "ok", "totalResults": 0 })),
            )
            .mount(&server)
            .await;

        let config = test_config(server.uri());
        let client = FeedClient::new(&config);
        let err = client.fetch_category("business").await.unwrap_err();

        assert!(matches!(err, FetchError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_fetch_category_transport_error() {
        // Nothing listens on this port.
        let config = test_config("http://127.0.0.1:9".to_string());
        let client = FeedClient::new(&config);
        let err = client.fetch_category("general").await.unwrap_err();

        assert!(matches!(err, FetchError::Transport(_)));
    }

    #[test]
    fn test_raw_article_tolerates_missing_fields() {
        let raw: RawArticle = serde_json::from_str(r#"{ "title": "Only a title" }"#).unwrap();
        assert_eq!(raw.title.as_deref(), Some("Only a title"));
        assert!(raw.url.is_none());
        assert!(raw.source.is_none());
        assert!(raw.category.is_none());
    }

    #[test]
    fn test_raw_article_null_fields() {
        let raw: RawArticle = serde_json::from_str(
            r#"{ "title": null, "url": "https://example.com/a", "source": { "name": null } }"#,
        )
        .unwrap();
        assert!(raw.title.is_none());
        assert_eq!(raw.url.as_deref(), Some("https://example.com/a"));
        assert!(raw.source.as_ref().unwrap().name.is_none());
    }
}
