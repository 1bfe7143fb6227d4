use crate::model::LookupResult;
use crate::navigation::encode_component;
use crate::render::{RenderConfig, RenderedPage, render};
use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Path layout of the lookup service.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
pub enum ApiRoute {
    /// `/api/<word>`
    #[default]
    Word,
    /// `/api/define/<word>`
    Define,
}

impl ApiRoute {
    fn prefix(&self) -> &'static str {
        match self {
            ApiRoute::Word => "/api/",
            ApiRoute::Define => "/api/define/",
        }
    }
}

impl fmt::Display for ApiRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiRoute::Word => write!(f, "word"),
            ApiRoute::Define => write!(f, "define"),
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ParseRouteError(String);

impl fmt::Display for ParseRouteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown api route {:?} (expected word or define)", self.0)
    }
}

impl std::error::Error for ParseRouteError {}

impl FromStr for ApiRoute {
    type Err = ParseRouteError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "word" | "api" => Ok(ApiRoute::Word),
            "define" => Ok(ApiRoute::Define),
            _ => Err(ParseRouteError(value.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub route: ApiRoute,
    /// Unset means wait for the upstream indefinitely.
    pub timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            route: ApiRoute::default(),
            timeout: None,
        }
    }
}

#[derive(Debug)]
pub enum FetchError {
    Transport(reqwest::Error),
    Status(u16),
    Decode(serde_json::Error),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Transport(err) => write!(f, "lookup request failed: {err}"),
            FetchError::Status(status) => write!(f, "lookup service answered {status}"),
            FetchError::Decode(err) => write!(f, "lookup response is not valid JSON: {err}"),
        }
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FetchError::Transport(err) => Some(err),
            FetchError::Status(_) => None,
            FetchError::Decode(err) => Some(err),
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(value: reqwest::Error) -> Self {
        FetchError::Transport(value)
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(value: serde_json::Error) -> Self {
        FetchError::Decode(value)
    }
}

#[derive(Debug, Clone)]
pub struct LookupClient {
    http: reqwest::Client,
    base_url: String,
    route: ApiRoute,
}

impl LookupClient {
    pub fn new(config: ClientConfig) -> Result<Self, FetchError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            route: config.route,
        })
    }

    pub fn lookup_url(&self, word: &str) -> String {
        format!(
            "{}{}{}",
            self.base_url,
            self.route.prefix(),
            encode_component(word.trim())
        )
    }

    /// Fetches the lookup result for `word`. A 404 is an empty result.
    pub async fn fetch(&self, word: &str) -> Result<LookupResult, FetchError> {
        let url = self.lookup_url(word);
        let started = Instant::now();
        let response = self.http.get(&url).send().await?;
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            debug!(%url, "lookup service has no entry");
            return Ok(LookupResult::default());
        }
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        let body = response.bytes().await?;
        let result = serde_json::from_slice(&body)?;
        debug!(
            %url,
            bytes = body.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "fetched lookup result"
        );
        Ok(result)
    }

    /// Fetches and renders `word`; transport failures become the unavailable page.
    pub async fn render_word(&self, word: &str, config: &RenderConfig) -> RenderedPage {
        match self.fetch(word).await {
            Ok(result) => render(&result, config),
            Err(err) => {
                warn!(word, error = %err, "lookup fetch failed");
                RenderedPage::unavailable(err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SourceId;
    use axum::{Router, extract::Path, http::StatusCode, routing::get};
    use std::net::SocketAddr;

    async fn upstream() -> SocketAddr {
        async fn word(Path(word): Path<String>) -> (StatusCode, String) {
            match word.as_str() {
                "dog" => (
                    StatusCode::OK,
                    r#"{"vocab_defs":[{"part_of_speech":"noun","meaning":"a%20pet","examples":[]}],"sources":["Test Dict"]}"#
                        .to_string(),
                ),
                "ice cream" => (
                    StatusCode::OK,
                    r#"{"wikiDefs":[{"partOfSpeech":"noun","meaning":"cold"}]}"#.to_string(),
                ),
                "broken" => (StatusCode::OK, "<html>oops".to_string()),
                "boom" => (StatusCode::INTERNAL_SERVER_ERROR, String::new()),
                _ => (StatusCode::NOT_FOUND, "{}".to_string()),
            }
        }
        let router = Router::new()
            .route("/api/:word", get(word))
            .route("/api/define/:word", get(word));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        addr
    }

    fn client(addr: SocketAddr, route: ApiRoute) -> LookupClient {
        LookupClient::new(ClientConfig {
            base_url: format!("http://{addr}/"),
            route,
            timeout: Some(Duration::from_secs(5)),
        })
        .unwrap()
    }

    #[test]
    fn lookup_url_follows_route() {
        let word = LookupClient::new(ClientConfig {
            base_url: "http://dict.test/".into(),
            ..ClientConfig::default()
        })
        .unwrap();
        assert_eq!(word.lookup_url("ice cream"), "http://dict.test/api/ice%20cream");
        let define = LookupClient::new(ClientConfig {
            base_url: "http://dict.test".into(),
            route: ApiRoute::Define,
            timeout: None,
        })
        .unwrap();
        assert_eq!(define.lookup_url(" dog "), "http://dict.test/api/define/dog");
    }

    #[test]
    fn routes_parse() {
        assert_eq!("define".parse::<ApiRoute>(), Ok(ApiRoute::Define));
        assert_eq!("WORD".parse::<ApiRoute>(), Ok(ApiRoute::Word));
        assert!("v2".parse::<ApiRoute>().is_err());
    }

    #[tokio::test]
    async fn fetches_and_parses_results() {
        let addr = upstream().await;
        for route in [ApiRoute::Word, ApiRoute::Define] {
            let result = client(addr, route).fetch("dog").await.unwrap();
            assert_eq!(result.definitions(SourceId::Vocabulary).len(), 1);
            assert_eq!(result.sources(), ["Test Dict".to_string()]);
        }
        let spaced = client(addr, ApiRoute::Word).fetch("ice cream").await.unwrap();
        assert_eq!(spaced.definitions(SourceId::Wiktionary).len(), 1);
    }

    #[tokio::test]
    async fn not_found_is_an_empty_result() {
        let addr = upstream().await;
        let result = client(addr, ApiRoute::Word).fetch("zzzz").await.unwrap();
        assert!(result.is_empty());
        let page = client(addr, ApiRoute::Word)
            .render_word("zzzz", &RenderConfig::default())
            .await;
        assert!(page.is_not_found());
    }

    #[tokio::test]
    async fn failures_are_distinguished() {
        let addr = upstream().await;
        let client = client(addr, ApiRoute::Word);
        assert!(matches!(
            client.fetch("boom").await,
            Err(FetchError::Status(500))
        ));
        assert!(matches!(
            client.fetch("broken").await,
            Err(FetchError::Decode(_))
        ));
        let page = client.render_word("boom", &RenderConfig::default()).await;
        assert!(matches!(page, RenderedPage::Unavailable { .. }));
    }

    #[tokio::test]
    async fn connection_errors_are_transport_failures() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let result = client(addr, ApiRoute::Word).fetch("dog").await;
        assert!(matches!(result, Err(FetchError::Transport(_))));
    }

    #[tokio::test]
    async fn render_word_decodes_text() {
        let addr = upstream().await;
        let page = client(addr, ApiRoute::Word)
            .render_word("dog", &RenderConfig::default())
            .await;
        assert!(page.to_html().contains("a pet"));
    }
}
