use crate::client::{ClientConfig, FetchError, LookupClient};
use crate::model::SourceId;
use crate::navigation::define_path;
use crate::page::{definition_document, home_document, missing_document};
use crate::render::{RenderConfig, RenderedPage};
use askama::Html as HtmlEscaper;
use askama::MarkupDisplay;
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
};
use include_dir::{Dir, include_dir};
use serde::Deserialize;
use serde_json::json;
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::compression::CompressionLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{debug, info};

static ASSETS: Dir<'static> = include_dir!("$CARGO_MANIFEST_DIR/assets");

type SharedState = Arc<AppState>;

pub struct AppState {
    pub client: LookupClient,
    pub render: RenderConfig,
}

#[derive(Clone)]
pub struct WebConfig {
    pub addr: SocketAddr,
    pub upstream: ClientConfig,
    pub render: RenderConfig,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            upstream: ClientConfig::default(),
            render: RenderConfig::default(),
        }
    }
}

#[derive(Debug)]
pub enum WebError {
    Io(std::io::Error),
    Client(FetchError),
}

impl fmt::Display for WebError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WebError::Io(err) => write!(f, "io error: {err}"),
            WebError::Client(err) => write!(f, "lookup client error: {err}"),
        }
    }
}

impl std::error::Error for WebError {}

impl From<std::io::Error> for WebError {
    fn from(value: std::io::Error) -> Self {
        WebError::Io(value)
    }
}

impl From<FetchError> for WebError {
    fn from(value: FetchError) -> Self {
        WebError::Client(value)
    }
}

pub async fn serve(config: WebConfig) -> Result<(), WebError> {
    let upstream = config.upstream.base_url.clone();
    let route = config.upstream.route;
    let state = Arc::new(AppState {
        client: LookupClient::new(config.upstream)?,
        render: config.render,
    });
    let router = build_router(state);
    info!(%config.addr, %upstream, %route, "Binding HTTP listener");
    let listener = TcpListener::bind(config.addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("HTTP server exited");
    Ok(())
}

fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/define/:word", get(define_html))
        .route("/search", get(search_redirect))
        .route("/api/render/:word", get(api_render))
        .route("/static/*path", get(static_asset))
        .route("/healthz", get(health))
        .fallback(missing)
        .with_state(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(true))
                .on_response(DefaultOnResponse::new().include_headers(true)),
        )
        .layer(CompressionLayer::new())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = signal::ctrl_c().await;
    };
    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        if let Ok(mut stream) = signal(SignalKind::terminate()) {
            let _ = stream.recv().await;
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

async fn home() -> impl IntoResponse {
    Html(home_document().unwrap_or_else(|err| render_error_page(err.to_string())))
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok", "service": "wordpage-web" }))
}

async fn missing() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Html(missing_document().unwrap_or_else(|err| render_error_page(err.to_string()))),
    )
}

#[derive(Debug, Deserialize)]
struct DefineParams {
    tab: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    q: Option<String>,
}

async fn define_html(
    State(state): State<SharedState>,
    Path(word): Path<String>,
    Query(params): Query<DefineParams>,
) -> impl IntoResponse {
    let page = lookup(&state, &word, params.tab.as_deref()).await;
    let status = page_status(&page);
    let body = definition_document(word.trim(), &page)
        .unwrap_or_else(|err| render_error_page(err.to_string()));
    (status, Html(body))
}

async fn api_render(
    State(state): State<SharedState>,
    Path(word): Path<String>,
    Query(params): Query<DefineParams>,
) -> impl IntoResponse {
    let page = lookup(&state, &word, params.tab.as_deref()).await;
    (page_status(&page), Json(page))
}

async fn search_redirect(Query(params): Query<SearchParams>) -> Redirect {
    let target = params
        .q
        .as_deref()
        .and_then(define_path)
        .unwrap_or_else(|| "/".to_string());
    Redirect::to(&target)
}

async fn static_asset(Path(path): Path<String>) -> Response {
    match ASSETS.get_file(&path) {
        Some(file) => (
            [(header::CONTENT_TYPE, content_type(&path).to_string())],
            file.contents(),
        )
            .into_response(),
        None => missing().await.into_response(),
    }
}

async fn lookup(state: &AppState, word: &str, tab: Option<&str>) -> RenderedPage {
    let mut page = state.client.render_word(word, &state.render).await;
    if let Some(raw) = tab {
        match raw.parse::<SourceId>() {
            Ok(source) => {
                if let Err(err) = page.select_tab(source) {
                    debug!(word, tab = raw, error = %err, "ignoring tab request");
                }
            }
            Err(err) => debug!(word, error = %err, "ignoring tab request"),
        }
    }
    page
}

fn page_status(page: &RenderedPage) -> StatusCode {
    match page {
        RenderedPage::Definition(_) => StatusCode::OK,
        RenderedPage::NotFound => StatusCode::NOT_FOUND,
        RenderedPage::Unavailable { .. } => StatusCode::BAD_GATEWAY,
    }
}

fn content_type(path: &str) -> mime::Mime {
    match path.rsplit_once('.').map(|(_, ext)| ext) {
        Some("css") => mime::TEXT_CSS_UTF_8,
        Some("js") => mime::APPLICATION_JAVASCRIPT_UTF_8,
        Some("html") => mime::TEXT_HTML_UTF_8,
        Some("svg") => mime::IMAGE_SVG,
        Some("png") => mime::IMAGE_PNG,
        _ => mime::APPLICATION_OCTET_STREAM,
    }
}

fn render_error_page(message: impl Into<String>) -> String {
    let message = MarkupDisplay::new_unsafe(message.into(), HtmlEscaper);
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
    <title>Error • wordpage</title>
    <link rel="stylesheet" href="/static/style.css">
  </head>
  <body class="home">
    <main>
      <h1>Something went wrong</h1>
      <p class="gray">{message}</p>
      <a href="/">Back to home</a>
    </main>
  </body>
</html>"#
    )
}
