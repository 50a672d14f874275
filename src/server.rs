use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Form, Router};
use pulldown_cmark::{html, Parser};
use serde::Deserialize;

use crate::cache::ReportCache;
use crate::error::{BriefError, Result};
use crate::pipeline::{Pipeline, PipelineResult};

/// Everything a request handler needs, constructed once at startup and handed
/// to the router. The cache owns its own locking; nothing here is ambient.
#[derive(Clone)]
pub struct AppState {
    pipeline: Arc<Pipeline>,
    cache: Arc<ReportCache>,
}

impl AppState {
    pub fn new(pipeline: Arc<Pipeline>, cache: Arc<ReportCache>) -> Self {
        Self { pipeline, cache }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index).post(refresh))
        .route("/health", get(|| async { "ok" }))
        .with_state(state)
}

pub async fn serve(state: AppState, addr: SocketAddr) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state)).await?;
    Ok(())
}

/// Serve the cached brief; on a cold cache, generate it synchronously.
async fn index(State(state): State<AppState>) -> Response {
    match state.cache.read().await {
        Some(result) => report_page(&result).into_response(),
        None => run_refresh(&state).await,
    }
}

#[derive(Deserialize, Default)]
struct RefreshForm {
    #[serde(default)]
    refresh: Option<String>,
}

async fn refresh(State(state): State<AppState>, Form(form): Form<RefreshForm>) -> Response {
    if form.refresh.is_none() {
        return index(State(state)).await;
    }
    run_refresh(&state).await
}

/// A failed refresh reports the failing task and keeps the process serving;
/// the previously cached brief stays available on the next GET.
async fn run_refresh(state: &AppState) -> Response {
    match state.cache.refresh(&state.pipeline).await {
        Ok(result) => report_page(&result).into_response(),
        Err(err) => {
            tracing::error!(%err, "refresh failed");
            (axum::http::StatusCode::INTERNAL_SERVER_ERROR, error_page(&err)).into_response()
        }
    }
}

fn markdown_to_html(markdown: &str) -> String {
    let mut out = String::new();
    html::push_html(&mut out, Parser::new(markdown));
    out
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn report_page(result: &PipelineResult) -> Html<String> {
    let report = markdown_to_html(&result.text);
    let updated = result.completed_at.format("%Y-%m-%d %H:%M:%S UTC");
    Html(format!(
        r#"<!doctype html>
<html lang="en">
<head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1.0" />
    <title>Top 10 Stocks to Invest In This Year</title>
    <link rel="stylesheet" href="https://cdnjs.cloudflare.com/ajax/libs/github-markdown-css/5.1.0/github-markdown.min.css" />
    <style>
        .markdown-body {{ box-sizing: border-box; max-width: 980px; margin: 0 auto; padding: 45px; }}
        .refresh-btn {{ background-color: #4caf50; border: none; color: white; padding: 15px 32px;
                        font-size: 16px; margin: 20px 0; cursor: pointer; border-radius: 4px; }}
        .refresh-btn:hover {{ background-color: #45a049; }}
        .timestamp {{ color: #666; font-style: italic; margin-top: 20px; }}
        footer {{ margin-top: 2rem; color: #586069; font-size: 0.9rem; }}
    </style>
</head>
<body>
    <article class="markdown-body">
        <h1>Top 10 Stocks to Invest In This Year</h1>
        <form method="post">
            <button type="submit" name="refresh" value="1" class="refresh-btn">Refresh Recommendations</button>
        </form>
        {report}
        <div class="timestamp">Last updated: {updated}</div>
        <footer>
            <p>Note: Stock recommendations are based on current market analysis and may change.</p>
        </footer>
    </article>
</body>
</html>"#
    ))
}

fn error_page(err: &BriefError) -> Html<String> {
    let message = html_escape(&err.to_string());
    Html(format!(
        r#"<!doctype html>
<html lang="en">
<head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1.0" />
    <title>Error</title>
    <style>.error {{ color: red; }}</style>
</head>
<body>
    <h1>Error Generating Recommendations</h1>
    <p class="error">{message}</p>
    <a href="/">Back to recommendations</a>
</body>
</html>"#
    ))
}
