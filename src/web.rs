use crate::lookup::{Explorer, ExplorerConfig, NodeRef, WordEntry};
use crate::{ExplorerError, HttpMapSource, MapSource, MapView, map_for_selection};
use askama::Template;
use axum::{
    Json, Router,
    extract::{Query, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use lru::LruCache;
use parking_lot::Mutex;
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use serde::Deserialize;
use serde_json::json;
use std::fmt;
use std::net::SocketAddr;
use std::num::NonZeroUsize;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::compression::CompressionLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::info;

type SharedState = Arc<AppState>;

/// Words offered on the landing page.
const SUGGESTED_WORDS: &[&str] = &["mother", "water", "democracy", "machine"];

pub struct AppState {
    pub explorer: Explorer,
    pub maps: Arc<dyn MapSource>,
    pub theme: WebTheme,
    entries: Mutex<LruCache<String, Arc<WordEntry>>>,
}

impl AppState {
    pub fn new(
        explorer: Explorer,
        maps: Arc<dyn MapSource>,
        theme: WebTheme,
        entry_capacity: usize,
    ) -> Self {
        let capacity = NonZeroUsize::new(entry_capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            explorer,
            maps,
            theme,
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Looks a word up, reusing earlier results.
    async fn lookup(&self, term: &str) -> Result<Arc<WordEntry>, ExplorerError> {
        let key = term.trim().to_string();
        if key.is_empty() {
            return Err(ExplorerError::EmptyQuery);
        }
        let cached = self.entries.lock().get(&key).cloned();
        if let Some(entry) = cached {
            return Ok(entry);
        }
        let entry = Arc::new(self.explorer.search(&key).await?);
        self.entries.lock().put(key, entry.clone());
        Ok(entry)
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
pub enum WebTheme {
    #[default]
    Dark,
    Light,
}

impl fmt::Display for WebTheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WebTheme::Dark => write!(f, "dark"),
            WebTheme::Light => write!(f, "light"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Chrome {
    body_class: &'static str,
    main_class: &'static str,
    headline_class: &'static str,
    lede_class: &'static str,
    panel_class: &'static str,
    muted_class: &'static str,
    input_class: &'static str,
    button_class: &'static str,
    node_class: &'static str,
    alert_class: &'static str,
}

impl Chrome {
    fn new(theme: WebTheme) -> Self {
        match theme {
            WebTheme::Dark => Self {
                body_class: "bg-neutral-900 text-neutral-200",
                main_class: "min-h-screen max-w-7xl mx-auto py-8 px-6",
                headline_class: "text-4xl font-light tracking-tight text-neutral-100",
                lede_class: "text-neutral-400 mt-2",
                panel_class: "rounded-lg bg-neutral-800 p-4",
                muted_class: "text-sm text-neutral-400",
                input_class: "flex-1 rounded bg-neutral-800 border border-neutral-700 px-4 py-2 text-neutral-100",
                button_class: "rounded bg-neutral-200 px-5 py-2 font-medium text-neutral-900 hover:bg-white",
                node_class: "block rounded-md bg-neutral-800 px-4 py-3 border-2 transition-transform hover:scale-[1.01]",
                alert_class: "rounded-md border border-red-500 bg-red-950 px-4 py-3 text-red-200",
            },
            WebTheme::Light => Self {
                body_class: "bg-slate-50 text-slate-900",
                main_class: "min-h-screen max-w-7xl mx-auto py-8 px-6",
                headline_class: "text-4xl font-extrabold tracking-tight",
                lede_class: "text-slate-600 mt-2",
                panel_class: "rounded-lg bg-white shadow p-4",
                muted_class: "text-sm text-slate-500",
                input_class: "flex-1 rounded border border-slate-300 px-4 py-2",
                button_class: "rounded bg-slate-900 px-5 py-2 font-semibold text-white hover:bg-slate-800",
                node_class: "block rounded-md bg-white shadow px-4 py-3 border-2 transition-transform hover:scale-[1.01]",
                alert_class: "rounded-md border border-red-400 bg-red-50 px-4 py-3 text-red-800",
            },
        }
    }
}

#[derive(Clone)]
pub struct WebConfig {
    pub addr: SocketAddr,
    pub theme: WebTheme,
    pub explorer: ExplorerConfig,
    pub entry_cache_capacity: usize,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            theme: WebTheme::default(),
            explorer: ExplorerConfig::default(),
            entry_cache_capacity: 256,
        }
    }
}

#[derive(Debug, Error)]
pub enum WebError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Explorer(#[from] ExplorerError),
}

pub async fn serve(config: WebConfig) -> Result<(), WebError> {
    let explorer = Explorer::from_config(&config.explorer)?;
    let maps: Arc<dyn MapSource> = Arc::new(HttpMapSource::new(&config.explorer)?);
    let state = Arc::new(AppState::new(
        explorer,
        maps,
        config.theme,
        config.entry_cache_capacity,
    ));
    let router = build_router(state);
    info!(
        %config.addr,
        theme = %config.theme,
        dictionary = %config.explorer.dictionary_url,
        "Binding HTTP listener"
    );
    let listener = TcpListener::bind(config.addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("HTTP server exited");
    Ok(())
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl From<ExplorerError> for ApiError {
    fn from(err: ExplorerError) -> Self {
        let status = match &err {
            ExplorerError::EmptyQuery | ExplorerError::InvalidNode(_) => StatusCode::BAD_REQUEST,
            ExplorerError::NotFound(_) | ExplorerError::Status { .. } => StatusCode::NOT_FOUND,
            ExplorerError::Http(_) | ExplorerError::MapUnavailable { .. } => {
                StatusCode::BAD_GATEWAY
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.user_message(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let payload = json!({ "error": self.message });
        (self.status, Json(payload)).into_response()
    }
}

fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/word", get(word_html))
        .route("/map.svg", get(map_svg))
        .route("/api/word", get(api_word))
        .route("/healthz", get(health))
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

#[derive(Debug, Deserialize)]
struct WordParams {
    q: Option<String>,
    node: Option<String>,
}

impl WordParams {
    fn query(&self) -> Result<&str, ExplorerError> {
        let query = self.q.as_deref().map(str::trim).unwrap_or_default();
        if query.is_empty() {
            Err(ExplorerError::EmptyQuery)
        } else {
            Ok(query)
        }
    }

    /// Unparsable selections fall back to the word itself.
    fn selection(&self, entry: &WordEntry) -> Option<NodeRef> {
        let node = self.node.as_deref()?.parse::<NodeRef>().ok()?;
        entry.node(node).map(|_| node)
    }
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok", "service": "etymology-explorer" }))
}

async fn home(State(state): State<SharedState>) -> Html<String> {
    render_page(state.theme, home_page(&state, String::new(), None))
}

fn render_page(theme: WebTheme, template: impl Template) -> Html<String> {
    Html(
        template
            .render()
            .unwrap_or_else(|err| render_error_page(theme, err.to_string())),
    )
}

fn home_page(state: &AppState, query: String, alert: Option<String>) -> HomeTemplate {
    HomeTemplate {
        chrome: Chrome::new(state.theme),
        query,
        alert,
        placeholder: format!(
            "Enter any English word (e.g., {})",
            SUGGESTED_WORDS[..3].join(", ")
        ),
        suggestions: SUGGESTED_WORDS
            .iter()
            .map(|word| WordLink::new(word))
            .collect(),
    }
}

async fn word_html(
    State(state): State<SharedState>,
    Query(params): Query<WordParams>,
) -> Html<String> {
    let query = match params.query() {
        Ok(query) => query.to_string(),
        Err(_) => return render_page(state.theme, home_page(&state, String::new(), None)),
    };
    let entry = match state.lookup(&query).await {
        Ok(entry) => entry,
        Err(err) => {
            let page = home_page(&state, query, Some(err.user_message()));
            return render_page(state.theme, page);
        }
    };
    let selection = params.selection(&entry);
    let (map, map_error) = match map_for_selection(state.maps.as_ref(), &entry, selection).await {
        Ok(view) => (Some(view), None),
        Err(err) => (None, Some(err.user_message())),
    };
    let template = WordTemplate::new(state.theme, &entry, selection, map, map_error);
    render_page(state.theme, template)
}

async fn map_svg(
    State(state): State<SharedState>,
    Query(params): Query<WordParams>,
) -> Result<Response, ApiError> {
    let entry = state.lookup(params.query()?).await?;
    let view = map_for_selection(state.maps.as_ref(), &entry, params.selection(&entry)).await?;
    Ok((
        [(header::CONTENT_TYPE, "image/svg+xml")],
        view.rendered.svg,
    )
        .into_response())
}

async fn api_word(
    State(state): State<SharedState>,
    Query(params): Query<WordParams>,
) -> Result<Json<WordEntry>, ApiError> {
    let entry = state.lookup(params.query()?).await?;
    Ok(Json(entry.as_ref().clone()))
}

fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, NON_ALPHANUMERIC).to_string()
}

fn word_path(word: &str, node: Option<NodeRef>) -> String {
    match node {
        Some(node) => format!("/word?q={}&node={node}", encode_component(word)),
        None => format!("/word?q={}", encode_component(word)),
    }
}

fn render_error_page(theme: WebTheme, message: impl Into<String>) -> String {
    let chrome = Chrome::new(theme);
    let message = crate::markup::escape(&message.into());
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="utf-8" />
    <title>Etymology Explorer • Error</title>
    <script src="https://cdn.jsdelivr.net/npm/@tailwindcss/browser@4"></script>
  </head>
  <body class="{body_class}">
    <main class="{main_class}">
      <h1 class="{headline_class}">Something went wrong</h1>
      <p class="{lede_class}">{message}</p>
      <p class="mt-4"><a href="/" class="{button_class}">Back to search</a></p>
    </main>
  </body>
</html>"#,
        body_class = chrome.body_class,
        main_class = chrome.main_class,
        headline_class = chrome.headline_class,
        lede_class = chrome.lede_class,
        button_class = chrome.button_class,
    )
}

#[derive(Debug, Clone)]
struct WordLink {
    word: String,
    href: String,
}

impl WordLink {
    fn new(word: &str) -> Self {
        Self {
            word: word.to_string(),
            href: word_path(word, None),
        }
    }
}

#[derive(Debug, Clone)]
struct NodeView {
    href: String,
    word: String,
    language: String,
    period: String,
    color: String,
    region_label: String,
    region_name: String,
    active: bool,
}

#[derive(Debug, Clone)]
struct BranchView {
    label: String,
    nodes: Vec<NodeView>,
}

#[derive(Template)]
#[template(
    source = r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
    <title>Etymology Explorer</title>
    <script src="https://cdn.jsdelivr.net/npm/@tailwindcss/browser@4"></script>
  </head>
  <body class="{{ chrome.body_class }}">
    <main class="{{ chrome.main_class }}">
      <header class="mb-8">
        <h1 class="{{ chrome.headline_class }}">Etymology Explorer</h1>
        <p class="{{ chrome.lede_class }}">Trace the evolution of any English word through time and space</p>
      </header>

      <form action="/word" method="get" class="mb-8 flex gap-2 max-w-xl">
        <input type="text" name="q" value="{{ query }}" placeholder="{{ placeholder }}" class="{{ chrome.input_class }}" autofocus>
        <button type="submit" class="{{ chrome.button_class }}">Search</button>
      </form>

      {% if alert.is_some() %}
      <div role="alert" class="{{ chrome.alert_class }} mb-8 max-w-xl">{{ alert.as_ref().unwrap() }}</div>
      {% endif %}

      <section class="{{ chrome.panel_class }} max-w-xl space-y-4">
        <p>Search for any English word to explore its etymology and geographic origins</p>
        <p class="{{ chrome.muted_class }}">Try:
          {% for link in suggestions %}
            <a class="underline" href="{{ link.href }}">{{ link.word }}</a>{% if !loop.last %},{% endif %}
          {% endfor %}
          or any word you're curious about!
        </p>
      </section>
    </main>
  </body>
</html>"#,
    ext = "html"
)]
struct HomeTemplate {
    chrome: Chrome,
    query: String,
    alert: Option<String>,
    placeholder: String,
    suggestions: Vec<WordLink>,
}

#[derive(Template)]
#[template(
    source = r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
    <title>Etymology Explorer • {{ word }}</title>
    <script src="https://cdn.jsdelivr.net/npm/@tailwindcss/browser@4"></script>
  </head>
  <body class="{{ chrome.body_class }}">
    <main class="{{ chrome.main_class }}">
      <header class="mb-8">
        <h1 class="{{ chrome.headline_class }}"><a href="/">Etymology Explorer</a></h1>
        <p class="{{ chrome.lede_class }}">Trace the evolution of any English word through time and space</p>
      </header>

      <form action="/word" method="get" class="mb-8 flex gap-2 max-w-xl">
        <input type="text" name="q" value="{{ word }}" class="{{ chrome.input_class }}">
        <button type="submit" class="{{ chrome.button_class }}">Search</button>
      </form>

      <div class="grid gap-8 lg:grid-cols-[1fr_1.5fr]">
        <section>
          <h2 class="text-xl mb-4">Etymology Tree</h2>
          <p class="{{ chrome.panel_class }} {{ chrome.muted_class }} mb-4">Click on any node to see where it was spoken</p>

          <a href="{{ root_href }}" class="{{ chrome.node_class }} mb-4" style="border-color: {% if root_active %}{{ color }}{% else %}transparent{% endif %}">
            <span class="flex items-center gap-3">
              <span class="inline-block h-3 w-3 rounded-full" style="background: {{ color }}"></span>
              <span class="text-2xl font-medium">{{ word }}</span>
            </span>
            <span class="{{ chrome.muted_class }} block ml-6">{{ language }} • {{ period }}</span>
            <span class="block ml-6 mt-2">{{ meaning }}</span>
            <span class="block ml-6 mt-2 text-sm" style="color: {{ color }}">{{ region_label }}: {{ region_name }}</span>
          </a>

          <p class="{{ chrome.muted_class }} uppercase tracking-wide mb-2">Etymology</p>
          {% if branches.is_empty() %}
          <div class="{{ chrome.panel_class }} {{ chrome.muted_class }} text-center">
            No etymology chain found. This word may be a recent invention or have a complex etymology.
          </div>
          {% else %}
          {% for branch in branches %}
          <div class="mb-6">
            {% if multiple_branches %}
            <p class="{{ chrome.muted_class }} font-semibold mb-2">{{ branch.label }}</p>
            {% endif %}
            {% for node in branch.nodes %}
            <a href="{{ node.href }}" class="{{ chrome.node_class }} mb-2" style="border-color: {% if node.active %}{{ node.color }}{% else %}transparent{% endif %}">
              <span class="flex items-center gap-3">
                <span class="inline-block h-3 w-3 rounded-full" style="background: {{ node.color }}"></span>
                <span class="font-medium">{{ node.word }}</span>
              </span>
              <span class="{{ chrome.muted_class }} block ml-6">{{ node.language }} • {{ node.period }}</span>
              <span class="{{ chrome.muted_class }} block ml-6">{{ node.region_label }}: {{ node.region_name }}</span>
            </a>
            {% endfor %}
          </div>
          {% endfor %}
          {% endif %}
        </section>

        <section>
          <h2 class="text-xl mb-4">Geographic Distribution</h2>
          {% if map_svg.is_some() %}
          <figure>
            <div class="rounded-lg bg-neutral-950 overflow-hidden">{{ map_svg.as_ref().unwrap()|safe }}</div>
            <figcaption class="{{ chrome.muted_class }} mt-2">{{ map_caption }}</figcaption>
          </figure>
          {% else %}
          <div role="alert" class="{{ chrome.alert_class }}">{{ map_error }}</div>
          {% endif %}
          <div class="{{ chrome.panel_class }} {{ chrome.muted_class }} mt-4">
            <strong>Note on geographic representation:</strong>
            <p class="mt-2">
              Modern political boundaries are used as approximations for historical language regions.
              Proto-languages represent hypothesized reconstructions, and their geographic origins remain
              subjects of ongoing scholarly debate. Countries highlighted indicate approximate historical
              regions where these languages were spoken or theorized to have originated.
            </p>
          </div>
        </section>
      </div>
    </main>
  </body>
</html>"#,
    ext = "html"
)]
struct WordTemplate {
    chrome: Chrome,
    word: String,
    language: String,
    period: String,
    meaning: String,
    color: String,
    region_label: String,
    region_name: String,
    root_href: String,
    root_active: bool,
    branches: Vec<BranchView>,
    multiple_branches: bool,
    map_svg: Option<String>,
    map_caption: String,
    map_error: String,
}

impl WordTemplate {
    fn new(
        theme: WebTheme,
        entry: &WordEntry,
        selection: Option<NodeRef>,
        map: Option<MapView>,
        map_error: Option<String>,
    ) -> Self {
        let branches = entry
            .etymology
            .branches
            .iter()
            .enumerate()
            .map(|(branch_idx, branch)| BranchView {
                label: branch.label.clone(),
                nodes: branch
                    .nodes
                    .iter()
                    .enumerate()
                    .map(|(node_idx, node)| {
                        let node_ref = NodeRef::new(branch_idx, node_idx);
                        NodeView {
                            href: word_path(&entry.word, Some(node_ref)),
                            word: node.word.clone(),
                            language: node.language.clone(),
                            period: node.period.clone(),
                            color: node.color.clone(),
                            region_label: node.region.label.clone(),
                            region_name: node.region.name.clone(),
                            active: selection == Some(node_ref),
                        }
                    })
                    .collect(),
            })
            .collect();
        let map_caption = map.as_ref().map(MapView::caption).unwrap_or_default();
        Self {
            chrome: Chrome::new(theme),
            word: entry.word.clone(),
            language: entry.language.clone(),
            period: entry.period.clone(),
            meaning: entry.meaning.clone(),
            color: entry.color.clone(),
            region_label: entry.region.label.clone(),
            region_name: entry.region.name.clone(),
            root_href: word_path(&entry.word, None),
            root_active: selection.is_none(),
            branches,
            multiple_branches: entry.etymology.has_multiple_branches,
            map_svg: map.map(|view| view.rendered.svg),
            map_caption,
            map_error: map_error.unwrap_or_default(),
        }
    }
}

#[cfg(all(test, feature = "web"))]
mod tests {
    use super::*;
    use crate::MapEra;
    use crate::atlas::tests::StubMaps;
    use crate::lookup::tests::StubDictionary;
    use axum::{body, body::Body, http::Request};
    use tower::ServiceExt;

    fn test_state(available: Vec<MapEra>) -> SharedState {
        Arc::new(AppState::new(
            Explorer::new(Arc::new(StubDictionary::with_fixtures())),
            Arc::new(StubMaps { available }),
            WebTheme::Dark,
            16,
        ))
    }

    fn test_router() -> Router {
        build_router(test_state(MapEra::ALL.to_vec()))
    }

    async fn body_text(response: Response) -> String {
        let bytes = body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn api_word_water() {
        let response = test_router()
            .oneshot(Request::get("/api/word?q=water").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(response.status().is_success());
        let bytes = body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let entry: WordEntry = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(entry.word, "water");
        assert_eq!(entry.etymology.node_count(), 5);
    }

    #[tokio::test]
    async fn api_word_missing_is_404() {
        let response = test_router()
            .oneshot(Request::get("/api/word?q=qwxz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let text = body_text(response).await;
        assert!(text.contains("not found on Wiktionary"));
    }

    #[tokio::test]
    async fn api_word_requires_query() {
        let response = test_router()
            .oneshot(Request::get("/api/word?q=%20").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn word_page_highlights_selected_node() {
        let response = test_router()
            .oneshot(
                Request::get("/word?q=water&node=0.3")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(response.status().is_success());
        let html = body_text(response).await;
        assert!(html.contains("Proto-Germanic"));
        assert!(html.contains("World in 500 BC"));
        assert!(html.contains("<svg"));
        assert!(html.contains("q=water&amp;node=0.4"));
        assert!(!html.contains("&lt;svg"));
    }

    #[tokio::test]
    async fn word_page_labels_multiple_branches() {
        let response = test_router()
            .oneshot(Request::get("/word?q=democracy").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let html = body_text(response).await;
        assert!(html.contains("Primary path"));
        assert!(html.contains("Secondary influence"));
        assert!(html.contains("Modern borders"));
    }

    #[tokio::test]
    async fn word_without_etymology_says_so() {
        let response = test_router()
            .oneshot(Request::get("/word?q=selfie").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let html = body_text(response).await;
        assert!(html.contains("No etymology chain found"));
        assert!(html.contains("A photograph of oneself, taken by oneself."));
    }

    #[tokio::test]
    async fn missing_word_shows_alert_on_home() {
        let response = test_router()
            .oneshot(Request::get("/word?q=qwxz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(response.status().is_success());
        let html = body_text(response).await;
        assert!(html.contains("role=\"alert\""));
        assert!(html.contains("not found on Wiktionary. Try another word!"));
        assert!(!html.contains("Etymology Tree"));
    }

    #[tokio::test]
    async fn historical_map_failure_falls_back_to_modern() {
        let router = build_router(test_state(vec![MapEra::Modern]));
        let response = router
            .oneshot(
                Request::get("/word?q=water&node=0.1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let html = body_text(response).await;
        assert!(html.contains("Modern borders (historical map for 400 AD unavailable)"));
    }

    #[tokio::test]
    async fn map_svg_has_svg_content_type() {
        let response = test_router()
            .oneshot(Request::get("/map.svg?q=water").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(response.status().is_success());
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "image/svg+xml"
        );
        let svg = body_text(response).await;
        assert!(svg.starts_with("<svg"));
    }

    #[tokio::test]
    async fn looked_up_entries_are_cached() {
        let state = test_state(MapEra::ALL.to_vec());
        let router = build_router(state.clone());
        for _ in 0..2 {
            let response = router
                .clone()
                .oneshot(Request::get("/api/word?q=water").body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert!(response.status().is_success());
        }
        let _ = router
            .oneshot(Request::get("/api/word?q=qwxz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let entries = state.entries.lock();
        assert_eq!(entries.len(), 1);
        assert!(entries.contains("water"));
    }

    #[tokio::test]
    async fn searches_are_not_logged() {
        let response = test_router()
            .oneshot(Request::get("/api/history").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn home_page_renders() {
        let response = test_router()
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(response.status().is_success());
        let html = body_text(response).await;
        assert!(html.contains("Etymology Explorer"));
        assert!(html.contains("q=machine"));
        assert!(html.contains("Enter any English word (e.g., mother, water, democracy)"));
    }

    #[tokio::test]
    async fn healthz_ok() {
        let response = test_router()
            .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(response.status().is_success());
    }
}
