use crate::{
    AnalysisConfig, Concordance, ConcordanceError, NoConcordance, ParsedPassage, PassageStats,
    StaticConcordance, Token, WordAnalysis, WordFrequency, build_frequency_table, parse, tokenize,
};
use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::compression::CompressionLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{debug, info};

type SharedState = Arc<AppState>;

#[derive(Clone)]
pub struct AppState {
    pub analysis: AnalysisConfig,
    pub concordance: Arc<dyn Concordance>,
}

#[derive(Clone)]
pub struct WebConfig {
    pub addr: SocketAddr,
    pub analysis: AnalysisConfig,
    /// JSON concordance to serve word occurrences from.
    pub concordance_path: Option<PathBuf>,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            analysis: AnalysisConfig::default(),
            concordance_path: None,
        }
    }
}

#[derive(Debug)]
pub enum WebError {
    Io(std::io::Error),
    Concordance(ConcordanceError),
}

impl fmt::Display for WebError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WebError::Io(err) => write!(f, "io error: {err}"),
            WebError::Concordance(err) => write!(f, "concordance error: {err}"),
        }
    }
}

impl std::error::Error for WebError {}

impl From<std::io::Error> for WebError {
    fn from(value: std::io::Error) -> Self {
        WebError::Io(value)
    }
}

impl From<ConcordanceError> for WebError {
    fn from(value: ConcordanceError) -> Self {
        WebError::Concordance(value)
    }
}

pub async fn serve(config: WebConfig) -> Result<(), WebError> {
    let concordance = load_concordance(config.concordance_path.as_ref())?;
    let state = Arc::new(AppState {
        analysis: config.analysis,
        concordance,
    });
    let router = build_router(state);
    info!(
        %config.addr,
        top_n = config.analysis.top_n,
        concordance = ?config.concordance_path,
        "Binding HTTP listener"
    );
    let listener = TcpListener::bind(config.addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("HTTP server exited");
    Ok(())
}

fn load_concordance(path: Option<&PathBuf>) -> Result<Arc<dyn Concordance>, WebError> {
    let Some(path) = path else {
        return Ok(Arc::new(NoConcordance));
    };
    let json = std::fs::read_to_string(path)?;
    let concordance = StaticConcordance::from_json(&json)?;
    info!(path = %path.display(), words = concordance.len(), "Loaded concordance");
    Ok(Arc::new(concordance))
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
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
        .route("/healthz", get(health))
        .route("/api/parse", post(api_parse))
        .route("/api/tokenize", post(api_tokenize))
        .route("/api/analysis", post(api_analysis))
        .route("/api/word", post(api_word))
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

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok", "service": "lectio-web" }))
}

async fn api_parse(body: String) -> Json<ParsedPassage> {
    let parsed = parse(&body);
    debug!(
        elements = parsed.elements.len(),
        verses = parsed.verses.len(),
        "Parsed passage"
    );
    Json(parsed)
}

async fn api_tokenize(body: String) -> Json<Vec<Token>> {
    Json(tokenize(&body))
}

#[derive(Debug, Deserialize)]
struct AnalysisParams {
    limit: Option<usize>,
    include_stopwords: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
struct AnalysisPayload {
    stats: PassageStats,
    top_words: Vec<WordFrequency>,
}

async fn api_analysis(
    State(state): State<SharedState>,
    Query(params): Query<AnalysisParams>,
    body: String,
) -> Json<AnalysisPayload> {
    let mut config = state.analysis;
    if let Some(limit) = params.limit {
        config.top_n = limit;
    }
    if let Some(include) = params.include_stopwords {
        config.exclude_stopwords = !include;
    }
    let parsed = parse(&body);
    let analysis = config.analyze_passage(&parsed.elements);
    Json(AnalysisPayload {
        stats: analysis.stats,
        top_words: analysis.top_words,
    })
}

#[derive(Debug, Deserialize)]
struct WordParams {
    word: Option<String>,
}

async fn api_word(
    State(state): State<SharedState>,
    Query(params): Query<WordParams>,
    body: String,
) -> Result<Json<WordAnalysis>, ApiError> {
    let word = params
        .word
        .filter(|word| !word.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("Missing `word` query parameter"))?;
    let parsed = parse(&body);
    let table = build_frequency_table(&parsed.elements);
    let analysis = state
        .analysis
        .analyze_word(&table, word.trim(), state.concordance.as_ref());
    debug!(word = %analysis.normalized_word, count = analysis.count, "Analyzed word");
    Ok(Json(analysis))
}
