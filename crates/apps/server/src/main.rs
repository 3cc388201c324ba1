use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use formats::CountryCatalog;
use guide::{GuideConfig, LlmClient};
use parking_lot::RwLock;
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod countries;
mod guide_api;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) catalog: Arc<RwLock<CountryCatalog>>,
    pub(crate) countries_path: Arc<PathBuf>,
    pub(crate) llm: LlmClient,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    if let Err(err) = run().await {
        error!("{err}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), String> {
    let addr: SocketAddr = env::var("GLOBE_ADDR")
        .unwrap_or_else(|_| "127.0.0.1:9200".to_string())
        .parse()
        .map_err(|e| format!("invalid GLOBE_ADDR: {e}"))?;
    let countries_path = env::var("COUNTRIES_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("assets/countries.geojson"));

    let catalog = CountryCatalog::load(&countries_path).map_err(|e| e.to_string())?;
    let config = GuideConfig::from_env();
    if config.api_key.is_none() {
        warn!("LLM_API_KEY is not set; brief, chat and bar race endpoints will fail");
    }
    let llm = LlmClient::new(config).map_err(|e| e.to_string())?;

    let state = AppState {
        catalog: Arc::new(RwLock::new(catalog)),
        countries_path: Arc::new(countries_path),
        llm,
    };

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| format!("failed to bind {addr}: {e}"))?;
    info!("globe server listening on http://{addr}");
    axum::serve(listener, app(state))
        .await
        .map_err(|e| format!("server error: {e}"))
}

pub(crate) fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_headers(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS]);

    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/countries", get(countries::list_countries))
        .route("/api/countries/reload", post(countries::reload_countries))
        .route("/api/locate", post(countries::locate))
        .route("/api/search", get(countries::search))
        .route("/api/brief", post(guide_api::brief))
        .route("/api/chat", post(guide_api::chat))
        .route("/api/bar-race", post(guide_api::bar_race))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> Response {
    (StatusCode::OK, "ok").into_response()
}

pub(crate) fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::PathBuf;
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use formats::CountryCatalog;
    use guide::{GuideConfig, LlmClient};
    use parking_lot::RwLock;
    use tower::ServiceExt;

    use super::{app, AppState};

    pub(crate) const BUNDLED: &str = include_str!("../../../../assets/countries.geojson");

    /// State over the bundled dataset with an LLM client that has no API key.
    pub(crate) fn state_with_path(path: PathBuf) -> AppState {
        let catalog = CountryCatalog::from_bytes(BUNDLED.as_bytes()).expect("catalog");
        AppState {
            catalog: Arc::new(RwLock::new(catalog)),
            countries_path: Arc::new(path),
            llm: LlmClient::new(GuideConfig::default()).expect("client"),
        }
    }

    pub(crate) fn state() -> AppState {
        state_with_path(PathBuf::from("/nonexistent/countries.geojson"))
    }

    pub(crate) async fn send(state: AppState, req: Request<Body>) -> (StatusCode, serde_json::Value) {
        let resp = app(state).oneshot(req).await.expect("response");
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), 1 << 20).await.expect("body");
        let value = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| serde_json::Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, value)
    }

    pub(crate) fn get(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).expect("request")
    }

    pub(crate) fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    }
}
