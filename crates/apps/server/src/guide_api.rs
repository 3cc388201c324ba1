//! Content-panel and analytics endpoints backed by the model API.

use std::convert::Infallible;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures_util::{stream, Stream, StreamExt};
use guide::chat::DEFAULT_MAX_MESSAGES;
use guide::{ChatHistory, ChatMessage, FragmentStream, GuideError};
use serde::Deserialize;
use tracing::warn;

use crate::{error_response, AppState};

const DEFAULT_RACE_PERIODS: u32 = 8;
const DEFAULT_RACE_ENTRIES: u32 = 10;

#[derive(Debug, Deserialize)]
pub(crate) struct BriefRequest {
    country: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatRequest {
    country: String,
    #[serde(default)]
    history: Vec<ChatMessage>,
    message: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BarRaceRequest {
    topic: String,
    periods: Option<u32>,
    entries: Option<u32>,
}

/// Canonical name of a known country, or a 404 response.
fn resolve_country(state: &AppState, name: &str) -> Result<String, Response> {
    let set = state.catalog.read().countries();
    set.by_name(name)
        .map(|record| record.name.clone())
        .ok_or_else(|| error_response(StatusCode::NOT_FOUND, format!("unknown country: {name}")))
}

fn upstream_error(err: GuideError) -> Response {
    warn!("model request failed: {err}");
    error_response(StatusCode::BAD_GATEWAY, err.to_string())
}

/// `fragment` events carrying text, an `error` event if the model stream
/// fails, then a final `done`. Dropping the response (client disconnect)
/// drops the fragment stream, which cancels the producer.
fn fragment_events(fragments: FragmentStream) -> impl Stream<Item = Result<Event, Infallible>> {
    fragments
        .map(|item| {
            Ok(match item {
                Ok(text) => Event::default().event("fragment").data(text),
                Err(err) => {
                    warn!("fragment stream failed: {err}");
                    Event::default().event("error").data(err.to_string())
                }
            })
        })
        .chain(stream::once(async { Ok(Event::default().event("done").data("")) }))
}

fn sse_response(fragments: FragmentStream) -> Response {
    Sse::new(fragment_events(fragments))
        .keep_alive(KeepAlive::default())
        .into_response()
}

pub(crate) async fn brief(State(state): State<AppState>, Json(req): Json<BriefRequest>) -> Response {
    let country = match resolve_country(&state, &req.country) {
        Ok(name) => name,
        Err(resp) => return resp,
    };
    match state.llm.stream_brief(&country).await {
        Ok(fragments) => sse_response(fragments),
        Err(err) => upstream_error(err),
    }
}

pub(crate) async fn chat(State(state): State<AppState>, Json(req): Json<ChatRequest>) -> Response {
    let country = match resolve_country(&state, &req.country) {
        Ok(name) => name,
        Err(resp) => return resp,
    };
    if req.message.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "message must not be empty");
    }

    let mut history = ChatHistory::from_messages(country, req.history, DEFAULT_MAX_MESSAGES);
    history.push_user(req.message.trim());
    match state.llm.stream_chat(&history).await {
        Ok(fragments) => sse_response(fragments),
        Err(err) => upstream_error(err),
    }
}

pub(crate) async fn bar_race(State(state): State<AppState>, Json(req): Json<BarRaceRequest>) -> Response {
    let topic = req.topic.trim();
    if topic.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "topic must not be empty");
    }
    let periods = req.periods.unwrap_or(DEFAULT_RACE_PERIODS).clamp(2, 30);
    let entries = req.entries.unwrap_or(DEFAULT_RACE_ENTRIES).clamp(3, 20);

    match state.llm.bar_race(topic, periods, entries).await {
        Ok(dataset) => Json(dataset).into_response(),
        Err(err) => upstream_error(err),
    }
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use axum::body::Bytes;
    use axum::http::StatusCode;
    use futures_util::{stream, StreamExt};
    use guide::FragmentStream;
    use serde_json::json;

    use super::fragment_events;
    use crate::test_support::{post_json, send, state};

    #[tokio::test]
    async fn unknown_country_is_not_found() {
        let (status, body) = send(state(), post_json("/api/brief", json!({"country": "Narnia"}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "unknown country: Narnia");

        let req = json!({"country": "Narnia", "history": [], "message": "hi"});
        let (status, _) = send(state(), post_json("/api/chat", req)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn missing_api_key_is_a_bad_gateway() {
        let (status, body) = send(state(), post_json("/api/brief", json!({"country": "japan"}))).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"], "LLM_API_KEY is not set");

        let (status, _) = send(state(), post_json("/api/bar-race", json!({"topic": "rice output"}))).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn rejects_empty_inputs() {
        let req = json!({"country": "Japan", "message": "   "});
        let (status, _) = send(state(), post_json("/api/chat", req)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(state(), post_json("/api/bar-race", json!({"topic": ""}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn fragment_events_end_with_done() {
        let body = stream::iter(vec![
            Ok::<_, Infallible>(Bytes::from_static(b"data: {\"choices\":[{\"delta\":{\"content\":\"Hi\"}}]}\n\n")),
            Ok(Bytes::from_static(b"data: [DONE]\n\n")),
        ]);
        let events: Vec<_> = fragment_events(FragmentStream::spawn(body)).collect().await;
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(Result::is_ok));
    }
}
