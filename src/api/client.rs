use std::collections::VecDeque;
use std::sync::Mutex;

use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::api::trace::{RequestSpec, RequestTrace, traced};
use crate::game::snapshot::{GameStateSnapshot, ReviewPayload, TranscriptEntry};
use crate::types::AdvanceEvent;

const TRACE_CAPACITY: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CreatedGame {
    #[serde(alias = "gameId", alias = "gameID")]
    pub game_id: Uuid,
    #[serde(default)]
    pub state: Option<GameStateSnapshot>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct StateEnvelope {
    #[serde(default)]
    state: Option<GameStateSnapshot>,
}

/// Thin typed wrapper over the game backend. Every call is traced; the most
/// recent records are retained for the debug pane.
pub struct ApiClient {
    http: Client,
    base_url: String,
    traces: Mutex<VecDeque<RequestTrace>>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http: Client::new(),
            base_url,
            traces: Mutex::new(VecDeque::with_capacity(TRACE_CAPACITY)),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn health(&self) -> Result<(), ApiError> {
        self.request_json("GET", "/health", None).map(|_| ())
    }

    pub fn create_game(&self) -> Result<CreatedGame, ApiError> {
        let value = self.request_json("POST", "/games", Some(json!({})))?;
        Ok(serde_json::from_value(value.unwrap_or(Value::Null))?)
    }

    pub fn get_game(&self, game_id: Uuid) -> Result<Option<GameStateSnapshot>, ApiError> {
        let value = self.request_json("GET", &format!("/games/{game_id}"), None)?;
        match value {
            Some(value) => {
                let envelope: StateEnvelope = serde_json::from_value(value)?;
                Ok(envelope.state)
            }
            None => Ok(None),
        }
    }

    pub fn advance(
        &self,
        game_id: Uuid,
        event: AdvanceEvent,
        payload: Value,
    ) -> Result<Option<GameStateSnapshot>, ApiError> {
        self.advance_raw(game_id, &event.to_string(), payload)
    }

    /// Advance with an arbitrary event tag. Dev-mode escape hatch for phases
    /// the typed surface does not know yet.
    pub fn advance_raw(
        &self,
        game_id: Uuid,
        event: &str,
        payload: Value,
    ) -> Result<Option<GameStateSnapshot>, ApiError> {
        let body = json!({ "event": event, "payload": payload });
        let value = self.request_json("POST", &format!("/games/{game_id}/advance"), Some(body))?;
        match value {
            Some(value) => {
                let envelope: StateEnvelope = serde_json::from_value(value)?;
                Ok(envelope.state)
            }
            None => Ok(None),
        }
    }

    pub fn get_transcript(
        &self,
        game_id: Uuid,
        visible_to_human: Option<bool>,
    ) -> Result<Vec<TranscriptEntry>, ApiError> {
        let path = match visible_to_human {
            Some(visible) => format!("/games/{game_id}/transcript?visible_to_human={visible}"),
            None => format!("/games/{game_id}/transcript"),
        };
        let value = self.request_json("GET", &path, None)?;
        // A non-list body is treated as an empty transcript, not an error.
        match value {
            Some(value @ Value::Array(_)) => Ok(serde_json::from_value(value)?),
            _ => Ok(Vec::new()),
        }
    }

    pub fn get_review(&self, game_id: Uuid) -> Result<ReviewPayload, ApiError> {
        let value = self.request_json("GET", &format!("/games/{game_id}/review"), None)?;
        Ok(serde_json::from_value(value.unwrap_or(json!({})))?)
    }

    /// Most recent request traces, oldest first.
    pub fn recent_traces(&self) -> Vec<RequestTrace> {
        self.traces
            .lock()
            .map(|traces| traces.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn record(&self, trace: RequestTrace) {
        if let Ok(mut traces) = self.traces.lock() {
            if traces.len() == TRACE_CAPACITY {
                traces.pop_front();
            }
            traces.push_back(trace);
        }
    }

    fn request_json(
        &self,
        method: &'static str,
        path: &str,
        body: Option<Value>,
    ) -> Result<Option<Value>, ApiError> {
        let url = format!("{}{path}", self.base_url);
        let spec = RequestSpec {
            method,
            url: url.clone(),
            body: body.clone(),
        };
        let (trace, result) = traced(spec, || self.execute(method, &url, body.as_ref()));
        tracing::debug!(method, url = %trace.url, outcome = ?trace.outcome, "api call");
        self.record(trace);
        result
    }

    fn execute(
        &self,
        method: &'static str,
        url: &str,
        body: Option<&Value>,
    ) -> Result<Option<Value>, ApiError> {
        let request = match method {
            "POST" => self.http.post(url),
            _ => self.http.get(url),
        };
        let request = match body {
            Some(body) => request.json(body),
            None => request,
        };
        let response = request.send()?;
        let status = response.status();
        let text = response.text()?;
        if !status.is_success() {
            let body = if text.is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            } else {
                text
            };
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }
        if text.is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&text)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::trace::TraceOutcome;
    use crate::types::GameStatus;

    const GAME_ID: &str = "6f0c2f7e-9d1b-4a6e-b1a5-51a3a8e2a111";

    fn game_id() -> Uuid {
        GAME_ID.parse().unwrap()
    }

    #[test]
    fn test_create_game_parses_id_and_state() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("POST", "/games")
            .with_status(200)
            .with_body(format!(
                r#"{{"game_id": "{GAME_ID}", "state": {{"status": "ROLE_SELECTION"}}}}"#
            ))
            .create();
        let client = ApiClient::new(server.url());
        let created = client.create_game().unwrap();
        assert_eq!(created.game_id, game_id());
        assert_eq!(
            created.state.unwrap().status,
            Some(GameStatus::RoleSelection)
        );
    }

    #[test]
    fn test_non_2xx_formats_status_and_body() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("GET", format!("/games/{GAME_ID}").as_str())
            .with_status(400)
            .with_body("ROLE_CONFIRMED only allowed from ROLE_SELECTION")
            .create();
        let client = ApiClient::new(server.url());
        let err = client.get_game(game_id()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "HTTP 400: ROLE_CONFIRMED only allowed from ROLE_SELECTION"
        );
    }

    #[test]
    fn test_non_2xx_empty_body_falls_back_to_reason() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("GET", "/health")
            .with_status(503)
            .create();
        let client = ApiClient::new(server.url());
        let err = client.health().unwrap_err();
        assert_eq!(err.to_string(), "HTTP 503: Service Unavailable");
    }

    #[test]
    fn test_empty_success_body_is_none() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("GET", format!("/games/{GAME_ID}").as_str())
            .with_status(200)
            .create();
        let client = ApiClient::new(server.url());
        assert_eq!(client.get_game(game_id()).unwrap(), None);
    }

    #[test]
    fn test_advance_sends_event_and_payload() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", format!("/games/{GAME_ID}/advance").as_str())
            .match_body(mockito::Matcher::Json(json!({
                "event": "HUMAN_VOTE",
                "payload": {"vote": "YES"}
            })))
            .with_status(200)
            .with_body(r#"{"state": {"status": "ISSUE_RESOLUTION"}}"#)
            .create();
        let client = ApiClient::new(server.url());
        let state = client
            .advance(game_id(), AdvanceEvent::HumanVote, json!({"vote": "YES"}))
            .unwrap();
        mock.assert();
        assert_eq!(
            state.unwrap().status,
            Some(GameStatus::IssueResolution)
        );
    }

    #[test]
    fn test_transcript_query_and_lenient_body() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock(
                "GET",
                format!("/games/{GAME_ID}/transcript?visible_to_human=true").as_str(),
            )
            .with_status(200)
            .with_body(r#"[{"id": "t1", "role_id": "BRA", "round": 1, "content": "hello"}]"#)
            .create();
        let client = ApiClient::new(server.url());
        let transcript = client.get_transcript(game_id(), Some(true)).unwrap();
        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript[0].role_id.as_deref(), Some("BRA"));

        let _not_a_list = server
            .mock("GET", format!("/games/{GAME_ID}/transcript").as_str())
            .with_status(200)
            .with_body(r#"{"detail": "weird"}"#)
            .create();
        assert!(client.get_transcript(game_id(), None).unwrap().is_empty());
    }

    #[test]
    fn test_traces_record_failures_too() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("GET", "/health")
            .with_status(500)
            .with_body("boom")
            .create();
        let client = ApiClient::new(server.url());
        let _ = client.health();
        let traces = client.recent_traces();
        assert_eq!(traces.len(), 1);
        assert_eq!(traces[0].outcome, TraceOutcome::Error);
        assert!(traces[0].url.ends_with("/health"));
    }
}
