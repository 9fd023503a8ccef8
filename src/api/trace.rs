use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

/// Uniform record of one API call, kept for the debug pane regardless of
/// whether the call succeeded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestTrace {
    pub method: String,
    pub url: String,
    pub body: Option<Value>,
    pub timestamp: DateTime<Utc>,
    pub outcome: TraceOutcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceOutcome {
    Ok,
    Error,
}

/// What is about to be sent, captured before execution.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSpec {
    pub method: &'static str,
    pub url: String,
    pub body: Option<Value>,
}

/// Run `exec`, returning its result together with the trace record. All
/// failures come back as data; this function itself has no failure path.
pub fn traced<T, E>(
    spec: RequestSpec,
    exec: impl FnOnce() -> Result<T, E>,
) -> (RequestTrace, Result<T, E>) {
    let timestamp = Utc::now();
    let result = exec();
    let outcome = if result.is_ok() {
        TraceOutcome::Ok
    } else {
        TraceOutcome::Error
    };
    let trace = RequestTrace {
        method: spec.method.to_string(),
        url: spec.url,
        body: spec.body,
        timestamp,
        outcome,
    };
    (trace, result)
}
