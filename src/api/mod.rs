pub mod client;
pub mod trace;

pub use client::{ApiClient, ApiError, CreatedGame};
pub use trace::{RequestSpec, RequestTrace, TraceOutcome, traced};
