//! Low-level utilities shared across threadline crates.
//!
//! Holds the HTTP request loop and retry/backoff helpers used by both API
//! clients, and the cancellation signal threaded through every long-running
//! sync call.

pub mod cancel_signal;
pub mod rest_client;
pub mod transport_helpers;

pub use cancel_signal::{CancelHandle, CancelSignal, Cancelled};
pub use rest_client::{request_json, Replay, RetryPolicy};
pub use transport_helpers::{
    is_retryable_status, is_retryable_transport_error, parse_retry_after, retry_delay,
    truncate_for_error,
};
