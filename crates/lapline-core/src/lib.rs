//! Lapline Core - Common infrastructure for race-data pipelines
//!
//! This crate provides the pieces shared by the fetch and build
//! pipelines: the on-disk layout, a blocking HTTP transport,
//! fixed-interval retry for rate-limited requests, logging setup,
//! and progress lines.

pub mod http;
pub mod layout;
pub mod logging;
pub mod progress;
pub mod retry;

// Re-exports for convenience
pub use http::{HttpResponse, HttpTransport, Transport, TransportError};
pub use logging::{IndicatifLogger, init_logging};
pub use progress::{ProgressContext, SharedProgress, fmt_num};
pub use retry::{Attempt, Pause, RetryOutcome, RetryPolicy, ThreadPause, retry_rate_limited};
