//! Race API client: one page per call

use std::path::PathBuf;

use lapline_core::{
    Attempt, HttpResponse, Pause, RetryOutcome, RetryPolicy, ThreadPause, Transport,
    TransportError, retry_rate_limited,
};
use serde_json::Value;

use crate::config::FetchConfig;

const STATUS_OK: u16 = 200;
const STATUS_TOO_MANY_REQUESTS: u16 = 429;

/// Error from the fetch pipeline.
#[derive(Debug)]
pub enum FetchError {
    /// Non-success status, or still rate limited after the retry budget
    Request { status: u16, url: String },
    /// Network failure; never retried
    Transport(TransportError),
    /// Local persistence failure
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// 200 response whose body is not JSON or lacks the envelope field
    Payload { url: String, message: String },
    /// Request parameters that cannot make progress
    InvalidRequest(String),
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Request { status, url } => write!(f, "HTTP {status} from {url}"),
            Self::Transport(e) => write!(f, "transport: {e}"),
            Self::Io { path, source } => write!(f, "IO: {}: {source}", path.display()),
            Self::Payload { url, message } => write!(f, "bad payload from {url}: {message}"),
            Self::InvalidRequest(msg) => write!(f, "invalid request: {msg}"),
        }
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Transport(e) => Some(e),
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<TransportError> for FetchError {
    fn from(e: TransportError) -> Self {
        Self::Transport(e)
    }
}

impl FetchError {
    /// HTTP status carried by a `Request` failure
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Request { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Coordinates of one page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchRequest<'a> {
    pub base_url: &'a str,
    pub endpoint: &'a str,
    pub season: i32,
    pub offset: u64,
    pub limit: u64,
}

impl FetchRequest<'_> {
    /// `{base}/{season}/{endpoint}`
    pub fn url(&self) -> String {
        format!(
            "{}/{}/{}",
            self.base_url.trim_end_matches('/'),
            self.season,
            self.endpoint.trim_matches('/')
        )
    }

    pub fn query(&self) -> [(&'static str, String); 2] {
        [
            ("offset", self.offset.to_string()),
            ("limit", self.limit.to_string()),
        ]
    }
}

/// Envelope of one successful page.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedPage {
    /// Contents of the envelope field, persisted verbatim
    pub payload: Value,
    /// Record count the API declares for the whole season
    pub total: Option<u64>,
    pub season: i32,
    pub endpoint: String,
    pub offset: u64,
    pub limit: u64,
    /// Rate-limit retries spent on this page
    pub retries: u32,
}

/// Read `total` from an envelope; the API sends it as a string.
pub fn declared_total(envelope: &Value) -> Option<u64> {
    match envelope.get("total")? {
        Value::String(s) => s.trim().parse().ok(),
        Value::Number(n) => n.as_u64(),
        _ => None,
    }
}

fn extract_envelope(body: &str, field: &str) -> Result<Value, String> {
    let mut parsed: Value = serde_json::from_str(body).map_err(|e| format!("invalid JSON: {e}"))?;
    parsed
        .get_mut(field)
        .map(Value::take)
        .ok_or_else(|| format!("no '{field}' field in response"))
}

/// Single-page fetcher with rate-limit retry.
pub struct PageFetcher<T, P = ThreadPause> {
    transport: T,
    pause: P,
    base_url: String,
    envelope: String,
    retry: RetryPolicy,
}

impl<T: Transport, P: Pause> PageFetcher<T, P> {
    pub fn new(transport: T, pause: P, config: &FetchConfig) -> Self {
        Self {
            transport,
            pause,
            base_url: config.base_url.clone(),
            envelope: config.envelope.clone(),
            retry: config.retry,
        }
    }

    /// GET one page.
    ///
    /// 429 is retried with a fixed pause; any other non-200 status fails
    /// at once. Transport errors are returned as they are.
    pub fn fetch_page(
        &self,
        endpoint: &str,
        season: i32,
        offset: u64,
        limit: u64,
    ) -> Result<FetchedPage, FetchError> {
        let request = FetchRequest {
            base_url: &self.base_url,
            endpoint,
            season,
            offset,
            limit,
        };
        let url = request.url();
        let query = request.query();
        let label = format!("{endpoint} {season} offset={offset}");

        log::debug!("GET {url}?offset={offset}&limit={limit}");
        let outcome = retry_rate_limited(
            &label,
            &self.retry,
            &self.pause,
            || -> Result<Attempt<HttpResponse>, FetchError> {
                let response = self.transport.get(&url, &query)?;
                if response.status == STATUS_TOO_MANY_REQUESTS {
                    return Ok(Attempt::RateLimited {
                        status: response.status,
                    });
                }
                Ok(Attempt::Ready(response))
            },
        )?;

        let (response, retries) = match outcome {
            RetryOutcome::Success { value, retries } => (value, retries),
            RetryOutcome::Exhausted { status, .. } => {
                return Err(FetchError::Request { status, url });
            }
        };

        if response.status != STATUS_OK {
            log::error!("{label}: HTTP {}", response.status);
            return Err(FetchError::Request {
                status: response.status,
                url,
            });
        }

        let payload = extract_envelope(&response.body, &self.envelope)
            .map_err(|message| FetchError::Payload {
                url: url.clone(),
                message,
            })?;
        let total = declared_total(&payload);

        Ok(FetchedPage {
            payload,
            total,
            season,
            endpoint: endpoint.to_string(),
            offset,
            limit,
            retries,
        })
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn pause(&self) -> &P {
        &self.pause
    }
}
