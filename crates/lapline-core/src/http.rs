//! Blocking HTTP GET over a shared async client.
//!
//! Uses async reqwest internally, driven through a shared tokio runtime,
//! but presents a sync interface so the pipelines stay single-threaded.

use std::sync::LazyLock;
use std::time::Duration;

/// Connect timeout
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Network-level failure: nothing usable came back from the host.
#[derive(Debug)]
pub enum TransportError {
    /// DNS or TCP/TLS connect failure
    Connect { url: String, message: String },
    /// Request or body read timed out
    Timeout { url: String, message: String },
    /// Anything else reqwest reports before a status is available
    Other { url: String, message: String },
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Connect { url, message } => write!(f, "connect to {url} failed: {message}"),
            Self::Timeout { url, message } => write!(f, "request to {url} timed out: {message}"),
            Self::Other { url, message } => write!(f, "request to {url} failed: {message}"),
        }
    }
}

impl std::error::Error for TransportError {}

impl TransportError {
    /// Classify a reqwest error
    pub fn from_reqwest(url: &str, e: &reqwest::Error) -> Self {
        let message = e.to_string();
        let url = url.to_string();
        if e.is_timeout() {
            Self::Timeout { url, message }
        } else if e.is_connect() {
            Self::Connect { url, message }
        } else {
            Self::Other { url, message }
        }
    }

    pub fn url(&self) -> &str {
        match self {
            Self::Connect { url, .. } | Self::Timeout { url, .. } | Self::Other { url, .. } => url,
        }
    }
}

/// Status and body of a completed request. Non-2xx statuses are not errors here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// One GET at a time. Implemented by [`HttpTransport`] and by scripted fakes in tests.
pub trait Transport {
    fn get(&self, url: &str, query: &[(&str, String)]) -> Result<HttpResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn get(&self, url: &str, query: &[(&str, String)]) -> Result<HttpResponse, TransportError> {
        (**self).get(url, query)
    }
}

/// Shared async HTTP client with connection pooling.
static SHARED_CLIENT: LazyLock<reqwest::Client> = LazyLock::new(|| {
    reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .user_agent(concat!("lapline/", env!("CARGO_PKG_VERSION")))
        .pool_max_idle_per_host(2)
        .build()
        .expect("failed to build HTTP client")
});

/// Get shared HTTP client.
fn http_client() -> &'static reqwest::Client {
    &SHARED_CLIENT
}

/// Shared tokio runtime for HTTP operations.
static SHARED_RUNTIME: LazyLock<tokio::runtime::Runtime> = LazyLock::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .expect("failed to build tokio runtime")
});

/// Real transport backed by the shared client and runtime.
#[derive(Debug, Default, Clone, Copy)]
pub struct HttpTransport;

impl Transport for HttpTransport {
    fn get(&self, url: &str, query: &[(&str, String)]) -> Result<HttpResponse, TransportError> {
        SHARED_RUNTIME.handle().block_on(async {
            let response = http_client()
                .get(url)
                .query(query)
                .send()
                .await
                .map_err(|e| TransportError::from_reqwest(url, &e))?;

            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .map_err(|e| TransportError::from_reqwest(url, &e))?;

            Ok(HttpResponse { status, body })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(u16);

    impl Transport for Fixed {
        fn get(&self, _url: &str, query: &[(&str, String)]) -> Result<HttpResponse, TransportError> {
            Ok(HttpResponse::new(self.0, format!("{}", query.len())))
        }
    }

    #[test]
    fn display_connect() {
        let err = TransportError::Connect {
            url: "https://example.test/2023/results".to_string(),
            message: "dns error".to_string(),
        };
        assert_eq!(
            format!("{err}"),
            "connect to https://example.test/2023/results failed: dns error"
        );
    }

    #[test]
    fn display_timeout() {
        let err = TransportError::Timeout {
            url: "u".to_string(),
            message: "deadline".to_string(),
        };
        assert!(format!("{err}").contains("timed out"));
        assert_eq!(err.url(), "u");
    }

    fn get_once(transport: impl Transport) -> HttpResponse {
        transport
            .get("u", &[("offset", "0".to_string())])
            .unwrap()
    }

    #[test]
    fn transport_by_reference() {
        let fixed = Fixed(200);
        assert_eq!(get_once(&fixed), HttpResponse::new(200, "1"));
        assert_eq!(get_once(fixed), HttpResponse::new(200, "1"));
    }

    /// Serve one canned response on loopback; yields the request line.
    fn serve_once(response: &'static str) -> (String, std::thread::JoinHandle<String>) {
        use std::io::{BufRead, BufReader, Write};

        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/f1/2023/results", listener.local_addr().unwrap());
        let handle = std::thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut request_line = String::new();
            reader.read_line(&mut request_line).unwrap();
            let mut header = String::new();
            while reader.read_line(&mut header).unwrap() > 0 && header != "\r\n" {
                header.clear();
            }
            let mut stream = stream;
            stream.write_all(response.as_bytes()).unwrap();
            request_line
        });
        (url, handle)
    }

    #[test]
    fn loopback_rate_limit_status_passes_through() {
        let (url, server) = serve_once(
            "HTTP/1.1 429 Too Many Requests\r\nContent-Length: 4\r\nConnection: close\r\n\r\nslow",
        );
        let response = HttpTransport
            .get(&url, &[("limit", "30".to_string()), ("offset", "30".to_string())])
            .unwrap();
        assert_eq!(response, HttpResponse::new(429, "slow"));

        let request_line = server.join().unwrap();
        assert!(request_line.starts_with("GET /f1/2023/results?limit=30&offset=30 "));
    }

    #[test]
    fn loopback_server_error_is_not_a_transport_error() {
        let (url, server) = serve_once(
            "HTTP/1.1 500 Internal Server Error\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        );
        let response = HttpTransport.get(&url, &[]).unwrap();
        assert_eq!(response.status, 500);
        assert!(response.body.is_empty());
        server.join().unwrap();
    }

    #[test]
    fn closed_port_is_connect_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/f1/2023/results", listener.local_addr().unwrap());
        drop(listener);

        let err = HttpTransport.get(&url, &[]).unwrap_err();
        assert!(matches!(err, TransportError::Connect { .. }), "{err:?}");
        assert_eq!(err.url(), url);
    }
}
