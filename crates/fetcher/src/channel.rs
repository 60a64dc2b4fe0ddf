//! Retrieval channels for candidate flights.
//!
//! `CandidateChannel` is the seam between the resilient fetcher and the
//! booking API. `HttpCandidateChannel` is the production implementation.

use crate::error::ChannelError;
use async_trait::async_trait;
use flight_data::{parser, CandidateFlight};
use tracing::{debug, error};

/// A source of candidate flights for an origin.
#[async_trait]
pub trait CandidateChannel: Send + Sync {
    /// Returns the name of this channel (for logging/debugging)
    fn name(&self) -> &str;

    /// Perform one retrieval attempt. No retries, no timeout.
    async fn fetch(&self, origin: &str) -> Result<Vec<CandidateFlight>, ChannelError>;
}

/// Longest error body we copy into a `Rejected` message
const MAX_ERROR_BODY: usize = 200;

/// Fetches candidates from `GET {base_url}/flights/nearby?origin={code}`.
pub struct HttpCandidateChannel {
    client: reqwest::Client,
    base_url: String,
    endpoint: reqwest::Url,
}

impl HttpCandidateChannel {
    /// Build a channel for the booking API at `base_url`
    /// (e.g. "http://localhost:8080/api").
    ///
    /// A base URL that does not parse is rejected here rather than on
    /// every fetch.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ChannelError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let endpoint = format!("{}/flights/nearby", base_url);
        let endpoint = reqwest::Url::parse(&endpoint).map_err(|e| ChannelError::InvalidUrl {
            url: endpoint.clone(),
            message: e.to_string(),
        })?;

        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| ChannelError::Connection(e.to_string()))?;
        Ok(Self {
            client,
            base_url,
            endpoint,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl CandidateChannel for HttpCandidateChannel {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch(&self, origin: &str) -> Result<Vec<CandidateFlight>, ChannelError> {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut().append_pair("origin", origin);
        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(classify)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message: String = body.chars().take(MAX_ERROR_BODY).collect();
            error!("Booking API returned {} for origin {}", status, origin);
            return Err(ChannelError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await.map_err(classify)?;
        parser::parse_candidates(&body, origin)
            .map_err(|e| ChannelError::InvalidResponse(e.to_string()))
    }
}

/// Map a transport error onto our error classes.
fn classify(e: reqwest::Error) -> ChannelError {
    if e.is_timeout() {
        ChannelError::Timeout
    } else if e.is_decode() {
        ChannelError::InvalidResponse(e.to_string())
    } else {
        ChannelError::Connection(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve a single canned HTTP response on a random local port.
    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
        });

        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_http_channel_decodes_candidates() {
        let base = serve_once(
            "200 OK",
            r#"[{"id": 1, "destinationCode": "CDG", "price": 120, "departureDate": "2026-11-02"}]"#,
        )
        .await;

        let channel = HttpCandidateChannel::new(base).unwrap();
        let candidates = channel.fetch("LHR").await.unwrap();

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].destination_code, "CDG");
        assert_eq!(candidates[0].origin_code, "LHR");
    }

    #[tokio::test]
    async fn test_http_channel_error_status_is_rejected() {
        let base = serve_once("404 Not Found", r#"{"error": "unknown origin"}"#).await;

        let channel = HttpCandidateChannel::new(base).unwrap();
        let err = channel.fetch("XXX").await.unwrap_err();

        assert!(matches!(err, ChannelError::Rejected { status: 404, .. }));
        assert!(!err.is_connectivity());
    }

    #[tokio::test]
    async fn test_http_channel_bad_body_is_invalid_response() {
        let base = serve_once("200 OK", r#"{"flights": []}"#).await;

        let channel = HttpCandidateChannel::new(base).unwrap();
        let err = channel.fetch("LHR").await.unwrap_err();
        assert!(matches!(err, ChannelError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_http_channel_refused_connection_is_connectivity() {
        // Grab a free port, then close it so nothing is listening there.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let channel = HttpCandidateChannel::new(format!("http://{}/", addr)).unwrap();
        let err = channel.fetch("LHR").await.unwrap_err();
        assert!(err.is_connectivity(), "unexpected error: {:?}", err);
    }

    #[test]
    fn test_malformed_base_url_rejected_at_construction() {
        for base in ["not a url", "http://booking api.example", ""] {
            let err = match HttpCandidateChannel::new(base) {
                Ok(_) => panic!("{:?} should not build a channel", base),
                Err(err) => err,
            };
            assert!(matches!(err, ChannelError::InvalidUrl { .. }), "{:?}: {:?}", base, err);
            assert!(!err.is_connectivity());
        }
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let channel = HttpCandidateChannel::new("http://localhost:8080/api/").unwrap();
        assert_eq!(channel.base_url(), "http://localhost:8080/api");
        assert_eq!(channel.endpoint.as_str(), "http://localhost:8080/api/flights/nearby");
    }
}
