//! HTTP client construction
//!
//! One client per fetcher; the connection pool is shared by all workers.

use footprint_core::PolitenessConfig;
use reqwest::{redirect, Client, Response};
use thiserror::Error;
use url::Url;

/// Maximum redirects followed for a single request
const MAX_REDIRECTS: usize = 5;

/// Errors from the networking layer
#[derive(Debug, Error)]
pub enum NetError {
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Malformed payload: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Create the HTTP client used for every outbound request
pub fn create_client(config: &PolitenessConfig) -> Result<Client, NetError> {
    Client::builder()
        .timeout(config.request_timeout())
        .user_agent(config.user_agent.as_str())
        .redirect(redirect::Policy::limited(MAX_REDIRECTS))
        .build()
        .map_err(|e| NetError::ClientBuild(e.to_string()))
}

/// Parse an absolute http(s) URL
pub fn parse_http_url(raw: &str) -> Result<Url, NetError> {
    let url = Url::parse(raw.trim()).map_err(|e| NetError::InvalidUrl(format!("{}: {}", raw, e)))?;

    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Ok(url),
        _ => Err(NetError::InvalidUrl(raw.to_string())),
    }
}

/// Rate-limit and robots scope of a URL: lowercase host, plus the port when non-default
pub fn domain_key(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default().to_lowercase();
    match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host,
    }
}

/// robots.txt location for the URL's origin
pub fn robots_url(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{}://{}:{}/robots.txt", url.scheme(), host, port),
        None => format!("{}://{}/robots.txt", url.scheme(), host),
    }
}

/// Read a response body, keeping at most `limit` bytes
pub async fn read_body_limited(mut response: Response, limit: usize) -> Result<String, NetError> {
    let mut body: Vec<u8> = Vec::new();

    while let Some(chunk) = response.chunk().await? {
        let remaining = limit.saturating_sub(body.len());
        if chunk.len() >= remaining {
            body.extend_from_slice(&chunk[..remaining]);
            tracing::debug!("Body truncated at {} bytes", limit);
            break;
        }
        body.extend_from_slice(&chunk);
    }

    Ok(String::from_utf8_lossy(&body).into_owned())
}
