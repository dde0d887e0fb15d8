use futures::StreamExt;
use std::time::Duration;
use thiserror::Error;

use crate::config::FeedConfig;
use crate::feed::parser::{self, Article, ParseError};

/// Errors that can occur while retrieving and normalizing the feed.
///
/// These cover the full lifecycle of a fetch: network issues, HTTP
/// errors, and document parsing. Missing fields on individual entries
/// are never an error; the parser defaults them to empty.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with a non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Request exceeded the configured timeout
    #[error("request timed out")]
    Timeout,
    /// Response body exceeded the configured size limit
    #[error("response too large")]
    ResponseTooLarge,
    /// Feed document could not be parsed as RSS or Atom
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Fetches the configured feed, collapsing every failure to an empty
/// list.
///
/// This is the fail-soft surface: transport and structural failures are
/// logged and swallowed, so callers cannot distinguish "feed has no
/// articles" from "fetch failed". Use [`try_fetch_articles`] when that
/// distinction matters.
pub async fn fetch_articles(client: &reqwest::Client, config: &FeedConfig) -> Vec<Article> {
    match try_fetch_articles(client, config).await {
        Ok(articles) => articles,
        Err(e) => {
            tracing::warn!(url = %config.feed_url, error = %e, "Feed fetch failed");
            Vec::new()
        }
    }
}

/// Fetches the configured feed and normalizes it into articles.
///
/// Issues a single GET request for `config.feed_url`. No retries, no
/// caching; each call owns its own parsed document.
///
/// # Errors
///
/// - [`FetchError::Timeout`] — no response within `config.timeout_secs`
/// - [`FetchError::Network`] — connection, DNS, or TLS failure
/// - [`FetchError::HttpStatus`] — non-2xx response status
/// - [`FetchError::ResponseTooLarge`] — body exceeded
///   `config.max_response_bytes`
/// - [`FetchError::Parse`] — body was not a well-formed feed document
pub async fn try_fetch_articles(
    client: &reqwest::Client,
    config: &FeedConfig,
) -> Result<Vec<Article>, FetchError> {
    let timeout = Duration::from_secs(config.timeout_secs);
    let response = tokio::time::timeout(timeout, client.get(&config.feed_url).send())
        .await
        .map_err(|_| FetchError::Timeout)?
        .map_err(FetchError::Network)?;

    if !response.status().is_success() {
        return Err(FetchError::HttpStatus(response.status().as_u16()));
    }

    let bytes = read_limited_bytes(response, config.max_response_bytes as usize).await?;
    let document = String::from_utf8_lossy(&bytes);

    Ok(parser::try_parse(&document)?)
}

/// Reads a response body with a size cap using stream-based reading.
async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    // Fast path: check Content-Length header
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(FetchError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(FetchError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}
