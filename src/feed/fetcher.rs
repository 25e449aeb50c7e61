use crate::credentials::Credentials;
use futures::StreamExt;
use reqwest::header::WWW_AUTHENTICATE;
use reqwest::{Response, StatusCode};
use std::time::Duration;
use thiserror::Error;
use url::{Host, Url};

const MAX_FEED_SIZE: usize = 10 * 1024 * 1024; // 10MB

/// Errors that can occur while retrieving the feed body.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Fetch exceeded the configured timeout
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
    /// Server answered 401 without offering the Basic scheme
    #[error("Server requested authentication without a Basic challenge")]
    UnsupportedChallenge,
    /// Server answered 401 again after credentials were supplied
    #[error("Credentials rejected for user '{0}'")]
    AuthRejected(String),
    /// Server challenged over plain HTTP from a non-loopback host
    #[error("Refusing to send credentials over plain HTTP to {0}")]
    InsecureTransport(String),
    /// Response body exceeded the 10MB size limit
    #[error("Response too large")]
    ResponseTooLarge,
}

/// A parsed `WWW-Authenticate` challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Challenge {
    pub scheme: String,
    pub realm: Option<String>,
}

impl Challenge {
    /// Parse every challenge in one header value.
    ///
    /// A value may carry several comma-separated challenges, e.g.
    /// `Bearer realm="api", Basic realm="New mail feed"`. A list item whose
    /// first token has no `=` starts a new challenge; the others are
    /// parameters of the challenge before them.
    pub fn parse_all(header: &str) -> Vec<Self> {
        let mut challenges: Vec<Self> = Vec::new();

        for item in split_list(header) {
            let (first, rest) = match item.split_once(char::is_whitespace) {
                Some((first, rest)) => (first, rest.trim_start()),
                None => (item, ""),
            };

            let param = if first.contains('=') {
                Some(item)
            } else {
                challenges.push(Self {
                    scheme: first.to_string(),
                    realm: None,
                });
                Some(rest).filter(|rest| !rest.is_empty())
            };

            let (Some(param), Some(current)) = (param, challenges.last_mut()) else {
                continue;
            };
            if let Some((key, value)) = param.split_once('=') {
                if key.trim().eq_ignore_ascii_case("realm") && current.realm.is_none() {
                    current.realm = Some(unquote(value.trim()));
                }
            }
        }

        challenges
    }

    pub fn is_basic(&self) -> bool {
        self.scheme.eq_ignore_ascii_case("basic")
    }
}

/// Split a header list on commas that are outside quoted strings.
fn split_list(header: &str) -> Vec<&str> {
    let mut items = Vec::new();
    let mut in_quotes = false;
    let mut escaped = false;
    let mut start = 0;

    for (i, c) in header.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' if in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                items.push(&header[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    items.push(&header[start..]);

    items
        .into_iter()
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .collect()
}

/// Value of a token or quoted-string parameter, with backslash escapes resolved.
fn unquote(value: &str) -> String {
    let Some(inner) = value
        .strip_prefix('"')
        .map(|v| v.strip_suffix('"').unwrap_or(v))
    else {
        return value.to_string();
    };

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Fetch the raw feed body from `url`.
///
/// The first request carries no credentials. Only when the server answers
/// `401 Unauthorized` with a Basic challenge is the request repeated, once,
/// with `credentials`. `timeout` bounds the whole exchange; `None` leaves it
/// to the transport stack.
///
/// # Errors
///
/// - [`FetchError::Network`] - Connection, DNS or TLS errors
/// - [`FetchError::Timeout`] - Exchange exceeded `timeout`
/// - [`FetchError::UnsupportedChallenge`] - 401 without a Basic challenge
/// - [`FetchError::InsecureTransport`] - Challenge over plain HTTP to a remote host
/// - [`FetchError::AuthRejected`] - 401 after credentials were supplied
/// - [`FetchError::HttpStatus`] - Any other non-2xx response
/// - [`FetchError::ResponseTooLarge`] - Body exceeded 10MB
pub async fn fetch_feed(
    client: &reqwest::Client,
    url: &str,
    credentials: &Credentials,
    timeout: Option<Duration>,
) -> Result<Vec<u8>, FetchError> {
    match timeout {
        Some(limit) => tokio::time::timeout(limit, fetch_with_challenge(client, url, credentials))
            .await
            .map_err(|_| FetchError::Timeout(limit))?,
        None => fetch_with_challenge(client, url, credentials).await,
    }
}

async fn fetch_with_challenge(
    client: &reqwest::Client,
    url: &str,
    credentials: &Credentials,
) -> Result<Vec<u8>, FetchError> {
    let response = client.get(url).send().await?;

    let response = if response.status() == StatusCode::UNAUTHORIZED {
        let challenge = basic_challenge(&response).ok_or(FetchError::UnsupportedChallenge)?;
        ensure_secure_transport(response.url())?;
        tracing::debug!(
            realm = challenge.realm.as_deref().unwrap_or(""),
            username = credentials.username(),
            "Answering Basic authentication challenge"
        );

        // Resend to the URL that issued the challenge (after any redirects)
        let challenged_url = response.url().clone();
        let retried = client
            .get(challenged_url)
            .basic_auth(credentials.username(), Some(credentials.password()))
            .send()
            .await?;

        if retried.status() == StatusCode::UNAUTHORIZED {
            return Err(FetchError::AuthRejected(credentials.username().to_string()));
        }
        retried
    } else {
        response
    };

    if !response.status().is_success() {
        return Err(FetchError::HttpStatus(response.status().as_u16()));
    }

    let bytes = read_limited_bytes(response, MAX_FEED_SIZE).await?;
    tracing::debug!(bytes = bytes.len(), "Fetched feed body");
    Ok(bytes)
}

/// First Basic challenge among the response's `WWW-Authenticate` headers.
fn basic_challenge(response: &Response) -> Option<Challenge> {
    response
        .headers()
        .get_all(WWW_AUTHENTICATE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Challenge::parse_all)
        .find(Challenge::is_basic)
}

/// Basic credentials travel in the clear, so they only go over HTTPS or to
/// a loopback host.
fn ensure_secure_transport(url: &Url) -> Result<(), FetchError> {
    if url.scheme() == "https" {
        return Ok(());
    }
    let is_loopback = match url.host() {
        Some(Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
        Some(Host::Ipv4(ip)) => ip.is_loopback(),
        Some(Host::Ipv6(ip)) => ip.is_loopback(),
        None => false,
    };
    if is_loopback {
        tracing::warn!(url = %url, "Sending credentials over plain HTTP (loopback only)");
        return Ok(());
    }
    Err(FetchError::InsecureTransport(
        url.host_str().unwrap_or_default().to_string(),
    ))
}

async fn read_limited_bytes(response: Response, limit: usize) -> Result<Vec<u8>, FetchError> {
    // Fast path: check Content-Length header
    if let Some(len) = response.content_length() {
        if len > limit as u64 {
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
