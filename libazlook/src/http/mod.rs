//! Shared HTTP transport for Azure service calls.
//!
//! This module wraps a pooled reqwest client and provides the pieces every
//! service client needs: endpoint normalization, status-to-error mapping and
//! `Link` header pagination.

use crate::error::{AzError, Result};
use reqwest::header::HeaderMap;
use reqwest::{Client as ReqwestClient, Response, StatusCode};
use std::time::Duration;
use url::Url;

#[cfg(test)]
mod tests;

/// Configuration for the HTTP client.
///
/// # Examples
///
/// ```
/// use libazlook::http::ClientConfig;
///
/// let config = ClientConfig::new()
///     .with_timeout(60)
///     .with_max_idle_per_host(20);
/// assert_eq!(config.timeout_seconds, 60);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Request timeout in seconds (default: 30)
    pub timeout_seconds: u64,
    /// Maximum idle connections per host (default: 10)
    pub max_idle_per_host: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            max_idle_per_host: 10,
        }
    }
}

impl ClientConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the request timeout in seconds.
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    /// Sets the maximum idle connections per host.
    pub fn with_max_idle_per_host(mut self, max: usize) -> Self {
        self.max_idle_per_host = max;
        self
    }
}

/// Pooled HTTP client shared by the registry, storage and credential code.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: ReqwestClient,
    timeout_seconds: u64,
}

impl HttpClient {
    /// Builds a client with the given configuration.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let inner = ReqwestClient::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .pool_max_idle_per_host(config.max_idle_per_host)
            .user_agent(concat!("azlook/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AzError::network_with_source("Failed to create HTTP client", e))?;

        Ok(Self {
            inner,
            timeout_seconds: config.timeout_seconds,
        })
    }

    /// Returns the underlying reqwest client.
    pub fn inner(&self) -> &ReqwestClient {
        &self.inner
    }

    /// Sends a prepared request, translating transport failures.
    pub async fn send(&self, request: reqwest::RequestBuilder, target: &str) -> Result<Response> {
        request
            .send()
            .await
            .map_err(|e| translate_reqwest_error(e, target, self.timeout_seconds))
    }
}

/// Normalizes a service endpoint.
///
/// Adds `https://` when no scheme is given, rejects anything that is not
/// http or https, requires a host and strips trailing slashes.
///
/// # Examples
///
/// ```
/// use libazlook::http::normalize_endpoint;
///
/// assert_eq!(
///     normalize_endpoint("myregistry.azurecr.io/").unwrap(),
///     "https://myregistry.azurecr.io"
/// );
/// assert!(normalize_endpoint("ftp://example.com").is_err());
/// ```
pub fn normalize_endpoint(endpoint: &str) -> Result<String> {
    let endpoint = endpoint.trim();

    if endpoint.is_empty() {
        return Err(AzError::validation("Endpoint URL cannot be empty"));
    }

    let candidate = if endpoint.contains("://") {
        endpoint.to_string()
    } else {
        format!("https://{}", endpoint)
    };

    let parsed = Url::parse(&candidate)
        .map_err(|e| AzError::validation_with_source(format!("Invalid URL '{}'", endpoint), e))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(AzError::validation(format!(
                "Invalid URL scheme '{}'. Only 'http' and 'https' are supported.",
                scheme
            )));
        }
    }

    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(AzError::validation(format!(
            "Invalid URL '{}': missing host",
            endpoint
        )));
    }

    Ok(candidate.trim_end_matches('/').to_string())
}

/// Extracts the next page target from an RFC 5988 `Link` header.
///
/// Format: `</acr/v1/_catalog?last=repo99&n=100>; rel="next"`
pub fn extract_next_link(headers: &HeaderMap) -> Option<String> {
    let link_str = headers.get(reqwest::header::LINK)?.to_str().ok()?;

    for link_part in link_str.split(',') {
        let link_part = link_part.trim();

        if link_part.contains("rel=\"next\"") || link_part.contains("rel='next'") {
            if let Some(start) = link_part.find('<')
                && let Some(end) = link_part.find('>')
                && start < end
            {
                return Some(link_part[start + 1..end].to_string());
            }
        }
    }

    None
}

/// Resolves a `Link` target against the service endpoint.
///
/// ACR returns paths; other services may return absolute URLs.
pub fn resolve_link(endpoint: &str, link: &str) -> String {
    if link.starts_with("http://") || link.starts_with("https://") {
        link.to_string()
    } else if link.starts_with('/') {
        format!("{}{}", endpoint, link)
    } else {
        format!("{}/{}", endpoint, link)
    }
}

/// Parses a `Retry-After` header given in seconds.
pub fn retry_after_seconds(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

/// Translates a reqwest error into an AzError.
pub fn translate_reqwest_error(error: reqwest::Error, target: &str, timeout_secs: u64) -> AzError {
    if error.is_timeout() {
        AzError::network(format!(
            "Request to {} timed out after {} seconds",
            target, timeout_secs
        ))
    } else if error.is_connect() {
        AzError::network_with_source(format!("Failed to connect to {}", target), error)
    } else if error.is_request() {
        AzError::network_with_source(format!("Failed to send request to {}", target), error)
    } else {
        AzError::network_with_source(
            format!("Network error communicating with {}", target),
            error,
        )
    }
}

/// Checks the HTTP response status and translates errors to AzError.
///
/// `resource` names what a 404 refers to, e.g. `("container", "photos")`.
pub async fn check_response_status(
    response: Response,
    resource: Option<(&str, &str)>,
) -> Result<Response> {
    let status = response.status();

    if status.is_success() {
        return Ok(response);
    }

    let url = response.url().to_string();
    let retry_after = retry_after_seconds(response.headers());
    let error_body = response
        .text()
        .await
        .unwrap_or_else(|_| String::from("(unable to read response body)"));

    Err(status_to_error(status, &url, &error_body, retry_after, resource))
}

pub(crate) fn status_to_error(
    status: StatusCode,
    url: &str,
    body: &str,
    retry_after: Option<u64>,
    resource: Option<(&str, &str)>,
) -> AzError {
    match status {
        StatusCode::UNAUTHORIZED => AzError::authentication(
            format!("Authentication required for {}: {}", url, body),
            Some(401),
        ),
        StatusCode::FORBIDDEN => AzError::authentication(
            format!("Access forbidden for {}: {}", url, body),
            Some(403),
        ),
        StatusCode::NOT_FOUND => match resource {
            Some((kind, name)) => AzError::not_found(kind, name),
            None => AzError::not_found("endpoint", url),
        },
        StatusCode::TOO_MANY_REQUESTS => {
            AzError::rate_limit(format!("Rate limit exceeded for {}", url), retry_after)
        }
        StatusCode::INTERNAL_SERVER_ERROR
        | StatusCode::BAD_GATEWAY
        | StatusCode::SERVICE_UNAVAILABLE
        | StatusCode::GATEWAY_TIMEOUT => AzError::server(
            format!("Server error from {}: {}", url, body),
            status.as_u16(),
        ),
        _ => AzError::network(format!("HTTP {} from {}: {}", status.as_u16(), url, body)),
    }
}
