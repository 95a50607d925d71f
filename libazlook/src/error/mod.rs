//! Error types for azlook
//!
//! Every library operation returns [`AzError`]. Variants follow the failure
//! classes a caller can act on: transport, authentication, credential chain,
//! missing resources, throttling, server faults, bad input and configuration.

use thiserror::Error;

#[cfg(test)]
mod tests;

/// Main error type for azlook operations
#[derive(Error, Debug)]
pub enum AzError {
    /// Network-related errors (connection, timeout, DNS)
    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Authentication errors (401, 403, token exchange rejected)
    #[error("Authentication error (status: {status_code:?}): {message}")]
    Authentication {
        message: String,
        status_code: Option<u16>,
    },

    /// No credential source could produce a token
    #[error("Credential unavailable: {message}{}", format_attempts(.attempts))]
    Credential {
        message: String,
        attempts: Vec<String>,
    },

    /// Resource not found errors (404)
    #[error("{resource_type} not found: {name}")]
    NotFound { resource_type: String, name: String },

    /// Rate limiting errors (429)
    #[error("Rate limit: {message}")]
    RateLimit {
        message: String,
        retry_after: Option<u64>,
    },

    /// Server errors (500, 502, 503, 504)
    #[error("Server error (status: {status_code}): {message}")]
    Server { message: String, status_code: u16 },

    /// Validation errors (bad URL, digest, response body, header)
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration errors (invalid config file, missing settings)
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        path: Option<String>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

fn format_attempts(attempts: &[String]) -> String {
    if attempts.is_empty() {
        return String::new();
    }
    let mut out = String::new();
    for attempt in attempts {
        out.push_str("\n  - ");
        out.push_str(attempt);
    }
    out
}

/// Result type alias for azlook operations
pub type Result<T> = std::result::Result<T, AzError>;

impl AzError {
    /// Creates a new network error.
    ///
    /// # Examples
    ///
    /// ```
    /// use libazlook::error::AzError;
    ///
    /// let err = AzError::network("connection refused");
    /// assert!(matches!(err, AzError::Network { .. }));
    /// ```
    pub fn network<S: Into<String>>(message: S) -> Self {
        Self::Network {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new network error with a source error.
    pub fn network_with_source<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Network {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a new authentication error.
    ///
    /// # Examples
    ///
    /// ```
    /// use libazlook::error::AzError;
    ///
    /// let err = AzError::authentication("invalid credentials", Some(401));
    /// assert!(matches!(err, AzError::Authentication { .. }));
    /// ```
    pub fn authentication<S: Into<String>>(message: S, status_code: Option<u16>) -> Self {
        Self::Authentication {
            message: message.into(),
            status_code,
        }
    }

    /// Creates a credential-chain error with one message per attempted source.
    ///
    /// # Examples
    ///
    /// ```
    /// use libazlook::error::AzError;
    ///
    /// let err = AzError::credential(
    ///     "no source produced a token",
    ///     vec!["AzureCliCredential: az not found".to_string()],
    /// );
    /// assert!(err.to_string().contains("AzureCliCredential"));
    /// ```
    pub fn credential<S: Into<String>>(message: S, attempts: Vec<String>) -> Self {
        Self::Credential {
            message: message.into(),
            attempts,
        }
    }

    /// Creates a new not found error.
    ///
    /// # Examples
    ///
    /// ```
    /// use libazlook::error::AzError;
    ///
    /// let err = AzError::not_found("repository", "hello-world");
    /// assert_eq!(err.to_string(), "repository not found: hello-world");
    /// ```
    pub fn not_found<S: Into<String>>(resource_type: S, name: S) -> Self {
        Self::NotFound {
            resource_type: resource_type.into(),
            name: name.into(),
        }
    }

    /// Creates a new rate limit error.
    pub fn rate_limit<S: Into<String>>(message: S, retry_after: Option<u64>) -> Self {
        Self::RateLimit {
            message: message.into(),
            retry_after,
        }
    }

    /// Creates a new server error.
    pub fn server<S: Into<String>>(message: S, status_code: u16) -> Self {
        Self::Server {
            message: message.into(),
            status_code,
        }
    }

    /// Creates a new validation error.
    ///
    /// # Examples
    ///
    /// ```
    /// use libazlook::error::AzError;
    ///
    /// let err = AzError::validation("invalid container name");
    /// assert!(matches!(err, AzError::Validation { .. }));
    /// ```
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new validation error with a source error.
    pub fn validation_with_source<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Validation {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a new configuration error.
    pub fn config<S: Into<String>>(message: S, path: Option<S>) -> Self {
        Self::Config {
            message: message.into(),
            path: path.map(|p| p.into()),
            source: None,
        }
    }

    /// Creates a new configuration error with a source error.
    pub fn config_with_source<S, E>(message: S, path: Option<S>, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Config {
            message: message.into(),
            path: path.map(|p| p.into()),
            source: Some(Box::new(source)),
        }
    }

    /// Returns true for 401/403 style failures and token exchange rejections.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Authentication { .. } | Self::Credential { .. })
    }
}

impl From<config::ConfigError> for AzError {
    fn from(err: config::ConfigError) -> Self {
        AzError::config_with_source("Failed to build configuration", None::<&str>, err)
    }
}
