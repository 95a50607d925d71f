//! Authentication for Azure services.
//!
//! Two layers live here. Azure AD tokens come from a [`TokenCredential`]; the
//! [`DefaultAzureCredential`] chain tries environment, managed identity and
//! Azure CLI sources in order. Registry access additionally accepts admin-user
//! Basic credentials or anonymous pull, expressed as [`RegistryCredentials`],
//! and understands the `WWW-Authenticate` challenge ACR sends back.

use crate::error::{AzError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::fmt;
use std::sync::Arc;

mod chain;
mod cli;
mod client_secret;
mod managed_identity;

pub use chain::DefaultAzureCredential;
pub use cli::AzureCliCredential;
pub use client_secret::ClientSecretCredential;
pub use managed_identity::ManagedIdentityCredential;

#[cfg(test)]
mod tests;

/// Scope for Azure Storage data-plane requests.
pub const STORAGE_SCOPE: &str = "https://storage.azure.com/.default";

/// Environment variable holding a pre-acquired bearer token.
pub const ACCESS_TOKEN_ENV: &str = "AZURE_ACCESS_TOKEN";

/// An Azure AD access token with its expiry.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    /// The bearer token
    pub token: String,
    /// When the token stops being accepted
    pub expires_on: DateTime<Utc>,
}

impl AccessToken {
    /// Creates a new access token.
    pub fn new(token: impl Into<String>, expires_on: DateTime<Utc>) -> Self {
        Self {
            token: token.into(),
            expires_on,
        }
    }

    /// Returns true if the token expires within `skew` from now.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::{Duration, Utc};
    /// use libazlook::auth::AccessToken;
    ///
    /// let token = AccessToken::new("t", Utc::now() + Duration::minutes(2));
    /// assert!(token.is_expired(Duration::minutes(5)));
    /// assert!(!token.is_expired(Duration::zero()));
    /// ```
    pub fn is_expired(&self, skew: Duration) -> bool {
        self.expires_on - skew <= Utc::now()
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"<redacted>")
            .field("expires_on", &self.expires_on)
            .finish()
    }
}

/// A source of Azure AD access tokens.
#[async_trait]
pub trait TokenCredential: Send + Sync + fmt::Debug {
    /// Short name used in logs and chained error messages.
    fn name(&self) -> &'static str;

    /// Acquires a token valid for the given scopes.
    async fn get_token(&self, scopes: &[&str]) -> Result<AccessToken>;
}

/// A fixed bearer token, typically taken from `AZURE_ACCESS_TOKEN`.
#[derive(Debug, Clone)]
pub struct StaticTokenCredential {
    token: AccessToken,
}

impl StaticTokenCredential {
    /// Wraps a token that is assumed valid for the next hour.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: AccessToken::new(token, Utc::now() + Duration::hours(1)),
        }
    }

    /// Reads the token from the environment through `lookup`.
    pub fn from_lookup<F>(lookup: &F) -> Option<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        lookup(ACCESS_TOKEN_ENV)
            .filter(|t| !t.trim().is_empty())
            .map(|t| Self::new(t.trim()))
    }
}

#[async_trait]
impl TokenCredential for StaticTokenCredential {
    fn name(&self) -> &'static str {
        "StaticTokenCredential"
    }

    async fn get_token(&self, _scopes: &[&str]) -> Result<AccessToken> {
        Ok(self.token.clone())
    }
}

/// Converts a `/.default` scope into the v1 `resource` form used by IMDS and
/// the Azure CLI.
///
/// # Examples
///
/// ```
/// use libazlook::auth::scope_to_resource;
///
/// assert_eq!(
///     scope_to_resource("https://management.azure.com/.default"),
///     "https://management.azure.com"
/// );
/// ```
pub fn scope_to_resource(scope: &str) -> &str {
    scope.strip_suffix("/.default").unwrap_or(scope)
}

/// Requires exactly one scope, as the v1 token endpoints do.
pub(crate) fn single_scope<'a>(scopes: &[&'a str], credential: &str) -> Result<&'a str> {
    match scopes {
        [scope] => Ok(scope),
        _ => Err(AzError::validation(format!(
            "{} supports exactly one scope, got {}",
            credential,
            scopes.len()
        ))),
    }
}

/// Credentials for container registry access.
#[derive(Clone)]
pub enum RegistryCredentials {
    /// Anonymous pull (registry must allow it)
    Anonymous,

    /// Admin user or repository-scoped token
    Basic {
        /// Username for authentication
        username: String,
        /// Password for authentication
        password: String,
    },

    /// Azure AD identity exchanged for registry tokens
    Aad(Arc<dyn TokenCredential>),
}

impl RegistryCredentials {
    /// Creates anonymous credentials.
    pub fn anonymous() -> Self {
        Self::Anonymous
    }

    /// Creates Basic authentication credentials.
    ///
    /// # Examples
    ///
    /// ```
    /// use libazlook::auth::RegistryCredentials;
    ///
    /// let creds = RegistryCredentials::basic("myregistry", "secret");
    /// assert!(creds.to_header_value().unwrap().starts_with("Basic "));
    /// ```
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Basic {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Creates credentials backed by an Azure AD token source.
    pub fn aad(credential: Arc<dyn TokenCredential>) -> Self {
        Self::Aad(credential)
    }

    /// Returns the Authorization header value for direct Basic use.
    ///
    /// Anonymous and Azure AD credentials carry no static header.
    pub fn to_header_value(&self) -> Option<String> {
        match self {
            Self::Basic { username, password } => {
                use base64::{Engine as _, engine::general_purpose};
                let credentials = format!("{}:{}", username, password);
                let encoded = general_purpose::STANDARD.encode(credentials);
                Some(format!("Basic {}", encoded))
            }
            Self::Anonymous | Self::Aad(_) => None,
        }
    }

    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Anonymous => "anonymous",
            Self::Basic { .. } => "basic",
            Self::Aad(_) => "aad",
        }
    }
}

impl fmt::Debug for RegistryCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Anonymous => f.write_str("Anonymous"),
            Self::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
            Self::Aad(credential) => f.debug_tuple("Aad").field(&credential.name()).finish(),
        }
    }
}

/// Information parsed from a WWW-Authenticate header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthChallenge {
    /// The authentication scheme (e.g., "Bearer")
    pub scheme: String,

    /// The token endpoint
    pub realm: String,

    /// The service identifier
    pub service: Option<String>,

    /// The scope being requested
    pub scope: Option<String>,
}

impl AuthChallenge {
    /// Parses a WWW-Authenticate header value.
    ///
    /// Example header: `Bearer realm="https://myregistry.azurecr.io/oauth2/token",service="myregistry.azurecr.io",scope="registry:catalog:*"`
    ///
    /// # Examples
    ///
    /// ```
    /// use libazlook::auth::AuthChallenge;
    ///
    /// let header = r#"Bearer realm="https://r.azurecr.io/oauth2/token",service="r.azurecr.io""#;
    /// let challenge = AuthChallenge::parse(header).unwrap();
    /// assert_eq!(challenge.scheme, "Bearer");
    /// ```
    pub fn parse(header: &str) -> Result<Self> {
        let header = header.trim();

        let (scheme, params) = header
            .split_once(' ')
            .ok_or_else(|| AzError::validation("Invalid WWW-Authenticate header format"))?;

        let mut realm = None;
        let mut service = None;
        let mut scope = None;

        for (key, value) in split_challenge_params(params) {
            match key.as_str() {
                "realm" => realm = Some(value),
                "service" => service = Some(value),
                "scope" => scope = Some(value),
                _ => {}
            }
        }

        let realm = realm.ok_or_else(|| {
            AzError::validation("WWW-Authenticate header missing required 'realm' parameter")
        })?;

        Ok(Self {
            scheme: scheme.to_string(),
            realm,
            service,
            scope,
        })
    }
}

/// Splits `key="value",key2="a,b"` respecting quotes; scopes may hold commas
/// (`repository:hello:pull,push`).
fn split_challenge_params(params: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in params.chars() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
                current.push(ch);
            }
            ',' if !in_quotes => {
                push_param(&mut out, &current);
                current.clear();
            }
            _ => current.push(ch),
        }
    }
    push_param(&mut out, &current);

    out
}

fn push_param(out: &mut Vec<(String, String)>, raw: &str) {
    if let Some((key, value)) = raw.trim().split_once('=') {
        out.push((
            key.trim().to_string(),
            value.trim().trim_matches('"').to_string(),
        ));
    }
}
