//! Service principal authentication with a client secret.

use super::{AccessToken, TokenCredential};
use crate::error::{AzError, Result};
use crate::http::{HttpClient, status_to_error};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;

/// Default Azure AD authority for the public cloud.
pub const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

/// OAuth2 error body returned by Azure AD and the managed identity endpoints.
#[derive(Debug, Deserialize)]
pub(super) struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// Maps a failed token endpoint response into an error, keeping the AAD
/// error code where the body carries one.
pub(super) fn token_endpoint_error(status: StatusCode, url: &str, body: &str) -> AzError {
    match serde_json::from_str::<TokenErrorResponse>(body) {
        Ok(err) if status.is_client_error() => {
            let description = err.error_description.unwrap_or_default();
            AzError::authentication(
                format!("{}: {}", err.error, description.trim()),
                Some(status.as_u16()),
            )
        }
        _ => status_to_error(status, url, body, None, None),
    }
}

/// Authenticates a service principal using a client secret.
///
/// Built from `AZURE_TENANT_ID`, `AZURE_CLIENT_ID` and `AZURE_CLIENT_SECRET`,
/// with `AZURE_AUTHORITY_HOST` overriding the login endpoint.
#[derive(Clone)]
pub struct ClientSecretCredential {
    http: HttpClient,
    authority_host: String,
    tenant_id: String,
    client_id: String,
    client_secret: String,
}

impl std::fmt::Debug for ClientSecretCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientSecretCredential")
            .field("authority_host", &self.authority_host)
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}

impl ClientSecretCredential {
    /// Creates a credential against an explicit authority host.
    pub fn new(
        http: HttpClient,
        authority_host: impl Into<String>,
        tenant_id: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            http,
            authority_host: authority_host.into().trim_end_matches('/').to_string(),
            tenant_id: tenant_id.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// Builds the credential from environment values read through `lookup`.
    ///
    /// Fails with a validation error naming the first missing variable.
    pub fn from_lookup<F>(http: HttpClient, lookup: &F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |key: &str| {
            lookup(key)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| AzError::validation(format!("{} is not set", key)))
        };

        let tenant_id = require("AZURE_TENANT_ID")?;
        let client_id = require("AZURE_CLIENT_ID")?;
        let client_secret = require("AZURE_CLIENT_SECRET")?;
        let authority_host =
            lookup("AZURE_AUTHORITY_HOST").unwrap_or_else(|| DEFAULT_AUTHORITY_HOST.to_string());

        Ok(Self::new(
            http,
            authority_host,
            tenant_id,
            client_id,
            client_secret,
        ))
    }

    fn token_url(&self) -> String {
        format!(
            "{}/{}/oauth2/v2.0/token",
            self.authority_host, self.tenant_id
        )
    }
}

#[async_trait]
impl TokenCredential for ClientSecretCredential {
    fn name(&self) -> &'static str {
        "ClientSecretCredential"
    }

    async fn get_token(&self, scopes: &[&str]) -> Result<AccessToken> {
        let url = self.token_url();
        let scope = scopes.join(" ");
        debug!(tenant = %self.tenant_id, scope = %scope, "requesting client credentials token");

        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("scope", scope.as_str()),
        ];
        let response = self
            .http
            .send(self.http.inner().post(&url).form(&form), &url)
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(token_endpoint_error(status, &url, &body));
        }

        let token: TokenResponse = response.json().await.map_err(|e| {
            AzError::validation_with_source("Failed to parse Azure AD token response", e)
        })?;

        Ok(AccessToken::new(
            token.access_token,
            Utc::now() + Duration::seconds(token.expires_in),
        ))
    }
}

#[cfg(test)]
#[path = "client_secret_tests.rs"]
mod tests;
