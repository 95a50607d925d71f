//! Managed identity authentication (IMDS and App Service).

use super::client_secret::token_endpoint_error;
use super::{AccessToken, TokenCredential, scope_to_resource, single_scope};
use crate::error::{AzError, Result};
use crate::http::HttpClient;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Instance Metadata Service token endpoint.
pub const IMDS_ENDPOINT: &str = "http://169.254.169.254/metadata/identity/oauth2/token";

const IMDS_API_VERSION: &str = "2018-02-01";
const APP_SERVICE_API_VERSION: &str = "2019-08-01";

/// IMDS is link-local; off Azure the connect attempt should fail fast.
const IMDS_PROBE_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, PartialEq, Eq)]
enum MsiSource {
    Imds { endpoint: String },
    AppService { endpoint: String, header: String },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum EpochSeconds {
    Number(i64),
    Text(String),
}

impl EpochSeconds {
    fn to_datetime(&self) -> Result<DateTime<Utc>> {
        let secs = match self {
            Self::Number(n) => *n,
            Self::Text(s) => s.trim().parse::<i64>().map_err(|e| {
                AzError::validation_with_source(format!("Invalid expires_on value '{}'", s), e)
            })?,
        };
        DateTime::from_timestamp(secs, 0)
            .ok_or_else(|| AzError::validation(format!("expires_on out of range: {}", secs)))
    }
}

#[derive(Debug, Deserialize)]
struct MsiTokenResponse {
    access_token: String,
    expires_on: EpochSeconds,
}

/// Acquires tokens for the identity assigned to the current Azure host.
///
/// Uses App Service's `IDENTITY_ENDPOINT`/`IDENTITY_HEADER` pair when both are
/// present, otherwise the VM Instance Metadata Service. `AZURE_CLIENT_ID`
/// selects a user-assigned identity.
#[derive(Debug, Clone)]
pub struct ManagedIdentityCredential {
    http: HttpClient,
    source: MsiSource,
    client_id: Option<String>,
}

impl ManagedIdentityCredential {
    /// Targets the Instance Metadata Service at `endpoint`.
    pub fn imds(http: HttpClient, endpoint: impl Into<String>, client_id: Option<String>) -> Self {
        Self {
            http,
            source: MsiSource::Imds {
                endpoint: endpoint.into(),
            },
            client_id,
        }
    }

    /// Targets an App Service style identity endpoint.
    pub fn app_service(
        http: HttpClient,
        endpoint: impl Into<String>,
        header: impl Into<String>,
        client_id: Option<String>,
    ) -> Self {
        Self {
            http,
            source: MsiSource::AppService {
                endpoint: endpoint.into(),
                header: header.into(),
            },
            client_id,
        }
    }

    /// Picks the identity source from environment values read through `lookup`.
    pub fn from_lookup<F>(http: HttpClient, lookup: &F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let client_id = lookup("AZURE_CLIENT_ID").filter(|v| !v.is_empty());
        match (lookup("IDENTITY_ENDPOINT"), lookup("IDENTITY_HEADER")) {
            (Some(endpoint), Some(header)) => Self::app_service(http, endpoint, header, client_id),
            _ => Self::imds(http, IMDS_ENDPOINT, client_id),
        }
    }

    fn build_request(&self, resource: &str) -> (reqwest::RequestBuilder, String) {
        let mut query = vec![("resource", resource.to_string())];
        if let Some(client_id) = &self.client_id {
            query.push(("client_id", client_id.clone()));
        }

        match &self.source {
            MsiSource::Imds { endpoint } => {
                query.insert(0, ("api-version", IMDS_API_VERSION.to_string()));
                let request = self
                    .http
                    .inner()
                    .get(endpoint)
                    .query(&query)
                    .header("Metadata", "true")
                    .timeout(IMDS_PROBE_TIMEOUT);
                (request, endpoint.clone())
            }
            MsiSource::AppService { endpoint, header } => {
                query.insert(0, ("api-version", APP_SERVICE_API_VERSION.to_string()));
                let request = self
                    .http
                    .inner()
                    .get(endpoint)
                    .query(&query)
                    .header("X-IDENTITY-HEADER", header);
                (request, endpoint.clone())
            }
        }
    }
}

#[async_trait]
impl TokenCredential for ManagedIdentityCredential {
    fn name(&self) -> &'static str {
        "ManagedIdentityCredential"
    }

    async fn get_token(&self, scopes: &[&str]) -> Result<AccessToken> {
        let scope = single_scope(scopes, self.name())?;
        let resource = scope_to_resource(scope);
        let (request, endpoint) = self.build_request(resource);
        debug!(endpoint = %endpoint, resource = %resource, "requesting managed identity token");

        let response = self.http.send(request, &endpoint).await?;
        let status = response.status();
        if status == StatusCode::BAD_REQUEST {
            // No identity assigned to this host
            let body = response.text().await.unwrap_or_default();
            return Err(AzError::credential(
                format!(
                    "No managed identity available: {}",
                    token_endpoint_error(status, &endpoint, &body)
                ),
                Vec::new(),
            ));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(token_endpoint_error(status, &endpoint, &body));
        }

        let token: MsiTokenResponse = response.json().await.map_err(|e| {
            AzError::validation_with_source("Failed to parse managed identity token response", e)
        })?;

        Ok(AccessToken::new(
            token.access_token,
            token.expires_on.to_datetime()?,
        ))
    }
}

#[cfg(test)]
#[path = "managed_identity_tests.rs"]
mod tests;
