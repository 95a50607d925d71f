//! Azure Container Registry client.
//!
//! Speaks the ACR `/acr/v1` metadata API. Requests start anonymous or with a
//! cached registry token; a 401 challenge triggers the ACR token flow
//! (Azure AD token → refresh token → scoped access token) and one retry.
//!
//! # Examples
//!
//! ```no_run
//! use libazlook::acr::{ContainerRegistryClient, ContainerRegistryClientOptions};
//! use libazlook::auth::{DefaultAzureCredential, RegistryCredentials};
//! use libazlook::http::{ClientConfig, HttpClient};
//! use std::sync::Arc;
//!
//! # async fn example() -> libazlook::Result<()> {
//! let http = HttpClient::new(&ClientConfig::default())?;
//! let credential = Arc::new(DefaultAzureCredential::new(http));
//! let client = ContainerRegistryClient::new(
//!     "https://myregistry.azurecr.io",
//!     RegistryCredentials::aad(credential),
//!     ContainerRegistryClientOptions::default(),
//! )?;
//!
//! for name in client.list_repository_names().await? {
//!     let repository = client.get_repository(&name);
//!     for manifest in repository.list_manifest_properties().await? {
//!         println!("{} {:?}", manifest.digest, manifest.tags);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

use crate::auth::{AuthChallenge, RegistryCredentials};
use crate::error::{AzError, Result};
use crate::http::{
    ClientConfig, HttpClient, check_response_status, extract_next_link, normalize_endpoint,
    resolve_link,
};
use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, WWW_AUTHENTICATE};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, instrument};

mod models;
mod repository;

pub use models::{ArtifactManifestProperties, ArtifactTagProperties, RepositoryProperties};
pub use repository::{ArtifactReference, ContainerRepository, RegistryArtifact};

use models::{AccessTokenResponse, RefreshTokenResponse, WireCatalog};


/// Scope for listing the registry catalog.
pub const CATALOG_SCOPE: &str = "registry:catalog:*";

/// Azure AD audience used when exchanging tokens with the registry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RegistryAudience {
    /// Azure Resource Manager, public cloud
    #[default]
    AzureResourceManagerPublicCloud,
    /// Azure Resource Manager, China cloud
    AzureResourceManagerChina,
    /// Azure Resource Manager, US Government cloud
    AzureResourceManagerGovernment,
    /// Any other audience URL
    Custom(String),
}

impl RegistryAudience {
    /// Returns the `/.default` scope requested from Azure AD.
    ///
    /// # Examples
    ///
    /// ```
    /// use libazlook::acr::RegistryAudience;
    ///
    /// assert_eq!(
    ///     RegistryAudience::default().scope(),
    ///     "https://management.azure.com/.default"
    /// );
    /// ```
    pub fn scope(&self) -> String {
        let base = match self {
            Self::AzureResourceManagerPublicCloud => "https://management.azure.com",
            Self::AzureResourceManagerChina => "https://management.chinacloudapi.cn",
            Self::AzureResourceManagerGovernment => "https://management.usgovcloudapi.net",
            Self::Custom(url) => url.trim_end_matches('/'),
        };
        if base.ends_with("/.default") {
            base.to_string()
        } else {
            format!("{}/.default", base)
        }
    }
}

impl FromStr for RegistryAudience {
    type Err = AzError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "" | "public" | "azurecloud" => Ok(Self::AzureResourceManagerPublicCloud),
            "china" | "azurechinacloud" => Ok(Self::AzureResourceManagerChina),
            "government" | "usgov" | "azureusgovernment" => {
                Ok(Self::AzureResourceManagerGovernment)
            }
            other if other.starts_with("https://") => Ok(Self::Custom(s.trim().to_string())),
            _ => Err(AzError::validation(format!(
                "Unknown registry audience '{}'. Use public, china, government or an https URL.",
                s
            ))),
        }
    }
}

impl fmt::Display for RegistryAudience {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AzureResourceManagerPublicCloud => f.write_str("public"),
            Self::AzureResourceManagerChina => f.write_str("china"),
            Self::AzureResourceManagerGovernment => f.write_str("government"),
            Self::Custom(url) => f.write_str(url),
        }
    }
}

/// Options for [`ContainerRegistryClient`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerRegistryClientOptions {
    /// Azure AD audience for token exchange
    pub audience: RegistryAudience,
    /// HTTP transport settings
    pub http: ClientConfig,
    /// Page size hint (`n=`) for listings
    pub page_size: Option<usize>,
}

impl ContainerRegistryClientOptions {
    /// Sets the audience.
    pub fn with_audience(mut self, audience: RegistryAudience) -> Self {
        self.audience = audience;
        self
    }

    /// Sets the HTTP transport settings.
    pub fn with_http(mut self, http: ClientConfig) -> Self {
        self.http = http;
        self
    }

    /// Sets the listing page size hint.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size);
        self
    }
}

/// Result of probing the registry's `/v2/` endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryStatus {
    /// Value of `Docker-Distribution-API-Version`, if sent
    pub api_version: Option<String>,
    /// Whether the endpoint demanded authentication
    pub auth_required: bool,
}

#[derive(Debug, Default)]
struct TokenState {
    refresh_token: Option<String>,
    access_tokens: HashMap<String, String>,
}

struct ClientInner {
    endpoint: String,
    login_server: String,
    http: HttpClient,
    credentials: RegistryCredentials,
    options: ContainerRegistryClientOptions,
    tokens: Mutex<TokenState>,
}

/// Client for one Azure Container Registry.
///
/// Cloning is cheap; clones share the connection pool and token cache.
#[derive(Clone)]
pub struct ContainerRegistryClient {
    inner: Arc<ClientInner>,
}

impl fmt::Debug for ContainerRegistryClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContainerRegistryClient")
            .field("endpoint", &self.inner.endpoint)
            .field("credentials", &self.inner.credentials)
            .field("audience", &self.inner.options.audience)
            .finish()
    }
}

impl ContainerRegistryClient {
    /// Creates a client for the registry at `endpoint`.
    ///
    /// # Examples
    ///
    /// ```
    /// use libazlook::acr::{ContainerRegistryClient, ContainerRegistryClientOptions};
    /// use libazlook::auth::RegistryCredentials;
    ///
    /// let client = ContainerRegistryClient::new(
    ///     "myregistry.azurecr.io",
    ///     RegistryCredentials::anonymous(),
    ///     ContainerRegistryClientOptions::default(),
    /// )
    /// .unwrap();
    /// assert_eq!(client.endpoint(), "https://myregistry.azurecr.io");
    /// ```
    pub fn new(
        endpoint: &str,
        credentials: RegistryCredentials,
        options: ContainerRegistryClientOptions,
    ) -> Result<Self> {
        let endpoint = normalize_endpoint(endpoint)?;
        let login_server = endpoint
            .split_once("://")
            .map(|(_, rest)| rest)
            .unwrap_or(&endpoint)
            .to_string();
        let http = HttpClient::new(&options.http)?;

        Ok(Self {
            inner: Arc::new(ClientInner {
                endpoint,
                login_server,
                http,
                credentials,
                options,
                tokens: Mutex::new(TokenState::default()),
            }),
        })
    }

    /// Returns the normalized registry endpoint.
    pub fn endpoint(&self) -> &str {
        &self.inner.endpoint
    }

    /// Returns the registry login server (host and port).
    pub fn login_server(&self) -> &str {
        &self.inner.login_server
    }

    /// Returns the configured audience.
    pub fn audience(&self) -> &RegistryAudience {
        &self.inner.options.audience
    }

    /// Lists every repository name in the registry, following pages.
    #[instrument(skip(self), fields(endpoint = %self.inner.endpoint))]
    pub async fn list_repository_names(&self) -> Result<Vec<String>> {
        let first = self.with_page_size(format!("{}/acr/v1/_catalog", self.inner.endpoint));
        self.get_paged(first, CATALOG_SCOPE, None, |page: WireCatalog| {
            page.repositories
        })
        .await
    }

    /// Returns a handle for one repository. No request is made.
    pub fn get_repository(&self, name: &str) -> ContainerRepository {
        ContainerRepository::new(self.clone(), name)
    }

    /// Probes `/v2/` without credentials.
    ///
    /// A 401 still counts as reachable; it only means authentication is needed.
    pub async fn check(&self) -> Result<RegistryStatus> {
        let url = format!("{}/v2/", self.inner.endpoint);
        let response = self
            .inner
            .http
            .send(self.inner.http.inner().get(&url), &url)
            .await?;

        let api_version = response
            .headers()
            .get("Docker-Distribution-API-Version")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        if response.status() == StatusCode::UNAUTHORIZED {
            return Ok(RegistryStatus {
                api_version,
                auth_required: true,
            });
        }

        check_response_status(response, None).await?;
        Ok(RegistryStatus {
            api_version,
            auth_required: false,
        })
    }

    pub(crate) fn with_page_size(&self, mut url: String) -> String {
        if let Some(n) = self.inner.options.page_size {
            url.push_str(&format!("?n={}", n));
        }
        url
    }

    /// Fetches every page starting at `first_url` and flattens the items.
    pub(crate) async fn get_paged<P, T, F>(
        &self,
        first_url: String,
        scope: &str,
        resource: Option<(&str, &str)>,
        extract: F,
    ) -> Result<Vec<T>>
    where
        P: DeserializeOwned,
        F: Fn(P) -> Vec<T>,
    {
        let mut items = Vec::new();
        let mut url = first_url;
        let mut page_count = 0usize;

        loop {
            let response = self.send_authorized(&url, scope).await?;
            let next = extract_next_link(response.headers());
            let response = check_response_status(response, resource).await?;

            let page: P = response.json().await.map_err(|e| {
                AzError::validation_with_source(format!("Failed to parse response from {}", url), e)
            })?;
            items.extend(extract(page));
            page_count += 1;

            match next {
                Some(link) => {
                    url = resolve_link(&self.inner.endpoint, &link);
                    debug!(page = page_count, next = %url, "following next page");
                }
                None => break,
            }
        }

        Ok(items)
    }

    /// Fetches a single JSON document.
    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        scope: &str,
        resource: Option<(&str, &str)>,
    ) -> Result<T> {
        let response = self.send_authorized(url, scope).await?;
        let response = check_response_status(response, resource).await?;
        response.json().await.map_err(|e| {
            AzError::validation_with_source(format!("Failed to parse response from {}", url), e)
        })
    }

    /// Sends a GET, answering one 401 challenge with a registry token.
    async fn send_authorized(&self, url: &str, scope: &str) -> Result<reqwest::Response> {
        let cached = self
            .inner
            .tokens
            .lock()
            .await
            .access_tokens
            .get(scope)
            .cloned();

        let response = self.get_with_token(url, cached.as_deref()).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        let challenge = match response
            .headers()
            .get(WWW_AUTHENTICATE)
            .and_then(|v| v.to_str().ok())
        {
            Some(header) => AuthChallenge::parse(header)?,
            // Nothing to answer; let the caller map the 401.
            None => return Ok(response),
        };

        debug!(
            realm = %challenge.realm,
            scope = challenge.scope.as_deref().unwrap_or(scope),
            credentials = self.inner.credentials.kind(),
            "answering registry challenge"
        );

        let token = self.acquire_access_token(&challenge, scope).await?;
        self.inner
            .tokens
            .lock()
            .await
            .access_tokens
            .insert(scope.to_string(), token.clone());

        self.get_with_token(url, Some(&token)).await
    }

    async fn get_with_token(&self, url: &str, token: Option<&str>) -> Result<reqwest::Response> {
        let mut request = self.inner.http.inner().get(url);
        if let Some(token) = token {
            request = request.header(AUTHORIZATION, format!("Bearer {}", token));
        }
        self.inner.http.send(request, url).await
    }

    /// Obtains a registry access token for the challenged scope.
    async fn acquire_access_token(&self, challenge: &AuthChallenge, scope: &str) -> Result<String> {
        let service = challenge
            .service
            .clone()
            .unwrap_or_else(|| self.inner.login_server.clone());
        let scope = challenge.scope.as_deref().unwrap_or(scope);

        let response = match &self.inner.credentials {
            RegistryCredentials::Anonymous | RegistryCredentials::Basic { .. } => {
                let mut request = self
                    .inner
                    .http
                    .inner()
                    .get(&challenge.realm)
                    .query(&[("service", service.as_str()), ("scope", scope)]);
                if let Some(header) = self.inner.credentials.to_header_value() {
                    request = request.header(AUTHORIZATION, header);
                }
                self.inner.http.send(request, &challenge.realm).await?
            }
            RegistryCredentials::Aad(_) => {
                let refresh_token = self.refresh_token(&service).await?;
                let form = [
                    ("grant_type", "refresh_token"),
                    ("service", service.as_str()),
                    ("scope", scope),
                    ("refresh_token", refresh_token.as_str()),
                ];
                let request = self.inner.http.inner().post(&challenge.realm).form(&form);
                self.inner.http.send(request, &challenge.realm).await?
            }
        };

        let response = match check_response_status(response, None).await {
            Ok(response) => response,
            Err(e) => {
                // A stale refresh token must not poison later attempts.
                self.inner.tokens.lock().await.refresh_token = None;
                return Err(e);
            }
        };

        let token: AccessTokenResponse = response.json().await.map_err(|e| {
            AzError::validation_with_source("Failed to parse registry token response", e)
        })?;
        token.into_token()
    }

    /// Exchanges an Azure AD token for an ACR refresh token, cached per client.
    async fn refresh_token(&self, service: &str) -> Result<String> {
        if let Some(token) = self.inner.tokens.lock().await.refresh_token.clone() {
            return Ok(token);
        }

        let RegistryCredentials::Aad(credential) = &self.inner.credentials else {
            return Err(AzError::authentication(
                "Refresh token exchange requires Azure AD credentials",
                None,
            ));
        };

        let aad_scope = self.inner.options.audience.scope();
        let aad_token = credential.get_token(&[aad_scope.as_str()]).await?;

        let url = format!("{}/oauth2/exchange", self.inner.endpoint);
        let form = [
            ("grant_type", "access_token"),
            ("service", service),
            ("access_token", aad_token.token.as_str()),
        ];
        debug!(url = %url, "exchanging Azure AD token for registry refresh token");
        let response = self
            .inner
            .http
            .send(self.inner.http.inner().post(&url).form(&form), &url)
            .await?;
        let response = check_response_status(response, None).await?;

        let exchanged: RefreshTokenResponse = response.json().await.map_err(|e| {
            AzError::validation_with_source("Failed to parse refresh token response", e)
        })?;

        self.inner.tokens.lock().await.refresh_token = Some(exchanged.refresh_token.clone());
        Ok(exchanged.refresh_token)
    }
}
