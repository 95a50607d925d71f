//! The default credential chain.

use super::{
    AccessToken, AzureCliCredential, ClientSecretCredential, ManagedIdentityCredential,
    StaticTokenCredential, TokenCredential,
};
use crate::error::{AzError, Result};
use crate::http::HttpClient;
use async_trait::async_trait;
use chrono::Duration;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Tokens are refreshed this long before they expire.
const REFRESH_SKEW_MINUTES: i64 = 5;

/// Tries each configured credential source in turn.
///
/// Order: `AZURE_ACCESS_TOKEN`, service principal from environment, managed
/// identity, Azure CLI. The source that succeeds is tried first on later
/// calls, and tokens are reused per scope set until shortly before expiry.
///
/// A source that reports an authentication failure (it is configured but the
/// service rejected it) stops the chain; anything else moves on to the next
/// source.
#[derive(Debug)]
pub struct DefaultAzureCredential {
    sources: Vec<Arc<dyn TokenCredential>>,
    skipped: Vec<String>,
    preferred: Mutex<Option<usize>>,
    cache: Mutex<HashMap<String, AccessToken>>,
}

impl DefaultAzureCredential {
    /// Builds the chain from the process environment.
    pub fn new(http: HttpClient) -> Self {
        Self::from_lookup(http, &|key: &str| std::env::var(key).ok())
    }

    /// Builds the chain from environment values read through `lookup`.
    pub fn from_lookup<F>(http: HttpClient, lookup: &F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut sources: Vec<Arc<dyn TokenCredential>> = Vec::new();
        let mut skipped = Vec::new();

        if let Some(static_token) = StaticTokenCredential::from_lookup(lookup) {
            sources.push(Arc::new(static_token));
        }

        match ClientSecretCredential::from_lookup(http.clone(), lookup) {
            Ok(cred) => sources.push(Arc::new(cred)),
            Err(e) => skipped.push(format!("EnvironmentCredential: {}", e)),
        }

        sources.push(Arc::new(ManagedIdentityCredential::from_lookup(
            http, lookup,
        )));

        let mut cli = AzureCliCredential::new();
        if let Some(tenant) = lookup("AZURE_TENANT_ID").filter(|t| !t.is_empty()) {
            cli = cli.with_tenant(tenant);
        }
        sources.push(Arc::new(cli));

        Self {
            sources,
            skipped,
            preferred: Mutex::new(None),
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Builds a chain over explicit sources.
    pub fn with_sources(sources: Vec<Arc<dyn TokenCredential>>) -> Self {
        Self {
            sources,
            skipped: Vec::new(),
            preferred: Mutex::new(None),
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Names of the sources in the order they will be tried.
    pub fn source_names(&self) -> Vec<&'static str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    async fn attempt_order(&self) -> Vec<usize> {
        let preferred = *self.preferred.lock().await;
        let mut order: Vec<usize> = (0..self.sources.len()).collect();
        if let Some(idx) = preferred {
            order.retain(|i| *i != idx);
            order.insert(0, idx);
        }
        order
    }
}

#[async_trait]
impl TokenCredential for DefaultAzureCredential {
    fn name(&self) -> &'static str {
        "DefaultAzureCredential"
    }

    async fn get_token(&self, scopes: &[&str]) -> Result<AccessToken> {
        let key = scopes.join(" ");

        if let Some(token) = self.cache.lock().await.get(&key)
            && !token.is_expired(Duration::minutes(REFRESH_SKEW_MINUTES))
        {
            return Ok(token.clone());
        }

        let mut attempts = self.skipped.clone();

        for idx in self.attempt_order().await {
            let source = &self.sources[idx];
            match source.get_token(scopes).await {
                Ok(token) => {
                    info!(source = source.name(), scope = %key, "acquired access token");
                    *self.preferred.lock().await = Some(idx);
                    self.cache.lock().await.insert(key, token.clone());
                    return Ok(token);
                }
                Err(e @ AzError::Authentication { .. }) => {
                    debug!(source = source.name(), error = %e, "credential rejected");
                    return Err(e);
                }
                Err(e) => {
                    debug!(source = source.name(), error = %e, "credential unavailable");
                    attempts.push(format!("{}: {}", source.name(), e));
                }
            }
        }

        Err(AzError::credential(
            "DefaultAzureCredential failed to retrieve a token from the included credentials",
            attempts,
        ))
    }
}

#[cfg(test)]
#[path = "chain_tests.rs"]
mod tests;
