//! Tokens from a signed-in Azure CLI session.

use super::{AccessToken, TokenCredential, scope_to_resource, single_scope};
use crate::error::{AzError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::Deserialize;
use tokio::process::Command;
use tracing::debug;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CliTokenOutput {
    access_token: String,
    #[serde(default)]
    expires_on: Option<String>,
    /// Newer CLI versions add the POSIX timestamp.
    #[serde(default, rename = "expires_on")]
    expires_on_epoch: Option<i64>,
}

/// Shells out to `az account get-access-token`.
#[derive(Debug, Clone)]
pub struct AzureCliCredential {
    program: String,
    tenant_id: Option<String>,
}

impl Default for AzureCliCredential {
    fn default() -> Self {
        Self::new()
    }
}

impl AzureCliCredential {
    /// Uses the `az` executable on `PATH`.
    pub fn new() -> Self {
        let program = if cfg!(windows) { "az.cmd" } else { "az" };
        Self {
            program: program.to_string(),
            tenant_id: None,
        }
    }

    /// Requests tokens for a specific tenant.
    pub fn with_tenant(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }

    /// Overrides the executable, mainly for tests.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    fn args(&self, resource: &str) -> Vec<String> {
        let mut args = vec![
            "account".to_string(),
            "get-access-token".to_string(),
            "--output".to_string(),
            "json".to_string(),
            "--resource".to_string(),
            resource.to_string(),
        ];
        if let Some(tenant) = &self.tenant_id {
            args.push("--tenant".to_string());
            args.push(tenant.clone());
        }
        args
    }
}

/// Parses the JSON printed by `az account get-access-token`.
///
/// `expires_on` (epoch seconds) wins when present; otherwise `expiresOn` is a
/// local wall-clock time such as `2024-01-31 17:05:12.000000`.
pub(crate) fn parse_cli_output(stdout: &str) -> Result<AccessToken> {
    let output: CliTokenOutput = serde_json::from_str(stdout)
        .map_err(|e| AzError::validation_with_source("Failed to parse Azure CLI output", e))?;

    let expires_on = match (output.expires_on_epoch, output.expires_on.as_deref()) {
        (Some(epoch), _) => DateTime::from_timestamp(epoch, 0)
            .ok_or_else(|| AzError::validation(format!("expires_on out of range: {}", epoch)))?,
        (None, Some(local)) => parse_local_timestamp(local)?,
        (None, None) => {
            return Err(AzError::validation(
                "Azure CLI output has no token expiry",
            ));
        }
    };

    Ok(AccessToken::new(output.access_token, expires_on))
}

fn parse_local_timestamp(value: &str) -> Result<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(value.trim(), "%Y-%m-%d %H:%M:%S%.f")
        .map_err(|e| {
            AzError::validation_with_source(format!("Invalid expiresOn value '{}'", value), e)
        })?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| AzError::validation(format!("Ambiguous local time '{}'", value)))
}

#[async_trait]
impl TokenCredential for AzureCliCredential {
    fn name(&self) -> &'static str {
        "AzureCliCredential"
    }

    async fn get_token(&self, scopes: &[&str]) -> Result<AccessToken> {
        let scope = single_scope(scopes, self.name())?;
        let resource = scope_to_resource(scope);
        debug!(program = %self.program, resource = %resource, "requesting token from Azure CLI");

        let output = Command::new(&self.program)
            .args(self.args(resource))
            .output()
            .await
            .map_err(|e| {
                AzError::credential(
                    format!("Azure CLI not available ({}): {}", self.program, e),
                    vec![],
                )
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let message = stderr.trim();
            return Err(if message.contains("az login") {
                AzError::credential(
                    "Azure CLI is not signed in. Run 'az login' to set up an account.",
                    vec![],
                )
            } else {
                AzError::credential(format!("Azure CLI failed: {}", message), vec![])
            });
        }

        parse_cli_output(&String::from_utf8_lossy(&output.stdout))
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
