use crate::context::AppContext;
use crate::format::Formattable;
use chrono::{DateTime, Utc};
use libazlook::acr::{ArtifactManifestProperties, ContainerRegistryClient};
use libazlook::auth::{DefaultAzureCredential, RegistryCredentials};
use libazlook::format::{format_size, format_timestamp};
use libazlook::http::HttpClient;
use libazlook::{AzError, RegistryAudience};
use serde::Serialize;
use std::sync::Arc;
use tabled::Tabled;
use tracing::debug;

pub mod handlers;

/// Environment variable holding the admin password for `--username`.
pub const PASSWORD_ENV: &str = "AZLOOK_REGISTRY_PASSWORD";

/// Registry connection flags shared by every `acr` subcommand
#[derive(clap::Args, Debug, Clone, Default)]
pub struct RegistryArgs {
    /// Registry endpoint, e.g. https://myregistry.azurecr.io
    #[arg(long, global = true)]
    pub endpoint: Option<String>,
    /// Azure AD audience: public, china, government or a URL
    #[arg(long, global = true)]
    pub audience: Option<String>,
    /// Admin username (password from AZLOOK_REGISTRY_PASSWORD or a prompt)
    #[arg(long, global = true)]
    pub username: Option<String>,
    /// Page size hint for listings
    #[arg(long, global = true)]
    pub page_size: Option<usize>,
    /// Skip credentials (registries with anonymous pull)
    #[arg(long, global = true, conflicts_with = "username")]
    pub anonymous: bool,
}

/// Result of walking every repository and manifest in a registry
#[derive(Debug, Serialize)]
pub struct RegistryWalk {
    pub endpoint: String,
    pub repositories: Vec<RepositoryWalk>,
}

#[derive(Debug, Serialize)]
pub struct RepositoryWalk {
    pub name: String,
    pub manifests: Vec<ManifestSummary>,
}

#[derive(Debug, Serialize)]
pub struct ManifestSummary {
    pub digest: String,
    pub tags: Vec<String>,
    pub size: Option<u64>,
    pub architecture: Option<String>,
    pub operating_system: Option<String>,
    pub created_on: Option<DateTime<Utc>>,
}

impl From<ArtifactManifestProperties> for ManifestSummary {
    fn from(m: ArtifactManifestProperties) -> Self {
        Self {
            digest: m.digest,
            tags: m.tags,
            size: m.size_in_bytes,
            architecture: m.architecture,
            operating_system: m.operating_system,
            created_on: m.created_on,
        }
    }
}

impl RegistryWalk {
    /// Last line of the pretty walk.
    pub fn trailer(&self) -> String {
        format!("Connected to {}/", self.endpoint)
    }
}

impl RepositoryWalk {
    /// Pretty block for one repository, each line ending in a newline.
    pub fn format_pretty(&self) -> String {
        let mut output = format!("Repository Name - {}\n", self.name);
        for manifest in &self.manifests {
            output.push_str(&format!(" Found Image Manifest: {}\n", manifest.digest));
            for tag in &manifest.tags {
                output.push_str(&format!("    with Tag: {}\n", tag));
            }
        }
        output
    }
}

impl Formattable for RegistryWalk {
    fn format_pretty(&self) -> String {
        let mut output: String = self
            .repositories
            .iter()
            .map(RepositoryWalk::format_pretty)
            .collect();
        output.push_str(&self.trailer());
        output
    }
}

/// Repository names, one per line in pretty output
#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct RepositoryList(pub Vec<String>);

impl Formattable for RepositoryList {
    fn format_pretty(&self) -> String {
        self.0.join("\n")
    }
}

/// Tag row for table output
#[derive(Debug, Tabled, Serialize)]
pub struct TagRow {
    #[tabled(rename = "TAG")]
    pub name: String,
    #[tabled(rename = "DIGEST")]
    pub digest: String,
    #[tabled(rename = "UPDATED")]
    #[serde(skip)]
    pub updated: String,
    #[tabled(skip)]
    pub last_updated_on: Option<DateTime<Utc>>,
}

/// Manifest details for `acr show`
#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct ManifestDetails(pub ArtifactManifestProperties);

impl Formattable for ManifestDetails {
    fn format_pretty(&self) -> String {
        let m = &self.0;
        let or_dash = |v: Option<&str>| v.unwrap_or("-").to_string();
        let flag = |v: Option<bool>| match v {
            Some(true) => "yes",
            Some(false) => "no",
            None => "-",
        };

        let mut output = String::new();
        output.push_str(&format!(
            "Repository: {}/{}\n",
            m.registry_login_server, m.repository_name
        ));
        output.push_str(&format!("Digest: {}\n", m.digest));
        output.push_str(&format!("Media Type: {}\n", or_dash(m.media_type.as_deref())));
        if let (Some(os), Some(arch)) = (&m.operating_system, &m.architecture) {
            output.push_str(&format!("Platform: {}/{}\n", os, arch));
        }
        if let Some(size) = m.size_in_bytes {
            output.push_str(&format!("Size: {}\n", format_size(size)));
        }
        if let Some(created) = &m.created_on {
            output.push_str(&format!(
                "Created: {} ({})\n",
                created.to_rfc3339(),
                format_timestamp(created)
            ));
        }
        if let Some(updated) = &m.last_updated_on {
            output.push_str(&format!(
                "Updated: {} ({})\n",
                updated.to_rfc3339(),
                format_timestamp(updated)
            ));
        }
        if m.tags.is_empty() {
            output.push_str("Tags: (untagged)\n");
        } else {
            output.push_str(&format!("Tags: {}\n", m.tags.join(", ")));
        }
        output.push_str(&format!(
            "Permissions: read={} list={} write={} delete={}",
            flag(m.can_read),
            flag(m.can_list),
            flag(m.can_write),
            flag(m.can_delete)
        ));
        output
    }
}

/// Registry check result
#[derive(Debug, Serialize)]
pub struct RegistryCheckResult {
    pub endpoint: String,
    pub online: bool,
    pub auth_required: bool,
    pub api_version: Option<String>,
    pub error: Option<String>,
}

impl Formattable for RegistryCheckResult {
    fn format_pretty(&self) -> String {
        let mut output = format!("Registry: {}\n", self.endpoint);
        if self.online {
            output.push_str("Status: ✓ Online\n");
            if let Some(ref api_version) = self.api_version {
                output.push_str(&format!("API Version: {}\n", api_version));
            }
            if self.auth_required {
                output.push_str("Authentication: Required");
            } else {
                output.push_str("Authentication: Not required");
            }
        } else {
            output.push_str("Status: ✗ Offline");
            if let Some(ref error) = self.error {
                output.push_str(&format!("\nReason: {}", error));
            }
        }
        output
    }
}

/// Picks registry credentials from flags and config.
///
/// `--anonymous` wins, then a username (Basic), then the default Azure chain.
pub(crate) fn registry_credentials<F, P>(
    ctx: &AppContext,
    args: &RegistryArgs,
    http: HttpClient,
    lookup: &F,
    prompt: P,
) -> Result<RegistryCredentials, String>
where
    F: Fn(&str) -> Option<String>,
    P: FnOnce(&str) -> std::io::Result<String>,
{
    if args.anonymous {
        return Ok(RegistryCredentials::anonymous());
    }

    let username = args
        .username
        .clone()
        .or_else(|| ctx.config.registry.username.clone());

    match username {
        Some(username) => {
            let password = match lookup(PASSWORD_ENV).filter(|p| !p.is_empty()) {
                Some(p) => p,
                None => prompt(&format!("Password for {}: ", username))
                    .map_err(|e| format!("Failed to read password: {}", e))?,
            };
            Ok(RegistryCredentials::basic(username, password))
        }
        None => Ok(RegistryCredentials::aad(Arc::new(
            DefaultAzureCredential::from_lookup(http, lookup),
        ))),
    }
}

/// Builds a registry client from flags over config.
pub(crate) fn build_client(
    ctx: &AppContext,
    args: &RegistryArgs,
) -> Result<ContainerRegistryClient, String> {
    let endpoint = args
        .endpoint
        .clone()
        .or_else(|| ctx.config.registry.endpoint.clone())
        .ok_or_else(|| {
            "No registry endpoint. Pass --endpoint or set registry.endpoint in the config file."
                .to_string()
        })?;

    let mut options = ctx.config.registry_options().map_err(|e| e.to_string())?;
    if let Some(audience) = &args.audience {
        options.audience = audience
            .parse::<RegistryAudience>()
            .map_err(|e| e.to_string())?;
    }
    if let Some(n) = args.page_size {
        options.page_size = Some(n);
    }

    let http = HttpClient::new(&options.http).map_err(|e| e.to_string())?;
    let credentials = registry_credentials(
        ctx,
        args,
        http,
        &|key: &str| std::env::var(key).ok(),
        |prompt: &str| rpassword::prompt_password(prompt),
    )?;

    debug!(
        endpoint = %endpoint,
        audience = %options.audience,
        credentials = credentials.kind(),
        "building registry client"
    );
    ContainerRegistryClient::new(&endpoint, credentials, options).map_err(|e| e.to_string())
}

/// Flags for `acr check`: the `/v2/` probe never needs credentials.
pub(crate) fn check_args(args: &RegistryArgs) -> RegistryArgs {
    RegistryArgs {
        username: None,
        anonymous: true,
        ..args.clone()
    }
}

/// Lists every repository and its manifests, in service order, calling
/// `on_repository` as each repository completes.
///
/// On failure the repositories already reported stay reported.
pub(crate) async fn walk_registry_with<F>(
    client: &ContainerRegistryClient,
    mut on_repository: F,
) -> Result<RegistryWalk, String>
where
    F: FnMut(&RepositoryWalk),
{
    let names = client
        .list_repository_names()
        .await
        .map_err(|e| format!("Failed to list repositories: {}", e))?;

    let mut repositories = Vec::with_capacity(names.len());
    for name in names {
        let manifests = client
            .get_repository(&name)
            .list_manifest_properties()
            .await
            .map_err(|e| format!("Failed to list manifests for '{}': {}", name, e))?;
        let repository = RepositoryWalk {
            name,
            manifests: manifests.into_iter().map(ManifestSummary::from).collect(),
        };
        on_repository(&repository);
        repositories.push(repository);
    }

    Ok(RegistryWalk {
        endpoint: client.endpoint().to_string(),
        repositories,
    })
}

pub(crate) async fn list_repositories(
    client: &ContainerRegistryClient,
) -> Result<RepositoryList, String> {
    client
        .list_repository_names()
        .await
        .map(RepositoryList)
        .map_err(|e| format!("Failed to list repositories: {}", e))
}

pub(crate) async fn list_tags(
    client: &ContainerRegistryClient,
    repository: &str,
) -> Result<Vec<TagRow>, String> {
    let tags = client
        .get_repository(repository)
        .list_tag_properties()
        .await
        .map_err(|e| format!("Failed to list tags for '{}': {}", repository, e))?;

    Ok(tags
        .into_iter()
        .map(|t| TagRow {
            updated: t
                .last_updated_on
                .as_ref()
                .map(format_timestamp)
                .unwrap_or_else(|| "-".to_string()),
            name: t.name,
            digest: t.digest,
            last_updated_on: t.last_updated_on,
        })
        .collect())
}

pub(crate) async fn show_artifact(
    client: &ContainerRegistryClient,
    repository: &str,
    reference: &str,
) -> Result<ManifestDetails, String> {
    let artifact = client
        .get_repository(repository)
        .get_artifact(reference)
        .map_err(|e| e.to_string())?;
    artifact
        .get_manifest_properties()
        .await
        .map(ManifestDetails)
        .map_err(|e| match e {
            AzError::NotFound { .. } => format!("'{}:{}' not found", repository, reference),
            other => format!("Failed to fetch manifest: {}", other),
        })
}

pub(crate) async fn check_registry(client: &ContainerRegistryClient) -> RegistryCheckResult {
    match client.check().await {
        Ok(status) => RegistryCheckResult {
            endpoint: client.endpoint().to_string(),
            online: true,
            auth_required: status.auth_required,
            api_version: status.api_version,
            error: None,
        },
        Err(e) => RegistryCheckResult {
            endpoint: client.endpoint().to_string(),
            online: false,
            auth_required: false,
            api_version: None,
            error: Some(e.to_string()),
        },
    }
}
