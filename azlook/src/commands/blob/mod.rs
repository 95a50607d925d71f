use crate::context::AppContext;
use crate::format::Formattable;
use chrono::{DateTime, Utc};
use libazlook::auth::DefaultAzureCredential;
use libazlook::blob::{BlobContainerProperties, BlobServiceClient, PublicAccessType, StorageCredential};
use libazlook::format::format_offset_datetime;
use libazlook::http::HttpClient;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

pub mod handlers;

/// Storage connection flags
#[derive(clap::Args, Debug, Clone, Default)]
pub struct BlobArgs {
    /// Storage account name
    #[arg(long)]
    pub account: Option<String>,
    /// Container name (defaults to the account name)
    #[arg(long)]
    pub container: Option<String>,
    /// Shared access signature query string
    #[arg(long, env = "AZLOOK_STORAGE_SAS", hide_env_values = true)]
    pub sas_token: Option<String>,
    /// Blob service URL, for emulators and private endpoints
    #[arg(long, value_name = "URL")]
    pub service_url: Option<String>,
    /// Skip credentials (public containers)
    #[arg(long, conflicts_with = "sas_token")]
    pub anonymous: bool,
}

/// Result of probing one container
#[derive(Debug, Serialize)]
pub struct ContainerProbe {
    pub service_uri: String,
    pub container_uri: String,
    pub public_access: PublicAccessType,
    pub last_modified: DateTime<Utc>,
    pub etag: Option<String>,
    pub lease_state: Option<String>,
    pub lease_status: Option<String>,
    pub has_immutability_policy: bool,
    pub has_legal_hold: bool,
    pub metadata: BTreeMap<String, String>,
}

impl ContainerProbe {
    fn new(service_uri: &str, container_uri: &str, props: BlobContainerProperties) -> Self {
        Self {
            service_uri: service_uri.to_string(),
            container_uri: container_uri.to_string(),
            public_access: props.public_access,
            last_modified: props.last_modified,
            etag: props.etag,
            lease_state: props.lease_state.map(|s| s.to_string()),
            lease_status: props.lease_status.map(|s| s.to_string()),
            has_immutability_policy: props.has_immutability_policy,
            has_legal_hold: props.has_legal_hold,
            metadata: props.metadata,
        }
    }
}

impl Formattable for ContainerProbe {
    fn format_pretty(&self) -> String {
        format!(
            "Client URI {}\nClient URI {}\nContainer Access Level {}\nContainer Last Modified {}",
            self.service_uri,
            self.container_uri,
            self.public_access,
            format_offset_datetime(&self.last_modified)
        )
    }
}

/// Picks the storage credential: SAS, then anonymous, then the default chain.
pub(crate) fn storage_credential(
    ctx: &AppContext,
    args: &BlobArgs,
    http: HttpClient,
) -> StorageCredential {
    let sas = args
        .sas_token
        .clone()
        .or_else(|| ctx.config.storage.sas_token.clone())
        .filter(|s| !s.trim().is_empty());

    match sas {
        Some(sas) => StorageCredential::Sas(sas),
        None if args.anonymous => StorageCredential::Anonymous,
        None => StorageCredential::Aad(Arc::new(DefaultAzureCredential::new(http))),
    }
}

/// Builds the blob service client and resolves the container name.
pub(crate) fn build_service(
    ctx: &AppContext,
    args: &BlobArgs,
) -> Result<(BlobServiceClient, String), String> {
    let account = args
        .account
        .clone()
        .or_else(|| ctx.config.storage.account.clone());

    let container = args
        .container
        .clone()
        .or_else(|| ctx.config.storage.container.clone())
        .or_else(|| account.clone())
        .ok_or_else(|| {
            "No container. Pass --container or set storage.container in the config file."
                .to_string()
        })?;

    let config = ctx.config.client_config();
    let http = HttpClient::new(&config).map_err(|e| e.to_string())?;
    let credential = storage_credential(ctx, args, http);
    debug!(credential = credential.kind(), container = %container, "building blob client");

    let service = match (&args.service_url, &account) {
        (Some(url), _) => BlobServiceClient::new(url, credential, &config),
        (None, Some(account)) => BlobServiceClient::for_account(account, credential, &config),
        (None, None) => {
            return Err(
                "No storage account. Pass --account or set storage.account in the config file."
                    .to_string(),
            );
        }
    }
    .map_err(|e| e.to_string())?;

    Ok((service, container))
}

/// Fetches container properties and pairs them with the client URIs.
pub(crate) async fn probe_container(
    service: &BlobServiceClient,
    container: &str,
) -> Result<ContainerProbe, String> {
    let client = service
        .get_blob_container_client(container)
        .map_err(|e| e.to_string())?;
    let props = client
        .get_properties()
        .await
        .map_err(|e| format!("Failed to get properties for '{}': {}", container, e))?;
    Ok(ContainerProbe::new(service.uri(), client.uri(), props))
}
