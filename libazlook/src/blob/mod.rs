//! Azure Blob Storage container client.
//!
//! Covers the service and container handles and the container
//! `Get Properties` call.
//!
//! # Examples
//!
//! ```no_run
//! use libazlook::auth::DefaultAzureCredential;
//! use libazlook::blob::{BlobServiceClient, StorageCredential};
//! use libazlook::http::{ClientConfig, HttpClient};
//! use std::sync::Arc;
//!
//! # async fn example() -> libazlook::Result<()> {
//! let config = ClientConfig::default();
//! let credential = Arc::new(DefaultAzureCredential::new(HttpClient::new(&config)?));
//! let service =
//!     BlobServiceClient::for_account("mmdemo0101", StorageCredential::Aad(credential), &config)?;
//! let container = service.get_blob_container_client("mmdemo0101")?;
//! let props = container.get_properties().await?;
//! println!("{} {}", props.public_access, props.last_modified);
//! # Ok(())
//! # }
//! ```

use crate::auth::{STORAGE_SCOPE, TokenCredential};
use crate::error::{AzError, Result};
use crate::format::format_rfc1123;
use crate::http::{ClientConfig, HttpClient, check_response_status, normalize_endpoint};
use chrono::{DateTime, Utc};
use reqwest::header::{AUTHORIZATION, ETAG, HeaderMap, LAST_MODIFIED};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, instrument};


/// Storage REST API version sent with every request.
pub const API_VERSION: &str = "2021-12-02";

const META_PREFIX: &str = "x-ms-meta-";

/// Anonymous read access level of a container.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum PublicAccessType {
    /// Private container
    #[default]
    None,
    /// Anonymous read of blobs only
    Blob,
    /// Anonymous read of blobs and container listing
    BlobContainer,
}

impl PublicAccessType {
    /// Parses the `x-ms-blob-public-access` header; absent means private.
    pub fn from_header(value: Option<&str>) -> Result<Self> {
        match value.map(str::trim) {
            None | Some("") => Ok(Self::None),
            Some(v) if v.eq_ignore_ascii_case("blob") => Ok(Self::Blob),
            Some(v) if v.eq_ignore_ascii_case("container") => Ok(Self::BlobContainer),
            Some(other) => Err(AzError::validation(format!(
                "Unknown public access level '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for PublicAccessType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::None => "None",
            Self::Blob => "Blob",
            Self::BlobContainer => "BlobContainer",
        })
    }
}

/// Lease state of a container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum LeaseState {
    Available,
    Leased,
    Expired,
    Breaking,
    Broken,
    Unknown(String),
}

impl From<&str> for LeaseState {
    fn from(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "available" => Self::Available,
            "leased" => Self::Leased,
            "expired" => Self::Expired,
            "breaking" => Self::Breaking,
            "broken" => Self::Broken,
            _ => Self::Unknown(s.to_string()),
        }
    }
}

impl fmt::Display for LeaseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Available => f.write_str("available"),
            Self::Leased => f.write_str("leased"),
            Self::Expired => f.write_str("expired"),
            Self::Breaking => f.write_str("breaking"),
            Self::Broken => f.write_str("broken"),
            Self::Unknown(s) => f.write_str(s),
        }
    }
}

/// Lease status of a container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum LeaseStatus {
    Locked,
    Unlocked,
    Unknown(String),
}

impl From<&str> for LeaseStatus {
    fn from(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "locked" => Self::Locked,
            "unlocked" => Self::Unlocked,
            _ => Self::Unknown(s.to_string()),
        }
    }
}

impl fmt::Display for LeaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Locked => f.write_str("locked"),
            Self::Unlocked => f.write_str("unlocked"),
            Self::Unknown(s) => f.write_str(s),
        }
    }
}

/// Properties returned by container `Get Properties`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlobContainerProperties {
    pub last_modified: DateTime<Utc>,
    pub etag: Option<String>,
    pub public_access: PublicAccessType,
    pub lease_state: Option<LeaseState>,
    pub lease_status: Option<LeaseStatus>,
    pub has_immutability_policy: bool,
    pub has_legal_hold: bool,
    pub default_encryption_scope: Option<String>,
    pub metadata: BTreeMap<String, String>,
}

impl BlobContainerProperties {
    /// Builds properties from response headers.
    pub fn from_headers(headers: &HeaderMap) -> Result<Self> {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(|s| s.to_string())
        };
        let flag = |name: &str| {
            header(name)
                .map(|v| v.eq_ignore_ascii_case("true"))
                .unwrap_or(false)
        };

        let raw_modified = header(LAST_MODIFIED.as_str())
            .ok_or_else(|| AzError::validation("Response is missing the Last-Modified header"))?;
        let last_modified = DateTime::parse_from_rfc2822(&raw_modified)
            .map_err(|e| {
                AzError::validation_with_source(
                    format!("Invalid Last-Modified header '{}'", raw_modified),
                    e,
                )
            })?
            .with_timezone(&Utc);

        let metadata = headers
            .iter()
            .filter_map(|(name, value)| {
                let key = name.as_str().strip_prefix(META_PREFIX)?;
                let value = value.to_str().ok()?;
                Some((key.to_string(), value.to_string()))
            })
            .collect();

        Ok(Self {
            last_modified,
            etag: header(ETAG.as_str()),
            public_access: PublicAccessType::from_header(
                header("x-ms-blob-public-access").as_deref(),
            )?,
            lease_state: header("x-ms-lease-state").map(|s| LeaseState::from(s.as_str())),
            lease_status: header("x-ms-lease-status").map(|s| LeaseStatus::from(s.as_str())),
            has_immutability_policy: flag("x-ms-has-immutability-policy"),
            has_legal_hold: flag("x-ms-has-legal-hold"),
            default_encryption_scope: header("x-ms-default-encryption-scope"),
            metadata,
        })
    }
}

/// How storage requests are authorized.
#[derive(Clone)]
pub enum StorageCredential {
    /// Bearer token for `https://storage.azure.com/.default`
    Aad(Arc<dyn TokenCredential>),
    /// Shared access signature query string
    Sas(String),
    /// No authorization (public containers, emulators)
    Anonymous,
}

impl StorageCredential {
    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Aad(_) => "aad",
            Self::Sas(_) => "sas",
            Self::Anonymous => "anonymous",
        }
    }
}

impl fmt::Debug for StorageCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Aad(credential) => f.debug_tuple("Aad").field(&credential.name()).finish(),
            Self::Sas(_) => f.write_str("Sas(<redacted>)"),
            Self::Anonymous => f.write_str("Anonymous"),
        }
    }
}

/// Checks a storage account name: 3-24 lowercase letters and digits.
pub fn validate_account_name(account: &str) -> Result<()> {
    let valid = (3..=24).contains(&account.len())
        && account
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit());
    if valid {
        Ok(())
    } else {
        Err(AzError::validation(format!(
            "Invalid storage account name '{}': use 3-24 lowercase letters and digits",
            account
        )))
    }
}

/// Checks a container name.
///
/// 3-63 characters of lowercase letters, digits and single hyphens, starting
/// and ending with a letter or digit. `$root`, `$web` and `$logs` are reserved
/// names that are also accepted.
pub fn validate_container_name(name: &str) -> Result<()> {
    if matches!(name, "$root" | "$web" | "$logs") {
        return Ok(());
    }

    let bytes = name.as_bytes();
    let alnum = |b: &u8| b.is_ascii_lowercase() || b.is_ascii_digit();
    let valid = (3..=63).contains(&bytes.len())
        && bytes.iter().all(|b| alnum(b) || *b == b'-')
        && bytes.first().is_some_and(alnum)
        && bytes.last().is_some_and(alnum)
        && !name.contains("--");

    if valid {
        Ok(())
    } else {
        Err(AzError::validation(format!(
            "Invalid container name '{}': use 3-63 lowercase letters, digits and single hyphens",
            name
        )))
    }
}

#[derive(Debug)]
struct ServiceInner {
    endpoint: String,
    uri: String,
    http: HttpClient,
    credential: StorageCredential,
}

/// Client for a storage account's blob service.
#[derive(Debug, Clone)]
pub struct BlobServiceClient {
    inner: Arc<ServiceInner>,
}

impl BlobServiceClient {
    /// Creates a client for `https://{account}.blob.core.windows.net`.
    ///
    /// # Examples
    ///
    /// ```
    /// use libazlook::blob::{BlobServiceClient, StorageCredential};
    /// use libazlook::http::ClientConfig;
    ///
    /// let client = BlobServiceClient::for_account(
    ///     "mmdemo0101",
    ///     StorageCredential::Anonymous,
    ///     &ClientConfig::default(),
    /// )
    /// .unwrap();
    /// assert_eq!(client.uri(), "https://mmdemo0101.blob.core.windows.net/");
    /// ```
    pub fn for_account(
        account: &str,
        credential: StorageCredential,
        config: &ClientConfig,
    ) -> Result<Self> {
        validate_account_name(account)?;
        Self::new(
            &format!("https://{}.blob.core.windows.net", account),
            credential,
            config,
        )
    }

    /// Creates a client for any blob endpoint (emulator, private link).
    pub fn new(uri: &str, credential: StorageCredential, config: &ClientConfig) -> Result<Self> {
        let endpoint = normalize_endpoint(uri)?;
        Ok(Self {
            inner: Arc::new(ServiceInner {
                uri: format!("{}/", endpoint),
                endpoint,
                http: HttpClient::new(config)?,
                credential,
            }),
        })
    }

    /// Service URI, with a trailing slash.
    pub fn uri(&self) -> &str {
        &self.inner.uri
    }

    /// Returns a handle for one container. No request is made.
    pub fn get_blob_container_client(&self, name: &str) -> Result<BlobContainerClient> {
        validate_container_name(name)?;
        Ok(BlobContainerClient {
            service: self.clone(),
            uri: format!("{}/{}", self.inner.endpoint, name),
            name: name.to_string(),
        })
    }
}

/// Client for one blob container.
#[derive(Debug, Clone)]
pub struct BlobContainerClient {
    service: BlobServiceClient,
    uri: String,
    name: String,
}

impl BlobContainerClient {
    /// Container URI: `{service}/{name}`.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Container name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fetches the container's system properties and metadata.
    #[instrument(skip(self), fields(container = %self.name))]
    pub async fn get_properties(&self) -> Result<BlobContainerProperties> {
        let service = &self.service.inner;

        let mut url = format!("{}?restype=container", self.uri);
        if let StorageCredential::Sas(sas) = &service.credential {
            let sas = sas.trim().trim_start_matches('?');
            if !sas.is_empty() {
                url.push('&');
                url.push_str(sas);
            }
        }

        let mut request = service
            .http
            .inner()
            .get(&url)
            .header("x-ms-version", API_VERSION)
            .header("x-ms-date", format_rfc1123(&Utc::now()));

        if let StorageCredential::Aad(credential) = &service.credential {
            let token = credential.get_token(&[STORAGE_SCOPE]).await?;
            request = request.header(AUTHORIZATION, format!("Bearer {}", token.token));
        }

        debug!(uri = %self.uri, credential = service.credential.kind(), "getting container properties");
        let response = service.http.send(request, &self.uri).await?;
        let response =
            check_response_status(response, Some(("container", self.name.as_str()))).await?;

        BlobContainerProperties::from_headers(response.headers())
    }
}
