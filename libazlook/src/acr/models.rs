//! Container registry data types.
//!
//! Wire structs mirror the `/acr/v1` JSON bodies; the public property types
//! are what callers see.

use crate::error::{AzError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Properties of a repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositoryProperties {
    /// Repository name, e.g. `library/hello-world`
    pub name: String,
    /// Login server of the owning registry
    pub registry_login_server: String,
    /// Number of manifests in the repository
    pub manifest_count: u64,
    /// Number of tags in the repository
    pub tag_count: u64,
    /// Creation time
    pub created_on: Option<DateTime<Utc>>,
    /// Last update time
    pub last_updated_on: Option<DateTime<Utc>>,
}

/// Properties of a single manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactManifestProperties {
    /// Login server of the owning registry
    pub registry_login_server: String,
    /// Repository the manifest lives in
    pub repository_name: String,
    /// Manifest digest, e.g. `sha256:...`
    pub digest: String,
    /// Size of the manifest and its layers, if reported
    pub size_in_bytes: Option<u64>,
    /// Creation time
    pub created_on: Option<DateTime<Utc>>,
    /// Last update time
    pub last_updated_on: Option<DateTime<Utc>>,
    /// CPU architecture (single-platform images)
    pub architecture: Option<String>,
    /// Operating system (single-platform images)
    pub operating_system: Option<String>,
    /// Manifest media type
    pub media_type: Option<String>,
    /// Tags pointing at this manifest; may be empty
    pub tags: Vec<String>,
    /// Whether the manifest can be deleted
    pub can_delete: Option<bool>,
    /// Whether the manifest can be overwritten
    pub can_write: Option<bool>,
    /// Whether the manifest shows in listings
    pub can_list: Option<bool>,
    /// Whether the manifest can be pulled
    pub can_read: Option<bool>,
}

/// Properties of a tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactTagProperties {
    /// Repository the tag lives in
    pub repository_name: String,
    /// Tag name
    pub name: String,
    /// Digest the tag points at
    pub digest: String,
    /// Creation time
    pub created_on: Option<DateTime<Utc>>,
    /// Last update time
    pub last_updated_on: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireChangeableAttributes {
    pub delete_enabled: Option<bool>,
    pub write_enabled: Option<bool>,
    pub list_enabled: Option<bool>,
    pub read_enabled: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireCatalog {
    #[serde(default)]
    pub repositories: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireRepository {
    #[serde(default)]
    pub registry: String,
    pub image_name: String,
    #[serde(default)]
    pub manifest_count: u64,
    #[serde(default)]
    pub tag_count: u64,
    pub created_time: Option<DateTime<Utc>>,
    pub last_update_time: Option<DateTime<Utc>>,
}

impl From<WireRepository> for RepositoryProperties {
    fn from(w: WireRepository) -> Self {
        Self {
            name: w.image_name,
            registry_login_server: w.registry,
            manifest_count: w.manifest_count,
            tag_count: w.tag_count,
            created_on: w.created_time,
            last_updated_on: w.last_update_time,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireManifest {
    pub digest: String,
    pub image_size: Option<u64>,
    pub created_time: Option<DateTime<Utc>>,
    pub last_update_time: Option<DateTime<Utc>>,
    pub architecture: Option<String>,
    pub os: Option<String>,
    pub media_type: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub changeable_attributes: Option<WireChangeableAttributes>,
}

impl WireManifest {
    pub fn into_properties(self, registry: &str, repository: &str) -> ArtifactManifestProperties {
        let attrs = self.changeable_attributes.unwrap_or_default();
        ArtifactManifestProperties {
            registry_login_server: registry.to_string(),
            repository_name: repository.to_string(),
            digest: self.digest,
            size_in_bytes: self.image_size,
            created_on: self.created_time,
            last_updated_on: self.last_update_time,
            architecture: self.architecture,
            operating_system: self.os,
            media_type: self.media_type,
            tags: self.tags.unwrap_or_default(),
            can_delete: attrs.delete_enabled,
            can_write: attrs.write_enabled,
            can_list: attrs.list_enabled,
            can_read: attrs.read_enabled,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireManifestList {
    #[serde(default)]
    pub registry: String,
    #[serde(default)]
    pub image_name: String,
    #[serde(default)]
    pub manifests: Vec<WireManifest>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireManifestEnvelope {
    #[serde(default)]
    pub registry: String,
    #[serde(default)]
    pub image_name: String,
    pub manifest: WireManifest,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireTag {
    pub name: String,
    pub digest: String,
    pub created_time: Option<DateTime<Utc>>,
    pub last_update_time: Option<DateTime<Utc>>,
}

impl WireTag {
    pub fn into_properties(self, repository: &str) -> ArtifactTagProperties {
        ArtifactTagProperties {
            repository_name: repository.to_string(),
            name: self.name,
            digest: self.digest,
            created_on: self.created_time,
            last_updated_on: self.last_update_time,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireTagList {
    #[serde(default)]
    pub image_name: String,
    #[serde(default)]
    pub tags: Vec<WireTag>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireTagEnvelope {
    pub tag: WireTag,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RefreshTokenResponse {
    pub refresh_token: String,
}

/// Realm token response. Docker realms send `token`, ACR sends
/// `access_token`, and some send both.
#[derive(Debug, Deserialize)]
pub(crate) struct AccessTokenResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
}

impl AccessTokenResponse {
    pub fn into_token(self) -> Result<String> {
        self.access_token
            .or(self.token)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AzError::validation("Registry token response has no access token"))
    }
}

#[cfg(test)]
#[path = "models_tests.rs"]
mod tests;
