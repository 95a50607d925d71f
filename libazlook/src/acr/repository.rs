//! Repository and artifact handles.

use super::ContainerRegistryClient;
use super::models::{
    ArtifactManifestProperties, ArtifactTagProperties, RepositoryProperties, WireManifestEnvelope,
    WireManifestList, WireRepository, WireTagEnvelope, WireTagList,
};
use crate::digest::Digest;
use crate::error::{AzError, Result};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, instrument};

/// What a [`RegistryArtifact`] points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactReference {
    /// A manifest digest
    Digest(Digest),
    /// A tag, resolved to a digest on use
    Tag(String),
}

impl FromStr for ArtifactReference {
    type Err = AzError;

    /// Anything containing `:` must be a valid digest; everything else is a tag.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(AzError::validation("Tag or digest cannot be empty"));
        }
        if s.contains(':') {
            Ok(Self::Digest(s.parse()?))
        } else {
            Ok(Self::Tag(s.to_string()))
        }
    }
}

impl fmt::Display for ArtifactReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Digest(d) => d.fmt(f),
            Self::Tag(t) => f.write_str(t),
        }
    }
}

/// A repository inside a registry. Creating one makes no request.
#[derive(Debug, Clone)]
pub struct ContainerRepository {
    client: ContainerRegistryClient,
    name: String,
}

impl ContainerRepository {
    pub(crate) fn new(client: ContainerRegistryClient, name: &str) -> Self {
        Self {
            client,
            name: name.to_string(),
        }
    }

    /// Repository name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registry login server this repository belongs to.
    pub fn registry_login_server(&self) -> &str {
        self.client.login_server()
    }

    pub(crate) fn scope(&self) -> String {
        format!("repository:{}:metadata_read", self.name)
    }

    fn url(&self, suffix: &str) -> String {
        format!("{}/acr/v1/{}{}", self.client.endpoint(), self.name, suffix)
    }

    /// Fetches repository attributes.
    #[instrument(skip(self), fields(repository = %self.name))]
    pub async fn get_properties(&self) -> Result<RepositoryProperties> {
        let wire: WireRepository = self
            .client
            .get_json(
                &self.url(""),
                &self.scope(),
                Some(("repository", self.name.as_str())),
            )
            .await?;
        let mut props = RepositoryProperties::from(wire);
        if props.registry_login_server.is_empty() {
            props.registry_login_server = self.client.login_server().to_string();
        }
        Ok(props)
    }

    /// Lists every manifest in the repository, following pages.
    #[instrument(skip(self), fields(repository = %self.name))]
    pub async fn list_manifest_properties(&self) -> Result<Vec<ArtifactManifestProperties>> {
        let first = self.client.with_page_size(self.url("/_manifests"));
        let login_server = self.client.login_server().to_string();
        let repository = self.name.clone();

        let manifests = self
            .client
            .get_paged(
                first,
                &self.scope(),
                Some(("repository", self.name.as_str())),
                |page: WireManifestList| {
                    let registry = if page.registry.is_empty() {
                        login_server.clone()
                    } else {
                        page.registry
                    };
                    let image = if page.image_name.is_empty() {
                        repository.clone()
                    } else {
                        page.image_name
                    };
                    page.manifests
                        .into_iter()
                        .map(|m| m.into_properties(&registry, &image))
                        .collect()
                },
            )
            .await?;

        debug!(count = manifests.len(), "listed manifests");
        Ok(manifests)
    }

    /// Lists every tag in the repository, following pages.
    #[instrument(skip(self), fields(repository = %self.name))]
    pub async fn list_tag_properties(&self) -> Result<Vec<ArtifactTagProperties>> {
        let first = self.client.with_page_size(self.url("/_tags"));
        let repository = self.name.clone();

        self.client
            .get_paged(
                first,
                &self.scope(),
                Some(("repository", self.name.as_str())),
                |page: WireTagList| {
                    let image = if page.image_name.is_empty() {
                        repository.clone()
                    } else {
                        page.image_name
                    };
                    page.tags
                        .into_iter()
                        .map(|t| t.into_properties(&image))
                        .collect()
                },
            )
            .await
    }

    /// Returns a handle for one artifact, by digest or tag.
    ///
    /// Fails with a validation error for a malformed digest.
    pub fn get_artifact(&self, digest_or_tag: &str) -> Result<RegistryArtifact> {
        Ok(RegistryArtifact {
            repository: self.clone(),
            reference: digest_or_tag.parse()?,
        })
    }
}

/// One artifact (manifest) in a repository.
#[derive(Debug, Clone)]
pub struct RegistryArtifact {
    repository: ContainerRepository,
    reference: ArtifactReference,
}

impl RegistryArtifact {
    /// The digest or tag this handle was created with.
    pub fn reference(&self) -> &ArtifactReference {
        &self.reference
    }

    /// Repository name.
    pub fn repository_name(&self) -> &str {
        self.repository.name()
    }

    /// Fetches the tag's properties. Only valid for tag references.
    pub async fn get_tag_properties(&self) -> Result<ArtifactTagProperties> {
        let ArtifactReference::Tag(tag) = &self.reference else {
            return Err(AzError::validation(format!(
                "'{}' is a digest, not a tag",
                self.reference
            )));
        };

        let repo = &self.repository;
        let label = format!("{}:{}", repo.name, tag);
        let envelope: WireTagEnvelope = repo
            .client
            .get_json(
                &repo.url(&format!("/_tags/{}", tag)),
                &repo.scope(),
                Some(("tag", label.as_str())),
            )
            .await?;
        Ok(envelope.tag.into_properties(&repo.name))
    }

    /// Fetches manifest properties, resolving a tag to its digest first.
    #[instrument(skip(self), fields(repository = %self.repository.name, reference = %self.reference))]
    pub async fn get_manifest_properties(&self) -> Result<ArtifactManifestProperties> {
        let digest = match &self.reference {
            ArtifactReference::Digest(d) => d.to_string(),
            ArtifactReference::Tag(_) => {
                let tag = self.get_tag_properties().await?;
                debug!(digest = %tag.digest, "resolved tag");
                tag.digest
            }
        };

        let repo = &self.repository;
        let label = format!("{}@{}", repo.name, digest);
        let envelope: WireManifestEnvelope = repo
            .client
            .get_json(
                &repo.url(&format!("/_manifests/{}", digest)),
                &repo.scope(),
                Some(("manifest", label.as_str())),
            )
            .await?;

        let registry = if envelope.registry.is_empty() {
            repo.client.login_server().to_string()
        } else {
            envelope.registry
        };
        let image = if envelope.image_name.is_empty() {
            repo.name.clone()
        } else {
            envelope.image_name
        };
        Ok(envelope.manifest.into_properties(&registry, &image))
    }
}
