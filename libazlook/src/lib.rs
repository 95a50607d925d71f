//! azlook - Azure Container Registry and Blob Storage explorer library
//!
//! Small typed clients that speak the Azure Container Registry metadata API
//! and the Blob Storage REST API directly, plus the credential chain they
//! authenticate with.
//!
//! # Quick Start
//!
//! ```no_run
//! use libazlook::acr::{ContainerRegistryClient, ContainerRegistryClientOptions};
//! use libazlook::auth::{DefaultAzureCredential, RegistryCredentials};
//! use libazlook::http::{ClientConfig, HttpClient};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let http = HttpClient::new(&ClientConfig::default())?;
//!     let credential = Arc::new(DefaultAzureCredential::new(http));
//!     let client = ContainerRegistryClient::new(
//!         "https://myregistry.azurecr.io",
//!         RegistryCredentials::aad(credential),
//!         ContainerRegistryClientOptions::default(),
//!     )?;
//!
//!     for name in client.list_repository_names().await? {
//!         println!("{}", name);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! - [`acr`] - registry client, repositories and artifacts
//! - [`blob`] - blob service and container clients
//! - [`auth`] - token credentials and the default chain
//! - [`config`] - YAML configuration
//! - [`http`] - shared transport and status mapping
//! - [`error`] - the [`AzError`] taxonomy

#![warn(clippy::all)]

/// Returns the libazlook crate version.
///
/// # Examples
///
/// ```
/// let version = libazlook::version();
/// assert!(!version.is_empty());
/// ```
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

pub use acr::{ContainerRegistryClient, ContainerRegistryClientOptions, RegistryAudience};
pub use auth::{DefaultAzureCredential, RegistryCredentials, TokenCredential};
pub use blob::{BlobContainerClient, BlobServiceClient, StorageCredential};
pub use config::Config;
pub use digest::Digest;
pub use error::{AzError, Result};

pub mod acr;
pub mod auth;
pub mod blob;
pub mod config;
pub mod digest;
pub mod error;
pub mod format;
pub mod http;
