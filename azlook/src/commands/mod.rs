/// Container registry commands
pub mod acr;

/// Blob storage commands
pub mod blob;

/// Config command handlers
pub mod config;

/// Version command handlers
pub mod version;
