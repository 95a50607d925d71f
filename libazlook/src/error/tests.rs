use super::*;
use std::error::Error as _;
use std::io;

#[test]
fn test_network_error_display() {
    let err = AzError::network("connection refused");
    assert_eq!(err.to_string(), "Network error: connection refused");
}

#[test]
fn test_network_error_with_source_keeps_source() {
    let io_err = io::Error::new(io::ErrorKind::ConnectionRefused, "refused");
    let err = AzError::network_with_source("failed to connect", io_err);
    assert!(err.source().is_some());
}

#[test]
fn test_authentication_error_display() {
    let err = AzError::authentication("token rejected", Some(401));
    assert_eq!(
        err.to_string(),
        "Authentication error (status: Some(401)): token rejected"
    );
    assert!(err.is_auth_failure());
}

#[test]
fn test_credential_error_lists_attempts() {
    let err = AzError::credential(
        "no credential source produced a token",
        vec![
            "EnvironmentCredential: AZURE_TENANT_ID not set".to_string(),
            "ManagedIdentityCredential: connection refused".to_string(),
        ],
    );
    let msg = err.to_string();
    assert!(msg.starts_with("Credential unavailable: no credential source produced a token"));
    assert!(msg.contains("\n  - EnvironmentCredential: AZURE_TENANT_ID not set"));
    assert!(msg.contains("\n  - ManagedIdentityCredential: connection refused"));
    assert!(err.is_auth_failure());
}

#[test]
fn test_credential_error_without_attempts() {
    let err = AzError::credential("empty chain", vec![]);
    assert_eq!(err.to_string(), "Credential unavailable: empty chain");
}

#[test]
fn test_not_found_error_display() {
    let err = AzError::not_found("container", "mmdemo0101");
    assert_eq!(err.to_string(), "container not found: mmdemo0101");
    assert!(!err.is_auth_failure());
}

#[test]
fn test_rate_limit_keeps_retry_after() {
    let err = AzError::rate_limit("slow down", Some(30));
    match err {
        AzError::RateLimit { retry_after, .. } => assert_eq!(retry_after, Some(30)),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_server_error_display() {
    let err = AzError::server("bad gateway", 502);
    assert_eq!(err.to_string(), "Server error (status: 502): bad gateway");
}

#[test]
fn test_validation_with_source() {
    let io_err = io::Error::new(io::ErrorKind::InvalidData, "bad bytes");
    let err = AzError::validation_with_source("invalid body", io_err);
    assert!(matches!(err, AzError::Validation { .. }));
    assert!(err.source().is_some());
}

#[test]
fn test_config_error_keeps_path() {
    let err = AzError::config("missing file", Some("/tmp/azlook.yaml"));
    match err {
        AzError::Config { path, .. } => assert_eq!(path.as_deref(), Some("/tmp/azlook.yaml")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_config_crate_error_converts_without_path() {
    let err: AzError = config::ConfigError::Message("bad value".to_string()).into();
    match &err {
        AzError::Config { path, message, .. } => {
            assert!(path.is_none());
            assert_eq!(message, "Failed to build configuration");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.source().is_some());
}
