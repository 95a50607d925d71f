use super::*;
use crate::http::ClientConfig;
use mockito::Matcher;

fn http() -> HttpClient {
    HttpClient::new(&ClientConfig::default()).unwrap()
}

#[test]
fn test_from_lookup_defaults_to_imds() {
    let cred = ManagedIdentityCredential::from_lookup(http(), &|_: &str| None);
    assert_eq!(
        cred.source,
        MsiSource::Imds {
            endpoint: IMDS_ENDPOINT.to_string()
        }
    );
    assert!(cred.client_id.is_none());
}

#[test]
fn test_from_lookup_prefers_app_service() {
    let lookup = |key: &str| match key {
        "IDENTITY_ENDPOINT" => Some("http://localhost:8081/msi/token".to_string()),
        "IDENTITY_HEADER" => Some("hdr".to_string()),
        "AZURE_CLIENT_ID" => Some("user-assigned".to_string()),
        _ => None,
    };
    let cred = ManagedIdentityCredential::from_lookup(http(), &lookup);
    assert_eq!(
        cred.source,
        MsiSource::AppService {
            endpoint: "http://localhost:8081/msi/token".to_string(),
            header: "hdr".to_string()
        }
    );
    assert_eq!(cred.client_id.as_deref(), Some("user-assigned"));
}

#[test]
fn test_epoch_seconds_parsing() {
    let n: EpochSeconds = serde_json::from_str("1700000000").unwrap();
    assert_eq!(n.to_datetime().unwrap().timestamp(), 1_700_000_000);

    let s: EpochSeconds = serde_json::from_str("\"1700000000\"").unwrap();
    assert_eq!(s.to_datetime().unwrap().timestamp(), 1_700_000_000);

    let bad: EpochSeconds = serde_json::from_str("\"soon\"").unwrap();
    assert!(bad.to_datetime().is_err());
}

#[tokio::test]
async fn test_imds_request_shape() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/metadata/identity/oauth2/token")
        .match_header("metadata", "true")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("api-version".into(), "2018-02-01".into()),
            Matcher::UrlEncoded("resource".into(), "https://storage.azure.com".into()),
        ]))
        .with_status(200)
        .with_body(r#"{"access_token":"msi-token","expires_on":"4102444800","resource":"https://storage.azure.com","token_type":"Bearer"}"#)
        .create_async()
        .await;

    let endpoint = format!("{}/metadata/identity/oauth2/token", server.url());
    let cred = ManagedIdentityCredential::imds(http(), endpoint, None);
    let token = cred
        .get_token(&["https://storage.azure.com/.default"])
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(token.token, "msi-token");
    assert_eq!(token.expires_on.timestamp(), 4_102_444_800);
}

#[tokio::test]
async fn test_app_service_request_shape() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/msi/token")
        .match_header("x-identity-header", "secret-header")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("api-version".into(), "2019-08-01".into()),
            Matcher::UrlEncoded("client_id".into(), "uami".into()),
        ]))
        .with_status(200)
        .with_body(r#"{"access_token":"app-token","expires_on":4102444800}"#)
        .create_async()
        .await;

    let cred = ManagedIdentityCredential::app_service(
        http(),
        format!("{}/msi/token", server.url()),
        "secret-header",
        Some("uami".to_string()),
    );
    let token = cred
        .get_token(&["https://management.azure.com/.default"])
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(token.token, "app-token");
}

#[tokio::test]
async fn test_rejects_multiple_scopes() {
    let cred = ManagedIdentityCredential::imds(http(), "http://127.0.0.1:1/token", None);
    let err = cred.get_token(&["a/.default", "b/.default"]).await.unwrap_err();
    assert!(matches!(err, AzError::Validation { .. }));
}

#[tokio::test]
async fn test_identity_not_found_is_unavailable() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/token")
        .match_query(Matcher::Any)
        .with_status(400)
        .with_body(r#"{"error":"invalid_request","error_description":"Identity not found"}"#)
        .create_async()
        .await;

    let cred = ManagedIdentityCredential::imds(http(), format!("{}/token", server.url()), None);
    let err = cred.get_token(&["https://x/.default"]).await.unwrap_err();
    assert!(matches!(err, AzError::Credential { .. }));
    assert!(err.to_string().contains("Identity not found"));
}

#[tokio::test]
async fn test_forbidden_identity_is_an_authentication_failure() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/token")
        .match_query(Matcher::Any)
        .with_status(403)
        .with_body(r#"{"error":"forbidden","error_description":"Access denied"}"#)
        .create_async()
        .await;

    let cred = ManagedIdentityCredential::imds(http(), format!("{}/token", server.url()), None);
    let err = cred.get_token(&["https://x/.default"]).await.unwrap_err();
    assert!(matches!(
        err,
        AzError::Authentication {
            status_code: Some(403),
            ..
        }
    ));
}
