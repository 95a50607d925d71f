use super::*;
use crate::http::ClientConfig;
use mockito::Matcher;

fn http() -> HttpClient {
    HttpClient::new(&ClientConfig::default()).unwrap()
}

#[test]
fn test_from_lookup_requires_all_variables() {
    let lookup = |key: &str| match key {
        "AZURE_TENANT_ID" => Some("tenant".to_string()),
        "AZURE_CLIENT_ID" => Some("client".to_string()),
        _ => None,
    };
    let err = ClientSecretCredential::from_lookup(http(), &lookup).unwrap_err();
    assert!(err.to_string().contains("AZURE_CLIENT_SECRET is not set"));
}

#[test]
fn test_from_lookup_uses_default_authority() {
    let lookup = |key: &str| match key {
        "AZURE_TENANT_ID" => Some("tenant".to_string()),
        "AZURE_CLIENT_ID" => Some("client".to_string()),
        "AZURE_CLIENT_SECRET" => Some("secret".to_string()),
        _ => None,
    };
    let cred = ClientSecretCredential::from_lookup(http(), &lookup).unwrap();
    assert_eq!(
        cred.token_url(),
        "https://login.microsoftonline.com/tenant/oauth2/v2.0/token"
    );
}

#[test]
fn test_debug_omits_secret() {
    let cred = ClientSecretCredential::new(http(), "https://login", "t", "c", "hunter2");
    assert!(!format!("{:?}", cred).contains("hunter2"));
}

#[tokio::test]
async fn test_get_token_posts_client_credentials() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/my-tenant/oauth2/v2.0/token")
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("grant_type".into(), "client_credentials".into()),
            Matcher::UrlEncoded("client_id".into(), "app".into()),
            Matcher::UrlEncoded("client_secret".into(), "s3cret".into()),
            Matcher::UrlEncoded(
                "scope".into(),
                "https://management.azure.com/.default".into(),
            ),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"token_type":"Bearer","expires_in":3599,"access_token":"aad-token"}"#)
        .create_async()
        .await;

    let cred = ClientSecretCredential::new(http(), server.url(), "my-tenant", "app", "s3cret");
    let token = cred
        .get_token(&["https://management.azure.com/.default"])
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(token.token, "aad-token");
    assert!(!token.is_expired(Duration::minutes(5)));
}

#[tokio::test]
async fn test_get_token_maps_aad_error() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/t/oauth2/v2.0/token")
        .with_status(401)
        .with_body(r#"{"error":"invalid_client","error_description":"AADSTS7000215: Invalid client secret provided."}"#)
        .create_async()
        .await;

    let cred = ClientSecretCredential::new(http(), server.url(), "t", "app", "wrong");
    let err = cred.get_token(&["scope/.default"]).await.unwrap_err();

    match err {
        AzError::Authentication {
            message,
            status_code,
        } => {
            assert_eq!(status_code, Some(401));
            assert!(message.starts_with("invalid_client: AADSTS7000215"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_get_token_server_error_is_not_auth_failure() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/t/oauth2/v2.0/token")
        .with_status(503)
        .with_body("unavailable")
        .create_async()
        .await;

    let cred = ClientSecretCredential::new(http(), server.url(), "t", "app", "s");
    let err = cred.get_token(&["scope/.default"]).await.unwrap_err();
    assert!(matches!(err, AzError::Server { status_code: 503, .. }));
}
