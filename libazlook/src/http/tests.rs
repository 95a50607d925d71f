use super::*;
use reqwest::header::{HeaderValue, LINK, RETRY_AFTER};

#[test]
fn test_client_config_default() {
    let config = ClientConfig::new();
    assert_eq!(config.timeout_seconds, 30);
    assert_eq!(config.max_idle_per_host, 10);
}

#[test]
fn test_client_config_builder_chain() {
    let config = ClientConfig::new().with_timeout(5).with_max_idle_per_host(2);
    assert_eq!(config.timeout_seconds, 5);
    assert_eq!(config.max_idle_per_host, 2);
}

#[test]
fn test_http_client_builds() {
    assert!(HttpClient::new(&ClientConfig::default()).is_ok());
}

#[test]
fn test_normalize_endpoint_adds_https() {
    assert_eq!(
        normalize_endpoint("myregistry.azurecr.io").unwrap(),
        "https://myregistry.azurecr.io"
    );
}

#[test]
fn test_normalize_endpoint_keeps_http() {
    assert_eq!(
        normalize_endpoint("http://127.0.0.1:10000").unwrap(),
        "http://127.0.0.1:10000"
    );
}

#[test]
fn test_normalize_endpoint_strips_trailing_slashes() {
    assert_eq!(
        normalize_endpoint("https://myregistry.azurecr.io///").unwrap(),
        "https://myregistry.azurecr.io"
    );
}

#[test]
fn test_normalize_endpoint_trims_whitespace() {
    assert_eq!(
        normalize_endpoint("  https://acct.blob.core.windows.net  ").unwrap(),
        "https://acct.blob.core.windows.net"
    );
}

#[test]
fn test_normalize_endpoint_rejects_empty() {
    let err = normalize_endpoint("   ").unwrap_err();
    assert!(matches!(err, AzError::Validation { .. }));
}

#[test]
fn test_normalize_endpoint_rejects_other_schemes() {
    let err = normalize_endpoint("ftp://example.com").unwrap_err();
    assert!(err.to_string().contains("Only 'http' and 'https'"));
}

#[test]
fn test_extract_next_link_with_next() {
    let mut headers = HeaderMap::new();
    headers.insert(
        LINK,
        HeaderValue::from_static("</acr/v1/_catalog?last=hello&n=2>; rel=\"next\""),
    );
    assert_eq!(
        extract_next_link(&headers),
        Some("/acr/v1/_catalog?last=hello&n=2".to_string())
    );
}

#[test]
fn test_extract_next_link_ignores_other_relations() {
    let mut headers = HeaderMap::new();
    headers.insert(
        LINK,
        HeaderValue::from_static("</acr/v1/_catalog?last=a>; rel=\"prev\""),
    );
    assert_eq!(extract_next_link(&headers), None);
}

#[test]
fn test_extract_next_link_picks_next_among_many() {
    let mut headers = HeaderMap::new();
    headers.insert(
        LINK,
        HeaderValue::from_static("</first>; rel=\"prev\", </second>; rel=\"next\""),
    );
    assert_eq!(extract_next_link(&headers), Some("/second".to_string()));
}

#[test]
fn test_extract_next_link_missing_header() {
    assert_eq!(extract_next_link(&HeaderMap::new()), None);
}

#[test]
fn test_resolve_link_variants() {
    let endpoint = "https://myregistry.azurecr.io";
    assert_eq!(
        resolve_link(endpoint, "/acr/v1/_catalog?last=a"),
        "https://myregistry.azurecr.io/acr/v1/_catalog?last=a"
    );
    assert_eq!(
        resolve_link(endpoint, "acr/v1/_catalog"),
        "https://myregistry.azurecr.io/acr/v1/_catalog"
    );
    assert_eq!(
        resolve_link(endpoint, "https://other.example/page2"),
        "https://other.example/page2"
    );
}

#[test]
fn test_retry_after_seconds() {
    let mut headers = HeaderMap::new();
    headers.insert(RETRY_AFTER, HeaderValue::from_static("12"));
    assert_eq!(retry_after_seconds(&headers), Some(12));

    headers.insert(
        RETRY_AFTER,
        HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"),
    );
    assert_eq!(retry_after_seconds(&headers), None);
}

#[test]
fn test_status_to_error_mapping() {
    let url = "https://x/y";
    assert!(matches!(
        status_to_error(StatusCode::UNAUTHORIZED, url, "", None, None),
        AzError::Authentication {
            status_code: Some(401),
            ..
        }
    ));
    assert!(matches!(
        status_to_error(StatusCode::FORBIDDEN, url, "", None, None),
        AzError::Authentication {
            status_code: Some(403),
            ..
        }
    ));
    assert!(matches!(
        status_to_error(StatusCode::SERVICE_UNAVAILABLE, url, "", None, None),
        AzError::Server {
            status_code: 503,
            ..
        }
    ));
    assert!(matches!(
        status_to_error(StatusCode::TOO_MANY_REQUESTS, url, "", Some(7), None),
        AzError::RateLimit {
            retry_after: Some(7),
            ..
        }
    ));
    assert!(matches!(
        status_to_error(StatusCode::IM_A_TEAPOT, url, "", None, None),
        AzError::Network { .. }
    ));
}

#[test]
fn test_status_to_error_not_found_uses_resource() {
    let err = status_to_error(
        StatusCode::NOT_FOUND,
        "https://x/y",
        "",
        None,
        Some(("container", "photos")),
    );
    assert_eq!(err.to_string(), "container not found: photos");

    let err = status_to_error(StatusCode::NOT_FOUND, "https://x/y", "", None, None);
    assert_eq!(err.to_string(), "endpoint not found: https://x/y");
}

#[tokio::test]
async fn test_check_response_status_passes_success() {
    let mut server = mockito::Server::new_async().await;
    let _m = server
        .mock("GET", "/ok")
        .with_status(200)
        .with_body("fine")
        .create_async()
        .await;

    let client = HttpClient::new(&ClientConfig::default()).unwrap();
    let url = format!("{}/ok", server.url());
    let response = client.send(client.inner().get(&url), &url).await.unwrap();
    let response = check_response_status(response, None).await.unwrap();
    assert_eq!(response.text().await.unwrap(), "fine");
}

#[tokio::test]
async fn test_check_response_status_reads_retry_after() {
    let mut server = mockito::Server::new_async().await;
    let _m = server
        .mock("GET", "/busy")
        .with_status(429)
        .with_header("retry-after", "3")
        .create_async()
        .await;

    let client = HttpClient::new(&ClientConfig::default()).unwrap();
    let url = format!("{}/busy", server.url());
    let response = client.send(client.inner().get(&url), &url).await.unwrap();
    let err = check_response_status(response, None).await.unwrap_err();
    assert!(matches!(
        err,
        AzError::RateLimit {
            retry_after: Some(3),
            ..
        }
    ));
}

#[tokio::test]
async fn test_send_to_closed_port_is_network_error() {
    let client = HttpClient::new(&ClientConfig::new().with_timeout(2)).unwrap();
    let url = "http://127.0.0.1:1/unreachable";
    let err = client.send(client.inner().get(url), url).await.unwrap_err();
    assert!(matches!(err, AzError::Network { .. }));
}
