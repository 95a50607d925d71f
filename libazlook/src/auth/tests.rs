use super::*;

#[test]
fn test_credentials_anonymous() {
    let creds = RegistryCredentials::anonymous();
    assert!(matches!(creds, RegistryCredentials::Anonymous));
    assert_eq!(creds.to_header_value(), None);
    assert_eq!(creds.kind(), "anonymous");
}

#[test]
fn test_credentials_basic() {
    let creds = RegistryCredentials::basic("myregistry", "p@ss");
    match &creds {
        RegistryCredentials::Basic { username, password } => {
            assert_eq!(username, "myregistry");
            assert_eq!(password, "p@ss");
        }
        _ => panic!("Expected Basic credentials"),
    }

    // base64("myregistry:p@ss")
    assert_eq!(
        creds.to_header_value().unwrap(),
        "Basic bXlyZWdpc3RyeTpwQHNz"
    );
}

#[test]
fn test_credentials_aad_has_no_static_header() {
    let creds = RegistryCredentials::aad(Arc::new(StaticTokenCredential::new("tok")));
    assert_eq!(creds.to_header_value(), None);
    assert_eq!(creds.kind(), "aad");
}

#[test]
fn test_credentials_debug_redacts_password() {
    let creds = RegistryCredentials::basic("user", "supersecret");
    let debug = format!("{:?}", creds);
    assert!(debug.contains("user"));
    assert!(!debug.contains("supersecret"));
}

#[test]
fn test_access_token_debug_redacts_token() {
    let token = AccessToken::new("eyJhbGciOi", Utc::now());
    let debug = format!("{:?}", token);
    assert!(!debug.contains("eyJhbGciOi"));
}

#[test]
fn test_access_token_expiry() {
    let fresh = AccessToken::new("a", Utc::now() + Duration::hours(1));
    assert!(!fresh.is_expired(Duration::minutes(5)));

    let stale = AccessToken::new("b", Utc::now() - Duration::seconds(1));
    assert!(stale.is_expired(Duration::zero()));
}

#[test]
fn test_static_token_from_lookup() {
    let lookup = |key: &str| match key {
        ACCESS_TOKEN_ENV => Some(" abc ".to_string()),
        _ => None,
    };
    let cred = StaticTokenCredential::from_lookup(&lookup).unwrap();
    assert_eq!(cred.token.token, "abc");
}

#[test]
fn test_static_token_from_lookup_ignores_blank() {
    let lookup = |_: &str| Some("   ".to_string());
    assert!(StaticTokenCredential::from_lookup(&lookup).is_none());

    let lookup = |_: &str| None;
    assert!(StaticTokenCredential::from_lookup(&lookup).is_none());
}

#[tokio::test]
async fn test_static_token_credential_returns_token() {
    let cred = StaticTokenCredential::new("fixed");
    let token = cred.get_token(&[STORAGE_SCOPE]).await.unwrap();
    assert_eq!(token.token, "fixed");
    assert_eq!(cred.name(), "StaticTokenCredential");
}

#[test]
fn test_scope_to_resource() {
    assert_eq!(
        scope_to_resource("https://storage.azure.com/.default"),
        "https://storage.azure.com"
    );
    assert_eq!(
        scope_to_resource("https://storage.azure.com"),
        "https://storage.azure.com"
    );
}

#[test]
fn test_single_scope() {
    assert_eq!(single_scope(&["a"], "X").unwrap(), "a");
    assert!(single_scope(&[], "X").is_err());
    assert!(single_scope(&["a", "b"], "X").is_err());
}

#[test]
fn test_auth_challenge_parse_acr() {
    let header = r#"Bearer realm="https://myregistry.azurecr.io/oauth2/token",service="myregistry.azurecr.io",scope="registry:catalog:*""#;
    let challenge = AuthChallenge::parse(header).unwrap();
    assert_eq!(challenge.scheme, "Bearer");
    assert_eq!(challenge.realm, "https://myregistry.azurecr.io/oauth2/token");
    assert_eq!(challenge.service.as_deref(), Some("myregistry.azurecr.io"));
    assert_eq!(challenge.scope.as_deref(), Some("registry:catalog:*"));
}

#[test]
fn test_auth_challenge_scope_with_comma() {
    let header = r#"Bearer realm="https://r/oauth2/token",service="r",scope="repository:hello-world:pull,push""#;
    let challenge = AuthChallenge::parse(header).unwrap();
    assert_eq!(
        challenge.scope.as_deref(),
        Some("repository:hello-world:pull,push")
    );
}

#[test]
fn test_auth_challenge_missing_realm() {
    let err = AuthChallenge::parse(r#"Bearer service="r""#).unwrap_err();
    assert!(err.to_string().contains("realm"));
}

#[test]
fn test_auth_challenge_no_params() {
    assert!(AuthChallenge::parse("Bearer").is_err());
}

#[test]
fn test_auth_challenge_ignores_unknown_params() {
    let header = r#"Bearer realm="https://r/token",error="invalid_token""#;
    let challenge = AuthChallenge::parse(header).unwrap();
    assert_eq!(challenge.realm, "https://r/token");
    assert!(challenge.service.is_none());
    assert!(challenge.scope.is_none());
}
