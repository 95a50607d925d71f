use super::*;

#[test]
fn test_args_include_resource() {
    let cred = AzureCliCredential::new();
    let args = cred.args("https://storage.azure.com");
    assert_eq!(
        args,
        vec![
            "account",
            "get-access-token",
            "--output",
            "json",
            "--resource",
            "https://storage.azure.com"
        ]
    );
}

#[test]
fn test_args_with_tenant() {
    let cred = AzureCliCredential::new().with_tenant("contoso");
    let args = cred.args("r");
    assert_eq!(&args[args.len() - 2..], ["--tenant", "contoso"]);
}

#[test]
fn test_parse_output_prefers_epoch() {
    let stdout = r#"{
        "accessToken": "cli-token",
        "expiresOn": "2030-01-01 00:00:00.000000",
        "expires_on": 1893456000,
        "subscription": "sub",
        "tenant": "tenant",
        "tokenType": "Bearer"
    }"#;
    let token = parse_cli_output(stdout).unwrap();
    assert_eq!(token.token, "cli-token");
    assert_eq!(token.expires_on.timestamp(), 1_893_456_000);
}

#[test]
fn test_parse_output_local_timestamp() {
    let stdout = r#"{"accessToken": "t", "expiresOn": "2030-06-15 12:30:00.123456"}"#;
    let token = parse_cli_output(stdout).unwrap();

    let expected = Local
        .with_ymd_and_hms(2030, 6, 15, 12, 30, 0)
        .earliest()
        .unwrap()
        .with_timezone(&Utc);
    assert_eq!(token.expires_on.timestamp(), expected.timestamp());
}

#[test]
fn test_parse_output_without_fraction() {
    let stdout = r#"{"accessToken": "t", "expiresOn": "2030-06-15 12:30:00"}"#;
    assert!(parse_cli_output(stdout).is_ok());
}

#[test]
fn test_parse_output_missing_expiry() {
    let err = parse_cli_output(r#"{"accessToken": "t"}"#).unwrap_err();
    assert!(err.to_string().contains("no token expiry"));
}

#[test]
fn test_parse_output_not_json() {
    let err = parse_cli_output("ERROR: Please run 'az login'").unwrap_err();
    assert!(matches!(err, AzError::Validation { .. }));
}

#[tokio::test]
async fn test_missing_program_is_credential_error() {
    let cred = AzureCliCredential::new().with_program("azlook-no-such-az-binary");
    let err = cred
        .get_token(&["https://management.azure.com/.default"])
        .await
        .unwrap_err();
    assert!(matches!(err, AzError::Credential { .. }));
    assert!(err.to_string().contains("Azure CLI not available"));
}
