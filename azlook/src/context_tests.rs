use super::*;
use std::io::Write;
use tempfile::NamedTempFile;

fn no_env(_: &str) -> Option<String> {
    None
}

fn config_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", contents).unwrap();
    file
}

#[test]
fn test_verbosity_from_count() {
    assert_eq!(VerbosityLevel::from_count(0), VerbosityLevel::Normal);
    assert_eq!(VerbosityLevel::from_count(1), VerbosityLevel::Verbose);
    assert_eq!(VerbosityLevel::from_count(2), VerbosityLevel::Trace);
    assert_eq!(VerbosityLevel::from_count(7), VerbosityLevel::Trace);
}

#[test]
fn test_defaults_without_file_or_env() {
    let ctx = AppContext::build_with(None, None, &no_env).unwrap();
    assert_eq!(ctx.format, OutputFormat::Pretty);
    assert_eq!(ctx.config.output.color, config::ColorChoice::Auto);
    assert!(ctx.config.registry.endpoint.is_none());
    assert!(ctx.config_path.is_none());
}

#[test]
fn test_file_values_are_loaded() {
    let file = config_file("output:\n  format: json\nstorage:\n  account: fromfile\n");
    let ctx =
        AppContext::build_with(None, Some(file.path()), &no_env).unwrap();
    assert_eq!(ctx.format, OutputFormat::Json);
    assert_eq!(ctx.config.storage.account.as_deref(), Some("fromfile"));
    assert_eq!(ctx.config_path.as_deref(), Some(file.path()));
}

#[test]
fn test_env_overrides_file() {
    let file = config_file(
        "output:\n  format: json\nregistry:\n  endpoint: file.azurecr.io\nstorage:\n  account: fromfile\n",
    );
    let env = |key: &str| match key {
        "AZLOOK_REGISTRY_ENDPOINT" => Some("env.azurecr.io".to_string()),
        "AZLOOK_STORAGE_ACCOUNT" => Some("fromenv".to_string()),
        "AZLOOK_STORAGE_CONTAINER" => Some("photos".to_string()),
        "AZLOOK_FORMAT" => Some("yaml".to_string()),
        _ => None,
    };
    let ctx = AppContext::build_with(None, Some(file.path()), &env).unwrap();

    assert_eq!(
        ctx.config.registry.endpoint.as_deref(),
        Some("env.azurecr.io")
    );
    assert_eq!(ctx.config.storage.account.as_deref(), Some("fromenv"));
    assert_eq!(ctx.config.storage.container.as_deref(), Some("photos"));
    assert_eq!(ctx.format, OutputFormat::Yaml);
}

#[test]
fn test_color_precedence() {
    let no_color = |key: &str| (key == "NO_COLOR").then(|| "1".to_string());

    assert_eq!(
        resolve_color(config::ColorChoice::Always, None, &no_env),
        ColorChoice::Always
    );
    assert_eq!(
        resolve_color(config::ColorChoice::Always, None, &no_color),
        ColorChoice::Never
    );
    assert_eq!(
        resolve_color(config::ColorChoice::Never, Some("always"), &no_color),
        ColorChoice::Always
    );
}

#[test]
fn test_config_env_points_at_file() {
    let file = config_file("output:\n  color: never\n");
    let path = file.path().display().to_string();
    let env = move |key: &str| (key == "AZLOOK_CONFIG").then(|| path.clone());

    let ctx = AppContext::build_with(None, None, &env).unwrap();
    assert_eq!(ctx.config.output.color, config::ColorChoice::Never);
}

#[test]
fn test_missing_explicit_config_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.yaml");
    let result = AppContext::build_with(None, Some(&missing), &no_env);
    assert!(result.is_err());
}

#[test]
fn test_output_format_flag_wins() {
    let ctx = AppContext::build_with(None, None, &no_env).unwrap();
    assert_eq!(ctx.output_format(None), OutputFormat::Pretty);
    assert_eq!(ctx.output_format(Some("json")), OutputFormat::Json);
}
