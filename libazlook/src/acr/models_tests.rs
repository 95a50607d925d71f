use super::*;

#[test]
fn test_manifest_list_with_full_attributes() {
    let body = r#"{
        "registry": "myregistry.azurecr.io",
        "imageName": "hello-world",
        "manifests": [{
            "digest": "sha256:90659bf80b44ce6be8234e6ff90a1ac34acbeb826903b02cfa0da11c82cbc042",
            "imageSize": 525,
            "createdTime": "2023-03-01T10:00:00.1234567Z",
            "lastUpdateTime": "2023-03-02T10:00:00Z",
            "architecture": "amd64",
            "os": "linux",
            "mediaType": "application/vnd.docker.distribution.manifest.v2+json",
            "tags": ["latest", "v1"],
            "changeableAttributes": {
                "deleteEnabled": true,
                "writeEnabled": false,
                "readEnabled": true,
                "listEnabled": true
            }
        }]
    }"#;
    let list: WireManifestList = serde_json::from_str(body).unwrap();
    assert_eq!(list.image_name, "hello-world");

    let manifest = list
        .manifests
        .into_iter()
        .next()
        .unwrap()
        .into_properties("myregistry.azurecr.io", "hello-world");
    assert_eq!(manifest.repository_name, "hello-world");
    assert_eq!(manifest.size_in_bytes, Some(525));
    assert_eq!(manifest.tags, vec!["latest", "v1"]);
    assert_eq!(manifest.operating_system.as_deref(), Some("linux"));
    assert_eq!(manifest.can_delete, Some(true));
    assert_eq!(manifest.can_write, Some(false));
    assert_eq!(
        manifest.created_on.unwrap().to_rfc3339(),
        "2023-03-01T10:00:00.123456700+00:00"
    );
}

#[test]
fn test_manifest_without_tags_or_attributes() {
    let body = r#"{"digest": "sha256:abc"}"#;
    let manifest: WireManifest = serde_json::from_str(body).unwrap();
    let props = manifest.into_properties("r", "repo");
    assert!(props.tags.is_empty());
    assert!(props.can_read.is_none());
    assert!(props.created_on.is_none());
}

#[test]
fn test_manifest_with_null_tags() {
    let body = r#"{"digest": "sha256:abc", "tags": null}"#;
    let manifest: WireManifest = serde_json::from_str(body).unwrap();
    assert!(manifest.into_properties("r", "repo").tags.is_empty());
}

#[test]
fn test_catalog_missing_repositories_is_empty() {
    let catalog: WireCatalog = serde_json::from_str("{}").unwrap();
    assert!(catalog.repositories.is_empty());
}

#[test]
fn test_repository_properties_conversion() {
    let body = r#"{
        "registry": "myregistry.azurecr.io",
        "imageName": "team/app",
        "createdTime": "2023-01-01T00:00:00Z",
        "lastUpdateTime": "2023-01-05T00:00:00Z",
        "manifestCount": 3,
        "tagCount": 2
    }"#;
    let wire: WireRepository = serde_json::from_str(body).unwrap();
    let props = RepositoryProperties::from(wire);
    assert_eq!(props.name, "team/app");
    assert_eq!(props.manifest_count, 3);
    assert_eq!(props.tag_count, 2);
    assert_eq!(props.registry_login_server, "myregistry.azurecr.io");
}

#[test]
fn test_tag_list_conversion() {
    let body = r#"{
        "registry": "r",
        "imageName": "app",
        "tags": [{"name": "latest", "digest": "sha256:1", "createdTime": "2023-01-01T00:00:00Z", "signed": false}]
    }"#;
    let list: WireTagList = serde_json::from_str(body).unwrap();
    let tag = list.tags.into_iter().next().unwrap().into_properties("app");
    assert_eq!(tag.name, "latest");
    assert_eq!(tag.digest, "sha256:1");
    assert_eq!(tag.repository_name, "app");
}

#[test]
fn test_access_token_accepts_either_field_name() {
    let a: AccessTokenResponse = serde_json::from_str(r#"{"access_token": "x"}"#).unwrap();
    let b: AccessTokenResponse = serde_json::from_str(r#"{"token": "y"}"#).unwrap();
    assert_eq!(a.into_token().unwrap(), "x");
    assert_eq!(b.into_token().unwrap(), "y");
}

#[test]
fn test_access_token_with_both_fields_prefers_access_token() {
    let both: AccessTokenResponse =
        serde_json::from_str(r#"{"token": "docker", "access_token": "acr", "expires_in": 300}"#)
            .unwrap();
    assert_eq!(both.into_token().unwrap(), "acr");
}

#[test]
fn test_access_token_missing_is_validation_error() {
    let none: AccessTokenResponse = serde_json::from_str(r#"{"expires_in": 300}"#).unwrap();
    assert!(matches!(
        none.into_token(),
        Err(AzError::Validation { .. })
    ));
}
