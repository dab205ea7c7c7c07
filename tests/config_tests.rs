//! Configuration loading from YAML files and environment variables

mod common;

use common::*;
use crudkit::prelude::*;
use serde_json::Value;
use std::collections::HashMap;
use std::io::Write;

#[test]
fn test_load_full_yaml_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
security:
  token_key: s3cret
  cookie_name: session
  token_ttl_seconds: 600
pagination:
  enabled: true
  query_param_name: page
  per_page: 5
binder:
  max_depth: 3
"#
    )
    .unwrap();

    let config = CrudConfig::from_yaml_file(file.path().to_str().unwrap()).unwrap();

    assert_eq!(config.security.token_key.as_deref(), Some("s3cret"));
    assert_eq!(config.security.cookie_name.as_deref(), Some("session"));
    assert_eq!(config.token_ttl(), chrono::Duration::seconds(600));
    assert!(config.pagination.enabled);
    assert_eq!(config.pagination.query_param_name, "page");
    assert_eq!(config.pagination.per_page, 5);
    assert_eq!(config.binder.max_depth, 3);
    assert!(config.token_service().is_some());
}

#[test]
fn test_partial_yaml_keeps_defaults() {
    let config = CrudConfig::from_yaml_str("binder:\n  max_depth: 2\n").unwrap();

    assert_eq!(config.binder.max_depth, 2);
    assert_eq!(config.security, CrudConfig::default().security);
    assert!(!config.pagination.enabled);
    assert!(config.token_service().is_none());
}

#[test]
fn test_missing_file_is_an_error() {
    let err = CrudConfig::from_yaml_file("/nonexistent/crudkit.yaml").unwrap_err();
    assert!(err.to_string().contains("/nonexistent/crudkit.yaml"));
}

#[test]
fn test_env_overrides_yaml() {
    let vars = HashMap::from([
        ("JWT_TOKEN_KEY", "from-env"),
        ("TOKEN_TTL_SECONDS", "120"),
    ]);
    let config = CrudConfig::from_yaml_str("security:\n  token_key: from-yaml\n  cookie_name: sid\n")
        .unwrap()
        .merge_env(|key| vars.get(key).map(|v| v.to_string()))
        .unwrap();

    assert_eq!(config.security.token_key.as_deref(), Some("from-env"));
    assert_eq!(config.security.cookie_name.as_deref(), Some("sid"));
    assert_eq!(config.security.token_ttl_seconds, 120);
}

#[test]
fn test_env_rejects_non_numeric_ttl() {
    let result = CrudConfig::default().merge_env(|key| {
        (key == "TOKEN_TTL_SECONDS").then(|| "an hour".to_string())
    });
    assert!(result.is_err());
}

#[tokio::test]
async fn test_global_pagination_applies_to_resources_without_their_own() {
    let library = Library::new();
    for name in ["Chilton", "Gollancz", "Penguin"] {
        library.publisher(name).await;
    }
    let config =
        CrudConfig::from_yaml_str("pagination:\n  enabled: true\n  per_page: 1\n").unwrap();
    let app = library.api().with_config(config).build().unwrap();
    let server = axum_test::TestServer::try_new(app).expect("Failed to create test server");

    let body = server
        .get("/publishers")
        .add_query_param("p", "3")
        .await
        .json::<Value>();

    assert_eq!(body["count"], 1);
    assert_eq!(body["total"], 3);
    assert_eq!(body["items"][0]["name"], "Penguin");
    assert_eq!(body["_links"]["prev"], "/publishers?p=2");
    assert_eq!(body["_links"]["last"], "/publishers?p=3");
}

#[tokio::test]
async fn test_binder_depth_comes_from_config() {
    let library = Library::new();
    let publisher = library.publisher("Chilton").await;
    let author = library.author("Frank Herbert", Some(publisher.id)).await;
    let mut dune = book("Dune", 1965, "available");
    dune.author_id = Some(author.id);
    let dune = library.books.create(dune).await.unwrap();

    let config = CrudConfig::from_yaml_str("binder:\n  max_depth: 1\n").unwrap();
    let app = library.api().with_config(config).build().unwrap();
    let server = axum_test::TestServer::try_new(app).expect("Failed to create test server");

    let response = server.get(&format!("/books/{}", dune.id)).await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        response.json::<Value>()["error"]["kind"],
        "BINDING_DEPTH_EXCEEDED"
    );
}
