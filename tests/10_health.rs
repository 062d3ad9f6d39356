mod common;

use std::sync::Arc;

use anyhow::Result;
use reqwest::StatusCode;
use vote_api::database::MemoryVoteStore;

#[tokio::test]
async fn health_endpoint_responds() -> Result<()> {
    let server = common::spawn_server(common::test_config(), Arc::new(MemoryVoteStore::new())).await?;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/health", server.base_url))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["data"]["status"], "ok");
    Ok(())
}

#[tokio::test]
async fn health_reports_unavailable_store() -> Result<()> {
    let store = Arc::new(common::FailingStore { code: "08006" });
    let server = common::spawn_server(common::test_config(), store).await?;

    let res = reqwest::get(format!("{}/health", server.base_url)).await?;
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["success"], false);
    Ok(())
}

#[tokio::test]
async fn responses_carry_security_headers() -> Result<()> {
    let server = common::spawn_server(common::test_config(), Arc::new(MemoryVoteStore::new())).await?;

    let res = reqwest::get(format!("{}/health", server.base_url)).await?;
    let headers = res.headers();

    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(headers["x-frame-options"], "SAMEORIGIN");
    assert_eq!(headers["referrer-policy"], "no-referrer");
    assert_eq!(headers["cross-origin-opener-policy"], "same-origin");
    assert!(headers.contains_key("content-security-policy"));
    assert!(!headers.contains_key("cross-origin-embedder-policy"));
    Ok(())
}

#[tokio::test]
async fn voting_page_renders_hook_link() -> Result<()> {
    let mut config = common::test_config();
    config.webhook.page_link = "https://hooks.example.com/votes".to_string();
    let server = common::spawn_server(config, Arc::new(MemoryVoteStore::new())).await?;

    let res = reqwest::get(format!("{}/", server.base_url)).await?;
    assert_eq!(res.status(), StatusCode::OK);

    let html = res.text().await?;
    assert!(html.contains(r#"<html lang="ru">"#));
    assert!(html.contains(r#"content="https://hooks.example.com/votes""#));
    Ok(())
}
