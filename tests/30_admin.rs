mod common;

use std::sync::Arc;

use anyhow::Result;
use reqwest::{redirect::Policy, StatusCode};
use serde_json::json;
use vote_api::auth::{generate_jwt, Claims, VOTER_ROLE};
use vote_api::database::MemoryVoteStore;

async fn login(client: &reqwest::Client, base_url: &str, password: &str) -> Result<reqwest::Response> {
    Ok(client
        .post(format!("{}/admin/login", base_url))
        .json(&json!({ "password": password }))
        .send()
        .await?)
}

#[tokio::test]
async fn wrong_password_is_unauthorized() -> Result<()> {
    let server = common::spawn_server(common::test_config(), Arc::new(MemoryVoteStore::new())).await?;
    let client = reqwest::Client::new();

    let res = login(&client, &server.base_url, "guess").await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn login_disabled_without_configured_password() -> Result<()> {
    let mut config = common::test_config();
    config.security.admin_password = None;
    let server = common::spawn_server(config, Arc::new(MemoryVoteStore::new())).await?;

    let res = login(&reqwest::Client::new(), &server.base_url, "anything").await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn admin_api_lists_votes_with_token() -> Result<()> {
    let server = common::spawn_server(common::test_config(), Arc::new(MemoryVoteStore::new())).await?;
    let client = reqwest::Client::new();

    for (uid, vote) in [("u1", json!(["a", "b", "c"])), ("u2", json!(["a", "c", "b"]))] {
        client
            .post(format!("{}/api/submit_vote", server.base_url))
            .json(&json!({ "UID": uid, "vote": vote }))
            .send()
            .await?
            .error_for_status()?;
    }

    let unauthenticated = client
        .get(format!("{}/admin/api/votes", server.base_url))
        .send()
        .await?;
    assert_eq!(unauthenticated.status(), StatusCode::UNAUTHORIZED);

    let res = login(&client, &server.base_url, common::ADMIN_PASSWORD).await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers()["set-cookie"]
        .to_str()?
        .starts_with("vote_admin_token="));
    let body = res.json::<serde_json::Value>().await?;
    let token = body["data"]["token"].as_str().expect("token").to_string();

    let list = client
        .get(format!("{}/admin/api/votes?limit=10", server.base_url))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(list.status(), StatusCode::OK);
    let list = list.json::<serde_json::Value>().await?;
    assert_eq!(list["data"]["total"], 2);
    // Newest first
    assert_eq!(list["data"]["votes"][0]["voter_id"], "u2");

    let summary = client
        .get(format!("{}/admin/api/votes/summary", server.base_url))
        .bearer_auth(&token)
        .send()
        .await?
        .json::<serde_json::Value>()
        .await?;
    assert_eq!(summary["data"]["total"], 2);
    assert_eq!(summary["data"]["positions"][0]["a"], 2);
    assert_eq!(summary["data"]["positions"][1]["b"], 1);
    Ok(())
}

#[tokio::test]
async fn voter_token_cannot_read_admin_api() -> Result<()> {
    let config = common::test_config();
    let token = generate_jwt(&config.security, &Claims::new("someone", VOTER_ROLE, 1))?;
    let server = common::spawn_server(config, Arc::new(MemoryVoteStore::new())).await?;

    let res = reqwest::Client::new()
        .get(format!("{}/admin/api/votes", server.base_url))
        .bearer_auth(token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn admin_page_requires_session_cookie() -> Result<()> {
    let server = common::spawn_server(common::test_config(), Arc::new(MemoryVoteStore::new())).await?;
    let client = reqwest::Client::builder().redirect(Policy::none()).build()?;

    let res = client.get(format!("{}/admin", server.base_url)).send().await?;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(res.headers()["location"], "/admin/login");

    let login_res = login(&client, &server.base_url, common::ADMIN_PASSWORD).await?;
    let cookie = login_res.headers()["set-cookie"].to_str()?.to_string();
    let session = cookie.split(';').next().unwrap_or_default().to_string();

    let res = client
        .get(format!("{}/admin", server.base_url))
        .header("cookie", session)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.text().await?.contains("/admin/api/votes"));
    Ok(())
}

#[tokio::test]
async fn voter_token_unlocks_votes_when_required() -> Result<()> {
    let mut config = common::test_config();
    config.policy.require_auth_for_votes = true;
    let token = generate_jwt(&config.security, &Claims::new("voter-1", VOTER_ROLE, 1))?;
    let server = common::spawn_server(config, Arc::new(MemoryVoteStore::new())).await?;
    let client = reqwest::Client::new();
    let url = format!("{}/api/submit_vote", server.base_url);
    let ballot = json!({ "UID": "u1", "vote": ["a", "b", "c"] });

    let anonymous = client.post(&url).json(&ballot).send().await?;
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

    let signed = client.post(&url).bearer_auth(token).json(&ballot).send().await?;
    assert_eq!(signed.status(), StatusCode::OK);
    Ok(())
}
